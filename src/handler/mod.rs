pub mod line_item_handler;
pub mod material_handler;
pub mod quote_handler;
pub mod webhook_handler;
