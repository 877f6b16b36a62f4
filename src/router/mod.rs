pub mod line_item_router;
pub mod material_router;
pub mod quote_router;
pub mod webhook_router;
