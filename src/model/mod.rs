pub mod actor;
pub mod comment;
pub mod line_item;
pub mod material;
pub mod quote;
