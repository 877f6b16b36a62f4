pub mod comment_repo;
pub mod line_item_repo;
pub mod material_repo;
pub mod quote_repo;
pub mod repository_error;
