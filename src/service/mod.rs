pub mod material_service;
pub mod pricing_service;
pub mod quote_service;
pub mod revision_service;
pub mod transition;
