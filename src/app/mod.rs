pub mod admin_service;
pub mod public_site;
