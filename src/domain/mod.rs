pub mod mirror;
pub mod model;
pub mod upload;
