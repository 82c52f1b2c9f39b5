pub mod blob;
pub mod document;
