pub mod router;
pub mod types;
pub mod handlers {
    pub mod admin;
    pub mod blobs;
    pub mod common;
    pub mod health;
    pub mod public;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
