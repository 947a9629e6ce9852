pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::{cors_layer, create_router, CACHE_HIT_HEADER};
