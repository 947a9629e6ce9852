use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::auth::{origin_middleware, OriginGate};
use crate::visits::VisitCounter;

use super::handlers::{count_visit, health_check, AppState};

/// Response header reporting whether stats came from the in-process snapshot
pub const CACHE_HIT_HEADER: &str = "x-visitor-cache-hit";

const CORS_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

pub fn create_router(counter: VisitCounter, gate: Arc<OriginGate>, cors: CorsLayer) -> Router {
    let state = Arc::new(AppState { counter });

    let protected_routes = Router::new()
        .route("/", get(count_visit))
        .route_layer(middleware::from_fn(move |headers, req, next| {
            let gate = Arc::clone(&gate);
            origin_middleware(gate, headers, req, next)
        }))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(cors)
}

/// GET-only CORS, restricted to `https://<domain>` when a domain is given
pub fn cors_layer(allowed_domain: Option<&str>) -> Result<CorsLayer> {
    let origin = match allowed_domain {
        Some(domain) => {
            let value = HeaderValue::from_str(&format!("https://{domain}"))
                .with_context(|| format!("invalid CORS origin domain '{domain}'"))?;
            AllowOrigin::exact(value)
        }
        None => AllowOrigin::from(Any),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .max_age(CORS_MAX_AGE))
}
