//! CORS middleware. Wrapper around `tower_http`'s CORS layer.

use crate::domain::config::CorsConfig;
use tower_http::cors::{Any, CorsLayer as TowerCorsLayer};

pub fn create_cors_layer(config: &CorsConfig) -> TowerCorsLayer {
    if !config.enabled {
        return TowerCorsLayer::very_permissive();
    }

    if config.allowed_origins.iter().any(|o| o == "*") {
        TowerCorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<_> = config.allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
        TowerCorsLayer::new().allow_origin(origins)
    }
}
