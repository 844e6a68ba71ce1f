use crate::middleware::{auth_middleware, rate_limit_middleware};
use crate::routes;
use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use concept_agent::ConceptGenerator;
use concept_security::{PasswordHasher, RateLimiter, TokenIssuer};
use concept_store::UserStore;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub generator: Arc<ConceptGenerator>,
    pub tokens: TokenIssuer,
    pub passwords: PasswordHasher,
    /// Per-address limiter for the unauthenticated concept route.
    pub public_limiter: Arc<RateLimiter>,
}

/// The HTTP server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router.
    ///
    /// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so
    /// the public route is limited per client address.
    pub fn build(state: Arc<AppState>) -> Router {
        let public: Router<Arc<AppState>> = Router::new()
            .route("/get-concept", get(routes::get_concept))
            .route_layer(axum_mw::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ));

        let authenticated: Router<Arc<AppState>> = Router::new()
            .route("/daily-concept", get(routes::daily_concept))
            .route("/user/{user_id}/interests/add", post(routes::add_interest))
            .route(
                "/user/{user_id}/interests/remove",
                post(routes::remove_interest),
            )
            .route_layer(axum_mw::from_fn_with_state(state.clone(), auth_middleware));

        Router::new()
            .route("/health", get(routes::health_handler))
            .route("/users", post(routes::register))
            .route("/login", post(routes::login))
            .merge(public)
            .merge(authenticated)
            .with_state(state)
    }
}
