use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use super::AppState;
use crate::config;
use crate::handlers::{protected, public};
use crate::middleware::restore_user;

/// The complete HTTP surface.
///
/// Authentication is resolved for every request by `restore_user`; protected
/// handlers reject anonymous callers through their `CurrentUser` argument.
pub fn app(state: AppState) -> Router {
    let config = config::config();

    let router = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Sessions
        .route("/users", post(public::signup))
        .route(
            "/session",
            get(public::restore).post(public::login).delete(public::logout),
        )
        // Spots
        .route("/spots", get(public::spots_list).post(protected::spot_create))
        .route("/spots/current", get(protected::spots_current))
        .route(
            "/spots/:id",
            get(public::spot_show)
                .put(protected::spot_update)
                .delete(protected::spot_delete),
        )
        .route("/spots/:id/images", post(protected::spot_image_create))
        .route(
            "/spots/:id/reviews",
            get(public::spot_reviews_list).post(protected::spot_review_create),
        )
        .route(
            "/spots/:id/bookings",
            get(protected::spot_bookings_list).post(protected::spot_booking_create),
        )
        // Reviews
        .route("/reviews/current", get(protected::reviews_current))
        .route(
            "/reviews/:id",
            put(protected::review_update).delete(protected::review_delete),
        )
        .route("/reviews/:id/images", post(protected::review_image_create))
        // Outermost first
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&config.security.cors_origins))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
                .layer(CookieManagerLayer::new())
                .layer(middleware::from_fn_with_state(state.clone(), restore_user)),
        )
        .with_state(state);

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// `*` allows any origin without credentials; otherwise only the listed
/// origins, with cookies allowed
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
