pub mod auth;
pub mod config;
pub mod error;
pub mod firebase;
pub mod handlers;
pub mod images;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod store;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, request::Parts, HeaderValue, Response, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, patch, post, MethodRouter},
    Router,
};
use std::any::Any;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{elevated, protected, public};
use crate::middleware::{require_admin, require_caller};

pub use crate::state::AppState;

const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0"];

/// Build the HTTP application around shared state.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        // Public
        .route("/", get(public::root::root))
        .route("/health", get(public::root::health))
        .merge(booking_routes(&state))
        .merge(hospitality_routes(&state))
        .merge(chatbot_routes())
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if config.security.enable_cors {
        router = router.layer(cors_layer());
    }

    router
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Register `path` with and without a trailing slash.
fn collection(router: Router<AppState>, path: &str, methods: MethodRouter<AppState>) -> Router<AppState> {
    router
        .route(path, methods.clone())
        .route(&format!("{}/", path), methods)
}

fn authenticated(methods: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    methods.route_layer(from_fn_with_state(state.clone(), require_caller))
}

fn admin_only(methods: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    // Layers run outermost-last: the caller is resolved before the admin check.
    let methods = methods.route_layer(from_fn_with_state(state.clone(), require_admin));
    authenticated(methods, state)
}

fn booking_routes(state: &AppState) -> Router<AppState> {
    use protected::bookings;

    let router = collection(
        Router::new(),
        "/bookings",
        authenticated(get(bookings::list).post(bookings::create), state),
    );
    router.route(
        "/bookings/:id",
        authenticated(get(bookings::get).delete(bookings::delete), state),
    )
}

fn hospitality_routes(state: &AppState) -> Router<AppState> {
    let guard = |methods: MethodRouter<AppState>| {
        if state.config.security.hospitality_admin_only {
            admin_only(methods, state)
        } else {
            methods
        }
    };

    let router = collection(
        Router::new(),
        "/hospitality",
        get(public::hospitality::list).merge(guard(post(elevated::hospitality::create))),
    );
    router.route(
        "/hospitality/:id",
        get(public::hospitality::get).merge(guard(
            patch(elevated::hospitality::update).delete(elevated::hospitality::delete),
        )),
    )
}

fn chatbot_routes() -> Router<AppState> {
    use public::chatbot;

    // `/chatbot/new` is a static segment and wins over `/:session_id`.
    Router::new()
        .route("/chatbot/new", post(chatbot::new_session))
        .route("/chatbot/:session_id", post(chatbot::continue_session))
}

/// Local development origins on any port, with credentials. Other origins get
/// no CORS headers.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _: &Parts| {
            is_local_origin(origin)
        }))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn is_local_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let Ok(url) = url::Url::parse(origin) else {
        return false;
    };

    matches!(url.scheme(), "http" | "https")
        && url.username().is_empty()
        && url.path() == "/"
        && url.query().is_none()
        && url.host_str().is_some_and(|host| LOCAL_HOSTS.contains(&host))
        && !origin.ends_with('/')
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!("request handler panicked: {}", detail);

    let body = serde_json::json!({ "detail": "Internal Server Error" }).to_string();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
