//! Service binding.
//!
//! # Responsibilities
//! - Wire the HTTP routes to a running controller
//! - Apply bearer-token authentication when enabled
//! - Resolve the listen address from the effective configuration
//!
//! # Design Decisions
//! - No global router: `bind` returns an explicit [`BoundService`]
//! - Binding never listens; the caller launches the listener afterwards
//! - The controller must already be Running; anything else is a caller bug

pub mod auth;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    middleware,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{validate_config, ServerConfig, ValidationError};
use crate::controller::{Controller, LifecycleState};
use crate::http::{request_span, UuidRequestId};

/// Largest accepted request body. Commands are tiny JSON documents.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Error type for service binding.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("controller must be running before the service is bound (it is {0})")]
    ControllerNotRunning(LifecycleState),

    #[error("invalid configuration: {}", describe(.0))]
    InvalidConfig(Vec<ValidationError>),
}

fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// State injected into handlers.
#[derive(Clone)]
pub struct ApiState {
    pub controller: Arc<dyn Controller>,
    pub tokens: Arc<[String]>,
}

impl ApiState {
    /// Whether `token` is one of the configured API tokens.
    pub fn accepts(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

/// A fully wired service that is ready to be served.
pub struct BoundService {
    router: Router,
    addr: SocketAddr,
    auth_enabled: bool,
    controller: Arc<dyn Controller>,
}

impl BoundService {
    /// Address the listener must bind to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth_enabled
    }

    /// The controller the routes are wired to.
    pub fn controller(&self) -> &Arc<dyn Controller> {
        &self.controller
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Wire the request-handling surface to `controller`.
pub fn bind(
    config: ServerConfig,
    controller: Arc<dyn Controller>,
    auth_enabled: bool,
) -> Result<BoundService, BindError> {
    let state = controller.state();
    if state != LifecycleState::Running {
        return Err(BindError::ControllerNotRunning(state));
    }

    validate_config(&config).map_err(BindError::InvalidConfig)?;
    let addr = config.listen_addr().map_err(|_| {
        BindError::InvalidConfig(vec![ValidationError::InvalidInterface(
            config.interface.clone(),
        )])
    })?;

    if auth_enabled && config.api_tokens.is_empty() {
        tracing::warn!("Authentication enabled but no api_tokens configured; protected routes will reject every request");
    }

    let api_state = ApiState {
        controller: controller.clone(),
        tokens: config.api_tokens.clone().into(),
    };
    let router = build_router(&config, api_state, auth_enabled);

    tracing::info!(address = %addr, auth_enabled, "Service bound");

    Ok(BoundService {
        router,
        addr,
        auth_enabled,
        controller,
    })
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
fn build_router(config: &ServerConfig, state: ApiState, auth_enabled: bool) -> Router {
    let mut protected = Router::new()
        .route("/api/version", get(handlers::version))
        .route("/api/capabilities", get(handlers::capabilities))
        .route(
            "/api/relays/{channel}",
            get(handlers::get_relay).post(handlers::set_relay),
        )
        .route("/api/pwm/{channel}", post(handlers::set_pwm))
        .route("/api/adc/{channel}", get(handlers::read_adc));

    if auth_enabled {
        protected = protected.route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));
    }

    Router::new()
        .route("/api/health", get(handlers::health))
        .merge(protected)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
}
