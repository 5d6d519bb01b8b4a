//! Charge Predictor Server
//!
//! Login-gated HTML form and JSON API serving medical insurance charge
//! predictions from a trained regression model.

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use data_validator::Validator;
use feature_engine::{FeatureEncoder, FeatureIndexMap};
use inference_engine::InferenceEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use session_auth::{AuthModule, Credentials, SessionManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub mod auth;
pub mod error;
pub mod predictor;
pub mod rate_limit;
pub mod routes;
pub mod settings;
pub mod views;

use predictor::Predictor;
use rate_limit::DefaultGovernorConfig;
use settings::{LoggingSettings, Settings};

/// Application state shared across handlers
pub struct AppState {
    /// Validation, encoding and the loaded model
    pub predictor: Predictor,
    /// Credentials and sessions
    pub auth: AuthModule,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus handle, when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Mark session cookies `Secure`
    pub secure_cookie: bool,
}

/// Handle passed to every handler
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create new application state
    pub fn new(predictor: Predictor, auth: AuthModule) -> Self {
        Self {
            predictor,
            auth,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
            secure_cookie: false,
        }
    }

    /// Load the artifacts named in `settings` and wire everything up
    pub fn from_settings(settings: &Settings, metrics: Option<PrometheusHandle>) -> anyhow::Result<Self> {
        let index = FeatureIndexMap::load(&settings.artifacts.feature_index)
            .context("failed to load the feature index map")?;
        let engine = InferenceEngine::load(&settings.artifacts.model, index.len())
            .context("failed to load the model")?;

        let predictor = Predictor::new(
            Validator::new(settings.validation.clone()),
            FeatureEncoder::new(index),
            engine,
            settings.encoding.miss_policy,
        );

        if settings.uses_dev_secret() {
            warn!("Using the built-in session secret; set CHARGE_PREDICTOR__AUTH__SECRET in production");
        }
        let sessions = SessionManager::new(&settings.auth.secret, settings.auth.session_ttl_seconds)
            .context("invalid auth settings")?;
        let credentials = Credentials::new(&settings.auth.username, &settings.auth.password);

        Ok(Self {
            metrics,
            secure_cookie: settings.auth.secure_cookie,
            ..Self::new(predictor, AuthModule::new(credentials, sessions))
        })
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelStatus,
    pub metrics: ServiceMetrics,
}

/// Loaded model
#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub kind: String,
    pub path: String,
    pub n_features: usize,
}

/// Counters since startup
#[derive(Debug, Serialize)]
pub struct ServiceMetrics {
    pub predictions_served: u64,
    pub predictions_refused: u64,
    pub revoked_sessions: usize,
}

/// Create the application router.
///
/// `login_limit` throttles `POST /login` per peer IP; the server must then be
/// run with connect info (see [`run_server`]).
pub fn create_router(state: SharedState, login_limit: Option<Arc<DefaultGovernorConfig>>) -> Router {
    let login = match login_limit {
        Some(config) => Router::new()
            .route("/login", post(routes::pages::login_submit))
            .layer(GovernorLayer { config }),
        None => Router::new().route("/login", post(routes::pages::login_submit)),
    };

    Router::new()
        .route("/", get(routes::pages::home))
        .route("/index", get(routes::pages::welcome))
        .route("/login", get(routes::pages::login_form))
        .route("/logout", get(routes::pages::logout))
        .route(
            "/predict",
            get(routes::predictions::predict_form).post(routes::predictions::predict_submit),
        )
        .route("/predict_api", post(routes::predictions::predict_api))
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(login)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let engine = state.predictor.engine();
    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: ModelStatus {
            kind: engine.model_kind().to_string(),
            path: engine.model_path().to_string(),
            n_features: engine.n_features(),
        },
        metrics: ServiceMetrics {
            predictions_served: state.predictor.served_count(),
            predictions_refused: state.predictor.refused_count(),
            revoked_sessions: state.auth.sessions().revoked_count(),
        },
    };

    Json(response)
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    let builder = FmtSubscriber::builder().with_env_filter(filter).with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Run the server until ctrl-c
pub async fn run_server(settings: Settings, metrics: Option<PrometheusHandle>) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_settings(&settings, metrics)?);
    let login_limit = rate_limit::create_governor_config(&settings.rate_limit);
    if settings.rate_limit.enabled && login_limit.is_none() {
        warn!("Rate limit config rejected; login is not throttled");
    }
    let app = create_router(state, login_limit);

    info!("Starting charge predictor on {}", settings.server.bind);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
