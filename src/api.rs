//! HTTP API Server for Recommendations and Catalog Browsing
//!
//! Fetches marketplace data through the configured [`MarketplaceSource`] and
//! runs the catalog and recommendation pipelines on the blocking pool.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::catalog::{browse, CatalogEntity, CatalogFilters, CatalogProcessor, SortStrategy};
use crate::config::{ApiConfig, RecommendationConfig};
use crate::error::{Error, Result};
use crate::marketplace::{load_catalog, MarketplaceSource};
use crate::recommendation::{
    analyze, CandidateItem, RecommendationEngine, RecommendationPreferences, Recommendations,
    Transaction, UserAnalysis,
};

const MAX_IN_FLIGHT_REQUESTS: usize = 1024;

/// Shared application state
pub struct AppState {
    pub source: Arc<dyn MarketplaceSource>,
    pub engine: RecommendationEngine,
    pub processor: CatalogProcessor,
    pub history_limit: usize,
}

impl AppState {
    pub fn new(source: Arc<dyn MarketplaceSource>, config: &RecommendationConfig) -> Self {
        Self {
            source,
            engine: RecommendationEngine::new()
                .with_top_n(config.top_n)
                .with_slow_threshold(config.slow_threshold),
            processor: CatalogProcessor::new(),
            history_limit: config.history_limit,
        }
    }

    pub fn with_engine(mut self, engine: RecommendationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_processor(mut self, processor: CatalogProcessor) -> Self {
        self.processor = processor;
        self
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub source: String,
}

/// Response for recommendation endpoints
#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub items: Recommendations,
    pub total: usize,
    /// False when scoring failed and `items` are unscored catalog entries
    pub ranked: bool,
}

impl From<Recommendations> for RecommendationsResponse {
    fn from(items: Recommendations) -> Self {
        Self {
            total: items.len(),
            ranked: items.is_ranked(),
            items,
        }
    }
}

/// Request body for stateless scoring
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub catalog: Vec<CandidateItem>,
    #[serde(default)]
    pub history: Vec<Transaction>,
    #[serde(default)]
    pub preferences: RecommendationPreferences,
}

/// Query params for the sort order of the services endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SortQuery {
    pub sort: Option<SortStrategy>,
}

/// Response for the services endpoint
#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    pub items: Vec<CatalogEntity>,
    pub total: usize,
    pub sort: SortStrategy,
}

/// Response for the analysis endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub user_id: String,
    #[serde(flatten)]
    pub analysis: UserAnalysis,
    pub top_category: Option<String>,
    pub top_location: Option<String>,
}

/// Build the router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Recommendations
        .route("/api/v1/recommendations/score", post(score_catalog))
        .route("/api/v1/recommendations/:user_id", get(get_recommendations))
        // Catalog browsing
        .route("/api/v1/services/:user_id", get(get_services))
        // History analysis (for debugging/admin)
        .route("/api/v1/users/:user_id/analysis", get(get_user_analysis))
        .with_state(state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server and serve until `shutdown` resolves
pub async fn start_server(
    state: Arc<AppState>,
    config: &ApiConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let mut app = router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::new(config.request_timeout))
            .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT_REQUESTS)),
    );

    if config.cors_enabled {
        app = app.layer(cors_layer(config));
    }

    let addr = format!("{}:{}", config.host, config.port);
    info!("🚀 Starting ToFit API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(Error::internal)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(Error::internal)?;

    Ok(())
}

/// Health check endpoint, 503 when the marketplace source is unreachable
async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status) = match state.source.health_check().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            warn!("Health check failed for {}: {}", state.source.name(), e);
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            source: state.source.name().to_string(),
        }),
    )
}

/// Personalized recommendations over the live catalog
async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<RecommendationsResponse>> {
    let (history, professionals, listings) = tokio::try_join!(
        state.source.fetch_history(&user_id, state.history_limit),
        state.source.fetch_professionals(),
        state.source.fetch_listings(),
    )?;

    let worker = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let catalog = worker.processor.candidates(&professionals, &listings);
        worker
            .engine
            .recommend(&catalog, &history, &RecommendationPreferences::default())
    })
    .await?;

    debug!(
        "Generated {} recommendations for user {} (ranked: {})",
        outcome.len(),
        user_id,
        outcome.is_ranked()
    );

    Ok(Json(outcome.into()))
}

/// Stateless scoring of a caller-supplied catalog and history
async fn score_catalog(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<RecommendationsResponse>> {
    let Json(request) = payload.map_err(|e| Error::bad_request(e.body_text()))?;
    let worker = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        worker
            .engine
            .recommend(&request.catalog, &request.history, &request.preferences)
    })
    .await?;

    Ok(Json(outcome.into()))
}

/// Processed, filtered and sorted catalog for a user
async fn get_services(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(filters): Query<CatalogFilters>,
    Query(sort): Query<SortQuery>,
) -> Result<Json<ServicesResponse>> {
    let snapshot = load_catalog(state.source.as_ref(), &user_id).await?;
    let strategy = sort.sort.unwrap_or_default();

    let worker = state.clone();
    let items = tokio::task::spawn_blocking(move || {
        let entities = worker.processor.process(
            &snapshot.professionals,
            &snapshot.listings,
            &snapshot.favorites,
        );
        browse(entities, &filters, strategy)
    })
    .await?;

    Ok(Json(ServicesResponse {
        total: items.len(),
        items,
        sort: strategy,
    }))
}

/// Booking history analysis for a user
async fn get_user_analysis(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<AnalysisResponse>> {
    let history = state
        .source
        .fetch_history(&user_id, state.history_limit)
        .await?;
    let analysis = analyze(&history);

    Ok(Json(AnalysisResponse {
        top_category: analysis.top_category().map(str::to_string),
        top_location: analysis.top_location().map(str::to_string),
        user_id,
        analysis,
    }))
}
