use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cache::{CacheError, CacheManager};
use crate::catalog::TokenCatalog;
use crate::scheduler::RefreshScheduler;
use crate::types::{Snapshot, Token, TokenRecord};

#[derive(Clone)]
pub struct CexApiState {
    pub cache: CacheManager,
    pub catalog: Arc<TokenCatalog>,
    pub scheduler: Arc<RefreshScheduler>,
}

impl CexApiState {
    pub fn new(cache: CacheManager, catalog: Arc<TokenCatalog>, scheduler: Arc<RefreshScheduler>) -> Self {
        Self {
            cache,
            catalog,
            scheduler,
        }
    }
}

/// Body of a token miss
#[derive(Debug, Serialize)]
pub struct TokenNotFound {
    pub error: String,
    pub dv_tokens: Vec<Token>,
}

#[derive(Debug)]
pub struct ApiError(CacheError);

impl From<CacheError> for ApiError {
    fn from(e: CacheError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Cache read failed: {}", self.0);
        let body = json!({ "error": format!("cache unavailable: {}", self.0) });
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}

pub fn create_cex_router() -> Router<CexApiState> {
    Router::new()
        .route("/", get(get_full_data))
        .route("/refresh", post(trigger_refresh))
        .route("/:token_name", get(get_token_data))
}

/// GET / - the last full snapshot, `null` before the first cycle lands
async fn get_full_data(State(state): State<CexApiState>) -> Result<Json<Option<Snapshot>>, ApiError> {
    Ok(Json(state.cache.get_snapshot().await?))
}

/// GET /:token_name
async fn get_token_data(
    State(state): State<CexApiState>,
    Path(token_name): Path<String>,
) -> Result<Response, ApiError> {
    let code = token_name.to_uppercase();

    if let Some(record) = state.cache.get_token_record(&code).await? {
        return Ok(Json::<TokenRecord>(record).into_response());
    }

    info!("Token {} not found in cache", code);
    let dv_tokens = match state.catalog.cached().await {
        Ok(Some(tokens)) => tokens,
        Ok(None) => {
            // Answer now; the merchant API may be slow
            let catalog = Arc::clone(&state.catalog);
            tokio::spawn(async move {
                if let Err(e) = catalog.load().await {
                    warn!("Background catalog refill failed: {}", e);
                }
            });
            Vec::new()
        }
        Err(e) => {
            warn!("Catalog unavailable while answering miss for {}: {}", code, e);
            Vec::new()
        }
    };

    let body = TokenNotFound {
        error: "token not found".to_string(),
        dv_tokens,
    };
    Ok((StatusCode::NOT_FOUND, Json(body)).into_response())
}

/// POST /refresh - start a cycle in the background
async fn trigger_refresh(State(state): State<CexApiState>) -> impl IntoResponse {
    let scheduler = Arc::clone(&state.scheduler);
    tokio::spawn(async move {
        if let Err(e) = scheduler.trigger_immediate_cycle().await {
            error!("Manual refresh failed: {}", e);
        }
    });

    (StatusCode::ACCEPTED, Json(json!({ "status": "refresh started" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::CexAggregator;
    use crate::cache::{CacheStore, MemoryCacheStore};
    use crate::catalog::{CatalogError, TokenCatalogSource};
    use crate::types::{VenueExchangeStatus, VenueStatuses};
    use crate::venues::{NetworkAliasTable, VenueCurrencyFetcher};
    use async_trait::async_trait;
    use axum_test::TestServer;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FixedCatalog;

    #[async_trait]
    impl TokenCatalogSource for FixedCatalog {
        async fn get_tokens(&self) -> Result<Vec<Token>, CatalogError> {
            Ok(vec![Token::new("BTC", "bitcoin"), Token::new("USDT", "tron")])
        }
    }

    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Timeout(Duration::from_millis(1000)))
        }

        async fn set(&self, _: &str, _: String, _: Duration) -> Result<(), CacheError> {
            Err(CacheError::Timeout(Duration::from_millis(1000)))
        }
    }

    fn state_with(store: Arc<dyn CacheStore>) -> CexApiState {
        let cache = CacheManager::new(store);
        let catalog = Arc::new(TokenCatalog::new(
            Arc::new(FixedCatalog),
            cache.clone(),
            Duration::from_secs(1800),
        ));
        let fetcher = VenueCurrencyFetcher::new(Vec::new(), HashMap::new(), Duration::from_secs(5));
        let aggregator = Arc::new(CexAggregator::new(
            catalog.clone(),
            fetcher,
            NetworkAliasTable::default(),
            cache.clone(),
            Duration::from_secs(300),
        ));
        let scheduler = Arc::new(RefreshScheduler::new(
            aggregator,
            Duration::from_secs(300),
            Duration::from_secs(300),
        ));
        CexApiState::new(cache, catalog, scheduler)
    }

    fn server(state: CexApiState) -> TestServer {
        TestServer::new(create_cex_router().with_state(state)).unwrap()
    }

    #[tokio::test]
    async fn test_full_data_is_null_before_first_cycle() {
        let server = server(state_with(Arc::new(MemoryCacheStore::new())));

        let response = server.get("/").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<serde_json::Value>(), serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_token_lookup_is_case_insensitive() {
        let state = state_with(Arc::new(MemoryCacheStore::new()));
        let record = TokenRecord::from([(
            "bitcoin".to_string(),
            VenueStatuses::from([("okx".to_string(), VenueExchangeStatus::absent())]),
        )]);
        state
            .cache
            .cache_token_record("BTC", &record, Duration::from_secs(60))
            .await
            .unwrap();
        let server = server(state);

        let response = server.get("/btc").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["bitcoin"]["okx"]["deposit"], false);
        assert_eq!(body["bitcoin"]["okx"]["network"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_token_miss_lists_catalog() {
        let state = state_with(Arc::new(MemoryCacheStore::new()));
        let catalog = state.catalog.clone();
        let server = server(state);

        // Cold catalog: answered empty, refilled in the background
        let response = server.get("/doge").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "token not found");
        assert_eq!(body["dv_tokens"], serde_json::json!([]));

        for _ in 0..50 {
            if catalog.cached().await.unwrap().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let response = server.get("/doge").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["dv_tokens"][0]["code"], "BTC");
        assert_eq!(body["dv_tokens"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cache_outage_returns_503() {
        let server = server(state_with(Arc::new(DownStore)));

        let response = server.get("/").await;
        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let response = server.get("/btc").await;
        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_refresh_runs_cycle_in_background() {
        let state = state_with(Arc::new(MemoryCacheStore::new()));
        let scheduler = state.scheduler.clone();
        let cache = state.cache.clone();
        let server = server(state);

        let response = server.post("/refresh").await;
        assert_eq!(response.status_code(), StatusCode::ACCEPTED);

        for _ in 0..50 {
            if scheduler.last_cycle_at().await.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(scheduler.last_cycle_at().await.is_some());
        let snapshot = cache.get_snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);
    }
}
