//! HTTP handlers for the dashboard pages

use axum::{
    extract::{Path, State},
    http::Uri,
    response::Html,
};

use crate::{
    AppState,
    core::{catalog::QueryDescriptor, engine::EngineError, result_set::ResultSet},
    web::{
        errors::ApiError,
        pages::{ListingPage, ResultPage, render},
    },
};

#[axum_macros::debug_handler]
pub async fn list_catalog_handler(
    State(app_state): State<AppState>,
) -> Result<Html<String>, ApiError> {
    render(&ListingPage::new(&app_state.catalog))
}

#[axum_macros::debug_handler]
pub async fn run_query_handler(
    State(app_state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Html<String>, ApiError> {
    let query = app_state.catalog.get(&key).inspect_err(|_| {
        tracing::warn!("Unknown query key requested: {key}");
    })?;

    let result = execute_query(&app_state, query).await.inspect_err(|e| {
        tracing::error!(key = %key, "Error executing query: {e}");
    })?;

    tracing::debug!(key = %key, rows = result.rows.len(), "Query completed");
    render(&ResultPage::new(query, result))
}

pub async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

/// Run the descriptor's SQL unmodified, bounded by the configured timeout
async fn execute_query(
    app_state: &AppState,
    query: &QueryDescriptor,
) -> Result<ResultSet, EngineError> {
    let output = tokio::time::timeout(app_state.query_timeout, app_state.engine.execute(&query.sql))
        .await
        .map_err(|_| EngineError::Timeout(app_state.query_timeout))??;

    ResultSet::from_output(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::engine::{QueryEngine, QueryOutput, Row};
    use crate::router;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingEngine {
        rows: Vec<Row>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QueryEngine for RecordingEngine {
        async fn execute(&self, sql: &str) -> Result<QueryOutput, EngineError> {
            self.seen.lock().unwrap().push(sql.to_string());
            Ok(QueryOutput::from_rows(self.rows.clone()))
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl QueryEngine for FailingEngine {
        async fn execute(&self, _sql: &str) -> Result<QueryOutput, EngineError> {
            Err(EngineError::Upstream(
                "401 Unauthorized: token for svc-account@secret-project".to_string(),
            ))
        }
    }

    struct SlowEngine;

    #[async_trait]
    impl QueryEngine for SlowEngine {
        async fn execute(&self, _sql: &str) -> Result<QueryOutput, EngineError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(QueryOutput::default())
        }
    }

    fn rows(value: Value) -> Vec<Row> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => map,
                    _ => panic!("Expected object"),
                })
                .collect(),
            _ => panic!("Expected array"),
        }
    }

    fn state(engine: Arc<dyn QueryEngine>) -> AppState {
        AppState {
            catalog: Arc::new(Catalog::builtin()),
            engine,
            query_timeout: Duration::from_millis(200),
        }
    }

    async fn get(app_state: AppState, uri: &str) -> (StatusCode, String) {
        let response = router(app_state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_listing_page() {
        let (status, body) = get(state(Arc::new(RecordingEngine::default())), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Order Status Distribution"));
        assert!(body.contains("href=\"/query/top_categories\""));
    }

    #[tokio::test]
    async fn test_order_status_scenario() {
        let engine = Arc::new(RecordingEngine {
            rows: rows(json!([
                {"status": "Complete", "order_count": 120},
                {"status": "Cancelled", "order_count": 5}
            ])),
            ..Default::default()
        });

        let (status, body) = get(state(engine.clone()), "/query/order_status").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Order Status Distribution"));
        assert!(body.contains("<th>status</th><th>order_count</th>"));

        let complete = body.find("<td>Complete</td><td>120</td>").unwrap();
        let cancelled = body.find("<td>Cancelled</td><td>5</td>").unwrap();
        assert!(complete < cancelled);
        assert!(body.contains("href=\"/\""));
    }

    #[tokio::test]
    async fn test_sql_is_forwarded_verbatim() {
        let catalog = Catalog::builtin();

        for query in catalog.list() {
            let engine = Arc::new(RecordingEngine::default());
            let (status, _) = get(state(engine.clone()), &query.href()).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(*engine.seen.lock().unwrap(), vec![query.sql.clone()]);
        }
    }

    #[tokio::test]
    async fn test_unknown_key_never_reaches_engine() {
        let engine = Arc::new(RecordingEngine::default());
        let (status, body) = get(state(engine.clone()), "/query/nonexistent").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Not found"));
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_renders_table_without_header() {
        let engine = Arc::new(RecordingEngine::default());
        let (status, body) = get(state(engine), "/query/top_categories").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<table>"));
        assert!(!body.contains("<th>"));
        assert!(!body.contains("<td>"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway_without_details() {
        let (status, body) = get(state(Arc::new(FailingEngine)), "/query/order_status").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("Something went wrong"));
        assert!(!body.contains("secret-project"));
        assert!(!body.contains("Unauthorized"));
    }

    #[tokio::test]
    async fn test_malformed_result_is_bad_gateway() {
        let engine = Arc::new(RecordingEngine {
            rows: rows(json!([{"a": 1, "b": 2}, {"a": 3}])),
            ..Default::default()
        });

        let (status, _) = get(state(engine), "/query/order_status").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_slow_engine_times_out() {
        let (status, body) = get(state(Arc::new(SlowEngine)), "/query/order_status").await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body.contains("took too long"));
    }

    #[tokio::test]
    async fn test_unknown_route_renders_not_found_page() {
        let (status, body) = get(state(Arc::new(FailingEngine)), "/no/such/page").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Back to Dashboard"));
    }
}
