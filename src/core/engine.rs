//! Query engine seam and the BigQuery-backed implementation

use async_trait::async_trait;
use gcp_bigquery_client::Client;
use gcp_bigquery_client::model::get_query_results_parameters::GetQueryResultsParameters;
use gcp_bigquery_client::model::query_request::QueryRequest;
use gcp_bigquery_client::model::query_response::{QueryResponse, ResultSet};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// One result row: column name to scalar value, in column order
pub type Row = Map<String, Value>;

/// Error text is meant for server logs, never for the client.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Query did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Query engine call failed: {0}")]
    Upstream(String),

    #[error("Query engine returned a malformed result: {0}")]
    MalformedResult(String),
}

/// Rows returned by one query, plus the column schema when the engine reports one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub columns: Option<Vec<String>>,
    pub rows: Vec<Row>,
}

impl QueryOutput {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            columns: None,
            rows,
        }
    }
}

#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submit `sql` verbatim and wait for the complete result
    async fn execute(&self, sql: &str) -> Result<QueryOutput, EngineError>;
}

/// Runs queries as BigQuery jobs in a fixed billing project.
pub struct BigQueryEngine {
    client: Client,
    project_id: String,
    timeout: Duration,
}

impl BigQueryEngine {
    /// Authenticate with a service account key file when given, otherwise
    /// with application default credentials.
    pub async fn connect(
        project_id: &str,
        credentials: Option<&Path>,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = match credentials {
            Some(path) => {
                let path = path.to_string_lossy();
                Client::from_service_account_key_file(&path).await
            }
            None => Client::from_application_default_credentials().await,
        }
        .map_err(|e| EngineError::Upstream(format!("failed to authenticate: {e}")))?;

        Ok(Self {
            client,
            project_id: project_id.to_string(),
            timeout,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

#[async_trait]
impl QueryEngine for BigQueryEngine {
    async fn execute(&self, sql: &str) -> Result<QueryOutput, EngineError> {
        let mut request = QueryRequest::new(sql.to_string());
        request.timeout_ms = Some(timeout_millis(self.timeout));

        let response = self
            .client
            .job()
            .query(&self.project_id, request)
            .await
            .map_err(|e| EngineError::Upstream(e.to_string()))?;

        let (mut output, mut next_page) = read_page(response, self.timeout)?;

        while let Some(page) = next_page {
            let parameters = GetQueryResultsParameters {
                location: page.location,
                page_token: Some(page.page_token),
                timeout_ms: Some(timeout_millis(self.timeout)),
                ..Default::default()
            };

            let response = self
                .client
                .job()
                .get_query_results(&self.project_id, &page.job_id, parameters)
                .await
                .map_err(|e| EngineError::Upstream(e.to_string()))?;

            // Same wire shape as a jobs.query response
            let response: QueryResponse = serde_json::to_value(response)
                .and_then(serde_json::from_value)
                .map_err(|e| EngineError::MalformedResult(e.to_string()))?;

            let (page_output, following) = read_page(response, self.timeout)?;
            output.rows.extend(page_output.rows);
            next_page = following;
        }

        Ok(output)
    }
}

/// Where to fetch the rows that did not fit in the first response
#[derive(Debug, Clone, PartialEq, Eq)]
struct NextPage {
    job_id: String,
    location: Option<String>,
    page_token: String,
}

/// Convert one page of a query response, and locate the page after it.
fn read_page(
    response: QueryResponse,
    timeout: Duration,
) -> Result<(QueryOutput, Option<NextPage>), EngineError> {
    if response.job_complete == Some(false) {
        return Err(EngineError::Timeout(timeout));
    }

    let next_page = match response.page_token.clone() {
        Some(page_token) => {
            let reference = response.job_reference.as_ref();
            let job_id = reference
                .and_then(|r| r.job_id.clone())
                .ok_or_else(|| {
                    EngineError::MalformedResult("paged result without a job id".to_string())
                })?;

            Some(NextPage {
                job_id,
                location: reference.and_then(|r| r.location.clone()),
                page_token,
            })
        }
        None => None,
    };

    Ok((output_from_response(response)?, next_page))
}

/// Rows of one response, with columns in schema order
fn output_from_response(response: QueryResponse) -> Result<QueryOutput, EngineError> {
    let columns: Option<Vec<String>> = response
        .schema
        .as_ref()
        .and_then(|schema| schema.fields.as_ref())
        .map(|fields| fields.iter().map(|field| field.name.clone()).collect());

    let mut result_set = ResultSet::new_from_query_response(response);
    let mut rows = Vec::new();

    while result_set.next_row() {
        let Some(names) = columns.as_ref() else {
            return Err(EngineError::MalformedResult(
                "rows returned without a schema".to_string(),
            ));
        };

        let mut row = Row::new();
        for name in names {
            let value = result_set
                .get_json_value_by_name(name)
                .map_err(|e| EngineError::MalformedResult(e.to_string()))?
                .unwrap_or(Value::Null);
            row.insert(name.clone(), value);
        }
        rows.push(row);
    }

    Ok(QueryOutput { columns, rows })
}

fn timeout_millis(timeout: Duration) -> i32 {
    i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX)
}
