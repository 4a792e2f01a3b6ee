//! BigQuery Analytics Dashboard Library
//!
//! Serves a fixed catalog of analytical queries as HTML pages: a card per
//! query on the listing page, and a result table per query on its detail page.

use axum::{Router, routing::get};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub mod core;
pub mod web;

use crate::core::catalog::{Catalog, CatalogError};
use crate::core::engine::QueryEngine;
use crate::web::handlers::{list_catalog_handler, not_found_handler, run_query_handler};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(
        long,
        env = "DASHBOARD_HOST",
        default_value = "0.0.0.0",
        help = "Address to bind the HTTP server to"
    )]
    pub host: IpAddr,
    #[arg(
        short,
        long,
        env = "PORT",
        default_value_t = DEFAULT_PORT,
        help = "Port to bind the HTTP server to"
    )]
    pub port: u16,
    #[arg(
        long,
        env = "GOOGLE_CLOUD_PROJECT",
        help = "Billing project that runs the query jobs"
    )]
    pub project: String,
    #[arg(
        long,
        env = "BIGQUERY_CREDENTIALS",
        value_name = "FILE",
        help = "Service account key file; application default credentials are used when omitted"
    )]
    pub credentials: Option<PathBuf>,
    #[arg(
        long,
        env = "DASHBOARD_CATALOG",
        value_name = "FILE",
        help = "JSON catalog of queries to serve instead of the built-in one"
    )]
    pub catalog: Option<PathBuf>,
    #[arg(
        long,
        env = "QUERY_TIMEOUT_SECS",
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds to wait for a query before giving up"
    )]
    pub query_timeout_secs: u64,
}

impl Args {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog {
            Some(path) => Catalog::from_file(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

/// Shared by all request handlers; nothing in it is mutated after startup
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub engine: Arc<dyn QueryEngine>,
    pub query_timeout: Duration,
}

impl AppState {
    pub fn new(catalog: Catalog, engine: Arc<dyn QueryEngine>, query_timeout: Duration) -> Self {
        Self {
            catalog: Arc::new(catalog),
            engine,
            query_timeout,
        }
    }
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(list_catalog_handler))
        .route("/query/{key}", get(run_query_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
