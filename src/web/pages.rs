//! HTML page templates

use askama::Template;
use axum::response::Html;

use crate::core::catalog::{Catalog, QueryDescriptor};
use crate::core::result_set::ResultSet;
use crate::web::errors::ApiError;

/// One listing card per catalog entry
pub struct Card<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub accent_color: &'a str,
    pub href: String,
}

impl<'a> From<&'a QueryDescriptor> for Card<'a> {
    fn from(query: &'a QueryDescriptor) -> Self {
        Self {
            title: &query.title,
            subtitle: &query.subtitle,
            accent_color: &query.accent_color,
            href: query.href(),
        }
    }
}

#[derive(Template)]
#[template(path = "listing.html")]
pub struct ListingPage<'a> {
    pub cards: Vec<Card<'a>>,
}

impl<'a> ListingPage<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            cards: catalog.list().iter().map(Card::from).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "result.html")]
pub struct ResultPage<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl<'a> ResultPage<'a> {
    pub fn new(query: &'a QueryDescriptor, result: ResultSet) -> Self {
        Self {
            title: &query.title,
            subtitle: &query.subtitle,
            headers: result.headers,
            rows: result.rows,
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub heading: &'static str,
    pub message: &'static str,
}

pub fn render<T: Template>(page: &T) -> Result<Html<String>, ApiError> {
    page.render()
        .map(Html)
        .map_err(|e| ApiError::Internal(e.to_string()))
}
