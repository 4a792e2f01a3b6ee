//! Static registry of the named analytical queries shown on the dashboard

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unknown query key: {0}")]
    NotFound(String),

    #[error("Invalid query key '{0}': only ASCII letters, digits, '_' and '-' are allowed")]
    InvalidKey(String),

    #[error("Duplicate query key: {0}")]
    DuplicateKey(String),

    #[error("Invalid accent color '{color}' for query '{key}'")]
    InvalidColor { key: String, color: String },

    #[error("Query '{0}' has no SQL text")]
    EmptySql(String),

    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Display metadata and SQL text for one dashboard query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub key: String,
    pub title: String,
    pub subtitle: String,
    #[serde(alias = "color")]
    pub accent_color: String,
    pub sql: String,
}

impl QueryDescriptor {
    pub fn new(key: &str, title: &str, subtitle: &str, accent_color: &str, sql: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            accent_color: accent_color.to_string(),
            sql: sql.to_string(),
        }
    }

    /// Link target of the detail page for this query
    pub fn href(&self) -> String {
        format!("/query/{}", self.key)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if !is_valid_key(&self.key) {
            return Err(CatalogError::InvalidKey(self.key.clone()));
        }
        if !is_valid_color(&self.accent_color) {
            return Err(CatalogError::InvalidColor {
                key: self.key.clone(),
                color: self.accent_color.clone(),
            });
        }
        if self.sql.trim().is_empty() {
            return Err(CatalogError::EmptySql(self.key.clone()));
        }
        Ok(())
    }
}

/// Immutable, insertion-ordered set of query descriptors.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<QueryDescriptor>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(entries: Vec<QueryDescriptor>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());

        for (position, entry) in entries.iter().enumerate() {
            entry.validate()?;
            if index.insert(entry.key.clone(), position).is_some() {
                return Err(CatalogError::DuplicateKey(entry.key.clone()));
            }
        }

        Ok(Self { entries, index })
    }

    /// Load a catalog from a JSON array of descriptors
    pub fn from_file(file_path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(file_path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let entries: Vec<QueryDescriptor> = serde_json::from_str(content)?;
        Self::new(entries)
    }

    /// The queries shipped with the dashboard.
    ///
    /// Project and dataset identifiers are embedded in the SQL text; point
    /// `--catalog` at a JSON file to run against another deployment.
    pub fn builtin() -> Self {
        let entries = vec![
            QueryDescriptor::new(
                "order_status",
                "Order Status Distribution",
                "Operational health of order processing",
                "#fde2e4",
                ORDER_STATUS_SQL,
            ),
            QueryDescriptor::new(
                "avg_order_value",
                "Average Order Value by Department",
                "Pricing strength across departments",
                "#e8f8f0",
                AVG_ORDER_VALUE_SQL,
            ),
            QueryDescriptor::new(
                "top_categories",
                "Top Categories by Revenue",
                "Product portfolio performance",
                "#efe9ff",
                TOP_CATEGORIES_SQL,
            ),
        ];

        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.key.clone(), position))
            .collect();

        Self { entries, index }
    }

    pub fn get(&self, key: &str) -> Result<&QueryDescriptor, CatalogError> {
        self.index
            .get(key)
            .map(|&position| &self.entries[position])
            .ok_or_else(|| CatalogError::NotFound(key.to_string()))
    }

    pub fn list(&self) -> &[QueryDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Accepts `#rgb`, `#rrggbb` or a bare CSS color name like `lavender`
fn is_valid_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => !color.is_empty() && color.chars().all(|c| c.is_ascii_alphabetic()),
    }
}

const ORDER_STATUS_SQL: &str = "
    SELECT status, COUNT(order_id) AS order_count
    FROM `cloudcourseworkb-481017.thelook.orders`
    GROUP BY status
    ORDER BY order_count DESC
";

const AVG_ORDER_VALUE_SQL: &str = "
    SELECT
      p.department,
      ROUND(AVG(oi.sale_price), 2) AS avg_order_value
    FROM `cloudcourseworkb-481017.thelook.order_items` oi
    JOIN `cloudcourseworkb-481017.thelook.products` p
    ON oi.product_id = p.id
    GROUP BY p.department
    ORDER BY avg_order_value DESC
";

const TOP_CATEGORIES_SQL: &str = "
    SELECT
      p.category,
      ROUND(SUM(oi.sale_price), 2) AS total_revenue
    FROM `cloudcourseworkb-481017.thelook.order_items` oi
    JOIN `cloudcourseworkb-481017.thelook.products` p
    ON oi.product_id = p.id
    GROUP BY p.category
    ORDER BY total_revenue DESC
    LIMIT 10
";
