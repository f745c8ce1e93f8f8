//! Open Food Facts API client
//!
//! Wraps the three read-only endpoints the calculator needs: barcode
//! lookup, free-text search and category/grade filtered search.
//!
//! API reference: <https://openfoodfacts.github.io/openfoodfacts-server/api/>

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::alternatives::{CategoryQuery, CategorySearch};
use crate::models::Product;

pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

/// Shortest and longest GTIN accepted (EAN-8 up to GTIN-14)
pub const MIN_BARCODE_LEN: usize = 8;
pub const MAX_BARCODE_LEN: usize = 14;

/// Fields requested from search endpoints
const SEARCH_FIELDS: &str =
    "code,product_name,image_url,nutriments,serving_size,brands,categories_tags,nutrition_grades";

/// True for an all-digit GTIN of accepted length
pub fn is_valid_barcode(text: &str) -> bool {
    (MIN_BARCODE_LEN..=MAX_BARCODE_LEN).contains(&text.len())
        && text.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Error)]
pub enum FoodApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request to Open Food Facts failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Open Food Facts returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("could not decode Open Food Facts response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct FoodApiConfig {
    pub base_url: String,
    /// Open Food Facts asks clients to identify themselves
    pub user_agent: String,
    pub timeout_secs: u64,
    pub search_page_size: u32,
}

impl Default for FoodApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("worthit/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 10,
            search_page_size: 20,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    status: i64,
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<Product>,
}

pub struct OpenFoodFactsClient {
    config: FoodApiConfig,
    http_client: reqwest::Client,
}

impl OpenFoodFactsClient {
    pub fn new(config: FoodApiConfig) -> Result<Self, FoodApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(FoodApiError::Transport)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Look up a product by barcode. `Ok(None)` means the database has no
    /// such product.
    pub async fn get_product(&self, barcode: &str) -> Result<Option<Product>, FoodApiError> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Err(FoodApiError::InvalidInput("barcode cannot be empty".to_string()));
        }
        if !is_valid_barcode(barcode) {
            return Err(FoodApiError::InvalidInput(format!(
                "'{barcode}' is not a barcode ({MIN_BARCODE_LEN} to {MAX_BARCODE_LEN} digits)"
            )));
        }

        let url = format!("{}/api/v0/product/{barcode}.json", self.config.base_url);
        debug!("Looking up product {barcode}");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(FoodApiError::Transport)?;
        // unknown barcodes may come back as 404 with a status 0 body
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let lookup: LookupResponse = decode(response).await?;

        if lookup.status == 1 {
            Ok(lookup.product)
        } else {
            Ok(None)
        }
    }

    /// Free-text product search, one page of results
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, FoodApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FoodApiError::InvalidInput(
                "search query cannot be empty".to_string(),
            ));
        }

        let page_size = self.config.search_page_size.to_string();
        let params = [
            ("search_terms", query),
            ("search_simple", "1"),
            ("action", "process"),
            ("json", "1"),
            ("page_size", page_size.as_str()),
            ("fields", SEARCH_FIELDS),
        ];

        debug!("Searching products for '{query}'");
        let search: SearchResponse = self.search(&params).await?;
        Ok(search.products)
    }

    async fn search(&self, params: &[(&str, &str)]) -> Result<SearchResponse, FoodApiError> {
        let url = format!("{}/cgi/search.pl", self.config.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(FoodApiError::Transport)?;
        decode(response).await
    }
}

#[async_trait]
impl CategorySearch for OpenFoodFactsClient {
    async fn search_by_category(&self, query: &CategoryQuery) -> Result<Vec<Product>, FoodApiError> {
        let page_size = query.page_size.to_string();
        let params = [
            ("action", "process"),
            ("tagtype_0", "categories"),
            ("tag_contains_0", "contains"),
            ("tag_0", query.category.as_str()),
            ("tagtype_1", "nutrition_grades"),
            ("tag_contains_1", "contains"),
            ("tag_1", query.nutrition_grade),
            ("sort_by", query.sort_by),
            ("page_size", page_size.as_str()),
            ("json", "1"),
            ("fields", SEARCH_FIELDS),
        ];

        let search = self.search(&params).await?;
        Ok(search.products)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, FoodApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FoodApiError::Http {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }
    response.json().await.map_err(FoodApiError::Decode)
}
