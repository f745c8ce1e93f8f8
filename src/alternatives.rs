//! Healthier alternative lookup
//!
//! Walks a product's category tags from the end of the list backwards and
//! asks the food database for grade "a" products in each category, stopping
//! at the first category that yields anything.

use async_trait::async_trait;
use log::{debug, warn};

use crate::food_api::FoodApiError;
use crate::models::Product;

/// Most categories probed for one product
pub const MAX_PROBES: usize = 3;

pub const ALTERNATIVE_GRADE: &str = "a";
pub const ALTERNATIVE_SORT: &str = "popularity";
pub const ALTERNATIVE_PAGE_SIZE: u32 = 5;

/// A category + nutrition grade filtered search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryQuery {
    pub category: String,
    pub nutrition_grade: &'static str,
    pub sort_by: &'static str,
    pub page_size: u32,
}

impl CategoryQuery {
    pub fn alternatives_in(category: &str) -> Self {
        Self {
            category: category.to_string(),
            nutrition_grade: ALTERNATIVE_GRADE,
            sort_by: ALTERNATIVE_SORT,
            page_size: ALTERNATIVE_PAGE_SIZE,
        }
    }
}

#[async_trait]
pub trait CategorySearch {
    async fn search_by_category(&self, query: &CategoryQuery) -> Result<Vec<Product>, FoodApiError>;
}

/// Find well-graded products in the same category as `product`.
///
/// Tags are reversed before probing, so the last tag is tried first. Probes
/// run one after another and the first non-empty result is returned as-is.
/// Any search failure ends the walk with an empty list.
pub async fn find_alternatives<S>(search: &S, product: &Product) -> Vec<Product>
where
    S: CategorySearch + Sync + ?Sized,
{
    for (level, category) in product
        .categories_tags
        .iter()
        .rev()
        .take(MAX_PROBES)
        .enumerate()
    {
        debug!("Searching alternatives for category: {category} (level {level})");

        match search
            .search_by_category(&CategoryQuery::alternatives_in(category))
            .await
        {
            Ok(products) if !products.is_empty() => {
                debug!("Found {} alternatives for {category}", products.len());
                return products;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Alternative search failed for {category}: {e}");
                return Vec::new();
            }
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Canned results per category; records every query it receives
    #[derive(Default)]
    struct MockSearch {
        results: HashMap<String, Vec<Product>>,
        fail_on: Option<String>,
        calls: Mutex<Vec<CategoryQuery>>,
    }

    impl MockSearch {
        fn with(mut self, category: &str, codes: &[&str]) -> Self {
            let products = codes
                .iter()
                .map(|code| Product {
                    code: code.to_string(),
                    nutrition_grades: Some("a".to_string()),
                    ..Default::default()
                })
                .collect();
            self.results.insert(category.to_string(), products);
            self
        }

        fn called_categories(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|q| q.category.clone())
                .collect()
        }
    }

    #[async_trait]
    impl CategorySearch for MockSearch {
        async fn search_by_category(
            &self,
            query: &CategoryQuery,
        ) -> Result<Vec<Product>, FoodApiError> {
            self.calls.lock().unwrap().push(query.clone());
            if self.fail_on.as_deref() == Some(query.category.as_str()) {
                return Err(FoodApiError::Http {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(self.results.get(&query.category).cloned().unwrap_or_default())
        }
    }

    fn product_with(tags: &[&str]) -> Product {
        Product {
            code: "5449000000996".to_string(),
            categories_tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn cola() -> Product {
        product_with(&["en:beverages", "en:sodas", "en:colas"])
    }

    #[tokio::test]
    async fn most_specific_hit_stops_the_walk() {
        let search = MockSearch::default()
            .with("en:colas", &["111", "222"])
            .with("en:sodas", &["333"]);

        let found = find_alternatives(&search, &cola()).await;

        let codes: Vec<_> = found.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, ["111", "222"]);
        assert_eq!(search.called_categories(), ["en:colas"]);
    }

    #[tokio::test]
    async fn tiers_are_probed_in_reverse_tag_order() {
        let search = MockSearch::default().with("en:beverages", &["999"]);

        let found = find_alternatives(&search, &cola()).await;

        assert_eq!(found.len(), 1);
        assert_eq!(
            search.called_categories(),
            ["en:colas", "en:sodas", "en:beverages"]
        );
    }

    #[tokio::test]
    async fn all_empty_gives_empty_after_three_calls() {
        let search = MockSearch::default().with("en:drinks", &["never-reached"]);
        let product = product_with(&["en:drinks", "en:beverages", "en:sodas", "en:colas"]);

        let found = find_alternatives(&search, &product).await;

        assert!(found.is_empty());
        assert_eq!(search.calls.lock().unwrap().len(), MAX_PROBES);
    }

    #[tokio::test]
    async fn no_tags_makes_no_calls() {
        let search = MockSearch::default();
        assert!(find_alternatives(&search, &product_with(&[])).await.is_empty());
        assert!(search.called_categories().is_empty());
    }

    #[tokio::test]
    async fn failure_degrades_to_empty() {
        let search = MockSearch {
            fail_on: Some("en:sodas".to_string()),
            ..Default::default()
        }
        .with("en:beverages", &["999"]);

        let found = find_alternatives(&search, &cola()).await;

        assert!(found.is_empty());
        assert_eq!(search.called_categories(), ["en:colas", "en:sodas"]);
    }

    #[tokio::test]
    async fn queries_ask_for_grade_a_by_popularity() {
        let search = MockSearch::default();
        find_alternatives(&search, &product_with(&["en:snacks"])).await;

        let calls = search.calls.lock().unwrap();
        assert_eq!(calls[0], CategoryQuery {
            category: "en:snacks".to_string(),
            nutrition_grade: "a",
            sort_by: "popularity",
            page_size: 5,
        });
    }
}
