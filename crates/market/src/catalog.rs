//! In-memory catalog filtering and sorting.
//!
//! Pure functions over a fetched product list; the browse page re-runs them
//! on every filter change without touching the store.

use rust_decimal::Decimal;

use artvaani_core::Product;

/// Sort order for the catalog view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

/// Buyer-selected filters.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// A product is kept only if it carries *every* selected tag.
    pub tags: Vec<String>,
    /// Inclusive price bounds; unset bounds default to `[0, +inf)`.
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: SortOption,
}

/// Filter and sort a product list.
///
/// The sort is stable: products with equal keys keep their input order.
#[must_use]
pub fn filter_and_sort(products: &[Product], filter: &CatalogFilter) -> Vec<Product> {
    let mut results: Vec<Product> = products
        .iter()
        .filter(|product| {
            filter
                .tags
                .iter()
                .all(|tag| product.ai_tags.iter().any(|t| t == tag))
        })
        .filter(|product| {
            let price = product.effective_price();
            let min = filter.min_price.unwrap_or(Decimal::ZERO);
            price >= min && filter.max_price.is_none_or(|max| price <= max)
        })
        .cloned()
        .collect();

    match filter.sort {
        SortOption::Newest => results.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOption::Oldest => results.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOption::PriceAsc => {
            results.sort_by(|a, b| a.effective_price().cmp(&b.effective_price()));
        }
        SortOption::PriceDesc => {
            results.sort_by(|a, b| b.effective_price().cmp(&a.effective_price()));
        }
    }

    results
}

/// Every tag appearing across the list, deduplicated, in first-seen order.
/// Feeds the filter UI's tag picker.
#[must_use]
pub fn all_tags(products: &[Product]) -> Vec<String> {
    let mut tags = Vec::new();
    for product in products {
        for tag in &product.ai_tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(id: &str, price: Decimal, tags: &[&str], created: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "artisanId": "a1",
            "imageUrl": "https://img.example/x.jpg",
            "aiPrice": price.to_string(),
            "aiTags": tags,
            "status": "published",
            "createdAt": created,
            "updatedAt": created,
        }))
        .expect("product")
    }

    fn sample() -> Vec<Product> {
        vec![
            product("p1", dec!(300), &["pottery"], "2026-01-03T00:00:00Z"),
            product("p2", dec!(100), &["pottery", "terracotta"], "2026-01-01T00:00:00Z"),
            product("p3", dec!(200), &["weaving"], "2026-01-02T00:00:00Z"),
        ]
    }

    #[test]
    fn test_tag_filter_requires_every_tag() {
        let products = sample();
        let filter = CatalogFilter {
            tags: vec!["pottery".to_owned()],
            ..CatalogFilter::default()
        };
        let results = filter_and_sort(&products, &filter);
        let ids: Vec<&str> = results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        let filter = CatalogFilter {
            tags: vec!["pottery".to_owned(), "terracotta".to_owned()],
            ..CatalogFilter::default()
        };
        let results = filter_and_sort(&products, &filter);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_str(), "p2");
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let products = vec![
            product("cheap", dec!(50), &[], "2026-01-01T00:00:00Z"),
            product("low", dec!(100), &[], "2026-01-01T00:00:00Z"),
            product("high", dec!(500), &[], "2026-01-01T00:00:00Z"),
            product("rich", dec!(600), &[], "2026-01-01T00:00:00Z"),
        ];
        let filter = CatalogFilter {
            min_price: Some(dec!(100)),
            max_price: Some(dec!(500)),
            ..CatalogFilter::default()
        };
        let results = filter_and_sort(&products, &filter);
        let ids: Vec<&str> = results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["low", "high"]);
    }

    #[test]
    fn test_sort_orders() {
        let products = sample();

        let by = |sort: SortOption| -> Vec<String> {
            filter_and_sort(
                &products,
                &CatalogFilter {
                    sort,
                    ..CatalogFilter::default()
                },
            )
            .iter()
            .map(|p| p.id.to_string())
            .collect()
        };

        assert_eq!(by(SortOption::Newest), vec!["p1", "p3", "p2"]);
        assert_eq!(by(SortOption::Oldest), vec!["p2", "p3", "p1"]);
        assert_eq!(by(SortOption::PriceAsc), vec!["p2", "p3", "p1"]);
        assert_eq!(by(SortOption::PriceDesc), vec!["p1", "p3", "p2"]);
    }

    #[test]
    fn test_stable_sort_breaks_ties_by_input_order() {
        let products = vec![
            product("first", dec!(100), &[], "2026-01-01T00:00:00Z"),
            product("second", dec!(100), &[], "2026-01-01T00:00:00Z"),
        ];
        let results = filter_and_sort(
            &products,
            &CatalogFilter {
                sort: SortOption::PriceAsc,
                ..CatalogFilter::default()
            },
        );
        let ids: Vec<&str> = results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_all_tags_first_seen_order() {
        let products = sample();
        assert_eq!(all_tags(&products), vec!["pottery", "terracotta", "weaving"]);
    }
}
