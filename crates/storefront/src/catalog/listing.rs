//! Listing helpers: category filter, sort orders, and category summaries.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use kiosk_core::Product;

/// Category value that disables the filter.
pub const ALL_CATEGORIES: &str = "all";

/// Sort orders offered on the product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    /// Catalog order.
    #[default]
    Default,
    PriceLow,
    PriceHigh,
    /// Highest rated first.
    Rating,
    /// Title, A to Z.
    Name,
}

impl FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "default" => Ok(Self::Default),
            "price-low" => Ok(Self::PriceLow),
            "price-high" => Ok(Self::PriceHigh),
            "rating" => Ok(Self::Rating),
            "name" => Ok(Self::Name),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

impl ProductSort {
    /// Sort `products` in place. The sort is stable.
    pub fn apply(self, products: &mut [Product]) {
        match self {
            Self::Default => {}
            Self::PriceLow => products.sort_by(|a, b| a.price.cmp(&b.price)),
            Self::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
            Self::Rating => products.sort_by(|a, b| b.rating.rate.total_cmp(&a.rating.rate)),
            Self::Name => products.sort_by(|a, b| a.title.cmp(&b.title)),
        }
    }
}

/// Keep products in `category`. `None` or `"all"` keeps everything.
#[must_use]
pub fn filter_by_category(products: Vec<Product>, category: Option<&str>) -> Vec<Product> {
    match category {
        None | Some(ALL_CATEGORIES) => products,
        Some(category) => products
            .into_iter()
            .filter(|p| p.category == category)
            .collect(),
    }
}

/// A category and how many products it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub product_count: usize,
}

/// Categories in first-seen order with their product counts.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<CategorySummary> {
    let mut summaries: Vec<CategorySummary> = Vec::new();
    for product in products {
        match summaries.iter_mut().find(|s| s.name == product.category) {
            Some(summary) => summary.product_count += 1,
            None => summaries.push(CategorySummary {
                name: product.category.clone(),
                product_count: 1,
            }),
        }
    }
    summaries
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use kiosk_core::{ProductId, Rating};

    use super::*;

    fn product(id: i32, title: &str, cents: i64, category: &str, rate: f64) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            price: Decimal::new(cents, 2),
            description: String::new(),
            category: category.to_string(),
            image: String::new(),
            rating: Rating { rate, count: 3 },
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Backpack", 10_995, "men's clothing", 3.9),
            product(2, "T-Shirt", 2230, "men's clothing", 4.1),
            product(3, "Bracelet", 69_500, "jewelery", 4.6),
            product(4, "Monitor", 59_999, "electronics", 2.9),
        ]
    }

    fn ids(products: &[Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_sort_orders() {
        let cases = [
            (ProductSort::Default, vec![1, 2, 3, 4]),
            (ProductSort::PriceLow, vec![2, 1, 4, 3]),
            (ProductSort::PriceHigh, vec![3, 4, 1, 2]),
            (ProductSort::Rating, vec![3, 2, 1, 4]),
            (ProductSort::Name, vec![1, 3, 4, 2]),
        ];
        for (sort, expected) in cases {
            let mut products = catalog();
            sort.apply(&mut products);
            assert_eq!(ids(&products), expected, "{sort:?}");
        }
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!("price-high".parse::<ProductSort>().unwrap(), ProductSort::PriceHigh);
        assert_eq!("".parse::<ProductSort>().unwrap(), ProductSort::Default);
        assert!("cheapest".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_filter_by_category() {
        assert_eq!(ids(&filter_by_category(catalog(), Some("men's clothing"))), vec![1, 2]);
        assert_eq!(filter_by_category(catalog(), Some("all")).len(), 4);
        assert_eq!(filter_by_category(catalog(), None).len(), 4);
        assert!(filter_by_category(catalog(), Some("toys")).is_empty());
    }

    #[test]
    fn test_category_summaries() {
        let summaries = categories(&catalog());
        let pairs: Vec<(&str, usize)> = summaries
            .iter()
            .map(|s| (s.name.as_str(), s.product_count))
            .collect();
        assert_eq!(
            pairs,
            vec![("men's clothing", 2), ("jewelery", 1), ("electronics", 1)]
        );
    }
}
