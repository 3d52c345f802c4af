use std::{
    collections::{HashMap, hash_map::Entry},
    sync::LazyLock,
};

use regex::Regex;
use serde::Serialize;

use crate::{
    error::CatalogError,
    models::{Category, MenuItem},
};

const MAX_NAME_LENGTH: usize = 100;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySection {
    pub category: Category,
    pub items: Vec<MenuItem>,
}

/// Admin catalog view: categories in listing order, each with its items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogTree {
    pub sections: Vec<CategorySection>,
    /// Items pointing at a category that is not in the listing.
    pub uncategorised: Vec<MenuItem>,
}

impl CatalogTree {
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum::<usize>() + self.uncategorised.len()
    }
}

pub fn group_by_category(categories: Vec<Category>, items: Vec<MenuItem>) -> CatalogTree {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(categories.len());
    let mut sections: Vec<CategorySection> = Vec::with_capacity(categories.len());

    for category in categories {
        // first listing wins if the backend ever returns a category twice
        if let Entry::Vacant(entry) = positions.entry(category.id.clone()) {
            entry.insert(sections.len());
            sections.push(CategorySection {
                category,
                items: Vec::new(),
            });
        }
    }

    let mut uncategorised = Vec::new();
    for item in items {
        match positions.get(&item.category_id) {
            Some(&index) => sections[index].items.push(item),
            None => uncategorised.push(item),
        }
    }

    CatalogTree {
        sections,
        uncategorised,
    }
}

pub fn normalize_name(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

pub fn validate_name(input: &str) -> Result<String, CatalogError> {
    let name = normalize_name(input);

    if name.is_empty() {
        return Err(CatalogError::Invalid("name must not be empty".to_string()));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CatalogError::Invalid(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    Ok(name)
}

pub fn validate_price(price: f64) -> Result<f64, CatalogError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::Invalid(format!("invalid price {price}")));
    }

    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str) -> Category {
        Category {
            id: id.to_string(),
            name: id.to_uppercase(),
            created_by: None,
            created_at: None,
        }
    }

    fn item(id: &str, category_id: &str) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            category_id: category_id.to_string(),
            name: id.to_string(),
            price: 6.0,
            image_ref: None,
            created_by: None,
            created_at: None,
        }
    }

    fn ids(items: &[MenuItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_grouping_keeps_order() {
        let tree = group_by_category(
            vec![category("tea"), category("coffee"), category("snacks")],
            vec![
                item("latte", "coffee"),
                item("oolong", "tea"),
                item("mocha", "coffee"),
                item("jasmine", "tea"),
            ],
        );

        let order: Vec<&str> = tree.sections.iter().map(|s| s.category.id.as_str()).collect();
        assert_eq!(order, vec!["tea", "coffee", "snacks"]);
        assert_eq!(ids(&tree.sections[0].items), vec!["oolong", "jasmine"]);
        assert_eq!(ids(&tree.sections[1].items), vec!["latte", "mocha"]);
        assert!(tree.sections[2].items.is_empty());
        assert!(tree.uncategorised.is_empty());
        assert_eq!(tree.item_count(), 4);
    }

    #[test]
    fn test_orphans_reported() {
        let tree = group_by_category(
            vec![category("tea")],
            vec![item("oolong", "tea"), item("croissant", "deleted")],
        );

        assert_eq!(ids(&tree.uncategorised), vec!["croissant"]);
        assert_eq!(tree.item_count(), 2);
    }

    #[test]
    fn test_duplicate_category_listed_once() {
        let tree = group_by_category(vec![category("tea"), category("tea")], vec![item("oolong", "tea")]);

        assert_eq!(tree.sections.len(), 1);
        assert_eq!(ids(&tree.sections[0].items), vec!["oolong"]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(group_by_category(Vec::new(), Vec::new()), CatalogTree::default());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Brown   Sugar\tBoba "), "Brown Sugar Boba");
        assert_eq!(normalize_name("Taro"), "Taro");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name(" Milk  Tea ").unwrap(), "Milk Tea");
        assert!(validate_name("  ").is_err());
        assert!(validate_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert_eq!(validate_price(0.0).unwrap(), 0.0);
        assert_eq!(validate_price(12.9).unwrap(), 12.9);
        assert!(validate_price(-1.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(f64::INFINITY).is_err());
    }
}
