//! # Favourites Report
//!
//! Groups raw favourite rows into one summary per menu item.
//!
//! ## Rules
//! - Rows whose menu item or user join came back empty are skipped, they never count.
//! - Groups keep the order in which their item was first seen.
//! - Name, price and image come from the first row of each group.
//! - Usernames are deduplicated by exact string, first seen order.
//! - Summaries are ordered by count, highest first. Equal counts keep group order.
use std::collections::{HashMap, hash_map::Entry};

use serde::Serialize;

use crate::models::{FavouriteRecord, MenuItemRef};

pub const UNKNOWN_ITEM: &str = "Unknown Item";
pub const UNKNOWN_USER: &str = "Unknown User";
pub const NO_FAVOURITES: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteSummary {
    pub menu_item_id: String,
    pub item_name: String,
    pub price: f64,
    pub image_ref: String,
    pub favourite_count: usize,
    pub favouriting_users: Vec<String>,
}

impl FavouriteSummary {
    fn open(menu_item_id: &str, item: &MenuItemRef) -> Self {
        Self {
            menu_item_id: menu_item_id.to_string(),
            item_name: non_empty(item.name.as_deref(), UNKNOWN_ITEM),
            price: item.price.unwrap_or(0.0),
            image_ref: item.image_ref.clone().unwrap_or_default(),
            favourite_count: 0,
            favouriting_users: Vec::new(),
        }
    }

    fn add(&mut self, username: String) {
        self.favourite_count += 1;

        if !self.favouriting_users.contains(&username) {
            self.favouriting_users.push(username);
        }
    }
}

pub fn summarize(records: &[FavouriteRecord]) -> Vec<FavouriteSummary> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<FavouriteSummary> = Vec::new();

    for record in records {
        let (Some(item), Some(user)) = (&record.menu_item, &record.user) else {
            continue;
        };
        if record.menu_item_id.is_empty() {
            continue;
        }

        let index = match positions.entry(record.menu_item_id.as_str()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                summaries.push(FavouriteSummary::open(&record.menu_item_id, item));
                *entry.insert(summaries.len() - 1)
            }
        };

        summaries[index].add(non_empty(user.username.as_deref(), UNKNOWN_USER));
    }

    // sort_by is stable, ties stay in first seen order
    summaries.sort_by(|a, b| b.favourite_count.cmp(&a.favourite_count));
    summaries
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteStats {
    pub total_items: usize,
    pub total_favourites: usize,
    pub most_popular: String,
}

impl FavouriteStats {
    /// Expects summaries already ranked by [`summarize`].
    pub fn from_summaries(summaries: &[FavouriteSummary]) -> Self {
        Self {
            total_items: summaries.len(),
            total_favourites: summaries.iter().map(|s| s.favourite_count).sum(),
            most_popular: summaries
                .first()
                .map(|s| s.item_name.clone())
                .unwrap_or_else(|| NO_FAVOURITES.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavouriteReport {
    pub summaries: Vec<FavouriteSummary>,
    pub stats: FavouriteStats,
}

impl FavouriteReport {
    pub fn build(records: &[FavouriteRecord]) -> Self {
        let summaries = summarize(records);
        let stats = FavouriteStats::from_summaries(&summaries);

        Self { summaries, stats }
    }
}

fn non_empty(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRef;

    fn record(id: &str, item: &str, user: &str) -> FavouriteRecord {
        FavouriteRecord {
            id: id.to_string(),
            menu_item_id: item.to_string(),
            user_id: format!("id-{user}"),
            menu_item: Some(MenuItemRef {
                id: item.to_string(),
                name: Some(item.to_string()),
                price: Some(8.5),
                image_ref: Some(format!("{item}.png")),
            }),
            user: Some(UserRef {
                id: format!("id-{user}"),
                username: Some(user.to_string()),
                email: Some(format!("{user}@example.com")),
            }),
        }
    }

    fn names(summaries: &[FavouriteSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.item_name.as_str()).collect()
    }

    #[test]
    fn test_basic_grouping() {
        let records = vec![
            record("1", "bubble-tea", "alice"),
            record("2", "bubble-tea", "bob"),
            record("3", "milk-tea", "alice"),
        ];

        let summaries = summarize(&records);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].item_name, "bubble-tea");
        assert_eq!(summaries[0].favourite_count, 2);
        assert_eq!(summaries[0].favouriting_users, vec!["alice", "bob"]);
        assert_eq!(summaries[0].price, 8.5);
        assert_eq!(summaries[0].image_ref, "bubble-tea.png");
        assert_eq!(summaries[1].item_name, "milk-tea");
        assert_eq!(summaries[1].favourite_count, 1);
        assert_eq!(summaries[1].favouriting_users, vec!["alice"]);
    }

    #[test]
    fn test_dangling_join_dropped() {
        let mut missing_item = record("2", "bubble-tea", "bob");
        missing_item.menu_item = None;
        let mut missing_user = record("3", "milk-tea", "carol");
        missing_user.user = None;

        let records = vec![record("1", "bubble-tea", "alice"), missing_item, missing_user];
        let summaries = summarize(&records);

        assert_eq!(names(&summaries), vec!["bubble-tea"]);
        assert_eq!(summaries[0].favourite_count, 1);
        assert_eq!(summaries[0].favouriting_users, vec!["alice"]);
    }

    #[test]
    fn test_nulled_foreign_key_dropped() {
        let records: Vec<FavouriteRecord> = serde_json::from_str(
            r#"[
                {
                    "id": 1, "menuItem_id": "m1", "user_id": "u1",
                    "menuItem": { "id": "m1", "name": "bubble-tea", "price": 9 },
                    "userBT": { "id": "u1", "username": "alice" }
                },
                {
                    "id": 2, "menuItem_id": null, "user_id": "u2",
                    "menuItem": null,
                    "userBT": { "id": "u2", "username": "bob" }
                }
            ]"#,
        )
        .unwrap();

        let report = FavouriteReport::build(&records);

        assert_eq!(names(&report.summaries), vec!["bubble-tea"]);
        assert_eq!(report.stats.total_favourites, 1);
        assert_eq!(report.summaries[0].favouriting_users, vec!["alice"]);
    }

    #[test]
    fn test_duplicate_favourite_by_same_user() {
        let records = vec![record("1", "bubble-tea", "alice"), record("2", "bubble-tea", "alice")];
        let summaries = summarize(&records);

        assert_eq!(summaries[0].favourite_count, 2);
        assert_eq!(summaries[0].favouriting_users, vec!["alice"]);
    }

    #[test]
    fn test_empty_input() {
        let report = FavouriteReport::build(&[]);

        assert!(report.summaries.is_empty());
        assert_eq!(report.stats.total_items, 0);
        assert_eq!(report.stats.total_favourites, 0);
        assert_eq!(report.stats.most_popular, NO_FAVOURITES);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let records = vec![
            record("1", "c", "alice"),
            record("2", "a", "alice"),
            record("3", "b", "alice"),
            record("4", "b", "bob"),
            record("5", "a", "bob"),
            record("6", "d", "alice"),
        ];

        let summaries = summarize(&records);

        assert_eq!(names(&summaries), vec!["a", "b", "c", "d"]);
        assert!(
            summaries
                .windows(2)
                .all(|pair| pair[0].favourite_count >= pair[1].favourite_count)
        );
    }

    #[test]
    fn test_count_conservation_and_dedup() {
        let mut dangling = record("7", "a", "erin");
        dangling.menu_item = None;

        let records = vec![
            record("1", "a", "alice"),
            record("2", "a", "alice"),
            record("3", "a", "bob"),
            record("4", "b", "carol"),
            record("5", "c", "dave"),
            record("6", "c", "erin"),
            dangling,
        ];

        let summaries = summarize(&records);
        let valid = records
            .iter()
            .filter(|r| r.menu_item.is_some() && r.user.is_some())
            .count();

        assert_eq!(summaries.iter().map(|s| s.favourite_count).sum::<usize>(), valid);
        for summary in &summaries {
            assert!(summary.favouriting_users.len() <= summary.favourite_count);
        }

        let a = summaries.iter().find(|s| s.menu_item_id == "a").unwrap();
        assert_eq!(a.favouriting_users.len(), 2);
        let c = summaries.iter().find(|s| s.menu_item_id == "c").unwrap();
        assert_eq!(c.favouriting_users.len(), c.favourite_count);
    }

    #[test]
    fn test_idempotent() {
        let records = vec![
            record("1", "x", "alice"),
            record("2", "y", "bob"),
            record("3", "y", "alice"),
        ];

        assert_eq!(summarize(&records), summarize(&records));
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let mut first = record("1", "m1", "alice");
        first.menu_item = Some(MenuItemRef {
            id: "m1".to_string(),
            name: Some(String::new()),
            price: None,
            image_ref: None,
        });
        first.user.as_mut().unwrap().username = None;

        let mut second = record("2", "m1", "bob");
        second.user.as_mut().unwrap().username = Some(String::new());

        let summaries = summarize(&[first, second]);

        assert_eq!(summaries[0].item_name, UNKNOWN_ITEM);
        assert_eq!(summaries[0].price, 0.0);
        assert_eq!(summaries[0].image_ref, "");
        assert_eq!(summaries[0].favourite_count, 2);
        assert_eq!(summaries[0].favouriting_users, vec![UNKNOWN_USER]);
    }

    #[test]
    fn test_first_record_wins_item_details() {
        let first = record("1", "m1", "alice");
        let mut renamed = record("2", "m1", "bob");
        renamed.menu_item.as_mut().unwrap().name = Some("Renamed".to_string());
        renamed.menu_item.as_mut().unwrap().price = Some(99.0);

        let summaries = summarize(&[first, renamed]);

        assert_eq!(summaries[0].item_name, "m1");
        assert_eq!(summaries[0].price, 8.5);
    }

    #[test]
    fn test_stats() {
        let records = vec![
            record("1", "milk-tea", "alice"),
            record("2", "bubble-tea", "alice"),
            record("3", "bubble-tea", "bob"),
        ];

        let report = FavouriteReport::build(&records);

        assert_eq!(report.stats.total_items, 2);
        assert_eq!(report.stats.total_favourites, 3);
        assert_eq!(report.stats.most_popular, "bubble-tea");
    }
}
