//! # Catalog
//!
//! Bubble Time menu catalog and favourites analytics.
//!
//! ## Overall Data
//!
//! - Categories (**string** id, **string** name): top level of the menu.
//! - Menu items (**string** id, category id, name, **float** price in RM, optional image url).
//! - Favourites (user id, menu item id): one row per "heart" a customer gives an item.
//!   Read back joined with the menu item and the user so the admin report can show names.
//!
//! ## Backend
//!
//! Storage, joins, auth and image hosting all live in the hosted backend. This crate
//! only talks to it through [`CatalogRepository`], which keeps the report logic testable
//! against [`memory::MemoryRepository`].
//!
//! ## Notes
//! - Joined relations can come back as an object or a single element array depending
//!   on how the backend infers the foreign key, both decode to the same model.
//! - Favourite rows are never cascaded when an item is deleted, so the report must
//!   drop rows whose join came back empty.

pub mod error;
pub mod favourites;
pub mod memory;
pub mod menu;
pub mod models;
pub mod remote;
pub mod repository;

pub use error::CatalogError;
pub use favourites::{FavouriteReport, FavouriteStats, FavouriteSummary, summarize};
pub use menu::{CatalogTree, CategorySection, group_by_category};
pub use repository::CatalogRepository;
