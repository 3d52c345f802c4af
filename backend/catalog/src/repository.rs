use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use uuid::Uuid;

use crate::{
    error::CatalogError,
    models::{
        Account, Category, CategoryPatch, FavouriteRecord, MenuItem, MenuItemPatch, NewCategory,
        NewMenuItem,
    },
};

static UNSAFE_OBJECT_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

/// Everything the admin needs from the hosted backend.
///
/// Writes that should be attributed take the acting admin id explicitly.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError>;

    async fn create_category(
        &self,
        admin_id: &str,
        category: NewCategory,
    ) -> Result<Category, CatalogError>;

    async fn update_category(
        &self,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<Category, CatalogError>;

    /// Fails with [`CatalogError::Conflict`] while the category still holds items.
    async fn delete_category(&self, id: &str) -> Result<(), CatalogError>;

    /// All items, or only those of one category.
    async fn list_menu_items(
        &self,
        category_id: Option<&str>,
    ) -> Result<Vec<MenuItem>, CatalogError>;

    async fn create_menu_item(
        &self,
        admin_id: &str,
        item: NewMenuItem,
    ) -> Result<MenuItem, CatalogError>;

    async fn update_menu_item(
        &self,
        id: &str,
        patch: MenuItemPatch,
    ) -> Result<MenuItem, CatalogError>;

    async fn delete_menu_item(&self, id: &str) -> Result<(), CatalogError>;

    /// Favourite rows joined with their menu item and user.
    async fn list_favourites(&self) -> Result<Vec<FavouriteRecord>, CatalogError>;

    /// Stores an image and returns the reference to save on a menu item.
    async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, CatalogError>;

    /// Removes an image by the reference [`upload_image`](Self::upload_image) returned.
    async fn delete_image(&self, reference: &str) -> Result<(), CatalogError>;

    /// `None` when the credentials do not match any account.
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, CatalogError>;
}

/// Unique object key for an uploaded image, keeping a readable tail.
pub fn image_object_name(file_name: &str) -> String {
    let cleaned = UNSAFE_OBJECT_CHARS.replace_all(file_name.trim(), "-");
    let cleaned = cleaned.trim_matches('-');

    if cleaned.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        format!("{}-{cleaned}", Uuid::new_v4())
    }
}
