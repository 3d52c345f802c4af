//! In-memory backend.
//!
//! Behaves like the hosted backend closely enough to run the admin service
//! locally and to test against: favourites are joined on read, so deleting a
//! menu item leaves dangling favourite rows behind.
use std::{collections::HashMap, fs, path::Path};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::CatalogError,
    models::{
        Account, Category, CategoryPatch, FavouriteRecord, MenuItem, MenuItemPatch, MenuItemRef,
        NewCategory, NewMenuItem, UserRef,
    },
    repository::{CatalogRepository, image_object_name},
};

const IMAGE_PREFIX: &str = "memory://images";

/// Seed document, usually loaded from JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub categories: Vec<Category>,
    pub menu_items: Vec<MenuItem>,
    pub users: Vec<SeedUser>,
    pub favourites: Vec<FavouriteRow>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavouriteRow {
    pub id: String,
    pub menu_item_id: String,
    pub user_id: String,
}

struct StoredUser {
    account: Account,
    password_hash: String,
}

#[derive(Default)]
struct Store {
    categories: Vec<Category>,
    menu_items: Vec<MenuItem>,
    users: Vec<StoredUser>,
    favourites: Vec<FavouriteRow>,
    images: HashMap<String, (String, Vec<u8>)>,
}

#[derive(Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Result<Self, CatalogError> {
        let users = seed
            .users
            .into_iter()
            .map(|user| -> Result<StoredUser, CatalogError> {
                Ok(StoredUser {
                    password_hash: hash_password(&user.password)?,
                    account: Account {
                        id: user.id,
                        username: user.username,
                        email: user.email,
                        role: user.role,
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Seeded {} categories, {} menu items, {} users, {} favourites",
            seed.categories.len(),
            seed.menu_items.len(),
            users.len(),
            seed.favourites.len()
        );

        Ok(Self {
            store: RwLock::new(Store {
                categories: seed.categories,
                menu_items: seed.menu_items,
                users,
                favourites: seed.favourites,
                images: HashMap::new(),
            }),
        })
    }

    pub fn from_seed_file(path: &Path) -> Result<Self, CatalogError> {
        let data = fs::read_to_string(path)
            .map_err(|e| CatalogError::Invalid(format!("cannot read {}: {e}", path.display())))?;

        Self::from_seed(serde_json::from_str(&data)?)
    }

    pub async fn add_user(
        &self,
        account: Account,
        password: &str,
    ) -> Result<(), CatalogError> {
        let password_hash = hash_password(password)?;
        self.store.write().await.users.push(StoredUser {
            account,
            password_hash,
        });

        Ok(())
    }

    pub async fn add_favourite(&self, menu_item_id: &str, user_id: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.store.write().await.favourites.push(FavouriteRow {
            id: id.clone(),
            menu_item_id: menu_item_id.to_string(),
            user_id: user_id.to_string(),
        });

        id
    }

    /// Content type and bytes of an uploaded image.
    pub async fn image(&self, reference: &str) -> Option<(String, Vec<u8>)> {
        let object = reference.strip_prefix(IMAGE_PREFIX)?.trim_start_matches('/');
        self.store.read().await.images.get(object).cloned()
    }

    pub async fn image_count(&self) -> usize {
        self.store.read().await.images.len()
    }
}

#[async_trait]
impl CatalogRepository for MemoryRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let mut categories = self.store.read().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(categories)
    }

    async fn create_category(
        &self,
        admin_id: &str,
        category: NewCategory,
    ) -> Result<Category, CatalogError> {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: category.name,
            created_by: Some(admin_id.to_string()),
            created_at: Some(Utc::now()),
        };

        self.store.write().await.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<Category, CatalogError> {
        let mut store = self.store.write().await;
        let category = store
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CatalogError::NotFound(format!("category {id}")))?;

        if let Some(name) = patch.name {
            category.name = name;
        }

        Ok(category.clone())
    }

    async fn delete_category(&self, id: &str) -> Result<(), CatalogError> {
        let mut store = self.store.write().await;

        if store.menu_items.iter().any(|item| item.category_id == id) {
            return Err(CatalogError::Conflict(format!(
                "category {id} still has menu items"
            )));
        }

        let before = store.categories.len();
        store.categories.retain(|c| c.id != id);

        if store.categories.len() == before {
            return Err(CatalogError::NotFound(format!("category {id}")));
        }

        Ok(())
    }

    async fn list_menu_items(
        &self,
        category_id: Option<&str>,
    ) -> Result<Vec<MenuItem>, CatalogError> {
        let store = self.store.read().await;
        let mut items: Vec<MenuItem> = store
            .menu_items
            .iter()
            .filter(|item| category_id.is_none_or(|id| item.category_id == id))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(items)
    }

    async fn create_menu_item(
        &self,
        admin_id: &str,
        item: NewMenuItem,
    ) -> Result<MenuItem, CatalogError> {
        let mut store = self.store.write().await;

        if !store.categories.iter().any(|c| c.id == item.category_id) {
            return Err(CatalogError::Conflict(format!(
                "category {} does not exist",
                item.category_id
            )));
        }

        let item = MenuItem {
            id: Uuid::new_v4().to_string(),
            category_id: item.category_id,
            name: item.name,
            price: item.price,
            image_ref: item.image_ref,
            created_by: Some(admin_id.to_string()),
            created_at: Some(Utc::now()),
        };

        store.menu_items.push(item.clone());
        Ok(item)
    }

    async fn update_menu_item(
        &self,
        id: &str,
        patch: MenuItemPatch,
    ) -> Result<MenuItem, CatalogError> {
        let mut store = self.store.write().await;

        if let Some(category_id) = &patch.category_id {
            if !store.categories.iter().any(|c| &c.id == category_id) {
                return Err(CatalogError::Conflict(format!(
                    "category {category_id} does not exist"
                )));
            }
        }

        let item = store
            .menu_items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| CatalogError::NotFound(format!("menu item {id}")))?;

        if let Some(category_id) = patch.category_id {
            item.category_id = category_id;
        }
        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        if let Some(image_ref) = patch.image_ref {
            item.image_ref = Some(image_ref);
        }

        Ok(item.clone())
    }

    async fn delete_menu_item(&self, id: &str) -> Result<(), CatalogError> {
        let mut store = self.store.write().await;
        let before = store.menu_items.len();
        store.menu_items.retain(|item| item.id != id);

        if store.menu_items.len() == before {
            return Err(CatalogError::NotFound(format!("menu item {id}")));
        }

        Ok(())
    }

    async fn list_favourites(&self) -> Result<Vec<FavouriteRecord>, CatalogError> {
        let store = self.store.read().await;

        let records = store
            .favourites
            .iter()
            .map(|row| FavouriteRecord {
                id: row.id.clone(),
                menu_item_id: row.menu_item_id.clone(),
                user_id: row.user_id.clone(),
                menu_item: store
                    .menu_items
                    .iter()
                    .find(|item| item.id == row.menu_item_id)
                    .map(|item| MenuItemRef {
                        id: item.id.clone(),
                        name: Some(item.name.clone()),
                        price: Some(item.price),
                        image_ref: item.image_ref.clone(),
                    }),
                user: store
                    .users
                    .iter()
                    .find(|user| user.account.id == row.user_id)
                    .map(|user| UserRef {
                        id: user.account.id.clone(),
                        username: Some(user.account.username.clone()),
                        email: Some(user.account.email.clone()),
                    }),
            })
            .collect();

        Ok(records)
    }

    async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, CatalogError> {
        let object = image_object_name(file_name);
        self.store
            .write()
            .await
            .images
            .insert(object.clone(), (content_type.to_string(), bytes));

        Ok(format!("{IMAGE_PREFIX}/{object}"))
    }

    async fn delete_image(&self, reference: &str) -> Result<(), CatalogError> {
        let object = reference
            .strip_prefix(IMAGE_PREFIX)
            .map(|object| object.trim_start_matches('/'))
            .ok_or_else(|| CatalogError::Invalid(format!("{reference} is not a stored image")))?;

        match self.store.write().await.images.remove(object) {
            Some(_) => Ok(()),
            None => Err(CatalogError::NotFound(format!("image {object}"))),
        }
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, CatalogError> {
        let store = self.store.read().await;

        Ok(store
            .users
            .iter()
            .find(|user| user.account.email == email)
            .filter(|user| verify_password(password, &user.password_hash))
            .map(|user| user.account.clone()))
    }
}

fn hash_password(password: &str) -> Result<String, CatalogError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CatalogError::Hash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
