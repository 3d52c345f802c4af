//! # Hosted Backend
//!
//! REST client for the hosted backend. Tables are served PostgREST style under
//! `/rest/v1`, images under `/storage/v1` and password sign in under `/auth/v1`.
//!
//! ## Tables
//! - `categories`: id, name, created_by, created_at
//! - `menuItem`: id, category_id, name, price, image_url, created_by, created_at
//! - `favourites`: id, menuItem_id, user_id
//! - `usersBT`: id, username, email, role
//!
//! ## Notes
//! - Every request carries the service key as both `apikey` and bearer token.
//! - Writes ask for `return=representation` so the stored row comes back.
//! - Filters are `column=eq.value` query pairs.
use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    error::CatalogError,
    models::{
        Account, Category, CategoryPatch, FavouriteRecord, MenuItem, MenuItemPatch, NewCategory,
        NewMenuItem,
    },
    repository::{CatalogRepository, image_object_name},
};

pub const CATEGORY_TABLE: &str = "categories";
pub const MENU_ITEM_TABLE: &str = "menuItem";
pub const FAVOURITE_TABLE: &str = "favourites";
pub const USER_TABLE: &str = "usersBT";

const FAVOURITE_SELECT: &str = "id,menuItem_id,user_id,\
    menuItem:menuItem_id(id,name,price,image_url),\
    userBT:user_id(id,username,email)";

const ACCOUNT_SELECT: &str = "id,username,email,role";

// PostgREST: zero rows for a single row request
const NO_ROWS: &str = "PGRST116";
// Postgres: foreign key violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

pub struct RestRepository {
    client: Client,
    base_url: String,
    bucket: String,
}

#[derive(Serialize)]
struct CategoryRow<'a> {
    name: &'a str,
    created_by: &'a str,
}

#[derive(Serialize)]
struct MenuItemRow<'a> {
    #[serde(flatten)]
    item: &'a NewMenuItem,
    created_by: &'a str,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct BackendMessage {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RestRepository {
    pub fn new(base_url: &str, api_key: &str, bucket: &str) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(api_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {api_key}"))?);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        })
    }

    fn table(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn select(&self, table: &str, columns: &str) -> RequestBuilder {
        self.client
            .get(self.table(table))
            .query(&[("select", columns)])
    }

    async fn insert<B, T>(&self, table: &str, body: &B) -> Result<T, CatalogError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("Inserting into {table}");

        let response = self
            .client
            .post(self.table(table))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        single(decode::<Vec<T>>(response).await?, table)
    }

    async fn update<B, T>(&self, table: &str, id: &str, body: &B) -> Result<T, CatalogError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("Updating {table} {id}");

        let response = self
            .client
            .patch(self.table(table))
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        single(decode::<Vec<T>>(response).await?, table)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), CatalogError> {
        debug!("Deleting {table} {id}");

        let response = self
            .client
            .delete(self.table(table))
            .query(&[("id", eq(id)), ("select", "id".to_string())])
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let deleted: Vec<serde_json::Value> = decode(response).await?;
        if deleted.is_empty() {
            return Err(CatalogError::NotFound(format!("{table} {id}")));
        }

        Ok(())
    }

    fn object_url(&self, object: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{object}",
            self.base_url, self.bucket
        )
    }

    fn public_url(&self, object: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{object}",
            self.base_url, self.bucket
        )
    }

    fn object_from_public_url<'a>(&self, reference: &'a str) -> Option<&'a str> {
        let prefix = format!(
            "{}/storage/v1/object/public/{}/",
            self.base_url, self.bucket
        );

        reference
            .strip_prefix(prefix.as_str())
            .filter(|object| !object.is_empty())
    }
}

#[async_trait]
impl CatalogRepository for RestRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let response = self
            .select(CATEGORY_TABLE, "*")
            .query(&[("order", "name.asc")])
            .send()
            .await?;

        decode(response).await
    }

    async fn create_category(
        &self,
        admin_id: &str,
        category: NewCategory,
    ) -> Result<Category, CatalogError> {
        let row = CategoryRow {
            name: &category.name,
            created_by: admin_id,
        };

        self.insert(CATEGORY_TABLE, &row).await
    }

    async fn update_category(
        &self,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<Category, CatalogError> {
        self.update(CATEGORY_TABLE, id, &patch).await
    }

    async fn delete_category(&self, id: &str) -> Result<(), CatalogError> {
        if !self.list_menu_items(Some(id)).await?.is_empty() {
            return Err(CatalogError::Conflict(format!(
                "category {id} still has menu items"
            )));
        }

        self.delete(CATEGORY_TABLE, id).await
    }

    async fn list_menu_items(
        &self,
        category_id: Option<&str>,
    ) -> Result<Vec<MenuItem>, CatalogError> {
        let mut request = self
            .select(MENU_ITEM_TABLE, "*")
            .query(&[("order", "name.asc")]);

        if let Some(category_id) = category_id {
            request = request.query(&[("category_id", eq(category_id))]);
        }

        decode(request.send().await?).await
    }

    async fn create_menu_item(
        &self,
        admin_id: &str,
        item: NewMenuItem,
    ) -> Result<MenuItem, CatalogError> {
        let row = MenuItemRow {
            item: &item,
            created_by: admin_id,
        };

        self.insert(MENU_ITEM_TABLE, &row).await
    }

    async fn update_menu_item(
        &self,
        id: &str,
        patch: MenuItemPatch,
    ) -> Result<MenuItem, CatalogError> {
        self.update(MENU_ITEM_TABLE, id, &patch).await
    }

    async fn delete_menu_item(&self, id: &str) -> Result<(), CatalogError> {
        self.delete(MENU_ITEM_TABLE, id).await
    }

    async fn list_favourites(&self) -> Result<Vec<FavouriteRecord>, CatalogError> {
        let response = self.select(FAVOURITE_TABLE, FAVOURITE_SELECT).send().await?;
        let records: Vec<FavouriteRecord> = decode(response).await?;

        debug!("Fetched {} favourite rows", records.len());
        Ok(records)
    }

    async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, CatalogError> {
        let object = image_object_name(file_name);
        let url = self.object_url(&object);

        debug!("Uploading {} bytes to {url}", bytes.len());

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let _: serde_json::Value = decode(response).await?;

        Ok(self.public_url(&object))
    }

    async fn delete_image(&self, reference: &str) -> Result<(), CatalogError> {
        let object = self.object_from_public_url(reference).ok_or_else(|| {
            CatalogError::Invalid(format!("{reference} is not in bucket {}", self.bucket))
        })?;

        debug!("Deleting image {object}");

        let response = self.client.delete(self.object_url(object)).send().await?;
        let _: serde_json::Value = decode(response).await?;

        Ok(())
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, CatalogError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED
        ) {
            return Ok(None);
        }

        let _: serde_json::Value = decode(response).await?;

        let response = self
            .select(USER_TABLE, ACCOUNT_SELECT)
            .query(&[("email", eq(email))])
            .send()
            .await?;

        let accounts: Vec<Account> = decode(response).await?;
        Ok(accounts.into_iter().next())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

fn header_value(value: &str) -> Result<HeaderValue, CatalogError> {
    HeaderValue::from_str(value)
        .map_err(|_| CatalogError::Invalid("api key is not a valid header value".to_string()))
}

fn single<T>(rows: Vec<T>, table: &str) -> Result<T, CatalogError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| CatalogError::NotFound(table.to_string()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CatalogError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(backend_error(status, &body));
    }

    Ok(serde_json::from_str(&body)?)
}

fn backend_error(status: StatusCode, body: &str) -> CatalogError {
    let parsed: Option<BackendMessage> = serde_json::from_str(body).ok();
    let (code, message) = match parsed {
        Some(BackendMessage { code, message }) => (code, message.unwrap_or_else(|| body.to_string())),
        None => (None, body.to_string()),
    };

    match (status, code.as_deref()) {
        (StatusCode::NOT_FOUND, _) | (_, Some(NO_ROWS)) => CatalogError::NotFound(message),
        (StatusCode::CONFLICT, _) | (_, Some(FOREIGN_KEY_VIOLATION)) => {
            CatalogError::Conflict(message)
        }
        _ => CatalogError::Backend {
            status: status.as_u16(),
            message,
        },
    }
}
