use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State as AxumState},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use catalog::{
    CatalogTree, FavouriteReport, group_by_category,
    models::{Category, MenuItem, MenuItemPatch},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::AppError,
    session::AdminSession,
    state::State,
    utils::{
        clean_category_patch, clean_menu_item_patch, clean_new_category, clean_new_menu_item,
        image_upload, parse_payload,
    },
};

type AppState = AxumState<Arc<State>>;

#[derive(Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
    admin_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct MenuItemFilter {
    category_id: Option<String>,
}

pub async fn login_handler(
    AxumState(state): AppState,
    body: Bytes,
) -> Result<Json<LoginResponse>, AppError> {
    let credentials: Credentials = parse_payload(&body)?;

    let Some(account) = state
        .repository
        .authenticate(credentials.email.trim(), &credentials.password)
        .await?
    else {
        warn!("Rejected login for {}: unknown credentials", credentials.email);
        return Err(AppError::InvalidCredentials);
    };

    // same response as unknown credentials, only the log tells them apart
    if !account.is_admin() {
        warn!("Rejected login for {}: role {:?}", account.email, account.role);
        return Err(AppError::InvalidCredentials);
    }

    let session = state.sessions.open(&account).await;
    info!("Admin {} signed in", account.email);

    Ok(Json(LoginResponse {
        token: session.token,
        admin_id: session.admin_id,
        expires_at: session.expires_at,
    }))
}

pub async fn logout_handler(
    AxumState(state): AppState,
    session: AdminSession,
) -> impl IntoResponse {
    state.sessions.close(&session.token).await;
    info!("Admin {} signed out", session.email);

    StatusCode::NO_CONTENT
}

pub async fn list_categories_handler(
    AxumState(state): AppState,
    _session: AdminSession,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.repository.list_categories().await?))
}

pub async fn create_category_handler(
    AxumState(state): AppState,
    session: AdminSession,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let category = clean_new_category(parse_payload(&body)?)?;
    let category = state
        .repository
        .create_category(&session.admin_id, category)
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category_handler(
    AxumState(state): AppState,
    _session: AdminSession,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Category>, AppError> {
    let patch = clean_category_patch(parse_payload(&body)?)?;

    Ok(Json(state.repository.update_category(&id, patch).await?))
}

pub async fn delete_category_handler(
    AxumState(state): AppState,
    _session: AdminSession,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.repository.delete_category(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn catalog_handler(
    AxumState(state): AppState,
    _session: AdminSession,
) -> Result<Json<CatalogTree>, AppError> {
    let (categories, items) = tokio::try_join!(
        state.repository.list_categories(),
        state.repository.list_menu_items(None),
    )?;

    Ok(Json(group_by_category(categories, items)))
}

pub async fn list_menu_items_handler(
    AxumState(state): AppState,
    _session: AdminSession,
    Query(filter): Query<MenuItemFilter>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    let items = state
        .repository
        .list_menu_items(filter.category_id.as_deref())
        .await?;

    Ok(Json(items))
}

pub async fn create_menu_item_handler(
    AxumState(state): AppState,
    session: AdminSession,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let item = clean_new_menu_item(parse_payload(&body)?)?;
    let item = state
        .repository
        .create_menu_item(&session.admin_id, item)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_menu_item_handler(
    AxumState(state): AppState,
    _session: AdminSession,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<MenuItem>, AppError> {
    let patch = clean_menu_item_patch(parse_payload(&body)?)?;

    Ok(Json(state.repository.update_menu_item(&id, patch).await?))
}

pub async fn delete_menu_item_handler(
    AxumState(state): AppState,
    _session: AdminSession,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.repository.delete_menu_item(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_image_handler(
    AxumState(state): AppState,
    _session: AdminSession,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MenuItem>, AppError> {
    let (content_type, file_name) = image_upload(&headers, &body)?;

    let image_ref = state
        .repository
        .upload_image(&file_name, body.to_vec(), &content_type)
        .await?;

    let patch = MenuItemPatch {
        image_ref: Some(image_ref.clone()),
        ..Default::default()
    };

    match state.repository.update_menu_item(&id, patch).await {
        Ok(item) => Ok(Json(item)),
        Err(e) => {
            // nothing points at the stored object
            if let Err(cleanup) = state.repository.delete_image(&image_ref).await {
                warn!("Failed to remove orphaned image {image_ref}: {cleanup}");
            }

            Err(e.into())
        }
    }
}

pub async fn favourites_handler(
    AxumState(state): AppState,
    _session: AdminSession,
) -> Result<Json<FavouriteReport>, AppError> {
    let records = state.repository.list_favourites().await?;

    Ok(Json(FavouriteReport::build(&records)))
}
