use axum::{
    body::Bytes,
    http::{HeaderMap, header::CONTENT_TYPE},
};
use catalog::{
    menu::{validate_name, validate_price},
    models::{CategoryPatch, MenuItemPatch, NewCategory, NewMenuItem},
};
use serde::de::DeserializeOwned;

use crate::error::AppError::{self, MalformedPayload};

pub const FILE_NAME_HEADER: &str = "x-file-name";
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub fn parse_payload<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|_| MalformedPayload)
}

pub fn clean_new_category(category: NewCategory) -> Result<NewCategory, AppError> {
    Ok(NewCategory {
        name: validate_name(&category.name)?,
    })
}

pub fn clean_category_patch(patch: CategoryPatch) -> Result<CategoryPatch, AppError> {
    let Some(name) = patch.name else {
        return Err(MalformedPayload);
    };

    Ok(CategoryPatch {
        name: Some(validate_name(&name)?),
    })
}

pub fn clean_new_menu_item(item: NewMenuItem) -> Result<NewMenuItem, AppError> {
    if item.category_id.trim().is_empty() {
        return Err(MalformedPayload);
    }

    Ok(NewMenuItem {
        category_id: item.category_id.trim().to_string(),
        name: validate_name(&item.name)?,
        price: validate_price(item.price)?,
        image_ref: item.image_ref,
    })
}

pub fn clean_menu_item_patch(patch: MenuItemPatch) -> Result<MenuItemPatch, AppError> {
    if patch.is_empty() {
        return Err(MalformedPayload);
    }

    Ok(MenuItemPatch {
        category_id: patch.category_id.map(|id| id.trim().to_string()),
        name: patch.name.as_deref().map(validate_name).transpose()?,
        price: patch.price.map(validate_price).transpose()?,
        image_ref: patch.image_ref,
    })
}

/// Content type and file name of an uploaded image.
pub fn image_upload(headers: &HeaderMap, body: &Bytes) -> Result<(String, String), AppError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .filter(|value| value.starts_with("image/"))
        .ok_or(MalformedPayload)?;

    if body.is_empty() || body.len() > MAX_IMAGE_BYTES {
        return Err(MalformedPayload);
    }

    let file_name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let extension = content_type.trim_start_matches("image/");
            format!("image.{extension}")
        });

    Ok((content_type.to_string(), file_name))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_parse_payload() {
        let body = Bytes::from_static(br#"{ "name": "Tea" }"#);
        let category: NewCategory = parse_payload(&body).unwrap();
        assert_eq!(category.name, "Tea");

        let garbage = Bytes::from_static(b"name=Tea");
        assert!(matches!(parse_payload::<NewCategory>(&garbage), Err(MalformedPayload)));
    }

    #[test]
    fn test_clean_new_menu_item() {
        let item = clean_new_menu_item(NewMenuItem {
            category_id: " c1 ".to_string(),
            name: "  Brown  Sugar ".to_string(),
            price: 10.0,
            image_ref: None,
        })
        .unwrap();

        assert_eq!(item.category_id, "c1");
        assert_eq!(item.name, "Brown Sugar");

        let negative = clean_new_menu_item(NewMenuItem {
            category_id: "c1".to_string(),
            name: "Tea".to_string(),
            price: -2.0,
            image_ref: None,
        });
        assert!(matches!(negative, Err(AppError::Catalog(_))));
    }

    #[test]
    fn test_empty_patches_rejected() {
        assert!(matches!(
            clean_menu_item_patch(MenuItemPatch::default()),
            Err(MalformedPayload)
        ));
        assert!(matches!(
            clean_category_patch(CategoryPatch::default()),
            Err(MalformedPayload)
        ));
    }

    #[test]
    fn test_image_upload() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        let body = Bytes::from_static(&[0x89, 0x50, 0x4e, 0x47]);

        let (content_type, file_name) = image_upload(&headers, &body).unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(file_name, "image.png");

        headers.insert(FILE_NAME_HEADER, HeaderValue::from_static("boba.png"));
        assert_eq!(image_upload(&headers, &body).unwrap().1, "boba.png");

        assert!(image_upload(&headers, &Bytes::new()).is_err());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(image_upload(&headers, &body).is_err());
    }
}
