//! Product image route handlers.
//!
//! Uploading is two backend calls: the file goes to the upload endpoint,
//! then the returned URL is attached to the product. Deleting reverses
//! both steps.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tidewater_api::{ImageInput, Product, ProductImage};
use tidewater_core::{ImageId, ProductId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::flash::Flash;
use crate::middleware::{Backend, RequireAdmin};
use crate::routes::{non_blank, parse_optional, redirect_with};
use crate::views::{AssetUrls, PageContext};

/// Largest request body accepted by the upload route.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Image list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/images.html")]
pub struct ImagesTemplate {
    pub page: PageContext,
    pub product: Product,
    pub assets: AssetUrls,
}

/// Alt text and sort order edits.
#[derive(Debug, Default, Deserialize)]
pub struct ImageForm {
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub sort_order: String,
}

/// A file read from the upload form.
#[derive(Debug)]
struct UploadedFile {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
    alt_text: Option<String>,
}

/// Read the `image` file and optional `alt_text` from the upload form.
async fn read_upload(mut multipart: Multipart) -> Result<Option<UploadedFile>> {
    let mut file = None;
    let mut alt_text = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        match field.name() {
            Some("image") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if !bytes.is_empty() {
                    file = Some((name, content_type, bytes.to_vec()));
                }
            }
            Some("alt_text") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                alt_text = non_blank(&text);
            }
            _ => {}
        }
    }

    Ok(file.map(|(name, content_type, bytes)| UploadedFile {
        name,
        content_type,
        bytes,
        alt_text,
    }))
}

/// Payload attaching a freshly uploaded file. The first image becomes primary.
fn attach_input(product: &Product, image_path: String, alt_text: Option<String>) -> ImageInput {
    ImageInput {
        image_path,
        alt_text,
        sort_order: i32::try_from(product.images.len()).ok(),
        is_primary: product.images.is_empty(),
    }
}

/// Payload that keeps an image's current values apart from the edits.
fn edit_input(image: &ProductImage) -> ImageInput {
    ImageInput {
        image_path: image.image_path.clone(),
        alt_text: image.alt_text.clone(),
        sort_order: Some(image.sort_order),
        is_primary: image.is_primary,
    }
}

fn find_image(product: &Product, image_id: ImageId) -> Result<&ProductImage> {
    product
        .images
        .iter()
        .find(|i| i.id == image_id)
        .ok_or_else(|| AppError::NotFound(format!("Image {image_id}")))
}

/// Product images with the upload form.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let result = backend.api().product(id).await;
    backend.save().await?;
    let product = result?;
    Ok(ImagesTemplate {
        page,
        product,
        assets: AssetUrls::new(backend.client().clone()),
    })
}

/// Upload a file and attach it to the product.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn upload(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let to = format!("/products/{id}/images");
    let Some(file) = read_upload(multipart).await? else {
        return redirect_with(&backend, Flash::error("Choose an image to upload"), &to).await;
    };

    let product = backend.api().product(id).await;
    backend.save().await?;
    let product = product?;

    let uploaded = match backend
        .api()
        .upload_image(&file.name, &file.content_type, file.bytes)
        .await
    {
        Ok(uploaded) => uploaded,
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => {
            backend.save().await?;
            tracing::warn!(error = %e, "Image upload failed");
            let flash = Flash::error(e.user_message("Image upload failed"));
            return redirect_with(&backend, flash, &to).await;
        }
    };

    let input = attach_input(&product, uploaded.image_url.clone(), file.alt_text);
    let result = backend.api().add_product_images(id, &[input]).await;
    if result.is_err() {
        // Orphaned upload; the backend keeps no reference to it.
        if let Err(e) = backend.api().delete_uploaded_image(&uploaded.image_url).await {
            tracing::warn!(error = %e, "Failed to remove orphaned upload");
        }
    }
    backend.save().await?;
    let flash = Flash::from_result(result, "Image added", "Could not attach the image")?;
    redirect_with(&backend, flash, &to).await
}

/// Update alt text and sort order.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id, image_id = %image_id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path((id, image_id)): Path<(ProductId, ImageId)>,
    Form(form): Form<ImageForm>,
) -> Result<Response> {
    let to = format!("/products/{id}/images");
    let mut errors = Vec::new();
    let sort_order = parse_optional::<i32>(&form.sort_order, "Sort order", &mut errors);
    if !errors.is_empty() {
        return redirect_with(&backend, Flash::error(errors.join(". ")), &to).await;
    }

    let product = backend.api().product(id).await;
    backend.save().await?;
    let product = product?;
    let mut input = edit_input(find_image(&product, image_id)?);
    input.alt_text = non_blank(&form.alt_text);
    if sort_order.is_some() {
        input.sort_order = sort_order;
    }

    let result = backend.api().update_product_image(id, image_id, &input).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Image updated", "Could not update the image")?;
    redirect_with(&backend, flash, &to).await
}

/// Make an image the product's primary image.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id, image_id = %image_id))]
pub async fn make_primary(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path((id, image_id)): Path<(ProductId, ImageId)>,
) -> Result<Response> {
    let product = backend.api().product(id).await;
    backend.save().await?;
    let product = product?;
    let mut input = edit_input(find_image(&product, image_id)?);
    input.is_primary = true;

    let result = backend.api().update_product_image(id, image_id, &input).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Primary image set", "Could not set the primary image")?;
    redirect_with(&backend, flash, &format!("/products/{id}/images")).await
}

/// Detach an image and delete the stored file.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id, image_id = %image_id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path((id, image_id)): Path<(ProductId, ImageId)>,
) -> Result<Response> {
    let product = backend.api().product(id).await;
    backend.save().await?;
    let product = product?;
    let image_path = find_image(&product, image_id)?.image_path.clone();

    let result = backend.api().delete_product_image(id, image_id).await;
    if result.is_ok()
        && let Err(e) = backend.api().delete_uploaded_image(&image_path).await
    {
        tracing::warn!(error = %e, "Image detached but file removal failed");
    }
    backend.save().await?;
    let flash = Flash::from_result(result, "Image deleted", "Could not delete the image")?;
    redirect_with(&backend, flash, &format!("/products/{id}/images")).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(images: &str) -> Product {
        serde_json::from_str(&format!(
            r#"{{"id":7,"product_code":"TW-007","name":"Tote","tax_rate":"10",
                "is_published":true,"images":{images}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_first_upload_becomes_primary() {
        let input = attach_input(&product("[]"), "/storage/a.jpg".to_string(), None);
        assert!(input.is_primary);
        assert_eq!(input.sort_order, Some(0));
    }

    #[test]
    fn test_later_uploads_append() {
        let p = product(
            r#"[{"id":1,"product_id":7,"image_path":"/storage/a.jpg","sort_order":0,"is_primary":true}]"#,
        );
        let input = attach_input(&p, "/storage/b.jpg".to_string(), Some("Side".to_string()));
        assert!(!input.is_primary);
        assert_eq!(input.sort_order, Some(1));
        assert_eq!(input.alt_text.as_deref(), Some("Side"));
    }

    #[test]
    fn test_edit_input_keeps_current_values() {
        let p = product(
            r#"[{"id":3,"product_id":7,"image_path":"/storage/c.jpg","alt_text":"Front","sort_order":2,"is_primary":false}]"#,
        );
        let input = edit_input(find_image(&p, ImageId::new(3)).unwrap());
        assert_eq!(input.image_path, "/storage/c.jpg");
        assert_eq!(input.sort_order, Some(2));
        assert!(find_image(&p, ImageId::new(4)).is_err());
    }
}
