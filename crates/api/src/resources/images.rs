//! Raw image upload storage.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use tracing::instrument;

use crate::client::ApiSession;
use crate::error::ApiError;
use crate::types::UploadedImage;

impl ApiSession<'_> {
    /// Upload an image file; returns the URL to store as `image_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the file (type or size).
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_image(
        &mut self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("image", part);
        let builder = self.request(Method::POST, "/api/upload-image").multipart(form);
        let value = self.send(builder).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Delete a previously uploaded file by path.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn delete_uploaded_image(&mut self, image_path: &str) -> Result<(), ApiError> {
        self.delete_with("/api/delete-image", &json!({ "image_path": image_path }))
            .await
            .map(|_| ())
    }
}
