use std::collections::BTreeMap;

use actix_multipart::Multipart;
use futures_util::StreamExt;
use thiserror::Error;

use sapphire_trails::api::Upload;

const MAX_FILE_BYTES: usize = 8 * 1024 * 1024;
const MAX_TEXT_BYTES: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Could not read the form: {0}")]
    Multipart(String),

    #[error("'{0}' is larger than 8 MB")]
    TooLarge(String),

    #[error("'{0}' is not an image")]
    NotAnImage(String),
}

impl From<actix_multipart::MultipartError> for UploadError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        Self::Multipart(err.to_string())
    }
}

/// A `multipart/form-data` post split into text values and files. Empty
/// file inputs are dropped.
#[derive(Debug, Default)]
pub struct PostedForm {
    pub values: BTreeMap<String, String>,
    pub uploads: BTreeMap<String, Upload>,
}

impl PostedForm {
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(|v| v.trim()).unwrap_or_default()
    }
}

pub async fn read_form(mut payload: Multipart) -> Result<PostedForm, UploadError> {
    let mut form = PostedForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let disposition = field.content_disposition();
        let name = disposition
            .and_then(|cd| cd.get_name().map(str::to_string))
            .unwrap_or_default();
        let filename = disposition.and_then(|cd| cd.get_filename().map(str::to_string));
        let declared_type = field.content_type().map(|m| m.essence_str().to_string());

        if name.is_empty() {
            continue;
        }

        let limit = if filename.is_some() { MAX_FILE_BYTES } else { MAX_TEXT_BYTES };
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if bytes.len() + chunk.len() > limit {
                return Err(UploadError::TooLarge(filename.unwrap_or(name)));
            }
            bytes.extend_from_slice(&chunk);
        }

        match filename {
            Some(filename) => {
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                let content_type = declared_type
                    .filter(|t| t != "application/octet-stream")
                    .unwrap_or_else(|| {
                        mime_guess::from_path(&filename)
                            .first_or_octet_stream()
                            .essence_str()
                            .to_string()
                    });
                if !content_type.starts_with("image/") {
                    return Err(UploadError::NotAnImage(filename));
                }
                form.uploads
                    .insert(name, Upload::new(filename, content_type, bytes));
            }
            None => {
                let value = String::from_utf8_lossy(&bytes).into_owned();
                form.values.insert(name, value);
            }
        }
    }

    Ok(form)
}
