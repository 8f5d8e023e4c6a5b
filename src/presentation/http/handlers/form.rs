//! Multipart form reading shared by the room and upload handlers.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::domain::Upload;
use crate::shared::error::AppError;

/// A fully buffered multipart body: text parts by name, file parts by name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: HashMap<String, Vec<String>>,
    files: HashMap<String, Upload>,
}

impl MultipartForm {
    /// Drain the request body. Parts carrying a file name are files; empty
    /// file parts (a form submitted without choosing a file) are skipped.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    if !bytes.is_empty() {
                        form.files
                            .insert(name, Upload::new(filename, content_type, bytes.to_vec()));
                    }
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    form.texts.entry(name).or_default().push(text);
                }
            }
        }

        Ok(form)
    }

    /// First value of a text part.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a repeated text part.
    pub fn texts(&self, name: &str) -> &[String] {
        self.texts.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Optional boolean part (`true`/`false`, `1`/`0`, `on`).
    pub fn flag(&self, name: &str) -> Result<Option<bool>, AppError> {
        self.text(name)
            .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "on" => Ok(true),
                "false" | "0" | "off" | "" => Ok(false),
                _ => Err(AppError::BadRequest(format!("Invalid boolean for {}", name))),
            })
            .transpose()
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}
