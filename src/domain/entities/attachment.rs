//! Uploaded files and the rules for accepting them.
//!
//! Bytes never reach storage tables: a [`FileStore`](crate::domain::services::FileStore)
//! persists them and the core keeps only the returned URL.

use super::message::MessageType;
use crate::shared::error::AppError;

/// Maximum upload size in bytes (25MB).
pub const MAX_ATTACHMENT_SIZE: usize = 26_214_400;

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".tiff", ".raw", ".heic",
];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm", ".mkv"];
const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".ogg", ".aac", ".flac", ".m4a"];
const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".xlsx", ".pptx", ".zip", ".txt"];

/// MIME prefixes accepted for message attachments.
const ATTACHMENT_MIME_PREFIXES: &[&str] = &[
    "image/",
    "video/",
    "audio/",
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/zip",
    "text/plain",
];

const AVATAR_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];
const AVATAR_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Where a stored file belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Avatar,
    MessageAttachment,
}

impl FileCategory {
    /// Directory segment used by file stores.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Avatar => "avatars",
            Self::MessageAttachment => "messages",
        }
    }
}

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Original file name as sent by the client
    pub filename: String,
    /// Content-type hint
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Lower-cased extension including the dot, or `""`.
    pub fn extension(&self) -> String {
        self.filename
            .rfind('.')
            .map(|idx| self.filename[idx..].to_ascii_lowercase())
            .unwrap_or_default()
    }

    fn mime(&self) -> String {
        self.content_type.trim().to_ascii_lowercase()
    }

    fn check_size(&self) -> Result<(), AppError> {
        if self.bytes.is_empty() {
            return Err(AppError::Validation("No file uploaded".into()));
        }
        if self.bytes.len() > MAX_ATTACHMENT_SIZE {
            return Err(AppError::Validation(format!(
                "File exceeds the {} byte limit",
                MAX_ATTACHMENT_SIZE
            )));
        }
        Ok(())
    }

    /// Validate a message attachment and derive its message type from the extension.
    ///
    /// Both the extension and the MIME type must be on the allow-list.
    pub fn classify_attachment(&self) -> Result<MessageType, AppError> {
        self.check_size()?;

        let ext = self.extension();
        let mime = self.mime();
        let mime_ok = ATTACHMENT_MIME_PREFIXES.iter().any(|p| mime.starts_with(p));

        let message_type = if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MessageType::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MessageType::Video
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            MessageType::Audio
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            MessageType::File
        } else {
            return Err(AppError::Validation("File type not allowed".into()));
        };

        if !mime_ok {
            return Err(AppError::Validation("File type not allowed".into()));
        }
        Ok(message_type)
    }

    /// Validate a room avatar image.
    pub fn validate_avatar(&self) -> Result<(), AppError> {
        self.check_size()?;
        let ext = self.extension();
        let mime = self.mime();
        if !AVATAR_EXTENSIONS.contains(&ext.as_str()) || !AVATAR_MIME_TYPES.contains(&mime.as_str()) {
            return Err(AppError::Validation("File type not allowed".into()));
        }
        Ok(())
    }
}
