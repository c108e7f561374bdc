//! File intake: validation of user-supplied files and conversion into
//! attachments the request assembler can embed.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::{FileSettings, Settings};
use crate::constants::files::SUPPORTED_IMAGE_TYPES;
use crate::error::ChatError;
use crate::llm::ContentPart;

/// What a validated file will be sent as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Image { media_type: String },
    Pdf,
}

/// A file as handed over by the user, before validation.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    /// Media type reported by the source (browser, OS), if any.
    pub declared_type: Option<String>,
    pub data: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            data: data.into(),
        }
    }

    pub fn with_declared_type(mut self, media_type: impl Into<String>) -> Self {
        self.declared_type = Some(media_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentContent {
    Text(String),
    /// `data:<media-type>;base64,<payload>`
    DataUrl(String),
}

/// An encoded file ready to be attached to one outgoing turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub name: String,
    pub content: AttachmentContent,
}

impl FileAttachment {
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: AttachmentContent::Text(text.into()),
        }
    }

    pub fn data_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: AttachmentContent::DataUrl(url.into()),
        }
    }

    /// Classify a raw string: image data URLs stay data URLs, everything
    /// else (including non-image data URLs) is text.
    pub fn from_raw(name: impl Into<String>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.starts_with("data:image/") {
            Self::data_url(name, raw)
        } else {
            Self::text(name, raw)
        }
    }

    /// Convert into the content part sent to the API.
    pub fn to_content_part(&self) -> Result<ContentPart, ChatError> {
        match &self.content {
            AttachmentContent::Text(text) => Ok(ContentPart::text(text.clone())),
            AttachmentContent::DataUrl(url) => {
                let (media_type, data) = parse_data_url(url).ok_or_else(|| {
                    ChatError::invalid_attachment(&self.name, "malformed data URL")
                })?;
                if !SUPPORTED_IMAGE_TYPES.contains(&media_type) {
                    return Err(ChatError::UnsupportedMediaType(media_type.to_string()));
                }
                Ok(ContentPart::image(media_type, data))
            }
        }
    }
}

/// Split a data URL into `(media_type, payload)`.
///
/// The media type is the text between `data:` and the first `;`, the
/// payload everything after the first `,`.
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (media_type, _) = rest.split_once(';')?;
    let (_, payload) = rest.split_once(',')?;
    if media_type.is_empty() || media_type.contains(',') {
        return None;
    }
    Some((media_type, payload))
}

/// Media type implied by an image file extension.
pub fn image_media_type(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Fully decode the image; a readable header alone is not enough.
fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;
    let decoded = reader.decode().map_err(|e| e.to_string())?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(format!("invalid dimensions {width}x{height}"));
    }
    Ok((width, height))
}

/// Validates and encodes user-supplied files against the configured rules.
pub struct FileIntake {
    settings: FileSettings,
}

impl FileIntake {
    pub fn new(settings: FileSettings) -> Self {
        Self { settings }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.files.clone())
    }

    pub fn max_file_size(&self) -> u64 {
        self.settings.max_file_size
    }

    fn too_large(&self, name: &str, size: u64) -> ChatError {
        ChatError::TooLarge {
            name: name.to_string(),
            size,
            max: self.settings.max_file_size,
        }
    }

    fn listed(list: &[String], ext: &str) -> bool {
        list.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Check size and type without touching the contents.
    pub fn validate(&self, file: &IncomingFile) -> Result<FileKind, ChatError> {
        if file.size() > self.settings.max_file_size {
            return Err(self.too_large(&file.name, file.size()));
        }

        let declared = file.declared_type.as_deref().map(str::to_ascii_lowercase);
        if let Some(declared) = declared.as_deref() {
            if declared.starts_with("image/") {
                if !SUPPORTED_IMAGE_TYPES.contains(&declared) {
                    return Err(ChatError::UnsupportedType(declared.to_string()));
                }
                return Ok(FileKind::Image {
                    media_type: declared.to_string(),
                });
            }
        }

        if let Some(ext) = file.extension() {
            if Self::listed(&self.settings.image_extensions, &ext) {
                return image_media_type(&ext)
                    .map(|media_type| FileKind::Image {
                        media_type: media_type.to_string(),
                    })
                    .ok_or(ChatError::UnsupportedType(ext));
            }
            if Self::listed(&self.settings.text_extensions, &ext) {
                return Ok(FileKind::Text);
            }
            if Self::listed(&self.settings.pdf_extensions, &ext) {
                return Ok(FileKind::Pdf);
            }
        }

        match declared.as_deref() {
            Some("application/pdf") => Ok(FileKind::Pdf),
            Some(t) if t.starts_with("text/") || t == "application/json" => Ok(FileKind::Text),
            Some(t) => Err(ChatError::UnsupportedType(t.to_string())),
            None => Err(ChatError::UnsupportedType(
                file.extension().unwrap_or_else(|| file.name.clone()),
            )),
        }
    }

    /// Validate and encode a file. Images are decoded off the async runtime
    /// and must have non-zero dimensions.
    pub async fn read(&self, file: IncomingFile) -> Result<FileAttachment, ChatError> {
        let kind = self.validate(&file)?;
        let IncomingFile { name, data, .. } = file;

        match kind {
            FileKind::Text | FileKind::Pdf => {
                let text = String::from_utf8_lossy(&data).into_owned();
                debug!("Read text attachment {name} ({} bytes)", data.len());
                Ok(FileAttachment::text(name, text))
            }
            FileKind::Image { media_type } => {
                let checked = tokio::task::spawn_blocking(move || {
                    image_dimensions(&data).map(|dims| (dims, data))
                })
                .await
                .map_err(|e| ChatError::Other(format!("Image decode task failed: {e}")))?;

                let ((width, height), data) = checked.map_err(|reason| {
                    warn!("Rejected image {name}: {reason}");
                    ChatError::InvalidImageData(name.clone())
                })?;

                debug!("Read image attachment {name} ({width}x{height}, {media_type})");
                let encoded = STANDARD.encode(&data);
                Ok(FileAttachment::data_url(
                    name,
                    format!("data:{media_type};base64,{encoded}"),
                ))
            }
        }
    }

    /// Read a file from disk. Oversized files are rejected from metadata
    /// before their contents are loaded.
    pub async fn open(&self, path: impl AsRef<Path>) -> Result<IncomingFile, ChatError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let size = tokio::fs::metadata(path).await?.len();
        if size > self.settings.max_file_size {
            return Err(self.too_large(&name, size));
        }

        let data = tokio::fs::read(path).await?;
        let declared_type = extension_of(&name).and_then(|ext| {
            if let Some(media_type) = image_media_type(&ext) {
                Some(media_type.to_string())
            } else if Self::listed(&self.settings.pdf_extensions, &ext) {
                Some("application/pdf".to_string())
            } else if Self::listed(&self.settings.text_extensions, &ext) {
                Some("text/plain".to_string())
            } else {
                None
            }
        });

        Ok(IncomingFile {
            name,
            declared_type,
            data,
        })
    }

    /// `open` followed by `read`.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<FileAttachment, ChatError> {
        let file = self.open(path).await?;
        self.read(file).await
    }
}
