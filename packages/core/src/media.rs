//! Supported media types and the static conversion matrix.
//!
//! The tables here are plain `const` data compiled into the binary, so they can
//! be shared by every request without synchronization.

use std::fmt;

use mime_guess::Mime;
use serde::{Deserialize, Serialize};

use crate::error::{FragmentError, Result};

/// A base MIME type (no parameters) that fragments may be stored as or
/// converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum MediaType {
    #[serde(rename = "text/plain")]
    TextPlain,
    #[serde(rename = "text/markdown")]
    TextMarkdown,
    #[serde(rename = "text/html")]
    TextHtml,
    #[serde(rename = "application/json")]
    ApplicationJson,
    #[serde(rename = "image/png")]
    ImagePng,
    #[serde(rename = "image/jpeg")]
    ImageJpeg,
    #[serde(rename = "image/webp")]
    ImageWebp,
    #[serde(rename = "image/gif")]
    ImageGif,
}

use MediaType::*;

const IMAGE_TARGETS: &[MediaType] = &[ImagePng, ImageJpeg, ImageWebp, ImageGif];

/// Types accepted when creating a fragment. Kept apart from [`MediaType::ALL`]
/// so a format can be a conversion target without being uploadable.
const CREATABLE: &[MediaType] = &[
    TextPlain,
    TextMarkdown,
    TextHtml,
    ApplicationJson,
    ImagePng,
    ImageJpeg,
    ImageWebp,
    ImageGif,
];

const EXTENSIONS: &[(&str, MediaType)] = &[
    ("txt", TextPlain),
    ("md", TextMarkdown),
    ("html", TextHtml),
    ("json", ApplicationJson),
    ("png", ImagePng),
    ("jpg", ImageJpeg),
    ("jpeg", ImageJpeg),
    ("webp", ImageWebp),
    ("gif", ImageGif),
];

impl MediaType {
    pub const ALL: [MediaType; 8] = [
        TextPlain,
        TextMarkdown,
        TextHtml,
        ApplicationJson,
        ImagePng,
        ImageJpeg,
        ImageWebp,
        ImageGif,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TextPlain => "text/plain",
            TextMarkdown => "text/markdown",
            TextHtml => "text/html",
            ApplicationJson => "application/json",
            ImagePng => "image/png",
            ImageJpeg => "image/jpeg",
            ImageWebp => "image/webp",
            ImageGif => "image/gif",
        }
    }

    /// Look up a base type such as `text/html`. Parameters are not accepted here.
    pub fn from_essence(essence: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(essence))
    }

    /// Parse a full `Content-Type` value, ignoring parameters such as `charset`.
    pub fn parse(content_type: &str) -> Result<Self> {
        let essence = base_mime_type(content_type)?;
        Self::from_essence(&essence).ok_or_else(|| {
            FragmentError::validation("type", format!("'{essence}' is not a supported MIME type"))
        })
    }

    /// Resolve a file extension (`html`, `.JPG`, ...) to a media type.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let ext = extension.strip_prefix('.').unwrap_or(extension);
        EXTENSIONS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, media)| *media)
    }

    pub fn is_text(self) -> bool {
        self.as_str().starts_with("text/")
    }

    pub fn is_image(self) -> bool {
        self.as_str().starts_with("image/")
    }

    /// Whether new fragments may be created with this type.
    pub fn is_creatable(self) -> bool {
        CREATABLE.contains(&self)
    }

    /// The row of the conversion matrix for this source type, identity included.
    ///
    /// Text rows are one-directional: markdown can be rendered to HTML or
    /// flattened to plain text, but nothing converts back into markdown.
    pub fn conversion_targets(self) -> &'static [MediaType] {
        match self {
            TextPlain => &[TextPlain],
            TextMarkdown => &[TextMarkdown, TextHtml, TextPlain],
            TextHtml => &[TextHtml, TextPlain],
            ApplicationJson => &[ApplicationJson, TextPlain],
            ImagePng | ImageJpeg | ImageWebp | ImageGif => IMAGE_TARGETS,
        }
    }

    pub fn can_convert_to(self, target: MediaType) -> bool {
        self.conversion_targets().contains(&target)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip parameters from a `Content-Type` value: `text/html; charset=utf-8` -> `text/html`.
pub fn base_mime_type(content_type: &str) -> Result<String> {
    if content_type.trim().is_empty() {
        return Err(FragmentError::validation("type", "content type is required"));
    }
    let mime: Mime = content_type.trim().parse().map_err(|e| {
        FragmentError::validation("type", format!("cannot parse '{content_type}': {e}"))
    })?;
    Ok(mime.essence_str().to_ascii_lowercase())
}

/// Whether fragments of `content_type` may be created.
pub fn is_supported_type(content_type: &str) -> bool {
    MediaType::parse(content_type)
        .map(MediaType::is_creatable)
        .unwrap_or(false)
}

/// Whether a fragment of type `source` can be served as `requested_extension`.
pub fn is_supported_conversion(source: MediaType, requested_extension: &str) -> bool {
    MediaType::from_extension(requested_extension)
        .is_some_and(|target| source.can_convert_to(target))
}
