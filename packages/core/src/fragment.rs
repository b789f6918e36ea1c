use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FragmentError, Result};
use crate::media::{self, MediaType};
use crate::storage::FragmentKey;

/// The minimal view of a fragment that negotiation and conversion need.
///
/// [`Fragment`] implements it; tests substitute lightweight doubles.
pub trait FragmentLike: Send + Sync {
    fn id(&self) -> &str;
    fn owner_id(&self) -> &str;
    /// Full declared `Content-Type`, parameters included.
    fn content_type(&self) -> &str;
    fn size(&self) -> u64;
}

/// Unvalidated fragment fields.
///
/// This is also the on-disk metadata shape, so stored records pass through the
/// same validation as freshly constructed ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentInit {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub owner_id: String,
    #[serde(rename = "type", default)]
    pub content_type: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size: Option<i64>,
}

impl FragmentInit {
    pub fn new(owner_id: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            content_type: content_type.into(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn timestamps(mut self, created: DateTime<Utc>, updated: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self.updated = Some(updated);
        self
    }

    pub fn build(self) -> Result<Fragment> {
        Fragment::try_from(self)
    }
}

/// Validated metadata for one stored fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", try_from = "FragmentInit")]
pub struct Fragment {
    /// Fragment ID (UUIDv4).
    #[schema(example = "30a84843-0cd4-4975-95ba-b96112aea189")]
    id: String,
    /// Opaque owner identifier (hex SHA-256 of the authenticated user).
    owner_id: String,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    /// Declared Content-Type, parameters included.
    #[serde(rename = "type")]
    #[schema(example = "text/plain; charset=utf-8")]
    content_type: String,
    /// Byte length of the stored data.
    #[schema(example = 16)]
    size: u64,
    #[serde(skip)]
    media_type: MediaType,
}

impl TryFrom<FragmentInit> for Fragment {
    type Error = FragmentError;

    fn try_from(init: FragmentInit) -> Result<Self> {
        if init.owner_id.trim().is_empty() {
            return Err(FragmentError::validation("ownerId", "owner id is required"));
        }
        if init.content_type.trim().is_empty() {
            return Err(FragmentError::validation("type", "content type is required"));
        }
        let media_type = MediaType::parse(&init.content_type)?;

        let size = match init.size {
            None => 0,
            Some(n) => u64::try_from(n).map_err(|_| {
                FragmentError::validation("size", format!("must be non-negative, got {n}"))
            })?,
        };

        let id = match init.id {
            Some(id) if id.trim().is_empty() => {
                return Err(FragmentError::validation("id", "id must not be empty"));
            }
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };

        let created = init.created.unwrap_or_else(Utc::now);
        let updated = init.updated.unwrap_or(created);
        if updated < created {
            return Err(FragmentError::validation(
                "updated",
                format!("{updated} is earlier than created {created}"),
            ));
        }

        Ok(Self {
            id,
            owner_id: init.owner_id,
            created,
            updated,
            content_type: init.content_type,
            size,
            media_type,
        })
    }
}

impl Fragment {
    /// Create a fragment with a fresh id and timestamps.
    pub fn new(owner_id: impl Into<String>, content_type: impl Into<String>) -> Result<Self> {
        FragmentInit::new(owner_id, content_type).build()
    }

    /// Whether fragments may be created with this `Content-Type`.
    pub fn is_supported_type(content_type: &str) -> bool {
        media::is_supported_type(content_type)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Base MIME type without parameters.
    pub fn mime_type(&self) -> &'static str {
        self.media_type.as_str()
    }

    pub fn is_text(&self) -> bool {
        self.media_type.is_text()
    }

    /// Types this fragment can be served as, itself included.
    pub fn formats(&self) -> &'static [MediaType] {
        self.media_type.conversion_targets()
    }

    pub fn key(&self) -> FragmentKey {
        FragmentKey::new(&self.owner_id, &self.id)
    }

    /// Record a successful data write of `size` bytes.
    pub(crate) fn record_write(&mut self, size: u64) {
        self.size = size;
        self.touch();
    }

    /// Refresh `updated`, never moving it before `created`.
    pub(crate) fn touch(&mut self) {
        self.updated = Utc::now().max(self.created);
    }
}

impl FragmentLike for Fragment {
    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn size(&self) -> u64 {
        self.size
    }
}
