use tracing::debug;

use crate::convert;
use crate::error::{FragmentError, Result};
use crate::fragment::FragmentLike;
use crate::media::{MediaType, is_supported_conversion};

/// The bytes to send for a read, with the `Content-Type` they should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Resolve `extension` to a target type the fragment may be served as.
pub fn resolve_target<F>(fragment: &F, extension: &str) -> Result<MediaType>
where
    F: FragmentLike + ?Sized,
{
    let unsupported = || FragmentError::UnsupportedMediaType {
        requested: extension.to_string(),
    };
    let source = MediaType::parse(fragment.content_type())?;
    if !is_supported_conversion(source, extension) {
        return Err(unsupported());
    }
    MediaType::from_extension(extension).ok_or_else(unsupported)
}

/// Produce the representation of `data` requested by `extension`.
///
/// Without an extension the stored type and bytes are returned untouched.
/// Image transcodes run on the blocking pool.
pub async fn negotiate_and_convert<F>(
    fragment: &F,
    data: Vec<u8>,
    extension: Option<&str>,
) -> Result<Rendition>
where
    F: FragmentLike + ?Sized,
{
    let Some(extension) = extension else {
        return Ok(Rendition {
            content_type: fragment.content_type().to_string(),
            data,
        });
    };

    let source = MediaType::parse(fragment.content_type())?;
    let target = resolve_target(fragment, extension)?;
    debug!(id = fragment.id(), %source, %target, "Converting fragment");

    let data = if source == target {
        data
    } else if source.is_image() {
        tokio::task::spawn_blocking(move || convert::convert(&data, source, target))
            .await
            .map_err(|e| FragmentError::Conversion {
                target: target.as_str(),
                reason: format!("conversion task failed: {e}"),
            })??
    } else {
        convert::convert(&data, source, target)?
    };

    Ok(Rendition {
        content_type: target.as_str().to_string(),
        data,
    })
}
