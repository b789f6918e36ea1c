//! Conversion between representations allowed by the matrix in [`crate::media`].

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use pulldown_cmark::{Options, Parser, html};

use crate::error::{FragmentError, Result};
use crate::media::MediaType::{self, *};

/// Convert `data` stored as `from` into `to`.
///
/// Callers are expected to have checked the matrix already; a pairing outside
/// it yields [`FragmentError::UnsupportedConversion`].
pub fn convert(data: &[u8], from: MediaType, to: MediaType) -> Result<Vec<u8>> {
    if !from.can_convert_to(to) {
        return Err(FragmentError::UnsupportedConversion {
            from: from.as_str(),
            to: to.as_str(),
        });
    }

    match (from, to) {
        (a, b) if a == b => Ok(data.to_vec()),
        (TextMarkdown, TextHtml) => markdown_to_html(data).map(String::into_bytes),
        (_, TextPlain) => plain_text(data).map(|text| text.as_bytes().to_vec()),
        (a, b) if a.is_image() && b.is_image() => transcode(data, from, to),
        _ => Err(FragmentError::UnsupportedConversion {
            from: from.as_str(),
            to: to.as_str(),
        }),
    }
}

/// Render CommonMark to HTML.
pub fn markdown_to_html(data: &[u8]) -> Result<String> {
    let source = decode_utf8(data, TextHtml)?;
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(source, Options::empty()));
    Ok(out)
}

/// Plain-text view of a text-like payload.
///
/// The bytes pass through unchanged; markup and JSON syntax are kept. The only
/// requirement is that the payload is valid UTF-8.
pub fn plain_text(data: &[u8]) -> Result<&str> {
    decode_utf8(data, TextPlain)
}

/// Re-encode an image into another supported image format.
pub fn transcode(data: &[u8], from: MediaType, to: MediaType) -> Result<Vec<u8>> {
    let (Some(source_format), Some(target_format)) = (image_format(from), image_format(to)) else {
        return Err(FragmentError::UnsupportedConversion {
            from: from.as_str(),
            to: to.as_str(),
        });
    };

    let decoded = image::load_from_memory_with_format(data, source_format).map_err(|e| {
        FragmentError::Conversion {
            target: to.as_str(),
            reason: format!("cannot decode {from} input: {e}"),
        }
    })?;

    // JPEG has no alpha channel.
    let prepared = match to {
        ImageJpeg => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        _ => DynamicImage::ImageRgba8(decoded.to_rgba8()),
    };

    let mut out = Cursor::new(Vec::new());
    prepared
        .write_to(&mut out, target_format)
        .map_err(|e| FragmentError::Conversion {
            target: to.as_str(),
            reason: format!("cannot encode: {e}"),
        })?;
    Ok(out.into_inner())
}

fn image_format(media: MediaType) -> Option<ImageFormat> {
    match media {
        ImagePng => Some(ImageFormat::Png),
        ImageJpeg => Some(ImageFormat::Jpeg),
        ImageWebp => Some(ImageFormat::WebP),
        ImageGif => Some(ImageFormat::Gif),
        _ => None,
    }
}

fn decode_utf8(data: &[u8], target: MediaType) -> Result<&str> {
    std::str::from_utf8(data).map_err(|e| FragmentError::Conversion {
        target: target.as_str(),
        reason: format!("input is not valid UTF-8: {e}"),
    })
}
