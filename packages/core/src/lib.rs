//! Owner-scoped fragment storage with on-demand format conversion.
//!
//! A fragment is a typed blob (text, markdown, HTML, JSON or an image) whose
//! metadata and bytes are stored separately. [`FragmentRepository`] owns the
//! lifecycle, [`media`] holds the conversion matrix and [`negotiate`] turns a
//! requested extension into converted bytes.

pub mod config;
pub mod convert;
pub mod error;
pub mod fragment;
pub mod media;
pub mod negotiate;
pub mod repository;
pub mod retry;
pub mod storage;

pub use error::{FragmentError, Result};
pub use fragment::{Fragment, FragmentInit, FragmentLike};
pub use media::MediaType;
pub use negotiate::{Rendition, negotiate_and_convert};
pub use repository::{FragmentList, FragmentRepository};
