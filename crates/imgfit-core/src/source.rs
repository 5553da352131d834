//! Image sources and the capabilities needed to read them.
//!
//! An [`ImageSource`] names exactly one place to read an image from. Two of
//! the variants need help from the host application: content locators are
//! opened through a [`StreamOpener`] carried in the variant itself, and
//! bundled resource ids are resolved through a [`ResourceLookup`] owned by
//! the decoder.

use std::fmt;
use std::io::{self, Read, Seek};
use std::path::PathBuf;
use std::sync::Arc;

/// A readable, seekable byte stream handed out by a [`StreamOpener`].
pub trait ImageStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> ImageStream for T {}

/// Opens content locators (e.g. `content://` style handles) as byte streams.
///
/// The returned stream is dropped by the decoder before it returns, so
/// implementations can release handles in `Drop`.
pub trait StreamOpener: Send + Sync {
    fn open(&self, locator: &str) -> io::Result<Box<dyn ImageStream>>;
}

/// Resolves a bundled resource id to its encoded bytes.
pub trait ResourceLookup: Send + Sync {
    fn resource_bytes(&self, id: i32) -> io::Result<Vec<u8>>;
}

/// Where an image should be read from.
#[derive(Clone)]
pub enum ImageSource {
    /// Encoded image bytes already in memory.
    Bytes(Vec<u8>),
    /// A path on the local filesystem.
    FilePath(PathBuf),
    /// An opaque locator opened through the given capability.
    ContentLocator {
        locator: String,
        opener: Arc<dyn StreamOpener>,
    },
    /// A bundled resource; ids <= 0 are treated as absent.
    ResourceId(i32),
}

impl ImageSource {
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        ImageSource::Bytes(bytes.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        ImageSource::FilePath(path.into())
    }

    pub fn locator(locator: impl Into<String>, opener: Arc<dyn StreamOpener>) -> Self {
        ImageSource::ContentLocator {
            locator: locator.into(),
            opener,
        }
    }

    /// Returns true if the variant carries nothing that could be decoded.
    pub fn is_empty(&self) -> bool {
        match self {
            ImageSource::Bytes(bytes) => bytes.is_empty(),
            ImageSource::FilePath(path) => path.as_os_str().is_empty(),
            ImageSource::ContentLocator { locator, .. } => locator.is_empty(),
            ImageSource::ResourceId(id) => *id <= 0,
        }
    }

    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ImageSource::Bytes(_) => "bytes",
            ImageSource::FilePath(_) => "file",
            ImageSource::ContentLocator { .. } => "locator",
            ImageSource::ResourceId(_) => "resource",
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            ImageSource::FilePath(path) => f.debug_tuple("FilePath").field(path).finish(),
            ImageSource::ContentLocator { locator, .. } => f
                .debug_struct("ContentLocator")
                .field("locator", locator)
                .finish_non_exhaustive(),
            ImageSource::ResourceId(id) => f.debug_tuple("ResourceId").field(id).finish(),
        }
    }
}
