//! Turning an [`ImageSource`] into a buffered, seekable reader.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};

use super::DecodeError;
use crate::source::{ImageSource, ResourceLookup};

/// Readers the codecs can consume: buffered and seekable.
pub(crate) trait SeekBufRead: BufRead + Seek {}

impl<T: BufRead + Seek> SeekBufRead for T {}

/// An opened source. Dropping it closes any underlying file or stream.
pub(crate) type SourceReader<'a> = Box<dyn SeekBufRead + 'a>;

/// Open `source` for reading.
///
/// Empty sources are rejected before anything is opened.
pub(crate) fn open_source<'a>(
    source: &'a ImageSource,
    resources: Option<&dyn ResourceLookup>,
) -> Result<SourceReader<'a>, DecodeError> {
    if source.is_empty() {
        return Err(DecodeError::EmptySource);
    }

    match source {
        ImageSource::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
        ImageSource::FilePath(path) => {
            let file = File::open(path).map_err(|e| {
                DecodeError::UnreadableSource(format!("{}: {}", path.display(), e))
            })?;
            let mut reader = BufReader::new(file);
            ensure_has_data(&mut reader)?;
            Ok(Box::new(reader))
        }
        ImageSource::ContentLocator { locator, opener } => {
            let stream = opener
                .open(locator)
                .map_err(|e| DecodeError::UnreadableSource(format!("{}: {}", locator, e)))?;
            let mut reader = BufReader::new(stream);
            ensure_has_data(&mut reader)?;
            Ok(Box::new(reader))
        }
        ImageSource::ResourceId(id) => {
            let lookup = resources.ok_or_else(|| {
                DecodeError::UnreadableSource(format!("no resource lookup for resource {}", id))
            })?;
            let bytes = lookup
                .resource_bytes(*id)
                .map_err(|e| DecodeError::UnreadableSource(format!("resource {}: {}", id, e)))?;
            if bytes.is_empty() {
                return Err(DecodeError::EmptySource);
            }
            Ok(Box::new(Cursor::new(bytes)))
        }
    }
}

/// Reject readers that yield no bytes at all.
fn ensure_has_data<R: BufRead>(reader: &mut R) -> Result<(), DecodeError> {
    let buffered = reader
        .fill_buf()
        .map_err(|e| DecodeError::UnreadableSource(e.to_string()))?;
    if buffered.is_empty() {
        return Err(DecodeError::EmptySource);
    }
    Ok(())
}
