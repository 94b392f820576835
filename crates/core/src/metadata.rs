use crate::exif_reader::read_image_metadata;
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::Path;

/// Timestamps of a file. `changed` and `created` are only present when the
/// platform and filesystem expose them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub modified: DateTime<Local>,
    pub accessed: DateTime<Local>,
    pub changed: Option<DateTime<Local>>,
    pub created: Option<DateTime<Local>>,
}

impl FileTimes {
    pub fn created_or_modified(&self) -> DateTime<Local> {
        self.created.unwrap_or(self.modified)
    }

    pub fn changed_or_modified(&self) -> DateTime<Local> {
        self.changed.unwrap_or(self.modified)
    }
}

/// An unreduced EXIF rational such as an exposure time of `1/250`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub num: u32,
    pub denom: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetadata {
    pub iso: Option<u32>,
    pub exposure_time: Option<Ratio>,
    pub focal_length: Option<f64>,
    pub f_number: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens: Option<String>,
}

impl ImageMetadata {
    pub fn normalized_make(&self) -> Option<&str> {
        normalized(self.make.as_deref())
    }

    pub fn normalized_model(&self) -> Option<&str> {
        normalized(self.model.as_deref())
    }

    pub fn normalized_lens(&self) -> Option<&str> {
        normalized(self.lens.as_deref())
    }
}

fn normalized(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Source of per-file timestamps and image metadata for template expansion.
pub trait MetadataLookup {
    fn file_times(&self, path: &Path) -> io::Result<FileTimes>;

    /// Fails only when the file cannot be opened; undecodable images yield
    /// empty metadata.
    fn image_metadata(&self, path: &Path) -> io::Result<ImageMetadata>;
}

/// Reads metadata straight from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMetadata;

impl MetadataLookup for FsMetadata {
    fn file_times(&self, path: &Path) -> io::Result<FileTimes> {
        read_file_times(path)
    }

    fn image_metadata(&self, path: &Path) -> io::Result<ImageMetadata> {
        read_image_metadata(path)
    }
}

pub fn read_file_times(path: &Path) -> io::Result<FileTimes> {
    let meta = fs::metadata(path)?;
    let modified: DateTime<Local> = DateTime::from(meta.modified()?);
    let accessed = meta.accessed().map(DateTime::from).unwrap_or(modified);
    let created = meta.created().ok().map(DateTime::from);

    Ok(FileTimes {
        modified,
        accessed,
        changed: status_change_time(&meta),
        created,
    })
}

#[cfg(unix)]
fn status_change_time(meta: &fs::Metadata) -> Option<DateTime<Local>> {
    use chrono::TimeZone;
    use std::os::unix::fs::MetadataExt;

    let nanos = u32::try_from(meta.ctime_nsec()).ok()?;
    Local.timestamp_opt(meta.ctime(), nanos).single()
}

#[cfg(not(unix))]
fn status_change_time(_meta: &fs::Metadata) -> Option<DateTime<Local>> {
    None
}
