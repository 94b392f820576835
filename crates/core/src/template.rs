use crate::change::{split_extension, Change};
use crate::metadata::{FileTimes, ImageMetadata, MetadataLookup, Ratio};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Date codes accepted after `{{<clock>.`, with their strftime equivalent.
/// Longer codes come first so alternation prefers them.
pub const DATE_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DDDD", "%A"),
    ("DDD", "%a"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("H", "%H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", "%P"),
];

pub const EXIF_FIELDS: &[&str] = &[
    "iso", "et", "fl", "w", "h", "wh", "make", "model", "lens", "fnum",
];

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    let dates = DATE_TOKENS
        .iter()
        .map(|(code, _)| *code)
        .collect::<Vec<_>>()
        .join("|");
    let exif = EXIF_FIELDS.join("|");
    Regex::new(&format!(
        r"\{{\{{(?:(?P<name>f|ext|p)|(?P<clock>mtime|ctime|btime|atime|now)\.(?P<date>{dates})|exif\.(?P<exif>{exif}))\}}\}}"
    ))
    .expect("template token regex must compile")
});

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read metadata for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Values shared by every expansion in one run.
#[derive(Debug, Clone)]
pub struct ExpandContext {
    pub working_dir: PathBuf,
    pub now: DateTime<Local>,
}

impl ExpandContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            now: Local::now(),
        }
    }
}

/// Resolves every `{{...}}` token in `template` against `change`'s source.
///
/// Tokens are substituted in a single pass, so text produced by one token is
/// never re-read as another token. Unknown `{{...}}` text is left as is.
pub fn expand(
    template: &str,
    change: &Change,
    ctx: &ExpandContext,
    lookup: &dyn MetadataLookup,
) -> Result<String, TemplateError> {
    let mut needs_times = false;
    let mut needs_image = false;
    for caps in TOKEN_RE.captures_iter(template) {
        if caps.name("clock").is_some_and(|m| m.as_str() != "now") {
            needs_times = true;
        }
        if caps.name("exif").is_some() {
            needs_image = true;
        }
    }

    let source = change.source_path();
    let times = if needs_times {
        Some(lookup.file_times(&source).map_err(|err| TemplateError::Io {
            path: source.clone(),
            source: err,
        })?)
    } else {
        None
    };
    let image = if needs_image {
        Some(lookup.image_metadata(&source).map_err(|err| TemplateError::Io {
            path: source.clone(),
            source: err,
        })?)
    } else {
        None
    };

    let (stem, ext) = split_extension(change.file_name());
    let expanded = TOKEN_RE.replace_all(template, |caps: &Captures| {
        if let Some(name) = caps.name("name") {
            return match name.as_str() {
                "f" => stem.to_string(),
                "ext" => ext.to_string(),
                _ => parent_dir_name(&change.base_dir, &ctx.working_dir),
            };
        }
        if let (Some(clock), Some(code)) = (caps.name("clock"), caps.name("date")) {
            return match clock_value(clock.as_str(), times.as_ref(), ctx) {
                Some(time) => format_date(time, code.as_str()),
                None => caps[0].to_string(),
            };
        }
        match (caps.name("exif"), image.as_ref()) {
            (Some(field), Some(image)) => exif_value(field.as_str(), image),
            _ => caps[0].to_string(),
        }
    });

    Ok(expanded.into_owned())
}

fn clock_value(
    clock: &str,
    times: Option<&FileTimes>,
    ctx: &ExpandContext,
) -> Option<DateTime<Local>> {
    if clock == "now" {
        return Some(ctx.now);
    }
    let times = times?;
    Some(match clock {
        "mtime" => times.modified,
        "atime" => times.accessed,
        "btime" => times.created_or_modified(),
        _ => times.changed_or_modified(),
    })
}

fn format_date(time: DateTime<Local>, code: &str) -> String {
    DATE_TOKENS
        .iter()
        .find(|(token, _)| *token == code)
        .map(|(_, fmt)| time.format(fmt).to_string())
        .unwrap_or_default()
}

fn exif_value(field: &str, image: &ImageMetadata) -> String {
    let value = match field {
        "iso" => image.iso.map(|iso| format!("ISO{iso}")),
        "et" => image
            .exposure_time
            .map(|et| format!("{}s", format_ratio(et).replace('/', "_"))),
        "fl" => image.focal_length.map(|fl| format!("{fl}mm")),
        "fnum" => image.f_number.map(|f| format!("f{f}")),
        "w" => image.width.map(|w| w.to_string()),
        "h" => image.height.map(|h| h.to_string()),
        "wh" => match (image.width, image.height) {
            (Some(w), Some(h)) => Some(format!("{w}x{h}")),
            _ => None,
        },
        "make" => image.normalized_make().map(str::to_string),
        "model" => image.normalized_model().map(|v| v.replace('/', "_")),
        "lens" => image.normalized_lens().map(|v| v.replace('/', "_")),
        _ => None,
    };
    value.unwrap_or_default()
}

/// Exposure is kept as the camera recorded it; only whole seconds collapse.
fn format_ratio(ratio: Ratio) -> String {
    if ratio.denom == 1 {
        return ratio.num.to_string();
    }
    format!("{}/{}", ratio.num, ratio.denom)
}

/// Name of the directory holding the entry. Entries directly in the working
/// directory use the working directory's own name instead of `.`.
fn parent_dir_name(base_dir: &Path, working_dir: &Path) -> String {
    let in_working_dir = base_dir.as_os_str().is_empty()
        || base_dir == Path::new(".")
        || base_dir == working_dir;
    let dir = if in_working_dir { working_dir } else { base_dir };
    dir.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
