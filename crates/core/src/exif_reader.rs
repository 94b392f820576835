use crate::metadata::{ImageMetadata, Ratio};
use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tracing::debug;

pub fn read_image_metadata(path: &Path) -> io::Result<ImageMetadata> {
    let file = File::open(path)?;
    let mut buf = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf) {
        Ok(exif) => exif,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no decodable image metadata");
            return Ok(ImageMetadata::default());
        }
    };

    Ok(ImageMetadata {
        iso: uint_field(&exif, Tag::PhotographicSensitivity),
        exposure_time: rational_field(&exif, Tag::ExposureTime),
        focal_length: rational_field(&exif, Tag::FocalLength).and_then(ratio_value),
        f_number: rational_field(&exif, Tag::FNumber).and_then(ratio_value),
        width: uint_field(&exif, Tag::PixelXDimension)
            .or_else(|| uint_field(&exif, Tag::ImageWidth)),
        height: uint_field(&exif, Tag::PixelYDimension)
            .or_else(|| uint_field(&exif, Tag::ImageLength)),
        make: ascii_field(&exif, Tag::Make),
        model: ascii_field(&exif, Tag::Model),
        lens: ascii_field(&exif, Tag::LensModel),
    })
}

fn uint_field(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn rational_field(exif: &Exif, tag: Tag) -> Option<Ratio> {
    match exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(ref values) => values.first().map(|r| Ratio {
            num: r.num,
            denom: r.denom,
        }),
        _ => None,
    }
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    match exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(ref values) => values
            .first()
            .map(|raw| normalize(&String::from_utf8_lossy(raw)))
            .filter(|v| !v.is_empty()),
        _ => None,
    }
}

fn normalize(value: &str) -> String {
    value.trim_matches(char::from(0)).trim().to_string()
}

fn ratio_value(ratio: Ratio) -> Option<f64> {
    if ratio.denom == 0 {
        return None;
    }
    Some(f64::from(ratio.num) / f64::from(ratio.denom))
}
