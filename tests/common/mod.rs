#![allow(dead_code)]

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use media_sorter::errors::{NormalizationError, ProbeError};
use media_sorter::image_converter::ImageEncoder;
use media_sorter::video_processor::ContainerProber;
use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Degrees/minutes/seconds with a hemisphere letter, e.g. `((10, 30, 0), "N")`.
pub type Dms = ((u32, u32, u32), &'static str);

#[derive(Debug, Clone)]
pub struct TestGps {
    pub latitude: Dms,
    pub longitude: Dms,
    pub altitude: u32,
    pub below_sea_level: bool,
}

fn ascii(tag: Tag, value: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![value.as_bytes().to_vec()]),
    }
}

fn rationals(tag: Tag, values: &[u32]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(
            values
                .iter()
                .map(|v| Rational { num: *v, denom: 1 })
                .collect(),
        ),
    }
}

/// Minimal JPEG whose APP1 segment carries the given EXIF fields.
pub fn jpeg_with_exif(datetime: &str, gps: Option<&TestGps>) -> Vec<u8> {
    let mut fields = vec![ascii(Tag::DateTimeOriginal, datetime)];

    if let Some(gps) = gps {
        let ((lat_d, lat_m, lat_s), lat_ref) = gps.latitude;
        let ((lon_d, lon_m, lon_s), lon_ref) = gps.longitude;
        fields.push(ascii(Tag::GPSLatitudeRef, lat_ref));
        fields.push(rationals(Tag::GPSLatitude, &[lat_d, lat_m, lat_s]));
        fields.push(ascii(Tag::GPSLongitudeRef, lon_ref));
        fields.push(rationals(Tag::GPSLongitude, &[lon_d, lon_m, lon_s]));
        fields.push(Field {
            tag: Tag::GPSAltitudeRef,
            ifd_num: In::PRIMARY,
            value: Value::Byte(vec![u8::from(gps.below_sea_level)]),
        });
        fields.push(rationals(Tag::GPSAltitude, &[gps.altitude]));
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    let segment_len = u16::try_from(tiff.len() + 8).unwrap();
    jpeg.extend_from_slice(&segment_len.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

pub fn paris_gps() -> TestGps {
    TestGps {
        latitude: ((48, 51, 24), "N"),
        longitude: ((2, 21, 0), "E"),
        altitude: 35,
        below_sea_level: false,
    }
}

pub fn write_file(path: &Path, content: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    path.to_path_buf()
}

/// Every file below `root`, keyed by relative path, with its content.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, fs::read(e.path()).unwrap())
        })
        .collect()
}

/// Every directory below `root`, relative to it.
pub fn directories(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

pub struct StaticProber(pub serde_json::Value);

impl ContainerProber for StaticProber {
    fn probe(&self, _path: &Path) -> Result<serde_json::Value, ProbeError> {
        Ok(self.0.clone())
    }
}

/// Stands in for ImageMagick: the "converted" image is a byte copy of the source.
pub struct CopyEncoder;

impl ImageEncoder for CopyEncoder {
    fn encode(&self, src: &Path, _format: &str, dest: &Path) -> Result<(), NormalizationError> {
        fs::copy(src, dest)?;
        Ok(())
    }
}
