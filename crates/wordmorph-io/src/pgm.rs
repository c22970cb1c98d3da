//! Binary PGM (P5) word-image I/O
//!
//! Word images travel as binary PGM files with their word metadata embedded
//! in header comments. Two metadata forms exist in the wild and exactly one
//! must be present:
//!
//! 1. **Properties**: comments of the form `# key: value` carrying at least
//!    `label`, optionally `threshold`, `page`, and `authorId`.
//! 2. **Ordered comments**: exactly three bare comments, read as the
//!    threshold, the label, and the page number, in that order.
//!
//! A file with neither form fails fast, naming what was missing. Gray pixel
//! data is accepted only when the metadata carries a threshold; pixels at or
//! below it become ink.

use crate::error::{IoError, IoResult};
use std::fs;
use std::io::Write;
use std::path::Path;
use wordmorph_core::{BACKGROUND, BitonalImage, INK};

/// Read a bitonal word image (with metadata) from a P5 PGM file.
///
/// # Errors
///
/// Fails for non-P5 files, malformed headers, missing/ambiguous metadata,
/// and gray pixel data without a threshold.
pub fn read_pgm(path: &Path) -> IoResult<BitonalImage> {
    let path_str = path.display().to_string();
    let bytes = fs::read(path)?;
    let mut parser = HeaderParser::new(&bytes);

    let magic = parser.token().unwrap_or_default();
    if magic != b"P5" {
        return Err(IoError::UnsupportedFormat {
            path: path_str,
            magic: String::from_utf8_lossy(magic).into_owned(),
        });
    }

    let mut dim = |name: &str| -> IoResult<u32> {
        parser
            .token()
            .and_then(|t| std::str::from_utf8(t).ok())
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| IoError::MalformedHeader {
                path: path.display().to_string(),
                reason: format!("missing or non-numeric {name}"),
            })
    };
    let width = dim("width")?;
    let height = dim("height")?;
    let maxval = dim("maxval")?;
    if maxval == 0 || maxval > 255 {
        return Err(IoError::MalformedHeader {
            path: path_str,
            reason: format!("unsupported maxval {maxval}"),
        });
    }

    let data_start = parser.pixel_data_start();
    let expected = width as usize * height as usize;
    if bytes.len() < data_start + expected {
        return Err(IoError::MalformedHeader {
            path: path_str,
            reason: format!(
                "pixel data truncated: need {expected} bytes, have {}",
                bytes.len().saturating_sub(data_start)
            ),
        });
    }
    let raw = &bytes[data_start..data_start + expected];

    let meta = WordMetadata::resolve(&parser.comments, &path_str)?;

    let pixels: Vec<u8> = if let Some(threshold) = meta.threshold {
        raw.iter()
            .map(|&p| if p as u32 <= threshold { INK } else { BACKGROUND })
            .collect()
    } else if raw.iter().all(|&p| p == 0 || p as u32 == maxval) {
        raw.iter()
            .map(|&p| if p == 0 { INK } else { BACKGROUND })
            .collect()
    } else {
        return Err(IoError::GrayWithoutThreshold { path: path_str });
    };

    let mut img = BitonalImage::from_raw(width, height, pixels)?;
    img.set_threshold(meta.threshold);
    img.set_label(Some(meta.label));
    img.set_page(meta.page);
    img.set_author_id(meta.author_id);
    Ok(img)
}

/// Write a bitonal word image as a P5 PGM file, with its metadata as
/// `# key: value` property comments.
pub fn write_pgm(img: &BitonalImage, path: &Path) -> IoResult<()> {
    let mut out = Vec::with_capacity(img.data().len() + 128);
    writeln!(out, "P5")?;
    if let Some(t) = img.threshold() {
        writeln!(out, "# threshold: {t}")?;
    }
    if let Some(label) = img.label() {
        writeln!(out, "# label: {label}")?;
    }
    if let Some(page) = img.page() {
        writeln!(out, "# page: {page}")?;
    }
    if let Some(author) = img.author_id() {
        writeln!(out, "# authorId: {author}")?;
    }
    writeln!(out, "{} {}", img.width(), img.height())?;
    writeln!(out, "255")?;
    out.extend_from_slice(img.data());
    fs::write(path, out)?;
    Ok(())
}

/// Resolved word metadata from the header comments.
struct WordMetadata {
    threshold: Option<u32>,
    label: String,
    page: Option<u32>,
    author_id: Option<String>,
}

impl WordMetadata {
    /// Apply the two-form metadata contract to the raw comment list.
    fn resolve(comments: &[String], path: &str) -> IoResult<Self> {
        let mut props: Vec<(&str, &str)> = Vec::new();
        let mut bare: Vec<&str> = Vec::new();
        for comment in comments {
            match comment.split_once(':') {
                Some((key, value)) => props.push((key.trim(), value.trim())),
                None => bare.push(comment.as_str()),
            }
        }
        let prop = |key: &str| props.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

        if let Some(label) = prop("label") {
            let parse_num = |key: &str| -> IoResult<Option<u32>> {
                prop(key)
                    .map(|v| {
                        v.parse().map_err(|_| IoError::BadMetadata {
                            path: path.to_string(),
                            reason: format!("property '{key}' is not a number: '{v}'"),
                        })
                    })
                    .transpose()
            };
            return Ok(WordMetadata {
                threshold: parse_num("threshold")?,
                label: label.to_string(),
                page: parse_num("page")?,
                author_id: prop("authorId").map(str::to_string),
            });
        }

        if bare.len() == 3 && props.is_empty() {
            let threshold = bare[0].parse().map_err(|_| IoError::BadMetadata {
                path: path.to_string(),
                reason: format!("first comment is not a threshold: '{}'", bare[0]),
            })?;
            let page = bare[2].parse().map_err(|_| IoError::BadMetadata {
                path: path.to_string(),
                reason: format!("third comment is not a page number: '{}'", bare[2]),
            })?;
            return Ok(WordMetadata {
                threshold: Some(threshold),
                label: bare[1].to_string(),
                page: Some(page),
                author_id: None,
            });
        }

        Err(IoError::BadMetadata {
            path: path.to_string(),
            reason: format!(
                "no 'label' property and {} bare comment(s)",
                bare.len()
            ),
        })
    }
}

/// Tokenizer for the PGM text header; collects comments on the way.
struct HeaderParser<'a> {
    bytes: &'a [u8],
    pos: usize,
    comments: Vec<String>,
}

impl<'a> HeaderParser<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        HeaderParser {
            bytes,
            pos: 0,
            comments: Vec::new(),
        }
    }

    /// Next whitespace-delimited token, skipping `#` comment lines.
    fn token(&mut self) -> Option<&'a [u8]> {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos >= self.bytes.len() {
                return None;
            }
            if self.bytes[self.pos] == b'#' {
                let start = self.pos + 1;
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                let text = String::from_utf8_lossy(&self.bytes[start..self.pos]);
                self.comments.push(text.trim().to_string());
                continue;
            }
            let start = self.pos;
            while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            return Some(&self.bytes[start..self.pos]);
        }
    }

    /// Offset of the first pixel byte: a single whitespace byte follows the
    /// maxval token.
    fn pixel_data_start(&self) -> usize {
        self.pos + 1
    }
}
