//! Pairwise cost matrix and its on-disk format
//!
//! The NxN training cost matrix is dense, row-major, and symmetric by
//! construction: the upper triangle is computed and the lower triangle
//! mirrored. It is built once per training set, persisted, and loaded
//! read-only by later sessions.
//!
//! # File format
//!
//! A fixed 1024-byte header of 128 IEEE-754 little-endian doubles, then the
//! raw row-major f64 body:
//!
//! - `doubles[0]` / `doubles[1]`: first/last training index stored
//! - `doubles[2]` / `doubles[3]`: first/last row of a chunk file
//!   (both zero for a full matrix)
//! - remaining bytes: NUL-terminated free-form description text
//!
//! The double/text reinterpretation lives entirely inside [`MatrixHeader`];
//! everything else works with the typed fields.
//!
//! Chunk files cover a contiguous row range of the full matrix and can be
//! merged back into a full file; a merge fails if any row range is missing,
//! overlaps, or belongs to a different training range.

use crate::error::{ClusterError, ClusterResult};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Number of f64 slots in a matrix file header.
pub const HEADER_DOUBLES: usize = 128;

/// Header size in bytes.
pub const HEADER_BYTES: usize = HEADER_DOUBLES * 8;

/// Number of header slots that carry numeric fields (the rest is text).
const NUMERIC_SLOTS: usize = 4;

/// Value stored in matrix cells that have not been computed yet.
pub const UNCOMPUTED: f64 = 999_999.0;

/// Typed view of the 1024-byte matrix file header.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixHeader {
    /// First training index stored in the file.
    pub train_first: usize,
    /// Last training index stored in the file.
    pub train_last: usize,
    /// First matrix row in a chunk file (0 for a full matrix).
    pub chunk_first: usize,
    /// Last matrix row in a chunk file (0 for a full matrix).
    pub chunk_last: usize,
    /// Free-form description text.
    pub description: String,
}

impl MatrixHeader {
    /// Header for a full (non-chunked) matrix file.
    pub fn full(train_first: usize, train_last: usize, description: &str) -> Self {
        MatrixHeader {
            train_first,
            train_last,
            chunk_first: 0,
            chunk_last: 0,
            description: description.to_string(),
        }
    }

    /// Whether this header describes a chunk file.
    ///
    /// A full matrix stores zeros in both chunk slots; any other combination
    /// is a chunk.
    pub fn is_chunk(&self) -> bool {
        self.chunk_first != 0 || self.chunk_last != 0
    }

    /// Encode into the fixed 1024-byte on-disk layout.
    ///
    /// The description is truncated to the available text bytes and always
    /// NUL-terminated.
    pub fn to_bytes(&self) -> [u8; HEADER_BYTES] {
        let mut bytes = [0u8; HEADER_BYTES];
        let numeric = [
            self.train_first as f64,
            self.train_last as f64,
            self.chunk_first as f64,
            self.chunk_last as f64,
        ];
        for (i, v) in numeric.iter().enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&v.to_le_bytes());
        }
        let text = self.description.as_bytes();
        let text_capacity = HEADER_BYTES - NUMERIC_SLOTS * 8 - 1;
        let n = text.len().min(text_capacity);
        bytes[NUMERIC_SLOTS * 8..NUMERIC_SLOTS * 8 + n].copy_from_slice(&text[..n]);
        bytes
    }

    /// Decode from the fixed on-disk layout.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::HeaderMalformed`] for an inverted training
    /// range or unterminated description text; `path` only labels the error.
    pub fn from_bytes(bytes: &[u8; HEADER_BYTES], path: &str) -> ClusterResult<Self> {
        let slot = |i: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            f64::from_le_bytes(b)
        };
        let as_index = |i: usize| -> ClusterResult<usize> {
            let v = slot(i);
            if v < 0.0 || v.fract() != 0.0 {
                return Err(ClusterError::HeaderMalformed {
                    path: path.to_string(),
                    reason: format!("slot {i} is not a non-negative integer: {v}"),
                });
            }
            Ok(v as usize)
        };
        let train_first = as_index(0)?;
        let train_last = as_index(1)?;
        let chunk_first = as_index(2)?;
        let chunk_last = as_index(3)?;
        if train_last < train_first {
            return Err(ClusterError::HeaderMalformed {
                path: path.to_string(),
                reason: format!("inverted training range {train_first}..={train_last}"),
            });
        }
        let text = &bytes[NUMERIC_SLOTS * 8..];
        let nul = text
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| ClusterError::HeaderMalformed {
                path: path.to_string(),
                reason: "description text is not NUL-terminated".to_string(),
            })?;
        let description = String::from_utf8_lossy(&text[..nul]).into_owned();
        Ok(MatrixHeader {
            train_first,
            train_last,
            chunk_first,
            chunk_last,
            description,
        })
    }

    fn read_from(reader: &mut impl Read, path: &str) -> ClusterResult<Self> {
        let mut bytes = [0u8; HEADER_BYTES];
        reader.read_exact(&mut bytes)?;
        Self::from_bytes(&bytes, path)
    }
}

/// Dense symmetric pairwise cost matrix over a training range.
///
/// Indices into the matrix are relative to `train_first`; the absolute
/// training range only matters for file headers and range checks.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    train_first: usize,
    train_last: usize,
    values: Vec<f64>,
}

impl CostMatrix {
    /// Wrap a row-major value buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::SizeMismatch`] if the buffer is not
    /// `n * n` for the given range.
    pub fn from_values(
        train_first: usize,
        train_last: usize,
        values: Vec<f64>,
    ) -> ClusterResult<Self> {
        if train_last < train_first {
            return Err(ClusterError::EmptyTrainingSet);
        }
        let n = train_last - train_first + 1;
        if values.len() != n * n {
            return Err(ClusterError::SizeMismatch {
                expected: n * n,
                actual: values.len(),
            });
        }
        Ok(CostMatrix {
            train_first,
            train_last,
            values,
        })
    }

    /// Number of training items covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.train_last - self.train_first + 1
    }

    /// Whether the matrix covers no items (never true for a constructed one).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First absolute training index.
    #[inline]
    pub fn train_first(&self) -> usize {
        self.train_first
    }

    /// Last absolute training index.
    #[inline]
    pub fn train_last(&self) -> usize {
        self.train_last
    }

    /// Cost between items `r` and `c` (indices relative to the range).
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        let n = self.len();
        debug_assert!(r < n && c < n);
        self.values[r * n + c]
    }

    /// Set the cost between items `r` and `c`.
    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: f64) {
        let n = self.len();
        debug_assert!(r < n && c < n);
        self.values[r * n + c] = v;
    }

    /// Raw row-major values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Copy the upper triangle onto the lower triangle.
    pub fn mirror_lower_triangle(&mut self) {
        let n = self.len();
        for r in 0..n {
            for c in 0..r {
                self.values[r * n + c] = self.values[c * n + r];
            }
        }
    }

    /// Persist as a full matrix file.
    pub fn save(&self, path: &Path, description: &str) -> ClusterResult<()> {
        let header = MatrixHeader::full(self.train_first, self.train_last, description);
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&header.to_bytes())?;
        for v in &self.values {
            out.write_all(&v.to_le_bytes())?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write the matrix as a raw grayscale PGM for visual inspection, one
    /// pixel per cell, costs scaled so `max_cost` maps to white (anything
    /// above is clipped).
    pub fn save_preview_pgm(&self, path: &Path, max_cost: f64) -> ClusterResult<()> {
        let n = self.len();
        let scale = if max_cost > 0.0 { 255.0 / max_cost } else { 0.0 };
        let mut out = BufWriter::new(File::create(path)?);
        write!(out, "P5\n{n} {n}\n255\n")?;
        let pixels: Vec<u8> = self
            .values
            .iter()
            .map(|&v| (v * scale).clamp(0.0, 255.0) as u8)
            .collect();
        out.write_all(&pixels)?;
        out.flush()?;
        Ok(())
    }

    /// Load the requested training range from a full matrix file.
    ///
    /// The stored range may be wider than the requested one; rows and
    /// columns outside the request are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFullMatrix`] for a chunk file,
    /// [`ClusterError::RangeMismatch`] if the request falls outside the
    /// stored range, and [`ClusterError::HeaderMalformed`] for a bad header.
    pub fn load(path: &Path, want_first: usize, want_last: usize) -> ClusterResult<Self> {
        let path_str = path.display().to_string();
        let mut reader = BufReader::new(File::open(path)?);
        let header = MatrixHeader::read_from(&mut reader, &path_str)?;
        if header.is_chunk() {
            return Err(ClusterError::NotFullMatrix {
                path: path_str,
                chunk_first: header.chunk_first,
                chunk_last: header.chunk_last,
            });
        }
        if want_first < header.train_first || want_last > header.train_last {
            return Err(ClusterError::RangeMismatch {
                path: path_str,
                stored_first: header.train_first,
                stored_last: header.train_last,
                requested_first: want_first,
                requested_last: want_last,
            });
        }
        let stored_n = header.train_last - header.train_first + 1;
        let want_n = want_last - want_first + 1;
        let skip = want_first - header.train_first;
        // position at (skip, skip) of the stored matrix
        reader.seek(SeekFrom::Start(
            (HEADER_BYTES + (skip * stored_n + skip) * 8) as u64,
        ))?;
        let mut values = vec![0.0f64; want_n * want_n];
        let mut row_buf = vec![0u8; want_n * 8];
        for r in 0..want_n {
            reader.read_exact(&mut row_buf)?;
            for c in 0..want_n {
                values[r * want_n + c] =
                    f64::from_le_bytes(row_buf[c * 8..(c + 1) * 8].try_into().unwrap());
            }
            if r + 1 < want_n && stored_n > want_n {
                reader.seek(SeekFrom::Current(((stored_n - want_n) * 8) as i64))?;
            }
        }
        CostMatrix::from_values(want_first, want_last, values)
    }
}

/// A contiguous row range of a cost matrix, as produced by a chunked build.
///
/// Chunk row indices are relative to the training range (row 0 is
/// `train_first`). Cells left of the diagonal hold a sentinel until the
/// merged matrix is mirrored.
#[derive(Debug, Clone)]
pub struct MatrixChunk {
    /// First absolute training index of the full matrix.
    pub train_first: usize,
    /// Last absolute training index of the full matrix.
    pub train_last: usize,
    /// First row covered by this chunk (relative).
    pub chunk_first: usize,
    /// Last row covered by this chunk (relative).
    pub chunk_last: usize,
    /// Row-major cell values, `(chunk_last - chunk_first + 1) * n` entries.
    pub rows: Vec<f64>,
}

impl MatrixChunk {
    /// Number of rows in the chunk.
    pub fn num_rows(&self) -> usize {
        self.chunk_last - self.chunk_first + 1
    }

    /// Persist as a chunk file.
    pub fn save(&self, path: &Path, description: &str) -> ClusterResult<()> {
        let header = MatrixHeader {
            train_first: self.train_first,
            train_last: self.train_last,
            chunk_first: self.chunk_first,
            chunk_last: self.chunk_last,
            description: description.to_string(),
        };
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&header.to_bytes())?;
        for v in &self.rows {
            out.write_all(&v.to_le_bytes())?;
        }
        out.flush()?;
        Ok(())
    }

    /// Load a chunk file.
    pub fn load(path: &Path) -> ClusterResult<Self> {
        let path_str = path.display().to_string();
        let mut reader = BufReader::new(File::open(path)?);
        let header = MatrixHeader::read_from(&mut reader, &path_str)?;
        let n = header.train_last - header.train_first + 1;
        if header.chunk_last < header.chunk_first || header.chunk_last >= n {
            return Err(ClusterError::HeaderMalformed {
                path: path_str,
                reason: format!(
                    "chunk rows {}..={} outside matrix of {n} rows",
                    header.chunk_first, header.chunk_last
                ),
            });
        }
        let num_rows = header.chunk_last - header.chunk_first + 1;
        let mut body = vec![0u8; num_rows * n * 8];
        reader.read_exact(&mut body)?;
        let rows = body
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes(b.try_into().unwrap()))
            .collect();
        Ok(MatrixChunk {
            train_first: header.train_first,
            train_last: header.train_last,
            chunk_first: header.chunk_first,
            chunk_last: header.chunk_last,
            rows,
        })
    }
}

/// Merge chunk files covering disjoint row ranges of one training set into a
/// full matrix file at `out_path`, and return the merged matrix.
///
/// # Errors
///
/// Fails (without writing) if any chunk belongs to a different training
/// range, two chunks cover the same row, or rows are left uncovered.
pub fn merge_chunks(
    out_path: &Path,
    chunk_paths: &[&Path],
    description: &str,
) -> ClusterResult<CostMatrix> {
    let first_path = chunk_paths
        .first()
        .ok_or(ClusterError::EmptyTrainingSet)?;
    let first = MatrixChunk::load(first_path)?;
    let (train_first, train_last) = (first.train_first, first.train_last);
    let n = train_last - train_first + 1;
    let mut values = vec![UNCOMPUTED; n * n];
    let mut covered = vec![false; n];

    let mut apply = |chunk: MatrixChunk, path: &Path| -> ClusterResult<()> {
        if (chunk.train_first, chunk.train_last) != (train_first, train_last) {
            return Err(ClusterError::ChunkRangeMismatch {
                path: path.display().to_string(),
                expected_first: train_first,
                expected_last: train_last,
                actual_first: chunk.train_first,
                actual_last: chunk.train_last,
            });
        }
        for r in chunk.chunk_first..=chunk.chunk_last {
            if covered[r] {
                return Err(ClusterError::ChunkOverlap {
                    path: path.display().to_string(),
                    row: r,
                });
            }
            covered[r] = true;
        }
        let offset = chunk.chunk_first * n;
        values[offset..offset + chunk.rows.len()].copy_from_slice(&chunk.rows);
        Ok(())
    };

    apply(first, first_path)?;
    for path in &chunk_paths[1..] {
        apply(MatrixChunk::load(path)?, path)?;
    }
    drop(apply);

    if let Some(gap_first) = covered.iter().position(|&c| !c) {
        let gap_last = covered[gap_first..]
            .iter()
            .position(|&c| c)
            .map(|off| gap_first + off - 1)
            .unwrap_or(n - 1);
        return Err(ClusterError::ChunkMissing {
            first: gap_first,
            last: gap_last,
        });
    }

    let mut matrix = CostMatrix::from_values(train_first, train_last, values)?;
    matrix.mirror_lower_triangle();
    matrix.save(out_path, description)?;
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let h = MatrixHeader {
            train_first: 3,
            train_last: 42,
            chunk_first: 5,
            chunk_last: 9,
            description: "10 compares in 1.25 seconds".to_string(),
        };
        let bytes = h.to_bytes();
        let back = MatrixHeader::from_bytes(&bytes, "mem").unwrap();
        assert_eq!(back, h);
        assert!(back.is_chunk());
    }

    #[test]
    fn test_header_full_is_not_chunk() {
        let h = MatrixHeader::full(0, 9, "full");
        assert!(!h.is_chunk());
        let back = MatrixHeader::from_bytes(&h.to_bytes(), "mem").unwrap();
        assert_eq!(back.chunk_first, 0);
        assert_eq!(back.chunk_last, 0);
    }

    #[test]
    fn test_header_description_truncated() {
        let long = "x".repeat(2000);
        let h = MatrixHeader::full(0, 1, &long);
        let back = MatrixHeader::from_bytes(&h.to_bytes(), "mem").unwrap();
        assert_eq!(back.description.len(), HEADER_BYTES - NUMERIC_SLOTS * 8 - 1);
    }

    #[test]
    fn test_header_rejects_inverted_range() {
        let h = MatrixHeader::full(5, 2, "bad");
        assert!(MatrixHeader::from_bytes(&h.to_bytes(), "mem").is_err());
    }

    #[test]
    fn test_mirror_lower_triangle() {
        let mut m = CostMatrix::from_values(
            0,
            2,
            vec![
                0.0, 1.0, 2.0, //
                9.0, 0.0, 3.0, //
                9.0, 9.0, 0.0,
            ],
        )
        .unwrap();
        m.mirror_lower_triangle();
        assert_eq!(m.get(1, 0), 1.0);
        assert_eq!(m.get(2, 0), 2.0);
        assert_eq!(m.get(2, 1), 3.0);
    }

    #[test]
    fn test_preview_pgm() {
        let m = CostMatrix::from_values(0, 1, vec![0.0, 10.0, 10.0, 0.0]).unwrap();
        let dir = std::env::temp_dir().join("wordmorph_matrix_preview_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("preview.pgm");
        m.save_preview_pgm(&path, 20.0).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"P5\n2 2\n255\n"));
        assert_eq!(&bytes[bytes.len() - 4..], &[0u8, 127, 127, 0]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_from_values_size_check() {
        assert!(CostMatrix::from_values(0, 2, vec![0.0; 8]).is_err());
        assert!(CostMatrix::from_values(0, 2, vec![0.0; 9]).is_ok());
    }
}
