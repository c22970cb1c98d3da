//! Wordmorph IO - PGM word-image input/output
//!
//! Loads and saves the binary PGM (P5) word images the rest of the workspace
//! consumes, including the embedded word metadata (threshold, label, page,
//! author) in either its property-comment or ordered-comment form.

pub mod error;
pub mod pgm;

pub use error::{IoError, IoResult};
pub use pgm::{read_pgm, write_pgm};
