//! PGM word-image I/O regression test
//!
//! Exercises the loader against both metadata forms, the fail-fast rule for
//! images with neither, and a small save/load batch as the training loaders
//! use it.
//!
//! Run with:
//! ```
//! cargo test -p wordmorph-io --test pgm_reg
//! ```

use std::path::PathBuf;
use wordmorph_core::{BitonalImage, INK};
use wordmorph_io::{IoError, read_pgm, write_pgm};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("wordmorph_pgm_reg").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn word_image(label: &str, stem: u32) -> BitonalImage {
    let mut img = BitonalImage::new(24, 12).unwrap();
    img.fill_rect(1, 7, 22, 2, INK);
    img.fill_rect(stem, 2, 2, 6, INK);
    img.set_threshold(Some(128));
    img.set_label(Some(label.to_string()));
    img.set_page(Some(1));
    img
}

#[test]
fn pgm_reg() {
    let dir = temp_dir("batch");

    // -----------------------------------------------------------
    // batch save/load with property metadata, as the training
    // loader consumes it
    // -----------------------------------------------------------
    let words = [("orders", 3u32), ("deeds", 9), ("orders", 15)];
    for (i, (label, stem)) in words.iter().enumerate() {
        let path = dir.join(format!("thresh_w_{i:08}.pgm"));
        write_pgm(&word_image(label, *stem), &path).unwrap();
    }
    for (i, (label, _)) in words.iter().enumerate() {
        let path = dir.join(format!("thresh_w_{i:08}.pgm"));
        let img = read_pgm(&path).unwrap();
        assert_eq!(img.require_label(&path.display().to_string()).unwrap(), *label);
        assert_eq!(img.threshold(), Some(128));
        assert_eq!(img.page(), Some(1));
        assert!(img.check_bitonal().is_ok());
        assert!(img.ink_count() > 0);
    }

    // -----------------------------------------------------------
    // ordered-comment metadata form
    // -----------------------------------------------------------
    let comment_path = dir.join("comment_form.pgm");
    let mut file = Vec::new();
    file.extend_from_slice(b"P5\n# 99\n# oath\n# 17\n3 2\n255\n");
    file.extend_from_slice(&[0, 255, 0, 255, 0, 255]);
    std::fs::write(&comment_path, &file).unwrap();
    let img = read_pgm(&comment_path).unwrap();
    assert_eq!(img.label(), Some("oath"));
    assert_eq!(img.threshold(), Some(99));
    assert_eq!(img.page(), Some(17));

    // -----------------------------------------------------------
    // neither metadata form: fail fast with a named reason
    // -----------------------------------------------------------
    let bare_path = dir.join("bare.pgm");
    std::fs::write(&bare_path, b"P5\n2 1\n255\n\x00\xff").unwrap();
    match read_pgm(&bare_path) {
        Err(IoError::BadMetadata { path, .. }) => {
            assert!(path.contains("bare.pgm"));
        }
        other => panic!("expected BadMetadata, got {other:?}"),
    }

    std::fs::remove_dir_all(dir).unwrap();
}
