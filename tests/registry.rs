extern crate exr_codecs;

use exr_codecs::prelude::*;
use exr_codecs::compression::registry::{all_names, num_scan_lines_for, is_lossy, supports_deep, CODECS};

#[test]
fn unknown_names_are_not_found() {
    assert!(lookup_by_name("not-a-codec").is_none());
    assert!(lookup_by_name("").is_none());
    assert!(lookup_by_id(CODECS.len() as u8).is_none());
}

#[test]
fn unknown_names_are_reported_literally() {
    let error = "not-a-codec".parse::<Compression>().unwrap_err();
    assert!(matches!(error, Error::Configuration(_)));

    let message = error.to_string();
    assert!(message.contains("\"not-a-codec\""), "{}", message);
    assert!(message.contains(&all_names(", ")), "{}", message);
}

#[test]
fn names_resolve_to_their_ids() {
    for codec in CODECS.iter() {
        assert_eq!(lookup_by_name(codec.name).map(|found| found.id), Some(codec.id));
        assert_eq!(lookup_by_name(&codec.name.to_uppercase()).map(|found| found.id), Some(codec.id));

        let compression: Compression = codec.name.parse().unwrap();
        assert_eq!(compression.id(), codec.id);
        assert_eq!(compression.scan_lines_per_block(), codec.scan_lines);
        assert_eq!(num_scan_lines_for(codec.id), Some(codec.scan_lines));
    }

    assert_eq!(lookup_by_name("no").map(|codec| codec.id), Some(0));
    assert_eq!("ZSTD".parse::<Compression>().unwrap(), Compression::ZSTD);
}

#[test]
fn capabilities() {
    let deep: Vec<&str> = CODECS.iter().filter(|codec| supports_deep(codec.id)).map(|codec| codec.name).collect();
    assert_eq!(deep, vec![ "none", "rle", "zips", "zstd" ]);

    let lossy: Vec<&str> = CODECS.iter().filter(|codec| is_lossy(codec.id)).map(|codec| codec.name).collect();
    assert_eq!(lossy, vec![ "pxr24", "b44", "b44a", "dwaa", "dwab" ]);

    assert!(!is_lossy(200));
    assert!(!supports_deep(200));
    assert_eq!(num_scan_lines_for(200), None);
}
