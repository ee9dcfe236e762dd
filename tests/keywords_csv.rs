// tests/keywords_csv.rs
use arxiv_curator::keywords::{load_watch_terms_from, match_terms};
use std::fs;
use std::path::Path;

#[test]
fn first_field_of_each_row_in_order() {
    let terms = load_watch_terms_from(Path::new("tests/fixtures/keywords.csv")).unwrap();
    assert_eq!(
        terms,
        vec![
            "Pose".to_string(),
            "diffusion".to_string(),
            "NeRF, radiance fields".to_string()
        ]
    );
}

#[test]
fn missing_or_blank_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_watch_terms_from(&dir.path().join("nope.csv")).is_err());

    let blank = dir.path().join("blank.csv");
    fs::write(&blank, "\n \n").unwrap();
    assert!(load_watch_terms_from(&blank).is_err());
}

#[test]
fn pose_matches_lowercase_text() {
    let terms = vec!["Pose".to_string()];
    assert_eq!(
        match_terms("Towards 3D human pose estimation", &terms),
        vec!["Pose".to_string()]
    );
}
