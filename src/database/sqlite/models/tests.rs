use super::*;
use std::str::FromStr;

#[test]
fn content_kind_round_trips_through_strings() {
    let kinds = [
        ContentKind::Webpage,
        ContentKind::Pdf,
        ContentKind::Image,
        ContentKind::Note,
        ContentKind::Bookmark,
        ContentKind::History,
    ];

    for kind in kinds {
        let parsed = ContentKind::from_str(kind.as_str()).expect("should parse own string form");
        assert_eq!(parsed, kind);
    }
}

#[test]
fn content_kind_parse_is_case_insensitive() {
    assert_eq!(
        ContentKind::from_str("Webpage").expect("should parse"),
        ContentKind::Webpage
    );
    assert!(ContentKind::from_str("tweet").is_err());
}

#[test]
fn origin_round_trips_through_strings() {
    for origin in [Origin::Manual, Origin::Extension, Origin::Api] {
        let parsed = Origin::from_str(origin.as_str()).expect("should parse own string form");
        assert_eq!(parsed, origin);
    }
    assert!(Origin::from_str("carrier-pigeon").is_err());
}

#[test]
fn new_record_defaults() {
    let new_record = NewContentRecord::default();
    assert_eq!(new_record.content_kind, ContentKind::Note);
    assert_eq!(new_record.origin, Origin::Manual);
    assert_eq!(new_record.category, DEFAULT_CATEGORY);
    assert!(new_record.keywords.is_empty());
    assert!(new_record.date_added.is_none());
}
