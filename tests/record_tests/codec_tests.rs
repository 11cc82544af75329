//! Tests for the record codec
//!
//! These tests verify:
//! - Exact line encoding (field order, 2-decimal value, tag joining)
//! - Decoding with and without the trailing newline
//! - Malformed lines (field count, status, value, UTF-8)
//! - The empty tag field edge case
//! - Record validation before append

use mtfstore::record::{decode, encode, Malformed, Record, Status};
use mtfstore::StoreError;

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_record() -> Record {
    Record::new(
        "000000001",
        Status::Active,
        "2024-01-01 12:00:00",
        1234.5,
        vec!["tag_1".to_string(), "tag_2".to_string()],
    )
}

// =============================================================================
// Encode Tests
// =============================================================================

#[test]
fn test_encode_exact_line() {
    let bytes = encode(&sample_record());

    assert_eq!(
        bytes,
        b"000000001;ACTIVE;2024-01-01 12:00:00;1234.50;tag_1,tag_2\n".to_vec()
    );
}

#[test]
fn test_encode_rounds_value_to_two_decimals() {
    let mut record = sample_record();
    record.value = 3.14159;

    let line = String::from_utf8(encode(&record)).unwrap();

    assert!(line.contains(";3.14;"));
}

#[test]
fn test_encode_single_tag_has_no_comma() {
    let mut record = sample_record();
    record.tags = vec!["only".to_string()];

    let line = String::from_utf8(encode(&record)).unwrap();

    assert!(line.ends_with(";only\n"));
}

#[test]
fn test_encode_every_status() {
    for status in Status::ALL {
        let mut record = sample_record();
        record.status = status;

        let line = String::from_utf8(encode(&record)).unwrap();

        assert!(line.starts_with(&format!("000000001;{};", status.as_str())));
    }
}

#[test]
fn test_encode_length_is_byte_length() {
    let mut record = sample_record();
    record.tags = vec!["ünïcödé".to_string()];

    let bytes = encode(&record);
    let text = String::from_utf8(bytes.clone()).unwrap();

    assert!(bytes.len() > text.chars().count());
}

// =============================================================================
// Decode Tests
// =============================================================================

#[test]
fn test_round_trip() {
    let records = vec![
        sample_record(),
        Record::new("000000042", Status::Pending, "yesterday", 0.0, vec!["a".into()]),
        Record::new(
            "999999999",
            Status::Failed,
            "2023-12-31 23:59:59",
            9999.99,
            vec!["x".into(), "y".into(), "x".into(), "z".into(), "w".into()],
        ),
        Record::new("000000007", Status::Completed, "", -12.25, vec!["neg".into()]),
    ];

    for record in records {
        assert_eq!(decode(&encode(&record)).unwrap(), record);
    }
}

#[test]
fn test_decode_without_newline() {
    let line = b"000000001;ACTIVE;2024-01-01 12:00:00;1234.50;tag_1,tag_2";

    assert_eq!(decode(line).unwrap(), sample_record());
}

#[test]
fn test_decode_non_canonical_value() {
    let record = decode(b"000000005;FAILED;t;7.5;a\n").unwrap();

    assert_eq!(record.value, 7.5);
    assert_eq!(record.status, Status::Failed);
}

#[test]
fn test_decode_empty_tag_field_gives_one_empty_tag() {
    let record = decode(b"000000001;ACTIVE;t;1.00;\n").unwrap();

    assert_eq!(record.tags, vec![String::new()]);
}

#[test]
fn test_decode_too_few_fields() {
    let result = decode(b"000000001;ACTIVE;t;1.00\n");

    assert_eq!(result, Err(Malformed::FieldCount(4)));
}

#[test]
fn test_decode_too_many_fields() {
    let result = decode(b"000000001;ACTIVE;t;1.00;a;b\n");

    assert_eq!(result, Err(Malformed::FieldCount(6)));
}

#[test]
fn test_decode_empty_line() {
    assert_eq!(decode(b"\n"), Err(Malformed::FieldCount(1)));
}

#[test]
fn test_decode_unknown_status() {
    let result = decode(b"000000001;active;t;1.00;a\n");

    assert_eq!(result, Err(Malformed::UnknownStatus("active".to_string())));
}

#[test]
fn test_decode_invalid_value() {
    let result = decode(b"000000001;ACTIVE;t;lots;a\n");

    assert_eq!(result, Err(Malformed::InvalidValue("lots".to_string())));
}

#[test]
fn test_decode_rejects_non_finite_value() {
    for text in ["NaN", "inf", "-inf"] {
        let line = format!("000000001;ACTIVE;t;{};a\n", text);

        assert_eq!(
            decode(line.as_bytes()),
            Err(Malformed::InvalidValue(text.to_string()))
        );
    }
}

#[test]
fn test_decode_invalid_utf8() {
    let result = decode(b"000000001;ACTIVE;\xff\xfe;1.00;a\n");

    assert_eq!(result, Err(Malformed::NotUtf8));
}

// =============================================================================
// Status Tests
// =============================================================================

#[test]
fn test_status_parse_and_display() {
    for status in Status::ALL {
        let parsed: Status = status.to_string().parse().unwrap();
        assert_eq!(parsed, status);
    }
    assert!("DONE".parse::<Status>().is_err());
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_format_id_pads_to_nine_digits() {
    assert_eq!(Record::format_id(42), "000000042");
    assert_eq!(Record::format_id(0), "000000000");
    assert_eq!(Record::format_id(123456789), "123456789");
}

#[test]
fn test_validate_accepts_well_formed_record() {
    assert!(sample_record().validate().is_ok());
}

#[test]
fn test_validate_rejects_bad_ids() {
    for id in ["1", "0000000001", "00000000a", "", "-00000001"] {
        let mut record = sample_record();
        record.id = id.to_string();

        assert!(matches!(record.validate(), Err(StoreError::InvalidRecord(_))), "id {:?}", id);
    }
}

#[test]
fn test_validate_rejects_separators() {
    let mut record = sample_record();
    record.timestamp = "2024;01".to_string();
    assert!(matches!(record.validate(), Err(StoreError::InvalidRecord(_))));

    let mut record = sample_record();
    record.timestamp = "line\nbreak".to_string();
    assert!(matches!(record.validate(), Err(StoreError::InvalidRecord(_))));

    let mut record = sample_record();
    record.tags = vec!["a,b".to_string()];
    assert!(matches!(record.validate(), Err(StoreError::InvalidRecord(_))));

    let mut record = sample_record();
    record.tags = vec!["a;b".to_string()];
    assert!(matches!(record.validate(), Err(StoreError::InvalidRecord(_))));
}

#[test]
fn test_validate_rejects_non_finite_values() {
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let mut record = sample_record();
        record.value = value;

        assert!(matches!(record.validate(), Err(StoreError::InvalidRecord(_))), "value {}", value);
    }
}

#[test]
fn test_validate_rejects_empty_tag_list() {
    let mut record = sample_record();
    record.tags.clear();

    assert!(matches!(record.validate(), Err(StoreError::InvalidRecord(_))));
}

#[test]
fn test_validate_allows_more_than_five_tags() {
    let mut record = sample_record();
    record.tags = (0..8).map(|i| format!("tag_{}", i)).collect();

    assert!(record.validate().is_ok());
}
