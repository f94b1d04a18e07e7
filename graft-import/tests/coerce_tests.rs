use chrono::{Datelike, FixedOffset, TimeZone};
use graft_import::{CoercionError, coerce};
use graft_model::{AttributeMetadata, DEFAULT_IMPORT_DATE_FORMAT, DateFormat};
use graft_types::{AttributeType, AttributeValue};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

fn attr(attribute_type: AttributeType) -> AttributeMetadata {
    AttributeMetadata {
        name: "field".into(),
        import_key: "field".into(),
        attribute_type,
        date_format: None,
        primary_key: false,
    }
}

fn default_format() -> DateFormat {
    DateFormat::new(DEFAULT_IMPORT_DATE_FORMAT).unwrap()
}

fn run(raw: Value, attribute_type: AttributeType) -> Result<Option<AttributeValue>, CoercionError> {
    coerce(&raw, &attr(attribute_type), &default_format())
}

fn ok(raw: Value, attribute_type: AttributeType) -> AttributeValue {
    run(raw, attribute_type).unwrap().unwrap()
}

// ── null ─────────────────────────────────────────────────────────

#[test]
fn null_leaves_attribute_unset_for_every_type() {
    for t in [
        AttributeType::String,
        AttributeType::Integer,
        AttributeType::Double,
        AttributeType::Boolean,
        AttributeType::Date,
        AttributeType::Binary,
    ] {
        assert_eq!(run(Value::Null, t).unwrap(), None);
    }
}

// ── string ───────────────────────────────────────────────────────

#[test]
fn string_passes_through() {
    assert_eq!(ok(json!("abc"), AttributeType::String), AttributeValue::from("abc"));
}

#[test]
fn string_normalizes_scalars() {
    assert_eq!(ok(json!(42), AttributeType::String), AttributeValue::from("42"));
    assert_eq!(ok(json!(true), AttributeType::String), AttributeValue::from("true"));
}

#[test]
fn string_rejects_containers() {
    assert!(matches!(
        run(json!({"a": 1}), AttributeType::String),
        Err(CoercionError::CoercionFailure { .. })
    ));
    assert!(run(json!([1]), AttributeType::String).is_err());
}

// ── numbers ──────────────────────────────────────────────────────

#[test]
fn integer_from_number_and_numeric_string() {
    assert_eq!(ok(json!(7), AttributeType::Integer), AttributeValue::Integer(7));
    assert_eq!(ok(json!("-12"), AttributeType::Integer), AttributeValue::Integer(-12));
    assert_eq!(ok(json!(" 3 "), AttributeType::Integer), AttributeValue::Integer(3));
    assert_eq!(ok(json!(4.0), AttributeType::Integer), AttributeValue::Integer(4));
    assert_eq!(ok(json!("5.0"), AttributeType::Integer), AttributeValue::Integer(5));
    assert_eq!(ok(json!(true), AttributeType::Integer), AttributeValue::Integer(1));
}

#[test]
fn integer_rejects_fractions_and_overflow() {
    assert!(run(json!(4.5), AttributeType::Integer).is_err());
    assert!(run(json!("abc"), AttributeType::Integer).is_err());
    assert!(run(json!(u64::MAX), AttributeType::Integer).is_err());
    assert!(run(json!(1e300), AttributeType::Integer).is_err());
}

#[test]
fn double_from_number_and_numeric_string() {
    assert_eq!(ok(json!(2.5), AttributeType::Double), AttributeValue::Double(2.5));
    assert_eq!(ok(json!(3), AttributeType::Double), AttributeValue::Double(3.0));
    assert_eq!(ok(json!("1.25"), AttributeType::Double), AttributeValue::Double(1.25));
    assert!(run(json!("one"), AttributeType::Double).is_err());
}

#[test]
fn non_finite_strings_are_rejected() {
    for raw in ["NaN", "nan", "inf", "-inf", "infinity", "-Infinity"] {
        assert!(
            matches!(
                run(json!(raw), AttributeType::Double),
                Err(CoercionError::CoercionFailure { .. })
            ),
            "{raw} accepted as double"
        );
        assert!(run(json!(raw), AttributeType::Integer).is_err(), "{raw} accepted as integer");
    }
}

// ── boolean ──────────────────────────────────────────────────────

#[test]
fn boolean_from_various_inputs() {
    assert_eq!(ok(json!(false), AttributeType::Boolean), AttributeValue::Boolean(false));
    assert_eq!(ok(json!(1), AttributeType::Boolean), AttributeValue::Boolean(true));
    assert_eq!(ok(json!(0), AttributeType::Boolean), AttributeValue::Boolean(false));
    assert_eq!(ok(json!("YES"), AttributeType::Boolean), AttributeValue::Boolean(true));
    assert_eq!(ok(json!("false"), AttributeType::Boolean), AttributeValue::Boolean(false));
    assert!(run(json!("maybe"), AttributeType::Boolean).is_err());
}

// ── date ─────────────────────────────────────────────────────────

#[test]
fn date_uses_default_format() {
    let value = ok(json!("2014-06-23T10:30:00+02:00"), AttributeType::Date);
    let expected = FixedOffset::east_opt(7200)
        .unwrap()
        .with_ymd_and_hms(2014, 6, 23, 10, 30, 0)
        .unwrap();
    assert_eq!(value, AttributeValue::Date(expected));
}

#[test]
fn date_prefers_attribute_format() {
    let mut a = attr(AttributeType::Date);
    a.date_format = Some(Arc::new(DateFormat::new("dd.MM.yyyy").unwrap()));
    let value = coerce(&json!("01.02.2003"), &a, &default_format()).unwrap().unwrap();
    let date = value.as_date().unwrap();
    assert_eq!((date.year(), date.month(), date.day()), (2003, 2, 1));

    // the default pattern no longer applies to this attribute
    let err = coerce(&json!("2014-06-23T10:30:00Z"), &a, &default_format()).unwrap_err();
    assert_eq!(
        err,
        CoercionError::DateFormatMismatch {
            attribute: "field".into(),
            value: "2014-06-23T10:30:00Z".into(),
            format: "dd.MM.yyyy".into(),
        }
    );
}

#[test]
fn date_mismatch_reports_default_pattern() {
    let err = run(json!("June 23rd"), AttributeType::Date).unwrap_err();
    assert!(matches!(
        err,
        CoercionError::DateFormatMismatch { format, .. } if format == DEFAULT_IMPORT_DATE_FORMAT
    ));
}

#[test]
fn date_must_be_a_string() {
    assert!(matches!(
        run(json!(1403519400), AttributeType::Date),
        Err(CoercionError::CoercionFailure { .. })
    ));
}

// ── binary ───────────────────────────────────────────────────────

#[test]
fn binary_from_base64() {
    assert_eq!(
        ok(json!("aGVsbG8="), AttributeType::Binary),
        AttributeValue::Binary(b"hello".to_vec())
    );
}

#[test]
fn binary_from_byte_array() {
    assert_eq!(
        ok(json!([0, 127, 255]), AttributeType::Binary),
        AttributeValue::Binary(vec![0, 127, 255])
    );
}

#[test]
fn binary_decoding_failures() {
    assert!(run(json!("not base64!"), AttributeType::Binary).is_err());
    assert!(run(json!([1, 256]), AttributeType::Binary).is_err());
    assert!(run(json!(12), AttributeType::Binary).is_err());
}
