use autotrade_chart::chart::time::{TimeNormalizer, DEFAULT_LABEL_FORMAT};
use autotrade_chart::error::RecordError;
use autotrade_chart::model::timestamp::RawTimestamp;

#[test]
/// Verifies equal instants written differently produce the same label:
/// an ISO string with offset, a naive string in display time, and epoch millis.
fn equal_instants_share_label() {
    let n = TimeNormalizer::default();
    let iso = n.normalize(&"2024-01-02T01:30:00Z".into()).unwrap();
    let naive = n.normalize(&"2024-01-02 09:30:00".into()).unwrap();
    let millis = n.normalize(&RawTimestamp::EpochMillis(1_704_159_000_000)).unwrap();

    assert_eq!(iso, naive);
    assert_eq!(naive, millis);
    assert_eq!(millis.label, "01-02 09:30");
}

#[test]
/// Verifies fractional seconds and minute-only layouts are accepted.
fn accepts_fractional_and_minute_precision() {
    let n = TimeNormalizer::default();
    let frac = n.normalize(&"2024-01-02T09:30:00.250".into()).unwrap();
    assert_eq!(frac.instant_ms, 1_704_159_000_250);
    assert_eq!(frac.label, "01-02 09:30");

    let minute = n.normalize(&"2024-01-02 14:59".into()).unwrap();
    assert_eq!(minute.label, "01-02 14:59");
}

#[test]
/// Verifies unparseable input is a per-record error, not a panic.
fn garbage_is_invalid_timestamp() {
    let n = TimeNormalizer::default();
    for raw in ["", "yesterday", "2024-13-40 25:61:00", "09:30"] {
        let err = n.normalize(&raw.into()).unwrap_err();
        assert!(matches!(err, RecordError::InvalidTimestamp(_)), "{raw}: {err:?}");
    }
}

#[test]
/// Verifies the display timezone is configurable and the instant is not.
fn custom_offset_changes_label_only() {
    let utc = TimeNormalizer::new(0, DEFAULT_LABEL_FORMAT).unwrap();
    let shanghai = TimeNormalizer::default();
    let raw = RawTimestamp::EpochMillis(1_704_159_000_000);

    let a = utc.normalize(&raw).unwrap();
    let b = shanghai.normalize(&raw).unwrap();
    assert_eq!(a.instant_ms, b.instant_ms);
    assert_eq!(a.label, "01-02 01:30");
    assert_eq!(b.label, "01-02 09:30");
}

#[test]
/// Verifies a custom label format is applied.
fn custom_label_format() {
    let n = TimeNormalizer::new(480, "%H:%M").unwrap();
    let t = n.normalize(&"2024-01-02T09:31:00".into()).unwrap();
    assert_eq!(t.label, "09:31");
}

#[test]
/// Verifies short digit strings such as compact dates are rejected instead of
/// being read as instants in 1970.
fn short_digit_strings_are_invalid() {
    let n = TimeNormalizer::default();
    for raw in ["20240102", "1704159000", "0"] {
        let err = n.normalize(&raw.into()).unwrap_err();
        assert!(matches!(err, RecordError::InvalidTimestamp(_)), "{raw}: {err:?}");
    }
    assert!(n.normalize(&"1704159000000".into()).is_ok());
}
