//! Tolerant decoding of upstream responses.
//!
//! The scheduler's wire contract is only partially known: the dates listing
//! has been observed both as bare strings and as `{ "date": ... }` objects,
//! with and without a time suffix. Decoding therefore accepts every shape
//! seen in the wild and skips entries it cannot make sense of -- a malformed
//! entry must never take the poll loop down.

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

/// Decode the open-dates listing. Anything that is not an array (absent
/// body, error object) means no availability.
pub fn decode_dates(payload: &Value) -> Vec<NaiveDate> {
    let Some(entries) = payload.as_array() else {
        return Vec::new();
    };

    entries.iter().filter_map(date_entry).collect()
}

fn date_entry(entry: &Value) -> Option<NaiveDate> {
    let text = match entry {
        Value::String(text) => text.as_str(),
        Value::Object(fields) => fields.get("date")?.as_str()?,
        _ => return None,
    };

    // `2025-12-18` with an optional `T...` suffix.
    let date_part = text.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Decode the open-times listing for one date, preserving upstream order
/// (the first reported time is the fallback booking target).
pub fn decode_times(payload: &Value) -> Vec<NaiveTime> {
    let Some(entries) = payload.as_array() else {
        return Vec::new();
    };

    entries.iter().filter_map(time_entry).collect()
}

fn time_entry(entry: &Value) -> Option<NaiveTime> {
    let text = match entry {
        Value::String(text) => text.as_str(),
        Value::Object(fields) => fields.get("time")?.as_str()?,
        _ => return None,
    };

    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
}

/// Extract the confirmation identifier from an appointment-creation
/// response. A 2xx without a non-empty `publicId` is not a confirmation.
pub fn decode_confirmation(payload: &Value) -> Option<String> {
    payload
        .get("publicId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;

    use super::{decode_confirmation, decode_dates, decode_times};

    fn d(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("valid date literal")
    }

    #[test]
    fn dates_decode_from_strings_and_objects() {
        let payload = json!([
            "2025-12-18",
            { "date": "2025-12-19" },
            { "date": "2025-12-20T00:00:00.000+00:00" },
        ]);

        assert_eq!(
            decode_dates(&payload),
            vec![d("2025-12-18"), d("2025-12-19"), d("2025-12-20")]
        );
    }

    #[test]
    fn malformed_date_entries_are_skipped() {
        let payload = json!(["2025-12-18", 42, { "day": "2025-12-19" }, "not-a-date"]);
        assert_eq!(decode_dates(&payload), vec![d("2025-12-18")]);
    }

    #[test]
    fn non_array_payload_means_no_availability() {
        assert!(decode_dates(&json!(null)).is_empty());
        assert!(decode_dates(&json!({ "error": "maintenance" })).is_empty());
    }

    #[test]
    fn times_preserve_upstream_order() {
        let payload = json!([{ "time": "09:45" }, { "time": "08:30:00" }, "10:15"]);
        assert_eq!(
            decode_times(&payload),
            vec![
                NaiveTime::from_hms_opt(9, 45, 0).expect("valid"),
                NaiveTime::from_hms_opt(8, 30, 0).expect("valid"),
                NaiveTime::from_hms_opt(10, 15, 0).expect("valid"),
            ]
        );
    }

    #[test]
    fn confirmation_requires_a_non_empty_public_id() {
        assert_eq!(
            decode_confirmation(&json!({ "publicId": "CONF123" })),
            Some("CONF123".to_string())
        );
        assert_eq!(decode_confirmation(&json!({ "publicId": "" })), None);
        assert_eq!(decode_confirmation(&json!({ "status": "created" })), None);
    }
}
