use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// The current UTC time, truncated to milliseconds so that it survives
/// a round trip through either store unchanged.
pub fn now() -> OffsetDateTime {
    truncate(OffsetDateTime::now_utc())
}

/// Interprets a payload value as a timestamp: an RFC 3339 string or a
/// number of milliseconds since the Unix epoch.
pub fn parse(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::String(s) => OffsetDateTime::parse(s.trim(), &Rfc3339).ok().map(truncate),
        Value::Number(n) => {
            let millis = n.as_f64()?;

            if !millis.is_finite() {
                return None;
            }

            let nanos = (millis.trunc() as i128).checked_mul(1_000_000)?;

            OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
        }
        _ => None,
    }
}

fn truncate(timestamp: OffsetDateTime) -> OffsetDateTime {
    let millis = timestamp.nanosecond() / 1_000_000 * 1_000_000;

    timestamp.replace_nanosecond(millis).unwrap_or(timestamp)
}
