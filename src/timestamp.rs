//! Conversion of SAIH Duero chart dates into UTC instants.
//!
//! Chart points carry local Spanish time (`DD/MM/YYYY HH:mm`). The offset is
//! +01:00 in winter and +02:00 in summer, so the conversion goes through the
//! tz database rather than a fixed shift.

use chrono::{Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::fetch_error::FetchError;

/// Civil timezone of the source site.
pub const SOURCE_TIMEZONE: Tz = chrono_tz::Europe::Madrid;

/// Format of the `d` field in chart data.
pub const SOURCE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Value written to `@timestamp` when `d` cannot be parsed.
pub const INVALID_TIMESTAMP: &str = "Invalid Date";

/// Normalize a source-local date string into `YYYY-MM-DDTHH:mm:ss.SSSZ`.
///
/// ```
/// use saih_duero_api::timestamp::normalize;
///
/// assert_eq!(normalize("20/11/2025 00:00").unwrap(), "2025-11-19T23:00:00.000Z");
/// assert_eq!(normalize("15/07/2025 12:30").unwrap(), "2025-07-15T10:30:00.000Z");
/// ```
pub fn normalize(date_text: &str) -> Result<String, FetchError> {
    normalize_in(date_text, SOURCE_TIMEZONE)
}

/// Same as [`normalize`] but for an arbitrary IANA zone.
pub fn normalize_in(date_text: &str, tz: Tz) -> Result<String, FetchError> {
    let naive = NaiveDateTime::parse_from_str(date_text.trim(), SOURCE_FORMAT)
        .map_err(|e| FetchError::DateTimeError(format!("{date_text:?}: {e}")))?;

    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        // Fall-back hour occurs twice; take the first occurrence.
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Spring-forward gap: the wall clock jumps, so move past it.
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .ok_or_else(|| {
                FetchError::DateTimeError(format!("{date_text:?} does not exist in {tz}"))
            })?,
    };

    Ok(local
        .with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string())
}
