//! Timezone list for the client's date settings

use axum::Json;
use chrono::{Offset, TimeZone, Utc};
use chrono_tz::TZ_VARIANTS;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimezoneEntry {
    pub id: &'static str,
    /// Current offset, e.g. "(UTC+02:00) Europe/Madrid"
    pub display_name: String,
}

/// IANA zones ordered by current offset, then name. `Etc/*` aliases are
/// left out.
pub async fn list_timezones() -> Json<Vec<TimezoneEntry>> {
    Json(timezone_entries())
}

fn timezone_entries() -> Vec<TimezoneEntry> {
    let now = Utc::now();
    let mut zones: Vec<(i32, TimezoneEntry)> = TZ_VARIANTS
        .iter()
        .filter(|tz| !tz.name().starts_with("Etc/"))
        .map(|tz| {
            let secs = tz.offset_from_utc_datetime(&now.naive_utc()).fix().local_minus_utc();
            let entry = TimezoneEntry {
                id: tz.name(),
                display_name: format!("(UTC{}) {}", format_offset(secs), tz.name()),
            };
            (secs, entry)
        })
        .collect();

    zones.sort_by(|(a_secs, a), (b_secs, b)| a_secs.cmp(b_secs).then_with(|| a.id.cmp(b.id)));
    zones.into_iter().map(|(_, entry)| entry).collect()
}

fn format_offset(secs: i32) -> String {
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}
