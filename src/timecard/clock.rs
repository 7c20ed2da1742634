use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::timecard::entry::ShiftTimes;

/// AM/PM qualifier of a 12-hour clock reading
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
pub enum Meridiem {
    #[default]
    AM,
    PM,
}

/// Converts an `"H:MM"` / `"HH:MM"` reading into minutes since midnight.
///
/// Returns `None` for anything that is not a valid 12-hour reading: empty input,
/// a missing or extra `:`, non-numeric parts, hour outside 1..=12 or minute
/// outside 0..=59. 12 AM is midnight and 12 PM is noon.
pub fn minutes_since_midnight(clock: &str, meridiem: Meridiem) -> Option<u32> {
    let (hh, mm) = clock.split_once(':')?;
    let hh = hh.trim();
    let mm = mm.trim();

    if hh.is_empty() || mm.is_empty() || hh.len() > 2 || mm.len() > 2 {
        return None;
    }
    if !hh.bytes().all(|b| b.is_ascii_digit()) || !mm.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hour: u32 = hh.parse().ok()?;
    let minute: u32 = mm.parse().ok()?;

    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }

    let hour = match (hour, meridiem) {
        (12, Meridiem::AM) => 0,
        (12, Meridiem::PM) => 12,
        (h, Meridiem::PM) => h + 12,
        (h, Meridiem::AM) => h,
    };

    Some(hour * 60 + minute)
}

/// Worked minutes for one day: `(breakOut - start) + (end - breakIn)`.
///
/// Any unreadable time makes the whole day worth 0 minutes, and so does a
/// negative span. Entries are same-day only; an overnight shift counts as 0.
pub fn total_minutes(times: &ShiftTimes) -> u32 {
    let readings = (
        minutes_since_midnight(&times.start, times.start_time),
        minutes_since_midnight(&times.break_out, times.break_out_time),
        minutes_since_midnight(&times.break_in, times.break_in_time),
        minutes_since_midnight(&times.end, times.end_time),
    );

    let (Some(start), Some(break_out), Some(break_in), Some(end)) = readings else {
        return 0;
    };

    if break_out < start || end < break_in {
        return 0;
    }

    (break_out - start) + (end - break_in)
}
