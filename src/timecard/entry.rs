use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::timecard::clock::{Meridiem, total_minutes};
use crate::timecard::week::WeekDay;

fn pm() -> Meridiem {
    Meridiem::PM
}

/// Raw clock readings of one working day. Also the shape of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTimes {
    #[serde(default)]
    #[schema(example = "7:00")]
    pub start: String,
    #[serde(default)]
    pub start_time: Meridiem,

    #[serde(default)]
    #[schema(example = "9:00")]
    pub break_out: String,
    #[serde(default)]
    pub break_out_time: Meridiem,

    #[serde(default)]
    #[schema(example = "9:15")]
    pub break_in: String,
    #[serde(default)]
    pub break_in_time: Meridiem,

    #[serde(default)]
    #[schema(example = "3:30")]
    pub end: String,
    #[serde(default = "pm")]
    pub end_time: Meridiem,
}

impl Default for ShiftTimes {
    fn default() -> Self {
        Self {
            start: String::new(),
            start_time: Meridiem::AM,
            break_out: String::new(),
            break_out_time: Meridiem::AM,
            break_in: String::new(),
            break_in_time: Meridiem::AM,
            end: String::new(),
            end_time: Meridiem::PM,
        }
    }
}

impl ShiftTimes {
    /// No clock reading at all, only meridiem defaults
    pub fn is_blank(&self) -> bool {
        [&self.start, &self.break_out, &self.break_in, &self.end]
            .iter()
            .all(|v| v.trim().is_empty())
    }
}

/// Partial update of [`ShiftTimes`]. Only these eight fields can be patched;
/// any other key in the incoming JSON is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    pub start: Option<String>,
    pub start_time: Option<Meridiem>,
    pub break_out: Option<String>,
    pub break_out_time: Option<Meridiem>,
    pub break_in: Option<String>,
    pub break_in_time: Option<Meridiem>,
    pub end: Option<String>,
    pub end_time: Option<Meridiem>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.start_time.is_none()
            && self.break_out.is_none()
            && self.break_out_time.is_none()
            && self.break_in.is_none()
            && self.break_in_time.is_none()
            && self.end.is_none()
            && self.end_time.is_none()
    }

    fn overlay(&self, times: &mut ShiftTimes) {
        if let Some(v) = &self.start {
            times.start = v.clone();
        }
        if let Some(v) = self.start_time {
            times.start_time = v;
        }
        if let Some(v) = &self.break_out {
            times.break_out = v.clone();
        }
        if let Some(v) = self.break_out_time {
            times.break_out_time = v;
        }
        if let Some(v) = &self.break_in {
            times.break_in = v.clone();
        }
        if let Some(v) = self.break_in_time {
            times.break_in_time = v;
        }
        if let Some(v) = &self.end {
            times.end = v.clone();
        }
        if let Some(v) = self.end_time {
            times.end_time = v;
        }
    }
}

/// Shape an entry is read back in. The stored total is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDayEntry {
    day: WeekDay,
    date: NaiveDate,
    #[serde(flatten)]
    times: ShiftTimes,
}

impl From<StoredDayEntry> for DayEntry {
    fn from(stored: StoredDayEntry) -> Self {
        DayEntry::new(stored.day, stored.date, stored.times)
    }
}

/// One weekday's recorded times plus the derived worked minutes.
///
/// `total_minutes` has no setter: it is recomputed whenever the times change,
/// and again whenever an entry is deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredDayEntry")]
pub struct DayEntry {
    day: WeekDay,
    date: NaiveDate,
    #[serde(flatten)]
    times: ShiftTimes,
    total_minutes: u32,
}

impl DayEntry {
    pub fn new(day: WeekDay, date: NaiveDate, times: ShiftTimes) -> Self {
        let total_minutes = total_minutes(&times);
        Self {
            day,
            date,
            times,
            total_minutes,
        }
    }

    pub fn day(&self) -> WeekDay {
        self.day
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn times(&self) -> &ShiftTimes {
        &self.times
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_minutes
    }

    /// Applies the fields present in `patch` and recomputes the total.
    /// `day` and `date` never change.
    pub fn apply_patch(&mut self, patch: &EntryPatch) {
        patch.overlay(&mut self.times);
        self.total_minutes = total_minutes(&self.times);
    }
}
