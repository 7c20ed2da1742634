use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::types::Json;
use utoipa::ToSchema;

use crate::timecard::{DayEntry, Signature, Timecard, TimecardStatus};

/// `timecards` row joined with its job site and owner
#[derive(Debug, sqlx::FromRow)]
pub struct TimecardRow {
    pub id: u64,
    pub user_id: u64,
    pub job_site_id: u64,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub entries: Json<Vec<DayEntry>>,
    pub status: String,
    pub signature_image: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub approved_by: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub job_name: String,
    pub job_number: String,
    pub worker_name: String,
    pub worker_role: String,
}

/// Columns that travel with a timecard but are not part of its state
#[derive(Debug, Clone)]
pub struct TimecardMeta {
    pub job_name: String,
    pub job_number: String,
    pub worker_name: String,
    pub worker_role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimecardRow {
    pub fn into_parts(self) -> Result<(Timecard, TimecardMeta), strum::ParseError> {
        let status: TimecardStatus = self.status.parse()?;

        let signature = match (self.signature_image, self.signed_at) {
            (Some(image_data_url), Some(signed_at)) if !image_data_url.is_empty() => Some(Signature {
                image_data_url,
                signed_at,
            }),
            _ => None,
        };

        let mut entries = self.entries.0;
        entries.sort_by_key(DayEntry::day);

        let timecard = Timecard {
            id: self.id,
            user_id: self.user_id,
            job_site_id: self.job_site_id,
            week_start: self.week_start,
            week_end: self.week_end,
            entries,
            status,
            signature,
            approved_by: self.approved_by,
        };

        let meta = TimecardMeta {
            job_name: self.job_name,
            job_number: self.job_number,
            worker_name: self.worker_name,
            worker_role: self.worker_role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };

        Ok((timecard, meta))
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobSiteRef {
    #[schema(example = 4)]
    pub id: u64,
    #[schema(example = "Riverside Clinic")]
    pub job_name: String,
    #[schema(example = "J-2291")]
    pub job_number: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRef {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Dana Ruiz")]
    pub name: String,
    #[schema(example = "journeyman")]
    pub role: String,
}

/// Timecard as returned by the API
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 12,
    "jobSite": { "id": 4, "jobName": "Riverside Clinic", "jobNumber": "J-2291" },
    "worker": { "id": 7, "name": "Dana Ruiz", "role": "journeyman" },
    "weekStart": "2026-01-05",
    "weekEnd": "2026-01-11",
    "entries": [{
        "day": "Mon", "date": "2026-01-05",
        "start": "7:00", "startTime": "AM",
        "breakOut": "9:00", "breakOutTime": "AM",
        "breakIn": "9:15", "breakInTime": "AM",
        "end": "3:30", "endTime": "PM",
        "totalMinutes": 495
    }],
    "status": "draft",
    "signature": null,
    "approvedBy": null,
    "totalMinutes": 495,
    "createdAt": "2026-01-05T14:03:00Z",
    "updatedAt": "2026-01-05T14:10:00Z"
}))]
pub struct TimecardView {
    pub id: u64,
    pub job_site: JobSiteRef,
    pub worker: WorkerRef,
    #[schema(format = "date", value_type = String)]
    pub week_start: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub week_end: NaiveDate,
    #[schema(value_type = Vec<Object>)]
    pub entries: Vec<DayEntry>,
    pub status: TimecardStatus,
    #[schema(value_type = Option<Object>)]
    pub signature: Option<Signature>,
    pub approved_by: Option<u64>,
    pub total_minutes: u32,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl TimecardView {
    pub fn new(timecard: &Timecard, meta: &TimecardMeta) -> Self {
        Self {
            id: timecard.id(),
            job_site: JobSiteRef {
                id: timecard.job_site_id(),
                job_name: meta.job_name.clone(),
                job_number: meta.job_number.clone(),
            },
            worker: WorkerRef {
                id: timecard.user_id(),
                name: meta.worker_name.clone(),
                role: meta.worker_role.clone(),
            },
            week_start: timecard.week().start,
            week_end: timecard.week().end,
            entries: timecard.entries().to_vec(),
            status: timecard.status(),
            signature: timecard.signature().cloned(),
            approved_by: timecard.approved_by(),
            total_minutes: timecard.total_minutes(),
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timecard::{Meridiem, ShiftTimes, WeekDay};

    fn row(status: &str, entries: Vec<DayEntry>) -> TimecardRow {
        let now = Utc::now();
        TimecardRow {
            id: 12,
            user_id: 7,
            job_site_id: 4,
            week_start: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            week_end: NaiveDate::from_ymd_opt(2026, 1, 11).unwrap(),
            entries: Json(entries),
            status: status.to_string(),
            signature_image: Some(String::new()),
            signed_at: None,
            approved_by: None,
            created_at: now,
            updated_at: now,
            job_name: "Riverside Clinic".into(),
            job_number: "J-2291".into(),
            worker_name: "Dana Ruiz".into(),
            worker_role: "journeyman".into(),
        }
    }

    fn entry(day: WeekDay) -> DayEntry {
        let times = ShiftTimes {
            start: "6:30".into(),
            break_out: "10:00".into(),
            break_in: "10:30".into(),
            end: "2:00".into(),
            end_time: Meridiem::PM,
            ..ShiftTimes::default()
        };
        let week_start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        DayEntry::new(day, week_start + chrono::Days::new(day.offset()), times)
    }

    #[test]
    fn row_becomes_a_sorted_timecard() {
        let (card, meta) = row("submitted", vec![entry(WeekDay::Fri), entry(WeekDay::Mon)])
            .into_parts()
            .unwrap();

        assert_eq!(card.status(), TimecardStatus::Submitted);
        assert_eq!(card.entries()[0].day(), WeekDay::Mon);
        assert!(card.signature().is_none());
        assert_eq!(meta.job_number, "J-2291");
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(row("archived", Vec::new()).into_parts().is_err());
    }

    #[test]
    fn view_reports_weekly_total() {
        let (card, meta) = row("draft", vec![entry(WeekDay::Mon), entry(WeekDay::Tue)])
            .into_parts()
            .unwrap();
        let view = serde_json::to_value(TimecardView::new(&card, &meta)).unwrap();

        assert_eq!(view["totalMinutes"], 2 * (210 + 210));
        assert_eq!(view["jobSite"]["jobName"], "Riverside Clinic");
        assert_eq!(view["worker"]["role"], "journeyman");
        assert_eq!(view["weekStart"], "2026-01-05");
        assert_eq!(view["entries"][1]["day"], "Tue");
        assert!(view["signature"].is_null());
    }
}
