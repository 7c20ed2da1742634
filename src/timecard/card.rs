use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::role::Role;
use crate::timecard::entry::{DayEntry, EntryPatch, ShiftTimes};
use crate::timecard::error::{Action, TimecardError, TimecardResult};
use crate::timecard::week::{WeekDay, WeekRange};

/// Forward-only lifecycle: draft -> submitted -> approved
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimecardStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
}

/// Proof of submission captured from the worker's signature pad
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub image_data_url: String,
    pub signed_at: DateTime<Utc>,
}

/// Capability to approve timecards. Only a foreman can obtain one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalAuthority {
    approver_id: u64,
}

impl ApprovalAuthority {
    pub fn for_role(role: Role, user_id: u64) -> Option<Self> {
        match role {
            Role::Foreman => Some(Self {
                approver_id: user_id,
            }),
            Role::Journeyman | Role::Apprentice => None,
        }
    }

    pub fn approver_id(&self) -> u64 {
        self.approver_id
    }
}

/// One worker's week at one job site.
///
/// Entries are addressed by weekday only, kept sorted Mon..Sun, and can only
/// change while the card is a draft. Every command builds the complete new
/// entry list first and swaps it in on success, so a rejected command leaves
/// the card as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timecard {
    pub(crate) id: u64,
    pub(crate) user_id: u64,
    pub(crate) job_site_id: u64,
    pub(crate) week_start: NaiveDate,
    pub(crate) week_end: NaiveDate,
    pub(crate) entries: Vec<DayEntry>,
    pub(crate) status: TimecardStatus,
    pub(crate) signature: Option<Signature>,
    pub(crate) approved_by: Option<u64>,
}

fn require_days(days: &BTreeSet<WeekDay>) -> TimecardResult<()> {
    if days.is_empty() {
        return Err(TimecardError::Validation("Select days".to_string()));
    }
    Ok(())
}

impl Timecard {
    /// A fresh, empty draft for `week`.
    pub fn draft(id: u64, user_id: u64, job_site_id: u64, week: WeekRange) -> Self {
        Self {
            id,
            user_id,
            job_site_id,
            week_start: week.start,
            week_end: week.end,
            entries: Vec::new(),
            status: TimecardStatus::Draft,
            signature: None,
            approved_by: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn job_site_id(&self) -> u64 {
        self.job_site_id
    }

    pub fn week(&self) -> WeekRange {
        WeekRange {
            start: self.week_start,
            end: self.week_end,
        }
    }

    pub fn entries(&self) -> &[DayEntry] {
        &self.entries
    }

    pub fn status(&self) -> TimecardStatus {
        self.status
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn approved_by(&self) -> Option<u64> {
        self.approved_by
    }

    /// Worked minutes over the whole week
    pub fn total_minutes(&self) -> u32 {
        self.entries.iter().map(DayEntry::total_minutes).sum()
    }

    pub fn ensure_owner(&self, user_id: u64) -> TimecardResult<()> {
        if self.user_id != user_id {
            return Err(TimecardError::Forbidden("Forbidden".to_string()));
        }
        Ok(())
    }

    /// Owners read their own cards; a foreman reads everyone's.
    pub fn visible_to(&self, user_id: u64, role: Role) -> bool {
        self.user_id == user_id || role == Role::Foreman
    }

    fn ensure_status(&self, expected: TimecardStatus, action: Action) -> TimecardResult<()> {
        if self.status != expected {
            return Err(TimecardError::IllegalTransition {
                status: self.status,
                action,
            });
        }
        Ok(())
    }

    fn replace_entries(&mut self, mut next: Vec<DayEntry>) {
        next.sort_by_key(DayEntry::day);
        self.entries = next;
    }

    /// Overwrites the selected days with fresh entries built from `template`.
    /// Existing data on those days is discarded entirely.
    pub fn apply_template(
        &mut self,
        days: &BTreeSet<WeekDay>,
        template: &ShiftTimes,
    ) -> TimecardResult<&[DayEntry]> {
        self.ensure_status(TimecardStatus::Draft, Action::Edit)?;
        require_days(days)?;
        if template.is_blank() {
            return Err(TimecardError::Validation("Missing template".to_string()));
        }

        let week = self.week();
        let mut next: Vec<DayEntry> = self
            .entries
            .iter()
            .filter(|e| !days.contains(&e.day()))
            .cloned()
            .collect();
        next.extend(
            days.iter()
                .map(|&day| DayEntry::new(day, week.date_of(day), template.clone())),
        );

        self.replace_entries(next);
        Ok(&self.entries)
    }

    /// Merges `patch` into each selected day that already has an entry.
    /// Selected days without an entry are skipped.
    pub fn edit_days(
        &mut self,
        days: &BTreeSet<WeekDay>,
        patch: &EntryPatch,
    ) -> TimecardResult<&[DayEntry]> {
        self.ensure_status(TimecardStatus::Draft, Action::Edit)?;
        require_days(days)?;
        if patch.is_empty() {
            return Err(TimecardError::Validation("Missing patch".to_string()));
        }

        let mut next = self.entries.clone();
        for entry in next.iter_mut().filter(|e| days.contains(&e.day())) {
            entry.apply_patch(patch);
        }

        self.replace_entries(next);
        Ok(&self.entries)
    }

    /// Drops the selected days. Days without an entry are ignored.
    pub fn remove_days(&mut self, days: &BTreeSet<WeekDay>) -> TimecardResult<&[DayEntry]> {
        self.ensure_status(TimecardStatus::Draft, Action::Edit)?;
        require_days(days)?;

        let next: Vec<DayEntry> = self
            .entries
            .iter()
            .filter(|e| !days.contains(&e.day()))
            .cloned()
            .collect();

        self.replace_entries(next);
        Ok(&self.entries)
    }

    /// draft -> submitted. A non-empty signature payload is attached with `now`
    /// as its capture time.
    pub fn submit(&mut self, signature: Option<String>, now: DateTime<Utc>) -> TimecardResult<&Self> {
        self.ensure_status(TimecardStatus::Draft, Action::Submit)?;

        if let Some(image_data_url) = signature.filter(|s| !s.is_empty()) {
            self.signature = Some(Signature {
                image_data_url,
                signed_at: now,
            });
        }
        self.status = TimecardStatus::Submitted;
        Ok(self)
    }

    /// submitted -> approved
    pub fn approve(&mut self, authority: &ApprovalAuthority) -> TimecardResult<&Self> {
        self.ensure_status(TimecardStatus::Submitted, Action::Approve)?;

        self.status = TimecardStatus::Approved;
        self.approved_by = Some(authority.approver_id());
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timecard::clock::Meridiem;

    fn week() -> WeekRange {
        WeekRange::containing(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap())
    }

    fn days(list: &[WeekDay]) -> BTreeSet<WeekDay> {
        list.iter().copied().collect()
    }

    fn template() -> ShiftTimes {
        ShiftTimes {
            start: "7:00".into(),
            start_time: Meridiem::AM,
            break_out: "9:00".into(),
            break_out_time: Meridiem::AM,
            break_in: "9:15".into(),
            break_in_time: Meridiem::AM,
            end: "3:30".into(),
            end_time: Meridiem::PM,
        }
    }

    fn foreman() -> ApprovalAuthority {
        ApprovalAuthority::for_role(Role::Foreman, 99).unwrap()
    }

    #[test]
    fn template_on_two_days() {
        let mut card = Timecard::draft(1, 7, 3, week());
        let entries = card
            .apply_template(&days(&[WeekDay::Tue, WeekDay::Mon]), &template())
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].day(), WeekDay::Mon);
        assert_eq!(entries[0].date(), NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(entries[1].date(), NaiveDate::from_ymd_opt(2025, 1, 7).unwrap());
        assert!(entries.iter().all(|e| e.total_minutes() == 495));
        assert_eq!(card.total_minutes(), 990);
    }

    #[test]
    fn template_replaces_existing_day_entirely() {
        let mut card = Timecard::draft(1, 7, 3, week());
        card.apply_template(&days(&[WeekDay::Mon]), &template()).unwrap();

        let half_day = ShiftTimes {
            start: "8:00".into(),
            break_out: "10:00".into(),
            ..ShiftTimes::default()
        };
        card.apply_template(&days(&[WeekDay::Mon]), &half_day).unwrap();

        let mon = &card.entries()[0];
        assert_eq!(mon.times(), &half_day);
        assert_eq!(mon.total_minutes(), 0);
        assert_eq!(card.entries().len(), 1);
    }

    #[test]
    fn edit_only_touches_selected_days() {
        let mut card = Timecard::draft(1, 7, 3, week());
        card.apply_template(&days(&[WeekDay::Mon, WeekDay::Tue]), &template())
            .unwrap();

        let patch = EntryPatch {
            end: Some("12:00".into()),
            end_time: Some(Meridiem::PM),
            ..Default::default()
        };
        let entries = card.edit_days(&days(&[WeekDay::Mon]), &patch).unwrap();

        assert_eq!(entries[0].total_minutes(), 285);
        assert_eq!(entries[1].total_minutes(), 495);
    }

    #[test]
    fn edit_skips_days_without_entries() {
        let mut card = Timecard::draft(1, 7, 3, week());
        card.apply_template(&days(&[WeekDay::Mon]), &template()).unwrap();

        let patch = EntryPatch {
            start: Some("6:00".into()),
            ..Default::default()
        };
        let entries = card
            .edit_days(&days(&[WeekDay::Fri, WeekDay::Sat]), &patch)
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].times().start, "7:00");
    }

    #[test]
    fn blank_template_is_rejected() {
        let mut card = Timecard::draft(1, 7, 3, week());
        let err = card
            .apply_template(&days(&[WeekDay::Mon]), &ShiftTimes::default())
            .unwrap_err();
        assert_eq!(err, TimecardError::Validation("Missing template".into()));
        assert!(card.entries().is_empty());
    }

    #[test]
    fn edit_rejects_empty_patch() {
        let mut card = Timecard::draft(1, 7, 3, week());
        card.apply_template(&days(&[WeekDay::Mon]), &template()).unwrap();

        let err = card
            .edit_days(&days(&[WeekDay::Mon]), &EntryPatch::default())
            .unwrap_err();
        assert!(matches!(err, TimecardError::Validation(_)));
    }

    #[test]
    fn empty_day_set_is_a_validation_error() {
        let mut card = Timecard::draft(1, 7, 3, week());
        let none = BTreeSet::new();

        for err in [
            card.apply_template(&none, &template()).unwrap_err(),
            card.remove_days(&none).unwrap_err(),
            card.edit_days(
                &none,
                &EntryPatch {
                    end: Some("4:00".into()),
                    ..Default::default()
                },
            )
            .unwrap_err(),
        ] {
            assert_eq!(err, TimecardError::Validation("Select days".into()));
        }
    }

    #[test]
    fn remove_is_idempotent() {
        let mut card = Timecard::draft(1, 7, 3, week());
        card.apply_template(&days(&[WeekDay::Mon, WeekDay::Wed, WeekDay::Fri]), &template())
            .unwrap();

        let once = card.remove_days(&days(&[WeekDay::Wed])).unwrap().to_vec();
        let twice = card.remove_days(&days(&[WeekDay::Wed])).unwrap().to_vec();

        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn submit_attaches_signature() {
        let mut card = Timecard::draft(1, 7, 3, week());
        let now = Utc::now();
        card.submit(Some("data:image/png;base64,AAAA".into()), now)
            .unwrap();

        assert_eq!(card.status(), TimecardStatus::Submitted);
        let sig = card.signature().unwrap();
        assert_eq!(sig.signed_at, now);
        assert_eq!(sig.image_data_url, "data:image/png;base64,AAAA");
    }

    #[test]
    fn submit_without_signature() {
        let mut card = Timecard::draft(1, 7, 3, week());
        card.submit(Some(String::new()), Utc::now()).unwrap();
        assert!(card.signature().is_none());
        assert_eq!(card.status(), TimecardStatus::Submitted);
    }

    #[test]
    fn submit_does_not_touch_entries() {
        let mut card = Timecard::draft(1, 7, 3, week());
        card.apply_template(&days(&[WeekDay::Thu]), &template()).unwrap();
        let before = card.entries().to_vec();
        card.submit(None, Utc::now()).unwrap();
        assert_eq!(card.entries(), before.as_slice());
    }

    #[test]
    fn locked_after_submit() {
        let mut card = Timecard::draft(1, 7, 3, week());
        card.apply_template(&days(&[WeekDay::Mon]), &template()).unwrap();
        card.submit(None, Utc::now()).unwrap();
        let snapshot = card.clone();

        let mon = days(&[WeekDay::Mon]);
        let patch = EntryPatch {
            end: Some("1:00".into()),
            ..Default::default()
        };
        for err in [
            card.apply_template(&mon, &template()).unwrap_err(),
            card.edit_days(&mon, &patch).unwrap_err(),
            card.remove_days(&mon).unwrap_err(),
        ] {
            assert!(matches!(
                err,
                TimecardError::IllegalTransition {
                    status: TimecardStatus::Submitted,
                    action: Action::Edit
                }
            ));
        }
        assert_eq!(card, snapshot);
    }

    #[test]
    fn lifecycle_guards() {
        let mut card = Timecard::draft(1, 7, 3, week());

        let err = card.approve(&foreman()).unwrap_err();
        assert!(matches!(
            err,
            TimecardError::IllegalTransition {
                status: TimecardStatus::Draft,
                action: Action::Approve
            }
        ));

        card.submit(None, Utc::now()).unwrap();
        assert!(card.submit(None, Utc::now()).is_err());

        card.approve(&foreman()).unwrap();
        assert_eq!(card.status(), TimecardStatus::Approved);
        assert_eq!(card.approved_by(), Some(99));

        assert!(card.approve(&foreman()).is_err());
        assert!(card.submit(None, Utc::now()).is_err());
        assert!(card.remove_days(&days(&[WeekDay::Mon])).is_err());
    }

    #[test]
    fn only_a_foreman_gets_approval_authority() {
        assert!(ApprovalAuthority::for_role(Role::Foreman, 1).is_some());
        assert!(ApprovalAuthority::for_role(Role::Journeyman, 1).is_none());
        assert!(ApprovalAuthority::for_role(Role::Apprentice, 1).is_none());
    }

    #[test]
    fn ownership_and_visibility() {
        let card = Timecard::draft(1, 7, 3, week());
        assert!(card.ensure_owner(7).is_ok());
        assert!(matches!(card.ensure_owner(8), Err(TimecardError::Forbidden(_))));

        assert!(card.visible_to(7, Role::Apprentice));
        assert!(card.visible_to(8, Role::Foreman));
        assert!(!card.visible_to(8, Role::Journeyman));
    }

    #[test]
    fn status_labels() {
        assert_eq!(TimecardStatus::Submitted.to_string(), "submitted");
        assert_eq!("approved".parse::<TimecardStatus>().unwrap(), TimecardStatus::Approved);
        assert_eq!(serde_json::to_value(TimecardStatus::Draft).unwrap(), "draft");
    }
}
