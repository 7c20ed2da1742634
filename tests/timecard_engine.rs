use std::collections::BTreeSet;

use chrono::{NaiveDate, TimeZone, Utc};
use crew_timecards::model::role::Role;
use crew_timecards::timecard::{
    Action, ApprovalAuthority, EntryPatch, Meridiem, ShiftTimes, Timecard, TimecardError,
    TimecardStatus, WeekDay, WeekRange,
};

fn week() -> WeekRange {
    // Wednesday; the week runs Mon 2025-03-10 .. Sun 2025-03-16
    WeekRange::containing(NaiveDate::from_ymd_opt(2025, 3, 12).unwrap())
}

fn days(list: &[WeekDay]) -> BTreeSet<WeekDay> {
    list.iter().copied().collect()
}

fn standard_shift() -> ShiftTimes {
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
    ApprovalAuthority::for_role(Role::Foreman, 1).unwrap()
}

#[test]
fn a_full_week_from_draft_to_approval() {
    let mut card = Timecard::draft(10, 7, 4, week());

    let entries = card
        .apply_template(
            &days(&[WeekDay::Mon, WeekDay::Tue, WeekDay::Wed, WeekDay::Thu, WeekDay::Fri]),
            &standard_shift(),
        )
        .unwrap();
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|e| e.total_minutes() == 495));
    assert_eq!(entries[0].date(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    assert_eq!(entries[4].date(), NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());

    // Friday ends at noon: 120 + 165
    let half_day = EntryPatch {
        end: Some("12:00".into()),
        ..Default::default()
    };
    card.edit_days(&days(&[WeekDay::Fri]), &half_day).unwrap();
    assert_eq!(card.entries()[4].total_minutes(), 285);
    assert_eq!(card.total_minutes(), 4 * 495 + 285);

    let signed_at = Utc.with_ymd_and_hms(2025, 3, 14, 16, 0, 0).unwrap();
    card.submit(Some("data:image/png;base64,AAAA".into()), signed_at)
        .unwrap();
    assert_eq!(card.status(), TimecardStatus::Submitted);
    assert_eq!(card.signature().map(|s| s.signed_at), Some(signed_at));

    card.approve(&foreman()).unwrap();
    assert_eq!(card.status(), TimecardStatus::Approved);
    assert_eq!(card.approved_by(), Some(1));
}

#[test]
fn template_then_remove_leaves_only_untouched_days() {
    let mut card = Timecard::draft(1, 7, 4, week());
    card.apply_template(&days(&[WeekDay::Wed, WeekDay::Mon]), &standard_shift())
        .unwrap();
    card.remove_days(&days(&[WeekDay::Mon])).unwrap();

    let left: Vec<WeekDay> = card.entries().iter().map(|e| e.day()).collect();
    assert_eq!(left, vec![WeekDay::Wed]);

    // removing an absent day is a no-op
    let before = card.clone();
    card.remove_days(&days(&[WeekDay::Mon])).unwrap();
    assert_eq!(card, before);
}

#[test]
fn entries_stay_in_weekday_order() {
    let mut card = Timecard::draft(1, 7, 4, week());
    card.apply_template(&days(&[WeekDay::Sun]), &standard_shift())
        .unwrap();
    card.apply_template(&days(&[WeekDay::Thu]), &standard_shift())
        .unwrap();
    card.apply_template(&days(&[WeekDay::Mon]), &standard_shift())
        .unwrap();

    let order: Vec<WeekDay> = card.entries().iter().map(|e| e.day()).collect();
    assert_eq!(order, vec![WeekDay::Mon, WeekDay::Thu, WeekDay::Sun]);
}

#[test]
fn editing_an_empty_day_changes_nothing() {
    let mut card = Timecard::draft(1, 7, 4, week());
    card.apply_template(&days(&[WeekDay::Mon]), &standard_shift())
        .unwrap();
    let before = card.clone();

    let patch = EntryPatch {
        start: Some("6:00".into()),
        ..Default::default()
    };
    card.edit_days(&days(&[WeekDay::Tue]), &patch).unwrap();
    assert_eq!(card, before);
}

#[test]
fn submitted_card_is_locked() {
    let mut card = Timecard::draft(1, 7, 4, week());
    card.apply_template(&days(&[WeekDay::Mon]), &standard_shift())
        .unwrap();
    card.submit(None, Utc::now()).unwrap();
    let before = card.clone();

    let err = card
        .apply_template(&days(&[WeekDay::Tue]), &standard_shift())
        .unwrap_err();
    assert_eq!(
        err,
        TimecardError::IllegalTransition {
            status: TimecardStatus::Submitted,
            action: Action::Edit,
        }
    );
    assert!(card.remove_days(&days(&[WeekDay::Mon])).is_err());
    assert_eq!(card.submit(None, Utc::now()).unwrap_err().to_string(), "Already submitted");
    assert_eq!(card, before);
}

#[test]
fn approval_needs_a_submitted_card_and_a_foreman() {
    let mut card = Timecard::draft(1, 7, 4, week());
    let err = card.approve(&foreman()).unwrap_err();
    assert_eq!(err.to_string(), "Must be submitted (currently draft)");
    assert_eq!(card.status(), TimecardStatus::Draft);

    assert!(ApprovalAuthority::for_role(Role::Journeyman, 7).is_none());
    assert!(ApprovalAuthority::for_role(Role::Apprentice, 7).is_none());
}

#[test]
fn empty_signature_is_not_recorded() {
    let mut card = Timecard::draft(1, 7, 4, week());
    card.submit(Some(String::new()), Utc::now()).unwrap();
    assert_eq!(card.status(), TimecardStatus::Submitted);
    assert!(card.signature().is_none());
}

#[test]
fn unreadable_times_count_as_zero() {
    let mut card = Timecard::draft(1, 7, 4, week());
    let mut shift = standard_shift();
    shift.break_in = "nine".into();
    card.apply_template(&days(&[WeekDay::Mon]), &shift).unwrap();
    assert_eq!(card.entries()[0].total_minutes(), 0);
    assert_eq!(card.total_minutes(), 0);
}
