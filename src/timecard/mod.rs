//! Timecard entry/state engine.
//!
//! [`clock`] turns raw 12-hour readings into worked minutes, [`card::Timecard`]
//! manages the week's day-entries and the draft -> submitted -> approved
//! lifecycle. Nothing in here touches the database or HTTP.

pub mod card;
pub mod clock;
pub mod entry;
pub mod error;
pub mod week;

pub use card::{ApprovalAuthority, Signature, Timecard, TimecardStatus};
pub use clock::{Meridiem, minutes_since_midnight, total_minutes};
pub use entry::{DayEntry, EntryPatch, ShiftTimes};
pub use error::{Action, TimecardError, TimecardResult};
pub use week::{WeekDay, WeekRange};
