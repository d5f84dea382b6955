//! Pico y placa restriction calendar
//!
//! Pure evaluation of the weekday/plate-digit rotation. The verdict depends
//! only on the plate, the instant and the calendar's local offset, so the
//! same inputs always produce the same answer.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc, Weekday};
use serde::{Serialize, Serializer};

use crate::domain::value_objects::last_digit_of;

/// Restricted last digits per weekday, Monday first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestrictionSchedule {
    by_weekday: [&'static [u8]; 7],
}

impl RestrictionSchedule {
    /// Mon {1,2}, Tue {3,4}, Wed {5,6}, Thu {7,8}, Fri {9,0}, weekend free
    pub const STANDARD: RestrictionSchedule = RestrictionSchedule {
        by_weekday: [&[1, 2], &[3, 4], &[5, 6], &[7, 8], &[9, 0], &[], &[]],
    };

    pub const fn new(by_weekday: [&'static [u8]; 7]) -> Self {
        Self { by_weekday }
    }

    pub fn digits_for(&self, weekday: Weekday) -> &'static [u8] {
        self.by_weekday[weekday.num_days_from_monday() as usize]
    }
}

impl Default for RestrictionSchedule {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Local hours `[start, end)` during which the schedule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourWindow {
    start: u32,
    end: u32,
}

impl HourWindow {
    pub const STANDARD: HourWindow = HourWindow { start: 6, end: 20 };

    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start < end && end <= 24).then_some(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, hour: u32) -> bool {
        (self.start..self.end).contains(&hour)
    }
}

impl Default for HourWindow {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionVerdict {
    pub has_restriction: bool,
    pub message: String,
    pub plate: String,
    pub last_digit: u8,
    #[serde(serialize_with = "serialize_weekday")]
    pub weekday: Weekday,
    pub hour: u32,
    pub within_window: bool,
    pub restricted_digits: Vec<u8>,
    pub evaluated_at: DateTime<Utc>,
}

fn serialize_weekday<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(weekday_name(*weekday))
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn join_digits(digits: &[u8]) -> String {
    digits
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Restriction calendar evaluated in a fixed local offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestrictionCalendar {
    schedule: RestrictionSchedule,
    window: HourWindow,
    offset: FixedOffset,
}

impl RestrictionCalendar {
    pub fn new(schedule: RestrictionSchedule, window: HourWindow, offset: FixedOffset) -> Self {
        Self {
            schedule,
            window,
            offset,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn window(&self) -> HourWindow {
        self.window
    }

    /// Evaluate `plate` at instant `at`
    ///
    /// The plate is only trimmed and upper-cased here; format validation is
    /// the caller's job.
    pub fn evaluate(&self, plate: &str, at: DateTime<Utc>) -> RestrictionVerdict {
        let plate = plate.trim().to_ascii_uppercase();
        let local = at.with_timezone(&self.offset);
        let weekday = local.weekday();
        let hour = local.hour();
        let last_digit = last_digit_of(&plate);
        let digits = self.schedule.digits_for(weekday);
        let within_window = self.window.contains(hour);
        let has_restriction = within_window && digits.contains(&last_digit);

        let day = weekday_name(weekday);
        let (start, end) = (self.window.start, self.window.end);
        let message = if has_restriction {
            format!(
                "Plate {plate} is restricted on {day} between {start}:00 and {end}:00 (digits {})",
                join_digits(digits)
            )
        } else if digits.is_empty() {
            format!("Plate {plate} has no restriction: there is no pico y placa on {day}")
        } else if !within_window {
            format!(
                "Plate {plate} has no restriction at this hour: restrictions apply from {start}:00 to {end}:00"
            )
        } else {
            format!(
                "Plate {plate} has no restriction on {day}: restricted digits today are {}",
                join_digits(digits)
            )
        };

        if has_restriction {
            tracing::warn!(
                plate = %plate,
                weekday = day,
                hour,
                last_digit,
                "Pico y placa restriction detected"
            );
        }

        RestrictionVerdict {
            has_restriction,
            message,
            plate,
            last_digit,
            weekday,
            hour,
            within_window,
            restricted_digits: digits.to_vec(),
            evaluated_at: at,
        }
    }

    pub fn can_enter(&self, plate: &str, at: DateTime<Utc>) -> bool {
        !self.evaluate(plate, at).has_restriction
    }
}

impl Default for RestrictionCalendar {
    fn default() -> Self {
        Self::new(
            RestrictionSchedule::STANDARD,
            HourWindow::STANDARD,
            Utc.fix(),
        )
    }
}
