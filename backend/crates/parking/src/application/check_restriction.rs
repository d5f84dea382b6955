//! Check Restriction Use Case
//!
//! Stand-alone pico y placa lookup for a plate, without touching storage.

use chrono::{DateTime, Utc};

use crate::domain::restriction::{RestrictionCalendar, RestrictionVerdict};
use crate::domain::value_objects::Plate;
use crate::error::ParkingResult;

/// Check Restriction Use Case
pub struct CheckRestrictionUseCase {
    calendar: RestrictionCalendar,
}

impl CheckRestrictionUseCase {
    pub fn new(calendar: RestrictionCalendar) -> Self {
        Self { calendar }
    }

    /// Evaluate a national-format plate at `at`, or now
    pub fn execute(&self, plate: &str, at: Option<DateTime<Utc>>) -> ParkingResult<RestrictionVerdict> {
        let plate = Plate::parse_national(plate)?;
        let at = at.unwrap_or_else(Utc::now);
        let verdict = self.calendar.evaluate(plate.as_str(), at);

        tracing::debug!(
            plate = %plate,
            has_restriction = verdict.has_restriction,
            "Restriction checked"
        );

        Ok(verdict)
    }
}
