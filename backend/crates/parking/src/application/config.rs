//! Application Configuration
//!
//! Configuration for the parking application layer.

use chrono::{FixedOffset, Offset, Utc};

use crate::domain::restriction::{HourWindow, RestrictionCalendar, RestrictionSchedule};
use crate::error::{ParkingError, ParkingResult};

/// Parking application configuration
#[derive(Debug, Clone)]
pub struct ParkingConfig {
    /// Local offset used for the restriction calendar and report days
    pub utc_offset: FixedOffset,
    /// Pico y placa hours, `[start, end)` in local time
    pub restriction_window: HourWindow,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            restriction_window: HourWindow::STANDARD,
        }
    }
}

impl ParkingConfig {
    /// Load from `PICO_PLACA_UTC_OFFSET`, `PICO_PLACA_WINDOW_START` and
    /// `PICO_PLACA_WINDOW_END`; unset variables keep their defaults
    pub fn from_env() -> ParkingResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ParkingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let utc_offset = match lookup("PICO_PLACA_UTC_OFFSET") {
            Some(raw) => parse_utc_offset(&raw).ok_or_else(|| {
                ParkingError::validation(format!("invalid PICO_PLACA_UTC_OFFSET {raw:?}"))
            })?,
            None => defaults.utc_offset,
        };

        let hour = |key: &str, default: u32| -> ParkingResult<u32> {
            lookup(key).map_or(Ok(default), |raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| ParkingError::validation(format!("invalid {key} {raw:?}")))
            })
        };
        let start = hour("PICO_PLACA_WINDOW_START", defaults.restriction_window.start())?;
        let end = hour("PICO_PLACA_WINDOW_END", defaults.restriction_window.end())?;
        let restriction_window = HourWindow::new(start, end).ok_or_else(|| {
            ParkingError::validation(format!("invalid pico y placa window {start}..{end}"))
        })?;

        Ok(Self {
            utc_offset,
            restriction_window,
        })
    }

    /// Build the restriction calendar for this configuration
    pub fn calendar(&self) -> RestrictionCalendar {
        RestrictionCalendar::new(
            RestrictionSchedule::STANDARD,
            self.restriction_window,
            self.utc_offset,
        )
    }
}

/// Parse `+HH:MM` / `-HH:MM` (or `Z`) into a fixed offset
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
