//! Traffic Report Use Case
//!
//! Entry and exit counts per local day, day range or calendar month.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone, Utc};
use std::sync::Arc;

use crate::domain::entities::{TimeWindow, TrafficCount};
use crate::domain::repository::TrafficRepository;
use crate::domain::value_objects::VehicleCategory;
use crate::error::{ParkingError, ParkingResult};

/// Reporting period in local dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficPeriod {
    Day(NaiveDate),
    /// Both ends inclusive
    Range { from: NaiveDate, to: NaiveDate },
    Month { year: i32, month: u32 },
}

impl TrafficPeriod {
    /// First and last local date covered
    pub fn bounds(&self) -> ParkingResult<(NaiveDate, NaiveDate)> {
        match *self {
            TrafficPeriod::Day(day) => Ok((day, day)),
            TrafficPeriod::Range { from, to } => {
                if from > to {
                    return Err(ParkingError::validation("range start is after range end"));
                }
                Ok((from, to))
            }
            TrafficPeriod::Month { year, month } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)
                    .ok_or_else(|| ParkingError::validation("invalid year or month"))?;
                let last = first
                    .checked_add_months(chrono::Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .ok_or_else(|| ParkingError::validation("month out of range"))?;
                Ok((first, last))
            }
        }
    }
}

/// Report output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub category: Option<VehicleCategory>,
    pub count: TrafficCount,
}

/// Traffic Report Use Case
pub struct TrafficReportUseCase<T>
where
    T: TrafficRepository,
{
    traffic_repo: Arc<T>,
    offset: FixedOffset,
}

impl<T> TrafficReportUseCase<T>
where
    T: TrafficRepository,
{
    pub fn new(traffic_repo: Arc<T>, offset: FixedOffset) -> Self {
        Self {
            traffic_repo,
            offset,
        }
    }

    pub async fn execute(
        &self,
        period: TrafficPeriod,
        category: Option<VehicleCategory>,
    ) -> ParkingResult<TrafficReport> {
        let (from, to) = period.bounds()?;
        let window = TimeWindow {
            from: self.local_midnight(from)?,
            until: self.local_midnight(
                to.checked_add_days(Days::new(1))
                    .ok_or_else(|| ParkingError::validation("date out of range"))?,
            )?,
        };

        let count = self.traffic_repo.count_traffic(window, category).await?;
        tracing::debug!(
            %from,
            %to,
            entries = count.entries,
            exits = count.exits,
            "Traffic report computed"
        );

        Ok(TrafficReport {
            from,
            to,
            category,
            count,
        })
    }

    fn local_midnight(&self, date: NaiveDate) -> ParkingResult<DateTime<Utc>> {
        self.offset
            .from_local_datetime(&date.and_time(chrono::NaiveTime::MIN))
            .single()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| ParkingError::Internal(format!("cannot resolve midnight of {date}")))
    }
}
