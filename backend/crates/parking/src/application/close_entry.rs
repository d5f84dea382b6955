//! Close Entry Use Case
//!
//! Exit processing: closes ACTIVE entries and releases their slot, and
//! removes entry records without stranding an occupied slot. The slot always
//! goes back to the category recorded when the entry was opened.

use chrono::{DateTime, Utc};
use kernel::id::EntryId;
use std::sync::Arc;

use crate::domain::entities::EntryRecord;
use crate::domain::repository::EntryRepository;
use crate::domain::value_objects::Plate;
use crate::error::{ParkingError, ParkingResult};

/// Close Entry Use Case
pub struct CloseEntryUseCase<E>
where
    E: EntryRepository,
{
    entry_repo: Arc<E>,
}

impl<E> CloseEntryUseCase<E>
where
    E: EntryRepository,
{
    pub fn new(entry_repo: Arc<E>) -> Self {
        Self { entry_repo }
    }

    /// Close `entry_id` at `exited_at`, or now
    pub async fn close(
        &self,
        entry_id: EntryId,
        exited_at: Option<DateTime<Utc>>,
    ) -> ParkingResult<EntryRecord> {
        let entry = self
            .entry_repo
            .find_entry(entry_id)
            .await?
            .ok_or(ParkingError::EntryNotFound(entry_id))?;

        if !entry.is_active() {
            return Err(ParkingError::EntryAlreadyClosed(entry_id));
        }

        let exited_at = exited_at.unwrap_or_else(Utc::now);
        if exited_at < entry.entered_at {
            return Err(ParkingError::validation(
                "exit time must not be earlier than entry time",
            ));
        }

        let closed = self.entry_repo.close_entry(entry_id, exited_at).await?;

        tracing::info!(
            entry_id = %closed.id,
            plate = %closed.plate,
            lot_id = %closed.lot_id,
            category = %closed.category,
            "Vehicle exited"
        );

        Ok(closed)
    }

    /// Close the ACTIVE entry of `plate`
    pub async fn close_by_plate(
        &self,
        plate: &str,
        exited_at: Option<DateTime<Utc>>,
    ) -> ParkingResult<EntryRecord> {
        let plate = Plate::parse(plate)?;
        let entry = self
            .entry_repo
            .find_active_by_plate(&plate)
            .await?
            .ok_or_else(|| ParkingError::NoActiveEntry(plate.to_string()))?;

        self.close(entry.id, exited_at).await
    }

    /// Delete an entry record, releasing its slot when still ACTIVE
    pub async fn remove(&self, entry_id: EntryId) -> ParkingResult<()> {
        let released = self.entry_repo.delete_entry(entry_id).await?;

        tracing::info!(
            entry_id = %entry_id,
            released_slot = released,
            "Entry removed"
        );

        Ok(())
    }
}
