//! Entry Query Use Case

use kernel::id::EntryId;
use std::sync::Arc;

use crate::domain::entities::{EntryFilter, EntryRecord};
use crate::domain::repository::EntryRepository;
use crate::domain::value_objects::OwnerKind;
use crate::error::{ParkingError, ParkingResult};

/// ACTIVE entries split by owner kind
#[derive(Debug, Clone, Default)]
pub struct ActiveEntries {
    pub institutional: Vec<EntryRecord>,
    pub visitor: Vec<EntryRecord>,
}

impl ActiveEntries {
    pub fn total(&self) -> usize {
        self.institutional.len() + self.visitor.len()
    }
}

/// Entry Query Use Case
pub struct EntryQueryUseCase<E>
where
    E: EntryRepository,
{
    entry_repo: Arc<E>,
}

impl<E> EntryQueryUseCase<E>
where
    E: EntryRepository,
{
    pub fn new(entry_repo: Arc<E>) -> Self {
        Self { entry_repo }
    }

    pub async fn get(&self, entry_id: EntryId) -> ParkingResult<EntryRecord> {
        self.entry_repo
            .find_entry(entry_id)
            .await?
            .ok_or(ParkingError::EntryNotFound(entry_id))
    }

    pub async fn list(&self, filter: &EntryFilter) -> ParkingResult<Vec<EntryRecord>> {
        self.entry_repo.list_entries(filter).await
    }

    pub async fn active(&self) -> ParkingResult<ActiveEntries> {
        let rows = self.entry_repo.list_active_with_owner_kind().await?;
        let mut split = ActiveEntries::default();
        for (entry, kind) in rows {
            match kind {
                OwnerKind::Institutional => split.institutional.push(entry),
                OwnerKind::Visitor => split.visitor.push(entry),
            }
        }
        Ok(split)
    }
}
