//! PostgreSQL Repository Implementations
//!
//! Slot counters are only changed through conditional `UPDATE ... WHERE`
//! statements, and every entry write that pairs with a counter change runs
//! in one transaction.

use chrono::{DateTime, Utc};
use kernel::id::{EntryId, LotId, UserId};
use sqlx::{PgConnection, PgPool};

use crate::domain::entities::{
    EntryFilter, EntryRecord, Lot, LotUpdate, NewEntry, NewLot, SlotPool, TimeWindow,
    TrafficCount, Vehicle, VisitorProfile,
};
use crate::domain::repository::{
    EntryRepository, LotRepository, OperatorDirectory, TrafficRepository, VehicleRepository,
    VisitorRepository,
};
use crate::domain::value_objects::{
    EntryState, NationalId, Owner, OwnerKind, Plate, VehicleCategory,
};
use crate::error::{ParkingError, ParkingResult};

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgParkingRepository {
    pool: PgPool,
}

impl PgParkingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Slot counters
// ============================================================================

// The bound check runs in BIGINT so an extreme delta is rejected instead of
// overflowing INTEGER.

const ADJUST_CAR_SQL: &str = r#"
    UPDATE parking_lots
    SET car_available = car_available + $2, updated_at = now()
    WHERE lot_id = $1
      AND car_available::BIGINT + $2 BETWEEN 0 AND car_capacity
    RETURNING
        lot_id, lot_name, address,
        car_capacity, car_available,
        motorcycle_capacity, motorcycle_available,
        created_at, updated_at
"#;

const ADJUST_MOTORCYCLE_SQL: &str = r#"
    UPDATE parking_lots
    SET motorcycle_available = motorcycle_available + $2, updated_at = now()
    WHERE lot_id = $1
      AND motorcycle_available::BIGINT + $2 BETWEEN 0 AND motorcycle_capacity
    RETURNING
        lot_id, lot_name, address,
        car_capacity, car_available,
        motorcycle_capacity, motorcycle_available,
        created_at, updated_at
"#;

const SELECT_LOT_SQL: &str = r#"
    SELECT
        lot_id, lot_name, address,
        car_capacity, car_available,
        motorcycle_capacity, motorcycle_available,
        created_at, updated_at
    FROM parking_lots
    WHERE lot_id = $1
"#;

/// Conditional counter update; on rejection re-reads the lot to report why
async fn adjust_slots(
    conn: &mut PgConnection,
    lot_id: LotId,
    category: VehicleCategory,
    delta: i32,
) -> ParkingResult<Lot> {
    let sql = match category {
        VehicleCategory::Car => ADJUST_CAR_SQL,
        VehicleCategory::Motorcycle => ADJUST_MOTORCYCLE_SQL,
    };

    let row = sqlx::query_as::<_, LotRow>(sql)
        .bind(lot_id.value())
        .bind(delta)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(row) = row {
        return row.into_lot();
    }

    let lot = sqlx::query_as::<_, LotRow>(SELECT_LOT_SQL)
        .bind(lot_id.value())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ParkingError::LotNotFound(lot_id))?
        .into_lot()?;

    lot.check_adjustment(category, delta)?;
    // Counter moved between the two statements
    Err(if delta < 0 {
        ParkingError::NoSlotsAvailable(category)
    } else {
        ParkingError::SlotsOverflow(category)
    })
}

/// Release one slot inside an entry transaction
async fn release_slot(
    conn: &mut PgConnection,
    entry_id: EntryId,
    lot_id: LotId,
    category: VehicleCategory,
) -> ParkingResult<()> {
    match adjust_slots(conn, lot_id, category, 1).await {
        Ok(_) => Ok(()),
        Err(ParkingError::SlotsOverflow(_)) => {
            tracing::error!(
                entry_id = %entry_id,
                lot_id = %lot_id,
                category = %category,
                "Releasing slot would exceed lot capacity"
            );
            Err(ParkingError::Consistency(format!(
                "lot {lot_id} has no occupied {category} slot for entry {entry_id}"
            )))
        }
        Err(e) => Err(e),
    }
}

fn entry_insert_error(err: sqlx::Error, entry: &NewEntry) -> ParkingError {
    if let sqlx::Error::Database(db) = &err {
        match db.constraint() {
            Some("uq_entries_active_plate") => {
                return ParkingError::ActiveEntryExists(entry.plate.to_string());
            }
            Some("fk_entries_operator") => return ParkingError::OperatorNotFound(entry.operator_id),
            Some("fk_entries_lot") => return ParkingError::LotNotFound(entry.lot_id),
            Some("fk_entries_vehicle") => {
                return ParkingError::VehicleNotFound(entry.plate.to_string());
            }
            _ => {}
        }
    }
    ParkingError::Database(err)
}

// ============================================================================
// Vehicles
// ============================================================================

impl VehicleRepository for PgParkingRepository {
    async fn find_vehicle(&self, plate: &Plate) -> ParkingResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            SELECT plate, category, owner_kind, owner_ref, make, model, color, permit_expires_at
            FROM vehicles
            WHERE plate = $1
            "#,
        )
        .bind(plate.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VehicleRow::into_vehicle).transpose()
    }

    async fn register_vehicle(&self, vehicle: &Vehicle) -> ParkingResult<Vehicle> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            INSERT INTO vehicles (
                plate, category, owner_kind, owner_ref, make, model, color, permit_expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (plate) DO NOTHING
            RETURNING plate, category, owner_kind, owner_ref, make, model, color, permit_expires_at
            "#,
        )
        .bind(vehicle.plate.as_str())
        .bind(vehicle.category.code())
        .bind(vehicle.owner.kind().code())
        .bind(vehicle.owner.reference())
        .bind(vehicle.make.as_deref())
        .bind(vehicle.model.as_deref())
        .bind(vehicle.color.as_deref())
        .bind(vehicle.permit_expires_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| ParkingError::VehicleAlreadyRegistered(vehicle.plate.to_string()))?
            .into_vehicle()
    }

    async fn upsert_visitor_vehicle(&self, vehicle: &Vehicle) -> ParkingResult<Vehicle> {
        // The conflict branch only fires for rows already tagged VISITOR
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            INSERT INTO vehicles (
                plate, category, owner_kind, owner_ref, make, model, color, permit_expires_at
            ) VALUES ($1, $2, 'VISITOR', $3, $4, $5, $6, $7)
            ON CONFLICT (plate) DO UPDATE SET
                category = EXCLUDED.category,
                owner_ref = EXCLUDED.owner_ref,
                make = COALESCE(EXCLUDED.make, vehicles.make),
                model = COALESCE(EXCLUDED.model, vehicles.model),
                color = COALESCE(EXCLUDED.color, vehicles.color),
                permit_expires_at = EXCLUDED.permit_expires_at,
                updated_at = now()
            WHERE vehicles.owner_kind = 'VISITOR'
            RETURNING plate, category, owner_kind, owner_ref, make, model, color, permit_expires_at
            "#,
        )
        .bind(vehicle.plate.as_str())
        .bind(vehicle.category.code())
        .bind(vehicle.owner.reference())
        .bind(vehicle.make.as_deref())
        .bind(vehicle.model.as_deref())
        .bind(vehicle.color.as_deref())
        .bind(vehicle.permit_expires_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                tracing::debug!(plate = %vehicle.plate, "Visitor vehicle upserted");
                r.into_vehicle()
            }
            None => {
                tracing::warn!(plate = %vehicle.plate, "Plate belongs to an institutional vehicle");
                Err(ParkingError::PlateIsInstitutional(vehicle.plate.to_string()))
            }
        }
    }
}

// ============================================================================
// Operators
// ============================================================================

impl OperatorDirectory for PgParkingRepository {
    async fn operator_exists(&self, operator_id: UserId) -> ParkingResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)",
        )
        .bind(operator_id.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

// ============================================================================
// Lots
// ============================================================================

impl LotRepository for PgParkingRepository {
    async fn create_lot(&self, lot: &NewLot) -> ParkingResult<Lot> {
        let row = sqlx::query_as::<_, LotRow>(
            r#"
            INSERT INTO parking_lots (
                lot_name, address,
                car_capacity, car_available,
                motorcycle_capacity, motorcycle_available
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING
                lot_id, lot_name, address,
                car_capacity, car_available,
                motorcycle_capacity, motorcycle_available,
                created_at, updated_at
            "#,
        )
        .bind(&lot.name)
        .bind(&lot.address)
        .bind(lot.car.capacity)
        .bind(lot.car.available)
        .bind(lot.motorcycle.capacity)
        .bind(lot.motorcycle.available)
        .fetch_one(&self.pool)
        .await?;

        row.into_lot()
    }

    async fn find_lot(&self, lot_id: LotId) -> ParkingResult<Option<Lot>> {
        let row = sqlx::query_as::<_, LotRow>(SELECT_LOT_SQL)
            .bind(lot_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.map(LotRow::into_lot).transpose()
    }

    async fn list_lots(&self) -> ParkingResult<Vec<Lot>> {
        let rows = sqlx::query_as::<_, LotRow>(
            r#"
            SELECT
                lot_id, lot_name, address,
                car_capacity, car_available,
                motorcycle_capacity, motorcycle_available,
                created_at, updated_at
            FROM parking_lots
            ORDER BY lot_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LotRow::into_lot).collect()
    }

    async fn update_lot(&self, lot_id: LotId, update: &LotUpdate) -> ParkingResult<Lot> {
        let mut tx = self.pool.begin().await?;

        // Row lock holds off admissions and exits on this lot until commit
        let current = sqlx::query_as::<_, LotRow>(
            r#"
            SELECT
                lot_id, lot_name, address,
                car_capacity, car_available,
                motorcycle_capacity, motorcycle_available,
                created_at, updated_at
            FROM parking_lots
            WHERE lot_id = $1
            FOR UPDATE
            "#,
        )
        .bind(lot_id.value())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ParkingError::LotNotFound(lot_id))?
        .into_lot()?;

        let updated = current.with_update(update, Utc::now())?;

        let (car_active, motorcycle_active) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE category = 'CAR'),
                COUNT(*) FILTER (WHERE category = 'MOTORCYCLE')
            FROM parking_entries
            WHERE lot_id = $1 AND state = 'ACTIVE'
            "#,
        )
        .bind(lot_id.value())
        .fetch_one(&mut *tx)
        .await?;
        updated.check_covers_active(VehicleCategory::Car, car_active)?;
        updated.check_covers_active(VehicleCategory::Motorcycle, motorcycle_active)?;

        let row = sqlx::query_as::<_, LotRow>(
            r#"
            UPDATE parking_lots
            SET lot_name = $2,
                address = $3,
                car_capacity = $4,
                car_available = $5,
                motorcycle_capacity = $6,
                motorcycle_available = $7,
                updated_at = now()
            WHERE lot_id = $1
            RETURNING
                lot_id, lot_name, address,
                car_capacity, car_available,
                motorcycle_capacity, motorcycle_available,
                created_at, updated_at
            "#,
        )
        .bind(lot_id.value())
        .bind(&updated.name)
        .bind(&updated.address)
        .bind(updated.car.capacity)
        .bind(updated.car.available)
        .bind(updated.motorcycle.capacity)
        .bind(updated.motorcycle.available)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(lot_id = %lot_id, "Lot row updated");
        row.into_lot()
    }

    async fn delete_lot(&self, lot_id: LotId) -> ParkingResult<()> {
        let result = sqlx::query("DELETE FROM parking_lots WHERE lot_id = $1")
            .bind(lot_id.value())
            .execute(&self.pool)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db) if db.constraint() == Some("fk_entries_lot") => {
                    ParkingError::LotInUse(lot_id)
                }
                _ => ParkingError::Database(err),
            })?;

        if result.rows_affected() == 0 {
            return Err(ParkingError::LotNotFound(lot_id));
        }
        Ok(())
    }

    async fn adjust_available(
        &self,
        lot_id: LotId,
        category: VehicleCategory,
        delta: i32,
    ) -> ParkingResult<Lot> {
        let mut conn = self.pool.acquire().await?;
        adjust_slots(&mut conn, lot_id, category, delta).await
    }
}

// ============================================================================
// Entries
// ============================================================================

impl EntryRepository for PgParkingRepository {
    async fn find_entry(&self, entry_id: EntryId) -> ParkingResult<Option<EntryRecord>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT entry_id, plate, operator_id, lot_id, category, entered_at, exited_at, state, visit_reason
            FROM parking_entries
            WHERE entry_id = $1
            "#,
        )
        .bind(entry_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn find_active_by_plate(&self, plate: &Plate) -> ParkingResult<Option<EntryRecord>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT entry_id, plate, operator_id, lot_id, category, entered_at, exited_at, state, visit_reason
            FROM parking_entries
            WHERE plate = $1 AND state = 'ACTIVE'
            "#,
        )
        .bind(plate.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn find_active_by_owner(
        &self,
        owner: &Owner,
        lot_id: LotId,
    ) -> ParkingResult<Option<EntryRecord>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT
                e.entry_id, e.plate, e.operator_id, e.lot_id, e.category,
                e.entered_at, e.exited_at, e.state, e.visit_reason
            FROM parking_entries e
            JOIN vehicles v ON v.plate = e.plate
            WHERE e.state = 'ACTIVE'
              AND e.lot_id = $1
              AND v.owner_kind = $2
              AND v.owner_ref = $3
            ORDER BY e.entered_at DESC
            LIMIT 1
            "#,
        )
        .bind(lot_id.value())
        .bind(owner.kind().code())
        .bind(owner.reference())
        .fetch_optional(&self.pool)
        .await?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn list_entries(&self, filter: &EntryFilter) -> ParkingResult<Vec<EntryRecord>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT entry_id, plate, operator_id, lot_id, category, entered_at, exited_at, state, visit_reason
            FROM parking_entries
            WHERE ($1::TEXT IS NULL OR state = $1)
              AND ($2::TEXT IS NULL OR plate = $2)
              AND ($3::BIGINT IS NULL OR lot_id = $3)
              AND ($4::BIGINT IS NULL OR operator_id = $4)
            ORDER BY entered_at DESC, entry_id DESC
            "#,
        )
        .bind(filter.state.map(|s| s.code()))
        .bind(filter.plate.as_ref().map(Plate::as_str))
        .bind(filter.lot_id.map(|id| id.value()))
        .bind(filter.operator_id.map(|id| id.value()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EntryRow::into_entry).collect()
    }

    async fn list_active_with_owner_kind(&self) -> ParkingResult<Vec<(EntryRecord, OwnerKind)>> {
        let rows = sqlx::query_as::<_, ActiveEntryRow>(
            r#"
            SELECT
                e.entry_id, e.plate, e.operator_id, e.lot_id, e.category,
                e.entered_at, e.exited_at, e.state, e.visit_reason,
                v.owner_kind
            FROM parking_entries e
            JOIN vehicles v ON v.plate = e.plate
            WHERE e.state = 'ACTIVE'
            ORDER BY e.entered_at DESC, e.entry_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let kind = OwnerKind::from_code(&r.owner_kind).ok_or_else(|| {
                    ParkingError::Internal(format!("unknown owner kind {}", r.owner_kind))
                })?;
                Ok((r.entry.into_entry()?, kind))
            })
            .collect()
    }

    async fn open_entry(&self, entry: &NewEntry) -> ParkingResult<EntryRecord> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            INSERT INTO parking_entries (
                plate, operator_id, lot_id, category, entered_at, state, visit_reason
            ) VALUES ($1, $2, $3, $4, $5, 'ACTIVE', $6)
            RETURNING entry_id, plate, operator_id, lot_id, category, entered_at, exited_at, state, visit_reason
            "#,
        )
        .bind(entry.plate.as_str())
        .bind(entry.operator_id.value())
        .bind(entry.lot_id.value())
        .bind(entry.category.code())
        .bind(entry.entered_at)
        .bind(entry.visit_reason.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| entry_insert_error(e, entry))?;

        // Dropping the transaction on error rolls back the insert
        adjust_slots(&mut tx, entry.lot_id, entry.category, -1).await?;
        tx.commit().await?;

        row.into_entry()
    }

    async fn close_entry(
        &self,
        entry_id: EntryId,
        exited_at: DateTime<Utc>,
    ) -> ParkingResult<EntryRecord> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            UPDATE parking_entries
            SET state = 'CLOSED', exited_at = $2
            WHERE entry_id = $1 AND state = 'ACTIVE'
            RETURNING entry_id, plate, operator_id, lot_id, category, entered_at, exited_at, state, visit_reason
            "#,
        )
        .bind(entry_id.value())
        .bind(exited_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM parking_entries WHERE entry_id = $1)",
            )
            .bind(entry_id.value())
            .fetch_one(&mut *tx)
            .await?;

            return Err(if exists {
                ParkingError::EntryAlreadyClosed(entry_id)
            } else {
                ParkingError::EntryNotFound(entry_id)
            });
        };

        let closed = row.into_entry()?;
        release_slot(&mut tx, entry_id, closed.lot_id, closed.category).await?;
        tx.commit().await?;

        Ok(closed)
    }

    async fn delete_entry(&self, entry_id: EntryId) -> ParkingResult<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            DELETE FROM parking_entries
            WHERE entry_id = $1
            RETURNING entry_id, plate, operator_id, lot_id, category, entered_at, exited_at, state, visit_reason
            "#,
        )
        .bind(entry_id.value())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ParkingError::EntryNotFound(entry_id))?;

        let deleted = row.into_entry()?;
        let released = deleted.is_active();
        if released {
            release_slot(&mut tx, entry_id, deleted.lot_id, deleted.category).await?;
        }
        tx.commit().await?;

        Ok(released)
    }
}

// ============================================================================
// Visitors
// ============================================================================

impl VisitorRepository for PgParkingRepository {
    async fn upsert_visitor(&self, profile: &VisitorProfile) -> ParkingResult<VisitorProfile> {
        let row = sqlx::query_as::<_, VisitorRow>(
            r#"
            INSERT INTO visitor_profiles (national_id, first_name, last_name, phone, email)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (national_id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                updated_at = now()
            RETURNING national_id, first_name, last_name, phone, email, updated_at
            "#,
        )
        .bind(profile.national_id.as_str())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(profile.email.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_profile())
    }

    async fn find_visitor(
        &self,
        national_id: &NationalId,
    ) -> ParkingResult<Option<VisitorProfile>> {
        let row = sqlx::query_as::<_, VisitorRow>(
            r#"
            SELECT national_id, first_name, last_name, phone, email, updated_at
            FROM visitor_profiles
            WHERE national_id = $1
            "#,
        )
        .bind(national_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VisitorRow::into_profile))
    }
}

// ============================================================================
// Reports
// ============================================================================

impl TrafficRepository for PgParkingRepository {
    async fn count_traffic(
        &self,
        window: TimeWindow,
        category: Option<VehicleCategory>,
    ) -> ParkingResult<TrafficCount> {
        let (entries, exits) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE e.entered_at >= $1 AND e.entered_at < $2),
                COUNT(*) FILTER (WHERE e.exited_at >= $1 AND e.exited_at < $2)
            FROM parking_entries e
            WHERE ($3::TEXT IS NULL OR e.category = $3)
            "#,
        )
        .bind(window.from)
        .bind(window.until)
        .bind(category.map(|c| c.code()))
        .fetch_one(&self.pool)
        .await?;

        Ok(TrafficCount { entries, exits })
    }
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct LotRow {
    lot_id: i64,
    lot_name: String,
    address: String,
    car_capacity: i32,
    car_available: i32,
    motorcycle_capacity: i32,
    motorcycle_available: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LotRow {
    fn into_lot(self) -> ParkingResult<Lot> {
        let lot_id = self.lot_id;
        let pool = |capacity, available| {
            SlotPool::new(capacity, available).map_err(|_| {
                ParkingError::Consistency(format!("lot {lot_id} counters out of bounds"))
            })
        };
        Ok(Lot {
            id: LotId::new(lot_id),
            car: pool(self.car_capacity, self.car_available)?,
            motorcycle: pool(self.motorcycle_capacity, self.motorcycle_available)?,
            name: self.lot_name,
            address: self.address,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    plate: String,
    category: String,
    owner_kind: String,
    owner_ref: String,
    make: Option<String>,
    model: Option<String>,
    color: Option<String>,
    permit_expires_at: Option<DateTime<Utc>>,
}

impl VehicleRow {
    fn into_vehicle(self) -> ParkingResult<Vehicle> {
        let category = VehicleCategory::from_code(&self.category).ok_or_else(|| {
            ParkingError::Internal(format!("unknown vehicle category {}", self.category))
        })?;
        let owner = Owner::from_stored(&self.owner_kind, self.owner_ref).ok_or_else(|| {
            ParkingError::Internal(format!("unknown owner kind {}", self.owner_kind))
        })?;
        Ok(Vehicle {
            plate: Plate::from_stored(self.plate),
            category,
            owner,
            make: self.make,
            model: self.model,
            color: self.color,
            permit_expires_at: self.permit_expires_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    entry_id: i64,
    plate: String,
    operator_id: i64,
    lot_id: i64,
    category: String,
    entered_at: DateTime<Utc>,
    exited_at: Option<DateTime<Utc>>,
    state: String,
    visit_reason: Option<String>,
}

impl EntryRow {
    fn into_entry(self) -> ParkingResult<EntryRecord> {
        let state = EntryState::from_code(&self.state)
            .ok_or_else(|| ParkingError::Internal(format!("unknown entry state {}", self.state)))?;
        let category = VehicleCategory::from_code(&self.category).ok_or_else(|| {
            ParkingError::Internal(format!("unknown vehicle category {}", self.category))
        })?;
        Ok(EntryRecord {
            id: EntryId::new(self.entry_id),
            plate: Plate::from_stored(self.plate),
            operator_id: UserId::new(self.operator_id),
            lot_id: LotId::new(self.lot_id),
            category,
            entered_at: self.entered_at,
            exited_at: self.exited_at,
            state,
            visit_reason: self.visit_reason,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ActiveEntryRow {
    #[sqlx(flatten)]
    entry: EntryRow,
    owner_kind: String,
}

#[derive(sqlx::FromRow)]
struct VisitorRow {
    national_id: String,
    first_name: String,
    last_name: String,
    phone: String,
    email: Option<String>,
    updated_at: DateTime<Utc>,
}

impl VisitorRow {
    fn into_profile(self) -> VisitorProfile {
        VisitorProfile {
            national_id: NationalId::from_stored(self.national_id),
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            email: self.email,
            updated_at: self.updated_at,
        }
    }
}
