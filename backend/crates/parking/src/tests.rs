//! Unit and flow tests for the parking crate
//! Use cases run against the in-memory repository with explicit clock readings.

#[cfg(test)]
mod fixtures {
    use chrono::{DateTime, Utc};
    use kernel::id::UserId;
    use std::sync::Arc;

    use crate::application::admit_vehicle::AdmitVehicleUseCase;
    use crate::application::close_entry::CloseEntryUseCase;
    use crate::application::occupancy::{CreateLotInput, LotOccupancy};
    use crate::application::register_visitor::{
        RegisterVisitorInput, RegisterVisitorUseCase, VisitorProfileInput, VisitorVehicleInput,
    };
    use crate::application::registry::{RegisterVehicleInput, VehicleRegistryUseCase};
    use crate::domain::entities::{Lot, Vehicle};
    use crate::domain::restriction::RestrictionCalendar;
    use crate::domain::value_objects::VehicleCategory;
    use crate::infra::memory::InMemoryParkingRepository;

    pub type Repo = InMemoryParkingRepository;

    pub const OPERATOR: UserId = UserId::new(1);

    pub fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    /// Saturday, no pico y placa
    pub fn saturday() -> DateTime<Utc> {
        at("2025-11-22T10:00:00Z")
    }

    /// Monday 08:00, digits 1 and 2 restricted
    pub fn monday_morning() -> DateTime<Utc> {
        at("2025-11-17T08:00:00Z")
    }

    pub fn repo() -> Repo {
        let repo = Repo::new();
        repo.add_operator(OPERATOR).unwrap();
        repo
    }

    pub async fn lot(repo: &Repo, car: (i32, i32), motorcycle: (i32, i32)) -> Lot {
        LotOccupancy::new(Arc::new(repo.clone()))
            .create(CreateLotInput {
                name: "North gate".into(),
                address: "Campus north, building 4".into(),
                car_capacity: car.0,
                car_available: Some(car.1),
                motorcycle_capacity: motorcycle.0,
                motorcycle_available: Some(motorcycle.1),
            })
            .await
            .unwrap()
    }

    pub async fn institutional(
        repo: &Repo,
        plate: &str,
        driver_code: &str,
        category: VehicleCategory,
    ) -> Vehicle {
        VehicleRegistryUseCase::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
            .register_institutional(RegisterVehicleInput {
                plate: plate.into(),
                category,
                driver_code: driver_code.into(),
                make: Some("Renault".into()),
                model: Some("Logan".into()),
                color: Some("Gray".into()),
            })
            .await
            .unwrap()
    }

    pub fn admit(repo: &Repo) -> AdmitVehicleUseCase<Repo, Repo, Repo, Repo> {
        let shared = Arc::new(repo.clone());
        AdmitVehicleUseCase::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared,
            RestrictionCalendar::default(),
        )
    }

    pub fn exit(repo: &Repo) -> CloseEntryUseCase<Repo> {
        CloseEntryUseCase::new(Arc::new(repo.clone()))
    }

    pub fn onboard(repo: &Repo) -> RegisterVisitorUseCase<Repo, Repo, Repo, Repo> {
        let shared = Arc::new(repo.clone());
        RegisterVisitorUseCase::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared,
            RestrictionCalendar::default(),
        )
    }

    pub fn visitor_input(
        plate: &str,
        lot: &Lot,
        permit_expires_at: DateTime<Utc>,
    ) -> RegisterVisitorInput {
        RegisterVisitorInput {
            visitor: VisitorProfileInput {
                national_id: "1020304050".into(),
                first_name: "Laura".into(),
                last_name: "Gomez".into(),
                phone: "+57 310 555 0101".into(),
                email: Some("laura@example.com".into()),
            },
            vehicle: VisitorVehicleInput {
                plate: plate.into(),
                category: VehicleCategory::Car,
                make: Some("Kia".into()),
                model: Some("Picanto".into()),
                color: Some("White".into()),
                permit_expires_at,
            },
            lot_id: lot.id,
            operator_id: OPERATOR,
            visit_reason: "Thesis defense committee".into(),
        }
    }
}

#[cfg(test)]
mod restriction_property_tests {
    use chrono::{Datelike, Duration, Timelike, Weekday};

    use super::fixtures::at;
    use crate::domain::restriction::{RestrictionCalendar, RestrictionSchedule};

    #[test]
    fn test_whole_week_matches_table() {
        let calendar = RestrictionCalendar::default();
        let monday = at("2025-11-17T00:00:00Z");

        for hour_offset in 0..(7 * 24) {
            let instant = monday + Duration::hours(hour_offset);
            for digit in 0..=9u8 {
                let plate = format!("ABC12{digit}");
                let verdict = calendar.evaluate(&plate, instant);

                let weekday = instant.weekday();
                let weekend = matches!(weekday, Weekday::Sat | Weekday::Sun);
                let in_window = (6..20).contains(&instant.hour());
                let listed = RestrictionSchedule::STANDARD
                    .digits_for(weekday)
                    .contains(&digit);

                assert_eq!(
                    verdict.has_restriction,
                    !weekend && in_window && listed,
                    "plate {plate} at {instant}"
                );
                assert_eq!(verdict.within_window, in_window);
                assert_eq!(verdict.last_digit, digit);
            }
        }
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let calendar = RestrictionCalendar::default();
        let instant = at("2025-11-19T11:30:00Z");
        assert_eq!(
            calendar.evaluate("QWE456", instant),
            calendar.evaluate("QWE456", instant)
        );
    }

    #[test]
    fn test_reference_scenarios() {
        let calendar = RestrictionCalendar::default();

        let a = calendar.evaluate("ABC121", at("2025-11-17T14:00:00Z"));
        assert!(a.has_restriction);
        assert_eq!(a.last_digit, 1);
        assert_eq!(a.restricted_digits, vec![1, 2]);

        let b = calendar.evaluate("ABC123", at("2025-11-17T14:00:00Z"));
        assert!(!b.has_restriction);
        assert_eq!(b.last_digit, 3);

        let c = calendar.evaluate("ABC121", at("2025-11-17T20:00:00Z"));
        assert!(!c.has_restriction);
        assert!(!c.within_window);

        let d = calendar.evaluate("XYZ12A", at("2025-11-21T10:00:00Z"));
        assert_eq!(d.last_digit, 0);
        assert_eq!(d.restricted_digits, vec![9, 0]);
        assert!(d.has_restriction);
    }
}

#[cfg(test)]
mod admission_tests {
    use kernel::id::{LotId, UserId};

    use super::fixtures::*;
    use crate::application::admit_vehicle::AdmitVehicleInput;
    use crate::domain::entities::EntryFilter;
    use crate::domain::repository::{EntryRepository, LotRepository};
    use crate::domain::value_objects::{EntryState, Plate, VehicleCategory};
    use crate::error::ParkingError;

    fn input(plate: &str, lot_id: LotId) -> AdmitVehicleInput {
        AdmitVehicleInput {
            plate: plate.into(),
            operator_id: OPERATOR,
            lot_id,
        }
    }

    #[tokio::test]
    async fn test_admit_takes_one_slot() {
        let repo = repo();
        let lot = lot(&repo, (2, 2), (1, 1)).await;
        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;

        let entry = admit(&repo)
            .execute_at(input("abc123", lot.id), saturday())
            .await
            .unwrap();

        assert_eq!(entry.state, EntryState::Active);
        assert_eq!(entry.plate.as_str(), "ABC123");
        assert_eq!(entry.category, VehicleCategory::Car);
        assert_eq!(entry.entered_at, saturday());
        assert!(entry.exited_at.is_none());

        let lot = repo.find_lot(lot.id).await.unwrap().unwrap();
        assert_eq!(lot.car.available, 1);
        assert_eq!(lot.motorcycle.available, 1);
    }

    #[tokio::test]
    async fn test_full_lot_is_rejected_and_unchanged() {
        let repo = repo();
        let lot = lot(&repo, (1, 0), (1, 1)).await;
        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;

        let err = admit(&repo)
            .execute_at(input("ABC123", lot.id), saturday())
            .await
            .unwrap_err();

        assert!(matches!(err, ParkingError::NoSlotsAvailable(VehicleCategory::Car)));
        assert!(err.to_string().contains("CAR"));
        let after = repo.find_lot(lot.id).await.unwrap().unwrap();
        assert_eq!(after.car, lot.car);
        assert!(
            repo.list_entries(&EntryFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_second_admission_of_same_plate_conflicts() {
        let repo = repo();
        let lot = lot(&repo, (5, 5), (0, 0)).await;
        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;
        let use_case = admit(&repo);

        let first = use_case
            .execute_at(input("ABC123", lot.id), saturday())
            .await
            .unwrap();
        let err = use_case
            .execute_at(input("ABC123", lot.id), saturday())
            .await
            .unwrap_err();

        assert!(matches!(err, ParkingError::ActiveEntryExists(_)));
        let active = repo
            .list_entries(&EntryFilter {
                state: Some(EntryState::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, first.id);
        assert_eq!(repo.find_lot(lot.id).await.unwrap().unwrap().car.available, 4);
    }

    #[tokio::test]
    async fn test_failure_precedence() {
        let repo = repo();
        let use_case = admit(&repo);
        let missing_lot = LotId::new(99);

        // Unknown vehicle wins over unknown lot
        let err = use_case
            .execute_at(input("ZZZ999", missing_lot), saturday())
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::VehicleNotFound(_)));

        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;

        // Unknown operator wins over unknown lot
        let err = use_case
            .execute_at(
                AdmitVehicleInput {
                    plate: "ABC123".into(),
                    operator_id: UserId::new(42),
                    lot_id: missing_lot,
                },
                saturday(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::OperatorNotFound(_)));

        let err = use_case
            .execute_at(input("ABC123", missing_lot), saturday())
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::LotNotFound(_)));

        // Full lot wins over the duplicate-entry conflict
        let lot = lot(&repo, (1, 1), (0, 0)).await;
        use_case
            .execute_at(input("ABC123", lot.id), saturday())
            .await
            .unwrap();
        let err = use_case
            .execute_at(input("ABC123", lot.id), saturday())
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::NoSlotsAvailable(_)));
    }

    #[tokio::test]
    async fn test_active_entry_wins_over_restriction() {
        let repo = repo();
        let lot = lot(&repo, (5, 5), (0, 0)).await;
        institutional(&repo, "ABC121", "EMP-001", VehicleCategory::Car).await;
        let use_case = admit(&repo);

        use_case
            .execute_at(input("ABC121", lot.id), saturday())
            .await
            .unwrap();

        // Monday morning restricts digit 1, but the open entry is reported first
        let err = use_case
            .execute_at(input("ABC121", lot.id), monday_morning())
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::ActiveEntryExists(ref plate) if plate == "ABC121"));
        assert_eq!(repo.find_lot(lot.id).await.unwrap().unwrap().car.available, 4);
    }

    #[tokio::test]
    async fn test_owner_parked_wins_over_restriction() {
        let repo = repo();
        let north = lot(&repo, (5, 5), (0, 0)).await;
        let south = lot(&repo, (5, 5), (0, 0)).await;
        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;
        institutional(&repo, "ABC122", "EMP-001", VehicleCategory::Car).await;
        let use_case = admit(&repo);

        use_case
            .execute_at(input("ABC123", north.id), monday_morning())
            .await
            .unwrap();

        let err = use_case
            .execute_at(input("ABC122", north.id), monday_morning())
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::OwnerAlreadyParked { lot_id, .. } if lot_id == north.id));

        // Without the owner conflict the restriction applies
        let err = use_case
            .execute_at(input("ABC122", south.id), monday_morning())
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::Restricted(_)));
        assert_eq!(repo.find_lot(south.id).await.unwrap().unwrap().car.available, 5);
    }

    #[tokio::test]
    async fn test_owner_cannot_park_two_vehicles_in_one_lot() {
        let repo = repo();
        let north = lot(&repo, (5, 5), (5, 5)).await;
        let south = lot(&repo, (5, 5), (5, 5)).await;
        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;
        institutional(&repo, "MOT45D", "EMP-001", VehicleCategory::Motorcycle).await;
        let use_case = admit(&repo);

        use_case
            .execute_at(input("ABC123", north.id), saturday())
            .await
            .unwrap();

        let err = use_case
            .execute_at(input("MOT45D", north.id), saturday())
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::OwnerAlreadyParked { .. }));

        // Another lot is fine
        use_case
            .execute_at(input("MOT45D", south.id), saturday())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_restricted_plate_leaves_no_state() {
        let repo = repo();
        let lot = lot(&repo, (3, 3), (0, 0)).await;
        institutional(&repo, "ABC121", "EMP-001", VehicleCategory::Car).await;

        let err = admit(&repo)
            .execute_at(input("ABC121", lot.id), monday_morning())
            .await
            .unwrap_err();

        match err {
            ParkingError::Restricted(verdict) => {
                assert_eq!(verdict.restricted_digits, vec![1, 2]);
                assert_eq!(verdict.last_digit, 1);
            }
            other => panic!("expected restriction, got {other:?}"),
        }
        assert_eq!(repo.find_lot(lot.id).await.unwrap().unwrap().car.available, 3);
        let plate = Plate::parse("ABC121").unwrap();
        assert!(repo.find_active_by_plate(&plate).await.unwrap().is_none());
    }
}

#[cfg(test)]
mod exit_tests {
    use std::sync::Arc;

    use super::fixtures::*;
    use crate::application::admit_vehicle::AdmitVehicleInput;
    use crate::application::occupancy::LotOccupancy;
    use crate::domain::entities::EntryRecord;
    use crate::domain::repository::{EntryRepository, LotRepository};
    use crate::domain::value_objects::{EntryState, VehicleCategory};
    use crate::error::ParkingError;

    async fn parked(repo: &Repo, car_capacity: i32) -> EntryRecord {
        let lot = lot(repo, (car_capacity, car_capacity), (0, 0)).await;
        institutional(repo, "ABC123", "EMP-001", VehicleCategory::Car).await;
        admit(repo)
            .execute_at(
                AdmitVehicleInput {
                    plate: "ABC123".into(),
                    operator_id: OPERATOR,
                    lot_id: lot.id,
                },
                saturday(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_close_releases_slot() {
        let repo = repo();
        let entry = parked(&repo, 2).await;
        let exited_at = at("2025-11-22T12:30:00Z");

        let closed = exit(&repo).close(entry.id, Some(exited_at)).await.unwrap();

        assert_eq!(closed.state, EntryState::Closed);
        assert_eq!(closed.exited_at, Some(exited_at));
        let lot = repo.find_lot(entry.lot_id).await.unwrap().unwrap();
        assert_eq!(lot.car.available, 2);
    }

    #[tokio::test]
    async fn test_close_twice_conflicts() {
        let repo = repo();
        let entry = parked(&repo, 2).await;
        let processor = exit(&repo);

        processor
            .close(entry.id, Some(at("2025-11-22T12:00:00Z")))
            .await
            .unwrap();
        let err = processor
            .close(entry.id, Some(at("2025-11-22T13:00:00Z")))
            .await
            .unwrap_err();

        assert!(matches!(err, ParkingError::EntryAlreadyClosed(_)));
        let lot = repo.find_lot(entry.lot_id).await.unwrap().unwrap();
        assert_eq!(lot.car.available, 2);
    }

    #[tokio::test]
    async fn test_close_before_entry_time_is_rejected() {
        let repo = repo();
        let entry = parked(&repo, 1).await;

        let err = exit(&repo)
            .close(entry.id, Some(at("2025-11-22T09:00:00Z")))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_close_by_plate() {
        let repo = repo();
        let entry = parked(&repo, 1).await;
        let processor = exit(&repo);

        let closed = processor
            .close_by_plate("abc123", Some(at("2025-11-22T11:00:00Z")))
            .await
            .unwrap();
        assert_eq!(closed.id, entry.id);

        let err = processor.close_by_plate("ABC123", None).await.unwrap_err();
        assert!(matches!(err, ParkingError::NoActiveEntry(_)));
    }

    #[tokio::test]
    async fn test_remove_active_entry_releases_slot() {
        let repo = repo();
        let entry = parked(&repo, 1).await;

        exit(&repo).remove(entry.id).await.unwrap();

        assert!(repo.find_entry(entry.id).await.unwrap().is_none());
        let lot = repo.find_lot(entry.lot_id).await.unwrap().unwrap();
        assert_eq!(lot.car.available, 1);
    }

    #[tokio::test]
    async fn test_remove_closed_entry_keeps_counter() {
        let repo = repo();
        let entry = parked(&repo, 1).await;
        let processor = exit(&repo);
        processor
            .close(entry.id, Some(at("2025-11-22T11:00:00Z")))
            .await
            .unwrap();

        processor.remove(entry.id).await.unwrap();

        let lot = repo.find_lot(entry.lot_id).await.unwrap().unwrap();
        assert_eq!(lot.car.available, 1);
        assert!(matches!(
            processor.remove(entry.id).await.unwrap_err(),
            ParkingError::EntryNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_release_past_capacity_is_a_consistency_error() {
        let repo = repo();
        let entry = parked(&repo, 1).await;

        // Someone hands the slot back out of band
        LotOccupancy::new(Arc::new(repo.clone()))
            .adjust(entry.lot_id, VehicleCategory::Car, 1)
            .await
            .unwrap();

        let err = exit(&repo)
            .close(entry.id, Some(at("2025-11-22T11:00:00Z")))
            .await
            .unwrap_err();

        assert!(matches!(err, ParkingError::Consistency(_)));
        assert!(err.kind().is_server_error());
        let still = repo.find_entry(entry.id).await.unwrap().unwrap();
        assert!(still.is_active());
    }
}

#[cfg(test)]
mod occupancy_tests {
    use kernel::id::LotId;
    use std::sync::Arc;

    use super::fixtures::*;
    use crate::application::admit_vehicle::AdmitVehicleInput;
    use crate::application::occupancy::{CreateLotInput, LotOccupancy};
    use crate::domain::entities::LotUpdate;
    use crate::domain::value_objects::VehicleCategory;
    use crate::error::ParkingError;

    async fn park(repo: &Repo, plate: &str, driver_code: &str, lot_id: LotId) {
        institutional(repo, plate, driver_code, VehicleCategory::Car).await;
        admit(repo)
            .execute_at(
                AdmitVehicleInput {
                    plate: plate.into(),
                    operator_id: OPERATOR,
                    lot_id,
                },
                saturday(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_adjust_bounds() {
        let repo = repo();
        let lot = lot(&repo, (2, 1), (1, 0)).await;
        let occupancy = LotOccupancy::new(Arc::new(repo.clone()));

        let updated = occupancy
            .adjust(lot.id, VehicleCategory::Car, -1)
            .await
            .unwrap();
        assert_eq!(updated.car.available, 0);

        assert!(matches!(
            occupancy.adjust(lot.id, VehicleCategory::Car, -1).await,
            Err(ParkingError::NoSlotsAvailable(VehicleCategory::Car))
        ));
        assert!(matches!(
            occupancy.adjust(lot.id, VehicleCategory::Motorcycle, 2).await,
            Err(ParkingError::SlotsOverflow(VehicleCategory::Motorcycle))
        ));
        assert!(matches!(
            occupancy.adjust(LotId::new(77), VehicleCategory::Car, 1).await,
            Err(ParkingError::LotNotFound(_))
        ));
        assert!(matches!(
            occupancy.adjust(lot.id, VehicleCategory::Car, 0).await,
            Err(ParkingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_extreme_delta_is_a_bounds_error() {
        let repo = repo();
        let lot = lot(&repo, (5, 3), (0, 0)).await;
        let occupancy = LotOccupancy::new(Arc::new(repo.clone()));

        let err = occupancy
            .adjust(lot.id, VehicleCategory::Car, i32::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::SlotsOverflow(VehicleCategory::Car)));
        assert!(err.kind().is_client_error());

        let err = occupancy
            .adjust(lot.id, VehicleCategory::Car, i32::MIN)
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::NoSlotsAvailable(VehicleCategory::Car)));

        assert_eq!(occupancy.get(lot.id).await.unwrap().car.available, 3);
    }

    #[tokio::test]
    async fn test_update_lot_keeps_counters_consistent() {
        let repo = repo();
        let lot = lot(&repo, (10, 10), (4, 4)).await;
        park(&repo, "ABC123", "EMP-001", lot.id).await;
        park(&repo, "DEF456", "EMP-002", lot.id).await;
        let occupancy = LotOccupancy::new(Arc::new(repo.clone()));

        let renamed = occupancy
            .update(
                lot.id,
                LotUpdate {
                    name: Some("North gate annex".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "North gate annex");
        assert_eq!(renamed.car.available, 8);

        let shrunk = occupancy
            .update(
                lot.id,
                LotUpdate {
                    car_capacity: Some(8),
                    car_available: Some(6),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!((shrunk.car.capacity, shrunk.car.available), (8, 6));

        // Would free a slot still held by a parked car
        let err = occupancy
            .update(
                lot.id,
                LotUpdate {
                    car_available: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ParkingError::SlotsInUse {
                category: VehicleCategory::Car,
                active: 2
            }
        ));

        let err = occupancy
            .update(
                lot.id,
                LotUpdate {
                    car_capacity: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::Validation(_)));

        assert!(matches!(
            occupancy.update(lot.id, LotUpdate::default()).await,
            Err(ParkingError::Validation(_))
        ));
        assert!(matches!(
            occupancy
                .update(
                    LotId::new(77),
                    LotUpdate {
                        motorcycle_capacity: Some(2),
                        ..Default::default()
                    }
                )
                .await,
            Err(ParkingError::LotNotFound(_))
        ));

        let stored = occupancy.get(lot.id).await.unwrap();
        assert_eq!(stored.car, shrunk.car);
        assert_eq!(stored.motorcycle.capacity, 4);
    }

    #[tokio::test]
    async fn test_remove_lot() {
        let repo = repo();
        let empty = lot(&repo, (3, 3), (0, 0)).await;
        let used = lot(&repo, (3, 3), (0, 0)).await;
        park(&repo, "ABC123", "EMP-001", used.id).await;
        let occupancy = LotOccupancy::new(Arc::new(repo.clone()));

        occupancy.remove(empty.id).await.unwrap();
        assert!(matches!(
            occupancy.get(empty.id).await,
            Err(ParkingError::LotNotFound(_))
        ));
        assert!(matches!(
            occupancy.remove(empty.id).await,
            Err(ParkingError::LotNotFound(_))
        ));

        assert!(matches!(
            occupancy.remove(used.id).await,
            Err(ParkingError::LotInUse(_))
        ));

        // Closed history still pins the lot
        exit(&repo)
            .close_by_plate("ABC123", Some(at("2025-11-22T12:00:00Z")))
            .await
            .unwrap();
        assert!(matches!(
            occupancy.remove(used.id).await,
            Err(ParkingError::LotInUse(_))
        ));
        assert_eq!(occupancy.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_defaults_available_to_capacity() {
        let repo = repo();
        let occupancy = LotOccupancy::new(Arc::new(repo.clone()));

        let lot = occupancy
            .create(CreateLotInput {
                name: "South".into(),
                address: "Sports complex".into(),
                car_capacity: 40,
                car_available: None,
                motorcycle_capacity: 15,
                motorcycle_available: None,
            })
            .await
            .unwrap();
        assert_eq!(lot.car.available, 40);
        assert_eq!(lot.motorcycle.available, 15);

        let err = occupancy
            .create(CreateLotInput {
                name: "East".into(),
                address: "Library".into(),
                car_capacity: 5,
                car_available: Some(6),
                motorcycle_capacity: 0,
                motorcycle_available: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::Validation(_)));
        assert_eq!(occupancy.list().await.unwrap().len(), 1);
    }
}

#[cfg(test)]
mod visitor_tests {
    use chrono::Duration;
    use std::sync::Arc;

    use super::fixtures::*;
    use crate::application::registry::VehicleRegistryUseCase;
    use crate::domain::repository::{LotRepository, VehicleRepository, VisitorRepository};
    use crate::domain::value_objects::{NationalId, OwnerKind, Plate, VehicleCategory};
    use crate::error::ParkingError;

    #[tokio::test]
    async fn test_register_visitor_admits_vehicle() {
        let repo = repo();
        let lot = lot(&repo, (2, 2), (0, 0)).await;
        let now = saturday();

        let entry = onboard(&repo)
            .execute_at(visitor_input("xyz789", &lot, now + Duration::hours(4)), now)
            .await
            .unwrap();

        assert!(entry.is_active());
        assert_eq!(
            entry.visit_reason.as_deref(),
            Some("Thesis defense committee")
        );
        let vehicle = repo
            .find_vehicle(&Plate::parse("XYZ789").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vehicle.owner.kind(), OwnerKind::Visitor);
        assert_eq!(vehicle.owner.reference(), "1020304050");
        assert_eq!(repo.find_lot(lot.id).await.unwrap().unwrap().car.available, 1);
    }

    #[tokio::test]
    async fn test_expired_permit_is_rejected() {
        let repo = repo();
        let lot = lot(&repo, (2, 2), (0, 0)).await;
        let now = saturday();

        let err = onboard(&repo)
            .execute_at(visitor_input("XYZ789", &lot, now), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_restricted_visitor_is_rejected_before_storage() {
        let repo = repo();
        let lot = lot(&repo, (2, 2), (0, 0)).await;
        let now = monday_morning();

        let err = onboard(&repo)
            .execute_at(visitor_input("XYZ781", &lot, now + Duration::hours(2)), now)
            .await
            .unwrap_err();

        assert!(matches!(err, ParkingError::Restricted(_)));
        let id = NationalId::parse("1020304050").unwrap();
        assert!(repo.find_visitor(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_institutional_plate_conflicts() {
        let repo = repo();
        let lot = lot(&repo, (2, 2), (0, 0)).await;
        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;
        let now = saturday();

        let err = onboard(&repo)
            .execute_at(visitor_input("ABC123", &lot, now + Duration::hours(1)), now)
            .await
            .unwrap_err();

        assert!(matches!(err, ParkingError::PlateIsInstitutional(_)));
        let vehicle = repo
            .find_vehicle(&Plate::parse("ABC123").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(vehicle.is_institutional());
        assert_eq!(repo.find_lot(lot.id).await.unwrap().unwrap().car.available, 2);
    }

    #[tokio::test]
    async fn test_returning_visitor_updates_profile_and_keeps_descriptors() {
        let repo = repo();
        let lot = lot(&repo, (2, 2), (0, 0)).await;
        let now = saturday();
        let onboarding = onboard(&repo);

        let first = onboarding
            .execute_at(visitor_input("XYZ789", &lot, now + Duration::hours(4)), now)
            .await
            .unwrap();

        // Still parked: the plate conflicts
        let err = onboarding
            .execute_at(visitor_input("XYZ789", &lot, now + Duration::hours(4)), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::ActiveEntryExists(_)));

        exit(&repo)
            .close(first.id, Some(now + Duration::hours(1)))
            .await
            .unwrap();

        let later = now + Duration::hours(2);
        let mut input = visitor_input("XYZ789", &lot, later + Duration::hours(3));
        input.visitor.phone = "3005550199".into();
        input.vehicle.make = None;
        input.vehicle.color = Some("Blue".into());
        onboarding.execute_at(input, later).await.unwrap();

        let registry = VehicleRegistryUseCase::new(Arc::new(repo.clone()), Arc::new(repo.clone()));
        let profile = registry.find_visitor("1020304050").await.unwrap();
        assert_eq!(profile.phone, "3005550199");
        let vehicle = registry.find_vehicle("XYZ789").await.unwrap();
        assert_eq!(vehicle.make.as_deref(), Some("Kia"));
        assert_eq!(vehicle.color.as_deref(), Some("Blue"));
    }

    #[tokio::test]
    async fn test_category_change_while_parked_releases_original_pool() {
        let repo = repo();
        let lot = lot(&repo, (2, 2), (2, 1)).await;
        let now = saturday();
        let onboarding = onboard(&repo);

        let parked = onboarding
            .execute_at(visitor_input("XYZ789", &lot, now + Duration::hours(4)), now)
            .await
            .unwrap();
        assert_eq!(parked.category, VehicleCategory::Car);

        let mut as_motorcycle = visitor_input("XYZ789", &lot, now + Duration::hours(4));
        as_motorcycle.vehicle.category = VehicleCategory::Motorcycle;
        let err = onboarding.execute_at(as_motorcycle, now).await.unwrap_err();
        assert!(matches!(err, ParkingError::ActiveEntryExists(ref plate) if plate == "XYZ789"));

        exit(&repo)
            .close(parked.id, Some(now + Duration::hours(1)))
            .await
            .unwrap();
        let after = repo.find_lot(lot.id).await.unwrap().unwrap();
        assert_eq!(after.car.available, 2);
        assert_eq!(after.motorcycle.available, 1);

        // Removal of an ACTIVE entry follows the same pool
        let second = onboarding
            .execute_at(visitor_input("XYZ788", &lot, now + Duration::hours(4)), now)
            .await
            .unwrap();
        let mut as_motorcycle = visitor_input("XYZ788", &lot, now + Duration::hours(4));
        as_motorcycle.vehicle.category = VehicleCategory::Motorcycle;
        assert!(onboarding.execute_at(as_motorcycle, now).await.is_err());

        exit(&repo).remove(second.id).await.unwrap();
        let after = repo.find_lot(lot.id).await.unwrap().unwrap();
        assert_eq!(after.car.available, 2);
        assert_eq!(after.motorcycle.available, 1);
    }

    #[tokio::test]
    async fn test_malformed_visitor_input() {
        let repo = repo();
        let lot = lot(&repo, (2, 2), (0, 0)).await;
        let now = saturday();

        let mut input = visitor_input("XYZ789", &lot, now + Duration::hours(1));
        input.visitor.national_id = "12AB".into();
        assert!(matches!(
            onboard(&repo).execute_at(input, now).await,
            Err(ParkingError::Validation(_))
        ));

        let mut input = visitor_input("XYZ789", &lot, now + Duration::hours(1));
        input.visit_reason = "hi".into();
        assert!(matches!(
            onboard(&repo).execute_at(input, now).await,
            Err(ParkingError::Validation(_))
        ));
    }
}

#[cfg(test)]
mod query_tests {
    use std::sync::Arc;

    use super::fixtures::*;
    use crate::application::admit_vehicle::AdmitVehicleInput;
    use crate::application::query_entries::EntryQueryUseCase;
    use crate::domain::entities::EntryFilter;
    use crate::domain::value_objects::{EntryState, Plate, VehicleCategory};
    use chrono::Duration;

    #[tokio::test]
    async fn test_listing_and_active_split() {
        let repo = repo();
        let lot = lot(&repo, (5, 5), (5, 5)).await;
        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;
        institutional(&repo, "DEF456", "EMP-002", VehicleCategory::Car).await;

        let admit = admit(&repo);
        let first = admit
            .execute_at(
                AdmitVehicleInput {
                    plate: "ABC123".into(),
                    operator_id: OPERATOR,
                    lot_id: lot.id,
                },
                saturday(),
            )
            .await
            .unwrap();
        admit
            .execute_at(
                AdmitVehicleInput {
                    plate: "DEF456".into(),
                    operator_id: OPERATOR,
                    lot_id: lot.id,
                },
                saturday() + Duration::minutes(5),
            )
            .await
            .unwrap();
        onboard(&repo)
            .execute_at(
                visitor_input("XYZ789", &lot, saturday() + Duration::hours(5)),
                saturday() + Duration::minutes(10),
            )
            .await
            .unwrap();
        exit(&repo)
            .close(first.id, Some(saturday() + Duration::minutes(30)))
            .await
            .unwrap();

        let queries = EntryQueryUseCase::new(Arc::new(repo.clone()));

        let all = queries.list(&EntryFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].plate.as_str(), "XYZ789", "newest first");

        let closed = queries
            .list(&EntryFilter {
                state: Some(EntryState::Closed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(closed.len(), 1);

        let by_plate = queries
            .list(&EntryFilter {
                plate: Some(Plate::parse("DEF456").unwrap()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_plate.len(), 1);

        let active = queries.active().await.unwrap();
        assert_eq!(active.institutional.len(), 1);
        assert_eq!(active.visitor.len(), 1);
        assert_eq!(active.total(), 2);

        assert_eq!(queries.get(first.id).await.unwrap().state, EntryState::Closed);
    }
}

#[cfg(test)]
mod report_tests {
    use chrono::{Duration, FixedOffset, NaiveDate};
    use std::sync::Arc;

    use super::fixtures::*;
    use crate::application::admit_vehicle::AdmitVehicleInput;
    use crate::application::traffic_report::{TrafficPeriod, TrafficReportUseCase};
    use crate::domain::entities::TrafficCount;
    use crate::domain::value_objects::VehicleCategory;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_counts_per_period_and_category() {
        let repo = repo();
        let lot = lot(&repo, (5, 5), (5, 5)).await;
        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;
        institutional(&repo, "MOT45D", "EMP-002", VehicleCategory::Motorcycle).await;

        let admit = admit(&repo);
        let car = admit
            .execute_at(
                AdmitVehicleInput {
                    plate: "ABC123".into(),
                    operator_id: OPERATOR,
                    lot_id: lot.id,
                },
                saturday(),
            )
            .await
            .unwrap();
        exit(&repo)
            .close(car.id, Some(saturday() + Duration::hours(2)))
            .await
            .unwrap();
        admit
            .execute_at(
                AdmitVehicleInput {
                    plate: "MOT45D".into(),
                    operator_id: OPERATOR,
                    lot_id: lot.id,
                },
                saturday() + Duration::days(1),
            )
            .await
            .unwrap();

        let reports = TrafficReportUseCase::new(
            Arc::new(repo.clone()),
            FixedOffset::east_opt(0).unwrap(),
        );

        let saturday_cars = reports
            .execute(
                TrafficPeriod::Day(date("2025-11-22")),
                Some(VehicleCategory::Car),
            )
            .await
            .unwrap();
        assert_eq!(
            saturday_cars.count,
            TrafficCount {
                entries: 1,
                exits: 1
            }
        );

        let sunday_motorcycles = reports
            .execute(
                TrafficPeriod::Day(date("2025-11-23")),
                Some(VehicleCategory::Motorcycle),
            )
            .await
            .unwrap();
        assert_eq!(
            sunday_motorcycles.count,
            TrafficCount {
                entries: 1,
                exits: 0
            }
        );

        let weekend = reports
            .execute(
                TrafficPeriod::Range {
                    from: date("2025-11-22"),
                    to: date("2025-11-23"),
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            weekend.count,
            TrafficCount {
                entries: 2,
                exits: 1
            }
        );

        let november = reports
            .execute(
                TrafficPeriod::Month {
                    year: 2025,
                    month: 11,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(november.from, date("2025-11-01"));
        assert_eq!(november.to, date("2025-11-30"));
        assert_eq!(november.count.entries, 2);

        let december = reports
            .execute(
                TrafficPeriod::Month {
                    year: 2025,
                    month: 12,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(december.count, TrafficCount::default());
    }

    #[tokio::test]
    async fn test_day_boundaries_follow_offset() {
        let repo = repo();
        let lot = lot(&repo, (5, 5), (0, 0)).await;
        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;

        // 02:00Z Sunday is still Saturday evening in UTC-5
        admit(&repo)
            .execute_at(
                AdmitVehicleInput {
                    plate: "ABC123".into(),
                    operator_id: OPERATOR,
                    lot_id: lot.id,
                },
                at("2025-11-23T02:00:00Z"),
            )
            .await
            .unwrap();

        let reports = TrafficReportUseCase::new(
            Arc::new(repo.clone()),
            FixedOffset::west_opt(5 * 3600).unwrap(),
        );
        let local_saturday = reports
            .execute(TrafficPeriod::Day(date("2025-11-22")), None)
            .await
            .unwrap();
        assert_eq!(local_saturday.count.entries, 1);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use std::sync::Arc;
    use tokio::task::JoinSet;

    use super::fixtures::*;
    use crate::application::admit_vehicle::AdmitVehicleInput;
    use crate::domain::entities::EntryFilter;
    use crate::domain::repository::{EntryRepository, LotRepository};
    use crate::domain::value_objects::{EntryState, VehicleCategory};
    use crate::error::ParkingError;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_slot_goes_to_exactly_one_vehicle() {
        let repo = repo();
        let lot = lot(&repo, (1, 1), (0, 0)).await;
        for i in 0..8 {
            institutional(
                &repo,
                &format!("CAR{i:02}5"),
                &format!("EMP-{i}"),
                VehicleCategory::Car,
            )
            .await;
        }

        let use_case = Arc::new(admit(&repo));
        let mut tasks = JoinSet::new();
        for i in 0..8 {
            let use_case = use_case.clone();
            let lot_id = lot.id;
            tasks.spawn(async move {
                use_case
                    .execute_at(
                        AdmitVehicleInput {
                            plate: format!("CAR{i:02}5"),
                            operator_id: OPERATOR,
                            lot_id,
                        },
                        saturday(),
                    )
                    .await
            });
        }

        let mut admitted = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(_) => admitted += 1,
                Err(ParkingError::NoSlotsAvailable(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(admitted, 1);
        let lot = repo.find_lot(lot.id).await.unwrap().unwrap();
        assert_eq!(lot.car.available, 0);
        let active = repo
            .list_entries(&EntryFilter {
                state: Some(EntryState::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_plate_is_admitted_once() {
        let repo = repo();
        let lot = lot(&repo, (10, 10), (0, 0)).await;
        institutional(&repo, "ABC123", "EMP-001", VehicleCategory::Car).await;

        let use_case = Arc::new(admit(&repo));
        let mut tasks = JoinSet::new();
        for _ in 0..8 {
            let use_case = use_case.clone();
            let lot_id = lot.id;
            tasks.spawn(async move {
                use_case
                    .execute_at(
                        AdmitVehicleInput {
                            plate: "ABC123".into(),
                            operator_id: OPERATOR,
                            lot_id,
                        },
                        saturday(),
                    )
                    .await
            });
        }

        let mut admitted = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(_) => admitted += 1,
                Err(err) => assert_eq!(err.kind(), crate::ErrorKind::Conflict, "{err}"),
            }
        }

        assert_eq!(admitted, 1);
        let lot = repo.find_lot(lot.id).await.unwrap().unwrap();
        assert_eq!(lot.car.available, 9);
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use kernel::error::app_error::AppError;
    use kernel::id::{EntryId, LotId, UserId};

    use super::fixtures::monday_morning;
    use crate::domain::restriction::RestrictionCalendar;
    use crate::domain::value_objects::VehicleCategory;
    use crate::error::*;

    #[test]
    fn test_error_into_response_status_codes() {
        let test_cases: Vec<(ParkingError, StatusCode)> = vec![
            (ParkingError::VehicleNotFound("ABC123".into()), StatusCode::NOT_FOUND),
            (ParkingError::OperatorNotFound(UserId::new(1)), StatusCode::NOT_FOUND),
            (ParkingError::LotNotFound(LotId::new(1)), StatusCode::NOT_FOUND),
            (ParkingError::EntryNotFound(EntryId::new(1)), StatusCode::NOT_FOUND),
            (ParkingError::NoActiveEntry("ABC123".into()), StatusCode::NOT_FOUND),
            (
                ParkingError::NoSlotsAvailable(VehicleCategory::Car),
                StatusCode::BAD_REQUEST,
            ),
            (
                ParkingError::SlotsOverflow(VehicleCategory::Motorcycle),
                StatusCode::BAD_REQUEST,
            ),
            (ParkingError::ActiveEntryExists("ABC123".into()), StatusCode::CONFLICT),
            (
                ParkingError::OwnerAlreadyParked {
                    owner: "EMP-001".into(),
                    lot_id: LotId::new(1),
                },
                StatusCode::CONFLICT,
            ),
            (ParkingError::PlateIsInstitutional("ABC123".into()), StatusCode::CONFLICT),
            (ParkingError::EntryAlreadyClosed(EntryId::new(1)), StatusCode::CONFLICT),
            (ParkingError::LotInUse(LotId::new(1)), StatusCode::CONFLICT),
            (
                ParkingError::SlotsInUse {
                    category: VehicleCategory::Car,
                    active: 3,
                },
                StatusCode::CONFLICT,
            ),
            (ParkingError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                ParkingError::Consistency("test".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ParkingError::Internal("test".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ParkingError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, expected_status) in test_cases {
            assert_eq!(error.status_code(), expected_status, "{error}");
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);
        }
    }

    #[test]
    fn test_restriction_error_carries_verdict() {
        let verdict = RestrictionCalendar::default().evaluate("ABC121", monday_morning());
        let err = ParkingError::Restricted(Box::new(verdict));

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("restricted"));

        let app_err = err.to_app_error();
        let details = app_err.details().unwrap();
        assert_eq!(details["restrictedDigits"], serde_json::json!([1, 2]));
        assert_eq!(details["weekday"], "Monday");
        assert!(app_err.action().is_some());
    }

    #[test]
    fn test_database_message_is_not_leaked() {
        let err = ParkingError::Database(sqlx::Error::Protocol("relation lots_v2 missing".into()));
        let app_err = err.to_app_error();
        assert_eq!(app_err.message(), "Database error");
        assert!(!app_err.to_string().contains("lots_v2"));
    }

    /// Postgres error carrying only a SQLSTATE
    #[derive(Debug)]
    struct PgState(&'static str);

    impl std::fmt::Display for PgState {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "sqlstate {}", self.0)
        }
    }

    impl std::error::Error for PgState {}

    impl sqlx::error::DatabaseError for PgState {
        fn message(&self) -> &str {
            "statement failed"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.0.into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    #[test]
    fn test_constraint_violations_use_kernel_statuses() {
        let cases = [
            ("23514", StatusCode::BAD_REQUEST, "Check constraint violation"),
            ("23503", StatusCode::CONFLICT, "Foreign key violation"),
            ("23505", StatusCode::CONFLICT, "Duplicate key value"),
            ("22003", StatusCode::BAD_REQUEST, "Value out of range"),
        ];
        for (code, status, message) in cases {
            let err = ParkingError::Database(sqlx::Error::Database(Box::new(PgState(code))));
            assert_eq!(err.status_code(), status, "sqlstate {code}");

            let app_err = err.to_app_error();
            assert_eq!(app_err.message(), message);

            let kernel_err: AppError = sqlx::Error::Database(Box::new(PgState(code))).into();
            assert_eq!(kernel_err.kind(), app_err.kind());
        }
    }
}

#[cfg(test)]
mod models_tests {
    use crate::domain::value_objects::VehicleCategory;
    use crate::presentation::dto::*;
    use crate::application::traffic_report::TrafficPeriod;

    #[test]
    fn test_admit_request_deserialization() {
        let json = r#"{"plate":"ABC123","operatorId":7,"lotId":2}"#;
        let request: AdmitRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.plate, "ABC123");
        assert_eq!(request.operator_id.value(), 7);
        assert_eq!(request.lot_id.value(), 2);
    }

    #[test]
    fn test_visitor_request_deserialization() {
        let json = r#"{
            "visitor": {"nationalId":"1020304050","firstName":"Laura","lastName":"Gomez","phone":"3105550101"},
            "vehicle": {"plate":"XYZ789","category":"CAR","permitExpiresAt":"2025-11-22T18:00:00Z"},
            "lotId": 1,
            "operatorId": 1,
            "visitReason": "Conference"
        }"#;
        let request: RegisterVisitorRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.vehicle.category, VehicleCategory::Car);
        assert!(request.visitor.email.is_none());
        assert!(request.vehicle.make.is_none());
    }

    #[test]
    fn test_entry_list_query_filter() {
        let query = EntryListQuery {
            state: Some("active".into()),
            plate: Some("abc123".into()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.plate.unwrap().as_str(), "ABC123");
        assert!(filter.state.is_some());

        let bad = EntryListQuery {
            state: Some("parked".into()),
            ..Default::default()
        };
        assert!(bad.into_filter().is_err());
    }

    #[test]
    fn test_traffic_query_period_selection() {
        let day = TrafficQuery {
            day: Some("2025-11-17".parse().unwrap()),
            ..Default::default()
        };
        assert!(matches!(day.period().unwrap(), TrafficPeriod::Day(_)));

        let month = TrafficQuery {
            year: Some(2025),
            month: Some(11),
            category: Some("motorcycle".into()),
            ..Default::default()
        };
        assert!(matches!(month.period().unwrap(), TrafficPeriod::Month { .. }));
        assert_eq!(month.category().unwrap(), Some(VehicleCategory::Motorcycle));

        let ambiguous = TrafficQuery {
            day: Some("2025-11-17".parse().unwrap()),
            year: Some(2025),
            month: Some(11),
            ..Default::default()
        };
        assert!(ambiguous.period().is_err());
        assert!(TrafficQuery::default().period().is_err());
    }
}

#[cfg(test)]
mod router_tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Datelike, Duration, Utc};
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use super::fixtures::*;
    use crate::application::config::ParkingConfig;
    use crate::domain::restriction::RestrictionSchedule;
    use crate::presentation::router::parking_router_generic;

    fn app(repo: &Repo) -> Router {
        parking_router_generic(repo.clone(), ParkingConfig::default())
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// A plate digit free of restriction today and tomorrow (UTC)
    fn unrestricted_digit() -> u8 {
        let today = Utc::now();
        let tomorrow = today + Duration::days(1);
        (0..=9)
            .find(|d| {
                !RestrictionSchedule::STANDARD
                    .digits_for(today.weekday())
                    .contains(d)
                    && !RestrictionSchedule::STANDARD
                        .digits_for(tomorrow.weekday())
                        .contains(d)
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_check_restriction_endpoint() {
        let repo = repo();
        let app = app(&repo);

        let (status, body) = send(
            &app,
            "POST",
            "/pico-placa/check",
            Some(json!({ "plate": "ABC121", "at": "2025-11-17T14:00:00Z" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hasRestriction"], true);
        assert_eq!(body["lastDigit"], 1);
        assert_eq!(body["restrictedDigits"], json!([1, 2]));

        let (status, body) = send(
            &app,
            "POST",
            "/pico-placa/check",
            Some(json!({ "plate": "NOT-A-PLATE" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_admission_flow_over_http() {
        let repo = repo();
        let app = app(&repo);
        let plate = format!("ABC12{}", unrestricted_digit());

        let (status, lot) = send(
            &app,
            "POST",
            "/lots",
            Some(json!({
                "name": "North gate",
                "address": "Campus north",
                "carCapacity": 2,
                "motorcycleCapacity": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let lot_id = lot["id"].as_i64().unwrap();
        assert_eq!(lot["car"]["available"], 2);

        let (status, _) = send(
            &app,
            "POST",
            "/vehicles",
            Some(json!({ "plate": plate, "category": "CAR", "driverCode": "EMP-001" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let admit_body = json!({ "plate": plate, "operatorId": OPERATOR.value(), "lotId": lot_id });
        let (status, entry) = send(&app, "POST", "/entries", Some(admit_body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["state"], "ACTIVE");
        assert_eq!(entry["category"], "CAR");

        let (status, _) = send(&app, "POST", "/entries", Some(admit_body)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, lot) = send(&app, "GET", &format!("/lots/{lot_id}"), None).await;
        assert_eq!(lot["car"]["available"], 1);

        let (status, active) = send(&app, "GET", "/entries/active", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(active["total"], 1);
        assert_eq!(active["institutional"].as_array().unwrap().len(), 1);

        let (status, closed) = send(
            &app,
            "PATCH",
            &format!("/entries/plate/{plate}/exit"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(closed["state"], "CLOSED");

        let (_, lot) = send(&app, "GET", &format!("/lots/{lot_id}"), None).await;
        assert_eq!(lot["car"]["available"], 2);

        let (status, entries) = send(&app, "GET", "/entries?state=CLOSED", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entries.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_full_lot_over_http() {
        let repo = repo();
        let app = app(&repo);
        lot(&repo, (1, 0), (0, 0)).await;
        institutional(&repo, "ABC121", "EMP-001", crate::domain::value_objects::VehicleCategory::Car).await;

        let (status, body) = send(
            &app,
            "POST",
            "/entries",
            Some(json!({ "plate": "ABC121", "operatorId": OPERATOR.value(), "lotId": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("CAR"));
    }

    #[tokio::test]
    async fn test_lot_edit_and_delete_over_http() {
        let repo = repo();
        let app = app(&repo);
        let lot = lot(&repo, (4, 4), (2, 2)).await;
        let uri = format!("/lots/{}", lot.id.value());

        let (status, body) = send(
            &app,
            "PATCH",
            &uri,
            Some(json!({ "carCapacity": 6, "carAvailable": 6, "address": "Campus north, gate B" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["car"]["capacity"], 6);
        assert_eq!(body["address"], "Campus north, gate B");

        let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "motorcycleAvailable": 3 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_not_found_routes() {
        let repo = repo();
        let app = app(&repo);

        let (status, _) = send(&app, "GET", "/lots/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", "/entries/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/vehicles/ZZZ999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/visitors/1020304050", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traffic_report_endpoint() {
        let repo = repo();
        let app = app(&repo);

        let (status, body) = send(&app, "GET", "/reports/traffic?year=2025&month=11&category=CAR", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"], 0);
        assert_eq!(body["from"], "2025-11-01");
        assert_eq!(body["to"], "2025-11-30");

        let (status, _) = send(&app, "GET", "/reports/traffic", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
