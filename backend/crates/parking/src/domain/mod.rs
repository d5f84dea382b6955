//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Lot, Vehicle, EntryRecord, VisitorProfile)
//! - Domain value objects (Plate, VehicleCategory, Owner, EntryState)
//! - The pico y placa restriction calendar
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod restriction;
pub mod value_objects;
