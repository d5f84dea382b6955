//! Parking Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, restriction calendar, repository traits
//! - `application/` - Use cases (admission, exit, visitor onboarding, reports)
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - HTTP handlers
//!
//! ## Consistency Model
//! - Slot counters stay within `0..=capacity` per category; every change is a
//!   conditional update, never a read-then-write
//! - At most one ACTIVE entry per plate, enforced by the store
//! - Opening or closing an entry and moving its slot counter commit together

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::ParkingConfig;
pub use domain::restriction::{RestrictionCalendar, RestrictionVerdict};
pub use error::{ParkingError, ParkingResult};
pub use infra::memory::InMemoryParkingRepository;
pub use infra::postgres::PgParkingRepository;
pub use presentation::router::{parking_router, parking_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{app_error::AppError, kind::ErrorKind};

#[cfg(test)]
mod tests;
