//! Parking Error Types
//!
//! Parking-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::classify_sqlx_error, kind::ErrorKind};
use kernel::id::{EntryId, LotId, UserId};
use thiserror::Error;

use crate::domain::restriction::RestrictionVerdict;
use crate::domain::value_objects::VehicleCategory;

/// Parking-specific result type alias
pub type ParkingResult<T> = Result<T, ParkingError>;

/// Parking-specific error variants
#[derive(Debug, Error)]
pub enum ParkingError {
    // ------------------------------------------------------------------
    // Not found
    // ------------------------------------------------------------------
    #[error("Vehicle {0} not found")]
    VehicleNotFound(String),

    #[error("User {0} not found")]
    OperatorNotFound(UserId),

    #[error("Lot {0} not found")]
    LotNotFound(LotId),

    #[error("Entry {0} not found")]
    EntryNotFound(EntryId),

    #[error("Visitor {0} not found")]
    VisitorNotFound(String),

    #[error("No active entry for plate {0}")]
    NoActiveEntry(String),

    // ------------------------------------------------------------------
    // Capacity
    // ------------------------------------------------------------------
    /// Lot has no free slot for the category
    #[error("No slots available for {0}")]
    NoSlotsAvailable(VehicleCategory),

    /// Releasing a slot would push the counter above the lot capacity
    #[error("Available slots for {0} would exceed lot capacity")]
    SlotsOverflow(VehicleCategory),

    // ------------------------------------------------------------------
    // Conflicts
    // ------------------------------------------------------------------
    #[error("Vehicle {0} already has an active entry")]
    ActiveEntryExists(String),

    #[error("Owner {owner} already has an active entry at lot {lot_id}")]
    OwnerAlreadyParked { owner: String, lot_id: LotId },

    #[error("Plate {0} already registered as institutional vehicle")]
    PlateIsInstitutional(String),

    #[error("Vehicle {0} is already registered")]
    VehicleAlreadyRegistered(String),

    #[error("Entry {0} already closed")]
    EntryAlreadyClosed(EntryId),

    /// Entry records still reference the lot
    #[error("Lot {0} still has entry records")]
    LotInUse(LotId),

    /// A capacity edit would leave fewer occupied slots than parked vehicles
    #[error("{category} slots cannot drop below the {active} vehicles parked")]
    SlotsInUse {
        category: VehicleCategory,
        active: i64,
    },

    // ------------------------------------------------------------------
    // Business rules / input
    // ------------------------------------------------------------------
    /// Pico y placa applies to the plate right now
    #[error("{}", .0.message)]
    Restricted(Box<RestrictionVerdict>),

    #[error("Validation failed: {0}")]
    Validation(String),

    // ------------------------------------------------------------------
    // Fatal
    // ------------------------------------------------------------------
    /// Entry state and lot counters disagree
    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParkingError {
    /// Shorthand for [`ParkingError::Validation`]
    pub fn validation(message: impl Into<String>) -> Self {
        ParkingError::Validation(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        use ParkingError::*;
        match self {
            VehicleNotFound(_)
            | OperatorNotFound(_)
            | LotNotFound(_)
            | EntryNotFound(_)
            | VisitorNotFound(_)
            | NoActiveEntry(_) => ErrorKind::NotFound,
            NoSlotsAvailable(_) | SlotsOverflow(_) => ErrorKind::BadRequest,
            ActiveEntryExists(_)
            | OwnerAlreadyParked { .. }
            | PlateIsInstitutional(_)
            | VehicleAlreadyRegistered(_)
            | EntryAlreadyClosed(_)
            | LotInUse(_)
            | SlotsInUse { .. } => ErrorKind::Conflict,
            Restricted(_) | Validation(_) => ErrorKind::BadRequest,
            Database(e) => classify_sqlx_error(e).0,
            Consistency(_) | Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError, carrying the verdict for restriction rejections
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            ParkingError::Restricted(verdict) => err
                .with_action("Admit the vehicle outside the restricted hours")
                .with_details(serde_json::to_value(verdict.as_ref()).unwrap_or_default()),
            ParkingError::NoSlotsAvailable(category) => err
                .with_action("Try another lot")
                .with_details(serde_json::json!({ "category": category })),
            ParkingError::Database(e) => {
                let (kind, message) = classify_sqlx_error(e);
                AppError::new(kind, message)
            }
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            ParkingError::Database(e) => {
                tracing::error!(error = %e, "Parking database error");
            }
            ParkingError::Consistency(msg) => {
                tracing::error!(message = %msg, "Parking consistency error");
            }
            ParkingError::Internal(msg) => {
                tracing::error!(message = %msg, "Parking internal error");
            }
            ParkingError::Restricted(verdict) => {
                tracing::warn!(
                    plate = %verdict.plate,
                    last_digit = verdict.last_digit,
                    "Admission rejected by pico y placa"
                );
            }
            ParkingError::NoSlotsAvailable(category) => {
                tracing::warn!(category = %category, "Lot full");
            }
            _ => {
                tracing::debug!(error = %self, "Parking error");
            }
        }
    }
}

impl From<ParkingError> for AppError {
    fn from(err: ParkingError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for ParkingError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
