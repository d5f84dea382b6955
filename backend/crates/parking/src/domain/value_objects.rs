//! Domain Value Objects
//!
//! Immutable value types for the parking domain. Constructors validate and
//! normalize, so any instance reaching a repository is well formed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ParkingError, ParkingResult};

/// Vehicle plate, trimmed and upper-cased
///
/// Accepts 3..=20 ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Plate(String);

impl Plate {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 20;

    pub fn parse(raw: &str) -> ParkingResult<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        let len = normalized.len();
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&len) {
            return Err(ParkingError::validation(format!(
                "plate must be between {} and {} characters",
                Self::MIN_LEN,
                Self::MAX_LEN
            )));
        }
        if !normalized.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ParkingError::validation(
                "plate may only contain letters and digits",
            ));
        }
        Ok(Self(normalized))
    }

    /// National car format: three letters, two digits, one letter or digit
    pub fn parse_national(raw: &str) -> ParkingResult<Self> {
        let plate = Self::parse(raw)?;
        if !plate.is_national_format() {
            return Err(ParkingError::validation(
                "plate must follow the AAA123 / AAA12B format",
            ));
        }
        Ok(plate)
    }

    pub fn is_national_format(&self) -> bool {
        let b = self.0.as_bytes();
        b.len() == 6
            && b[..3].iter().all(u8::is_ascii_uppercase)
            && b[3..5].iter().all(u8::is_ascii_digit)
            && b[5].is_ascii_alphanumeric()
    }

    /// Last character as a digit, `0` when it is a letter
    pub fn last_digit(&self) -> u8 {
        last_digit_of(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Rebuild from a stored value without validation
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }
}

/// Digit used by the restriction schedule
pub fn last_digit_of(plate: &str) -> u8 {
    plate
        .trim()
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
        .unwrap_or(0)
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Plate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleCategory {
    Car,
    Motorcycle,
}

impl VehicleCategory {
    pub const ALL: [VehicleCategory; 2] = [VehicleCategory::Car, VehicleCategory::Motorcycle];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            VehicleCategory::Car => "CAR",
            VehicleCategory::Motorcycle => "MOTORCYCLE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "CAR" => Some(VehicleCategory::Car),
            "MOTORCYCLE" => Some(VehicleCategory::Motorcycle),
            _ => None,
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerKind {
    Institutional,
    Visitor,
}

impl OwnerKind {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            OwnerKind::Institutional => "INSTITUTIONAL",
            OwnerKind::Visitor => "VISITOR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "INSTITUTIONAL" => Some(OwnerKind::Institutional),
            "VISITOR" => Some(OwnerKind::Visitor),
            _ => None,
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Visitor national identity number (cedula): 6..=20 digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NationalId(String);

impl NationalId {
    pub fn parse(raw: &str) -> ParkingResult<Self> {
        let value = raw.trim();
        if !(6..=20).contains(&value.len()) || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParkingError::validation(
                "national id must be 6 to 20 digits",
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Staff or student code of an institutional driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DriverCode(String);

impl DriverCode {
    pub const MAX_LEN: usize = 50;

    pub fn parse(raw: &str) -> ParkingResult<Self> {
        let value = raw.trim();
        if value.is_empty() || value.chars().count() > Self::MAX_LEN {
            return Err(ParkingError::validation(format!(
                "driver code must be 1 to {} characters",
                Self::MAX_LEN
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }
}

/// Who a vehicle belongs to. Every vehicle has exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    Institutional(DriverCode),
    Visitor(NationalId),
}

impl Owner {
    pub fn kind(&self) -> OwnerKind {
        match self {
            Owner::Institutional(_) => OwnerKind::Institutional,
            Owner::Visitor(_) => OwnerKind::Visitor,
        }
    }

    /// Identifier of the owner within its kind
    pub fn reference(&self) -> &str {
        match self {
            Owner::Institutional(code) => code.as_str(),
            Owner::Visitor(id) => id.as_str(),
        }
    }

    pub(crate) fn from_stored(kind: &str, reference: String) -> Option<Self> {
        match OwnerKind::from_code(kind)? {
            OwnerKind::Institutional => Some(Owner::Institutional(DriverCode::from_stored(reference))),
            OwnerKind::Visitor => Some(Owner::Visitor(NationalId::from_stored(reference))),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.reference())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryState {
    Active,
    Closed,
}

impl EntryState {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            EntryState::Active => "ACTIVE",
            EntryState::Closed => "CLOSED",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(EntryState::Active),
            "CLOSED" => Some(EntryState::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
