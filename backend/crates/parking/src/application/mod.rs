//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod admit_vehicle;
pub mod check_restriction;
pub mod close_entry;
pub mod config;
pub mod occupancy;
pub mod query_entries;
pub mod register_visitor;
pub mod registry;
pub mod traffic_report;
