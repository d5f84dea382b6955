//! Parking Router

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::application::config::ParkingConfig;
use crate::domain::repository::ParkingStore;
use crate::infra::postgres::PgParkingRepository;
use crate::presentation::handlers::{self, ParkingAppState};

/// Create the parking router with PostgreSQL repository
pub fn parking_router(repo: PgParkingRepository, config: ParkingConfig) -> Router {
    parking_router_generic(repo, config)
}

/// Create a generic parking router for any repository implementation
pub fn parking_router_generic<R>(repo: R, config: ParkingConfig) -> Router
where
    R: ParkingStore,
{
    let state = ParkingAppState::new(repo, config);

    Router::new()
        .route("/pico-placa/check", post(handlers::check_restriction::<R>))
        .route(
            "/lots",
            get(handlers::list_lots::<R>).post(handlers::create_lot::<R>),
        )
        .route(
            "/lots/{lot_id}",
            get(handlers::get_lot::<R>)
                .patch(handlers::update_lot::<R>)
                .delete(handlers::remove_lot::<R>),
        )
        .route("/lots/{lot_id}/slots", patch(handlers::adjust_slots::<R>))
        .route("/vehicles", post(handlers::register_vehicle::<R>))
        .route("/vehicles/{plate}", get(handlers::get_vehicle::<R>))
        .route("/visitors/entries", post(handlers::register_visitor::<R>))
        .route("/visitors/{national_id}", get(handlers::get_visitor::<R>))
        .route(
            "/entries",
            get(handlers::list_entries::<R>).post(handlers::admit_vehicle::<R>),
        )
        .route("/entries/active", get(handlers::active_entries::<R>))
        .route(
            "/entries/{entry_id}",
            get(handlers::get_entry::<R>).delete(handlers::remove_entry::<R>),
        )
        .route("/entries/{entry_id}/exit", patch(handlers::close_entry::<R>))
        .route(
            "/entries/plate/{plate}/exit",
            patch(handlers::close_entry_by_plate::<R>),
        )
        .route("/reports/traffic", get(handlers::traffic_report::<R>))
        .with_state(state)
}
