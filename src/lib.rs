//! Terminal client for a retail outlet backend.
//!
//! Two independent views share one injected transport:
//! - [`map_view::OutletMapView`] fetches every outlet once and draws a marker
//!   plus a fixed-radius catchment circle for each.
//! - [`query_panel::QueryRelayPanel`] relays free-text queries to the backend
//!   and shows the single stored answer.

pub mod api;
pub mod app;
pub mod config;
pub mod handler;
pub mod map_view;
pub mod model;
pub mod query_panel;
pub mod status;
pub mod task;
pub mod tui;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError, Backend};
pub use config::{Config, Settings};
pub use map_view::OutletMapView;
pub use model::{GeoPoint, Outlet, StoredAnswer};
pub use query_panel::{QueryInputForm, QueryRelayPanel};
pub use status::LoadStatus;
