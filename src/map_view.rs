//! Outlet map: one fetch on mount, then a marker and a catchment circle per outlet.

use std::sync::Arc;

use crate::api::{ApiError, Backend};
use crate::model::{GeoPoint, Outlet};
use crate::status::LoadStatus;
use crate::task::TaskSlot;
use crate::tui::{AppEvent, EventSender};

/// Kuala Lumpur city centre, used when the backend returns no outlets.
pub const FALLBACK_CENTER: GeoPoint = GeoPoint::new(3.139, 101.6869);
pub const DEFAULT_ZOOM: u8 = 11;
pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 18;
pub const CATCHMENT_RADIUS_M: f64 = 5000.0;
pub const LOAD_ERROR_MESSAGE: &str = "Failed to fetch outlets data";

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;
/// Horizontal extent of the view, in slippy-map tiles.
const VIEW_TILES: f64 = 4.0;
const MAX_LATITUDE: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: GeoPoint,
    pub zoom: u8,
}

impl Viewport {
    /// Centred on the first outlet in list order, not on a centroid.
    pub fn initial(outlets: &[Outlet]) -> Self {
        Self {
            center: outlets.first().map(Outlet::position).unwrap_or(FALLBACK_CENTER),
            zoom: DEFAULT_ZOOM,
        }
    }

    /// Width of the view in degrees of longitude.
    pub fn lon_span(&self) -> f64 {
        360.0 / 2f64.powi(self.zoom as i32) * VIEW_TILES
    }

    /// Canvas `(x_bounds, y_bounds)` in (longitude, latitude) degrees for an
    /// area of `width` x `height` terminal cells.
    pub fn bounds(&self, width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
        let half_lon = self.lon_span() / 2.0;
        // Terminal cells are roughly twice as tall as they are wide.
        let aspect = if width == 0 {
            1.0
        } else {
            (height as f64 * 2.0) / width as f64
        };
        let shrink = self.center.latitude.to_radians().cos().abs().max(0.01);
        let half_lat = half_lon * aspect * shrink;

        (
            [self.center.longitude - half_lon, self.center.longitude + half_lon],
            [self.center.latitude - half_lat, self.center.latitude + half_lat],
        )
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
    }

    /// Move by a quarter of the view per step.
    pub fn pan(&mut self, east_steps: f64, north_steps: f64) {
        let step = self.lon_span() / 4.0;
        let longitude = self.center.longitude + east_steps * step;
        self.center.longitude = (longitude + 180.0).rem_euclid(360.0) - 180.0;
        self.center.latitude =
            (self.center.latitude + north_steps * step).clamp(-MAX_LATITUDE, MAX_LATITUDE);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutletMarker<'a> {
    pub key: i64,
    pub position: GeoPoint,
    pub outlet: &'a Outlet,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatchmentCircle {
    pub key: i64,
    pub center: GeoPoint,
    pub radius_m: f64,
}

impl CatchmentCircle {
    /// North-south radius in degrees of latitude.
    pub fn radius_degrees(&self) -> f64 {
        self.radius_m / METERS_PER_DEGREE_LAT
    }

    /// East-west radius in degrees of longitude, which shrink with `cos(latitude)`.
    pub fn radius_lon_degrees(&self) -> f64 {
        self.radius_degrees() / self.center.latitude.to_radians().cos().abs().max(0.01)
    }

    /// `steps` points on the ground circle as `(longitude, latitude)` pairs.
    /// On the canvas's degree grid it is an ellipse, wider than it is tall.
    pub fn outline(&self, steps: usize) -> Vec<(f64, f64)> {
        let (rx, ry) = (self.radius_lon_degrees(), self.radius_degrees());
        (0..steps)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / steps as f64;
                (
                    self.center.longitude + rx * angle.cos(),
                    self.center.latitude + ry * angle.sin(),
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapScene<'a> {
    pub viewport: Viewport,
    pub markers: Vec<OutletMarker<'a>>,
    pub circles: Vec<CatchmentCircle>,
}

/// What the map pane shows for the current load state.
#[derive(Debug, Clone, PartialEq)]
pub enum MapRender<'a> {
    Loading,
    Failed(&'a str),
    Map(MapScene<'a>),
}

pub struct OutletMapView {
    status: LoadStatus<Vec<Outlet>>,
    viewport: Viewport,
    selected: Option<usize>,
    fetch: TaskSlot,
}

impl Default for OutletMapView {
    fn default() -> Self {
        Self::new()
    }
}

impl OutletMapView {
    pub fn new() -> Self {
        Self {
            status: LoadStatus::Idle,
            viewport: Viewport::initial(&[]),
            selected: None,
            fetch: TaskSlot::new(),
        }
    }

    pub fn status(&self) -> &LoadStatus<Vec<Outlet>> {
        &self.status
    }

    /// Starts the one and only outlet fetch. Later calls are ignored.
    pub fn mount(&mut self, backend: Arc<dyn Backend>, events: EventSender) {
        if !self.status.is_idle() {
            return;
        }

        tracing::info!("fetching outlets");
        self.status = LoadStatus::Loading;
        self.fetch.set(tokio::spawn(async move {
            let result = backend.outlets().await;
            let _ = events.send(AppEvent::OutletsFetched(result));
        }));
    }

    pub fn unmount(&mut self) {
        self.fetch.abort();
    }

    pub fn on_outlets_fetched(&mut self, result: Result<Vec<Outlet>, ApiError>) {
        self.fetch.clear();
        if !self.status.is_loading() {
            tracing::debug!("dropping outlet response received outside of loading");
            return;
        }

        match result {
            Ok(outlets) => {
                tracing::info!(count = outlets.len(), "outlets loaded");
                self.viewport = Viewport::initial(&outlets);
                self.selected = None;
                self.status = LoadStatus::Ready(outlets);
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching outlets");
                self.status = LoadStatus::Failed(LOAD_ERROR_MESSAGE.to_string());
            }
        }
    }

    pub fn outlets(&self) -> &[Outlet] {
        self.status.ready().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn render(&self) -> MapRender<'_> {
        match &self.status {
            LoadStatus::Idle | LoadStatus::Loading => MapRender::Loading,
            LoadStatus::Failed(reason) => MapRender::Failed(reason.as_str()),
            LoadStatus::Ready(outlets) => MapRender::Map(self.scene(outlets)),
        }
    }

    fn scene<'a>(&self, outlets: &'a [Outlet]) -> MapScene<'a> {
        let markers = outlets
            .iter()
            .map(|outlet| OutletMarker {
                key: outlet.id,
                position: outlet.position(),
                outlet,
            })
            .collect();

        let circles = outlets
            .iter()
            .map(|outlet| CatchmentCircle {
                key: outlet.id,
                center: outlet.position(),
                radius_m: CATCHMENT_RADIUS_M,
            })
            .collect();

        MapScene {
            viewport: self.viewport,
            markers,
            circles,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_outlet(&self) -> Option<&Outlet> {
        self.selected.and_then(|i| self.outlets().get(i))
    }

    pub fn select_next(&mut self) {
        let len = self.outlets().len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1) % len,
            None => 0,
        });
    }

    pub fn select_prev(&mut self) {
        let len = self.outlets().len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        });
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn center_on_selected(&mut self) {
        if let Some(position) = self.selected_outlet().map(Outlet::position) {
            self.viewport.center = position;
        }
    }

    pub fn reset_viewport(&mut self) {
        self.viewport = Viewport::initial(self.outlets());
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn pan(&mut self, east_steps: f64, north_steps: f64) {
        self.viewport.pan(east_steps, north_steps);
    }
}
