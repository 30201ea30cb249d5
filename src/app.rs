use std::sync::Arc;

use crate::api::Backend;
use crate::map_view::OutletMapView;
use crate::query_panel::QueryRelayPanel;
use crate::tui::{AppEvent, EventSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Composition root. The two views share the backend handle and nothing else.
pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub show_details: bool,
    pub api_url: String,

    pub map: OutletMapView,
    pub panel: QueryRelayPanel,

    backend: Arc<dyn Backend>,
    events: EventSender,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, events: EventSender, api_url: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            show_details: false,
            api_url: api_url.into(),
            map: OutletMapView::new(),
            panel: QueryRelayPanel::new(),
            backend,
            events,
        }
    }

    /// Kicks off the initial fetch of both views.
    pub fn mount(&mut self) {
        self.map.mount(self.backend.clone(), self.events.clone());
        self.panel.mount(self.backend.clone(), self.events.clone());
    }

    /// Aborts anything still in flight.
    pub fn unmount(&mut self) {
        self.map.unmount();
        self.panel.unmount();
    }

    pub fn submit_query(&mut self) -> bool {
        self.panel.submit(self.backend.clone(), self.events.clone())
    }

    /// Applies results delivered by background tasks. Input events are routed
    /// by the handler instead.
    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::OutletsFetched(result) => self.map.on_outlets_fetched(result),
            AppEvent::AnswerFetched(result) => self.panel.on_answer_fetched(result),
            AppEvent::SubmitFinished(outcome) => self.panel.on_submit_finished(outcome),
            AppEvent::Tick => self.panel.tick(),
            AppEvent::Key(_) | AppEvent::Resize(_, _) => {}
        }
    }

    pub fn toggle_details(&mut self) {
        if self.show_details {
            self.show_details = false;
        } else if self.map.selected_outlet().is_some() {
            self.show_details = true;
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.unmount();
    }
}
