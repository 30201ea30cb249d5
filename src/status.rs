/// Load state of a fetched resource, shared by both views.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus<T> {
    Idle,
    Loading,
    Ready(T),
    /// Holds a user-facing reason; the underlying error is only logged.
    Failed(String),
}

impl<T> Default for LoadStatus<T> {
    fn default() -> Self {
        LoadStatus::Idle
    }
}

impl<T> LoadStatus<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, LoadStatus::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadStatus::Ready(value) => Some(value),
            _ => None,
        }
    }
}
