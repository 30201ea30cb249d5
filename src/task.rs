use tokio::task::JoinHandle;

/// Owned handle to a background fetch.
///
/// Replacing or dropping the slot aborts the task it holds, so a view that is
/// torn down never receives a late response.
#[derive(Debug, Default)]
pub struct TaskSlot {
    handle: Option<JoinHandle<()>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, handle: JoinHandle<()>) {
        self.abort();
        self.handle = Some(handle);
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Forget a finished task without aborting it.
    pub fn clear(&mut self) {
        self.handle = None;
    }

    pub fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.abort();
    }
}
