//! Query relay: post free text to the backend, then show whatever single
//! answer it now stores.
//!
//! The stored answer is global and last-writer-wins. After a submission the
//! panel shows the value returned by the follow-up GET, which may have been
//! written by another client.

use std::sync::Arc;

use crate::api::{ApiError, Backend};
use crate::model::StoredAnswer;
use crate::status::LoadStatus;
use crate::task::TaskSlot;
use crate::tui::{AppEvent, EventSender};

pub const SUBMIT_ICON: &str = "⌕";
pub const SPINNER_FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];
pub const PLACEHOLDER: &str = "Ask about outlets...";

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Controlled text input with a busy flag. Submission itself is delegated.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryInputForm {
    text: String,
    cursor: usize,
    is_submitting: bool,
}

impl QueryInputForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn can_submit(&self) -> bool {
        !self.text.is_empty() && !self.is_submitting
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    /// Marks the form busy and hands out the text to send, or `None` when
    /// the input is empty or a submission is already running.
    pub fn begin_submit(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }
        self.is_submitting = true;
        Some(self.text.clone())
    }

    /// Always releases the busy flag; the input is cleared only if the query
    /// reached the backend.
    pub fn finish_submit(&mut self, posted: bool) {
        if posted {
            self.text.clear();
            self.cursor = 0;
        }
        self.is_submitting = false;
    }
}

/// Result of one POST-then-GET round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub posted: bool,
    /// `None` if either step failed.
    pub answer: Option<StoredAnswer>,
}

/// POSTs the query, then re-reads the stored answer. Failures are logged and
/// reported through the outcome, never retried.
pub async fn relay_query(backend: &dyn Backend, query: &str) -> SubmitOutcome {
    if let Err(e) = backend.submit_query(query).await {
        tracing::error!(error = %e, "error adding response");
        return SubmitOutcome {
            posted: false,
            answer: None,
        };
    }

    let answer = match backend.stored_answer().await {
        Ok(answer) => Some(answer),
        Err(e) => {
            tracing::error!(error = %e, "error fetching response after submit");
            None
        }
    };

    SubmitOutcome {
        posted: true,
        answer,
    }
}

pub struct QueryRelayPanel {
    pub form: QueryInputForm,
    answer: LoadStatus<String>,
    spinner_frame: usize,
    fetch: TaskSlot,
    submission: TaskSlot,
}

impl Default for QueryRelayPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryRelayPanel {
    pub fn new() -> Self {
        Self {
            form: QueryInputForm::new(),
            answer: LoadStatus::Idle,
            spinner_frame: 0,
            fetch: TaskSlot::new(),
            submission: TaskSlot::new(),
        }
    }

    pub fn answer_status(&self) -> &LoadStatus<String> {
        &self.answer
    }

    /// Fetches the current stored answer once.
    pub fn mount(&mut self, backend: Arc<dyn Backend>, events: EventSender) {
        if !self.answer.is_idle() {
            return;
        }

        self.answer = LoadStatus::Loading;
        self.fetch.set(tokio::spawn(async move {
            let result = backend.stored_answer().await;
            let _ = events.send(AppEvent::AnswerFetched(result));
        }));
    }

    pub fn unmount(&mut self) {
        self.fetch.abort();
        self.submission.abort();
    }

    /// Only the mount-time fetch lands here, and only while it is still the
    /// newest read. A submission supersedes it.
    pub fn on_answer_fetched(&mut self, result: Result<StoredAnswer, ApiError>) {
        self.fetch.clear();
        if !self.answer.is_loading() {
            tracing::debug!("dropping stored answer received outside of loading");
            return;
        }

        match result {
            Ok(answer) => self.answer = LoadStatus::Ready(answer.llmresponse),
            Err(e) => {
                tracing::error!(error = %e, "error fetching response");
                self.answer = LoadStatus::Failed(e.to_string());
            }
        }
    }

    /// Returns `false` when the submission was refused (empty input or busy).
    pub fn submit(&mut self, backend: Arc<dyn Backend>, events: EventSender) -> bool {
        let Some(query) = self.form.begin_submit() else {
            return false;
        };

        tracing::info!(chars = query.chars().count(), "submitting query");
        if self.fetch.is_running() {
            tracing::debug!("cancelling initial answer fetch, the submission refetches");
            self.fetch.abort();
        }
        self.spinner_frame = 0;
        self.submission.set(tokio::spawn(async move {
            let outcome = relay_query(backend.as_ref(), &query).await;
            let _ = events.send(AppEvent::SubmitFinished(outcome));
        }));
        true
    }

    pub fn on_submit_finished(&mut self, outcome: SubmitOutcome) {
        self.submission.clear();
        self.form.finish_submit(outcome.posted);
        match outcome.answer {
            Some(answer) => self.answer = LoadStatus::Ready(answer.llmresponse),
            // The initial fetch was cancelled, so nothing else will settle it.
            None if self.answer.is_loading() => self.answer = LoadStatus::Idle,
            None => {}
        }
    }

    /// The answer block is omitted entirely when this is `None`.
    pub fn displayed_answer(&self) -> Option<&str> {
        self.answer
            .ready()
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }

    pub fn tick(&mut self) {
        if self.form.is_submitting() {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
    }

    /// Spinner while a submission is in flight, the search icon otherwise.
    pub fn submit_glyph(&self) -> &'static str {
        if self.form.is_submitting() {
            SPINNER_FRAMES[self.spinner_frame]
        } else {
            SUBMIT_ICON
        }
    }
}
