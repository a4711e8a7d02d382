//! Interactive line state: history navigation and tab-completion cycling.
//!
//! Pure state machine; the host feeds it key events and applies whatever it
//! returns to the input buffer.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineState {
    history: Vec<String>,
    history_cursor: usize,
    completion_query: Option<String>,
    completion_cursor: usize,
}

impl LineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn history_cursor(&self) -> usize {
        self.history_cursor
    }

    pub fn completion_query(&self) -> Option<&str> {
        self.completion_query.as_deref()
    }

    /// Record a submitted line (duplicates kept) and reset the cursor to fresh input.
    pub fn on_submit(&mut self, line: &str) {
        self.history.push(line.to_string());
        self.history_cursor = self.history.len();
    }

    /// Step back in history. `None` when already at the oldest entry.
    pub fn on_history_prev(&mut self) -> Option<String> {
        if self.history_cursor == 0 {
            return None;
        }
        self.history_cursor -= 1;
        self.history.get(self.history_cursor).cloned()
    }

    /// Step forward in history; past the newest entry yields an empty buffer.
    pub fn on_history_next(&mut self) -> String {
        if self.history_cursor + 1 < self.history.len() {
            self.history_cursor += 1;
            return self.history[self.history_cursor].clone();
        }
        self.history_cursor = self.history.len();
        String::new()
    }

    /// Next command name completing the query captured on the first trigger.
    ///
    /// `names` must be sorted. Repeated triggers cycle through the matches.
    pub fn on_completion_trigger(&mut self, buffer: &str, names: &[String]) -> Option<String> {
        let query = self
            .completion_query
            .get_or_insert_with(|| buffer.to_string());
        let matches: Vec<&String> = names.iter().filter(|n| n.starts_with(query.as_str())).collect();
        if matches.is_empty() {
            self.completion_cursor = 0;
            return None;
        }
        let hit = matches[self.completion_cursor % matches.len()].clone();
        self.completion_cursor = (self.completion_cursor + 1) % matches.len();
        Some(hit)
    }

    /// Any key other than the completion trigger ends the completion session.
    pub fn on_other_edit(&mut self) {
        self.completion_query = None;
        self.completion_cursor = 0;
    }
}
