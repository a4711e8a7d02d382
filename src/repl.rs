//! Interactive terminal front end on `rustyline`.
//!
//! Line editing stays with rustyline; the console owns history and
//! completion. Tab goes through `Console::complete` (cycling through
//! matching command names on repeated presses), Up/Down through
//! `Console::history_prev` / `history_next`.

use std::sync::{Mutex, PoisonError};

use anyhow::{Result, anyhow};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Context, Editor, Event, EventContext, EventHandler, Helper,
    KeyCode, KeyEvent, Modifiers, Movement, RepeatCount,
};
use tokio::runtime::Runtime;

use crate::console::Console;

pub const PROMPT: &str = "> ";

/// Completion for the command word, backed by the console's line state.
pub struct ConsoleHelper {
    console: Console,
    /// Last name inserted by Tab. A different word means the user edited
    /// the line in between and a new completion run starts.
    inserted: Mutex<Option<String>>,
}

impl ConsoleHelper {
    pub fn new(console: Console) -> Self {
        Self {
            console,
            inserted: Mutex::new(None),
        }
    }

    /// Name to put in place of the command word, if any.
    fn next_candidate(&self, line: &str, pos: usize) -> Option<String> {
        let word = line.get(..pos)?.trim();
        if word.contains(char::is_whitespace) {
            // Past the command word: arguments are not completed.
            return None;
        }
        let mut inserted = self.inserted.lock().unwrap_or_else(PoisonError::into_inner);
        if inserted.as_deref() != Some(word) {
            self.console.edited();
        }
        let name = self.console.complete(word);
        inserted.clone_from(&name);
        name
    }
}

impl Completer for ConsoleHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = self
            .next_candidate(line, pos)
            .map(|name| Pair {
                replacement: format!("{name} "),
                display: name,
            })
            .into_iter()
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for ConsoleHelper {
    type Hint = String;
}

impl Highlighter for ConsoleHelper {}

impl Validator for ConsoleHelper {}

impl Helper for ConsoleHelper {}

/// Up / Down arrow: replace the line with an entry from the console history.
struct HistoryKey {
    console: Console,
    older: bool,
}

impl HistoryKey {
    /// Text for the input field, or `None` to leave it as is.
    fn recall(&self) -> Option<String> {
        if self.older {
            self.console.history_prev()
        } else {
            Some(self.console.history_next())
        }
    }
}

impl ConditionalEventHandler for HistoryKey {
    fn handle(&self, _: &Event, _: RepeatCount, _: bool, _: &EventContext) -> Option<Cmd> {
        Some(match self.recall() {
            Some(text) => Cmd::Replace(Movement::WholeLine, Some(text)),
            None => Cmd::Noop,
        })
    }
}

fn bind_history_keys(rl: &mut Editor<ConsoleHelper, DefaultHistory>, console: &Console) {
    for (key, older) in [(KeyCode::Up, true), (KeyCode::Down, false)] {
        let handler = HistoryKey {
            console: console.clone(),
            older,
        };
        rl.bind_sequence(
            KeyEvent(key, Modifiers::NONE),
            EventHandler::Conditional(Box::new(handler)),
        );
    }
}

/// Read lines until Ctrl-D, submitting each one and waiting for its output.
///
/// Ctrl-C drops the current line and keeps the session open.
pub fn run(console: &Console, rt: &Runtime) -> Result<()> {
    let mut rl: Editor<ConsoleHelper, DefaultHistory> =
        Editor::new().map_err(|e| anyhow!("failed to initialize line editor: {e}"))?;
    rl.set_helper(Some(ConsoleHelper::new(console.clone())));
    bind_history_keys(&mut rl, console);

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                console.edited();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(anyhow!("failed to read input: {e}")),
        };
        rt.block_on(console.submit(&line));
    }
    Ok(())
}
