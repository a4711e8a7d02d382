/*!
The console session and its dispatcher.

Flow of one line:
  tokenize -> registry lookup
     hit  -> validate args -> handler (panics caught) -> CommandOutput
     miss -> alias store -> substitute -> back to the top (bounded depth)

`execute` returns the outcome; `submit` is the interactive entry that also
records history, echoes the line and renders the outcome to the output sink.
*/

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::BoxFuture;

use super::alias::{AliasStore, MemoryAliasStore, substitute};
use super::line_state::LineState;
use super::registry::{CommandDefinition, CommandRegistry};
use super::tokenizer::tokenize;
use crate::backend::{ActionDispatcher, EchoActions, OutputSink, RemoteCall};
use crate::error::{ConsoleError, Result};
use crate::{log_debug, log_trace};

/// Alias expansions allowed for one submitted line.
pub const DEFAULT_ALIAS_DEPTH: usize = 8;

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    None,
    /// Plain text; escaped when rendered.
    Text(String),
    /// Trusted, already formatted markup.
    Markup(String),
    /// Rows rendered as aligned columns; cells are escaped.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Clear the screen.
    Clear,
}

impl CommandOutput {
    pub fn text(s: impl Into<String>) -> Self {
        CommandOutput::Text(s.into())
    }
}

struct ConsoleInner {
    registry: CommandRegistry,
    aliases: Arc<dyn AliasStore>,
    backend: Arc<dyn RemoteCall>,
    actions: Arc<dyn ActionDispatcher>,
    output: Arc<dyn OutputSink>,
    line: Mutex<LineState>,
    max_alias_depth: usize,
    echo: bool,
}

/// Handle to one console session. Cheap to clone; every clone sees the same
/// registry, stores and line state.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

pub struct ConsoleBuilder {
    backend: Arc<dyn RemoteCall>,
    output: Arc<dyn OutputSink>,
    aliases: Option<Arc<dyn AliasStore>>,
    actions: Option<Arc<dyn ActionDispatcher>>,
    max_alias_depth: usize,
    echo: bool,
}

impl ConsoleBuilder {
    pub fn new(backend: Arc<dyn RemoteCall>, output: Arc<dyn OutputSink>) -> Self {
        Self {
            backend,
            output,
            aliases: None,
            actions: None,
            max_alias_depth: DEFAULT_ALIAS_DEPTH,
            echo: true,
        }
    }

    /// Alias store (default: empty in-memory store).
    pub fn aliases(mut self, store: Arc<dyn AliasStore>) -> Self {
        self.aliases = Some(store);
        self
    }

    /// View opener (default: `EchoActions` on the output sink).
    pub fn actions(mut self, actions: Arc<dyn ActionDispatcher>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn max_alias_depth(mut self, depth: usize) -> Self {
        self.max_alias_depth = depth;
        self
    }

    /// Echo submitted lines to the output sink as `> line`.
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn build(self) -> Console {
        let actions: Arc<dyn ActionDispatcher> = match self.actions {
            Some(actions) => actions,
            None => Arc::new(EchoActions::new(self.output.clone())),
        };
        let aliases: Arc<dyn AliasStore> = match self.aliases {
            Some(aliases) => aliases,
            None => Arc::new(MemoryAliasStore::new()),
        };
        Console {
            inner: Arc::new(ConsoleInner {
                registry: CommandRegistry::new(),
                aliases,
                backend: self.backend,
                actions,
                output: self.output,
                line: Mutex::new(LineState::new()),
                max_alias_depth: self.max_alias_depth,
                echo: self.echo,
            }),
        }
    }
}

impl Console {
    pub fn builder(backend: Arc<dyn RemoteCall>, output: Arc<dyn OutputSink>) -> ConsoleBuilder {
        ConsoleBuilder::new(backend, output)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.inner.registry
    }

    pub fn register(&self, def: CommandDefinition) {
        self.inner.registry.register(def);
    }

    pub fn backend(&self) -> &Arc<dyn RemoteCall> {
        &self.inner.backend
    }

    pub fn aliases(&self) -> &Arc<dyn AliasStore> {
        &self.inner.aliases
    }

    pub fn actions(&self) -> &Arc<dyn ActionDispatcher> {
        &self.inner.actions
    }

    pub fn output(&self) -> &Arc<dyn OutputSink> {
        &self.inner.output
    }

    /* ---- Dispatch ---- */

    /// Interpret one line. Calls may overlap; each is independent.
    pub fn execute(&self, line: &str) -> BoxFuture<'static, Result<CommandOutput>> {
        self.execute_at_depth(line.to_string(), 0)
    }

    fn execute_at_depth(
        &self,
        line: String,
        depth: usize,
    ) -> BoxFuture<'static, Result<CommandOutput>> {
        let console = self.clone();
        async move {
            let mut tokens = tokenize(&line);
            if tokens.is_empty() {
                return Ok(CommandOutput::None);
            }
            let name = tokens.remove(0);
            match console.registry().lookup(&name) {
                Some(def) => console.invoke(def, tokens).await,
                None => console.expand_alias(name, tokens, depth).await,
            }
        }
        .boxed()
    }

    async fn invoke(
        &self,
        def: Arc<CommandDefinition>,
        args: Vec<String>,
    ) -> Result<CommandOutput> {
        if !def.args.validate(&args) {
            log_debug!("'{}' rejected arguments {:?} (spec '{}')", def.name, args, def.args);
            return Err(ConsoleError::InvalidArguments {
                command: def.name.clone(),
                usage: def.usage.clone(),
            });
        }
        log_debug!("dispatch '{}' ({} arg(s))", def.name, args.len());

        // The handler closure itself runs inside the caught future.
        let console = self.clone();
        let handler = def.clone();
        let call = async move { handler.invoke(console, args).await };
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(out)) => Ok(out),
            Ok(Err(e)) => Err(e.attribute(&def.name)),
            Err(panic) => Err(ConsoleError::CommandExecutionFailed {
                command: def.name.clone(),
                cause: panic_message(panic.as_ref()),
            }),
        }
    }

    async fn expand_alias(
        &self,
        name: String,
        args: Vec<String>,
        depth: usize,
    ) -> Result<CommandOutput> {
        if depth >= self.inner.max_alias_depth {
            return Err(ConsoleError::AliasCycle {
                name,
                depth: self.inner.max_alias_depth,
            });
        }
        let found = self
            .inner
            .aliases
            .find_alias(&name)
            .await
            .map_err(|e| ConsoleError::RemoteCallFailed {
                command: name.clone(),
                cause: e.0,
            })?;
        let Some(alias) = found else {
            log_debug!("no command or alias named '{name}'");
            return Err(ConsoleError::CommandNotFound(name));
        };
        let expanded = substitute(&alias.command, &args);
        log_debug!("alias '{name}' -> {expanded}");
        self.execute_at_depth(expanded, depth + 1).await
    }

    /* ---- Interactive entry ---- */

    /// Record `line` in history now, then run it and render the outcome.
    ///
    /// History order is submission order even when the returned futures
    /// complete out of order. Blank lines are ignored.
    pub fn submit(&self, line: &str) -> BoxFuture<'static, ()> {
        if line.trim().is_empty() {
            return async {}.boxed();
        }
        self.line_state().on_submit(line);
        if self.inner.echo {
            self.inner.output.write_escaped(&format!("> {line}"), true);
        }
        let console = self.clone();
        let line = line.to_string();
        async move {
            let result = console.execute(&line).await;
            console.render(result);
        }
        .boxed()
    }

    /// Write an outcome to the output sink.
    pub fn render(&self, result: Result<CommandOutput>) {
        let out = &self.inner.output;
        match result {
            Ok(CommandOutput::None) => {}
            Ok(CommandOutput::Text(text)) => out.write_escaped(&text, true),
            Ok(CommandOutput::Markup(markup)) => out.write_line(&markup, true),
            Ok(CommandOutput::Table { headers, rows }) => {
                let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
                let text = crate::cmd::format::table(&headers, &rows, Default::default());
                out.write_escaped(&text, true);
            }
            Ok(CommandOutput::Clear) => out.clear(),
            Err(e) => {
                log_trace!("command failed: {e:?}");
                out.write_escaped(&format!("[!] {e}"), true);
            }
        }
    }

    /* ---- Line editing ---- */

    fn line_state(&self) -> MutexGuard<'_, LineState> {
        self.inner.line.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tab pressed with `buffer` in the input field.
    pub fn complete(&self, buffer: &str) -> Option<String> {
        let names = self.registry().names();
        self.line_state().on_completion_trigger(buffer, &names)
    }

    pub fn history_prev(&self) -> Option<String> {
        self.line_state().on_history_prev()
    }

    pub fn history_next(&self) -> String {
        self.line_state().on_history_next()
    }

    /// Any other key changed the buffer.
    pub fn edited(&self) {
        self.line_state().on_other_edit();
    }

    pub fn history(&self) -> Vec<String> {
        self.line_state().history().to_vec()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferSink, MemoryBackend};
    use crate::console::alias::OfflineAliasStore;
    use crate::error::RemoteError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn console() -> (Console, BufferSink) {
        let sink = BufferSink::new();
        let console = Console::builder(Arc::new(MemoryBackend::new()), Arc::new(sink.clone())).build();
        console.register(
            CommandDefinition::new("echo", "?s?s", |_, args: Vec<String>| async move {
                Ok(CommandOutput::Text(args.join("|")))
            })
            .unwrap()
            .usage("[A] [B]"),
        );
        console.register(
            CommandDefinition::new("num", "i", |_, args: Vec<String>| async move {
                Ok(CommandOutput::Text(format!("n={}", args[0])))
            })
            .unwrap()
            .usage("<N>"),
        );
        (console, sink)
    }

    async fn add_alias(console: &Console, name: &str, command: &str) {
        console.aliases().create_alias(name, command).await.unwrap();
    }

    #[tokio::test]
    async fn empty_line_is_noop() {
        let (c, _) = console();
        assert_eq!(c.execute("   ").await.unwrap(), CommandOutput::None);
    }

    #[tokio::test]
    async fn unknown_command_not_found() {
        let (c, _) = console();
        let err = c.execute("frobnicate").await.unwrap_err();
        assert_eq!(err, ConsoleError::CommandNotFound("frobnicate".into()));
    }

    #[tokio::test]
    async fn quoted_args_reach_handler() {
        let (c, _) = console();
        let out = c.execute(r#"echo "a b" c"#).await.unwrap();
        assert_eq!(out, CommandOutput::text("a b|c"));
    }

    #[tokio::test]
    async fn invalid_args_skip_handler() {
        let (c, _) = console();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        c.register(
            CommandDefinition::new("count", "s", move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Ok(CommandOutput::None) }
            })
            .unwrap()
            .usage("<X>"),
        );
        let err = c.execute("count 12").await.unwrap_err();
        assert_eq!(
            err,
            ConsoleError::InvalidArguments {
                command: "count".into(),
                usage: "<X>".into()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        c.execute("count x").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_errors_are_attributed() {
        let (c, _) = console();
        c.register(
            CommandDefinition::new("fail", "", |_, _| async {
                Err(RemoteError::new("Access Denied").into())
            })
            .unwrap(),
        );
        let err = c.execute("fail").await.unwrap_err();
        assert_eq!(err.to_string(), "fail: Access Denied");
    }

    #[tokio::test]
    async fn handler_panic_is_contained() {
        let (c, _) = console();
        c.register(
            CommandDefinition::new("boom", "", |_, _| async {
                if true {
                    panic!("kaboom");
                }
                Ok(CommandOutput::None)
            })
            .unwrap(),
        );
        let err = c.execute("boom").await.unwrap_err();
        assert_eq!(
            err,
            ConsoleError::CommandExecutionFailed {
                command: "boom".into(),
                cause: "kaboom".into()
            }
        );
        // The session is still usable.
        assert_eq!(c.execute("echo ok").await.unwrap(), CommandOutput::text("ok"));
    }

    #[tokio::test]
    async fn panic_before_future_is_contained() {
        let (c, _) = console();
        c.register(
            CommandDefinition::new("boom", "", |_, _| {
                let v: Vec<u8> = Vec::new();
                let _ = v[3];
                async { Ok(CommandOutput::None) }
            })
            .unwrap(),
        );
        let err = c.execute("boom").await.unwrap_err();
        assert!(
            matches!(err, ConsoleError::CommandExecutionFailed { ref command, .. } if command == "boom"),
            "got {err:?}"
        );
        assert_eq!(c.execute("echo ok").await.unwrap(), CommandOutput::text("ok"));
    }

    #[tokio::test]
    async fn alias_store_failure_names_typed_command() {
        let sink = BufferSink::new();
        let c = Console::builder(Arc::new(MemoryBackend::new()), Arc::new(sink))
            .aliases(Arc::new(OfflineAliasStore))
            .build();
        let err = c.execute("pa x").await.unwrap_err();
        assert_eq!(
            err,
            ConsoleError::RemoteCallFailed {
                command: "pa".into(),
                cause: "alias store offline".into()
            }
        );
    }

    #[tokio::test]
    async fn alias_keeps_empty_and_quoted_args() {
        let (c, _) = console();
        add_alias(&c, "e", "echo $1 $2").await;
        assert_eq!(c.execute(r#"e "" x"#).await.unwrap(), CommandOutput::text("|x"));
        assert_eq!(
            c.execute(r#"e 'say "hi there"' x"#).await.unwrap(),
            CommandOutput::text(r#"say "hi there"|x"#)
        );
        assert_eq!(
            c.execute(r#"e 'say "hi there"' x"#).await,
            c.execute(r#"echo 'say "hi there"' x"#).await
        );
    }

    #[tokio::test]
    async fn alias_expands_with_args() {
        let (c, _) = console();
        add_alias(&c, "e2", "echo $2 $1").await;
        let out = c.execute(r#"e2 first "second arg""#).await.unwrap();
        assert_eq!(out, CommandOutput::text("second arg|first"));
    }

    #[tokio::test]
    async fn alias_result_is_revalidated() {
        let (c, _) = console();
        add_alias(&c, "n", "num $1").await;
        assert_eq!(c.execute("n 5").await.unwrap(), CommandOutput::text("n=5"));
        let err = c.execute("n five").await.unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidArguments { ref command, .. } if command == "num"));
    }

    #[tokio::test]
    async fn alias_chain_and_cycle() {
        let (c, _) = console();
        add_alias(&c, "a1", "a2 $1").await;
        add_alias(&c, "a2", "echo $1").await;
        assert_eq!(c.execute("a1 x").await.unwrap(), CommandOutput::text("x"));

        add_alias(&c, "ping", "pong").await;
        add_alias(&c, "pong", "ping").await;
        let err = c.execute("ping").await.unwrap_err();
        assert_eq!(
            err,
            ConsoleError::AliasCycle {
                name: "ping".into(),
                depth: DEFAULT_ALIAS_DEPTH
            }
        );
    }

    #[tokio::test]
    async fn commands_shadow_aliases() {
        let (c, _) = console();
        add_alias(&c, "echo", "num 1").await;
        assert_eq!(c.execute("echo hi").await.unwrap(), CommandOutput::text("hi"));
    }

    #[tokio::test]
    async fn concurrent_executes_are_independent() {
        let (c, _) = console();
        let (a, b) = futures::join!(c.execute("echo a"), c.execute("num 2"));
        assert_eq!(a.unwrap(), CommandOutput::text("a"));
        assert_eq!(b.unwrap(), CommandOutput::text("n=2"));
    }

    #[tokio::test]
    async fn submit_records_history_in_submission_order() {
        let (c, sink) = console();
        let first = c.submit("echo <one>");
        let second = c.submit("nope");
        assert_eq!(c.history(), vec!["echo <one>", "nope"]);
        second.await;
        first.await;
        let lines = sink.lines();
        assert_eq!(lines[0], "&gt; echo &lt;one&gt;");
        assert_eq!(lines[1], "&gt; nope");
        assert!(lines.contains(&"&lt;one&gt;".to_string()));
        assert!(lines.contains(&"[!] &#39;nope&#39; command not found".to_string()));
    }

    #[tokio::test]
    async fn blank_submit_is_ignored() {
        let (c, sink) = console();
        c.submit("  ").await;
        assert!(c.history().is_empty());
        assert!(sink.contents().is_empty());
    }

    #[tokio::test]
    async fn render_variants() {
        let (c, sink) = console();
        c.render(Ok(CommandOutput::Markup("<b>hi</b>".into())));
        c.render(Ok(CommandOutput::Table {
            headers: vec!["ID".into(), "NAME".into()],
            rows: vec![vec!["1".into(), "A&B".into()]],
        }));
        let out = sink.contents();
        assert!(out.starts_with("<b>hi</b>\n"));
        assert!(out.contains("A&amp;B"));
        c.render(Ok(CommandOutput::Clear));
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn completion_and_history_through_console() {
        let (c, _) = console();
        assert_eq!(c.complete("e").as_deref(), Some("echo"));
        c.edited();
        assert_eq!(c.complete("n").as_deref(), Some("num"));
        assert_eq!(c.history_prev(), None);
        assert_eq!(c.history_next(), "");
    }
}
