//! Output sinks and the terminal stand-in for opening views.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::BoxFuture;

use super::{ActionDescriptor, ActionDispatcher, OutputSink};
use crate::error::RemoteError;

/// Writes to the process stdout. Terminals have no markup, so escaping is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&self, text: &str, newline: bool) {
        let mut out = std::io::stdout().lock();
        let _ = if newline {
            writeln!(out, "{text}")
        } else {
            write!(out, "{text}")
        };
        let _ = out.flush();
    }

    fn write_escaped(&self, text: &str, newline: bool) {
        self.write_line(text, newline);
    }

    fn clear(&self) {
        self.write_line("\x1b[2J\x1b[H", false);
    }
}

/// Collects output in memory (HTML hosts, tests).
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    buf: Arc<Mutex<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written since the last clear.
    pub fn contents(&self) -> String {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Completed lines written since the last clear.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl OutputSink for BufferSink {
    fn write_line(&self, text: &str, newline: bool) {
        let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        buf.push_str(text);
        if newline {
            buf.push('\n');
        }
    }

    fn clear(&self) {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Prints the action descriptor instead of opening a view.
pub struct EchoActions {
    output: Arc<dyn OutputSink>,
}

impl EchoActions {
    pub fn new(output: Arc<dyn OutputSink>) -> Self {
        Self { output }
    }
}

impl ActionDispatcher for EchoActions {
    fn open_action(&self, action: ActionDescriptor) -> BoxFuture<'_, Result<(), RemoteError>> {
        async move {
            let json = serde_json::to_string(&action)
                .map_err(|e| RemoteError::new(format!("unable to serialize action: {e}")))?;
            self.output.write_escaped(&format!("open: {json}"), true);
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sink_escapes_untrusted_text() {
        let sink = BufferSink::new();
        sink.write_line("<b>trusted</b>", true);
        sink.write_escaped("<script>", false);
        sink.write_escaped(" tail", true);
        assert_eq!(sink.lines(), vec!["<b>trusted</b>", "&lt;script&gt; tail"]);
        sink.clear();
        assert!(sink.contents().is_empty());
    }

    #[tokio::test]
    async fn echo_actions_render_descriptor() {
        let sink = BufferSink::new();
        let actions = EchoActions::new(Arc::new(sink.clone()));
        actions
            .open_action(ActionDescriptor::form("res.partner", Some(3)))
            .await
            .unwrap();
        let out = sink.contents();
        assert!(out.starts_with("open: {"));
        assert!(out.contains("res.partner"));
        assert!(out.contains("&quot;res_id&quot;:3"));
    }
}
