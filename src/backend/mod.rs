/*!
Collaborator boundaries of the console core.

The interpreter never talks to a transport directly; it goes through:
  - `RemoteCall`        : model/method calls against the backend data layer
  - `ActionDispatcher`  : "open this view" requests for the host UI
  - `OutputSink`        : where rendered lines end up

Implementations shipped here:
  - `McpBackend`   (mcp.rs)    : local MCP server process, one spawn per call
  - `MemoryBackend` (memory.rs): in-process records, used offline and in tests
  - `StdoutSink` / `BufferSink` / `EchoActions` (output.rs)

Target strings (`--backend`) are classified by `target::parse_target`.
*/

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RemoteError;

pub mod mcp;
pub mod memory;
pub mod output;
pub mod target;

pub use mcp::McpBackend;
pub use memory::MemoryBackend;
pub use output::{BufferSink, EchoActions, StdoutSink};
pub use target::{TargetSpec, parse_target};

/* ---- Remote calls ---- */

/// One backend call: `model.method(*args, **kwargs)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRequest {
    pub model: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl RemoteRequest {
    pub fn new(model: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            method: method.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }
}

/// Remote procedure call boundary. Failures carry the backend's message.
pub trait RemoteCall: Send + Sync {
    fn call(&self, request: RemoteRequest) -> BoxFuture<'_, Result<Value, RemoteError>>;
}

/* ---- View actions ---- */

/// Window action understood by the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub res_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub res_id: Option<i64>,
    /// `(view id, view type)` pairs; `None` lets the host pick the default view.
    pub views: Vec<(Option<i64>, String)>,
    /// "current" replaces the main view, "new" opens a dialog.
    pub target: String,
}

impl ActionDescriptor {
    const WINDOW: &'static str = "ir.actions.act_window";

    /// List of all records of `model`.
    pub fn list(model: impl Into<String>) -> Self {
        Self {
            kind: Self::WINDOW.to_string(),
            res_model: model.into(),
            res_id: None,
            views: vec![(None, "list".to_string())],
            target: "new".to_string(),
        }
    }

    /// Form of one record (`Some(id)`), or a blank form for a new record.
    pub fn form(model: impl Into<String>, res_id: Option<i64>) -> Self {
        Self {
            kind: Self::WINDOW.to_string(),
            res_model: model.into(),
            res_id,
            views: vec![(None, "form".to_string())],
            target: if res_id.is_some() { "new" } else { "current" }.to_string(),
        }
    }
}

/// Opens views in the host UI. Opaque to the interpreter.
pub trait ActionDispatcher: Send + Sync {
    fn open_action(&self, action: ActionDescriptor) -> BoxFuture<'_, Result<(), RemoteError>>;
}

/* ---- Output ---- */

/// Destination of console output.
///
/// `write_line` takes trusted, already formatted text; `write_escaped` is for
/// anything user- or backend-influenced and escapes it for an HTML host.
pub trait OutputSink: Send + Sync {
    fn write_line(&self, text: &str, newline: bool);

    fn write_escaped(&self, text: &str, newline: bool) {
        self.write_line(&crate::utils::output::html_escape(text), newline);
    }

    fn clear(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_builder() {
        let req = RemoteRequest::new("res.partner", "search_read")
            .arg(json!([]))
            .kwarg("fields", json!(["name"]));
        assert_eq!(req.args, vec![json!([])]);
        assert_eq!(req.kwargs.get("fields"), Some(&json!(["name"])));
    }

    #[test]
    fn action_descriptor_shape() {
        let list = serde_json::to_value(ActionDescriptor::list("res.partner")).unwrap();
        assert_eq!(
            list,
            json!({
                "type": "ir.actions.act_window",
                "res_model": "res.partner",
                "views": [[null, "list"]],
                "target": "new"
            })
        );

        let form = ActionDescriptor::form("res.partner", Some(7));
        assert_eq!(form.res_id, Some(7));
        assert_eq!(form.target, "new");
        assert_eq!(ActionDescriptor::form("res.partner", None).target, "current");
    }
}
