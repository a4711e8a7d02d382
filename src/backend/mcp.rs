/*!
`mcp.rs`

Remote-call backend that talks to a local MCP server exposing the data layer.

Each call:
  - spawns the configured server process (stderr suppressed, stdout = protocol)
  - invokes the `execute_kw` tool with `{model, method, args, kwargs}`
  - decodes the tool result
  - cancels the service (graceful shutdown attempt)

Result decoding:
  - `isError: true`          -> RemoteError with the text content as message
  - `structuredContent`      -> returned as-is
  - first `text` content     -> parsed as JSON, or returned as a JSON string
  - nothing usable           -> `null`

Not Yet Implemented:
  - Remote (HTTP/SSE/WS) transports
  - Persistent process reuse between calls
*/

use anyhow::{Context, Result, bail};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use super::target::TargetSpec;
use super::{RemoteCall, RemoteRequest};
use crate::error::RemoteError;
use crate::{log_debug, log_trace};

/// Tool name the data-layer server is expected to expose.
pub const EXECUTE_TOOL: &str = "execute_kw";

#[derive(Debug, Clone)]
pub struct McpBackend {
    program: String,
    args: Vec<String>,
}

impl McpBackend {
    /// Build a backend for a local target; remote targets are rejected.
    pub fn from_target(spec: &TargetSpec) -> Result<Self> {
        match spec {
            TargetSpec::LocalCommand { program, args } => Ok(Self {
                program: program.clone(),
                args: args.clone(),
            }),
            TargetSpec::RemoteUrl(url) => {
                bail!("remote backends are not supported yet: {url}")
            }
        }
    }

    async fn call_tool(&self, request: RemoteRequest) -> Result<Value> {
        use rmcp::ServiceExt;
        use rmcp::model::CallToolRequestParam;
        use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
        use tokio::process::Command;

        let service = ()
            .serve(TokioChildProcess::new(Command::new(&self.program).configure(
                |c| {
                    for a in &self.args {
                        c.arg(a);
                    }
                    c.stderr(std::process::Stdio::null());
                },
            ))?)
            .await
            .with_context(|| format!("Failed to spawn backend process: {}", self.program))?;

        let arguments = match serde_json::to_value(&request)? {
            Value::Object(map) => map,
            _ => bail!("request did not serialize to an object"),
        };

        let call_result = service
            .call_tool(CallToolRequestParam {
                name: EXECUTE_TOOL.into(),
                arguments: Some(arguments),
            })
            .await
            .with_context(|| format!("{}.{} failed", request.model, request.method));

        // Attempt graceful shutdown (ignore failure).
        let _ = service.cancel().await;

        let raw = serde_json::to_value(&call_result?).unwrap_or(Value::Null);
        decode_tool_result(&raw)
    }
}

impl RemoteCall for McpBackend {
    fn call(&self, request: RemoteRequest) -> BoxFuture<'_, Result<Value, RemoteError>> {
        async move {
            log_trace!(
                "mcp call {}.{} args={} kwargs={}",
                request.model,
                request.method,
                request.args.len(),
                request.kwargs.len()
            );
            let out = self.call_tool(request).await.map_err(RemoteError::from);
            if let Err(e) = &out {
                log_debug!("mcp call failed: {e}");
            }
            out
        }
        .boxed()
    }
}

/// Decode a serialized `CallToolResult`.
fn decode_tool_result(raw: &Value) -> Result<Value> {
    let first_text = raw
        .get("content")
        .and_then(|v| v.as_array())
        .and_then(|items| {
            items
                .iter()
                .find_map(|item| item.get("text").and_then(|t| t.as_str()))
        });

    if raw.get("isError").and_then(|v| v.as_bool()).unwrap_or(false) {
        bail!("{}", first_text.unwrap_or("backend reported an error"));
    }

    if let Some(structured) = raw.get("structuredContent")
        && !structured.is_null()
    {
        return Ok(structured.clone());
    }

    Ok(match first_text {
        Some(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
        None => Value::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::parse_target;
    use serde_json::json;

    #[test]
    fn remote_target_rejected() {
        let spec = parse_target("https://erp.example.com").unwrap();
        let err = McpBackend::from_target(&spec).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn local_target_accepted() {
        let spec = parse_target("erp-mcp --db acme").unwrap();
        let backend = McpBackend::from_target(&spec).unwrap();
        assert_eq!(backend.program, "erp-mcp");
        assert_eq!(backend.args, vec!["--db", "acme"]);
    }

    #[test]
    fn decode_prefers_structured_content() {
        let raw = json!({
            "content": [{"type": "text", "text": "ignored"}],
            "structuredContent": [{"id": 1}],
        });
        assert_eq!(decode_tool_result(&raw).unwrap(), json!([{"id": 1}]));
    }

    #[test]
    fn decode_parses_text_as_json() {
        let raw = json!({"content": [{"type": "text", "text": "[{\"id\": 4}]"}]});
        assert_eq!(decode_tool_result(&raw).unwrap(), json!([{"id": 4}]));
        let raw = json!({"content": [{"type": "text", "text": "done"}]});
        assert_eq!(decode_tool_result(&raw).unwrap(), json!("done"));
        assert_eq!(decode_tool_result(&json!({})).unwrap(), Value::Null);
    }

    #[test]
    fn decode_error_surfaces_message() {
        let raw = json!({
            "content": [{"type": "text", "text": "Access Denied"}],
            "isError": true
        });
        let err = decode_tool_result(&raw).unwrap_err();
        assert_eq!(err.to_string(), "Access Denied");
    }
}
