/*!
Aliases: stored command templates with positional placeholders.

`alias pa "search res.partner $1"` stores the template; `pa name` later runs
`search res.partner name`. Aliases are looked up only when no registered
command matches the first token.

Stores:
  - `MemoryAliasStore` : in-process, optionally mirrored to a JSON/YAML file
  - `RemoteAliasStore` : `terminal.alias` records behind a `RemoteCall`
*/

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::tokenizer::quote_argument;
use crate::backend::{RemoteCall, RemoteRequest};
use crate::error::RemoteError;
use crate::log_debug;

/// Model holding aliases on the backend.
pub const ALIAS_MODEL: &str = "terminal.alias";

/// Replace `$1..$N` with the matching argument (1-indexed).
///
/// Arguments are re-quoted where needed so the expanded line tokenizes back
/// to the same arguments, empty ones included. Placeholders without a matching
/// argument are left as written.
pub fn substitute<S: AsRef<str>>(template: &str, args: &[S]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let arg = after[..digits]
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .and_then(|n| args.get(n - 1));
        match arg {
            Some(arg) => out.push_str(&quote_argument(arg.as_ref())),
            None => {
                out.push('$');
                out.push_str(&after[..digits]);
            }
        }
        rest = &after[digits..];
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub id: i64,
    pub name: String,
    pub command: String,
}

/// Alias persistence. Lookups are by exact name.
pub trait AliasStore: Send + Sync {
    fn find_alias<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<AliasRecord>, RemoteError>>;

    fn create_alias<'a>(
        &'a self,
        name: &'a str,
        command: &'a str,
    ) -> BoxFuture<'a, Result<i64, RemoteError>>;

    fn update_alias<'a>(
        &'a self,
        id: i64,
        command: &'a str,
    ) -> BoxFuture<'a, Result<(), RemoteError>>;

    fn delete_alias(&self, id: i64) -> BoxFuture<'_, Result<(), RemoteError>>;
}

/* ---- In-process store ---- */

#[derive(Default)]
struct AliasTable {
    next_id: i64,
    by_name: BTreeMap<String, AliasRecord>,
}

impl AliasTable {
    fn commands(&self) -> BTreeMap<String, String> {
        self.by_name
            .values()
            .map(|r| (r.name.clone(), r.command.clone()))
            .collect()
    }
}

/// Aliases kept in memory; when a file is attached every mutation rewrites it.
///
/// Mutations are serialized by `writes`; the file is written after the table
/// lock is released, so lookups never wait on disk.
#[derive(Default)]
pub struct MemoryAliasStore {
    table: Mutex<AliasTable>,
    writes: tokio::sync::Mutex<()>,
    file: Option<PathBuf>,
}

impl MemoryAliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load aliases from `path` (a `name -> command` object, JSON or YAML) and
    /// keep the file in sync afterwards. A missing file starts empty.
    pub fn with_file(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let mut table = AliasTable::default();
        if path.exists() {
            for (name, command) in load_alias_file(&path)? {
                table.next_id += 1;
                let id = table.next_id;
                table.by_name.insert(name.clone(), AliasRecord { id, name, command });
            }
            log_debug!("loaded {} alias(es) from {}", table.by_name.len(), path.display());
        }
        Ok(Self {
            table: Mutex::new(table),
            writes: tokio::sync::Mutex::new(()),
            file: Some(path),
        })
    }

    /// Current aliases as `name -> command`.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().commands()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AliasTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut AliasTable) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let _writing = self.writes.lock().await;
        let (out, contents) = {
            let mut table = self.lock();
            let out = f(&mut table)?;
            let contents = self.file.as_ref().map(|_| table.commands());
            (out, contents)
        };
        if let (Some(path), Some(contents)) = (&self.file, contents) {
            save_alias_file(path, &contents).await.map_err(RemoteError::from)?;
        }
        Ok(out)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

fn load_alias_file(path: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read alias file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let value: Value = if is_yaml(path) {
        let yaml_v: serde_yaml::Value =
            serde_yaml::from_str(&raw).context("failed to parse YAML alias file")?;
        serde_json::to_value(yaml_v).context("failed to convert YAML to JSON")?
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON alias file")?
    };
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("alias file root must be an object"))?;
    obj.iter()
        .map(|(k, v)| match v {
            Value::String(cmd) => Ok((k.clone(), cmd.clone())),
            _ => anyhow::bail!("alias '{k}' must map to a command string"),
        })
        .collect()
}

async fn save_alias_file(path: &Path, aliases: &BTreeMap<String, String>) -> anyhow::Result<()> {
    let text = if is_yaml(path) {
        serde_yaml::to_string(aliases).context("failed to encode aliases as YAML")?
    } else {
        serde_json::to_string_pretty(aliases).context("failed to encode aliases as JSON")?
    };
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("failed to write alias file: {}", path.display()))
}

impl AliasStore for MemoryAliasStore {
    fn find_alias<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<AliasRecord>, RemoteError>> {
        async move { Ok(self.lock().by_name.get(name).cloned()) }.boxed()
    }

    fn create_alias<'a>(
        &'a self,
        name: &'a str,
        command: &'a str,
    ) -> BoxFuture<'a, Result<i64, RemoteError>> {
        async move {
            self.mutate(|t| {
                if t.by_name.contains_key(name) {
                    return Err(RemoteError::new(format!("alias '{name}' already exists")));
                }
                t.next_id += 1;
                let id = t.next_id;
                t.by_name.insert(
                    name.to_string(),
                    AliasRecord {
                        id,
                        name: name.to_string(),
                        command: command.to_string(),
                    },
                );
                Ok(id)
            })
            .await
        }
        .boxed()
    }

    fn update_alias<'a>(
        &'a self,
        id: i64,
        command: &'a str,
    ) -> BoxFuture<'a, Result<(), RemoteError>> {
        async move {
            self.mutate(|t| {
                let rec = t
                    .by_name
                    .values_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(|| RemoteError::new(format!("alias #{id} does not exist")))?;
                rec.command = command.to_string();
                Ok(())
            })
            .await
        }
        .boxed()
    }

    fn delete_alias(&self, id: i64) -> BoxFuture<'_, Result<(), RemoteError>> {
        async move {
            self.mutate(|t| {
                let before = t.by_name.len();
                t.by_name.retain(|_, r| r.id != id);
                if t.by_name.len() == before {
                    return Err(RemoteError::new(format!("alias #{id} does not exist")));
                }
                Ok(())
            })
            .await
        }
        .boxed()
    }
}

/* ---- Backend store ---- */

/// Aliases stored as `terminal.alias` records through the remote-call boundary.
pub struct RemoteAliasStore {
    backend: Arc<dyn RemoteCall>,
}

impl RemoteAliasStore {
    pub fn new(backend: Arc<dyn RemoteCall>) -> Self {
        Self { backend }
    }
}

fn expect_id(value: &Value) -> Result<i64, RemoteError> {
    value
        .as_i64()
        .or_else(|| value.as_array().and_then(|a| a.first()).and_then(Value::as_i64))
        .ok_or_else(|| RemoteError::new(format!("unexpected create result: {value}")))
}

impl AliasStore for RemoteAliasStore {
    fn find_alias<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<AliasRecord>, RemoteError>> {
        async move {
            let req = RemoteRequest::new(ALIAS_MODEL, "search_read")
                .kwarg("domain", json!([["name", "=", name]]))
                .kwarg("fields", json!(["name", "command"]))
                .kwarg("limit", json!(1));
            let rows = self.backend.call(req).await?;
            let Some(row) = rows.as_array().and_then(|r| r.first()) else {
                return Ok(None);
            };
            serde_json::from_value(row.clone())
                .map(Some)
                .map_err(|e| RemoteError::new(format!("malformed alias record: {e}")))
        }
        .boxed()
    }

    fn create_alias<'a>(
        &'a self,
        name: &'a str,
        command: &'a str,
    ) -> BoxFuture<'a, Result<i64, RemoteError>> {
        async move {
            let req = RemoteRequest::new(ALIAS_MODEL, "create")
                .arg(json!({"name": name, "command": command}));
            expect_id(&self.backend.call(req).await?)
        }
        .boxed()
    }

    fn update_alias<'a>(
        &'a self,
        id: i64,
        command: &'a str,
    ) -> BoxFuture<'a, Result<(), RemoteError>> {
        async move {
            let req = RemoteRequest::new(ALIAS_MODEL, "write")
                .arg(json!([id]))
                .arg(json!({"command": command}));
            self.backend.call(req).await.map(|_| ())
        }
        .boxed()
    }

    fn delete_alias(&self, id: i64) -> BoxFuture<'_, Result<(), RemoteError>> {
        async move {
            let req = RemoteRequest::new(ALIAS_MODEL, "unlink").arg(json!([id]));
            self.backend.call(req).await.map(|_| ())
        }
        .boxed()
    }
}

/// Store whose every call fails, for exercising error paths.
#[cfg(test)]
pub(crate) struct OfflineAliasStore;

#[cfg(test)]
impl AliasStore for OfflineAliasStore {
    fn find_alias<'a>(&'a self, _: &'a str) -> BoxFuture<'a, Result<Option<AliasRecord>, RemoteError>> {
        async { Err(RemoteError::new("alias store offline")) }.boxed()
    }

    fn create_alias<'a>(&'a self, _: &'a str, _: &'a str) -> BoxFuture<'a, Result<i64, RemoteError>> {
        async { Err(RemoteError::new("alias store offline")) }.boxed()
    }

    fn update_alias<'a>(&'a self, _: i64, _: &'a str) -> BoxFuture<'a, Result<(), RemoteError>> {
        async { Err(RemoteError::new("alias store offline")) }.boxed()
    }

    fn delete_alias(&self, _: i64) -> BoxFuture<'_, Result<(), RemoteError>> {
        async { Err(RemoteError::new("alias store offline")) }.boxed()
    }
}
