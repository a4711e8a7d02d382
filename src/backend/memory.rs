//! In-process data layer.
//!
//! Records live in `model -> id -> fields` maps behind a mutex. Supports the
//! ORM subset the built-in commands and the remote alias store use:
//! `search_read`, `read`, `create`, `write`, `unlink`.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use super::{RemoteCall, RemoteRequest};
use crate::error::RemoteError;
use crate::log_trace;

type Record = Map<String, Value>;

#[derive(Default)]
struct Tables {
    next_id: i64,
    models: BTreeMap<String, BTreeMap<i64, Record>>,
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly (fixtures); returns its id.
    pub fn insert(&self, model: &str, values: Value) -> i64 {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let values = match values {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        insert_record(&mut tables, model, values)
    }

    /// Number of records stored for `model`.
    pub fn count(&self, model: &str) -> usize {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .models
            .get(model)
            .map_or(0, BTreeMap::len)
    }

    fn dispatch(&self, req: &RemoteRequest) -> Result<Value, RemoteError> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        match req.method.as_str() {
            "search_read" => {
                let domain = req
                    .kwargs
                    .get("domain")
                    .or_else(|| req.args.first())
                    .cloned()
                    .unwrap_or_else(|| json!([]));
                let fields = req.kwargs.get("fields").or_else(|| req.args.get(1));
                let conditions = parse_domain(&domain)?;
                let fields = field_list(fields)?;
                let rows = tables
                    .models
                    .get(&req.model)
                    .into_iter()
                    .flat_map(|t| t.iter())
                    .filter(|(id, rec)| conditions.iter().all(|c| c.matches(**id, rec)))
                    .map(|(id, rec)| project(*id, rec, fields.as_deref()))
                    .collect();
                Ok(Value::Array(rows))
            }
            "read" => {
                let ids = id_list(req.args.first())?;
                let fields = field_list(req.kwargs.get("fields").or_else(|| req.args.get(1)))?;
                let table = tables.models.get(&req.model);
                let rows = ids
                    .iter()
                    .filter_map(|id| table.and_then(|t| t.get(id)).map(|rec| (*id, rec)))
                    .map(|(id, rec)| project(id, rec, fields.as_deref()))
                    .collect();
                Ok(Value::Array(rows))
            }
            "create" => {
                let values = match req.args.first() {
                    Some(Value::Object(map)) => map.clone(),
                    _ => return Err(RemoteError::new("create expects a values object")),
                };
                Ok(json!(insert_record(&mut tables, &req.model, values)))
            }
            "write" => {
                let ids = id_list(req.args.first())?;
                let Some(Value::Object(values)) = req.args.get(1) else {
                    return Err(RemoteError::new("write expects a values object"));
                };
                let table = tables.models.entry(req.model.clone()).or_default();
                if let Some(id) = ids.iter().find(|id| !table.contains_key(*id)) {
                    return Err(missing_record(&req.model, *id));
                }
                for id in &ids {
                    let Some(rec) = table.get_mut(id) else { continue };
                    for (k, v) in values {
                        if k != "id" {
                            rec.insert(k.clone(), v.clone());
                        }
                    }
                }
                Ok(Value::Bool(true))
            }
            "unlink" => {
                let ids = id_list(req.args.first())?;
                let table = tables.models.entry(req.model.clone()).or_default();
                if let Some(id) = ids.iter().find(|id| !table.contains_key(*id)) {
                    return Err(missing_record(&req.model, *id));
                }
                for id in &ids {
                    table.remove(id);
                }
                Ok(Value::Bool(true))
            }
            other => Err(RemoteError::new(format!(
                "method '{other}' is not supported on '{}'",
                req.model
            ))),
        }
    }
}

impl RemoteCall for MemoryBackend {
    fn call(&self, request: RemoteRequest) -> BoxFuture<'_, Result<Value, RemoteError>> {
        async move {
            log_trace!("memory call {}.{}", request.model, request.method);
            self.dispatch(&request)
        }
        .boxed()
    }
}

fn insert_record(tables: &mut Tables, model: &str, mut values: Record) -> i64 {
    tables.next_id += 1;
    let id = tables.next_id;
    values.remove("id");
    tables
        .models
        .entry(model.to_string())
        .or_default()
        .insert(id, values);
    id
}

fn missing_record(model: &str, id: i64) -> RemoteError {
    RemoteError::new(format!("Record {model}({id}) does not exist"))
}

fn project(id: i64, rec: &Record, fields: Option<&[String]>) -> Value {
    let mut row = Map::new();
    row.insert("id".into(), json!(id));
    match fields {
        Some(fields) => {
            for f in fields.iter().filter(|f| f.as_str() != "id") {
                row.insert(f.clone(), rec.get(f).cloned().unwrap_or(Value::Bool(false)));
            }
        }
        None => row.extend(rec.iter().map(|(k, v)| (k.clone(), v.clone()))),
    }
    Value::Object(row)
}

fn id_list(value: Option<&Value>) -> Result<Vec<i64>, RemoteError> {
    match value {
        Some(Value::Number(n)) => n.as_i64().map(|id| vec![id]),
        Some(Value::Array(items)) => items.iter().map(Value::as_i64).collect(),
        _ => None,
    }
    .ok_or_else(|| RemoteError::new("expected a record id or a list of ids"))
}

fn field_list(value: Option<&Value>) -> Result<Option<Vec<String>>, RemoteError> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(Some)
            .ok_or_else(|| RemoteError::new("fields must be a list of names")),
        Some(_) => Err(RemoteError::new("fields must be a list of names")),
    }
}

/* ---- Domain filtering ---- */

struct Condition {
    field: String,
    op: String,
    value: Value,
}

fn parse_domain(domain: &Value) -> Result<Vec<Condition>, RemoteError> {
    let Value::Array(items) = domain else {
        return Err(RemoteError::new("domain must be a list"));
    };
    items
        .iter()
        // "&" is implicit between conditions.
        .filter(|item| item.as_str() != Some("&"))
        .map(|item| match item.as_array().map(Vec::as_slice) {
            Some([Value::String(field), Value::String(op), value]) => Ok(Condition {
                field: field.clone(),
                op: op.clone(),
                value: value.clone(),
            }),
            _ => Err(RemoteError::new(format!("invalid domain term: {item}"))),
        })
        .collect()
}

impl Condition {
    fn matches(&self, id: i64, rec: &Record) -> bool {
        let id_value = json!(id);
        let actual = if self.field == "id" {
            &id_value
        } else {
            rec.get(&self.field).unwrap_or(&Value::Bool(false))
        };
        match self.op.as_str() {
            "=" | "==" => actual == &self.value,
            "!=" => actual != &self.value,
            "like" => contains(actual, &self.value, false),
            "ilike" => contains(actual, &self.value, true),
            "in" => self.value.as_array().is_some_and(|vs| vs.contains(actual)),
            "not in" => self.value.as_array().is_some_and(|vs| !vs.contains(actual)),
            "<" => compare(actual, &self.value).is_some_and(|o| o.is_lt()),
            "<=" => compare(actual, &self.value).is_some_and(|o| o.is_le()),
            ">" => compare(actual, &self.value).is_some_and(|o| o.is_gt()),
            ">=" => compare(actual, &self.value).is_some_and(|o| o.is_ge()),
            _ => false,
        }
    }
}

fn contains(actual: &Value, needle: &Value, ignore_case: bool) -> bool {
    let (Some(hay), Some(needle)) = (actual.as_str(), needle.as_str()) else {
        return false;
    };
    if ignore_case {
        hay.to_lowercase().contains(&needle.to_lowercase())
    } else {
        hay.contains(needle)
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
