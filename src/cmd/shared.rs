//! Shared helpers for built-in commands: structured argument parsing and
//! record formatting.
//!
//! Structured arguments (domains, value maps) are JSON after quote
//! normalization, so `[['name', 'ilike', 'azure']]` and
//! `{'name': 'Foo'}` are accepted as typed.

use serde_json::{Map, Value};

use crate::console::CommandOutput;
use crate::console::tokenizer::normalize_quotes;
use crate::error::{ConsoleError, Result};
use crate::utils::output::display_value;

/* ---- Payload parsing ---- */

fn parse_payload(raw: &str) -> Result<Value> {
    serde_json::from_str(&normalize_quotes(raw))
        .map_err(|e| ConsoleError::MalformedPayload(format!("{raw}: {e}")))
}

/// Search domain: a JSON list of `[field, operator, value]` terms. Absent → `[]`.
pub fn parse_domain(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Array(Vec::new()));
    };
    match parse_payload(raw)? {
        v @ Value::Array(_) => Ok(v),
        other => Err(ConsoleError::MalformedPayload(format!(
            "domain must be a list, got {other}"
        ))),
    }
}

/// Field values: a JSON object.
pub fn parse_values(raw: &str) -> Result<Map<String, Value>> {
    match parse_payload(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(ConsoleError::MalformedPayload(format!(
            "values must be an object, got {other}"
        ))),
    }
}

/// Comma separated field names; `*` means every field (`None`).
pub fn parse_fields(raw: &str) -> Option<Vec<String>> {
    if raw.trim() == "*" {
        return None;
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Record id argument (already validated as an integer by the arg spec).
pub fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|e| ConsoleError::MalformedPayload(format!("record id '{raw}': {e}")))
}

/* ---- Record formatting ---- */

/// Lay out `search_read` results as an `ID`-first table.
///
/// With an explicit field list the columns follow it; otherwise they are
/// the union of the returned keys, alphabetically.
pub fn records_table(records: &Value, fields: Option<&[String]>) -> Result<CommandOutput> {
    let Value::Array(records) = records else {
        return Err(ConsoleError::MalformedPayload(format!(
            "expected a list of records, got {records}"
        )));
    };

    let columns: Vec<String> = match fields {
        Some(fields) => fields.iter().filter(|f| f.as_str() != "id").cloned().collect(),
        None => {
            let mut keys: Vec<String> = records
                .iter()
                .filter_map(Value::as_object)
                .flat_map(|r| r.keys())
                .filter(|k| k.as_str() != "id")
                .cloned()
                .collect();
            keys.sort();
            keys.dedup();
            keys
        }
    };

    let rows = records
        .iter()
        .map(|rec| {
            let cell = |key: &str| rec.get(key).map(display_value).unwrap_or_default();
            std::iter::once(cell("id"))
                .chain(columns.iter().map(|c| cell(c)))
                .collect()
        })
        .collect();

    let headers = std::iter::once("ID".to_string())
        .chain(columns.iter().map(|c| c.to_uppercase()))
        .collect();
    Ok(CommandOutput::Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn domain_accepts_single_quotes() {
        let d = parse_domain(Some("[['name', 'ilike', 'azure']]")).unwrap();
        assert_eq!(d, json!([["name", "ilike", "azure"]]));
        assert_eq!(parse_domain(None).unwrap(), json!([]));
    }

    #[test]
    fn domain_must_be_list() {
        let err = parse_domain(Some("{'a': 1}")).unwrap_err();
        assert!(matches!(err, ConsoleError::MalformedPayload(_)));
        assert!(parse_domain(Some("[[unquoted")).is_err());
    }

    #[test]
    fn values_must_be_object() {
        let v = parse_values("{'name': 'Foo', 'color': 3}").unwrap();
        assert_eq!(v.get("color"), Some(&json!(3)));
        assert!(parse_values("[1]").is_err());
    }

    #[test]
    fn fields_list_or_all() {
        assert_eq!(parse_fields("*"), None);
        assert_eq!(
            parse_fields("name, email,"),
            Some(vec!["name".to_string(), "email".to_string()])
        );
    }

    #[test]
    fn table_from_records() {
        let recs = json!([
            {"id": 1, "name": "Azure", "email": false},
            {"id": 2, "name": "Deco", "email": "deco@example.com"}
        ]);
        let fields = vec!["name".to_string(), "email".to_string()];
        let out = records_table(&recs, Some(&fields)).unwrap();
        assert_eq!(
            out,
            CommandOutput::Table {
                headers: vec!["ID".into(), "NAME".into(), "EMAIL".into()],
                rows: vec![
                    vec!["1".into(), "Azure".into(), "".into()],
                    vec!["2".into(), "Deco".into(), "deco@example.com".into()],
                ],
            }
        );
    }

    #[test]
    fn table_all_fields_sorted() {
        let recs = json!([{"id": 4, "zeta": 1, "alpha": "a"}]);
        let CommandOutput::Table { headers, .. } = records_table(&recs, None).unwrap() else {
            panic!("expected a table");
        };
        assert_eq!(headers, vec!["ID", "ALPHA", "ZETA"]);
    }
}
