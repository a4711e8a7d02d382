/*!
Record commands against the backend data layer.

  search <MODEL> <FIELDS> [DOMAIN]   search_read, printed as a table
  create <MODEL> [VALUES]            blank form, or create + report id
  write  <MODEL> <ID> <VALUES>       write([id], values)
  view   <MODEL> [ID]                list view, or form of one record

FIELDS is comma separated (`*` = all). DOMAIN / VALUES are JSON; single
quotes are accepted in place of double quotes.
*/

use serde_json::{Value, json};

use super::shared::{parse_domain, parse_fields, parse_id, parse_values, records_table};
use crate::backend::{ActionDescriptor, RemoteRequest};
use crate::console::{CommandDefinition, CommandOutput, Console};
use crate::error::Result;
use crate::log_trace;

pub fn register(console: &Console) -> Result<()> {
    console.register(
        CommandDefinition::new("search", "ss?s", |console: Console, args: Vec<String>| async move {
            search(&console, &args).await
        })?
        .summary("Search model record/s")
        .detail("Launch an ORM search query.\nFields are separated by commas, '*' selects all fields.\nDomain is a list of [field, operator, value] terms.")
        .usage("<MODEL> <FIELDS> [DOMAIN]"),
    );
    console.register(
        CommandDefinition::new("create", "s?s", |console: Console, args: Vec<String>| async move {
            create(&console, &args).await
        })?
        .summary("Create new record")
        .detail("Open a new model record in form view.\nWith VALUES the record is created directly.")
        .usage("<MODEL> [VALUES]"),
    );
    console.register(
        CommandDefinition::new("write", "sis", |console: Console, args: Vec<String>| async move {
            write(&console, &args).await
        })?
        .summary("Update a record")
        .detail("Write VALUES on the record ID of MODEL.")
        .usage("<MODEL> <ID> <VALUES>"),
    );
    console.register(
        CommandDefinition::new("view", "s?i", |console: Console, args: Vec<String>| async move {
            view(&console, &args).await
        })?
        .summary("View model record/s")
        .detail("Open model records in list view, or one record in form view.")
        .usage("<MODEL> [ID]"),
    );
    Ok(())
}

async fn search(console: &Console, args: &[String]) -> Result<CommandOutput> {
    let model = &args[0];
    let fields = parse_fields(&args[1]);
    let domain = parse_domain(args.get(2).map(String::as_str))?;

    let mut req = RemoteRequest::new(model.as_str(), "search_read").kwarg("domain", domain);
    if let Some(fields) = &fields {
        req = req.kwarg("fields", json!(fields));
    }
    let records = console.backend().call(req).await?;
    log_trace!(
        "search {model}: {} record(s)",
        records.as_array().map_or(0, Vec::len)
    );
    records_table(&records, fields.as_deref())
}

async fn create(console: &Console, args: &[String]) -> Result<CommandOutput> {
    let model = &args[0];
    let Some(raw) = args.get(1) else {
        console
            .actions()
            .open_action(ActionDescriptor::form(model.as_str(), None))
            .await?;
        return Ok(CommandOutput::None);
    };
    let values = parse_values(raw)?;
    let req = RemoteRequest::new(model.as_str(), "create").arg(Value::Object(values));
    let id = console.backend().call(req).await?;
    let id = match &id {
        Value::Array(ids) => ids.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    };
    Ok(CommandOutput::Text(format!(
        "{model} record created with id {}",
        crate::utils::output::display_value(&id)
    )))
}

async fn write(console: &Console, args: &[String]) -> Result<CommandOutput> {
    let model = &args[0];
    let id = parse_id(&args[1])?;
    let values = parse_values(&args[2])?;
    let req = RemoteRequest::new(model.as_str(), "write")
        .arg(json!([id]))
        .arg(Value::Object(values));
    console.backend().call(req).await?;
    Ok(CommandOutput::Text(format!("{model} record {id} updated")))
}

async fn view(console: &Console, args: &[String]) -> Result<CommandOutput> {
    let model = args[0].as_str();
    let action = match args.get(1) {
        Some(raw) => ActionDescriptor::form(model, Some(parse_id(raw)?)),
        None => ActionDescriptor::list(model),
    };
    console.actions().open_action(action).await?;
    Ok(CommandOutput::None)
}
