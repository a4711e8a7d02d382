//! `help [command]`

use crate::console::{CommandDefinition, CommandOutput, Console};
use crate::error::Result;

pub fn register(console: &Console) -> Result<()> {
    console.register(
        CommandDefinition::new("help", "?s", |console: Console, args: Vec<String>| async move {
            Ok(match args.first() {
                None => list_commands(&console),
                Some(name) => describe(&console, name),
            })
        })?
        .summary("Show commands and a quick definition")
        .detail("Show commands and a quick definition.\n- <> ~> Required parameter\n- [] ~> Optional parameter")
        .usage("[COMMAND]"),
    );
    Ok(())
}

fn list_commands(console: &Console) -> CommandOutput {
    let lines: Vec<String> = console
        .registry()
        .list_sorted()
        .iter()
        .map(|def| format!("{} - {}", def.name, def.summary))
        .collect();
    CommandOutput::Text(lines.join("\n"))
}

fn describe(console: &Console, name: &str) -> CommandOutput {
    match console.registry().lookup(name) {
        Some(def) => {
            let mut text = String::new();
            if !def.detail.is_empty() {
                text.push_str(&def.detail);
                text.push_str("\n\n");
            }
            text.push_str(&format!("Usage: {} {}", def.name, def.usage));
            CommandOutput::Text(text.trim_end().to_string())
        }
        None => CommandOutput::Text(format!("[!] '{name}' command doesn't exist")),
    }
}
