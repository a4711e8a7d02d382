//! `alias <name> <command>`: create, update or (`-d`) delete an alias.

use crate::console::{CommandDefinition, CommandOutput, Console};
use crate::error::{ConsoleError, Result};
use crate::log_debug;

/// Command text that deletes the alias instead of storing it.
pub const DELETE_FLAG: &str = "-d";

pub fn register(console: &Console) -> Result<()> {
    console.register(
        CommandDefinition::new("alias", "ss", |console: Console, args: Vec<String>| async move {
            set_alias(&console, &args[0], &args[1]).await
        })?
        .summary("Create alias")
        .detail(
            "Create or update an alias.\nUse \"$1, $2, $n...\" for positional parameters.\nUse \"-d\" as <COMMAND> to delete the alias.",
        )
        .usage("<NAME> <COMMAND>"),
    );
    Ok(())
}

async fn set_alias(console: &Console, name: &str, command: &str) -> Result<CommandOutput> {
    let store = console.aliases();

    if command == DELETE_FLAG {
        let Some(rec) = store.find_alias(name).await? else {
            return Ok(CommandOutput::Text(format!("[!] '{name}' alias doesn't exist")));
        };
        store.delete_alias(rec.id).await?;
        return Ok(CommandOutput::Text(format!("'{name}' alias deleted successfully")));
    }

    if console.registry().contains_ignore_case(name) {
        return Err(ConsoleError::InvalidAliasName(name.to_string()));
    }

    match store.find_alias(name).await? {
        Some(rec) => {
            store.update_alias(rec.id, command).await?;
            log_debug!("alias '{name}' (#{}) updated", rec.id);
            Ok(CommandOutput::Text(format!("'{name}' alias updated successfully")))
        }
        None => {
            let id = store.create_alias(name, command).await?;
            log_debug!("alias '{name}' created as #{id}");
            Ok(CommandOutput::Text(format!("'{name}' alias created successfully")))
        }
    }
}
