/*!
Built-in console commands.

Layout:
  src/cmd/
    mod.rs      (this file: registration entry point)
    help.rs     help [COMMAND]
    alias.rs    alias <NAME> <COMMAND>
    records.rs  search / create / write / view
    session.rs  clear / history / debug
    shared.rs   payload parsing + record tables
    format.rs   plain-text table layout

Conventions:
  - Each command module exposes one `register(&Console)` function.
  - Handlers return `CommandOutput`; they never write to the sink directly
    (view actions go through the console's `ActionDispatcher`).
*/

pub mod alias;
pub mod format;
pub mod help;
pub mod records;
pub mod session;
pub mod shared;

use crate::console::Console;
use crate::error::Result;

/// Register every built-in command on `console`.
pub fn register_builtins(console: &Console) -> Result<()> {
    help::register(console)?;
    alias::register(console)?;
    records::register(console)?;
    session::register(console)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferSink, MemoryBackend};
    use std::sync::Arc;

    #[test]
    fn builtin_vocabulary() {
        let c = Console::builder(Arc::new(MemoryBackend::new()), Arc::new(BufferSink::new())).build();
        register_builtins(&c).unwrap();
        assert_eq!(
            c.registry().names(),
            vec!["alias", "clear", "create", "debug", "help", "history", "search", "view", "write"]
        );
        let specs: Vec<String> = c.registry().list_sorted().iter().map(|d| d.args.to_string()).collect();
        assert_eq!(specs, vec!["ss", "", "s?s", "i", "?s", "", "ss?s", "s?i", "sis"]);
    }

    #[test]
    fn registering_twice_changes_nothing() {
        let c = Console::builder(Arc::new(MemoryBackend::new()), Arc::new(BufferSink::new())).build();
        register_builtins(&c).unwrap();
        let before = c.registry().names();
        register_builtins(&c).unwrap();
        assert_eq!(c.registry().names(), before);
    }
}
