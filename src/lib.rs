//! Embeddable admin command console.
//!
//! ```text
//! let console = Console::builder(backend, output).build();
//! cmd::register_builtins(&console)?;
//! console.submit("search res.partner name,email").await;
//! ```
//!
//! Modules:
//!   console  : tokenizer, arg specs, registry, aliases, interpreter, line state
//!   cmd      : built-in commands
//!   backend  : remote-call / output / view-action boundaries and implementations
//!   config   : optional config file
//!   error    : error taxonomy
//!   repl     : interactive terminal front end (rustyline)
//!   utils    : logging + escaping helpers

pub mod utils;

pub mod backend;
pub mod cmd;
pub mod config;
pub mod console;
pub mod error;
pub mod repl;

pub use config::ConsoleConfig;
pub use console::{CommandDefinition, CommandOutput, Console, ConsoleBuilder};
pub use error::{ConsoleError, RemoteError, Result};
