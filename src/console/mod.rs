/*!
Console core: everything between a raw input line and a rendered result.

  tokenizer    : line -> arguments (quoted groups)
  argspec      : compact argument signatures + validation
  registry     : command definitions by name
  alias        : stored templates with `$N` placeholders, alias stores
  interpreter  : `Console` session, dispatch, rendering
  line_state   : history navigation + tab completion
*/

pub mod alias;
pub mod argspec;
pub mod interpreter;
pub mod line_state;
pub mod registry;
pub mod tokenizer;

pub use alias::{AliasRecord, AliasStore, MemoryAliasStore, RemoteAliasStore};
pub use argspec::{ArgSpec, ArgType};
pub use interpreter::{CommandOutput, Console, ConsoleBuilder, DEFAULT_ALIAS_DEPTH};
pub use line_state::LineState;
pub use registry::{CommandDefinition, CommandRegistry};
pub use tokenizer::tokenize;
