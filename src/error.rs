/*!
Error taxonomy for the console core.

Every failure a single submission can end in is one `ConsoleError` variant.
The interpreter is the only place that turns these into user-visible lines;
collaborators (backends, alias stores, action dispatchers) report failures as
`RemoteError` which the interpreter attributes to the command that caused it.
*/

use thiserror::Error;

/// Failure reported by an external collaborator (backend, alias store, view opener).
///
/// The message is surfaced to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RemoteError(pub String);

impl RemoteError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<anyhow::Error> for RemoteError {
    fn from(err: anyhow::Error) -> Self {
        Self(format!("{err:#}"))
    }
}

/// Errors produced while interpreting one console line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// No registered command and no stored alias with this name.
    #[error("'{0}' command not found")]
    CommandNotFound(String),

    /// Arguments rejected by the command's argument spec; the handler never ran.
    #[error("invalid arguments for '{command}' (usage: {command} {usage})")]
    InvalidArguments { command: String, usage: String },

    /// Alias expansion went deeper than the configured bound.
    #[error("alias '{name}' exceeded the expansion limit of {depth} levels")]
    AliasCycle { name: String, depth: usize },

    /// Alias name collides with a registered command.
    #[error("invalid alias name '{0}'")]
    InvalidAliasName(String),

    /// The backend rejected a call made on behalf of `command`.
    #[error("{command}: {cause}")]
    RemoteCallFailed { command: String, cause: String },

    /// The handler of `command` failed for any other reason.
    #[error("error executing '{command}': {cause}")]
    CommandExecutionFailed { command: String, cause: String },

    /// A structured argument (JSON domain / values) could not be parsed.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A command definition carried an unusable argument spec.
    #[error("invalid argument spec '{spec}': {reason}")]
    InvalidArgSpec { spec: String, reason: String },
}

impl ConsoleError {
    /// Failure inside a handler that is not tied to a backend call.
    pub fn execution(cause: impl Into<String>) -> Self {
        ConsoleError::CommandExecutionFailed {
            command: String::new(),
            cause: cause.into(),
        }
    }

    /// Fill in the command name on handler-originated errors that do not carry one yet.
    pub fn attribute(self, name: &str) -> Self {
        match self {
            ConsoleError::RemoteCallFailed { command, cause } if command.is_empty() => {
                ConsoleError::RemoteCallFailed {
                    command: name.to_string(),
                    cause,
                }
            }
            ConsoleError::CommandExecutionFailed { command, cause } if command.is_empty() => {
                ConsoleError::CommandExecutionFailed {
                    command: name.to_string(),
                    cause,
                }
            }
            other => other,
        }
    }
}

impl From<RemoteError> for ConsoleError {
    fn from(err: RemoteError) -> Self {
        ConsoleError::RemoteCallFailed {
            command: String::new(),
            cause: err.0,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConsoleError>;
