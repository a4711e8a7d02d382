//! Session commands: `clear`, `history`, `debug <mode>`.

use crate::console::{CommandDefinition, CommandOutput, Console};
use crate::error::Result;
use crate::utils::logging::{level_for_debug_mode, set_log_level};

pub fn register(console: &Console) -> Result<()> {
    console.register(
        CommandDefinition::new("clear", "", |_, _| async { Ok(CommandOutput::Clear) })?
            .summary("Clean the screen")
            .usage(""),
    );
    console.register(
        CommandDefinition::new("history", "", |console: Console, _| async move {
            let lines: Vec<String> = console
                .history()
                .iter()
                .enumerate()
                .map(|(i, line)| format!("{:>4}  {line}", i + 1))
                .collect();
            Ok(CommandOutput::Text(lines.join("\n")))
        })?
        .summary("Show submitted lines")
        .usage(""),
    );
    console.register(
        CommandDefinition::new("debug", "i", |_, args: Vec<String>| async move {
            let mode: i64 = args[0].parse().map_err(|e| {
                crate::error::ConsoleError::MalformedPayload(format!("debug mode '{}': {e}", args[0]))
            })?;
            let level = level_for_debug_mode(mode);
            set_log_level(level);
            Ok(CommandOutput::Text(format!("log level set to {}", level.as_str())))
        })?
        .summary("Set the log level")
        .detail("0 ~> info, 1 ~> debug, 2 or more ~> trace, negative ~> errors only")
        .usage("<MODE>"),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::backend::{BufferSink, MemoryBackend};
    use crate::console::{CommandOutput, Console};
    use crate::utils::logging::{LogLevel, current_log_level, set_log_level};
    use std::sync::Arc;

    fn console() -> (Console, BufferSink) {
        let sink = BufferSink::new();
        let c = Console::builder(Arc::new(MemoryBackend::new()), Arc::new(sink.clone())).build();
        crate::cmd::register_builtins(&c).unwrap();
        (c, sink)
    }

    #[tokio::test]
    async fn history_is_numbered() {
        let (c, sink) = console();
        c.submit("help view").await;
        c.submit("history").await;
        let out = sink.contents();
        assert!(out.contains("   1  help view"));
        assert!(out.contains("   2  history"));
    }

    #[tokio::test]
    async fn clear_empties_the_sink() {
        let (c, sink) = console();
        c.submit("help").await;
        assert!(!sink.contents().is_empty());
        c.submit("clear").await;
        assert!(sink.contents().is_empty());
    }

    #[tokio::test]
    async fn debug_sets_level() {
        let (c, _) = console();
        let out = c.execute("debug 1").await.unwrap();
        assert_eq!(out, CommandOutput::text("log level set to DEBUG"));
        assert_eq!(current_log_level(), LogLevel::Debug);
        set_log_level(LogLevel::Info);
        assert!(c.execute("debug on").await.is_err());
    }
}
