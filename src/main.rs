use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Runtime;

use admin_console::backend::{
    McpBackend, MemoryBackend, OutputSink, RemoteCall, StdoutSink, parse_target,
};
use admin_console::console::{AliasStore, MemoryAliasStore, RemoteAliasStore};
use admin_console::utils;
use admin_console::{Console, ConsoleConfig, cmd, log_info, repl};

/// Admin Console - interactive command console for an admin data layer.
///
/// Usage:
///   admin-console                                  interactive session (Tab, Up/Down)
///   admin-console -c "search res.partner name"     run line(s) and exit
///
/// Global flags / env:
///   -v / -vv          Increase verbosity
///   -q / --quiet      Errors only
///   -b / --backend    Local MCP server exposing `execute_kw` (or CONSOLE_BACKEND env)
///   --config          JSON / YAML config file
///   --aliases         Alias file (JSON / YAML, name -> command)
///
/// Without a backend, records and aliases live in memory for the session.
///
/// Examples:
///   admin-console -b "erp-mcp --db acme"
///   admin-console -c 'alias pa "search res.partner name $1"' -c "pa \"[['id', '<', 5]]\""
#[derive(Parser, Debug)]
#[command(
    name = "admin-console",
    version,
    author,
    about = "Admin Console - command console for enterprise admin backends",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long)]
    quiet: bool,

    /// Backend target (local MCP server command line)
    #[arg(short = 'b', long = "backend", value_name = "TARGET")]
    backend: Option<String>,

    /// Config file (.json / .yaml / .yml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Alias file (.json / .yaml / .yml); created on first change
    #[arg(long, value_name = "PATH")]
    aliases: Option<PathBuf>,

    /// Run a console line and exit (repeatable, runs in order)
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    commands: Vec<String>,

    /// Skip the welcome banner
    #[arg(long)]
    no_banner: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::set_log_level(utils::derive_level(cli.verbose, cli.quiet));

    let config = match &cli.config {
        Some(path) => ConsoleConfig::load(path)?,
        None => ConsoleConfig::default(),
    };

    // Effective backend target (CLI flag > CONSOLE_BACKEND env > config file)
    let target = cli
        .backend
        .clone()
        .or_else(|| {
            std::env::var("CONSOLE_BACKEND")
                .ok()
                .filter(|s| !s.trim().is_empty())
        })
        .or_else(|| config.backend.clone());

    let backend: Arc<dyn RemoteCall> = match &target {
        Some(t) => {
            let spec = match parse_target(t) {
                Ok(spec) => spec,
                Err(e) => {
                    eprintln!("Invalid backend '{t}': {e}");
                    std::process::exit(2);
                }
            };
            log_info!("backend {spec}");
            Arc::new(McpBackend::from_target(&spec)?)
        }
        None => {
            log_info!("no backend configured; records are kept in memory");
            Arc::new(MemoryBackend::new())
        }
    };

    let alias_file = cli.aliases.clone().or_else(|| config.alias_file.clone());
    let aliases: Arc<dyn AliasStore> = match alias_file {
        Some(path) => Arc::new(MemoryAliasStore::with_file(path)?),
        None if target.is_some() => Arc::new(RemoteAliasStore::new(backend.clone())),
        None => Arc::new(MemoryAliasStore::new()),
    };

    let rt = Runtime::new().context("Failed to create Tokio runtime")?;
    run(&rt, cli, config, backend, aliases)
}

fn run(
    rt: &Runtime,
    cli: Cli,
    config: ConsoleConfig,
    backend: Arc<dyn RemoteCall>,
    aliases: Arc<dyn AliasStore>,
) -> Result<()> {
    let output: Arc<dyn OutputSink> = Arc::new(StdoutSink);
    let batch = !cli.commands.is_empty();

    // Terminals already echo what the user typed; batch lines are echoed here.
    let console = Console::builder(backend, output.clone())
        .aliases(aliases)
        .max_alias_depth(config.alias_depth)
        .echo(batch)
        .build();
    cmd::register_builtins(&console).context("failed to register built-in commands")?;

    if batch {
        for line in &cli.commands {
            rt.block_on(console.submit(line));
        }
        return Ok(());
    }

    if config.banner && !cli.no_banner {
        output.write_line(
            &format!("Admin Console v{}", env!("CARGO_PKG_VERSION")),
            true,
        );
        output.write_line("Type 'help' or 'help <command>' to start.", true);
    }
    repl::run(&console, rt)
}
