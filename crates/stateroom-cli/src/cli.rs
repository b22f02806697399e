//! Command-line interface for the stateroom utility
//!
//! Scrapes eta-hsm generated C++ artifacts into a state-machine model and
//! prints PlantUML diagrams or plain-text console dumps of it.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

use stateroom::core::logging::init_logging;
use stateroom::{DiagramOptions, StateMachine};

/// Stateroom - eta-hsm generated C++ to PlantUML state diagrams
#[derive(Parser)]
#[command(name = "stateroom")]
#[command(about = "Scrape eta-hsm generated C++ into PlantUML state diagrams")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Arguments shared by every subcommand: where the generated artifacts live
/// and which machine to scrape
#[derive(clap::Args)]
pub struct SourceArgs {
    /// Directory searched (recursively) for the generated artifacts
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Basename of the artifact set (e.g. exampleHsm for exampleHsm.hpp,
    /// exampleHsm-hsm.hpp, exampleHsm-inl.hpp)
    #[arg(short, long)]
    pub basename: String,

    /// C++ namespace qualifying the machine's dispatch functions
    #[arg(short, long)]
    pub namespace: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a PlantUML state diagram
    Diagram {
        #[command(flatten)]
        source: SourceArgs,

        /// State to use as the diagram's root (defaults to Top)
        #[arg(long)]
        top: Option<String>,

        /// Expand at most this many nesting levels below the root
        #[arg(long)]
        max_depth: Option<usize>,

        /// Render this state collapsed; may be given multiple times
        #[arg(long = "hide")]
        hide: Vec<String>,

        /// Omit entry/exit annotations and transition actions
        #[arg(long)]
        no_actions: bool,

        /// Replace guard expressions with a placeholder
        #[arg(long)]
        no_guards: bool,

        /// Event count past which multi-event labels wrap
        #[arg(long, default_value_t = 3)]
        wrap: usize,

        /// Output file (use - for stdout); defaults to <basename>-PlantUML.txt
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the state hierarchy as an indented tree
    Hierarchy {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the transition table in eUML syntax
    Table {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List every event used by the machine's transitions
    Events {
        #[command(flatten)]
        source: SourceArgs,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct EventReport {
    basename: String,
    events: Vec<String>,
    total: usize,
}

/// Main CLI application
#[derive(Default)]
pub struct StateroomApp;

impl StateroomApp {
    pub fn new() -> Self {
        Self
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over CLI flags
        let log_level = std::env::var("STATEROOM_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| cli.log_level.as_str().to_string());
        let log_format = std::env::var("STATEROOM_LOG_FORMAT")
            .ok()
            .unwrap_or_else(|| cli.log_format.as_str().to_string());

        if let Err(e) = init_logging(Some(&log_level), Some(&log_format)) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("Stateroom v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Diagram {
                source,
                top,
                max_depth,
                hide,
                no_actions,
                no_guards,
                wrap,
                output,
            } => self.diagram_command(
                source, top, max_depth, hide, no_actions, no_guards, wrap, output,
            ),
            Commands::Hierarchy { source } => self.hierarchy_command(source),
            Commands::Table { source } => self.table_command(source),
            Commands::Events { source, json } => self.events_command(source, json),
        }
    }

    /// Extract the machine named by the source arguments
    fn extract(&self, source: &SourceArgs) -> Result<StateMachine> {
        stateroom::extract_from_dir(&source.path, &source.basename, &source.namespace)
            .with_context(|| {
                format!(
                    "failed to extract '{}' from {}",
                    source.basename,
                    source.path.display()
                )
            })
    }

    /// Handle the diagram command
    #[allow(clippy::too_many_arguments)]
    fn diagram_command(
        &self,
        source: SourceArgs,
        top: Option<String>,
        max_depth: Option<usize>,
        hide: Vec<String>,
        no_actions: bool,
        no_guards: bool,
        wrap: usize,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let machine = self.extract(&source)?;

        let options = DiagramOptions {
            scope_root: top,
            max_depth,
            do_not_expand: hide,
            include_actions: !no_actions,
            include_guards: !no_guards,
            event_wrap: Some(wrap),
        };
        let doc = stateroom::diagram(&machine, options)?;

        let output =
            output.unwrap_or_else(|| PathBuf::from(format!("{}-PlantUML.txt", source.basename)));
        info!(output = %output.display(), "writing diagram");
        self.write_output(Some(output), &doc)
    }

    /// Handle the hierarchy command
    fn hierarchy_command(&self, source: SourceArgs) -> Result<()> {
        let machine = self.extract(&source)?;
        self.write_output(None, &machine.hierarchy_lines()?.join("\n"))
    }

    /// Handle the table command
    fn table_command(&self, source: SourceArgs) -> Result<()> {
        let machine = self.extract(&source)?;
        self.write_output(None, &machine.table_lines()?.join("\n"))
    }

    /// Handle the events command
    fn events_command(&self, source: SourceArgs, json: bool) -> Result<()> {
        let machine = self.extract(&source)?;
        let events: Vec<String> = machine.event_set().into_iter().collect();

        if json {
            let report = EventReport {
                basename: machine.basename().to_string(),
                total: events.len(),
                events,
            };
            self.write_output(None, &serde_json::to_string_pretty(&report)?)
        } else {
            self.write_output(None, &events.join("\n"))
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        let stdout_content = if content.is_empty() || content.ends_with('\n') {
            content.to_string()
        } else {
            format!("{}\n", content)
        };

        match output {
            Some(path) => {
                if path.to_string_lossy() == "-" {
                    print!("{}", stdout_content);
                    io::stdout().flush()?;
                } else {
                    fs::write(&path, content).map_err(|e| {
                        anyhow!("Failed to write output file '{}': {}", path.display(), e)
                    })?;
                }
            }
            None => {
                print!("{}", stdout_content);
                io::stdout().flush()?;
            }
        }
        Ok(())
    }
}
