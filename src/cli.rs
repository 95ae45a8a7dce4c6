// Command-line surface: clap definitions and the handlers behind them.
// Handlers get the HTTP client and the output context from a `Session`, so
// the whole flow from arguments to printed lines can run against a mock.

use crate::api::HttpClient;
use crate::config::{self, Config, ServiceKind};
use crate::dispatch::{self, Outcome};
use crate::document_id::DocumentId;
use crate::operation::{self, OperationKind};
use crate::output::Output;
use crate::progress;
use crate::status;
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::style::Color;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// The command-line tool for Vespa.ai.
#[derive(Parser, Debug)]
#[command(name = "vespa", version)]
#[command(about = "The command-line tool for Vespa.ai")]
#[command(long_about = "The command-line tool for Vespa.ai.\n\n\
    Use it on Vespa instances running locally, remotely or in the cloud.\n\
    Prefer web service API's to this in production.\n\n\
    Vespa documentation: https://docs.vespa.ai")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// The name or URL of the recipient of this command ('local' or an http(s) URL)
    #[arg(short, long, env = "VESPA_CLI_TARGET", global = true)]
    pub target: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Issue a document operation to Vespa
    ///
    /// The operation (put, update or remove) and document id are taken from
    /// the JSON file unless given as arguments.
    Document(DocumentArgs),

    /// Verify that a service is ready to use (query by default)
    Status {
        #[arg(value_enum, default_value_t = StatusService::Query)]
        service: StatusService,
    },

    /// Read or modify persistent settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Show the version of this tool
    Version,
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct DocumentArgs {
    #[command(subcommand)]
    pub command: Option<DocumentCommand>,

    /// JSON file containing a put, update or remove operation
    #[arg(value_name = "JSON-FILE")]
    pub file: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum DocumentCommand {
    /// Write a document
    Put {
        /// [<id>] <json-file>
        #[arg(required = true, num_args = 1..=2, value_name = "ID-OR-FILE")]
        args: Vec<String>,
    },
    /// Update fields of a document
    Update {
        /// [<id>] <json-file>
        #[arg(required = true, num_args = 1..=2, value_name = "ID-OR-FILE")]
        args: Vec<String>,
    },
    /// Remove a document
    Remove {
        /// <id> | <json-file>
        #[arg(required = true, num_args = 1..=2, value_name = "ID-OR-FILE")]
        args: Vec<String>,
    },
    /// Fetch a document and print it
    Get {
        /// Document id, e.g. id:mynamespace:music::a-head-full-of-dreams
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration option
    Set { key: String, value: String },
    /// Show one or all configuration options
    Get { key: Option<String> },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusService {
    Query,
    Document,
    Deploy,
}

impl From<StatusService> for ServiceKind {
    fn from(service: StatusService) -> Self {
        match service {
            StatusService::Query => ServiceKind::Query,
            StatusService::Document => ServiceKind::Document,
            StatusService::Deploy => ServiceKind::Deploy,
        }
    }
}

/// Marks a failure that was already written to the error sink.
#[derive(Debug, Error)]
#[error("command failed")]
pub struct Reported;

/// Everything a command needs from the outside world.
pub struct Session<'a> {
    pub output: Output,
    pub client: &'a dyn HttpClient,
    /// Where the config file lives; `None` locates it on first use.
    pub config_path: Option<PathBuf>,
}

impl<'a> Session<'a> {
    /// Runs one command and reports any failure exactly once. Returns whether
    /// the command succeeded.
    pub fn execute(&mut self, cli: Cli) -> bool {
        let target = cli.global.target;
        let result = match cli.command {
            Commands::Document(args) => self.document(target, args),
            Commands::Status { service } => self.status(target, service.into()),
            Commands::Config(command) => self.config(command),
            Commands::Version => {
                self.output
                    .print(format!("vespa version {}", env!("CARGO_PKG_VERSION")));
                Ok(())
            }
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                if e.downcast_ref::<Reported>().is_none() {
                    self.output.error(e);
                }
                false
            }
        }
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::default_path()?),
        }
    }

    fn resolve_target(&self, target: Option<String>, kind: ServiceKind) -> Result<String> {
        let name = match target {
            Some(name) => name,
            None => Config::load(&self.config_path()?)?.target,
        };
        Ok(config::resolve_target(&name, kind)?)
    }

    fn document(&mut self, target: Option<String>, args: DocumentArgs) -> Result<()> {
        match args.command {
            None => self.send(target, None, args.file.into_iter().collect()),
            Some(DocumentCommand::Put { args }) => self.send(target, Some(OperationKind::Put), args),
            Some(DocumentCommand::Update { args }) => {
                self.send(target, Some(OperationKind::Update), args)
            }
            Some(DocumentCommand::Remove { args }) => {
                self.send(target, Some(OperationKind::Remove), args)
            }
            Some(DocumentCommand::Get { id }) => self.get(target, &id),
        }
    }

    fn send(
        &mut self,
        target: Option<String>,
        kind: Option<OperationKind>,
        args: Vec<String>,
    ) -> Result<()> {
        // Resolve before touching config or network
        let op = operation::resolve(&args, kind, |path| fs::read(path))?;
        let target = self.resolve_target(target, ServiceKind::Document)?;

        let client = self.client;
        let outcome = progress::waiting(&mut self.output, || {
            dispatch::dispatch(client, &op, &target).into_result()
        })
        .ok_or(Reported)?;
        self.output.success(outcome);
        Ok(())
    }

    fn get(&mut self, target: Option<String>, id: &str) -> Result<()> {
        let id = DocumentId::parse(id)?;
        let target = self.resolve_target(target, ServiceKind::Document)?;

        let client = self.client;
        let outcome = progress::waiting(&mut self.output, || {
            dispatch::get(client, &id, &target).into_result()
        })
        .ok_or(Reported)?;
        if let Outcome::Success { body, .. } = outcome {
            self.output.print(body);
        }
        Ok(())
    }

    fn status(&mut self, target: Option<String>, kind: ServiceKind) -> Result<()> {
        let target = self.resolve_target(target, kind)?;
        let description = status::description(kind);
        let shown = self.output.highlight(&target, Color::Cyan);
        let shown_in_error = self.output.highlight_error(&target, Color::Cyan);

        let client = self.client;
        progress::waiting(&mut self.output, || {
            status::check(client, &target).map_err(|cause| {
                format!("{} at {} is not ready: {}", description, shown_in_error, cause)
            })
        })
        .ok_or(Reported)?;
        let ready = self.output.highlight("ready", Color::Green);
        self.output
            .print(format!("{} at {} is {}", description, shown, ready));
        Ok(())
    }

    fn config(&mut self, command: ConfigCommand) -> Result<()> {
        let path = self.config_path()?;
        let mut config = Config::load(&path)?;
        match command {
            ConfigCommand::Set { key, value } => {
                config.set(&key, &value)?;
                config.save(&path)?;
                tracing::debug!(path = %path.display(), key = %key, "config updated");
            }
            ConfigCommand::Get { key: Some(key) } => {
                let value = config.get(&key)?;
                self.output.print(format!("{} = {}", key, value));
            }
            ConfigCommand::Get { key: None } => {
                for (key, value) in config.entries() {
                    self.output.print(format!("{} = {}", key, value));
                }
            }
        }
        Ok(())
    }
}
