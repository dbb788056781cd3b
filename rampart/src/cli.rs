//! Contains the code used to parse command line parameters for rampart.
//!
//! [CliArgs::run] is called by the rampart main function and contains the bulk of the
//! bootstrapping code while the main function just parses the arguments.

use anyhow::{ensure, Context};
use clap::{Parser, Subcommand};

use std::path::PathBuf;

use crate::config::{self, Verbosity};
use crate::simulate::{simulate, SimulationParams};

/// Command line arguments to the Rampart binary.
///
/// Used for parsing with [clap].
#[derive(Parser, Debug)]
#[command(author, version, about, long_about, arg_required_else_help = true)]
pub struct CliArgs {
    /// Lowest log level to show
    #[arg(long = "log-level", value_name = "LOG_LEVEL", group = "log-level")]
    log_level: Option<log::LevelFilter>,

    /// Show verbose log output; sets log level to "debug"
    #[arg(short, long, group = "log-level")]
    verbose: bool,

    /// Show no log output; sets log level to "error"
    #[arg(short, long, group = "log-level")]
    quiet: bool,

    /// The subcommand to be invoked
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl CliArgs {
    /// returns the log level filter set by CLI args
    /// returns `None` if the user did not specify any log level filter via CLI
    ///
    /// NOTE: the clap feature of ["argument groups"](https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_3/index.html#argument-relations)
    /// ensures that the user can not specify more than one of the possible log level arguments.
    /// Note the `#[arg("group")]` in the [`CliArgs`] struct.
    pub fn get_log_level(&self) -> Option<log::LevelFilter> {
        if self.verbose {
            return Some(log::LevelFilter::Debug);
        }
        if self.quiet {
            return Some(log::LevelFilter::Error);
        }
        if let Some(level_filter) = self.log_level {
            return Some(level_filter);
        }
        None
    }

    /// Installs the logger; flags on the command line take precedence over `verbosity`
    fn setup_logging(&self, verbosity: Verbosity) {
        let mut log_builder = env_logger::Builder::from_default_env();
        log_builder.filter_level(self.get_log_level().unwrap_or(verbosity.log_level()));
        // A logger may already be installed when run from tests
        let _ = log_builder.try_init();
    }

    /// Run Rampart
    ///
    /// This is the bulk of our startup logic besides the actual event loop.
    pub fn run(&self) -> anyhow::Result<()> {
        use CliCommand::*;
        match &self.command {
            Some(GenConfig { config_file, force }) => {
                self.setup_logging(Verbosity::default());
                ensure!(
                    *force || !config_file.exists(),
                    "config file {config_file:?} already exists"
                );

                config::Rampart::default().store(config_file)?;
                log::info!("wrote default configuration to {config_file:?}");
            }

            Some(Validate { config_files }) => {
                self.setup_logging(Verbosity::default());
                for file in config_files {
                    match config::Rampart::load(file) {
                        Ok(config) => {
                            eprintln!("{file:?} is valid TOML and conforms to the expected schema");
                            match config.validate() {
                                Ok(_) => eprintln!("{file:?} has passed all logical checks"),
                                Err(err) => eprintln!("{file:?} contains logical errors: '{err}'"),
                            }
                        }
                        Err(e) => eprintln!("{file:?} is not valid: {e}"),
                    }
                }
            }

            Some(Simulate {
                config_file,
                spoofed,
                burst,
            }) => {
                let config = match config_file {
                    Some(path) => config::Rampart::load(path)?,
                    None => config::Rampart::default(),
                };
                self.setup_logging(config.verbosity);
                config
                    .validate()
                    .with_context(|| format!("invalid configuration {config_file:?}"))?;

                let params = SimulationParams {
                    spoofed: *spoofed,
                    burst: *burst,
                };
                let report = simulate(&config, &params)?;
                println!("{report}");
            }

            None => {} // clap prints help if no command is given
        }

        Ok(())
    }
}

/// represents a command specified via CLI
#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Generate a configuration file holding the default values
    GenConfig {
        config_file: PathBuf,

        /// Forcefully overwrite existing config file
        #[clap(short, long)]
        force: bool,
    },

    /// Validate configuration files
    Validate { config_files: Vec<PathBuf> },

    /// Simulate a legitimate initiator, a spoofed flood and a bursting source
    ///
    /// Runs entirely in-process on a simulated clock and prints a summary.
    Simulate {
        /// Configuration file to take the parameters from; defaults are used otherwise
        #[clap(short, long = "config", value_name = "CONFIG_FILE")]
        config_file: Option<PathBuf>,

        /// Number of distinct spoofed source addresses
        #[clap(long, default_value_t = SimulationParams::default().spoofed)]
        spoofed: usize,

        /// Number of back to back messages sent by the legitimate initiator
        #[clap(long, default_value_t = SimulationParams::default().burst)]
        burst: usize,
    },
}
