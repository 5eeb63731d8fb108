// SPDX-License-Identifier: MIT OR Apache-2.0
//! `showgraph` - command line driver for the show graph compiler.
//!
//! Reads an authoring show file, compiles it and writes the result:
//! - `compile` writes authoring or deployment output to a file or stdout
//! - `check` compiles for deployment and reports per-scene filter counts
//!
//! Logs go to stderr and are filtered with `RUST_LOG`.

use clap::{Parser, Subcommand, ValueEnum};
use showgraph_compiler::{
    read_show, write_show, CompileError, CompileMode, Compiler, CompilerConfig, ConfigError,
    ReadError, ShowDocument, WriteError,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a show file
    Compile {
        /// Authoring show file
        input: PathBuf,

        /// Output file, stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output flavor
        #[arg(long, value_enum, default_value_t = Mode::Deployment)]
        mode: Mode,

        /// Compiler configuration (RON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check that a show file compiles for deployment
    Check {
        /// Authoring show file
        input: PathBuf,

        /// Compiler configuration (RON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Authoring,
    Deployment,
}

impl From<Mode> for CompileMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Authoring => CompileMode::Authoring,
            Mode::Deployment => CompileMode::Deployment,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{}: {source}", .path.display())]
    Read { path: PathBuf, source: ReadError },

    #[error("Compile failed: {0}")]
    Compile(#[from] CompileError),

    #[error("Write failed: {0}")]
    Write(#[from] WriteError),
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("showgraph_compiler=info,showgraph=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Compile {
            input,
            output,
            mode,
            config,
        } => {
            let compiler = Compiler::new(load_config(config.as_deref())?);
            let document = load_show(&input)?;
            let compiled = compiler.compile(&document, mode.into())?;
            let xml = write_show(&compiled, compiler.config())?;

            match output {
                Some(path) => {
                    std::fs::write(&path, xml).map_err(|source| CliError::Io {
                        path: path.clone(),
                        source,
                    })?;
                    tracing::info!("Wrote {}", path.display());
                }
                None => println!("{xml}"),
            }
        }
        Command::Check { input, config } => {
            let compiler = Compiler::new(load_config(config.as_deref())?);
            let document = load_show(&input)?;
            let compiled = compiler.compile(&document, CompileMode::Deployment)?;
            for scene in &compiled.scenes {
                println!(
                    "scene {} '{}': {} authored, {} deployed",
                    scene.scene.id,
                    scene.scene.name,
                    scene.scene.filter_count(),
                    scene.filters.len()
                );
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<CompilerConfig, CliError> {
    match path {
        Some(path) => Ok(CompilerConfig::load(path)?),
        None => Ok(CompilerConfig::default()),
    }
}

fn load_show(path: &Path) -> Result<ShowDocument, CliError> {
    let xml = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_show(&xml).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const SHOW: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<showfile show_name="Test" default_active_scene="1">
  <scene id="1" human_readable_name="Main">
    <filter id="osc" type="VFILTER_SINE_OSCILLATOR" pos="10,10"/>
    <filter id="dbg" type="FILTER_DEBUG_OUTPUT_FLOAT" pos="200,10">
      <channellink input_channel_id="value" output_channel_id="osc:value"/>
    </filter>
  </scene>
</showfile>
"#;

    fn write_input(dir: &tempfile::TempDir, xml: &str) -> PathBuf {
        let path = dir.path().join("show.xml");
        std::fs::write(&path, xml).unwrap();
        path
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from(["showgraph", "compile", "show.xml", "--mode", "authoring"])
            .unwrap();
        match cli.command {
            Command::Compile { mode, output, .. } => {
                assert_eq!(mode, Mode::Authoring);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_compile_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, SHOW);
        let output = dir.path().join("deploy.xml");

        run(Command::Compile {
            input,
            output: Some(output.clone()),
            mode: Mode::Deployment,
            config: None,
        })
        .unwrap();

        let xml = std::fs::read_to_string(output).unwrap();
        assert!(xml.contains("osc__scale"));
        assert!(!xml.contains("VFILTER_"));
        assert!(!xml.contains("pos="));
    }

    #[test]
    fn test_config_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, SHOW);
        let config_path = dir.path().join("compiler.ron");
        CompilerConfig {
            max_expansion_depth: 0,
            ..CompilerConfig::default()
        }
        .save(&config_path)
        .unwrap();

        let result = run(Command::Check {
            input,
            config: Some(config_path),
        });
        assert!(matches!(
            result,
            Err(CliError::Compile(CompileError::ExpansionDepthExceeded { .. }))
        ));
    }

    #[test]
    fn test_check_reports_broken_links() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, &SHOW.replace("osc:value", "gone:value"));
        let result = run(Command::Check {
            input,
            config: None,
        });
        assert!(matches!(
            result,
            Err(CliError::Compile(CompileError::UnresolvedReference { .. }))
        ));
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(Command::Check {
            input: dir.path().join("absent.xml"),
            config: None,
        });
        assert!(matches!(result, Err(CliError::Io { .. })));
    }
}
