//! Circa CLI: incremental builds for circuit projects.
//!
//! Provides `circa graph` to inspect the include graph, `circa status` to show
//! which circuits need recompiling, `circa compile` to run the compiler on
//! stale circuits and update the compile cache, and `circa clean` to drop the
//! cache.

#![warn(missing_docs)]

mod clean;
mod compile;
mod graph;
mod logger;
mod pipeline;
mod status;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Circa: incremental circuit builds.
#[derive(Parser, Debug)]
#[command(name = "circa", version, about = "Incremental builds for circuit projects")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `circa.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the include graph.
    Graph(GraphArgs),
    /// Show which circuits are stale and why.
    Status,
    /// Compile stale circuits and update the cache.
    Compile(CompileArgs),
    /// Delete the cache directory.
    Clean,
}

/// Arguments for the `circa graph` subcommand.
#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Source name or path of a single file to show.
    pub file: Option<String>,

    /// List every reachable file instead of direct includes.
    #[arg(short, long)]
    pub transitive: bool,
}

/// Arguments for the `circa compile` subcommand.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Recompile every circuit regardless of the cache.
    #[arg(short, long)]
    pub force: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };
    logger::init_logger(cli.verbose, cli.quiet, color);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Graph(ref args) => graph::run(args, &global),
        Command::Status => status::run(&global),
        Command::Compile(ref args) => compile::run(args, &global),
        Command::Clean => clean::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_graph_default() {
        let cli = Cli::parse_from(["circa", "graph"]);
        match cli.command {
            Command::Graph(ref args) => {
                assert!(args.file.is_none());
                assert!(!args.transitive);
            }
            _ => panic!("expected Graph command"),
        }
    }

    #[test]
    fn parse_graph_with_args() {
        let cli = Cli::parse_from(["circa", "graph", "circuits/main.circom", "--transitive"]);
        match cli.command {
            Command::Graph(ref args) => {
                assert_eq!(args.file.as_deref(), Some("circuits/main.circom"));
                assert!(args.transitive);
            }
            _ => panic!("expected Graph command"),
        }
    }

    #[test]
    fn parse_compile_force() {
        let cli = Cli::parse_from(["circa", "compile", "-f"]);
        match cli.command {
            Command::Compile(ref args) => assert!(args.force),
            _ => panic!("expected Compile command"),
        }
    }

    #[test]
    fn parse_status_and_clean() {
        assert!(matches!(
            Cli::parse_from(["circa", "status"]).command,
            Command::Status
        ));
        assert!(matches!(
            Cli::parse_from(["circa", "clean"]).command,
            Command::Clean
        ));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["circa", "--quiet", "--color", "never", "status"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["circa", "compile", "--verbose", "--config", "x/circa.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("x/circa.toml"));
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(Cli::try_parse_from(["circa", "prove"]).is_err());
    }
}
