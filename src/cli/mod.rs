//! CLI module for Overdraw
//!
//! Provides commands:
//! - `serve`: Start the drawing server (default)
//! - `config`: Print the effective configuration as TOML

use clap::{Args, Parser, Subcommand};

/// Shared whiteboard server
#[derive(Parser, Debug)]
#[command(name = "overdraw")]
#[command(about = "Shared drawing surface with self-expiring strokes")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve(ServeArgs),
    /// Print the effective configuration
    Config,
}

/// Overrides for `serve`; anything unset falls back to configuration
#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// Bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Only accept producers sending this Origin header
    #[arg(long, env = "VO_ORIGIN")]
    pub origin: Option<String>,

    /// Seconds of inactivity before a stroke disappears
    #[arg(long)]
    pub idle_timeout_secs: Option<u64>,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve(args)) => crate::server::run(args).await,
        Some(Commands::Config) => {
            let config = crate::server::load_config()?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        None => crate::server::run(ServeArgs::default()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_args_parse() {
        let cli = Cli::try_parse_from([
            "overdraw",
            "--log-json",
            "serve",
            "--port",
            "8080",
            "--origin",
            "https://draw.local",
        ])
        .unwrap();

        assert!(cli.log_json);
        match cli.command {
            Some(Commands::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.origin.as_deref(), Some("https://draw.local"));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["overdraw"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.log_json);
    }
}
