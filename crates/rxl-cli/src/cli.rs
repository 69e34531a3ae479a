use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::Level;

use rxl_server::{StoreConfig, StoreFormat};

#[derive(Parser)]
#[command(
    name = "rxl",
    about = "Rx Ledger: tamper-evident drug supply-chain ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        match (&self.command, self.verbose) {
            (_, true) => Level::DEBUG,
            (Command::Serve(_), false) => Level::INFO,
            _ => Level::WARN,
        }
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct StoreArgs {
    /// Ledger file [default: blockchain.json]
    #[arg(long = "store", global = true)]
    pub path: Option<PathBuf>,

    /// Use the framed append-only log instead of a JSON document
    #[arg(long, global = true)]
    pub log: bool,
}

impl StoreArgs {
    /// Apply the `--store` and `--log` flags on top of `base`.
    pub fn apply(&self, mut base: StoreConfig) -> StoreConfig {
        if let Some(path) = &self.path {
            base.path = path.clone();
        }
        if self.log {
            base.format = StoreFormat::Log;
        }
        base
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the ledger, creating the genesis block if needed
    Init,
    /// Record a supply-chain transaction
    Add(AddArgs),
    /// List blocks, newest first
    Log(LogArgs),
    /// Show a single block
    Show(ShowArgs),
    /// Verify chain integrity
    Verify,
    /// Show every transaction recorded for a drug
    History(HistoryArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(long)]
    pub drug_id: String,
    #[arg(long)]
    pub action: String,
    #[arg(long)]
    pub manufacturer: String,
}

#[derive(Args)]
pub struct LogArgs {
    /// Show at most N blocks
    #[arg(short = 'n', long = "max-count")]
    pub max_count: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub index: u64,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub drug_id: String,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<std::net::SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = parse(&["rxl", "verify", "--store", "chain.log", "--log", "--format", "json"]);
        assert!(matches!(cli.command, Command::Verify));
        assert_eq!(cli.format, OutputFormat::Json);

        let store = cli.store.apply(StoreConfig::default());
        assert_eq!(store.path, PathBuf::from("chain.log"));
        assert_eq!(store.format, StoreFormat::Log);
    }

    #[test]
    fn store_defaults_are_kept_without_flags() {
        let cli = parse(&["rxl", "init"]);
        assert_eq!(cli.store.apply(StoreConfig::default()), StoreConfig::default());
        assert_eq!(cli.log_level(), Level::WARN);
    }

    #[test]
    fn add_requires_every_field() {
        assert!(Cli::try_parse_from(["rxl", "add", "--drug-id", "D1"]).is_err());
        let cli = parse(&[
            "rxl", "add", "--drug-id", "D1", "--action", "shipped", "--manufacturer", "Acme",
        ]);
        match cli.command {
            Command::Add(args) => {
                assert_eq!(args.drug_id, "D1");
                assert_eq!(args.action, "shipped");
                assert_eq!(args.manufacturer, "Acme");
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn log_options() {
        let cli = parse(&["rxl", "log", "-n", "3", "--oneline"]);
        match cli.command {
            Command::Log(args) => {
                assert_eq!(args.max_count, Some(3));
                assert!(args.oneline);
            }
            _ => panic!("expected log"),
        }
    }

    #[test]
    fn serve_logs_at_info() {
        let cli = parse(&["rxl", "serve", "--bind", "0.0.0.0:8080"]);
        assert_eq!(cli.log_level(), Level::INFO);
        match cli.command {
            Command::Serve(args) => assert_eq!(args.bind.unwrap().port(), 8080),
            _ => panic!("expected serve"),
        }
        assert_eq!(parse(&["rxl", "-v", "log"]).log_level(), Level::DEBUG);
    }
}
