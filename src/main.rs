use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use mktboard::cli::list::parse_filter;
use mktboard::cli::setup::setup;
use mktboard::cli::ListOptions;
use mktboard::core::log::init_logging;
use mktboard::core::market::IndexKind;
use mktboard::core::{BarInterval, Language, SortDirection};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Display language (en, zh-CN). Overrides the configured language
    #[arg(short, long, global = true)]
    lang: Option<Language>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
struct ListArgs {
    /// Column key to sort by, e.g. weight or price
    #[arg(short, long)]
    sort: Option<String>,

    /// Sort ascending
    #[arg(long, conflicts_with = "desc")]
    asc: bool,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    /// Page to show, starting at 1
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Server-side filter as key=value; repeatable
    #[arg(short, long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
}

impl From<ListArgs> for ListOptions {
    fn from(args: ListArgs) -> ListOptions {
        let direction = match (args.asc, args.desc) {
            (true, _) => Some(SortDirection::Ascending),
            (_, true) => Some(SortDirection::Descending),
            _ => None,
        };
        ListOptions {
            sort: args.sort,
            direction,
            page: args.page,
            filters: args.filters,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Index constituents (nasdaq100, sp500, dow)
    Constituents {
        index: IndexKind,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Calendar-year returns of an index (nasdaq100, sp500, dow)
    History {
        index: IndexKind,
        #[command(flatten)]
        list: ListArgs,
    },
    /// QDII fund quotas
    Quota {
        #[command(flatten)]
        list: ListArgs,
    },
    /// ETF screener with market and leverage overviews
    Etf {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Latest intraday session for a symbol
    Chart {
        symbol: String,
        /// Bar interval (1m, 2m, 5m, 15m, 30m, 60m)
        #[arg(short, long)]
        interval: Option<BarInterval>,
    },
    /// Magnificent 7 intraday overview
    Mag7 {
        /// Bar interval (1m, 2m, 5m, 15m, 30m, 60m)
        #[arg(short, long)]
        interval: Option<BarInterval>,
    },
}

impl From<Commands> for mktboard::AppCommand {
    fn from(cmd: Commands) -> mktboard::AppCommand {
        match cmd {
            Commands::Constituents { index, list } => mktboard::AppCommand::Constituents {
                index,
                list: list.into(),
            },
            Commands::History { index, list } => mktboard::AppCommand::History {
                index,
                list: list.into(),
            },
            Commands::Quota { list } => mktboard::AppCommand::Quota { list: list.into() },
            Commands::Etf { list } => mktboard::AppCommand::Etf { list: list.into() },
            Commands::Chart { symbol, interval } => {
                mktboard::AppCommand::Chart { symbol, interval }
            }
            Commands::Mag7 { interval } => mktboard::AppCommand::Mag7 { interval },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => mktboard::cli::setup::setup_at_path(path),
            None => setup(),
        },
        Some(cmd) => mktboard::run_command(cmd.into(), cli.config_path.as_deref(), cli.lang).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
