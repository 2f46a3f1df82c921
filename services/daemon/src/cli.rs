use crate::server;
use clap::{Args, Parser, Subcommand};
use legis_tracker::error::AppError;
use legis_tracker::tracker::HistoryMode;

#[derive(Parser, Debug)]
#[command(
    name = "legis-tracker-daemon",
    about = "Track Canadian federal bills from the LEGISinfo feed",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the feed on a schedule and serve status endpoints (default command)
    Run(RunArgs),
    /// Load every historical session into the store, then exit
    Backfill,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Skip the historical backfill even when the store is sparse
    #[arg(long, conflicts_with = "force_historical")]
    pub(crate) no_historical: bool,
    /// Run the historical backfill even when the store is populated
    #[arg(long)]
    pub(crate) force_historical: bool,
    /// Override the configured host for the status server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the status server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

impl RunArgs {
    pub(crate) fn history_mode(&self) -> HistoryMode {
        if self.force_historical {
            HistoryMode::Force
        } else if self.no_historical {
            HistoryMode::Skip
        } else {
            HistoryMode::WhenSparse
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => server::run(args).await,
        Command::Backfill => server::backfill().await,
    }
}
