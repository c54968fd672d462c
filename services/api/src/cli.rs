use std::path::PathBuf;

use crate::batch::{run_valuate, ValuateArgs};
use crate::server;
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use valora::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "valora-api",
    about = "Run the VALORA valuation, data feed, marketplace and gateway services",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the valuation services (default command)
    Serve(ServeArgs),
    /// Start the public gateway in front of a remote orchestrator
    Gateway(ServeArgs),
    /// Value a CSV batch or a single JSON request without starting a server
    Valuate(ValuateCommand),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ValuateCommand {
    /// CSV file with a `class` column and one attribute per remaining column
    #[arg(long)]
    csv: Option<PathBuf>,
    /// JSON file holding a single valuation request
    #[arg(long)]
    json: Option<PathBuf>,
}

impl TryFrom<ValuateCommand> for ValuateArgs {
    type Error = clap::Error;

    fn try_from(value: ValuateCommand) -> Result<Self, Self::Error> {
        match (value.csv, value.json) {
            (Some(path), _) => Ok(ValuateArgs::Csv(path)),
            (None, Some(path)) => Ok(ValuateArgs::Json(path)),
            (None, None) => Err(Cli::command().error(
                ErrorKind::MissingRequiredArgument,
                "valuate needs --csv <FILE> or --json <FILE>",
            )),
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Gateway(args) => server::run_gateway(args).await,
        Command::Valuate(args) => {
            let args = ValuateArgs::try_from(args).unwrap_or_else(|err| err.exit());
            run_valuate(args)
        }
    }
}
