use crate::demo::{run_calculate, run_compare, run_demo, CalculateArgs, CompareArgs, DemoArgs};
use crate::server;
use card_rewards::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Card Rewards",
    about = "Find the credit card that earns the most on a purchase",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Rank every card in a catalog for a single purchase
    Calculate(CalculateArgs),
    /// Compare two or three cards category by category
    Compare(CompareArgs),
    /// Walk through recommendations and comparisons on the bundled sample catalog
    Demo(DemoArgs),
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

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Calculate(args) => run_calculate(args),
        Command::Compare(args) => run_compare(args),
        Command::Demo(args) => run_demo(args),
    }
}
