use std::path::PathBuf;

use clap::{Parser, Subcommand};

use rentobuy::api::{self, CliScenario};

#[derive(Parser)]
#[command(name = "rentobuy", about = "Buy-vs-rent, sell-vs-keep, and payoff-vs-invest projections")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the JSON API server.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run one projection from a JSON payload file and print the report.
    Run {
        #[arg(long, value_enum)]
        scenario: CliScenario,
        #[arg(long)]
        inputs: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve { port } => {
            if let Err(error) = api::run_http_server(port).await {
                eprintln!("Server error: {error}");
                std::process::exit(1);
            }
        }
        Command::Run { scenario, inputs } => {
            let raw = match std::fs::read_to_string(&inputs) {
                Ok(raw) => raw,
                Err(error) => {
                    eprintln!("Cannot read {}: {error}", inputs.display());
                    std::process::exit(1);
                }
            };
            match api::run_from_json(scenario, &raw) {
                Ok(report) => println!("{report}"),
                Err(message) => {
                    eprintln!("Error: {message}");
                    std::process::exit(1);
                }
            }
        }
    }
}
