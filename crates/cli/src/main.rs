//! blocksmith CLI entry point.

use clap::Parser;

mod commands;
mod logging;
mod mempool;
mod report;

#[derive(Parser)]
#[command(name = "blocksmith")]
#[command(about = "Assemble and mine a proof-of-work block from a mempool", long_about = None)]
struct Cli {
    /// Default log filter when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<commands::Commands>,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(cmd) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("blocksmith - assemble and mine a proof-of-work block");
            println!("Run 'blocksmith --help' for usage information.");
        }
    }
}
