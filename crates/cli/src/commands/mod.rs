//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod mine;
mod tx;
mod validate;

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the mempool, mine a block and write the report
    Mine(mine::MineArgs),
    /// Validate a single transaction file
    Validate(validate::ValidateArgs),
    /// Transaction operations
    Tx(tx::TxArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Mine(args) => mine::run(args),
        Commands::Validate(args) => validate::run(args),
        Commands::Tx(args) => tx::run(args),
    }
}
