use clap::Parser;

use crate::blockchain::chain::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};

/// Command line configuration for the ledger server
#[derive(Debug, Clone, Parser)]
#[command(name = "pow_ledger", version, about = "A signed, proof-of-work ledger with a REST API")]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "LEDGER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "LEDGER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Leading zero hex characters required by proof of work
    #[arg(
        long,
        env = "LEDGER_DIFFICULTY",
        default_value_t = DEFAULT_DIFFICULTY,
        value_parser = clap::value_parser!(u8).range(1..=MAX_DIFFICULTY as i64)
    )]
    pub difficulty: u8,

    /// Send a transfer between two fresh wallets before serving
    #[arg(long)]
    pub demo: bool,
}
