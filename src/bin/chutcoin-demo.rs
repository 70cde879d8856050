#![forbid(unsafe_code)]
//! Walks a fresh ledger through a short mining and transfer session.

use chutcoin::blockchain::Blockchain;
use chutcoin::config::load_config;
use chutcoin::crypto::{Address, KeyPair};
use chutcoin::logging::init_logging;
use chutcoin::transaction::Transaction;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

const DEMO_SECRET_KEY: &str = "30b56878271f1dfe313883d27d32942b77d06697af73c1c3d8312e79e896908b";

#[derive(Parser)]
#[command(author, version, about = "Run the ChutCoin demo session", long_about = None)]
struct Cli {
    /// Hex secret key of the wallet that mines and sends
    #[arg(long, default_value = DEMO_SECRET_KEY)]
    secret_key: String,
    /// Optional TOML config file
    #[arg(long, default_value = "chutcoin.toml")]
    config: PathBuf,
    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn send(
    chain: &mut Blockchain,
    wallet: &KeyPair,
    recipient: &str,
    amount: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut tx = Transaction::transfer(wallet.address(), Address::new(recipient), amount);
    tx.sign(wallet)?;
    chain.add_transaction(tx)?;
    println!("{} {} -> {}", "Sent".bright_cyan(), amount, recipient);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = load_config(&cli.config)?;
    let wallet = KeyPair::from_secret_hex(&cli.secret_key)?;
    let address = wallet.address();
    let mut chain = Blockchain::with_config(&config)?;

    println!("{} {}", "Wallet:".bright_green().bold(), address);

    let block = chain.mine_pending_transactions(&address)?;
    println!("{} {}", "Block mined:".bright_green(), block.hash);

    send(&mut chain, &wallet, "address2", 100)?;
    let block = chain.mine_pending_transactions(&address)?;
    println!("{} {}", "Block mined:".bright_green(), block.hash);

    send(&mut chain, &wallet, "address1", 50)?;
    let block = chain.mine_pending_transactions(&address)?;
    println!("{} {}", "Block mined:".bright_green(), block.hash);

    println!();
    println!(
        "{} {}",
        "Balance of miner:".bright_yellow().bold(),
        chain.balance_of(&address)
    );
    println!(
        "{} {}",
        "Transactions involving miner:".bright_yellow(),
        chain.history_of(&address).len()
    );

    println!();
    let verdict = if chain.is_chain_valid() {
        "Yes".bright_green()
    } else {
        "No".bright_red()
    };
    println!("{} {}", "Valid Blockchain:".bold(), verdict);
    Ok(())
}
