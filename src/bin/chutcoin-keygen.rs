#![forbid(unsafe_code)]
//! Prints a fresh secp256k1 identity.

use chutcoin::crypto::generate_identity;
use clap::Parser;
use colored::*;

#[derive(Parser)]
#[command(author, version, about = "Generate a ChutCoin key pair", long_about = None)]
struct Cli {
    /// Print the key pair as a JSON object
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (secret_hex, address) = generate_identity();

    if cli.json {
        let out = serde_json::json!({
            "public_key": address.as_str(),
            "private_key": secret_hex,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} {}", "Public Key:".bright_green().bold(), address);
    println!();
    println!("{} {}", "Private Key:".bright_yellow().bold(), secret_hex);
    Ok(())
}
