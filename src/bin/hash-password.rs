//! Print a bcrypt hash suitable for ADMIN_PASSWORD_HASH.

use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin hash-password <PASSWORD> [COST]");
    std::process::exit(1);
}

fn main() {
    let mut args = env::args().skip(1);
    let password = args.next().unwrap_or_else(|| usage());
    let cost = match args.next() {
        Some(raw) => match raw.parse::<u32>() {
            Ok(cost) if (4..=31).contains(&cost) => cost,
            _ => {
                eprintln!("Cost must be a number between 4 and 31, got {}", raw);
                usage();
            }
        },
        None => DEFAULT_COST,
    };

    match hash(&password, cost) {
        Ok(hashed) => {
            println!("\nCost     : {}", cost);
            println!("Hash     : {}\n", hashed);
            println!("# Paste this into your .env:");
            println!("ADMIN_PASSWORD_HASH={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
