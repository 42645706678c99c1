//! Top GitHub users for a location, using the blocking entry point
//!
//! Run with: cargo run -p topcontrib-github --example top_users -- <location> [50|100|150]
//!
//! Reads the token from GITHUB_TOKEN (unauthenticated search is heavily rate limited).

use std::process::ExitCode;

use topcontrib_github::{GITHUB_API, User, top_results_blocking};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let location = args.next().unwrap_or_default();
    let top = args.next().unwrap_or_else(|| "50".to_string());
    let token = std::env::var("GITHUB_TOKEN").unwrap_or_default();

    match top_results_blocking(&location, &top, GITHUB_API, &token) {
        Ok(records) => {
            for user in records.iter().filter_map(User::from_record) {
                println!("{:>10}  {:>6.2}  {}", user.id, user.score, user.url);
            }
            ExitCode::SUCCESS
        }
        Err(e) if e.is_validation() => {
            log::error!("{e}");
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("search failed: {e}");
            ExitCode::FAILURE
        }
    }
}
