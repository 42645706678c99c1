//! Config subcommand - print the effective configuration

use anyhow::Result;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::config::Config;

fn config_table(config: &Config) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec!["GitHub API URL", &config.github.api_url]);
    table.add_row(vec![
        "GitHub token",
        if config.github.token.is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec![
        "Connect timeout",
        &format!("{}s", config.http.connect_timeout),
    ]);
    table.add_row(vec![
        "Request timeout",
        &format!("{}s", config.http.request_timeout),
    ]);
    table.add_row(vec![
        "Max throttle retries",
        &config.http.max_throttle_retries.to_string(),
    ]);
    table
}

pub fn run(config: &Config) -> Result<()> {
    eprintln!("\n{}", config_table(config));
    Ok(())
}
