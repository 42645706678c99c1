//! Top subcommand - fetch the top users for a location

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use topcontrib_core::{
    CancellationToken, Record, ReqwestTransport, SHARED_RUNTIME, SharedProgress, cancel_on_ctrl_c,
    count_records, fmt_num,
};
use topcontrib_github::{CAP_VALUES, Contrib, Query, User, project_user};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct TopArgs {
    /// Location filter, e.g. "barcelona"
    #[arg(short, long)]
    pub location: String,

    /// Number of users to return (50, 100 or 150)
    #[arg(short, long, default_value = "50")]
    pub top: String,

    /// Keep every field GitHub returns instead of id/url/type/score
    #[arg(long)]
    pub raw: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON array on a single line
    Json,
    /// Indented JSON array
    Pretty,
    /// Table on stdout
    Table,
}

pub fn run(args: TopArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let query = Query::parse(&args.location, &args.top)
        .with_context(|| format!("invalid query (top must be one of {CAP_VALUES})"))?;

    let token = config.github.token.clone().unwrap_or_default();
    if token.is_empty() {
        log::warn!("No GitHub token configured; search requests are heavily rate limited");
    }

    let transport = ReqwestTransport::new(&config.http.http_config())
        .context("Cannot build HTTP client")?;
    let contrib = Contrib::new(Arc::new(transport), &config.github.api_url, token)
        .with_config(config.http.search_config());

    let pb = progress.query_line(query.location());
    pb.set_message(format!("searching top {}", query.cap()));
    let raw = args.raw;
    let drained = SHARED_RUNTIME.handle().block_on(async {
        let cancel = CancellationToken::new();
        cancel_on_ctrl_c(cancel.clone());

        let mut stream = contrib.stream(query, cancel.clone());
        if !raw {
            stream = stream.map(project_user);
        }
        let drained = stream.map(count_records(pb.clone())).subscribe().await;
        // Stops the ctrl-c listener.
        cancel.cancel();
        drained
    });
    pb.finish_and_clear();

    let records = drained.into_result().context("User search failed")?;
    log::info!("{} users", fmt_num(records.len()));
    write_records(&records, args.format)
}

fn write_records(records: &[Record], format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let data: Vec<_> = records.iter().map(Record::data).collect();
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut out, &data)?,
        OutputFormat::Pretty => serde_json::to_writer_pretty(&mut out, &data)?,
        OutputFormat::Table => write!(out, "{}", users_table(records))?,
    }
    writeln!(out)?;
    Ok(())
}

fn users_table(records: &[Record]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Id").fg(Color::Cyan),
            Cell::new("Type").fg(Color::Cyan),
            Cell::new("Score").fg(Color::Cyan),
            Cell::new("Url").fg(Color::Cyan),
        ]);
    for (rank, record) in records.iter().enumerate() {
        let Some(user) = User::from_record(record) else {
            log::debug!("skipping incomplete user record in table output");
            continue;
        };
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(user.id),
            Cell::new(&user.user_type),
            Cell::new(format!("{:.2}", user.score)),
            Cell::new(&user.url),
        ]);
    }
    table
}
