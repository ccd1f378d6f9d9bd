//! Demo seed script
//!
//! Posts a handful of sample announcements through the regular service, so
//! normalization, id assignment and the configured backend are all exercised.
//!
//! Usage:
//!   ANNOUNCEMENTS_BACKEND=file ANNOUNCEMENTS_JSON=resources/announcements.json ./seed-demo --count 5
//!
//! Reads the same environment as the server (see `Config`).

use anyhow::{Context, Result};
use clap::Parser;

use announcements_board::{config::Config, open_store, services::announcements::AnnouncementService};

const SAMPLES: &[(&str, &str)] = &[
    ("Welcome to the board", "Post short notices here. The newest ones show up first."),
    ("Planned maintenance", "The building network will be down Saturday 08:00 to 10:00."),
    ("Lost and found", "A blue umbrella was left in meeting room B. Ask at the front desk."),
    ("Fire drill", "Quarterly fire drill on Tuesday at 10:00. Please use the east stairwell."),
    ("Kitchen", "The new coffee machine is in. Descaling instructions are taped to the side."),
];

#[derive(Parser)]
#[command(name = "seed-demo", about = "Seed the announcements board with demo posts")]
struct Args {
    /// Number of announcements to add (samples repeat past the built-in set)
    #[arg(long, default_value_t = 3)]
    count: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    let store = open_store(&config)
        .await
        .context("Failed to open announcement storage")?;
    let service = AnnouncementService::new(store);

    for (i, (title, text)) in SAMPLES.iter().cycle().take(args.count).enumerate() {
        let title = if i < SAMPLES.len() {
            title.to_string()
        } else {
            format!("{title} (#{})", i + 1)
        };
        let item = service
            .create(Some(&title), Some(*text))
            .await
            .with_context(|| format!("Failed to add demo announcement {title:?}"))?;
        println!("  Added {}: {}", item.id, item.title);
    }

    println!("Seeded {} announcement(s) on the {} backend", args.count, service.backend());
    Ok(())
}
