//! Flash feed CLI
//!
//! Operator entry point: configuration checks, partition planning, manual
//! cache purges and one-off update checks. The HTTP server is
//! `flash-feed-server`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flash_feed::{
    cache::{self, ContentChange, PurgeEvent},
    config::load_all,
    error::{AppError, Result},
    services::{PartitionLayout, UpdateDetector},
    source,
    utils::log as report,
};

/// Flash feed operator tool
#[derive(Parser, Debug)]
#[command(name = "flash-feed", version, about = "Hot/Cold flash feed operator tool")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate configuration (file plus environment overrides)
    Validate,

    /// Print the Hot/Cold layout for a corpus size
    Plan {
        /// Newest article id (the article count when none were deleted)
        #[arg(long)]
        total: u64,
    },

    /// Purge cache tags for a content event
    Purge {
        /// single | historical | delete | style | rebuild | header | category
        event: String,

        /// Segment for a historical purge (narrows it to one segment)
        #[arg(long)]
        segment: Option<u32>,

        /// Print the tags without calling the CDN
        #[arg(long)]
        dry_run: bool,
    },

    /// Run one update check against the configured content source
    Check {
        /// Highest article id already seen
        #[arg(long, default_value_t = 0)]
        last_id: u64,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
    report::init(level);
}

fn plan(layout: &PartitionLayout, total: u64) {
    report::header(&format!("Partition plan for {total} articles"));
    let hot_window = layout.hot_window();
    let hot_pages = total.min(hot_window).div_ceil(u64::from(layout.page_size.max(1)));
    report::sub_item(&format!(
        "Hot window: {hot_window} articles ({} pages of {}), {hot_pages} in use",
        layout.hot_pages_limit, layout.page_size
    ));
    report::sub_item(&format!("Cold boundary: id <= {}", layout.cold_boundary(total)));

    let segments = layout.total_segments(total);
    for id in (1..=segments).rev() {
        if let Ok(range) = layout.segment_range(id, total) {
            let partial = if range.count() < u64::from(layout.segment_size) {
                " (partial)"
            } else {
                ""
            };
            report::sub_item(&format!(
                "Segment {id}: ids {}..={}{partial}",
                range.start, range.end
            ));
        }
    }

    report::summary(
        "Layout",
        &[
            ("Total segments", segments.to_string()),
            (
                "First cold segment",
                layout
                    .first_cold_segment_id(total)
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
        ],
    );
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_all(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            report::error(&e.to_string());
            return Err(e);
        }
    };
    log::info!("Loaded configuration from {}", cli.config.display());
    let layout = PartitionLayout::from_config(&config.feed);

    match cli.command {
        Command::Validate => {
            report::success("✓ Config OK");
            report::summary(
                "Configuration",
                &[
                    ("Source", format!("{:?} ({})", config.source.kind, config.source.url)),
                    ("Hot pages", config.feed.hot_pages_limit.to_string()),
                    ("Items per page", config.feed.items_per_page.to_string()),
                    ("Segment size", config.feed.segment_size.to_string()),
                    (
                        "CDN purge",
                        if config.cdn.credentials().is_some() {
                            "configured".to_string()
                        } else {
                            "disabled".to_string()
                        },
                    ),
                ],
            );
        }

        Command::Plan { total } => plan(&layout, total),

        Command::Purge {
            event,
            segment,
            dry_run,
        } => {
            let event = match (event.parse::<PurgeEvent>()?, segment) {
                (PurgeEvent::HistoricalUpdate { .. }, Some(id)) => {
                    layout.nominal_segment_range(id)?;
                    PurgeEvent::HistoricalUpdate { segment: Some(id) }
                }
                (_, Some(_)) => {
                    return Err(AppError::validation(
                        "--segment only applies to historical purges",
                    ));
                }
                (event, None) => event,
            };

            let tags = ContentChange::new(event).tags();
            report::header(&format!("Purge: {event}"));
            for tag in tags.iter() {
                report::sub_item(tag);
            }

            if dry_run {
                report::success("Dry run, nothing sent");
            } else {
                let purger = cache::purge::from_config(&config.cdn)?;
                let outcome = purger.purge_tags(tags.as_slice()).await?;
                report::summary(
                    "Purge",
                    &[
                        ("Backend", purger.name().to_string()),
                        ("Tags", outcome.requested.to_string()),
                        ("Requests", outcome.batches.to_string()),
                        ("Skipped", outcome.skipped.to_string()),
                    ],
                );
            }
        }

        Command::Check { last_id } => {
            let content = source::from_config(&config)?;
            let detector = UpdateDetector::new(content, &config.feed);
            let check = detector.check_updates(last_id).await?;
            report::summary(
                "Update check",
                &[
                    ("Last seen", last_id.to_string()),
                    ("New articles", check.new_count.to_string()),
                    ("Latest id", check.latest_id.to_string()),
                    ("Has updates", check.has_updates.to_string()),
                ],
            );
        }
    }

    Ok(())
}
