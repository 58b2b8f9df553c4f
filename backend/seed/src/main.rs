//! Seeds the tag master in Redis.
//!
//! Safe to rerun: the first run claims a marker record and later runs stop
//! there without writing.
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use server::{
    counter::RedisCounter,
    database::{RedisStore, init_redis},
    ids::IdGenerator,
    notify::{Dispatcher, LogOnly},
    services::{Context, SeedOutcome, TagService, tag::INITIAL_TAGS},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let connection = init_redis(&args.redis_url)
        .await
        .with_context(|| format!("Failed to connect to {}", args.redis_url))?;

    let tags = TagService::new(Context {
        store: Arc::new(RedisStore::new(connection.clone())),
        ids: Arc::new(IdGenerator::new(Arc::new(RedisCounter::new(connection)))),
        dispatcher: Arc::new(Dispatcher::new(vec![Box::new(LogOnly)])),
    });

    let pb = ProgressBar::new(INITIAL_TAGS.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let outcome = tags
        .seed_tag_master(|tag| {
            pb.set_message(format!("Created {}", tag.name));
            pb.inc(1);
        })
        .await
        .context("Failed to seed tag master")?;

    match outcome {
        SeedOutcome::Seeded(count) => {
            pb.finish_with_message("Done");
            info!(count, "Tag master seeded");
        }
        SeedOutcome::AlreadySeeded => {
            pb.abandon_with_message("Already seeded, nothing written");
        }
    }

    Ok(())
}
