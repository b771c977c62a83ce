#![forbid(unsafe_code)]

//! Replaces the contents of the identifier store with a list of video ids.
//!
//! Without arguments the built-in sample list is used. Ids can also come from
//! the command line or from a file with one id per line (`#` comments allowed).
//! `--append` adds ids to the existing rows instead of replacing them.
//!
//! On a fresh checkout with no env file, a template is written and the tool
//! exits so the API key can be filled in first.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use learntube::{
    config::{DEFAULT_DATABASE_PATH, DEFAULT_ENV_PATH, DEFAULT_YOUTUBE_API_KEY, load_config},
    logging::init_tracing,
    store::{IdentifierSource, IdentifierStore},
};
use tracing::info;

const DEFAULT_VIDEO_IDS: [&str; 10] = [
    "dQw4w9WgXcQ",
    "jNQXAC9IVRw",
    "9bZkp7q19f0",
    "OPf0YbXqDm0",
    "kJQP7kiw5Fk",
    "RgKAFK5djSk",
    "CevxZvSJLk8",
    "09R8_2nJtjg",
    "YQHsXMglC9A",
    "AJtDXIazrMo",
];

#[derive(Parser, Debug)]
#[command(author, version, about = "Seed the identifier store with video ids.")]
struct SeedArgs {
    #[arg(long = "env-file", value_name = "PATH", default_value = DEFAULT_ENV_PATH, help = "Path to the env file")]
    env_file: PathBuf,
    #[arg(
        long = "database",
        value_name = "PATH",
        help = "Override the identifier store location"
    )]
    database: Option<PathBuf>,
    #[arg(
        long = "from-file",
        value_name = "PATH",
        conflicts_with = "ids",
        help = "Read ids from a file, one per line"
    )]
    from_file: Option<PathBuf>,
    #[arg(long, help = "Keep existing rows and add the ids after them")]
    append: bool,
    #[arg(value_name = "VIDEO_ID", help = "Ids to store (defaults to the sample list)")]
    ids: Vec<String>,
}

fn main() -> Result<()> {
    let args = SeedArgs::parse();
    if write_env_template(&args.env_file)? {
        println!(
            "{} created. Set YOUTUBE_API_KEY (and DATABASE_PATH if needed), then run seed_ids again.",
            args.env_file.display()
        );
        return Ok(());
    }

    let mut config = load_config(&args.env_file)
        .with_context(|| format!("loading configuration from {}", args.env_file.display()))?;
    if let Some(database) = args.database.clone() {
        config.database_path = database;
    }
    init_tracing(config.log_format);

    let ids = resolve_ids(&args)?;
    if ids.is_empty() {
        bail!("no video ids to seed");
    }

    let store = IdentifierStore::open(&config.database_path).with_context(|| {
        format!(
            "opening identifier store {}",
            config.database_path.display()
        )
    })?;
    info!(path = %store.path().display(), "connected to identifier store");

    if args.append {
        let added = append(&store, &ids)?;
        info!("Appended {} new videos", added);
    } else {
        let inserted = seed(&store, &ids)?;
        info!("Cleared existing data and inserted {} videos", inserted);
    }

    let total = store.count().context("counting stored ids")?;
    println!("Found {} videos in the store", total);
    let stored = store.list_identifiers().context("reading back seeded ids")?;
    println!("Stored videos:");
    for row in &stored {
        println!("- Video ID: {}", row.video_id);
    }
    if let Some(first) = stored.first() {
        println!();
        println!("Sample document structure:");
        println!(
            "{}",
            serde_json::to_string_pretty(first).context("rendering sample document")?
        );
    }

    Ok(())
}

fn resolve_ids(args: &SeedArgs) -> Result<Vec<String>> {
    if let Some(path) = &args.from_file {
        return read_ids_file(path);
    }
    if !args.ids.is_empty() {
        return Ok(args.ids.iter().map(|id| id.trim().to_string()).collect());
    }
    Ok(DEFAULT_VIDEO_IDS.iter().map(|id| id.to_string()).collect())
}

fn read_ids_file(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn seed(store: &IdentifierStore, ids: &[String]) -> Result<usize> {
    store
        .replace_all(ids)
        .context("replacing stored video ids")
}

/// Inserts `ids` after the existing rows, skipping ones already stored.
/// Returns how many were new.
fn append(store: &IdentifierStore, ids: &[String]) -> Result<usize> {
    let mut added = 0;
    for id in ids {
        if store
            .insert(id)
            .with_context(|| format!("inserting video id {id}"))?
        {
            added += 1;
        }
    }
    Ok(added)
}

fn env_template() -> String {
    format!("DATABASE_PATH={DEFAULT_DATABASE_PATH}\nYOUTUBE_API_KEY={DEFAULT_YOUTUBE_API_KEY}\n")
}

/// Writes a template env file when `path` does not exist yet. Returns whether
/// a template was written.
fn write_env_template(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Creating {}", parent.display()))?;
    }
    fs::write(path, env_template()).with_context(|| format!("Writing {}", path.display()))?;
    Ok(true)
}
