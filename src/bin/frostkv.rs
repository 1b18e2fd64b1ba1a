//! frostkv Binary
//!
//! Opens a data directory, replays it and runs one action against it.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use frostkv::backup::Manifest;
use frostkv::replay::ReplayProgress;
use frostkv::{Command, Config, Engine, FrostError};
use tracing_subscriber::{fmt, EnvFilter};

/// frostkv
#[derive(Parser, Debug)]
#[command(name = "frostkv")]
#[command(about = "Durable, tiered multi-type key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./frostkv_data")]
    data_dir: PathBuf,

    /// Number of databases
    #[arg(long, default_value = "16")]
    databases: usize,

    /// Database commands run against
    #[arg(long, default_value = "0")]
    db: u8,

    /// fsync every store write
    #[arg(long)]
    sync: bool,

    /// Keep mutations in memory only
    #[arg(long)]
    no_persistence: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Run one command, e.g. `exec HSET user:1 name ada`
    Exec {
        #[arg(required = true, num_args = 1..)]
        args: Vec<String>,
    },

    /// Replay the store and print what was loaded
    Load,

    /// Copy the store into TARGET and wait for it to finish
    Backup { target: PathBuf },

    /// Print the manifest of a backup directory
    Manifest { path: PathBuf },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,frostkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        if e.is_fatal() {
            process::exit(1);
        }
        eprintln!("(error) {}", e);
        process::exit(2);
    }
}

fn run(args: Args) -> Result<(), FrostError> {
    if let Action::Manifest { path } = &args.action {
        let manifest = Manifest::read(path)?;
        println!("{}", manifest.render());
        return Ok(());
    }

    tracing::info!("frostkv v{}", frostkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir.display());

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .databases(args.databases)
        .sync_writes(args.sync)
        .persistence(!args.no_persistence)
        .build();

    let mut engine = Engine::open_with_hook(config, &mut |progress: &ReplayProgress| {
        tracing::info!(records = progress.records, "loading");
    })?;

    match args.action {
        Action::Exec { args: words } => {
            let words: Vec<Vec<u8>> = words.into_iter().map(String::into_bytes).collect();
            let command = Command::parse(&words)?;
            let reply = engine.execute(args.db, command)?;
            println!("{}", reply);
            if let Some(backup) = engine.take_backup() {
                let report = backup.wait()?;
                println!("{}", report.manifest.render());
            }
        }
        Action::Load => {
            let report = engine.replay_report();
            println!("records:        {}", report.records);
            println!("applied:        {}", report.applied);
            println!("  strings:      {}", report.strings);
            println!("  hashes:       {}", report.hashes);
            println!("  sets:         {}", report.sets);
            println!("  zsets:        {}", report.zsets);
            println!("frozen keys:    {}", report.frozen_indexed);
            println!("skipped frozen: {}", report.skipped_frozen);
            println!("elapsed:        {:?}", report.elapsed);
        }
        Action::Backup { target } => {
            let report = engine.backup_blocking(&target)?;
            println!("{}", report.manifest.render());
        }
        Action::Manifest { .. } => {}
    }

    engine.close()
}
