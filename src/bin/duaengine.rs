//! Minimal demonstration binary wiring the engine together: parse a root
//! path, run an analysis, print the top-level breakdown. Not a shell — see
//! the crate root doc comment for what's deliberately left out.

use std::path::PathBuf;

use clap::Parser;
use dua_engine::{Coordinator, EngineConfig, SequentialSizer, Sizer};

/// Parallel directory-tree sizing engine.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory to analyze.
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Number of worker threads. 0 uses available parallelism.
    #[arg(short, long, default_value_t = 0)]
    workers: usize,

    /// Disable the worker pool and run a single-threaded scan instead.
    #[arg(long)]
    sequential: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli.root.canonicalize().unwrap_or(cli.root);

    let children = if cli.sequential {
        let mut sizer = SequentialSizer::new();
        sizer.set_root(&root)?;
        sizer.run()?;
        sizer.tree().sorted_children(sizer.tree().root)
    } else {
        let mut coordinator = Coordinator::new(EngineConfig {
            worker_count: cli.workers,
            ..EngineConfig::default()
        });
        coordinator.set_root(&root)?;
        coordinator.run()?;
        coordinator.tree().sorted_children(coordinator.tree().root)
    };

    // Unadorned table, one row per immediate child: name, size, files_size,
    // incomplete. No unit scaling — that's the real formatter's job, out of
    // scope here.
    for (name, size, files_size, incomplete) in children {
        println!("{name}\t{size}\t{files_size}\t{incomplete}");
    }

    Ok(())
}
