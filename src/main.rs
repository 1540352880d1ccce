//! strie CLI - Command line interface for state_trie
//!
//! Replays a JSON script of per-round edits into an in-memory trie and
//! inspects the resulting states.

use anyhow::Context;
use clap::{Parser, Subcommand};
use state_trie::replay::key_path;
use state_trie::{
    diff_roots, get_changes, prune_below_version, Cancellation, DiffEntry, NodeStore, Replay,
    Script, Sequence, TrieConfig,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "strie")]
#[command(about = "A versioned merkle patricia trie for blockchain state")]
#[command(version)]
struct Cli {
    /// Path to the round script (JSON)
    #[arg(short, long)]
    script: PathBuf,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Config file (defaults to ~/.config/state_trie/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Nodes per batched store write
    #[arg(long)]
    batch_size: Option<usize>,

    /// Log per-node diagnostics
    #[arg(long)]
    trace: bool,

    /// Delete superseded nodes when saving each round
    #[arg(long)]
    include_deletes: bool,

    /// Abort whole-trie scans after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the script and show the root after each round
    Replay {
        /// Check every round's trie for structural errors
        #[arg(long)]
        validate: bool,
    },

    /// Get the value of a key
    Get {
        /// The key
        key: String,
        /// Read the state as of this round (default: last round)
        #[arg(short, long)]
        round: Option<Sequence>,
    },

    /// Print the trie node by node
    Dump {
        /// Dump the state as of this round (default: last round)
        #[arg(short, long)]
        round: Option<Sequence>,
    },

    /// Show the nodes each round wrote
    History {
        /// First round to include
        #[arg(long, default_value = "0")]
        from: Sequence,
        /// Last round to include
        #[arg(long, default_value_t = Sequence::MAX)]
        to: Sequence,
    },

    /// Keep the states from a round onward and prune everything older
    Prune {
        /// Oldest round whose state must stay readable
        keep: Sequence,
    },

    /// Show value changes between two rounds
    Diff {
        /// Earlier round
        from: Sequence,
        /// Later round (default: last round)
        to: Option<Sequence>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let cancel = match cli.timeout_ms {
        Some(ms) => Cancellation::with_timeout(std::time::Duration::from_millis(ms)),
        None => Cancellation::new(),
    };

    let script = Script::load(&cli.script)
        .with_context(|| format!("Failed to load script {}", cli.script.display()))?;
    let mut replay = Replay::new(config);
    let summaries = replay.run(&script)?;
    let last = replay.latest_round().unwrap_or(0);

    match cli.command {
        Commands::Replay { validate } => {
            if validate {
                replay.validate(&cancel)?;
            }
            output(
                &cli.format,
                &serde_json::json!({
                    "rounds": summaries,
                    "root": replay.root_at(last).to_hex(),
                    "nodes": replay.store().len(),
                    "validated": validate,
                }),
            );
        }

        Commands::Get { key, round } => {
            let round = round.unwrap_or(last);
            let trie = replay.trie_at(round);
            let value: Option<String> = trie.get(&key_path(&key))?;
            output(
                &cli.format,
                &serde_json::json!({
                    "key": key,
                    "round": round,
                    "value": value,
                    "root": trie.root().to_hex(),
                }),
            );
        }

        Commands::Dump { round } => {
            let round = round.unwrap_or(last);
            let trie = replay.trie_at(round);
            let mut buffer = Vec::new();
            trie.pretty_print(&mut buffer)?;
            let dump = String::from_utf8(buffer)?;

            match cli.format {
                OutputFormat::Text => print!("{}", dump),
                OutputFormat::Json => output(
                    &cli.format,
                    &serde_json::json!({
                        "round": round,
                        "root": trie.root().to_hex(),
                        "nodes": dump.lines().collect::<Vec<_>>(),
                    }),
                ),
            }
        }

        Commands::History { from, to } => {
            let changes = get_changes(&**replay.store(), from, to, &cancel)?;
            let rounds: Vec<_> = changes
                .iter()
                .map(|(round, trie)| {
                    serde_json::json!({
                        "round": round,
                        "root": trie.root().to_hex(),
                        "nodes": trie.store().size(),
                    })
                })
                .collect();
            output(&cli.format, &serde_json::json!({ "history": rounds }));
        }

        Commands::Prune { keep } => {
            let before = replay.store().len();
            let retained: Vec<Sequence> = replay
                .roots()
                .keys()
                .copied()
                .filter(|&r| r >= keep)
                .chain(std::iter::once(keep))
                .collect();

            let mut bumped = 0;
            for &round in &retained {
                bumped += replay.trie_at(round).update_version(keep, &cancel)?.below_origin;
            }
            let stats = prune_below_version(
                &**replay.store(),
                keep,
                replay.config().batch_size,
                &cancel,
            )?;
            for &round in &retained {
                replay.trie_at(round).validate(&cancel)?;
            }

            output(
                &cli.format,
                &serde_json::json!({
                    "keep": keep,
                    "bumped": bumped,
                    "pruned": stats.deleted,
                    "batches": stats.batches,
                    "nodes_before": before,
                    "nodes_after": replay.store().len(),
                }),
            );
        }

        Commands::Diff { from, to } => {
            let to = to.unwrap_or(last);
            let store: Arc<dyn NodeStore> = replay.store().clone();
            let diff = diff_roots(store, replay.root_at(from), replay.root_at(to))?;
            let entries: Vec<_> = diff.entries.iter().map(diff_entry_json).collect();
            output(
                &cli.format,
                &serde_json::json!({
                    "from": from,
                    "to": to,
                    "added": diff.added_count(),
                    "removed": diff.removed_count(),
                    "modified": diff.modified_count(),
                    "entries": entries,
                }),
            );
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<TrieConfig> {
    let mut config = TrieConfig::load_or_default(cli.config.as_deref())?;
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    config.trace_state |= cli.trace;
    config.include_deletes |= cli.include_deletes;
    config.validate()?;
    Ok(config)
}

fn diff_entry_json(entry: &DiffEntry) -> serde_json::Value {
    let key = entry
        .path()
        .to_bytes()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
    match entry {
        DiffEntry::Added { path, new_hash } => serde_json::json!({
            "change": "added",
            "key": key,
            "path": path.to_hex(),
            "new_hash": new_hash.to_hex(),
        }),
        DiffEntry::Removed { path, old_hash } => serde_json::json!({
            "change": "removed",
            "key": key,
            "path": path.to_hex(),
            "old_hash": old_hash.to_hex(),
        }),
        DiffEntry::Modified {
            path,
            old_hash,
            new_hash,
        } => serde_json::json!({
            "change": "modified",
            "key": key,
            "path": path.to_hex(),
            "old_hash": old_hash.to_hex(),
            "new_hash": new_hash.to_hex(),
        }),
    }
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", value);
        }
        OutputFormat::Text => {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            );
        }
    }
}
