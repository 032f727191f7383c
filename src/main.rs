//! tasterank CLI - drive the preference engine against a local catalog.
//!
//! Two subcommands exercise the full pipeline:
//!
//! - `rank`: score a catalog under a saved preference state and print
//!   the top recommendations.
//! - `session`: run an interactive comparison session on stdin
//!   (1 = left, 2 = right, s = skip, q = quit), then print the learned
//!   summary and final ranking, optionally persisting the state.
//!
//! The catalog is a `master.json`-shaped array of game records. All
//! I/O is local files; the engine itself never touches the network.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tasterank::{
    GameRecord, PairSelector, PickSide, PreferenceModel, SelectorConfig, TagDictionary,
    UserPreferenceState,
};

/// Learn game preferences from pairwise choices and rank the catalog.
#[derive(Parser, Debug)]
#[command(name = "tasterank")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank a catalog under the current (or saved) preference state.
    Rank {
        /// Path to the catalog JSON (array of game records).
        catalog: PathBuf,

        /// Preference state file to load, if it exists.
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Number of games to print.
        #[arg(short, long, default_value_t = 20)]
        top: usize,
    },

    /// Run an interactive pairwise comparison session.
    Session {
        /// Path to the catalog JSON (array of game records).
        catalog: PathBuf,

        /// Preference state file to load before and save after.
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Number of comparisons before the session ends.
        #[arg(short, long, default_value_t = 20)]
        target: usize,

        /// RNG seed for reproducible pair selection.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Rank {
            catalog,
            state,
            top,
        } => run_rank(&catalog, state.as_deref(), top),
        Command::Session {
            catalog,
            state,
            target,
            seed,
        } => run_session(&catalog, state.as_deref(), target, seed),
    }
}

fn load_catalog(path: &Path) -> Result<Vec<GameRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let games: Vec<GameRecord> =
        serde_json::from_str(&raw).with_context(|| format!("parsing catalog {}", path.display()))?;
    anyhow::ensure!(!games.is_empty(), "catalog {} is empty", path.display());
    Ok(games)
}

/// Load a saved state if the file exists; a corrupt or incompatible
/// snapshot is reported and ignored rather than aborting the run.
fn load_state(model: &mut PreferenceModel, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading state {}", path.display()))?;
    match serde_json::from_str::<UserPreferenceState>(&raw) {
        Ok(state) => {
            if let Err(err) = model.import_state(&state) {
                eprintln!("ignoring saved state: {err}");
            }
        }
        Err(err) => eprintln!("ignoring unreadable state {}: {err}", path.display()),
    }
    Ok(())
}

fn save_state(model: &PreferenceModel, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&model.export_state())?;
    fs::write(path, json).with_context(|| format!("writing state {}", path.display()))?;
    Ok(())
}

fn run_rank(catalog: &Path, state: Option<&Path>, top: usize) -> Result<()> {
    let games = load_catalog(catalog)?;

    let mut model = PreferenceModel::new();
    model.initialize(TagDictionary::from_catalog(&games));
    if let Some(path) = state {
        load_state(&mut model, path)?;
    }

    print_ranking(&model, &games, top);
    Ok(())
}

fn run_session(
    catalog: &Path,
    state: Option<&Path>,
    target: usize,
    seed: Option<u64>,
) -> Result<()> {
    let games = load_catalog(catalog)?;

    let mut model = PreferenceModel::new();
    model.initialize(TagDictionary::from_catalog(&games));
    if let Some(path) = state {
        load_state(&mut model, path)?;
    }

    let mut selector = PairSelector::with_config(SelectorConfig {
        target_comparisons: target,
        ..SelectorConfig::default()
    });
    if let Some(seed) = seed {
        selector = selector.with_seed(seed);
    }
    selector.initialize_with_games(games.clone());

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(pair) = selector.next_pair(&model) {
        let progress = selector.progress();
        println!(
            "\n[{}/{}] Which do you prefer?",
            progress.current + 1,
            progress.total
        );
        println!("  1) {}  {}", pair.left.name, top_tags(&pair.left));
        println!("  2) {}  {}", pair.right.name, top_tags(&pair.right));
        print!("choice (1/2/s/q): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let pick = match line?.trim() {
            "1" => PickSide::Left,
            "2" => PickSide::Right,
            "s" => PickSide::Skip,
            "q" => break,
            other => {
                println!("unrecognized input {other:?}, skipping pair");
                PickSide::Skip
            }
        };

        selector.record_choice(&mut model, &pair.left, &pair.right, pick)?;
    }

    let summary = model.summary();
    if !summary.liked_tags.is_empty() {
        println!("\nYou seem to like:");
        for t in &summary.liked_tags {
            println!("  {:+.3}  {}", t.weight, t.tag);
        }
    }
    if !summary.disliked_tags.is_empty() {
        println!("You seem to avoid:");
        for t in &summary.disliked_tags {
            println!("  {:+.3}  {}", t.weight, t.tag);
        }
    }

    println!();
    print_ranking(&model, &games, 20);

    if let Some(path) = state {
        save_state(&model, path)?;
        println!("\nstate saved to {}", path.display());
    }
    Ok(())
}

fn print_ranking(model: &PreferenceModel, games: &[GameRecord], top: usize) {
    println!("Top {} of {} games:", top.min(games.len()), games.len());
    for rec in model.rank(games).into_iter().take(top) {
        println!("  {:>3}. {:<40} {:+.4}", rec.rank, rec.game.name, rec.score);
    }
}

/// A short tag preview for pair display: the three most-voted tags.
fn top_tags(game: &GameRecord) -> String {
    let mut tags: Vec<(&str, u32)> = game
        .tags
        .iter()
        .map(|(t, &v)| (t.as_str(), v))
        .collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let preview: Vec<&str> = tags.iter().take(3).map(|(t, _)| *t).collect();
    if preview.is_empty() {
        String::new()
    } else {
        format!("[{}]", preview.join(", "))
    }
}
