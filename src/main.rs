use ankigen::apkg::{self, PackageError};
use ankigen::deck::{build_deck, DeckIds};
use ankigen::quiz::{load_quiz_file, QuizRecord};
use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use log::debug;
use rand::rng;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "ankigen")]
#[command(version, about = "Generate Anki decks from one or more JSON quiz files.", long_about = None)]
struct Args {
    /// Path(s) to the JSON quiz file(s).
    #[arg(value_name = "FILE", required = true, num_args = 1..)]
    input_files: Vec<PathBuf>,
    /// Name of the output Anki package file (.apkg).
    #[arg(short, long, value_name = "OUTPUT_FILE", default_value = "generated_anki_deck.apkg")]
    output: PathBuf,
    /// Name of the Anki deck to be created.
    #[arg(short, long, value_name = "DECK_NAME", default_value = "Generated Quiz Deck")]
    deck_name: String,
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Error)]
enum Error {
    #[error("cannot write the Anki package: {0}")]
    Package(#[from] PackageError),
}

/// Records from every file that loaded, in argument order.
#[derive(Debug, Default)]
struct LoadSummary {
    records: Vec<QuizRecord>,
    failed_files: usize,
}

fn load_all(paths: &[PathBuf]) -> LoadSummary {
    let mut summary = LoadSummary::default();
    for path in paths {
        println!("{}", format!("Loading data from {}...", path.display()).cyan());
        match load_quiz_file(path) {
            Ok(records) => summary.records.extend(records),
            Err(err) => {
                debug!("[Load] {:?}", err);
                println!("{}", format!("Error: {}. Skipping.", err).red());
                summary.failed_files += 1;
            }
        }
    }

    summary
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level)).init();

    let summary = load_all(&args.input_files);
    debug!(
        "[Setup] {} records loaded, {} files skipped",
        summary.records.len(),
        summary.failed_files
    );
    if summary.records.is_empty() {
        println!(
            "{}",
            "No valid data found across all input files. No Anki deck generated.".yellow()
        );
        return Ok(());
    }

    println!("{}", format!("\nCreating Anki deck '{}'...", args.deck_name).cyan());
    let ids = DeckIds::random(&mut rng());
    debug!("[Setup] Model id {}, deck id {}", ids.model_id, ids.deck_id);

    let deck = match build_deck(&summary.records, &args.deck_name, ids) {
        Some(deck) => deck,
        None => {
            println!("{}", "Failed to create Anki deck.".red());
            return Ok(());
        }
    };
    println!("Added {} cards to the deck.", deck.len());
    if deck.is_empty() {
        println!(
            "{}",
            "No question has a correct answer. No Anki deck generated.".yellow()
        );
        return Ok(());
    }

    apkg::write_package(&deck, &args.output)?;
    println!(
        "{}",
        format!("Successfully created '{}'.", args.output.display()).green()
    );

    Ok(())
}
