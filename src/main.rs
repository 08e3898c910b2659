use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, LevelFilter};

use crossfill::{find_fill, render_grid, Geometry, Vocabulary};

#[derive(Parser)]
#[command(name = "crossfill", about = "Fill a crossword grid from a word list", version)]
struct Cli {
    /// Grid structure file: `_` marks a fillable cell, anything else is a block
    structure: PathBuf,

    /// Word list, one word per line
    words: PathBuf,

    /// Also write the filled grid to this file, as plain text (no image output)
    output: Option<PathBuf>,

    /// Log propagation and search statistics
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn })
        .parse_default_env()
        .init();

    let structure = fs::read_to_string(&cli.structure)
        .with_context(|| format!("failed to read structure file {}", cli.structure.display()))?;
    let words = fs::read_to_string(&cli.words)
        .with_context(|| format!("failed to read word list {}", cli.words.display()))?;

    let geometry = Geometry::from_template_string(&structure)
        .with_context(|| format!("invalid structure in {}", cli.structure.display()))?;
    let vocabulary = Vocabulary::from_word_list_string(&words);

    let result = match find_fill(&geometry, &vocabulary) {
        Ok(result) => result,
        Err(failure) => {
            debug!("{:?}", failure);
            println!("No solution.");
            return Ok(());
        }
    };

    debug!("{:?}", result.statistics);

    let display_grid = render_grid(&geometry, &vocabulary, &result.assignment);
    println!("{}", display_grid);

    if let Some(output) = &cli.output {
        fs::write(output, display_grid + "\n")
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("written file to {}", output.display());
    }

    Ok(())
}
