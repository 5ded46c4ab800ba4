use std::fs::File;
use std::io::{prelude::*, BufReader};
use std::path::{Path, PathBuf};

use clap::Parser;
use env_logger::{Builder, Env};
use qspell::{tokenize, CostModelKind, Corrector, Model};

#[derive(Parser, Debug)]
#[command(about = "A program to evaluate the accuracy of spelling correction.")]
struct Args {
    /// The model file to use when correcting queries
    #[arg(long)]
    model: PathBuf,

    /// The edit cost model: {uniform, empirical}
    #[arg(long)]
    mode: CostModelKind,

    /// A file of queries, one per line
    #[arg(long)]
    queries: PathBuf,

    /// A file of gold corrections, one per line, aligned with the queries
    #[arg(long)]
    gold: PathBuf,
}

fn load_model(path: &Path) -> Result<Model, Box<dyn std::error::Error>> {
    let f = File::open(path)
        .map_err(|e| format!("cannot open {path:?}: {e}; run `train` to build a model"))?;
    let mut f = zstd::Decoder::new(f)?;
    let model = Model::read(&mut f)
        .map_err(|e| format!("cannot load {path:?}: {e}; re-run `train` to rebuild the model"))?;
    Ok(model)
}

fn read_lines(path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let f = BufReader::new(File::open(path)?);
    Ok(f.lines().collect::<Result<_, _>>()?)
}

/// Gets `n / total`, or 0 when there is nothing to count.
fn ratio(n: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    n as f64 / total as f64
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    Builder::from_env(Env::default().default_filter_or("info")).init();

    eprintln!("Loading model file...");
    let model = load_model(&args.model)?;
    let corrector = Corrector::new(model.language_model(), model.cost_model(args.mode));

    let queries = read_lines(&args.queries)?;
    let gold = read_lines(&args.gold)?;
    if queries.len() != gold.len() {
        return Err(format!(
            "{} queries but {} gold corrections",
            queries.len(),
            gold.len()
        )
        .into());
    }

    eprintln!("Start correction");
    let mut n_correct = 0;
    let mut n_unchanged_correct = 0;
    let mut n_ranking = 0;
    let mut n_generation = 0;
    let mut n_errors = 0;
    for (i, (query, gold)) in queries.iter().zip(&gold).enumerate() {
        if i % 100 == 0 {
            eprint!("# of queries: {i}\r");
            std::io::stderr().flush()?;
        }
        let gold = tokenize(gold).join(" ");
        if tokenize(query).join(" ") == gold {
            n_unchanged_correct += 1;
        }
        let ranked = match corrector.rank(query) {
            Ok(ranked) => ranked,
            Err(e) => {
                log::error!("failed to correct {query:?}: {e}");
                n_errors += 1;
                continue;
            }
        };
        let position = ranked
            .iter()
            .position(|c| c.candidate().to_string() == gold);
        match position {
            Some(0) => n_correct += 1,
            Some(rank) => {
                log::debug!(
                    "ranking problem: {query:?} -> {:?}, gold {gold:?} at rank {rank}",
                    ranked[0].candidate().to_string()
                );
                n_ranking += 1;
            }
            None => {
                log::debug!("generation problem: {query:?}, gold {gold:?} never generated");
                n_generation += 1;
            }
        }
    }
    eprintln!("# of queries: {}", queries.len());

    let n_total = queries.len();
    if n_total == 0 {
        log::warn!("no queries to evaluate");
    }
    println!("Accuracy: {}", ratio(n_correct, n_total));
    println!(
        "Accuracy (no correction): {}",
        ratio(n_unchanged_correct, n_total)
    );
    println!(
        "Correct: {}, Ranking problems: {}, Generation problems: {}, Errors: {}",
        n_correct, n_ranking, n_generation, n_errors
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(0.75, ratio(3, 4));
        assert_eq!(0.0, ratio(0, 0));
    }
}
