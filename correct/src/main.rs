use std::fs::File;
use std::io::{prelude::*, stdin, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use env_logger::{Builder, Env};
use qspell::{CostModelKind, Corrector, Model};

#[derive(Parser, Debug)]
#[command(about = "A program to correct misspelled queries.")]
struct Args {
    /// The model file to use when correcting queries
    #[arg(long)]
    model: PathBuf,

    /// The edit cost model: {uniform, empirical}
    #[arg(long)]
    mode: CostModelKind,

    /// A file of queries, one per line (reads stdin if omitted)
    #[arg(long)]
    queries: Option<PathBuf>,

    /// The number of alternatives kept per query word
    #[arg(long, default_value = "4")]
    max_alternatives: usize,

    /// The number of alternatives kept per word for queries of 4 or more words
    #[arg(long, default_value = "3")]
    long_query_max_alternatives: usize,

    /// The weight of the unigram probability when scoring candidates
    #[arg(long, default_value = "0.95")]
    interpolation: f64,
}

fn load_model(path: &Path) -> Result<Model, Box<dyn std::error::Error>> {
    let f = File::open(path)
        .map_err(|e| format!("cannot open {path:?}: {e}; run `train` to build a model"))?;
    let mut f = zstd::Decoder::new(f)?;
    let model = Model::read(&mut f)
        .map_err(|e| format!("cannot load {path:?}: {e}; re-run `train` to rebuild the model"))?;
    Ok(model)
}

/// Reads one query line. Invalid UTF-8 is replaced rather than rejected, so every input line
/// still gets an output line.
fn read_query<R>(rdr: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: BufRead + ?Sized,
{
    buf.clear();
    if rdr.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    Builder::from_env(Env::default().default_filter_or("info")).init();

    eprintln!("Loading model file...");
    let model = load_model(&args.model)?;
    let corrector = Corrector::new(model.language_model(), model.cost_model(args.mode))
        .max_alternatives(args.max_alternatives)
        .long_query_max_alternatives(args.long_query_max_alternatives)
        .interpolation(args.interpolation)?;

    let mut rdr: Box<dyn BufRead> = match args.queries {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(stdin().lock()),
    };

    eprintln!("Start correction");
    let mut n_queries = 0;
    let mut n_failures = 0;
    let start = Instant::now();
    let mut buf = vec![];
    while let Some(line) = read_query(&mut rdr, &mut buf)? {
        n_queries += 1;
        match corrector.correct(&line) {
            Ok(correction) => println!("{correction}"),
            Err(e) => {
                log::error!("failed to correct {line:?}: {e}");
                n_failures += 1;
                println!("{line}");
            }
        }
    }
    let duration = start.elapsed();
    eprintln!("Elapsed: {} [sec]", duration.as_secs_f64());
    eprintln!(
        "Speed: {} [queries/sec]",
        n_queries as f64 / duration.as_secs_f64()
    );

    if n_failures != 0 {
        return Err(format!("{n_failures} of {n_queries} queries could not be corrected").into());
    }
    Ok(())
}
