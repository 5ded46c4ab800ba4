use std::fs::File;
use std::io::{prelude::*, stderr, BufReader};
use std::path::PathBuf;

use clap::Parser;
use env_logger::{Builder, Env};
use qspell::{
    EmpiricalCostTrainer, LanguageModelTrainer, Model, NoisyChannelModel, UniformCostModel,
};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(about = "A program to train spelling correction models.")]
struct Args {
    /// A directory of corpus files, one document per line
    #[arg(long)]
    corpus: PathBuf,

    /// A tab-separated file of noisy and clean query pairs, one pair per line
    #[arg(long)]
    edits: Option<PathBuf>,

    /// The file to write the trained model to
    #[arg(long)]
    model: PathBuf,

    /// The weight of the unigram probability in bigram interpolation
    #[arg(long, default_value = "0.1")]
    lambda: f64,

    /// Fail on noisy/clean pairs that differ by more than one edit instead of skipping them
    #[arg(long)]
    strict: bool,

    /// The number of workers for zstd (0 means multithreaded will be disabled)
    #[arg(long, default_value = "0")]
    zstd_workers: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    Builder::from_env(Env::default().default_filter_or("info")).init();

    eprintln!("Loading corpus...");
    let mut lm_trainer = LanguageModelTrainer::new(args.lambda)?;
    let entries = WalkDir::new(&args.corpus).sort_by_file_name();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        log::info!("Loading {:?} ...", entry.path());
        let mut f = BufReader::new(File::open(entry.path())?);
        let mut buf = vec![];
        loop {
            buf.clear();
            if f.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            if lm_trainer.n_lines() % 10000 == 0 {
                eprint!("# of lines: {}\r", lm_trainer.n_lines());
                stderr().flush()?;
            }
            lm_trainer.push_line(&String::from_utf8_lossy(&buf));
        }
    }
    eprintln!("# of lines: {}", lm_trainer.n_lines());
    eprintln!("# of terms: {}", lm_trainer.n_terms());
    let language_model = lm_trainer.train();
    eprintln!("# of unigrams: {}", language_model.unigrams().len());
    eprintln!("# of bigrams: {}", language_model.bigrams().len());

    let mut edit_trainer = EmpiricalCostTrainer::new().strict(args.strict);
    if let Some(path) = args.edits {
        eprintln!("Loading {path:?} ...");
        let f = BufReader::new(File::open(path)?);
        for (i, line) in f.lines().enumerate() {
            if i % 10000 == 0 {
                eprint!("# of pairs: {i}\r");
                stderr().flush()?;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Some((noisy, clean)) = line.split_once('\t') else {
                if args.strict {
                    return Err(format!("line {}: expected a tab-separated pair", i + 1).into());
                }
                log::warn!("line {}: expected a tab-separated pair, skipped", i + 1);
                continue;
            };
            edit_trainer.push_pair(noisy, clean)?;
        }
        eprintln!("# of pairs: {}", edit_trainer.n_pairs());
        eprintln!("# of rejected pairs: {}", edit_trainer.n_rejected());
    }
    let empirical = edit_trainer.train();
    eprintln!("# of edits: {}", empirical.edits().count());

    let model = Model::new(
        language_model,
        NoisyChannelModel::new(UniformCostModel::default(), empirical),
    );

    eprintln!("Saving model file...");
    let mut f = zstd::Encoder::new(File::create(args.model)?, 19)?;
    f.multithread(args.zstd_workers)?;
    model.write(&mut f)?;
    f.finish()?;

    Ok(())
}
