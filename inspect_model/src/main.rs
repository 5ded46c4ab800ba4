use std::fs;
use std::path::PathBuf;

use clap::Parser;
use qspell::Model;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "A program to inspect trained models.")]
struct Args {
    /// Input path of the model file
    #[arg(long)]
    model: PathBuf,

    /// Output unigram counts and probabilities to a CSV file.
    #[arg(long)]
    dump_unigrams: Option<PathBuf>,

    /// Output bigram counts and interpolated probabilities to a CSV file.
    #[arg(long)]
    dump_bigrams: Option<PathBuf>,

    /// Output learned edit operations to a CSV file.
    #[arg(long)]
    dump_edits: Option<PathBuf>,
}

#[derive(Serialize)]
struct UnigramRecord<'a> {
    term: &'a str,
    count: u32,
    log_prob: f64,
}

#[derive(Serialize)]
struct BigramRecord<'a> {
    first: &'a str,
    second: &'a str,
    count: u32,
    log_prob: f64,
}

#[derive(Serialize)]
struct EditRecord {
    kind: &'static str,
    typed: String,
    intended: String,
    count: u32,
    intended_count: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    eprintln!("Loading model file...");
    let mut f = zstd::Decoder::new(fs::File::open(args.model)?)?;
    let model = Model::read(&mut f)?;
    let lm = model.language_model();
    let empirical = model.channel_model().empirical();

    eprintln!("# of unigrams: {}", lm.unigrams().len());
    eprintln!("# of bigrams: {}", lm.bigrams().len());
    eprintln!("# of terms: {}", lm.unigrams().total_count());
    eprintln!("# of edits: {}", empirical.edits().count());
    eprintln!("# of k-grams: {}", empirical.n_kgrams());
    eprintln!("Interpolation: {}", lm.interpolation());

    if let Some(path) = args.dump_unigrams {
        eprintln!("Saving unigrams...");
        let mut unigrams: Vec<_> = lm.unigrams().iter().collect();
        unigrams.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let mut wtr = csv::Writer::from_writer(fs::File::create(path)?);
        for (term, count) in unigrams {
            wtr.serialize(UnigramRecord {
                term,
                count,
                log_prob: lm.unigram_log_prob(term),
            })?;
        }
        wtr.flush()?;
    }

    if let Some(path) = args.dump_bigrams {
        eprintln!("Saving bigrams...");
        let mut bigrams: Vec<_> = lm
            .bigrams()
            .iter()
            .filter_map(|(key, count)| key.split_once(' ').map(|(w1, w2)| (w1, w2, count)))
            .collect();
        bigrams.sort_unstable_by(|a, b| b.2.cmp(&a.2).then_with(|| (a.0, a.1).cmp(&(b.0, b.1))));
        let mut wtr = csv::Writer::from_writer(fs::File::create(path)?);
        for (first, second, count) in bigrams {
            wtr.serialize(BigramRecord {
                first,
                second,
                count,
                log_prob: lm.bigram_log_prob(first, second),
            })?;
        }
        wtr.flush()?;
    }

    if let Some(path) = args.dump_edits {
        eprintln!("Saving edits...");
        let mut edits: Vec<_> = empirical.edits().collect();
        edits.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let mut wtr = csv::Writer::from_writer(fs::File::create(path)?);
        for (op, count) in edits {
            let intended = op.intended_kgram();
            wtr.serialize(EditRecord {
                kind: op.kind(),
                typed: op.typed_kgram(),
                intended_count: empirical.kgram_count(&intended),
                intended,
                count,
            })?;
        }
        wtr.flush()?;
    }

    Ok(())
}
