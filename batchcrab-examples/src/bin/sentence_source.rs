//! Prints sampled sentences as word records, one JSON object per line.
//!
//! `sentence-source --batches 4 | word-counter --stdin`

use std::io::{BufWriter, Write};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use batchcrab_examples::sentences::SentenceSource;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sentence-source")]
#[command(about = "Emit random sentences as JSON word records", long_about = None)]
struct Args {
    /// Sentences per batch
    #[arg(long, default_value_t = 1024)]
    sentences: usize,

    /// Number of batches (0 = forever)
    #[arg(long, default_value_t = 1)]
    batches: u64,

    /// Pause between batches in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut source = match args.seed {
        Some(seed) => SentenceSource::with_seed(seed),
        None => SentenceSource::new(),
    };

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut batch = 0u64;
    while args.batches == 0 || batch < args.batches {
        if batch > 0 {
            thread::sleep(Duration::from_millis(args.interval_ms));
        }
        let records = source.next_batch(args.sentences);
        for record in &records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        tracing::debug!("batch {}: {} words", batch, records.len());
        batch += 1;
    }
    Ok(())
}
