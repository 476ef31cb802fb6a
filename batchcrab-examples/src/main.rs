//! Word counter demo.
//!
//! Counts the words that arrive on the `words` stream in fixed windows and
//! writes the total of each window to `word-count`. Words come from the
//! built-in sentence generator, or as JSON `{"key": .., "value": ..}` lines
//! on stdin (see the `sentence-source` binary).

use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use batchcrab_api::InputSource;
use batchcrab_api::batchcrab_core::adapter::Record;
use batchcrab_api::batchcrab_core::config::{PipelineConfig, RuntimeConfig};
use batchcrab_api::batchcrab_core::runtime::{LocalRuntime, RuntimeHandle};
use batchcrab_examples::output::format_output;
use batchcrab_examples::sentences::{SentenceSource, WORDS_STREAM};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const OUTPUT_STREAM: &str = "word-count";

#[derive(Parser, Debug)]
#[command(name = "word-counter")]
#[command(about = "Count words in fixed processing-time windows", long_about = None)]
struct Args {
    /// Pipeline config as JSON (name, input_stream, batch_interval_ms)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window length in milliseconds; overrides the config file
    #[arg(long)]
    batch_interval_ms: Option<u64>,

    /// Delay between two generated batches of sentences
    #[arg(long, default_value_t = 200)]
    tick_ms: u64,

    /// Sentences generated per tick
    #[arg(long, default_value_t = 64)]
    sentences_per_tick: usize,

    /// Stop after this many windows (0 = run until interrupted)
    #[arg(long, default_value_t = 5)]
    windows: u32,

    /// Seed for the sentence generator
    #[arg(long)]
    seed: Option<u64>,

    /// Read word records as JSON lines from stdin instead of generating them
    #[arg(long, default_value_t = false)]
    stdin: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    tracing::info!(
        "word-counter: reading `{}`, window {:?}",
        config.input_stream,
        config.batch_interval
    );

    let mut runtime = LocalRuntime::<String>::new(RuntimeConfig::default());
    let outputs = runtime.outputs();
    let handle = runtime.handle();

    let printer = thread::spawn(move || {
        for record in outputs.iter() {
            match format_output(&record) {
                Some(line) => println!("{}", line),
                None => tracing::warn!("non-utf8 output on {} for key {}", record.stream, record.key),
            }
        }
    });

    let deadline = (args.windows > 0).then(|| config.batch_interval * args.windows);
    let input_stream = config.input_stream.clone();
    let producer = if args.stdin {
        thread::spawn(move || read_stdin(handle, &input_stream, deadline))
    } else {
        let source = match args.seed {
            Some(seed) => SentenceSource::with_seed(seed),
            None => SentenceSource::new(),
        };
        let tick = Duration::from_millis(args.tick_ms);
        let per_tick = args.sentences_per_tick;
        thread::spawn(move || generate(handle, source, &input_stream, tick, per_tick, deadline))
    };

    InputSource::<String>::from_config(config)
        .map(|_key, word| Ok((word, 1u64)))
        .reduce(|word, ones| Ok((word, ones.into_iter().sum::<u64>())))
        .map(|_word, freq| Ok((0u8, freq)))
        .reduce(|key, freqs| Ok((key, freqs.into_iter().sum::<u64>())))
        .on_batched_record(|_key, total| tracing::info!("{} words counted", total))
        .sink(OUTPUT_STREAM)?
        .run(runtime)?;

    if let Err(e) = join(producer) {
        tracing::warn!("producer stopped early: {:?}", e);
    }
    if printer.join().is_err() {
        tracing::error!("output printer panicked");
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PipelineConfig::new("word-counter", WORDS_STREAM),
    };
    if let Some(ms) = args.batch_interval_ms {
        config = config.with_batch_interval(Duration::from_millis(ms));
    }
    config.validate()?;
    Ok(config)
}

fn generate(
    handle: RuntimeHandle<String>,
    mut source: SentenceSource,
    stream: &str,
    tick: Duration,
    sentences_per_tick: usize,
    deadline: Option<Duration>,
) -> Result<()> {
    let started = Instant::now();
    while deadline.is_none_or(|d| started.elapsed() < d) {
        for record in source.next_batch(sentences_per_tick) {
            handle.send(stream, record.key, record.value)?;
        }
        thread::sleep(tick);
    }
    // Let the last window flush before stopping.
    thread::sleep(tick);
    handle.shutdown()
}

fn read_stdin(handle: RuntimeHandle<String>, stream: &str, deadline: Option<Duration>) -> Result<()> {
    let started = Instant::now();
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        if deadline.is_some_and(|d| started.elapsed() >= d) {
            return handle.shutdown();
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Record<String>>(&line) {
            Ok(record) => handle.send(stream, record.key, record.value)?,
            Err(e) => tracing::warn!("skipping malformed record {:?}: {}", line, e),
        }
    }
    // Input exhausted: keep serving until the requested windows have elapsed.
    if let Some(rest) = deadline.and_then(|d| d.checked_sub(started.elapsed())) {
        thread::sleep(rest);
    }
    handle.shutdown()
}

fn join(producer: thread::JoinHandle<Result<()>>) -> Result<()> {
    producer
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))?
}
