use super::*;
use crate::adapter::RecordingContext;
use crate::error::StageKind;
use crate::serializer::TEXT;
use crate::time::ManualClock;
use crate::transform::{Filter, Identity, Map, Reduce};
use std::sync::Mutex;
use std::time::Duration;

const START: EventTime = 1_000_000;

fn config() -> PipelineConfig {
    PipelineConfig::new("word-counter", "words").with_batch_interval(Duration::from_millis(100))
}

fn json_sink(stream: &str) -> SinkSet {
    let mut sinks = SinkSet::default();
    sinks.bind_json(stream).unwrap();
    sinks
}

fn word_count_processor(
    clock: &ManualClock,
) -> BatchProcessor<
    String,
    impl Transformation<String, String, Key = String, Value = u32>,
    impl Transformation<String, u32, Key = String, Value = u32>,
> {
    let pre = Identity.then(Map::new(|_key: String, word: String| Ok((word, 1u32))));
    let post = Identity.then(Reduce::new(|word: String, counts: Vec<u32>| {
        Ok((word, counts.into_iter().sum::<u32>()))
    }));
    BatchProcessor::new(config(), pre, post, json_sink("word-count"))
        .unwrap()
        .with_clock(Arc::new(clock.clone()))
}

fn send_words(
    processor: &mut impl Computation<String>,
    ctx: &mut RecordingContext,
    words: &[&str],
) {
    for (i, word) in words.iter().enumerate() {
        processor
            .process_record(ctx, Record::new(i.to_string(), word.to_string()))
            .unwrap();
    }
}

fn produced_pairs(ctx: &RecordingContext, stream: &str) -> Vec<(String, String)> {
    ctx.produced_on(stream)
        .map(|r| (r.key.clone(), r.value_str().unwrap().to_string()))
        .collect()
}

// ========================================================================
// Lifecycle
// ========================================================================

#[test]
fn test_metadata_declares_streams() {
    let clock = ManualClock::new(START);
    let processor = word_count_processor(&clock);
    let metadata = processor.metadata();
    assert_eq!(metadata.name, "word-counter");
    assert_eq!(metadata.input_streams, vec!["words".to_string()]);
    assert_eq!(metadata.output_streams, vec!["word-count".to_string()]);
}

#[test]
fn test_init_arms_window_timer() {
    let clock = ManualClock::new(START);
    let mut processor = word_count_processor(&clock);
    let mut ctx = RecordingContext::new();
    processor.init(&mut ctx).unwrap();
    assert_eq!(ctx.timer(WINDOW_TIMER), Some(START + 100));
}

#[test]
fn test_zero_interval_is_rejected() {
    let result = BatchProcessor::<String, _, _>::new(
        config().with_batch_interval(Duration::ZERO),
        Identity,
        Identity,
        SinkSet::default(),
    );
    assert_eq!(result.err(), Some(ConfigError::ZeroBatchInterval));
}

// ========================================================================
// Word count
// ========================================================================

#[test]
fn test_word_count_single_window() {
    let clock = ManualClock::new(START);
    let mut processor = word_count_processor(&clock);
    let mut ctx = RecordingContext::new();
    processor.init(&mut ctx).unwrap();

    send_words(&mut processor, &mut ctx, &["the", "cat", "sat", "the", "dog", "sat"]);
    assert_eq!(processor.window_len(), 6);
    assert!(ctx.produced().is_empty());

    clock.advance(Duration::from_millis(100));
    processor.process_timer(&mut ctx, WINDOW_TIMER, START + 100).unwrap();

    assert_eq!(
        produced_pairs(&ctx, "word-count"),
        vec![
            ("cat".to_string(), "1".to_string()),
            ("dog".to_string(), "1".to_string()),
            ("sat".to_string(), "2".to_string()),
            ("the".to_string(), "2".to_string()),
        ]
    );
    assert_eq!(processor.window_len(), 0);
    assert_eq!(processor.windows_processed(), 1);
    assert_eq!(ctx.timer(WINDOW_TIMER), Some(START + 200));
}

#[test]
fn test_empty_window_emits_nothing_and_rearms() {
    let clock = ManualClock::new(START);
    let mut processor = word_count_processor(&clock);
    let mut ctx = RecordingContext::new();
    processor.init(&mut ctx).unwrap();

    clock.advance(Duration::from_millis(100));
    processor.process_timer(&mut ctx, WINDOW_TIMER, START + 100).unwrap();
    assert!(ctx.produced().is_empty());
    assert_eq!(processor.windows_processed(), 1);
    assert_eq!(ctx.timer(WINDOW_TIMER), Some(START + 200));
}

#[test]
fn test_window_cycle_each_record_in_exactly_one_window() {
    let clock = ManualClock::new(START);
    let mut processor = word_count_processor(&clock);
    let mut ctx = RecordingContext::new();
    processor.init(&mut ctx).unwrap();

    // 10 records per 10ms over 1s, the window timer fired whenever it is due.
    let mut sent = 0u32;
    for step in 0..100 {
        for i in 0..10 {
            processor
                .process_record(&mut ctx, Record::new(format!("{step}-{i}"), "w".to_string()))
                .unwrap();
            sent += 1;
        }
        let now = clock.advance(Duration::from_millis(10));
        if let Some(deadline) = ctx.timer(WINDOW_TIMER)
            && deadline <= now
        {
            processor.process_timer(&mut ctx, WINDOW_TIMER, deadline).unwrap();
        }
    }

    let counted: u32 = ctx
        .produced_on("word-count")
        .map(|r| r.value_str().unwrap().parse::<u32>().unwrap())
        .sum();
    assert_eq!(counted + processor.window_len() as u32, sent);

    // 1s at 100ms windows.
    let flushes = processor.windows_processed();
    assert!((9..=11).contains(&flushes), "flushes = {flushes}");
}

#[test]
fn test_reduce_state_does_not_leak_between_windows() {
    let clock = ManualClock::new(START);
    let mut processor = word_count_processor(&clock);
    let mut ctx = RecordingContext::new();
    processor.init(&mut ctx).unwrap();

    send_words(&mut processor, &mut ctx, &["a", "a", "b"]);
    processor.process_timer(&mut ctx, WINDOW_TIMER, START + 100).unwrap();
    let first = ctx.take_produced();

    send_words(&mut processor, &mut ctx, &["a"]);
    processor.process_timer(&mut ctx, WINDOW_TIMER, START + 200).unwrap();
    let second = ctx.take_produced();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].key, "a");
    assert_eq!(second[0].value_str(), Some("1"));
}

// ========================================================================
// Failures
// ========================================================================

#[test]
fn test_mapper_error_leaves_buffer_untouched() {
    let pre = Identity.then(Map::new(|_key: String, word: String| {
        if word == "bad" {
            Err(anyhow::anyhow!("cannot map {word}"))
        } else {
            Ok((word, 1u32))
        }
    }));
    let mut processor: BatchProcessor<String, _, _> =
        BatchProcessor::new(config(), pre, Identity, json_sink("out")).unwrap();
    let mut ctx = RecordingContext::new();

    processor
        .process_record(&mut ctx, Record::new("0", "good".to_string()))
        .unwrap();
    let err = processor
        .process_record(&mut ctx, Record::new("1", "bad".to_string()))
        .unwrap_err();
    assert_eq!(err.stage(), Some(StageKind::Mapper));
    assert_eq!(processor.window_len(), 1);

    processor
        .process_record(&mut ctx, Record::new("2", "fine".to_string()))
        .unwrap();
    assert_eq!(processor.window_len(), 2);
}

#[test]
fn test_reducer_error_drops_window_without_rearming() {
    let clock = ManualClock::new(START);
    let post = Identity.then(Reduce::new(|word: String, counts: Vec<u32>| {
        if word == "boom" {
            anyhow::bail!("cannot reduce {word}");
        }
        Ok((word, counts.len()))
    }));
    let pre = Identity.then(Map::new(|_key: String, word: String| Ok((word, 1u32))));
    let mut processor: BatchProcessor<String, _, _> = BatchProcessor::new(config(), pre, post, json_sink("out"))
        .unwrap()
        .with_clock(Arc::new(clock.clone()));
    let mut ctx = RecordingContext::new();
    processor.init(&mut ctx).unwrap();

    send_words(&mut processor, &mut ctx, &["a", "boom", "z"]);
    clock.advance(Duration::from_millis(100));
    let err = processor
        .process_timer(&mut ctx, WINDOW_TIMER, START + 100)
        .unwrap_err();

    assert_eq!(err.stage(), Some(StageKind::Reducer));
    assert!(ctx.produced().is_empty());
    assert_eq!(processor.window_len(), 0);
    assert_eq!(processor.windows_processed(), 0);
    // Still the deadline set by init.
    assert_eq!(ctx.timer(WINDOW_TIMER), Some(START + 100));
    assert_eq!(ctx.timer_history().len(), 1);
}

#[test]
fn test_filter_in_pre_batch_violates_cardinality() {
    let pre = Identity.then(Filter::new(|_key: &String, word: &String| Ok(word.starts_with('t'))));
    let mut processor: BatchProcessor<String, _, _> =
        BatchProcessor::new(config(), pre, Identity, json_sink("out")).unwrap();
    let mut ctx = RecordingContext::new();

    processor
        .process_record(&mut ctx, Record::new("0", "the".to_string()))
        .unwrap();
    let err = processor
        .process_record(&mut ctx, Record::new("1", "cat".to_string()))
        .unwrap_err();
    assert!(err.is_config());
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::PreBatchCardinality { produced: 0 })
    ));
    assert_eq!(processor.window_len(), 1);
}

#[test]
fn test_flat_map_in_pre_batch_violates_cardinality() {
    let pre = Identity.then(Map::new(|_key: String, sentence: String| {
        Ok(sentence
            .split(' ')
            .map(|w| (w.to_string(), 1u32))
            .collect::<Vec<_>>())
    }));
    let mut processor: BatchProcessor<String, _, _> =
        BatchProcessor::new(config(), pre, Identity, json_sink("out")).unwrap();
    let mut ctx = RecordingContext::new();

    let err = processor
        .process_record(&mut ctx, Record::new("0", "the cat sat".to_string()))
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::PreBatchCardinality { produced: 3 })
    ));
    assert_eq!(processor.window_len(), 0);
}

#[test]
fn test_adapter_failure_is_reported() {
    let mut processor: BatchProcessor<String, _, _> =
        BatchProcessor::new(config(), Identity, Identity, json_sink("out")).unwrap();
    let mut ctx = RecordingContext::new().fail_produce();

    processor
        .process_record(&mut ctx, Record::new("k", "v".to_string()))
        .unwrap();
    let err = processor
        .process_timer(&mut ctx, WINDOW_TIMER, START)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Adapter(_)));
}

#[test]
fn test_unknown_timer_is_ignored() {
    let clock = ManualClock::new(START);
    let mut processor = word_count_processor(&clock);
    let mut ctx = RecordingContext::new();
    processor.init(&mut ctx).unwrap();
    send_words(&mut processor, &mut ctx, &["the"]);

    processor.process_timer(&mut ctx, "checkpoint", START + 100).unwrap();
    assert_eq!(processor.window_len(), 1);
    assert_eq!(processor.windows_processed(), 0);
    assert!(ctx.produced().is_empty());
}

// ========================================================================
// Sinks and callbacks
// ========================================================================

#[test]
fn test_identity_pipeline_buffers_records_as_is() {
    let mut processor: BatchProcessor<String, _, _> =
        BatchProcessor::new(config(), Identity, Identity, json_sink("echo")).unwrap();
    let mut ctx = RecordingContext::new();

    processor
        .process_record(&mut ctx, Record::new("k1", "v1".to_string()))
        .unwrap();
    processor
        .process_record(&mut ctx, Record::new("k2", "v2".to_string()))
        .unwrap();
    processor.process_timer(&mut ctx, WINDOW_TIMER, START).unwrap();

    assert_eq!(
        produced_pairs(&ctx, "echo"),
        vec![
            ("k1".to_string(), "\"v1\"".to_string()),
            ("k2".to_string(), "\"v2\"".to_string()),
        ]
    );
}

#[test]
fn test_every_result_goes_to_every_sink() {
    let mut sinks = SinkSet::default();
    sinks.bind_json("as-json").unwrap();
    sinks.bind("as-text", TEXT).unwrap();
    let mut processor: BatchProcessor<String, _, _> =
        BatchProcessor::new(config(), Identity, Identity, sinks).unwrap();
    let mut ctx = RecordingContext::new();

    processor
        .process_record(&mut ctx, Record::new("k", "cat".to_string()))
        .unwrap();
    processor.process_timer(&mut ctx, WINDOW_TIMER, START).unwrap();

    let streams: Vec<_> = ctx.produced().iter().map(|r| r.stream.as_str()).collect();
    assert_eq!(streams, vec!["as-json", "as-text"]);
    assert_eq!(ctx.produced()[0].value_str(), Some("\"cat\""));
    assert_eq!(ctx.produced()[1].value_str(), Some("cat"));
}

#[test]
fn test_unknown_serializer_kind_fails_at_bind() {
    let mut sinks = SinkSet::default();
    assert_eq!(
        sinks.bind("out", "avro"),
        Err(ConfigError::UnknownSerializer("avro".to_string()))
    );
    assert!(sinks.is_empty());
}

#[test]
fn test_output_streams_are_deduplicated() {
    let mut sinks = SinkSet::default();
    sinks.bind_json("b").unwrap();
    sinks.bind("a", TEXT).unwrap();
    sinks.bind("b", TEXT).unwrap();
    assert_eq!(sinks.output_streams(), vec!["b".to_string(), "a".to_string()]);
    assert_eq!(sinks.bindings().len(), 3);
}

#[test]
fn test_callbacks_run_before_sinks_for_each_result() {
    let clock = ManualClock::new(START);
    let mut processor = word_count_processor(&clock);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&seen);
    processor.add_callback(Box::new(move |word: &String, count: &u32| {
        first.lock().unwrap().push(format!("first {word}={count}"));
    }));
    let second = Arc::clone(&seen);
    processor.add_callback(Box::new(move |word: &String, _count: &u32| {
        second.lock().unwrap().push(format!("second {word}"));
    }));

    let mut ctx = RecordingContext::new();
    processor.init(&mut ctx).unwrap();
    send_words(&mut processor, &mut ctx, &["b", "a", "b"]);
    processor.process_timer(&mut ctx, WINDOW_TIMER, START + 100).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["first a=1", "second a", "first b=2", "second b"]
    );
    assert_eq!(ctx.produced().len(), 2);
}

#[test]
fn test_window_buffer_take_leaves_it_empty() {
    let mut window = WindowBuffer::new();
    assert!(window.is_empty());
    window.push("b", 2);
    window.push("a", 1);
    assert_eq!(window.len(), 2);

    assert_eq!(window.take(), vec![("b", 2), ("a", 1)]);
    assert!(window.is_empty());
    assert!(window.take().is_empty());
}
