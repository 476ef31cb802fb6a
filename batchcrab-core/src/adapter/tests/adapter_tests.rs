use super::*;

#[test]
fn test_recording_context_keeps_call_order() {
    let mut ctx = RecordingContext::new();
    ctx.produce_record("a", "k1", b"1".to_vec()).unwrap();
    ctx.produce_record("b", "k2", b"2".to_vec()).unwrap();
    ctx.produce_record("a", "k3", b"3".to_vec()).unwrap();

    let keys: Vec<_> = ctx.produced().iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["k1", "k2", "k3"]);
    let on_a: Vec<_> = ctx.produced_on("a").map(|r| r.key.as_str()).collect();
    assert_eq!(on_a, vec!["k1", "k3"]);

    assert_eq!(ctx.take_produced().len(), 3);
    assert!(ctx.produced().is_empty());
}

#[test]
fn test_recording_context_tracks_latest_timer() {
    let mut ctx = RecordingContext::new();
    ctx.set_timer("window", 100).unwrap();
    ctx.set_timer("window", 200).unwrap();
    assert_eq!(ctx.timer("window"), Some(200));
    assert_eq!(ctx.timer("other"), None);
    assert_eq!(ctx.timer_history().len(), 2);
}

#[test]
fn test_recording_context_can_reject_output() {
    let mut ctx = RecordingContext::new().fail_produce();
    assert!(ctx.produce_record("a", "k", Vec::new()).is_err());
    assert!(ctx.produced().is_empty());
}

#[test]
fn test_output_record_value_str() {
    let record = OutputRecord {
        stream: "s".to_string(),
        key: "k".to_string(),
        value: b"42".to_vec(),
    };
    assert_eq!(record.value_str(), Some("42"));

    let binary = OutputRecord {
        value: vec![0xff, 0xfe],
        ..record
    };
    assert_eq!(binary.value_str(), None);
}

#[test]
fn test_metadata_serializes() {
    let metadata = Metadata {
        name: "word-counter".to_string(),
        input_streams: vec!["sentences".to_string()],
        output_streams: vec!["word-count".to_string()],
    };
    let json = serde_json::to_string(&metadata).unwrap();
    let back: Metadata = serde_json::from_str(&json).unwrap();
    assert_eq!(back, metadata);
}
