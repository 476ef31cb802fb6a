use super::*;

fn output(value: Vec<u8>) -> OutputRecord {
    OutputRecord {
        stream: "word-count".to_string(),
        key: "0".to_string(),
        value,
    }
}

#[test]
fn test_format_output_line() {
    assert_eq!(format_output(&output(b"22".to_vec())).as_deref(), Some("word-count 0 22"));
}

#[test]
fn test_format_output_skips_non_utf8() {
    assert_eq!(format_output(&output(vec![0xff, 0xfe])), None);
}
