use std::io::Cursor;

use super::*;

const GOOD: &str = concat!(
    r#"{"offset": 0.0, "name": "a", "color": null, "badges": [], "fragments": [{"text": "one"}]}"#,
    "\n",
    r##"{"offset": 5.0, "name": "b", "color": "#00FF7F", "badges": [], "fragments": "two"}"##,
    "\n",
);

#[test]
fn parse_reads_every_line_in_order() {
    let t = Transcript::parse(Cursor::new(GOOD)).unwrap();
    assert_eq!(t.len(), 2);
    assert_eq!(t.events()[0].name, "a");
    assert_eq!(t.events()[1].offset, 5.0);
    assert_eq!(t.span_secs(), 5.0);
}

#[test]
fn malformed_line_is_fatal_and_reports_line_number() {
    let text = format!("{GOOD}{{\"offset\": \"soon\"}}\n");
    let err = Transcript::parse(Cursor::new(text)).unwrap_err();
    match err {
        ChatError::Transcript { line, .. } => assert_eq!(line, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn blank_line_is_malformed() {
    let text = format!("{GOOD}\n{GOOD}");
    assert!(Transcript::parse(Cursor::new(text)).is_err());
}

#[test]
fn load_missing_file_errors() {
    let path = std::env::temp_dir().join("vodchat_missing_transcript_does_not_exist.txt");
    assert!(Transcript::load(&path).is_err());
}

#[test]
fn empty_input_is_an_empty_transcript() {
    let t = Transcript::parse(Cursor::new("")).unwrap();
    assert!(t.is_empty());
    assert_eq!(t.span_secs(), 0.0);
}
