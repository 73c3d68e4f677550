use super::*;

#[test]
fn parses_fragment_record() {
    let line = r##"{"offset": 12.5, "name": "viewer", "color": "#FF7F50",
        "badges": [{"_id": "subscriber", "version": "12"}, {"id": "premium", "version": 1}],
        "fragments": [{"text": "hello "}, {"emoticon": "25"}, {"text": " there", "emoticon": null}]}"##;
    let ev: ChatEvent = serde_json::from_str(line).unwrap();

    assert_eq!(ev.offset, 12.5);
    assert_eq!(ev.name, "viewer");
    assert_eq!(ev.color.as_deref(), Some("#FF7F50"));
    assert_eq!(ev.badges[0].key(), "subscriber/12");
    assert_eq!(ev.badges[1].key(), "premium/1");
    assert_eq!(
        ev.fragments,
        vec![
            Fragment::TextRun("hello ".to_string()),
            Fragment::EmoteRef("25".to_string()),
            Fragment::TextRun(" there".to_string()),
        ]
    );
}

#[test]
fn highlighted_body_becomes_single_text_run() {
    let line = r#"{"offset": 1.0, "name": "a", "color": null, "badges": [], "fragments": "hi chat"}"#;
    let ev: ChatEvent = serde_json::from_str(line).unwrap();
    assert_eq!(ev.color, None);
    assert_eq!(ev.fragments, vec![Fragment::TextRun("hi chat".to_string())]);
}

#[test]
fn numeric_emote_ids_and_missing_badges_are_accepted() {
    let line = r#"{"offset": 0, "name": "a", "fragments": [{"emoticon": 354}]}"#;
    let ev: ChatEvent = serde_json::from_str(line).unwrap();
    assert!(ev.badges.is_empty());
    assert_eq!(ev.fragments, vec![Fragment::EmoteRef("354".to_string())]);

    let line = r#"{"offset": 0, "name": "a", "badges": null, "fragments": []}"#;
    let ev: ChatEvent = serde_json::from_str(line).unwrap();
    assert!(ev.badges.is_empty());
}

#[test]
fn fragment_without_text_or_emote_is_rejected() {
    let line = r#"{"offset": 0, "name": "a", "fragments": [{}]}"#;
    assert!(serde_json::from_str::<ChatEvent>(line).is_err());
}

#[test]
fn empty_color_counts_as_absent() {
    let line = r#"{"offset": 0, "name": "a", "color": "", "fragments": []}"#;
    let ev: ChatEvent = serde_json::from_str(line).unwrap();
    assert_eq!(ev.color, None);
}
