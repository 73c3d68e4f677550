use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ChatError::transcript(7, "x")
            .to_string()
            .contains("transcript error at line 7:")
    );
    assert!(
        ChatError::missing_asset("x")
            .to_string()
            .contains("missing asset:")
    );
    assert!(ChatError::fetch("x").to_string().contains("fetch error:"));
    assert!(ChatError::decode("x").to_string().contains("decode error:"));
    assert!(
        ChatError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ChatError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
