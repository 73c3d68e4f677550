//! Conversion of provider API responses into `word → filename` metadata tables.
//!
//! Filenames are `<stem>.<ext>`, where the stem is what [`Provider::asset_url`] expects.
//!
//! [`Provider::asset_url`]: crate::assets::fetch::Provider::asset_url

use std::collections::BTreeMap;

use serde_json::Value;

use crate::foundation::error::{ChatError, ChatResult};

/// Badge display response: `{"badge_sets": {set: {"versions": {version: {"image_url_1x": ..}}}}}`.
///
/// Keys are `"{set}/{version}"`; the file stem is the second-to-last URL path segment.
pub fn parse_badge_sets(response: &Value) -> ChatResult<BTreeMap<String, String>> {
    let sets = response
        .get("badge_sets")
        .and_then(Value::as_object)
        .ok_or_else(|| ChatError::validation("badge response lacks `badge_sets`"))?;

    let mut out = BTreeMap::new();
    for (set, data) in sets {
        let Some(versions) = data.get("versions").and_then(Value::as_object) else {
            continue;
        };
        for (version, v) in versions {
            let Some(url) = v.get("image_url_1x").and_then(Value::as_str) else {
                continue;
            };
            let mut segments = url.trim_end_matches('/').rsplit('/');
            segments.next();
            if let Some(stem) = segments.next() {
                out.insert(format!("{set}/{version}"), format!("{stem}.png"));
            }
        }
    }
    Ok(out)
}

/// BetterTTV response: a list of emotes (global), or an object with `channelEmotes` and
/// `sharedEmotes` lists (channel). Each emote maps `code` to `<id>.<imageType>`.
pub fn parse_bttv(response: &Value) -> ChatResult<BTreeMap<String, String>> {
    let groups: Vec<&Value> = match response {
        Value::Array(_) => vec![response],
        Value::Object(obj) => ["channelEmotes", "sharedEmotes"]
            .iter()
            .filter_map(|k| obj.get(*k))
            .collect(),
        _ => return Err(ChatError::validation("unexpected bttv response shape")),
    };

    let mut out = BTreeMap::new();
    for item in groups.into_iter().filter_map(Value::as_array).flatten() {
        let (Some(code), Some(id), Some(kind)) = (
            item.get("code").and_then(Value::as_str),
            item.get("id").and_then(Value::as_str),
            item.get("imageType").and_then(Value::as_str),
        ) else {
            continue;
        };
        out.insert(code.to_string(), format!("{id}.{kind}"));
    }
    Ok(out)
}

/// FrankerFaceZ set/room response: emoticons of the first set, `name` mapped to `<id>.png`
/// where the id is taken from the `urls["1"]` path.
pub fn parse_ffz(response: &Value) -> ChatResult<BTreeMap<String, String>> {
    let first_set = response
        .get("sets")
        .and_then(Value::as_object)
        .and_then(|sets| sets.values().next())
        .ok_or_else(|| ChatError::validation("ffz response lacks `sets`"))?;

    let mut out = BTreeMap::new();
    let emoticons = first_set
        .get("emoticons")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for item in emoticons {
        let (Some(name), Some(url)) = (
            item.get("name").and_then(Value::as_str),
            item.pointer("/urls/1").and_then(Value::as_str),
        ) else {
            continue;
        };
        let id = url
            .trim_start_matches("https:")
            .trim_start_matches("http:")
            .trim_start_matches('/')
            .split('/')
            .nth(2);
        if let Some(id) = id {
            out.insert(name.to_string(), format!("{id}.png"));
        }
    }
    Ok(out)
}

/// 7TV response: a list of `{name, id, mime}`. Any other shape (the API answers with an error
/// object for channels without 7TV emotes) yields an empty table.
pub fn parse_seventv(response: &Value) -> BTreeMap<String, String> {
    let Some(items) = response.as_array() else {
        return BTreeMap::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?;
            let id = item.get("id")?.as_str()?;
            let ext = item.get("mime")?.as_str()?.split('/').nth(1)?;
            Some((name.to_string(), format!("{id}.{ext}")))
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/providers.rs"]
mod tests;
