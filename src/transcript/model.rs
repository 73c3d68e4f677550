use serde::{Deserialize, Deserializer};

/// One chat message as persisted in the transcript.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatEvent {
    /// Seconds from the start of the VOD.
    pub offset: f64,
    /// Display name of the speaker.
    pub name: String,
    /// Speaker color as a hex string, if the speaker set one.
    pub color: Option<String>,
    /// Chat badges in display order.
    pub badges: Vec<Badge>,
    /// Message body.
    pub fragments: Vec<Fragment>,
}

/// Badge reference, resolved through the badge cache as `"{id}/{version}"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Badge {
    /// Badge set id, e.g. `subscriber`.
    #[serde(alias = "_id", deserialize_with = "string_or_number")]
    pub id: String,
    /// Version within the set.
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,
}

impl Badge {
    /// Cache key for this badge.
    pub fn key(&self) -> String {
        format!("{}/{}", self.id, self.version)
    }
}

/// Atomic unit of a message body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment {
    /// Literal text, possibly containing third-party emote words.
    TextRun(String),
    /// Native Twitch emote by id.
    EmoteRef(String),
}

#[derive(Deserialize)]
struct RawEvent {
    offset: f64,
    name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    badges: Vec<Badge>,
    fragments: RawBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBody {
    Fragments(Vec<RawFragment>),
    /// Highlighted messages were stored with their plain body only.
    Highlighted(String),
}

#[derive(Deserialize)]
struct RawFragment {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    emoticon: Option<String>,
}

impl<'de> Deserialize<'de> for ChatEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawEvent::deserialize(deserializer)?;
        let fragments = match raw.fragments {
            RawBody::Highlighted(body) => vec![Fragment::TextRun(body)],
            RawBody::Fragments(list) => list
                .into_iter()
                .map(|f| match (f.emoticon.filter(|id| !id.is_empty()), f.text) {
                    (Some(id), _) => Ok(Fragment::EmoteRef(id)),
                    (None, Some(text)) => Ok(Fragment::TextRun(text)),
                    (None, None) => Err(serde::de::Error::custom(
                        "fragment needs either `text` or `emoticon`",
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Self {
            offset: raw.offset,
            name: raw.name,
            color: raw.color.filter(|c| !c.trim().is_empty()),
            badges: raw.badges,
            fragments,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Str(String),
    Int(i64),
}

impl From<IdRepr> for String {
    fn from(v: IdRepr) -> Self {
        match v {
            IdRepr::Str(s) => s,
            IdRepr::Int(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IdRepr::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(String::from))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Badge>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Badge>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[path = "../../tests/unit/transcript/model.rs"]
mod tests;
