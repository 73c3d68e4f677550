use std::fmt;

use crate::foundation::error::{ChatError, ChatResult};

/// Image sources the chat overlay draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Native Twitch emotes, addressed by emote id.
    Twitch,
    /// Twitch chat badges.
    Badges,
    /// BetterTTV emotes.
    Bttv,
    /// FrankerFaceZ emotes.
    Ffz,
    /// 7TV emotes.
    SevenTv,
}

impl Provider {
    /// Third-party word-emote providers in lookup priority order.
    pub const WORD_EMOTES: [Provider; 3] = [Provider::Bttv, Provider::Ffz, Provider::SevenTv];

    /// Folder below the asset root holding this provider's images and metadata tables.
    pub fn folder(self) -> &'static str {
        match self {
            Self::Twitch => "twitch_emotes",
            Self::Badges => "badges",
            Self::Bttv => "bttv_emotes",
            Self::Ffz => "ffz_emotes",
            Self::SevenTv => "7tv_emotes",
        }
    }

    /// CDN URL for an image whose file stem (name without extension) is `stem`.
    pub fn asset_url(self, stem: &str) -> String {
        match self {
            Self::Twitch => format!("https://static-cdn.jtvnw.net/emoticons/v1/{stem}/1.0"),
            Self::Badges => format!("https://static-cdn.jtvnw.net/badges/v1/{stem}/1"),
            Self::Bttv => format!("https://cdn.betterttv.net/emote/{stem}/1x"),
            Self::Ffz => format!("https://cdn.frankerfacez.com/emote/{stem}/1"),
            Self::SevenTv => format!("https://cdn.7tv.app/emote/{stem}/1x"),
        }
    }

    /// Whether this provider's channel table is keyed by channel login rather than user id.
    pub fn keyed_by_login(self) -> bool {
        matches!(self, Self::SevenTv)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

/// Source of image bytes for assets missing from the local asset folders.
///
/// Implementations own transport, sessions and retry policy; caches call
/// [`fetch`](Self::fetch) at most once per cache miss.
pub trait AssetFetcher: Send + Sync {
    /// Fetch the image bytes for `stem` from `provider`.
    fn fetch(&self, provider: Provider, stem: &str) -> ChatResult<Vec<u8>>;
}

/// Fetcher for fully offline sessions: every request reports a missing asset.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineFetcher;

impl AssetFetcher for OfflineFetcher {
    fn fetch(&self, provider: Provider, stem: &str) -> ChatResult<Vec<u8>> {
        Err(ChatError::missing_asset(format!(
            "{provider}/{stem} is not available offline"
        )))
    }
}
