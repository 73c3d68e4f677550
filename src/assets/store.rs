use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use anyhow::Context;
use image::RgbaImage;

use crate::assets::decode::{Emote, decode_emote};
use crate::assets::fetch::{AssetFetcher, Provider};
use crate::foundation::core::ChatConfig;
use crate::foundation::error::{ChatError, ChatResult};
use crate::transcript::model::{ChatEvent, Fragment};

/// Canvas every badge is composited onto.
pub const BADGE_CANVAS: (u32, u32) = (20, 21);

/// `word → filename` metadata for one provider and channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmoteTable {
    entries: HashMap<String, String>,
}

impl EmoteTable {
    /// Merge global and channel entries; channel entries win on collision.
    pub fn merged(
        global: impl IntoIterator<Item = (String, String)>,
        channel: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut entries: HashMap<String, String> = global.into_iter().collect();
        entries.extend(channel);
        Self { entries }
    }

    /// Load `<dir>/global.txt` and `<dir>/<channel_key>.txt`. Absent files count as empty, as
    /// does the channel table when `channel_key` is empty.
    pub fn load(dir: &Path, channel_key: &str) -> ChatResult<Self> {
        let global = read_table(&dir.join("global.txt"))?;
        let channel = if channel_key.is_empty() {
            HashMap::new()
        } else {
            read_table(&dir.join(format!("{channel_key}.txt")))?
        };
        Ok(Self::merged(global, channel))
    }

    /// Filename for `word`.
    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries.get(word).map(String::as_str)
    }

    /// Whether `word` is a known emote.
    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_table(path: &Path) -> ChatResult<HashMap<String, String>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("read emote table '{}'", path.display()))
                .into());
        }
    };
    serde_json::from_str(&text).map_err(|e| {
        ChatError::validation(format!("emote table '{}': {e}", path.display()))
    })
}

/// Write a metadata table as pretty, key-sorted JSON.
pub fn write_table(path: &Path, entries: &BTreeMap<String, String>) -> ChatResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create table dir '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(entries).context("serialize emote table")?;
    std::fs::write(path, json).with_context(|| format!("write emote table '{}'", path.display()))?;
    Ok(())
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

type Slot<V> = Arc<Mutex<Option<V>>>;

/// Unbounded memo whose population is serialized per key.
///
/// The map lock is only held to find the key's slot; the slot lock is held while populating,
/// so concurrent readers of one key wait for the single in-flight population while other keys
/// proceed. Failed populations leave the slot empty for a later retry.
struct Memo<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
}

impl<V: Clone> Memo<V> {
    fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn get_or_try_populate(
        &self,
        key: &str,
        populate: impl FnOnce() -> ChatResult<V>,
    ) -> ChatResult<V> {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key.to_string()).or_default())
        };
        let mut value = lock(&slot);
        if let Some(v) = value.as_ref() {
            return Ok(v.clone());
        }
        let v = populate()?;
        *value = Some(v.clone());
        Ok(v)
    }
}

/// Lazily decoded, memoized images of one provider.
pub struct ProviderCache {
    provider: Provider,
    dir: PathBuf,
    table: EmoteTable,
    fetcher: Arc<dyn AssetFetcher>,
    default_frame_ms: u32,
    memo: Memo<Emote>,
    fetches: AtomicUsize,
    decodes: AtomicUsize,
}

impl ProviderCache {
    /// Cache over `<root>/<provider folder>` with the given metadata table.
    ///
    /// Twitch emotes need no table: they are addressed as `<id>.png`.
    pub fn new(
        provider: Provider,
        root: &Path,
        table: EmoteTable,
        fetcher: Arc<dyn AssetFetcher>,
        default_frame_ms: u32,
    ) -> Self {
        Self {
            provider,
            dir: root.join(provider.folder()),
            table,
            fetcher,
            default_frame_ms,
            memo: Memo::new(),
            fetches: AtomicUsize::new(0),
            decodes: AtomicUsize::new(0),
        }
    }

    /// Provider this cache serves.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Metadata table backing word lookups.
    pub fn table(&self) -> &EmoteTable {
        &self.table
    }

    /// Whether `key` names an image of this provider.
    pub fn contains(&self, key: &str) -> bool {
        match self.provider {
            Provider::Twitch => !key.is_empty(),
            _ => self.table.contains(key),
        }
    }

    /// Local filename for `key`.
    pub fn filename(&self, key: &str) -> Option<String> {
        match self.provider {
            Provider::Twitch if !key.is_empty() => Some(format!("{key}.png")),
            Provider::Twitch => None,
            _ => self.table.get(key).map(str::to_string),
        }
    }

    /// Decoded image for `key`, populating the memo on first use.
    ///
    /// A file missing locally is fetched once through the [`AssetFetcher`], written into the
    /// provider folder, and read back once more.
    pub fn get(&self, key: &str) -> ChatResult<Emote> {
        self.memo.get_or_try_populate(key, || {
            let filename = self.filename(key).ok_or_else(|| {
                ChatError::missing_asset(format!("{}: no entry for '{key}'", self.provider))
            })?;
            let filename = plain_file_name(&filename)?;
            let bytes = self.load_bytes(filename)?;
            self.decodes.fetch_add(1, Ordering::Relaxed);
            decode_emote(&bytes, self.default_frame_ms)
        })
    }

    /// Number of fetches issued to the [`AssetFetcher`].
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Number of successful image reads handed to the decoder.
    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::Relaxed)
    }

    fn load_bytes(&self, filename: &str) -> ChatResult<Vec<u8>> {
        let path = self.dir.join(filename);
        match std::fs::read(&path) {
            Ok(bytes) => return Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read asset '{}'", path.display()))
                    .into());
            }
        }

        let stem = filename.split('.').next().unwrap_or(filename);
        tracing::info!(provider = %self.provider, %filename, "asset missing locally, fetching");
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let fetched = self.fetcher.fetch(self.provider, stem)?;

        std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(&path, &fetched))
            .with_context(|| format!("store fetched asset '{}'", path.display()))?;
        std::fs::read(&path).map_err(|e| {
            ChatError::missing_asset(format!("{} after fetch: {e}", path.display()))
        })
    }
}

/// `name` as a single file name inside a provider folder: no separators, no `.`/`..`, not empty.
fn plain_file_name(name: &str) -> ChatResult<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None)
            if !name.contains(['/', '\\']) && part.to_str() == Some(name) =>
        {
            Ok(name)
        }
        _ => Err(ChatError::validation(format!(
            "asset file name '{name}' must be a plain file name"
        ))),
    }
}

/// Badge images composited onto a fixed [`BADGE_CANVAS`], memoized by `"{set}/{version}"`.
pub struct BadgeCache {
    source: ProviderCache,
    composed: Memo<Arc<RgbaImage>>,
}

impl BadgeCache {
    /// Wrap a [`Provider::Badges`] cache.
    pub fn new(source: ProviderCache) -> Self {
        Self {
            source,
            composed: Memo::new(),
        }
    }

    /// Underlying image cache.
    pub fn source(&self) -> &ProviderCache {
        &self.source
    }

    /// Composited badge for `key` (`"{set}/{version}"`).
    pub fn get(&self, key: &str) -> ChatResult<Arc<RgbaImage>> {
        self.composed.get_or_try_populate(key, || {
            let badge = match self.source.get(key)? {
                Emote::Static(img) => img,
                Emote::Animated(anim) => Arc::new(anim.frame_at(0).clone()),
            };
            let (w, h) = BADGE_CANVAS;
            let mut canvas = RgbaImage::new(w, h);
            image::imageops::overlay(&mut canvas, badge.as_ref(), 0, 0);
            Ok(Arc::new(canvas))
        })
    }
}

/// Channel whose emote tables a session uses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelRef {
    /// Numeric Twitch user id (keys badge, BTTV and FFZ channel tables).
    pub user_id: String,
    /// Channel login (keys the 7TV channel table).
    pub login: String,
}

/// Every image cache a replay session draws from.
///
/// `Send + Sync`: one instance is shared through `Arc` by the render worker and the prefetch
/// worker.
pub struct ChatAssets {
    twitch: ProviderCache,
    badges: BadgeCache,
    bttv: ProviderCache,
    ffz: ProviderCache,
    seventv: ProviderCache,
}

/// Outcome counts of a prefetch pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrefetchStats {
    /// Images resolved (already cached, on disk, or fetched).
    pub loaded: usize,
    /// Images that could not be resolved.
    pub failed: usize,
}

impl ChatAssets {
    /// Open the asset folders below `root` for `channel`.
    #[tracing::instrument(skip(fetcher, cfg))]
    pub fn open(
        root: &Path,
        channel: &ChannelRef,
        fetcher: Arc<dyn AssetFetcher>,
        cfg: &ChatConfig,
    ) -> ChatResult<Self> {
        let table_for = |provider: Provider| -> ChatResult<EmoteTable> {
            let key = if provider.keyed_by_login() {
                &channel.login
            } else {
                &channel.user_id
            };
            EmoteTable::load(&root.join(provider.folder()), key)
        };

        let cache = |provider: Provider| -> ChatResult<ProviderCache> {
            let table = match provider {
                Provider::Twitch => EmoteTable::default(),
                _ => table_for(provider)?,
            };
            tracing::debug!(%provider, entries = table.len(), "emote table loaded");
            Ok(ProviderCache::new(
                provider,
                root,
                table,
                Arc::clone(&fetcher),
                cfg.default_frame_ms,
            ))
        };

        Ok(Self {
            twitch: cache(Provider::Twitch)?,
            badges: BadgeCache::new(cache(Provider::Badges)?),
            bttv: cache(Provider::Bttv)?,
            ffz: cache(Provider::Ffz)?,
            seventv: cache(Provider::SevenTv)?,
        })
    }

    /// Native Twitch emote by id.
    pub fn twitch_emote(&self, id: &str) -> ChatResult<Emote> {
        self.twitch.get(id)
    }

    /// Composited badge for `"{set}/{version}"`.
    pub fn badge(&self, key: &str) -> ChatResult<Arc<RgbaImage>> {
        self.badges.get(key)
    }

    /// First third-party provider (BTTV, FFZ, 7TV) knowing `word`, and its image.
    ///
    /// `None` when no provider knows the word.
    pub fn word_emote(&self, word: &str) -> Option<(Provider, ChatResult<Emote>)> {
        Provider::WORD_EMOTES
            .into_iter()
            .map(|p| self.cache(p))
            .find(|c| c.contains(word))
            .map(|c| (c.provider(), c.get(word)))
    }

    /// Cache for `provider`.
    pub fn cache(&self, provider: Provider) -> &ProviderCache {
        match provider {
            Provider::Twitch => &self.twitch,
            Provider::Badges => self.badges.source(),
            Provider::Bttv => &self.bttv,
            Provider::Ffz => &self.ffz,
            Provider::SevenTv => &self.seventv,
        }
    }

    /// Resolve every badge, Twitch emote and word emote referenced by `events`.
    pub fn prefetch(&self, events: &[ChatEvent]) -> PrefetchStats {
        let mut stats = PrefetchStats::default();
        let mut record = |what: &str, res: ChatResult<()>| match res {
            Ok(()) => stats.loaded += 1,
            Err(err) => {
                tracing::warn!(%what, %err, "prefetch failed");
                stats.failed += 1;
            }
        };

        for event in events {
            for badge in &event.badges {
                let key = badge.key();
                record(&key, self.badge(&key).map(drop));
            }
            for fragment in &event.fragments {
                match fragment {
                    Fragment::EmoteRef(id) => record(id, self.twitch_emote(id).map(drop)),
                    Fragment::TextRun(text) => {
                        for word in text.split_whitespace() {
                            if let Some((_, res)) = self.word_emote(word) {
                                record(word, res.map(drop));
                            }
                        }
                    }
                }
            }
        }
        stats
    }
}

/// Run [`ChatAssets::prefetch`] on its own thread.
pub fn spawn_prefetch(
    assets: Arc<ChatAssets>,
    events: Arc<[ChatEvent]>,
) -> ChatResult<JoinHandle<PrefetchStats>> {
    std::thread::Builder::new()
        .name("vodchat-prefetch".to_string())
        .spawn(move || {
            let stats = assets.prefetch(&events);
            tracing::info!(loaded = stats.loaded, failed = stats.failed, "prefetch done");
            stats
        })
        .context("spawn prefetch worker")
        .map_err(ChatError::from)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
