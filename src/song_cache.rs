use anyhow::Result;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::song_api::{SearchHit, SongApiClient, pick_short_track};

const SEARCH_CACHE_TTL_SECS: u64 = 60 * 60;
const SEARCH_CACHE_CAPACITY: u64 = 512;

/// A downloaded track ready to attach to a reply.
#[derive(Debug, Clone)]
pub struct Track {
    pub title: String,
    pub timestamp: String,
    pub audio: Vec<u8>,
}

/// Song API client that remembers search results per query for an hour.
/// Audio links and downloads are never cached; they expire upstream.
#[derive(Clone)]
pub struct CachedSongClient {
    client: SongApiClient,
    search_cache: Cache<String, Arc<Vec<SearchHit>>>,
}

impl CachedSongClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let search_cache = Cache::builder()
            .max_capacity(SEARCH_CACHE_CAPACITY)
            .time_to_live(Duration::from_secs(SEARCH_CACHE_TTL_SECS))
            .build();

        Ok(Self {
            client: SongApiClient::new(base_url)?,
            search_cache,
        })
    }

    fn search_key(query: &str) -> String {
        let normalized = query.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut hasher = Sha256::new();
        hasher.update(b"search|");
        hasher.update(normalized.to_lowercase().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub async fn search(&self, query: &str) -> Result<Arc<Vec<SearchHit>>> {
        let key = Self::search_key(query);
        if let Some(hits) = self.search_cache.get(&key).await {
            return Ok(hits);
        }

        let hits = Arc::new(self.client.search(query).await?);
        // Empty results are usually transient upstream failures.
        if !hits.is_empty() {
            self.search_cache.insert(key, Arc::clone(&hits)).await;
        }
        Ok(hits)
    }

    /// Searches, picks the first track under ten minutes and downloads its
    /// audio. `Ok(None)` when nothing short enough came back.
    pub async fn fetch_short_track(&self, query: &str) -> Result<Option<Track>> {
        let hits = self.search(query).await?;
        let Some(hit) = pick_short_track(&hits) else {
            return Ok(None);
        };
        tracing::info!(title = %hit.title, url = %hit.url, "Selected track");

        let audio_url = self.client.resolve_audio(&hit.url).await?;
        let audio = self.client.download_audio(&audio_url).await?;

        Ok(Some(Track {
            title: hit.title.clone(),
            timestamp: hit.timestamp.clone(),
            audio,
        }))
    }
}
