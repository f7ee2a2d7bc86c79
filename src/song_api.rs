use crate::util::truncate_on_char_boundary;
use anyhow::{Context, Result, anyhow, bail};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, ORIGIN, RANGE, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

/// Tracks at or above this length are skipped.
pub const MAX_TRACK_SECONDS: u32 = 600;

/// Largest file Discord accepts from a bot without boosts.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SongApiClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub timestamp: String,
}

impl SearchHit {
    pub fn duration_seconds(&self) -> Option<u32> {
        parse_duration(&self.timestamp)
    }
}

#[derive(Debug, Deserialize)]
struct AudioLink {
    url: Option<String>,
}

impl SongApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .with_context(|| format!("Invalid song API base URL: {base_url}"))?;
        let base_url = Self::normalize_base_url(parsed);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build song API HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn normalize_base_url(mut base_url: Url) -> Url {
        if !base_url.path().ends_with('/') {
            let mut path = base_url.path().to_owned();
            path.push('/');
            base_url.set_path(&path);
        }
        base_url
    }

    // Search results in API order. A body that isn't a JSON array counts as no results.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let mut url = self.base_url.join("mostakim/ytSearch")?;
        url.query_pairs_mut().append_pair("search", query);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach the search API")?;
        check_status("Search API", response.status())?;

        let body = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            anyhow!(
                "Failed to decode search JSON: {e}; body: {}",
                truncate(&body, 900)
            )
        })?;

        let hits = match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<SearchHit>(item).ok())
                .collect(),
            _ => Vec::new(),
        };

        Ok(hits)
    }

    // Turns a video URL into a direct audio stream URL.
    pub async fn resolve_audio(&self, video_url: &str) -> Result<String> {
        let mut url = self.base_url.join("m/sing")?;
        url.query_pairs_mut().append_pair("url", video_url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach the m/sing API")?;
        check_status("m/sing API", response.status())?;

        let body = response.text().await?;
        let link: AudioLink = serde_json::from_str(&body).map_err(|e| {
            anyhow!(
                "Failed to decode m/sing JSON: {e}; body: {}",
                truncate(&body, 900)
            )
        })?;

        link.url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow!("No audio URL found in response"))
    }

    pub async fn download_audio(&self, audio_url: &str) -> Result<Vec<u8>> {
        let url =
            Url::parse(audio_url).with_context(|| format!("Invalid audio URL: {audio_url}"))?;

        let mut response = self
            .client
            .get(url)
            .header(RANGE, "bytes=0-")
            .header(REFERER, "https://www.youtube.com/")
            .header(ORIGIN, "https://www.youtube.com")
            .send()
            .await
            .context("Failed to fetch audio")?;
        check_status("Audio URL", response.status())?;

        if response
            .content_length()
            .is_some_and(|len| len as usize > MAX_AUDIO_BYTES)
        {
            bail!("Audio file is too large to upload");
        }

        let mut audio = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if audio.len() + chunk.len() > MAX_AUDIO_BYTES {
                bail!("Audio file is too large to upload");
            }
            audio.extend_from_slice(&chunk);
        }

        Ok(audio)
    }
}

fn check_status(label: &str, status: StatusCode) -> Result<()> {
    if status == StatusCode::FORBIDDEN {
        bail!("{label} returned 403 Forbidden (likely an auth, header or IP block)");
    }
    if status.as_u16() >= 400 {
        bail!("{label} error {}", status.as_u16());
    }
    Ok(())
}

/// Parses `m:ss` or `h:mm:ss` into seconds.
pub fn parse_duration(timestamp: &str) -> Option<u32> {
    let parts = timestamp
        .trim()
        .split(':')
        .map(|part| part.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts[..] {
        [hours, minutes, seconds] => Some(
            hours
                .saturating_mul(3600)
                .saturating_add(minutes.saturating_mul(60))
                .saturating_add(seconds),
        ),
        [minutes, seconds] => Some(minutes.saturating_mul(60).saturating_add(seconds)),
        _ => None,
    }
}

/// First hit shorter than ten minutes. Hits without a readable duration are skipped.
pub fn pick_short_track(hits: &[SearchHit]) -> Option<&SearchHit> {
    hits.iter().find(|hit| {
        hit.duration_seconds()
            .is_some_and(|seconds| seconds < MAX_TRACK_SECONDS)
    })
}

fn truncate(s: &str, n: usize) -> String {
    if s.len() <= n {
        s.to_string()
    } else {
        let (prefix, truncated_bytes) = truncate_on_char_boundary(s, n);
        format!("{prefix}… ({} bytes truncated)", truncated_bytes)
    }
}
