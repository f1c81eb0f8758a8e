use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};

use crate::config::Settings;

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "ftc_forecast";
const CACHE_FILE: &str = "http_cache.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct HttpCacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: i64,
}

/// Read-through store of raw upstream bodies keyed by URL.
#[derive(Debug)]
pub struct HttpCache {
    ttl: Duration,
    persist_path: Option<PathBuf>,
    entries: Mutex<HashMap<String, CacheEntry>>,
    // Serializes file writes only; lookups never wait on disk.
    persist_lock: Mutex<()>,
}

impl HttpCache {
    pub fn in_memory(ttl: Duration) -> Self {
        Self::persisted_at(ttl, None)
    }

    pub fn on_disk(ttl: Duration) -> Self {
        Self::persisted_at(ttl, cache_path())
    }

    fn persisted_at(ttl: Duration, persist_path: Option<PathBuf>) -> Self {
        let entries = persist_path
            .as_ref()
            .map(|p| load_cache_file(p).entries)
            .unwrap_or_default();
        Self {
            ttl,
            persist_path,
            entries: Mutex::new(entries),
            persist_lock: Mutex::new(()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        if settings.cache_on_disk {
            Self::on_disk(settings.cache_ttl)
        } else {
            Self::in_memory(settings.cache_ttl)
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fetch(&self, client: &Client, url: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let cached = self.lock().get(url).cloned();
        if let Some(entry) = cached.as_ref()
            && self.is_fresh(entry, now)
        {
            tracing::debug!(url, "http cache hit");
            return Ok(entry.body.clone());
        }

        let mut req = client.get(url);
        if let Some(entry) = cached.as_ref() {
            if let Some(etag) = entry.etag.as_ref() {
                req = req.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = entry.last_modified.as_ref() {
                req = req.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let resp = req.send().context("request failed")?;
        let status = resp.status();
        let headers = resp.headers().clone();
        if status == StatusCode::NOT_MODIFIED {
            let Some(mut entry) = cached else {
                return Err(anyhow::anyhow!("received 304 without cache body"));
            };
            tracing::debug!(url, "http cache revalidated");
            entry.fetched_at = now;
            let body = entry.body.clone();
            self.store(url, entry);
            return Ok(body);
        }

        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {}: {}", status, body));
        }

        let header_text = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };
        let entry = CacheEntry {
            body: body.clone(),
            etag: header_text(ETAG),
            last_modified: header_text(LAST_MODIFIED),
            fetched_at: now,
        };
        self.store(url, entry);
        Ok(body)
    }

    pub fn get_fresh(&self, key: &str, now: i64) -> Option<String> {
        let guard = self.lock();
        let entry = guard.get(key)?;
        self.is_fresh(entry, now).then(|| entry.body.clone())
    }

    pub fn insert(&self, key: &str, body: String, fetched_at: i64) {
        self.store(
            key,
            CacheEntry {
                body,
                etag: None,
                last_modified: None,
                fetched_at,
            },
        );
    }

    fn is_fresh(&self, entry: &CacheEntry, now: i64) -> bool {
        let age = now.saturating_sub(entry.fetched_at);
        age >= 0 && (age as u64) < self.ttl.as_secs()
    }

    fn store(&self, key: &str, entry: CacheEntry) {
        let snapshot = {
            let mut guard = self.lock();
            guard.insert(key.to_string(), entry);
            self.persist_path.as_ref().map(|_| guard.clone())
        };
        let (Some(path), Some(entries)) = (self.persist_path.as_ref(), snapshot) else {
            return;
        };

        let _writing = self.persist_lock.lock().unwrap_or_else(|e| e.into_inner());
        let file = HttpCacheFile {
            version: CACHE_VERSION,
            entries,
        };
        if let Err(err) = save_cache_file(path, &file) {
            tracing::warn!("http cache not saved: {err:#}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn load_cache_file(path: &Path) -> HttpCacheFile {
    let Ok(raw) = fs::read_to_string(path) else {
        return HttpCacheFile::default();
    };
    let cache = serde_json::from_str::<HttpCacheFile>(&raw).unwrap_or_default();
    if cache.version != CACHE_VERSION {
        return HttpCacheFile::default();
    }
    cache
}

fn save_cache_file(path: &Path, cache: &HttpCacheFile) -> Result<()> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).ok();
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(cache).context("serialize http cache")?;
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, path).context("swap http cache")?;
    Ok(())
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}
