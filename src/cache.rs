use std::fs;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ChargeError;

const BODY_FILE: &str = "body";
const METADATA_FILE: &str = "metadata.json";

/// On-disk memo of downloaded response bodies keyed by request URL.
///
/// Entries never expire; delete the directory (or run with `--no-cache`) to
/// download again.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: Utf8PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub url: String,
    pub downloaded_at: String,
    pub tool: String,
    pub bytes: u64,
}

impl ResponseCache {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// `~/.cache/chargepoint-datasets`
    pub fn default_root() -> Result<Utf8PathBuf, ChargeError> {
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir().join(".cache").join("chargepoint-datasets"),
                )
                .ok()
            })
            .ok_or_else(|| {
                ChargeError::Filesystem("unable to resolve cache directory".to_string())
            })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn entry_dir(&self, url: &str) -> Utf8PathBuf {
        self.root.join("responses").join(cache_key(url))
    }

    /// Path of the cached body for `url`, if one was stored for exactly that URL.
    pub fn lookup(&self, url: &str) -> Result<Option<Utf8PathBuf>, ChargeError> {
        let dir = self.entry_dir(url);
        let body = dir.join(BODY_FILE);
        let meta_path = dir.join(METADATA_FILE);
        if !body.as_std_path().is_file() || !meta_path.as_std_path().is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(meta_path.as_std_path())
            .map_err(|err| ChargeError::Filesystem(err.to_string()))?;
        let metadata: CacheMetadata = match serde_json::from_str(&content) {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::warn!(%meta_path, error = %err, "ignoring unreadable cache metadata");
                return Ok(None);
            }
        };
        if metadata.url != url {
            return Ok(None);
        }
        Ok(Some(body))
    }

    /// Copies `source` into the cache as the body for `url`.
    pub fn store(&self, url: &str, source: &Path) -> Result<Utf8PathBuf, ChargeError> {
        let dir = self.entry_dir(url);
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| ChargeError::Filesystem(err.to_string()))?;

        let body = dir.join(BODY_FILE);
        let temp = tempfile::Builder::new()
            .prefix("cpdata-body")
            .tempfile_in(dir.as_std_path())
            .map_err(|err| ChargeError::Filesystem(err.to_string()))?;
        let bytes = fs::copy(source, temp.path())
            .map_err(|err| ChargeError::Filesystem(err.to_string()))?;
        temp.persist(body.as_std_path())
            .map_err(|err| ChargeError::Filesystem(err.to_string()))?;

        let metadata = CacheMetadata {
            url: url.to_string(),
            downloaded_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("cpdata/{}", env!("CARGO_PKG_VERSION")),
            bytes,
        };
        write_metadata(&dir.join(METADATA_FILE), &metadata)?;
        Ok(body)
    }
}

fn write_metadata(path: &Utf8Path, metadata: &CacheMetadata) -> Result<(), ChargeError> {
    let tmp_path = path.with_extension("json.tmp");
    let content = serde_json::to_vec_pretty(metadata)
        .map_err(|err| ChargeError::Filesystem(err.to_string()))?;
    fs::write(tmp_path.as_std_path(), &content)
        .map_err(|err| ChargeError::Filesystem(err.to_string()))?;
    fs::rename(tmp_path.as_std_path(), path.as_std_path())
        .map_err(|err| ChargeError::Filesystem(err.to_string()))?;
    Ok(())
}

/// File-system safe directory name for a URL. Distinct URLs may share a key;
/// `lookup` compares the stored URL.
fn cache_key(url: &str) -> String {
    let unsafe_chars = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let key = unsafe_chars.replace_all(without_scheme, "_");
    key.chars().take(150).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_in(temp: &tempfile::TempDir) -> ResponseCache {
        ResponseCache::new(Utf8PathBuf::from_path_buf(temp.path().join("cache")).unwrap())
    }

    #[test]
    fn cache_key_is_file_name_safe() {
        assert_eq!(
            cache_key("https://github.com/openchargemap/ocm-data/blob/master/poi.json.gz?raw=true"),
            "github.com_openchargemap_ocm-data_blob_master_poi.json.gz_raw_true"
        );
        assert_eq!(
            cache_key("http://www.cpinfo.ie/data/201907a.zip"),
            "www.cpinfo.ie_data_201907a.zip"
        );
    }

    #[test]
    fn stored_body_is_returned_for_same_url_only() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache_in(&temp);
        let source = temp.path().join("download.zip");
        fs::write(&source, b"archive bytes").unwrap();

        let url = "http://example.org/data/a.zip";
        assert!(cache.lookup(url).unwrap().is_none());

        let body = cache.store(url, &source).unwrap();
        assert_eq!(fs::read(body.as_std_path()).unwrap(), b"archive bytes");
        assert_eq!(cache.lookup(url).unwrap(), Some(body));

        // same key, different URL
        assert!(cache.lookup("http://example.org/data?a.zip").unwrap().is_none());
    }
}
