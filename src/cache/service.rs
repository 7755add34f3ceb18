//! Client for the runner's cache service
//!
//! Entries are looked up and reserved through the twirp JSON API at
//! `ACTIONS_RESULTS_URL`; the archives themselves go straight to the
//! signed blob URLs the service hands out.

use crate::cache::archive::{self, Compression};
use crate::cache::backend::CacheStorage;
use crate::error::{ActionError, ActionResult};
use crate::http;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use ureq::Agent;

const SERVICE: &str = "github.actions.results.api.v1.CacheService";

/// Bumped whenever the archive layout changes
const VERSION_SALT: &str = "1.0";

/// Cache version: entries are only restored into a job with identical
/// paths and compression.
pub fn cache_version(paths: &[String], compression: Compression) -> String {
    let mut components: Vec<&str> = paths.iter().map(String::as_str).collect();
    components.push(compression.as_str());
    components.push(VERSION_SALT);

    hex::encode(Sha256::digest(components.join("|").as_bytes()))
}

#[derive(Debug, Serialize)]
struct DownloadUrlRequest<'a> {
    key: &'a str,
    restore_keys: &'a [String],
    version: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DownloadUrlResponse {
    ok: bool,
    #[serde(alias = "signedDownloadUrl")]
    signed_download_url: String,
    #[serde(alias = "matchedKey")]
    matched_key: String,
}

#[derive(Debug, Serialize)]
struct CreateEntryRequest<'a> {
    key: &'a str,
    version: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateEntryResponse {
    ok: bool,
    #[serde(alias = "signedUploadUrl")]
    signed_upload_url: String,
}

#[derive(Debug, Serialize)]
struct FinalizeRequest<'a> {
    key: &'a str,
    // int64 travels as a string in protobuf JSON
    size_bytes: String,
    version: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FinalizeResponse {
    ok: bool,
    #[serde(alias = "entryId", deserialize_with = "int64")]
    entry_id: i64,
}

fn int64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("entry id out of range")),
        serde_json::Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        serde_json::Value::Null => Ok(0),
        other => Err(serde::de::Error::custom(format!("unexpected entry id {}", other))),
    }
}

/// Endpoint and credentials of the cache service
#[derive(Debug, Clone)]
struct Endpoint {
    base_url: String,
    token: String,
}

impl Endpoint {
    fn call<Req, Resp>(&self, agent: &Agent, method: &str, request: &Req) -> ActionResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/twirp/{}/{}", self.base_url, SERVICE, method);
        debug!("POST {}", url);

        let mut response = agent
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
            .header("User-Agent", http::USER_AGENT)
            .send_json(request)?;

        if !response.status().is_success() {
            return Err(ActionError::CacheService(format!(
                "{} returned {}: {}",
                method,
                response.status().as_u16(),
                http::body_text(&mut response)
            )));
        }

        Ok(response.body_mut().read_json()?)
    }
}

/// `CacheStorage` backed by the GitHub Actions cache service
pub struct ActionsCacheService {
    endpoint: Option<Endpoint>,
    workspace: PathBuf,
    temp_dir: PathBuf,
    agent: Agent,
}

impl ActionsCacheService {
    /// Create a client; a missing URL or token only fails once the cache is used
    pub fn new(
        results_url: Option<String>,
        runtime_token: Option<String>,
        workspace: PathBuf,
        temp_dir: PathBuf,
    ) -> Self {
        let endpoint = match (results_url, runtime_token) {
            (Some(url), Some(token)) => Some(Endpoint {
                base_url: url.trim_end_matches('/').to_string(),
                token,
            }),
            _ => None,
        };

        Self {
            endpoint,
            workspace,
            temp_dir,
            agent: http::agent(),
        }
    }

    fn endpoint(&self) -> ActionResult<Endpoint> {
        self.endpoint.clone().ok_or_else(|| {
            ActionError::CacheService(
                "Cache service is not available: ACTIONS_RESULTS_URL and ACTIONS_RUNTIME_TOKEN must be set"
                    .to_string(),
            )
        })
    }

    /// Fresh scratch directory for one archive
    async fn scratch_dir(&self) -> ActionResult<PathBuf> {
        let dir = self.temp_dir.join(uuid::Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ActionError::io(format!("creating {}", dir.display()), e))?;
        Ok(dir)
    }

    async fn cleanup(dir: &Path) {
        if let Err(e) = tokio::fs::remove_dir_all(dir).await {
            debug!("Failed to remove {}: {}", dir.display(), e);
        }
    }

    async fn restore_into(
        &self,
        scratch: &Path,
        paths: &[String],
        primary_key: &str,
        restore_keys: &[String],
    ) -> ActionResult<Option<String>> {
        let endpoint = self.endpoint()?;
        let compression = Compression::detect().await;
        let version = cache_version(paths, compression);

        let agent = self.agent.clone();
        let key = primary_key.to_string();
        let restore_keys = restore_keys.to_vec();
        let lookup: DownloadUrlResponse = http::blocking(move || {
            endpoint.call(
                &agent,
                "GetCacheEntryDownloadURL",
                &DownloadUrlRequest {
                    key: &key,
                    restore_keys: &restore_keys,
                    version: &version,
                },
            )
        })
        .await?;

        if !lookup.ok || lookup.signed_download_url.is_empty() {
            return Ok(None);
        }

        let archive_path = scratch.join(compression.file_name());
        let agent = self.agent.clone();
        let target = archive_path.clone();
        let size = http::blocking(move || {
            download(&agent, &lookup.signed_download_url, &target)
        })
        .await?;
        debug!("Downloaded {} bytes", size);

        archive::extract(&self.workspace, &archive_path, compression).await?;
        Ok(Some(lookup.matched_key))
    }

    async fn save_from(
        &self,
        scratch: &Path,
        paths: &[String],
        key: &str,
    ) -> ActionResult<Option<i64>> {
        let endpoint = self.endpoint()?;
        let compression = Compression::detect().await;
        let version = cache_version(paths, compression);

        let archive_path = scratch.join(compression.file_name());
        archive::create(paths, &self.workspace, &archive_path, compression).await?;

        let size = tokio::fs::metadata(&archive_path)
            .await
            .map_err(|e| ActionError::io(format!("reading {}", archive_path.display()), e))?
            .len();
        info!("Cache size: {} bytes", size);

        let agent = self.agent.clone();
        let key = key.to_string();
        http::blocking(move || {
            let reserved: CreateEntryResponse = endpoint.call(
                &agent,
                "CreateCacheEntry",
                &CreateEntryRequest {
                    key: &key,
                    version: &version,
                },
            )?;
            if !reserved.ok || reserved.signed_upload_url.is_empty() {
                warn!("Cache entry {} could not be reserved", key);
                return Ok(None);
            }

            upload(&agent, &reserved.signed_upload_url, &archive_path, size)?;

            let finalized: FinalizeResponse = endpoint.call(
                &agent,
                "FinalizeCacheEntryUpload",
                &FinalizeRequest {
                    key: &key,
                    size_bytes: size.to_string(),
                    version: &version,
                },
            )?;
            if !finalized.ok {
                warn!("Cache entry {} was not finalized", key);
                return Ok(None);
            }

            Ok(Some(finalized.entry_id))
        })
        .await
    }
}

fn download(agent: &Agent, url: &str, target: &Path) -> ActionResult<u64> {
    let mut response = agent.get(url).call()?;
    if !response.status().is_success() {
        return Err(ActionError::CacheService(format!(
            "archive download returned {}: {}",
            response.status().as_u16(),
            http::body_text(&mut response)
        )));
    }

    let mut file = File::create(target)
        .map_err(|e| ActionError::io(format!("creating {}", target.display()), e))?;
    let mut reader = response.into_body().into_reader();
    std::io::copy(&mut reader, &mut file)
        .map_err(|e| ActionError::io(format!("writing {}", target.display()), e))
}

/// Stream the archive at `source` to a signed blob URL
fn upload(agent: &Agent, url: &str, source: &Path, size: u64) -> ActionResult<()> {
    let file = File::open(source)
        .map_err(|e| ActionError::io(format!("opening {}", source.display()), e))?;

    // Blob storage rejects chunked uploads
    let mut response = agent
        .put(url)
        .header("x-ms-blob-type", "BlockBlob")
        .header("Content-Length", size.to_string())
        .send(file)?;

    if !response.status().is_success() {
        return Err(ActionError::CacheService(format!(
            "archive upload returned {}: {}",
            response.status().as_u16(),
            http::body_text(&mut response)
        )));
    }
    Ok(())
}

#[async_trait]
impl CacheStorage for ActionsCacheService {
    async fn restore(
        &self,
        paths: &[String],
        primary_key: &str,
        restore_keys: &[String],
    ) -> ActionResult<Option<String>> {
        let scratch = self.scratch_dir().await?;
        let result = self
            .restore_into(&scratch, paths, primary_key, restore_keys)
            .await;
        Self::cleanup(&scratch).await;
        result
    }

    async fn save(&self, paths: &[String], key: &str) -> ActionResult<Option<i64>> {
        let scratch = self.scratch_dir().await?;
        let result = self.save_from(&scratch, paths, key).await;
        Self::cleanup(&scratch).await;
        result
    }
}
