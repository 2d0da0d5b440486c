//! One-time GeoIP database provisioning.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use url::form_urlencoded;

use super::extract::extract_archive;
use super::GeoDatabase;
use crate::config::{
    ProvisionConfig, GEOIP_ARCHIVE_FILE, GEOIP_DATABASE_FILE, GEOIP_EDITION,
    MAXMIND_DOWNLOAD_PATH,
};
use crate::error_handling::ProvisionError;

/// Builds the archive download URL for `source`.
///
/// The license key is form-encoded so keys with `+`, `&` or `=` survive intact.
pub fn download_url(source: &str, license_key: &str) -> String {
    let encoded_key = form_urlencoded::byte_serialize(license_key.as_bytes()).collect::<String>();
    format!(
        "{}{}?edition_id={}&license_key={}&suffix=tar.gz",
        source.trim_end_matches('/'),
        MAXMIND_DOWNLOAD_PATH,
        GEOIP_EDITION,
        encoded_key
    )
}

/// Makes sure the GeoIP database is on disk and opens it.
///
/// The GeoIP directory doubles as the "already provisioned" marker:
/// - If it already exists, the database inside it is opened directly.
/// - If it is created now, the archive is downloaded into it, unpacked on the
///   blocking pool, and the extracted database is opened.
///
/// Any failure is returned as-is; nothing is retried. When a first-run
/// download or extraction fails, the directory is removed so the next start
/// provisions from scratch instead of trying to open a half-written database.
pub async fn ensure_ready(
    config: &ProvisionConfig,
    client: &reqwest::Client,
) -> Result<GeoDatabase, ProvisionError> {
    let dir = config.geoip_dir.clone();
    let database = dir.join(GEOIP_DATABASE_FILE);

    match tokio::fs::create_dir(&dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            log::info!("GeoIP directory {} already present, opening database", dir.display());
            return open_blocking(database).await;
        }
        Err(source) => return Err(ProvisionError::CreateDir { path: dir, source }),
    }

    log::info!("Local GeoLite database doesn't exist, downloading...");
    let result = download_and_unpack(config, client, &dir, database).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            log::warn!("Failed to clean up {} after provisioning error: {}", dir.display(), e);
        }
    }
    result
}

async fn download_and_unpack(
    config: &ProvisionConfig,
    client: &reqwest::Client,
    dir: &Path,
    database: PathBuf,
) -> Result<GeoDatabase, ProvisionError> {
    let archive = dir.join(GEOIP_ARCHIVE_FILE);
    let url = download_url(&config.geoip_source, &config.license_key);

    let bytes = download_to_file(client, &url, &archive).await?;
    log::info!("Downloaded GeoIP archive ({} bytes)", bytes);

    let destination = dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        extract_archive(&archive, &destination)?;
        GeoDatabase::open(&database)
    })
    .await?
}

async fn open_blocking(database: PathBuf) -> Result<GeoDatabase, ProvisionError> {
    tokio::task::spawn_blocking(move || GeoDatabase::open(&database)).await?
}

/// Streams the response body for `url` into a newly created `destination`.
///
/// The body is written chunk by chunk and never held in memory as a whole.
async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    destination: &Path,
) -> Result<u64, ProvisionError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .await
        .map_err(|e| ProvisionError::io(format!("Failed to create {:?}", destination), e))?;

    // The URL carries the license key; log only the path
    log::debug!("Requesting GeoIP archive from {}", MAXMIND_DOWNLOAD_PATH);
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        log::error!("GeoIP archive download failed with status {}", status);
        return Err(ProvisionError::DownloadStatus(status));
    }

    let mut total = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| ProvisionError::io(format!("Failed to write {:?}", destination), e))?;
        total += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| ProvisionError::io(format!("Failed to flush {:?}", destination), e))?;

    Ok(total)
}
