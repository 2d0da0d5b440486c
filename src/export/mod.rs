//! Bulk export of stored run records.
//!
//! Walks the runs collection page by page with cursor pagination and writes
//! every record as one JSON line, minus the store's own bookkeeping key.

mod page;

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::config::{DumpConfig, STORE_METADATA_KEY, STORE_QUERY_PATH};
use crate::forward::StoreClient;
use crate::initialization::init_store_client;

use page::{PageRequest, QueryPage};

/// Results of an export run.
#[derive(Debug, Clone)]
pub struct DumpReport {
    /// Number of records written
    pub records: usize,
    /// Number of pages fetched
    pub pages: usize,
    /// File the records were written to
    pub output: PathBuf,
}

/// Exports every run record to `config.output`.
///
/// # Errors
///
/// Returns an error if the store answers with a status of 400 or above, a
/// page cannot be decoded, or the output file cannot be written.
pub async fn dump(config: &DumpConfig) -> Result<DumpReport> {
    let client = init_store_client().context("Failed to initialize store client")?;
    let store = StoreClient::new(client, &config.store).context("Invalid store configuration")?;
    dump_with(&store, &config.output, config.page_size).await
}

async fn dump_with(store: &StoreClient, output: &Path, page_size: usize) -> Result<DumpReport> {
    let file = tokio::fs::File::create(output)
        .await
        .with_context(|| format!("Failed to create output file: {}", output.display()))?
        .into_std()
        .await;
    let mut writer = BufWriter::new(file);

    let mut cursor: Option<String> = None;
    let mut records = 0;
    let mut pages = 0;

    loop {
        let page = fetch_page(store, page_size, cursor.as_deref()).await?;
        pages += 1;

        for mut record in page.records {
            record.remove(STORE_METADATA_KEY);
            serde_json::to_writer(&mut writer, &record)?;
            writer.write_all(b"\n")?;
            records += 1;
        }
        log::info!("Fetched page {} ({} records so far)", pages, records);

        if !page.meta.page.more {
            break;
        }
        match page.meta.page.cursor {
            Some(next) => cursor = Some(next),
            None => bail!("Store reported more pages but returned no cursor"),
        }
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush output file: {}", output.display()))?;

    Ok(DumpReport {
        records,
        pages,
        output: output.to_path_buf(),
    })
}

async fn fetch_page(store: &StoreClient, size: usize, after: Option<&str>) -> Result<QueryPage> {
    let response = store
        .post_json(STORE_QUERY_PATH, &PageRequest::new(size, after))
        .await
        .context("Failed to query store")?;

    let status = response.status();
    if status.as_u16() >= 400 {
        let body = response.text().await.unwrap_or_default();
        bail!("Problem getting data, response with code {}: {}", status, body);
    }

    response
        .json::<QueryPage>()
        .await
        .context("Failed to decode query page")
}
