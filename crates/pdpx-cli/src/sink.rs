//! CSV output for a finished batch.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, TimeZone};
use pdpx_core::OutputRow;
use pdpx_scraper::{FailedUrl, ScrapeBatch};

/// Files written for one run. `failed` is only written when a URL failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutputPaths {
    pub products: PathBuf,
    pub failed: Option<PathBuf>,
}

fn stamped(dir: &Path, prefix: &str, stamp: &str) -> PathBuf {
    dir.join(format!("{prefix}-{stamp}.csv"))
}

/// Writes the import rows, and the failed URLs when there are any, into
/// timestamped files under `dir` (created if missing).
///
/// # Errors
///
/// Returns an error if the directory or either file cannot be written.
pub(crate) fn write_batch<Tz>(
    dir: &Path,
    batch: &ScrapeBatch,
    now: DateTime<Tz>,
) -> anyhow::Result<OutputPaths>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    let stamp = now.format("%Y%m%d-%H%M%S").to_string();

    let products = stamped(dir, "products", &stamp);
    let file =
        File::create(&products).with_context(|| format!("creating {}", products.display()))?;
    write_rows(file, &batch.rows).with_context(|| format!("writing {}", products.display()))?;
    tracing::info!(path = %products.display(), rows = batch.rows.len(), "wrote products file");

    let failed = if batch.failed_urls.is_empty() {
        None
    } else {
        let path = stamped(dir, "failed", &stamp);
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write_failures(file, &batch.failed_urls)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), failed = batch.failed_urls.len(), "wrote failures file");
        Some(path)
    };

    Ok(OutputPaths { products, failed })
}

/// Serializes `rows` with the import column names as header.
pub(crate) fn write_rows<W: Write>(writer: W, rows: &[OutputRow]) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

pub(crate) fn write_failures<W: Write>(writer: W, failures: &[FailedUrl]) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for failure in failures {
        csv.serialize(failure)?;
    }
    csv.flush()?;
    Ok(())
}
