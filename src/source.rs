//! Locating, downloading and decoding the monthly trip export.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use flate2::read::GzDecoder;

const BASE_URL: &str = "https://github.com/DataTalksClub/nyc-tlc-data/releases/download/yellow";

pub fn dataset_url(year: u16, month: u8) -> String {
    format!("{BASE_URL}/yellow_tripdata_{year:04}-{month:02}.csv.gz")
}

/// Download the export to a scratch file, streaming chunk by chunk.
pub async fn download(url: &str) -> Result<PathBuf> {
    let name = Path::new(url)
        .file_name()
        .context("source url has no file name")?;
    let path = env::temp_dir().join(name);

    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("failed to fetch {url}"))?;
    ensure!(
        response.status().is_success(),
        "{url} returned {}",
        response.status()
    );

    let mut out =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    while let Some(chunk) = response.chunk().await? {
        out.write_all(&chunk)?;
    }

    Ok(path)
}

/// A CSV reader over the gzipped export.
pub fn open(path: &Path) -> Result<csv::Reader<GzDecoder<File>>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(csv::Reader::from_reader(GzDecoder::new(file)))
}
