use crate::error::SourceError;
use async_compression::tokio::bufread::GzipDecoder;
use futures::TryStreamExt;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio_util::io::{StreamReader, SyncIoBridge};

pub const DBLP_URL: &str = "https://dblp.org/xml/dblp.xml.gz";

const BUFFER_SIZE: usize = 1 << 16;

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("gz"))
}

/// Opens the corpus for blocking, incremental reads.
///
/// `.gz` files are inflated on the fly by the async decoder running on
/// `handle`; bytes are only decompressed as the caller reads them. Must not
/// be read from inside an async task.
pub fn open_input(path: &Path, handle: Handle) -> Result<Box<dyn BufRead>, SourceError> {
    let file = std::fs::File::open(path)?;
    if !is_gzip(path) {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)));
    }
    let file = tokio::fs::File::from_std(file);
    let decoder = GzipDecoder::new(tokio::io::BufReader::with_capacity(BUFFER_SIZE, file));
    let bridge = SyncIoBridge::new_with_handle(decoder, handle);
    Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, bridge)))
}

/// Streams `url` into `destination` and returns the number of bytes written.
/// The body is gunzipped on the way unless `destination` itself ends in `.gz`.
pub async fn download(url: &str, destination: &Path) -> Result<u64, SourceError> {
    download_with(&reqwest::Client::new(), url, destination).await
}

async fn download_with(client: &reqwest::Client, url: &str, destination: &Path) -> Result<u64, SourceError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let stream = Box::pin(response.bytes_stream().map_err(io::Error::other));
    let mut reader = StreamReader::new(stream);
    let mut output = tokio::fs::File::create(destination).await?;

    let written = if is_gzip(destination) {
        tokio::io::copy(&mut reader, &mut output).await?
    } else {
        let mut decoder = GzipDecoder::new(reader);
        tokio::io::copy(&mut decoder, &mut output).await?
    };
    output.flush().await?;
    Ok(written)
}
