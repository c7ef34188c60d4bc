use super::ReadRange;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::RANGE;
use reqwest::{Client, IntoUrl, StatusCode, Url};
use std::io::{Error, ErrorKind, Result};
use tokio::runtime::Handle;
use tracing::trace;

/// Byte-range reader for a raster served over HTTP(S).
///
/// Requests are async underneath and driven to completion on the host's
/// runtime, so callers see a plain blocking [`ReadRange`].
#[derive(Clone, Debug)]
pub struct HttpReader {
    url: Url,
    client: Client,
    runtime: Handle,
}

impl HttpReader {
    pub fn new<U: IntoUrl>(url: U, client: Client, runtime: Handle) -> Result<Self> {
        Ok(Self {
            url: url
                .into_url()
                .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("{e}")))?,
            client,
            runtime,
        })
    }

    pub fn read_range_async<'a>(
        &'a self,
        start: u64,
        buf: &'a mut [u8],
    ) -> BoxFuture<'a, Result<usize>> {
        let n = buf.len();
        if n == 0 {
            return futures::future::ready(Ok(0)).boxed();
        }
        let end = start + n as u64 - 1; // byte range includes end
        let range = format!("bytes={start}-{end}");
        trace!("requesting {range} of {}", self.url);
        let request = self.client.get(self.url.clone()).header(RANGE, range).send();

        async move {
            let mut response = request
                .await
                .map_err(|e| Error::new(ErrorKind::NotConnected, format!("{e}")))?;

            let mut skip = match response.status() {
                StatusCode::PARTIAL_CONTENT => 0,
                // Server ignored the range and is sending the whole body
                StatusCode::OK => start,
                StatusCode::RANGE_NOT_SATISFIABLE => return Ok(0),
                StatusCode::NOT_FOUND => {
                    return Err(Error::new(ErrorKind::NotFound, "HTTP 404 Not Found"))
                }
                status => return Err(Error::other(format!("HTTP {status}"))),
            };

            // Stream the body and hang up once the window is filled
            let mut filled = 0;
            while filled < n {
                let Some(chunk) = response
                    .chunk()
                    .await
                    .map_err(|e| Error::new(ErrorKind::InvalidData, format!("{e}")))?
                else {
                    break;
                };
                let dropped = skip.min(chunk.len() as u64) as usize;
                skip -= dropped as u64;
                let available = &chunk[dropped..];
                let count = available.len().min(n - filled);
                buf[filled..filled + count].copy_from_slice(&available[..count]);
                filled += count;
            }
            Ok(filled)
        }
        .boxed()
    }
}

impl ReadRange for HttpReader {
    fn read_range(&self, start: u64, buf: &mut [u8]) -> Result<usize> {
        self.runtime.block_on(self.read_range_async(start, buf))
    }
}
