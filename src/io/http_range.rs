//! Seekable reader over HTTP byte ranges
//!
//! Cloud-Optimized GeoTIFFs are laid out so that a reader only needs the
//! header, the IFDs and the tiles it actually touches. `HttpRangeReader`
//! turns a URL into a `Read + Seek` source that fetches those bytes with
//! `Range` requests and keeps the last fetched block in memory.

use std::io::{self, Read, Seek, SeekFrom};

use log::{debug, trace};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use reqwest::StatusCode;

use crate::errors::{ScoutError, ScoutResult};

/// Smallest request issued; large enough to cover a COG header and its IFDs
pub const DEFAULT_MIN_FETCH: usize = 64 * 1024;

/// Reads a remote file through HTTP `Range` requests
pub struct HttpRangeReader {
    client: Client,
    url: String,
    length: u64,
    position: u64,
    block: Vec<u8>,
    block_start: u64,
}

impl HttpRangeReader {
    /// Open a remote file, determining its length up front
    ///
    /// The length comes from a `HEAD` request; servers that do not answer
    /// `HEAD` get a one-byte range request and the total is read from
    /// `Content-Range`.
    pub fn open(client: Client, url: &str) -> ScoutResult<Self> {
        let length = match Self::head_length(&client, url) {
            Some(length) => length,
            None => Self::ranged_length(&client, url)?,
        };

        debug!("Opened remote raster ({} bytes)", length);

        Ok(HttpRangeReader {
            client,
            url: url.to_string(),
            length,
            position: 0,
            block: Vec::new(),
            block_start: 0,
        })
    }

    /// Total length of the remote file
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Whether the remote file is empty
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn head_length(client: &Client, url: &str) -> Option<u64> {
        let response = client.head(url).send().ok()?;
        if !response.status().is_success() {
            return None;
        }

        response.headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
    }

    fn ranged_length(client: &Client, url: &str) -> ScoutResult<u64> {
        let response = client.get(url).header(RANGE, "bytes=0-0").send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::HttpError(format!("HTTP {} while opening {}", status, strip_query(url))));
        }

        response.headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| ScoutError::HttpError(format!(
                "Server did not report a length for {}", strip_query(url))))
    }

    fn block_contains(&self, position: u64) -> bool {
        position >= self.block_start && position < self.block_start + self.block.len() as u64
    }

    /// Fetch `len` bytes starting at `start` into the block buffer
    fn fetch(&mut self, start: u64, len: usize) -> io::Result<()> {
        let end = (start + len as u64).min(self.length);
        if end <= start {
            self.block.clear();
            self.block_start = start;
            return Ok(());
        }

        trace!("Range request bytes={}-{}", start, end - 1);

        let response = self.client.get(&self.url)
            .header(RANGE, format!("bytes={}-{}", start, end - 1))
            .send()
            .map_err(redacted)?;

        let status = response.status();
        let bytes = response.bytes().map_err(redacted)?;

        let block = match status {
            StatusCode::PARTIAL_CONTENT => bytes.to_vec(),
            // Range ignored; the body is the whole file
            StatusCode::OK => {
                let from = (start as usize).min(bytes.len());
                let to = (end as usize).min(bytes.len());
                bytes[from..to].to_vec()
            },
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("HTTP {} for range {}-{}", other, start, end - 1),
                ));
            }
        };

        self.block = block;
        self.block_start = start;
        Ok(())
    }
}

impl Read for HttpRangeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.position >= self.length {
            return Ok(0);
        }

        if !self.block_contains(self.position) {
            let wanted = buf.len().max(DEFAULT_MIN_FETCH);
            self.fetch(self.position, wanted)?;
            if self.block.is_empty() {
                return Ok(0);
            }
        }

        let offset = (self.position - self.block_start) as usize;
        let available = self.block.len() - offset;
        let count = available.min(buf.len());
        buf[..count].copy_from_slice(&self.block[offset..offset + count]);
        self.position += count as u64;

        Ok(count)
    }
}

impl Seek for HttpRangeReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(delta) => self.length as i128 + delta as i128,
            SeekFrom::Current(delta) => self.position as i128 + delta as i128,
        };

        if target < 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek before start of remote file"));
        }

        self.position = target as u64;
        Ok(self.position)
    }
}

/// Wraps a transport error without the signed URL it carries
fn redacted(error: reqwest::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, ScoutError::from(error))
}

/// Parse the total length from a `Content-Range: bytes a-b/total` header
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse::<u64>().ok()
}

/// Drop the query string (which may carry a signature) before logging a URL
pub fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
