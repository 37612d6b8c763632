// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The raw delivery variants of `TransportSink` (§3/§4.4): a plain file (used
// for `-f outfile` and for local spooler backends) and a direct AppSocket/
// JetDirect TCP connection (port 9100), both of which the spec models as
// "loop write until EAGAIN handled, return bytes written or -1 on any
// other error". Tokio's `AsyncWriteExt::write` already suspends the task
// rather than spinning on `WouldBlock`, so the loop below only has to
// retry on `Interrupted` and stop on every other error, but it keeps the
// explicit partial-write loop the spec describes instead of reaching for
// `write_all` so a short write is still observable to the caller.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Result, SinkError};

/// Writes `buf` to `writer`, retrying on `Interrupted` and returning the
/// total byte count written. Any other I/O error is propagated.
pub async fn write_with_retry<W: AsyncWrite + Unpin>(writer: &mut W, buf: &[u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match writer.write(&buf[total..]).await {
            Ok(0) => {
                return Err(SinkError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "sink accepted zero bytes",
                )))
            }
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(SinkError::Io(e)),
        }
    }
    Ok(total)
}

/// A plain-file sink (`-d file:///path` or `-f outfile`).
pub struct FileSink {
    file: File,
}

impl FileSink {
    pub async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).await.map_err(SinkError::Io)?;
        Ok(Self { file })
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> Result<usize> {
        write_with_retry(&mut self.file, buf).await
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.file.flush().await.map_err(SinkError::Io)
    }
}

/// A direct AppSocket/JetDirect sink: a bare TCP connection to port 9100 (or
/// whatever port the `socket://host:port` device URI names) with no
/// protocol framing — the printer treats the byte stream as the raw print
/// job (PostScript, PCL, or raster) and reports status out of band or not
/// at all.
pub struct SocketSink {
    stream: TcpStream,
}

impl SocketSink {
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await.map_err(SinkError::Io)?;
        Ok(Self { stream })
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> Result<usize> {
        write_with_retry(&mut self.stream, buf).await
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.stream.flush().await.map_err(SinkError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_sink_writes_full_buffer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut sink = FileSink::create(&path).await.unwrap();
        let n = sink.write_all(b"hello raster").await.unwrap();
        assert_eq!(n, 12);
        sink.flush().await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello raster");
    }

    #[tokio::test]
    async fn write_with_retry_reports_total_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut file = File::create(&path).await.unwrap();
        let n = write_with_retry(&mut file, &[0u8; 9000]).await.unwrap();
        assert_eq!(n, 9000);
    }
}
