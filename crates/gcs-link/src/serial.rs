use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::info;

use crate::LinkError;

/// Half-duplex serial line to the ground radio. One `SerialLink` is the
/// single logical writer for its port; `send_line` holding `&mut self` is the
/// write-then-flush critical section.
pub struct SerialLink {
    reader: BufReader<ReadHalf<SerialStream>>,
    writer: WriteHalf<SerialStream>,
    port: String,
    // partial line carried across timed-out reads
    pending: String,
}

impl SerialLink {
    pub fn open(port: &str, baud: u32) -> Result<Self> {
        let stream = tokio_serial::new(port, baud)
            .open_native_async()
            .with_context(|| format!("open serial port {}", port))?;
        info!(port, baud, "serial link open");
        let (rd, wr) = tokio::io::split(stream);
        Ok(Self {
            reader: BufReader::new(rd),
            writer: wr,
            port: port.to_owned(),
            pending: String::new(),
        })
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Writes one line (newline appended) and flushes before returning, so
    /// the next write never interleaves on the half-duplex channel.
    pub async fn send_line(&mut self, line: &str) -> Result<(), LinkError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Bounded read of one line. `Ok(None)` means the window elapsed with no
    /// complete line yet (any partial input is kept for the next call);
    /// `Err(Closed)` means the peer went away.
    pub async fn recv_line(&mut self, window: Duration) -> Result<Option<String>, LinkError> {
        match tokio::time::timeout(window, self.reader.read_line(&mut self.pending)).await {
            Err(_elapsed) => Ok(None),
            Ok(Ok(0)) => Err(LinkError::Closed),
            Ok(Ok(_)) => Ok(Some(std::mem::take(&mut self.pending).trim_end().to_owned())),
            Ok(Err(e)) => Err(LinkError::Io(e)),
        }
    }

    /// Splits into the buffered read half and the write half, for callers
    /// that run a dedicated reader task while keeping the writer.
    pub fn into_split(self) -> (BufReader<ReadHalf<SerialStream>>, WriteHalf<SerialStream>) {
        (self.reader, self.writer)
    }

    /// Borrows both halves at once, e.g. for the handshake.
    pub fn halves(
        &mut self,
    ) -> (
        &mut BufReader<ReadHalf<SerialStream>>,
        &mut WriteHalf<SerialStream>,
    ) {
        (&mut self.reader, &mut self.writer)
    }
}
