use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Probe/acknowledge exchange that decides whether the device on a freshly
/// opened port is the expected ground radio. Timeout is a normal negative
/// verdict, not a fault; only transport errors surface as `Err`.
#[derive(Debug, Clone)]
pub struct Handshake {
    pub probe: String,
    pub ack: String,
    pub init_marker: String,
    pub window: Duration,
}

impl Default for Handshake {
    fn default() -> Self {
        Self {
            probe: "PING".into(),
            ack: "OK".into(),
            init_marker: "ESP-GCS Ready".into(),
            window: Duration::from_millis(1000),
        }
    }
}

impl Handshake {
    /// Sends the probe, then reads lines until the exact ack token arrives
    /// (verified) or the window elapses (rejected). A line carrying the init
    /// marker means the device is still booting: keep waiting, decide nothing.
    pub async fn verify<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        writer
            .write_all(format!("{}\n", self.probe).as_bytes())
            .await
            .context("send handshake probe")?;
        writer.flush().await.context("flush handshake probe")?;

        let deadline = Instant::now() + self.window;
        let mut line = String::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }

            line.clear();
            match tokio::time::timeout(remaining, reader.read_line(&mut line)).await {
                Err(_elapsed) => return Ok(false),
                Ok(Ok(0)) => {
                    debug!("handshake: peer closed before ack");
                    return Ok(false);
                }
                Ok(Ok(_)) => {
                    let line = line.trim();
                    if line == self.ack {
                        return Ok(true);
                    }
                    if line.contains(&self.init_marker) {
                        debug!("handshake: device still initializing");
                    }
                    // anything else: keep listening inside the window
                }
                Ok(Err(e)) => return Err(e).context("read handshake response"),
            }
        }
    }
}

/// Record of ports that already passed the handshake. Injectable, owned by
/// whoever drives the connection; a verified port is never re-probed.
#[derive(Debug, Default)]
pub struct VerifiedPorts {
    verified: HashSet<String>,
}

impl VerifiedPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_verified(&self, port: &str) -> bool {
        self.verified.contains(port)
    }

    /// Runs the handshake unless `port` is already verified. On rejection the
    /// port stays unrecorded and the caller must discard the handle.
    pub async fn verify_port<R, W>(
        &mut self,
        port: &str,
        handshake: &Handshake,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if self.is_verified(port) {
            debug!(port, "already verified, skipping probe");
            return Ok(true);
        }
        let ok = handshake.verify(reader, writer).await?;
        if ok {
            info!(port, "handshake verified");
            self.verified.insert(port.to_owned());
        } else {
            warn!(port, "handshake rejected (no ack within window)");
        }
        Ok(ok)
    }
}
