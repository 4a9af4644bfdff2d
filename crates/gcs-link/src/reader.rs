use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Spawns the dedicated reader task: drains the transport line by line into
/// a channel. An I/O error or EOF ends the task and closes the channel; the
/// connection is then considered lost, but nothing else is torn down.
pub fn spawn_reader<R>(mut reader: R) -> mpsc::Receiver<String>
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("reader: transport closed");
                    break;
                }
                Ok(_) => {
                    let line = line.trim_end().to_owned();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.send(line).await.is_err() {
                        // receiver dropped, nobody is listening anymore
                        break;
                    }
                }
                Err(e) => {
                    warn!("reader: transport error: {e}");
                    break;
                }
            }
        }
    });
    rx
}
