// crates/adapt/src/ndjson.rs

//! Newline-delimited JSON record source.

use std::path::{Path, PathBuf};

use domain::setting::SourceSettings;
use domain::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::Error;

/// Stream the records of an NDJSON file.
///
/// Returns the decoded records and, separately, every problem met along the
/// way. Blank lines are skipped. A line that is not valid JSON is reported as
/// [`Error::Parse`] and reading continues. If the file cannot be opened, a
/// single [`Error::Open`] is sent and both streams close; a read failure
/// part-way through ends the source the same way with [`Error::Read`].
///
/// Must be called from within a tokio runtime.
pub fn open(
    path: impl AsRef<Path>,
    settings: &SourceSettings,
) -> (ReceiverStream<Value>, ReceiverStream<Error>) {
    let path = path.as_ref().to_path_buf();
    let (tx, rx) = mpsc::channel(settings.buffer.max(1));
    let (tx_err, rx_err) = mpsc::channel(settings.error_buffer.max(1));

    tokio::spawn(read_task(path, tx, tx_err));

    (ReceiverStream::new(rx), ReceiverStream::new(rx_err))
}

#[tracing::instrument(skip_all, fields(path = %path.display()))]
async fn read_task(path: PathBuf, tx: mpsc::Sender<Value>, tx_err: mpsc::Sender<Error>) {
    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(source) => {
            warn!(%source, "cannot open record source");
            let _ = tx_err.send(Error::Open { path, source }).await;
            return;
        }
    };

    let mut lines = BufReader::new(file).split(b'\n');
    let mut line_no = 0usize;

    loop {
        let raw = match lines.next_segment().await {
            Ok(Some(raw)) => raw,
            Ok(None) => break,
            Err(source) => {
                warn!(%source, line = line_no + 1, "read failed");
                let _ = tx_err.send(Error::Read { path, source }).await;
                return;
            }
        };
        line_no += 1;

        let line = raw.strip_suffix(b"\r").unwrap_or(&raw);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<serde_json::Value>(line) {
            Ok(json) => {
                if tx.send(Value::from(json)).await.is_err() {
                    debug!(line = line_no, "record receiver dropped; stopping");
                    return;
                }
            }
            Err(source) => {
                debug!(line = line_no, %source, "skipping malformed line");
                let _ = tx_err
                    .send(Error::Parse {
                        line: line_no,
                        source,
                    })
                    .await;
            }
        }
    }

    debug!(lines = line_no, "record source exhausted");
}
