// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-lines dump backend.
//!
//! Replays `<data_dir>/<pchannel>.jsonl`, one serialized message per line,
//! then keeps tailing the file for appended lines.

use super::{Broker, BrokerError, BrokerReader, ReadRequest, ReadSession};
use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use ws_core::{DeliverPolicy, ImmutableMessage, MessageId, PChannelInfo};

/// Assumed average line length used to size the read buffer
const BYTES_PER_MESSAGE: usize = 1024;
const MIN_BUFFER_BYTES: usize = 8 * 1024;

/// Configuration of the file backend
#[derive(Debug, Clone)]
pub struct FileBrokerConfig {
    /// Directory holding one `.jsonl` file per physical channel
    pub data_dir: PathBuf,
    /// How often to look for appended lines at end of file
    pub poll_interval: Duration,
}

/// Broker replaying WAL dumps from disk
#[derive(Debug, Clone)]
pub struct FileBroker {
    config: FileBrokerConfig,
}

impl FileBroker {
    pub fn new(config: FileBrokerConfig) -> Self {
        Self { config }
    }

    /// Dump file backing a channel
    pub fn channel_path(&self, channel: &str) -> PathBuf {
        self.config.data_dir.join(format!("{}.jsonl", channel))
    }
}

#[async_trait]
impl Broker for FileBroker {
    fn name(&self) -> &str {
        "file"
    }

    async fn open(&self, channel: PChannelInfo) -> Result<Box<dyn BrokerReader>, BrokerError> {
        Ok(Box::new(FileReader {
            path: self.channel_path(&channel.name),
            poll_interval: self.config.poll_interval,
            channel,
            closed: AtomicBool::new(false),
        }))
    }
}

struct FileReader {
    path: PathBuf,
    poll_interval: Duration,
    channel: PChannelInfo,
    closed: AtomicBool,
}

#[async_trait]
impl BrokerReader for FileReader {
    fn channel(&self) -> &PChannelInfo {
        &self.channel
    }

    async fn read(&self, request: ReadRequest) -> Result<Box<dyn ReadSession>, BrokerError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrokerError::ReaderClosed(self.channel.name.clone()));
        }

        let mut file = File::open(&self.path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                BrokerError::ChannelNotFound(self.path.display().to_string())
            }
            _ => BrokerError::from(e),
        })?;

        let skip = match request.deliver_policy {
            DeliverPolicy::All => Skip::Nothing,
            DeliverPolicy::Latest => {
                file.seek(SeekFrom::End(0)).await?;
                Skip::Nothing
            }
            DeliverPolicy::StartFrom(id) => Skip::Before(id),
            DeliverPolicy::StartAfter(id) => Skip::UpTo(id),
        };

        let capacity = (request.read_ahead_buffer_size * BYTES_PER_MESSAGE).max(MIN_BUFFER_BYTES);
        Ok(Box::new(FileSession {
            reader: BufReader::with_capacity(capacity, file),
            line: String::new(),
            line_no: 0,
            skip,
            poll_interval: self.poll_interval,
            closed: false,
        }))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Messages to drop before delivery starts
#[derive(Debug, Clone, Copy)]
enum Skip {
    Nothing,
    /// Drop ids lower than this one
    Before(MessageId),
    /// Drop ids up to and including this one
    UpTo(MessageId),
}

impl Skip {
    fn skips(&self, id: MessageId) -> bool {
        match self {
            Skip::Nothing => false,
            Skip::Before(start) => id < *start,
            Skip::UpTo(last) => id <= *last,
        }
    }
}

struct FileSession {
    reader: BufReader<File>,
    /// Partially read line, kept across polls
    line: String,
    line_no: u64,
    skip: Skip,
    poll_interval: Duration,
    closed: bool,
}

#[async_trait]
impl ReadSession for FileSession {
    async fn next(&mut self) -> Result<Option<ImmutableMessage>, BrokerError> {
        loop {
            if self.closed {
                return Ok(None);
            }

            let n = self.reader.read_line(&mut self.line).await?;
            if n == 0 || !self.line.ends_with('\n') {
                // At end of file, possibly mid-line; wait for the writer
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            self.line_no += 1;
            let text = std::mem::take(&mut self.line);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            let msg: ImmutableMessage =
                serde_json::from_str(text).map_err(|e| BrokerError::Decode {
                    line: self.line_no,
                    message: e.to_string(),
                })?;

            if self.skip.skips(msg.id()) {
                continue;
            }
            self.skip = Skip::Nothing;
            return Ok(Some(msg));
        }
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
