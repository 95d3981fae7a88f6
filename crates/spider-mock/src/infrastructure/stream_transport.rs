//! Newline-framed text messages over any async byte stream.
//!
//! Used for the RFCOMM serial link, but generic over `AsyncRead + AsyncWrite`
//! so it can be exercised with in-memory streams.
//!
//! Reads of at most [`READ_CHUNK`] bytes are fed to a [`LineDecoder`], so a
//! command split across reads is reassembled and an unterminated final line
//! is delivered when the peer hangs up.  Replies are written with a trailing
//! `\n`.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use spider_core::LineDecoder;

use crate::application::transport::{CommandConnection, TransportError};

/// Maximum bytes consumed by one read.
pub const READ_CHUNK: usize = 1024;

/// A [`CommandConnection`] over a raw byte stream.
pub struct StreamConnection<S> {
    stream: Option<S>,
    pending: VecDeque<String>,
    decoder: LineDecoder,
    buf: Vec<u8>,
}

impl<S> StreamConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
            pending: VecDeque::new(),
            decoder: LineDecoder::new(),
            buf: vec![0; READ_CHUNK],
        }
    }
}

#[async_trait]
impl<S> CommandConnection for StreamConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Ok(Some(message));
            }

            let stream = self.stream.as_mut().ok_or(TransportError::NotOpen)?;
            let n = stream.read(&mut self.buf).await?;
            if n == 0 {
                return Ok(self.decoder.finish());
            }

            self.pending.extend(self.decoder.push(&self.buf[..n]));
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotOpen)?;
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        stream.write_all(line.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("error shutting down stream: {e}");
            }
        }
        self.pending.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
