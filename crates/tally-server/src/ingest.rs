//! Event stream ingestion.
//!
//! Reads framed events from the host, dispatches them to the router in
//! arrival order, and flushes the vendor client on a fixed interval and
//! once more when the stream ends.

use crate::config::InputConfig;
use crate::metrics;
use anyhow::{Context, Result};
use bytes::{Buf, BufMut, BytesMut};
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Instant;
use tally_protocol::{codec, Event, Format, ProtocolError};
use tenvis_tally_core::Router;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Initial read buffer capacity.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Counters for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub events: u64,
    pub decode_errors: u64,
    pub flushes: u64,
}

/// Decoding state for one event stream.
struct Ingest<'a> {
    router: &'a Router,
    format: Format,
    max_buffer_size: usize,
    buf: BytesMut,
    /// Dropping the rest of an oversized JSON line.
    discarding: bool,
    stats: IngestStats,
}

impl<'a> Ingest<'a> {
    fn new(router: &'a Router, input: &InputConfig) -> Self {
        Self {
            router,
            format: input.format,
            max_buffer_size: input.max_buffer_size,
            buf: BytesMut::with_capacity(READ_BUFFER_SIZE),
            discarding: false,
            stats: IngestStats::default(),
        }
    }

    /// Dispatch every complete frame in the buffer.
    fn drain(&mut self) -> ControlFlow<()> {
        if self.discarding {
            self.skip_line();
        }

        loop {
            match codec::decode_from(&mut self.buf, self.format) {
                Ok(Some(event)) => self.dispatch(&event),
                Ok(None) => break,
                Err(e) => self.malformed(&e)?,
            }
        }

        if self.buf.len() > self.max_buffer_size {
            let buffered = self.buf.len();
            self.record_decode_error();
            match self.format {
                Format::Json => {
                    warn!(buffered, "Discarding oversized event line");
                    self.buf.clear();
                    self.discarding = true;
                }
                Format::MessagePack => {
                    warn!(buffered, "Oversized frame, closing event stream");
                    return ControlFlow::Break(());
                }
            }
        }

        ControlFlow::Continue(())
    }

    /// Drain what is left once the host closes the stream.
    fn finish(&mut self) {
        if self.format == Format::Json && !self.buf.is_empty() {
            self.buf.put_u8(b'\n');
        }
        if self.drain().is_break() {
            return;
        }
        if !self.buf.is_empty() && !self.discarding {
            warn!(remaining = self.buf.len(), "Discarding truncated frame at end of stream");
            self.record_decode_error();
        }
    }

    fn skip_line(&mut self) {
        match self.buf.iter().position(|b| *b == b'\n') {
            Some(newline) => {
                self.buf.advance(newline + 1);
                self.discarding = false;
            }
            None => self.buf.clear(),
        }
    }

    fn malformed(&mut self, error: &ProtocolError) -> ControlFlow<()> {
        self.record_decode_error();
        match self.format {
            Format::Json => {
                warn!(error = %error, "Skipping malformed event line");
                ControlFlow::Continue(())
            }
            Format::MessagePack => {
                warn!(error = %error, "Malformed frame, closing event stream");
                ControlFlow::Break(())
            }
        }
    }

    fn dispatch(&mut self, event: &Event) {
        let start = Instant::now();
        self.router.dispatch(event);
        metrics::record_event(event.event_type(), start.elapsed().as_secs_f64());
        self.stats.events += 1;
    }

    fn flush(&mut self) {
        self.router.flush();
        metrics::record_flush();
        self.stats.flushes += 1;
    }

    fn record_decode_error(&mut self) {
        metrics::record_decode_error();
        self.stats.decode_errors += 1;
    }
}

/// Run the ingestion loop until the stream ends, a MessagePack frame is
/// malformed, or `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if reading from the stream fails.
pub async fn run<R, S>(
    mut reader: R,
    router: &Router,
    input: &InputConfig,
    shutdown: S,
) -> Result<IngestStats>
where
    R: AsyncRead + Unpin,
    S: Future<Output = ()>,
{
    let mut ingest = Ingest::new(router, input);

    let mut ticker = tokio::time::interval(input.flush_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    tokio::pin!(shutdown);

    info!(format = ?input.format, "Reading events");

    loop {
        tokio::select! {
            read = reader.read_buf(&mut ingest.buf) => {
                let n = read.context("Failed to read event stream")?;
                if n == 0 {
                    ingest.finish();
                    info!("Event stream closed");
                    break;
                }
                if ingest.drain().is_break() {
                    break;
                }
            }
            _ = ticker.tick() => {
                debug!("Periodic flush");
                ingest.flush();
            }
            () = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    ingest.flush();
    info!(
        events = ingest.stats.events,
        decode_errors = ingest.stats.decode_errors,
        flushes = ingest.stats.flushes,
        "Ingestion finished"
    );
    Ok(ingest.stats)
}
