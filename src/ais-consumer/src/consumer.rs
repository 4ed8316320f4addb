use std::{sync::Arc, time::Duration};

use async_channel::Sender;
use cablewatch_core::DataMessage;
use chrono::Utc;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::{
    codec::{FramedRead, LinesCodec, LinesCodecError},
    sync::CancellationToken,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    counters::IngestCounters,
    error::{Result, error::InternalChannelClosedSnafu},
    normalizer::{DropReason, MessageNormalizer, Normalized},
};

const LOGGED_LINE_PREFIX: usize = 120;

/// Frames a feed stream into lines and hands normalized batches to the ingestion workers
/// every commit interval.
pub struct Consumer {
    commit_interval: Duration,
    max_line_length: usize,
    normalizer: MessageNormalizer,
    counters: Arc<IngestCounters>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Cancelled,
    /// The stream ended, `lines` is the number of lines it delivered.
    Closed { lines: u64 },
}

impl Consumer {
    pub fn new(
        commit_interval: Duration,
        max_line_length: usize,
        counters: Arc<IngestCounters>,
    ) -> Consumer {
        Consumer {
            commit_interval,
            max_line_length,
            normalizer: MessageNormalizer,
            counters,
        }
    }

    /// Reads `source` until it closes or `cancellation` fires. Buffered lines are always
    /// flushed before returning, the only error is a closed internal channel.
    pub async fn run(
        &self,
        source: impl AsyncRead + Unpin,
        sender: &Sender<DataMessage>,
        cancellation: &CancellationToken,
    ) -> Result<ConsumeOutcome> {
        let codec = LinesCodec::new_with_max_length(self.max_line_length);
        let mut framed_read = FramedRead::new(source, codec);

        // Keeps its capacity between flushes, sized by the busiest commit interval.
        let mut buffer = Vec::new();
        let mut lines = 0;

        let mut interval = tokio::time::interval(self.commit_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    self.flush(&mut buffer, sender).await?;
                    return Ok(ConsumeOutcome::Cancelled);
                }
                message = framed_read.next() => match message {
                    Some(Ok(line)) => {
                        lines += 1;
                        buffer.push(line);
                    }
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        self.counters.record_oversized_line();
                        warn!("discarded a line exceeding {} bytes", self.max_line_length);
                    }
                    Some(Err(LinesCodecError::Io(e))) => {
                        warn!("feed stream failed: {e:?}");
                        self.flush(&mut buffer, sender).await?;
                        return Ok(ConsumeOutcome::Closed { lines });
                    }
                    None => {
                        self.flush(&mut buffer, sender).await?;
                        return Ok(ConsumeOutcome::Closed { lines });
                    }
                },
                _ = interval.tick() => {
                    self.flush(&mut buffer, sender).await?;
                }
            }
        }
    }

    async fn flush(&self, buffer: &mut Vec<String>, sender: &Sender<DataMessage>) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let message = self.process_lines(buffer.drain(..));
        if message.is_empty() {
            return Ok(());
        }

        sender
            .send(message)
            .await
            .map_err(|_| InternalChannelClosedSnafu.build())
    }

    #[instrument(skip_all, fields(app.num_messages, app.num_positions, app.num_descriptors))]
    fn process_lines(&self, lines: impl Iterator<Item = String>) -> DataMessage {
        let received_at = Utc::now();
        let mut message = DataMessage::default();
        let mut num_messages = 0;

        for line in lines {
            num_messages += 1;

            let normalized = self.normalizer.normalize(&line, received_at);
            self.counters.record(&normalized);

            match normalized {
                Normalized::Position(p) => message.positions.push(p),
                Normalized::Descriptor(d) => message.descriptors.push(d),
                Normalized::Ignored => {}
                Normalized::Dropped(DropReason::Malformed) => {
                    warn!("dropped malformed report: {}", truncated(&line))
                }
                Normalized::Dropped(DropReason::MissingCoordinates) => {
                    debug!("dropped report without coordinates")
                }
            }
        }

        let span = tracing::Span::current();
        span.record("app.num_messages", num_messages);
        span.record("app.num_positions", message.positions.len());
        span.record("app.num_descriptors", message.descriptors.len());

        let totals = self.counters.snapshot();
        info!(
            received = totals.received,
            positions = totals.positions,
            descriptors = totals.descriptors,
            dropped = totals.dropped(),
            unknown_category = totals.unknown_category,
            "processed batch"
        );

        message
    }
}

fn truncated(line: &str) -> &str {
    match line.char_indices().nth(LOGGED_LINE_PREFIX) {
        Some((end, _)) => &line[..end],
        None => line,
    }
}
