// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process publish/subscribe fabric with the three named dashboard
//! channels (`calls`, `transcripts`, `responses`).
//!
//! Events are serialized once into a shared wire frame and fanned out over
//! per-channel broadcast rings. Publication never blocks: a subscriber that
//! falls behind its bounded queue loses its oldest undelivered frames and
//! keeps going, without backpressuring the publisher or other subscribers.
//! Delivery is best-effort to current subscribers only; there is no replay
//! from history.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use lifeline_core::{BusChannel, LifelineError, PipelineEvent};

/// Default per-subscriber queue depth when not configured.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

/// The in-process event bus.
///
/// Cheap to clone is not needed; share via `Arc<EventBus>`. The channel
/// namespace is closed (see [`BusChannel::ALL`]), so all senders are
/// created up front and subscribe/publish never allocate channel state.
pub struct EventBus {
    calls: broadcast::Sender<Arc<str>>,
    transcripts: broadcast::Sender<Arc<str>>,
    responses: broadcast::Sender<Arc<str>>,
}

impl EventBus {
    /// Creates a bus with the given per-subscriber queue capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            calls: broadcast::Sender::new(capacity),
            transcripts: broadcast::Sender::new(capacity),
            responses: broadcast::Sender::new(capacity),
        }
    }

    /// Creates a bus with [`DEFAULT_SUBSCRIBER_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    fn sender(&self, channel: BusChannel) -> &broadcast::Sender<Arc<str>> {
        match channel {
            BusChannel::Calls => &self.calls,
            BusChannel::Transcripts => &self.transcripts,
            BusChannel::Responses => &self.responses,
        }
    }

    /// Publishes an event on the given channel.
    ///
    /// Non-blocking from the publisher's perspective. Having no subscribers
    /// is not an error; the frame is simply dropped.
    pub fn publish(
        &self,
        channel: BusChannel,
        event: &PipelineEvent,
    ) -> Result<(), LifelineError> {
        let frame: Arc<str> = serde_json::to_string(event)
            .map_err(|e| LifelineError::Internal(format!("event serialization failed: {e}")))?
            .into();

        match self.sender(channel).send(frame) {
            Ok(receivers) => {
                debug!(
                    channel = %channel,
                    call_sid = event.call_id.as_str(),
                    event = %event.kind,
                    sequence = event.sequence,
                    receivers,
                    "event published"
                );
            }
            Err(_) => {
                debug!(
                    channel = %channel,
                    call_sid = event.call_id.as_str(),
                    event = %event.kind,
                    "event published with no subscribers"
                );
            }
        }
        Ok(())
    }

    /// Publishes an event on the channel its kind maps to.
    pub fn route(&self, event: &PipelineEvent) -> Result<(), LifelineError> {
        self.publish(event.kind.channel(), event)
    }

    /// Subscribes to a channel, yielding only events published afterwards.
    pub fn subscribe(&self, channel: BusChannel) -> BusSubscription {
        BusSubscription {
            channel,
            rx: self.sender(channel).subscribe(),
            dropped: 0,
        }
    }

    /// Number of live subscriptions on a channel.
    pub fn subscriber_count(&self, channel: BusChannel) -> usize {
        self.sender(channel).receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's lazily-consumed view of a channel.
///
/// Dropping the subscription removes it from the channel; later publishes
/// are neither delivered to it nor an error for the publisher.
pub struct BusSubscription {
    channel: BusChannel,
    rx: broadcast::Receiver<Arc<str>>,
    dropped: u64,
}

impl BusSubscription {
    /// Receives the next frame, or `None` once the bus is gone.
    ///
    /// If this subscriber fell behind its bounded queue, the oldest
    /// undelivered frames were dropped; the gap is counted and logged and
    /// delivery resumes with the oldest retained frame.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        loop {
            match self.rx.recv().await {
                Ok(frame) => return Some(frame),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    self.dropped += missed;
                    warn!(
                        channel = %self.channel,
                        missed,
                        total_dropped = self.dropped,
                        "slow subscriber dropped oldest events"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// The channel this subscription watches.
    pub fn channel(&self) -> BusChannel {
        self.channel
    }

    /// Total frames this subscriber has lost to overflow.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_core::{EventKind, EventPayload};

    fn started(call_id: &str, sequence: u64) -> PipelineEvent {
        PipelineEvent::new(
            call_id,
            EventKind::CallStarted,
            sequence,
            EventPayload::CallStarted {
                status: "in-progress".into(),
            },
        )
    }

    fn parse(frame: &str) -> serde_json::Value {
        serde_json::from_str(frame).unwrap()
    }

    #[tokio::test]
    async fn subscriber_receives_published_events_in_order() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(BusChannel::Calls);

        for seq in 1..=3 {
            bus.publish(BusChannel::Calls, &started("c1", seq)).unwrap();
        }

        for expected in 1..=3u64 {
            let frame = sub.recv().await.unwrap();
            assert_eq!(parse(&frame)["sequence"], expected);
        }
    }

    #[tokio::test]
    async fn late_subscriber_only_sees_later_events() {
        let bus = EventBus::new();
        let mut early = bus.subscribe(BusChannel::Calls);

        bus.publish(BusChannel::Calls, &started("c1", 1)).unwrap();
        bus.publish(BusChannel::Calls, &started("c1", 2)).unwrap();

        let mut late = bus.subscribe(BusChannel::Calls);
        bus.publish(BusChannel::Calls, &started("c1", 3)).unwrap();

        // Early subscriber sees the full sequence.
        assert_eq!(parse(&early.recv().await.unwrap())["sequence"], 1);
        assert_eq!(parse(&early.recv().await.unwrap())["sequence"], 2);
        assert_eq!(parse(&early.recv().await.unwrap())["sequence"], 3);

        // Late subscriber starts at 3, never sees 1 or 2.
        assert_eq!(parse(&late.recv().await.unwrap())["sequence"], 3);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::new();
        assert!(bus.publish(BusChannel::Transcripts, &started("c1", 1)).is_ok());
    }

    #[tokio::test]
    async fn dropped_subscription_leaves_channel_clean() {
        let bus = EventBus::new();
        let sub = bus.subscribe(BusChannel::Responses);
        assert_eq!(bus.subscriber_count(BusChannel::Responses), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(BusChannel::Responses), 0);

        // Later publishes neither reach it nor error.
        assert!(bus.publish(BusChannel::Responses, &started("c1", 1)).is_ok());
    }

    #[tokio::test]
    async fn slow_subscriber_drops_oldest_and_recovers() {
        let bus = EventBus::with_capacity(8);
        let mut sub = bus.subscribe(BusChannel::Calls);

        // Overflow the bounded queue without consuming.
        for seq in 1..=20 {
            bus.publish(BusChannel::Calls, &started("c1", seq)).unwrap();
        }

        // First recv reports the lag and resumes at the oldest retained frame.
        let frame = sub.recv().await.unwrap();
        let first_seen = parse(&frame)["sequence"].as_u64().unwrap();
        assert!(first_seen > 1, "oldest frames must have been dropped");
        assert_eq!(sub.dropped(), first_seen - 1);

        // Remaining frames arrive gap-free.
        let mut prev = first_seen;
        while prev < 20 {
            let frame = sub.recv().await.unwrap();
            let seq = parse(&frame)["sequence"].as_u64().unwrap();
            assert_eq!(seq, prev + 1);
            prev = seq;
        }
    }

    #[tokio::test]
    async fn route_picks_the_kind_channel() {
        let bus = EventBus::new();
        let mut transcripts = bus.subscribe(BusChannel::Transcripts);
        let mut calls = bus.subscribe(BusChannel::Calls);

        let event = PipelineEvent::new(
            "c1",
            EventKind::TranscriptReady,
            2,
            EventPayload::Transcript {
                transcript: "help".into(),
            },
        );
        bus.route(&event).unwrap();

        let frame = transcripts.recv().await.unwrap();
        assert_eq!(parse(&frame)["event"], "transcript_ready");

        // Nothing arrived on calls.
        bus.publish(BusChannel::Calls, &started("c2", 1)).unwrap();
        let frame = calls.recv().await.unwrap();
        assert_eq!(parse(&frame)["call_sid"], "c2");
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let bus = EventBus::new();
        let mut responses = bus.subscribe(BusChannel::Responses);

        bus.publish(BusChannel::Calls, &started("c1", 1)).unwrap();
        bus.publish(
            BusChannel::Responses,
            &PipelineEvent::new(
                "c1",
                EventKind::EmotionReady,
                5,
                EventPayload::Emotions {
                    emotions: [("fear".to_string(), 0.7)].into_iter().collect(),
                },
            ),
        )
        .unwrap();

        let frame = responses.recv().await.unwrap();
        assert_eq!(parse(&frame)["event"], "emotion_ready");
        assert_eq!(parse(&frame)["sequence"], 5);
    }
}
