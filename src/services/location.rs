// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device location sources.
//!
//! A source hands out subscriptions; dropping a subscription releases the
//! underlying sensor stream.

use crate::error::LocationError;
use crate::models::PositionSample;
use tokio::sync::broadcast;

/// One item of the location stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationEvent {
    Sample(PositionSample),
    Failed(LocationError),
}

/// Something that can stream device positions.
pub trait LocationSource: Send + Sync {
    fn subscribe(&self) -> Result<LocationSubscription, LocationError>;
}

/// Live subscription to a location stream.
#[derive(Debug)]
pub struct LocationSubscription {
    receiver: broadcast::Receiver<LocationEvent>,
}

impl LocationSubscription {
    pub fn new(receiver: broadcast::Receiver<LocationEvent>) -> Self {
        Self { receiver }
    }

    /// Next event, or `None` once the source has gone away.
    ///
    /// If the consumer fell behind, the skipped events are logged and the
    /// stream continues with the oldest retained one.
    pub async fn next(&mut self) -> Option<LocationEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Location subscriber lagged; samples dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Source fed by pushes, e.g. from the browser's geolocation watch
/// relayed over HTTP.
#[derive(Debug, Clone)]
pub struct ChannelLocationSource {
    sender: broadcast::Sender<LocationEvent>,
}

impl Default for ChannelLocationSource {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ChannelLocationSource {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Deliver a sample. Returns false when nobody is subscribed.
    pub fn push_sample(&self, sample: PositionSample) -> bool {
        self.sender.send(LocationEvent::Sample(sample)).is_ok()
    }

    /// Deliver a stream failure. Returns false when nobody is subscribed.
    pub fn push_error(&self, error: LocationError) -> bool {
        self.sender.send(LocationEvent::Failed(error)).is_ok()
    }

    pub fn is_subscribed(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl LocationSource for ChannelLocationSource {
    fn subscribe(&self) -> Result<LocationSubscription, LocationError> {
        Ok(LocationSubscription::new(self.sender.subscribe()))
    }
}
