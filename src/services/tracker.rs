// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background task that forwards a location subscription to the session.
//!
//! Handles:
//! - Bounded wait for the first fix (degrades to manual placement)
//! - Terminal sensor failures (no automatic retry)
//! - Unsubscribing on stop or drop

use crate::error::LocationError;
use crate::models::PositionSample;
use crate::services::location::{LocationEvent, LocationSource, LocationSubscription};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Receiver of forwarded location events.
pub trait LocationSink: Send + 'static {
    /// Called once the subscription is live and the first fix is awaited.
    fn on_waiting(&mut self) {}
    fn on_sample(&mut self, sample: PositionSample);
    /// Called at most once; the feed ends right after.
    fn on_failure(&mut self, error: LocationError);
}

/// Handle to a running feed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct LocationFeed {
    handle: Option<JoinHandle<()>>,
}

impl LocationFeed {
    /// Subscribe to `source` and forward its events to `sink`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<T: LocationSink>(
        source: &dyn LocationSource,
        sink: Arc<Mutex<T>>,
        first_fix_timeout: Duration,
    ) -> Self {
        let subscribed = source.subscribe();
        let handle = tokio::spawn(run(subscribed, sink, first_fix_timeout));
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Stop forwarding and release the subscription.
    pub fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("Location feed stopped");
        }
    }

    /// Wait for the feed to end on its own (failure, timeout or source gone).
    pub async fn finished(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Location feed panicked");
                }
            }
        }
    }
}

impl Drop for LocationFeed {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run<T: LocationSink>(
    subscribed: Result<LocationSubscription, LocationError>,
    sink: Arc<Mutex<T>>,
    first_fix_timeout: Duration,
) {
    let mut subscription = match subscribed {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::warn!(error = %e, "Location subscription failed");
            sink.lock().await.on_failure(e);
            return;
        }
    };

    sink.lock().await.on_waiting();

    match tokio::time::timeout(first_fix_timeout, subscription.next()).await {
        Err(_) => {
            tracing::warn!(
                timeout_secs = first_fix_timeout.as_secs(),
                "No location fix before timeout"
            );
            sink.lock().await.on_failure(LocationError::Timeout);
            return;
        }
        Ok(None) => return,
        Ok(Some(event)) => {
            if !forward(&sink, event).await {
                return;
            }
        }
    }

    while let Some(event) = subscription.next().await {
        if !forward(&sink, event).await {
            break;
        }
    }
    tracing::debug!("Location feed ended");
}

/// Returns false when the feed must end.
async fn forward<T: LocationSink>(sink: &Arc<Mutex<T>>, event: LocationEvent) -> bool {
    match event {
        LocationEvent::Sample(sample) => {
            sink.lock().await.on_sample(sample);
            true
        }
        LocationEvent::Failed(e) => {
            tracing::warn!(error = %e, "Location stream failed");
            sink.lock().await.on_failure(e);
            false
        }
    }
}
