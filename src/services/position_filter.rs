// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Position sample filter.
//!
//! Turns the noisy device location stream into a stable current position:
//! 1. Buffer every sample (bounded ring, arrival order)
//! 2. Keep plausible samples inside the recency window
//! 3. Average the most accurate share of them
//! 4. Apply the result at most once per throttle interval
//!
//! Sample timestamps come from the device and are not trusted to be
//! monotonic. Slightly late samples are buffered and picked up by the next
//! applied update. A sample older than the newest known timestamp by more
//! than the window means the clock jumped: everything stamped after it is
//! discarded and the throttle restarts from that sample.

use crate::config::FilterConfig;
use crate::models::{FilterStats, FilteredPosition, PositionSample};
use std::collections::VecDeque;

/// Stateful filter over one location session.
#[derive(Debug, Clone)]
pub struct PositionFilter {
    config: FilterConfig,
    samples: VecDeque<PositionSample>,
    current: Option<FilteredPosition>,
    last_applied_ms: Option<i64>,
    applied_updates: u32,
}

impl PositionFilter {
    pub fn new(config: FilterConfig) -> Self {
        let capacity = config.buffer_capacity.max(1);
        Self {
            config,
            samples: VecDeque::with_capacity(capacity),
            current: None,
            last_applied_ms: None,
            applied_updates: 0,
        }
    }

    /// Buffer a sample and return a newly applied position, if any.
    ///
    /// `None` means the current position is unchanged, either because the
    /// throttle interval has not elapsed or no plausible sample exists yet.
    pub fn ingest(&mut self, sample: PositionSample) -> Option<FilteredPosition> {
        if sample.is_plausible() {
            self.rewind_on_clock_jump(sample.captured_at_ms);
        }
        if self.samples.len() >= self.config.buffer_capacity.max(1) {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);

        if !sample.is_plausible() {
            tracing::debug!(
                latitude = sample.latitude,
                longitude = sample.longitude,
                accuracy = sample.accuracy_meters,
                "Buffered implausible location sample"
            );
            return None;
        }

        // The first fix of a session is shown immediately.
        if let Some(last) = self.last_applied_ms {
            if sample.captured_at_ms.saturating_sub(last) < self.config.throttle_ms {
                return None;
            }
        }

        let position = self.compute()?;
        self.current = Some(position);
        self.last_applied_ms = Some(sample.captured_at_ms);
        self.applied_updates = self.applied_updates.saturating_add(1);
        Some(position)
    }

    /// Last applied position.
    pub fn current(&self) -> Option<FilteredPosition> {
        self.current
    }

    /// Forget all samples, e.g. when a new location session starts.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.current = None;
        self.last_applied_ms = None;
        self.applied_updates = 0;
    }

    pub fn stats(&self) -> FilterStats {
        let recent = self.recent_samples();
        FilterStats {
            buffered: self.samples.len(),
            recent: recent.len(),
            best_accuracy_meters: recent
                .iter()
                .map(|s| s.accuracy_meters)
                .min_by(f64::total_cmp),
            applied_updates: self.applied_updates,
        }
    }

    /// Filtered estimate over the current buffer, ignoring the throttle.
    pub fn compute(&self) -> Option<FilteredPosition> {
        let mut recent = self.recent_samples();
        if recent.len() < self.config.min_samples {
            return self
                .samples
                .iter()
                .rev()
                .find(|s| s.is_plausible())
                .map(FilteredPosition::from);
        }

        recent.sort_by(|a, b| a.accuracy_meters.total_cmp(&b.accuracy_meters));
        let keep = best_count(recent.len(), self.config.best_fraction);
        let best = &recent[..keep];

        let n = best.len() as f64;
        Some(FilteredPosition {
            latitude: best.iter().map(|s| s.latitude).sum::<f64>() / n,
            longitude: best.iter().map(|s| s.longitude).sum::<f64>() / n,
        })
    }

    /// Drop samples stamped after `at_ms` when it lies more than a window
    /// behind the newest known timestamp.
    fn rewind_on_clock_jump(&mut self, at_ms: i64) {
        let newest = self
            .samples
            .iter()
            .filter(|s| s.is_plausible())
            .map(|s| s.captured_at_ms)
            .chain(self.last_applied_ms)
            .max();
        let Some(newest) = newest else {
            return;
        };
        if newest.saturating_sub(at_ms) <= self.config.window_ms {
            return;
        }

        let before = self.samples.len();
        self.samples.retain(|s| s.captured_at_ms <= at_ms);
        self.last_applied_ms = None;
        tracing::warn!(
            newest_ms = newest,
            sample_ms = at_ms,
            dropped = before - self.samples.len(),
            "Location clock jumped backwards, restarting filter window"
        );
    }

    /// Plausible samples no older than the window, relative to the newest.
    fn recent_samples(&self) -> Vec<PositionSample> {
        let Some(newest) = self
            .samples
            .iter()
            .filter(|s| s.is_plausible())
            .map(|s| s.captured_at_ms)
            .max()
        else {
            return Vec::new();
        };
        let cutoff = newest.saturating_sub(self.config.window_ms);
        self.samples
            .iter()
            .filter(|s| s.is_plausible() && s.captured_at_ms >= cutoff)
            .copied()
            .collect()
    }
}

/// Number of best samples to average out of `n`.
fn best_count(n: usize, fraction: f64) -> usize {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        1.0
    };
    ((n as f64 * fraction).round() as usize).clamp(1, n.max(1))
}
