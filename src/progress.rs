//! Progress shown while a submission is outstanding.
//!
//! The bar only signals activity. [`CosmeticProgress`] advances on a timer
//! with no knowledge of the transfer; [`TransferProgress`] follows the bytes
//! the request body has handed to the connection. Both stay inside the
//! `initial..ceiling` band until the request settles, at which point the
//! [`ProgressIndicator`] snaps to 100%.

use crate::config::ProgressSettings;
use derivative::Derivative;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub trait ProgressSource: Send {
    /// Percentage to display at `now`. Only called before settle.
    fn percent(&self, now: Instant) -> u8;
}

pub struct CosmeticProgress {
    started: Instant,
    settings: ProgressSettings,
}

impl CosmeticProgress {
    pub fn new(started: Instant, settings: ProgressSettings) -> Self {
        Self { started, settings }
    }
}

impl ProgressSource for CosmeticProgress {
    fn percent(&self, now: Instant) -> u8 {
        let initial = self.settings.initial_percent as u64;
        let step = self.settings.step_percent as u64;
        let ceiling = self.settings.ceiling_percent as u64;
        if step == 0 || initial + step >= ceiling {
            return initial as u8;
        }

        let interval = self.settings.interval.as_millis().max(1) as u64;
        let ticks = now.saturating_duration_since(self.started).as_millis() as u64 / interval;
        let max_ticks = (ceiling - 1 - initial) / step;
        (initial + step * ticks.min(max_ticks)) as u8
    }
}

/// Byte counter shared between the request body stream and the UI.
#[derive(Debug, Clone, Default)]
pub struct TransferCounter(Arc<AtomicU64>);

impl TransferCounter {
    pub fn add(&self, bytes: u64) {
        self.0.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn sent(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct TransferProgress {
    counter: TransferCounter,
    total: u64,
    initial: u8,
    ceiling: u8,
}

impl TransferProgress {
    pub fn new(counter: TransferCounter, total: u64, settings: &ProgressSettings) -> Self {
        Self {
            counter,
            total,
            initial: settings.initial_percent,
            ceiling: settings.ceiling_percent.max(settings.initial_percent + 1),
        }
    }
}

impl ProgressSource for TransferProgress {
    fn percent(&self, _now: Instant) -> u8 {
        if self.total == 0 {
            return self.initial;
        }
        let span = (self.ceiling - 1 - self.initial) as u64;
        let sent = self.counter.sent().min(self.total);
        self.initial + (span * sent / self.total) as u8
    }
}

#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct ProgressIndicator {
    pub visible: bool,
    pub value: u8,
    pub failed: bool,
    #[derivative(Debug = "ignore")]
    source: Option<Box<dyn ProgressSource>>,
}

impl ProgressIndicator {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn start(&mut self, source: Box<dyn ProgressSource>, now: Instant) {
        self.visible = true;
        self.failed = false;
        self.value = source.percent(now).min(100);
        self.source = Some(source);
    }

    /// Never moves the bar backwards.
    pub fn tick(&mut self, now: Instant) {
        if let Some(source) = &self.source {
            self.value = self.value.max(source.percent(now)).min(100);
        }
    }

    /// Drops the source and snaps to 100%.
    pub fn settle(&mut self, success: bool) {
        self.source = None;
        self.value = 100;
        self.failed = !success;
    }

    pub fn is_running(&self) -> bool {
        self.source.is_some()
    }

    pub fn fraction(&self) -> f32 {
        self.value as f32 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cosmetic(start: Instant) -> CosmeticProgress {
        CosmeticProgress::new(start, ProgressSettings::default())
    }

    #[test]
    fn cosmetic_starts_at_initial_value() {
        let start = Instant::now();
        assert_eq!(cosmetic(start).percent(start), 10);
        assert_eq!(cosmetic(start).percent(start + Duration::from_millis(499)), 10);
    }

    #[test]
    fn cosmetic_steps_every_interval() {
        let start = Instant::now();
        let source = cosmetic(start);
        assert_eq!(source.percent(start + Duration::from_millis(500)), 15);
        assert_eq!(source.percent(start + Duration::from_millis(1_000)), 20);
        assert_eq!(source.percent(start + Duration::from_millis(2_600)), 35);
    }

    #[test]
    fn cosmetic_never_reaches_ceiling() {
        let start = Instant::now();
        let source = cosmetic(start);
        let mut last = 0;
        for ms in (0..60_000).step_by(250) {
            let value = source.percent(start + Duration::from_millis(ms));
            assert!(value >= last);
            assert!(value < 90);
            last = value;
        }
        assert_eq!(last, 85);
    }

    #[test]
    fn transfer_maps_bytes_into_band() {
        let counter = TransferCounter::default();
        let source = TransferProgress::new(counter.clone(), 1_000, &ProgressSettings::default());
        let now = Instant::now();

        assert_eq!(source.percent(now), 10);
        counter.add(500);
        assert_eq!(source.percent(now), 49);
        counter.add(10_000);
        assert_eq!(source.percent(now), 89);
    }

    #[test]
    fn indicator_is_monotonic_and_snaps_on_settle() {
        let start = Instant::now();
        let mut indicator = ProgressIndicator::default();
        indicator.start(Box::new(cosmetic(start)), start);
        assert!(indicator.visible);
        assert_eq!(indicator.value, 10);

        indicator.tick(start + Duration::from_secs(3));
        let high = indicator.value;
        indicator.tick(start);
        assert_eq!(indicator.value, high);

        indicator.settle(true);
        assert_eq!(indicator.value, 100);
        assert!(!indicator.failed);
        assert!(!indicator.is_running());

        indicator.tick(start + Duration::from_secs(60));
        assert_eq!(indicator.value, 100);
    }

    #[test]
    fn failed_settle_sets_error_style() {
        let start = Instant::now();
        let mut indicator = ProgressIndicator::default();
        indicator.start(Box::new(cosmetic(start)), start);
        indicator.settle(false);
        assert_eq!(indicator.value, 100);
        assert!(indicator.failed);

        indicator.reset();
        assert_eq!(indicator.value, 0);
        assert!(!indicator.visible);
        assert!(!indicator.failed);
    }
}
