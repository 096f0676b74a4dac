//! Clock offset statistics for post-hoc analysis
//!
//! Offsets are recorded as measured; deciding what counts as healthy is a
//! policy of the analysis layer. This module only summarizes.

use std::collections::BTreeMap;

use syncline_core::{ReferenceTime, StreamName, StreamSample};

/// Offset statistics for a single stream
#[derive(Clone, Debug, PartialEq)]
pub struct StreamOffsetModel {
    /// Median measured offset (source - reference), seconds
    pub offset: f64,
    /// Max deviation from the median
    pub jitter_envelope: f64,
    /// Recent (measured_at, offset) samples
    samples: Vec<(ReferenceTime, f64)>,
    /// Maximum samples to keep
    max_samples: usize,
}

impl StreamOffsetModel {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_samples: usize) -> Self {
        StreamOffsetModel {
            offset: 0.0,
            jitter_envelope: 0.0,
            samples: Vec::new(),
            max_samples: max_samples.max(1),
        }
    }

    /// Update with a new offset measurement
    pub fn update(&mut self, measured_at: ReferenceTime, offset: f64) {
        if !offset.is_finite() {
            return;
        }
        self.samples.push((measured_at, offset));

        if self.samples.len() > self.max_samples {
            self.samples.remove(0);
        }

        let values: Vec<f64> = self.samples.iter().map(|(_, o)| *o).collect();
        self.offset = Self::median(&values);
        self.jitter_envelope = values
            .iter()
            .map(|o| (o - self.offset).abs())
            .fold(0.0, f64::max);
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Smallest and largest measured offsets
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.samples.iter().map(|(_, o)| *o);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), o| (lo.min(o), hi.max(o))))
    }

    /// Whether every measured offset lies within `threshold` seconds of zero
    pub fn is_within(&self, threshold: f64) -> bool {
        self.samples.iter().all(|(_, o)| o.abs() <= threshold)
    }

    fn median(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        }
    }
}

impl Default for StreamOffsetModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Offset statistics across every stream of a session
#[derive(Clone, Debug, Default)]
pub struct OffsetModel {
    pub streams: BTreeMap<StreamName, StreamOffsetModel>,
    /// Measurements skipped as warm-up noise
    pub skipped_warmup: usize,
}

impl OffsetModel {
    pub fn new() -> Self {
        OffsetModel::default()
    }

    /// Build from recorded samples, discarding each stream's measurements
    /// taken within `warmup_secs` of that stream's first measurement.
    /// Offsets are unstable for roughly the first second of a stream.
    pub fn from_samples<'a, I>(samples: I, warmup_secs: f64) -> Self
    where
        I: IntoIterator<Item = &'a StreamSample>,
    {
        let mut model = OffsetModel::new();
        let mut first_seen: BTreeMap<StreamName, ReferenceTime> = BTreeMap::new();

        for sample in samples {
            let (Some(offset), Some(at)) = (sample.clock_offset, sample.offset_measured_at) else {
                continue;
            };
            let first = *first_seen.entry(sample.stream_name.clone()).or_insert(at);
            if at.since(first) < warmup_secs {
                model.skipped_warmup += 1;
                continue;
            }
            model.record(&sample.stream_name, at, offset);
        }
        model
    }

    pub fn record(&mut self, stream: &StreamName, measured_at: ReferenceTime, offset: f64) {
        self.streams
            .entry(stream.clone())
            .or_default()
            .update(measured_at, offset);
    }

    pub fn get(&self, stream: &StreamName) -> Option<&StreamOffsetModel> {
        self.streams.get(stream)
    }

    /// Streams with any offset beyond `threshold` seconds
    pub fn streams_exceeding(&self, threshold: f64) -> Vec<&StreamName> {
        self.streams
            .iter()
            .filter(|(_, m)| !m.is_within(threshold))
            .map(|(name, _)| name)
            .collect()
    }
}
