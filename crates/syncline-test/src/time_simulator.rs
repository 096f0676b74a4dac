//! Clock simulator - drifting devices feeding simulated streams
//!
//! Simulates:
//! - Devices whose clocks run fast or slow against the reference clock
//! - Per-reading jitter on the device clock
//! - Noisy offset measurements, or none at all
//! - Streams that die mid-session

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use syncline_core::{Payload, ReferenceTime, StreamInfo, SyncError, SyncResult};
use syncline_time::{ClockSource, ManualClock, PulledSample, StreamSource};

/// Clock drift model for a simulated device
#[derive(Clone, Debug)]
pub struct ClockDriftModel {
    /// Device clock minus reference clock at reference time zero (seconds)
    pub initial_offset: f64,
    /// Rate error in parts per million (positive = fast)
    pub drift_ppm: f64,
    /// Uniform jitter on every device reading (seconds)
    pub jitter: f64,
    /// Uniform noise on every offset measurement (seconds)
    pub measurement_noise: f64,
}

impl ClockDriftModel {
    pub fn new(initial_offset: f64, drift_ppm: f64, jitter: f64) -> Self {
        ClockDriftModel {
            initial_offset,
            drift_ppm,
            jitter,
            measurement_noise: 0.0,
        }
    }

    /// Perfect clock (no drift)
    pub fn perfect() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Slightly fast clock, a few ms ahead
    pub fn fast() -> Self {
        Self::new(0.004, 100.0, 50e-6)
    }

    /// Slightly slow clock, a few ms behind
    pub fn slow() -> Self {
        Self::new(-0.003, -100.0, 50e-6)
    }

    /// Unstable clock with high jitter and noisy measurements
    pub fn unstable() -> Self {
        ClockDriftModel {
            measurement_noise: 2e-3,
            ..Self::new(0.010, 0.0, 500e-6)
        }
    }

    pub fn with_measurement_noise(mut self, noise: f64) -> Self {
        self.measurement_noise = noise;
        self
    }

    /// Noise-free device offset at a reference instant
    pub fn true_offset(&self, reference: ReferenceTime) -> f64 {
        self.initial_offset + reference.as_secs_f64() * self.drift_ppm * 1e-6
    }

    /// Device clock reading at a reference instant
    pub fn device_time(&self, reference: ReferenceTime, rng: &mut StdRng) -> ReferenceTime {
        reference.offset_by(self.true_offset(reference) + symmetric(rng, self.jitter))
    }

    /// Offset as a correction primitive would report it: the value that maps
    /// a device timestamp back onto the reference clock
    pub fn measure_correction(&self, reference: ReferenceTime, rng: &mut StdRng) -> f64 {
        -self.true_offset(reference) + symmetric(rng, self.measurement_noise)
    }
}

fn symmetric(rng: &mut StdRng, amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..=amplitude)
    } else {
        0.0
    }
}

/// A continuous stream produced by a simulated device
pub struct SimulatedStream {
    info: StreamInfo,
    clock: Arc<ManualClock>,
    drift: ClockDriftModel,
    rng: StdRng,
    period: f64,
    next_emit: ReferenceTime,
    emitted: u64,
    offset_available: bool,
    fail_after: Option<u64>,
}

impl SimulatedStream {
    /// `rate_hz` samples per reference second, starting at the clock's
    /// current reading
    pub fn new(info: StreamInfo, clock: Arc<ManualClock>, drift: ClockDriftModel, rate_hz: f64, seed: u64) -> Self {
        let next_emit = clock.now();
        SimulatedStream {
            info: info.with_nominal_rate(rate_hz),
            clock,
            drift,
            rng: StdRng::seed_from_u64(seed),
            period: 1.0 / rate_hz.max(f64::MIN_POSITIVE),
            next_emit,
            emitted: 0,
            offset_available: true,
            fail_after: None,
        }
    }

    /// Stream whose host cannot measure the offset
    pub fn without_offset(mut self) -> Self {
        self.offset_available = false;
        self
    }

    /// Stream that fails on every pull after `count` samples
    pub fn failing_after(mut self, count: u64) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn drift(&self) -> &ClockDriftModel {
        &self.drift
    }

    fn channel_values(&self, t: f64) -> Vec<f64> {
        (0..self.info.channel_count.max(1))
            .map(|ch| (t * (1.0 + ch as f64)).sin())
            .collect()
    }
}

impl StreamSource for SimulatedStream {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn pull_sample(&mut self) -> SyncResult<Option<PulledSample>> {
        if self.fail_after.map_or(false, |limit| self.emitted >= limit) {
            return Err(SyncError::SourceFailed {
                stream: self.info.name.to_string(),
                reason: "device disconnected".to_string(),
            });
        }
        let now = self.clock.now();
        if now < self.next_emit {
            return Ok(None);
        }

        let at = self.next_emit;
        self.next_emit = at.offset_by(self.period);
        self.emitted += 1;

        let device_ts = self.drift.device_time(at, &mut self.rng);
        let payload = Payload::Numeric(self.channel_values(at.as_secs_f64()));
        Ok(Some(PulledSample::at(payload, device_ts)))
    }

    fn time_correction(&mut self) -> Option<f64> {
        if !self.offset_available {
            return None;
        }
        let now = self.clock.now();
        Some(self.drift.measure_correction(now, &mut self.rng))
    }
}
