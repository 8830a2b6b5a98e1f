use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::{OverlayError, Result};

/// Amplitude reported whenever no capture source is attached. Reactive
/// effects fall back to this constant baseline instead of surfacing an
/// error.
pub const NEUTRAL_LEVEL: f32 = 0.5;

/// Mid-scale reference of the platform's unsigned 8-bit waveform buffers.
const WAVEFORM_ZERO: f32 = 128.0;

/// Waveform capture runs at half the platform-reported maximum rate; full
/// rate buys nothing for a single scalar readout.
pub fn capture_rate(max_rate: u32) -> u32 {
    max_rate / 2
}

/// Reduces one waveform buffer to a normalised amplitude in [0, 1].
///
/// The measure is the mean absolute deviation of each sample from the
/// mid-scale zero level, normalised by the maximum possible deviation.
pub fn waveform_level(samples: &[u8]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: f32 = samples
        .iter()
        .map(|sample| (*sample as f32 - WAVEFORM_ZERO).abs())
        .sum();
    (sum / samples.len() as f32 / WAVEFORM_ZERO).clamp(0.0, 1.0)
}

/// Single-word slot the capture callback writes the latest amplitude into.
///
/// Capture callbacks may run off the simulation thread; this is the only
/// state crossing that boundary, so it is a lone atomic scalar rather than
/// a lock. Updates are last-write-wins and a tick simply reads whatever was
/// captured most recently.
#[derive(Clone, Default)]
pub struct AmplitudeSlot {
    bits: Arc<AtomicU32>,
}

impl AmplitudeSlot {
    pub fn new(initial: f32) -> Self {
        let slot = Self::default();
        slot.store(initial);
        slot
    }

    pub fn store(&self, level: f32) {
        self.bits
            .store(level.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl fmt::Debug for AmplitudeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmplitudeSlot")
            .field("level", &self.load())
            .finish()
    }
}

/// Capability interface over the platform's audio-visualizer tap.
///
/// An implementation subscribes to waveform capture for the given playback
/// session and writes [`waveform_level`] results into the slot until
/// detached. Platforms without the capability supply [`NullVisualizerTap`]
/// and the sampler degrades to the neutral constant.
pub trait VisualizerTap: Send {
    /// Attaches waveform capture for `session_id`, writing amplitudes into
    /// `slot`. Fails if the device lacks the capability, permission is
    /// denied, or the capture resource is busy.
    fn attach(&mut self, session_id: i32, slot: AmplitudeSlot) -> Result<()>;

    /// Releases the capture resource. Must be safe to call when nothing is
    /// attached.
    fn detach(&mut self);
}

/// Tap for hosts without a visualizer capability. Attachment always fails
/// cleanly, which the sampler translates into the neutral baseline.
#[derive(Debug, Default)]
pub struct NullVisualizerTap;

impl VisualizerTap for NullVisualizerTap {
    fn attach(&mut self, _session_id: i32, _slot: AmplitudeSlot) -> Result<()> {
        Err(OverlayError::msg("audio visualizer capability not available"))
    }

    fn detach(&mut self) {}
}

/// Owns the capture subscription for the current playback session and
/// exposes the most recent normalised amplitude.
///
/// The underlying tap is scoped to the session identifier: it is released
/// on every session change, on [`detach`](Self::detach), and on drop.
pub struct AudioLevelSampler {
    tap: Box<dyn VisualizerTap>,
    slot: AmplitudeSlot,
    session_id: i32,
    attached: bool,
}

impl AudioLevelSampler {
    pub fn new(tap: Box<dyn VisualizerTap>) -> Self {
        Self {
            tap,
            slot: AmplitudeSlot::new(NEUTRAL_LEVEL),
            session_id: 0,
            attached: false,
        }
    }

    /// Sampler that never attaches anything and always reports the neutral
    /// baseline.
    pub fn disabled() -> Self {
        Self::new(Box::new(NullVisualizerTap))
    }

    /// Follows the playback session. Identifiers ≤ 0 mean no audio is
    /// available; any attachment failure leaves the sampler detached and
    /// the level at the neutral constant rather than propagating an error.
    pub fn set_session(&mut self, session_id: i32) {
        if session_id == self.session_id && self.attached {
            return;
        }

        self.release();
        self.session_id = session_id;
        if session_id <= 0 {
            return;
        }

        self.slot.store(NEUTRAL_LEVEL);
        match self.tap.attach(session_id, self.slot.clone()) {
            Ok(()) => {
                self.attached = true;
                tracing::debug!(session_id, "audio visualizer attached");
            }
            Err(err) => {
                tracing::debug!(session_id, %err, "audio visualizer unavailable, using neutral level");
            }
        }
    }

    /// Most recent normalised amplitude in [0, 1], or the neutral constant
    /// when nothing is attached.
    pub fn level(&self) -> f32 {
        if self.attached {
            self.slot.load().clamp(0.0, 1.0)
        } else {
            NEUTRAL_LEVEL
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Releases the capture subscription. Idempotent.
    pub fn detach(&mut self) {
        self.release();
        self.session_id = 0;
    }

    fn release(&mut self) {
        if self.attached {
            self.tap.detach();
            self.attached = false;
            tracing::debug!(session_id = self.session_id, "audio visualizer detached");
        }
    }
}

impl Drop for AudioLevelSampler {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for AudioLevelSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioLevelSampler")
            .field("session_id", &self.session_id)
            .field("attached", &self.attached)
            .field("level", &self.level())
            .finish()
    }
}
