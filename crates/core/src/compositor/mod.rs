use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::audio::{AudioLevelSampler, VisualizerTap};
use crate::catalog::{self, EffectKind};
use crate::config::OverlayConfig;
use crate::field::ParticleField;
use crate::holiday::{self, HolidayMode};
use crate::render::{draw_field, OverlayFrame, OverlaySlot};

/// Upper bound on catch-up simulation steps in a single frame, so a long
/// host stall does not turn into a burst of hundreds of ticks.
const MAX_PENDING_STEPS: f32 = 4.0;

const SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Fixed-timestep accumulator driving the simulation at a target cadence
/// (~60 steps per second) independent of the host's actual refresh timing.
///
/// The host calls [`advance`](Self::advance) once per display refresh with
/// the elapsed wall time; the ticker answers how many whole simulation
/// steps are due. Teardown is dropping it.
#[derive(Debug)]
pub struct FrameTicker {
    step: f32,
    accumulator: f32,
}

impl FrameTicker {
    pub fn new(steps_per_second: f32) -> Self {
        let rate = if steps_per_second > 0.0 {
            steps_per_second
        } else {
            crate::config::DEFAULT_STEPS_PER_SECOND
        };
        Self {
            step: 1.0 / rate,
            accumulator: 0.0,
        }
    }

    /// Duration of one simulation step in seconds.
    pub fn step_seconds(&self) -> f32 {
        self.step
    }

    /// Accumulates `dt` seconds and returns the number of whole steps due.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if dt <= 0.0 {
            return 0;
        }

        self.accumulator = (self.accumulator + dt).min(self.step * MAX_PENDING_STEPS);
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Life-cycle of one overlay layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPhase {
    /// Flag off or mode is none: no field allocated, nothing ticking.
    Inactive,
    /// A field for the requested mode is allocated on the next frame.
    Initializing,
    /// Steady-state tick/draw loop.
    Running,
}

#[derive(Debug)]
struct OverlayLayer {
    slot: OverlaySlot,
    requested: EffectKind,
    phase: LayerPhase,
    field: Option<ParticleField>,
}

impl OverlayLayer {
    fn new(slot: OverlaySlot) -> Self {
        Self {
            slot,
            requested: EffectKind::None,
            phase: LayerPhase::Inactive,
            field: None,
        }
    }

    /// Requests an effect for this layer. A mode change discards the old
    /// field and re-enters `Initializing`; requesting `None` deactivates.
    fn request(&mut self, kind: EffectKind) {
        if kind.is_none() {
            self.requested = kind;
            self.deactivate();
            return;
        }
        if kind == self.requested && self.phase != LayerPhase::Inactive {
            return;
        }

        tracing::debug!(slot = ?self.slot, effect = kind.id(), "overlay layer initializing");
        self.requested = kind;
        self.field = None;
        self.phase = LayerPhase::Initializing;
    }

    fn deactivate(&mut self) {
        if self.phase != LayerPhase::Inactive {
            tracing::debug!(slot = ?self.slot, "overlay layer deactivated");
        }
        self.phase = LayerPhase::Inactive;
        self.field = None;
    }

    fn particle_count(&self) -> usize {
        self.field.as_ref().map(ParticleField::len).unwrap_or(0)
    }
}

/// Orchestrates the overlay: owns the frame cadence, both overlay layers,
/// and the audio sampler, and turns the narrow application inputs into a
/// per-frame draw stream.
///
/// Strictly presentational — it produces draw ops and nothing else, so the
/// underlying content keeps receiving input untouched.
#[derive(Debug)]
pub struct OverlayCompositor {
    enabled: bool,
    effect: EffectKind,
    particle_count: Option<usize>,
    session_id: i32,
    seasonal_mode: HolidayMode,
    ticker: FrameTicker,
    sampler: AudioLevelSampler,
    seasonal: OverlayLayer,
    player: OverlayLayer,
    width: f32,
    height: f32,
    seed: u64,
    fields_created: u64,
}

impl OverlayCompositor {
    pub fn new(config: &OverlayConfig, tap: Box<dyn VisualizerTap>) -> Self {
        let mut compositor = Self {
            enabled: config.enabled,
            effect: EffectKind::parse(&config.effect),
            particle_count: config.particle_count,
            session_id: config.session_id,
            seasonal_mode: HolidayMode::None,
            ticker: FrameTicker::new(config.steps_per_second),
            sampler: AudioLevelSampler::new(tap),
            seasonal: OverlayLayer::new(OverlaySlot::Seasonal),
            player: OverlayLayer::new(OverlaySlot::Player),
            width: 0.0,
            height: 0.0,
            seed: config.seed.unwrap_or(SEED_MIX),
            fields_created: 0,
        };
        compositor.apply_requests();
        compositor
    }

    /// The application's "effects enabled" toggle. Turning it off releases
    /// both layers' fields immediately.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        tracing::info!(enabled, "overlay effects toggled");
        self.enabled = enabled;
        self.apply_requests();
    }

    /// Selects the player-layer effect by identifier. Unknown identifiers
    /// resolve to none and render nothing.
    pub fn set_effect(&mut self, id: &str) {
        let kind = EffectKind::parse(id);
        if kind != self.effect {
            tracing::info!(effect = kind.id(), "player effect selected");
            self.effect = kind;
            self.apply_requests();
        }
    }

    /// Follows the playback session identifier for the audio tap.
    pub fn set_session(&mut self, session_id: i32) {
        self.session_id = session_id;
        self.sync_audio();
    }

    /// Observes the render surface size for this frame, in
    /// device-independent units.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Re-resolves the seasonal layer from the calendar date.
    pub fn observe_date(&mut self, date: NaiveDate) {
        let mode = holiday::resolve(date);
        if mode != self.seasonal_mode {
            tracing::info!(?mode, "holiday mode changed");
            self.seasonal_mode = mode;
        }
        self.apply_requests();
    }

    /// Runs the simulation steps due after `dt` seconds and composes the
    /// frame's draw stream, seasonal layer first so it sits behind content.
    ///
    /// An invalid (non-positive) viewport skips the tick/draw step entirely
    /// and the loop resumes once a valid measurement arrives; no particle
    /// state is touched in the meantime.
    pub fn frame(&mut self, dt: f32) -> OverlayFrame {
        let mut frame = OverlayFrame::default();
        if self.width <= 0.0 || self.height <= 0.0 {
            return frame;
        }

        let steps = self.ticker.advance(dt);
        let step_seconds = self.ticker.step_seconds();
        let level = self.sampler.level();

        for layer in [&mut self.seasonal, &mut self.player] {
            step_layer(
                layer,
                steps,
                step_seconds,
                level,
                self.width,
                self.height,
                self.particle_count,
                self.seed,
                &mut self.fields_created,
            );
            if let Some(field) = layer.field.as_ref() {
                draw_field(field, layer.slot, &mut frame.ops);
            }
        }

        frame
    }

    /// Tears everything down: both layers released, ticker reset, audio tap
    /// detached. Called on view teardown; dropping the compositor performs
    /// the same audio release.
    pub fn deactivate(&mut self) {
        self.seasonal.deactivate();
        self.player.deactivate();
        self.ticker.reset();
        self.sampler.detach();
    }

    pub fn player_phase(&self) -> LayerPhase {
        self.player.phase
    }

    pub fn seasonal_phase(&self) -> LayerPhase {
        self.seasonal.phase
    }

    pub fn player_particle_count(&self) -> usize {
        self.player.particle_count()
    }

    pub fn seasonal_particle_count(&self) -> usize {
        self.seasonal.particle_count()
    }

    pub fn audio_attached(&self) -> bool {
        self.sampler.is_attached()
    }

    fn apply_requests(&mut self) {
        let (player_kind, seasonal_kind) = if self.enabled {
            (self.effect, self.seasonal_mode.effect())
        } else {
            (EffectKind::None, EffectKind::None)
        };
        self.player.request(player_kind);
        self.seasonal.request(seasonal_kind);
        self.sync_audio();
    }

    /// The tap is held only while an audio-reactive effect is on screen;
    /// every path away from that state releases it.
    fn sync_audio(&mut self) {
        let wants_audio = self.enabled
            && catalog::profile(self.effect)
                .map(|profile| profile.audio_reactive)
                .unwrap_or(false);

        if wants_audio {
            self.sampler.set_session(self.session_id);
        } else {
            self.sampler.detach();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn step_layer(
    layer: &mut OverlayLayer,
    steps: u32,
    step_seconds: f32,
    level: f32,
    width: f32,
    height: f32,
    count_override: Option<usize>,
    seed: u64,
    fields_created: &mut u64,
) {
    if layer.phase == LayerPhase::Initializing {
        let Some(profile) = catalog::profile(layer.requested) else {
            layer.deactivate();
            return;
        };

        let count = match layer.slot {
            OverlaySlot::Player => count_override.unwrap_or(profile.default_count),
            OverlaySlot::Seasonal => profile.default_count,
        };
        let rng = StdRng::seed_from_u64(seed ^ fields_created.wrapping_mul(SEED_MIX));
        *fields_created += 1;

        tracing::debug!(slot = ?layer.slot, effect = profile.kind.id(), count, "overlay field allocated");
        layer.field = Some(ParticleField::initialize(count, width, height, profile, rng));
        layer.phase = LayerPhase::Running;
    }

    if layer.phase != LayerPhase::Running {
        return;
    }
    if let Some(field) = layer.field.as_mut() {
        field.set_viewport(width, height);
        for _ in 0..steps {
            field.tick(step_seconds, level);
        }
    }
}
