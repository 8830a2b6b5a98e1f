use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::Rng;

use crate::audio::NEUTRAL_LEVEL;
use crate::catalog::{EffectProfile, MotionLaw, RecycleRule, Rgba};

/// Conservative viewport used until the render surface reports a real
/// measurement. Corrected on the next frame via [`ParticleField::set_viewport`].
pub const DEFAULT_VIEWPORT_WIDTH: f32 = 1080.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 1920.0;

/// Fresh particles re-enter within this band beyond the spawn edge.
pub const SPAWN_MARGIN: f32 = 48.0;
/// Particles are recycled once they travel this far past the exit edge.
pub const RECYCLE_MARGIN: f32 = 48.0;

/// Exponential smoothing rate applied to the raw amplitude before it biases
/// motion. Raw instantaneous samples jitter visibly on noisy input.
const LEVEL_SMOOTHING_RATE: f32 = 6.0;

/// Downward pull applied to burst particles after launch.
const BURST_GRAVITY: f32 = 260.0;

/// One simulated decorative element.
///
/// `vx`/`vy` are only driven by the radial-burst law and stay zero for the
/// falling and drifting laws, where the scalar `speed` is authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    /// Horizontal centre the sway oscillation is computed around.
    pub origin_x: f32,
    pub size: f32,
    pub speed: f32,
    pub vx: f32,
    pub vy: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub sway_amplitude: f32,
    pub sway_frequency: f32,
    /// Accumulated oscillator angle, kept modulo a full turn.
    pub phase: f32,
    pub age: f32,
    pub color: Rgba,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            origin_x: 0.0,
            size: 1.0,
            speed: 1.0,
            vx: 0.0,
            vy: 0.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            sway_amplitude: 0.0,
            sway_frequency: 0.0,
            phase: 0.0,
            age: 0.0,
            color: Rgba::opaque(255, 255, 255),
        }
    }
}

/// Fixed-capacity collection of particles for one active effect.
///
/// The collection is allocated once; out-of-bounds particles are
/// re-randomised in place, never removed, so the count stays constant for
/// the lifetime of the field.
#[derive(Debug)]
pub struct ParticleField {
    particles: Vec<Particle>,
    profile: EffectProfile,
    width: f32,
    height: f32,
    time: f32,
    smoothed_level: f32,
    rng: StdRng,
}

impl ParticleField {
    /// Creates `count` particles with independently randomised attributes
    /// drawn from the profile's spawn distribution.
    ///
    /// Initial vertical positions are spread across the whole viewport for
    /// profiles that ask for it, so the effect appears fully populated on
    /// its first frame instead of filling in from one edge. A zero or
    /// not-yet-known viewport falls back to a conservative default size.
    pub fn initialize(
        count: usize,
        width: f32,
        height: f32,
        profile: EffectProfile,
        rng: StdRng,
    ) -> Self {
        let (width, height) = sanitize_viewport(width, height);
        let mut field = Self {
            particles: Vec::with_capacity(count),
            profile,
            width,
            height,
            time: 0.0,
            smoothed_level: NEUTRAL_LEVEL,
            rng,
        };

        for _ in 0..count {
            let mut particle = Particle::default();
            respawn(
                &mut particle,
                &field.profile,
                &mut field.rng,
                width,
                height,
                true,
            );
            field.particles.push(particle);
        }

        field
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Read-only view over the particle array for the draw step.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn profile(&self) -> &EffectProfile {
        &self.profile
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Smoothed amplitude currently biasing reactive motion and opacity.
    pub fn level(&self) -> f32 {
        self.smoothed_level
    }

    /// Adopts a new viewport measurement. Particles left outside the new
    /// bounds recycle through the normal rules within one cycle.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        let (width, height) = sanitize_viewport(width, height);
        self.width = width;
        self.height = height;
    }

    /// Advances every particle by `dt` seconds.
    ///
    /// Never allocates and never changes the particle count: the only
    /// structural branch is the in-place recycle of particles that crossed
    /// the exit boundary.
    pub fn tick(&mut self, dt: f32, amplitude: f32) {
        if dt <= 0.0 {
            return;
        }

        self.time += dt;
        let blend = 1.0 - (-LEVEL_SMOOTHING_RATE * dt).exp();
        self.smoothed_level += (amplitude.clamp(0.0, 1.0) - self.smoothed_level) * blend;

        // Neutral amplitude maps to a factor of 1.0 so reactive effects at
        // rest run at their catalog speed.
        let speed_scale = if self.profile.audio_reactive {
            0.5 + self.smoothed_level
        } else {
            1.0
        };

        let time = self.time;
        let width = self.width;
        let height = self.height;

        let Self {
            particles,
            profile,
            rng,
            ..
        } = self;

        for particle in particles.iter_mut() {
            advance(particle, profile.motion, dt, speed_scale, time, width);
            if exited(particle, profile.recycle, height) {
                respawn(particle, profile, rng, width, height, false);
            }
        }
    }
}

fn sanitize_viewport(width: f32, height: f32) -> (f32, f32) {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        (width, height)
    } else {
        (DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT)
    }
}

fn advance(
    particle: &mut Particle,
    motion: MotionLaw,
    dt: f32,
    speed_scale: f32,
    time: f32,
    width: f32,
) {
    particle.age += dt;
    particle.phase = (particle.phase + particle.rotation_speed * dt).rem_euclid(TAU);
    particle.rotation = (particle.rotation + particle.rotation_speed * dt).rem_euclid(TAU);

    match motion {
        MotionLaw::Fall => {
            particle.y += particle.speed * speed_scale * dt;
        }
        MotionLaw::FallSway => {
            particle.y += particle.speed * speed_scale * dt;
            particle.x = wrap_x(sway_x(particle, time), width);
        }
        MotionLaw::DriftUp => {
            particle.y -= particle.speed * speed_scale * dt;
            particle.x = wrap_x(sway_x(particle, time), width);
        }
        MotionLaw::Burst => {
            particle.vy += BURST_GRAVITY * dt;
            particle.x = wrap_x(particle.x + particle.vx * dt, width);
            particle.y += particle.vy * dt;
        }
    }
}

fn sway_x(particle: &Particle, time: f32) -> f32 {
    particle.origin_x
        + (particle.phase + time * particle.sway_frequency).sin() * particle.sway_amplitude
}

/// Keeps horizontal positions inside `[0, width)` regardless of sway
/// amplitude or burst velocity.
fn wrap_x(x: f32, width: f32) -> f32 {
    x.rem_euclid(width)
}

fn exited(particle: &Particle, rule: RecycleRule, height: f32) -> bool {
    match rule {
        RecycleRule::TopEdge | RecycleRule::BurstOrigin => {
            particle.y >= height + RECYCLE_MARGIN
        }
        RecycleRule::BottomEdge => particle.y <= -RECYCLE_MARGIN,
    }
}

/// Replaces the particle's full attribute set with a freshly randomised one
/// per the profile's spawn distribution and recycle rule. The only place a
/// particle's size, colour, or behavioural attributes change after creation.
fn respawn(
    particle: &mut Particle,
    profile: &EffectProfile,
    rng: &mut StdRng,
    width: f32,
    height: f32,
    initial: bool,
) {
    let spawn = &profile.spawn;
    particle.size = spawn.size.sample(rng);
    particle.speed = spawn.speed.sample(rng);
    particle.sway_amplitude = spawn.sway_amplitude.sample(rng);
    particle.sway_frequency = spawn.sway_frequency.sample(rng);
    particle.rotation_speed = spawn.rotation_speed.sample(rng);
    particle.rotation = rng.gen_range(0.0..TAU);
    particle.phase = rng.gen_range(0.0..TAU);
    particle.age = 0.0;
    particle.vx = 0.0;
    particle.vy = 0.0;
    particle.color = spawn.palette[rng.gen_range(0..spawn.palette.len())];

    match profile.recycle {
        RecycleRule::TopEdge => {
            particle.origin_x = rng.gen_range(0.0..width);
            particle.x = particle.origin_x;
            particle.y = if initial && spawn.full_viewport_spawn {
                rng.gen_range(-SPAWN_MARGIN..height)
            } else {
                rng.gen_range(-SPAWN_MARGIN..0.0)
            };
        }
        RecycleRule::BottomEdge => {
            particle.origin_x = rng.gen_range(0.0..width);
            particle.x = particle.origin_x;
            particle.y = if initial && spawn.full_viewport_spawn {
                rng.gen_range(0.0..height + SPAWN_MARGIN)
            } else {
                rng.gen_range(height..height + SPAWN_MARGIN)
            };
        }
        RecycleRule::BurstOrigin => {
            let cx = rng.gen_range(width * 0.15..width * 0.85);
            let cy = rng.gen_range(height * 0.1..height * 0.45);
            particle.origin_x = cx;
            particle.x = cx;
            particle.y = cy;
            let angle = rng.gen_range(0.0..TAU);
            particle.vx = angle.cos() * particle.speed;
            particle.vy = angle.sin() * particle.speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{profile, EffectKind};
    use rand::SeedableRng;

    const STEP: f32 = 1.0 / 60.0;

    fn build_field(kind: EffectKind, count: usize, width: f32, height: f32) -> ParticleField {
        let profile = profile(kind).expect("catalog entry must exist");
        ParticleField::initialize(count, width, height, profile, StdRng::seed_from_u64(42))
    }

    #[test]
    fn initializes_exact_count_within_descriptor_ranges() {
        let all = EffectKind::PLAYER_EFFECTS
            .into_iter()
            .chain([EffectKind::PetalFall, EffectKind::Celebration]);

        for kind in all {
            let field = build_field(kind, 33, 1080.0, 1920.0);
            assert_eq!(field.len(), 33, "{kind:?}");

            let spawn = field.profile().spawn.clone();
            for particle in field.particles() {
                assert!(spawn.size.contains(particle.size), "{kind:?} size");
                assert!(spawn.speed.contains(particle.speed), "{kind:?} speed");
                assert!(
                    spawn.sway_amplitude.contains(particle.sway_amplitude),
                    "{kind:?} sway amplitude"
                );
                assert!(particle.size > 0.0);
                assert!(particle.speed > 0.0);
            }
        }
    }

    #[test]
    fn particle_count_is_invariant_across_ticks() {
        let mut field = build_field(EffectKind::Confetti, 40, 1080.0, 1920.0);
        for _ in 0..500 {
            field.tick(STEP, 0.8);
        }
        assert_eq!(field.len(), 40);
    }

    #[test]
    fn recycled_particle_reenters_above_the_viewport() {
        let mut field = build_field(EffectKind::Snow, 10, 1080.0, 1920.0);

        // Push every particle past the exit boundary by hand.
        for particle in field.particles.iter_mut() {
            particle.y = 1920.0 + RECYCLE_MARGIN + 10.0;
        }
        field.tick(STEP, NEUTRAL_LEVEL);

        for particle in field.particles() {
            assert!(particle.y >= -SPAWN_MARGIN);
            assert!(particle.y < 1920.0, "recycled particle must be back in view");
            assert!((0.0..1080.0).contains(&particle.origin_x));
        }
    }

    #[test]
    fn attributes_stay_inside_spawn_bounds_for_particle_lifetime() {
        let mut field = build_field(EffectKind::Sakura, 20, 1080.0, 1920.0);
        let spawn = field.profile().spawn.clone();

        for _ in 0..2000 {
            field.tick(STEP, 1.0);
        }
        for particle in field.particles() {
            assert!(spawn.size.contains(particle.size));
            assert!(spawn.speed.contains(particle.speed));
            assert!(particle.phase >= 0.0 && particle.phase < TAU);
        }
    }

    #[test]
    fn zero_viewport_falls_back_to_default_and_corrects_later() {
        let mut field = build_field(EffectKind::Snow, 12, 0.0, 0.0);
        assert_eq!(field.width(), DEFAULT_VIEWPORT_WIDTH);
        assert_eq!(field.height(), DEFAULT_VIEWPORT_HEIGHT);
        for particle in field.particles() {
            assert!(particle.x >= 0.0 && particle.x < DEFAULT_VIEWPORT_WIDTH);
        }

        field.set_viewport(800.0, 600.0);
        assert_eq!(field.width(), 800.0);
        field.tick(STEP, NEUTRAL_LEVEL);
        assert_eq!(field.len(), 12);
    }

    #[test]
    fn snow_stays_in_bounds_over_120_ticks() {
        let mut field = build_field(EffectKind::Snow, 50, 1080.0, 1920.0);

        let mut max_y: f32 = 0.0;
        for _ in 0..120 {
            field.tick(STEP, NEUTRAL_LEVEL);
            for particle in field.particles() {
                assert!(
                    particle.x >= 0.0 && particle.x < 1080.0,
                    "x out of bounds: {}",
                    particle.x
                );
                max_y = max_y.max(particle.y);
            }
        }

        // Vertical positions never grow past the recycle boundary.
        assert!(max_y < 1920.0 + RECYCLE_MARGIN + 110.0 * STEP * 2.0);
    }

    #[test]
    fn fast_effects_recycle_rather_than_grow_unbounded() {
        let mut field = build_field(EffectKind::Rain, 20, 1080.0, 1920.0);
        for _ in 0..600 {
            field.tick(STEP, NEUTRAL_LEVEL);
        }

        // 10 seconds at ≥320 units/s covers the viewport more than once, so
        // every drop has been re-randomised at least once (age restarts).
        for particle in field.particles() {
            assert!(particle.age < 9.0, "drop never recycled, age={}", particle.age);
            assert!(particle.y < 1920.0 + RECYCLE_MARGIN);
        }
    }

    #[test]
    fn resize_mid_run_recovers_within_one_recycle_cycle() {
        let mut field = build_field(EffectKind::Rain, 30, 1080.0, 1920.0);
        for _ in 0..30 {
            field.tick(STEP, NEUTRAL_LEVEL);
        }

        field.set_viewport(1920.0, 1080.0);

        // Worst case a particle sits just above the old 1920 exit edge and
        // must fall past the new 1080 boundary before recycling.
        for _ in 0..600 {
            field.tick(STEP, NEUTRAL_LEVEL);
        }
        for particle in field.particles() {
            assert!(particle.x >= 0.0 && particle.x < 1920.0);
            assert!(particle.y < 1080.0 + RECYCLE_MARGIN + 560.0 * STEP);
        }
    }

    #[test]
    fn drift_up_particles_recycle_below_the_bottom_edge() {
        let mut field = build_field(EffectKind::Bubbles, 15, 1080.0, 1920.0);
        for particle in field.particles.iter_mut() {
            particle.y = -RECYCLE_MARGIN - 5.0;
        }
        field.tick(STEP, NEUTRAL_LEVEL);

        for particle in field.particles() {
            assert!(
                particle.y >= 1080.0,
                "bubble should re-enter from below, got y={}",
                particle.y
            );
        }
    }

    #[test]
    fn burst_particles_relaunch_from_an_upper_origin() {
        let mut field = build_field(EffectKind::Celebration, 20, 1080.0, 1920.0);
        // Far enough past the boundary that one step of launch velocity
        // cannot pull a particle back inside it.
        for particle in field.particles.iter_mut() {
            particle.y = 1920.0 + RECYCLE_MARGIN + 50.0;
        }
        field.tick(STEP, NEUTRAL_LEVEL);

        for particle in field.particles() {
            assert!(particle.y < 1920.0 * 0.5, "burst origin sits in the upper half");
            let launch = (particle.vx * particle.vx + particle.vy * particle.vy).sqrt();
            assert!(launch > 0.0, "burst particle must carry a launch velocity");
        }
    }

    #[test]
    fn reactive_effects_move_faster_under_loud_audio() {
        let profile = profile(EffectKind::Sakura).unwrap();
        let mut quiet = ParticleField::initialize(
            10,
            1080.0,
            1920.0,
            profile.clone(),
            StdRng::seed_from_u64(9),
        );
        let mut loud =
            ParticleField::initialize(10, 1080.0, 1920.0, profile, StdRng::seed_from_u64(9));

        // Start everything at the top so neither field recycles while the
        // two amplitude histories are compared.
        for particle in quiet.particles.iter_mut().chain(loud.particles.iter_mut()) {
            particle.y = 0.0;
        }

        for _ in 0..60 {
            quiet.tick(STEP, 0.0);
            loud.tick(STEP, 1.0);
        }

        let quiet_y: f32 = quiet.particles().iter().map(|p| p.y).sum();
        let loud_y: f32 = loud.particles().iter().map(|p| p.y).sum();
        assert!(
            loud_y > quiet_y,
            "identical seeds, louder audio must fall further: {loud_y} vs {quiet_y}"
        );
    }

    #[test]
    fn neutral_amplitude_keeps_reactive_speed_at_catalog_rate() {
        let mut field = build_field(EffectKind::Bubbles, 5, 1080.0, 1920.0);
        for _ in 0..30 {
            field.tick(STEP, NEUTRAL_LEVEL);
        }
        assert!((field.level() - NEUTRAL_LEVEL).abs() < 1e-4);
    }

    #[test]
    fn non_positive_dt_is_ignored() {
        let mut field = build_field(EffectKind::Snow, 8, 1080.0, 1920.0);
        let before: Vec<Particle> = field.particles().to_vec();
        field.tick(0.0, 1.0);
        field.tick(-1.0, 1.0);
        assert_eq!(field.particles(), before.as_slice());
    }
}
