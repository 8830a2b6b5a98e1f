use rand::Rng;
use serde::{Deserialize, Serialize};

/// Identifier for one of the decorative overlay effects.
///
/// The first nine kinds are user-selectable player effects; `PetalFall`
/// and `Celebration` are the calendar-driven seasonal modes, which reuse
/// the same catalog machinery on their own overlay layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    None,
    Snow,
    Stars,
    Bubbles,
    Sakura,
    Fireflies,
    Rain,
    Confetti,
    Hearts,
    PetalFall,
    Celebration,
}

impl EffectKind {
    /// The user-selectable effect identifiers, in catalog order.
    pub const PLAYER_EFFECTS: [EffectKind; 8] = [
        EffectKind::Snow,
        EffectKind::Stars,
        EffectKind::Bubbles,
        EffectKind::Sakura,
        EffectKind::Fireflies,
        EffectKind::Rain,
        EffectKind::Confetti,
        EffectKind::Hearts,
    ];

    /// Parses an effect identifier string. Unknown identifiers resolve to
    /// [`EffectKind::None`] — the overlay simply renders nothing.
    pub fn parse(id: &str) -> EffectKind {
        match id.trim().to_ascii_lowercase().as_str() {
            "snow" => EffectKind::Snow,
            "stars" => EffectKind::Stars,
            "bubbles" => EffectKind::Bubbles,
            "sakura" => EffectKind::Sakura,
            "fireflies" => EffectKind::Fireflies,
            "rain" => EffectKind::Rain,
            "confetti" => EffectKind::Confetti,
            "hearts" => EffectKind::Hearts,
            _ => EffectKind::None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            EffectKind::None => "none",
            EffectKind::Snow => "snow",
            EffectKind::Stars => "stars",
            EffectKind::Bubbles => "bubbles",
            EffectKind::Sakura => "sakura",
            EffectKind::Fireflies => "fireflies",
            EffectKind::Rain => "rain",
            EffectKind::Confetti => "confetti",
            EffectKind::Hearts => "hearts",
            EffectKind::PetalFall => "petal-fall",
            EffectKind::Celebration => "celebration",
        }
    }

    pub fn is_none(self) -> bool {
        self == EffectKind::None
    }
}

/// Straight-alpha colour carried by particles and draw ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Returns the colour with its alpha scaled by `factor` in [0, 1].
    pub fn faded(self, factor: f32) -> Self {
        let a = (self.a as f32 * factor.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

/// Inclusive range a particle attribute is sampled from at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    /// Samples a value uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Vertical motion law applied by the field's tick function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MotionLaw {
    /// Straight fall at the particle's speed.
    Fall,
    /// Fall combined with a sine sway around the spawn origin.
    FallSway,
    /// Drift upward and fade out near the top.
    DriftUp,
    /// Radial burst from a spawn origin, then pulled down into a fall.
    Burst,
}

/// What fresh state an out-of-bounds particle is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecycleRule {
    /// Re-enter above the top edge at a fresh random horizontal origin.
    TopEdge,
    /// Re-enter below the bottom edge (for upward-drifting effects).
    BottomEdge,
    /// Re-enter at a freshly chosen burst origin with a new launch velocity.
    BurstOrigin,
}

/// Visual primitive the renderer emits for each particle of the effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    Circle,
    Ellipse,
    Star,
    Heart,
    Streak,
}

/// Spawn-distribution descriptor: the ranges and palette every particle of
/// an effect is randomised from, both at field initialisation and on each
/// recycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnProfile {
    pub size: ValueRange,
    pub speed: ValueRange,
    pub sway_amplitude: ValueRange,
    pub sway_frequency: ValueRange,
    pub rotation_speed: ValueRange,
    pub palette: Vec<Rgba>,
    /// Whether the first initialisation spreads particles over the whole
    /// viewport instead of only above the top edge, so the effect appears
    /// fully populated on its first frame.
    pub full_viewport_spawn: bool,
}

/// Everything the field and renderer need to run one effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectProfile {
    pub kind: EffectKind,
    pub spawn: SpawnProfile,
    pub motion: MotionLaw,
    pub recycle: RecycleRule,
    pub shape: ShapeKind,
    pub default_count: usize,
    /// Reactive effects bias speed and opacity with the live amplitude.
    pub audio_reactive: bool,
}

const WHITE: Rgba = Rgba::opaque(255, 255, 255);
const SNOW_BLUE: Rgba = Rgba::opaque(214, 234, 248);
const STAR_GOLD: Rgba = Rgba::opaque(255, 215, 64);
const STAR_PALE: Rgba = Rgba::opaque(255, 241, 178);
const BUBBLE_TEAL: Rgba = Rgba::new(128, 222, 234, 180);
const BUBBLE_PALE: Rgba = Rgba::new(224, 247, 250, 150);
const SAKURA_PINK: Rgba = Rgba::opaque(248, 187, 208);
const SAKURA_DEEP: Rgba = Rgba::opaque(244, 143, 177);
const FIREFLY_GREEN: Rgba = Rgba::opaque(204, 255, 144);
const FIREFLY_AMBER: Rgba = Rgba::opaque(255, 224, 130);
const RAIN_GREY: Rgba = Rgba::new(176, 196, 222, 200);
const HEART_RED: Rgba = Rgba::opaque(239, 83, 80);
const HEART_ROSE: Rgba = Rgba::opaque(236, 64, 122);
const PLUM_PINK: Rgba = Rgba::opaque(255, 183, 197);
const PLUM_WHITE: Rgba = Rgba::opaque(255, 235, 238);
const FESTIVE_RED: Rgba = Rgba::opaque(229, 57, 53);
const FESTIVE_GOLD: Rgba = Rgba::opaque(255, 193, 7);
const FESTIVE_ORANGE: Rgba = Rgba::opaque(255, 138, 101);

const CONFETTI_PALETTE: [Rgba; 6] = [
    Rgba::opaque(244, 67, 54),
    Rgba::opaque(255, 193, 7),
    Rgba::opaque(76, 175, 80),
    Rgba::opaque(33, 150, 243),
    Rgba::opaque(156, 39, 176),
    Rgba::opaque(255, 152, 0),
];

/// Returns the profile for an effect, or `None` for [`EffectKind::None`].
///
/// This is a pure lookup: deterministic for a given identifier and free of
/// side effects. All randomness happens later, when the field samples the
/// returned ranges.
pub fn profile(kind: EffectKind) -> Option<EffectProfile> {
    let profile = match kind {
        EffectKind::None => return None,
        EffectKind::Snow => EffectProfile {
            kind,
            spawn: SpawnProfile {
                size: ValueRange::new(2.0, 7.0),
                speed: ValueRange::new(40.0, 110.0),
                sway_amplitude: ValueRange::new(8.0, 36.0),
                sway_frequency: ValueRange::new(0.3, 1.1),
                rotation_speed: ValueRange::new(0.2, 1.4),
                palette: vec![WHITE, SNOW_BLUE],
                full_viewport_spawn: true,
            },
            motion: MotionLaw::FallSway,
            recycle: RecycleRule::TopEdge,
            shape: ShapeKind::Circle,
            default_count: 50,
            audio_reactive: false,
        },
        EffectKind::Stars => EffectProfile {
            kind,
            spawn: SpawnProfile {
                size: ValueRange::new(3.0, 9.0),
                speed: ValueRange::new(20.0, 60.0),
                sway_amplitude: ValueRange::new(4.0, 14.0),
                sway_frequency: ValueRange::new(0.2, 0.7),
                rotation_speed: ValueRange::new(0.5, 2.5),
                palette: vec![STAR_GOLD, STAR_PALE, WHITE],
                full_viewport_spawn: true,
            },
            motion: MotionLaw::FallSway,
            recycle: RecycleRule::TopEdge,
            shape: ShapeKind::Star,
            default_count: 40,
            audio_reactive: false,
        },
        EffectKind::Bubbles => EffectProfile {
            kind,
            spawn: SpawnProfile {
                size: ValueRange::new(6.0, 20.0),
                speed: ValueRange::new(30.0, 90.0),
                sway_amplitude: ValueRange::new(10.0, 30.0),
                sway_frequency: ValueRange::new(0.4, 1.2),
                rotation_speed: ValueRange::new(0.1, 0.6),
                palette: vec![BUBBLE_TEAL, BUBBLE_PALE],
                full_viewport_spawn: true,
            },
            motion: MotionLaw::DriftUp,
            recycle: RecycleRule::BottomEdge,
            shape: ShapeKind::Circle,
            default_count: 35,
            audio_reactive: true,
        },
        EffectKind::Sakura => EffectProfile {
            kind,
            spawn: SpawnProfile {
                size: ValueRange::new(5.0, 12.0),
                speed: ValueRange::new(35.0, 85.0),
                sway_amplitude: ValueRange::new(18.0, 55.0),
                sway_frequency: ValueRange::new(0.4, 1.0),
                rotation_speed: ValueRange::new(0.8, 2.6),
                palette: vec![SAKURA_PINK, SAKURA_DEEP, PLUM_WHITE],
                full_viewport_spawn: true,
            },
            motion: MotionLaw::FallSway,
            recycle: RecycleRule::TopEdge,
            shape: ShapeKind::Ellipse,
            default_count: 45,
            audio_reactive: true,
        },
        EffectKind::Fireflies => EffectProfile {
            kind,
            spawn: SpawnProfile {
                size: ValueRange::new(2.0, 5.0),
                speed: ValueRange::new(15.0, 45.0),
                sway_amplitude: ValueRange::new(20.0, 60.0),
                sway_frequency: ValueRange::new(0.5, 1.6),
                rotation_speed: ValueRange::new(0.3, 1.2),
                palette: vec![FIREFLY_GREEN, FIREFLY_AMBER],
                full_viewport_spawn: true,
            },
            motion: MotionLaw::DriftUp,
            recycle: RecycleRule::BottomEdge,
            shape: ShapeKind::Circle,
            default_count: 30,
            audio_reactive: false,
        },
        EffectKind::Rain => EffectProfile {
            kind,
            spawn: SpawnProfile {
                size: ValueRange::new(8.0, 18.0),
                speed: ValueRange::new(320.0, 560.0),
                sway_amplitude: ValueRange::fixed(0.0),
                sway_frequency: ValueRange::fixed(0.0),
                rotation_speed: ValueRange::fixed(0.0),
                palette: vec![RAIN_GREY],
                full_viewport_spawn: true,
            },
            motion: MotionLaw::Fall,
            recycle: RecycleRule::TopEdge,
            shape: ShapeKind::Streak,
            default_count: 70,
            audio_reactive: false,
        },
        EffectKind::Confetti => EffectProfile {
            kind,
            spawn: SpawnProfile {
                size: ValueRange::new(4.0, 9.0),
                speed: ValueRange::new(70.0, 160.0),
                sway_amplitude: ValueRange::new(12.0, 40.0),
                sway_frequency: ValueRange::new(0.6, 1.8),
                rotation_speed: ValueRange::new(2.0, 7.0),
                palette: CONFETTI_PALETTE.to_vec(),
                full_viewport_spawn: true,
            },
            motion: MotionLaw::FallSway,
            recycle: RecycleRule::TopEdge,
            shape: ShapeKind::Ellipse,
            default_count: 60,
            audio_reactive: false,
        },
        EffectKind::Hearts => EffectProfile {
            kind,
            spawn: SpawnProfile {
                size: ValueRange::new(6.0, 14.0),
                speed: ValueRange::new(25.0, 70.0),
                sway_amplitude: ValueRange::new(10.0, 32.0),
                sway_frequency: ValueRange::new(0.3, 0.9),
                rotation_speed: ValueRange::new(0.2, 1.0),
                palette: vec![HEART_RED, HEART_ROSE],
                full_viewport_spawn: true,
            },
            motion: MotionLaw::DriftUp,
            recycle: RecycleRule::BottomEdge,
            shape: ShapeKind::Heart,
            default_count: 25,
            audio_reactive: true,
        },
        EffectKind::PetalFall => EffectProfile {
            kind,
            spawn: SpawnProfile {
                size: ValueRange::new(4.0, 10.0),
                speed: ValueRange::new(30.0, 75.0),
                sway_amplitude: ValueRange::new(16.0, 50.0),
                sway_frequency: ValueRange::new(0.3, 0.9),
                rotation_speed: ValueRange::new(0.6, 2.2),
                palette: vec![PLUM_PINK, PLUM_WHITE, SAKURA_PINK],
                full_viewport_spawn: true,
            },
            motion: MotionLaw::FallSway,
            recycle: RecycleRule::TopEdge,
            shape: ShapeKind::Ellipse,
            default_count: 40,
            audio_reactive: false,
        },
        EffectKind::Celebration => EffectProfile {
            kind,
            spawn: SpawnProfile {
                size: ValueRange::new(3.0, 8.0),
                speed: ValueRange::new(220.0, 420.0),
                sway_amplitude: ValueRange::fixed(0.0),
                sway_frequency: ValueRange::fixed(0.0),
                rotation_speed: ValueRange::new(1.0, 5.0),
                palette: vec![FESTIVE_RED, FESTIVE_GOLD, FESTIVE_ORANGE],
                full_viewport_spawn: false,
            },
            motion: MotionLaw::Burst,
            recycle: RecycleRule::BurstOrigin,
            shape: ShapeKind::Circle,
            default_count: 80,
            audio_reactive: false,
        },
    };

    Some(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parses_every_player_effect_id() {
        for kind in EffectKind::PLAYER_EFFECTS {
            assert_eq!(EffectKind::parse(kind.id()), kind);
        }
    }

    #[test]
    fn unknown_identifiers_resolve_to_none() {
        assert_eq!(EffectKind::parse("plasma"), EffectKind::None);
        assert_eq!(EffectKind::parse(""), EffectKind::None);
        assert_eq!(EffectKind::parse("SNOWSTORM"), EffectKind::None);
        assert!(profile(EffectKind::None).is_none());
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!(EffectKind::parse("Snow"), EffectKind::Snow);
        assert_eq!(EffectKind::parse("  RAIN "), EffectKind::Rain);
    }

    #[test]
    fn every_profile_has_valid_ranges() {
        let all = EffectKind::PLAYER_EFFECTS
            .into_iter()
            .chain([EffectKind::PetalFall, EffectKind::Celebration]);

        for kind in all {
            let profile = profile(kind).expect("catalog entry must exist");
            assert_eq!(profile.kind, kind);
            assert!(profile.default_count > 0);
            assert!(profile.spawn.size.min > 0.0, "{kind:?} size must be positive");
            assert!(profile.spawn.size.max >= profile.spawn.size.min);
            assert!(profile.spawn.speed.min > 0.0, "{kind:?} speed must be positive");
            assert!(!profile.spawn.palette.is_empty());
        }
    }

    #[test]
    fn range_sampling_stays_inside_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = ValueRange::new(1.5, 4.0);
        for _ in 0..200 {
            let value = range.sample(&mut rng);
            assert!(range.contains(value));
        }
    }

    #[test]
    fn fixed_range_always_returns_its_value() {
        let mut rng = StdRng::seed_from_u64(1);
        let range = ValueRange::fixed(3.0);
        assert_eq!(range.sample(&mut rng), 3.0);
    }
}
