use serde::{Deserialize, Serialize};

use crate::catalog::{MotionLaw, Rgba, ShapeKind};
use crate::field::ParticleField;

/// Which overlay layer a draw op belongs to. The seasonal layer composites
/// behind application content, the player layer above it. Neither layer
/// intercepts input; the stream is strictly presentational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlaySlot {
    Seasonal,
    Player,
}

/// One filled shape positioned and rotated per current particle state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
    },
    /// Rotated ellipse; petals and confetti strips.
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        rotation: f32,
    },
    Star {
        cx: f32,
        cy: f32,
        radius: f32,
        rotation: f32,
    },
    Heart {
        cx: f32,
        cy: f32,
        size: f32,
        rotation: f32,
    },
    /// Vertical streak for rain.
    Streak {
        x: f32,
        y: f32,
        length: f32,
        thickness: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawOp {
    pub slot: OverlaySlot,
    pub shape: Shape,
    pub color: Rgba,
}

/// Draw stream for one composed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayFrame {
    pub ops: Vec<DrawOp>,
}

impl OverlayFrame {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Appends one draw op per particle of the field.
///
/// The renderer borrows the particle array and never mutates it; all state
/// evolution happens in the preceding tick. Reactive effects additionally
/// bias opacity with the field's smoothed amplitude, and upward-drifting
/// particles fade as they approach the top edge.
pub fn draw_field(field: &ParticleField, slot: OverlaySlot, out: &mut Vec<DrawOp>) {
    let profile = field.profile();
    let height = field.height().max(1.0);

    let reactive_fade = if profile.audio_reactive {
        // Keep a visible floor so silence dims rather than blanks the layer.
        0.35 + 0.65 * field.level()
    } else {
        1.0
    };

    for particle in field.particles() {
        let mut fade = reactive_fade;
        if profile.motion == MotionLaw::DriftUp {
            fade *= (particle.y / height).clamp(0.0, 1.0);
        }

        let shape = match profile.shape {
            ShapeKind::Circle => Shape::Circle {
                cx: particle.x,
                cy: particle.y,
                radius: particle.size,
            },
            ShapeKind::Ellipse => Shape::Ellipse {
                cx: particle.x,
                cy: particle.y,
                rx: particle.size,
                ry: particle.size * 0.55,
                rotation: particle.rotation,
            },
            ShapeKind::Star => Shape::Star {
                cx: particle.x,
                cy: particle.y,
                radius: particle.size,
                rotation: particle.rotation,
            },
            ShapeKind::Heart => Shape::Heart {
                cx: particle.x,
                cy: particle.y,
                size: particle.size,
                rotation: particle.rotation,
            },
            ShapeKind::Streak => Shape::Streak {
                x: particle.x,
                y: particle.y,
                length: particle.size * 2.2,
                thickness: (particle.size * 0.12).max(1.0),
            },
        };

        out.push(DrawOp {
            slot,
            shape,
            color: particle.color.faded(fade),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{profile, EffectKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field(kind: EffectKind, count: usize) -> ParticleField {
        ParticleField::initialize(
            count,
            1080.0,
            1920.0,
            profile(kind).unwrap(),
            StdRng::seed_from_u64(11),
        )
    }

    #[test]
    fn emits_one_op_per_particle() {
        let field = field(EffectKind::Snow, 23);
        let mut ops = Vec::new();
        draw_field(&field, OverlaySlot::Player, &mut ops);
        assert_eq!(ops.len(), 23);
        assert!(ops
            .iter()
            .all(|op| matches!(op.shape, Shape::Circle { .. })));
    }

    #[test]
    fn rain_renders_as_streaks() {
        let field = field(EffectKind::Rain, 5);
        let mut ops = Vec::new();
        draw_field(&field, OverlaySlot::Player, &mut ops);
        assert!(ops
            .iter()
            .all(|op| matches!(op.shape, Shape::Streak { .. })));
    }

    #[test]
    fn reactive_effects_dim_with_the_smoothed_level() {
        let mut loud = field(EffectKind::Sakura, 8);
        let mut quiet = field(EffectKind::Sakura, 8);
        for _ in 0..120 {
            loud.tick(1.0 / 60.0, 1.0);
            quiet.tick(1.0 / 60.0, 0.0);
        }

        let mut loud_ops = Vec::new();
        let mut quiet_ops = Vec::new();
        draw_field(&loud, OverlaySlot::Player, &mut loud_ops);
        draw_field(&quiet, OverlaySlot::Player, &mut quiet_ops);

        let loud_alpha: u32 = loud_ops.iter().map(|op| op.color.a as u32).sum();
        let quiet_alpha: u32 = quiet_ops.iter().map(|op| op.color.a as u32).sum();
        assert!(loud_alpha > quiet_alpha);
    }

    #[test]
    fn frame_round_trips_through_json() {
        let field = field(EffectKind::Confetti, 4);
        let mut ops = Vec::new();
        draw_field(&field, OverlaySlot::Seasonal, &mut ops);
        let frame = OverlayFrame { ops };

        let json = serde_json::to_string(&frame).unwrap();
        let back: OverlayFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }
}
