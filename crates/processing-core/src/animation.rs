//! Text layer animation.
//!
//! Each [`Animation`] maps local elapsed time to a [`LayerTransform`] that is
//! layered on top of the base placement. All strategies are pure; glitch
//! draws its jitter from an RNG seeded per layer and per time quantum.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shortsmith_timeline_model::Animation;

/// Length of the fade-in used by `fade` and `slide_up`.
pub const FADE_IN_SECS: f64 = 0.3;
/// Length of the scale ramp used by `pop` and `typewriter`.
pub const POP_SECS: f64 = 0.25;
/// Initial downward offset of `slide_up`.
pub const SLIDE_DISTANCE_PX: f64 = 50.0;
/// Peak upward offset of `bounce`.
pub const BOUNCE_HEIGHT_PX: f64 = 80.0;
pub const SHAKE_AMPLITUDE_PX: f64 = 20.0;
pub const SWING_DEGREES: f64 = 15.0;
/// Bound on glitch jitter along each axis.
pub const GLITCH_JITTER_PX: f64 = 12.0;

/// Offset/scale/rotation/opacity delta for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerTransform {
    pub dx: f64,
    pub dy: f64,
    /// Uniform scale about the bitmap center.
    pub scale: f64,
    /// Clockwise rotation about the bitmap center, in degrees.
    pub rotation_deg: f64,
    pub opacity: f64,
}

impl LayerTransform {
    pub const IDENTITY: Self = Self {
        dx: 0.0,
        dy: 0.0,
        scale: 1.0,
        rotation_deg: 0.0,
        opacity: 1.0,
    };

    pub fn is_visible(&self) -> bool {
        self.scale > 0.0 && self.opacity > 0.0
    }
}

impl Default for LayerTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

type Strategy = fn(f64, u64) -> LayerTransform;

/// Indexed by `Animation as usize`.
const STRATEGIES: [Strategy; Animation::ALL.len()] = [
    still, fade, slide_up, pop, pop, bounce, shake, swing, glitch,
];

/// Transform for `animation` at `t` seconds after the layer's start.
pub fn transform_at(animation: Animation, t: f64, seed: u64) -> LayerTransform {
    STRATEGIES[animation as usize](t.max(0.0), seed)
}

fn still(_t: f64, _seed: u64) -> LayerTransform {
    LayerTransform::IDENTITY
}

fn fade_in(t: f64) -> f64 {
    (t / FADE_IN_SECS).clamp(0.0, 1.0)
}

fn fade(t: f64, _seed: u64) -> LayerTransform {
    LayerTransform {
        opacity: fade_in(t),
        ..LayerTransform::IDENTITY
    }
}

fn slide_up(t: f64, _seed: u64) -> LayerTransform {
    LayerTransform {
        dy: SLIDE_DISTANCE_PX * (1.0 - t / FADE_IN_SECS).max(0.0),
        opacity: fade_in(t),
        ..LayerTransform::IDENTITY
    }
}

fn pop(t: f64, _seed: u64) -> LayerTransform {
    LayerTransform {
        scale: (t / POP_SECS).min(1.0),
        ..LayerTransform::IDENTITY
    }
}

fn bounce(t: f64, _seed: u64) -> LayerTransform {
    LayerTransform {
        dy: -BOUNCE_HEIGHT_PX * (3.0 * t).sin().abs(),
        ..LayerTransform::IDENTITY
    }
}

fn shake(t: f64, _seed: u64) -> LayerTransform {
    LayerTransform {
        dx: SHAKE_AMPLITUDE_PX * (20.0 * t).sin(),
        ..LayerTransform::IDENTITY
    }
}

fn swing(t: f64, _seed: u64) -> LayerTransform {
    LayerTransform {
        rotation_deg: SWING_DEGREES * (2.0 * t).sin(),
        ..LayerTransform::IDENTITY
    }
}

fn glitch(t: f64, seed: u64) -> LayerTransform {
    let quantum = (t * 10.0).floor() as u64;
    if quantum % 5 != 0 {
        return LayerTransform::IDENTITY;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ quantum.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    LayerTransform {
        dx: rng.gen_range(-GLITCH_JITTER_PX..=GLITCH_JITTER_PX),
        dy: rng.gen_range(-GLITCH_JITTER_PX..=GLITCH_JITTER_PX),
        ..LayerTransform::IDENTITY
    }
}

/// Stable per-layer seed: FNV-1a over the text and its declaration index.
pub fn layer_seed(text: &str, index: usize) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    text.bytes()
        .chain((index as u64).to_le_bytes())
        .fold(OFFSET, |hash, b| (hash ^ b as u64).wrapping_mul(PRIME))
}

/// Pixel rectangle a transformed bitmap occupies on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Resolve a fractional center position to a top-left rectangle.
///
/// The center stays at `(fx * canvas_w, fy * canvas_h)` regardless of scale;
/// the transform's offsets are then added on top.
pub fn place_bitmap(
    fx: f64,
    fy: f64,
    canvas: (u32, u32),
    bitmap: (u32, u32),
    transform: &LayerTransform,
) -> PlacedRect {
    let cx = fx * canvas.0 as f64;
    let cy = fy * canvas.1 as f64;
    let width = bitmap.0 as f64 * transform.scale;
    let height = bitmap.1 as f64 * transform.scale;
    PlacedRect {
        x: cx - width / 2.0 + transform.dx,
        y: cy - height / 2.0 + transform.dy,
        width,
        height,
    }
}
