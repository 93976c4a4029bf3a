//! Animatable value types
//!
//! Provides the vector and color types motions operate on, the
//! [`Interpolate`] trait every animatable value implements, and the
//! [`Lanes`] trait that lets spring dampers treat any value of up to four
//! components as a flat `[f32; 4]`.

/// Trait for values that can be interpolated between a start and an end
///
/// `t` is not clamped: easing curves overshoot and incremental loops
/// extrapolate past 1.0, so implementations should extend the segment where
/// that makes sense.
pub trait Interpolate: Clone + Send + Sync + 'static {
    /// Interpolate between self and other by factor t
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

/// Values that fit in up to four `f32` lanes
///
/// Unused lanes are zero.
pub trait Lanes: Interpolate + Copy {
    const LANES: usize;

    fn to_lanes(&self) -> [f32; 4];

    fn from_lanes(lanes: [f32; 4]) -> Self;
}

/// 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// 3D vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// 4D vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

/// RGBA color with components in 0..1
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

// ============================================================================
// Interpolate Implementations
// ============================================================================

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

/// Implements `Interpolate` and `Lanes` component-wise for a plain-field struct
macro_rules! impl_lanes {
    ($ty:ident, $count:literal, [$($field:ident => $lane:literal),+]) => {
        impl Interpolate for $ty {
            fn lerp(&self, other: &Self, t: f32) -> Self {
                Self {
                    $($field: self.$field + (other.$field - self.$field) * t,)+
                }
            }

            fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
                true $(&& (self.$field - other.$field).abs() < epsilon)+
            }
        }

        impl Lanes for $ty {
            const LANES: usize = $count;

            fn to_lanes(&self) -> [f32; 4] {
                let mut lanes = [0.0; 4];
                $(lanes[$lane] = self.$field;)+
                lanes
            }

            fn from_lanes(lanes: [f32; 4]) -> Self {
                Self {
                    $($field: lanes[$lane],)+
                }
            }
        }
    };
}

impl_lanes!(Vec2, 2, [x => 0, y => 1]);
impl_lanes!(Vec3, 3, [x => 0, y => 1, z => 2]);
impl_lanes!(Vec4, 4, [x => 0, y => 1, z => 2, w => 3]);
impl_lanes!(Color, 4, [r => 0, g => 1, b => 2, a => 3]);

impl Lanes for f32 {
    const LANES: usize = 1;

    fn to_lanes(&self) -> [f32; 4] {
        [*self, 0.0, 0.0, 0.0]
    }

    fn from_lanes(lanes: [f32; 4]) -> Self {
        lanes[0]
    }
}

// ============================================================================
// String Implementation
// ============================================================================

/// Text reveal: the first `round(t * len(end))` characters come from `other`,
/// the rest from the start text past that point.
///
/// `t` is clamped to 0..1 since characters cannot extrapolate.
impl Interpolate for String {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let end_len = other.chars().count();
        let revealed = (t * end_len as f32).round() as usize;
        if revealed >= end_len {
            return other.clone();
        }

        let mut result: String = other.chars().take(revealed).collect();
        result.extend(self.chars().skip(revealed));
        result
    }

    fn approx_eq(&self, other: &Self, _epsilon: f32) -> bool {
        self == other
    }
}
