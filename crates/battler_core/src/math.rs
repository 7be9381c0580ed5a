//! Fixed-point math utilities for deterministic simulation.
//!
//! Every quantity the simulation mutates (positions, timers, hit points)
//! is fixed-point so that two runs fed the same actions and tick
//! durations end in bit-identical state.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Fixed-point 3D vector in world space.
///
/// The board lies in the XZ plane; `y` is height and stays zero for
/// anything standing on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec3Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate (height).
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Z coordinate.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
}

impl Vec3Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Unit vector along +Z.
    pub const FORWARD: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ONE,
    };

    /// Unit vector along -Z.
    pub const BACKWARD: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::from_bits(-(1_i64 << 32)),
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let d = self - other;
        d.dot(d)
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Normalize vector using fixed-point math.
    ///
    /// Returns [`Vec3Fixed::ZERO`] for a zero-length input.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len, self.z / len)
    }

    /// Convert to floats for render-facing views.
    #[must_use]
    pub fn to_f64(self) -> [f64; 3] {
        [
            self.x.to_num::<f64>(),
            self.y.to_num::<f64>(),
            self.z.to_num::<f64>(),
        ]
    }
}

/// Square root of a fixed-point number, rounded down to the nearest bit.
///
/// Works on the raw bits: `sqrt(v / 2^32) = isqrt(v * 2^32) / 2^32`, so
/// perfect squares such as 1 or 0.25 come out exact.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }
    let Ok(bits) = u128::try_from(value.to_bits()) else {
        return Fixed::ZERO;
    };
    let root = isqrt(bits << Fixed::FRAC_NBITS);
    Fixed::from_bits(i64::try_from(root).unwrap_or(i64::MAX))
}

fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Reciprocal of a strictly positive rate, e.g. seconds per attack.
///
/// Rates are validated positive when rules are loaded; a non-positive
/// rate yields zero rather than dividing by zero.
#[must_use]
pub fn per_second(rate: Fixed) -> Fixed {
    if rate <= Fixed::ZERO {
        Fixed::ZERO
    } else {
        Fixed::ONE / rate
    }
}

impl std::ops::Add for Vec3Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::Sub for Vec3Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_distance_squared() {
        let a = Vec3Fixed::new(Fixed::from_num(3), Fixed::ZERO, Fixed::ZERO);
        let b = Vec3Fixed::new(Fixed::ZERO, Fixed::ZERO, Fixed::from_num(4));
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_vec3_normalize() {
        let v = Vec3Fixed::new(Fixed::from_num(3), Fixed::ZERO, Fixed::from_num(4));
        let norm = v.normalize();

        let len_sq = norm.dot(norm);
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!(
            (len_sq - Fixed::ONE).abs() < epsilon,
            "normalized vector length² should be ~1, got {:?}",
            len_sq
        );

        // x/z ratio matches original 3/4
        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.z * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon, "direction not preserved");
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec3Fixed::ZERO.normalize(), Vec3Fixed::ZERO);
    }

    #[test]
    fn test_per_second() {
        assert_eq!(per_second(Fixed::from_num(2)), Fixed::from_num(0.5));
        assert_eq!(per_second(Fixed::ZERO), Fixed::ZERO);
    }

    #[test]
    fn test_fixed_sqrt() {
        assert_eq!(fixed_sqrt(Fixed::from_num(16)), Fixed::from_num(4));
        assert_eq!(fixed_sqrt(Fixed::ONE), Fixed::ONE);
        assert_eq!(fixed_sqrt(Fixed::from_num(0.25)), Fixed::from_num(0.5));
        let root = fixed_sqrt(Fixed::from_num(2));
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!((root * root - Fixed::from_num(2)).abs() < epsilon);
        assert_eq!(fixed_sqrt(Fixed::from_num(-1)), Fixed::ZERO);
    }
}
