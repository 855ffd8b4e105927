//! Fixed-point math utilities for deterministic decisions.
//!
//! Stabilities, resource pools and damage scores all use fixed-point
//! arithmetic so that identical board states always produce identical
//! command batches, independent of the host CPU.

use fixed::types::I32F32;

/// Fixed-point number type for all decision math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Build a fixed-point constant from a rational `num / den`.
///
/// Usable in `const` context, which `Fixed::from_num` is not.
#[must_use]
pub const fn ratio(num: i64, den: i64) -> Fixed {
    Fixed::from_bits((num << 32) / den)
}

/// Build a fixed-point constant from an integer.
#[must_use]
pub const fn int(n: i64) -> Fixed {
    Fixed::from_bits(n << 32)
}

/// Serde support for fixed-point numbers written as plain decimals.
///
/// Human-edited configuration files carry values such as `37.5`; the
/// conversion to fixed-point happens exactly once, at load time.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("value {value} out of range")))
    }
}

/// Squared Euclidean distance between two integer cells.
#[must_use]
pub const fn distance_squared(ax: i32, ay: i32, bx: i32, by: i32) -> i64 {
    let dx = (ax - bx) as i64;
    let dy = (ay - by) as i64;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_matches_from_num() {
        assert_eq!(ratio(1, 2), Fixed::from_num(0.5));
        assert_eq!(ratio(75, 2), Fixed::from_num(37.5));
        assert_eq!(ratio(7, 1), int(7));
    }

    #[test]
    fn test_small_ratio_is_positive() {
        let epsilon = ratio(1, 100_000);
        assert!(epsilon > Fixed::ZERO);
        assert!(epsilon < ratio(1, 1000));
    }

    #[test]
    fn test_distance_squared() {
        assert_eq!(distance_squared(0, 0, 3, 4), 25);
        assert_eq!(distance_squared(5, 5, 5, 5), 0);
        assert_eq!(distance_squared(-1, 2, 1, -2), 20);
    }
}
