//! Scalar angle type used by every geographic computation in the engine.
//!
//! Angles are immutable values whose canonical unit is degrees. Normalization is
//! never applied implicitly: callers pick [`Angle::from_degrees`] for raw values,
//! the `*_latitude`/`*_longitude` constructors for clamped values, or one of the
//! `normalized_*` functions when the domain requires wrapping.

use crate::{GlobeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// An angular value stored in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Angle {
    pub degrees: f64,
}

impl Angle {
    pub const ZERO: Angle = Angle { degrees: 0.0 };
    pub const POS90: Angle = Angle { degrees: 90.0 };
    pub const NEG90: Angle = Angle { degrees: -90.0 };
    pub const POS180: Angle = Angle { degrees: 180.0 };
    pub const NEG180: Angle = Angle { degrees: -180.0 };
    pub const POS360: Angle = Angle { degrees: 360.0 };
    pub const NEG360: Angle = Angle { degrees: -360.0 };
    /// One arc minute.
    pub const MINUTE: Angle = Angle {
        degrees: 1.0 / 60.0,
    };
    /// One arc second.
    pub const SECOND: Angle = Angle {
        degrees: 1.0 / 3600.0,
    };

    /// Creates an angle from degrees without any range check.
    pub const fn from_degrees(degrees: f64) -> Self {
        Self { degrees }
    }

    /// Creates an angle from radians without any range check.
    pub fn from_radians(radians: f64) -> Self {
        Self {
            degrees: radians.to_degrees(),
        }
    }

    /// Creates a latitude, clamping the value into [-90, 90].
    pub fn from_degrees_latitude(degrees: f64) -> Self {
        Self::from_degrees(degrees.clamp(-90.0, 90.0))
    }

    /// Creates a longitude, clamping the value into [-180, 180].
    pub fn from_degrees_longitude(degrees: f64) -> Self {
        Self::from_degrees(degrees.clamp(-180.0, 180.0))
    }

    /// Creates a latitude from radians, clamping into [-pi/2, pi/2].
    pub fn from_radians_latitude(radians: f64) -> Self {
        let half_pi = std::f64::consts::FRAC_PI_2;
        Self::from_radians(radians.clamp(-half_pi, half_pi))
    }

    /// Creates a longitude from radians, clamping into [-pi, pi].
    pub fn from_radians_longitude(radians: f64) -> Self {
        let pi = std::f64::consts::PI;
        Self::from_radians(radians.clamp(-pi, pi))
    }

    /// Creates an angle from degrees, minutes and seconds.
    ///
    /// The sign of `degrees` applies to the whole value. Minutes and seconds
    /// must lie in `[0, 60)`.
    pub fn from_dms(degrees: i32, minutes: i32, seconds: f64) -> Result<Self> {
        if !(0..60).contains(&minutes) {
            return Err(GlobeError::ArgumentOutOfRange(format!(
                "minutes {minutes} not in [0, 60)"
            )));
        }
        if !(0.0..60.0).contains(&seconds) {
            return Err(GlobeError::ArgumentOutOfRange(format!(
                "seconds {seconds} not in [0, 60)"
            )));
        }

        let sign = if degrees < 0 { -1.0 } else { 1.0 };
        let magnitude = degrees.unsigned_abs() as f64 + minutes as f64 / 60.0 + seconds / 3600.0;
        Ok(Self::from_degrees(sign * magnitude))
    }

    /// Parses a degrees/minutes/seconds string.
    ///
    /// Accepts separators `d`, `°`, `'`, `’`, `"`, `”` or whitespace, e.g.
    /// `"-37 57 3.72"`, `"37°57'3.72\"S"` or `"144d25'29.5\" E"`. A trailing
    /// `S` or `W` negates the value.
    pub fn from_dms_str(dms: &str) -> Result<Self> {
        let trimmed = dms.trim();
        if trimmed.is_empty() {
            return Err(GlobeError::ParseError("empty DMS string".to_string()));
        }

        let mut sign = 1.0;
        let mut body = trimmed;
        if let Some(last) = body.chars().last() {
            match last.to_ascii_uppercase() {
                'S' | 'W' => {
                    sign = -1.0;
                    body = &body[..body.len() - last.len_utf8()];
                }
                'N' | 'E' => {
                    body = &body[..body.len() - last.len_utf8()];
                }
                _ => {}
            }
        }

        let body = body.trim();
        let (negative, body) = match body.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, body.strip_prefix('+').unwrap_or(body)),
        };
        if negative {
            sign = -sign;
        }

        let parts: Vec<&str> = body
            .split(|c: char| {
                c.is_whitespace() || matches!(c, 'd' | 'D' | '°' | '\'' | '’' | '"' | '”')
            })
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(GlobeError::ParseError(format!(
                "cannot parse DMS string {dms:?}"
            )));
        }

        let parse = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| GlobeError::ParseError(format!("invalid DMS component {s:?}")))
        };

        let degrees = parse(parts[0])?;
        let minutes = parts.get(1).map(|s| parse(s)).transpose()?.unwrap_or(0.0);
        let seconds = parts.get(2).map(|s| parse(s)).transpose()?.unwrap_or(0.0);

        if !(0.0..60.0).contains(&minutes) {
            return Err(GlobeError::ArgumentOutOfRange(format!(
                "minutes {minutes} not in [0, 60)"
            )));
        }
        if !(0.0..60.0).contains(&seconds) {
            return Err(GlobeError::ArgumentOutOfRange(format!(
                "seconds {seconds} not in [0, 60)"
            )));
        }

        Ok(Self::from_degrees(
            sign * (degrees + minutes / 60.0 + seconds / 3600.0),
        ))
    }

    pub fn radians(&self) -> f64 {
        self.degrees.to_radians()
    }

    pub fn add_degrees(&self, degrees: f64) -> Angle {
        Angle::from_degrees(self.degrees + degrees)
    }

    pub fn add_radians(&self, radians: f64) -> Angle {
        Angle::from_radians(self.radians() + radians)
    }

    /// Ratio of this angle to another.
    pub fn divide_by_angle(&self, other: Angle) -> f64 {
        self.degrees / other.degrees
    }

    pub fn sin(&self) -> f64 {
        self.radians().sin()
    }

    pub fn cos(&self) -> f64 {
        self.radians().cos()
    }

    pub fn tan(&self) -> f64 {
        self.radians().tan()
    }

    pub fn sin_half_angle(&self) -> f64 {
        (0.5 * self.radians()).sin()
    }

    pub fn cos_half_angle(&self) -> f64 {
        (0.5 * self.radians()).cos()
    }

    /// Tangent of half this angle, used for field-of-view ratios.
    pub fn tan_half_angle(&self) -> f64 {
        (0.5 * self.radians()).tan()
    }

    /// Smallest angular separation between two angles, in [0, 180].
    pub fn angular_distance_to(&self, other: Angle) -> Angle {
        let mut difference = other.degrees - self.degrees;
        if difference < -180.0 {
            difference += 360.0;
        } else if difference > 180.0 {
            difference -= 360.0;
        }
        Angle::from_degrees(difference.abs())
    }

    pub fn average(a: Angle, b: Angle) -> Angle {
        Angle::from_degrees(0.5 * (a.degrees + b.degrees))
    }

    pub fn mid_angle(a: Angle, b: Angle) -> Angle {
        Self::average(a, b)
    }

    /// Linear blend between two angles. `amount` is clamped to [0, 1].
    pub fn mix(amount: f64, a: Angle, b: Angle) -> Angle {
        if amount <= 0.0 {
            return a;
        }
        if amount >= 1.0 {
            return b;
        }
        Angle::from_degrees(a.degrees + (b.degrees - a.degrees) * amount)
    }

    pub fn clamp(value: Angle, min: Angle, max: Angle) -> Angle {
        Angle::from_degrees(value.degrees.clamp(min.degrees, max.degrees))
    }

    /// Wraps degrees into (-180, 180].
    pub fn normalized_degrees(degrees: f64) -> f64 {
        let a = degrees % 360.0;
        if a > 180.0 {
            a - 360.0
        } else if a < -180.0 {
            360.0 + a
        } else {
            a
        }
    }

    /// Reflects degrees into [-90, 90], folding over the poles.
    pub fn normalized_degrees_latitude(degrees: f64) -> f64 {
        let lat = degrees % 180.0;
        if lat > 90.0 {
            180.0 - lat
        } else if lat < -90.0 {
            -180.0 - lat
        } else {
            lat
        }
    }

    /// Wraps degrees into [-180, 180].
    pub fn normalized_degrees_longitude(degrees: f64) -> f64 {
        let lon = degrees % 360.0;
        if lon > 180.0 {
            lon - 360.0
        } else if lon < -180.0 {
            360.0 + lon
        } else {
            lon
        }
    }

    pub fn normalized(&self) -> Angle {
        Angle::from_degrees(Self::normalized_degrees(self.degrees))
    }

    pub fn normalized_latitude(&self) -> Angle {
        Angle::from_degrees(Self::normalized_degrees_latitude(self.degrees))
    }

    pub fn normalized_longitude(&self) -> Angle {
        Angle::from_degrees(Self::normalized_degrees_longitude(self.degrees))
    }

    pub fn is_valid_latitude(degrees: f64) -> bool {
        (-90.0..=90.0).contains(&degrees)
    }

    pub fn is_valid_longitude(degrees: f64) -> bool {
        (-180.0..=180.0).contains(&degrees)
    }

    pub fn to_decimal_degrees_string(&self, digits: usize) -> String {
        format!("{:.*}\u{00B0}", digits, self.degrees)
    }

    /// Formats as `D° M’ S.ss”`, carrying rounded seconds into minutes.
    pub fn to_dms_string(&self) -> String {
        let sign = if self.degrees < 0.0 { "-" } else { "" };
        let mut d = self.degrees.abs().floor();
        let mut m = ((self.degrees.abs() - d) * 60.0).floor();
        let mut s = ((self.degrees.abs() - d) * 60.0 - m) * 60.0;
        s = (s * 100.0).round() / 100.0;

        if s >= 60.0 {
            s = 0.0;
            m += 1.0;
        }
        if m >= 60.0 {
            m = 0.0;
            d += 1.0;
        }

        format!("{sign}{d}\u{00B0} {m}\u{2019} {s:.2}\u{201D}")
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Angle {
        Angle::from_degrees(self.degrees + rhs.degrees)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Angle) -> Angle {
        Angle::from_degrees(self.degrees - rhs.degrees)
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;

    fn mul(self, rhs: f64) -> Angle {
        Angle::from_degrees(self.degrees * rhs)
    }
}

impl Div<f64> for Angle {
    type Output = Angle;

    fn div(self, rhs: f64) -> Angle {
        Angle::from_degrees(self.degrees / rhs)
    }
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Angle {
        Angle::from_degrees(-self.degrees)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{00B0}", self.degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_constructors_clamp() {
        assert_eq!(Angle::from_degrees_latitude(100.0), Angle::POS90);
        assert_eq!(Angle::from_degrees_latitude(-100.0), Angle::NEG90);
        assert_eq!(Angle::from_degrees_longitude(200.0), Angle::POS180);
        assert_eq!(Angle::from_degrees_longitude(-200.0), Angle::NEG180);
        assert!((Angle::from_radians_latitude(4.0).degrees - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_unchecked_constructor_keeps_value() {
        assert_eq!(Angle::from_degrees(100.0).degrees, 100.0);
        assert!((Angle::from_radians(std::f64::consts::PI).degrees - 180.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(Angle::normalized_degrees(190.0), -170.0);
        assert_eq!(Angle::normalized_degrees(-190.0), 170.0);
        assert_eq!(Angle::normalized_degrees(180.0), 180.0);
        assert_eq!(Angle::normalized_degrees_latitude(100.0), 80.0);
        assert_eq!(Angle::normalized_degrees_latitude(-100.0), -80.0);
        assert_eq!(Angle::normalized_degrees_longitude(540.0), 180.0);
        assert_eq!(Angle::normalized_degrees_longitude(-270.0), 90.0);
    }

    #[test]
    fn test_dms() {
        let angle = Angle::from_dms(-37, 57, 3.72).unwrap();
        assert!((angle.degrees + 37.951033).abs() < 1e-6);

        assert!(matches!(
            Angle::from_dms(10, 60, 0.0),
            Err(GlobeError::ArgumentOutOfRange(_))
        ));
        assert!(matches!(
            Angle::from_dms(10, 0, 60.0),
            Err(GlobeError::ArgumentOutOfRange(_))
        ));
    }

    #[test]
    fn test_dms_str() {
        let south = Angle::from_dms_str("37°57'3.72\"S").unwrap();
        assert!((south.degrees + 37.951033).abs() < 1e-6);

        let east = Angle::from_dms_str("144d25'29.5\" E").unwrap();
        assert!((east.degrees - 144.424861).abs() < 1e-6);

        let plain = Angle::from_dms_str("-10 30").unwrap();
        assert_eq!(plain.degrees, -10.5);

        assert!(Angle::from_dms_str("").is_err());
        assert!(Angle::from_dms_str("10 75 0").is_err());
    }

    #[test]
    fn test_arithmetic_produces_new_values() {
        let a = Angle::from_degrees(30.0);
        let b = Angle::from_degrees(15.0);
        assert_eq!((a + b).degrees, 45.0);
        assert_eq!((a - b).degrees, 15.0);
        assert_eq!((a * 2.0).degrees, 60.0);
        assert_eq!((a / 2.0).degrees, 15.0);
        assert_eq!((-a).degrees, -30.0);
        assert_eq!(a.divide_by_angle(b), 2.0);
        assert_eq!(a.degrees, 30.0);
    }

    #[test]
    fn test_angular_distance_wraps() {
        let a = Angle::from_degrees(170.0);
        let b = Angle::from_degrees(-170.0);
        assert!((a.angular_distance_to(b).degrees - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_dms_string_carries_rounding() {
        let angle = Angle::from_degrees(10.0 - 1e-9);
        assert_eq!(angle.to_dms_string(), "10\u{00B0} 0\u{2019} 0.00\u{201D}");
    }
}
