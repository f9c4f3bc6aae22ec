//! Property value primitives shared by the document model and the engine.

use std::fmt;

/// RGBA color with float components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS-syntax color string ("#rgb", "rgba(..)", named colors).
    pub fn parse(input: &str) -> Option<Self> {
        let c = csscolorparser::parse(input).ok()?;
        Some(Self { r: c.r, g: c.g, b: c.b, a: c.a })
    }

    /// Channel-wise linear interpolation toward `other`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Scale the alpha channel, keeping the color channels untouched.
    pub fn with_opacity(self, opacity: f32) -> Color {
        Color { a: self.a * opacity.clamp(0.0, 1.0), ..self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::TRANSPARENT
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// A resolved style property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Color(Color),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Interpolate toward `to` with `t` in [0, 1]. Numbers and colors blend;
    /// non-interpolable values hold the start value and step to the end value
    /// once `t` reaches 1.
    pub fn lerp(&self, to: &Value, t: f64) -> Value {
        match (self, to) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + (b - a) * t),
            (Value::Color(a), Value::Color(b)) => Value::Color(a.lerp(*b, t as f32)),
            _ => {
                if t >= 1.0 {
                    to.clone()
                } else {
                    self.clone()
                }
            }
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }
}

/// Default value for a paint property with no declaration left after
/// cascading, so removing a class always has a defined revert target.
/// Suffix rules cover the common property families.
pub fn default_paint_value(name: &str) -> Value {
    if name.ends_with("-color") {
        Value::Color(Color::BLACK)
    } else if name.ends_with("-opacity") {
        Value::Number(1.0)
    } else if name.ends_with("-width") {
        Value::Number(1.0)
    } else if name.ends_with("-radius") {
        Value::Number(5.0)
    } else {
        Value::Number(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_lerp_is_linear() {
        let a = Value::Number(2.0);
        let b = Value::Number(4.0);
        assert_eq!(a.lerp(&b, 0.0), Value::Number(2.0));
        assert_eq!(a.lerp(&b, 0.5), Value::Number(3.0));
        assert_eq!(a.lerp(&b, 1.0), Value::Number(4.0));
    }

    #[test]
    fn non_interpolable_steps_at_completion() {
        let a = Value::Str("a".into());
        let b = Value::Str("b".into());
        assert_eq!(a.lerp(&b, 0.99), a);
        assert_eq!(a.lerp(&b, 1.0), b);
    }

    #[test]
    fn color_parse_hex_and_named() {
        let red = Color::parse("#ff0000").expect("hex color");
        assert_eq!(red, Color::new(1.0, 0.0, 0.0, 1.0));
        assert!(Color::parse("blue").is_some());
        assert!(Color::parse("not-a-color").is_none());
    }
}
