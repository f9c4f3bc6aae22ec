//! Zoom functions: declared property values that vary with the map zoom.

use crate::value::Value;

/// Interpolation stops as (zoom, value) pairs, sorted ascending by zoom.
pub type Stops = Vec<(f64, Value)>;

/// A zoom-dependent value declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    /// Smooth interpolation between stops. `base` controls the curve between
    /// adjacent stops; 1.0 is linear in zoom.
    Exponential { base: f64, stops: Stops },
    /// Step function: the value of the last stop at or below the zoom.
    Interval { stops: Stops },
    /// Exact-match step function. Unmatched zooms fall back to the first stop.
    Categorical { stops: Stops },
}

impl Function {
    pub fn evaluate(&self, zoom: f64) -> Value {
        match self {
            Function::Exponential { base, stops } => evaluate_exponential(*base, stops, zoom),
            Function::Interval { stops } => evaluate_interval(stops, zoom),
            Function::Categorical { stops } => stops
                .iter()
                .find(|(z, _)| *z == zoom)
                .or_else(|| stops.first())
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Number(0.0)),
        }
    }

    /// Discrete functions change value in steps; an integer zoom crossing can
    /// move them to a new bucket.
    pub fn is_discrete(&self) -> bool {
        matches!(self, Function::Interval { .. } | Function::Categorical { .. })
    }
}

/// A paint property as declared: either fixed or a function of zoom.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Constant(Value),
    Function(Function),
}

impl PropertyValue {
    pub fn evaluate(&self, zoom: f64) -> Value {
        match self {
            PropertyValue::Constant(v) => v.clone(),
            PropertyValue::Function(f) => f.evaluate(zoom),
        }
    }

    pub fn is_zoom_dependent(&self) -> bool {
        matches!(self, PropertyValue::Function(_))
    }

    pub fn is_discrete(&self) -> bool {
        match self {
            PropertyValue::Constant(_) => false,
            PropertyValue::Function(f) => f.is_discrete(),
        }
    }
}

fn evaluate_interval(stops: &Stops, zoom: f64) -> Value {
    let mut current = stops.first().map(|(_, v)| v.clone()).unwrap_or(Value::Number(0.0));
    for (z, v) in stops {
        if *z <= zoom {
            current = v.clone();
        } else {
            break;
        }
    }
    current
}

fn evaluate_exponential(base: f64, stops: &Stops, zoom: f64) -> Value {
    if stops.is_empty() {
        return Value::Number(0.0);
    }
    if zoom <= stops[0].0 {
        return stops[0].1.clone();
    }
    let last = stops.len() - 1;
    if zoom >= stops[last].0 {
        return stops[last].1.clone();
    }
    // Find the surrounding stop pair and blend within it.
    let mut upper = 1;
    while stops[upper].0 < zoom {
        upper += 1;
    }
    let (lo_z, lo_v) = &stops[upper - 1];
    let (hi_z, hi_v) = &stops[upper];
    let t = interpolation_factor(base, (*lo_z, *hi_z), zoom);
    lo_v.lerp(hi_v, t)
}

/// Progress of `zoom` through [lower, upper], curved by `base`.
fn interpolation_factor(base: f64, (lower, upper): (f64, f64), zoom: f64) -> f64 {
    let difference = upper - lower;
    if difference <= 0.0 {
        return 0.0;
    }
    let progress = zoom - lower;
    if (base - 1.0).abs() < 1e-6 {
        progress / difference
    } else {
        (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
    }
}
