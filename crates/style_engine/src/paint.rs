//! Per-layer cascaded paint state: class resolution, in-flight transitions,
//! and the values evaluated by the last recalculate pass.

use std::collections::{HashMap, HashSet};

use style::{LayerDesc, PropertyTransition, PropertyValue, Value, default_paint_value};

use crate::TimePoint;
use crate::transition::{ActiveTransition, Easing};

/// Evaluated paint for one layer at a specific zoom and time.
pub type EvaluatedPaint = HashMap<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct PaintState {
    /// Post-cascade target per property: active classes applied over the base
    /// declarations, defaults filled in for reverted properties.
    targets: HashMap<String, PropertyValue>,
    /// In-flight interpolations, keyed by property. Pruned on completion.
    transitions: HashMap<String, ActiveTransition>,
    /// Values produced by the last recalculate.
    evaluated: EvaluatedPaint,
    /// Last bucket value seen per discrete (step) property.
    last_discrete: HashMap<String, Value>,
}

impl PaintState {
    /// Resolve targets by applying `classes` over the layer's base paint in
    /// activation order (later class wins). A property whose resolved target
    /// actually changed gets a fresh transition when one is configured and a
    /// previous value exists to move from; otherwise the change is
    /// instantaneous. Unchanged targets never restart transitions.
    pub fn cascade(
        &mut self,
        layer: &LayerDesc,
        classes: &[String],
        now: TimePoint,
        transition: Option<PropertyTransition>,
        easing: Easing,
        reference_zoom: Option<f64>,
    ) {
        let mut names: HashSet<String> = layer.paint.keys().cloned().collect();
        for class in classes {
            if let Some(paint) = layer.class_paint.get(class) {
                names.extend(paint.keys().cloned());
            }
        }
        // Previously-known properties with no declaration left revert to
        // their defaults instead of silently keeping stale targets.
        names.extend(self.targets.keys().cloned());

        let mut new_targets = HashMap::with_capacity(names.len());
        for name in names {
            let mut resolved = layer.paint.get(&name);
            for class in classes {
                if let Some(value) = layer.class_paint.get(class).and_then(|p| p.get(&name)) {
                    resolved = Some(value);
                }
            }
            let target = resolved
                .cloned()
                .unwrap_or_else(|| PropertyValue::Constant(default_paint_value(&name)));

            if self.targets.get(&name) != Some(&target) {
                if !self.install_transition(&name, &target, now, transition, easing, reference_zoom)
                {
                    self.transitions.remove(&name);
                }
                // Bucket bookkeeping restarts from the new declaration.
                self.last_discrete.remove(&name);
            }
            new_targets.insert(name, target);
        }
        self.targets = new_targets;
    }

    fn install_transition(
        &mut self,
        name: &str,
        target: &PropertyValue,
        now: TimePoint,
        transition: Option<PropertyTransition>,
        easing: Easing,
        reference_zoom: Option<f64>,
    ) -> bool {
        let (Some(transition), Some(zoom)) = (transition, reference_zoom) else {
            return false;
        };
        if transition.is_instant() || !self.targets.contains_key(name) {
            return false;
        }
        let start_value = match self.evaluated.get(name) {
            Some(value) => value.clone(),
            None => self.targets[name].evaluate(zoom),
        };
        let end_value = target.evaluate(zoom);
        if start_value == end_value {
            return false;
        }
        self.transitions.insert(
            name.to_string(),
            ActiveTransition {
                start_value,
                end_value,
                start: now,
                duration: transition.duration,
                delay: transition.delay,
                easing,
            },
        );
        true
    }

    /// Evaluate every property at (`zoom`, `now`): sample the declared value,
    /// overridden by any in-flight transition. On an integer zoom crossing,
    /// discrete properties that moved to a new bucket get a fresh transition.
    /// Completed transitions are pruned. Returns true when any evaluated
    /// value changed since the previous pass.
    pub fn recalculate(
        &mut self,
        zoom: f64,
        now: TimePoint,
        crossed_integer_zoom: bool,
        transition: Option<PropertyTransition>,
        easing: Easing,
    ) -> bool {
        for (name, target) in &self.targets {
            if !target.is_discrete() {
                continue;
            }
            let bucket = target.evaluate(zoom);
            let moved = self.last_discrete.get(name).is_some_and(|old| *old != bucket);
            if crossed_integer_zoom && moved {
                if let Some(tr) = transition.filter(|t| !t.is_instant()) {
                    let start_value = self
                        .evaluated
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| self.last_discrete[name].clone());
                    if start_value != bucket {
                        self.transitions.insert(
                            name.clone(),
                            ActiveTransition {
                                start_value,
                                end_value: bucket.clone(),
                                start: now,
                                duration: tr.duration,
                                delay: tr.delay,
                                easing,
                            },
                        );
                    }
                }
            }
            self.last_discrete.insert(name.clone(), bucket);
        }

        let mut changed = false;
        for (name, target) in &self.targets {
            let value = match self.transitions.get(name) {
                Some(tr) if !tr.is_complete(now) => tr.sample(now),
                _ => target.evaluate(zoom),
            };
            if self.evaluated.get(name) != Some(&value) {
                changed = true;
                self.evaluated.insert(name.clone(), value);
            }
        }
        self.transitions.retain(|_, tr| !tr.is_complete(now));
        changed
    }

    pub fn evaluated(&self) -> &EvaluatedPaint {
        &self.evaluated
    }

    pub fn has_active_transitions(&self, now: TimePoint) -> bool {
        self.transitions.values().any(|tr| !tr.is_complete(now))
    }

    pub fn clear_transitions(&mut self) {
        self.transitions.clear();
    }
}
