//! Feature hit-testing against the last composed snapshot.

use std::collections::HashSet;

use tile::Feature;

use crate::render::RenderData;

/// A hit-test request in the same projected space as the delivered features.
#[derive(Debug, Clone, Default)]
pub struct QueryParameters {
    pub x: f64,
    pub y: f64,
    /// Extra tolerance added to the style's own query radius.
    pub radius: f64,
    /// Restrict matches to these layer ids; empty means all layers.
    pub layer_ids: Vec<String>,
}

impl QueryParameters {
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, ..Self::default() }
    }
}

/// One matched feature, tagged with the layer that claimed it.
#[derive(Debug, Clone)]
pub struct QueriedFeature {
    pub layer_id: String,
    pub source_id: Option<String>,
    pub source_layer: String,
    pub feature: Feature,
}

/// Walk the snapshot in reverse draw order (topmost layer first) and collect
/// features within `base_radius + params.radius` of the query point. A
/// feature with an id is claimed by the topmost layer containing it;
/// features without ids cannot be deduplicated and match per layer.
pub fn query_rendered_features(
    render: &RenderData,
    params: &QueryParameters,
    base_radius: f64,
) -> Vec<QueriedFeature> {
    let radius = base_radius + params.radius;
    let mut results = Vec::new();
    let mut claimed: HashSet<(Option<String>, String, u64)> = HashSet::new();

    for item in render.order.iter().rev() {
        if !params.layer_ids.is_empty()
            && !params.layer_ids.iter().any(|id| *id == item.layer.id)
        {
            continue;
        }
        let Some(bucket) = &item.bucket else {
            continue;
        };
        for feature in &bucket.features {
            let distance = (feature.x - params.x).hypot(feature.y - params.y);
            if distance > radius {
                continue;
            }
            if let Some(id) = feature.id {
                let key = (item.layer.source.clone(), feature.source_layer.clone(), id);
                if !claimed.insert(key) {
                    continue;
                }
            }
            results.push(QueriedFeature {
                layer_id: item.layer.id.clone(),
                source_id: item.layer.source.clone(),
                source_layer: feature.source_layer.clone(),
                feature: feature.clone(),
            });
        }
    }
    results
}
