//! JavaScript bindings.

use crate::config::PlanConfig;
use crate::runner::PlanRunner;
use crate::types::{LearnerState, Topic, TopicSet};
use wasm_bindgen::prelude::*;

/// Plans one learner.
///
/// `topics` is an array of topic objects and `config` a (possibly
/// partial) [`PlanConfig`] object; missing fields take their defaults.
/// Returns the best [`crate::Solution`].
#[wasm_bindgen(js_name = planStudyPath)]
pub fn plan_study_path(topics: JsValue, ability: f64, config: JsValue) -> Result<JsValue, JsValue> {
    let topics: Vec<Topic> = serde_wasm_bindgen::from_value(topics)?;
    let config: PlanConfig = if config.is_undefined() || config.is_null() {
        PlanConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)?
    };

    let topics = TopicSet::new(topics).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let solution = PlanRunner::plan(&topics, &LearnerState::new(ability), &config)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    Ok(serde_wasm_bindgen::to_value(&solution)?)
}
