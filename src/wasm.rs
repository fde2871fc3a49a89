//! WASM bindings for browser extension.

use wasm_bindgen::prelude::*;

use crate::grouper::{group_duplicates_with_report, GroupingOutput};
use crate::models::Record;
use crate::record_merge::{calculate_merge, merge_group, GroupMergePlan};

/// Initialize panic hook for better error messages.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Domain WASM Bindings
// ═══════════════════════════════════════════════════════════════════════════════

/// Extract the registrable domain from a URL.
///
/// E.g., "https://mail.google.com" -> "google.com"
/// E.g., "www.bbc.co.uk" -> "bbc.co.uk"
#[wasm_bindgen(js_name = normalizeDomain)]
pub fn normalize_domain_js(url: &str) -> Result<String, JsValue> {
    crate::domain::normalize_domain(url).map_err(|e| JsValue::from_str(&e.to_string()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Grouping WASM Bindings
// ═══════════════════════════════════════════════════════════════════════════════

/// Group records into duplicate groups.
///
/// Takes a JsValue (Record[]) and returns a JsValue (GroupingOutput).
#[wasm_bindgen(js_name = groupDuplicates)]
pub fn group_duplicates_js(input: JsValue) -> Result<JsValue, JsValue> {
    let records: Vec<Record> = serde_wasm_bindgen::from_value(input)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse input: {}", e)))?;

    let output: GroupingOutput = group_duplicates_with_report(&records);

    serde_wasm_bindgen::to_value(&output)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize output: {}", e)))
}

/// Group records using JSON strings (alternative API).
#[wasm_bindgen(js_name = groupDuplicatesJson)]
pub fn group_duplicates_json_js(input_json: &str) -> Result<String, JsValue> {
    crate::grouper::group_duplicates_json(input_json)
        .map_err(|e| JsValue::from_str(&format!("Grouping failed: {}", e)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Merge WASM Bindings
// ═══════════════════════════════════════════════════════════════════════════════

/// Merge one duplicate group.
///
/// Takes a JsValue (Record[]) and returns a JsValue (GroupMergePlan).
#[wasm_bindgen(js_name = mergeGroup)]
pub fn merge_group_js(input: JsValue) -> Result<JsValue, JsValue> {
    let group: Vec<Record> = serde_wasm_bindgen::from_value(input)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse input: {}", e)))?;

    let plan: GroupMergePlan = merge_group(&group)
        .map_err(|e| JsValue::from_str(&format!("Merge failed: {}", e)))?;

    serde_wasm_bindgen::to_value(&plan)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize output: {}", e)))
}

/// Merge one duplicate group using JSON strings (alternative API).
#[wasm_bindgen(js_name = mergeGroupJson)]
pub fn merge_group_json_js(input_json: &str) -> Result<String, JsValue> {
    crate::record_merge::merge_group_json(input_json)
        .map_err(|e| JsValue::from_str(&format!("Merge failed: {}", e)))
}

/// Merge a single loser into a winner.
///
/// Takes two JsValues (Record) and returns a JsValue (Record).
#[wasm_bindgen(js_name = calculateMerge)]
pub fn calculate_merge_js(winner: JsValue, loser: JsValue) -> Result<JsValue, JsValue> {
    let winner: Record = serde_wasm_bindgen::from_value(winner)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse winner: {}", e)))?;
    let loser: Record = serde_wasm_bindgen::from_value(loser)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse loser: {}", e)))?;

    let merged = calculate_merge(&winner, &loser)
        .map_err(|e| JsValue::from_str(&format!("Merge failed: {}", e)))?;

    serde_wasm_bindgen::to_value(&merged)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize output: {}", e)))
}
