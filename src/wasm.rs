use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn project_json_to_ruby(project_json: &str) -> Result<String, JsValue> {
    project_json_to_ruby_for_target(project_json, None)
}

#[wasm_bindgen]
pub fn project_json_to_ruby_for_target(
    project_json: &str,
    target: Option<String>,
) -> Result<String, JsValue> {
    crate::convert_project_json(project_json, target.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
