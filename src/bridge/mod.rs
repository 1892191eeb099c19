//! Conversions between YAML text and JSON text.
//!
//! YAML to JSON goes through [`Value`], so mapping keys are stringified and
//! anything JSON cannot hold (non-finite floats, collection keys) is an
//! error. JSON to YAML keeps the key order of the input.

use serde_json::Value as JsonValue;

use crate::decode::parse;
use crate::encode::encode_with_options;
use crate::options::{DecodeOptions, EncodeOptions};
use crate::value::Value;
use crate::Result;

pub use crate::value::json_object_to_yaml_object;

/// Converts the first YAML document of `input` to compact JSON. Duplicate
/// keys resolve to their last value.
pub fn yaml_to_json(input: &str) -> Result<String> {
    yaml_to_json_with_options(input, &DecodeOptions::default())
}

/// Like [`yaml_to_json`], but a duplicate mapping key is an error.
pub fn yaml_to_json_strict(input: &str) -> Result<String> {
    yaml_to_json_with_options(input, &DecodeOptions::strict())
}

pub fn yaml_to_json_with_options(input: &str, options: &DecodeOptions) -> Result<String> {
    let json = yaml_to_json_value(input, options)?;
    Ok(serde_json::to_string(&json)?)
}

/// The JSON value of the first YAML document of `input`.
pub fn yaml_to_json_value(input: &str, options: &DecodeOptions) -> Result<JsonValue> {
    let tree = parse(input)?;
    let value = Value::from_tree(&tree, options.strict)?;
    let json = if options.strict {
        value.to_json_strict()?
    } else {
        value.to_json()?
    };
    tracing::debug!(
        strict = options.strict,
        nodes = tree.arena.len(),
        "converted yaml to json"
    );
    Ok(json)
}

/// Converts JSON text to YAML with canonical styles.
pub fn json_to_yaml(input: &str) -> Result<String> {
    json_to_yaml_with_options(input, &EncodeOptions::default())
}

pub fn json_to_yaml_with_options(input: &str, options: &EncodeOptions) -> Result<String> {
    let json: JsonValue = serde_json::from_str(input)?;
    let tree = Value::from(json).to_tree();
    tracing::debug!(nodes = tree.arena.len(), "converted json to yaml");
    encode_with_options(&tree, options)
}
