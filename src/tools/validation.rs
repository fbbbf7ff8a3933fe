//! Check function-call arguments against the tool's parameter schema.

use crate::error::RunError;

use super::parameters::ToolParameters;

/// Top-level schema check: object shape, required fields, property types.
///
/// Nested schemas are not descended into.
pub fn validate_arguments(
    tool_name: &str,
    args: &serde_json::Value,
    parameters: &ToolParameters,
) -> Result<(), RunError> {
    let schema = &parameters.schema;
    let invalid = |reason: String| -> Result<(), RunError> {
        Err(RunError::InvalidArgument(format!("{tool_name}: {reason}")))
    };

    let Some(object) = args.as_object() else {
        if schema.get("type").and_then(|t| t.as_str()) == Some("object") {
            return invalid(format!("expected object arguments, got {}", json_type_name(args)));
        }
        return Ok(());
    };

    let required = schema
        .get("required")
        .and_then(|r| r.as_array())
        .into_iter()
        .flatten()
        .filter_map(|field| field.as_str());
    for field in required {
        if !object.contains_key(field) {
            return invalid(format!("missing required field '{field}'"));
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };
    for (key, value) in object {
        let expected = properties
            .get(key)
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str());
        if let Some(expected) = expected {
            if !value_matches_type(value, expected) {
                return invalid(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    json_type_name(value)
                ));
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &serde_json::Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn location_params() -> ToolParameters {
        ToolParameters::object()
            .string("location", "City name", true)
            .integer("days", "Forecast length", false)
            .build()
    }

    #[test]
    fn accepts_matching_arguments() {
        let args = json!({ "location": "Seattle", "days": 2 });
        assert!(validate_arguments("forecast", &args, &location_params()).is_ok());
    }

    #[test]
    fn rejects_missing_required_field() {
        let err = validate_arguments("forecast", &json!({}), &location_params()).unwrap_err();
        assert!(err.to_string().contains("missing required field 'location'"));
    }

    #[test]
    fn rejects_wrong_property_type() {
        let args = json!({ "location": "Seattle", "days": "two" });
        let err = validate_arguments("forecast", &args, &location_params()).unwrap_err();
        assert!(err.to_string().contains("field 'days' expected type 'integer'"));
    }

    #[test]
    fn rejects_non_object_arguments() {
        let err = validate_arguments("forecast", &json!([1, 2]), &location_params()).unwrap_err();
        assert!(err.to_string().contains("expected object arguments, got array"));
    }
}
