//! Typed access to function-call arguments.

use crate::error::RunError;

/// Parsed argument object of a function tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Parse the JSON-encoded argument string sent by the service.
    ///
    /// An empty or whitespace-only payload means "no arguments".
    pub fn parse(raw: &str) -> Result<Self, RunError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::new(serde_json::json!({})));
        }
        serde_json::from_str(trimmed)
            .map(Self::new)
            .map_err(|e| RunError::InvalidArgument(format!("Malformed tool arguments: {e}")))
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, RunError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| RunError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, RunError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| RunError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, RunError> {
        self.value
            .get(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| RunError::InvalidArgument(format!("Missing number argument: {key}")))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, RunError> {
        self.value
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| RunError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    /// Deserialize the entire argument object into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, RunError> {
        serde_json::from_value(self.value.clone())
            .map_err(|e| RunError::InvalidArgument(format!("Failed to deserialize arguments: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_parses_as_empty_object() {
        let args = ToolArguments::parse("  ").unwrap();
        assert_eq!(args.raw(), &serde_json::json!({}));
    }

    #[test]
    fn malformed_payload_is_invalid_argument() {
        assert!(matches!(
            ToolArguments::parse("{\"location\":"),
            Err(RunError::InvalidArgument(_))
        ));
    }

    #[test]
    fn typed_getters() {
        let args = ToolArguments::parse(r#"{"location":"Seattle","days":3,"metric":true}"#).unwrap();
        assert_eq!(args.get_str("location").unwrap(), "Seattle");
        assert_eq!(args.get_i64("days").unwrap(), 3);
        assert!(args.get_bool("metric").unwrap());
        assert_eq!(args.get_str_opt("unit"), None);
        assert!(args.get_str("unit").is_err());
    }
}
