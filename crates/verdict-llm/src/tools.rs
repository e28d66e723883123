//! Tool definitions offered to the model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool the model may ask to call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the name in the tool registry)
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Helpers to build JSON schemas
pub mod schema {
    use serde_json::{Value, json};

    /// Object with properties
    ///
    /// ```
    /// use verdict_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({ "ticker": schema::string("Ticker symbol") }),
    ///     vec!["ticker"],
    /// );
    /// assert_eq!(schema["required"][0], "ticker");
    /// ```
    pub fn object(properties: Value, required: Vec<&str>) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn string(description: &str) -> Value {
        json!({ "type": "string", "description": description })
    }

    pub fn number(description: &str) -> Value {
        json!({ "type": "number", "description": description })
    }

    pub fn integer(description: &str) -> Value {
        json!({ "type": "integer", "description": description })
    }

    /// String restricted to a set of values
    pub fn string_enum(description: &str, values: &[&str]) -> Value {
        json!({ "type": "string", "description": description, "enum": values })
    }

    /// Array of items matching `items`
    pub fn array(description: &str, items: Value) -> Value {
        json!({ "type": "array", "description": description, "items": items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition() {
        let def = ToolDefinition::new(
            "fetch_price_history",
            "Daily OHLCV bars",
            schema::object(json!({"period": schema::string("e.g. 1mo")}), vec![]),
        );
        assert_eq!(def.input_schema["type"], "object");
        assert_eq!(def.input_schema["properties"]["period"]["type"], "string");
    }

    #[test]
    fn test_enum_schema() {
        let s = schema::string_enum("timeframe", &["near-term", "long-term"]);
        assert_eq!(s["enum"][1], "long-term");
    }
}
