//! Response schemas — one description drives both the `responseSchema` sent to
//! Gemini and the validation of whatever text comes back.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// First place a response diverged from its schema.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("response does not match schema at {path}: expected {expected}")]
pub struct SchemaViolation {
    pub path: String,
    pub expected: String,
}

/// A strict output shape. Every object property listed in `required` must be
/// present and non-null; properties are typed by primitive kind only.
#[derive(Debug, Clone)]
pub enum Schema {
    String { description: Option<&'static str> },
    Boolean,
    Array(Box<Schema>),
    Object {
        properties: Vec<(&'static str, Schema)>,
        required: Vec<&'static str>,
    },
}

impl Schema {
    pub fn string() -> Self {
        Schema::String { description: None }
    }

    pub fn described(description: &'static str) -> Self {
        Schema::String {
            description: Some(description),
        }
    }

    pub fn boolean() -> Self {
        Schema::Boolean
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array(Box::new(items))
    }

    pub fn string_list() -> Self {
        Schema::array(Schema::string())
    }

    /// Object whose properties are all required.
    pub fn object(properties: Vec<(&'static str, Schema)>) -> Self {
        let required = properties.iter().map(|(name, _)| *name).collect();
        Schema::Object {
            properties,
            required,
        }
    }

    /// Renders the Gemini `responseSchema` representation.
    pub fn to_json(&self) -> Value {
        match self {
            Schema::String { description } => match description {
                Some(d) => json!({ "type": "STRING", "description": d }),
                None => json!({ "type": "STRING" }),
            },
            Schema::Boolean => json!({ "type": "BOOLEAN" }),
            Schema::Array(items) => json!({ "type": "ARRAY", "items": items.to_json() }),
            Schema::Object {
                properties,
                required,
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.to_string(), schema.to_json()))
                    .collect();
                let ordering: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
                json!({
                    "type": "OBJECT",
                    "properties": props,
                    "required": required,
                    "propertyOrdering": ordering,
                })
            }
        }
    }

    /// Checks `value` against this schema.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let violation = |expected: &str| SchemaViolation {
            path: path.to_string(),
            expected: expected.to_string(),
        };

        match self {
            Schema::String { .. } => value.as_str().map(|_| ()).ok_or_else(|| violation("string")),
            Schema::Boolean => value.as_bool().map(|_| ()).ok_or_else(|| violation("boolean")),
            Schema::Array(items) => {
                let elements = value.as_array().ok_or_else(|| violation("array"))?;
                for (i, element) in elements.iter().enumerate() {
                    items.validate_at(element, &format!("{path}[{i}]"))?;
                }
                Ok(())
            }
            Schema::Object {
                properties,
                required,
            } => {
                let object = value.as_object().ok_or_else(|| violation("object"))?;
                for name in required {
                    match object.get(*name) {
                        None | Some(Value::Null) => {
                            return Err(SchemaViolation {
                                path: format!("{path}.{name}"),
                                expected: "required field".to_string(),
                            })
                        }
                        Some(_) => {}
                    }
                }
                for (name, schema) in properties {
                    match object.get(*name) {
                        Some(Value::Null) | None => {}
                        Some(field) => schema.validate_at(field, &format!("{path}.{name}"))?,
                    }
                }
                Ok(())
            }
        }
    }
}
