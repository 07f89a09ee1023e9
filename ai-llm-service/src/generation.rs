//! Provider-agnostic structured generation.
//!
//! A [`StructuredRequest`] carries the system instruction, the user prompt
//! and a [`ResponseSchema`]; each provider renders the schema into its own
//! dialect (Gemini `responseSchema`, OpenAI `json_schema`).

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::{config::llm_provider::LlmProvider, error_handler::Result};

/// One string property of the requested JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// Declared shape of the JSON object the model must return.
///
/// Only flat objects of string properties are supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSchema {
    /// Schema name (OpenAI requires one; Gemini ignores it).
    pub name: &'static str,
    pub fields: Vec<SchemaField>,
}

impl ResponseSchema {
    /// Names of the required fields, in declaration order.
    pub fn required(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect()
    }

    /// Gemini OpenAPI-subset schema (`type: "OBJECT"`, upper-case types).
    pub fn to_gemini(&self) -> Value {
        let mut props = Map::new();
        for f in &self.fields {
            props.insert(
                f.name.to_string(),
                json!({ "type": "STRING", "description": f.description }),
            );
        }
        json!({
            "type": "OBJECT",
            "properties": props,
            "required": self.required(),
            "propertyOrdering": self.fields.iter().map(|f| f.name).collect::<Vec<_>>(),
        })
    }

    /// JSON Schema for OpenAI strict structured outputs.
    pub fn to_json_schema(&self) -> Value {
        let mut props = Map::new();
        for f in &self.fields {
            props.insert(
                f.name.to_string(),
                json!({ "type": "string", "description": f.description }),
            );
        }
        json!({
            "type": "object",
            "properties": props,
            "required": self.required(),
            "additionalProperties": false,
        })
    }
}

/// A single structured-generation call.
#[derive(Debug, Clone, Copy)]
pub struct StructuredRequest<'a> {
    /// System-level instruction channel (persona, rules).
    pub system: Option<&'a str>,
    /// User content.
    pub prompt: &'a str,
    /// Required output shape.
    pub schema: &'a ResponseSchema,
}

/// Capability shared by every provider client: one prompt in, one JSON-bearing
/// string out.
///
/// Implementations perform exactly one HTTP request per call and never retry.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    fn provider(&self) -> LlmProvider;

    fn model(&self) -> &str;

    /// Returns the text of the first candidate, expected to be a JSON document
    /// matching `req.schema`.
    ///
    /// # Errors
    /// Transport, status, decode and empty-candidate failures as [`crate::AiLlmError`].
    async fn generate(&self, req: &StructuredRequest<'_>) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ResponseSchema {
        ResponseSchema {
            name: "answer",
            fields: vec![
                SchemaField {
                    name: "reply",
                    description: "text",
                    required: true,
                },
                SchemaField {
                    name: "hint",
                    description: "optional",
                    required: false,
                },
            ],
        }
    }

    #[test]
    fn gemini_dialect_uses_upper_case_types() {
        let v = schema().to_gemini();
        assert_eq!(v["type"], "OBJECT");
        assert_eq!(v["properties"]["reply"]["type"], "STRING");
        assert_eq!(v["required"], json!(["reply"]));
        assert_eq!(v["propertyOrdering"], json!(["reply", "hint"]));
    }

    #[test]
    fn json_schema_dialect_is_closed() {
        let v = schema().to_json_schema();
        assert_eq!(v["type"], "object");
        assert_eq!(v["properties"]["hint"]["type"], "string");
        assert_eq!(v["additionalProperties"], false);
    }
}
