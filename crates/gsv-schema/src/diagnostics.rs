//! # Structured Diagnostics
//!
//! One [`Diagnostic`] per violated constraint, in the
//! `{instancePath, schemaPath, keyword, params, message}` shape that
//! assertion messages embed. Diagnostics come from two producers:
//!
//! - the `jsonschema` crate, for types, required fields, enums, formats,
//!   and closed or schema-typed `additionalProperties`;
//! - [`check_scalar_additional_properties`], an explicit ordered check for
//!   the scalar-only additional-property policy. A non-scalar value yields
//!   one `type` record per scalar type, in [`SCALAR_TYPES`] order, followed
//!   by one `anyOf` summary record.
//!
//! Paths are JSON pointers; schema paths carry a leading `#`.

use jsonschema::error::ValidationErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::merge::SCALAR_TYPES;

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// JSON pointer to the violating value in the graph object.
    pub instance_path: String,
    /// `#`-prefixed JSON pointer to the violated schema keyword.
    pub schema_path: String,
    /// The violated keyword (`type`, `required`, `anyOf`, ...).
    pub keyword: String,
    /// Keyword-specific detail (`{"type": "string"}`, `{"missingProperty": "x"}`).
    pub params: Value,
    /// Human-readable description.
    pub message: String,
}

/// Convert one `jsonschema` error into diagnostics.
///
/// A closed-schema violation listing several unexpected properties becomes
/// one diagnostic per property.
pub(crate) fn from_validation_error(
    error: &jsonschema::ValidationError<'_>,
    schema: &Value,
) -> Vec<Diagnostic> {
    let instance_path = error.instance_path.to_string();
    let raw_schema_path = error.schema_path.to_string();
    let keyword = raw_schema_path.rsplit('/').next().unwrap_or_default().to_string();
    let schema_path = format!("#{raw_schema_path}");

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            vec![Diagnostic {
                instance_path,
                schema_path,
                keyword,
                message: format!("must have required property '{name}'"),
                params: json!({ "missingProperty": name }),
            }]
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|name| Diagnostic {
                instance_path: instance_path.clone(),
                schema_path: schema_path.clone(),
                keyword: keyword.clone(),
                params: json!({ "additionalProperty": name }),
                message: "must NOT have additional properties".to_string(),
            })
            .collect(),
        _ => {
            let constraint = schema.pointer(&raw_schema_path);
            let (params, message) = match (keyword.as_str(), constraint) {
                ("type", Some(types)) => (
                    json!({ "type": types }),
                    format!("must be {}", type_names(types)),
                ),
                ("enum", Some(options)) => (
                    json!({ "allowedValues": options }),
                    "must be equal to one of the allowed values".to_string(),
                ),
                ("const", Some(expected)) => (
                    json!({ "allowedValue": expected }),
                    "must be equal to constant".to_string(),
                ),
                ("format", Some(format)) => (
                    json!({ "format": format }),
                    format!("must match format \"{}\"", format.as_str().unwrap_or_default()),
                ),
                ("pattern", Some(pattern)) => (
                    json!({ "pattern": pattern }),
                    format!("must match pattern {pattern}"),
                ),
                ("minLength", Some(limit)) => (
                    json!({ "limit": limit }),
                    format!("must NOT have fewer than {limit} characters"),
                ),
                ("maxLength", Some(limit)) => (
                    json!({ "limit": limit }),
                    format!("must NOT have more than {limit} characters"),
                ),
                ("minItems", Some(limit)) => (
                    json!({ "limit": limit }),
                    format!("must NOT have fewer than {limit} items"),
                ),
                ("maxItems", Some(limit)) => (
                    json!({ "limit": limit }),
                    format!("must NOT have more than {limit} items"),
                ),
                ("minimum", Some(limit)) => (
                    json!({ "comparison": ">=", "limit": limit }),
                    format!("must be >= {limit}"),
                ),
                ("maximum", Some(limit)) => (
                    json!({ "comparison": "<=", "limit": limit }),
                    format!("must be <= {limit}"),
                ),
                ("anyOf", _) => (json!({}), "must match a schema in anyOf".to_string()),
                ("oneOf", _) => (
                    json!({ "passingSchemas": Value::Null }),
                    "must match exactly one schema in oneOf".to_string(),
                ),
                _ => (json!({}), error.to_string()),
            };
            vec![Diagnostic {
                instance_path,
                schema_path,
                keyword,
                params,
                message,
            }]
        }
    }
}

/// Check every undeclared property of `object` against the five scalar
/// JSON types.
///
/// Property names are visited in the object's iteration order. A property
/// that matches none of the scalar types yields one `type` diagnostic per
/// scalar type followed by one `anyOf` diagnostic; a scalar property yields
/// nothing.
pub fn check_scalar_additional_properties(
    object: &Map<String, Value>,
    declared: &Map<String, Value>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (name, value) in object {
        if declared.contains_key(name) {
            continue;
        }
        if SCALAR_TYPES.iter().any(|t| is_json_type(value, t)) {
            continue;
        }
        let instance_path = format!("/{}", escape_pointer_token(name));
        for (index, scalar) in SCALAR_TYPES.iter().enumerate() {
            diagnostics.push(Diagnostic {
                instance_path: instance_path.clone(),
                schema_path: format!("#/additionalProperties/anyOf/{index}/type"),
                keyword: "type".to_string(),
                params: json!({ "type": scalar }),
                message: format!("must be {scalar}"),
            });
        }
        diagnostics.push(Diagnostic {
            instance_path,
            schema_path: "#/additionalProperties/anyOf".to_string(),
            keyword: "anyOf".to_string(),
            params: json!({}),
            message: "must match a schema in anyOf".to_string(),
        });
    }
    diagnostics
}

/// JSON-schema type test. Integral floats (`1.0`) count as integers.
fn is_json_type(value: &Value, json_type: &str) -> bool {
    match json_type {
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => match value {
            Value::Number(n) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            _ => false,
        },
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => false,
    }
}

fn type_names(types: &Value) -> String {
    match types {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// RFC 6901 reference-token escaping.
fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
