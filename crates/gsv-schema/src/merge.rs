//! # Schema Merging
//!
//! Combines the class schemas named by a graph object's `_class` list, plus
//! an optional caller override, into the single schema one validation call
//! enforces. The merged schema is computed fresh per call and never cached.
//!
//! ## Merge Rules
//!
//! 1. Classes are looked up in order. The first unknown class fails the
//!    whole merge; no partial schema is returned.
//! 2. `required` is the union of every class's required list, deduplicated
//!    in first-seen order.
//! 3. `properties` takes each new property's descriptor as declared. When a
//!    later class declares a property again, the declared JSON types are
//!    unioned (deduplicated, first-seen order) and every other facet
//!    (`format`, `enum`, `items`, ...) stays as the first class declared it.
//!    Union applies only when both descriptors declare `type`.
//! 4. An override replaces `additionalProperties` outright, replaces
//!    same-named property descriptors outright, and appends its `required`
//!    entries.
//! 5. Entity schemas default to `additionalProperties: false`. The fixed
//!    direct-relationship schema defaults to "any of the five scalar JSON
//!    types".

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::registry::{push_unique, SchemaRegistry};

/// The draft every merged schema declares.
pub const JSON_SCHEMA_DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// The JSON types an additional property may take under the scalar-only
/// policy, in the order their diagnostics are reported.
pub const SCALAR_TYPES: [&str; 5] = ["boolean", "integer", "null", "number", "string"];

/// Fields every direct relationship must carry, in reporting order.
pub const RELATIONSHIP_REQUIRED_FIELDS: [&str; 5] =
    ["_class", "_type", "_key", "_toEntityKey", "_fromEntityKey"];

/// A class list could not be resolved against the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaResolutionError {
    /// The registry does not know the class.
    #[error("Invalid _class passed in schema for \"{assertion}\" (_class=#{class_name})")]
    UnknownClass {
        /// Name of the assertion that requested the merge.
        assertion: String,
        /// The literal unresolved class name.
        class_name: String,
    },
}

/// Policy for properties not declared in `properties`.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// `additionalProperties: false`.
    Forbidden,
    /// `additionalProperties: true`.
    Allowed,
    /// Any of the five scalar JSON types; arrays and objects rejected.
    ScalarOnly,
    /// Any other subschema, enforced as written.
    Schema(Value),
}

impl AdditionalProperties {
    /// The `anyOf` subschema the scalar-only policy stands for.
    pub fn scalar_any_of() -> Value {
        let branches: Vec<Value> = SCALAR_TYPES.iter().map(|t| json!({ "type": t })).collect();
        json!({ "anyOf": branches })
    }

    /// Interpret a JSON `additionalProperties` value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(false) => Self::Forbidden,
            Value::Bool(true) => Self::Allowed,
            other if *other == Self::scalar_any_of() => Self::ScalarOnly,
            other => Self::Schema(other.clone()),
        }
    }

    /// The JSON `additionalProperties` value for this policy.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Forbidden => Value::Bool(false),
            Self::Allowed => Value::Bool(true),
            Self::ScalarOnly => Self::scalar_any_of(),
            Self::Schema(schema) => schema.clone(),
        }
    }
}

/// A caller-supplied partial schema applied on top of the merged classes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaOverride {
    /// Property descriptors that replace same-named merged descriptors.
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Additional required property names.
    #[serde(default)]
    pub required: Vec<String>,
    /// Replacement `additionalProperties` value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Value>,
}

impl SchemaOverride {
    /// Parse an override from a JSON schema fragment.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the fragment's `properties`,
    /// `required`, or `additionalProperties` have the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

/// The schema enforced for one validation call.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSchema {
    /// Classes the schema was merged from, in order. Empty for the fixed
    /// relationship schema.
    pub classes: Vec<String>,
    /// Property name → descriptor.
    pub properties: Map<String, Value>,
    /// Required property names, deduplicated, first-seen order.
    pub required: Vec<String>,
    /// Policy for undeclared properties.
    pub additional_properties: AdditionalProperties,
}

impl MergedSchema {
    /// Render the complete draft-07 schema document.
    pub fn to_json_schema(&self) -> Value {
        let mut doc = self.structural_document();
        doc.insert("$schema".to_string(), Value::String(JSON_SCHEMA_DRAFT_07.to_string()));
        doc.insert("additionalProperties".to_string(), self.additional_properties.to_value());
        Value::Object(doc)
    }

    /// The document handed to the structural validator. The scalar-only
    /// policy is checked separately so its diagnostics keep a fixed shape,
    /// so it is left out here.
    pub(crate) fn structural_schema(&self) -> Value {
        let mut doc = self.structural_document();
        if self.additional_properties != AdditionalProperties::ScalarOnly {
            doc.insert("additionalProperties".to_string(), self.additional_properties.to_value());
        }
        Value::Object(doc)
    }

    fn structural_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("type".to_string(), Value::String("object".to_string()));
        doc.insert("properties".to_string(), Value::Object(self.properties.clone()));
        doc.insert(
            "required".to_string(),
            Value::Array(self.required.iter().cloned().map(Value::String).collect()),
        );
        doc
    }

    /// Apply a caller override in place.
    pub fn apply_override(&mut self, schema_override: &SchemaOverride) {
        for (name, descriptor) in &schema_override.properties {
            self.properties.insert(name.clone(), descriptor.clone());
        }
        for name in &schema_override.required {
            push_unique(&mut self.required, name.clone());
        }
        if let Some(ap) = &schema_override.additional_properties {
            self.additional_properties = AdditionalProperties::from_value(ap);
        }
    }
}

/// Merges class schemas from a registry.
#[derive(Clone, Copy)]
pub struct SchemaMerger<'a> {
    registry: &'a dyn SchemaRegistry,
    assertion: &'a str,
}

impl<'a> SchemaMerger<'a> {
    /// A merger reading from `registry`, reporting failures on behalf of
    /// `assertion`.
    pub fn new(registry: &'a dyn SchemaRegistry, assertion: &'a str) -> Self {
        Self { registry, assertion }
    }

    /// Merge the named classes and apply the optional override.
    ///
    /// # Errors
    ///
    /// Returns `SchemaResolutionError::UnknownClass` for the first class the
    /// registry does not know.
    pub fn merge(
        &self,
        class_names: &[String],
        schema_override: Option<&SchemaOverride>,
    ) -> Result<MergedSchema, SchemaResolutionError> {
        let mut resolved = Vec::with_capacity(class_names.len());
        for class_name in class_names {
            let schema = self.registry.lookup(class_name).ok_or_else(|| {
                SchemaResolutionError::UnknownClass {
                    assertion: self.assertion.to_string(),
                    class_name: class_name.clone(),
                }
            })?;
            resolved.push(schema);
        }

        let mut merged = MergedSchema {
            classes: class_names.to_vec(),
            properties: Map::new(),
            required: Vec::new(),
            additional_properties: AdditionalProperties::Forbidden,
        };

        for schema in &resolved {
            for name in &schema.required {
                push_unique(&mut merged.required, name.clone());
            }
            for (name, descriptor) in &schema.properties {
                match merged.properties.get_mut(name) {
                    Some(existing) => union_types(existing, descriptor),
                    None => {
                        merged.properties.insert(name.clone(), descriptor.clone());
                    }
                }
            }
        }

        if let Some(schema_override) = schema_override {
            merged.apply_override(schema_override);
        }
        Ok(merged)
    }
}

impl std::fmt::Debug for SchemaMerger<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaMerger")
            .field("assertion", &self.assertion)
            .finish_non_exhaustive()
    }
}

/// The fixed, registry-independent schema for direct relationships.
///
/// Requires `_class`, `_type`, `_key`, `_toEntityKey`, and `_fromEntityKey`
/// as strings; every other property must be a scalar.
pub fn relationship_base_schema() -> MergedSchema {
    let mut properties = Map::new();
    for field in RELATIONSHIP_REQUIRED_FIELDS {
        properties.insert(field.to_string(), json!({ "type": "string" }));
    }
    MergedSchema {
        classes: Vec::new(),
        properties,
        required: RELATIONSHIP_REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
        additional_properties: AdditionalProperties::ScalarOnly,
    }
}

/// Union `incoming`'s declared types into `existing`, leaving every other
/// facet of `existing` untouched.
fn union_types(existing: &mut Value, incoming: &Value) {
    let (Some(current), Some(added)) = (existing.get("type"), incoming.get("type")) else {
        return;
    };
    let mut types = type_list(current);
    for t in type_list(added) {
        push_unique(&mut types, t);
    }
    let merged = if types.len() == 1 {
        Value::String(types.remove(0))
    } else {
        Value::Array(types.into_iter().map(Value::String).collect())
    };
    if let Some(obj) = existing.as_object_mut() {
        obj.insert("type".to_string(), merged);
    }
}

fn type_list(declared: &Value) -> Vec<String> {
    match declared {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().filter_map(|t| t.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}
