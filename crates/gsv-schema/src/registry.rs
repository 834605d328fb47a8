//! # Schema Registry
//!
//! Maps a taxonomy class name to its canonical class schema. The registry
//! is the only source of class schemas the merger consults; the engine
//! treats it as read-only and never caches what it returns, so a registry
//! that changes between calls is observed by the next call.
//!
//! ## Document Shapes
//!
//! Class schema documents are accepted in two shapes:
//!
//! - **Flat:** `properties`, `required`, and optionally `additionalProperties`
//!   at the top level.
//! - **Data-model style:** an `allOf` list mixing `{"$ref": "#Parent"}`
//!   entries with inline fragments. Entries are flattened in order; a
//!   `$ref` pulls in the fully flattened parent class first.
//!
//! Both shapes may appear in one registry. Unresolvable references and
//! reference cycles are reported when the registry is built, never at
//! lookup time.
//!
//! ## Class Naming
//!
//! A document's class name is its `$id` with the leading `#` stripped (or
//! the last URI segment without `.json`), else its `title`, else the file
//! stem for directory-loaded documents.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error while loading or flattening class schema documents.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A schema document could not be read or parsed.
    #[error("schema load error for '{source_name}': {reason}")]
    Load {
        /// File path or document identifier.
        source_name: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// A document's shape is not a class schema.
    #[error("invalid class schema '{class_name}': {reason}")]
    InvalidDocument {
        /// Class the document was registered under.
        class_name: String,
        /// What is wrong with the document.
        reason: String,
    },

    /// Two documents declare the same class name.
    #[error("class '{class_name}' is declared more than once")]
    DuplicateClass {
        /// The repeated class name.
        class_name: String,
    },

    /// An `allOf` entry references a class that is not registered.
    #[error("class '{class_name}' references unknown class '{reference}'")]
    UnresolvedReference {
        /// Class whose document holds the reference.
        class_name: String,
        /// The referenced class name.
        reference: String,
    },

    /// Class references form a cycle.
    #[error("class reference cycle: {}", chain.join(" -> "))]
    ReferenceCycle {
        /// Classes on the cycle, starting and ending with the same name.
        chain: Vec<String>,
    },

    /// IO error reading the schema directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The canonical schema fragment for one taxonomy class, with inherited
/// fragments already flattened in.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSchema {
    /// Taxonomy class name.
    pub class_name: String,
    /// Property name → property descriptor, in declaration order.
    pub properties: Map<String, Value>,
    /// Required property names, deduplicated, first-seen order.
    pub required: Vec<String>,
    /// The class document's own `additionalProperties`, if declared.
    ///
    /// Informational: merged entity schemas are closed unless a caller
    /// override says otherwise.
    pub additional_properties: Option<Value>,
}

impl ClassSchema {
    /// An empty class schema.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            properties: Map::new(),
            required: Vec::new(),
            additional_properties: None,
        }
    }

    /// Declare a property.
    pub fn with_property(mut self, name: impl Into<String>, descriptor: Value) -> Self {
        self.properties.insert(name.into(), descriptor);
        self
    }

    /// Mark a property as required.
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.required, name.into());
        self
    }

    /// Render this class schema as a flat JSON document.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("$id".to_string(), Value::String(format!("#{}", self.class_name)));
        doc.insert("properties".to_string(), Value::Object(self.properties.clone()));
        doc.insert(
            "required".to_string(),
            Value::Array(self.required.iter().cloned().map(Value::String).collect()),
        );
        if let Some(ap) = &self.additional_properties {
            doc.insert("additionalProperties".to_string(), ap.clone());
        }
        Value::Object(doc)
    }

    /// Fold one flat fragment (`properties`/`required`/`additionalProperties`)
    /// into this schema. Later fragments override same-named properties.
    fn absorb_fragment(&mut self, fragment: &Value) -> Result<(), RegistryError> {
        if let Some(props) = fragment.get("properties") {
            let props = props.as_object().ok_or_else(|| RegistryError::InvalidDocument {
                class_name: self.class_name.clone(),
                reason: "'properties' must be an object".to_string(),
            })?;
            for (name, descriptor) in props {
                self.properties.insert(name.clone(), descriptor.clone());
            }
        }
        if let Some(required) = fragment.get("required") {
            let required = required.as_array().ok_or_else(|| RegistryError::InvalidDocument {
                class_name: self.class_name.clone(),
                reason: "'required' must be an array".to_string(),
            })?;
            for name in required {
                let name = name.as_str().ok_or_else(|| RegistryError::InvalidDocument {
                    class_name: self.class_name.clone(),
                    reason: format!("'required' entries must be strings, got {name}"),
                })?;
                push_unique(&mut self.required, name.to_string());
            }
        }
        if let Some(ap) = fragment.get("additionalProperties") {
            self.additional_properties = Some(ap.clone());
        }
        Ok(())
    }

    /// Fold an already-flattened parent class into this schema.
    fn absorb_parent(&mut self, parent: &ClassSchema) {
        for (name, descriptor) in &parent.properties {
            self.properties.insert(name.clone(), descriptor.clone());
        }
        for name in &parent.required {
            push_unique(&mut self.required, name.clone());
        }
        if parent.additional_properties.is_some() {
            self.additional_properties = parent.additional_properties.clone();
        }
    }
}

/// Source of canonical class schemas.
///
/// Implementations must be safe to share across concurrently running test
/// cases. `lookup` returns an owned snapshot of the class as it is at the
/// moment of the call.
pub trait SchemaRegistry: Send + Sync {
    /// Look up a class schema by taxonomy class name.
    fn lookup(&self, class_name: &str) -> Option<ClassSchema>;

    /// All registered class names, sorted.
    fn class_names(&self) -> Vec<String>;
}

/// A mutable in-memory registry.
///
/// Insertions and removals are visible to the next lookup.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    classes: RwLock<BTreeMap<String, ClassSchema>>,
}

impl InMemoryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from raw class schema documents, flattening
    /// `allOf` references between them.
    ///
    /// # Errors
    ///
    /// Returns a `RegistryError` if a document has no class name, names
    /// collide, or references cannot be flattened.
    pub fn from_documents(documents: impl IntoIterator<Item = Value>) -> Result<Self, RegistryError> {
        let mut raw = BTreeMap::new();
        for (index, doc) in documents.into_iter().enumerate() {
            let name = class_name_of(&doc).ok_or_else(|| RegistryError::Load {
                source_name: format!("document #{index}"),
                reason: "document has neither '$id' nor 'title'".to_string(),
            })?;
            if raw.insert(name.clone(), doc).is_some() {
                return Err(RegistryError::DuplicateClass { class_name: name });
            }
        }
        Ok(Self {
            classes: RwLock::new(flatten_documents(&raw)?),
        })
    }

    /// Register or replace a class schema.
    pub fn insert(&self, schema: ClassSchema) {
        self.classes.write().insert(schema.class_name.clone(), schema);
    }

    /// Remove a class schema, returning it if it was registered.
    pub fn remove(&self, class_name: &str) -> Option<ClassSchema> {
        self.classes.write().remove(class_name)
    }

    /// Returns the number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Returns true if no class is registered.
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

impl SchemaRegistry for InMemoryRegistry {
    fn lookup(&self, class_name: &str) -> Option<ClassSchema> {
        self.classes.read().get(class_name).cloned()
    }

    fn class_names(&self) -> Vec<String> {
        self.classes.read().keys().cloned().collect()
    }
}

/// A registry loaded from a directory of class schema documents.
///
/// Every `*.json`, `*.yaml`, and `*.yml` file in the directory (not
/// recursive) is one class schema document. Documents are flattened when
/// the registry is built; [`DirectoryRegistry::reload`] re-reads the
/// directory.
#[derive(Debug)]
pub struct DirectoryRegistry {
    /// Directory the documents were read from.
    schema_dir: PathBuf,
    /// Flattened class schemas by class name.
    classes: BTreeMap<String, ClassSchema>,
}

impl DirectoryRegistry {
    /// Load and flatten every class schema document in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Load` if the directory or a document cannot be
    /// read or parsed, and the flattening errors of
    /// [`InMemoryRegistry::from_documents`].
    pub fn new(schema_dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let classes = load_directory(&schema_dir)?;
        tracing::debug!(
            dir = %schema_dir.display(),
            classes = classes.len(),
            "loaded class schema registry"
        );
        Ok(Self { schema_dir, classes })
    }

    /// Re-read the schema directory, replacing every loaded class.
    ///
    /// # Errors
    ///
    /// Same as [`DirectoryRegistry::new`]. On error the previous classes are kept.
    pub fn reload(&mut self) -> Result<(), RegistryError> {
        self.classes = load_directory(&self.schema_dir)?;
        Ok(())
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Returns the number of loaded classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if no class was loaded.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl SchemaRegistry for DirectoryRegistry {
    fn lookup(&self, class_name: &str) -> Option<ClassSchema> {
        self.classes.get(class_name).cloned()
    }

    fn class_names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }
}

fn load_directory(schema_dir: &Path) -> Result<BTreeMap<String, ClassSchema>, RegistryError> {
    let entries = std::fs::read_dir(schema_dir).map_err(|e| RegistryError::Load {
        source_name: schema_dir.display().to_string(),
        reason: format!("cannot read schema directory: {e}"),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if path.is_file() && matches!(ext, "json" | "yaml" | "yml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut raw = BTreeMap::new();
    for path in paths {
        let doc = read_document(&path)?;
        let name = class_name_of(&doc)
            .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .ok_or_else(|| RegistryError::Load {
                source_name: path.display().to_string(),
                reason: "cannot determine class name".to_string(),
            })?;
        if raw.insert(name.clone(), doc).is_some() {
            return Err(RegistryError::DuplicateClass { class_name: name });
        }
    }

    flatten_documents(&raw)
}

fn read_document(path: &Path) -> Result<Value, RegistryError> {
    let content = std::fs::read_to_string(path).map_err(|e| RegistryError::Load {
        source_name: path.display().to_string(),
        reason: format!("cannot read file: {e}"),
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| RegistryError::Load {
            source_name: path.display().to_string(),
            reason: format!("invalid YAML: {e}"),
        }),
        _ => serde_json::from_str(&content).map_err(|e| RegistryError::Load {
            source_name: path.display().to_string(),
            reason: format!("invalid JSON: {e}"),
        }),
    }
}

/// Class name declared by a document: `$id` (sans `#` or URI prefix and
/// `.json` suffix), else `title`.
fn class_name_of(doc: &Value) -> Option<String> {
    if let Some(id) = doc.get("$id").and_then(Value::as_str) {
        let name = reference_name(id);
        if !name.is_empty() {
            return Some(name);
        }
    }
    doc.get("title").and_then(Value::as_str).map(str::to_string)
}

/// `#Entity`, `Entity.json`, and `https://host/schemas/Entity.json` all
/// name the class `Entity`.
fn reference_name(reference: &str) -> String {
    let tail = reference.rsplit('/').next().unwrap_or(reference);
    let tail = tail.strip_prefix('#').unwrap_or(tail);
    tail.strip_suffix(".json").unwrap_or(tail).to_string()
}

fn flatten_documents(
    raw: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, ClassSchema>, RegistryError> {
    let mut done: HashMap<String, ClassSchema> = HashMap::new();
    let mut visiting: Vec<String> = Vec::new();
    for name in raw.keys() {
        flatten_class(name, raw, &mut done, &mut visiting)?;
    }
    Ok(done.into_iter().collect())
}

fn flatten_class(
    name: &str,
    raw: &BTreeMap<String, Value>,
    done: &mut HashMap<String, ClassSchema>,
    visiting: &mut Vec<String>,
) -> Result<ClassSchema, RegistryError> {
    if let Some(schema) = done.get(name) {
        return Ok(schema.clone());
    }
    if let Some(start) = visiting.iter().position(|v| v == name) {
        let mut chain = visiting[start..].to_vec();
        chain.push(name.to_string());
        return Err(RegistryError::ReferenceCycle { chain });
    }

    let Some(doc) = raw.get(name) else {
        let referrer = visiting.last().cloned().unwrap_or_default();
        return Err(RegistryError::UnresolvedReference {
            class_name: referrer,
            reference: name.to_string(),
        });
    };
    if !doc.is_object() {
        return Err(RegistryError::InvalidDocument {
            class_name: name.to_string(),
            reason: "document must be a JSON object".to_string(),
        });
    }

    visiting.push(name.to_string());
    let mut schema = ClassSchema::new(name);

    if let Some(all_of) = doc.get("allOf") {
        let entries = all_of.as_array().ok_or_else(|| RegistryError::InvalidDocument {
            class_name: name.to_string(),
            reason: "'allOf' must be an array".to_string(),
        })?;
        for entry in entries {
            match entry.get("$ref").and_then(Value::as_str) {
                Some(reference) => {
                    let parent = flatten_class(&reference_name(reference), raw, done, visiting)?;
                    schema.absorb_parent(&parent);
                }
                None => schema.absorb_fragment(entry)?,
            }
        }
    }
    schema.absorb_fragment(doc)?;

    visiting.pop();
    done.insert(name.to_string(), schema.clone());
    Ok(schema)
}

pub(crate) fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity_doc() -> Value {
        json!({
            "$id": "#Entity",
            "properties": {
                "_key": { "type": "string" },
                "displayName": { "type": "string" }
            },
            "required": ["_key", "displayName"]
        })
    }

    #[test]
    fn test_from_documents_flattens_all_of_refs() {
        let registry = InMemoryRegistry::from_documents(vec![
            entity_doc(),
            json!({
                "$id": "#Service",
                "allOf": [
                    { "$ref": "#Entity" },
                    {
                        "properties": { "category": { "type": "array" } },
                        "required": ["category", "_key"]
                    }
                ]
            }),
        ])
        .unwrap();

        let service = registry.lookup("Service").unwrap();
        let names: Vec<&String> = service.properties.keys().collect();
        assert!(names.contains(&&"_key".to_string()));
        assert!(names.contains(&&"category".to_string()));
        assert_eq!(service.required, vec!["_key", "displayName", "category"]);
    }

    #[test]
    fn test_reference_by_uri_resolves() {
        let registry = InMemoryRegistry::from_documents(vec![
            entity_doc(),
            json!({
                "$id": "https://example.test/schemas/Host.json",
                "allOf": [{ "$ref": "https://example.test/schemas/Entity.json" }]
            }),
        ])
        .unwrap();
        assert_eq!(registry.lookup("Host").unwrap().required, vec!["_key", "displayName"]);
    }

    #[test]
    fn test_unresolved_reference_rejected() {
        let err = InMemoryRegistry::from_documents(vec![json!({
            "$id": "#Service",
            "allOf": [{ "$ref": "#Missing" }]
        })])
        .unwrap_err();
        match err {
            RegistryError::UnresolvedReference { class_name, reference } => {
                assert_eq!(class_name, "Service");
                assert_eq!(reference, "Missing");
            }
            other => panic!("Expected UnresolvedReference, got: {other}"),
        }
    }

    #[test]
    fn test_reference_cycle_rejected() {
        let err = InMemoryRegistry::from_documents(vec![
            json!({ "$id": "#A", "allOf": [{ "$ref": "#B" }] }),
            json!({ "$id": "#B", "allOf": [{ "$ref": "#A" }] }),
        ])
        .unwrap_err();
        assert!(
            matches!(err, RegistryError::ReferenceCycle { ref chain } if chain.len() == 3),
            "Expected a three-element cycle chain, got: {err}"
        );
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let err = InMemoryRegistry::from_documents(vec![entity_doc(), entity_doc()]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateClass { .. }));
    }

    #[test]
    fn test_insert_is_visible_to_next_lookup() {
        let registry = InMemoryRegistry::new();
        assert!(registry.lookup("Service").is_none());
        registry.insert(ClassSchema::new("Service").with_required("category"));
        assert_eq!(registry.lookup("Service").unwrap().required, vec!["category"]);
        registry.remove("Service");
        assert!(registry.lookup("Service").is_none());
    }

    #[test]
    fn test_directory_registry_reads_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Entity.json"),
            serde_json::to_string(&entity_doc()).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Application.yaml"),
            "allOf:\n  - $ref: '#Entity'\n  - properties:\n      COTS:\n        type: boolean\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let registry = DirectoryRegistry::new(dir.path()).unwrap();
        assert_eq!(registry.class_names(), vec!["Application", "Entity"]);
        let app = registry.lookup("Application").unwrap();
        assert_eq!(app.properties["COTS"], json!({ "type": "boolean" }));
        assert_eq!(app.required, vec!["_key", "displayName"]);
    }

    #[test]
    fn test_directory_registry_missing_dir() {
        let err = DirectoryRegistry::new("/nonexistent/gsv/schemas").unwrap_err();
        assert!(matches!(err, RegistryError::Load { .. }));
    }

    #[test]
    fn test_directory_registry_reload_sees_new_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Entity.json"), entity_doc().to_string()).unwrap();
        let mut registry = DirectoryRegistry::new(dir.path()).unwrap();
        assert!(registry.lookup("User").is_none());

        std::fs::write(
            dir.path().join("User.json"),
            json!({ "$id": "#User", "allOf": [{ "$ref": "#Entity" }] }).to_string(),
        )
        .unwrap();
        registry.reload().unwrap();
        assert!(registry.lookup("User").is_some());
    }

    #[test]
    fn test_to_document_roundtrips_through_registry() {
        let schema = ClassSchema::new("Key")
            .with_property("algorithm", json!({ "type": "string" }))
            .with_required("algorithm");
        let registry = InMemoryRegistry::from_documents(vec![schema.to_document()]).unwrap();
        assert_eq!(registry.lookup("Key").unwrap(), schema);
    }

    #[test]
    fn test_read_document_yaml_matches_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("Thing.yaml");
        let json_path = dir.path().join("Thing.json");
        std::fs::write(&yaml_path, "required: [a]\ncount: 3\nflag: true\nratio: 0.5\n").unwrap();
        std::fs::write(&json_path, r#"{"required": ["a"], "count": 3, "flag": true, "ratio": 0.5}"#)
            .unwrap();
        let yaml = read_document(&yaml_path).unwrap();
        assert_eq!(yaml, read_document(&json_path).unwrap());
        assert_eq!(yaml, json!({ "required": ["a"], "count": 3, "flag": true, "ratio": 0.5 }));
    }

    #[test]
    fn test_read_document_reports_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Broken.yml");
        std::fs::write(&path, "required: [a\n").unwrap();
        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, RegistryError::Load { reason, .. } if reason.starts_with("invalid YAML")));
    }
}
