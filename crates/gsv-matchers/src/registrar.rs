//! # Matcher Registrar
//!
//! Binds the three assertions into a host assertion framework. The host
//! exposes a single extension entry point ([`AssertionRegistry::extend`])
//! that receives every assertion in one batch.
//!
//! Host-facing assertions share one signature, [`MatcherFn`]: the received
//! value plus positional JSON arguments. The adapters here parse those
//! arguments and delegate to the typed functions in [`crate::graph_object`]
//! and [`crate::target`].

use std::collections::BTreeMap;

use gsv_schema::SchemaRegistry;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::MatcherUsageError;
use crate::graph_object::{
    to_match_direct_relationship_schema, to_match_graph_object_schema, GraphObjectSchemaParams,
    GraphObjects, RelationshipSchemaParams, TO_MATCH_DIRECT_RELATIONSHIP_SCHEMA,
    TO_MATCH_GRAPH_OBJECT_SCHEMA,
};
use crate::result::MatchResult;
use crate::target::{to_target_entities_json, TargetEntitiesOptions, TO_TARGET_ENTITIES};

/// What a host passes to every assertion invocation.
#[derive(Clone, Copy)]
pub struct MatcherContext<'a> {
    /// Class schema source for `toMatchGraphObjectSchema`.
    pub registry: &'a dyn SchemaRegistry,
}

impl<'a> MatcherContext<'a> {
    pub fn new(registry: &'a dyn SchemaRegistry) -> Self {
        Self { registry }
    }
}

impl std::fmt::Debug for MatcherContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherContext").finish_non_exhaustive()
    }
}

/// Host-facing assertion: received value plus positional arguments.
pub type MatcherFn =
    fn(&MatcherContext<'_>, &Value, &[Value]) -> Result<MatchResult, MatcherUsageError>;

/// Assertions keyed by name.
pub type MatcherSet = BTreeMap<&'static str, MatcherFn>;

/// The extension point of a host assertion framework.
pub trait AssertionRegistry {
    /// Add `matchers` to the host's assertion vocabulary.
    fn extend(&mut self, matchers: MatcherSet);
}

/// The three graph object assertions.
pub fn matchers() -> MatcherSet {
    let mut set = MatcherSet::new();
    set.insert(TO_MATCH_GRAPH_OBJECT_SCHEMA, graph_object_schema as MatcherFn);
    set.insert(
        TO_MATCH_DIRECT_RELATIONSHIP_SCHEMA,
        direct_relationship_schema as MatcherFn,
    );
    set.insert(TO_TARGET_ENTITIES, target_entities as MatcherFn);
    set
}

/// Register every assertion with `registry` in a single `extend` call.
pub fn register_matchers<R: AssertionRegistry + ?Sized>(registry: &mut R) {
    registry.extend(matchers());
}

/// In-process [`AssertionRegistry`] that can also run what it holds.
#[derive(Default)]
pub struct MatcherTable {
    matchers: MatcherSet,
}

impl MatcherTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the graph object assertions.
    pub fn with_graph_matchers() -> Self {
        let mut table = Self::new();
        register_matchers(&mut table);
        table
    }

    pub fn get(&self, name: &str) -> Option<MatcherFn> {
        self.matchers.get(name).copied()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.matchers.keys().copied().collect()
    }

    /// Run the assertion registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `MatcherUsageError::UnknownMatcher` if nothing is registered
    /// under `name`, otherwise whatever the assertion itself returns.
    pub fn run(
        &self,
        name: &str,
        context: &MatcherContext<'_>,
        received: &Value,
        args: &[Value],
    ) -> Result<MatchResult, MatcherUsageError> {
        let matcher = self
            .get(name)
            .ok_or_else(|| MatcherUsageError::UnknownMatcher(name.to_string()))?;
        matcher(context, received, args)
    }
}

impl std::fmt::Debug for MatcherTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherTable")
            .field("matchers", &self.names())
            .finish()
    }
}

impl AssertionRegistry for MatcherTable {
    fn extend(&mut self, matchers: MatcherSet) {
        self.matchers.extend(matchers);
    }
}

fn graph_object_schema(
    context: &MatcherContext<'_>,
    received: &Value,
    args: &[Value],
) -> Result<MatchResult, MatcherUsageError> {
    let params: GraphObjectSchemaParams = required_arg(TO_MATCH_GRAPH_OBJECT_SCHEMA, args, 0)?;
    to_match_graph_object_schema(context.registry, GraphObjects::from(received), &params)
}

fn direct_relationship_schema(
    _context: &MatcherContext<'_>,
    received: &Value,
    args: &[Value],
) -> Result<MatchResult, MatcherUsageError> {
    let params: RelationshipSchemaParams =
        optional_arg(TO_MATCH_DIRECT_RELATIONSHIP_SCHEMA, args, 0)?.unwrap_or_default();
    to_match_direct_relationship_schema(GraphObjects::from(received), &params)
}

fn target_entities(
    _context: &MatcherContext<'_>,
    received: &Value,
    args: &[Value],
) -> Result<MatchResult, MatcherUsageError> {
    let relationships = GraphObjects::from(received);
    let entities: Vec<Value> = required_arg(TO_TARGET_ENTITIES, args, 0)?;
    let options: TargetEntitiesOptions =
        optional_arg(TO_TARGET_ENTITIES, args, 1)?.unwrap_or_default();
    to_target_entities_json(relationships.as_slice(), &entities, options)
}

fn required_arg<T: DeserializeOwned>(
    matcher: &'static str,
    args: &[Value],
    position: usize,
) -> Result<T, MatcherUsageError> {
    optional_arg(matcher, args, position)?
        .ok_or(MatcherUsageError::MissingArgument { matcher, position })
}

/// A missing or `null` argument is `None`.
fn optional_arg<T: DeserializeOwned>(
    matcher: &'static str,
    args: &[Value],
    position: usize,
) -> Result<Option<T>, MatcherUsageError> {
    match args.get(position) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
            MatcherUsageError::InvalidArgument {
                matcher,
                position,
                reason: e.to_string(),
            }
        }),
    }
}
