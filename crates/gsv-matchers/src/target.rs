//! # Relationship Target Resolution
//!
//! `toTargetEntities` checks that every mapped relationship's abstract
//! target descriptor (`_type` + `_key`) points at a concrete entity in the
//! candidate pool. Relationships are checked in input order and the first
//! failing one decides the result.
//!
//! ## Cardinality
//!
//! Zero matches always fail. Several matches fail only when
//! `enforceSingleTarget` is set; duplicate entities in the pool count as
//! separate matches.

use gsv_core::{Entity, MappedRelationship, TargetEntity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MatcherUsageError;
use crate::messages;
use crate::result::MatchResult;

/// Name of the target resolution assertion.
pub const TO_TARGET_ENTITIES: &str = "toTargetEntities";

/// Options for `toTargetEntities`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEntitiesOptions {
    /// Fail when more than one candidate entity matches a target.
    #[serde(default)]
    pub enforce_single_target: bool,
}

/// Every candidate entity whose `_type` and `_key` equal the relationship's
/// target descriptor, in pool order.
pub fn resolve_target<'e>(relationship: &MappedRelationship, entities: &'e [Entity]) -> Vec<&'e Entity> {
    let target = relationship.target();
    entities.iter().filter(|entity| target.matches(entity)).collect()
}

/// Like [`resolve_target`], over a pool of raw JSON objects. Candidates
/// need nothing beyond `_type` and `_key`.
pub fn resolve_target_objects<'v>(target: &TargetEntity, objects: &'v [Value]) -> Vec<&'v Value> {
    objects.iter().filter(|object| target.matches_object(object)).collect()
}

/// Assert that every mapped relationship resolves to a target entity.
///
/// Failure messages embed the relationship as it serializes.
pub fn to_target_entities(
    relationships: &[MappedRelationship],
    entities: &[Entity],
    options: TargetEntitiesOptions,
) -> MatchResult {
    let unresolved = first_unresolved(
        relationships
            .iter()
            .map(|rel| (rel.key.as_str(), resolve_target(rel, entities).len())),
        options,
    );
    match unresolved {
        None => MatchResult::passed(|| messages::SUCCESS.to_string()),
        Some((index, kind)) => {
            // Serializing a struct of strings and JSON values cannot fail.
            let rendered = serde_json::to_value(&relationships[index]).unwrap_or(Value::Null);
            kind.into_result(rendered)
        }
    }
}

/// Assert that every mapped relationship, given as JSON, resolves to an
/// object in `entities`.
///
/// Failure messages embed the caller's relationship value unchanged.
///
/// # Errors
///
/// Returns `MatcherUsageError::InvalidReceived` if a relationship is not a
/// well-formed mapped relationship.
pub fn to_target_entities_json(
    relationships: &[Value],
    entities: &[Value],
    options: TargetEntitiesOptions,
) -> Result<MatchResult, MatcherUsageError> {
    let parsed = relationships
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            MappedRelationship::deserialize(raw).map_err(|e| MatcherUsageError::InvalidReceived {
                matcher: TO_TARGET_ENTITIES,
                reason: format!("relationship #{index}: {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let unresolved = first_unresolved(
        parsed
            .iter()
            .map(|rel| (rel.key.as_str(), resolve_target_objects(rel.target(), entities).len())),
        options,
    );
    Ok(match unresolved {
        None => MatchResult::passed(|| messages::SUCCESS.to_string()),
        Some((index, kind)) => kind.into_result(relationships[index].clone()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unresolved {
    NoTarget,
    MultipleTargets,
}

impl Unresolved {
    fn into_result(self, relationship: Value) -> MatchResult {
        match self {
            Self::NoTarget => MatchResult::failed(move || messages::no_target(&relationship)),
            Self::MultipleTargets => {
                MatchResult::failed(move || messages::multiple_targets(&relationship))
            }
        }
    }
}

/// Index of the first relationship whose target does not resolve, given
/// each relationship's key and match count in input order. Counts are
/// pulled lazily, so nothing after the first failure is resolved.
fn first_unresolved<'r, I>(matches: I, options: TargetEntitiesOptions) -> Option<(usize, Unresolved)>
where
    I: IntoIterator<Item = (&'r str, usize)>,
{
    for (index, (key, matched)) in matches.into_iter().enumerate() {
        tracing::debug!(
            index,
            key,
            matched,
            enforce_single_target = options.enforce_single_target,
            "resolved mapped relationship target"
        );

        if matched == 0 {
            return Some((index, Unresolved::NoTarget));
        }
        if matched > 1 && options.enforce_single_target {
            return Some((index, Unresolved::MultipleTargets));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsv_core::{RelationshipDirection, RelationshipMapping, TargetEntity};
    use serde_json::{json, Map};

    fn mapped(target_type: &str, target_key: &str) -> MappedRelationship {
        MappedRelationship {
            class: "HAS".to_string(),
            relationship_type: "acme_account_has_user".to_string(),
            key: format!("account|has|{target_key}"),
            mapping: RelationshipMapping {
                relationship_direction: RelationshipDirection::Forward,
                source_entity_key: "account".to_string(),
                target_filter_keys: vec![vec!["_type".to_string(), "_key".to_string()]],
                target_entity: TargetEntity::new(target_type, target_key),
                skip_target_creation: None,
            },
            properties: Map::new(),
        }
    }

    fn user(key: &str) -> Entity {
        Entity::new(["User"], "acme_user", key)
    }

    #[test]
    fn test_resolve_target_matches_type_and_key() {
        let rel = mapped("acme_user", "u1");
        let pool = vec![user("u1"), user("u2"), Entity::new(["Host"], "acme_host", "u1")];
        let matched = resolve_target(&rel, &pool);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].key, "u1");
        assert_eq!(matched[0].entity_type, "acme_user");
    }

    #[test]
    fn test_short_circuits_on_first_failure() {
        let rels = vec![mapped("acme_user", "missing-1"), mapped("acme_user", "missing-2")];
        let result = to_target_entities(&rels, &[], TargetEntitiesOptions::default());
        assert!(!result.pass());
        let message = result.message();
        assert!(message.contains("missing-1"));
        assert!(!message.contains("missing-2"));
    }

    #[test]
    fn test_empty_relationship_list_passes() {
        let result = to_target_entities(&[], &[user("u1")], TargetEntitiesOptions::default());
        assert!(result.pass());
    }

    #[test]
    fn test_json_pool_needs_only_type_and_key() {
        let rel = serde_json::to_value(mapped("acme_user", "u1")).unwrap();
        let pool = vec![json!({ "_type": "acme_user", "_key": "u1" })];
        let result =
            to_target_entities_json(&[rel], &pool, TargetEntitiesOptions::default()).unwrap();
        assert!(result.pass(), "{}", result.message());
        assert_eq!(result.message(), "Success!");
    }

    #[test]
    fn test_json_failure_prints_relationship_as_supplied() {
        let rel = json!({
            "_class": "HAS",
            "_type": "acme_account_has_user",
            "_key": "account|has|u9",
            "_mapping": {
                "relationshipDirection": "FORWARD",
                "sourceEntityKey": "account",
                "targetEntity": { "_type": "acme_user", "_key": "u9" }
            }
        });
        let result = to_target_entities_json(
            std::slice::from_ref(&rel),
            &[json!({ "_type": "acme_user", "_key": "u1" })],
            TargetEntitiesOptions::default(),
        )
        .unwrap();
        assert!(!result.pass());
        let message = result.message();
        assert_eq!(
            message,
            format!(
                "No target entity found for mapped relationship: {}",
                gsv_core::render::pretty(&rel)
            )
        );
        assert!(!message.contains("targetFilterKeys"));
    }

    #[test]
    fn test_json_multiple_targets_prints_relationship_as_supplied() {
        let rel = json!({
            "_class": "HAS",
            "_type": "acme_account_has_user",
            "_key": "account|has|u1",
            "_mapping": {
                "relationshipDirection": "FORWARD",
                "sourceEntityKey": "account",
                "targetEntity": { "_type": "acme_user", "_key": "u1" }
            },
            "note": "kept"
        });
        let twin = json!({ "_type": "acme_user", "_key": "u1" });
        let result = to_target_entities_json(
            std::slice::from_ref(&rel),
            &[twin.clone(), twin],
            TargetEntitiesOptions { enforce_single_target: true },
        )
        .unwrap();
        assert_eq!(
            result.message(),
            format!(
                "Multiple target entities found for mapped relationship, expected exactly one: {}",
                gsv_core::render::pretty(&rel)
            )
        );
    }

    #[test]
    fn test_json_malformed_relationship_names_its_index() {
        let good = serde_json::to_value(mapped("acme_user", "u1")).unwrap();
        let err = to_target_entities_json(
            &[good, json!({ "_key": "no-mapping" })],
            &[],
            TargetEntitiesOptions::default(),
        )
        .unwrap_err();
        assert!(
            matches!(&err, MatcherUsageError::InvalidReceived { reason, .. } if reason.starts_with("relationship #1:"))
        );
    }

    #[test]
    fn test_resolve_target_objects_skips_numeric_keys() {
        let target = TargetEntity::new("acme_user", "1");
        let pool = vec![
            json!({ "_type": "acme_user", "_key": 1 }),
            json!({ "_type": "acme_user", "_key": "1" }),
        ];
        let matched = resolve_target_objects(&target, &pool);
        assert_eq!(matched, vec![&pool[1]]);
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let options: TargetEntitiesOptions =
            serde_json::from_value(json!({ "enforceSingleTarget": true })).unwrap();
        assert!(options.enforce_single_target);
        let defaults: TargetEntitiesOptions = serde_json::from_value(json!({})).unwrap();
        assert!(!defaults.enforce_single_target);
    }
}
