use std::collections::HashSet;

use serde::Deserialize;

use super::types::{ActionDef, Child, EntityDefinition, LeafKind, Schema};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("malformed schema document: {0}")]
    Malformed(String),

    #[error("undefined child kind '{0}'")]
    UndefinedChildKind(String),

    #[error("undefined rewrite operation '{0}'")]
    UndefinedRewriteOp(String),

    #[error("undefined leaf type '{0}'")]
    UndefinedLeafType(String),

    #[error("{kind} node in action '{action}' of entity '{entity}' is missing '{field}'")]
    MissingField {
        entity: String,
        action: String,
        kind: &'static str,
        field: &'static str,
    },

    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),

    #[error("duplicate action '{action}' in entity '{entity}'")]
    DuplicateAction { entity: String, action: String },
}

#[derive(Deserialize)]
struct RawSchema {
    entities: Vec<RawEntity>,
}

#[derive(Deserialize)]
struct RawEntity {
    name: String,
    #[serde(default)]
    relations: Vec<String>,
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Deserialize)]
struct RawAction {
    name: String,
    child: RawChild,
}

#[derive(Deserialize)]
struct RawChild {
    kind: String,
    #[serde(rename = "type")]
    child_type: String,
    value: Option<String>,
    children: Option<Vec<RawChild>>,
}

/// Loads a rule tree from its JSON form:
///
/// ```json
/// {"entities": [{"name": "doc", "relations": ["owner"], "actions": [
///     {"name": "view", "child": {"kind": "rewrite", "type": "union", "children": [
///         {"kind": "leaf", "type": "computed_user_set", "value": "owner"}]}}]}]}
/// ```
pub fn load_schema(input: &str) -> Result<Schema, SchemaError> {
    let raw: RawSchema =
        serde_json::from_str(input).map_err(|e| SchemaError::Malformed(e.to_string()))?;

    let mut entities = Vec::with_capacity(raw.entities.len());
    let mut seen_entities = HashSet::new();

    for raw_entity in raw.entities {
        if !seen_entities.insert(raw_entity.name.clone()) {
            return Err(SchemaError::DuplicateEntity(raw_entity.name));
        }

        let mut actions = Vec::with_capacity(raw_entity.actions.len());
        let mut seen_actions = HashSet::new();

        for raw_action in raw_entity.actions {
            if !seen_actions.insert(raw_action.name.clone()) {
                return Err(SchemaError::DuplicateAction {
                    entity: raw_entity.name,
                    action: raw_action.name,
                });
            }

            let location = Location {
                entity: &raw_entity.name,
                action: &raw_action.name,
            };
            let child = convert_child(raw_action.child, &location)?;
            actions.push(ActionDef {
                name: raw_action.name,
                child,
            });
        }

        entities.push(EntityDefinition {
            name: raw_entity.name,
            relations: raw_entity.relations,
            actions,
        });
    }

    Ok(Schema { entities })
}

struct Location<'a> {
    entity: &'a str,
    action: &'a str,
}

impl Location<'_> {
    fn missing(&self, kind: &'static str, field: &'static str) -> SchemaError {
        SchemaError::MissingField {
            entity: self.entity.to_string(),
            action: self.action.to_string(),
            kind,
            field,
        }
    }
}

fn convert_child(raw: RawChild, location: &Location<'_>) -> Result<Child, SchemaError> {
    match raw.kind.as_str() {
        "leaf" => {
            let kind = match raw.child_type.as_str() {
                "tuple_to_user_set" => LeafKind::TupleToUserSet,
                "computed_user_set" => LeafKind::ComputedUserSet,
                other => return Err(SchemaError::UndefinedLeafType(other.to_string())),
            };
            match raw.value {
                Some(value) if !value.is_empty() => Ok(Child::leaf(kind, value)),
                _ => Err(location.missing("leaf", "value")),
            }
        }
        "rewrite" => {
            let raw_children = raw.children.ok_or_else(|| location.missing("rewrite", "children"))?;
            let children = raw_children
                .into_iter()
                .map(|c| convert_child(c, location))
                .collect::<Result<Vec<_>, _>>()?;
            match raw.child_type.as_str() {
                "union" => Ok(Child::union(children)),
                "intersection" => Ok(Child::intersection(children)),
                other => Err(SchemaError::UndefinedRewriteOp(other.to_string())),
            }
        }
        other => Err(SchemaError::UndefinedChildKind(other.to_string())),
    }
}
