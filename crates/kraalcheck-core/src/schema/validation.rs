use super::types::{Child, Schema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLimits {
    pub max_entities: usize,
    pub max_actions_per_entity: usize,
    pub max_rule_depth: usize,
}

impl Default for SchemaLimits {
    fn default() -> Self {
        Self {
            max_entities: 50,
            max_actions_per_entity: 30,
            max_rule_depth: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("too many entities: {count} exceeds limit of {limit}")]
    TooManyEntities { count: usize, limit: usize },

    #[error("too many actions in entity '{entity}': {count} exceeds limit of {limit}")]
    TooManyActions {
        entity: String,
        count: usize,
        limit: usize,
    },

    #[error("rule tree of '{entity}#{action}' is {depth} levels deep, limit is {limit}")]
    RuleTooDeep {
        entity: String,
        action: String,
        depth: usize,
        limit: usize,
    },

    #[error("action '{entity}#{action}' references undeclared relation '{relation}'")]
    UndeclaredRelation {
        entity: String,
        action: String,
        relation: String,
    },
}

/// Checks size limits and, for entities that declare their relations, that
/// every leaf queries one of them. Returns every violation found.
pub fn validate_schema_limits(
    schema: &Schema,
    limits: &SchemaLimits,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if schema.entities.len() > limits.max_entities {
        errors.push(ValidationError::TooManyEntities {
            count: schema.entities.len(),
            limit: limits.max_entities,
        });
    }

    for entity in &schema.entities {
        if entity.actions.len() > limits.max_actions_per_entity {
            errors.push(ValidationError::TooManyActions {
                entity: entity.name.clone(),
                count: entity.actions.len(),
                limit: limits.max_actions_per_entity,
            });
        }

        for action in &entity.actions {
            let depth = action.child.depth();
            if depth > limits.max_rule_depth {
                errors.push(ValidationError::RuleTooDeep {
                    entity: entity.name.clone(),
                    action: action.name.clone(),
                    depth,
                    limit: limits.max_rule_depth,
                });
            }

            if entity.relations.is_empty() {
                continue;
            }
            let mut queried = Vec::new();
            collect_queried_relations(&action.child, &mut queried);
            for relation in queried {
                if !entity.relations.iter().any(|r| r == relation) {
                    errors.push(ValidationError::UndeclaredRelation {
                        entity: entity.name.clone(),
                        action: action.name.clone(),
                        relation: relation.to_string(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_queried_relations<'a>(child: &'a Child, out: &mut Vec<&'a str>) {
    match child {
        Child::Leaf(leaf) => {
            let (query, _) = leaf.relation.split();
            if !out.contains(&query) {
                out.push(query);
            }
        }
        Child::Rewrite(rewrite) => {
            for c in &rewrite.children {
                collect_queried_relations(c, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ActionDef, EntityDefinition};

    fn limits_with(max_entities: usize, max_actions: usize, max_depth: usize) -> SchemaLimits {
        SchemaLimits {
            max_entities,
            max_actions_per_entity: max_actions,
            max_rule_depth: max_depth,
        }
    }

    fn entity(name: &str, relations: &[&str], actions: Vec<(&str, Child)>) -> EntityDefinition {
        EntityDefinition {
            name: name.to_string(),
            relations: relations.iter().map(|r| r.to_string()).collect(),
            actions: actions
                .into_iter()
                .map(|(name, child)| ActionDef {
                    name: name.to_string(),
                    child,
                })
                .collect(),
        }
    }

    #[test]
    fn schema_within_limits_passes() {
        let schema = Schema {
            entities: vec![
                entity("user", &[], vec![]),
                entity(
                    "doc",
                    &["owner", "parent"],
                    vec![(
                        "view",
                        Child::union(vec![
                            Child::computed_userset("owner"),
                            Child::tuple_to_userset("parent.view"),
                        ]),
                    )],
                ),
            ],
        };

        assert!(validate_schema_limits(&schema, &SchemaLimits::default()).is_ok());
    }

    #[test]
    fn exceeding_max_entities_rejected() {
        let schema = Schema {
            entities: vec![
                entity("a", &[], vec![]),
                entity("b", &[], vec![]),
                entity("c", &[], vec![]),
            ],
        };

        let errors = validate_schema_limits(&schema, &limits_with(2, 30, 8)).unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::TooManyEntities { count: 3, limit: 2 }]
        );
    }

    #[test]
    fn exceeding_max_actions_rejected() {
        let leaf = || Child::computed_userset("owner");
        let schema = Schema {
            entities: vec![entity(
                "doc",
                &[],
                vec![("a", leaf()), ("b", leaf()), ("c", leaf())],
            )],
        };

        let errors = validate_schema_limits(&schema, &limits_with(50, 2, 8)).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::TooManyActions {
                entity,
                count: 3,
                limit: 2
            } if entity == "doc"
        ));
    }

    #[test]
    fn deep_rule_tree_rejected() {
        let nested = Child::union(vec![Child::intersection(vec![Child::union(vec![
            Child::computed_userset("owner"),
        ])])]);
        let schema = Schema {
            entities: vec![entity("doc", &[], vec![("view", nested)])],
        };

        let errors = validate_schema_limits(&schema, &limits_with(50, 30, 3)).unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::RuleTooDeep {
                entity: "doc".to_string(),
                action: "view".to_string(),
                depth: 4,
                limit: 3,
            }]
        );
    }

    #[test]
    fn undeclared_relation_rejected_once() {
        let child = Child::union(vec![
            Child::computed_userset("editor"),
            Child::computed_userset("editor"),
            Child::tuple_to_userset("parent.view"),
        ]);
        let schema = Schema {
            entities: vec![entity("doc", &["owner", "parent"], vec![("edit", child)])],
        };

        let errors = validate_schema_limits(&schema, &SchemaLimits::default()).unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::UndeclaredRelation {
                entity: "doc".to_string(),
                action: "edit".to_string(),
                relation: "editor".to_string(),
            }]
        );
    }

    #[test]
    fn entity_without_declared_relations_skips_relation_check() {
        let schema = Schema {
            entities: vec![entity(
                "doc",
                &[],
                vec![("view", Child::computed_userset("anything"))],
            )],
        };

        assert!(validate_schema_limits(&schema, &SchemaLimits::default()).is_ok());
    }
}
