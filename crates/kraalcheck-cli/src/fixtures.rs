use std::path::Path;

use kraalcheck_core::schema::types::Schema;
use kraalcheck_core::schema::{SchemaLimits, load_schema, validate_schema_limits};
use kraalcheck_core::tuple::RelationFact;
use tracing::debug;

use crate::error::CliError;

/// Reads a JSON rule tree and rejects it if it breaks `limits`.
pub fn load_schema_file(path: &Path, limits: &SchemaLimits) -> Result<Schema, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
    let schema = load_schema(&contents)?;
    validate_schema_limits(&schema, limits).map_err(CliError::Validation)?;

    debug!(path = %path.display(), entities = schema.entities.len(), "schema loaded");
    Ok(schema)
}

pub fn load_facts_file(path: &Path) -> Result<Vec<RelationFact>, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
    let facts = parse_facts(&contents)?;

    debug!(path = %path.display(), count = facts.len(), "facts loaded");
    Ok(facts)
}

/// One `namespace:id#relation@subject` per line. Blank lines and lines
/// starting with `//` are skipped.
pub fn parse_facts(input: &str) -> Result<Vec<RelationFact>, CliError> {
    input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with("//"))
        .map(|(line, text)| {
            text.parse::<RelationFact>()
                .map_err(|source| CliError::Fact { line, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kraalcheck_core::schema::ValidationError;
    use kraalcheck_core::tuple::Subject;

    const SCHEMA: &str = r#"{"entities": [{"name": "doc", "relations": ["viewer"], "actions": [
        {"name": "view", "child": {"kind": "leaf", "type": "computed_user_set", "value": "viewer"}}
    ]}]}"#;

    #[test]
    fn parse_facts_skips_blanks_and_comments() {
        let input = "
            // owners
            doc:1#owner@alice

            doc:1#viewer@group:eng#member
        ";

        let facts = parse_facts(input).unwrap();

        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].subject, Subject::user("alice"));
        assert_eq!(facts[1].subject, Subject::userset("group", "eng", "member"));
    }

    #[test]
    fn parse_facts_reports_line_number() {
        let input = "doc:1#owner@alice\n\nnot-a-fact\n";

        let err = parse_facts(input).unwrap_err();

        assert!(matches!(err, CliError::Fact { line: 3, .. }), "got: {err}");
    }

    #[test]
    fn load_schema_file_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, SCHEMA).unwrap();

        let schema = load_schema_file(&path, &SchemaLimits::default()).unwrap();

        assert!(schema.get_entity("doc").unwrap().get_action("view").is_some());
    }

    #[test]
    fn load_schema_file_enforces_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, SCHEMA).unwrap();
        let limits = SchemaLimits {
            max_entities: 0,
            ..Default::default()
        };

        let err = load_schema_file(&path, &limits).unwrap_err();

        let CliError::Validation(errors) = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(
            errors,
            vec![ValidationError::TooManyEntities { count: 1, limit: 0 }]
        );
    }

    #[test]
    fn load_schema_file_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, "{\"entities\": [").unwrap();

        let err = load_schema_file(&path, &SchemaLimits::default()).unwrap_err();

        assert!(matches!(err, CliError::Schema(_)), "got: {err}");
    }

    #[test]
    fn missing_facts_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_facts_file(&dir.path().join("absent.txt")).unwrap_err();

        assert!(matches!(err, CliError::Io { .. }), "got: {err}");
    }
}
