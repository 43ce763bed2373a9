use std::fmt;
use std::str::FromStr;

/// Userset relation placeholder meaning "the relation being resolved".
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid object '{0}': expected 'namespace:id'")]
    InvalidObject(String),

    #[error("invalid relation fact '{0}': expected 'namespace:id#relation@subject'")]
    InvalidFact(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Object {
    pub namespace: String,
    pub id: String,
}

impl Object {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)
    }
}

impl FromStr for Object {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(id), None) if !namespace.is_empty() && !id.is_empty() => {
                Ok(Object::new(namespace, id))
            }
            _ => Err(ParseError::InvalidObject(s.to_string())),
        }
    }
}

pub fn parse_object(s: &str) -> Result<Object, ParseError> {
    s.parse()
}

/// A relation name, possibly composite as `tupleset.computed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation(String);

impl Relation {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the relation to query and the relation that replaces an
    /// ellipsis on a matched userset edge. A plain name is its own default.
    pub fn split(&self) -> (&str, &str) {
        match self.0.split_once('.') {
            Some((query, computed)) => (query, computed),
            None => (&self.0, &self.0),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Relation {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserSet {
    pub object: Object,
    pub relation: Relation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    User(String),
    UserSet(UserSet),
}

impl Subject {
    pub fn user(id: impl Into<String>) -> Self {
        Subject::User(id.into())
    }

    pub fn userset(
        namespace: impl Into<String>,
        id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Subject::UserSet(UserSet {
            object: Object::new(namespace, id),
            relation: Relation::new(relation),
        })
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::User(id) => f.write_str(id),
            Subject::UserSet(userset) => write!(f, "{}#{}", userset.object, userset.relation),
        }
    }
}

/// Parses `namespace:id#relation` as a userset and anything else as a
/// literal user id. Never fails.
pub fn parse_subject(s: &str) -> Subject {
    let trimmed = s.trim();
    if let Some((object, relation)) = trimmed.split_once('#')
        && !relation.is_empty()
        && let Ok(object) = object.parse::<Object>()
    {
        return Subject::UserSet(UserSet {
            object,
            relation: Relation::new(relation),
        });
    }
    Subject::User(trimmed.to_string())
}

/// One stored edge: `relation` holds on `object` for `subject`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationFact {
    pub object: Object,
    pub relation: Relation,
    pub subject: Subject,
}

impl RelationFact {
    pub fn new(object: Object, relation: impl Into<String>, subject: Subject) -> Self {
        Self {
            object,
            relation: Relation::new(relation),
            subject,
        }
    }

    /// The subject this fact grants, with an ellipsis edge rewritten to
    /// `computed`.
    pub fn resolve_subject(&self, computed: &str) -> Subject {
        match &self.subject {
            Subject::UserSet(userset) if userset.relation.as_str() == ELLIPSIS => {
                Subject::UserSet(UserSet {
                    object: userset.object.clone(),
                    relation: Relation::new(computed),
                })
            }
            other => other.clone(),
        }
    }
}

impl fmt::Display for RelationFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.subject)
    }
}

impl FromStr for RelationFact {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidFact(s.to_string());

        let (left, subject) = s.trim().split_once('@').ok_or_else(invalid)?;
        let (object, relation) = left.split_once('#').ok_or_else(invalid)?;
        let object = object.parse::<Object>().map_err(|_| invalid())?;

        if relation.is_empty() || subject.trim().is_empty() {
            return Err(invalid());
        }

        Ok(RelationFact::new(object, relation, parse_subject(subject)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleFilter {
    pub namespace: Option<String>,
    pub object_id: Option<String>,
    pub relation: Option<String>,
}

impl TupleFilter {
    pub fn for_object(namespace: &str, object_id: &str, relation: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            object_id: Some(object_id.to_string()),
            relation: Some(relation.to_string()),
        }
    }

    pub fn matches(&self, fact: &RelationFact) -> bool {
        if let Some(ref ns) = self.namespace
            && ns != &fact.object.namespace
        {
            return false;
        }
        if let Some(ref id) = self.object_id
            && id != &fact.object.id
        {
            return false;
        }
        if let Some(ref r) = self.relation
            && r != fact.relation.as_str()
        {
            return false;
        }
        true
    }
}
