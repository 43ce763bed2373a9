use crate::tuple::Relation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub entities: Vec<EntityDefinition>,
}

impl Schema {
    pub fn get_entity(&self, name: &str) -> Option<&EntityDefinition> {
        self.entities.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDefinition {
    pub name: String,
    pub relations: Vec<String>,
    pub actions: Vec<ActionDef>,
}

impl EntityDefinition {
    pub fn get_action(&self, name: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDef {
    pub name: String,
    pub child: Child,
}

/// A node of an action's rule tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Leaf(Leaf),
    Rewrite(Rewrite),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub kind: LeafKind,
    pub relation: Relation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    TupleToUserSet,
    ComputedUserSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub op: RewriteOp,
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOp {
    Union,
    Intersection,
}

impl Child {
    pub fn leaf(kind: LeafKind, relation: impl Into<String>) -> Self {
        Child::Leaf(Leaf {
            kind,
            relation: Relation::new(relation),
        })
    }

    pub fn computed_userset(relation: impl Into<String>) -> Self {
        Self::leaf(LeafKind::ComputedUserSet, relation)
    }

    pub fn tuple_to_userset(relation: impl Into<String>) -> Self {
        Self::leaf(LeafKind::TupleToUserSet, relation)
    }

    pub fn union(children: Vec<Child>) -> Self {
        Child::Rewrite(Rewrite {
            op: RewriteOp::Union,
            children,
        })
    }

    pub fn intersection(children: Vec<Child>) -> Self {
        Child::Rewrite(Rewrite {
            op: RewriteOp::Intersection,
            children,
        })
    }

    /// Nesting depth of the tree rooted here; a leaf counts as one.
    pub fn depth(&self) -> usize {
        match self {
            Child::Leaf(_) => 1,
            Child::Rewrite(rewrite) => {
                1 + rewrite.children.iter().map(Child::depth).max().unwrap_or(0)
            }
        }
    }
}
