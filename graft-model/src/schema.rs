use crate::date_format::DateFormat;
use crate::error::{SchemaError, SchemaResult};
use graft_types::AttributeType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Describes one persistent entity type and how records map onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityKind {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default)]
    pub relationships: Vec<RelationshipSpec>,
}

impl EntityKind {
    /// Creates a kind with no properties.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Appends an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Appends a relationship.
    #[must_use]
    pub fn relationship(mut self, relationship: RelationshipSpec) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Returns the attribute flagged as primary key, if any.
    pub fn primary_key(&self) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.primary_key)
    }
}

/// A scalar property of an entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    /// Record key to read this attribute from. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_name: Option<String>,
    /// Date pattern override. Only meaningful when the type is `Date`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
}

impl AttributeSpec {
    fn simple(name: &str, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            import_name: None,
            date_format: None,
            primary_key: false,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::simple(name, AttributeType::String)
    }

    pub fn integer(name: &str) -> Self {
        Self::simple(name, AttributeType::Integer)
    }

    pub fn double(name: &str) -> Self {
        Self::simple(name, AttributeType::Double)
    }

    pub fn boolean(name: &str) -> Self {
        Self::simple(name, AttributeType::Boolean)
    }

    pub fn date(name: &str) -> Self {
        Self::simple(name, AttributeType::Date)
    }

    pub fn binary(name: &str) -> Self {
        Self::simple(name, AttributeType::Binary)
    }

    /// Reads this attribute from `key` instead of its own name.
    #[must_use]
    pub fn import_name(mut self, key: &str) -> Self {
        self.import_name = Some(key.into());
        self
    }

    /// Overrides the default date pattern for this attribute.
    #[must_use]
    pub fn date_format(mut self, pattern: &str) -> Self {
        self.date_format = Some(pattern.into());
        self
    }

    /// Marks this attribute as the kind's primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// The record key this attribute is imported from.
    pub fn import_key(&self) -> &str {
        self.import_name.as_deref().unwrap_or(&self.name)
    }
}

/// A link from one entity kind to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSpec {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_name: Option<String>,
    #[serde(default)]
    pub merge_policy: MergePolicy,
    #[serde(default)]
    pub delete_rule: DeleteRule,
}

impl RelationshipSpec {
    fn simple(name: &str, target: &str, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality,
            import_name: None,
            merge_policy: MergePolicy::default(),
            delete_rule: DeleteRule::default(),
        }
    }

    pub fn to_one(name: &str, target: &str) -> Self {
        Self::simple(name, target, Cardinality::ToOne)
    }

    pub fn to_many(name: &str, target: &str) -> Self {
        Self::simple(name, target, Cardinality::ToMany)
    }

    #[must_use]
    pub fn import_name(mut self, key: &str) -> Self {
        self.import_name = Some(key.into());
        self
    }

    #[must_use]
    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    #[must_use]
    pub fn delete_rule(mut self, rule: DeleteRule) -> Self {
        self.delete_rule = rule;
        self
    }

    pub fn import_key(&self) -> &str {
        self.import_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// How a relationship's existing related set is reconciled with an imported one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergePolicy {
    /// The imported set replaces the existing one (default).
    #[default]
    Replace,
    /// Imported instances are added; existing ones are never removed.
    Merge,
    /// Imported instances are added or updated; existing ones not imported are pruned.
    MergeAndPrune,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Replace => "Replace",
            Self::Merge => "Merge",
            Self::MergeAndPrune => "MergeAndPrune",
        };
        f.write_str(name)
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Replace" => Ok(Self::Replace),
            "Merge" => Ok(Self::Merge),
            "MergeAndPrune" => Ok(Self::MergeAndPrune),
            other => Err(format!("unknown merge policy: {other}")),
        }
    }
}

/// What happens to an instance that is disassociated from a relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteRule {
    /// The instance is only unlinked.
    #[default]
    Nullify,
    /// The relationship owns the instance; it is deleted from the session.
    Cascade,
}

/// The validated registry of entity kinds.
///
/// Built once at startup, then shared read-only by every importer.
#[derive(Debug, Clone)]
pub struct Schema {
    kinds: Vec<EntityKind>,
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct SchemaDocument {
    kinds: Vec<EntityKind>,
}

impl Schema {
    /// Validates and indexes the given kinds.
    pub fn new(kinds: Vec<EntityKind>) -> SchemaResult<Self> {
        let mut index = HashMap::with_capacity(kinds.len());
        for (i, kind) in kinds.iter().enumerate() {
            if kind.name.is_empty() {
                return Err(SchemaError::EmptyKindName);
            }
            if index.insert(kind.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateKind(kind.name.clone()));
            }
        }
        for kind in &kinds {
            validate_kind(kind, &index)?;
        }
        Ok(Self { kinds, index })
    }

    /// Parses a schema document of the form `{"kinds": [...]}`.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let doc: SchemaDocument = serde_json::from_str(json)?;
        Self::new(doc.kinds)
    }

    /// Looks up a kind by name.
    pub fn kind(&self, name: &str) -> Option<&EntityKind> {
        self.index.get(name).map(|&i| &self.kinds[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = &EntityKind> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

fn validate_kind(kind: &EntityKind, index: &HashMap<String, usize>) -> SchemaResult<()> {
    let mut names = HashSet::new();
    let mut primary_key: Option<&str> = None;

    for attribute in &kind.attributes {
        if !names.insert(attribute.name.as_str()) {
            return Err(SchemaError::DuplicateProperty {
                kind: kind.name.clone(),
                property: attribute.name.clone(),
            });
        }
        if attribute.primary_key {
            if let Some(first) = primary_key {
                return Err(SchemaError::MultiplePrimaryKeys {
                    kind: kind.name.clone(),
                    first: first.to_string(),
                    second: attribute.name.clone(),
                });
            }
            if attribute.attribute_type == AttributeType::Binary {
                return Err(SchemaError::InvalidPrimaryKey {
                    kind: kind.name.clone(),
                    attribute: attribute.name.clone(),
                    reason: "binary attributes have no stable identity".into(),
                });
            }
            primary_key = Some(&attribute.name);
        }
        if let Some(pattern) = &attribute.date_format {
            if attribute.attribute_type != AttributeType::Date {
                return Err(SchemaError::DateFormatOnNonDate {
                    kind: kind.name.clone(),
                    attribute: attribute.name.clone(),
                });
            }
            DateFormat::new(pattern)?;
        }
    }

    for relationship in &kind.relationships {
        if !names.insert(relationship.name.as_str()) {
            return Err(SchemaError::DuplicateProperty {
                kind: kind.name.clone(),
                property: relationship.name.clone(),
            });
        }
        if !index.contains_key(&relationship.target) {
            return Err(SchemaError::UnknownTarget {
                kind: kind.name.clone(),
                relationship: relationship.name.clone(),
                target: relationship.target.clone(),
            });
        }
    }

    Ok(())
}
