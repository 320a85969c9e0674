use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, ParseError};
use crate::er_parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeKind {
    #[default]
    Plain,
    Key,
    WeakKey,
    Derived,
    Multivalued,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
    pub subattributes: Vec<Attribute>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            subattributes: Vec::new(),
        }
    }

    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Plain)
    }

    pub fn composite(name: impl Into<String>, subattributes: Vec<Attribute>) -> Self {
        Self::plain(name).with_subattributes(subattributes)
    }

    pub fn with_subattributes(mut self, subattributes: Vec<Attribute>) -> Self {
        self.subattributes = subattributes;
        self
    }

    pub fn is_composite(&self) -> bool {
        !self.subattributes.is_empty()
    }

    pub fn tree(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, indent: usize) {
        out.push_str(&" ".repeat(indent));
        out.push_str(&self.name);
        out.push_str(&format!(": {:?}", self.kind));
        if self.is_composite() {
            out.push_str(" [composite]");
        }
        out.push('\n');
        for sub in &self.subattributes {
            sub.write_tree(out, indent + 2);
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AttributeKind::Plain => write!(f, "{}", self.name)?,
            AttributeKind::Key => write!(f, "*{}", self.name)?,
            AttributeKind::WeakKey => write!(f, "+{}", self.name)?,
            AttributeKind::Derived => write!(f, "~{}", self.name)?,
            AttributeKind::Multivalued => write!(f, "{}[]", self.name)?,
        }
        if self.is_composite() {
            write!(f, ":")?;
            for sub in &self.subattributes {
                write!(f, " {sub}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Entity {
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    pub fn parse<'a>(
        name: impl Into<String>,
        definitions: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ParseError> {
        Ok(Self::new(name, er_parser::parse_attributes(definitions)?))
    }

    pub fn is_weak(&self) -> bool {
        !self
            .attributes
            .iter()
            .any(|attr| attr.kind == AttributeKind::Key)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, attr) in self.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{attr}")?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Count {
    AtLeastOne,
    ZeroOrOne,
    Any,
    Exactly(u32),
}

impl Count {
    pub fn is_optional(self) -> bool {
        matches!(self, Count::ZeroOrOne | Count::Any | Count::Exactly(0))
    }
}

impl From<u32> for Count {
    fn from(n: u32) -> Self {
        Count::Exactly(n)
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Count::AtLeastOne => write!(f, "1..*"),
            Count::ZeroOrOne => write!(f, "0..1"),
            Count::Any => write!(f, "0..*"),
            Count::Exactly(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EntitySpec {
    Bare(Arc<Entity>),
    WithCount(Arc<Entity>, Count),
    WithCountAndRole(Arc<Entity>, Count, String),
}

impl From<Arc<Entity>> for EntitySpec {
    fn from(entity: Arc<Entity>) -> Self {
        EntitySpec::Bare(entity)
    }
}

impl From<&Arc<Entity>> for EntitySpec {
    fn from(entity: &Arc<Entity>) -> Self {
        EntitySpec::Bare(Arc::clone(entity))
    }
}

impl From<(Arc<Entity>, Count)> for EntitySpec {
    fn from((entity, count): (Arc<Entity>, Count)) -> Self {
        EntitySpec::WithCount(entity, count)
    }
}

impl From<(&Arc<Entity>, Count)> for EntitySpec {
    fn from((entity, count): (&Arc<Entity>, Count)) -> Self {
        EntitySpec::WithCount(Arc::clone(entity), count)
    }
}

impl<R: Into<String>> From<(Arc<Entity>, Count, R)> for EntitySpec {
    fn from((entity, count, role): (Arc<Entity>, Count, R)) -> Self {
        EntitySpec::WithCountAndRole(entity, count, role.into())
    }
}

impl<R: Into<String>> From<(&Arc<Entity>, Count, R)> for EntitySpec {
    fn from((entity, count, role): (&Arc<Entity>, Count, R)) -> Self {
        EntitySpec::WithCountAndRole(Arc::clone(entity), count, role.into())
    }
}

/// A participant of a relation.
///
/// `count` is read from the other side: how many of *this* entity each
/// instance of the other participants is associated with. People own many
/// pens and each pen has one owner, so the pen side carries
/// `Count::AtLeastOne` and the person side `Count::Exactly(1)`.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub entity: Arc<Entity>,
    pub count: Option<Count>,
    pub role: Option<String>,
}

impl From<EntitySpec> for EntityInfo {
    fn from(spec: EntitySpec) -> Self {
        match spec {
            EntitySpec::Bare(entity) => EntityInfo {
                entity,
                count: None,
                role: None,
            },
            EntitySpec::WithCount(entity, count) => EntityInfo {
                entity,
                count: Some(count),
                role: None,
            },
            EntitySpec::WithCountAndRole(entity, count, role) => EntityInfo {
                entity,
                count: Some(count),
                role: Some(role),
            },
        }
    }
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.entity.name)?;
        if let Some(role) = &self.role {
            write!(f, " AS {role}")?;
        }
        if let Some(count) = self.count {
            write!(f, " * {count}")?;
        }
        write!(f, ">")
    }
}

#[derive(Debug, Clone)]
pub struct Relation {
    entity_infos: Vec<EntityInfo>,
    name: Option<String>,
    is_identifying: bool,
    attributes: Vec<Attribute>,
}

pub(crate) const UNNAMED: &str = "<unnamed>";

impl Relation {
    pub fn builder() -> RelationBuilder {
        RelationBuilder::default()
    }

    pub fn entity_infos(&self) -> &[EntityInfo] {
        &self.entity_infos
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(UNNAMED)
    }

    pub fn is_identifying(&self) -> bool {
        self.is_identifying
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn has_cardinality(&self) -> bool {
        self.entity_infos
            .first()
            .is_some_and(|info| info.count.is_some())
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.display_name())?;
        for (i, info) in self.entity_infos.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{info}")?;
        }
        write!(f, ")")?;
        if self.is_identifying {
            write!(f, " identifying")?;
        }
        if !self.attributes.is_empty() {
            write!(f, " {{")?;
            for (i, attr) in self.attributes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{attr}")?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RelationBuilder {
    entity_infos: Vec<EntityInfo>,
    name: Option<String>,
    is_identifying: bool,
    attributes: Vec<Attribute>,
}

impl RelationBuilder {
    pub fn entity(mut self, spec: impl Into<EntitySpec>) -> Self {
        self.entity_infos.push(EntityInfo::from(spec.into()));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn identifying(mut self, is_identifying: bool) -> Self {
        self.is_identifying = is_identifying;
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn build(self) -> Result<Relation, ModelError> {
        let relation = self.name.as_deref().unwrap_or(UNNAMED);

        if self.entity_infos.len() < 2 {
            return Err(ModelError::TooFewEntities {
                relation: relation.to_string(),
                found: self.entity_infos.len(),
            });
        }

        let has_cardinality = self.entity_infos[0].count.is_some();
        if let Some(odd) = self
            .entity_infos
            .iter()
            .find(|info| info.count.is_some() != has_cardinality)
        {
            return Err(ModelError::MixedCardinality {
                relation: relation.to_string(),
                entity: odd.entity.name.clone(),
            });
        }

        Ok(Relation {
            entity_infos: self.entity_infos,
            name: self.name,
            is_identifying: self.is_identifying,
            attributes: self.attributes,
        })
    }
}
