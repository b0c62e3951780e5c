//! The type catalog: named entities, their kinds and their fields.
//!
//! A [`TypeCatalog`] is immutable once built. It is produced either with a
//! [`CatalogBuilder`] or by deserializing a catalog document:
//!
//! ```toml
//! [types.Query]
//! kind = "object"
//! fields = { user = "User", users = "[User!]!" }
//!
//! [types.User]
//! kind = "object"
//! fields = { name = "String!" }
//! ```
//!
//! Field types are written as GraphQL-style references. Built-in scalars
//! (`String`, `Int`, `Float`, `Boolean`, `ID`) may be referenced without
//! being declared; they are added to the catalog implicitly.

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::identifier::Id;

/// Scalars every catalog understands without a declaration.
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// Errors raised while building or loading a catalog.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("invalid type reference `{input}`: {reason}")]
    InvalidTypeRef { input: String, reason: &'static str },

    #[error("field `{entity}.{field}` references unknown type `{target}`")]
    UnknownFieldTarget {
        entity: String,
        field: String,
        target: String,
    },

    #[error("{kind} `{entity}` cannot declare fields")]
    FieldsOnLeaf { entity: String, kind: EntityKind },

    #[error("type `{0}` is declared more than once")]
    DuplicateEntity(String),
}

/// Explicit kind tag of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
    InputObject,
}

impl EntityKind {
    /// Object-like entities, the only kind pulled into a focused view purely
    /// because it relates to the focus.
    pub fn is_composite(self) -> bool {
        matches!(self, Self::Object)
    }

    /// Returns true for kinds that may own fields.
    pub fn has_fields(self) -> bool {
        matches!(self, Self::Object | Self::Interface | Self::InputObject)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Interface => "interface",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::Scalar => "scalar",
            Self::InputObject => "input object",
        };
        f.write_str(name)
    }
}

/// A field's type: the named entity it resolves to plus its wrapping.
///
/// # Examples
///
/// ```
/// use typescope_core::catalog::TypeRef;
///
/// let type_ref: TypeRef = "[Post!]!".parse().unwrap();
/// assert_eq!(type_ref.target(), "Post");
/// assert!(type_ref.is_list());
/// assert!(!type_ref.is_nullable());
/// assert_eq!(type_ref.to_string(), "[Post!]!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    target: Id,
    list: bool,
    nullable: bool,
    display: String,
}

impl TypeRef {
    /// The named type at the core of the reference.
    pub fn target(&self) -> Id {
        self.target
    }

    /// True when any list wrapper is present.
    pub fn is_list(&self) -> bool {
        self.list
    }

    /// True when the outermost type accepts null.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    fn parse_inner(input: &str) -> Result<(&str, bool), &'static str> {
        let inner = input.strip_suffix('!').unwrap_or(input);
        if let Some(rest) = inner.strip_prefix('[') {
            let rest = rest.strip_suffix(']').ok_or("unbalanced list brackets")?;
            let (name, _) = Self::parse_inner(rest)?;
            return Ok((name, true));
        }
        if inner.contains(['[', ']', '!']) {
            return Err("misplaced wrapper");
        }
        let mut chars = inner.chars();
        match chars.next() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
            Some(_) => return Err("type name must start with a letter or underscore"),
            None => return Err("empty type name"),
        }
        if !chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
            return Err("type name contains invalid characters");
        }
        Ok((inner, false))
    }
}

impl FromStr for TypeRef {
    type Err = CatalogError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let display: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let (name, list) =
            Self::parse_inner(&display).map_err(|reason| CatalogError::InvalidTypeRef {
                input: input.to_string(),
                reason,
            })?;
        Ok(Self {
            target: Id::new(name),
            list,
            nullable: !display.ends_with('!'),
            display,
        })
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// A named field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: Id,
    type_ref: TypeRef,
}

impl Field {
    pub fn new(name: Id, type_ref: TypeRef) -> Self {
        Self { name, type_ref }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }
}

/// A named item of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: Id,
    kind: EntityKind,
    fields: IndexMap<Id, Field>,
}

impl Entity {
    /// Creates an entity without fields.
    pub fn new(id: Id, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            fields: IndexMap::new(),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn field(&self, name: Id) -> Option<&Field> {
        self.fields.get(&name)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Hash of the field set (names and type references, in order).
    ///
    /// Two snapshots of the same entity with equal fingerprints draw the same
    /// node, so a cached node may be reused.
    pub fn shape_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.kind.hash(&mut hasher);
        for field in self.fields.values() {
            field.name.to_text().hash(&mut hasher);
            field.type_ref.display.hash(&mut hasher);
        }
        hasher.finish()
    }

    fn insert_field(&mut self, field: Field) {
        self.fields.insert(field.name, field);
    }
}

/// Immutable mapping from entity name to entity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "CatalogDocument")]
pub struct TypeCatalog {
    entities: IndexMap<Id, Entity>,
}

impl TypeCatalog {
    /// Starts building a catalog.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn get(&self, id: Id) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entities in declaration order, implicit scalars last.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Incremental builder for [`TypeCatalog`].
///
/// The first invalid declaration is remembered and reported by
/// [`CatalogBuilder::build`], so calls can be chained freely.
///
/// # Examples
///
/// ```
/// use typescope_core::catalog::{EntityKind, TypeCatalog};
///
/// let catalog = TypeCatalog::builder()
///     .entity("Query", EntityKind::Object, [("user", "User")])
///     .entity("User", EntityKind::Object, [("name", "String!")])
///     .build()
///     .unwrap();
///
/// assert_eq!(catalog.len(), 3); // Query, User and the implicit String
/// ```
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entities: IndexMap<Id, Entity>,
    error: Option<CatalogError>,
}

impl CatalogBuilder {
    /// Declares an entity with `(field name, type reference)` pairs.
    pub fn entity<'a>(
        mut self,
        name: &str,
        kind: EntityKind,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(err) = self.try_add(name, kind, fields) {
            self.error = Some(err);
        }
        self
    }

    fn try_add<'a>(
        &mut self,
        name: &str,
        kind: EntityKind,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<(), CatalogError> {
        let id = Id::new(name);
        if self.entities.contains_key(&id) {
            return Err(CatalogError::DuplicateEntity(name.to_string()));
        }
        let mut entity = Entity::new(id, kind);
        for (field_name, type_ref) in fields {
            if !kind.has_fields() {
                return Err(CatalogError::FieldsOnLeaf {
                    entity: name.to_string(),
                    kind,
                });
            }
            entity.insert_field(Field::new(Id::new(field_name), type_ref.parse()?));
        }
        self.entities.insert(id, entity);
        Ok(())
    }

    /// Validates field targets and returns the catalog.
    ///
    /// # Errors
    ///
    /// Returns the first declaration error, or
    /// [`CatalogError::UnknownFieldTarget`] when a field references a type that
    /// is neither declared nor a built-in scalar.
    pub fn build(mut self) -> Result<TypeCatalog, CatalogError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut implicit = Vec::new();
        for entity in self.entities.values() {
            for field in entity.fields() {
                let target = field.type_ref().target();
                if self.entities.contains_key(&target) || implicit.contains(&target) {
                    continue;
                }
                if BUILTIN_SCALARS.iter().any(|scalar| target == *scalar) {
                    implicit.push(target);
                    continue;
                }
                return Err(CatalogError::UnknownFieldTarget {
                    entity: entity.id().to_text(),
                    field: field.name().to_text(),
                    target: target.to_text(),
                });
            }
        }
        for id in implicit {
            self.entities.insert(id, Entity::new(id, EntityKind::Scalar));
        }

        Ok(TypeCatalog {
            entities: self.entities,
        })
    }
}

/// Serialized form of a catalog, keyed by type name.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    #[serde(default)]
    types: IndexMap<String, EntityDocument>,
}

#[derive(Debug, Deserialize)]
struct EntityDocument {
    kind: EntityKind,
    #[serde(default)]
    fields: IndexMap<String, String>,
}

impl TryFrom<CatalogDocument> for TypeCatalog {
    type Error = CatalogError;

    fn try_from(document: CatalogDocument) -> Result<Self, Self::Error> {
        document
            .types
            .iter()
            .fold(TypeCatalog::builder(), |builder, (name, entity)| {
                builder.entity(
                    name,
                    entity.kind,
                    entity
                        .fields
                        .iter()
                        .map(|(field, type_ref)| (field.as_str(), type_ref.as_str())),
                )
            })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> TypeCatalog {
        TypeCatalog::builder()
            .entity("Query", EntityKind::Object, [("user", "User"), ("users", "[User!]!")])
            .entity("User", EntityKind::Object, [("name", "String!"), ("role", "Role")])
            .entity("Role", EntityKind::Enum, [])
            .build()
            .expect("sample catalog is valid")
    }

    #[test]
    fn test_type_ref_parse_plain() {
        let type_ref: TypeRef = "User".parse().unwrap();
        assert_eq!(type_ref.target(), "User");
        assert!(!type_ref.is_list());
        assert!(type_ref.is_nullable());
    }

    #[test]
    fn test_type_ref_parse_nested_list() {
        let type_ref: TypeRef = "[[ Post! ]]!".parse().unwrap();
        assert_eq!(type_ref.target(), "Post");
        assert!(type_ref.is_list());
        assert!(!type_ref.is_nullable());
        assert_eq!(type_ref.to_string(), "[[Post!]]!");
    }

    #[test]
    fn test_type_ref_parse_errors() {
        for input in ["", "[User", "User]", "1User", "Us-er", "User!!", "[]"] {
            assert!(
                matches!(
                    input.parse::<TypeRef>(),
                    Err(CatalogError::InvalidTypeRef { .. })
                ),
                "`{input}` should be rejected"
            );
        }
    }

    #[test]
    fn test_builder_adds_implicit_scalars() {
        let catalog = sample_catalog();
        let string = catalog.get(Id::new("String")).expect("String is implicit");
        assert_eq!(string.kind(), EntityKind::Scalar);
        assert!(!catalog.contains(Id::new("Int")));
    }

    #[test]
    fn test_builder_rejects_unknown_target() {
        let err = TypeCatalog::builder()
            .entity("Query", EntityKind::Object, [("post", "Post")])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnknownFieldTarget {
                entity: "Query".to_string(),
                field: "post".to_string(),
                target: "Post".to_string(),
            }
        );
    }

    #[test]
    fn test_builder_rejects_fields_on_leaf_kinds() {
        let err = TypeCatalog::builder()
            .entity("Role", EntityKind::Enum, [("x", "String")])
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::FieldsOnLeaf { .. }));
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let err = TypeCatalog::builder()
            .entity("User", EntityKind::Object, [])
            .entity("User", EntityKind::Object, [])
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateEntity("User".to_string()));
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let catalog = sample_catalog();
        let query = catalog.get(Id::new("Query")).unwrap();
        let names: Vec<_> = query.fields().map(|field| field.name().to_text()).collect();
        assert_eq!(names, vec!["user", "users"]);
    }

    #[test]
    fn test_shape_fingerprint_tracks_field_set() {
        let a = sample_catalog();
        let b = TypeCatalog::builder()
            .entity("User", EntityKind::Object, [("name", "String")])
            .build()
            .unwrap();

        let user_a = a.get(Id::new("User")).unwrap();
        let user_b = b.get(Id::new("User")).unwrap();
        assert_ne!(user_a.shape_fingerprint(), user_b.shape_fingerprint());
        assert_eq!(
            user_a.shape_fingerprint(),
            sample_catalog().get(Id::new("User")).unwrap().shape_fingerprint()
        );
    }

    #[test]
    fn test_deserialize_toml() {
        let source = r#"
            [types.Query]
            kind = "object"
            fields = { user = "User" }

            [types.User]
            kind = "object"
            fields = { id = "ID!", friends = "[User]" }
        "#;
        let catalog: TypeCatalog = toml::from_str(source).unwrap();
        assert!(catalog.contains(Id::new("Query")));
        assert!(catalog.contains(Id::new("ID")));
        assert_eq!(catalog.get(Id::new("User")).unwrap().field_count(), 2);
    }

    #[test]
    fn test_deserialize_json_reports_catalog_errors() {
        let source = r#"{ "types": { "Query": { "kind": "object", "fields": { "x": "Missing" } } } }"#;
        let err = serde_json::from_str::<TypeCatalog>(source).unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }
}
