//! Questions the graph pipeline asks about catalog entities.
//!
//! The pipeline never inspects entities directly to decide whether they are
//! hidden, built in or related to each other. It goes through
//! [`TypeIntrospection`], so hosts with different schema conventions can plug
//! in their own rules. [`SchemaIntrospection`] implements the conventions of a
//! GraphQL schema.

use std::collections::HashSet;

use crate::{
    catalog::{BUILTIN_SCALARS, Entity, TypeCatalog, TypeRef},
    identifier::Id,
};

/// Predicates over catalog entities. All methods must be pure.
pub trait TypeIntrospection {
    /// Entities that are never drawn, whatever the focus.
    fn is_filtered_entity(&self, entity: &Entity) -> bool;

    /// Built-in leaf entities that are never drawn.
    fn is_base_entity(&self, entity: &Entity) -> bool;

    /// True when `from` owns a field whose type resolves to `to`.
    ///
    /// The relation is directional; callers wanting "related in either
    /// direction" check both orders.
    fn is_related_type(&self, from: &Entity, to: &Entity) -> bool;

    /// Resolves a field type to the catalog entity it names.
    fn resolve_field_target<'c>(
        &self,
        catalog: &'c TypeCatalog,
        type_ref: &TypeRef,
    ) -> Option<&'c Entity>;

    /// Label shown next to a field's outgoing port.
    fn field_display_label(&self, type_ref: &TypeRef) -> String;
}

/// GraphQL conventions: `__`-prefixed introspection types are filtered,
/// built-in scalars are base entities.
///
/// # Examples
///
/// ```
/// use typescope_core::{
///     catalog::{EntityKind, TypeCatalog},
///     identifier::Id,
///     introspection::{SchemaIntrospection, TypeIntrospection},
/// };
///
/// let catalog = TypeCatalog::builder()
///     .entity("Query", EntityKind::Object, [("user", "User")])
///     .entity("User", EntityKind::Object, [("name", "String")])
///     .entity("__Schema", EntityKind::Object, [])
///     .build()
///     .unwrap();
/// let rules = SchemaIntrospection::default();
///
/// let query = catalog.get(Id::new("Query")).unwrap();
/// let user = catalog.get(Id::new("User")).unwrap();
/// assert!(rules.is_related_type(query, user));
/// assert!(!rules.is_related_type(user, query));
/// assert!(rules.is_filtered_entity(catalog.get(Id::new("__Schema")).unwrap()));
/// assert!(rules.is_base_entity(catalog.get(Id::new("String")).unwrap()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaIntrospection {
    hidden: HashSet<Id>,
}

impl SchemaIntrospection {
    /// Additionally filters the named entities.
    pub fn with_hidden<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.hidden.extend(names.into_iter().map(Id::new));
        self
    }
}

impl TypeIntrospection for SchemaIntrospection {
    fn is_filtered_entity(&self, entity: &Entity) -> bool {
        self.hidden.contains(&entity.id()) || entity.id().to_text().starts_with("__")
    }

    fn is_base_entity(&self, entity: &Entity) -> bool {
        BUILTIN_SCALARS.iter().any(|scalar| entity.id() == *scalar)
    }

    fn is_related_type(&self, from: &Entity, to: &Entity) -> bool {
        from.fields()
            .any(|field| field.type_ref().target() == to.id())
    }

    fn resolve_field_target<'c>(
        &self,
        catalog: &'c TypeCatalog,
        type_ref: &TypeRef,
    ) -> Option<&'c Entity> {
        catalog.get(type_ref.target())
    }

    fn field_display_label(&self, type_ref: &TypeRef) -> String {
        type_ref.to_string()
    }
}
