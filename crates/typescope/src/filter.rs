//! Selection of the entities drawn for a focus.

use typescope_core::{
    catalog::{Entity, TypeCatalog},
    identifier::Id,
    introspection::TypeIntrospection,
};

/// Focus sentinel selecting the overview of the root operations.
pub const ROOT_FOCUS: &str = "root";

/// Names of the root operation entities.
pub const ROOT_OPERATIONS: [&str; 2] = ["Query", "Mutation"];

/// Returns the entities eligible to be drawn for `focus`, in catalog order.
///
/// Filtered and base entities are never selected. With the `root` focus the
/// root operations and every entity related to one of them (in either
/// direction) are selected. Any other focus selects the focus entity itself
/// plus the composite entities related to it in either direction.
///
/// # Examples
///
/// ```
/// use typescope::filter::select_render_set;
/// use typescope_core::{
///     catalog::{EntityKind, TypeCatalog},
///     introspection::SchemaIntrospection,
/// };
///
/// let catalog = TypeCatalog::builder()
///     .entity("Query", EntityKind::Object, [("user", "User")])
///     .entity("User", EntityKind::Object, [("name", "String")])
///     .build()
///     .unwrap();
///
/// let selected = select_render_set(&catalog, "root", &SchemaIntrospection::default());
/// let names: Vec<String> = selected.iter().map(|e| e.id().to_text()).collect();
/// assert_eq!(names, ["Query", "User"]);
/// ```
pub fn select_render_set<'c>(
    catalog: &'c TypeCatalog,
    focus: &str,
    introspection: &dyn TypeIntrospection,
) -> Vec<&'c Entity> {
    let related = |a: &Entity, b: &Entity| {
        introspection.is_related_type(a, b) || introspection.is_related_type(b, a)
    };
    let hidden = |entity: &Entity| {
        introspection.is_filtered_entity(entity) || introspection.is_base_entity(entity)
    };

    if focus == ROOT_FOCUS {
        let roots: Vec<&Entity> = ROOT_OPERATIONS
            .iter()
            .filter_map(|name| catalog.get(Id::new(name)))
            .collect();

        return catalog
            .entities()
            .filter(|entity| !hidden(entity))
            .filter(|entity| {
                roots
                    .iter()
                    .any(|root| root.id() == entity.id() || related(entity, root))
            })
            .collect();
    }

    let focus_id = Id::new(focus);
    let Some(focused) = catalog.get(focus_id) else {
        return Vec::new();
    };

    catalog
        .entities()
        .filter(|entity| !hidden(entity))
        .filter(|entity| {
            entity.id() == focus_id || (entity.kind().is_composite() && related(entity, focused))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use typescope_core::{catalog::EntityKind, introspection::SchemaIntrospection};

    use super::*;

    fn names(entities: &[&Entity]) -> Vec<String> {
        entities.iter().map(|entity| entity.id().to_text()).collect()
    }

    fn blog() -> TypeCatalog {
        TypeCatalog::builder()
            .entity("Query", EntityKind::Object, [("user", "User"), ("search", "SearchResult")])
            .entity(
                "Mutation",
                EntityKind::Object,
                [("createPost", "Post!"), ("ping", "Boolean")],
            )
            .entity(
                "User",
                EntityKind::Object,
                [("name", "String"), ("posts", "[Post!]!"), ("role", "Role")],
            )
            .entity("Post", EntityKind::Object, [("author", "User"), ("node", "Node")])
            .entity("Comment", EntityKind::Object, [("post", "Post")])
            .entity("Node", EntityKind::Interface, [("id", "ID!")])
            .entity("Role", EntityKind::Enum, [])
            .entity("SearchResult", EntityKind::Union, [])
            .entity("__Schema", EntityKind::Object, [("query", "Query")])
            .build()
            .unwrap()
    }

    #[test]
    fn test_root_selects_operations_and_their_neighbours() {
        let catalog = blog();
        let selected = select_render_set(&catalog, ROOT_FOCUS, &SchemaIntrospection::default());
        assert_eq!(
            names(&selected),
            ["Query", "Mutation", "User", "Post", "SearchResult"]
        );
    }

    #[test]
    fn test_root_checks_both_directions() {
        let catalog = TypeCatalog::builder()
            .entity("Query", EntityKind::Object, [])
            .entity("Viewer", EntityKind::Object, [("root", "Query")])
            .build()
            .unwrap();
        let selected = select_render_set(&catalog, ROOT_FOCUS, &SchemaIntrospection::default());
        assert_eq!(names(&selected), ["Query", "Viewer"]);
    }

    #[test]
    fn test_focus_selects_related_composites_only() {
        let catalog = blog();
        let selected = select_render_set(&catalog, "User", &SchemaIntrospection::default());
        // Role is related but an enum; String is a base scalar.
        assert_eq!(names(&selected), ["Query", "User", "Post"]);
    }

    #[test]
    fn test_non_composite_focus_is_itself_selected() {
        let catalog = blog();
        let selected = select_render_set(&catalog, "Node", &SchemaIntrospection::default());
        assert_eq!(names(&selected), ["Post", "Node"]);
    }

    #[test]
    fn test_filtered_entities_are_never_selected() {
        let catalog = blog();
        let rules = SchemaIntrospection::default().with_hidden(["Post"]);
        let selected = select_render_set(&catalog, "User", &rules);
        assert_eq!(names(&selected), ["Query", "User"]);

        // A filtered focus is not drawn itself, its composite neighbours are.
        let selected = select_render_set(&catalog, "__Schema", &rules);
        assert_eq!(names(&selected), ["Query"]);
    }

    #[test]
    fn test_unknown_focus_selects_nothing() {
        let catalog = blog();
        let selected = select_render_set(&catalog, "Missing", &SchemaIntrospection::default());
        assert!(selected.is_empty());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = TypeCatalog::default();
        let selected = select_render_set(&catalog, ROOT_FOCUS, &SchemaIntrospection::default());
        assert!(selected.is_empty());
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use typescope_core::{catalog::EntityKind, introspection::SchemaIntrospection};

    use super::*;

    const NAMES: [&str; 6] = ["Query", "Mutation", "A", "B", "C", "D"];

    fn catalog_strategy() -> impl Strategy<Value = TypeCatalog> {
        let kinds = prop::collection::vec(prop::bool::ANY, NAMES.len());
        let links = prop::collection::vec((0..NAMES.len(), 0..NAMES.len()), 0..12);
        (kinds, links).prop_map(|(objects, links)| {
            let mut builder = TypeCatalog::builder();
            for (idx, name) in NAMES.iter().enumerate() {
                let kind = if objects[idx] || idx < 2 {
                    EntityKind::Object
                } else {
                    EntityKind::Interface
                };
                let fields: Vec<(String, &str)> = links
                    .iter()
                    .enumerate()
                    .filter(|(_, (source, _))| *source == idx)
                    .map(|(n, (_, target))| (format!("f{n}"), NAMES[*target]))
                    .collect();
                builder = builder.entity(
                    name,
                    kind,
                    fields.iter().map(|(field, target)| (field.as_str(), *target)),
                );
            }
            builder.build().unwrap()
        })
    }

    proptest! {
        #[test]
        fn root_selection_matches_definition(catalog in catalog_strategy()) {
            let rules = SchemaIntrospection::default();
            let selected: Vec<Id> = select_render_set(&catalog, ROOT_FOCUS, &rules)
                .iter()
                .map(|entity| entity.id())
                .collect();

            for entity in catalog.entities() {
                let expected = !rules.is_base_entity(entity)
                    && ROOT_OPERATIONS.iter().filter_map(|name| catalog.get(Id::new(name))).any(|root| {
                        root.id() == entity.id()
                            || rules.is_related_type(entity, root)
                            || rules.is_related_type(root, entity)
                    });
                prop_assert_eq!(selected.contains(&entity.id()), expected);
            }
        }

        #[test]
        fn focus_selection_matches_definition(catalog in catalog_strategy(), focus in 0..NAMES.len()) {
            let rules = SchemaIntrospection::default();
            let focus = NAMES[focus];
            let focused = catalog.get(Id::new(focus)).unwrap();
            let selected: Vec<Id> = select_render_set(&catalog, focus, &rules)
                .iter()
                .map(|entity| entity.id())
                .collect();

            for entity in catalog.entities() {
                let expected = !rules.is_base_entity(entity)
                    && (entity.id() == focused.id()
                        || (entity.kind() == EntityKind::Object
                            && (rules.is_related_type(entity, focused)
                                || rules.is_related_type(focused, entity))));
                prop_assert_eq!(selected.contains(&entity.id()), expected);
            }
        }
    }
}
