//! Identity cache of constructed elements.
//!
//! The cache outlives the drawn graph: an entity that leaves the render set is
//! removed from the surface but keeps its cache entry, so when it comes back
//! the very same handle is drawn again. Entries are only evicted when the
//! catalog changes the shape of the entity they depict (see
//! [`IdentityCache::stale`]).

use indexmap::IndexMap;
use log::trace;

use typescope_core::{catalog::TypeCatalog, identifier::Id};

use crate::surface::{EdgeHandle, EdgeKey, Element, NodeHandle};

/// A cached node and the shape it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CachedNode {
    handle: NodeHandle,
    fingerprint: u64,
}

/// Entries picked by [`IdentityCache::stale`] or dropped by
/// [`IdentityCache::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evicted {
    pub nodes: Vec<(Id, NodeHandle)>,
    pub edges: Vec<(EdgeKey, EdgeHandle)>,
}

impl Evicted {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Every evicted handle, nodes first.
    pub fn elements(&self) -> Vec<Element> {
        self.nodes
            .iter()
            .map(|(_, handle)| Element::Node(*handle))
            .chain(self.edges.iter().map(|(_, handle)| Element::Edge(*handle)))
            .collect()
    }
}

/// Handles keyed by entity id (nodes) and by `(source, target)` (edges).
#[derive(Debug, Clone, Default)]
pub struct IdentityCache {
    nodes: IndexMap<Id, CachedNode>,
    edges: IndexMap<EdgeKey, EdgeHandle>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: Id) -> Option<NodeHandle> {
        self.nodes.get(&id).map(|cached| cached.handle)
    }

    /// Records a node built from an entity with the given shape fingerprint.
    pub fn insert_node(&mut self, id: Id, handle: NodeHandle, fingerprint: u64) {
        self.nodes.insert(
            id,
            CachedNode {
                handle,
                fingerprint,
            },
        );
    }

    pub fn edge(&self, key: EdgeKey) -> Option<EdgeHandle> {
        self.edges.get(&key).copied()
    }

    pub fn insert_edge(&mut self, key: EdgeKey, handle: EdgeHandle) {
        self.edges.insert(key, handle);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Forgets every entry and returns what was cached. Handles are not
    /// released.
    pub fn clear(&mut self) -> Evicted {
        Evicted {
            nodes: self
                .nodes
                .drain(..)
                .map(|(id, cached)| (id, cached.handle))
                .collect(),
            edges: self.edges.drain(..).collect(),
        }
    }

    /// Entries that no longer depict `catalog`. The cache is left as is;
    /// commit with [`IdentityCache::evict`].
    ///
    /// A node entry is stale when its entity disappeared or its field set
    /// changed. An edge entry is stale when either endpoint is or the source
    /// no longer has a field resolving to the target.
    pub fn stale(&self, catalog: &TypeCatalog) -> Evicted {
        let nodes: Vec<(Id, NodeHandle)> = self
            .nodes
            .iter()
            .filter(|(id, cached)| {
                !catalog
                    .get(**id)
                    .is_some_and(|entity| entity.shape_fingerprint() == cached.fingerprint)
            })
            .map(|(id, cached)| (*id, cached.handle))
            .collect();

        let edges = self
            .edges
            .iter()
            .filter(|(key, _)| {
                let related = catalog.get(key.source()).is_some_and(|source| {
                    catalog.contains(key.target())
                        && source
                            .fields()
                            .any(|field| field.type_ref().target() == key.target())
                });
                !related || nodes.iter().any(|(id, _)| key.touches(*id))
            })
            .map(|(key, handle)| (*key, *handle))
            .collect();

        Evicted { nodes, edges }
    }

    /// Drops the given entries.
    pub fn evict(&mut self, evicted: &Evicted) {
        for (id, _) in &evicted.nodes {
            trace!(id:% = id; "Evicting cached node");
            self.nodes.shift_remove(id);
        }
        for (key, _) in &evicted.edges {
            trace!(edge:% = key; "Evicting cached edge");
            self.edges.shift_remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use typescope_core::catalog::EntityKind;

    use super::*;

    fn catalog(user_fields: &[(&str, &str)]) -> TypeCatalog {
        TypeCatalog::builder()
            .entity("Query", EntityKind::Object, [("user", "User")])
            .entity("User", EntityKind::Object, user_fields.iter().copied())
            .entity("Post", EntityKind::Object, [("title", "String")])
            .build()
            .unwrap()
    }

    fn fingerprint(catalog: &TypeCatalog, name: &str) -> u64 {
        catalog.get(Id::new(name)).unwrap().shape_fingerprint()
    }

    fn populated(catalog: &TypeCatalog) -> IdentityCache {
        let mut cache = IdentityCache::new();
        for (raw, name) in ["Query", "User", "Post"].into_iter().enumerate() {
            cache.insert_node(
                Id::new(name),
                NodeHandle::new(raw as u64),
                fingerprint(catalog, name),
            );
        }
        cache.insert_edge(
            EdgeKey::new(Id::new("Query"), Id::new("User")),
            EdgeHandle::new(10),
        );
        cache.insert_edge(
            EdgeKey::new(Id::new("User"), Id::new("Post")),
            EdgeHandle::new(11),
        );
        cache
    }

    #[test]
    fn test_lookups() {
        let catalog = catalog(&[("posts", "[Post]")]);
        let cache = populated(&catalog);
        assert_eq!(cache.node(Id::new("User")), Some(NodeHandle::new(1)));
        assert_eq!(cache.node(Id::new("Missing")), None);
        assert_eq!(
            cache.edge(EdgeKey::new(Id::new("Query"), Id::new("User"))),
            Some(EdgeHandle::new(10))
        );
        assert_eq!(cache.node_count(), 3);
        assert_eq!(cache.edge_count(), 2);
    }

    #[test]
    fn test_unchanged_catalog_evicts_nothing() {
        let catalog = catalog(&[("posts", "[Post]")]);
        let mut cache = populated(&catalog);
        let evicted = cache.stale(&catalog);
        assert!(evicted.is_empty());
        assert_eq!(cache.node_count(), 3);
    }

    #[test]
    fn test_changed_shape_evicts_node_and_its_edges() {
        let before = catalog(&[("posts", "[Post]")]);
        let mut cache = populated(&before);

        let after = catalog(&[("posts", "[Post]"), ("name", "String")]);
        let evicted = cache.stale(&after);
        assert_eq!(cache.node(Id::new("User")), Some(NodeHandle::new(1)));
        cache.evict(&evicted);

        assert_eq!(evicted.nodes, vec![(Id::new("User"), NodeHandle::new(1))]);
        assert_eq!(evicted.edges.len(), 2);
        assert_eq!(cache.node(Id::new("User")), None);
        assert_eq!(cache.node(Id::new("Query")), Some(NodeHandle::new(0)));
        assert_eq!(cache.edge_count(), 0);
        assert_eq!(
            evicted.elements().first(),
            Some(&Element::Node(NodeHandle::new(1)))
        );
    }

    #[test]
    fn test_removed_entity_is_evicted() {
        let before = catalog(&[]);
        let mut cache = IdentityCache::new();
        cache.insert_node(Id::new("User"), NodeHandle::new(1), fingerprint(&before, "User"));
        cache.insert_node(Id::new("Post"), NodeHandle::new(2), fingerprint(&before, "Post"));

        let after = TypeCatalog::builder()
            .entity("Query", EntityKind::Object, [("user", "User")])
            .entity("User", EntityKind::Object, [])
            .build()
            .unwrap();
        let evicted = cache.stale(&after);
        cache.evict(&evicted);

        assert_eq!(evicted.nodes, vec![(Id::new("Post"), NodeHandle::new(2))]);
        assert_eq!(cache.node(Id::new("User")), Some(NodeHandle::new(1)));
    }

    #[test]
    fn test_vanished_relationship_evicts_edge_only() {
        let catalog = catalog(&[]);
        let mut cache = populated(&catalog);
        let evicted = cache.stale(&catalog);
        cache.evict(&evicted);

        assert!(evicted.nodes.is_empty());
        assert_eq!(
            evicted.edges,
            vec![(
                EdgeKey::new(Id::new("User"), Id::new("Post")),
                EdgeHandle::new(11)
            )]
        );
        assert_eq!(cache.edge_count(), 1);
    }

    #[test]
    fn test_stale_entries_stay_until_evicted() {
        let before = catalog(&[("posts", "[Post]")]);
        let mut cache = populated(&before);
        let after = catalog(&[("posts", "[Post]"), ("email", "String")]);

        let evicted = cache.stale(&after);
        assert_eq!(cache.node_count(), 3);
        assert_eq!(cache.edge_count(), 2);
        assert_eq!(cache.stale(&after), evicted, "asking again picks the same entries");

        cache.evict(&evicted);
        assert_eq!(cache.node_count(), 2);
        assert!(cache.stale(&after).is_empty());
    }

    #[test]
    fn test_clear() {
        let catalog = catalog(&[]);
        let mut cache = populated(&catalog);
        let count = cache.node_count() + cache.edge_count();
        let evicted = cache.clear();
        assert!(cache.is_empty());
        assert_eq!(evicted.elements().len(), count);
    }
}
