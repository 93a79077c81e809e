//! Namespaces: typed key/value stores for cross-statement resolution
//!
//! A namespace is a marker type implementing [`ParserNamespace`]. Its
//! [`NamespaceBehaviour`] decides which storage node a lookup or insertion
//! from a given statement is routed to:
//!
//! | scope | storage node |
//! |-------|--------------|
//! | `Global` | one node shared by every source of the build |
//! | `SourceLocalSpecial` | the statement's source; lookups fall back to visible sources |
//! | `StatementLocal` | the statement itself |
//! | `RootStatementLocal` | the root statement of the statement's tree |
//! | `TreeScoped` | adds at the statement; lookups walk towards the root |
//!
//! Each behaviour also names the phase from which the namespace may be
//! used. Touching a namespace earlier, or one that was never registered,
//! raises [`ReactorError::NamespaceNotAvailable`].
//!
//! # Pipeline Position
//!
//! ```text
//! StatementSupport callbacks ──add──> storage nodes <──get── inference lookups
//!                                          ↑
//!                                 routed by NamespaceBehaviour
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;

use crate::build::BuildContext;
use crate::context::StmtId;
use crate::error::{ReactorError, Result};
use crate::phase::ModelProcessingPhase;

/// Marker trait identifying a namespace and its key/value types.
pub trait ParserNamespace: 'static {
    type Key: Clone + Eq + Hash + fmt::Debug + 'static;
    type Value: Clone + fmt::Debug + 'static;

    /// Name used in diagnostics.
    const NAME: &'static str;
}

/// Storage node kinds a non-tree-scoped namespace can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageNodeType {
    Global,
    SourceLocalSpecial,
    StatementLocal,
    RootStatementLocal,
}

/// Routing policy of a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceScope {
    Storage(StorageNodeType),
    TreeScoped,
}

/// Registration of a namespace with the reactor.
#[derive(Debug, Clone)]
pub struct NamespaceBehaviour {
    type_id: TypeId,
    name: &'static str,
    scope: NamespaceScope,
    available_from: ModelProcessingPhase,
}

impl NamespaceBehaviour {
    fn of<N: ParserNamespace>(scope: NamespaceScope, available_from: ModelProcessingPhase) -> Self {
        Self {
            type_id: TypeId::of::<N>(),
            name: N::NAME,
            scope,
            available_from,
        }
    }

    pub fn global<N: ParserNamespace>(available_from: ModelProcessingPhase) -> Self {
        Self::of::<N>(NamespaceScope::Storage(StorageNodeType::Global), available_from)
    }

    pub fn source_local<N: ParserNamespace>(available_from: ModelProcessingPhase) -> Self {
        Self::of::<N>(
            NamespaceScope::Storage(StorageNodeType::SourceLocalSpecial),
            available_from,
        )
    }

    pub fn statement_local<N: ParserNamespace>(available_from: ModelProcessingPhase) -> Self {
        Self::of::<N>(
            NamespaceScope::Storage(StorageNodeType::StatementLocal),
            available_from,
        )
    }

    pub fn root_statement_local<N: ParserNamespace>(available_from: ModelProcessingPhase) -> Self {
        Self::of::<N>(
            NamespaceScope::Storage(StorageNodeType::RootStatementLocal),
            available_from,
        )
    }

    pub fn tree_scoped<N: ParserNamespace>(available_from: ModelProcessingPhase) -> Self {
        Self::of::<N>(NamespaceScope::TreeScoped, available_from)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn scope(&self) -> NamespaceScope {
        self.scope
    }

    pub fn available_from(&self) -> ModelProcessingPhase {
        self.available_from
    }
}

/// Per-node storage: one insertion-ordered map per namespace type.
#[derive(Default)]
pub struct NamespaceStorage {
    maps: HashMap<TypeId, Box<dyn Any>>,
}

impl NamespaceStorage {
    pub fn get<N: ParserNamespace>(&self, key: &N::Key) -> Option<&N::Value> {
        self.get_all::<N>()?.get(key)
    }

    pub fn get_all<N: ParserNamespace>(&self) -> Option<&IndexMap<N::Key, N::Value>> {
        self.maps
            .get(&TypeId::of::<N>())?
            .downcast_ref::<IndexMap<N::Key, N::Value>>()
    }

    /// Insert or replace; returns the previous value.
    pub fn put<N: ParserNamespace>(&mut self, key: N::Key, value: N::Value) -> Option<N::Value> {
        self.map_mut::<N>().and_then(|map| map.insert(key, value))
    }

    pub fn remove<N: ParserNamespace>(&mut self, key: &N::Key) -> Option<N::Value> {
        self.maps
            .get_mut(&TypeId::of::<N>())?
            .downcast_mut::<IndexMap<N::Key, N::Value>>()?
            .shift_remove(key)
    }

    fn map_mut<N: ParserNamespace>(&mut self) -> Option<&mut IndexMap<N::Key, N::Value>> {
        self.maps
            .entry(TypeId::of::<N>())
            .or_insert_with(|| Box::new(IndexMap::<N::Key, N::Value>::new()))
            .downcast_mut::<IndexMap<N::Key, N::Value>>()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl fmt::Debug for NamespaceStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceStorage")
            .field("namespaces", &self.maps.len())
            .finish()
    }
}

impl BuildContext {
    /// Behaviour of `N`, provided it is usable in the current phase.
    fn behaviour<N: ParserNamespace>(&self, at: StmtId) -> Result<&NamespaceBehaviour> {
        match self.namespaces.get(&TypeId::of::<N>()) {
            Some(behaviour) if behaviour.available_from <= self.current_phase => Ok(behaviour),
            _ => Err(ReactorError::NamespaceNotAvailable {
                namespace: N::NAME,
                phase: self.current_phase,
                reference: self.reference(at).clone(),
            }),
        }
    }

    /// Look up `key` in namespace `N` as seen from statement `at`.
    pub fn namespace_get<N: ParserNamespace>(
        &self,
        at: StmtId,
        key: &N::Key,
    ) -> Result<Option<&N::Value>> {
        let found = match self.behaviour::<N>(at)?.scope {
            NamespaceScope::Storage(StorageNodeType::Global) => self.global.get::<N>(key),
            NamespaceScope::Storage(StorageNodeType::SourceLocalSpecial) => {
                let source = self.ctx(at).source;
                self.sources[source].storage.get::<N>(key).or_else(|| {
                    self.visible_sources(source)
                        .into_iter()
                        .find_map(|linked| self.sources[linked].storage.get::<N>(key))
                })
            }
            NamespaceScope::Storage(StorageNodeType::StatementLocal) => {
                self.ctx(at).storage.get::<N>(key)
            }
            NamespaceScope::Storage(StorageNodeType::RootStatementLocal) => {
                self.ctx(self.root(at)).storage.get::<N>(key)
            }
            NamespaceScope::TreeScoped => self.tree_scoped_get::<N>(at, key),
        };
        Ok(found)
    }

    fn tree_scoped_get<N: ParserNamespace>(&self, at: StmtId, key: &N::Key) -> Option<&N::Value> {
        let mut current = Some(at);
        while let Some(id) = current {
            if let Some(value) = self.ctx(id).storage.get::<N>(key) {
                return Some(value);
            }
            current = self.ctx(id).parent;
        }

        // Past the root: roots of visible sources, then the global node.
        self.visible_sources(self.ctx(at).source)
            .into_iter()
            .filter_map(|linked| self.sources[linked].root)
            .find_map(|root| self.ctx(root).storage.get::<N>(key))
            .or_else(|| self.global.get::<N>(key))
    }

    /// Every entry of namespace `N` at the storage node `at` routes to.
    ///
    /// Tree-scoped namespaces return the entries of `at` itself.
    pub fn namespace_get_all<N: ParserNamespace>(
        &self,
        at: StmtId,
    ) -> Result<Option<&IndexMap<N::Key, N::Value>>> {
        let all = match self.behaviour::<N>(at)?.scope {
            NamespaceScope::Storage(StorageNodeType::Global) => self.global.get_all::<N>(),
            NamespaceScope::Storage(StorageNodeType::SourceLocalSpecial) => {
                self.sources[self.ctx(at).source].storage.get_all::<N>()
            }
            NamespaceScope::Storage(StorageNodeType::RootStatementLocal) => {
                self.ctx(self.root(at)).storage.get_all::<N>()
            }
            NamespaceScope::Storage(StorageNodeType::StatementLocal)
            | NamespaceScope::TreeScoped => self.ctx(at).storage.get_all::<N>(),
        };
        Ok(all)
    }

    /// Add `key -> value` to namespace `N` at the storage node `at` routes to.
    ///
    /// Returns the value previously stored under `key` at that node.
    pub fn namespace_add<N: ParserNamespace>(
        &mut self,
        at: StmtId,
        key: N::Key,
        value: N::Value,
    ) -> Result<Option<N::Value>> {
        let scope = self.behaviour::<N>(at)?.scope;
        tracing::trace!(namespace = N::NAME, ?key, "namespace add");
        let previous = match scope {
            NamespaceScope::Storage(StorageNodeType::Global) => self.global.put::<N>(key, value),
            NamespaceScope::Storage(StorageNodeType::SourceLocalSpecial) => {
                let source = self.ctx(at).source;
                self.sources[source].storage.put::<N>(key, value)
            }
            NamespaceScope::Storage(StorageNodeType::RootStatementLocal) => {
                let root = self.root(at);
                self.ctx_mut(root).storage.put::<N>(key, value)
            }
            NamespaceScope::Storage(StorageNodeType::StatementLocal)
            | NamespaceScope::TreeScoped => self.ctx_mut(at).storage.put::<N>(key, value),
        };
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Numbers;

    impl ParserNamespace for Numbers {
        type Key = String;
        type Value = u32;
        const NAME: &'static str = "Numbers";
    }

    struct Words;

    impl ParserNamespace for Words {
        type Key = String;
        type Value = String;
        const NAME: &'static str = "Words";
    }

    #[test]
    fn test_storage_keeps_namespaces_apart() {
        let mut storage = NamespaceStorage::default();
        storage.put::<Numbers>("a".into(), 1);
        storage.put::<Words>("a".into(), "one".into());

        assert_eq!(storage.get::<Numbers>(&"a".to_string()), Some(&1));
        assert_eq!(
            storage.get::<Words>(&"a".to_string()).map(String::as_str),
            Some("one")
        );
    }

    #[test]
    fn test_storage_preserves_insertion_order() {
        let mut storage = NamespaceStorage::default();
        for (i, key) in ["z", "a", "m"].iter().enumerate() {
            storage.put::<Numbers>(key.to_string(), i as u32);
        }
        let keys: Vec<_> = storage
            .get_all::<Numbers>()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);

        assert_eq!(storage.put::<Numbers>("a".into(), 9), Some(1));
        assert_eq!(storage.remove::<Numbers>(&"z".to_string()), Some(0));
    }

    #[test]
    fn test_remove_from_unused_namespace_leaves_storage_empty() {
        let mut storage = NamespaceStorage::default();
        assert_eq!(storage.remove::<Numbers>(&"a".to_string()), None);
        assert!(storage.is_empty());
        assert!(storage.get_all::<Numbers>().is_none());
    }
}
