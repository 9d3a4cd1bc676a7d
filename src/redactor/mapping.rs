//! Process-local mapping between placeholders and original text.
//!
//! A [`MappingStore`] lives for exactly one session. It is never serialized
//! and its original texts are wiped from memory when it is dropped.

use crate::error::{AbstractionError, Result};
use crate::models::{Placeholder, PlaceholderKind, Sensitivity, SessionId};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;
use zeroize::{Zeroize, Zeroizing};

/// Index of a scope node in a [`ScopeArena`].
pub type ScopeId = usize;

#[derive(Debug, Clone)]
struct ScopeNode {
    parent: Option<ScopeId>,
}

/// Tree of lexical scopes stored as a flat arena with parent indices.
#[derive(Debug, Clone, Default)]
pub struct ScopeArena {
    nodes: Vec<ScopeNode>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root scope (one per file).
    pub fn new_root(&mut self) -> ScopeId {
        self.nodes.push(ScopeNode { parent: None });
        self.nodes.len() - 1
    }

    /// Add a scope nested in `parent`.
    pub fn new_child(&mut self, parent: ScopeId) -> ScopeId {
        self.nodes.push(ScopeNode {
            parent: Some(parent),
        });
        self.nodes.len() - 1
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.nodes.get(scope).and_then(|n| n.parent)
    }

    /// `scope` followed by each enclosing scope up to the root.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(
            (scope < self.nodes.len()).then_some(scope),
            move |&s| self.parent(s),
        )
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One recorded substitution.
pub struct MappingEntry {
    /// Placeholder emitted in the abstracted text
    pub placeholder: Placeholder,

    /// Original span text, wiped on drop
    pub original: Zeroizing<String>,

    /// Scope the placeholder was allocated in
    pub scope: ScopeId,

    /// Classification of the original span
    pub sensitivity: Sensitivity,
}

impl fmt::Debug for MappingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingEntry")
            .field("placeholder", &self.placeholder)
            .field("original", &"<redacted>")
            .field("scope", &self.scope)
            .field("sensitivity", &self.sensitivity)
            .finish()
    }
}

/// Placeholder table for one redaction/restoration round trip.
///
/// Invariants:
/// - a placeholder is recorded at most once per session
/// - within one scope, each original text maps to exactly one placeholder
/// - per-kind counters only increase, so placeholders are never reused
pub struct MappingStore {
    session_id: SessionId,
    entries: HashMap<Placeholder, MappingEntry>,
    reverse: HashMap<ScopeId, HashMap<String, Placeholder>>,
    counters: HashMap<PlaceholderKind, u64>,
    scopes: ScopeArena,
}

impl MappingStore {
    /// Create an empty store for `session_id`.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            entries: HashMap::new(),
            reverse: HashMap::new(),
            counters: HashMap::new(),
            scopes: ScopeArena::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeArena {
        &mut self.scopes
    }

    /// Placeholder for `original` visible from `scope`, searching enclosing
    /// scopes outward.
    pub fn resolve(&self, original: &str, scope: ScopeId) -> Option<Placeholder> {
        self.scopes
            .ancestors(scope)
            .find_map(|s| self.lookup_in(original, s))
    }

    /// Placeholder for `original` recorded directly in `scope`.
    pub fn lookup_in(&self, original: &str, scope: ScopeId) -> Option<Placeholder> {
        self.reverse.get(&scope).and_then(|m| m.get(original)).copied()
    }

    /// Allocate the next placeholder of `kind` for `original` in `scope`.
    pub fn allocate(
        &mut self,
        kind: PlaceholderKind,
        original: &str,
        scope: ScopeId,
        sensitivity: Sensitivity,
    ) -> Result<Placeholder> {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        let placeholder = Placeholder::new(kind, *counter);

        self.insert(MappingEntry {
            placeholder,
            original: Zeroizing::new(original.to_string()),
            scope,
            sensitivity,
        })?;
        trace!("Allocated {} in scope {}", placeholder, scope);
        Ok(placeholder)
    }

    /// Record an entry, enforcing the bijection invariants.
    pub fn insert(&mut self, entry: MappingEntry) -> Result<()> {
        let collision = || AbstractionError::MappingCollision {
            placeholder: entry.placeholder.to_string(),
            scope: entry.scope,
        };

        if self.entries.contains_key(&entry.placeholder) {
            return Err(collision());
        }
        let scope_index = self.reverse.entry(entry.scope).or_default();
        if scope_index.contains_key(entry.original.as_str()) {
            return Err(collision());
        }

        scope_index.insert(entry.original.to_string(), entry.placeholder);
        let counter = self.counters.entry(entry.placeholder.kind).or_insert(0);
        *counter = (*counter).max(entry.placeholder.index);
        self.entries.insert(entry.placeholder, entry);
        Ok(())
    }

    pub fn get(&self, placeholder: &Placeholder) -> Option<&MappingEntry> {
        self.entries.get(placeholder)
    }

    /// Original text behind a placeholder.
    pub fn original(&self, placeholder: &Placeholder) -> Option<&str> {
        self.entries.get(placeholder).map(|e| e.original.as_str())
    }

    pub fn contains(&self, placeholder: &Placeholder) -> bool {
        self.entries.contains_key(placeholder)
    }

    pub fn entries(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.values()
    }

    /// Original texts of SECRET entries.
    pub fn secret_originals(&self) -> impl Iterator<Item = &str> {
        self.entries
            .values()
            .filter(|e| e.sensitivity == Sensitivity::Secret)
            .map(|e| e.original.as_str())
    }

    /// Number of placeholders allocated per kind.
    pub fn count_by_kind(&self, kind: PlaceholderKind) -> usize {
        self.entries.keys().filter(|p| p.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MappingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingStore")
            .field("session_id", &self.session_id)
            .field("entries", &self.entries.len())
            .field("scopes", &self.scopes.len())
            .finish()
    }
}

impl Drop for MappingStore {
    fn drop(&mut self) {
        for (_, mut index) in self.reverse.drain() {
            for (mut original, _) in index.drain() {
                original.zeroize();
            }
        }
        trace!("Mapping store for session {} discarded", self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MappingStore {
        MappingStore::new(SessionId::new())
    }

    #[test]
    fn test_scope_ancestors() {
        let mut arena = ScopeArena::new();
        let root = arena.new_root();
        let a = arena.new_child(root);
        let b = arena.new_child(a);
        let sibling = arena.new_child(root);

        assert_eq!(arena.ancestors(b).collect::<Vec<_>>(), vec![b, a, root]);
        assert_eq!(arena.ancestors(sibling).collect::<Vec<_>>(), vec![sibling, root]);
        assert_eq!(arena.ancestors(99).count(), 0);
    }

    #[test]
    fn test_allocate_counts_per_kind() {
        let mut store = store();
        let root = store.scopes_mut().new_root();

        let a = store
            .allocate(PlaceholderKind::Var, "total", root, Sensitivity::Proprietary)
            .unwrap();
        let b = store
            .allocate(PlaceholderKind::Var, "count", root, Sensitivity::Proprietary)
            .unwrap();
        let c = store
            .allocate(PlaceholderKind::Func, "compute", root, Sensitivity::Proprietary)
            .unwrap();

        assert_eq!(a.to_string(), "⟪VAR_1⟧");
        assert_eq!(b.to_string(), "⟪VAR_2⟧");
        assert_eq!(c.to_string(), "⟪FUNC_1⟧");
        assert_eq!(store.original(&b), Some("count"));
        assert_eq!(store.count_by_kind(PlaceholderKind::Var), 2);
    }

    #[test]
    fn test_resolve_walks_enclosing_scopes() {
        let mut store = store();
        let root = store.scopes_mut().new_root();
        let inner = store.scopes_mut().new_child(root);
        let sibling = store.scopes_mut().new_child(root);

        let outer = store
            .allocate(PlaceholderKind::Var, "rate", root, Sensitivity::Proprietary)
            .unwrap();
        let local = store
            .allocate(PlaceholderKind::Var, "tmp", inner, Sensitivity::Proprietary)
            .unwrap();

        assert_eq!(store.resolve("rate", inner), Some(outer));
        assert_eq!(store.resolve("tmp", inner), Some(local));
        assert_eq!(store.resolve("tmp", sibling), None);
        assert_eq!(store.lookup_in("rate", inner), None);
    }

    #[test]
    fn test_insert_rejects_collisions() {
        let mut store = store();
        let root = store.scopes_mut().new_root();
        let p = store
            .allocate(PlaceholderKind::Str, "\"hello\"", root, Sensitivity::Proprietary)
            .unwrap();

        let duplicate_placeholder = MappingEntry {
            placeholder: p,
            original: Zeroizing::new("\"other\"".to_string()),
            scope: root,
            sensitivity: Sensitivity::Proprietary,
        };
        assert!(matches!(
            store.insert(duplicate_placeholder),
            Err(AbstractionError::MappingCollision { .. })
        ));

        let duplicate_original = MappingEntry {
            placeholder: Placeholder::new(PlaceholderKind::Str, 50),
            original: Zeroizing::new("\"hello\"".to_string()),
            scope: root,
            sensitivity: Sensitivity::Proprietary,
        };
        assert!(matches!(
            store.insert(duplicate_original),
            Err(AbstractionError::MappingCollision { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_counters_never_reuse_inserted_indices() {
        let mut store = store();
        let root = store.scopes_mut().new_root();
        store
            .insert(MappingEntry {
                placeholder: Placeholder::new(PlaceholderKind::Num, 4),
                original: Zeroizing::new("42".to_string()),
                scope: root,
                sensitivity: Sensitivity::Proprietary,
            })
            .unwrap();
        let next = store
            .allocate(PlaceholderKind::Num, "7", root, Sensitivity::Proprietary)
            .unwrap();
        assert_eq!(next.index, 5);
    }

    #[test]
    fn test_debug_hides_originals() {
        let mut store = store();
        let root = store.scopes_mut().new_root();
        let p = store
            .allocate(PlaceholderKind::Secret, "sk_live_x", root, Sensitivity::Secret)
            .unwrap();
        assert!(!format!("{:?}", store).contains("sk_live_x"));
        assert!(!format!("{:?}", store.get(&p).unwrap()).contains("sk_live_x"));
        assert_eq!(store.secret_originals().collect::<Vec<_>>(), vec!["sk_live_x"]);
    }
}
