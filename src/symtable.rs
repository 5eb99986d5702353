use std::collections::HashMap;

use crate::value::{Value, ValueType};

/// Identifies a scope inside a [`SymbolTable`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct ScopeId(usize);

/// Identifies a slot inside a scope.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct SlotId(usize);

/// A value cell: the declared type, the current value, and whether the cell
/// has been written since its declaration.
#[derive(Debug)]
pub struct Slot {
    pub r#type: ValueType,
    pub value: Value,
    pub initialized: bool,
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    names: HashMap<String, SlotId>,
    slots: Vec<Slot>,
}

/// The tree of lexical scopes. All scopes and their slots live in one arena
/// owned by the table; variable nodes address cells by `(ScopeId, SlotId)`,
/// so every reference to a cell observes each write to it. A child scope
/// holds only its parent's id, never ownership.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Creates a table holding only the root scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::default()],
        }
    }

    /// Returns the root scope's id.
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Creates a new scope enclosed by the given parent.
    pub fn new_child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        id
    }

    /// Returns the parent of a scope, if it has one.
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    /// Creates a fresh default-initialized cell for a name in a scope and
    /// returns its slot id. A repeated name rebinds to the new cell; nodes
    /// that resolved the old cell keep addressing it.
    pub fn create(&mut self, scope: ScopeId, name: &str, r#type: ValueType) -> SlotId {
        let scope = &mut self.scopes[scope.0];
        let slot = SlotId(scope.slots.len());
        scope.slots.push(Slot {
            r#type,
            value: Value::default_of(r#type),
            initialized: false,
        });
        scope.names.insert(name.to_string(), slot);
        slot
    }

    /// Resolves a name against a scope, walking toward the root; the nearest
    /// enclosing scope that defines the name wins.
    pub fn get(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, SlotId)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(&slot) = scope.names.get(name) {
                return Some((id, slot));
            }
            current = scope.parent;
        }
        None
    }

    /// Returns whether a name resolves from the given scope.
    pub fn exists(&self, scope: ScopeId, name: &str) -> bool {
        self.get(scope, name).is_some()
    }

    pub fn slot(&self, scope: ScopeId, slot: SlotId) -> &Slot {
        &self.scopes[scope.0].slots[slot.0]
    }

    pub fn slot_mut(&mut self, scope: ScopeId, slot: SlotId) -> &mut Slot {
        &mut self.scopes[scope.0].slots[slot.0]
    }
}
