use std::collections::{HashMap, HashSet};

use log::trace;

use crate::error::StateError;
use crate::property::ErasedProperty;
use crate::reference::{Slot, SlotId};
use crate::tree::TreeId;

/// The blackboard: a mapping from reference-identity to an owned,
/// type-erased property, plus the bookkeeping that gives locals lexical
/// scoping.
///
/// Only the executor mutates `current_scope`, driven by tree-frame
/// push/pop; everything else on this type is plain map bookkeeping.
#[derive(Debug, Default)]
pub struct State {
    slots: HashMap<SlotId, Option<Box<dyn ErasedProperty>>>,
    locals_by_scope: HashMap<TreeId, HashSet<SlotId>>,
    current_scope: Option<TreeId>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enter_scope(&mut self, scope: TreeId) -> Option<TreeId> {
        std::mem::replace(&mut self.current_scope, Some(scope))
    }

    pub(crate) fn leave_scope(&mut self, previous: Option<TreeId>) {
        self.current_scope = previous;
    }

    pub fn current_scope(&self) -> Option<TreeId> {
        self.current_scope
    }

    /// True iff the slot is present and holds a value (a `reserve`d slot
    /// with no value is not "has").
    pub fn has<S: Slot>(&self, slot: &S) -> bool {
        matches!(self.slots.get(&slot.slot_id()), Some(Some(_)))
    }

    /// Insert the slot with no value: present, but absent a property.
    pub fn reserve<S: Slot>(&mut self, slot: &S) {
        self.slots.insert(slot.slot_id(), None);
        self.register_local(slot.slot_id());
    }

    /// Remove the slot entirely.
    pub fn unset<S: Slot>(&mut self, slot: &S) {
        self.unset_id(slot.slot_id());
    }

    pub(crate) fn unset_id(&mut self, id: SlotId) {
        self.slots.remove(&id);
        if let SlotId::Local(tree, _) = id {
            if let Some(set) = self.locals_by_scope.get_mut(&tree) {
                set.remove(&id);
            }
        }
    }

    /// Non-panicking read; `Err` if the slot is absent or reserved.
    pub fn try_get<S: Slot>(&self, slot: &S) -> Result<S::Value, StateError> {
        match self.slots.get(&slot.slot_id()) {
            Some(Some(value)) => Ok(value
                .as_any()
                .downcast_ref::<S::Value>()
                .expect("slot stored under the wrong concrete type")
                .clone()),
            _ => Err(StateError::MissingProperty(format!("{:?}", slot.slot_id()))),
        }
    }

    /// Read a slot; panics (contract violation) if it is absent or reserved.
    pub fn get<S: Slot>(&self, slot: &S) -> S::Value {
        self.try_get(slot).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Read a slot, falling back to `default` if it is absent or reserved.
    pub fn get_or<S: Slot>(&self, slot: &S, default: S::Value) -> S::Value {
        self.try_get(slot).unwrap_or(default)
    }

    pub fn set<S: Slot>(&mut self, slot: &S, value: S::Value) {
        self.slots.insert(slot.slot_id(), Some(Box::new(value)));
        self.register_local(slot.slot_id());
    }

    fn register_local(&mut self, id: SlotId) {
        if let SlotId::Local(tree, _) = id {
            self.locals_by_scope.entry(tree).or_default().insert(id);
        }
    }

    /// Copy every present slot of `src` into `self`. Locals keep being
    /// registered as locals (of `self`, not `src`).
    pub fn copy_all(&mut self, src: &State) {
        for (slot, value) in src.slots.iter() {
            if let Some(value) = value {
                self.slots.insert(*slot, Some(value.clone_box()));
                self.register_local(*slot);
            }
        }
    }

    /// Copy a single slot from `src` into the same-named slot of `self`.
    pub fn copy_one<S: Slot>(&mut self, src: &State, slot: &S) {
        self.copy_rename(src, slot.slot_id(), slot.slot_id());
    }

    /// Copy `from` in `src` into `to` in `self`. If `from` is absent in
    /// `src`, `to` in `self` is left untouched (not unset).
    pub fn copy_rename(&mut self, src: &State, from: SlotId, to: SlotId) {
        if let Some(Some(value)) = src.slots.get(&from) {
            let cloned = value.clone_box();
            self.slots.insert(to, Some(cloned));
            self.register_local(to);
        }
    }

    /// Like `copy_rename`, but the source and destination are the same
    /// state (used to apply wires, which rename within one state).
    pub(crate) fn copy_rename_same(&mut self, from: SlotId, to: SlotId) {
        let cloned = self
            .slots
            .get(&from)
            .and_then(|value| value.as_ref())
            .map(|value| value.clone_box());

        if let Some(cloned) = cloned {
            self.slots.insert(to, Some(cloned));
            self.register_local(to);
        }
    }

    /// Remove every slot registered under `scope`. Called when a tree
    /// frame is destroyed.
    pub(crate) fn invalidate_scope(&mut self, scope: TreeId) {
        if let Some(ids) = self.locals_by_scope.remove(&scope) {
            trace!("invalidating {} local slot(s) for scope {:?}", ids.len(), scope);
            for id in ids {
                self.slots.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DefaultHost;
    use crate::reference::Reference;

    #[test]
    fn get_or_falls_back_on_absence() {
        let host = DefaultHost::new();
        let state = State::new();
        let r = Reference::<i32>::new(&host, Some("x"));
        assert_eq!(state.get_or(&r, 9), 9);
    }

    #[test]
    fn set_then_get_round_trips() {
        let host = DefaultHost::new();
        let mut state = State::new();
        let r = Reference::<String>::new(&host, None);
        state.set(&r, "hello".to_string());
        assert_eq!(state.get(&r), "hello");
    }

    #[test]
    fn unset_removes_the_value() {
        let host = DefaultHost::new();
        let mut state = State::new();
        let r = Reference::<i32>::new(&host, None);
        state.set(&r, 1);
        state.unset(&r);
        assert!(!state.has(&r));
        assert!(state.try_get(&r).is_err());
    }

    #[test]
    fn reserve_is_present_but_not_has() {
        let host = DefaultHost::new();
        let mut state = State::new();
        let r = Reference::<i32>::new(&host, None);
        state.reserve(&r);
        assert!(!state.has(&r));
    }

    #[test]
    fn copy_rename_same_moves_value_to_new_slot_id() {
        let host = DefaultHost::new();
        let mut state = State::new();
        let from = Reference::<i32>::new(&host, Some("from"));
        let to = Reference::<i32>::new(&host, Some("to"));
        state.set(&from, 5);
        state.copy_rename_same(from.slot_id(), to.slot_id());
        assert_eq!(state.get(&to), 5);
        assert!(state.has(&from));
    }
}
