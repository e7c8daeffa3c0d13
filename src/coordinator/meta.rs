//! Per-state metadata kept by a coordinator.

use crate::core::StateId;
use crate::transition::Binding;
use serde_json::Value;
use std::collections::HashMap;

/// Metadata a coordinator keeps about one state.
#[derive(Clone, Debug, PartialEq)]
pub struct StateMeta<C> {
    /// Context bound the last time the state was entered.
    pub context: Option<Binding<C>>,
    /// Free-form values set through the coordinator.
    pub values: HashMap<String, Value>,
}

impl<C> Default for StateMeta<C> {
    fn default() -> Self {
        Self {
            context: None,
            values: HashMap::new(),
        }
    }
}

/// Side table of [`StateMeta`] keyed by state.
#[derive(Clone, Debug, PartialEq)]
pub struct StateMetaTable<C> {
    entries: HashMap<StateId, StateMeta<C>>,
}

impl<C> Default for StateMetaTable<C> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<C> StateMetaTable<C> {
    pub fn get(&self, state: StateId) -> Option<&StateMeta<C>> {
        self.entries.get(&state)
    }

    /// Metadata for `state`, created empty on first access.
    pub fn entry(&mut self, state: StateId) -> &mut StateMeta<C> {
        self.entries.entry(state).or_default()
    }

    pub fn last_context(&self, state: StateId) -> Option<&Binding<C>> {
        self.get(state).and_then(|meta| meta.context.as_ref())
    }

    pub fn remember_context(&mut self, state: StateId, binding: Binding<C>) {
        self.entry(state).context = Some(binding);
    }

    pub fn value(&self, state: StateId, key: &str) -> Option<&Value> {
        self.get(state).and_then(|meta| meta.values.get(key))
    }

    pub fn set_value(&mut self, state: StateId, key: &str, value: Value) -> Option<Value> {
        self.entry(state).values.insert(key.to_string(), value)
    }
}
