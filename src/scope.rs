//! Scope table: range-variable names bound to input fragments during lowering.

use crate::fragment::{Arena, Input, InputId};

/// A binding stack. Unbinding pushes a tombstone so a later
/// [`restore`](Scope::restore) brings earlier bindings back.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    entries: Vec<(String, Option<InputId>)>,
}

/// Opaque position in the binding stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: &str, id: InputId) {
        self.entries.push((name.to_string(), Some(id)));
    }

    pub fn unbind(&mut self, name: &str) {
        self.entries.push((name.to_string(), None));
    }

    /// Hide every live name currently resolving to `id`.
    pub fn unbind_input(&mut self, id: InputId) {
        let mut seen: Vec<&str> = Vec::new();
        let mut hidden = Vec::new();
        for (name, entry) in self.entries.iter().rev() {
            if seen.contains(&name.as_str()) {
                continue;
            }
            seen.push(name);
            if *entry == Some(id) {
                hidden.push(name.clone());
            }
        }
        for name in hidden {
            self.unbind(&name);
        }
    }

    pub fn get(&self, name: &str) -> Option<InputId> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .and_then(|(_, id)| *id)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.entries.len())
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.entries.truncate(checkpoint.0);
    }

    /// Find the input owning a property chain such as `["j", "a", "Name"]`.
    ///
    /// Walks the chain prefix backwards and returns the first bound input
    /// together with the index of the part that matched. Scoped inputs answer
    /// for themselves; an unscoped select answers through its `FROM`.
    pub fn find_input(&self, arena: &Arena, chain: &[String]) -> Option<(InputId, usize)> {
        if chain.len() < 2 {
            return None;
        }
        for x in (0..chain.len() - 1).rev() {
            let Some(id) = self.get(&chain[x]) else {
                continue;
            };
            let input = arena.get(id);
            if input.is_scoped() {
                return Some((id, x));
            }
            return match input {
                Input::Select(s) => s.from.map(|from| (from, x)),
                _ => Some((id, x)),
            };
        }
        None
    }
}
