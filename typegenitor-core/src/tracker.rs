//! The per-run registry mediating ref-to-name-to-definition lookups.
//!
//! Names are reserved before bodies are translated; a recursive schema can
//! therefore obtain its eventual name before its own body exists. The
//! reservation order is the emission order and is never re-sorted.

use indexmap::IndexMap;

use crate::error::TrackerError;
use crate::spec::Ref;
use crate::typedef::TypeDefinition;

#[derive(Debug)]
enum Slot {
    Reserved,
    Populated(TypeDefinition),
}

/// Name uniqueness, ref-to-name mapping, deterministic iteration.
#[derive(Debug, Default)]
pub struct TypeTracker {
    refs: IndexMap<Ref, String>,
    names: IndexMap<String, Slot>,
}

impl TypeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `desired`, or `desired` with the smallest integer suffix
    /// >= 2 that is still free. Deterministic and stable across runs.
    pub fn register_name(&mut self, desired: &str) -> String {
        if !self.names.contains_key(desired) {
            self.names.insert(desired.to_string(), Slot::Reserved);
            return desired.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{desired}{n}");
            if !self.names.contains_key(&candidate) {
                self.names.insert(candidate.clone(), Slot::Reserved);
                return candidate;
            }
            n += 1;
        }
    }

    /// Bind `reference -> name`. Re-binding to the same name is the
    /// idempotent no-op pre-registration relies on.
    pub fn register_ref(&mut self, reference: Ref, name: &str) -> Result<(), TrackerError> {
        if let Some(existing) = self.refs.get(&reference) {
            if existing != name {
                return Err(TrackerError::DuplicateRef {
                    reference: reference.as_str().to_string(),
                    existing: existing.clone(),
                });
            }
            return Ok(());
        }
        self.refs.insert(reference, name.to_string());
        Ok(())
    }

    pub fn lookup_by_ref(&self, reference: &Ref) -> Option<&str> {
        self.refs.get(reference).map(String::as_str)
    }

    /// The definition for `name`, once its body has been populated.
    pub fn lookup_by_name(&self, name: &str) -> Option<&TypeDefinition> {
        match self.names.get(name)? {
            Slot::Reserved => None,
            Slot::Populated(def) => Some(def),
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Populate the body of a reserved name.
    pub fn attach(&mut self, name: &str, def: TypeDefinition) -> Result<(), TrackerError> {
        match self.names.get_mut(name) {
            Some(slot) => {
                *slot = Slot::Populated(def);
                Ok(())
            }
            None => Err(TrackerError::UnknownName(name.to_string())),
        }
    }

    /// Populated definitions in reservation order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.names.values().filter_map(|slot| match slot {
            Slot::Reserved => None,
            Slot::Populated(def) => Some(def),
        })
    }

    /// Names that were reserved but never populated; a non-empty result
    /// after pass 2 is a translator bug surfaced by the planner.
    pub fn unpopulated(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter_map(|(name, slot)| match slot {
                Slot::Reserved => Some(name.as_str()),
                Slot::Populated(_) => None,
            })
            .collect()
    }

    pub fn refs(&self) -> impl Iterator<Item = (&Ref, &str)> {
        self.refs.iter().map(|(r, n)| (r, n.as_str()))
    }
}
