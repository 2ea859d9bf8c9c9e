//! Per-kind name → model maps owned by a region.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;

use super::Model;
use super::kind::ElementKind;

/// Models of one kind, keyed by name.
///
/// The lock is only held for the duration of a map operation, never across
/// a model calculation, so a calculation may freely look up or create other
/// models in the same registry.
#[derive(Debug)]
pub struct ModelRegistry<K: ElementKind> {
    models: Mutex<HashMap<String, Arc<Model<K>>>>,
}

impl<K: ElementKind> Default for ModelRegistry<K> {
    fn default() -> Self {
        Self {
            models: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: ElementKind> ModelRegistry<K> {
    pub fn get(&self, name: &str) -> Option<Arc<Model<K>>> {
        self.models.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.lock().contains_key(name)
    }

    /// Inserts `model`, returning the model it replaced.
    pub(crate) fn insert(&self, model: Arc<Model<K>>) -> Option<Arc<Model<K>>> {
        self.models.lock().insert(model.name().to_string(), model)
    }

    pub(crate) fn remove(&self, name: &str) -> Option<Arc<Model<K>>> {
        self.models.lock().remove(name)
    }

    /// Snapshot of every model, sorted by name.
    pub fn snapshot(&self) -> Vec<Arc<Model<K>>> {
        let mut models: Vec<_> = self.models.lock().values().cloned().collect();
        models.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        models
    }

    /// Sorted model names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.models.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.models.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every model. Used when the owning region is torn down.
    pub(crate) fn clear(&self) {
        self.models.lock().clear();
    }
}
