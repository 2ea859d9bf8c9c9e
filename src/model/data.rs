//! Cached value storage for a single model.
//!
//! Exactly one representation is authoritative at a time: a single uniform
//! value or a dense per-entry array. Reading the array of a uniform model
//! expands it once and caches the expansion without changing which
//! representation is authoritative.

use std::sync::Arc;

use once_cell::sync::OnceCell;

#[derive(Debug, Clone)]
enum Storage {
    Uniform {
        value: f64,
        expanded: OnceCell<Arc<[f64]>>,
    },
    Values(Arc<[f64]>),
}

/// Values of one model, `len()` entries long.
#[derive(Debug, Clone)]
pub struct ModelData {
    len: usize,
    storage: Storage,
}

impl ModelData {
    /// New storage holding the uniform value `0.0`.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            storage: Storage::Uniform {
                value: 0.0,
                expanded: OnceCell::new(),
            },
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_uniform(&self) -> bool {
        matches!(self.storage, Storage::Uniform { .. })
    }

    pub fn uniform_value(&self) -> Option<f64> {
        match self.storage {
            Storage::Uniform { value, .. } => Some(value),
            Storage::Values(_) => None,
        }
    }

    /// Dense values, expanding a uniform value on first use.
    pub fn values(&self) -> Arc<[f64]> {
        match &self.storage {
            Storage::Uniform { value, expanded } => expanded
                .get_or_init(|| vec![*value; self.len].into())
                .clone(),
            Storage::Values(v) => v.clone(),
        }
    }

    pub fn set_uniform(&mut self, value: f64) {
        self.storage = Storage::Uniform {
            value,
            expanded: OnceCell::new(),
        };
    }

    /// Replaces every entry. `values.len()` must equal `len()`.
    pub fn set_values(&mut self, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.len);
        self.storage = Storage::Values(values.into());
    }

    /// Writes `values[i]` at each index in `indexes`, keeping every other
    /// entry at its previous value.
    pub fn set_indexes(&mut self, indexes: &[usize], values: &[f64]) {
        let mut out = self.values().to_vec();
        for &i in indexes {
            out[i] = values[i];
        }
        self.storage = Storage::Values(out.into());
    }

    /// Writes `value` at each index in `indexes`, keeping every other entry.
    pub fn set_indexes_uniform(&mut self, indexes: &[usize], value: f64) {
        if indexes.len() == self.len {
            self.set_uniform(value);
            return;
        }
        let mut out = self.values().to_vec();
        for &i in indexes {
            out[i] = value;
        }
        self.storage = Storage::Values(out.into());
    }

    /// True if every entry is exactly `0.0`.
    pub fn is_zero(&self) -> bool {
        self.all_equal_to(0.0)
    }

    /// True if every entry is exactly `1.0`.
    pub fn is_one(&self) -> bool {
        self.all_equal_to(1.0)
    }

    fn all_equal_to(&self, x: f64) -> bool {
        match &self.storage {
            Storage::Uniform { value, .. } => *value == x,
            Storage::Values(v) => v.iter().all(|&y| y == x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_uniform_zero() {
        let d = ModelData::new(4);
        assert!(d.is_uniform());
        assert!(d.is_zero());
        assert_eq!(&*d.values(), &[0.0; 4]);
    }

    #[test]
    fn expansion_keeps_uniform_representation() {
        let mut d = ModelData::new(3);
        d.set_uniform(5.0);
        assert_eq!(&*d.values(), &[5.0, 5.0, 5.0]);
        assert!(d.is_uniform());
        assert_eq!(d.uniform_value(), Some(5.0));
    }

    #[test]
    fn partial_writes_preserve_other_entries() {
        let mut d = ModelData::new(4);
        d.set_values(vec![1.0, 2.0, 3.0, 4.0]);
        d.set_indexes(&[1, 3], &[9.0, 8.0, 7.0, 6.0]);
        assert_eq!(&*d.values(), &[1.0, 8.0, 3.0, 6.0]);
        d.set_indexes_uniform(&[0], -1.0);
        assert_eq!(&*d.values(), &[-1.0, 8.0, 3.0, 6.0]);
        assert!(!d.is_uniform());
    }

    #[test]
    fn uniform_write_over_every_index_stays_uniform() {
        let mut d = ModelData::new(2);
        d.set_indexes_uniform(&[0, 1], 1.0);
        assert!(d.is_uniform());
        assert!(d.is_one());
    }
}
