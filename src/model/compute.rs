//! The scope a single model calculation runs in.
//!
//! A [`ComputeContext`] gives a calculation read access to its region and
//! to other models, and collects the values it produces. Nothing is written
//! into the model (or its companions) until the calculation has returned
//! successfully and every produced value has been checked to be finite.

use std::sync::Arc;

use crate::model::kind::{
    EdgeKind, ElementEdgeKind, ElementKind, NodeKind, TetrahedronEdgeKind, TriangleEdgeKind,
};
use crate::model::sub_model::SubModel;
use crate::model::{Model, ModelHandle, NewValues, Severity, sum_onto_edges};
use crate::model_error::{FpeKind, Location, ModelError};
use crate::region::Region;

#[derive(Debug)]
pub struct ComputeContext<'a, K: ElementKind> {
    region: &'a Region,
    model: &'a Model<K>,
    own: Option<NewValues>,
    companions: Vec<(String, NewValues)>,
}

impl<'a, K: ElementKind> ComputeContext<'a, K> {
    pub(crate) fn new(region: &'a Region, model: &'a Model<K>) -> Self {
        Self {
            region,
            model,
            own: None,
            companions: Vec::new(),
        }
    }

    #[inline]
    pub fn region(&self) -> &'a Region {
        self.region
    }

    /// Name of the model being calculated.
    #[inline]
    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn location(&self) -> Location {
        self.region.location()
    }

    /// Entries the model being calculated holds.
    pub fn entry_count(&self) -> usize {
        K::entry_count(self.region)
    }

    /// Handle to a model this calculation reads.
    ///
    /// # Errors
    /// [`ModelError::MissingDependency`] if no model of kind `D` is named
    /// `name`.
    pub fn model<D: ElementKind>(&self, name: &str) -> Result<ModelHandle<'a, D>, ModelError> {
        self.region
            .resolve_model::<D>(name)?
            .ok_or_else(|| self.missing::<D>(name))
    }

    /// Fresh values of a dependency of kind `D`.
    pub fn values<D: ElementKind>(&self, name: &str) -> Result<Arc<[f64]>, ModelError> {
        self.model::<D>(name)?.model().values(self.region)
    }

    pub fn node_values(&self, name: &str) -> Result<Arc<[f64]>, ModelError> {
        self.values::<NodeKind>(name)
    }

    pub fn edge_values(&self, name: &str) -> Result<Arc<[f64]>, ModelError> {
        self.values::<EdgeKind>(name)
    }

    pub fn triangle_edge_values(&self, name: &str) -> Result<Arc<[f64]>, ModelError> {
        self.values::<TriangleEdgeKind>(name)
    }

    pub fn tetrahedron_edge_values(&self, name: &str) -> Result<Arc<[f64]>, ModelError> {
        self.values::<TetrahedronEdgeKind>(name)
    }

    /// Values of an element-edge dependency summed onto region edges.
    pub fn values_on_edges<D: ElementEdgeKind>(&self, name: &str) -> Result<Vec<f64>, ModelError> {
        let values = self.values::<D>(name)?;
        Ok(sum_onto_edges::<D>(self.region, &values))
    }

    /// Error naming this model and an undefined dependency.
    pub fn missing<D: ElementKind>(&self, name: &str) -> ModelError {
        ModelError::MissingDependency {
            location: self.location(),
            kind: K::KIND,
            model: self.name().to_string(),
            required_kind: D::KIND,
            required: name.to_string(),
        }
    }

    /// Error for a violated geometric or parameter precondition.
    pub fn domain_error(&self, reason: impl Into<String>) -> ModelError {
        ModelError::DomainError {
            location: self.location(),
            kind: K::KIND,
            model: self.name().to_string(),
            reason: reason.into(),
        }
    }

    /// Values for the model being calculated.
    pub fn set_values(&mut self, values: Vec<f64>) {
        self.own = Some(NewValues::Array(values));
    }

    pub fn set_uniform(&mut self, value: f64) {
        self.own = Some(NewValues::Uniform(value));
    }

    /// Values for the companion `name`, written after this model's own.
    pub fn set_companion_values(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.companions.push((name.into(), NewValues::Array(values)));
    }

    pub(crate) fn model_is_fresh(&self) -> bool {
        self.model.is_up_to_date()
    }

    /// Writes the collected values: this model first, then companions, so
    /// invalidation from the primary cannot clobber freshly written
    /// companions. Every companion is resolved before anything is written,
    /// so a companion that now belongs to another model leaves this one
    /// stale.
    pub(crate) fn commit(mut self) -> Result<(), ModelError> {
        if let Some(values) = &self.own {
            self.check_finite(values)?;
        }
        for (_, values) in &self.companions {
            self.check_finite(values)?;
        }
        let companions = std::mem::take(&mut self.companions)
            .into_iter()
            .map(|(name, values)| Ok((self.resolve_companion(&name)?, values)))
            .collect::<Result<Vec<_>, ModelError>>()?;
        if let Some(values) = self.own.take() {
            self.model.store(self.region, values)?;
        }
        for (companion, values) in companions {
            companion.store(self.region, values)?;
        }
        Ok(())
    }

    fn check_finite(&self, values: &NewValues) -> Result<(), ModelError> {
        let slice = match values {
            NewValues::Uniform(v) => std::slice::from_ref(v),
            NewValues::Array(v) => v.as_slice(),
        };
        let fpe = if slice.iter().any(|v| v.is_nan()) {
            Some(FpeKind::Invalid)
        } else if slice.iter().any(|v| v.is_infinite()) {
            Some(FpeKind::Overflow)
        } else {
            None
        };
        match fpe {
            Some(fpe) => Err(ModelError::FloatingPointException {
                location: self.location(),
                kind: K::KIND,
                model: self.name().to_string(),
                fpe,
            }),
            None => Ok(()),
        }
    }

    /// Finds the live companion `name`, recreating it if it was deleted.
    fn resolve_companion(&self, name: &str) -> Result<Arc<Model<K>>, ModelError> {
        let region = self.region;
        match K::registry(region).get(name) {
            Some(model) if model.parent().as_deref() == Some(self.name()) => Ok(model),
            Some(_) => Err(self.changed_dependency(name)),
            None if region.model_kind(name).is_some() => Err(self.changed_dependency(name)),
            None => {
                region.report(
                    Severity::Info,
                    format!(
                        "{} {} \"{}\" appears to have been deleted.  Being recreated as calculating {} \"{}\"",
                        self.location(),
                        K::KIND,
                        name,
                        K::KIND,
                        self.name()
                    ),
                );
                let handle =
                    region.insert_model::<K>(name.to_string(), Box::new(SubModel::with_parent(self.name())))?;
                Ok(handle.model().clone())
            }
        }
    }

    /// Error for a model `name` that no longer is what this model expects,
    /// recorded as an error diagnostic.
    pub(crate) fn changed_dependency(&self, name: &str) -> ModelError {
        let err = ModelError::ChangedDependency {
            location: self.location(),
            kind: K::KIND,
            model: self.name().to_string(),
            required_kind: K::KIND,
            required: name.to_string(),
        };
        self.region.report(Severity::Error, err.to_string());
        err
    }
}
