//! Named, lazily evaluated, cached fields over one mesh-element kind.
//!
//! A [`Model`] is owned by its region's registry. Everything else refers to
//! models by name and resolves through the region on each access, so a
//! handle can never observe a model that was replaced under its feet.
//!
//! Per-model state machine:
//!
//! ```text
//! Stale --(calculate)--> Fresh --(provider signals)--> Stale
//! ```
//!
//! A model becomes fresh either by running its [`ModelCalculation`] or by
//! having values pushed into it ([`ModelHandle::set_values`]). Pushing values
//! marks every transitive dependent stale but never recomputes anything.

pub mod compute;
pub mod data;
pub mod diagnostics;
pub mod kind;
pub mod registry;
pub mod serialize;
pub mod sub_model;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::geometry::Vector;
use crate::model_error::ModelError;
use crate::region::Region;

pub use compute::ComputeContext;
pub use data::ModelData;
pub use diagnostics::{Diagnostic, Severity};
pub use kind::{
    EdgeKind, ElementEdgeKind, ElementKind, ModelKind, NodeKind, TetrahedronEdgeKind,
    TriangleEdgeKind,
};
pub use registry::ModelRegistry;
pub use sub_model::SubModel;

/// How a model is presented when written out for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayType {
    NoDisplay,
    #[default]
    Scalar,
    Vector,
}

impl DisplayType {
    pub fn keyword(self) -> &'static str {
        match self {
            DisplayType::NoDisplay => "nodisplay",
            DisplayType::Scalar => "scalar",
            DisplayType::Vector => "vector",
        }
    }
}

impl fmt::Display for DisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The kind-specific part of a model: what it reads and how it derives its
/// values.
///
/// Dependencies are declared rather than registered by hand; the region
/// records them when the model is inserted and rejects any declaration that
/// would close a cycle.
pub trait ModelCalculation<K: ElementKind>: fmt::Debug + Send + Sync {
    /// Names of every model or parameter read by [`calculate`](Self::calculate).
    ///
    /// Names may refer to models that do not exist yet.
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        Vec::new()
    }

    /// Names of the sibling models filled in as a side effect of
    /// [`calculate`](Self::calculate). The region creates a [`SubModel`] for
    /// each one when this model is inserted.
    fn companions(&self, _region: &Region) -> Vec<String> {
        Vec::new()
    }

    /// Name of the model that produces this one's values, for sub-models.
    fn parent(&self) -> Option<String> {
        None
    }

    fn display_type(&self) -> DisplayType {
        DisplayType::Scalar
    }

    /// Derives this model's values (and its companions') into `ctx`.
    ///
    /// # Errors
    /// Any error aborts the evaluation; nothing written to `ctx` is kept.
    fn calculate(&self, ctx: &mut ComputeContext<'_, K>) -> Result<(), ModelError>;

    /// Writes the body of the saved representation (`BUILTIN`, `UNIFORM`,
    /// `DATA`, `DATAPARENT` or `COMMAND` form).
    fn serialize(&self, _model: &ModelHandle<'_, K>, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("BUILTIN")
    }
}

#[derive(Debug)]
struct ModelState {
    uptodate: bool,
    display_type: DisplayType,
    data: ModelData,
    contact: Option<String>,
    contact_indexes: Option<Arc<[usize]>>,
}

/// A named field over the entries of one element kind.
#[derive(Debug)]
pub struct Model<K: ElementKind> {
    name: String,
    calculation: Box<dyn ModelCalculation<K>>,
    state: Mutex<ModelState>,
    in_process: AtomicBool,
    _kind: PhantomData<K>,
}

/// Values pushed into a model.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NewValues {
    Uniform(f64),
    Array(Vec<f64>),
}

impl<K: ElementKind> Model<K> {
    pub(crate) fn new(name: String, calculation: Box<dyn ModelCalculation<K>>, len: usize) -> Self {
        let display_type = calculation.display_type();
        Self {
            name,
            calculation,
            state: Mutex::new(ModelState {
                uptodate: false,
                display_type,
                data: ModelData::new(len),
                contact: None,
                contact_indexes: None,
            }),
            in_process: AtomicBool::new(false),
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn calculation(&self) -> &dyn ModelCalculation<K> {
        self.calculation.as_ref()
    }

    pub fn parent(&self) -> Option<String> {
        self.calculation.parent()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.state.lock().uptodate
    }

    /// Marks the model stale. Returns whether it was fresh before.
    pub(crate) fn set_stale(&self) -> bool {
        std::mem::replace(&mut self.state.lock().uptodate, false)
    }

    /// Stored values without triggering a calculation.
    pub(crate) fn stored_data(&self) -> ModelData {
        self.state.lock().data.clone()
    }

    pub(crate) fn contact(&self) -> Option<String> {
        self.state.lock().contact.clone()
    }

    pub(crate) fn reset_contact_cache(&self, contact: &str) {
        let mut state = self.state.lock();
        if state.contact.as_deref() == Some(contact) {
            state.contact_indexes = None;
        }
    }

    /// Runs the calculation if the model is stale.
    ///
    /// # Errors
    /// [`ModelError::CyclicDependency`] if the model is already being
    /// calculated further up the stack, otherwise whatever the calculation or
    /// its dependencies report.
    pub(crate) fn calculate_values(&self, region: &Region) -> Result<(), ModelError> {
        if self.is_up_to_date() {
            return Ok(());
        }
        if self.in_process.swap(true, Ordering::AcqRel) {
            return Err(ModelError::CyclicDependency {
                location: region.location(),
                model: self.name.clone(),
                dependency: self.name.clone(),
            });
        }
        log::trace!("calculating {} \"{}\"", K::KIND, self.name);
        let result = self.run_calculation(region);
        self.in_process.store(false, Ordering::Release);
        result?;
        self.state.lock().uptodate = true;
        Ok(())
    }

    fn run_calculation(&self, region: &Region) -> Result<(), ModelError> {
        let mut ctx = ComputeContext::new(region, self);
        self.calculation.calculate(&mut ctx)?;
        ctx.commit()
    }

    /// Fresh values, calculating first if needed.
    pub(crate) fn values(&self, region: &Region) -> Result<Arc<[f64]>, ModelError> {
        self.calculate_values(region)?;
        Ok(self.state.lock().data.values())
    }

    /// Overwrites the stored values, marks the model fresh, then signals its
    /// dependents. Contact-bound models only take the contact entries.
    pub(crate) fn store(&self, region: &Region, values: NewValues) -> Result<(), ModelError> {
        {
            let mut state = self.state.lock();
            let expected = state.data.len();
            if let NewValues::Array(v) = &values {
                if v.len() != expected {
                    return Err(ModelError::LengthMismatch {
                        location: region.location(),
                        kind: K::KIND,
                        model: self.name.clone(),
                        expected,
                        found: v.len(),
                    });
                }
            }
            let indexes = Self::contact_indexes_locked(region, &mut state);
            match (values, indexes) {
                (NewValues::Uniform(x), None) => state.data.set_uniform(x),
                (NewValues::Array(v), None) => state.data.set_values(v),
                (NewValues::Uniform(x), Some(ix)) => state.data.set_indexes_uniform(&ix, x),
                (NewValues::Array(v), Some(ix)) => state.data.set_indexes(&ix, &v),
            }
            state.uptodate = true;
        }
        region.signal_callbacks(&self.name);
        Ok(())
    }

    fn contact_indexes_locked(region: &Region, state: &mut ModelState) -> Option<Arc<[usize]>> {
        let contact = state.contact.as_deref()?;
        if state.contact_indexes.is_none() {
            let nodes = region
                .contact(contact)
                .map(|c| c.nodes.clone())
                .unwrap_or_default();
            state.contact_indexes = Some(K::contact_indexes(region, &nodes).into());
        }
        state.contact_indexes.clone()
    }
}

/// A model together with the region it lives in.
///
/// The handle borrows the region, so it cannot outlive it. Cloning a handle
/// is cheap.
#[derive(Debug)]
pub struct ModelHandle<'r, K: ElementKind> {
    region: &'r Region,
    model: Arc<Model<K>>,
}

impl<K: ElementKind> Clone for ModelHandle<'_, K> {
    fn clone(&self) -> Self {
        Self {
            region: self.region,
            model: self.model.clone(),
        }
    }
}

impl<'r, K: ElementKind> ModelHandle<'r, K> {
    pub(crate) fn new(region: &'r Region, model: Arc<Model<K>>) -> Self {
        Self { region, model }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.model.name()
    }

    #[inline]
    pub fn kind(&self) -> ModelKind {
        K::KIND
    }

    #[inline]
    pub fn region(&self) -> &'r Region {
        self.region
    }

    pub fn model(&self) -> &Arc<Model<K>> {
        &self.model
    }

    pub fn parent_name(&self) -> Option<String> {
        self.model.parent()
    }

    pub fn display_type(&self) -> DisplayType {
        self.model.state.lock().display_type
    }

    pub fn set_display_type(&self, display_type: DisplayType) {
        self.model.state.lock().display_type = display_type;
    }

    /// Dense values, one per entry, recalculated first if stale.
    ///
    /// # Errors
    /// Any fatal error raised while calculating this model or one of its
    /// dependencies. The error is also recorded in the region diagnostics.
    pub fn scalar_values(&self) -> Result<Arc<[f64]>, ModelError> {
        self.model
            .values(self.region)
            .inspect_err(|e| self.region.report(Severity::Fatal, e.to_string()))
    }

    /// Replaces the values of this model and invalidates its dependents.
    ///
    /// # Errors
    /// [`ModelError::LengthMismatch`] if `values` does not have one entry per
    /// element entry.
    pub fn set_values(&self, values: impl Into<Vec<f64>>) -> Result<(), ModelError> {
        self.model.store(self.region, NewValues::Array(values.into()))
    }

    /// Sets every entry to `value`, stored in uniform form.
    pub fn set_uniform_value(&self, value: f64) -> Result<(), ModelError> {
        self.model.store(self.region, NewValues::Uniform(value))
    }

    /// Whether the current values are held in uniform form.
    pub fn is_uniform(&self) -> Result<bool, ModelError> {
        self.scalar_values()?;
        Ok(self.model.state.lock().data.is_uniform())
    }

    /// The uniform value, if the model is held in uniform form.
    pub fn uniform_value(&self) -> Result<Option<f64>, ModelError> {
        self.scalar_values()?;
        Ok(self.model.state.lock().data.uniform_value())
    }

    pub fn is_zero(&self) -> Result<bool, ModelError> {
        self.scalar_values()?;
        Ok(self.model.state.lock().data.is_zero())
    }

    pub fn is_one(&self) -> Result<bool, ModelError> {
        self.scalar_values()?;
        Ok(self.model.state.lock().data.is_one())
    }

    pub fn is_up_to_date(&self) -> bool {
        self.model.is_up_to_date()
    }

    /// Marks this model stale and invalidates its dependents.
    pub fn mark_old(&self) {
        self.model.set_stale();
        self.region.signal_callbacks(self.name());
    }

    pub fn contact(&self) -> Option<String> {
        self.model.contact()
    }

    /// Binds this model to a contact, or removes the binding with `None`.
    ///
    /// # Errors
    /// [`ModelError::UnknownContact`] if the region has no such contact.
    pub fn set_contact(&self, contact: Option<&str>) -> Result<(), ModelError> {
        if let Some(name) = contact {
            if self.region.contact(name).is_none() {
                return Err(ModelError::UnknownContact(self.region.location(), name.to_string()));
            }
        }
        let mut state = self.model.state.lock();
        state.contact = contact.map(str::to_string);
        state.contact_indexes = None;
        Ok(())
    }

    /// Entries written by [`set_values`](Self::set_values); every entry when
    /// the model is not bound to a contact.
    pub fn contact_indexes(&self) -> Arc<[usize]> {
        let mut state = self.model.state.lock();
        match Model::<K>::contact_indexes_locked(self.region, &mut state) {
            Some(ix) => ix,
            None => (0..state.data.len()).collect(),
        }
    }
}

impl ModelHandle<'_, EdgeKind> {
    /// Edge values averaged onto nodes over all edges touching each node.
    pub fn scalar_values_on_nodes(&self) -> Result<Vec<f64>, ModelError> {
        let ev = self.scalar_values()?;
        let region = self.region;
        let mut values = vec![0.0; region.nodes().len()];
        let mut count = vec![0usize; region.nodes().len()];
        for (edge, &v) in region.edges().iter().zip(ev.iter()) {
            for n in edge.nodes {
                values[n] += v;
                count[n] += 1;
            }
        }
        for (v, &c) in values.iter_mut().zip(&count) {
            if c != 0 {
                *v /= c as f64;
            }
        }
        Ok(values)
    }

    /// Edge values projected along each edge's unit vector, weighted by
    /// direction and averaged onto nodes.
    ///
    /// # Errors
    /// [`ModelError::MissingDependency`] if the `unitx`/`unity`/`unitz` models
    /// needed for the region's dimension are not defined.
    pub fn vector_values_on_nodes(&self) -> Result<Vec<Vector>, ModelError> {
        let ev = self.scalar_values()?;
        let region = self.region;
        let dimension = region.dimension();
        let mut units = Vec::with_capacity(3);
        for name in ["unitx", "unity", "unitz"].into_iter().take(dimension) {
            let model = region.edge_model(name).ok_or_else(|| ModelError::MissingDependency {
                location: region.location(),
                kind: ModelKind::Edge,
                model: self.name().to_string(),
                required_kind: ModelKind::Edge,
                required: name.to_string(),
            })?;
            units.push(model.scalar_values()?);
        }

        let mut values = vec![[0.0; 3]; region.nodes().len()];
        let mut scaling = vec![[0.0; 3]; region.nodes().len()];
        for (i, edge) in region.edges().iter().enumerate() {
            for (d, unit) in units.iter().enumerate() {
                let s = unit[i].abs();
                let weighted = ev[i] * unit[i] * s;
                for n in edge.nodes {
                    values[n][d] += weighted;
                    scaling[n][d] += s;
                }
            }
        }
        for (v, s) in values.iter_mut().zip(&scaling) {
            for d in 0..3 {
                v[d] = if s[d] > 0.0 { v[d] / s[d] } else { 0.0 };
            }
        }
        Ok(values)
    }
}

impl<K: ElementEdgeKind> ModelHandle<'_, K> {
    /// Element-edge entries summed onto the region edges they belong to.
    pub fn values_on_edges(&self) -> Result<Vec<f64>, ModelError> {
        let values = self.scalar_values()?;
        Ok(sum_onto_edges::<K>(self.region, &values))
    }
}

pub(crate) fn sum_onto_edges<K: ElementEdgeKind>(region: &Region, values: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; region.edges().len()];
    for (&edge, &v) in K::entry_edges(region).iter().zip(values) {
        out[edge] += v;
    }
    out
}
