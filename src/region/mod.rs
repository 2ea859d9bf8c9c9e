//! Regions: finalized mesh partitions that own their models.
//!
//! A [`Region`] owns
//! - the element lists and adjacency tables built by [`RegionBuilder`],
//! - one [`ModelRegistry`] per element kind,
//! - the dependency graph between model and parameter names,
//! - contacts, interfaces, parameters and the diagnostic log.
//!
//! All shared state sits behind short-lived locks that are never held while
//! a model calculates, so a region is `Send + Sync` and distinct regions can
//! be evaluated on different threads.

pub mod builder;
pub mod contact;
pub mod dependency;
pub mod parameters;

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use static_assertions::assert_impl_all;

use crate::geometry::centers::{tetrahedron_center, triangle_center};
use crate::geometry::{Edge, Node, Tetrahedron, Triangle, Vector};
use crate::model::diagnostics::DiagnosticLog;
use crate::model::{
    Diagnostic, EdgeKind, ElementKind, Model, ModelCalculation, ModelHandle, ModelKind,
    ModelRegistry, NodeKind, Severity, SubModel, TetrahedronEdgeKind, TriangleEdgeKind,
};
use crate::model_error::{Location, ModelError};

pub use builder::{MeshDescription, RegionBuilder};
pub use contact::{Contact, Interface};
pub use dependency::DependencyGraph;
pub use parameters::{ParameterSet, ParameterValue};

use parameters::Parameters;

/// Name signalled when contacts change.
pub const CONTACT_CHANGE: &str = "@@@ContactChange";
/// Name signalled when interfaces change.
pub const INTERFACE_CHANGE: &str = "@@@InterfaceChange";

/// The four model registries of a region.
#[derive(Debug, Default)]
pub struct RegionModels {
    pub node: ModelRegistry<NodeKind>,
    pub edge: ModelRegistry<EdgeKind>,
    pub triangle_edge: ModelRegistry<TriangleEdgeKind>,
    pub tetrahedron_edge: ModelRegistry<TetrahedronEdgeKind>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Adjacency {
    pub(crate) node_to_edges: Vec<Vec<usize>>,
    pub(crate) node_to_triangles: Vec<Vec<usize>>,
    pub(crate) node_to_tetrahedra: Vec<Vec<usize>>,
    pub(crate) edge_to_triangles: Vec<Vec<usize>>,
    pub(crate) edge_to_tetrahedra: Vec<Vec<usize>>,
    pub(crate) triangle_to_edges: Vec<[usize; 3]>,
    pub(crate) tetrahedron_to_edges: Vec<[usize; 6]>,
}

#[derive(Debug)]
pub struct Region {
    device: String,
    name: String,
    dimension: usize,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    triangles: Vec<Triangle>,
    tetrahedra: Vec<Tetrahedron>,
    adjacency: Adjacency,
    triangle_centers: OnceCell<Vec<Vector>>,
    tetrahedron_centers: OnceCell<Vec<Vector>>,
    contacts: RwLock<BTreeMap<String, Contact>>,
    interfaces: RwLock<BTreeMap<String, Interface>>,
    parameters: RwLock<Parameters>,
    models: RegionModels,
    dependencies: Mutex<DependencyGraph>,
    diagnostics: Mutex<DiagnosticLog>,
}

assert_impl_all!(Region: Send, Sync);

impl Region {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        device: String,
        name: String,
        dimension: usize,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        triangles: Vec<Triangle>,
        tetrahedra: Vec<Tetrahedron>,
        adjacency: Adjacency,
        contacts: BTreeMap<String, Contact>,
        interfaces: BTreeMap<String, Interface>,
    ) -> Self {
        Self {
            device,
            name,
            dimension,
            nodes,
            edges,
            triangles,
            tetrahedra,
            adjacency,
            triangle_centers: OnceCell::new(),
            tetrahedron_centers: OnceCell::new(),
            contacts: RwLock::new(contacts),
            interfaces: RwLock::new(interfaces),
            parameters: RwLock::new(Parameters::default()),
            models: RegionModels::default(),
            dependencies: Mutex::new(DependencyGraph::new()),
            diagnostics: Mutex::new(DiagnosticLog::default()),
        }
    }

    // ----- mesh -------------------------------------------------------------

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn device_name(&self) -> &str {
        &self.device
    }

    pub fn location(&self) -> Location {
        Location::new(&self.device, &self.name)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    pub fn tetrahedra(&self) -> &[Tetrahedron] {
        &self.tetrahedra
    }

    pub fn node_to_edges(&self) -> &[Vec<usize>] {
        &self.adjacency.node_to_edges
    }

    pub fn node_to_triangles(&self) -> &[Vec<usize>] {
        &self.adjacency.node_to_triangles
    }

    pub fn node_to_tetrahedra(&self) -> &[Vec<usize>] {
        &self.adjacency.node_to_tetrahedra
    }

    pub fn edge_to_triangles(&self) -> &[Vec<usize>] {
        &self.adjacency.edge_to_triangles
    }

    pub fn edge_to_tetrahedra(&self) -> &[Vec<usize>] {
        &self.adjacency.edge_to_tetrahedra
    }

    /// Edges of each triangle; entry `j` is the edge opposite node `j`.
    pub fn triangle_to_edges(&self) -> &[[usize; 3]] {
        &self.adjacency.triangle_to_edges
    }

    /// Edges of each tetrahedron in [`Tetrahedron::LOCAL_EDGES`] order.
    pub fn tetrahedron_to_edges(&self) -> &[[usize; 6]] {
        &self.adjacency.tetrahedron_to_edges
    }

    pub fn position(&self, node: usize) -> Vector {
        self.nodes[node].position
    }

    /// Circumcenter of every triangle, computed on first use.
    ///
    /// # Errors
    /// [`ModelError::InvalidMesh`] if a triangle is degenerate.
    pub fn triangle_centers(&self) -> Result<&[Vector], ModelError> {
        self.triangle_centers
            .get_or_try_init(|| {
                self.triangles
                    .iter()
                    .map(|t| {
                        let [a, b, c] = t.nodes.map(|n| self.position(n));
                        triangle_center(a, b, c).ok_or_else(|| {
                            ModelError::InvalidMesh(format!(
                                "{} triangle {} {:?} is degenerate",
                                self.location(),
                                t.index,
                                t.nodes
                            ))
                        })
                    })
                    .collect()
            })
            .map(Vec::as_slice)
    }

    /// Circumcenter of every tetrahedron, computed on first use.
    ///
    /// # Errors
    /// [`ModelError::InvalidMesh`] if a tetrahedron is flat.
    pub fn tetrahedron_centers(&self) -> Result<&[Vector], ModelError> {
        self.tetrahedron_centers
            .get_or_try_init(|| {
                self.tetrahedra
                    .iter()
                    .map(|t| {
                        tetrahedron_center(t.nodes.map(|n| self.position(n))).ok_or_else(|| {
                            ModelError::InvalidMesh(format!(
                                "{} tetrahedron {} {:?} is flat",
                                self.location(),
                                t.index,
                                t.nodes
                            ))
                        })
                    })
                    .collect()
            })
            .map(Vec::as_slice)
    }

    /// Edges with both endpoints in `nodes` (a sorted node list).
    pub fn edges_within(&self, nodes: &[usize]) -> Vec<usize> {
        self.edges
            .iter()
            .filter(|e| e.nodes.iter().all(|n| nodes.binary_search(n).is_ok()))
            .map(|e| e.index)
            .collect()
    }

    // ----- contacts and interfaces ------------------------------------------

    pub fn contact(&self, name: &str) -> Option<Contact> {
        self.contacts.read().get(name).cloned()
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.contacts.read().values().cloned().collect()
    }

    /// Adds or redefines a contact and invalidates models that depend on
    /// contact placement.
    ///
    /// # Errors
    /// [`ModelError::InvalidMesh`] if a node index is out of range.
    pub fn add_contact(&self, name: &str, nodes: Vec<usize>) -> Result<(), ModelError> {
        let nodes = builder::node_set(name, nodes, self.nodes.len())?;
        self.contacts.write().insert(
            name.to_string(),
            Contact {
                name: name.to_string(),
                nodes,
            },
        );
        self.reset_contact_caches(name);
        self.signal_callbacks(CONTACT_CHANGE);
        Ok(())
    }

    pub fn interface(&self, name: &str) -> Option<Interface> {
        self.interfaces.read().get(name).cloned()
    }

    pub fn interfaces(&self) -> Vec<Interface> {
        self.interfaces.read().values().cloned().collect()
    }

    /// Adds or redefines an interface.
    ///
    /// # Errors
    /// [`ModelError::InvalidMesh`] if a node index is out of range.
    pub fn add_interface(&self, name: &str, nodes: Vec<usize>) -> Result<(), ModelError> {
        let nodes = builder::node_set(name, nodes, self.nodes.len())?;
        self.interfaces.write().insert(
            name.to_string(),
            Interface {
                name: name.to_string(),
                nodes,
            },
        );
        self.signal_callbacks(INTERFACE_CHANGE);
        Ok(())
    }

    fn reset_contact_caches(&self, contact: &str) {
        for m in self.models.node.snapshot() {
            m.reset_contact_cache(contact);
        }
        for m in self.models.edge.snapshot() {
            m.reset_contact_cache(contact);
        }
        for m in self.models.triangle_edge.snapshot() {
            m.reset_contact_cache(contact);
        }
        for m in self.models.tetrahedron_edge.snapshot() {
            m.reset_contact_cache(contact);
        }
    }

    // ----- parameters -------------------------------------------------------

    pub fn parameter(&self, name: &str) -> Option<ParameterValue> {
        self.parameters.read().get(name).cloned()
    }

    pub fn number_parameter(&self, name: &str) -> Option<f64> {
        self.parameters.read().get(name).and_then(ParameterValue::as_number)
    }

    /// Sets a region-local parameter and invalidates models reading it.
    pub fn set_parameter(&self, name: &str, value: impl Into<ParameterValue>) {
        self.parameters.write().set_local(name, value.into());
        self.signal_callbacks(name);
    }

    /// Removes a region-local parameter, uncovering any inherited value.
    pub fn clear_parameter(&self, name: &str) {
        if self.parameters.write().remove_local(name).is_some() {
            self.signal_callbacks(name);
        }
    }

    pub(crate) fn set_inherited_parameter(&self, name: &str, value: ParameterValue) {
        self.parameters.write().set_inherited(name, value);
        self.signal_callbacks(name);
    }

    // ----- diagnostics ------------------------------------------------------

    /// Records an event and forwards it to the log.
    pub fn report(&self, severity: Severity, message: String) {
        self.diagnostics.lock().record(severity, message);
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().entries().to_vec()
    }

    pub fn diagnostic_count(&self, severity: Severity) -> usize {
        self.diagnostics.lock().count(severity)
    }

    pub fn clear_diagnostics(&self) {
        self.diagnostics.lock().clear();
    }

    // ----- dependency graph -------------------------------------------------

    /// Records that `consumer` reads `provider`.
    ///
    /// # Errors
    /// [`ModelError::CyclicDependency`] if `provider` already depends on
    /// `consumer`.
    pub fn register_callback(&self, consumer: &str, provider: &str) -> Result<(), ModelError> {
        self.dependencies
            .lock()
            .register(consumer, provider)
            .map_err(|dependency| ModelError::CyclicDependency {
                location: self.location(),
                model: consumer.to_string(),
                dependency,
            })
    }

    /// Forgets everything `consumer` reads.
    pub fn unregister_callback(&self, consumer: &str) {
        self.dependencies.lock().unregister(consumer);
    }

    /// Marks every model that transitively depends on `name` stale.
    ///
    /// Nothing is recalculated here; stale models recalculate on their next
    /// read.
    pub fn signal_callbacks(&self, name: &str) {
        let dependents = self.dependencies.lock().transitive_dependents(name);
        for dependent in &dependents {
            if self.mark_stale(dependent) {
                log::trace!("\"{dependent}\" is stale after change to \"{name}\"");
            }
        }
    }

    /// Direct dependents of `name`.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.dependencies.lock().dependents_of(name)
    }

    /// Names `name` was registered as reading.
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.dependencies.lock().providers_of(name)
    }

    fn mark_stale(&self, name: &str) -> bool {
        let m = &self.models;
        m.node.get(name).is_some_and(|x| x.set_stale())
            | m.edge.get(name).is_some_and(|x| x.set_stale())
            | m.triangle_edge.get(name).is_some_and(|x| x.set_stale())
            | m.tetrahedron_edge.get(name).is_some_and(|x| x.set_stale())
    }

    // ----- model registry ---------------------------------------------------

    pub fn models(&self) -> &RegionModels {
        &self.models
    }

    /// Kind of the model named `name`, if any.
    pub fn model_kind(&self, name: &str) -> Option<ModelKind> {
        let m = &self.models;
        if m.node.contains(name) {
            Some(ModelKind::Node)
        } else if m.edge.contains(name) {
            Some(ModelKind::Edge)
        } else if m.triangle_edge.contains(name) {
            Some(ModelKind::TriangleEdge)
        } else if m.tetrahedron_edge.contains(name) {
            Some(ModelKind::TetrahedronEdge)
        } else {
            None
        }
    }

    /// Creates a model named `name` and makes the region its owner.
    ///
    /// The calculation's declared dependencies are recorded, every declared
    /// companion gets a [`SubModel`], and dependents of `name` are
    /// invalidated. An existing model of the same kind and name is replaced.
    ///
    /// # Errors
    /// - [`ModelError::NameCollision`] if a model of another kind already
    ///   uses `name`.
    /// - [`ModelError::CyclicDependency`] if a declared dependency already
    ///   depends on `name`.
    pub fn add_model<K, C>(&self, name: &str, calculation: C) -> Result<ModelHandle<'_, K>, ModelError>
    where
        K: ElementKind,
        C: ModelCalculation<K> + 'static,
    {
        self.insert_model::<K>(name.to_string(), Box::new(calculation))
    }

    pub fn add_node_model(
        &self,
        name: &str,
        calculation: impl ModelCalculation<NodeKind> + 'static,
    ) -> Result<ModelHandle<'_, NodeKind>, ModelError> {
        self.add_model(name, calculation)
    }

    pub fn add_edge_model(
        &self,
        name: &str,
        calculation: impl ModelCalculation<EdgeKind> + 'static,
    ) -> Result<ModelHandle<'_, EdgeKind>, ModelError> {
        self.add_model(name, calculation)
    }

    pub fn add_triangle_edge_model(
        &self,
        name: &str,
        calculation: impl ModelCalculation<TriangleEdgeKind> + 'static,
    ) -> Result<ModelHandle<'_, TriangleEdgeKind>, ModelError> {
        self.add_model(name, calculation)
    }

    pub fn add_tetrahedron_edge_model(
        &self,
        name: &str,
        calculation: impl ModelCalculation<TetrahedronEdgeKind> + 'static,
    ) -> Result<ModelHandle<'_, TetrahedronEdgeKind>, ModelError> {
        self.add_model(name, calculation)
    }

    pub(crate) fn insert_model<K: ElementKind>(
        &self,
        name: String,
        calculation: Box<dyn ModelCalculation<K>>,
    ) -> Result<ModelHandle<'_, K>, ModelError> {
        let companions = calculation.companions(self);
        // Nothing is registered unless the model and every companion fit.
        for requested in std::iter::once(&name).chain(&companions) {
            if let Some(existing) = self.model_kind(requested).filter(|&k| k != K::KIND) {
                let err = ModelError::NameCollision {
                    location: self.location(),
                    name: requested.clone(),
                    existing,
                    requested: K::KIND,
                };
                self.report(Severity::Fatal, err.to_string());
                return Err(err);
            }
        }

        let dependencies = calculation.dependencies(self);
        self.dependencies
            .lock()
            .set_dependencies(&name, &dependencies)
            .map_err(|dependency| ModelError::CyclicDependency {
                location: self.location(),
                model: name.clone(),
                dependency,
            })?;

        let model = Arc::new(Model::new(name.clone(), calculation, K::entry_count(self)));
        let previous = K::registry(self).insert(model.clone());
        if previous.is_some() {
            self.report(
                Severity::Info,
                format!("Replacing {} \"{}\" in region \"{}\"", K::KIND, name, self.name),
            );
        }
        self.signal_callbacks(&name);

        for companion in companions {
            let current = K::registry(self).get(&companion);
            if current.is_some_and(|c| c.parent().as_deref() == Some(name.as_str())) {
                continue;
            }
            let sub_model = Box::new(SubModel::with_parent(name.clone()));
            if let Err(err) = self.insert_model::<K>(companion, sub_model) {
                self.rollback_insert(&name, previous);
                return Err(err);
            }
        }
        Ok(ModelHandle::new(self, model))
    }

    /// Undoes a partial [`insert_model`](Self::insert_model), putting back
    /// the model it replaced.
    fn rollback_insert<K: ElementKind>(&self, name: &str, previous: Option<Arc<Model<K>>>) {
        K::registry(self).remove(name);
        self.unregister_callback(name);
        if let Some(previous) = previous {
            let dependencies = previous.calculation().dependencies(self);
            if let Err(dependency) = self.dependencies.lock().set_dependencies(name, &dependencies) {
                log::warn!("could not restore dependency of \"{name}\" on \"{dependency}\"");
            }
            K::registry(self).insert(previous);
        }
        self.signal_callbacks(name);
    }

    pub fn get_model<K: ElementKind>(&self, name: &str) -> Option<ModelHandle<'_, K>> {
        K::registry(self).get(name).map(|m| ModelHandle::new(self, m))
    }

    pub fn node_model(&self, name: &str) -> Option<ModelHandle<'_, NodeKind>> {
        self.get_model(name)
    }

    pub fn edge_model(&self, name: &str) -> Option<ModelHandle<'_, EdgeKind>> {
        self.get_model(name)
    }

    pub fn triangle_edge_model(&self, name: &str) -> Option<ModelHandle<'_, TriangleEdgeKind>> {
        self.get_model(name)
    }

    pub fn tetrahedron_edge_model(&self, name: &str) -> Option<ModelHandle<'_, TetrahedronEdgeKind>> {
        self.get_model(name)
    }

    /// Looks up `name`, recreating it first if it is a deleted companion of
    /// a live model.
    ///
    /// # Errors
    /// Errors raised while recalculating the producing model.
    pub fn resolve_model<K: ElementKind>(&self, name: &str) -> Result<Option<ModelHandle<'_, K>>, ModelError> {
        if let Some(handle) = self.get_model::<K>(name) {
            return Ok(Some(handle));
        }
        let producer = K::registry(self)
            .snapshot()
            .into_iter()
            .find(|m| m.calculation().companions(self).iter().any(|c| c == name));
        let Some(producer) = producer else {
            return Ok(None);
        };
        producer.set_stale();
        producer.calculate_values(self)?;
        Ok(self.get_model::<K>(name))
    }

    /// Removes a model, invalidating everything that reads it.
    ///
    /// Deleting a companion marks its parent stale, so the next read of the
    /// parent recreates the companion. Returns whether a model was removed.
    pub fn delete_model<K: ElementKind>(&self, name: &str) -> bool {
        let Some(model) = K::registry(self).remove(name) else {
            return false;
        };
        self.unregister_callback(name);
        self.signal_callbacks(name);
        if let Some(parent) = model.parent().and_then(|p| K::registry(self).get(&p)) {
            parent.set_stale();
        }
        true
    }

    pub fn delete_node_model(&self, name: &str) -> bool {
        self.delete_model::<NodeKind>(name)
    }

    pub fn delete_edge_model(&self, name: &str) -> bool {
        self.delete_model::<EdgeKind>(name)
    }

    pub fn delete_triangle_edge_model(&self, name: &str) -> bool {
        self.delete_model::<TriangleEdgeKind>(name)
    }

    pub fn delete_tetrahedron_edge_model(&self, name: &str) -> bool {
        self.delete_model::<TetrahedronEdgeKind>(name)
    }

    pub fn node_model_list(&self) -> Vec<String> {
        self.models.node.names()
    }

    pub fn edge_model_list(&self) -> Vec<String> {
        self.models.edge.names()
    }

    pub fn triangle_edge_model_list(&self) -> Vec<String> {
        self.models.triangle_edge.names()
    }

    pub fn tetrahedron_edge_model_list(&self) -> Vec<String> {
        self.models.tetrahedron_edge.names()
    }
}

impl Drop for Region {
    // Edges first, then models; models never reach back into the region.
    fn drop(&mut self) {
        self.dependencies.get_mut().clear();
        self.models.node.clear();
        self.models.edge.clear();
        self.models.triangle_edge.clear();
        self.models.tetrahedron_edge.clear();
    }
}
