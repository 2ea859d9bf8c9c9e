//! Region construction from raw node positions and element connectivity.
//!
//! [`RegionBuilder::finalize`] assigns dense indices, derives the edges
//! implied by triangles and tetrahedra, and builds every adjacency table the
//! models read.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{Edge, Node, Tetrahedron, Triangle, Vector};
use crate::model_error::ModelError;
use crate::region::contact::{Contact, Interface};
use crate::region::{Adjacency, Region};

/// Plain description of one region's mesh, loadable from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshDescription {
    /// Overrides the dimension inferred from the element types present.
    #[serde(default)]
    pub dimension: Option<usize>,
    pub nodes: Vec<Vector>,
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,
    #[serde(default)]
    pub triangles: Vec<[usize; 3]>,
    #[serde(default)]
    pub tetrahedra: Vec<[usize; 4]>,
    #[serde(default)]
    pub contacts: BTreeMap<String, Vec<usize>>,
    #[serde(default)]
    pub interfaces: BTreeMap<String, Vec<usize>>,
}

#[derive(Debug, Clone)]
pub struct RegionBuilder {
    device: String,
    name: String,
    mesh: MeshDescription,
}

impl RegionBuilder {
    pub fn new(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from_description(device, name, MeshDescription::default())
    }

    pub fn from_description(
        device: impl Into<String>,
        name: impl Into<String>,
        mesh: MeshDescription,
    ) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            mesh,
        }
    }

    pub fn dimension(mut self, dimension: usize) -> Self {
        self.mesh.dimension = Some(dimension);
        self
    }

    /// Adds a node and returns its index.
    pub fn add_node(&mut self, position: Vector) -> usize {
        self.mesh.nodes.push(position);
        self.mesh.nodes.len() - 1
    }

    pub fn add_edge(&mut self, n0: usize, n1: usize) -> &mut Self {
        self.mesh.edges.push([n0, n1]);
        self
    }

    pub fn add_triangle(&mut self, nodes: [usize; 3]) -> &mut Self {
        self.mesh.triangles.push(nodes);
        self
    }

    pub fn add_tetrahedron(&mut self, nodes: [usize; 4]) -> &mut Self {
        self.mesh.tetrahedra.push(nodes);
        self
    }

    pub fn add_contact(&mut self, name: impl Into<String>, nodes: Vec<usize>) -> &mut Self {
        self.mesh.contacts.insert(name.into(), nodes);
        self
    }

    pub fn add_interface(&mut self, name: impl Into<String>, nodes: Vec<usize>) -> &mut Self {
        self.mesh.interfaces.insert(name.into(), nodes);
        self
    }

    /// Builds the region.
    ///
    /// # Errors
    /// [`ModelError::InvalidMesh`] if an element refers to a node that does
    /// not exist, repeats a node, or the dimension is outside `1..=3`.
    pub fn finalize(self) -> Result<Region, ModelError> {
        let RegionBuilder { device, name, mesh } = self;
        let node_count = mesh.nodes.len();

        for e in &mesh.edges {
            check_element("edge", e, node_count)?;
        }
        for t in &mesh.triangles {
            check_element("triangle", t, node_count)?;
        }
        for t in &mesh.tetrahedra {
            check_element("tetrahedron", t, node_count)?;
        }

        let dimension = mesh.dimension.unwrap_or(if !mesh.tetrahedra.is_empty() {
            3
        } else if !mesh.triangles.is_empty() {
            2
        } else {
            1
        });
        if !(1..=3).contains(&dimension) {
            return Err(ModelError::InvalidMesh(format!(
                "region \"{name}\" has unsupported dimension {dimension}"
            )));
        }

        let nodes: Vec<Node> = mesh
            .nodes
            .iter()
            .enumerate()
            .map(|(index, &position)| Node { index, position })
            .collect();

        // Every edge, explicit or implied, in canonical (low, high) order.
        let mut pairs = BTreeSet::new();
        pairs.extend(mesh.edges.iter().map(|&[a, b]| canonical(a, b)));
        for t in &mesh.triangles {
            pairs.extend([canonical(t[1], t[2]), canonical(t[0], t[2]), canonical(t[0], t[1])]);
        }
        for t in &mesh.tetrahedra {
            pairs.extend(Tetrahedron::LOCAL_EDGES.iter().map(|&(a, b)| canonical(t[a], t[b])));
        }
        let edges: Vec<Edge> = pairs
            .into_iter()
            .enumerate()
            .map(|(index, (a, b))| Edge { index, nodes: [a, b] })
            .collect();
        let edge_index: HashMap<(usize, usize), usize> = edges
            .iter()
            .map(|e| ((e.head(), e.tail()), e.index))
            .collect();
        let lookup = |a: usize, b: usize| edge_index[&canonical(a, b)];

        let triangles: Vec<Triangle> = mesh
            .triangles
            .iter()
            .enumerate()
            .map(|(index, &nodes)| Triangle { index, nodes })
            .collect();
        let tetrahedra: Vec<Tetrahedron> = mesh
            .tetrahedra
            .iter()
            .enumerate()
            .map(|(index, &nodes)| Tetrahedron { index, nodes })
            .collect();

        let triangle_to_edges: Vec<[usize; 3]> = triangles
            .iter()
            .map(|t| {
                let [n0, n1, n2] = t.nodes;
                [lookup(n1, n2), lookup(n0, n2), lookup(n0, n1)]
            })
            .collect();
        let tetrahedron_to_edges: Vec<[usize; 6]> = tetrahedra
            .iter()
            .map(|t| Tetrahedron::LOCAL_EDGES.map(|(a, b)| lookup(t.nodes[a], t.nodes[b])))
            .collect();

        let mut adjacency = Adjacency {
            node_to_edges: vec![Vec::new(); node_count],
            node_to_triangles: vec![Vec::new(); node_count],
            node_to_tetrahedra: vec![Vec::new(); node_count],
            edge_to_triangles: vec![Vec::new(); edges.len()],
            edge_to_tetrahedra: vec![Vec::new(); edges.len()],
            triangle_to_edges,
            tetrahedron_to_edges,
        };
        for e in &edges {
            for n in e.nodes {
                adjacency.node_to_edges[n].push(e.index);
            }
        }
        for t in &triangles {
            for n in t.nodes {
                adjacency.node_to_triangles[n].push(t.index);
            }
            for &e in &adjacency.triangle_to_edges[t.index] {
                adjacency.edge_to_triangles[e].push(t.index);
            }
        }
        for t in &tetrahedra {
            for n in t.nodes {
                adjacency.node_to_tetrahedra[n].push(t.index);
            }
            for &e in &adjacency.tetrahedron_to_edges[t.index] {
                adjacency.edge_to_tetrahedra[e].push(t.index);
            }
        }

        let mut contacts = BTreeMap::new();
        for (contact, list) in mesh.contacts {
            let nodes = node_set(&contact, list, node_count)?;
            contacts.insert(contact.clone(), Contact { name: contact, nodes });
        }
        let mut interfaces = BTreeMap::new();
        for (interface, list) in mesh.interfaces {
            let nodes = node_set(&interface, list, node_count)?;
            interfaces.insert(interface.clone(), Interface { name: interface, nodes });
        }

        log::debug!(
            "finalized region \"{name}\" on device \"{device}\": dimension {dimension}, {} nodes, {} edges, {} triangles, {} tetrahedra",
            nodes.len(),
            edges.len(),
            triangles.len(),
            tetrahedra.len()
        );

        Ok(Region::from_parts(
            device, name, dimension, nodes, edges, triangles, tetrahedra, adjacency, contacts,
            interfaces,
        ))
    }
}

#[inline]
fn canonical(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

fn check_element<const N: usize>(what: &str, nodes: &[usize; N], node_count: usize) -> Result<(), ModelError> {
    if let Some(&n) = nodes.iter().find(|&&n| n >= node_count) {
        return Err(ModelError::InvalidMesh(format!(
            "{what} {nodes:?} refers to node {n}, but only {node_count} nodes exist"
        )));
    }
    for i in 0..N {
        if nodes[i + 1..].contains(&nodes[i]) {
            return Err(ModelError::InvalidMesh(format!("{what} {nodes:?} repeats node {}", nodes[i])));
        }
    }
    Ok(())
}

/// Sorted unique node list, validated against the node count.
pub(crate) fn node_set(name: &str, mut nodes: Vec<usize>, node_count: usize) -> Result<Arc<[usize]>, ModelError> {
    if let Some(&n) = nodes.iter().find(|&&n| n >= node_count) {
        return Err(ModelError::InvalidMesh(format!(
            "\"{name}\" refers to node {n}, but only {node_count} nodes exist"
        )));
    }
    nodes.sort_unstable();
    nodes.dedup();
    Ok(nodes.into())
}
