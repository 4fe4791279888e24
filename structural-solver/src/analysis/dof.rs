//! Global DOF numbering

use std::collections::HashMap;

use nalgebra::DVector;

use crate::model::StructuralModel;

/// Names of the six nodal DOFs, in numbering order
pub const COMPONENTS: [&str; 6] = ["DX", "DY", "DZ", "RX", "RY", "RZ"];

/// Six contiguous equations per node in node declaration order, split into
/// free and restrained sets that both keep global order
#[derive(Debug, Clone)]
pub struct DofMap {
    node_ids: Vec<String>,
    index: HashMap<String, usize>,
    free: Vec<usize>,
    restrained: Vec<usize>,
    /// Reduced index of every global DOF, `None` when restrained
    reduced: Vec<Option<usize>>,
}

impl DofMap {
    pub fn new(model: &StructuralModel) -> Self {
        let n = model.nodes.len() * 6;
        let mut free = Vec::with_capacity(n);
        let mut restrained = Vec::new();
        let mut reduced = vec![None; n];
        let mut index = HashMap::with_capacity(model.nodes.len());

        for (i, node) in model.nodes.iter().enumerate() {
            index.insert(node.id.clone(), i);
            for (c, &fixed) in node.restraint.as_array().iter().enumerate() {
                let dof = 6 * i + c;
                if fixed {
                    restrained.push(dof);
                } else {
                    reduced[dof] = Some(free.len());
                    free.push(dof);
                }
            }
        }

        Self {
            node_ids: model.nodes.iter().map(|n| n.id.clone()).collect(),
            index,
            free,
            restrained,
            reduced,
        }
    }

    pub fn total(&self) -> usize {
        self.reduced.len()
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    pub fn free(&self) -> &[usize] {
        &self.free
    }

    pub fn restrained(&self) -> &[usize] {
        &self.restrained
    }

    /// Reduced index of every global DOF
    pub fn reduced_map(&self) -> &[Option<usize>] {
        &self.reduced
    }

    pub fn is_restrained(&self, dof: usize) -> bool {
        self.reduced[dof].is_none()
    }

    pub fn node_ids(&self) -> &[String] {
        &self.node_ids
    }

    /// Position of a node in the numbering
    pub fn node_index(&self, node: &str) -> Option<usize> {
        self.index.get(node).copied()
    }

    /// The six global DOFs of a node
    pub fn node_dofs(&self, node: &str) -> Option<[usize; 6]> {
        self.node_index(node).map(|i| std::array::from_fn(|c| 6 * i + c))
    }

    /// Node id and component name of a global DOF
    pub fn describe(&self, dof: usize) -> (String, &'static str) {
        let node = self.node_ids.get(dof / 6).cloned().unwrap_or_default();
        (node, COMPONENTS[dof % 6])
    }

    /// Node id and component name of a reduced (free) DOF
    pub fn describe_free(&self, reduced: usize) -> (usize, String, &'static str) {
        let dof = self.free.get(reduced).copied().unwrap_or(0);
        let (node, component) = self.describe(dof);
        (dof, node, component)
    }

    /// Free entries of a full vector
    pub fn gather(&self, full: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(self.free.len(), self.free.iter().map(|&i| full[i]))
    }

    /// Full vector with zeros at restrained DOFs
    pub fn scatter(&self, reduced: &DVector<f64>) -> DVector<f64> {
        let mut full = DVector::zeros(self.total());
        for (r, &dof) in self.free.iter().enumerate() {
            full[dof] = reduced[r];
        }
        full
    }
}
