use serde::{Deserialize, Serialize};

use super::solver;
use crate::UID;
use crate::name::HasName;
use crate::sim::materials::{Material, Role};

/// One layer of a [`ConstructionSpec`].
///
/// A single material forms a series layer shared by every path; one material
/// per path forms a parallel layer (e.g. stud next to cavity insulation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecLayer {
    pub materials: Vec<Material>,
    /// Excluded layers count towards the assembly resistance but are never
    /// written to the output construction (e.g. air films).
    pub include: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl SpecLayer {
    pub fn series(material: impl Into<Material>) -> Self {
        Self {
            materials: vec![material.into()],
            include: true,
            name: None,
            role: None,
        }
    }

    pub fn parallel(materials: Vec<Material>) -> Self {
        Self {
            materials,
            include: true,
            name: None,
            role: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn excluded(mut self) -> Self {
        self.include = false;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.materials.len() > 1
    }

    /// Name of the realized material: the layer name, or for a series layer
    /// the material's own name.
    pub fn derived_name(&self) -> Option<&str> {
        if let Some(name) = self.name.as_deref() {
            return Some(name);
        }
        match self.materials.as_slice() {
            [single] => Some(single.name()),
            _ => None,
        }
    }

    /// Placement role of the realized material.
    pub fn derived_role(&self) -> Option<Role> {
        if self.role.is_some() {
            return self.role;
        }
        match self.materials.as_slice() {
            [single] => single.role(),
            _ => None,
        }
    }
}

/// Description of a layered assembly, ordered exterior to interior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionSpec {
    /// Base name of the output construction.
    pub name: String,
    /// Area fraction of each parallel heat-flow path (e.g. framing vs. cavity).
    pub path_fractions: Vec<f64>,
    pub layers: Vec<SpecLayer>,
    /// Name prefixes of layers to delete from the resulting stack.
    #[serde(default)]
    pub removals: Vec<String>,
}

impl ConstructionSpec {
    pub fn new(name: &str, path_fractions: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            path_fractions,
            layers: Vec::new(),
            removals: Vec::new(),
        }
    }

    /// Derives path fractions as `width / sum(widths)`.
    pub fn from_path_widths(name: &str, path_widths: &[f64]) -> Self {
        let total: f64 = path_widths.iter().sum();
        Self::new(name, path_widths.iter().map(|w| w / total).collect())
    }

    /// Single-path construction.
    pub fn series(name: &str) -> Self {
        Self::new(name, vec![1.0])
    }

    pub fn add_layer(&mut self, layer: SpecLayer) {
        self.layers.push(layer);
    }

    pub fn with_layer(mut self, layer: SpecLayer) -> Self {
        self.add_layer(layer);
        self
    }

    /// Requests removal of the innermost existing layer whose name starts with `prefix`.
    pub fn remove_layer(&mut self, prefix: &str) {
        self.removals.push(prefix.to_string());
    }

    pub fn num_paths(&self) -> usize {
        self.path_fractions.len()
    }

    pub fn has_included_layers(&self) -> bool {
        self.layers.iter().any(|l| l.include)
    }

    /// Overall resistance of the assembly, including excluded layers.
    pub fn assembly_resistance(&self) -> f64 {
        solver::assembly_resistance(&self.layers, &self.path_fractions)
    }

    pub fn u_factor(&self) -> f64 {
        1.0 / self.assembly_resistance()
    }
}

/// Construction stored in the output model: realized material UIDs,
/// exterior to interior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Construction {
    pub uid: UID,
    pub name: String,
    pub layers: Vec<UID>,
}

impl Construction {
    pub fn new(name: &str, layers: Vec<UID>) -> Self {
        Self {
            uid: UID::new(),
            name: name.to_string(),
            layers,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl HasName for Construction {
    fn name(&self) -> &str {
        &self.name
    }
}
