//! Output simulation model: realized materials, constructions and surfaces.

use std::collections::HashMap;

use anyhow::{Context, Result, ensure};

use super::config::AssignConfig;
use super::construction::Construction;
use super::placement::HasRole;
use crate::UID;
use crate::name::HasName;
use crate::sim::materials::{Material, Role};
use crate::sim::surfaces::{BoundaryCondition, Surface};

/// Target model the assigner writes into.
///
/// Objects reference each other by [`UID`]: surfaces hold construction UIDs,
/// constructions hold material UIDs.
#[derive(Debug, Clone, Default)]
pub struct Model {
    materials: HashMap<UID, Material>,
    constructions: HashMap<UID, Construction>,
    construction_names: HashMap<String, UID>,
    surfaces: Vec<Surface>,
    surface_index: HashMap<UID, usize>,
}

/// A realized material as it sits in a construction stack.
#[derive(Debug, Clone, PartialEq)]
pub struct StackLayer {
    pub uid: UID,
    pub material: Material,
}

impl HasName for StackLayer {
    fn name(&self) -> &str {
        self.material.name()
    }
}

impl HasRole for StackLayer {
    fn role(&self) -> Option<Role> {
        self.material.role()
    }
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_surface(&mut self, surface: Surface) -> UID {
        let uid = surface.uid.clone();
        self.surface_index.insert(uid.clone(), self.surfaces.len());
        self.surfaces.push(surface);
        uid
    }

    /// Pairs two surfaces so that each receives the mirror of the other's construction.
    pub fn link_adjacent(&mut self, a: &UID, b: &UID) -> Result<()> {
        ensure!(a != b, "Surface cannot be adjacent to itself: {a}");
        for uid in [a, b] {
            ensure!(self.surface_index.contains_key(uid), "Surface not found: {uid}");
        }
        for (this, other) in [(a, b), (b, a)] {
            let surface = self
                .surface_mut(this)
                .with_context(|| format!("Surface not found: {this}"))?;
            surface.adjacent = Some(other.clone());
            surface.boundary_condition = BoundaryCondition::Surface;
        }
        Ok(())
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn surface(&self, uid: &UID) -> Option<&Surface> {
        self.surface_index.get(uid).map(|&i| &self.surfaces[i])
    }

    fn surface_mut(&mut self, uid: &UID) -> Option<&mut Surface> {
        let i = *self.surface_index.get(uid)?;
        self.surfaces.get_mut(i)
    }

    /// Attaches `construction` to `surface`.
    pub fn assign(&mut self, surface: &UID, construction: &UID) -> Result<()> {
        ensure!(
            self.constructions.contains_key(construction),
            "Construction not found: {construction}"
        );
        let s = self
            .surface_mut(surface)
            .with_context(|| format!("Surface not found: {surface}"))?;
        s.construction = Some(construction.clone());
        Ok(())
    }

    pub fn add_material(&mut self, material: Material) -> UID {
        let uid = UID::new();
        self.materials.insert(uid.clone(), material);
        uid
    }

    pub fn material(&self, uid: &UID) -> Option<&Material> {
        self.materials.get(uid)
    }

    pub fn materials(&self) -> impl Iterator<Item = (&UID, &Material)> {
        self.materials.iter()
    }

    pub fn num_materials(&self) -> usize {
        self.materials.len()
    }

    /// Stores a construction. Its name must be unique in the model and every
    /// layer must reference a model material.
    pub fn add_construction(&mut self, construction: Construction) -> Result<UID> {
        ensure!(
            !self.construction_names.contains_key(&construction.name),
            "Construction name already in use: {}",
            construction.name
        );
        for layer in &construction.layers {
            ensure!(
                self.materials.contains_key(layer),
                "Construction {} references unknown material {layer}",
                construction.name
            );
        }
        let uid = construction.uid.clone();
        self.construction_names
            .insert(construction.name.clone(), uid.clone());
        self.constructions.insert(uid.clone(), construction);
        Ok(uid)
    }

    pub fn construction(&self, uid: &UID) -> Option<&Construction> {
        self.constructions.get(uid)
    }

    pub fn constructions(&self) -> impl Iterator<Item = &Construction> {
        self.constructions.values()
    }

    pub fn num_constructions(&self) -> usize {
        self.constructions.len()
    }

    pub fn construction_by_name(&self, name: &str) -> Option<&Construction> {
        self.construction_names
            .get(name)
            .and_then(|uid| self.constructions.get(uid))
    }

    /// Layers of a construction, exterior to interior.
    pub fn stack(&self, construction: &UID) -> Result<Vec<StackLayer>> {
        let c = self
            .construction(construction)
            .with_context(|| format!("Construction not found: {construction}"))?;
        c.layers
            .iter()
            .map(|uid| {
                let material = self
                    .material(uid)
                    .with_context(|| format!("Material not found: {uid}"))?;
                Ok(StackLayer {
                    uid: uid.clone(),
                    material: material.clone(),
                })
            })
            .collect()
    }

    /// Material names of a construction, exterior to interior.
    pub fn layer_names(&self, construction: &UID) -> Result<Vec<String>> {
        Ok(self
            .stack(construction)?
            .iter()
            .map(|l| l.name().to_string())
            .collect())
    }

    /// Construction currently attached to a surface.
    pub fn surface_construction(&self, surface: &UID) -> Option<&Construction> {
        self.surface(surface)?
            .construction
            .as_ref()
            .and_then(|c| self.construction(c))
    }
}

/// Session-scoped deduplication of output materials.
///
/// Before a realized material is added to the model, the cache is searched
/// for an equal material (same kind, name and role, properties within the
/// tolerance). The cache is owned by the caller and must be used with a
/// single model.
#[derive(Debug, Clone)]
pub struct MaterialCache {
    entries: Vec<(UID, Material)>,
    tolerance: f64,
}

impl MaterialCache {
    pub fn new(tolerance: f64) -> Self {
        Self {
            entries: Vec::new(),
            tolerance,
        }
    }

    /// Empty cache using the configured dedup tolerance.
    pub fn with_config(config: &AssignConfig) -> Self {
        Self::new(config.dedup_tolerance)
    }

    /// Cache seeded with every material already in `model`.
    pub fn from_model(model: &Model, tolerance: f64) -> Self {
        let mut cache = Self::new(tolerance);
        cache.entries = model
            .materials()
            .map(|(uid, m)| (uid.clone(), m.clone()))
            .collect();
        cache
    }

    pub fn lookup(&self, material: &Material) -> Option<&UID> {
        self.entries
            .iter()
            .find(|(_, m)| m.matches_within(material, self.tolerance))
            .map(|(uid, _)| uid)
    }

    /// Returns the UID of an equal model material, adding `material` to the
    /// model if none exists. The flag is true when a new material was created.
    pub fn realize(&mut self, model: &mut Model, material: Material) -> (UID, bool) {
        if let Some(uid) = self.lookup(&material) {
            return (uid.clone(), false);
        }
        let uid = model.add_material(material.clone());
        self.entries.push((uid.clone(), material));
        (uid, true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
