//! Series/parallel thermal resistance network of a layered assembly.
//!
//! Each path runs through every layer: series layers contribute their single
//! material, parallel layers contribute the material belonging to that path.
//! Paths conduct side by side, weighted by their area fraction:
//!
//! `R_overall = 1 / sum_p(frac_p / R_path_p)`
//!
//! Inputs are expected to have passed [`super::validate`]; nothing here checks
//! layer shapes again.

use super::construction::SpecLayer;
use crate::sim::materials::{Material, OpaqueMaterial};

fn material_on_path(layer: &SpecLayer, path: usize) -> &Material {
    if layer.is_parallel() {
        &layer.materials[path]
    } else {
        &layer.materials[0]
    }
}

/// Resistance of a single path through every layer.
pub fn path_resistance(layers: &[SpecLayer], path: usize) -> f64 {
    layers
        .iter()
        .map(|l| material_on_path(l, path).resistance())
        .sum()
}

/// Overall resistance of the assembly.
pub fn assembly_resistance(layers: &[SpecLayer], path_fracs: &[f64]) -> f64 {
    let conductance: f64 = path_fracs
        .iter()
        .enumerate()
        .map(|(p, frac)| frac / path_resistance(layers, p))
        .sum();
    1.0 / conductance
}

/// Own resistance of a layer: the sum over paths for a parallel layer,
/// the material resistance for a series layer.
fn layer_resistance(layer: &SpecLayer) -> f64 {
    if layer.is_parallel() {
        layer.materials.iter().map(Material::resistance).sum()
    } else {
        layer.materials[0].resistance()
    }
}

fn weighted_absorptance(
    materials: &[&OpaqueMaterial],
    path_fracs: &[f64],
    pick: impl Fn(&OpaqueMaterial) -> Option<f64>,
) -> Option<f64> {
    materials
        .iter()
        .zip(path_fracs)
        .map(|(m, f)| pick(*m).map(|a| a * f))
        .sum()
}

/// Homogeneous material equivalent to the parallel layer at `layer_index`.
///
/// The resistance left over once series layers are subtracted from the
/// overall resistance is shared among all parallel layers in proportion to
/// their own summed resistance. Density is area weighted; specific heat is
/// mass weighted so the heat capacity per unit area is preserved.
pub fn synthesize_equivalent_material(
    layer_index: usize,
    layers: &[SpecLayer],
    path_fracs: &[f64],
) -> Material {
    let layer = &layers[layer_index];
    if !layer.is_parallel() {
        let mut material = layer.materials[0].clone();
        if let Some(name) = layer.derived_name() {
            material.set_name(name);
        }
        material.set_role(layer.derived_role());
        return material;
    }

    let r_overall = assembly_resistance(layers, path_fracs);
    let mut r_series = 0.0;
    let mut r_parallel_sum = 0.0;
    for l in layers {
        if l.is_parallel() {
            r_parallel_sum += layer_resistance(l);
        } else {
            r_series += layer_resistance(l);
        }
    }
    let r_parallel_total = r_overall - r_series;
    let r_equivalent = layer_resistance(layer) / r_parallel_sum * r_parallel_total;

    let paths: Vec<&OpaqueMaterial> = layer
        .materials
        .iter()
        .filter_map(Material::as_opaque)
        .collect();
    let thickness = paths.first().map(|m| m.thickness).unwrap_or(0.0);

    let density: f64 = paths.iter().zip(path_fracs).map(|(m, f)| f * m.density).sum();
    let specific_heat = if density > 0.0 {
        paths
            .iter()
            .zip(path_fracs)
            .map(|(m, f)| f * m.density * m.specific_heat)
            .sum::<f64>()
            / density
    } else {
        paths
            .iter()
            .zip(path_fracs)
            .map(|(m, f)| f * m.specific_heat)
            .sum::<f64>()
    };

    let name = layer
        .derived_name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("ParallelLayer{layer_index}"));

    Material::Opaque(OpaqueMaterial {
        name,
        thickness,
        conductivity: thickness / r_equivalent,
        density,
        specific_heat,
        thermal_absorptance: weighted_absorptance(&paths, path_fracs, |m| m.thermal_absorptance),
        solar_absorptance: weighted_absorptance(&paths, path_fracs, |m| m.solar_absorptance),
        visible_absorptance: weighted_absorptance(&paths, path_fracs, |m| m.visible_absorptance),
        r_value: r_equivalent,
        role: layer.role,
    })
}
