//! Structural checks run on a [`ConstructionSpec`] before anything is realized.
//!
//! Rules are checked in a fixed order and the first violation is returned.

use thiserror::Error;

use super::config::AssignConfig;
use super::construction::ConstructionSpec;
use crate::sim::materials::MaterialKind;

/// A violated construction invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("path fractions sum to {sum}, expected between {min} and {max}")]
    PathFractionSum { sum: f64, min: f64, max: f64 },

    #[error("path fraction {index} is negative: {value}")]
    NegativePathFraction { index: usize, value: f64 },

    #[error("layer {layer} has {count} materials, expected 1 or {paths} (one per path)")]
    LayerPathCount {
        layer: usize,
        count: usize,
        paths: usize,
    },

    #[error("layer {layer} has {count} glazing materials; glazing layers take exactly 1")]
    GlazingLayerCount { layer: usize, count: usize },

    #[error("glazing materials cannot be mixed with {other:?} materials in one construction")]
    MixedGlazing { other: MaterialKind },

    /// Consistency failure: the paths of a parallel layer disagree on thickness.
    #[error("parallel layer {layer} has mismatched thicknesses: {thicknesses:?}")]
    ThicknessMismatch { layer: usize, thicknesses: Vec<f64> },

    #[error("parallel layer {layer} contains a material without thickness ({kind:?})")]
    ParallelWithoutThickness { layer: usize, kind: MaterialKind },

    #[error("parallel layers must be contiguous; found separate runs at layers {first} and {second}")]
    MultipleParallelRuns { first: usize, second: usize },

    #[error("included layer {layer} has no name")]
    UnnamedLayer { layer: usize },
}

impl ValidationError {
    /// Number (1-7) of the construction rule that failed.
    pub fn rule(&self) -> u8 {
        match self {
            ValidationError::PathFractionSum { .. } => 1,
            ValidationError::NegativePathFraction { .. } => 2,
            ValidationError::LayerPathCount { .. } | ValidationError::GlazingLayerCount { .. } => 3,
            ValidationError::MixedGlazing { .. } => 4,
            ValidationError::ThicknessMismatch { .. }
            | ValidationError::ParallelWithoutThickness { .. } => 5,
            ValidationError::MultipleParallelRuns { .. } => 6,
            ValidationError::UnnamedLayer { .. } => 7,
        }
    }
}

const THICKNESS_TOLERANCE: f64 = 1e-9;

/// Validates `spec` against every construction rule.
pub fn validate(spec: &ConstructionSpec, config: &AssignConfig) -> Result<(), ValidationError> {
    let fracs = &spec.path_fractions;
    let num_paths = fracs.len();

    // 1. Fractions add up to one (NaN from zero total width fails here too).
    let sum: f64 = fracs.iter().sum();
    let (min, max) = (config.min_path_fraction_sum, config.max_path_fraction_sum);
    if !(sum >= min && sum <= max) {
        return Err(ValidationError::PathFractionSum { sum, min, max });
    }

    // 2.
    if let Some((index, &value)) = fracs.iter().enumerate().find(|(_, f)| **f < 0.0) {
        return Err(ValidationError::NegativePathFraction { index, value });
    }

    // 3. Layer shapes.
    let all_glazing = spec
        .layers
        .iter()
        .flat_map(|l| &l.materials)
        .all(|m| m.kind() == MaterialKind::Glazing);
    for (i, layer) in spec.layers.iter().enumerate() {
        let count = layer.materials.len();
        if all_glazing && count > 0 {
            if count > 1 {
                return Err(ValidationError::GlazingLayerCount { layer: i, count });
            }
        } else if count != 1 && count != num_paths {
            return Err(ValidationError::LayerPathCount {
                layer: i,
                count,
                paths: num_paths,
            });
        }
    }

    // 4. Glazing is exclusive construction-wide.
    let any_glazing = spec
        .layers
        .iter()
        .flat_map(|l| &l.materials)
        .any(|m| m.kind() == MaterialKind::Glazing);
    if any_glazing {
        if let Some(other) = spec
            .layers
            .iter()
            .flat_map(|l| &l.materials)
            .map(|m| m.kind())
            .find(|k| *k != MaterialKind::Glazing)
        {
            return Err(ValidationError::MixedGlazing { other });
        }
    }

    // 5. Parallel paths share one thickness.
    for (i, layer) in spec.layers.iter().enumerate().filter(|(_, l)| l.is_parallel()) {
        let mut thicknesses = Vec::with_capacity(layer.materials.len());
        for m in &layer.materials {
            match m.thickness() {
                Some(t) => thicknesses.push(t),
                None => {
                    return Err(ValidationError::ParallelWithoutThickness {
                        layer: i,
                        kind: m.kind(),
                    });
                }
            }
        }
        let first = thicknesses[0];
        if thicknesses
            .iter()
            .any(|t| (t - first).abs() > THICKNESS_TOLERANCE)
        {
            return Err(ValidationError::ThicknessMismatch {
                layer: i,
                thicknesses,
            });
        }
    }

    // 6. A single contiguous run of parallel layers.
    let mut run_start: Option<usize> = None;
    for (i, layer) in spec.layers.iter().enumerate() {
        if !layer.is_parallel() {
            continue;
        }
        match run_start {
            None => run_start = Some(i),
            Some(first) if !spec.layers[i - 1].is_parallel() => {
                return Err(ValidationError::MultipleParallelRuns { first, second: i });
            }
            Some(_) => {}
        }
    }

    // 7.
    if let Some(i) = spec
        .layers
        .iter()
        .position(|l| l.include && l.derived_name().is_none())
    {
        return Err(ValidationError::UnnamedLayer { layer: i });
    }

    Ok(())
}
