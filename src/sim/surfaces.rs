//! Envelope surfaces that constructions get attached to.
//!
//! A surface is a geometry-side collaborator: only its category, boundary
//! condition, current construction and optional adjacent surface matter here.

use serde::{Deserialize, Serialize};

use crate::UID;
use crate::name::HasName;

/// Category of an envelope surface; selects the layer placement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceCategory {
    Wall,
    Roof,
    Floor,
    Ceiling,
}

/// What lies on the outside of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryCondition {
    Outdoors,
    Ground,
    Foundation,
    Adiabatic,
    /// Another surface of the model (see [`Surface::adjacent`]).
    Surface,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface {
    pub uid: UID,
    pub name: String,
    pub category: SurfaceCategory,
    pub boundary_condition: BoundaryCondition,
    /// Construction currently attached to the surface.
    #[serde(default)]
    pub construction: Option<UID>,
    /// Thermally paired surface receiving the mirrored construction.
    #[serde(default)]
    pub adjacent: Option<UID>,
}

impl Surface {
    pub fn new(name: &str, category: SurfaceCategory, boundary_condition: BoundaryCondition) -> Self {
        Self {
            uid: UID::new(),
            name: name.to_string(),
            category,
            boundary_condition,
            construction: None,
            adjacent: None,
        }
    }

    pub fn with_construction(mut self, construction: UID) -> Self {
        self.construction = Some(construction);
        self
    }
}

impl HasName for Surface {
    fn name(&self) -> &str {
        &self.name
    }
}
