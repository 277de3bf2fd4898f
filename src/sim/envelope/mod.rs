//! Layered envelope constructions.
//!
//! A [`ConstructionSpec`] describes an assembly of layers that may contain a
//! run of parallel heat-flow paths (framing next to cavity fill). Assigning a
//! spec to surfaces reduces each parallel layer to a homogeneous equivalent
//! material, merges the result into whatever the surfaces already carry in
//! canonical exterior-to-interior order, and mirrors the construction onto
//! adjacent surfaces.

pub mod assign;
pub mod audit;
pub mod config;
pub mod construction;
pub mod model;
pub mod placement;
pub mod solver;
pub mod validate;

pub use assign::{AssignReport, ConstructionAssigner, create_and_assign_constructions};
pub use audit::{AuditRecord, AuditSink, MemorySink, TracingSink};
pub use config::AssignConfig;
pub use construction::{Construction, ConstructionSpec, SpecLayer};
pub use model::{MaterialCache, Model, StackLayer};
pub use placement::{HasRole, LayerClass, LayerPlacement, RoleTable, remove_by_name};
pub use solver::{assembly_resistance, path_resistance, synthesize_equivalent_material};
pub use validate::{ValidationError, validate};
