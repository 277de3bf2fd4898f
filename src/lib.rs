pub mod io;
pub mod name;
pub mod sim;
mod uid;

// Prelude
pub use name::{HasName, SortByName};
pub use sim::envelope::{
    AssignConfig, Construction, ConstructionAssigner, ConstructionSpec, MaterialCache, Model,
    SpecLayer, ValidationError,
};
pub use sim::materials::{Material, MaterialCatalog, OpaqueMaterial, Role, SimpleMaterial};
pub use sim::surfaces::{BoundaryCondition, Surface, SurfaceCategory};
pub use uid::UID;
