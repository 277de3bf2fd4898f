pub mod envelope;
pub mod materials;
pub mod surfaces;
