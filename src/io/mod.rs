//! File I/O for material catalogs and construction specs.

pub mod json;

pub use json::{
    from_json_string, read_catalog, read_spec, read_specs, to_json_string, write_catalog,
    write_spec, write_specs,
};
