//! JSON storage of material catalogs and construction specs.
//!
//! Materials are written with a `kind` tag (`opaque`, `glazing`,
//! `resistance_only`) so catalogs can be edited by hand.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::sim::envelope::ConstructionSpec;
use crate::sim::materials::MaterialCatalog;

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, what: &str) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, value)
        .with_context(|| format!("Failed to serialize {what} to: {}", path.display()))?;

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to deserialize {what} from: {}", path.display()))
}

/// Writes a material catalog to a JSON file.
pub fn write_catalog(path: &Path, catalog: &MaterialCatalog) -> Result<()> {
    write_json(path, catalog, "material catalog")
}

/// Reads a material catalog from a JSON file.
///
/// # Example
/// ```no_run
/// use building_envelope::io::read_catalog;
/// use std::path::Path;
///
/// let catalog = read_catalog(Path::new("materials.json")).unwrap();
/// println!("{} materials", catalog.len());
/// ```
pub fn read_catalog(path: &Path) -> Result<MaterialCatalog> {
    read_json(path, "material catalog")
}

pub fn write_spec(path: &Path, spec: &ConstructionSpec) -> Result<()> {
    write_json(path, spec, "construction spec")
}

pub fn read_spec(path: &Path) -> Result<ConstructionSpec> {
    read_json(path, "construction spec")
}

/// Writes a library of construction specs as a JSON array.
pub fn write_specs(path: &Path, specs: &[ConstructionSpec]) -> Result<()> {
    write_json(path, specs, "construction specs")
}

pub fn read_specs(path: &Path) -> Result<Vec<ConstructionSpec>> {
    read_json(path, "construction specs")
}

/// Serializes any catalog or spec to a pretty JSON string.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize to string")
}

pub fn from_json_string<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).context("Failed to deserialize from string")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::envelope::SpecLayer;
    use crate::sim::materials::{Material, MaterialKind, Role};

    fn stud_wall(catalog: &MaterialCatalog) -> ConstructionSpec {
        ConstructionSpec::new("StudWall", vec![0.25, 0.75])
            .with_layer(SpecLayer::series(catalog.material("AirFilmOutside").unwrap()).excluded())
            .with_layer(SpecLayer::series(catalog.material("VinylSiding").unwrap()))
            .with_layer(
                SpecLayer::parallel(vec![
                    catalog.material("WoodStud2x4").unwrap(),
                    catalog.material("BattInsulation2x4").unwrap(),
                ])
                .named("StudAndCavity"),
            )
    }

    #[test]
    fn test_catalog_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("materials.json");
        let catalog = MaterialCatalog::with_presets();
        write_catalog(&path, &catalog).unwrap();

        let loaded = read_catalog(&path).unwrap();
        assert_eq!(loaded.len(), catalog.len());
        let siding = loaded.get("VinylSiding").unwrap();
        assert_eq!(siding.role(), Some(Role::ExteriorFinish));
        assert_eq!(loaded.get("DoublePaneLowE").unwrap().kind(), MaterialKind::Glazing);
        let air = loaded.get("CavityAir2x4").unwrap().as_opaque().unwrap();
        assert_eq!(air.conductivity, 0.0);
        assert_eq!(Some(air), catalog.get("CavityAir2x4").unwrap().as_opaque());
    }

    fn foam(json_fields: &str) -> Result<MaterialCatalog> {
        from_json_string(&format!(
            r#"{{"materials": {{"Foam": {{"kind": "opaque", "name": "Foam", "thickness": 0.05,
                "density": 30.0, "specific_heat": 1400.0{json_fields}}}}}}}"#
        ))
    }

    #[test]
    fn test_catalog_derives_missing_r_value() {
        let catalog = foam(r#", "conductivity": 0.025"#).unwrap();
        let m = catalog.get("Foam").unwrap();
        assert!((m.resistance() - 2.0).abs() < 1e-12);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foam.json");
        write_catalog(&path, &catalog).unwrap();
        assert_eq!(read_catalog(&path).unwrap().get("Foam"), Some(m));
    }

    #[test]
    fn test_catalog_explicit_r_value_sets_conductivity() {
        let only_r = foam(r#", "r_value": 2.5"#).unwrap();
        let m = only_r.get("Foam").unwrap().as_opaque().unwrap();
        assert!((m.conductivity - 0.02).abs() < 1e-12);

        // The explicit value wins over a disagreeing conductivity.
        let both = foam(r#", "conductivity": 0.025, "r_value": 2.5"#).unwrap();
        let m = both.get("Foam").unwrap().as_opaque().unwrap();
        assert_eq!(m.r_value, 2.5);
        assert!((m.conductivity - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_catalog_rejects_material_without_resistance() {
        let err = foam("").unwrap_err();
        assert!(format!("{err:#}").contains("needs a conductivity or an r_value"));
    }

    #[test]
    fn test_spec_file_keeps_resistance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.json");
        let spec = stud_wall(&MaterialCatalog::with_presets());
        write_spec(&path, &spec).unwrap();

        let loaded = read_spec(&path).unwrap();
        assert_eq!(loaded.name, "StudWall");
        assert_eq!(loaded.layers.len(), 3);
        assert!(!loaded.layers[0].include);
        assert!((loaded.assembly_resistance() - spec.assembly_resistance()).abs() < 1e-12);
    }

    #[test]
    fn test_hand_written_spec() {
        let json = r#"{
            "name": "Slab",
            "path_fractions": [1.0],
            "layers": [
                {
                    "materials": [{"kind": "resistance_only", "name": "Film", "r_value": 0.16}],
                    "include": false
                },
                {
                    "materials": [{
                        "kind": "opaque", "name": "Concrete", "thickness": 0.1,
                        "conductivity": 1.4, "density": 2300.0, "specific_heat": 880.0,
                        "r_value": 0.07142857142857142
                    }],
                    "include": true,
                    "role": "mass"
                }
            ]
        }"#;
        let spec: ConstructionSpec = from_json_string(json).unwrap();
        assert!(spec.removals.is_empty());
        assert_eq!(spec.layers[1].derived_role(), Some(Role::Mass));
        assert!(matches!(spec.layers[1].materials[0], Material::Opaque(_)));
        assert!((spec.assembly_resistance() - (0.16 + 0.1 / 1.4)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_catalog(Path::new("/nonexistent/materials.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/materials.json"));
    }
}
