//! Envelope material definitions and the material catalog.
//!
//! A [`Material`] is one of three kinds: an opaque layer with physical
//! properties, a resistance-only layer (air films, adiabatic boundaries), or a
//! glazing system described by U-factor and SHGC. Properties use any
//! consistent unit system; presets are SI (m, W/(m*K), kg/m^3, J/(kg*K)).

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::name::HasName;

/// Divisor applied to thickness when conductivity is zero, so that the
/// derived R-value stays finite and positive.
pub const ZERO_CONDUCTIVITY_DIVISOR: f64 = 10_000_000.0;

/// R-value of the resistance-only layer used for adiabatic boundaries.
pub const ADIABATIC_R_VALUE: f64 = 1000.0;

/// Recognized position of a material inside an envelope assembly.
///
/// Roles are what the layer placement tables are keyed by. A material
/// without a role is a non-standard layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Siding, stucco, roofing.
    ExteriorFinish,
    /// Continuous rigid insulation.
    RigidInsulation,
    /// Structural sheathing or subfloor.
    Sheathing,
    /// Interior mass layer (drywall, concrete topping).
    Mass,
    /// Floor covering (carpet, tile).
    Covering,
    /// Low-emissivity foil under a roof deck.
    RadiantBarrier,
}

/// Discriminant of [`Material`], used by the validator and the dedup cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Opaque,
    Glazing,
    ResistanceOnly,
}

/// Homogeneous opaque material layer.
///
/// When loaded, either `conductivity` or `r_value` may be omitted and is
/// derived from the other. An explicit `r_value` that disagrees with
/// `thickness / conductivity` wins, and conductivity is re-derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OpaqueRecord")]
pub struct OpaqueMaterial {
    pub name: String,
    pub thickness: f64,
    pub conductivity: f64,
    pub density: f64,
    pub specific_heat: f64,
    #[serde(default)]
    pub thermal_absorptance: Option<f64>,
    #[serde(default)]
    pub solar_absorptance: Option<f64>,
    #[serde(default)]
    pub visible_absorptance: Option<f64>,
    /// Thermal resistance, explicit or derived from thickness/conductivity.
    pub r_value: f64,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Stored form of [`OpaqueMaterial`].
#[derive(Deserialize)]
struct OpaqueRecord {
    name: String,
    thickness: f64,
    #[serde(default)]
    conductivity: Option<f64>,
    density: f64,
    specific_heat: f64,
    #[serde(default)]
    thermal_absorptance: Option<f64>,
    #[serde(default)]
    solar_absorptance: Option<f64>,
    #[serde(default)]
    visible_absorptance: Option<f64>,
    #[serde(default)]
    r_value: Option<f64>,
    #[serde(default)]
    role: Option<Role>,
}

impl TryFrom<OpaqueRecord> for OpaqueMaterial {
    type Error = String;

    fn try_from(r: OpaqueRecord) -> Result<Self, Self::Error> {
        let base = match (r.conductivity, r.r_value) {
            (Some(k), None) => Self::new(&r.name, r.thickness, k, r.density, r.specific_heat),
            (Some(k), Some(rv)) if consistent(derived_r_value(r.thickness, k), rv) => Self {
                r_value: rv,
                ..Self::new(&r.name, r.thickness, k, r.density, r.specific_heat)
            },
            (_, Some(rv)) => {
                Self::from_r_value(&r.name, r.thickness, rv, r.density, r.specific_heat)
            }
            (None, None) => {
                return Err(format!(
                    "material {} needs a conductivity or an r_value",
                    r.name
                ));
            }
        };
        Ok(Self {
            thermal_absorptance: r.thermal_absorptance,
            solar_absorptance: r.solar_absorptance,
            visible_absorptance: r.visible_absorptance,
            role: r.role,
            ..base
        })
    }
}

fn consistent(derived: f64, explicit: f64) -> bool {
    (derived - explicit).abs() <= 1e-9 * derived.abs().max(explicit.abs())
}

/// Material described only by its thermal resistance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleMaterial {
    pub name: String,
    pub r_value: f64,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Simple glazing system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlazingMaterial {
    pub name: String,
    pub u_factor: f64,
    pub shgc: f64,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Any material that can appear in a construction layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    Opaque(OpaqueMaterial),
    Glazing(GlazingMaterial),
    ResistanceOnly(SimpleMaterial),
}

fn derived_r_value(thickness: f64, conductivity: f64) -> f64 {
    if conductivity == 0.0 {
        thickness / ZERO_CONDUCTIVITY_DIVISOR
    } else {
        thickness / conductivity
    }
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn close_opt(a: Option<f64>, b: Option<f64>, tol: f64) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => close(a, b, tol),
        _ => false,
    }
}

impl OpaqueMaterial {
    pub fn new(
        name: &str,
        thickness: f64,
        conductivity: f64,
        density: f64,
        specific_heat: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            thickness,
            conductivity,
            density,
            specific_heat,
            thermal_absorptance: None,
            solar_absorptance: None,
            visible_absorptance: None,
            r_value: derived_r_value(thickness, conductivity),
            role: None,
        }
    }

    /// Creates a material from an explicit R-value; conductivity is derived.
    pub fn from_r_value(
        name: &str,
        thickness: f64,
        r_value: f64,
        density: f64,
        specific_heat: f64,
    ) -> Self {
        let conductivity = if r_value > 0.0 { thickness / r_value } else { 0.0 };
        Self {
            r_value,
            ..Self::new(name, thickness, conductivity, density, specific_heat)
        }
    }

    pub fn with_absorptances(mut self, thermal: f64, solar: f64, visible: f64) -> Self {
        self.thermal_absorptance = Some(thermal);
        self.solar_absorptance = Some(solar);
        self.visible_absorptance = Some(visible);
        self
    }

    /// Same material at another thickness; R-value is re-derived from conductivity.
    pub fn resized(&self, thickness: f64) -> Self {
        Self {
            thickness,
            r_value: derived_r_value(thickness, self.conductivity),
            ..self.clone()
        }
    }

    /// Heat capacity per unit area.
    pub fn heat_capacity(&self) -> f64 {
        self.density * self.specific_heat * self.thickness
    }
}

impl SimpleMaterial {
    pub fn new(name: &str, r_value: f64) -> Self {
        Self {
            name: name.to_string(),
            r_value,
            role: None,
        }
    }

    /// Resistance-only layer standing in for an adiabatic boundary.
    pub fn adiabatic() -> Self {
        Self::new("Adiabatic", ADIABATIC_R_VALUE)
    }
}

impl GlazingMaterial {
    pub fn new(name: &str, u_factor: f64, shgc: f64) -> Self {
        Self {
            name: name.to_string(),
            u_factor,
            shgc,
            role: None,
        }
    }
}

impl From<OpaqueMaterial> for Material {
    fn from(value: OpaqueMaterial) -> Self {
        Material::Opaque(value)
    }
}

impl From<SimpleMaterial> for Material {
    fn from(value: SimpleMaterial) -> Self {
        Material::ResistanceOnly(value)
    }
}

impl From<GlazingMaterial> for Material {
    fn from(value: GlazingMaterial) -> Self {
        Material::Glazing(value)
    }
}

impl HasName for Material {
    fn name(&self) -> &str {
        match self {
            Material::Opaque(m) => &m.name,
            Material::Glazing(m) => &m.name,
            Material::ResistanceOnly(m) => &m.name,
        }
    }
}

impl Material {
    pub fn kind(&self) -> MaterialKind {
        match self {
            Material::Opaque(_) => MaterialKind::Opaque,
            Material::Glazing(_) => MaterialKind::Glazing,
            Material::ResistanceOnly(_) => MaterialKind::ResistanceOnly,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Material::Opaque(m) => m.role,
            Material::Glazing(m) => m.role,
            Material::ResistanceOnly(m) => m.role,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.set_role(Some(role));
        self
    }

    pub fn set_role(&mut self, role: Option<Role>) {
        match self {
            Material::Opaque(m) => m.role = role,
            Material::Glazing(m) => m.role = role,
            Material::ResistanceOnly(m) => m.role = role,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        match self {
            Material::Opaque(m) => m.name = name.to_string(),
            Material::Glazing(m) => m.name = name.to_string(),
            Material::ResistanceOnly(m) => m.name = name.to_string(),
        }
    }

    /// Thermal resistance of the layer. Glazing contributes 1/U.
    pub fn resistance(&self) -> f64 {
        match self {
            Material::Opaque(m) => m.r_value,
            Material::ResistanceOnly(m) => m.r_value,
            Material::Glazing(m) => 1.0 / m.u_factor,
        }
    }

    /// Physical thickness; only opaque materials have one.
    pub fn thickness(&self) -> Option<f64> {
        match self {
            Material::Opaque(m) => Some(m.thickness),
            Material::Glazing(_) | Material::ResistanceOnly(_) => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&OpaqueMaterial> {
        match self {
            Material::Opaque(m) => Some(m),
            _ => None,
        }
    }

    /// Value equality used for deduplication: same kind, name and role, and
    /// every kind-specific property within `tol`.
    pub fn matches_within(&self, other: &Material, tol: f64) -> bool {
        if self.name() != other.name() || self.role() != other.role() {
            return false;
        }
        match (self, other) {
            (Material::Opaque(a), Material::Opaque(b)) => {
                close(a.thickness, b.thickness, tol)
                    && close(a.conductivity, b.conductivity, tol)
                    && close(a.density, b.density, tol)
                    && close(a.specific_heat, b.specific_heat, tol)
                    && close_opt(a.thermal_absorptance, b.thermal_absorptance, tol)
                    && close_opt(a.solar_absorptance, b.solar_absorptance, tol)
                    && close_opt(a.visible_absorptance, b.visible_absorptance, tol)
            }
            (Material::ResistanceOnly(a), Material::ResistanceOnly(b)) => {
                close(a.r_value, b.r_value, tol)
            }
            (Material::Glazing(a), Material::Glazing(b)) => {
                close(a.u_factor, b.u_factor, tol) && close(a.shgc, b.shgc, tol)
            }
            _ => false,
        }
    }
}

/// Named collection of materials that constructions are composed from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialCatalog {
    materials: BTreeMap<String, Material>,
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a material, replacing any entry with the same name.
    pub fn add(&mut self, material: impl Into<Material>) {
        let material = material.into();
        self.materials.insert(material.name().to_string(), material);
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Returns a copy of a catalog material, failing if it does not exist.
    pub fn material(&self, name: &str) -> Result<Material> {
        self.get(name)
            .cloned()
            .with_context(|| format!("Material not found in catalog: {name}"))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }

    /// Creates a catalog pre-populated with common envelope materials.
    pub fn with_presets() -> Self {
        let mut cat = Self::new();

        // Surface films
        cat.add(SimpleMaterial::new("AirFilmOutside", 0.03));
        cat.add(SimpleMaterial::new("AirFilmVertical", 0.12));
        cat.add(SimpleMaterial::new("AirFilmFloorAverage", 0.16));
        cat.add(SimpleMaterial::new("AirFilmRoof", 0.11));
        cat.add(SimpleMaterial::adiabatic());

        cat.add(
            Material::from(
                OpaqueMaterial::new("VinylSiding", 0.0095, 0.11, 1380.0, 1000.0)
                    .with_absorptances(0.9, 0.75, 0.75),
            )
            .with_role(Role::ExteriorFinish),
        );
        cat.add(
            Material::from(
                OpaqueMaterial::new("AsphaltShingles", 0.0064, 0.082, 1120.0, 1260.0)
                    .with_absorptances(0.9, 0.85, 0.85),
            )
            .with_role(Role::ExteriorFinish),
        );
        cat.add(
            Material::from(OpaqueMaterial::new("RigidFoamXPS", 0.0254, 0.029, 32.0, 1500.0))
                .with_role(Role::RigidInsulation),
        );
        cat.add(
            Material::from(OpaqueMaterial::new("OSBSheathing", 0.0111, 0.13, 650.0, 1210.0))
                .with_role(Role::Sheathing),
        );
        cat.add(
            Material::from(
                OpaqueMaterial::new("GypsumBoard", 0.0127, 0.16, 800.0, 1090.0)
                    .with_absorptances(0.9, 0.5, 0.5),
            )
            .with_role(Role::Mass),
        );
        cat.add(
            Material::from(OpaqueMaterial::new("ConcreteTopping", 0.0381, 1.4, 2300.0, 880.0))
                .with_role(Role::Mass),
        );
        cat.add(
            Material::from(OpaqueMaterial::new("CarpetAndPad", 0.0127, 0.06, 200.0, 1300.0))
                .with_role(Role::Covering),
        );
        cat.add(
            Material::from(
                OpaqueMaterial::new("RadiantBarrier", 0.0003, 237.0, 2700.0, 900.0)
                    .with_absorptances(0.05, 0.05, 0.05),
            )
            .with_role(Role::RadiantBarrier),
        );

        // Framing and cavity fills carry no role: they form the non-standard band.
        cat.add(OpaqueMaterial::new("WoodStud2x4", 0.089, 0.12, 510.0, 1880.0));
        cat.add(OpaqueMaterial::new("WoodStud2x6", 0.140, 0.12, 510.0, 1880.0));
        cat.add(OpaqueMaterial::new("BattInsulation2x4", 0.089, 0.043, 16.0, 840.0));
        cat.add(OpaqueMaterial::new("BattInsulation2x6", 0.140, 0.043, 16.0, 840.0));
        cat.add(OpaqueMaterial::new("CavityAir2x4", 0.089, 0.0, 1.2, 1005.0));

        cat.add(GlazingMaterial::new("DoublePaneLowE", 1.8, 0.4));

        cat
    }
}
