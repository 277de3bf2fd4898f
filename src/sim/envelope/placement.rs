//! Canonical ordering of layers inside a construction stack.
//!
//! Every surface category has a table of recognized roles running exterior to
//! interior. Layers without a recognized role (framing, cavity fills, ...)
//! float in a band between the exterior-side and interior-side roles:
//!
//! ```text
//! wall:     ExteriorFinish  RigidInsulation  Sheathing  | band |  Mass
//! roof:     ExteriorFinish  RigidInsulation  Sheathing  | band |  RadiantBarrier  Mass
//! floor:    RigidInsulation                             | band |  Sheathing  Mass  Covering
//! ceiling:  Covering  Mass  Sheathing                   | band |  RigidInsulation
//! ```
//!
//! A ceiling is the underside of a floor, so its table is the floor table
//! mirrored. Independent callers may each contribute standard layers to the
//! same stack; placing a layer never moves a standard layer placed by someone
//! else.

use crate::name::HasName;
use crate::sim::materials::{Material, Role};
use crate::sim::surfaces::SurfaceCategory;

/// Anything that can sit in a construction stack.
pub trait HasRole: HasName {
    fn role(&self) -> Option<Role>;
}

impl HasRole for Material {
    fn role(&self) -> Option<Role> {
        Material::role(self)
    }
}

/// Classification of a layer against a category's role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerClass {
    Standard { role: Role, slot: usize },
    NonStandard,
}

/// Ordered role table of one surface category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    exterior: Vec<Role>,
    interior: Vec<Role>,
}

impl RoleTable {
    pub fn new(exterior: Vec<Role>, interior: Vec<Role>) -> Self {
        Self { exterior, interior }
    }

    pub fn for_category(category: SurfaceCategory) -> Self {
        use Role::*;
        match category {
            SurfaceCategory::Wall => {
                Self::new(vec![ExteriorFinish, RigidInsulation, Sheathing], vec![Mass])
            }
            SurfaceCategory::Roof => Self::new(
                vec![ExteriorFinish, RigidInsulation, Sheathing],
                vec![RadiantBarrier, Mass],
            ),
            SurfaceCategory::Floor => {
                Self::new(vec![RigidInsulation], vec![Sheathing, Mass, Covering])
            }
            SurfaceCategory::Ceiling => Self::for_category(SurfaceCategory::Floor).mirrored(),
        }
    }

    /// Same table seen from the other side.
    pub fn mirrored(&self) -> Self {
        Self {
            exterior: self.interior.iter().rev().copied().collect(),
            interior: self.exterior.iter().rev().copied().collect(),
        }
    }

    /// Slot of the non-standard band: one past the last exterior-side role.
    pub fn band_slot(&self) -> usize {
        self.exterior.len()
    }

    /// Canonical slot of `role`, or `None` if the category does not know it.
    pub fn slot(&self, role: Role) -> Option<usize> {
        if let Some(i) = self.exterior.iter().position(|r| *r == role) {
            return Some(i);
        }
        self.interior
            .iter()
            .position(|r| *r == role)
            .map(|i| self.band_slot() + 1 + i)
    }

    /// Roles in slot order, with `None` standing in for the band.
    pub fn slots(&self) -> Vec<Option<Role>> {
        self.exterior
            .iter()
            .map(|r| Some(*r))
            .chain(std::iter::once(None))
            .chain(self.interior.iter().map(|r| Some(*r)))
            .collect()
    }
}

/// Insert/replace/erase engine for one surface category.
#[derive(Debug, Clone)]
pub struct LayerPlacement {
    table: RoleTable,
}

impl LayerPlacement {
    pub fn new(category: SurfaceCategory) -> Self {
        Self::with_table(RoleTable::for_category(category))
    }

    pub fn with_table(table: RoleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RoleTable {
        &self.table
    }

    pub fn classify<T: HasRole + ?Sized>(&self, layer: &T) -> LayerClass {
        match layer.role() {
            Some(role) => match self.table.slot(role) {
                Some(slot) => LayerClass::Standard { role, slot },
                None => LayerClass::NonStandard,
            },
            None => LayerClass::NonStandard,
        }
    }

    fn standard_slot<T: HasRole>(&self, layer: &T) -> Option<usize> {
        match self.classify(layer) {
            LayerClass::Standard { slot, .. } => Some(slot),
            LayerClass::NonStandard => None,
        }
    }

    /// Deletes every non-standard layer; returns how many were removed.
    pub fn sweep_non_standard<T: HasRole>(&self, stack: &mut Vec<T>) -> usize {
        let before = stack.len();
        stack.retain(|l| self.standard_slot(l).is_some());
        before - stack.len()
    }

    /// Places `layer` into `stack` and returns its index.
    ///
    /// With `sweep` set and a non-standard `layer`, existing non-standard
    /// layers are deleted first, so a new batch of framing/cavity layers
    /// replaces the previous batch while standard layers stay untouched.
    /// A standard layer whose role is already present overwrites it in place.
    /// Otherwise the layer goes right after the nearest present standard layer
    /// with a lower slot (or at the top of the stack). Non-standard layers and
    /// interior-side standard layers skip over non-standard layers sitting at
    /// that position, so the band stays contiguous and in insertion order.
    pub fn place<T: HasRole>(&self, stack: &mut Vec<T>, layer: T, sweep: bool) -> usize {
        let class = self.classify(&layer);
        if sweep && class == LayerClass::NonStandard {
            self.sweep_non_standard(stack);
        }

        if let LayerClass::Standard { slot, .. } = class {
            if let Some(pos) = stack
                .iter()
                .position(|l| self.standard_slot(l) == Some(slot))
            {
                stack[pos] = layer;
                return pos;
            }
        }

        let band = self.table.band_slot();
        let target = match class {
            LayerClass::Standard { slot, .. } => slot,
            LayerClass::NonStandard => band,
        };

        let anchor = stack
            .iter()
            .enumerate()
            .filter_map(|(i, l)| match self.standard_slot(l) {
                Some(slot) if slot < target => Some((slot, i)),
                _ => None,
            })
            .max();
        let mut index = anchor.map(|(_, i)| i + 1).unwrap_or(0);

        if target >= band {
            while index < stack.len() && self.standard_slot(&stack[index]).is_none() {
                index += 1;
            }
        }

        stack.insert(index, layer);
        index
    }
}

/// Deletes the innermost layer whose name starts with `prefix`.
///
/// Returns false (and leaves the stack alone) when nothing matches.
pub fn remove_by_name<T: HasName>(stack: &mut Vec<T>, prefix: &str) -> bool {
    match stack.iter().rposition(|l| l.name_starts_with(prefix)) {
        Some(pos) => {
            stack.remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::materials::SimpleMaterial;

    fn layer(name: &str, role: Option<Role>) -> Material {
        let mut m = Material::from(SimpleMaterial::new(name, 1.0));
        m.set_role(role);
        m
    }

    fn names(stack: &[Material]) -> Vec<&str> {
        stack.iter().map(|m| m.name()).collect()
    }

    #[test]
    fn test_wall_table_slots() {
        let table = RoleTable::for_category(SurfaceCategory::Wall);
        assert_eq!(table.slot(Role::ExteriorFinish), Some(0));
        assert_eq!(table.slot(Role::Sheathing), Some(2));
        assert_eq!(table.band_slot(), 3);
        assert_eq!(table.slot(Role::Mass), Some(4));
        assert_eq!(table.slot(Role::Covering), None);
    }

    #[test]
    fn test_ceiling_mirrors_floor() {
        let floor = RoleTable::for_category(SurfaceCategory::Floor);
        let ceiling = RoleTable::for_category(SurfaceCategory::Ceiling);
        let mut floor_slots = floor.slots();
        floor_slots.reverse();
        assert_eq!(ceiling.slots(), floor_slots);
        assert_eq!(ceiling.slot(Role::Covering), Some(0));
        assert_eq!(ceiling.band_slot(), 3);
        assert_eq!(ceiling.mirrored(), floor);
    }

    #[test]
    fn test_classify_unknown_role_is_non_standard() {
        let engine = LayerPlacement::new(SurfaceCategory::Wall);
        assert_eq!(engine.classify(&layer("carpet", Some(Role::Covering))), LayerClass::NonStandard);
        assert_eq!(engine.classify(&layer("stud", None)), LayerClass::NonStandard);
        assert_eq!(
            engine.classify(&layer("osb", Some(Role::Sheathing))),
            LayerClass::Standard {
                role: Role::Sheathing,
                slot: 2
            }
        );
    }

    #[test]
    fn test_exterior_finish_stays_first() {
        let engine = LayerPlacement::new(SurfaceCategory::Wall);
        let mut stack = Vec::new();
        assert_eq!(engine.place(&mut stack, layer("Siding", Some(Role::ExteriorFinish)), false), 0);
        engine.place(&mut stack, layer("Drywall", Some(Role::Mass)), false);
        engine.place(&mut stack, layer("Stud", None), true);
        engine.place(&mut stack, layer("OSB", Some(Role::Sheathing)), false);
        engine.place(&mut stack, layer("Foam", Some(Role::RigidInsulation)), false);
        assert_eq!(names(&stack), vec!["Siding", "Foam", "OSB", "Stud", "Drywall"]);
    }

    #[test]
    fn test_sheathing_goes_ahead_of_band() {
        let engine = LayerPlacement::new(SurfaceCategory::Wall);
        let mut stack = Vec::new();
        engine.place(&mut stack, layer("Stud", None), true);
        engine.place(&mut stack, layer("Furring", None), false);
        assert_eq!(engine.place(&mut stack, layer("OSB", Some(Role::Sheathing)), false), 0);
        engine.place(&mut stack, layer("Extra", None), false);
        assert_eq!(names(&stack), vec!["OSB", "Stud", "Furring", "Extra"]);
    }

    #[test]
    fn test_interior_role_pushed_past_band() {
        let engine = LayerPlacement::new(SurfaceCategory::Wall);
        let mut stack = vec![layer("OSB", Some(Role::Sheathing)), layer("Stud", None), layer("Furring", None)];
        assert_eq!(engine.place(&mut stack, layer("Drywall", Some(Role::Mass)), false), 3);
        assert_eq!(names(&stack), vec!["OSB", "Stud", "Furring", "Drywall"]);
    }

    #[test]
    fn test_existing_role_replaced_in_place() {
        let engine = LayerPlacement::new(SurfaceCategory::Wall);
        let mut stack = vec![layer("Siding", Some(Role::ExteriorFinish)), layer("OSB", Some(Role::Sheathing))];
        assert_eq!(engine.place(&mut stack, layer("Stucco", Some(Role::ExteriorFinish)), false), 0);
        assert_eq!(names(&stack), vec!["Stucco", "OSB"]);
    }

    #[test]
    fn test_sweep_replaces_previous_band_only() {
        let engine = LayerPlacement::new(SurfaceCategory::Wall);
        let mut stack = vec![
            layer("Siding", Some(Role::ExteriorFinish)),
            layer("OldStud", None),
            layer("OldFurring", None),
            layer("Drywall", Some(Role::Mass)),
        ];
        engine.place(&mut stack, layer("NewStud", None), true);
        assert_eq!(names(&stack), vec!["Siding", "NewStud", "Drywall"]);
    }

    #[test]
    fn test_without_sweep_band_grows() {
        let engine = LayerPlacement::new(SurfaceCategory::Wall);
        let mut stack = vec![layer("Siding", Some(Role::ExteriorFinish)), layer("OldStud", None)];
        engine.place(&mut stack, layer("NewStud", None), false);
        assert_eq!(names(&stack), vec!["Siding", "OldStud", "NewStud"]);
    }

    #[test]
    fn test_floor_places_band_below_subfloor() {
        let engine = LayerPlacement::new(SurfaceCategory::Floor);
        let mut stack = Vec::new();
        engine.place(&mut stack, layer("Carpet", Some(Role::Covering)), false);
        engine.place(&mut stack, layer("Subfloor", Some(Role::Sheathing)), false);
        engine.place(&mut stack, layer("Joists", None), true);
        engine.place(&mut stack, layer("Foam", Some(Role::RigidInsulation)), false);
        assert_eq!(names(&stack), vec!["Foam", "Joists", "Subfloor", "Carpet"]);
    }

    #[test]
    fn test_remove_by_name_scans_from_interior() {
        let mut stack = vec![layer("Gypsum1", None), layer("Stud", None), layer("Gypsum2", None)];
        assert!(remove_by_name(&mut stack, "Gypsum"));
        assert_eq!(names(&stack), vec!["Gypsum1", "Stud"]);
        assert!(!remove_by_name(&mut stack, "Carpet"));
        assert_eq!(stack.len(), 2);
    }
}
