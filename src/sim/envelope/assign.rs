//! Realizes a [`ConstructionSpec`] into the model and attaches it to surfaces.
//!
//! Every check that can fail runs before the first write to the model, so a
//! rejected batch leaves the model untouched.

use std::collections::HashMap;

use anyhow::{Context, Result, ensure};
use tracing::{debug, info};

use super::audit::{AuditRecord, AuditSink, TracingSink};
use super::config::AssignConfig;
use super::construction::{Construction, ConstructionSpec};
use super::model::{MaterialCache, Model, StackLayer};
use super::placement::{LayerClass, LayerPlacement, remove_by_name};
use super::solver::synthesize_equivalent_material;
use super::validate::validate;
use crate::UID;
use crate::name::HasName;

/// Outcome of one assignment batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignReport {
    pub created_materials: usize,
    pub reused_materials: usize,
    /// Constructions added to the model by this batch (including reversed ones).
    pub created_constructions: Vec<UID>,
    /// `(surface, construction)` pairs for the requested surfaces.
    pub assignments: Vec<(UID, UID)>,
    /// `(adjacent surface, reversed construction)` pairs.
    pub mirrored: Vec<(UID, UID)>,
    /// Removal prefixes that matched no layer.
    pub missed_removals: Vec<String>,
}

/// Surfaces sharing one pre-existing construction (or none).
struct Group {
    existing: Option<UID>,
    stack: Vec<StackLayer>,
    surfaces: Vec<UID>,
}

pub struct ConstructionAssigner {
    config: AssignConfig,
    sink: Box<dyn AuditSink>,
}

impl Default for ConstructionAssigner {
    fn default() -> Self {
        Self::new(AssignConfig::default(), Box::new(TracingSink))
    }
}

impl ConstructionAssigner {
    pub fn new(config: AssignConfig, sink: Box<dyn AuditSink>) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &AssignConfig {
        &self.config
    }

    /// Builds the construction described by `spec` on top of each surface's
    /// current stack, assigns it, and mirrors it onto adjacent surfaces.
    ///
    /// All `surfaces` must share one category. Fails without touching the
    /// model if `spec` is invalid or a surface is unknown; a
    /// [`super::ValidationError`] can be recovered with `downcast_ref`.
    pub fn create_and_assign_constructions(
        &self,
        model: &mut Model,
        cache: &mut MaterialCache,
        surfaces: &[UID],
        spec: &ConstructionSpec,
    ) -> Result<AssignReport> {
        validate(spec, &self.config)
            .with_context(|| format!("Invalid construction: {}", spec.name))?;

        let mut report = AssignReport::default();
        if !spec.has_included_layers() {
            debug!(construction = %spec.name, "no included layers, nothing to assign");
            return Ok(report);
        }
        if surfaces.is_empty() {
            debug!(construction = %spec.name, "no surfaces, nothing to assign");
            return Ok(report);
        }

        let category = {
            let first = model
                .surface(&surfaces[0])
                .with_context(|| format!("Surface not found: {}", surfaces[0]))?;
            first.category
        };
        for uid in surfaces {
            let surface = model
                .surface(uid)
                .with_context(|| format!("Surface not found: {uid}"))?;
            ensure!(
                surface.category == category,
                "Surface {} is a {:?}, expected {:?}",
                surface.name,
                surface.category,
                category
            );
            if let Some(adjacent) = &surface.adjacent {
                ensure!(
                    model.surface(adjacent).is_some(),
                    "Adjacent surface of {} not found: {adjacent}",
                    surface.name
                );
            }
        }
        let direct = without_linked_partners(model, surfaces);
        let mut groups = group_by_construction(model, &direct)?;

        // Model writes start here.
        let realized: Vec<StackLayer> = spec
            .layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.include)
            .map(|(i, _)| {
                let material = synthesize_equivalent_material(i, &spec.layers, &spec.path_fractions);
                let (uid, created) = cache.realize(model, material.clone());
                if created {
                    report.created_materials += 1;
                } else {
                    report.reused_materials += 1;
                }
                StackLayer { uid, material }
            })
            .collect();
        debug!(
            construction = %spec.name,
            created = report.created_materials,
            reused = report.reused_materials,
            "materials realized"
        );

        let placement = LayerPlacement::new(category);
        let mut names: HashMap<String, UID> = HashMap::new();
        for group in &mut groups {
            let mut swept = false;
            for layer in &realized {
                let sweep = !swept && placement.classify(layer) == LayerClass::NonStandard;
                swept |= sweep;
                placement.place(&mut group.stack, layer.clone(), sweep);
            }
            for prefix in &spec.removals {
                if !remove_by_name(&mut group.stack, prefix) {
                    info!(construction = %spec.name, prefix = %prefix, "no layer to remove");
                    report.missed_removals.push(prefix.clone());
                }
            }

            let layers: Vec<UID> = group.stack.iter().map(|l| l.uid.clone()).collect();
            let construction =
                self.construction_for(model, &mut names, &spec.name, layers, &mut report)?;
            debug!(
                existing = ?group.existing,
                construction = %construction,
                surfaces = group.surfaces.len(),
                "group resolved"
            );
            for surface in &group.surfaces {
                self.attach(model, surface, &construction)?;
                report.assignments.push((surface.clone(), construction.clone()));
            }
        }

        self.mirror_adjacent(model, &mut report)?;
        Ok(report)
    }

    /// Assigns the reversed construction to the adjacent surface of every
    /// surface assigned in this batch.
    fn mirror_adjacent(&self, model: &mut Model, report: &mut AssignReport) -> Result<()> {
        let mut reversed: HashMap<String, UID> = HashMap::new();
        let assignments = report.assignments.clone();
        for (surface, construction) in &assignments {
            let Some(adjacent) = model.surface(surface).and_then(|s| s.adjacent.clone()) else {
                continue;
            };
            let c = model
                .construction(construction)
                .with_context(|| format!("Construction not found: {construction}"))?;
            let name = self.config.reversed_name(&c.name);
            let layers: Vec<UID> = c.layers.iter().rev().cloned().collect();

            let mirrored = self.construction_for(model, &mut reversed, &name, layers, report)?;
            self.attach(model, &adjacent, &mirrored)?;
            report.mirrored.push((adjacent, mirrored));
        }
        Ok(())
    }

    /// Finds or creates a construction named `base` (or `base 2`, `base 3`, ...
    /// when the name is taken by different layers).
    ///
    /// Names created or reused earlier in this call are looked up in `names`
    /// first, then the model, so repeating a batch creates nothing new.
    fn construction_for(
        &self,
        model: &mut Model,
        names: &mut HashMap<String, UID>,
        base: &str,
        layers: Vec<UID>,
        report: &mut AssignReport,
    ) -> Result<UID> {
        let mut n = 1;
        loop {
            let candidate = if n == 1 {
                base.to_string()
            } else {
                format!("{base} {n}")
            };
            n += 1;

            let known = match names.get(&candidate) {
                Some(uid) => model.construction(uid),
                None => model.construction_by_name(&candidate),
            };
            match known {
                Some(c) if c.layers == layers => {
                    let uid = c.uid.clone();
                    names.insert(candidate, uid.clone());
                    return Ok(uid);
                }
                Some(_) => continue,
                None => {}
            }

            let uid = model.add_construction(Construction::new(&candidate, layers))?;
            let layer_names = model.layer_names(&uid)?;
            self.sink.record(&AuditRecord::ConstructionCreated {
                construction: candidate.clone(),
                layer_count: layer_names.len(),
                layers: layer_names,
            });
            names.insert(candidate, uid.clone());
            report.created_constructions.push(uid.clone());
            return Ok(uid);
        }
    }

    fn attach(&self, model: &mut Model, surface: &UID, construction: &UID) -> Result<()> {
        model.assign(surface, construction)?;
        let surface_name = model
            .surface(surface)
            .map(|s| s.name().to_string())
            .unwrap_or_default();
        let construction_name = model
            .construction(construction)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.sink.record(&AuditRecord::Assigned {
            surface: surface_name,
            construction: construction_name,
        });
        Ok(())
    }
}

/// Drops every surface whose adjacent surface is listed earlier in the batch.
///
/// Of a linked pair assigned together, only the first gets the construction;
/// the second receives its mirror.
fn without_linked_partners(model: &Model, surfaces: &[UID]) -> Vec<UID> {
    let mut kept: Vec<UID> = Vec::new();
    for uid in surfaces {
        if kept.contains(uid) {
            continue;
        }
        let partner = model.surface(uid).and_then(|s| s.adjacent.as_ref());
        if let Some(partner) = partner.filter(|p| kept.contains(p)) {
            debug!(surface = %uid, partner = %partner, "surface receives the mirror of its partner");
            continue;
        }
        kept.push(uid.clone());
    }
    kept
}

/// Groups surfaces by their current construction, keeping first-seen order,
/// and loads each group's existing stack.
fn group_by_construction(model: &Model, surfaces: &[UID]) -> Result<Vec<Group>> {
    let mut groups: Vec<Group> = Vec::new();
    for uid in surfaces {
        let existing = model.surface(uid).and_then(|s| s.construction.clone());
        if let Some(group) = groups.iter_mut().find(|g| g.existing == existing) {
            if !group.surfaces.contains(uid) {
                group.surfaces.push(uid.clone());
            }
            continue;
        }
        let stack = match &existing {
            Some(c) => model.stack(c)?,
            None => Vec::new(),
        };
        groups.push(Group {
            existing,
            stack,
            surfaces: vec![uid.clone()],
        });
    }
    Ok(groups)
}

/// Runs [`ConstructionAssigner::create_and_assign_constructions`] with the
/// default configuration and a tracing audit sink.
pub fn create_and_assign_constructions(
    model: &mut Model,
    cache: &mut MaterialCache,
    surfaces: &[UID],
    spec: &ConstructionSpec,
) -> Result<AssignReport> {
    ConstructionAssigner::default().create_and_assign_constructions(model, cache, surfaces, spec)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sim::envelope::audit::MemorySink;
    use crate::sim::envelope::construction::SpecLayer;
    use crate::sim::envelope::validate::ValidationError;
    use crate::sim::materials::{Material, OpaqueMaterial, Role, SimpleMaterial};
    use crate::sim::surfaces::{BoundaryCondition, Surface, SurfaceCategory};

    struct SharedSink(Arc<MemorySink>);

    impl AuditSink for SharedSink {
        fn record(&self, record: &AuditRecord) {
            self.0.record(record);
        }
    }

    fn assigner() -> (ConstructionAssigner, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let assigner = ConstructionAssigner::new(
            AssignConfig::default(),
            Box::new(SharedSink(Arc::clone(&sink))),
        );
        (assigner, sink)
    }

    fn opaque(name: &str, thickness: f64, k: f64) -> Material {
        Material::from(OpaqueMaterial::new(name, thickness, k, 30.0, 1000.0))
    }

    fn stud_wall() -> ConstructionSpec {
        ConstructionSpec::new("StudWall", vec![0.25, 0.75])
            .with_layer(SpecLayer::series(SimpleMaterial::new("AirFilmOutside", 0.03)).excluded())
            .with_layer(SpecLayer::series(opaque("Siding", 0.01, 0.1).with_role(Role::ExteriorFinish)))
            .with_layer(
                SpecLayer::parallel(vec![opaque("Stud", 0.089, 0.12), opaque("Batt", 0.089, 0.043)])
                    .named("StudAndCavity"),
            )
            .with_layer(SpecLayer::series(opaque("Drywall", 0.0127, 0.16).with_role(Role::Mass)))
    }

    fn wall(model: &mut Model, name: &str) -> UID {
        model.add_surface(Surface::new(name, SurfaceCategory::Wall, BoundaryCondition::Outdoors))
    }

    #[test]
    fn test_assigns_new_construction() {
        let (assigner, sink) = assigner();
        let mut model = Model::new();
        let mut cache = MaterialCache::new(1e-4);
        let w1 = wall(&mut model, "Wall1");
        let w2 = wall(&mut model, "Wall2");

        let report = assigner
            .create_and_assign_constructions(&mut model, &mut cache, &[w1.clone(), w2.clone()], &stud_wall())
            .unwrap();

        assert_eq!(report.created_materials, 3);
        assert_eq!(report.created_constructions.len(), 1);
        let c = model.surface_construction(&w1).unwrap();
        assert_eq!(c.name, "StudWall");
        assert_eq!(model.surface_construction(&w2).unwrap().uid, c.uid);
        assert_eq!(
            model.layer_names(&c.uid).unwrap(),
            vec!["Siding", "StudAndCavity", "Drywall"]
        );
        // one creation + two assignments
        assert_eq!(sink.count(), 3);
    }

    #[test]
    fn test_invalid_spec_leaves_model_untouched() {
        let (assigner, sink) = assigner();
        let mut model = Model::new();
        let mut cache = MaterialCache::new(1e-4);
        let w1 = wall(&mut model, "Wall1");
        let mut spec = stud_wall();
        spec.path_fractions = vec![0.25, 0.25];

        let err = assigner
            .create_and_assign_constructions(&mut model, &mut cache, &[w1.clone()], &spec)
            .unwrap_err();
        let validation = err.downcast_ref::<ValidationError>().unwrap();
        assert_eq!(validation.rule(), 1);
        assert_eq!(model.num_materials(), 0);
        assert_eq!(model.num_constructions(), 0);
        assert!(model.surface(&w1).unwrap().construction.is_none());
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_unknown_surface_leaves_model_untouched() {
        let (assigner, _) = assigner();
        let mut model = Model::new();
        let mut cache = MaterialCache::new(1e-4);
        let w1 = wall(&mut model, "Wall1");
        let result = assigner.create_and_assign_constructions(
            &mut model,
            &mut cache,
            &[w1, UID::from("missing")],
            &stud_wall(),
        );
        assert!(result.is_err());
        assert_eq!(model.num_materials(), 0);
    }

    #[test]
    fn test_no_included_layers_is_noop() {
        let (assigner, _) = assigner();
        let mut model = Model::new();
        let mut cache = MaterialCache::new(1e-4);
        let w1 = wall(&mut model, "Wall1");
        let spec = ConstructionSpec::series("Films")
            .with_layer(SpecLayer::series(SimpleMaterial::new("AirFilmOutside", 0.03)).excluded());
        let report = assigner
            .create_and_assign_constructions(&mut model, &mut cache, &[w1], &spec)
            .unwrap();
        assert_eq!(report, AssignReport::default());
        assert_eq!(model.num_materials(), 0);
    }

    #[test]
    fn test_repeated_call_creates_nothing() {
        let (assigner, _) = assigner();
        let mut model = Model::new();
        let mut cache = MaterialCache::new(1e-4);
        let w1 = wall(&mut model, "Wall1");

        assigner
            .create_and_assign_constructions(&mut model, &mut cache, &[w1.clone()], &stud_wall())
            .unwrap();
        let (materials, constructions) = (model.num_materials(), model.num_constructions());
        let report = assigner
            .create_and_assign_constructions(&mut model, &mut cache, &[w1], &stud_wall())
            .unwrap();
        assert_eq!(report.created_materials, 0);
        assert_eq!(report.reused_materials, 3);
        assert!(report.created_constructions.is_empty());
        assert_eq!(model.num_materials(), materials);
        assert_eq!(model.num_constructions(), constructions);
    }

    #[test]
    fn test_groups_by_existing_construction() {
        let (assigner, _) = assigner();
        let mut model = Model::new();
        let mut cache = MaterialCache::new(1e-4);
        let w1 = wall(&mut model, "Wall1");
        let w2 = wall(&mut model, "Wall2");

        // Another caller already gave Wall2 a sheathing layer.
        let sheathing = Material::from(OpaqueMaterial::new("OSB", 0.011, 0.13, 650.0, 1210.0))
            .with_role(Role::Sheathing);
        let (osb, _) = cache.realize(&mut model, sheathing);
        let existing = model
            .add_construction(Construction::new("Sheathed", vec![osb]))
            .unwrap();
        model.assign(&w2, &existing).unwrap();

        let report = assigner
            .create_and_assign_constructions(&mut model, &mut cache, &[w1.clone(), w2.clone()], &stud_wall())
            .unwrap();
        assert_eq!(report.created_constructions.len(), 2);

        let c1 = model.surface_construction(&w1).unwrap();
        let c2 = model.surface_construction(&w2).unwrap();
        assert_eq!(c1.name, "StudWall");
        assert_eq!(c2.name, "StudWall 2");
        assert_eq!(
            model.layer_names(&c2.uid).unwrap(),
            vec!["Siding", "OSB", "StudAndCavity", "Drywall"]
        );
    }

    #[test]
    fn test_missed_removal_is_tolerated() {
        let (assigner, _) = assigner();
        let mut model = Model::new();
        let mut cache = MaterialCache::new(1e-4);
        let w1 = wall(&mut model, "Wall1");
        let mut spec = stud_wall();
        spec.remove_layer("Drywall");
        spec.remove_layer("Carpet");

        let report = assigner
            .create_and_assign_constructions(&mut model, &mut cache, &[w1.clone()], &spec)
            .unwrap();
        assert_eq!(report.missed_removals, vec!["Carpet".to_string()]);
        let c = model.surface_construction(&w1).unwrap();
        assert_eq!(model.layer_names(&c.uid).unwrap(), vec!["Siding", "StudAndCavity"]);
    }

    fn partition() -> ConstructionSpec {
        ConstructionSpec::series("Partition")
            .with_layer(SpecLayer::series(opaque("OSB", 0.011, 0.13).with_role(Role::Sheathing)))
            .with_layer(SpecLayer::series(opaque("Gypsum", 0.0127, 0.16).with_role(Role::Mass)))
    }

    #[test]
    fn test_linked_pair_in_one_batch_is_mirrored() {
        let (assigner, _) = assigner();
        let mut model = Model::new();
        let mut cache = MaterialCache::new(1e-4);
        let a = wall(&mut model, "A");
        let b = wall(&mut model, "B");
        model.link_adjacent(&a, &b).unwrap();

        let report = assigner
            .create_and_assign_constructions(&mut model, &mut cache, &[a.clone(), b.clone()], &partition())
            .unwrap();

        let ca = model.surface_construction(&a).unwrap().clone();
        let cb = model.surface_construction(&b).unwrap().clone();
        assert_eq!(ca.name, "Partition");
        assert_eq!(cb.name, "RevPartition");
        assert_eq!(model.layer_names(&ca.uid).unwrap(), vec!["OSB", "Gypsum"]);
        assert_eq!(model.layer_names(&cb.uid).unwrap(), vec!["Gypsum", "OSB"]);
        assert_eq!(report.assignments, vec![(a, ca.uid)]);
        assert_eq!(report.mirrored, vec![(b, cb.uid)]);
    }

    #[test]
    fn test_reversed_construction_shared_by_partners() {
        let (assigner, sink) = assigner();
        let mut model = Model::new();
        let mut cache = MaterialCache::new(1e-4);
        let w1 = wall(&mut model, "Wall1");
        let w2 = wall(&mut model, "Wall2");
        let p1 = wall(&mut model, "Partner1");
        let p2 = wall(&mut model, "Partner2");
        model.link_adjacent(&w1, &p1).unwrap();
        model.link_adjacent(&w2, &p2).unwrap();

        let report = assigner
            .create_and_assign_constructions(&mut model, &mut cache, &[w1, w2], &partition())
            .unwrap();

        assert_eq!(report.created_constructions.len(), 2);
        assert_eq!(model.num_constructions(), 2);
        let r1 = model.surface_construction(&p1).unwrap();
        let r2 = model.surface_construction(&p2).unwrap();
        assert_eq!(r1.name, "RevPartition");
        assert_eq!(r1.uid, r2.uid);
        // two creations, two direct and two mirrored assignments
        assert_eq!(sink.count(), 6);
    }

    #[test]
    fn test_rejects_mixed_categories() {
        let (assigner, _) = assigner();
        let mut model = Model::new();
        let mut cache = MaterialCache::new(1e-4);
        let w1 = wall(&mut model, "Wall1");
        let r1 = model.add_surface(Surface::new("Roof1", SurfaceCategory::Roof, BoundaryCondition::Outdoors));
        assert!(
            assigner
                .create_and_assign_constructions(&mut model, &mut cache, &[w1, r1], &stud_wall())
                .is_err()
        );
        assert_eq!(model.num_materials(), 0);
    }
}
