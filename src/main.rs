use std::path::Path;

use anyhow::Result;
use building_envelope::io::read_catalog;
use building_envelope::sim::envelope::TracingSink;
use building_envelope::{
    AssignConfig, BoundaryCondition, ConstructionAssigner, ConstructionSpec, HasName,
    MaterialCache, MaterialCatalog, Model, SortByName, SpecLayer, Surface, SurfaceCategory, UID,
};

fn stud_wall(catalog: &MaterialCatalog) -> Result<ConstructionSpec> {
    Ok(ConstructionSpec::from_path_widths("ExtWall2x4", &[1.5, 14.5])
        .with_layer(SpecLayer::series(catalog.material("AirFilmOutside")?).excluded())
        .with_layer(SpecLayer::series(catalog.material("VinylSiding")?))
        .with_layer(SpecLayer::series(catalog.material("OSBSheathing")?))
        .with_layer(
            SpecLayer::parallel(vec![
                catalog.material("WoodStud2x4")?,
                catalog.material("BattInsulation2x4")?,
            ])
            .named("StudAndCavity"),
        )
        .with_layer(SpecLayer::series(catalog.material("GypsumBoard")?))
        .with_layer(SpecLayer::series(catalog.material("AirFilmVertical")?).excluded()))
}

fn interzonal_floor(catalog: &MaterialCatalog) -> Result<ConstructionSpec> {
    Ok(ConstructionSpec::from_path_widths("IntFloor", &[1.5, 14.5])
        .with_layer(
            SpecLayer::parallel(vec![
                catalog.material("WoodStud2x4")?,
                catalog.material("BattInsulation2x4")?,
            ])
            .named("JoistsAndCavity"),
        )
        .with_layer(SpecLayer::series(catalog.material("OSBSheathing")?))
        .with_layer(SpecLayer::series(catalog.material("CarpetAndPad")?)))
}

fn print_construction(model: &Model, surface: &UID) -> Result<()> {
    let Some(s) = model.surface(surface) else {
        return Ok(());
    };
    match model.surface_construction(surface) {
        Some(c) => println!("{:<10} {:<14} {:?}", s.name(), c.name, model.layer_names(&c.uid)?),
        None => println!("{:<10} (none)", s.name()),
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let catalog = match std::env::args().nth(1) {
        Some(path) => read_catalog(Path::new(&path))?,
        None => MaterialCatalog::with_presets(),
    };

    let config = AssignConfig::default();
    let mut cache = MaterialCache::with_config(&config);
    let assigner = ConstructionAssigner::new(config, Box::new(TracingSink));
    let mut model = Model::new();

    let north = model.add_surface(Surface::new("North", SurfaceCategory::Wall, BoundaryCondition::Outdoors));
    let south = model.add_surface(Surface::new("South", SurfaceCategory::Wall, BoundaryCondition::Outdoors));
    let floor = model.add_surface(Surface::new("Floor2", SurfaceCategory::Floor, BoundaryCondition::Outdoors));
    let ceiling = model.add_surface(Surface::new("Ceiling1", SurfaceCategory::Ceiling, BoundaryCondition::Outdoors));
    model.link_adjacent(&floor, &ceiling)?;

    let wall = stud_wall(&catalog)?;
    println!("{}: R = {:.3}, U = {:.3}", wall.name, wall.assembly_resistance(), wall.u_factor());
    assigner.create_and_assign_constructions(&mut model, &mut cache, &[north.clone(), south.clone()], &wall)?;

    let floor_spec = interzonal_floor(&catalog)?;
    println!("{}: R = {:.3}", floor_spec.name, floor_spec.assembly_resistance());
    assigner.create_and_assign_constructions(&mut model, &mut cache, &[floor.clone()], &floor_spec)?;

    for s in [&north, &south, &floor, &ceiling] {
        print_construction(&model, s)?;
    }

    let mut constructions: Vec<_> = model.constructions().collect();
    constructions.sort_by_name();
    println!("{} materials, {} constructions:", model.num_materials(), constructions.len());
    for c in constructions {
        println!("  {} ({} layers)", c.name(), c.layer_count());
    }
    Ok(())
}
