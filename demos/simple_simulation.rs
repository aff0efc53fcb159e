use proton_mc::{
    Axis, DepthDoseTally, Geometry, HistoryFate, IndependentSource, Materials, Model, Particle,
    Settings, Stepper,
};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::time::Instant;

fn main() {
    // RUST_LOG=debug prints one line per history
    env_logger::init();

    // 60 x 60 x 200 mm water tank with a 10 mm bone slab at 40 mm depth
    let mut geometry = Geometry::new([60, 60, 200], 1.0, &Materials::standard()).unwrap();
    geometry.set_region_mm(0, (0.0, 60.0), (0.0, 60.0), (0.0, 200.0)).unwrap();
    geometry.set_region_mm(1, (0.0, 60.0), (0.0, 60.0), (40.0, 50.0)).unwrap();

    // A single 100 MeV proton, stepped by hand
    let stepper = Stepper::new();
    let mut rng = Pcg64::seed_from_u64(1);
    let mut proton = Particle::new([30.0, 30.0, 0.0], [0.0, 0.0, 1.0], 100.0).unwrap();
    let mut steps = 0;
    while proton.is_alive() {
        let material = geometry.material_at(proton.position());
        stepper.advance(&mut proton, material, 0.1, &mut rng).unwrap();
        steps += 1;
    }
    println!("Single proton:");
    println!("  Steps: {}", steps);
    println!("  Final position: {:?} mm", proton.position());
    println!("  Path length: {:.3} mm", proton.track_length());
    println!("  Deposited: {:.6} MeV", proton.deposited_energy());

    // A pencil beam of 1000 histories with a depth-dose tally
    let mut source = IndependentSource::new();
    source.space = [30.0, 30.0, 0.0];
    source.energy = 150.0;
    let mut settings = Settings::new(source);
    settings.particles = 1000;
    settings.step_length = 0.1;
    settings.seed = 42;
    settings.kill_on_exit = true;

    let model = Model::new(geometry, settings)
        .unwrap()
        .with_depth_dose(DepthDoseTally::new(Axis::Z, 1.0, 200).unwrap());

    let start = Instant::now();
    let results = model.run().unwrap();
    let duration = start.elapsed();

    println!("\nPencil beam:");
    println!("  Histories: {}", results.histories.len());
    println!("  Stopped: {}", results.count(HistoryFate::Stopped));
    println!("  Escaped: {}", results.count(HistoryFate::Escaped));
    if let Some(mean) = results.mean_stopped_track_length() {
        println!("  Mean path length: {:.3} mm", mean);
    }
    println!("  Run time: {:.2?}", duration);

    if let Some(depth_dose) = &results.depth_dose {
        println!("\n{}", depth_dose);
        println!("\n  depth (mm)  energy (MeV)");
        for (depth, energy) in depth_dose.depths().iter().zip(depth_dose.bins()).step_by(5) {
            println!("  {:>10.1}  {:>12.4}", depth, energy);
        }
    }
}
