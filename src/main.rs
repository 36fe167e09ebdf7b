use anyhow::Result;
use cellular_growth::Simulation;
use growth_common::GrowthConfig;
use log::{debug, error, info, trace, warn};
use std::fs::File;
use std::io::Write;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::init();

    info!("Starting Cellular Growth Engine (CPU Parallel)...");

    let config = GrowthConfig::load("config.toml")?;

    info!("Using {} Rayon threads.", rayon::current_num_threads());

    let mut sim = Simulation::new(config)?;
    info!("World seeded with {} cells.", sim.current_cell_count());
    debug!("Simulation Parameters: {:#?}", sim.world.params);

    let dt = sim.config.timing.dt;
    let total_steps = (sim.config.timing.total_time / dt).ceil() as u64;
    let record_interval = sim.config.timing.record_interval.max(0.0);
    let mut record_interval_steps = if dt > 0.0 {
        (record_interval / dt).max(1.0).round() as u64
    } else {
        1
    };
    if record_interval_steps == 0 {
        warn!(
            "Record interval ({:.3} s) is smaller than the physics timestep ({:.3} s). Recording every step.",
            record_interval, dt
        );
        record_interval_steps = 1;
    }
    info!(
        "Recording snapshot every {} steps ({:.2} s).",
        record_interval_steps,
        record_interval_steps as f32 * dt
    );

    info!("Starting simulation loop for {} steps...", total_steps);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    sim.record_snapshot();

    for step in 0..total_steps {
        let step_start_time = Instant::now();
        if let Err(e) = sim.step() {
            error!("Error during simulation step {}: {}", step + 1, e);
            anyhow::bail!("Simulation step failed.");
        }
        let step_duration = step_start_time.elapsed();

        let now = Instant::now();
        let should_print_status = now.duration_since(previous_print_time).as_secs_f64() >= 5.0;
        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step == total_steps - 1;

        if should_print_status || is_record_step || is_last_step {
            info!(
                "Step [{}/{}] ({:.2} s) | Cells: {} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                step + 1,
                total_steps,
                sim.time(),
                sim.current_cell_count(),
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = now;

            if is_record_step || is_last_step {
                sim.record_snapshot();
            }
        } else {
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds ({:.3} minutes).",
        total_duration.as_secs_f64(),
        total_duration.as_secs_f64() / 60.0
    );

    info!("Saving recorded data...");
    if sim.config.output.save_stats {
        let output_format = sim.config.output.format.as_deref().unwrap_or("json");
        let snapshots = sim.get_recorded_snapshots();

        match output_format {
            "bincode" => {
                let filename = format!("{}_snapshots.bin", sim.config.output.base_filename);
                match File::create(&filename) {
                    Ok(file) => match bincode::serialize_into(file, snapshots) {
                        Ok(_) => info!("All snapshots saved to {} (binary format)", filename),
                        Err(e) => error!("Error serializing snapshots to bincode: {}", e),
                    },
                    Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
                }
            }
            "messagepack" => {
                let filename = format!("{}_snapshots.msgpack", sim.config.output.base_filename);
                match &mut File::create(&filename) {
                    Ok(file) => match rmp_serde::encode::write(file, snapshots) {
                        Ok(_) => info!("All snapshots saved to {} (MessagePack format)", filename),
                        Err(e) => error!("Error serializing snapshots to MessagePack: {}", e),
                    },
                    Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
                }
            }
            other => {
                if other != "json" {
                    error!("Unknown output format: {}. Using JSON instead.", other);
                }
                let filename = format!("{}_snapshots.json", sim.config.output.base_filename);
                match File::create(&filename) {
                    Ok(mut file) => match serde_json::to_string(snapshots) {
                        Ok(json_string) => {
                            if let Err(e) = file.write_all(json_string.as_bytes()) {
                                error!("Error writing snapshot JSON to file '{}': {}", filename, e);
                            } else {
                                info!("All snapshots saved to {}", filename);
                            }
                        }
                        Err(e) => error!("Error serializing snapshots to JSON: {}", e),
                    },
                    Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
                }
            }
        }
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if sim.config.output.save_positions {
        let final_positions = sim.get_results();
        let filename = format!("{}_final_positions.csv", sim.config.output.base_filename);

        match csv::Writer::from_path(&filename) {
            Ok(mut writer) => {
                writer.write_record(["x", "y"])?;
                for (x, y) in final_positions {
                    writer.write_record(&[format!("{:.4}", x), format!("{:.4}", y)])?;
                }
                writer.flush()?;
                info!("Final positions saved to {}", filename);
            }
            Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
        }
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}
