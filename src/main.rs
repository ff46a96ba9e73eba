use anyhow::{Context, Result};
use log::info;

use csma_ca_sim::{run_batch, saturation_estimate, SimulationConfig};

fn main() -> Result<()> {
    env_logger::init();
    println!("... CSMA/CA contention simulator is started ...");

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::load(&path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None => SimulationConfig::default(),
    };
    info!("{} access, rates {:?}", config.protocol, config.arrival_rates);

    let estimate = saturation_estimate(&config);
    println!(
        "Theoretical saturation: p_collision: {:.4}, tau: {:.4}",
        estimate.collision_probability, estimate.tau
    );

    let report = run_batch(&config).context("simulation batch failed")?;

    println!("*******************Simulation results*******************");
    for metrics in &report {
        println!("{}", metrics);
    }
    println!("*******************Simulation results*******************");
    Ok(())
}
