use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aletheia::{inspect_file, Config, TopologyPlan};

fn main() {
    // Initialize tracing; stdout carries the JSON report
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Required: ALETHEIA_TOPOLOGY=<path to topology plan JSON>");
            eprintln!("Optional: ALETHEIA_BOOTSTRAP_SERVERS, ALETHEIA_INSPECT");
            std::process::exit(1);
        }
    };

    tracing::info!("Validating topology plan {}", config.topology_path.display());
    if let Some(brokers) = &config.bootstrap_override {
        tracing::info!("Broker override: {}", brokers);
    }

    let plan = match TopologyPlan::load(&config.topology_path) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let validated = match plan.validate(config.bootstrap_override.as_ref()) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Topology rejected: {}", e);
            std::process::exit(2);
        }
    };
    tracing::info!("Topology accepted with {} streams", validated.sources.len());
    print_json(&validated);

    if let Some(path) = &config.inspect_path {
        match inspect_file(path) {
            Ok(summary) => print_json(&summary),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Could not render output: {}", e);
            std::process::exit(1);
        }
    }
}
