//! Agrosage CLI - one-shot crop advisory runs
//!
//! Usage:
//!   agrosage --nitrogen 90 --phosphorus 40 --potassium 40 --ph 5.5 \
//!            --rainfall 200 --temperature 25          # advise with presets
//!   agrosage ... --config farm.json                   # custom network/map
//!   agrosage ... -o json                              # machine-readable output

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use agrosage::advisor::{
    Advisor, MemoryStore, PlotSample, RangeClassifier, Recommendation, SymptomReport,
};
use agrosage::catalog::{load_config, AdvisorConfig};

#[derive(Parser)]
#[command(name = "agrosage")]
#[command(version)]
#[command(about = "Agrosage - Hybrid Crop Advisory CLI")]
#[command(long_about = "Run one advisory pass: ML candidate, symbolic validation, and \
drone-assisted Bayesian diagnosis when the symbols disagree")]
struct Cli {
    /// Plot identifier used for fact assertion and audit logs
    #[arg(long, default_value = "plot_current")]
    plot: String,

    /// Soil nitrogen level (N)
    #[arg(long)]
    nitrogen: f64,

    /// Soil phosphorus level (P)
    #[arg(long)]
    phosphorus: f64,

    /// Soil potassium level (K)
    #[arg(long)]
    potassium: f64,

    /// Soil pH
    #[arg(long)]
    ph: f64,

    /// Seasonal rainfall in millimeters
    #[arg(long)]
    rainfall: f64,

    /// Mean temperature in Celsius
    #[arg(long)]
    temperature: f64,

    /// Measured humidity percentage; estimated from rainfall when absent
    #[arg(long)]
    humidity: Option<f64>,

    /// Leaf spots observed at the flagged plot (drone default: present)
    #[arg(long)]
    spots: Option<bool>,

    /// Yellowing observed at the flagged plot (drone default: present)
    #[arg(long)]
    yellowing: Option<bool>,

    /// Advisor configuration file (JSON); built-in presets when absent
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format: summary or json
    #[arg(short, long, default_value = "summary", value_name = "FORMAT")]
    output: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading configuration '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => AdvisorConfig::default(),
    };

    let mut advisor = match Advisor::from_config(
        RangeClassifier::default(),
        MemoryStore::default(),
        &config,
    ) {
        Ok(advisor) => advisor,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let sample = PlotSample {
        nitrogen: cli.nitrogen,
        phosphorus: cli.phosphorus,
        potassium: cli.potassium,
        ph: cli.ph,
        rainfall_mm: cli.rainfall,
        temperature_c: cli.temperature,
    };
    let symptoms = match (cli.spots, cli.yellowing) {
        (None, None) => None,
        (spots, yellowing) => Some(SymptomReport {
            leaf_spots: spots.unwrap_or(true),
            yellowing: yellowing.unwrap_or(true),
        }),
    };

    match advisor.advise(&cli.plot, &sample, symptoms, cli.humidity) {
        Ok(recommendation) => match cli.output.as_str() {
            "json" => match serde_json::to_string_pretty(&recommendation) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing to JSON: {}", e);
                    process::exit(1);
                }
            },
            _ => print_summary(&recommendation),
        },
        Err(e) => {
            eprintln!("Advisory run failed: {}", e);
            process::exit(1);
        }
    }
}

fn print_summary(recommendation: &Recommendation) {
    println!(
        "Plot '{}': candidate '{}' (confidence {:.0}%)",
        recommendation.plot,
        recommendation.candidate,
        recommendation.confidence * 100.0
    );
    println!("Terminal stage: {}", recommendation.stage);

    if let Some(alternative) = &recommendation.alternative {
        println!("Taxonomic alternative: '{}'", alternative);
    }
    if let Some(route) = &recommendation.route {
        println!(
            "Drone route: {} ({} m)",
            route.waypoints.join(" -> "),
            route.cost_m
        );
    }
    if let Some(diagnosis) = &recommendation.diagnosis {
        println!(
            "Diagnosis: disease {:.2}% | water stress {:.2}%",
            diagnosis.disease * 100.0,
            diagnosis.water_stress * 100.0
        );
    }

    let advice = match &recommendation.decision {
        agrosage::advisor::Decision::PlantCandidate(label) => {
            format!("plant '{}' as recommended", label)
        }
        agrosage::advisor::Decision::PlantAlternative(label) => {
            format!("plant the related crop '{}'", label)
        }
        agrosage::advisor::Decision::ApplyFungicide => {
            "high disease risk - apply fungicidal treatment".to_string()
        }
        agrosage::advisor::Decision::Irrigate => {
            "the plants are thirsty, not sick - irrigate".to_string()
        }
        agrosage::advisor::Decision::Monitor => {
            "uncertain or low risk - continue monitoring".to_string()
        }
        agrosage::advisor::Decision::InspectionImpossible => {
            "no route for the inspection drone - manual intervention required".to_string()
        }
    };
    println!("Decision: {}", advice);
}
