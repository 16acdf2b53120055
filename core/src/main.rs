//! CLI entry point for onnx-shim.

use anyhow::{Context, Result};
use serde_json::Value as Json;
use std::fs;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use onnx_shim::cli::{Cli, Commands};
use onnx_shim::config::Config;
use onnx_shim::engine::runtime_version;
use onnx_shim::{Api, Environment, MemoryInfo, Session};

/// ONNX Runtime version found by the build script.
fn build_runtime_version() -> &'static str {
    option_env!("ONNXRUNTIME_VERSION").unwrap_or("unknown")
}

/// Get the enabled features.
fn enabled_features() -> &'static str {
    if cfg!(feature = "onnxruntime") {
        "onnxruntime"
    } else {
        "none"
    }
}

fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Info => {
            println!("onnx-shim v{}", env!("CARGO_PKG_VERSION"));
            println!("onnxruntime (build): {}", build_runtime_version());
            println!("onnxruntime (runtime): {}", runtime_version());
            println!("features: {}", enabled_features());
        }

        Commands::Inspect { model } => {
            let api = Api::linked()?;
            let env = Environment::new(&api, Default::default(), "onnx-shim")?;

            info!("Loading model: {}", model.display());
            let session = Session::new(&env, &model, None)?;
            let memory = MemoryInfo::cpu(&api)?;
            let allocator = session.allocator(&memory)?;

            let inputs = allocator.input_names()?;
            let outputs = allocator.output_names()?;

            println!("Model: {}", model.display());
            println!("Inputs ({}):", inputs.len());
            for (i, name) in inputs.iter().enumerate() {
                println!("  [{}] {}", i, name);
            }
            println!("Outputs ({}):", outputs.len());
            for (i, name) in outputs.iter().enumerate() {
                println!("  [{}] {}", i, name);
            }
        }

        Commands::Infer {
            model,
            input,
            outputs,
            format,
            config,
        } => {
            // Load optional config
            let mut config = if let Some(config_path) = config {
                Config::from_yaml_file(&config_path)
                    .with_context(|| format!("Failed to load config: {}", config_path.display()))?
            } else {
                Config::default()
            };
            if model.is_some() {
                config.session.model_path = model;
            }

            let api = Api::linked()?;
            let env = Environment::from_config(&api, &config.environment)?;
            let session = Session::from_config(&env, &config.session, None)?;
            info!("Model loaded successfully");

            let memory = MemoryInfo::from_config(&api, &config.memory)?;
            let allocator = session.allocator(&memory)?;

            // Load input data
            info!("Loading input: {}", input.display());
            let input_json: Json = serde_json::from_str(
                &fs::read_to_string(&input)
                    .with_context(|| format!("Failed to read input: {}", input.display()))?,
            )?;

            // Expected format: { "name"?: "x", "data": [...], "shape": [B, C, H, W] }
            let data: Vec<f32> = input_json["data"]
                .as_array()
                .context("Input must have 'data' array")?
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect();

            let shape: Vec<i64> = input_json["shape"]
                .as_array()
                .context("Input must have 'shape' array")?
                .iter()
                .map(|v| v.as_i64().unwrap_or(1))
                .collect();

            let input_name = match input_json["name"].as_str() {
                Some(name) => name.to_string(),
                None => allocator
                    .input_name(0)
                    .context("Model has no inputs to bind")?,
            };

            let output_names = if outputs.is_empty() {
                allocator.output_names()?
            } else {
                outputs
            };
            let output_refs: Vec<&str> = output_names.iter().map(String::as_str).collect();

            let tensor = memory
                .tensor_from_vec(data, &shape)
                .context("Failed to create input tensor")?;

            info!("Running inference...");
            let results = session.run(&[(input_name.as_str(), tensor.value())], &output_refs)?;
            info!("Inference complete: {} outputs", results.len());

            let mut described = Vec::with_capacity(results.len());
            for (i, (name, value)) in output_names.iter().zip(&results).enumerate() {
                described.push(serde_json::json!({
                    "index": i,
                    "name": name,
                    "element_type": value.element_type()?.to_string(),
                    "shape": value.dimensions()?,
                    "size_in_bytes": value.size_in_bytes()?,
                }));
            }

            let output = serde_json::json!({
                "input": input_name,
                "num_outputs": results.len(),
                "outputs": described,
            });

            if format == "pretty" {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", serde_json::to_string(&output)?);
            }
        }
    }

    Ok(())
}
