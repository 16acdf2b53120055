//! Command-line interface for onnx-shim.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect and run ONNX models through ONNX Runtime.
#[derive(Parser, Debug)]
#[command(name = "onnx-shim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print crate and runtime versions.
    Info,

    /// List a model's inputs and outputs.
    Inspect {
        /// Path to the .onnx model.
        #[arg(short, long)]
        model: PathBuf,
    },

    /// Run a model on a single f32 input.
    Infer {
        /// Path to the .onnx model. Overrides `session.model_path` from the config.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Path to input data file (JSON with tensor data).
        #[arg(short, long)]
        input: PathBuf,

        /// Output to fetch; repeat for several. Defaults to every model output.
        #[arg(short, long = "output")]
        outputs: Vec<String>,

        /// Output format (json, pretty).
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Path to optional YAML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_infer() {
        let cli = Cli::try_parse_from([
            "onnx-shim",
            "infer",
            "--model",
            "m.onnx",
            "--input",
            "x.json",
            "-o",
            "y",
            "-o",
            "z",
        ])
        .unwrap();
        match cli.command {
            Commands::Infer {
                model,
                input,
                outputs,
                format,
                config,
            } => {
                assert_eq!(model, Some(PathBuf::from("m.onnx")));
                assert_eq!(input, PathBuf::from("x.json"));
                assert_eq!(outputs, vec!["y".to_string(), "z".to_string()]);
                assert_eq!(format, "json");
                assert!(config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn inspect_requires_model() {
        assert!(Cli::try_parse_from(["onnx-shim", "inspect"]).is_err());
    }
}
