#![cfg(feature = "onnxruntime")]

use anyhow::{bail, Context, Result};
use approx::assert_abs_diff_eq;
use ndarray::Array2;
use onnx_shim::{Api, ElementType, Environment, LoggingLevel, MemoryInfo};
use std::path::PathBuf;

#[test]
fn identity_model_round_trips_through_the_runtime() -> Result<()> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let model_path = manifest_dir.join("../tests/fixtures/identity.onnx");
    if !model_path.exists() {
        bail!(
            "Missing test fixture at {}. Run `python tests/fixtures/make_identity_model.py` first.",
            model_path.display()
        );
    }

    let api = Api::linked()?;
    let env = Environment::new(&api, LoggingLevel::Warning, "onnx-shim-test")?;
    let session = env
        .session(&model_path, None)
        .context("Failed to load identity model fixture")?;

    assert_eq!(session.input_count()?, 1);
    assert_eq!(session.output_count()?, 1);

    let memory = MemoryInfo::cpu(&api)?;
    let allocator = session.allocator(&memory)?;
    let input_name = allocator.input_name(0)?;
    let output_name = allocator.output_name(0)?;
    assert_eq!(input_name, "x");
    assert_eq!(output_name, "y");

    let input = Array2::<f32>::from_shape_fn((2, 3), |(i, j)| (i * 3 + j) as f32 * 0.5);
    let tensor = memory.tensor_from_array(&input)?;
    assert_eq!(tensor.size_in_bytes()?, 24);

    let outputs = session.run(&[(input_name.as_str(), tensor.value())], &[output_name.as_str()])?;
    assert_eq!(outputs.len(), 1);

    let y = &outputs[0];
    assert_eq!(y.element_type()?, ElementType::Float);
    assert_eq!(y.dimensions()?, vec![2, 3]);
    assert_eq!(y.size_in_bytes()?, 24);

    let out = y.to_array::<f32>()?;
    for (a, b) in out.iter().zip(input.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
    }

    let err = session
        .run(&[("missing", tensor.value())], &[output_name.as_str()])
        .unwrap_err();
    assert!(err.code().is_some(), "expected an engine error, got {err}");

    Ok(())
}
