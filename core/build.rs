//! Build script for onnx-shim.
//!
//! With the `onnxruntime` feature enabled, this script builds the C bridge in
//! `../ort_bridge` with CMake and links it, together with ONNX Runtime, into
//! the crate. Without the feature nothing native is built and the crate only
//! exposes the `Engine` seam.
//!
//! # Environment Variables
//!
//! - `ONNXRUNTIME_DIR`: Path to an ONNX Runtime release (with `include/` and
//!   `lib/`). When unset, `pkg-config libonnxruntime` is used.
//! - `ORT_BRIDGE_SKIP_BUILD`: Set to "1" to skip building (for development)
//! - `ORT_WARN_DETECTED`: Set to "1" to print the detected runtime as a cargo warning

fn main() {
    #[cfg(feature = "onnxruntime")]
    bridge::build_ort_bridge();
}

#[cfg(feature = "onnxruntime")]
mod bridge {
    use std::env;
    use std::path::PathBuf;
    use std::process::Command;

    /// Where ONNX Runtime was found.
    #[derive(Debug, Clone, PartialEq)]
    enum RuntimeSource {
        /// A release directory given through `ONNXRUNTIME_DIR`.
        Directory(PathBuf),
        /// A system install visible to pkg-config.
        PkgConfig,
    }

    /// Ask pkg-config for a variable of libonnxruntime.
    fn pkg_config(args: &[&str]) -> Option<String> {
        let output = Command::new("pkg-config")
            .args(args)
            .arg("libonnxruntime")
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let value = String::from_utf8(output.stdout).ok()?.trim().to_string();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Read the runtime version from a release directory's VERSION_NUMBER file.
    fn version_from_dir(dir: &PathBuf) -> Option<String> {
        std::fs::read_to_string(dir.join("VERSION_NUMBER"))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Locate ONNX Runtime and emit its version as a cargo env var.
    fn detect_runtime() -> (RuntimeSource, Option<PathBuf>) {
        if let Ok(path) = env::var("ONNXRUNTIME_DIR") {
            let dir = PathBuf::from(path);
            if !dir.exists() {
                panic!(
                    "ONNX Runtime path does not exist: {}\n\
                     The ONNXRUNTIME_DIR environment variable points to a non-existent path.",
                    dir.display()
                );
            }
            if let Some(version) = version_from_dir(&dir) {
                println!("cargo:rustc-env=ONNXRUNTIME_VERSION={}", version);
            }
            let lib_dir = dir.join("lib");
            return (RuntimeSource::Directory(dir), Some(lib_dir));
        }

        if let Some(version) = pkg_config(&["--modversion"]) {
            println!("cargo:rustc-env=ONNXRUNTIME_VERSION={}", version);
            let lib_dir = pkg_config(&["--variable=libdir"]).map(PathBuf::from);
            return (RuntimeSource::PkgConfig, lib_dir);
        }

        panic!(
            "Could not find ONNX Runtime.\n\
             Checked: ONNXRUNTIME_DIR, pkg-config libonnxruntime\n\
             \n\
             To fix, either:\n\
             1. Install onnxruntime so that `pkg-config --modversion libonnxruntime` works\n\
             2. Set ONNXRUNTIME_DIR to an extracted ONNX Runtime release"
        );
    }

    pub fn build_ort_bridge() {
        if env::var("ORT_BRIDGE_SKIP_BUILD")
            .map(|v| v == "1")
            .unwrap_or(false)
        {
            println!("cargo:warning=Skipping ort-bridge build (ORT_BRIDGE_SKIP_BUILD=1)");
            return;
        }

        println!("cargo:rerun-if-changed=../ort_bridge/src/ort_bridge.c");
        println!("cargo:rerun-if-changed=../ort_bridge/include/ort_bridge.h");
        println!("cargo:rerun-if-changed=../ort_bridge/CMakeLists.txt");
        println!("cargo:rerun-if-env-changed=ONNXRUNTIME_DIR");
        println!("cargo:rerun-if-env-changed=ORT_BRIDGE_SKIP_BUILD");

        let (source, lib_dir) = detect_runtime();
        let msg = format!("Using ONNX Runtime from {:?}", source);
        if env::var("ORT_WARN_DETECTED")
            .map(|v| v == "1")
            .unwrap_or(false)
        {
            println!("cargo:warning={}", msg);
        } else {
            eprintln!("info: {}", msg);
        }

        let manifest_dir = PathBuf::from(
            env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"),
        );
        let bridge_dir = manifest_dir.join("../ort_bridge");

        let mut cmake_config = cmake::Config::new(&bridge_dir);
        if let RuntimeSource::Directory(ref dir) = source {
            cmake_config.define("ONNXRUNTIME_DIR", dir);
        }

        let profile = env::var("PROFILE").unwrap_or_else(|_| "debug".to_string());
        let build_type = if profile == "release" {
            "Release"
        } else {
            "Debug"
        };
        cmake_config.define("CMAKE_BUILD_TYPE", build_type);
        cmake_config.always_configure(true);

        let dst = cmake_config.build();

        // Static bridge, dynamic runtime.
        println!("cargo:rustc-link-search=native={}/lib", dst.display());
        println!("cargo:rustc-link-lib=static=ort_bridge");

        if let Some(lib_dir) = lib_dir {
            println!("cargo:rustc-link-search=native={}", lib_dir.display());
            if cfg!(target_os = "linux") {
                println!("cargo:rustc-link-arg=-Wl,-rpath,{}", lib_dir.display());
            }
        }
        println!("cargo:rustc-link-lib=dylib=onnxruntime");
    }
}
