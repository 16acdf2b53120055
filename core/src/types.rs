//! Engine enumerations and their raw values.

use serde::Deserialize;
use std::fmt;

use crate::engine::ffi::{
    ONNXTensorElementDataType, OrtAllocatorType, OrtErrorCode, OrtLoggingLevel, OrtMemType,
};

/// Severity threshold for the engine's own logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Verbose,
    Info,
    #[default]
    Warning,
    Error,
    Fatal,
}

impl LoggingLevel {
    /// Raw `OrtLoggingLevel` value.
    pub fn to_raw(self) -> OrtLoggingLevel {
        match self {
            Self::Verbose => 0,
            Self::Info => 1,
            Self::Warning => 2,
            Self::Error => 3,
            Self::Fatal => 4,
        }
    }
}

/// Allocator kind behind a memory info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocatorType {
    Invalid,
    Device,
    #[default]
    Arena,
}

impl AllocatorType {
    /// Raw `OrtAllocatorType` value.
    pub fn to_raw(self) -> OrtAllocatorType {
        match self {
            Self::Invalid => -1,
            Self::Device => 0,
            Self::Arena => 1,
        }
    }
}

/// Memory kind of a memory info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemType {
    /// Input on CPU, used by non-CPU execution providers.
    CpuInput,
    /// Output on CPU, used by non-CPU execution providers.
    #[serde(alias = "cpu")]
    CpuOutput,
    #[default]
    Default,
}

impl MemType {
    /// CPU-accessible memory; same raw value as [`MemType::CpuOutput`].
    pub const CPU: MemType = MemType::CpuOutput;

    /// Raw `OrtMemType` value.
    pub fn to_raw(self) -> OrtMemType {
        match self {
            Self::CpuInput => -2,
            Self::CpuOutput => -1,
            Self::Default => 0,
        }
    }
}

/// Error code carried by a failed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Ok,
    Fail,
    InvalidArgument,
    NoSuchFile,
    NoModel,
    EngineError,
    RuntimeException,
    InvalidProtobuf,
    ModelLoaded,
    NotImplemented,
    InvalidGraph,
    EpFail,
    /// A code newer than this crate.
    Unknown(u32),
}

impl ErrorCode {
    /// Map a raw `OrtErrorCode`. Unlisted codes are kept as [`ErrorCode::Unknown`].
    pub fn from_raw(raw: OrtErrorCode) -> Self {
        match raw {
            0 => Self::Ok,
            1 => Self::Fail,
            2 => Self::InvalidArgument,
            3 => Self::NoSuchFile,
            4 => Self::NoModel,
            5 => Self::EngineError,
            6 => Self::RuntimeException,
            7 => Self::InvalidProtobuf,
            8 => Self::ModelLoaded,
            9 => Self::NotImplemented,
            10 => Self::InvalidGraph,
            11 => Self::EpFail,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::Fail => "FAIL",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NoSuchFile => "NO_SUCHFILE",
            Self::NoModel => "NO_MODEL",
            Self::EngineError => "ENGINE_ERROR",
            Self::RuntimeException => "RUNTIME_EXCEPTION",
            Self::InvalidProtobuf => "INVALID_PROTOBUF",
            Self::ModelLoaded => "MODEL_LOADED",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::InvalidGraph => "INVALID_GRAPH",
            Self::EpFail => "EP_FAIL",
            Self::Unknown(raw) => return write!(f, "UNKNOWN({})", raw),
        };
        f.write_str(name)
    }
}

/// Element data type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Undefined,
    Float,
    Uint8,
    Int8,
    Uint16,
    Int16,
    Int32,
    Int64,
    String,
    Bool,
    Float16,
    Double,
    Uint32,
    Uint64,
    Complex64,
    Complex128,
    BFloat16,
    Float8E4M3FN,
    Float8E4M3FNUZ,
    Float8E5M2,
    Float8E5M2FNUZ,
    Uint4,
    Int4,
}

impl ElementType {
    /// Map a raw `ONNXTensorElementDataType`. Returns `None` for values this
    /// crate does not know.
    pub fn from_raw(raw: ONNXTensorElementDataType) -> Option<Self> {
        let ty = match raw {
            0 => Self::Undefined,
            1 => Self::Float,
            2 => Self::Uint8,
            3 => Self::Int8,
            4 => Self::Uint16,
            5 => Self::Int16,
            6 => Self::Int32,
            7 => Self::Int64,
            8 => Self::String,
            9 => Self::Bool,
            10 => Self::Float16,
            11 => Self::Double,
            12 => Self::Uint32,
            13 => Self::Uint64,
            14 => Self::Complex64,
            15 => Self::Complex128,
            16 => Self::BFloat16,
            17 => Self::Float8E4M3FN,
            18 => Self::Float8E4M3FNUZ,
            19 => Self::Float8E5M2,
            20 => Self::Float8E5M2FNUZ,
            21 => Self::Uint4,
            22 => Self::Int4,
            _ => return None,
        };
        Some(ty)
    }

    /// Raw `ONNXTensorElementDataType` value.
    pub fn to_raw(self) -> ONNXTensorElementDataType {
        match self {
            Self::Undefined => 0,
            Self::Float => 1,
            Self::Uint8 => 2,
            Self::Int8 => 3,
            Self::Uint16 => 4,
            Self::Int16 => 5,
            Self::Int32 => 6,
            Self::Int64 => 7,
            Self::String => 8,
            Self::Bool => 9,
            Self::Float16 => 10,
            Self::Double => 11,
            Self::Uint32 => 12,
            Self::Uint64 => 13,
            Self::Complex64 => 14,
            Self::Complex128 => 15,
            Self::BFloat16 => 16,
            Self::Float8E4M3FN => 17,
            Self::Float8E4M3FNUZ => 18,
            Self::Float8E5M2 => 19,
            Self::Float8E5M2FNUZ => 20,
            Self::Uint4 => 21,
            Self::Int4 => 22,
        }
    }

    /// Storage width of one element in bits.
    ///
    /// `Undefined` and `String` have no fixed-width storage and report 0.
    pub fn bit_width(self) -> usize {
        match self {
            Self::Undefined | Self::String => 0,
            Self::Uint4 | Self::Int4 => 4,
            Self::Uint8
            | Self::Int8
            | Self::Bool
            | Self::Float8E4M3FN
            | Self::Float8E4M3FNUZ
            | Self::Float8E5M2
            | Self::Float8E5M2FNUZ => 8,
            Self::Uint16 | Self::Int16 | Self::Float16 | Self::BFloat16 => 16,
            Self::Float | Self::Int32 | Self::Uint32 => 32,
            Self::Int64 | Self::Uint64 | Self::Double | Self::Complex64 => 64,
            Self::Complex128 => 128,
        }
    }

    /// Bytes needed to store `count` elements. Sub-byte types are packed.
    ///
    /// Returns `None` on overflow.
    pub fn bytes_for(self, count: usize) -> Option<usize> {
        Some(count.checked_mul(self.bit_width())?.div_ceil(8))
    }

    /// Lowercase name, as used by ONNX.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Float => "float",
            Self::Uint8 => "uint8",
            Self::Int8 => "int8",
            Self::Uint16 => "uint16",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Float16 => "float16",
            Self::Double => "double",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::BFloat16 => "bfloat16",
            Self::Float8E4M3FN => "float8e4m3fn",
            Self::Float8E4M3FNUZ => "float8e4m3fnuz",
            Self::Float8E5M2 => "float8e5m2",
            Self::Float8E5M2FNUZ => "float8e5m2fnuz",
            Self::Uint4 => "uint4",
            Self::Int4 => "int4",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
