use std::fmt;

use crate::resources::ElementType;

/// Result of a graphics API call.
pub type GpuResult<T> = Result<T, GpuError>;

/// Failure reported by a [`GraphicsApi`](super::GraphicsApi) call.
///
/// Every call either succeeds or returns one of these; nothing is logged and
/// swallowed inside a backend. Use [`ErrorPolicy`] to decide what a failed
/// frame means for the application.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuError {
    /// The driver rejected a call (captured from a validation error scope).
    Driver { call: &'static str, message: String },

    /// A shader program failed to compile or validate.
    ShaderCompile { label: String, message: String },

    /// A draw was issued without a required binding.
    MissingBinding(&'static str),

    /// A draw asked for more indices than the bound index buffer holds.
    IndexCountOutOfRange { requested: u32, available: u32 },

    /// No GPU vertex format exists for this element type / component count.
    UnsupportedVertexFormat { ty: ElementType, count: u32, normalized: bool },

    /// A uniform was written with a value of the wrong type.
    UniformTypeMismatch { name: &'static str },

    /// Texture unit is outside `0..MAX_TEXTURE_UNITS`.
    TextureUnitOutOfRange { unit: u32, max: u32 },

    /// Pixel data does not match `width * height * 4` bytes.
    InvalidTextureData { expected: usize, actual: usize },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver { call, message } => write!(f, "gpu call `{call}` failed: {message}"),
            Self::ShaderCompile { label, message } => {
                write!(f, "shader `{label}` failed to compile: {message}")
            }
            Self::MissingBinding(what) => write!(f, "draw issued without a bound {what}"),
            Self::IndexCountOutOfRange { requested, available } => write!(
                f,
                "draw requested {requested} indices but the bound index buffer holds {available}"
            ),
            Self::UnsupportedVertexFormat { ty, count, normalized } => write!(
                f,
                "no vertex format for {count} x {ty:?} (normalized: {normalized})"
            ),
            Self::UniformTypeMismatch { name } => {
                write!(f, "uniform `{name}` written with a value of the wrong type")
            }
            Self::TextureUnitOutOfRange { unit, max } => {
                write!(f, "texture unit {unit} out of range (max {max})")
            }
            Self::InvalidTextureData { expected, actual } => {
                write!(f, "texture data is {actual} bytes, expected {expected}")
            }
        }
    }
}

impl std::error::Error for GpuError {}

/// What to do with a failed GPU call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorPolicy {
    /// Log the error and keep running.
    LogAndContinue,
    /// Hand the error back to the caller.
    Abort,
}

impl ErrorPolicy {
    /// `LogAndContinue` in debug builds, `Abort` in release builds.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::LogAndContinue
        } else {
            Self::Abort
        }
    }

    /// Applies the policy to a call result.
    ///
    /// Returns `Ok(None)` when an error was logged and dropped.
    pub fn resolve<T>(self, result: GpuResult<T>) -> GpuResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => match self {
                Self::LogAndContinue => {
                    log::error!("{err}");
                    Ok(None)
                }
                Self::Abort => Err(err),
            },
        }
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::for_build()
    }
}
