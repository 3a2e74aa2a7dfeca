//! Backend interface: the graphics capabilities the harness drives.
//!
//! # Invariants
//! - The harness only ever talks to a GPU through [`GraphicsBackend`] and
//!   [`RenderContext`]; nothing here knows about matrices or frame counters.
//! - Every fallible call reports failure through [`BackendError`]; a failed
//!   call has no partial effect the caller must undo.
//!
//! # Workaround
//! Ships a [`RecordingBackend`] that validates and records every call
//! without touching a GPU. Tests and the headless CLI run against it; a real
//! driver binding implements the same two traits.

mod context;
mod error;
mod recording;
mod types;

pub use context::{GraphicsBackend, RenderContext};
pub use error::BackendError;
pub use recording::{
    BackendCall, CallLog, CallStats, FailurePlan, RecordingBackend, RecordingContext,
    RecordingOptions,
};
pub use types::{
    AttribType, Capability, IndexData, IndexType, PrimitiveKind, ProgramHandle, ShaderForm,
    ShaderSource, ShaderStage, SurfaceConfig, SurfaceSize, TextureFormat, TextureHandle,
    TextureImage, VertexAttribute,
};

pub fn crate_info() -> &'static str {
    "spincube-backend v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("backend"));
    }
}
