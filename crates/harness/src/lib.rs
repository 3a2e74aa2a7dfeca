//! Render harness: drives a textured, tumbling cube through a graphics
//! backend to exercise shader, attribute, texture, uniform, draw and present
//! paths under sustained load.
//!
//! # Invariants
//! - Setup happens exactly once, in order; any backend failure is fatal.
//! - Each frame builds fresh matrices; nothing is carried over except the
//!   frame counter.
//! - A failed draw or flush ends the run before anything else is submitted.
//! - The loop is unbounded unless a [`CancellationToken`] trips; only then is
//!   the context shut down.

mod config;
mod error;
mod frame;
mod render_loop;
mod signal;
mod stats;

pub use config::{BindingNames, ConfigError, DEFAULT_WRAP_BOUND, HarnessConfig};
pub use error::{HarnessError, SetupStage};
pub use frame::{FAULT_BASE, FrameMatrices, FrameState, fault_brightness, fault_clear_color};
pub use render_loop::{
    AttributeBinding, LoopState, RenderLoop, RenderSurface, SceneResources, ShaderInputs,
};
pub use signal::{CancellationToken, FaultFlag, FaultSignal, NoFault};
pub use stats::{FrameTimer, RunSummary};

pub fn crate_info() -> &'static str {
    "spincube-harness v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("harness"));
    }
}
