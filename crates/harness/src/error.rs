use std::fmt;

use spincube_backend::BackendError;
use spincube_math::MathError;

use crate::config::ConfigError;
use crate::render_loop::LoopState;

/// The setup step a fatal backend error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    Init,
    Surface,
    Program,
    VertexShader,
    FragmentShader,
    Link,
    Attributes,
    Texture,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SetupStage::Init => "context acquisition",
            SetupStage::Surface => "surface setup",
            SetupStage::Program => "program creation",
            SetupStage::VertexShader => "vertex shader attach",
            SetupStage::FragmentShader => "fragment shader attach",
            SetupStage::Link => "program link",
            SetupStage::Attributes => "attribute binding",
            SetupStage::Texture => "texture binding",
        };
        f.write_str(s)
    }
}

/// Every way a harness run can end other than cancellation.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("setup failed during {stage}: {source}")]
    Setup {
        stage: SetupStage,
        #[source]
        source: BackendError,
    },
    #[error("frame {frame} failed: {source}")]
    Frame {
        frame: u32,
        #[source]
        source: BackendError,
    },
    #[error("render surface is {width}x{height}")]
    EmptySurface { width: u32, height: u32 },
    #[error("backend accepts none of the available shader forms")]
    NoUsableShaders,
    #[error(transparent)]
    Math(#[from] MathError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("render loop is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: LoopState,
        actual: LoopState,
    },
}

impl HarnessError {
    pub(crate) fn setup(stage: SetupStage) -> impl FnOnce(BackendError) -> Self {
        move |source| HarnessError::Setup { stage, source }
    }

    /// Non-zero process status for this failure.
    ///
    /// Backend failures pass the driver status through; harness-side
    /// failures use small positive codes.
    pub fn exit_code(&self) -> i32 {
        match self {
            HarnessError::Setup { source, .. } | HarnessError::Frame { source, .. } => {
                source.status()
            }
            HarnessError::EmptySurface { .. } | HarnessError::NoUsableShaders => 2,
            HarnessError::Math(_) | HarnessError::Config(_) => 3,
            HarnessError::InvalidState { .. } => 4,
        }
    }

    /// Whether the failure happened while acquiring or binding resources.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            HarnessError::Setup { .. }
                | HarnessError::EmptySurface { .. }
                | HarnessError::NoUsableShaders
        )
    }
}
