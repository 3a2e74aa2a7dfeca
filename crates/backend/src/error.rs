use crate::types::{ShaderForm, ShaderStage};

/// Errors reported by a graphics backend.
///
/// Every variant is unrecoverable from the harness's point of view; there is
/// no transient/permanent distinction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("render context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("surface setup failed with status {status}")]
    SurfaceSetup { status: i32 },
    #[error("{stage} shader rejected: {reason}")]
    ShaderRejected { stage: ShaderStage, reason: String },
    #[error("{stage} shader given as {form}, which this backend does not accept")]
    UnsupportedShaderForm { stage: ShaderStage, form: ShaderForm },
    #[error("program link failed: {0}")]
    LinkFailed(String),
    #[error("attribute '{name}': {reason}")]
    Attribute { name: String, reason: String },
    #[error("texture upload failed: {0}")]
    TextureUpload(String),
    #[error("uniform '{name}': {reason}")]
    Uniform { name: String, reason: String },
    #[error("invalid handle {0}")]
    InvalidHandle(u32),
    #[error("draw failed with status {status}")]
    DrawFailed { status: i32 },
    #[error("frame flush failed with status {status}")]
    FlushFailed { status: i32 },
}

impl BackendError {
    /// Non-zero status code for this failure.
    ///
    /// Variants that carry a driver status return it unless it is zero;
    /// everything else is `-1`.
    pub fn status(&self) -> i32 {
        match self {
            BackendError::SurfaceSetup { status }
            | BackendError::DrawFailed { status }
            | BackendError::FlushFailed { status }
                if *status != 0 =>
            {
                *status
            }
            _ => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_passes_driver_code_through() {
        assert_eq!(BackendError::DrawFailed { status: -12 }.status(), -12);
        assert_eq!(BackendError::FlushFailed { status: 3 }.status(), 3);
        assert_eq!(BackendError::SurfaceSetup { status: 7 }.status(), 7);
    }

    #[test]
    fn status_is_never_zero() {
        assert_eq!(BackendError::DrawFailed { status: 0 }.status(), -1);
        assert_eq!(BackendError::LinkFailed("x".into()).status(), -1);
        assert_eq!(BackendError::ContextUnavailable("gone".into()).status(), -1);
    }

    #[test]
    fn messages_name_the_stage() {
        let err = BackendError::UnsupportedShaderForm {
            stage: ShaderStage::Fragment,
            form: ShaderForm::Binary,
        };
        assert_eq!(
            err.to_string(),
            "fragment shader given as compiled binary, which this backend does not accept"
        );
    }
}
