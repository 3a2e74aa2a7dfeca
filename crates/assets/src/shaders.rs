use std::fs;
use std::path::{Path, PathBuf};

use spincube_backend::{ShaderForm, ShaderSource};

/// Errors from loading shader assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader binary {0} is empty")]
    EmptyBinary(PathBuf),
}

pub const VERTEX_SHADER_SOURCE: &str = "\
uniform mat4 modelviewprojectionMatrix;

attribute vec4 in_position;
attribute vec2 in_coord;

varying vec2 coord;

void main()
{
    gl_Position = modelviewprojectionMatrix * in_position;
    coord = in_coord;
}
";

pub const FRAGMENT_SHADER_SOURCE: &str = "\
precision mediump float;

varying vec2 coord;

uniform sampler2D in_texture;

void main()
{
    gl_FragColor = texture2D(in_texture, coord);
}
";

/// Vertex and fragment inputs for the cube program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPair {
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
}

impl ShaderPair {
    /// The built-in GLSL ES sources.
    pub fn builtin_text() -> Self {
        Self {
            vertex: ShaderSource::Text(VERTEX_SHADER_SOURCE.to_owned()),
            fragment: ShaderSource::Text(FRAGMENT_SHADER_SOURCE.to_owned()),
        }
    }

    /// Precompiled binaries produced by a driver's offline compiler.
    pub fn load_binaries(vertex: &Path, fragment: &Path) -> Result<Self, AssetError> {
        Ok(Self {
            vertex: ShaderSource::Binary(read_binary(vertex)?),
            fragment: ShaderSource::Binary(read_binary(fragment)?),
        })
    }

    /// The form both stages share, if they agree.
    pub fn form(&self) -> Option<ShaderForm> {
        let form = self.vertex.form();
        (form == self.fragment.form()).then_some(form)
    }
}

fn read_binary(path: &Path) -> Result<Vec<u8>, AssetError> {
    let bytes = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(AssetError::EmptyBinary(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), len = bytes.len(), "loaded shader binary");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_sources_declare_harness_names() {
        let pair = ShaderPair::builtin_text();
        assert_eq!(pair.form(), Some(ShaderForm::Text));
        for name in ["modelviewprojectionMatrix", "in_position", "in_coord"] {
            assert!(VERTEX_SHADER_SOURCE.contains(name));
        }
        assert!(FRAGMENT_SHADER_SOURCE.contains("in_texture"));
    }

    #[test]
    fn binaries_load_from_disk() {
        let mut vs = tempfile::NamedTempFile::new().unwrap();
        let mut fs = tempfile::NamedTempFile::new().unwrap();
        vs.write_all(&[0x4D, 0x42, 0x53, 0x31]).unwrap();
        fs.write_all(&[0x4D, 0x42, 0x53, 0x32, 0x00]).unwrap();

        let pair = ShaderPair::load_binaries(vs.path(), fs.path()).unwrap();
        assert_eq!(pair.form(), Some(ShaderForm::Binary));
        assert_eq!(pair.vertex.len(), 4);
        assert_eq!(pair.fragment.len(), 5);
    }

    #[test]
    fn empty_or_missing_binary_is_an_error() {
        let empty = tempfile::NamedTempFile::new().unwrap();
        let err = ShaderPair::load_binaries(empty.path(), empty.path()).unwrap_err();
        assert!(matches!(err, AssetError::EmptyBinary(_)));

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        let err = ShaderPair::load_binaries(&missing, &missing).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn mixed_forms_have_no_common_form() {
        let pair = ShaderPair {
            vertex: ShaderSource::Text(VERTEX_SHADER_SOURCE.into()),
            fragment: ShaderSource::Binary(vec![1]),
        };
        assert_eq!(pair.form(), None);
    }
}
