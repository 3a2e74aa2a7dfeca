//! Harness assets: the fixed cube mesh, its companion texture and shaders.
//!
//! The backend consumes these by slice; nothing here is ever mutated after
//! construction.
//!
//! # Layout
//! - `cube`: 24 vertices (4 per face) with positions and texture coordinates,
//!   36 `u8` indices, counter-clockwise front faces.
//! - `texture`: a procedurally generated RGBA8 image.
//! - `shaders`: built-in GLSL ES sources, or precompiled binaries from disk.

mod cube;
mod shaders;
mod texture;

pub use cube::{CUBE_INDEX_COUNT, CUBE_INDICES, CUBE_POSITIONS, CUBE_TEXCOORDS, CUBE_VERTEX_COUNT};
pub use shaders::{AssetError, FRAGMENT_SHADER_SOURCE, ShaderPair, VERTEX_SHADER_SOURCE};
pub use texture::CompanionTexture;

pub fn crate_info() -> &'static str {
    "spincube-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }
}
