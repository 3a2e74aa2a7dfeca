//! Transform math: 4x4 matrices for model-view and projection construction.
//!
//! # Invariants
//! - Row-vector convention throughout: a point `v` transforms as `v * M`, and
//!   the translation lives in row 3.
//! - `translate`, `rotate`, `scale`, `frustum`, `perspective` and `ortho` all
//!   pre-multiply (`M = X * M`), so `multiply(a, b)` composes "a, then b".
//! - The 16-float memory layout is the one uploaded to the shader uniform.

mod matrix;

pub use matrix::{MathError, Matrix4x4};

pub fn crate_info() -> &'static str {
    "spincube-math v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("math"));
    }
}
