use spincube_math::{MathError, Matrix4x4};

use crate::config::HarnessConfig;

/// Lowest brightness of the fault-mode clear colour.
pub const FAULT_BASE: u32 = 0x40;
const FAULT_SPAN: u32 = 255 - FAULT_BASE;

/// Clear colour shown while a fault is signalled.
///
/// A triangle wave over the frame counter in the blue channel, between
/// [`FAULT_BASE`] and `0xFF`, on an opaque black background.
pub fn fault_clear_color(counter: u32) -> u32 {
    0xFF00_0000 | fault_brightness(counter)
}

pub fn fault_brightness(counter: u32) -> u32 {
    let phase = counter % (2 * FAULT_SPAN);
    FAULT_BASE + phase.abs_diff(FAULT_SPAN)
}

/// Frame counter and the rotation angle derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    counter: u32,
    wrap_bound: u32,
    angle_step: f32,
}

impl FrameState {
    pub fn new(wrap_bound: u32, angle_step: f32) -> Self {
        Self {
            counter: 0,
            wrap_bound,
            angle_step,
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Base rotation angle in degrees for the current counter.
    pub fn angle(&self) -> f32 {
        self.angle_step * self.counter as f32
    }

    /// Step the counter, wrapping to zero at the bound. Returns the new value.
    pub fn advance(&mut self) -> u32 {
        self.counter += 1;
        if self.counter >= self.wrap_bound {
            self.counter = 0;
        }
        self.counter
    }
}

/// The three matrices built for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub model_view: Matrix4x4,
    pub projection: Matrix4x4,
    pub model_view_projection: Matrix4x4,
}

impl FrameMatrices {
    /// Build the tumbling-cube transforms for base angle `angle`.
    ///
    /// `aspect` is surface height over width; it scales the frustum's
    /// vertical extent.
    pub fn build(config: &HarnessConfig, angle: f32, aspect: f32) -> Result<Self, MathError> {
        let [rx, ry, rz] = config.axis_rates;

        let mut model_view = Matrix4x4::identity();
        model_view
            .translate(0.0, 0.0, -config.camera_distance)
            .rotate(angle * rx, 1.0, 0.0, 0.0)
            .rotate(angle * ry, 0.0, 1.0, 0.0)
            .rotate(angle * rz, 0.0, 0.0, 1.0);

        let mut projection = Matrix4x4::identity();
        projection.frustum(-1.0, 1.0, -aspect, aspect, config.near, config.far)?;

        let model_view_projection = Matrix4x4::multiply(&model_view, &projection);
        Ok(Self {
            model_view,
            projection,
            model_view_projection,
        })
    }
}
