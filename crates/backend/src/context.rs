use crate::error::BackendError;
use crate::types::{
    Capability, IndexData, PrimitiveKind, ProgramHandle, ShaderForm, ShaderSource, ShaderStage,
    SurfaceConfig, SurfaceSize, TextureHandle, TextureImage, VertexAttribute,
};

/// Entry point into a graphics backend. Acquiring a context is the only thing
/// that can happen before one exists.
pub trait GraphicsBackend {
    /// The live render context produced by [`GraphicsBackend::init`].
    type Context: RenderContext;

    /// Acquire a render context.
    fn init(&mut self) -> Result<Self::Context, BackendError>;
}

/// Operations on an acquired render context.
///
/// Call order matters: resources are bound once, then each frame is
/// `begin_frame`, `draw_indexed`, `flush_frame`, `present`. `flush_frame` and
/// `present` may block until the backend has consumed earlier work.
pub trait RenderContext {
    /// Whether shaders may be handed over in the given form.
    fn accepts_shader_form(&self, form: ShaderForm) -> bool;

    /// Configure the render target and its clear value.
    fn setup_surface(&mut self, config: &SurfaceConfig) -> Result<(), BackendError>;

    fn surface_size(&self) -> SurfaceSize;

    /// Replace the clear colour used from the next frame on.
    fn set_clear_color(&mut self, argb: u32);

    fn enable(&mut self, capability: Capability);

    fn set_depth_write(&mut self, enabled: bool);

    fn create_program(&mut self) -> Result<ProgramHandle, BackendError>;

    fn attach_shader(
        &mut self,
        program: ProgramHandle,
        stage: ShaderStage,
        source: &ShaderSource,
    ) -> Result<(), BackendError>;

    fn link(&mut self, program: ProgramHandle) -> Result<(), BackendError>;

    fn bind_attribute(&mut self, attribute: &VertexAttribute<'_>) -> Result<(), BackendError>;

    fn upload_texture(&mut self, image: &TextureImage<'_>) -> Result<TextureHandle, BackendError>;

    /// Bind a texture to a sampler uniform of the linked program.
    fn bind_texture(&mut self, uniform: &str, texture: TextureHandle) -> Result<(), BackendError>;

    /// Set a float uniform of `components` values.
    fn set_uniform(&mut self, name: &str, components: usize, data: &[f32])
    -> Result<(), BackendError>;

    fn begin_frame(&mut self);

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveKind,
        indices: IndexData<'_>,
    ) -> Result<(), BackendError>;

    /// Block until all submitted work for the frame is complete.
    fn flush_frame(&mut self) -> Result<(), BackendError>;

    /// Make the most recently flushed buffer visible.
    fn present(&mut self);

    /// Release the context and everything bound to it.
    fn shutdown(self)
    where
        Self: Sized;
}
