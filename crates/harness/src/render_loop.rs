use std::time::Instant;

use spincube_assets::{
    CUBE_INDICES, CUBE_POSITIONS, CUBE_TEXCOORDS, CUBE_VERTEX_COUNT, CompanionTexture, ShaderPair,
};
use spincube_backend::{
    AttribType, Capability, GraphicsBackend, IndexData, PrimitiveKind, ProgramHandle,
    RenderContext, ShaderForm, ShaderStage, SurfaceConfig, TextureHandle, VertexAttribute,
};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, SetupStage};
use crate::frame::{FrameMatrices, FrameState, fault_clear_color};
use crate::signal::{CancellationToken, FaultSignal, NoFault};
use crate::stats::{FrameTimer, RunSummary};

/// Lifecycle of a [`RenderLoop`].
///
/// `Failed` is terminal: a fatal error leaves the loop unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Initialized,
    ResourcesBound,
    Running,
    Finished,
    Failed,
}

/// Render target dimensions, fixed once queried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSurface {
    pub width: u32,
    pub height: u32,
}

impl RenderSurface {
    /// Height over width; scales the frustum's vertical extent.
    pub fn aspect(&self) -> f32 {
        self.height as f32 / self.width as f32
    }
}

/// A vertex attribute as bound during setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBinding {
    pub name: String,
    pub components: usize,
}

/// Everything bound once during setup and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneResources {
    pub program: ProgramHandle,
    pub shader_form: ShaderForm,
    pub position: AttributeBinding,
    pub texcoord: AttributeBinding,
    pub texture: TextureHandle,
    pub mvp_uniform: String,
}

/// Shader inputs on offer; the loop picks one the backend accepts.
#[derive(Debug, Clone)]
pub struct ShaderInputs {
    pub text: Option<ShaderPair>,
    pub binary: Option<ShaderPair>,
}

impl Default for ShaderInputs {
    fn default() -> Self {
        Self {
            text: Some(ShaderPair::builtin_text()),
            binary: None,
        }
    }
}

impl ShaderInputs {
    /// Binaries win when both are on offer and accepted.
    fn select(&self, accepts: impl Fn(ShaderForm) -> bool) -> Option<&ShaderPair> {
        let binary = self.binary.as_ref().filter(|_| accepts(ShaderForm::Binary));
        let text = self.text.as_ref().filter(|_| accepts(ShaderForm::Text));
        binary.or(text)
    }
}

/// Drives the spinning cube through a backend.
///
/// Setup runs once (`initialize`, then `bind_resources`); after that every
/// `render_frame` pushes a fresh model-view-projection matrix, draws, flushes
/// and presents. Any backend failure is fatal and moves the loop to
/// [`LoopState::Failed`].
pub struct RenderLoop<B: GraphicsBackend, F: FaultSignal = NoFault> {
    backend: B,
    config: HarnessConfig,
    shaders: ShaderInputs,
    texture: CompanionTexture,
    fault: F,
    state: LoopState,
    context: Option<B::Context>,
    surface: Option<RenderSurface>,
    resources: Option<SceneResources>,
    frame: FrameState,
    timer: FrameTimer,
    frames_presented: u64,
}

impl<B: GraphicsBackend> RenderLoop<B, NoFault> {
    pub fn new(backend: B, config: HarnessConfig) -> Self {
        let frame = FrameState::new(config.wrap_bound, config.angle_step);
        let timer = FrameTimer::new(config.timer_capacity);
        Self {
            backend,
            config,
            shaders: ShaderInputs::default(),
            texture: CompanionTexture::new(),
            fault: NoFault,
            state: LoopState::Uninitialized,
            context: None,
            surface: None,
            resources: None,
            frame,
            timer,
            frames_presented: 0,
        }
    }
}

impl<B: GraphicsBackend, F: FaultSignal> RenderLoop<B, F> {
    /// Install a fault signal; while it reports a fault the clear colour pulses.
    pub fn with_fault_signal<G: FaultSignal>(self, fault: G) -> RenderLoop<B, G> {
        RenderLoop {
            backend: self.backend,
            config: self.config,
            shaders: self.shaders,
            texture: self.texture,
            fault,
            state: self.state,
            context: self.context,
            surface: self.surface,
            resources: self.resources,
            frame: self.frame,
            timer: self.timer,
            frames_presented: self.frames_presented,
        }
    }

    pub fn with_shaders(mut self, shaders: ShaderInputs) -> Self {
        self.shaders = shaders;
        self
    }

    pub fn with_texture(mut self, texture: CompanionTexture) -> Self {
        self.texture = texture;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn surface(&self) -> Option<RenderSurface> {
        self.surface
    }

    pub fn resources(&self) -> Option<&SceneResources> {
        self.resources.as_ref()
    }

    pub fn frame_state(&self) -> &FrameState {
        &self.frame
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn context(&self) -> Option<&B::Context> {
        self.context.as_ref()
    }

    fn expect_state(&self, expected: LoopState) -> Result<(), HarnessError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(HarnessError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn fail(&mut self, err: HarnessError) -> HarnessError {
        tracing::error!(error = %err, state = ?self.state, "render loop aborted");
        self.state = LoopState::Failed;
        err
    }

    /// `Uninitialized -> Initialized`: check the config, acquire a context
    /// and size the surface. An invalid config fails before the backend is
    /// touched.
    pub fn initialize(&mut self) -> Result<RenderSurface, HarnessError> {
        self.expect_state(LoopState::Uninitialized)?;
        self.try_initialize().map_err(|e| self.fail(e))
    }

    fn try_initialize(&mut self) -> Result<RenderSurface, HarnessError> {
        self.config.validate()?;
        let mut ctx = self
            .backend
            .init()
            .map_err(HarnessError::setup(SetupStage::Init))?;

        ctx.setup_surface(&SurfaceConfig {
            width: self.config.surface_width,
            height: self.config.surface_height,
            clear_color: self.config.clear_color,
        })
        .map_err(HarnessError::setup(SetupStage::Surface))?;

        let size = ctx.surface_size();
        if size.width == 0 || size.height == 0 {
            return Err(HarnessError::EmptySurface {
                width: size.width,
                height: size.height,
            });
        }
        let surface = RenderSurface {
            width: size.width,
            height: size.height,
        };
        tracing::info!(
            width = surface.width,
            height = surface.height,
            aspect = surface.aspect(),
            "render context acquired"
        );

        self.context = Some(ctx);
        self.surface = Some(surface);
        self.state = LoopState::Initialized;
        Ok(surface)
    }

    /// `Initialized -> ResourcesBound`: fixed-function state, program,
    /// attributes and texture.
    pub fn bind_resources(&mut self) -> Result<&SceneResources, HarnessError> {
        self.expect_state(LoopState::Initialized)?;
        match self.try_bind_resources() {
            Ok(resources) => {
                self.state = LoopState::ResourcesBound;
                let resources: &SceneResources = self.resources.insert(resources);
                Ok(resources)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn try_bind_resources(&mut self) -> Result<SceneResources, HarnessError> {
        let ctx = self
            .context
            .as_mut()
            .ok_or(HarnessError::InvalidState {
                expected: LoopState::Initialized,
                actual: self.state,
            })?;
        let names = &self.config.names;

        ctx.enable(Capability::DepthTest);
        ctx.enable(Capability::CullFace);
        ctx.set_depth_write(true);

        let shaders = self
            .shaders
            .select(|form| ctx.accepts_shader_form(form))
            .ok_or(HarnessError::NoUsableShaders)?;

        let program = ctx
            .create_program()
            .map_err(HarnessError::setup(SetupStage::Program))?;
        ctx.attach_shader(program, ShaderStage::Vertex, &shaders.vertex)
            .map_err(HarnessError::setup(SetupStage::VertexShader))?;
        ctx.attach_shader(program, ShaderStage::Fragment, &shaders.fragment)
            .map_err(HarnessError::setup(SetupStage::FragmentShader))?;
        ctx.link(program)
            .map_err(HarnessError::setup(SetupStage::Link))?;
        let shader_form = shaders.vertex.form();
        tracing::debug!(?program, form = %shader_form, "program linked");

        let position = AttributeBinding {
            name: names.position_attribute.clone(),
            components: 3,
        };
        let texcoord = AttributeBinding {
            name: names.texcoord_attribute.clone(),
            components: 2,
        };
        for (binding, data) in [
            (&position, &CUBE_POSITIONS[..]),
            (&texcoord, &CUBE_TEXCOORDS[..]),
        ] {
            ctx.bind_attribute(&VertexAttribute {
                name: &binding.name,
                element: AttribType::Float,
                components: binding.components,
                stride: 0,
                vertex_count: CUBE_VERTEX_COUNT,
                data,
            })
            .map_err(HarnessError::setup(SetupStage::Attributes))?;
            tracing::debug!(name = %binding.name, components = binding.components, "attribute bound");
        }

        let texture = ctx
            .upload_texture(&self.texture.as_image())
            .map_err(HarnessError::setup(SetupStage::Texture))?;
        ctx.bind_texture(&names.texture_uniform, texture)
            .map_err(HarnessError::setup(SetupStage::Texture))?;
        tracing::debug!(?texture, uniform = %names.texture_uniform, "texture bound");

        tracing::info!(?program, ?texture, form = %shader_form, "scene resources bound");
        Ok(SceneResources {
            program,
            shader_form,
            position,
            texcoord,
            texture,
            mvp_uniform: names.mvp_uniform.clone(),
        })
    }

    /// Run one iteration of the frame cycle.
    ///
    /// A draw or flush failure returns immediately: nothing further is
    /// submitted for that frame and the loop is left `Failed`.
    pub fn render_frame(&mut self) -> Result<(), HarnessError> {
        if self.state == LoopState::ResourcesBound {
            self.state = LoopState::Running;
        }
        self.expect_state(LoopState::Running)?;
        self.try_render_frame().map_err(|e| self.fail(e))
    }

    fn try_render_frame(&mut self) -> Result<(), HarnessError> {
        let started = Instant::now();
        let aspect = self.surface.map(|s| s.aspect()).unwrap_or(1.0);
        let (Some(ctx), Some(resources)) = (self.context.as_mut(), self.resources.as_ref()) else {
            return Err(HarnessError::InvalidState {
                expected: LoopState::Running,
                actual: self.state,
            });
        };

        if self.fault.fault_detected() {
            ctx.set_clear_color(fault_clear_color(self.frame.counter()));
        }

        let counter = self.frame.advance();
        let angle = self.frame.angle();
        let matrices = FrameMatrices::build(&self.config, angle, aspect)?;
        let mvp = matrices.model_view_projection.as_slice();

        let frame_error = |source| HarnessError::Frame {
            frame: counter,
            source,
        };
        ctx.set_uniform(&resources.mvp_uniform, mvp.len(), mvp)
            .map_err(frame_error)?;

        ctx.begin_frame();
        ctx.draw_indexed(PrimitiveKind::Triangles, IndexData::U8(&CUBE_INDICES))
            .map_err(frame_error)?;
        ctx.flush_frame().map_err(frame_error)?;
        ctx.present();

        self.frames_presented += 1;
        let elapsed = started.elapsed();
        self.timer.record(elapsed);
        tracing::trace!(counter, angle, ?elapsed, "frame presented");

        let interval = self.config.log_interval;
        if interval > 0 && self.frames_presented % interval == 0 {
            tracing::info!(
                frames = self.frames_presented,
                counter,
                avg_frame = ?self.timer.average(),
                max_frame = ?self.timer.max(),
                p95_frame = ?self.timer.percentile(0.95),
                "render progress"
            );
        }
        Ok(())
    }

    /// Set up if needed, then render until `cancel` trips.
    ///
    /// With [`CancellationToken::never`] this only returns on failure. A
    /// cancelled run shuts the context down and ends `Finished`.
    pub fn run(&mut self, cancel: &CancellationToken) -> Result<RunSummary, HarnessError> {
        if self.state == LoopState::Uninitialized {
            self.initialize()?;
        }
        if self.state == LoopState::Initialized {
            self.bind_resources()?;
        }

        loop {
            let _span = tracing::trace_span!("frame", counter = self.frame.counter()).entered();
            self.render_frame()?;
            if cancel.frame_boundary() {
                break;
            }
        }

        let summary = self.summary();
        self.finish();
        tracing::info!(
            frames = summary.frames_presented,
            avg_frame = ?summary.average_frame_time,
            p95_frame = ?summary.p95_frame_time,
            "render loop finished"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames_presented: self.frames_presented,
            final_counter: self.frame.counter(),
            average_frame_time: self.timer.average(),
            max_frame_time: self.timer.max(),
            p95_frame_time: self.timer.percentile(0.95),
        }
    }

    /// Release the backend context. Only reachable once a run is cancelled.
    pub fn finish(&mut self) {
        if let Some(ctx) = self.context.take() {
            ctx.shutdown();
        }
        self.state = LoopState::Finished;
    }
}
