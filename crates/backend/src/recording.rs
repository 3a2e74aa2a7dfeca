use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::context::{GraphicsBackend, RenderContext};
use crate::error::BackendError;
use crate::types::{
    AttribType, Capability, IndexData, IndexType, PrimitiveKind, ProgramHandle, ShaderForm, ShaderSource,
    ShaderStage, SurfaceConfig, SurfaceSize, TextureFormat, TextureHandle, TextureImage,
    VertexAttribute,
};

/// One call made against a [`RecordingBackend`], in issue order.
///
/// Calls are recorded before they are validated, so a call that failed still
/// shows up in the log.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Init,
    SetupSurface(SurfaceConfig),
    SurfaceSize,
    SetClearColor(u32),
    Enable(Capability),
    SetDepthWrite(bool),
    CreateProgram,
    AttachShader {
        program: ProgramHandle,
        stage: ShaderStage,
        form: ShaderForm,
    },
    Link(ProgramHandle),
    BindAttribute {
        name: String,
        element: AttribType,
        components: usize,
        vertex_count: usize,
    },
    UploadTexture {
        width: u32,
        height: u32,
        format: TextureFormat,
        mipmaps: bool,
    },
    BindTexture {
        uniform: String,
        texture: TextureHandle,
    },
    SetUniform {
        name: String,
        components: usize,
        data: Vec<f32>,
    },
    BeginFrame,
    DrawIndexed {
        primitive: PrimitiveKind,
        count: usize,
        index_type: IndexType,
    },
    FlushFrame,
    Present,
    Shutdown,
}

/// Counters kept whether or not individual calls are recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub frames_begun: u64,
    pub draws: u64,
    pub flushes: u64,
    pub presents: u64,
    pub uniform_updates: u64,
}

#[derive(Debug, Default)]
struct LogInner {
    record: bool,
    calls: Vec<BackendCall>,
    stats: CallStats,
}

/// Shared handle onto the call log of a recording backend and its contexts.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<LogInner>>);

impl CallLog {
    fn new(record: bool) -> Self {
        Self(Rc::new(RefCell::new(LogInner {
            record,
            ..LogInner::default()
        })))
    }

    fn push(&self, call: BackendCall) {
        let mut inner = self.0.borrow_mut();
        if inner.record {
            inner.calls.push(call);
        }
    }

    fn bump(&self, f: impl FnOnce(&mut CallStats)) {
        f(&mut self.0.borrow_mut().stats);
    }

    /// Snapshot of recorded calls.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.0.borrow().calls.clone()
    }

    pub fn stats(&self) -> CallStats {
        self.0.borrow().stats
    }

    pub fn len(&self) -> usize {
        self.0.borrow().calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.0.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn last(&self) -> Option<BackendCall> {
        self.0.borrow().calls.last().cloned()
    }
}

/// Scripted failures for exercising the harness's error paths.
///
/// Draw and flush positions are 1-based over the life of the context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailurePlan {
    pub init: bool,
    pub surface_setup: Option<i32>,
    pub link: bool,
    pub draw_at: Option<u64>,
    pub flush_at: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RecordingOptions {
    /// Size reported for a native-size surface.
    pub native_size: SurfaceSize,
    pub accepts_text: bool,
    pub accepts_binary: bool,
    /// Keep every call in the log. Counters are kept either way.
    pub record_calls: bool,
    pub failures: FailurePlan,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            native_size: SurfaceSize {
                width: 800,
                height: 480,
            },
            accepts_text: true,
            accepts_binary: false,
            record_calls: true,
            failures: FailurePlan::default(),
        }
    }
}

/// A backend with no GPU behind it.
///
/// It enforces the same contracts a driver would (handles must exist, the
/// program must be linked before uniforms are set, attribute data must cover
/// the declared vertices, indices must stay in range) and records every call.
#[derive(Debug)]
pub struct RecordingBackend {
    options: RecordingOptions,
    log: CallLog,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(RecordingOptions::default())
    }
}

impl RecordingBackend {
    pub fn new(options: RecordingOptions) -> Self {
        let log = CallLog::new(options.record_calls);
        Self { options, log }
    }

    /// A backend that only keeps counters, for long headless runs.
    pub fn headless(native_size: SurfaceSize) -> Self {
        Self::new(RecordingOptions {
            native_size,
            record_calls: false,
            ..RecordingOptions::default()
        })
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl GraphicsBackend for RecordingBackend {
    type Context = RecordingContext;

    fn init(&mut self) -> Result<RecordingContext, BackendError> {
        self.log.push(BackendCall::Init);
        if self.options.failures.init {
            return Err(BackendError::ContextUnavailable(
                "scripted init failure".into(),
            ));
        }
        tracing::debug!(
            width = self.options.native_size.width,
            height = self.options.native_size.height,
            "recording context acquired"
        );
        Ok(RecordingContext {
            options: self.options.clone(),
            log: self.log.clone(),
            surface: None,
            clear_color: 0,
            next_handle: 1,
            programs: BTreeMap::new(),
            active_program: None,
            attributes: BTreeMap::new(),
            textures: BTreeSet::new(),
            draws: 0,
            flushes: 0,
        })
    }
}

#[derive(Debug, Default)]
struct ProgramState {
    vertex: bool,
    fragment: bool,
    linked: bool,
}

/// Context handed out by [`RecordingBackend::init`].
#[derive(Debug)]
pub struct RecordingContext {
    options: RecordingOptions,
    log: CallLog,
    surface: Option<SurfaceSize>,
    clear_color: u32,
    next_handle: u32,
    programs: BTreeMap<ProgramHandle, ProgramState>,
    active_program: Option<ProgramHandle>,
    /// Attribute name to vertex count.
    attributes: BTreeMap<String, usize>,
    textures: BTreeSet<TextureHandle>,
    draws: u64,
    flushes: u64,
}

impl RecordingContext {
    pub fn clear_color(&self) -> u32 {
        self.clear_color
    }

    fn issue_handle(&mut self) -> u32 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn program_mut(&mut self, program: ProgramHandle) -> Result<&mut ProgramState, BackendError> {
        self.programs
            .get_mut(&program)
            .ok_or(BackendError::InvalidHandle(program.0))
    }

    fn linked_program(&self) -> Option<ProgramHandle> {
        self.active_program
            .filter(|p| self.programs.get(p).is_some_and(|s| s.linked))
    }
}

impl RenderContext for RecordingContext {
    fn accepts_shader_form(&self, form: ShaderForm) -> bool {
        match form {
            ShaderForm::Text => self.options.accepts_text,
            ShaderForm::Binary => self.options.accepts_binary,
        }
    }

    fn setup_surface(&mut self, config: &SurfaceConfig) -> Result<(), BackendError> {
        self.log.push(BackendCall::SetupSurface(*config));
        if let Some(status) = self.options.failures.surface_setup {
            return Err(BackendError::SurfaceSetup { status });
        }
        let native = self.options.native_size;
        self.surface = Some(SurfaceSize {
            width: if config.width == 0 { native.width } else { config.width },
            height: if config.height == 0 { native.height } else { config.height },
        });
        self.clear_color = config.clear_color;
        Ok(())
    }

    fn surface_size(&self) -> SurfaceSize {
        self.log.push(BackendCall::SurfaceSize);
        self.surface.unwrap_or(self.options.native_size)
    }

    fn set_clear_color(&mut self, argb: u32) {
        self.log.push(BackendCall::SetClearColor(argb));
        self.clear_color = argb;
    }

    fn enable(&mut self, capability: Capability) {
        self.log.push(BackendCall::Enable(capability));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.log.push(BackendCall::SetDepthWrite(enabled));
    }

    fn create_program(&mut self) -> Result<ProgramHandle, BackendError> {
        self.log.push(BackendCall::CreateProgram);
        let handle = ProgramHandle(self.issue_handle());
        self.programs.insert(handle, ProgramState::default());
        Ok(handle)
    }

    fn attach_shader(
        &mut self,
        program: ProgramHandle,
        stage: ShaderStage,
        source: &ShaderSource,
    ) -> Result<(), BackendError> {
        let form = source.form();
        self.log.push(BackendCall::AttachShader {
            program,
            stage,
            form,
        });
        if !self.accepts_shader_form(form) {
            return Err(BackendError::UnsupportedShaderForm { stage, form });
        }
        if source.is_empty() {
            return Err(BackendError::ShaderRejected {
                stage,
                reason: "empty shader".into(),
            });
        }
        if let ShaderSource::Text(text) = source {
            if !text.contains("main") {
                return Err(BackendError::ShaderRejected {
                    stage,
                    reason: "no entry point".into(),
                });
            }
        }
        let state = self.program_mut(program)?;
        match stage {
            ShaderStage::Vertex => state.vertex = true,
            ShaderStage::Fragment => state.fragment = true,
        }
        Ok(())
    }

    fn link(&mut self, program: ProgramHandle) -> Result<(), BackendError> {
        self.log.push(BackendCall::Link(program));
        if self.options.failures.link {
            return Err(BackendError::LinkFailed("scripted link failure".into()));
        }
        let state = self.program_mut(program)?;
        if !(state.vertex && state.fragment) {
            return Err(BackendError::LinkFailed(
                "vertex and fragment stages are both required".into(),
            ));
        }
        state.linked = true;
        self.active_program = Some(program);
        Ok(())
    }

    fn bind_attribute(&mut self, attribute: &VertexAttribute<'_>) -> Result<(), BackendError> {
        self.log.push(BackendCall::BindAttribute {
            name: attribute.name.to_owned(),
            element: attribute.element,
            components: attribute.components,
            vertex_count: attribute.vertex_count,
        });
        let fail = |reason: String| BackendError::Attribute {
            name: attribute.name.to_owned(),
            reason,
        };
        if self.linked_program().is_none() {
            return Err(fail("no linked program".into()));
        }
        if !(1..=4).contains(&attribute.components) {
            return Err(fail(format!(
                "{} components per vertex",
                attribute.components
            )));
        }
        if attribute.data.len() < attribute.required_len() {
            return Err(fail(format!(
                "{} floats supplied, {} required",
                attribute.data.len(),
                attribute.required_len()
            )));
        }
        self.attributes
            .insert(attribute.name.to_owned(), attribute.vertex_count);
        Ok(())
    }

    fn upload_texture(&mut self, image: &TextureImage<'_>) -> Result<TextureHandle, BackendError> {
        self.log.push(BackendCall::UploadTexture {
            width: image.width,
            height: image.height,
            format: image.format,
            mipmaps: image.mipmaps,
        });
        if image.width == 0 || image.height == 0 {
            return Err(BackendError::TextureUpload("zero-sized texture".into()));
        }
        if image.mipmaps && !(image.width.is_power_of_two() && image.height.is_power_of_two()) {
            return Err(BackendError::TextureUpload(format!(
                "mipmapped texture must be power-of-two, got {}x{}",
                image.width, image.height
            )));
        }
        if image.pixels.len() != image.expected_len() {
            return Err(BackendError::TextureUpload(format!(
                "{} bytes supplied for a {}x{} {:?} texture ({} expected)",
                image.pixels.len(),
                image.width,
                image.height,
                image.format,
                image.expected_len()
            )));
        }
        let handle = TextureHandle(self.issue_handle());
        self.textures.insert(handle);
        Ok(handle)
    }

    fn bind_texture(&mut self, uniform: &str, texture: TextureHandle) -> Result<(), BackendError> {
        self.log.push(BackendCall::BindTexture {
            uniform: uniform.to_owned(),
            texture,
        });
        if !self.textures.contains(&texture) {
            return Err(BackendError::InvalidHandle(texture.0));
        }
        if self.linked_program().is_none() {
            return Err(BackendError::Uniform {
                name: uniform.to_owned(),
                reason: "no linked program".into(),
            });
        }
        Ok(())
    }

    fn set_uniform(
        &mut self,
        name: &str,
        components: usize,
        data: &[f32],
    ) -> Result<(), BackendError> {
        self.log.push(BackendCall::SetUniform {
            name: name.to_owned(),
            components,
            data: data.to_vec(),
        });
        self.log.bump(|s| s.uniform_updates += 1);
        if self.linked_program().is_none() {
            return Err(BackendError::Uniform {
                name: name.to_owned(),
                reason: "no linked program".into(),
            });
        }
        if data.len() != components {
            return Err(BackendError::Uniform {
                name: name.to_owned(),
                reason: format!("{} values supplied for {components} components", data.len()),
            });
        }
        Ok(())
    }

    fn begin_frame(&mut self) {
        self.log.push(BackendCall::BeginFrame);
        self.log.bump(|s| s.frames_begun += 1);
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveKind,
        indices: IndexData<'_>,
    ) -> Result<(), BackendError> {
        self.log.push(BackendCall::DrawIndexed {
            primitive,
            count: indices.len(),
            index_type: indices.index_type(),
        });
        self.log.bump(|s| s.draws += 1);
        self.draws += 1;
        if self.options.failures.draw_at == Some(self.draws) {
            return Err(BackendError::DrawFailed { status: -2 });
        }
        if self.linked_program().is_none() {
            return Err(BackendError::DrawFailed { status: -3 });
        }
        let vertices = self.attributes.values().copied().min().unwrap_or(0);
        if let Some(max) = indices.max_index() {
            if max >= vertices {
                tracing::warn!(max, vertices, "index out of range");
                return Err(BackendError::DrawFailed { status: -4 });
            }
        }
        Ok(())
    }

    fn flush_frame(&mut self) -> Result<(), BackendError> {
        self.log.push(BackendCall::FlushFrame);
        self.log.bump(|s| s.flushes += 1);
        self.flushes += 1;
        if self.options.failures.flush_at == Some(self.flushes) {
            return Err(BackendError::FlushFailed { status: -5 });
        }
        Ok(())
    }

    fn present(&mut self) {
        self.log.push(BackendCall::Present);
        self.log.bump(|s| s.presents += 1);
    }

    fn shutdown(self) {
        self.log.push(BackendCall::Shutdown);
        tracing::debug!(
            draws = self.draws,
            flushes = self.flushes,
            "recording context shut down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "void main() { gl_Position = vec4(0.0); }";
    const FS: &str = "void main() { gl_FragColor = vec4(1.0); }";

    fn linked_context() -> (RecordingContext, CallLog) {
        let mut backend = RecordingBackend::new(RecordingOptions::default());
        let log = backend.log();
        let mut ctx = backend.init().unwrap();
        let program = ctx.create_program().unwrap();
        ctx.attach_shader(program, ShaderStage::Vertex, &ShaderSource::Text(VS.into()))
            .unwrap();
        ctx.attach_shader(program, ShaderStage::Fragment, &ShaderSource::Text(FS.into()))
            .unwrap();
        ctx.link(program).unwrap();
        (ctx, log)
    }

    fn bind_triangle(ctx: &mut RecordingContext) {
        let positions = [0.0_f32; 9];
        ctx.bind_attribute(&VertexAttribute {
            name: "in_position",
            element: AttribType::Float,
            components: 3,
            stride: 0,
            vertex_count: 3,
            data: &positions,
        })
        .unwrap();
    }

    #[test]
    fn init_failure_is_recorded() {
        let mut backend = RecordingBackend::new(RecordingOptions {
            failures: FailurePlan {
                init: true,
                ..FailurePlan::default()
            },
            ..RecordingOptions::default()
        });
        let err = backend.init().unwrap_err();
        assert!(matches!(err, BackendError::ContextUnavailable(_)));
        assert_eq!(backend.log().calls(), vec![BackendCall::Init]);
    }

    #[test]
    fn native_surface_size_is_used_for_zero_config() {
        let mut backend = RecordingBackend::new(RecordingOptions::default());
        let mut ctx = backend.init().unwrap();
        ctx.setup_surface(&SurfaceConfig {
            width: 0,
            height: 0,
            clear_color: 0xFF50_5050,
        })
        .unwrap();
        assert_eq!(
            ctx.surface_size(),
            SurfaceSize {
                width: 800,
                height: 480
            }
        );
        assert_eq!(ctx.clear_color(), 0xFF50_5050);
    }

    #[test]
    fn binary_shaders_rejected_unless_accepted() {
        let mut backend = RecordingBackend::new(RecordingOptions::default());
        let mut ctx = backend.init().unwrap();
        let program = ctx.create_program().unwrap();
        let err = ctx
            .attach_shader(program, ShaderStage::Vertex, &ShaderSource::Binary(vec![0xAA]))
            .unwrap_err();
        assert!(matches!(err, BackendError::UnsupportedShaderForm { .. }));
    }

    #[test]
    fn link_requires_both_stages() {
        let mut backend = RecordingBackend::new(RecordingOptions::default());
        let mut ctx = backend.init().unwrap();
        let program = ctx.create_program().unwrap();
        ctx.attach_shader(program, ShaderStage::Vertex, &ShaderSource::Text(VS.into()))
            .unwrap();
        assert!(matches!(ctx.link(program), Err(BackendError::LinkFailed(_))));
        assert!(matches!(
            ctx.link(ProgramHandle(99)),
            Err(BackendError::InvalidHandle(99))
        ));
    }

    #[test]
    fn uniform_needs_linked_program_and_matching_length() {
        let mut backend = RecordingBackend::new(RecordingOptions::default());
        let mut ctx = backend.init().unwrap();
        assert!(ctx.set_uniform("m", 16, &[0.0; 16]).is_err());

        let (mut ctx, log) = linked_context();
        assert!(ctx.set_uniform("m", 16, &[0.0; 15]).is_err());
        ctx.set_uniform("m", 16, &[0.0; 16]).unwrap();
        assert_eq!(log.stats().uniform_updates, 2);
    }

    #[test]
    fn short_attribute_data_is_rejected() {
        let (mut ctx, _) = linked_context();
        let data = [0.0_f32; 5];
        let err = ctx
            .bind_attribute(&VertexAttribute {
                name: "in_coord",
                element: AttribType::Float,
                components: 2,
                stride: 0,
                vertex_count: 3,
                data: &data,
            })
            .unwrap_err();
        assert!(matches!(err, BackendError::Attribute { .. }));
    }

    #[test]
    fn texture_size_must_match_pixels() {
        let (mut ctx, _) = linked_context();
        let pixels = vec![0_u8; 4 * 4 * 4];
        let good = TextureImage {
            pixels: &pixels,
            width: 4,
            height: 4,
            format: TextureFormat::Rgba8888,
            mipmaps: false,
        };
        let tex = ctx.upload_texture(&good).unwrap();
        ctx.bind_texture("in_texture", tex).unwrap();

        let bad = TextureImage { width: 5, ..good };
        assert!(matches!(
            ctx.upload_texture(&bad),
            Err(BackendError::TextureUpload(_))
        ));
        assert!(ctx.bind_texture("in_texture", TextureHandle(77)).is_err());
    }

    #[test]
    fn mipmaps_need_power_of_two_sides() {
        let (mut ctx, log) = linked_context();
        let pixels = vec![0_u8; 6 * 4];
        let image = TextureImage {
            pixels: &pixels,
            width: 6,
            height: 4,
            format: TextureFormat::L8,
            mipmaps: true,
        };
        assert!(matches!(
            ctx.upload_texture(&image),
            Err(BackendError::TextureUpload(_))
        ));
        assert_eq!(
            log.last(),
            Some(BackendCall::UploadTexture {
                width: 6,
                height: 4,
                format: TextureFormat::L8,
                mipmaps: true,
            })
        );

        ctx.upload_texture(&TextureImage {
            mipmaps: false,
            ..image
        })
        .unwrap();
    }

    #[test]
    fn attribute_element_type_is_recorded() {
        let (mut ctx, log) = linked_context();
        bind_triangle(&mut ctx);
        assert_eq!(
            log.last(),
            Some(BackendCall::BindAttribute {
                name: "in_position".into(),
                element: AttribType::Float,
                components: 3,
                vertex_count: 3,
            })
        );
    }

    #[test]
    fn draw_checks_index_range() {
        let (mut ctx, _) = linked_context();
        bind_triangle(&mut ctx);
        ctx.draw_indexed(PrimitiveKind::Triangles, IndexData::U8(&[0, 1, 2]))
            .unwrap();
        let err = ctx
            .draw_indexed(PrimitiveKind::Triangles, IndexData::U8(&[0, 1, 3]))
            .unwrap_err();
        assert_eq!(err, BackendError::DrawFailed { status: -4 });
    }

    #[test]
    fn scripted_draw_and_flush_failures() {
        let mut backend = RecordingBackend::new(RecordingOptions {
            failures: FailurePlan {
                draw_at: Some(2),
                flush_at: Some(1),
                ..FailurePlan::default()
            },
            ..RecordingOptions::default()
        });
        let mut ctx = backend.init().unwrap();
        let program = ctx.create_program().unwrap();
        ctx.attach_shader(program, ShaderStage::Vertex, &ShaderSource::Text(VS.into()))
            .unwrap();
        ctx.attach_shader(program, ShaderStage::Fragment, &ShaderSource::Text(FS.into()))
            .unwrap();
        ctx.link(program).unwrap();
        bind_triangle(&mut ctx);

        let tri = IndexData::U8(&[0, 1, 2]);
        assert!(ctx.draw_indexed(PrimitiveKind::Triangles, tri).is_ok());
        assert_eq!(ctx.flush_frame(), Err(BackendError::FlushFailed { status: -5 }));
        assert_eq!(
            ctx.draw_indexed(PrimitiveKind::Triangles, tri),
            Err(BackendError::DrawFailed { status: -2 })
        );
        assert!(ctx.flush_frame().is_ok());
    }

    #[test]
    fn headless_keeps_counters_only() {
        let mut backend = RecordingBackend::headless(SurfaceSize {
            width: 64,
            height: 32,
        });
        let log = backend.log();
        let mut ctx = backend.init().unwrap();
        ctx.begin_frame();
        ctx.present();
        ctx.shutdown();
        assert!(log.is_empty());
        assert_eq!(log.stats().frames_begun, 1);
        assert_eq!(log.stats().presents, 1);
    }
}
