use std::fmt;

/// Opaque shader program handle issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Opaque texture handle issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Fixed-function state the harness switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    CullFace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Which representation a shader is handed over in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderForm {
    Text,
    Binary,
}

impl fmt::Display for ShaderForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderForm::Text => f.write_str("source text"),
            ShaderForm::Binary => f.write_str("compiled binary"),
        }
    }
}

/// Shader input: GLSL source, or a binary the driver's offline compiler produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    Text(String),
    Binary(Vec<u8>),
}

impl ShaderSource {
    pub fn form(&self) -> ShaderForm {
        match self {
            ShaderSource::Text(_) => ShaderForm::Text,
            ShaderSource::Binary(_) => ShaderForm::Binary,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ShaderSource::Text(s) => s.len(),
            ShaderSource::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Element type of a vertex attribute stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AttribType {
    Float,
}

/// A named per-vertex input.
///
/// `stride` is in elements; zero means tightly packed.
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute<'a> {
    pub name: &'a str,
    pub element: AttribType,
    pub components: usize,
    pub stride: usize,
    pub vertex_count: usize,
    pub data: &'a [f32],
}

impl VertexAttribute<'_> {
    /// Number of floats the declared layout needs.
    pub fn required_len(&self) -> usize {
        if self.vertex_count == 0 {
            return 0;
        }
        let step = self.stride.max(self.components);
        step * (self.vertex_count - 1) + self.components
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8888,
    Rgb888,
    L8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::Rgba8888 => 4,
            TextureFormat::Rgb888 => 3,
            TextureFormat::L8 => 1,
        }
    }
}

/// Pixel data for a 2D texture upload.
#[derive(Debug, Clone, Copy)]
pub struct TextureImage<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mipmaps: bool,
}

impl TextureImage<'_> {
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Points,
    Lines,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U8,
    U16,
}

/// An index buffer; the element width is the variant.
#[derive(Debug, Clone, Copy)]
pub enum IndexData<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
}

impl IndexData<'_> {
    pub fn len(&self) -> usize {
        match self {
            IndexData::U8(i) => i.len(),
            IndexData::U16(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_type(&self) -> IndexType {
        match self {
            IndexData::U8(_) => IndexType::U8,
            IndexData::U16(_) => IndexType::U16,
        }
    }

    pub fn max_index(&self) -> Option<usize> {
        match self {
            IndexData::U8(i) => i.iter().max().map(|&v| v as usize),
            IndexData::U16(i) => i.iter().max().map(|&v| v as usize),
        }
    }
}

/// Render target configuration. A zero width or height means "native size".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    /// Clear colour as `0xAARRGGBB`.
    pub clear_color: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_attribute_length() {
        let data = [0.0_f32; 12];
        let attr = VertexAttribute {
            name: "in_position",
            element: AttribType::Float,
            components: 3,
            stride: 0,
            vertex_count: 4,
            data: &data,
        };
        assert_eq!(attr.required_len(), 12);
    }

    #[test]
    fn strided_attribute_length() {
        let data = [0.0_f32; 14];
        let attr = VertexAttribute {
            name: "in_coord",
            element: AttribType::Float,
            components: 2,
            stride: 5,
            vertex_count: 3,
            data: &data,
        };
        assert_eq!(attr.required_len(), 12);
    }

    #[test]
    fn index_data_reports_type_and_extent() {
        let idx = [0_u8, 5, 2];
        let data = IndexData::U8(&idx);
        assert_eq!(data.len(), 3);
        assert_eq!(data.index_type(), IndexType::U8);
        assert_eq!(data.max_index(), Some(5));
        assert_eq!(IndexData::U16(&[]).max_index(), None);
    }

    #[test]
    fn shader_source_form() {
        assert_eq!(ShaderSource::Text("void main() {}".into()).form(), ShaderForm::Text);
        let bin = ShaderSource::Binary(vec![1, 2, 3]);
        assert_eq!(bin.form(), ShaderForm::Binary);
        assert_eq!(bin.len(), 3);
    }

    #[test]
    fn texture_expected_len() {
        let img = TextureImage {
            pixels: &[],
            width: 8,
            height: 4,
            format: TextureFormat::Rgb888,
            mipmaps: false,
        };
        assert_eq!(img.expected_len(), 96);
    }
}
