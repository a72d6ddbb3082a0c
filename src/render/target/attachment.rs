//! Attachment descriptions for GPU-resident 2D surfaces

use crate::core::error::Error;
use crate::core::types::Result;

/// Texel filtering mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Texture coordinate wrap mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wrap {
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// Scalar type of a single channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    UnsignedByte,
    HalfFloat,
    Float,
}

/// Pixel layout of a surface
///
/// Folds the channel layout, storage precision and scalar type of a surface
/// into one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Single 8-bit normalized channel
    R8,
    /// Four 8-bit normalized channels
    Rgba8,
    /// Single 32-bit float channel
    R32Float,
    /// Four 16-bit float channels
    Rgba16Float,
    /// Four 32-bit float channels
    Rgba32Float,
}

impl PixelFormat {
    pub fn channels(self) -> u32 {
        match self {
            Self::R8 | Self::R32Float => 1,
            Self::Rgba8 | Self::Rgba16Float | Self::Rgba32Float => 4,
        }
    }

    pub fn scalar_type(self) -> ScalarType {
        match self {
            Self::R8 | Self::Rgba8 => ScalarType::UnsignedByte,
            Self::Rgba16Float => ScalarType::HalfFloat,
            Self::R32Float | Self::Rgba32Float => ScalarType::Float,
        }
    }

    pub fn bytes_per_pixel(self) -> u32 {
        let scalar = match self.scalar_type() {
            ScalarType::UnsignedByte => 1,
            ScalarType::HalfFloat => 2,
            ScalarType::Float => 4,
        };
        scalar * self.channels()
    }

    /// Matching wgpu texture format
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            Self::R8 => wgpu::TextureFormat::R8Unorm,
            Self::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
            Self::R32Float => wgpu::TextureFormat::R32Float,
            Self::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            Self::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        }
    }
}

/// Seed data uploaded into a surface at creation
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceData {
    /// Normalized bytes for 8-bit formats
    Bytes(Vec<u8>),
    /// Floats for 16/32-bit float formats (half formats are converted on upload)
    Floats(Vec<f32>),
}

impl SurfaceData {
    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(b) => b.len(),
            Self::Floats(f) => f.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Description of one 2D surface owned by a frame target
#[derive(Clone, Debug, PartialEq)]
pub struct AttachmentSpec {
    pub width: u32,
    pub height: u32,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
    pub format: PixelFormat,
    pub initial_data: Option<SurfaceData>,
}

impl AttachmentSpec {
    /// Nearest-filtered, edge-clamped surface with no seed data
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            wrap_s: Wrap::ClampToEdge,
            wrap_t: Wrap::ClampToEdge,
            format,
            initial_data: None,
        }
    }

    pub fn with_filter(mut self, min: Filter, mag: Filter) -> Self {
        self.min_filter = min;
        self.mag_filter = mag;
        self
    }

    pub fn with_wrap(mut self, s: Wrap, t: Wrap) -> Self {
        self.wrap_s = s;
        self.wrap_t = t;
        self
    }

    pub fn with_data(mut self, data: SurfaceData) -> Self {
        self.initial_data = Some(data);
        self
    }

    /// Number of scalar values a full upload of this surface holds
    pub fn element_count(&self) -> usize {
        self.width as usize * self.height as usize * self.format.channels() as usize
    }

    /// Check the spec on its own: non-zero size and well-formed seed data
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::config(format!(
                "attachment has zero size ({}x{})",
                self.width, self.height
            )));
        }

        if let Some(data) = &self.initial_data {
            let type_ok = matches!(
                (data, self.format.scalar_type()),
                (SurfaceData::Bytes(_), ScalarType::UnsignedByte)
                    | (SurfaceData::Floats(_), ScalarType::HalfFloat | ScalarType::Float)
            );
            if !type_ok {
                return Err(Error::config(format!(
                    "seed data type does not match format {:?}",
                    self.format
                )));
            }
            if data.len() != self.element_count() {
                return Err(Error::config(format!(
                    "seed data holds {} values, {:?} surface of {}x{} needs {}",
                    data.len(),
                    self.format,
                    self.width,
                    self.height,
                    self.element_count()
                )));
            }
        }

        Ok(())
    }
}

/// Validate a list of specs destined for one frame target
///
/// Multi-attachment draws need every surface to share one size.
pub fn validate_specs(specs: &[AttachmentSpec]) -> Result<(u32, u32)> {
    let first = specs
        .first()
        .ok_or_else(|| Error::config("frame target needs at least one attachment"))?;

    for (index, spec) in specs.iter().enumerate() {
        spec.validate()?;
        if spec.width != first.width || spec.height != first.height {
            return Err(Error::config(format!(
                "attachment {} is {}x{}, attachment 0 is {}x{}",
                index, spec.width, spec.height, first.width, first.height
            )));
        }
    }

    Ok((first.width, first.height))
}
