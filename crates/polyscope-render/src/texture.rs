//! CPU-side texture images handed to shader programs.

use glam::Vec3;
use polyscope_core::error::{PolyscopeError, Result};

use crate::rules::TextureDim;

/// An RGBA8 image with a sampler dimensionality.
///
/// 1D textures have `height == 1`; only 3D and array textures use `depth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    dim: TextureDim,
    width: u32,
    height: u32,
    depth: u32,
    data: Vec<u8>,
}

impl Texture {
    fn with_extent(dim: TextureDim, width: u32, height: u32, depth: u32, data: Vec<u8>) -> Result<Self> {
        let expected = [height, depth, 4]
            .into_iter()
            .try_fold(width as usize, |acc, n| acc.checked_mul(n as usize))
            .ok_or_else(|| PolyscopeError::InvalidParameter {
                parameter: "texture extent".to_string(),
                reason: format!("{width}x{height}x{depth} texels overflow the addressable size"),
            })?;
        if data.len() != expected {
            return Err(PolyscopeError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            dim,
            width,
            height,
            depth,
            data,
        })
    }

    /// Creates a 1D texture from `width` RGBA8 texels.
    pub fn new_1d(width: u32, data: Vec<u8>) -> Result<Self> {
        Self::with_extent(TextureDim::D1, width, 1, 1, data)
    }

    /// Creates a 2D texture from row-major RGBA8 texels.
    pub fn new_2d(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::with_extent(TextureDim::D2, width, height, 1, data)
    }

    /// Creates a 3D texture from RGBA8 texels, slice by slice.
    pub fn new_3d(width: u32, height: u32, depth: u32, data: Vec<u8>) -> Result<Self> {
        Self::with_extent(TextureDim::D3, width, height, depth, data)
    }

    /// Creates a layered 2D texture from RGBA8 texels, layer by layer.
    pub fn new_array(width: u32, height: u32, layers: u32, data: Vec<u8>) -> Result<Self> {
        Self::with_extent(TextureDim::Array, width, height, layers, data)
    }

    /// Creates a 2D texture from a decoded image.
    pub fn from_rgba_image(image: &image::RgbaImage) -> Self {
        Self {
            dim: TextureDim::D2,
            width: image.width(),
            height: image.height(),
            depth: 1,
            data: image.as_raw().clone(),
        }
    }

    /// Creates a 2D texture from any decoded image, converting to RGBA8.
    pub fn from_dynamic_image(image: &image::DynamicImage) -> Self {
        Self::from_rgba_image(&image.to_rgba8())
    }

    /// Loads a 2D texture from an image file.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let image = image::open(path.as_ref())
            .map_err(|e| PolyscopeError::RenderError(format!("failed to load texture: {e}")))?;
        Ok(Self::from_dynamic_image(&image))
    }

    /// A 1x1 2D texture of a single opaque color.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn solid(color: Vec3) -> Self {
        let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        Self {
            dim: TextureDim::D2,
            width: 1,
            height: 1,
            depth: 1,
            data: vec![c.x as u8, c.y as u8, c.z as u8, 255],
        }
    }

    pub fn dim(&self) -> TextureDim {
        self.dim
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Raw RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the texel at `(x, y)` of the first slice.
    pub fn texel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).and_then(|s| s.try_into().ok())
    }
}
