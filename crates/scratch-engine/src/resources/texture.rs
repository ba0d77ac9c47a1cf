use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::gfx::{GpuResult, GraphicsApi, TextureImage};

/// Sampled 2D RGBA8 texture.
pub struct Texture<A: GraphicsApi> {
    handle: A::Texture,
    path: Option<PathBuf>,
    width: u32,
    height: u32,
}

impl<A: GraphicsApi> Texture<A> {
    /// Decodes an image file and uploads it.
    ///
    /// Rows are flipped so texcoord `(0, 0)` addresses the bottom-left texel.
    pub fn from_file(api: &mut A, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = load_image(path)?;
        let mut texture = Self::from_image(api, &image)
            .with_context(|| format!("failed to upload texture {}", path.display()))?;
        texture.path = Some(path.to_path_buf());
        log::info!("loaded texture {} ({}x{})", path.display(), texture.width, texture.height);
        Ok(texture)
    }

    pub fn from_image(api: &mut A, image: &TextureImage) -> GpuResult<Self> {
        Ok(Self {
            handle: api.create_texture(image)?,
            path: None,
            width: image.width,
            height: image.height,
        })
    }

    pub fn bind(&self, api: &mut A, unit: u32) -> GpuResult<()> {
        api.bind_texture(unit, Some(&self.handle))
    }

    pub fn unbind(api: &mut A, unit: u32) -> GpuResult<()> {
        api.bind_texture(unit, None)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Source file, for textures loaded from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn load_image(path: &Path) -> Result<TextureImage> {
    let decoded = image::open(path)
        .with_context(|| format!("failed to decode image {}", path.display()))?
        .flipv()
        .to_rgba8();

    let (width, height) = decoded.dimensions();
    Ok(TextureImage {
        width,
        height,
        rgba: decoded.into_raw(),
    })
}
