use tiny_skia as sk;

use crate::dna::{Gene, Genome};
use crate::error::{BreedError, Result};

/// premultiplied RGBA8 pixels, row-major, tightly packed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// wrap an already-premultiplied buffer
    pub fn from_premultiplied(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(BreedError::InvalidState(format!(
                "raster {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// wrap straight-alpha pixels (what image decoders hand out)
    pub fn from_straight(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        if data.len() % 4 != 0 {
            return Err(BreedError::InvalidState("rgba buffer length is not a multiple of 4".into()));
        }
        Self::from_premultiplied(width, height, premultiply(data))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// straight-alpha copy for encoders
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, unpremultiply(&self.data))
    }
}

/// software rasterizer; a pure function of genome and canvas size
#[derive(Clone, Copy, Debug)]
pub struct CpuRenderer {
    pub anti_alias: bool,
}

impl Default for CpuRenderer {
    fn default() -> Self {
        Self { anti_alias: true }
    }
}

impl CpuRenderer {
    pub fn new(anti_alias: bool) -> Self {
        Self { anti_alias }
    }

    /// Full-frame render, genes painted first to last over an opaque black
    /// canvas. Genes with fewer than 3 vertices are skipped.
    pub fn render(&self, genome: &Genome) -> Result<Raster> {
        profiling::scope!("CpuRenderer::render");
        let (w, h) = (genome.width(), genome.height());
        let mut pix = sk::Pixmap::new(w, h).ok_or_else(|| {
            BreedError::InvalidState(format!("cannot allocate a {w}x{h} pixmap"))
        })?;
        pix.fill(sk::Color::BLACK);

        for gene in &genome.genes {
            self.draw_gene(&mut pix, gene);
        }

        Ok(Raster { width: w, height: h, data: pix.take() })
    }

    fn draw_gene(&self, pix: &mut sk::Pixmap, gene: &Gene) {
        profiling::scope!("draw_gene");
        if !gene.is_renderable() {
            return;
        }

        let (w, h) = (pix.width() as f64, pix.height() as f64);
        let mut pb = sk::PathBuilder::new();
        let (x0, y0) = gene.vertices[0];
        pb.move_to((x0 * w) as f32, (y0 * h) as f32);
        for &(x, y) in &gene.vertices[1..] {
            pb.line_to((x * w) as f32, (y * h) as f32);
        }
        pb.close();

        // zero-area outlines have no path; nothing to paint
        let Some(path) = pb.finish() else {
            return;
        };

        let c = gene.color;
        let mut paint = sk::Paint::default();
        paint.anti_alias = self.anti_alias;
        paint.set_color_rgba8(c.r, c.g, c.b, c.a);

        pix.fill_path(&path, &paint, sk::FillRule::EvenOdd, sk::Transform::identity(), None);
    }
}

/// Premultiply RGBA - optimized scalar implementation (compiler will auto-vectorize)
#[inline(always)]
pub fn premultiply(p: &[u8]) -> Vec<u8> {
    profiling::scope!("premultiply");

    let mut out = vec![0u8; p.len()];
    for (dst, src) in out.chunks_exact_mut(4).zip(p.chunks_exact(4)) {
        let a = src[3] as u16;
        // (x * a + 127) / 255 is a fast rounded divide-by-255
        dst[0] = ((src[0] as u16 * a + 127) / 255) as u8;
        dst[1] = ((src[1] as u16 * a + 127) / 255) as u8;
        dst[2] = ((src[2] as u16 * a + 127) / 255) as u8;
        dst[3] = a as u8;
    }
    out
}

/// inverse of `premultiply`, rounded
pub fn unpremultiply(p: &[u8]) -> Vec<u8> {
    profiling::scope!("unpremultiply");

    let mut out = vec![0u8; p.len()];
    for (dst, src) in out.chunks_exact_mut(4).zip(p.chunks_exact(4)) {
        let a = src[3] as u32;
        if a == 0 {
            continue;
        }
        for k in 0..3 {
            dst[k] = ((src[k] as u32 * 255 + a / 2) / a).min(255) as u8;
        }
        dst[3] = src[3];
    }
    out
}
