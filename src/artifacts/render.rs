// src/artifacts/render.rs
//! Page rasterization: the first pages of a PDF become numbered JPEG previews.
//!
//! `PdfiumRenderer` is stateless. Each call binds a fresh `Pdfium` instance
//! because the upstream type is `!Send`; the OS caches the library load.

use image::{DynamicImage, ImageOutputFormat};
use pdfium_render::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::artifacts::preview_path;
use crate::error::CurateError;

/// Largest rendered edge in pixels.
const MAX_DIMENSION_PX: u32 = 4096;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

pub trait PageRenderer: Send + Sync {
    /// Render up to `max_pages` leading pages of `document` into `out_dir`
    /// as `0.jpg`, `1.jpg`, ... and return how many were written.
    fn render_pages(
        &self,
        document: &Path,
        out_dir: &Path,
        max_pages: usize,
    ) -> Result<usize, CurateError>;
}

pub struct PdfiumRenderer {
    dpi: u32,
    jpeg_quality: u8,
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new(dpi: u32, jpeg_quality: u8, library_path: Option<PathBuf>) -> Self {
        Self {
            dpi,
            jpeg_quality,
            library_path,
        }
    }

    fn load_pdfium(&self, document: &Path) -> Result<Pdfium, CurateError> {
        let fail = |reason: String| CurateError::Render {
            document: document.to_path_buf(),
            page: 0,
            reason,
        };

        // 1. Configured path, 2. env var
        let explicit = self
            .library_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| std::env::var("PDFIUM_DYNAMIC_LIB_PATH").ok());
        if let Some(path) = explicit {
            let bindings = Pdfium::bind_to_library(&path)
                .map_err(|e| fail(format!("failed to load PDFium from {path}: {e}")))?;
            return Ok(Pdfium::new(bindings));
        }

        // 3. Next to the executable
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            let lib_path =
                Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                debug!(dir = %exe_dir.display(), "loaded PDFium next to executable");
                return Ok(Pdfium::new(bindings));
            }
        }

        // 4. System library
        let bindings = Pdfium::bind_to_system_library().map_err(|e| {
            fail(format!(
                "PDFium library not found; set PDFIUM_DYNAMIC_LIB_PATH or preview.pdfium_library_path: {e}"
            ))
        })?;
        Ok(Pdfium::new(bindings))
    }
}

/// Unclamped pixel size for a page at `dpi` (at least 1 px per edge).
fn uncapped_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (f32, f32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    (
        (width_points * scale).max(1.0),
        (height_points * scale).max(1.0),
    )
}

/// True when rendering at `dpi` would exceed `MAX_DIMENSION_PX` on either edge.
pub fn exceeds_dimension_cap(width_points: f32, height_points: f32, dpi: u32) -> bool {
    let (raw_w, raw_h) = uncapped_dimensions(width_points, height_points, dpi);
    raw_w.max(raw_h) > MAX_DIMENSION_PX as f32
}

/// Pixel size for a page at `dpi`, capped to `MAX_DIMENSION_PX` with aspect kept.
pub fn compute_render_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
    let (raw_w, raw_h) = uncapped_dimensions(width_points, height_points, dpi);

    let max_dim = raw_w.max(raw_h);
    if max_dim > MAX_DIMENSION_PX as f32 {
        let ratio = MAX_DIMENSION_PX as f32 / max_dim;
        let w = ((raw_w * ratio).round() as u32).clamp(1, MAX_DIMENSION_PX);
        let h = ((raw_h * ratio).round() as u32).clamp(1, MAX_DIMENSION_PX);
        (w, h)
    } else {
        (raw_w as u32, raw_h as u32)
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_pages(
        &self,
        document: &Path,
        out_dir: &Path,
        max_pages: usize,
    ) -> Result<usize, CurateError> {
        let render_err = |page: usize, reason: String| CurateError::Render {
            document: document.to_path_buf(),
            page,
            reason,
        };

        let pdfium = self.load_pdfium(document)?;
        let doc = pdfium
            .load_pdf_from_file(document, None)
            .map_err(|e| render_err(0, format!("failed to load PDF: {e}")))?;

        let pages = doc.pages();
        let count = (pages.len() as usize).min(max_pages);

        for index in 0..count {
            let page = pages
                .get(index as u16)
                .map_err(|e| render_err(index, format!("page unavailable: {e}")))?;

            let (width_points, height_points) = (page.width().value, page.height().value);
            let (w, h) = compute_render_dimensions(width_points, height_points, self.dpi);
            if exceeds_dimension_cap(width_points, height_points, self.dpi) {
                warn!(page = index, width = w, height = h, "page dimensions capped");
            }

            let config = PdfRenderConfig::new()
                .set_target_width(w as i32)
                .set_maximum_height(h as i32);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| render_err(index, format!("rendering failed: {e}")))?;

            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(bitmap.as_image().to_rgb8());

            let out_path = preview_path(out_dir, index);
            let file = File::create(&out_path).map_err(|e| CurateError::io(&out_path, e))?;
            let mut writer = BufWriter::new(file);
            rgb.write_to(&mut writer, ImageOutputFormat::Jpeg(self.jpeg_quality))
                .map_err(|e| render_err(index, format!("JPEG encoding failed: {e}")))?;

            debug!(page = index, width = w, height = h, path = %out_path.display(), "rendered preview");
        }

        Ok(count)
    }
}
