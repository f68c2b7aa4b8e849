use crate::screen::{LineStyle, Screen};
use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use anyhow::{anyhow, Context, Result};
use preflook_core::Region;
use preflook_experiment::Snapshot;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Rect, Stroke, Transform};

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First readable font from a list of common system locations
pub fn find_system_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {:?}", path))?;
    FontVec::try_from_vec(bytes).map_err(|e| anyhow!("invalid font {:?}: {}", path, e))
}

const BACKGROUND: [u8; 4] = [0, 0, 0, 255];
const TEXT: [u8; 4] = [255, 255, 255, 255];
const HINT: [u8; 4] = [150, 150, 150, 255];

fn region_color(region: Region) -> [u8; 4] {
    match region {
        Region::Away => [120, 120, 120, 255],
        Region::Left => [60, 130, 235, 255],
        Region::Right => [235, 150, 50, 255],
    }
}

/// Fraction of the bar track each region fills.
///
/// The track spans the elapsed time, but never less than one second so the
/// first frames don't jump to full width.
pub fn bar_fractions(snapshot: &Snapshot) -> [f32; 3] {
    let span = snapshot.elapsed.max(Duration::from_secs(1)).as_secs_f32();
    Region::ALL.map(|r| (snapshot.dwell[r].as_secs_f32() / span).clamp(0.0, 1.0))
}

/// Software renderer for the window front-end
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    font: FontVec,
    canvas: Pixmap,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: FontVec) -> Result<Self> {
        let canvas = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| anyhow!("Failed to create {}x{} canvas", width, height))?;
        Ok(Self {
            width: width.max(1),
            height: height.max(1),
            font,
            canvas,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| anyhow!("Failed to resize canvas to {}x{}", width, height))?;
        self.width = width.max(1);
        self.height = height.max(1);
        Ok(())
    }

    fn line_height(&self) -> f32 {
        (self.height as f32 / 24.0).clamp(18.0, 48.0)
    }

    /// Draws `screen` and copies the result into an RGBA frame buffer.
    pub fn render_frame(&mut self, screen: &Screen, frame: &mut [u8]) -> Result<()> {
        self.render(screen);
        let data = self.canvas.data();
        if frame.len() != data.len() {
            return Err(anyhow!(
                "frame buffer is {} bytes, canvas is {}",
                frame.len(),
                data.len()
            ));
        }
        frame.copy_from_slice(data);
        Ok(())
    }

    pub fn render(&mut self, screen: &Screen) {
        let [r, g, b, a] = BACKGROUND;
        self.canvas.fill(Color::from_rgba8(r, g, b, a));

        let line_height = self.line_height();
        let centre = self.height as f32 / 2.0;
        let margin = self.width as f32 * 0.08;

        for line in screen.lines() {
            let (size, color) = match line.style {
                LineStyle::Title => (line_height * 1.2, TEXT),
                LineStyle::Body => (line_height * 0.8, TEXT),
                LineStyle::Hint => (line_height * 0.7, HINT),
            };
            // the terminal underline has no place on a real canvas
            if line.style == LineStyle::Title && line.text.chars().all(|c| c == '=') {
                continue;
            }
            let y = centre + line.offset as f32 * line_height - line_height;
            self.draw_text(&line.text, margin, y, size, color);
        }

        if let Screen::Status { snapshot, .. } = screen {
            self.draw_bars(snapshot, centre + 5.0 * line_height, line_height);
        }
    }

    fn draw_bars(&mut self, snapshot: &Snapshot, top: f32, line_height: f32) {
        let margin = self.width as f32 * 0.08;
        let track = self.width as f32 - 2.0 * margin;
        let bar_height = line_height * 0.6;

        for (i, (region, fraction)) in Region::ALL
            .into_iter()
            .zip(bar_fractions(snapshot))
            .enumerate()
        {
            let y = top + i as f32 * line_height;
            let [r, g, b, a] = region_color(region);
            let mut paint = Paint::default();
            paint.set_color(Color::from_rgba8(r, g, b, a));

            let width = (track * fraction).max(1.0);
            if let Some(rect) = Rect::from_xywh(margin, y, width, bar_height) {
                self.canvas.fill_rect(rect, &paint, Transform::identity(), None);
            }

            if region == snapshot.focus {
                let outline = Rect::from_xywh(margin - 3.0, y - 3.0, track + 6.0, bar_height + 6.0);
                if let Some(outline) = outline {
                    let path = PathBuilder::from_rect(outline);
                    let mut stroke_paint = Paint::default();
                    stroke_paint.set_color(Color::from_rgba8(255, 255, 255, 255));
                    let stroke = Stroke {
                        width: 2.0,
                        ..Stroke::default()
                    };
                    self.canvas.stroke_path(
                        &path,
                        &stroke_paint,
                        &stroke,
                        Transform::identity(),
                        None,
                    );
                }
            }
        }
    }

    /// Rasterizes `text` with its top-left at (x, y), blending premultiplied
    /// glyph coverage over the canvas.
    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: [u8; 4]) {
        let scale = PxScale::from(font_size);
        let sf = self.font.as_scaled(scale);

        let mut pen_x = x;
        let mut glyphs = Vec::<Glyph>::with_capacity(text.len());
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = glyphs.last() {
                pen_x += sf.kern(prev.id, id);
            }
            glyphs.push(Glyph {
                id,
                scale,
                position: point(pen_x, y + sf.ascent()),
            });
            pen_x += sf.h_advance(id);
        }

        let w = self.canvas.width() as i32;
        let h = self.canvas.height() as i32;
        let stride = self.canvas.width() as usize;
        let dst = self.canvas.pixels_mut();

        for g in glyphs {
            let Some(out) = self.font.outline_glyph(g) else {
                continue;
            };
            let b = out.px_bounds();
            out.draw(|gx, gy, cov| {
                if cov <= f32::EPSILON {
                    return;
                }
                let ix = b.min.x as i32 + gx as i32;
                let iy = b.min.y as i32 + gy as i32;
                if ix < 0 || iy < 0 || ix >= w || iy >= h {
                    return;
                }
                let i = iy as usize * stride + ix as usize;

                // Porter-Duff over in premultiplied space: out = src + bg * (1 - src.a)
                let a_lin = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
                let sa = (a_lin * 255.0) as u8;
                let inv = 1.0 - a_lin;
                let bg = dst[i];
                let over = |src: u8, dst: u8| {
                    ((src as f32 * a_lin) as u8).saturating_add((dst as f32 * inv) as u8)
                };
                let r = over(color[0], bg.red());
                let gr = over(color[1], bg.green());
                let bl = over(color[2], bg.blue());
                let a = sa.saturating_add((bg.alpha() as f32 * inv) as u8);

                if let Some(px) = PremultipliedColorU8::from_rgba(r.min(a), gr.min(a), bl.min(a), a)
                {
                    dst[i] = px;
                }
            });
        }
    }
}
