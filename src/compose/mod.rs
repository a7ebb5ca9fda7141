// src/compose/mod.rs
//! Template compositor: deterministic 1080x1080 post image. Layering order
//! is fixed: background, flag mark, illustration, body text, divider rule,
//! footer caption, app icon. Missing optional assets degrade to solid fills
//! of the same geometry; only an unreadable font or an unwritable output
//! path fails composition.

pub mod layout;

use anyhow::{anyhow, Context, Result};
use ab_glyph::{point, Font, FontVec, PxScale, PxScaleFont, ScaleFont};
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

use crate::compose::layout::{block_start_y, wrap_text, GlyphAdvance};

pub const CANVAS_SIZE: u32 = 1080;

const BACKGROUND_COLOR: Rgba<u8> = Rgba([20, 25, 45, 255]);
const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([50, 55, 75, 255]);
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const FOOTER_COLOR: Rgba<u8> = Rgba([180, 180, 180, 255]);

const FLAG_POS: (i64, i64) = (1000, 30);
const FLAG_SIZE: (u32, u32) = (50, 50);
const ICON_POS: (i64, i64) = (950, 950);
const ICON_SIZE: (u32, u32) = (100, 100);
const ILLUSTRATION_POS: (i64, i64) = (190, 140);
const ILLUSTRATION_SIZE: (u32, u32) = (700, 400);
const ILLUSTRATION_RADIUS: u32 = 20;

const TEXT_X: i32 = 60;
const TEXT_MAX_WIDTH: f32 = 960.0;
const LINE_HEIGHT: i32 = 55;
pub const BODY_FONT_SIZE: f32 = 38.0;
pub const LETTER_SPACING: f32 = -0.5;
/// Summaries are three sentences; four wrapped lines is the hard ceiling
/// that keeps the block on-canvas above the illustration.
pub const MAX_BODY_LINES: usize = 4;

const DIVIDER_Y: i32 = 860;
const DIVIDER_SPAN: (i32, i32) = (60, 400);
const DIVIDER_THICKNESS: i32 = 2;
const DIVIDER_ALPHA: f32 = 100.0 / 255.0;
const TEXT_BOTTOM_GAP: i32 = 30;
/// The body block is placed backward from here, never forward from a top.
pub const BOTTOM_ANCHOR: i32 = DIVIDER_Y - TEXT_BOTTOM_GAP;

const FOOTER_FONT_SIZE: f32 = 24.0;
const FOOTER_Y: i32 = 890;
const FOOTER_STEP: i32 = 30;
const FOOTER_TEXT: &str =
    "Daha fazlası için Google Play veya App Store'dan\nGurbetci SuperApp'i ücretsiz indir.";

/// File locations of the optional template assets plus the required font.
#[derive(Debug, Clone)]
pub struct TemplateAssets {
    pub background: PathBuf,
    pub flag: PathBuf,
    pub icon: PathBuf,
    pub font: PathBuf,
}

impl TemplateAssets {
    pub fn from_dirs(assets_dir: &Path, font_path: &Path) -> Self {
        Self {
            background: assets_dir.join("background.png"),
            flag: assets_dir.join("flag.png"),
            icon: assets_dir.join("icon.png"),
            font: font_path.to_path_buf(),
        }
    }
}

/// Render seam between the orchestrator and the concrete compositor.
pub trait PostRenderer: Send + Sync {
    fn render(&self, text: &str, illustration: &Path, output: &Path) -> Result<()>;
}

pub struct TemplateCompositor {
    assets: TemplateAssets,
}

impl TemplateCompositor {
    pub fn new(assets: TemplateAssets) -> Self {
        Self { assets }
    }
}

impl PostRenderer for TemplateCompositor {
    fn render(&self, text: &str, illustration: &Path, output: &Path) -> Result<()> {
        let font_bytes = fs::read(&self.assets.font)
            .with_context(|| format!("reading font {}", self.assets.font.display()))?;
        let font = FontVec::try_from_vec(font_bytes)
            .map_err(|_| anyhow!("invalid font file {}", self.assets.font.display()))?;

        // 1) background
        let mut canvas = match image::open(&self.assets.background) {
            Ok(img) => img
                .resize_exact(CANVAS_SIZE, CANVAS_SIZE, imageops::FilterType::Lanczos3)
                .to_rgba8(),
            Err(e) => {
                tracing::warn!(error = %e, "background asset missing, using solid fill");
                RgbaImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, BACKGROUND_COLOR)
            }
        };

        // 2) flag mark, top-right
        paste_or_placeholder(&mut canvas, &self.assets.flag, FLAG_POS, FLAG_SIZE, 0);

        // 3) illustration, center, aspect-fill + rounded corners
        let illo = match image::open(illustration) {
            Ok(img) => {
                let mut filled =
                    aspect_fill(&img, ILLUSTRATION_SIZE.0, ILLUSTRATION_SIZE.1);
                round_corners(&mut filled, ILLUSTRATION_RADIUS);
                filled
            }
            Err(e) => {
                tracing::warn!(error = %e, "illustration unreadable, using placeholder");
                let mut filled = RgbaImage::from_pixel(
                    ILLUSTRATION_SIZE.0,
                    ILLUSTRATION_SIZE.1,
                    PLACEHOLDER_COLOR,
                );
                round_corners(&mut filled, ILLUSTRATION_RADIUS);
                filled
            }
        };
        imageops::overlay(&mut canvas, &illo, ILLUSTRATION_POS.0, ILLUSTRATION_POS.1);

        // 4) body text, bottom-anchored above the divider
        let advance = FontAdvance::new(&font, BODY_FONT_SIZE);
        let mut lines = wrap_text(&advance, LETTER_SPACING, TEXT_MAX_WIDTH, text);
        if lines.len() > MAX_BODY_LINES {
            tracing::warn!(lines = lines.len(), "body text too tall, clamping");
            lines.truncate(MAX_BODY_LINES);
        }
        let mut y = block_start_y(BOTTOM_ANCHOR, lines.len(), LINE_HEIGHT);
        for line in &lines {
            draw_text_line(
                &mut canvas,
                &font,
                BODY_FONT_SIZE,
                TEXT_X as f32,
                y as f32,
                LETTER_SPACING,
                TEXT_COLOR,
                line,
            );
            y += LINE_HEIGHT;
        }

        // 5) divider rule
        for x in DIVIDER_SPAN.0..DIVIDER_SPAN.1 {
            for dy in 0..DIVIDER_THICKNESS {
                blend_px(&mut canvas, x, DIVIDER_Y + dy, TEXT_COLOR, DIVIDER_ALPHA);
            }
        }

        // 6) footer caption
        let mut fy = FOOTER_Y;
        for line in FOOTER_TEXT.split('\n') {
            draw_text_line(
                &mut canvas,
                &font,
                FOOTER_FONT_SIZE,
                TEXT_X as f32,
                fy as f32,
                0.0,
                FOOTER_COLOR,
                line,
            );
            fy += FOOTER_STEP;
        }

        // 7) app icon, bottom-right
        paste_or_placeholder(&mut canvas, &self.assets.icon, ICON_POS, ICON_SIZE, 0);

        // 8) write out
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        canvas
            .save(output)
            .with_context(|| format!("writing rendered post {}", output.display()))?;
        tracing::info!(output = %output.display(), lines = lines.len(), "post image rendered");
        Ok(())
    }
}

/// Scale so the shorter dimension covers the target box, then center-crop
/// the longer one. Never stretches, never letterboxes.
pub fn aspect_fill(img: &DynamicImage, target_w: u32, target_h: u32) -> RgbaImage {
    let (w, h) = (img.width().max(1), img.height().max(1));
    let scale = (target_w as f32 / w as f32).max(target_h as f32 / h as f32);
    let new_w = ((w as f32 * scale).round() as u32).max(target_w);
    let new_h = ((h as f32 * scale).round() as u32).max(target_h);
    let resized = img.resize_exact(new_w, new_h, imageops::FilterType::Lanczos3);
    let left = (new_w - target_w) / 2;
    let top = (new_h - target_h) / 2;
    resized.crop_imm(left, top, target_w, target_h).to_rgba8()
}

/// Zero out alpha outside the corner circles of radius `radius`.
pub fn round_corners(img: &mut RgbaImage, radius: u32) {
    let (w, h) = img.dimensions();
    let r = radius as f32;
    for y in 0..h {
        for x in 0..w {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let cx = if px < r {
                Some(r)
            } else if px > w as f32 - r {
                Some(w as f32 - r)
            } else {
                None
            };
            let cy = if py < r {
                Some(r)
            } else if py > h as f32 - r {
                Some(h as f32 - r)
            } else {
                None
            };
            if let (Some(cx), Some(cy)) = (cx, cy) {
                let dx = px - cx;
                let dy = py - cy;
                if dx * dx + dy * dy > r * r {
                    img.get_pixel_mut(x, y)[3] = 0;
                }
            }
        }
    }
}

fn paste_or_placeholder(
    canvas: &mut RgbaImage,
    asset: &Path,
    pos: (i64, i64),
    size: (u32, u32),
    radius: u32,
) {
    match image::open(asset) {
        Ok(img) => {
            let scaled = img
                .resize_exact(size.0, size.1, imageops::FilterType::Lanczos3)
                .to_rgba8();
            imageops::overlay(canvas, &scaled, pos.0, pos.1);
        }
        Err(e) => {
            tracing::warn!(asset = %asset.display(), error = %e, "asset missing, using solid fill");
            let mut fill = RgbaImage::from_pixel(size.0, size.1, PLACEHOLDER_COLOR);
            if radius > 0 {
                round_corners(&mut fill, radius);
            }
            imageops::overlay(canvas, &fill, pos.0, pos.1);
        }
    }
}

/// Glyph advances for the wrap algorithm, backed by real font metrics.
pub struct FontAdvance<'f> {
    scaled: PxScaleFont<&'f FontVec>,
}

impl<'f> FontAdvance<'f> {
    pub fn new(font: &'f FontVec, size: f32) -> Self {
        Self {
            scaled: font.as_scaled(PxScale::from(size)),
        }
    }
}

impl GlyphAdvance for FontAdvance<'_> {
    fn advance(&self, c: char) -> f32 {
        self.scaled.h_advance(self.scaled.glyph_id(c))
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_text_line(
    canvas: &mut RgbaImage,
    font: &FontVec,
    size: f32,
    x: f32,
    top_y: f32,
    spacing: f32,
    color: Rgba<u8>,
    text: &str,
) {
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);
    let baseline = top_y + scaled.ascent();
    let mut pen_x = x;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        let glyph = id.with_scale_and_position(scale, point(pen_x, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                blend_px(canvas, px, py, color, coverage);
            });
        }
        pen_x += scaled.h_advance(id) + spacing;
    }
}

fn blend_px(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, alpha: f32) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let a = (color[3] as f32 / 255.0 * alpha).clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        dst[i] = (color[i] as f32 * a + dst[i] as f32 * (1.0 - a)).round() as u8;
    }
    dst[3] = dst[3].max((a * 255.0).round() as u8);
}
