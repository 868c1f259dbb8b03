use crate::config::{AppConfig, AssetsConfig, LayoutConfig};
use crate::core::layout::{compute_layout, BlockSize, Position};
use crate::utils::error::{Result, StoryError};
use ab_glyph::{point, Font, FontArc, OutlinedGlyph, PxScale, ScaleFont};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 同一個字型檔配上固定大小
#[derive(Clone)]
pub struct FontFace {
    font: FontArc,
    scale: PxScale,
}

impl FontFace {
    /// `size` 是 em 的像素大小
    pub fn new(font: FontArc, size: f32) -> Self {
        let scale = match font.units_per_em() {
            Some(upem) if upem > 0.0 => PxScale::from(size * font.height_unscaled() / upem),
            _ => PxScale::from(size),
        };
        Self { font, scale }
    }

    fn outline_line(&self, text: &str) -> Vec<OutlinedGlyph> {
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = 0.0;
        let mut previous = None;
        let mut glyphs = Vec::new();

        for c in text.chars().filter(|c| !c.is_control()) {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(self.scale, point(caret, scaled.ascent()));
            caret += scaled.h_advance(id);
            previous = Some(id);

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                glyphs.push(outlined);
            }
        }
        glyphs
    }

    /// 以字形輪廓計算實際外框，沒有筆畫時回傳 `None`
    pub fn measure(&self, text: &str) -> Option<TextBounds> {
        ink_bounds(&self.outline_line(text))
    }
}

/// 以文字原點 (上緣為 ascent) 為基準的筆畫外框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl TextBounds {
    pub fn size(&self) -> BlockSize {
        BlockSize::new(
            (self.max_x - self.min_x).round() as i32,
            (self.max_y - self.min_y).round() as i32,
        )
    }
}

fn ink_bounds(glyphs: &[OutlinedGlyph]) -> Option<TextBounds> {
    glyphs.iter().map(|g| g.px_bounds()).fold(None, |acc, rect| {
        Some(match acc {
            None => TextBounds {
                min_x: rect.min.x,
                min_y: rect.min.y,
                max_x: rect.max.x,
                max_y: rect.max.y,
            },
            Some(b) => TextBounds {
                min_x: b.min_x.min(rect.min.x),
                min_y: b.min_y.min(rect.min.y),
                max_x: b.max_x.max(rect.max.x),
                max_y: b.max_y.max(rect.max.y),
            },
        })
    })
}

#[derive(Clone)]
pub struct FontSet {
    pub date: FontFace,
    pub label: FontFace,
    pub body: FontFace,
}

impl FontSet {
    /// 先試設定的字型，失敗再依序試平台預設字型
    pub fn load(assets: &AssetsConfig, layout: &LayoutConfig) -> Result<Self> {
        let mut tried = Vec::new();
        let candidates = std::iter::once(&assets.font).chain(assets.fallback_fonts.iter());

        for path in candidates {
            tried.push(path.display().to_string());
            match load_font(path) {
                Ok(font) => {
                    if path != &assets.font {
                        tracing::warn!(
                            "⚠️ Font {} unavailable, falling back to {}",
                            assets.font.display(),
                            path.display()
                        );
                    }
                    return Ok(Self::from_font(font, layout));
                }
                Err(e) => tracing::debug!("Font {} not usable: {}", path.display(), e),
            }
        }

        Err(StoryError::FontUnavailable { tried })
    }

    pub fn from_font(font: FontArc, layout: &LayoutConfig) -> Self {
        Self {
            date: FontFace::new(font.clone(), layout.date_font_size),
            label: FontFace::new(font.clone(), layout.label_font_size),
            body: FontFace::new(font, layout.body_font_size),
        }
    }
}

fn load_font(path: &Path) -> Result<FontArc> {
    let data = fs::read(path)?;
    FontArc::try_from_vec(data).map_err(|e| StoryError::ConfigError {
        message: format!("invalid font {}: {}", path.display(), e),
    })
}

pub struct ImageRenderer {
    background: PathBuf,
    output_dir: PathBuf,
    jpeg_quality: u8,
    layout: LayoutConfig,
    text_color: Rgb<u8>,
    fonts: Option<FontSet>,
}

impl ImageRenderer {
    pub fn new(config: &AppConfig) -> Self {
        let fonts = match FontSet::load(&config.assets, &config.layout) {
            Ok(fonts) => Some(fonts),
            Err(e) => {
                tracing::warn!("⚠️ {} - text will not be drawn", e);
                None
            }
        };
        Self::with_fonts(config, fonts)
    }

    pub fn with_fonts(config: &AppConfig, fonts: Option<FontSet>) -> Self {
        Self {
            background: config.assets.background.clone(),
            output_dir: config.output.dir.clone(),
            jpeg_quality: config.output.jpeg_quality,
            layout: config.layout.clone(),
            text_color: Rgb(config.layout.text_color),
            fonts,
        }
    }

    pub fn output_path(&self, label: &str) -> PathBuf {
        let file_stem: String = label
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.output_dir.join(format!("{}.jpg", file_stem))
    }

    /// 把日期、餐別、菜單畫到背景圖上，存成 `<output_dir>/<label>.jpg`
    ///
    /// 背景圖讀不到時回傳 [`StoryError::BackgroundUnavailable`]，不會寫出任何檔案。
    pub fn render(&self, label: &str, menu_text: &str, display_date: &str) -> Result<PathBuf> {
        let mut canvas = match image::open(&self.background) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                tracing::error!(
                    "❌ Cannot load background {}: {}",
                    self.background.display(),
                    e
                );
                return Err(StoryError::BackgroundUnavailable {
                    path: self.background.clone(),
                });
            }
        };

        match &self.fonts {
            Some(fonts) => self.draw_blocks(&mut canvas, fonts, label, menu_text, display_date),
            None => tracing::warn!("⚠️ No font loaded, saving {} without text", label),
        }

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_path(label);
        save_jpeg(&canvas, &path, self.jpeg_quality)?;

        tracing::debug!("Rendered {} to {}", label, path.display());
        Ok(path)
    }

    fn draw_blocks(
        &self,
        canvas: &mut RgbaImage,
        fonts: &FontSet,
        label: &str,
        menu_text: &str,
        display_date: &str,
    ) {
        let date_glyphs = fonts.date.outline_line(display_date);
        let label_glyphs = fonts.label.outline_line(label);
        let line_glyphs: Vec<Vec<OutlinedGlyph>> = menu_text
            .split('\n')
            .map(|line| fonts.body.outline_line(line.trim_end_matches('\r')))
            .collect();

        let date_bounds = ink_bounds(&date_glyphs);
        let label_bounds = ink_bounds(&label_glyphs);
        let line_bounds: Vec<Option<TextBounds>> =
            line_glyphs.iter().map(|g| ink_bounds(g)).collect();

        let block_size = |b: &Option<TextBounds>| b.map(|b| b.size()).unwrap_or(BlockSize::EMPTY);
        let line_sizes: Vec<BlockSize> = line_bounds.iter().map(block_size).collect();

        let plan = compute_layout(
            canvas.width(),
            &self.layout,
            block_size(&date_bounds),
            block_size(&label_bounds),
            &line_sizes,
        );

        self.draw_glyphs(canvas, &date_glyphs, date_bounds, plan.date);
        self.draw_glyphs(canvas, &label_glyphs, label_bounds, plan.label);
        for ((glyphs, bounds), position) in line_glyphs.iter().zip(line_bounds).zip(plan.lines) {
            self.draw_glyphs(canvas, glyphs, bounds, position);
        }
    }

    /// 水平方向讓筆畫左緣落在 `position.x`，垂直方向以文字上緣對齊 `position.y`
    fn draw_glyphs(
        &self,
        canvas: &mut RgbaImage,
        glyphs: &[OutlinedGlyph],
        bounds: Option<TextBounds>,
        position: Position,
    ) {
        let Some(bounds) = bounds else {
            return;
        };
        let origin_x = position.x - bounds.min_x.round() as i32;
        let origin_y = position.y;
        let (width, height) = (canvas.width() as i32, canvas.height() as i32);
        let color = self.text_color;

        for glyph in glyphs {
            let rect = glyph.px_bounds();
            let left = origin_x + rect.min.x as i32;
            let top = origin_y + rect.min.y as i32;
            glyph.draw(|gx, gy, coverage| {
                let px = left + gx as i32;
                let py = top + gy as i32;
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }
                blend(canvas.get_pixel_mut(px as u32, py as u32), color, coverage);
            });
        }
    }
}

fn blend(pixel: &mut Rgba<u8>, color: Rgb<u8>, coverage: f32) {
    let alpha = coverage.clamp(0.0, 1.0);
    for i in 0..3 {
        let base = pixel.0[i] as f32;
        pixel.0[i] = (base + (color.0[i] as f32 - base) * alpha).round() as u8;
    }
    let base_alpha = pixel.0[3] as f32;
    pixel.0[3] = (base_alpha + (255.0 - base_alpha) * alpha).round() as u8;
}

/// JPEG 沒有透明度，先疊到白底
fn flatten(canvas: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let Rgba([r, g, b, a]) = *canvas.get_pixel(x, y);
        let alpha = a as f32 / 255.0;
        let mix = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        Rgb([mix(r), mix(g), mix(b)])
    })
}

fn save_jpeg(canvas: &RgbaImage, path: &Path, quality: u8) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    flatten(canvas).write_with_encoder(encoder)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::centered_x;
    use tempfile::TempDir;

    fn test_config(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.assets.background = dir.join("assets/background.png");
        config.assets.font = dir.join("assets/missing-font.otf");
        config.assets.fallback_fonts = vec![];
        config.output.dir = dir.join("outputs");
        config
    }

    fn write_background(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbaImage::from_pixel(width, height, Rgba([255, 240, 220, 255]))
            .save(path)
            .unwrap();
    }

    fn system_font() -> Option<FontArc> {
        AssetsConfig::default()
            .fallback_fonts
            .iter()
            .find_map(|p| load_font(p).ok())
    }

    #[test]
    fn test_missing_background_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let renderer = ImageRenderer::with_fonts(&config, None);

        let result = renderer.render("중식", "된장찌개\n흰밥", "2024년 09월 05일 (목)");

        assert!(matches!(
            result,
            Err(StoryError::BackgroundUnavailable { .. })
        ));
        assert!(!config.output.dir.exists());
    }

    #[test]
    fn test_missing_font_still_renders_background() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        write_background(&config.assets.background, 360, 640);

        assert!(FontSet::load(&config.assets, &config.layout).is_err());
        let renderer = ImageRenderer::new(&config);
        let path = renderer.render("석식", "카레라이스", "2024년 09월 05일 (목)").unwrap();

        assert_eq!(path, config.output.dir.join("석식.jpg"));
        assert!(fs::metadata(&path).unwrap().len() > 0);
        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (360, 640));
    }

    #[test]
    fn test_output_is_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        write_background(&config.assets.background, 100, 100);
        let renderer = ImageRenderer::with_fonts(&config, None);

        let first = renderer.render("조식", "", "").unwrap();
        let second = renderer.render("조식", "", "").unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_dir(&config.output.dir).unwrap().count(), 1);
    }

    #[test]
    fn test_output_path_sanitizes_separators() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let renderer = ImageRenderer::with_fonts(&config, None);
        assert_eq!(
            renderer.output_path("a/b"),
            config.output.dir.join("a_b.jpg")
        );
    }

    #[test]
    fn test_blocks_are_centered_for_latin_and_hangul() {
        let Some(font) = system_font() else {
            eprintln!("no system font available, skipping glyph measurement test");
            return;
        };
        let layout = LayoutConfig::default();
        let fonts = FontSet::from_font(font, &layout);

        let latin = fonts.body.measure("Lunch").unwrap().size();
        assert!(latin.width > 0 && latin.height > 0);

        for sample in ["Lunch", "된장찌개"] {
            // 字型沒有韓文字形時會畫成 .notdef
            let size = fonts
                .body
                .measure(sample)
                .map(|b| b.size())
                .unwrap_or(BlockSize::EMPTY);

            let plan = compute_layout(1080, &layout, size, size, &[size]);
            assert_eq!(plan.lines[0].x, (1080 - size.width) / 2);
            assert_eq!(plan.date.x, centered_x(1080, size.width));
        }

        // 比例字型：寬度跟字數不成正比
        let narrow = fonts.body.measure("iiii").unwrap().size();
        let wide = fonts.body.measure("WWWW").unwrap().size();
        assert!(narrow.width < wide.width);
    }

    #[test]
    fn test_rendered_text_changes_pixels() {
        let Some(font) = system_font() else {
            eprintln!("no system font available, skipping draw test");
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        write_background(&config.assets.background, 600, 800);

        let fonts = FontSet::from_font(font, &config.layout);
        let renderer = ImageRenderer::with_fonts(&config, Some(fonts));
        let path = renderer.render("Lunch", "Rice\nSoup", "2024-09-05").unwrap();

        let saved = image::open(&path).unwrap().to_rgb8();
        let dark_pixels = saved.pixels().filter(|p| p.0.iter().all(|c| *c < 100)).count();
        assert!(dark_pixels > 0);
    }
}
