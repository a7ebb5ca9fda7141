// tests/compose_render.rs
// Full template render with a real font when one is installed; skipped
// otherwise so CI images without fonts still pass.

use std::path::{Path, PathBuf};

use gurbetci_poster::compose::{
    PostRenderer, TemplateAssets, TemplateCompositor, CANVAS_SIZE,
};

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
];

fn installed_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(|p| PathBuf::from(*p))
        .find(|p| p.exists())
}

#[test]
fn renders_a_full_canvas_with_missing_optional_assets() {
    let Some(font) = installed_font() else {
        eprintln!("no system font found, skipping render test");
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let illustration = dir.path().join("news_image.jpg");
    image::RgbImage::from_pixel(800, 500, image::Rgb([90, 120, 160]))
        .save(&illustration)
        .unwrap();

    // assets dir is empty on purpose; every optional layer degrades to fills
    let assets = TemplateAssets::from_dirs(&dir.path().join("assets"), &font);
    let output = dir.path().join("out/post.png");
    TemplateCompositor::new(assets)
        .render(
            "Meclis yasayı onayladı. Yasa 1 Ocak'ta yürürlüğe girecek. Tüm yabancı uyruklular etkilenecek.",
            &illustration,
            &output,
        )
        .unwrap();

    let rendered = image::open(&output).unwrap();
    assert_eq!(rendered.width(), CANVAS_SIZE);
    assert_eq!(rendered.height(), CANVAS_SIZE);
}

#[test]
fn unreadable_font_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let illustration = dir.path().join("news_image.jpg");
    std::fs::write(&illustration, b"jpg").unwrap();

    let assets = TemplateAssets::from_dirs(
        &dir.path().join("assets"),
        Path::new("/nonexistent/font.ttf"),
    );
    let err = TemplateCompositor::new(assets)
        .render("text", &illustration, &dir.path().join("post.png"))
        .unwrap_err();
    assert!(err.to_string().contains("font"), "got: {err:#}");
}
