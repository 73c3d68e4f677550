use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::foundation::color::CyclePalette;

struct CountingRaster {
    inner: FixedAdvanceRasterizer,
    renders: AtomicUsize,
    measures: AtomicUsize,
}

impl CountingRaster {
    fn new() -> Self {
        Self {
            inner: FixedAdvanceRasterizer::default(),
            renders: AtomicUsize::new(0),
            measures: AtomicUsize::new(0),
        }
    }
}

impl TextRasterizer for CountingRaster {
    fn measure(&self, text: &str) -> ChatResult<u32> {
        self.measures.fetch_add(1, Ordering::SeqCst);
        self.inner.measure(text)
    }

    fn render(&self, text: &str, color: Rgba<u8>) -> ChatResult<RgbaImage> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.inner.render(text, color)
    }
}

#[test]
fn fixed_advance_measures_graphemes() {
    let r = FixedAdvanceRasterizer {
        advance: 6,
        height: 10,
    };
    assert_eq!(r.measure("abc").unwrap(), 18);
    assert_eq!(r.measure(" ").unwrap(), 6);
    assert_eq!(r.measure("e\u{301}").unwrap(), 6);
    assert_eq!(r.measure("").unwrap(), 0);
}

#[test]
fn fixed_advance_renders_boxes_and_blank_spaces() {
    let r = FixedAdvanceRasterizer {
        advance: 6,
        height: 10,
    };
    let red = Rgba([255, 0, 0, 255]);
    let img = r.render("a b", red).unwrap();
    assert_eq!(img.dimensions(), (18, 10));
    assert_eq!(img.get_pixel(2, 5), &red);
    assert_eq!(img.get_pixel(8, 5)[3], 0);
    assert_eq!(img.get_pixel(14, 5), &red);
    assert_eq!(img.get_pixel(0, 5)[3], 0);
}

#[test]
fn glyph_cache_memoizes_by_text_and_color() {
    let raster = Arc::new(CountingRaster::new());
    let mut cache = GlyphCache::new(raster.clone());
    let white = Rgba([255, 255, 255, 255]);
    let red = Rgba([255, 0, 0, 255]);

    let a = cache.glyph("hello", white).unwrap();
    let b = cache.glyph("hello", white).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    cache.glyph("hello", red).unwrap();
    assert_eq!(raster.renders.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);

    assert_eq!(cache.width("hello").unwrap(), 35);
    assert_eq!(cache.width("hello").unwrap(), 35);
    assert_eq!(raster.measures.load(Ordering::SeqCst), 1);
}

#[test]
fn uncolored_names_keep_their_first_pick() {
    let raster: Arc<dyn TextRasterizer> = Arc::new(FixedAdvanceRasterizer::default());
    let mut cache = GlyphCache::new(raster);
    let red = Rgba([255, 0, 0, 255]);
    let blue = Rgba([0, 0, 255, 255]);
    let mut colors = CyclePalette::new(vec![red, blue]);

    let first = cache.name_glyph("viewer", None, &mut colors).unwrap();
    let again = cache.name_glyph("viewer", None, &mut colors).unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(first.get_pixel(3, 7), &red);

    let other = cache.name_glyph("someone", None, &mut colors).unwrap();
    assert_eq!(other.get_pixel(3, 7), &blue);

    let explicit = cache.name_glyph("viewer", Some(red), &mut colors).unwrap();
    assert!(!Arc::ptr_eq(&first, &explicit));
}

#[test]
fn escape_xml_handles_markup_and_controls() {
    assert_eq!(escape_xml("<a & 'b'>"), "&lt;a &amp; &apos;b&apos;&gt;");
    assert_eq!(escape_xml("x\u{7}y"), "xy");
}

#[test]
fn svg_rasterizer_inks_text_with_any_installed_face() {
    let Ok(r) = SvgTextRasterizer::new(&[]) else {
        return;
    };
    let w = r.measure("Kappa").unwrap();
    assert!(w > 0);
    let img = r.render("Kappa", Rgba([255, 255, 255, 255])).unwrap();
    assert_eq!(img.width(), w);
    assert!(img.pixels().any(|p| p[3] > 0));
    assert!(r.measure("a b").unwrap() > r.measure("ab").unwrap());
}

#[test]
fn font_resolver_falls_back_when_named_families_are_missing() {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    if db.len() == 0 {
        return;
    }
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="20"><text x="0" y="12" font-family="NoSuchFamilyAnywhere" font-size="12">Kappa</text></svg>"#;
    let opts = usvg::Options {
        fontdb: Arc::new(db),
        font_resolver: make_font_resolver(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &opts).unwrap();
    assert!(tree.root().abs_bounding_box().width() > 0.0);
}
