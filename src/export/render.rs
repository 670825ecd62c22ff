//! Draw a [`Layout`] with `printpdf`.

use image::DynamicImage;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocument, PdfLayerReference, Point, Rgb, TextMatrix,
};

use super::ExportError;
use super::layout::{
    self, Font, Layout, MARGIN, Op, PAGE_HEIGHT, PAGE_WIDTH,
};

const LAYER: &str = "Contenido";
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;
const PT_PER_MM: f32 = 72.0 / MM_PER_INCH;

const WATERMARK_SIZE: f32 = 80.0;
const WATERMARK_GREY: (u8, u8, u8) = (230, 230, 230);
const WATERMARK_ANGLE: f32 = 45.0;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
            Font::Oblique => &self.oblique,
        }
    }
}

fn color((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn render_error(err: impl std::fmt::Debug) -> ExportError {
    ExportError::Render(format!("{err:?}"))
}

/// PDF space starts at the bottom of the page.
fn flip(y: f32) -> Mm {
    Mm(PAGE_HEIGHT - y)
}

fn watermark(layer: &PdfLayerReference, fonts: &Fonts, text: &str) {
    // Centre the rotated run on the page.
    let half = layout::text_width(text, Font::Regular, WATERMARK_SIZE) / 2.0;
    let offset = half * WATERMARK_ANGLE.to_radians().cos();
    let x = (PAGE_WIDTH / 2.0 - offset) * PT_PER_MM;
    let y = (PAGE_HEIGHT / 2.0 - offset) * PT_PER_MM;

    layer.set_fill_color(color(WATERMARK_GREY));
    layer.begin_text_section();
    layer.set_font(&fonts.regular, WATERMARK_SIZE);
    layer.set_text_matrix(TextMatrix::TranslateRotate(
        printpdf::Pt(x),
        printpdf::Pt(y),
        WATERMARK_ANGLE,
    ));
    layer.write_text(text, &fonts.regular);
    layer.end_text_section();
}

fn rule(layer: &PdfLayerReference, y: f32, thickness: f32) {
    layer.set_outline_color(color((0, 0, 0)));
    layer.set_outline_thickness(thickness * PT_PER_MM);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), flip(y)), false),
            (Point::new(Mm(PAGE_WIDTH - MARGIN), flip(y)), false),
        ],
        is_closed: false,
    });
}

fn picture(
    layer: &PdfLayerReference,
    image: &DynamicImage,
    (x, y, width, height): (f32, f32, f32, f32),
) {
    let natural_width = image.width() as f32 * MM_PER_INCH / IMAGE_DPI;
    let natural_height = image.height() as f32 * MM_PER_INCH / IMAGE_DPI;

    // Alpha channels are dropped, PDF images here are plain RGB.
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    Image::from_dynamic_image(&rgb).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(flip(y + height)),
            scale_x: Some(width / natural_width),
            scale_y: Some(height / natural_height),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

/// Render `plan`. `image` is drawn wherever the plan places the evidence.
pub fn render(
    plan: &Layout,
    image: Option<&DynamicImage>,
    title: &str,
) -> Result<Vec<u8>, ExportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?,
        oblique: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(render_error)?,
    };

    for (index, page) in plan.pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER)
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for op in &page.ops {
            match op {
                Op::Watermark { text } => watermark(&layer, &fonts, text),
                Op::Text {
                    text,
                    x,
                    y,
                    size,
                    font,
                    color: rgb,
                } => {
                    layer.set_fill_color(color(*rgb));
                    layer.use_text(
                        text.as_str(),
                        *size,
                        Mm(*x),
                        flip(*y),
                        fonts.get(*font),
                    );
                },
                Op::Rule { y, thickness } => rule(&layer, *y, *thickness),
                Op::Image {
                    x,
                    y,
                    width,
                    height,
                } => {
                    if let Some(image) = image {
                        picture(&layer, image, (*x, *y, *width, *height));
                    }
                },
            }
        }
    }

    doc.save_to_bytes().map_err(render_error)
}
