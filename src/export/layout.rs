//! Page plan of an exported report.
//!
//! Coordinates are millimetres from the top-left corner of an A4 page. The
//! plan holds no PDF state, so pagination can be checked without rendering.

use chrono::DateTime;

use super::font::advance;
use crate::model::ReportData;

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 20.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN * 2.0;

pub const IMAGE_NOTICE: &str = "No se pudo cargar la imagen.";
const TITLE: &str = "Informe Oficial de Riesgos";
const VALUE_OFFSET: f32 = 50.0;
const SECTION_RESERVE: f32 = 20.0;
const FOOTER_OFFSET: f32 = 10.0;

const BLACK: Rgb = (0, 0, 0);
const FOOTER_GREY: Rgb = (150, 150, 150);

/// Millimetres per typographic point.
const MM_PER_PT: f32 = 0.3528;

pub type Rgb = (u8, u8, u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

/// Drawing instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Diagonal text across the page centre.
    Watermark { text: String },
    /// `y` is the baseline.
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        color: Rgb,
    },
    /// Horizontal line across the content width. Thickness in mm.
    Rule { y: f32, thickness: f32 },
    /// Evidence photo; `y` is the top edge.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<Op>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    /// Every text drawn, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|page| {
            page.ops.iter().filter_map(|op| match op {
                Op::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
        })
    }
}

/// State of the evidence photo before layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evidence {
    /// Report has no image.
    None,
    /// Image exists but could not be loaded.
    Unavailable,
    /// Pixel size of the decoded image.
    Loaded { width: u32, height: u32 },
}

/// Names printed on every page.
#[derive(Clone, Copy, Debug)]
pub struct Branding<'a> {
    pub watermark: &'a str,
    pub product: &'a str,
}

/// Width of `text` set in `font` at `size` points, in mm.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(advance(c, font))).sum();
    units as f32 * size / 1000.0 * MM_PER_PT
}

/// Greedy word wrap on measured widths. Explicit newlines are kept, and
/// words wider than a line are split.
pub fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let space = text_width(" ", font, size);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut width = 0.0;

        for word in paragraph.split_whitespace() {
            let word_width = text_width(word, font, size);

            if word_width > max_width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                width = 0.0;
                for c in word.chars() {
                    let glyph = text_width(c.encode_utf8(&mut [0; 4]), font, size);
                    if !line.is_empty() && width + glyph > max_width {
                        lines.push(std::mem::take(&mut line));
                        width = 0.0;
                    }
                    line.push(c);
                    width += glyph;
                }
                continue;
            }

            if line.is_empty() {
                width = word_width;
            } else if width + space + word_width > max_width {
                lines.push(std::mem::take(&mut line));
                width = word_width;
            } else {
                line.push(' ');
                width += space + word_width;
            }
            line.push_str(word);
        }

        lines.push(line);
    }

    lines
}

/// Local-style timestamp, or the raw value when it does not parse.
pub fn format_date(date: &str) -> String {
    match DateTime::parse_from_rfc3339(date) {
        Ok(date) => date.format("%d/%m/%Y, %H:%M:%S").to_string(),
        Err(_) if date.is_empty() => "N/A".to_owned(),
        Err(_) => date.to_owned(),
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

struct Composer<'a> {
    pages: Vec<Page>,
    y: f32,
    branding: Branding<'a>,
}

impl<'a> Composer<'a> {
    fn new(branding: Branding<'a>) -> Self {
        let mut composer = Self {
            pages: Vec::new(),
            y: MARGIN,
            branding,
        };
        composer.add_page();
        composer
    }

    fn add_page(&mut self) {
        self.pages.push(Page {
            ops: vec![Op::Watermark {
                text: self.branding.watermark.to_owned(),
            }],
        });
        self.y = MARGIN;
    }

    fn push(&mut self, op: Op) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn text(&mut self, text: &str, x: f32, size: f32, font: Font, color: Rgb) {
        self.push(Op::Text {
            text: text.to_owned(),
            x,
            y: self.y,
            size,
            font,
            color,
        });
    }

    fn rule(&mut self, thickness: f32) {
        self.push(Op::Rule {
            y: self.y,
            thickness,
        });
    }

    fn field(&mut self, label: &str, value: &str) {
        self.text(label, MARGIN, 10.0, Font::Bold, BLACK);
        self.text(value, MARGIN + VALUE_OFFSET, 10.0, Font::Regular, BLACK);
        self.y += 7.0;
    }

    fn heading(&mut self, title: &str) {
        self.text(title, MARGIN, 12.0, Font::Bold, BLACK);
        self.y += 5.0;
        self.rule(0.2);
        self.y += 7.0;
    }

    fn image(&mut self, width: u32, height: u32) {
        let mut draw_width = CONTENT_WIDTH;
        let mut draw_height = height as f32 * CONTENT_WIDTH / width.max(1) as f32;

        // Never taller than a whole page.
        let max_height = PAGE_HEIGHT - MARGIN * 2.0;
        if draw_height > max_height {
            draw_width *= max_height / draw_height;
            draw_height = max_height;
        }

        if self.y + draw_height > PAGE_HEIGHT - MARGIN {
            self.add_page();
        }

        self.push(Op::Image {
            x: MARGIN,
            y: self.y,
            width: draw_width,
            height: draw_height,
        });
        self.y += draw_height + 10.0;
    }

    fn section(&mut self, title: &str, content: &str) {
        if self.y > PAGE_HEIGHT - MARGIN - SECTION_RESERVE {
            self.add_page();
        }
        self.heading(title);

        for line in wrap(content, Font::Regular, 10.0, CONTENT_WIDTH) {
            if self.y > PAGE_HEIGHT - MARGIN {
                self.add_page();
            }
            self.text(&line, MARGIN, 10.0, Font::Regular, BLACK);
            self.y += 5.0;
        }
        self.y += 5.0;
    }

    /// Footers need the final page count, so they are written last.
    fn finish(mut self) -> Layout {
        let total = self.pages.len();

        for (index, page) in self.pages.iter_mut().enumerate() {
            let text = format!(
                "Página {} de {total} | Documento generado por {}",
                index + 1,
                self.branding.product
            );
            let x = (PAGE_WIDTH - text_width(&text, Font::Regular, 8.0)) / 2.0;

            page.ops.push(Op::Text {
                text,
                x,
                y: PAGE_HEIGHT - FOOTER_OFFSET,
                size: 8.0,
                font: Font::Regular,
                color: FOOTER_GREY,
            });
        }

        Layout { pages: self.pages }
    }
}

/// Lay out `report` on A4 pages.
pub fn compose(report: &ReportData, evidence: Evidence, branding: Branding) -> Layout {
    let mut doc = Composer::new(branding);

    doc.text(TITLE, MARGIN, 24.0, Font::Bold, BLACK);
    doc.y += 10.0;
    doc.rule(0.5);
    doc.y += 10.0;

    doc.field("Número de Trámite:", or_na(report.id()));
    doc.field("Fecha y Hora:", &format_date(&report.date));
    doc.field("Ubicación:", or_na(&report.location));
    doc.field("Estado:", "Abierta");
    doc.y += 5.0;

    let user = &report.user;
    doc.heading("Usuario que Reporta");
    doc.field("Nombre:", &user.name);
    doc.field("Rol:", user.role.label());
    doc.field("DNI:", &user.dni);
    doc.field("Correo Electrónico:", &user.email);
    doc.y += 5.0;

    doc.text("Nivel de Riesgo:", MARGIN, 10.0, Font::Bold, BLACK);
    doc.text(
        report.risk_level.label(),
        MARGIN + VALUE_OFFSET,
        10.0,
        Font::Bold,
        report.risk_level.rgb(),
    );
    doc.y += 15.0;

    match evidence {
        Evidence::None => {},
        Evidence::Unavailable => {
            doc.text(IMAGE_NOTICE, MARGIN, 10.0, Font::Oblique, BLACK);
            doc.y += 10.0;
        },
        Evidence::Loaded { width, height } => doc.image(width, height),
    }

    doc.section("Descripción de la Anomalía", &report.anomaly_description);
    doc.section("Recomendación de EPP", &report.ppe_recommendation);
    doc.section(
        "Sugerencia de Infraestructura",
        &report.infrastructure_suggestion,
    );
    doc.section("Referencia Legal (Dec. 351/79)", &report.legal_reference);

    doc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RiskLevel, User};

    const BRANDING: Branding = Branding {
        watermark: "Guardián IA",
        product: "Guardián IA",
    };

    fn report(body: &str) -> ReportData {
        ReportData {
            id: Some("rep1".into()),
            risk_level: RiskLevel::Rojo,
            anomaly_description: body.into(),
            ppe_recommendation: "Guantes dieléctricos.".into(),
            infrastructure_suggestion: "Canalizar cableado.".into(),
            legal_reference: "Ley 19.587, Anexo IV.".into(),
            location: "Sótano".into(),
            date: "2024-07-28T14:30:00Z".into(),
            image_url: String::default(),
            user: crate::fixtures::users().remove(3),
            evidence: None,
        }
    }

    fn footer(layout: &Layout, page: usize) -> &str {
        match layout.pages[page].ops.last() {
            Some(Op::Text { text, .. }) => text,
            other => panic!("expected footer, got {other:?}"),
        }
    }

    #[test]
    fn test_text_width() {
        assert!((text_width("A", Font::Regular, 10.0) - 2.353).abs() < 0.001);
        assert!(text_width("W", Font::Regular, 10.0) > text_width("i", Font::Regular, 10.0) * 4.0);
        assert!(text_width("palabra", Font::Bold, 10.0) > text_width("palabra", Font::Regular, 10.0));
        assert_eq!(
            text_width("palabra", Font::Oblique, 10.0),
            text_width("palabra", Font::Regular, 10.0)
        );
        assert_eq!(text_width("", Font::Bold, 24.0), 0.0);
    }

    #[test]
    fn test_wrap() {
        let wrap10 = |text: &str| wrap(text, Font::Regular, 10.0, CONTENT_WIDTH);

        assert!(wrap("", Font::Regular, 10.0, 50.0).is_empty());
        assert_eq!(wrap10("uno dos"), vec!["uno dos"]);
        assert_eq!(wrap10("uno\ndos"), vec!["uno", "dos"]);

        let long = "palabra ".repeat(30);
        let lines = wrap10(&long);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| text_width(l, Font::Regular, 10.0) <= CONTENT_WIDTH));
        assert_eq!(lines.join(" ").split_whitespace().count(), 30);

        // An `x` is half an em wide, so 96 fit on a line.
        let word = "x".repeat(200);
        let lines = wrap10(&word);
        assert_eq!(lines.iter().map(|l| l.len()).collect::<Vec<_>>(), [96, 96, 8]);
    }

    #[test]
    fn test_wrap_uppercase_stays_inside_margin() {
        let text = "GUANTES DIELÉCTRICOS, CASCO, ANTEOJOS, CALZADO DE SEGURIDAD, ".repeat(4);
        let lines = wrap(&text, Font::Regular, 10.0, CONTENT_WIDTH);

        assert!(lines.len() >= 4);
        for line in &lines {
            let width = text_width(line, Font::Regular, 10.0);
            assert!(width <= CONTENT_WIDTH, "{line:?} is {width} mm wide");
        }
        assert_eq!(
            lines.join(" ").split_whitespace().collect::<Vec<_>>(),
            text.split_whitespace().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_footer_is_centred() {
        let layout = compose(&report("a"), Evidence::None, BRANDING);
        match layout.pages[0].ops.last() {
            Some(Op::Text { text, x, size, .. }) => {
                let width = text_width(text, Font::Regular, *size);
                assert!((x + width / 2.0 - PAGE_WIDTH / 2.0).abs() < 0.01);
            },
            other => panic!("expected footer, got {other:?}"),
        }
    }

    #[test]
    fn test_single_page_order() {
        let layout = compose(&report("Cables expuestos."), Evidence::None, BRANDING);
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(
            layout.pages[0].ops[0],
            Op::Watermark {
                text: "Guardián IA".into()
            }
        );

        let texts: Vec<&str> = layout.texts().collect();
        let position = |needle: &str| texts.iter().position(|t| *t == needle).unwrap();

        assert_eq!(texts[0], "Informe Oficial de Riesgos");
        assert!(position("Número de Trámite:") < position("Usuario que Reporta"));
        assert!(position("rep1") < position("Fecha y Hora:"));
        assert!(texts.contains(&"28/07/2024, 14:30:00"));
        assert!(texts.contains(&"Abierta"));
        assert!(texts.contains(&"Personal de Servicio"));
        assert!(position("Rojo / Peligro") < position("Descripción de la Anomalía"));
        assert!(position("Descripción de la Anomalía") < position("Recomendación de EPP"));
        assert!(position("Recomendación de EPP") < position("Sugerencia de Infraestructura"));
        assert!(
            position("Sugerencia de Infraestructura")
                < position("Referencia Legal (Dec. 351/79)")
        );
        assert_eq!(
            footer(&layout, 0),
            "Página 1 de 1 | Documento generado por Guardián IA"
        );
    }

    #[test]
    fn test_footer_names_configured_product() {
        let branding = Branding {
            watermark: "Planta Norte",
            product: "Seguridad Planta Norte",
        };
        let layout = compose(&report("a"), Evidence::None, branding);
        assert_eq!(
            footer(&layout, 0),
            "Página 1 de 1 | Documento generado por Seguridad Planta Norte"
        );
    }

    #[test]
    fn test_risk_label_is_coloured() {
        let layout = compose(&report("a"), Evidence::None, BRANDING);
        let colour = layout.pages[0].ops.iter().find_map(|op| match op {
            Op::Text { text, color, .. } if text == "Rojo / Peligro" => Some(*color),
            _ => None,
        });
        assert_eq!(colour, Some((0x99, 0x1b, 0x1b)));
    }

    #[test]
    fn test_unavailable_image_notice() {
        let layout = compose(&report("a"), Evidence::Unavailable, BRANDING);
        let notice = layout.pages[0].ops.iter().any(|op| {
            matches!(op, Op::Text { text, font: Font::Oblique, .. } if text == IMAGE_NOTICE)
        });
        assert!(notice);
        assert!(!layout.pages[0].ops.iter().any(|op| matches!(op, Op::Image { .. })));
    }

    #[test]
    fn test_tall_image_moves_to_next_page() {
        // Header ends at 133 mm, a square image needs 170 mm.
        let layout = compose(
            &report("a"),
            Evidence::Loaded {
                width: 600,
                height: 600,
            },
            BRANDING,
        );

        // Image ends at 200 mm on page 2, three sections fit below it.
        assert_eq!(layout.pages.len(), 3);
        assert_eq!(
            layout.pages[1].ops[1],
            Op::Image {
                x: MARGIN,
                y: MARGIN,
                width: CONTENT_WIDTH,
                height: CONTENT_WIDTH,
            }
        );
        assert!(matches!(
            &layout.pages[2].ops[1],
            Op::Text { text, y, .. } if text == "Referencia Legal (Dec. 351/79)" && *y == MARGIN
        ));
    }

    #[test]
    fn test_wide_image_stays_on_first_page() {
        let layout = compose(
            &report("a"),
            Evidence::Loaded {
                width: 600,
                height: 400,
            },
            BRANDING,
        );

        let image = layout.pages[0].ops.iter().find_map(|op| match op {
            Op::Image { y, height, .. } => Some((*y, *height)),
            _ => None,
        });
        let (y, height) = image.unwrap();
        assert!((height - CONTENT_WIDTH * 400.0 / 600.0).abs() < 0.01);
        assert!(y + height <= PAGE_HEIGHT - MARGIN);
    }

    #[test]
    fn test_long_content_paginates() {
        let body = "Riesgo eléctrico severo cerca de un área húmeda. ".repeat(300);
        let layout = compose(&report(&body), Evidence::None, BRANDING);
        let total = layout.pages.len();
        assert!(total > 2);

        for (index, page) in layout.pages.iter().enumerate() {
            assert!(matches!(page.ops[0], Op::Watermark { .. }));
            assert_eq!(
                footer(&layout, index),
                format!("Página {} de {total} | Documento generado por Guardián IA", index + 1)
            );

            // Body lines stay inside the bottom margin.
            let body_ops = &page.ops[..page.ops.len() - 1];
            for op in body_ops {
                if let Op::Text { y, .. } = op {
                    assert!(*y <= PAGE_HEIGHT - MARGIN, "line at {y} mm");
                }
            }
        }

        // Later sections still follow, in order, after the long one.
        let texts: Vec<&str> = layout.texts().collect();
        assert!(texts.contains(&"Referencia Legal (Dec. 351/79)"));
    }

    #[test]
    fn test_empty_fields_fall_back() {
        let mut report = report("a");
        report.id = None;
        report.date = String::default();
        report.user = User::unknown();

        let layout = compose(&report, Evidence::None, BRANDING);
        let texts: Vec<&str> = layout.texts().collect();
        assert!(texts.iter().filter(|t| **t == "N/A").count() >= 2);
        assert!(texts.contains(&"Unknown User"));
    }
}
