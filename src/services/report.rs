// src/services/report.rs

use printpdf::{
    BuiltinFont, Color, Greyscale, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt,
    TextItem,
};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const LEFT_MM: f32 = 20.0;
const TOP_MM: f32 = 275.0;
const BOTTOM_MM: f32 = 20.0;
const LINE_SPACING_MM: f32 = 10.0;

/// Lines that fit below the title on one A4 page.
pub const LINES_PER_PAGE: usize = ((TOP_MM - LINE_SPACING_MM - BOTTOM_MM) / LINE_SPACING_MM) as usize;

/// Renders `Label: value` lines into a paginated A4 PDF under `title`.
/// The title is repeated on every page.
pub fn render_summary(title: &str, lines: &[(String, String)]) -> Vec<u8> {
    let mut document = PdfDocument::new(title);
    let text_color = Color::Greyscale(Greyscale::new(0.08, None));

    let chunks: Vec<&[(String, String)]> = if lines.is_empty() {
        vec![lines]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };
    let page_total = chunks.len();

    let pages: Vec<PdfPage> = chunks
        .into_iter()
        .enumerate()
        .map(|(page_index, chunk)| {
            let mut ops = Vec::new();
            let heading = if page_total > 1 {
                format!("{} ({}/{})", title, page_index + 1, page_total)
            } else {
                title.to_string()
            };
            push_text(
                &mut ops,
                Point::new(Mm(LEFT_MM), Mm(TOP_MM)),
                BuiltinFont::HelveticaBold,
                18.0,
                heading,
                &text_color,
            );

            let mut y = TOP_MM - LINE_SPACING_MM * 1.5;
            for (label, value) in chunk {
                push_text(
                    &mut ops,
                    Point::new(Mm(LEFT_MM), Mm(y)),
                    BuiltinFont::Helvetica,
                    12.0,
                    format!("{}: {}", label, value),
                    &text_color,
                );
                y -= LINE_SPACING_MM;
            }

            PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops)
        })
        .collect();

    let mut warnings = Vec::new();
    let bytes = document
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        tracing::debug!("PDF export produced {} warnings", warnings.len());
    }
    bytes
}

fn push_text(
    ops: &mut Vec<Op>,
    pos: Point,
    font: BuiltinFont,
    font_size: f32,
    text: String,
    color: &Color,
) {
    ops.extend([
        Op::StartTextSection,
        Op::SetTextCursor { pos },
        Op::SetFontSizeBuiltinFont {
            size: Pt(font_size),
            font,
        },
        Op::SetLineHeight {
            lh: Pt(font_size * 1.2),
        },
        Op::SetFillColor { col: color.clone() },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text)],
            font,
        },
        Op::EndTextSection,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Vec<(String, String)> {
        (0..n)
            .map(|i| (format!("Metric {}", i), i.to_string()))
            .collect()
    }

    fn page_count(bytes: &[u8]) -> usize {
        lopdf::Document::load_mem(bytes)
            .expect("exported PDF parses")
            .get_pages()
            .len()
    }

    #[test]
    fn test_summary_is_a_pdf() {
        let bytes = render_summary("Quiz Result", &lines(7));
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn test_summary_paginates() {
        let bytes = render_summary("Quiz Result", &lines(LINES_PER_PAGE * 2 + 1));
        assert_eq!(page_count(&bytes), 3);
    }

    #[test]
    fn test_empty_summary_still_has_a_page() {
        let bytes = render_summary("Quiz Result", &[]);
        assert_eq!(page_count(&bytes), 1);
    }
}
