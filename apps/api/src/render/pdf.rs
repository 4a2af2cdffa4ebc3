use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as PdfDocument, Object, Stream, StringFormat};

use crate::layout::charset::encode_win_ansi;
use crate::layout::{paginate, FontFace, Page, PageConfig};
use crate::render::{Document, DocumentSink, RenderError};

/// Downloadable export: a PDF using the standard Helvetica faces.
///
/// Base-14 fonts need no embedding. Layout has already folded every line into
/// WinAnsi, so the strings are written byte for byte.
pub struct PdfExport {
    config: PageConfig,
}

impl PdfExport {
    pub fn new(config: PageConfig) -> Self {
        Self { config }
    }

    fn page_operations(&self, page: &Page) -> Vec<Operation> {
        let height = self.config.page_height_pt;
        let mut ops = Vec::with_capacity(page.lines.len() * 5);
        for line in &page.lines {
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new(
                "Tf",
                vec![
                    line.face.resource_name().into(),
                    points(line.size_pt).into(),
                ],
            ));
            ops.push(Operation::new(
                "Td",
                vec![
                    points(line.x_pt).into(),
                    points(height - line.baseline_pt).into(),
                ],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(&line.text),
                    StringFormat::Literal,
                )],
            ));
            ops.push(Operation::new("ET", vec![]));
        }
        ops
    }
}

impl DocumentSink for PdfExport {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn write(&self, document: &Document) -> Result<Vec<u8>, RenderError> {
        let pages = paginate(document, &self.config);

        let mut pdf = PdfDocument::with_version("1.5");
        let pages_id = pdf.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for face in FontFace::ALL {
            let font_id = pdf.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => face.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(face.resource_name(), font_id);
        }
        let resources_id = pdf.add_object(dictionary! {
            "Font" => fonts,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in &pages {
            let content = Content {
                operations: self.page_operations(page),
            };
            let encoded = content
                .encode()
                .map_err(|e| RenderError::Pdf(e.to_string()))?;
            let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(points(self.config.page_width_pt)),
            Object::Integer(points(self.config.page_height_pt)),
        ];
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => media_box,
            }),
        );
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);
        pdf.compress();

        let mut bytes = Vec::new();
        pdf.save_to(&mut bytes)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(bytes)
    }
}

/// Layout positions are whole points in the content stream.
fn points(value: f32) -> i64 {
    value.round() as i64
}
