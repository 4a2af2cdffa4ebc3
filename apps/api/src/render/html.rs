use serde::Serialize;
use tera::{Context, Tera};

use crate::layout::{paginate, Page, PageConfig};
use crate::render::{Document, DocumentSink, RenderError};

const TEMPLATE_NAME: &str = "preview.html";

// Autoescaped: Tera escapes every `{{ }}` in templates ending in `.html`.
const PREVIEW_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>CV preview</title>
<style>
  body { background: #f3f4f6; margin: 0; padding: 24px; font-family: Helvetica, Arial, sans-serif; }
  .page { position: relative; background: #fff; margin: 0 auto 24px; box-shadow: 0 1px 4px rgba(0, 0, 0, 0.2); }
  .line { position: absolute; white-space: pre; line-height: 1; }
  .bold { font-weight: bold; }
  .oblique { font-style: italic; }
</style>
</head>
<body>
{% for page in pages %}<section class="page" data-page="{{ page.number }}" style="width: {{ page_width }}pt; height: {{ page_height }}pt;">
{% for line in page.lines %}  <div class="line {{ line.face }}" style="left: {{ line.x_pt }}pt; top: {{ line.baseline_pt - line.size_pt }}pt; font-size: {{ line.size_pt }}pt;">{{ line.text }}</div>
{% endfor %}</section>
{% endfor %}</body>
</html>
"#;

#[derive(Serialize)]
struct PreviewView<'a> {
    page_width: f32,
    page_height: f32,
    pages: &'a [Page],
}

/// On-screen preview: one absolutely positioned `<div>` per laid-out line.
pub struct HtmlPreview {
    tera: Tera,
    config: PageConfig,
}

impl HtmlPreview {
    pub fn new(config: PageConfig) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, PREVIEW_TEMPLATE)?;
        Ok(Self { tera, config })
    }
}

impl DocumentSink for HtmlPreview {
    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }

    fn write(&self, document: &Document) -> Result<Vec<u8>, RenderError> {
        let pages = paginate(document, &self.config);
        let view = PreviewView {
            page_width: self.config.page_width_pt,
            page_height: self.config.page_height_pt,
            pages: &pages,
        };
        let context = Context::from_serialize(&view)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?.into_bytes())
    }
}
