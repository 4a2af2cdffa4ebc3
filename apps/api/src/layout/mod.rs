// Page layout shared by every document sink.
// Static Helvetica metrics + WinAnsi folding + greedy word wrap onto fixed-size pages.

pub mod charset;
pub mod font_metrics;
pub mod paginate;

// Re-export the public API consumed by the render sinks and startup.
pub use font_metrics::{default_page_config, FontFace, PageConfig};
pub use paginate::{paginate, Page};
