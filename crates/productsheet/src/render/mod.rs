//! Product sheet rendering: templates, base map and file naming.

mod basemap;
mod filename;
mod sheet;

pub use basemap::{BaseMap, DEFAULT_BASEMAP, DEFAULT_BASEMAP_TOLERANCE};
pub use filename::{FALLBACK_NAME, OUTPUT_EXTENSION, output_file_name, sanitize_title};
pub use sheet::{INPUT_DIR_TEMPLATE, ProductSheet, ProductSheetRenderer, TemplateOrigin, script_safe};
