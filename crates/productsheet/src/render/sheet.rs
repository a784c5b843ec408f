//! HTML product sheet rendering.

use std::path::Path;

use indexmap::IndexMap;
use minijinja::value::{Value, ValueKind, from_args};
use minijinja::{Environment, Error, ErrorKind, State};
use serde::Serialize;
use tracing::debug;

use super::basemap::BaseMap;
use crate::error::{ProductSheetError, Result};
use crate::metadata::MergedMetadata;
use crate::schema::{LayerSample, LayerSummary};

/// Template file picked up from the input directory when present.
pub const INPUT_DIR_TEMPLATE: &str = "template_standalone.html";

/// Registered template name; the `.html` extension enables auto-escaping.
const TEMPLATE_NAME: &str = "sheet.html";

const BUILTIN_TEMPLATE: &str = include_str!("../../templates/sheet.html");

/// Everything rendered into one product sheet.
#[derive(Debug, Clone)]
pub struct ProductSheet {
    /// Container file name.
    pub filename: String,
    /// Merged metadata, including the title.
    pub metadata: MergedMetadata,
    /// Layer summaries in layer order.
    pub layers: Vec<LayerSummary>,
    /// Map samples, parallel to `layers`.
    pub samples: Vec<LayerSample>,
}

#[derive(Serialize)]
struct SheetContext<'a> {
    filename: &'a str,
    title: &'a str,
    layers: &'a [LayerSummary],
    geojson_layers: &'a [LayerSample],
    metadata: IndexMap<&'a str, IndexMap<&'a str, &'a str>>,
    world_data: String,
    layers_json: String,
}

/// Where the sheet template came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOrigin {
    /// A template file on disk.
    File(std::path::PathBuf),
    /// The template compiled into the library.
    Builtin,
}

/// Renders product sheets from a Jinja template.
pub struct ProductSheetRenderer {
    env: Environment<'static>,
    origin: TemplateOrigin,
}

impl ProductSheetRenderer {
    /// Compile a template from source text.
    pub fn from_source(source: impl Into<String>, origin: TemplateOrigin) -> Result<Self> {
        let mut env = Environment::new();
        env.set_unknown_method_callback(map_methods);
        env.add_template_owned(TEMPLATE_NAME, source.into())?;
        Ok(Self { env, origin })
    }

    /// The built-in offline template.
    pub fn builtin() -> Result<Self> {
        Self::from_source(BUILTIN_TEMPLATE, TemplateOrigin::Builtin)
    }

    /// Load and compile a template file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProductSheetError::MissingInput(format!(
                "template '{}' not found",
                path.display()
            )));
        }
        let source =
            std::fs::read_to_string(path).map_err(|e| ProductSheetError::io(path, e))?;
        Self::from_source(source, TemplateOrigin::File(path.to_path_buf()))
    }

    /// Pick the template: an explicit path, then the input directory's
    /// template file, then the built-in one.
    pub fn resolve(explicit: Option<&Path>, input_dir: &Path) -> Result<Self> {
        let renderer = match explicit {
            Some(path) => Self::from_path(path)?,
            None => {
                let candidate = input_dir.join(INPUT_DIR_TEMPLATE);
                if candidate.is_file() {
                    Self::from_path(candidate)?
                } else {
                    Self::builtin()?
                }
            }
        };
        debug!(origin = ?renderer.origin, "Using product sheet template");
        Ok(renderer)
    }

    /// Where the template was loaded from.
    pub fn origin(&self) -> &TemplateOrigin {
        &self.origin
    }

    /// Render one product sheet to HTML.
    pub fn render(&self, sheet: &ProductSheet, basemap: &BaseMap) -> Result<String> {
        let context = SheetContext {
            filename: &sheet.filename,
            title: &sheet.metadata.title,
            layers: &sheet.layers,
            geojson_layers: &sheet.samples,
            metadata: grouped(&sheet.metadata),
            world_data: script_safe(basemap.to_json()?),
            layers_json: script_safe(serde_json::to_string(&sheet.samples)?),
        };

        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(&context)?)
    }
}

/// Metadata as section name to key to value, in sheet order.
fn grouped(metadata: &MergedMetadata) -> IndexMap<&str, IndexMap<&str, &str>> {
    metadata
        .sections
        .iter()
        .map(|section| {
            let entries = section
                .entries
                .iter()
                .map(|e| (e.key.as_str(), e.value.as_str()))
                .collect();
            (section.name.as_str(), entries)
        })
        .collect()
}

/// Python-style `.items()` on maps, for templates written against Jinja2.
fn map_methods(
    state: &State,
    value: &Value,
    method: &str,
    args: &[Value],
) -> std::result::Result<Value, Error> {
    if value.kind() == ValueKind::Map && method == "items" {
        let _: () = from_args(args)?;
        state.apply_filter("items", &[value.clone()])
    } else {
        Err(Error::from(ErrorKind::UnknownMethod))
    }
}

/// Make JSON text safe to embed inside an HTML `<script>` element.
pub fn script_safe(json: String) -> String {
    if json.contains("</") {
        json.replace("</", "<\\/")
    } else {
        json
    }
}
