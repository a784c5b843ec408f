//! Batch generation of product sheets.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ProductSheetError, Result};
use crate::inference::{CodeListExtractor, CodeLists, EnumerationPolicy, FieldCatalogBuilder};
use crate::input::{GeoPackage, InputSet, LayerSource, MetadataTable, SourceMetadata, dataset_identifier};
use crate::metadata::{MetadataConfig, MetadataMerger};
use crate::render::{
    BaseMap, DEFAULT_BASEMAP, DEFAULT_BASEMAP_TOLERANCE, ProductSheet, ProductSheetRenderer,
    output_file_name,
};
use crate::sampling::{
    FeatureSampler, Reprojector, SamplingConfig, WGS84, observed_geometry_types, per_layer_budget,
    truncation_note,
};
use crate::schema::{LayerSample, LayerSkip, LayerSummary};

/// Default title suffix.
pub const DEFAULT_TITLE_SUFFIX: &str = " (NOR) - Product Sheet";

/// Configuration for a generation run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Feature budget and simplification.
    pub sampling: SamplingConfig,
    /// Thresholds for inferred value domains.
    pub enumeration: EnumerationPolicy,
    /// Metadata sheet and column names.
    pub metadata: MetadataConfig,
    /// Appended to every dataset title.
    pub title_suffix: String,
    /// Base map simplification tolerance in degrees.
    pub basemap_tolerance: f64,
    /// Directory searched for inputs.
    pub input_dir: PathBuf,
    /// Directory for product sheets (None = input directory).
    pub output_dir: Option<PathBuf>,
    /// Explicit template file.
    pub template: Option<PathBuf>,
    /// Base map file (None = `assets/countries.geojson` in the input directory).
    pub basemap: Option<PathBuf>,
    /// Explicit metadata file, bypassing discovery.
    pub metadata_file: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            enumeration: EnumerationPolicy::default(),
            metadata: MetadataConfig::default(),
            title_suffix: DEFAULT_TITLE_SUFFIX.to_string(),
            basemap_tolerance: DEFAULT_BASEMAP_TOLERANCE,
            input_dir: PathBuf::from("."),
            output_dir: None,
            template: None,
            basemap: None,
            metadata_file: None,
        }
    }
}

impl GeneratorConfig {
    /// Directory product sheets are written to.
    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.input_dir)
    }

    /// Base map location.
    pub fn basemap_path(&self) -> PathBuf {
        self.basemap
            .clone()
            .unwrap_or_else(|| self.input_dir.join(DEFAULT_BASEMAP))
    }

    /// Check thresholds that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.sampling.max_total_features == 0 {
            return Err(ProductSheetError::Config(
                "max_total_features must be at least 1".to_string(),
            ));
        }
        let tolerances = [self.sampling.simplify_tolerance, self.basemap_tolerance];
        if tolerances.iter().any(|t| t.is_nan() || *t < 0.0) {
            return Err(ProductSheetError::Config(
                "simplification tolerances must be non-negative".to_string(),
            ));
        }
        if self.enumeration.min_distinct > self.enumeration.max_distinct {
            return Err(ProductSheetError::Config(format!(
                "min_distinct ({}) exceeds max_distinct ({})",
                self.enumeration.min_distinct, self.enumeration.max_distinct
            )));
        }
        Ok(())
    }
}

/// A dataset that produced a product sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetOutcome {
    /// Container file facts.
    pub source: SourceMetadata,
    /// Rendered title.
    pub title: String,
    /// Written product sheet.
    pub output: PathBuf,
    /// Per-layer map budget used for this dataset.
    pub budget: usize,
    /// Summarized layers.
    pub layers: Vec<LayerSummary>,
    /// Layers that could not be summarized.
    pub skipped_layers: Vec<LayerSkip>,
}

/// A dataset that produced no product sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSkip {
    /// Dataset identifier.
    pub dataset: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Datasets with a product sheet, in processing order.
    pub produced: Vec<DatasetOutcome>,
    /// Datasets without a product sheet.
    pub skipped: Vec<DatasetSkip>,
    /// Output files written more than once in this run.
    pub overwritten: Vec<PathBuf>,
}

impl BatchReport {
    /// Total number of layers skipped across produced datasets.
    pub fn skipped_layer_count(&self) -> usize {
        self.produced.iter().map(|d| d.skipped_layers.len()).sum()
    }
}

/// Progress of a batch run, reported once per dataset.
#[derive(Debug, Clone, Copy)]
pub enum DatasetEvent<'a> {
    Produced(&'a DatasetOutcome),
    Skipped(&'a DatasetSkip),
    Overwrote(&'a Path),
}

/// A summarized layer with its map sample.
#[derive(Debug, Clone)]
pub struct ProcessedLayer {
    pub summary: LayerSummary,
    pub sample: LayerSample,
}

/// Layer documentation of one container, without metadata or rendering.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub file: String,
    pub code_lists: CodeLists,
    pub layers: Vec<LayerSummary>,
    pub skipped_layers: Vec<LayerSkip>,
}

/// Turns GeoPackages into HTML product sheets.
pub struct ProductSheetGenerator {
    config: GeneratorConfig,
    containers: Vec<PathBuf>,
    metadata: MetadataTable,
    basemap: BaseMap,
    renderer: ProductSheetRenderer,
    planar: Reprojector,
}

impl ProductSheetGenerator {
    /// Discover and load every shared input of a run.
    ///
    /// Fails when no container or metadata file is found, when the metadata
    /// or base map cannot be parsed, or when the template is unusable.
    pub fn prepare(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;

        let inputs = InputSet::discover(&config.input_dir, config.metadata_file.as_deref())?;
        debug!(
            containers = inputs.containers.len(),
            metadata = %inputs.metadata.display(),
            "discovered inputs"
        );

        let metadata = MetadataTable::load(&inputs.metadata, &config.metadata.sheet)?;
        let basemap = BaseMap::load(config.basemap_path(), config.basemap_tolerance)?;
        let renderer = ProductSheetRenderer::resolve(config.template.as_deref(), &config.input_dir)?;

        Self::new(config, inputs.containers, metadata, basemap, renderer)
    }

    /// Create a generator from already loaded inputs.
    pub fn new(
        config: GeneratorConfig,
        containers: Vec<PathBuf>,
        metadata: MetadataTable,
        basemap: BaseMap,
        renderer: ProductSheetRenderer,
    ) -> Result<Self> {
        MetadataMerger::new(&metadata, &config.metadata, &config.title_suffix).validate()?;

        Ok(Self {
            config,
            containers,
            metadata,
            basemap,
            renderer,
            planar: Reprojector::web_mercator()?,
        })
    }

    /// Run configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Containers to process, sorted by name.
    pub fn containers(&self) -> &[PathBuf] {
        &self.containers
    }

    /// Process every container.
    pub fn run_batch(&self) -> Result<BatchReport> {
        self.run_batch_with(|_| {})
    }

    /// Process every container, reporting each dataset as it finishes.
    ///
    /// Dataset errors are recorded in the report; only a missing output
    /// directory that cannot be created fails the run.
    pub fn run_batch_with(&self, mut on_event: impl FnMut(DatasetEvent<'_>)) -> Result<BatchReport> {
        let output_dir = self.config.output_dir();
        std::fs::create_dir_all(output_dir).map_err(|e| ProductSheetError::io(output_dir, e))?;

        let mut report = BatchReport::default();
        let mut written: HashSet<PathBuf> = HashSet::new();

        for path in &self.containers {
            match self.process_dataset(path) {
                Ok(outcome) => {
                    if !written.insert(outcome.output.clone()) {
                        warn!(
                            output = %outcome.output.display(),
                            dataset = %outcome.source.identifier,
                            "Product sheet overwritten by a later dataset with the same title"
                        );
                        on_event(DatasetEvent::Overwrote(&outcome.output));
                        report.overwritten.push(outcome.output.clone());
                    }
                    on_event(DatasetEvent::Produced(&outcome));
                    report.produced.push(outcome);
                }
                Err(e) => {
                    let skip = DatasetSkip {
                        dataset: dataset_identifier(path),
                        reason: e.to_string(),
                    };
                    warn!(dataset = %skip.dataset, reason = %skip.reason, "Skipping dataset");
                    on_event(DatasetEvent::Skipped(&skip));
                    report.skipped.push(skip);
                }
            }
        }

        info!(
            produced = report.produced.len(),
            skipped = report.skipped.len(),
            "Batch finished"
        );
        Ok(report)
    }

    /// Produce the product sheet of one container.
    pub fn process_dataset(&self, path: &Path) -> Result<DatasetOutcome> {
        let identifier = dataset_identifier(path);
        let merger = MetadataMerger::new(&self.metadata, &self.config.metadata, &self.config.title_suffix);
        let general = merger.lookup(&identifier)?;

        let source = SourceMetadata::from_path(path)?;
        let gpkg = GeoPackage::open(path)?;
        let layer_names = gpkg.list_layers()?;
        let code_lists = CodeListExtractor::extract(&gpkg, &layer_names)?;
        let budget = per_layer_budget(self.config.sampling.max_total_features, layer_names.len());
        debug!(
            dataset = %identifier,
            layers = layer_names.len(),
            code_lists = code_lists.len(),
            budget,
            "processing dataset"
        );

        let mut layers = Vec::new();
        let mut samples = Vec::new();
        let mut skipped_layers = Vec::new();
        for name in &layer_names {
            match self.process_layer(&gpkg, name, &code_lists, budget) {
                Ok(Some(processed)) => {
                    info!(
                        layer = %name,
                        features = processed.summary.feature_count,
                        shown = processed.sample.len(),
                        "Processed layer"
                    );
                    layers.push(processed.summary);
                    samples.push(processed.sample);
                }
                Ok(None) => debug!(layer = %name, "skipping layer without features"),
                Err(e) => {
                    warn!(layer = %name, error = %e, "Could not read layer");
                    skipped_layers.push(LayerSkip {
                        layer: name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let metadata = merger.merge(&general, &source, layers.len(), Local::now());
        let sheet = ProductSheet {
            filename: source.file.clone(),
            metadata,
            layers,
            samples,
        };
        let html = self.renderer.render(&sheet, &self.basemap)?;

        let output = self.config.output_dir().join(output_file_name(&sheet.metadata.title));
        std::fs::write(&output, html).map_err(|e| ProductSheetError::io(&output, e))?;
        info!(output = %output.display(), "Product sheet saved");

        Ok(DatasetOutcome {
            source,
            title: sheet.metadata.title,
            output,
            budget,
            layers: sheet.layers,
            skipped_layers,
        })
    }

    /// Summarize and sample one layer.
    ///
    /// Returns `Ok(None)` for layers without features.
    pub fn process_layer(
        &self,
        source: &dyn LayerSource,
        name: &str,
        code_lists: &CodeLists,
        budget: usize,
    ) -> Result<Option<ProcessedLayer>> {
        let mut layer = source.load_layer(name)?;
        if layer.is_empty() {
            return Ok(None);
        }

        let geometry_column = layer
            .geometry_column
            .as_ref()
            .ok_or_else(|| ProductSheetError::NoGeometry(name.to_string()))?;
        let spatial_ref = source.resolve_srs(geometry_column.srs_id)?;
        let to_wgs84 = Reprojector::from_spatial_ref(name, &spatial_ref, WGS84)?;
        if !to_wgs84.is_identity() {
            for feature in &mut layer.features {
                if let Some(geometry) = feature.geometry.as_ref() {
                    feature.geometry = Some(to_wgs84.transform(geometry)?);
                }
            }
        }

        let fields = FieldCatalogBuilder::new(code_lists, self.config.enumeration).build(&layer);
        let data = FeatureSampler::new(&self.planar, self.config.sampling.simplify_tolerance)
            .sample(&layer, budget)?;

        let summary = LayerSummary {
            name: layer.name.clone(),
            feature_count: layer.feature_count(),
            geometry_type: observed_geometry_types(&layer.features),
            fields: fields.clone(),
            note: truncation_note(layer.feature_count(), budget).unwrap_or_default(),
        };
        let sample = LayerSample {
            name: layer.name,
            data,
            field_order: fields.iter().map(|f| f.name.clone()).collect(),
            fields,
        };

        Ok(Some(ProcessedLayer { summary, sample }))
    }
}

/// Document the layers of one container without metadata or rendering.
pub fn inspect(
    path: impl AsRef<Path>,
    policy: EnumerationPolicy,
    max_total_features: usize,
) -> Result<InspectReport> {
    let path = path.as_ref();
    let gpkg = GeoPackage::open(path)?;
    let layer_names = gpkg.list_layers()?;
    let code_lists = CodeListExtractor::extract(&gpkg, &layer_names)?;
    let budget = per_layer_budget(max_total_features, layer_names.len());
    let builder = FieldCatalogBuilder::new(&code_lists, policy);

    let mut layers = Vec::new();
    let mut skipped_layers = Vec::new();
    for name in &layer_names {
        match gpkg.load_layer(name) {
            Ok(layer) if layer.is_empty() => debug!(layer = %name, "skipping layer without features"),
            Ok(layer) => layers.push(LayerSummary {
                name: layer.name.clone(),
                feature_count: layer.feature_count(),
                geometry_type: observed_geometry_types(&layer.features),
                fields: builder.build(&layer),
                note: truncation_note(layer.feature_count(), budget).unwrap_or_default(),
            }),
            Err(e) => skipped_layers.push(LayerSkip {
                layer: name.clone(),
                reason: e.to_string(),
            }),
        }
    }

    Ok(InspectReport {
        file: crate::input::file_name(path),
        code_lists,
        layers,
        skipped_layers,
    })
}
