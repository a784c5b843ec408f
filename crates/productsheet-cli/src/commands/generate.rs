//! Generate command - write one product sheet per GeoPackage.

use colored::Colorize;
use productsheet::{
    DatasetEvent, EnumerationPolicy, GeneratorConfig, MetadataConfig, ProductSheetGenerator,
    SamplingConfig,
};

use crate::cli::GenerateArgs;

pub fn run(args: GenerateArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = args.json;
    let config = GeneratorConfig {
        sampling: SamplingConfig {
            max_total_features: args.max_features,
            simplify_tolerance: args.simplify_tolerance,
        },
        enumeration: EnumerationPolicy::new(args.max_value_len, args.min_distinct, args.max_distinct),
        metadata: MetadataConfig {
            sheet: args.sheet,
            key_column: args.key_column,
            title_column: args.title_column,
        },
        title_suffix: args.title_suffix,
        basemap_tolerance: args.basemap_tolerance,
        input_dir: args.dir,
        output_dir: args.output_dir,
        template: args.template,
        basemap: args.basemap,
        metadata_file: args.metadata,
    };

    let generator = ProductSheetGenerator::prepare(config)?;

    if verbose && !json_output {
        println!(
            "{} {} dataset(s) in {}",
            "Found".cyan().bold(),
            generator.containers().len(),
            generator.config().input_dir.display()
        );
    }

    let report = generator.run_batch_with(|event| {
        if json_output {
            return;
        }
        match event {
            DatasetEvent::Produced(outcome) => {
                for layer in &outcome.layers {
                    println!(
                        "{} Processed layer: {} ({} features, showing {})",
                        "✅".green(),
                        layer.name.white().bold(),
                        layer.feature_count,
                        layer.shown(outcome.budget)
                    );
                }
                for skip in &outcome.skipped_layers {
                    println!(
                        "{} Could not read layer '{}': {}",
                        "⚠️".yellow(),
                        skip.layer,
                        skip.reason.yellow()
                    );
                }
                println!(
                    "{} Product sheet saved as: {}",
                    "📄".cyan(),
                    outcome.output.display().to_string().white().bold()
                );
            }
            DatasetEvent::Skipped(skip) => {
                println!("{} {}, skipping.", "⚠️".yellow(), skip.reason.yellow());
            }
            DatasetEvent::Overwrote(path) => {
                println!(
                    "{} Overwriting product sheet from an earlier dataset: {}",
                    "⚠️".yellow(),
                    path.display()
                );
            }
        }
    })?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    let produced = report.produced.len().to_string();
    let skipped = report.skipped.len().to_string();
    println!(
        "{} {} produced, {} skipped, {} layer(s) not shown",
        "Done:".cyan().bold(),
        produced.green(),
        if report.skipped.is_empty() {
            skipped.normal()
        } else {
            skipped.yellow()
        },
        report.skipped_layer_count()
    );
    if !report.overwritten.is_empty() {
        println!(
            "{} {} product sheet(s) were overwritten; give those datasets distinct titles",
            "Note:".yellow().bold(),
            report.overwritten.len()
        );
    }

    Ok(())
}
