//! Inspect command - show the field catalog of one GeoPackage.

use std::path::PathBuf;

use colored::Colorize;
use productsheet::{EnumerationPolicy, SamplingConfig};

pub fn run(
    file: PathBuf,
    json_output: bool,
    max_value_len: usize,
    min_distinct: usize,
    max_distinct: usize,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let policy = EnumerationPolicy::new(max_value_len, min_distinct, max_distinct);
    let report = productsheet::inspect(
        &file,
        policy,
        SamplingConfig::default().max_total_features,
    )?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Layers in".cyan().bold(), report.file.white());
    println!(
        "Code lists: {}",
        report.code_lists.len().to_string().white().bold()
    );
    println!();

    for layer in &report.layers {
        let geometry = if layer.geometry_type.is_empty() {
            "no geometry".to_string()
        } else {
            layer.geometry_type.join(", ")
        };
        println!(
            "{} ({} features, {})",
            layer.name.yellow().bold(),
            layer.feature_count,
            geometry
        );

        let name_width = layer
            .fields
            .iter()
            .map(|f| f.name.chars().count())
            .max()
            .unwrap_or(0)
            .max(5);
        for field in &layer.fields {
            let dtype = field.dtype.to_string();
            print!("  {:<width$}  {:<10}", field.name, dtype.dimmed(), width = name_width);
            match &field.allowed_values {
                Some(values) => println!("  [{}]", values.join(", ").green()),
                None if !field.sample.is_empty() => println!("  e.g. {}", field.sample),
                None => println!(),
            }
        }
        println!();
    }

    for skip in &report.skipped_layers {
        println!(
            "{} Could not read layer '{}': {}",
            "⚠️".yellow(),
            skip.layer,
            skip.reason
        );
    }

    Ok(())
}
