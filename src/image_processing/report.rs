//! Tabular report of crop decisions, printed at the end of a `--report` run.

use prettytable::{format, Cell, Row, Table};

use super::{BucketCounters, CropResult};
use crate::utils::display_name;

/// Build the per-image decision table
pub fn build_results_table(results: &[CropResult]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    table.set_titles(Row::new(vec![
        Cell::new("Input"),
        Cell::new("Source"),
        Cell::new("Focal"),
        Cell::new("Bucket"),
        Cell::new("Output"),
    ]));

    for result in results {
        table.add_row(Row::new(vec![
            Cell::new(&display_name(&result.input_path)),
            Cell::new(&format!("{}x{}", result.source_size.0, result.source_size.1)),
            Cell::new(&result.focal_point.to_string()),
            Cell::new(&result.resolution.to_string()),
            Cell::new(&result.output_path.display().to_string()),
        ]));
    }

    table
}

/// Build the images-per-bucket table
pub fn build_bucket_table(counters: &BucketCounters) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(Row::new(vec![Cell::new("Bucket"), Cell::new("Images")]));

    for (resolution, count) in counters.counts() {
        table.add_row(Row::new(vec![
            Cell::new(&resolution.to_string()),
            Cell::new(&count.to_string()),
        ]));
    }

    table
}

pub fn print_report(results: &[CropResult], counters: &BucketCounters) {
    println!();
    println!("CROP DECISIONS ({} images)", results.len());
    build_results_table(results).printstd();
    println!();
    build_bucket_table(counters).printstd();
    println!();
}
