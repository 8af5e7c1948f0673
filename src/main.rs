use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::time::Instant;

use captionkit::caption::{CaptionBatch, CaptionBatchConfig, RemoteCaptioner};
use captionkit::cli::{Args, CaptionArgs, Commands, CropArgs};
use captionkit::config_file::ConfigFile;
use captionkit::image_processing::{report, CropConfig, CropEngine};
use captionkit::utils::{
    create_progress_bar, format_duration, validate_generation, validate_input_dir,
    verbose_println,
};

fn print_banner(subtitle: &str) {
    println!("{}", style("captionkit - Dataset Preparation").bold().blue());
    println!("{}", style(subtitle).dim());
    println!();
}

fn run_caption(args: &CaptionArgs, config: &ConfigFile, verbose: bool) -> Result<()> {
    let settings = args.resolve(config.caption.as_ref());

    validate_input_dir(&settings.input_dir)?;
    validate_generation(
        settings.params.max_new_tokens,
        settings.params.temperature,
        settings.params.top_p,
    )?;

    print_banner("Batch captioner");
    println!("{}", style("Configuration:").bold());
    println!("  Input:  {}", settings.input_dir.display());
    println!("  Output: {}", settings.output_dir.display());
    println!("  Model:  {} @ {}", settings.remote.model, settings.remote.endpoint);
    println!(
        "  Generation: max {} tokens, temperature {}, top-p {}",
        settings.params.max_new_tokens, settings.params.temperature, settings.params.top_p
    );
    if settings.continue_on_error {
        println!("  Failures: {}", style("logged and skipped").yellow());
    }
    println!();

    let batch = CaptionBatch::new(CaptionBatchConfig {
        input_dir: settings.input_dir.clone(),
        output_dir: settings.output_dir.clone(),
        continue_on_error: settings.continue_on_error,
        verbose,
    });

    let plan = batch.prepare()?;
    let images = &plan.images;
    if images.is_empty() && plan.unreadable.is_empty() {
        println!("{}", style("No images found").red());
        return Ok(());
    }

    let mut captioner = RemoteCaptioner::new(settings.remote.clone(), settings.params.clone())?;
    verbose_println(verbose, "Caption model client ready");

    let progress = create_progress_bar(images.len() as u64);
    let summary = batch.run(&mut captioner, images, &progress)?;
    progress.finish_with_message("Captioning complete");

    let stats = &summary.stats;
    println!();
    println!("{}", style("Results Summary:").bold().green());
    println!("  Captioned: {}", style(stats.successful).bold().green());
    if stats.failed > 0 {
        println!("  Failed: {}", style(stats.failed).bold().red());
    }
    println!("  Success rate: {:.1}%", stats.success_rate());

    println!();
    println!("{}", style("Performance:").bold().blue());
    println!(
        "  Total processing time: {}",
        style(format_duration(stats.total_duration)).bold()
    );
    println!(
        "  Average time per image: {}",
        style(format_duration(stats.average_duration())).dim()
    );

    if !summary.replaced_captions.is_empty() {
        println!();
        println!("{}", style("Captions replaced (images sharing a stem):").bold().yellow());
        for path in &summary.replaced_captions {
            println!("  {}", path.display());
        }
    }

    let failures: Vec<_> = plan.unreadable.iter().chain(summary.failed.iter()).collect();
    if !failures.is_empty() {
        println!();
        println!("{}", style("Errors encountered:").bold().red());
        for (i, failure) in failures.iter().enumerate() {
            println!(
                "  {}: {} - {:#}",
                style(format!("#{}", i + 1)).dim(),
                style(failure.input_path.display()).bold().red(),
                failure.error
            );
        }
        return Err(anyhow::anyhow!(
            "{} images failed to caption, {} entries could not be read",
            summary.failed.len(),
            plan.unreadable.len()
        ));
    }

    Ok(())
}

fn run_crop(args: &CropArgs, config: &ConfigFile, verbose: bool) -> Result<()> {
    let settings = args.resolve(config.crop.as_ref());

    validate_input_dir(&settings.input_dir)?;

    print_banner("Crop & resize into resolution buckets");
    println!("{}", style("Configuration:").bold());
    println!("  Input:  {}", settings.input_dir.display());
    println!("  Output: {}", settings.output_dir.display());
    if settings.dry_run {
        println!("  Mode:   {}", style("dry run (no files written)").yellow());
    }
    println!();

    let started = Instant::now();
    let mut engine = CropEngine::new(CropConfig {
        input_dir: settings.input_dir.clone(),
        output_dir: settings.output_dir.clone(),
        dry_run: settings.dry_run,
        verbose,
    });

    let images = engine.discover_images()?;
    if images.is_empty() {
        println!("{}", style("No images found").red());
        return Ok(());
    }

    let progress = create_progress_bar(images.len() as u64);
    let results = engine
        .process_all(&images, &progress)
        .context("Crop run aborted")?;
    progress.finish_with_message("Cropping complete");
    let total_time = started.elapsed();

    println!();
    if settings.dry_run {
        println!("{}", style("Dry Run Results Summary:").bold().cyan());
    } else {
        println!("{}", style("Results Summary:").bold().green());
    }
    println!("  Images: {}", style(results.len()).bold().green());
    for (resolution, count) in engine.counters().counts() {
        println!("  {}: {}", style(resolution).cyan(), count);
    }

    println!();
    println!("{}", style("Performance:").bold().blue());
    println!(
        "  Total processing time: {}",
        style(format_duration(total_time)).bold()
    );
    println!(
        "  Average time per image: {}",
        style(format_duration(total_time / results.len() as u32)).dim()
    );

    if settings.report {
        println!();
        report::print_report(&results, engine.counters());
    }

    if settings.dry_run {
        println!();
        println!("{}", style("Dry Run Mode:").bold().yellow());
        println!("  • No files were created during this simulation");
        println!("  • Remove --dry-run to write the bucketed images");
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;

    match &args.command {
        Commands::Caption(caption) => run_caption(caption, &config, args.verbose),
        Commands::Crop(crop) => run_crop(crop, &config, args.verbose),
    }
}
