//! Non-interactive commands: crop listing, crop export, CSV export, audit.

use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageBuffer, Luma};
use ndarray::ArrayView2;

use crate::audit::{find_pmon_mismatches, survey_labels};
use crate::config::AnnotatorConfig;
use crate::data::FsRasterSource;
use crate::export::{export_csv, write_csv_file};
use crate::labels::CsvLabelSource;
use crate::layout::ProbeLayout;
use crate::persist::SessionStore;
use crate::session::DirectoryLoader;

fn layout(root: &Path, config: &AnnotatorConfig) -> ProbeLayout {
    ProbeLayout::new(root).with_backup_directory(&config.backup_directory)
}

fn discover(layout: &ProbeLayout) -> Result<Vec<String>> {
    layout
        .discover()
        .with_context(|| format!("failed to list probe directories in {}", layout.root().display()))
}

fn loader(layout: &ProbeLayout, config: &AnnotatorConfig) -> DirectoryLoader {
    DirectoryLoader::new(
        Box::new(FsRasterSource::new(layout.clone())),
        Box::new(CsvLabelSource::new(layout.clone())),
        config.grid.clone(),
    )
}

pub fn run_tiles(root: &Path, config: &AnnotatorConfig) -> Result<()> {
    let layout = layout(root, config);
    let loader = loader(&layout, config);

    for directory in discover(&layout)? {
        let Some(tiles) = loader.load(&directory) else {
            println!("{directory}: skipped");
            continue;
        };
        println!("{directory}: {} crops", tiles.len());
        for (index, tile) in tiles.tiles().iter().enumerate() {
            let blank = if tiles.is_blank(index) { " (blank)" } else { "" };
            println!(
                "  {:>4} {} {} boxes{}",
                index,
                tile.name,
                tile.existing_boxes.len(),
                blank
            );
        }
    }
    Ok(())
}

pub fn run_crops(root: &Path, output: Option<&Path>, config: &AnnotatorConfig) -> Result<()> {
    let layout = layout(root, config);
    let loader = loader(&layout, config);
    let mut written = 0;

    for directory in discover(&layout)? {
        let Some(tiles) = loader.load(&directory) else {
            continue;
        };
        let target_dir = match output {
            Some(output) => output.join(&directory),
            None => layout.images_dir(&directory),
        };
        std::fs::create_dir_all(&target_dir)
            .with_context(|| format!("failed to create {}", target_dir.display()))?;

        for (tile, crop) in tiles.crops() {
            let path = target_dir.join(&tile.name);
            save_png(&path, crop)?;
            written += 1;
        }
        log::info!("Wrote {} crops of {} to {:?}", tiles.len(), directory, target_dir);
    }

    println!("Wrote {written} crops");
    Ok(())
}

/// Save a crop as a 16-bit grayscale PNG.
fn save_png(path: &Path, crop: ArrayView2<'_, u16>) -> Result<()> {
    let (height, width) = crop.dim();
    let pixels: Vec<u16> = crop.iter().copied().collect();
    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(width as u32, height as u32, pixels)
            .context("crop buffer does not match its dimensions")?;
    buffer
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}

pub fn run_export(root: &Path, output: &Path, config: &AnnotatorConfig) -> Result<()> {
    let layout = layout(root, config);
    let store = SessionStore::new(&layout).with_file_name(&config.state_file_name);

    let state = store
        .load()
        .with_context(|| format!("failed to read {}", store.path().display()))?;
    let rows = match state {
        Some(state) => export_csv(output, &state)?,
        None => {
            log::warn!("No saved session in {:?}, writing an empty export", root);
            write_csv_file(output, &[])?;
            0
        }
    };

    println!("Exported {rows} boxes to {}", output.display());
    Ok(())
}

pub fn run_audit(root: &Path, config: &AnnotatorConfig) -> Result<()> {
    let layout = layout(root, config);
    let directories = discover(&layout)?;

    let mismatches = find_pmon_mismatches(&layout, &directories, &config.grid.pmon)
        .context("failed to scan crop names")?;
    if mismatches.is_empty() {
        println!("All crop names use {}", config.grid.pmon);
    } else {
        println!("Files with a pmon tag other than {}:", config.grid.pmon);
        for mismatch in &mismatches {
            println!("  {mismatch}");
        }
    }

    let survey = survey_labels(&CsvLabelSource::new(layout), &directories, &config.vocabulary);
    println!("Labels:");
    for (label, count) in &survey.counts {
        println!("  {label:<24} {count}");
    }
    for (directory, labels) in &survey.unknown {
        let labels: Vec<_> = labels.iter().map(String::as_str).collect();
        println!("Unknown labels in {directory}: {}", labels.join(", "));
    }
    for directory in &survey.unreadable {
        println!("No readable label table in {directory}");
    }

    if !mismatches.is_empty() || survey.has_unknown_labels() {
        anyhow::bail!(
            "audit found {} pmon mismatches and unknown labels in {} directories",
            mismatches.len(),
            survey.unknown.len()
        );
    }
    Ok(())
}
