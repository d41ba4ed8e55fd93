//! Run orchestration: configuration, loading, normalisation, catalog
//! reconciliation, profiling, and report output.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use chrono::Local;
use log::{info, warn};

use crate::{
    catalog::{Catalogs, discover_documents},
    cli::{InitConfigArgs, ProfileArgs, RunArgs},
    config::{QcConfig, parse_datetime_assignment},
    io_utils::{LoadOptions, discover_datasets, resolve_encoding},
    missing::MissingValueNormalizer,
    render::render_report,
    table::render_profile,
    table_profile::{TableProfile, profile_table},
};

/// `HH:MM:SS`, hours not wrapped at a day.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn build_config(args: &RunArgs) -> Result<QcConfig> {
    let mut config = QcConfig::load_or_create(&args.config)?;
    config.add_sentinels(args.na.iter().cloned());
    for assignment in &args.datetime {
        let (table, columns) = parse_datetime_assignment(assignment)
            .with_context(|| format!("Parsing --datetime '{assignment}'"))?;
        config.add_datetime_columns(&table, columns);
    }
    Ok(config)
}

/// Profiles every dataset under the data directory. `None` when there is
/// nothing to profile.
pub fn collect_profiles(args: &RunArgs) -> Result<Option<Vec<TableProfile>>> {
    let config = build_config(args)?;
    let encoding = resolve_encoding(args.input_encoding.as_deref())?;
    let options = LoadOptions {
        delimiter: args.delimiter,
        encoding,
        infer_temporal: args.infer_dates,
    };

    let mut datasets = discover_datasets(&args.data_dir, &options)?;
    if datasets.is_empty() {
        info!(
            "No datasets found in {:?}; QC report step skipped",
            args.data_dir
        );
        return Ok(None);
    }
    info!("{} dataset(s) loaded", datasets.len());
    for table in config.date_time_columns.keys() {
        if !datasets.iter().any(|d| &d.name == table) {
            warn!("Date/time columns configured for unknown table '{table}'");
        }
    }

    let normalizer = MissingValueNormalizer::new(Some(config.na_list.clone()));
    info!("Missing-value tokens: {:?}", normalizer.sentinels());
    info!("Add tokens to naList in {:?} or pass --na", args.config);

    let documents = discover_documents(&args.docs_dir, encoding)?;
    let catalogs = Catalogs::load(&documents).context("Loading catalog documents")?;

    let mut profiles = Vec::with_capacity(datasets.len());
    for (idx, dataset) in datasets.iter_mut().enumerate() {
        normalizer.normalize(dataset);
        let datetime_columns = config.datetime_columns_for(dataset)?;
        profiles.push(profile_table(dataset, &catalogs, &datetime_columns, idx + 1));
    }
    Ok(Some(profiles))
}

/// Full run; returns the workbook path, or `None` when no dataset was found.
pub fn execute_profile(args: &ProfileArgs) -> Result<Option<PathBuf>> {
    let started = Instant::now();
    let Some(profiles) = collect_profiles(&args.run)? else {
        return Ok(None);
    };
    let path = render_report(&profiles, &args.output, Local::now().naive_local())?;
    info!("QC finished for {} table(s)", profiles.len());
    info!("Report written to {path:?}");
    info!("Elapsed {}", format_elapsed(started.elapsed()));
    Ok(Some(path))
}

pub fn execute_summary(args: &RunArgs) -> Result<()> {
    let Some(profiles) = collect_profiles(args)? else {
        return Ok(());
    };
    for profile in &profiles {
        println!("{}", render_profile(profile));
    }
    Ok(())
}

pub fn execute_init_config(args: &InitConfigArgs) -> Result<()> {
    if args.config.exists() {
        info!("Configuration {:?} already exists; left unchanged", args.config);
        return Ok(());
    }
    QcConfig::default().save(&args.config)?;
    info!("Default configuration written to {:?}", args.config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_formats_as_clock() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "01:02:05");
        assert_eq!(format_elapsed(Duration::from_secs(90_000)), "25:00:00");
    }
}
