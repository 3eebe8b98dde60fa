//! Per-sample screening pipeline.
//!
//! Samples are independent: each owns its report, its hit list and its
//! results, so the batch runner fans out across samples with no shared
//! mutable state. Within a sample, rows are processed strictly in report
//! order because the location merge is order-sensitive.

use crate::annotate::{annotate, AlignmentRecord};
use crate::common::HitRecord;
use crate::config::ScreenConfig;
use crate::consolidate::consolidate;
use crate::error::ScreenError;
use crate::parse::read_report;
use crate::select::{select_best, Selection};
use anyhow::Result;
use bio::io::fasta;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// One sample to screen: a name and the report the search tool wrote for it.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    pub report: PathBuf,
}

/// Screening outcome for one sample.
#[derive(Debug, Clone, Default)]
pub struct SampleResult {
    pub name: String,
    /// Winning records, one per selected location.
    pub winners: Vec<HitRecord>,
    /// Gene identity to percent identity, unique per sample.
    pub identities: FxHashMap<String, f64>,
    /// Reference alignments for inexact winners, keyed by target id.
    pub annotations: FxHashMap<String, AlignmentRecord>,
}

/// Load reference target sequences from FASTA files into an id-keyed map.
pub fn load_targets(paths: &[PathBuf]) -> Result<FxHashMap<String, Vec<u8>>> {
    let mut targets = FxHashMap::default();
    for path in paths {
        let reader = fasta::Reader::from_file(path)?;
        for record in reader.records() {
            let record = record?;
            targets.insert(record.id().to_string(), record.seq().to_vec());
        }
    }
    Ok(targets)
}

/// Screen one sample end to end: parse, consolidate, select and optionally
/// annotate. A missing or unreadable report yields an empty result rather
/// than an error, so one bad sample never takes down a batch.
pub fn screen_sample(
    sample: &Sample,
    targets: &FxHashMap<String, Vec<u8>>,
    config: &ScreenConfig,
    align: bool,
) -> SampleResult {
    let mut result = SampleResult {
        name: sample.name.clone(),
        ..Default::default()
    };

    if !sample.report.is_file() {
        info!("{}: no report found, recording no detections", sample.name);
        return result;
    }
    let hits = match read_report(&sample.report, config) {
        Ok(hits) => hits,
        Err(err) => {
            warn!("{}: {err}; recording no detections", sample.name);
            return result;
        }
    };

    let locations = consolidate(&hits, config.tolerance);
    let Selection { winners, identities } = select_best(&hits, &locations);

    if align {
        for hit in &winners {
            if hit.percent_identity >= 100.0 {
                continue;
            }
            let Some(reference) = targets.get(&hit.target_id) else {
                warn!(
                    "{}: {}; reporting hit without alignment",
                    sample.name,
                    ScreenError::MissingReference(hit.target_id.clone())
                );
                continue;
            };
            match annotate(&hit.target_id, &hit.sequence, reference, config.program) {
                Ok(record) => {
                    result.annotations.insert(hit.target_id.clone(), record);
                }
                Err(err) => {
                    warn!("{}: {err}; reporting hit without alignment", sample.name);
                }
            }
        }
    }

    info!(
        "{}: {} location(s) selected from {} passing hit(s)",
        sample.name,
        winners.len(),
        hits.len()
    );
    result.winners = winners;
    result.identities = identities;
    result
}

/// Simple screening without location deduplication: every passing target is
/// recorded with the best percent identity seen for it, and its best hit is
/// kept in first-seen target order.
pub fn screen_simple(sample: &Sample, config: &ScreenConfig) -> SampleResult {
    let mut result = SampleResult {
        name: sample.name.clone(),
        ..Default::default()
    };

    if !sample.report.is_file() {
        info!("{}: no report found, recording no detections", sample.name);
        return result;
    }
    let hits = match read_report(&sample.report, config) {
        Ok(hits) => hits,
        Err(err) => {
            warn!("{}: {err}; recording no detections", sample.name);
            return result;
        }
    };

    let mut best: FxHashMap<&str, usize> = FxHashMap::default();
    let mut order: Vec<usize> = Vec::new();
    for (index, hit) in hits.iter().enumerate() {
        match best.get(hit.target_id.as_str()) {
            Some(&held) if hits[held].percent_identity >= hit.percent_identity => {}
            Some(&held) => {
                let slot = order.iter().position(|&i| i == held);
                if let Some(slot) = slot {
                    order[slot] = index;
                }
                best.insert(hit.target_id.as_str(), index);
            }
            None => {
                best.insert(hit.target_id.as_str(), index);
                order.push(index);
            }
        }
    }
    for &index in &order {
        let hit = &hits[index];
        result
            .identities
            .insert(hit.target_id.clone(), hit.percent_identity);
        result.winners.push(hit.clone());
    }
    result
}

/// Screen a batch of samples on parallel workers with a progress bar.
/// Results come back in input order.
pub fn screen_samples(
    samples: &[Sample],
    targets: &FxHashMap<String, Vec<u8>>,
    config: &ScreenConfig,
    align: bool,
) -> Vec<SampleResult> {
    let bar = ProgressBar::new(samples.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap(),
    );

    let results: Vec<SampleResult> = samples
        .par_iter()
        .map(|sample| {
            let result = screen_sample(sample, targets, config, align);
            bar.inc(1);
            result
        })
        .collect();
    bar.finish_and_clear();
    results
}
