//! Per-file results and the run summary.

use std::collections::BTreeMap;
use std::io::{self, Write};

use tileprep_core::RegionKey;

use crate::output::CloseReport;
use crate::{FileError, InputFile, WriteError};

/// Lifecycle of one input file within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Pending,
    InProgress,
    Succeeded,
    Failed,
    /// Cancelled before a worker picked the file up.
    Skipped,
}

impl FileState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }
}

/// Row and feature counts for one input file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStats {
    /// Non-blank data rows read.
    pub rows_read: u64,
    pub rows_accepted: u64,
    pub rows_rejected: u64,
    /// Features this file contributed to each region.
    pub features: BTreeMap<RegionKey, u64>,
}

/// Terminal result for one input file.
#[derive(Debug)]
pub enum FileOutcome {
    Succeeded(FileStats),
    Failed { stats: FileStats, error: FileError },
    Skipped,
}

impl FileOutcome {
    #[must_use]
    pub const fn state(&self) -> FileState {
        match self {
            Self::Succeeded(_) => FileState::Succeeded,
            Self::Failed { .. } => FileState::Failed,
            Self::Skipped => FileState::Skipped,
        }
    }

    #[must_use]
    pub const fn stats(&self) -> Option<&FileStats> {
        match self {
            Self::Succeeded(stats) | Self::Failed { stats, .. } => Some(stats),
            Self::Skipped => None,
        }
    }
}

/// The outcome for one input file.
#[derive(Debug)]
pub struct WorkerResult {
    pub file: InputFile,
    pub outcome: FileOutcome,
}

/// Aggregate outcome of a conversion run.
#[derive(Debug)]
pub struct RunSummary {
    results: Vec<WorkerResult>,
    regions: BTreeMap<RegionKey, u64>,
    close_failures: Vec<(RegionKey, WriteError)>,
}

impl RunSummary {
    pub(crate) fn new(results: Vec<WorkerResult>, closed: CloseReport) -> Self {
        Self {
            results,
            regions: closed.features,
            close_failures: closed.failures,
        }
    }

    /// Per-file results in input order.
    #[must_use]
    pub fn results(&self) -> &[WorkerResult] {
        &self.results
    }

    /// Features written per region.
    #[must_use]
    pub const fn regions(&self) -> &BTreeMap<RegionKey, u64> {
        &self.regions
    }

    /// Regions whose output could not be closed cleanly.
    #[must_use]
    pub fn close_failures(&self) -> &[(RegionKey, WriteError)] {
        &self.close_failures
    }

    #[must_use]
    pub fn total_files(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.count(FileState::Succeeded)
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(FileState::Failed)
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(FileState::Skipped)
    }

    #[must_use]
    pub fn rows_read(&self) -> u64 {
        self.sum(|stats| stats.rows_read)
    }

    #[must_use]
    pub fn rows_accepted(&self) -> u64 {
        self.sum(|stats| stats.rows_accepted)
    }

    #[must_use]
    pub fn rows_rejected(&self) -> u64 {
        self.sum(|stats| stats.rows_rejected)
    }

    /// Total features written across regions.
    #[must_use]
    pub fn features_written(&self) -> u64 {
        self.regions.values().sum()
    }

    /// True when there was work and none of it succeeded.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.failed() == self.total_files()
    }

    fn count(&self, state: FileState) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome.state() == state)
            .count()
    }

    fn sum(&self, field: impl Fn(&FileStats) -> u64) -> u64 {
        self.results
            .iter()
            .filter_map(|result| result.outcome.stats())
            .map(field)
            .sum()
    }

    /// Write a human-readable report.
    pub fn write_report(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Conversion summary")?;
        writeln!(out, "  files:     {}", self.total_files())?;
        writeln!(out, "  succeeded: {}", self.succeeded())?;
        writeln!(out, "  failed:    {}", self.failed())?;
        if self.skipped() > 0 {
            writeln!(out, "  skipped:   {}", self.skipped())?;
        }
        writeln!(
            out,
            "  rows:      {} read, {} accepted, {} rejected",
            self.rows_read(),
            self.rows_accepted(),
            self.rows_rejected()
        )?;
        for result in &self.results {
            if let FileOutcome::Failed { error, .. } = &result.outcome {
                writeln!(out, "  failed {}: {error}", result.file.file_name())?;
            }
        }
        if !self.regions.is_empty() {
            writeln!(out, "Regions:")?;
            for (region, features) in &self.regions {
                writeln!(out, "  {region}: {features} features")?;
            }
        }
        for (region, error) in &self.close_failures {
            writeln!(out, "  region {region} not closed: {error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn stats(read: u64, rejected: u64) -> FileStats {
        FileStats {
            rows_read: read,
            rows_accepted: read - rejected,
            rows_rejected: rejected,
            features: BTreeMap::new(),
        }
    }

    fn summary(outcomes: Vec<FileOutcome>) -> RunSummary {
        let results = outcomes
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| WorkerResult {
                file: InputFile::new(format!("clu{index:02}_x_STR.txt")),
                outcome,
            })
            .collect();
        let mut closed = CloseReport::default();
        closed
            .features
            .insert(RegionKey::parse("01", 2).expect("key"), 5);
        RunSummary::new(results, closed)
    }

    #[rstest]
    fn totals_rows_across_files() {
        let summary = summary(vec![
            FileOutcome::Succeeded(stats(4, 1)),
            FileOutcome::Failed {
                stats: stats(3, 1),
                error: FileError::Cancelled,
            },
            FileOutcome::Skipped,
        ]);
        assert_eq!(summary.total_files(), 3);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.rows_read(), 7);
        assert_eq!(summary.rows_accepted(), 5);
        assert_eq!(summary.rows_rejected(), 2);
        assert_eq!(summary.features_written(), 5);
        assert!(!summary.all_failed());
    }

    #[rstest]
    fn all_failed_requires_every_file_to_fail() {
        let failed = summary(vec![FileOutcome::Failed {
            stats: FileStats::default(),
            error: FileError::SchemaMismatch {
                expected: 3,
                found: 2,
            },
        }]);
        assert!(failed.all_failed());
        assert!(!summary(Vec::new()).all_failed());
    }

    #[rstest]
    fn report_lists_failures_and_regions() {
        let summary = summary(vec![FileOutcome::Failed {
            stats: FileStats::default(),
            error: FileError::Cancelled,
        }]);
        let mut out = Vec::new();
        summary.write_report(&mut out).expect("write report");
        let text = String::from_utf8(out).expect("utf-8 report");
        assert!(text.contains("failed clu00_x_STR.txt: cancelled"));
        assert!(text.contains("01: 5 features"));
    }
}
