//! Conversion of one whole input file.

use std::panic::{self, AssertUnwindSafe};

use log::{debug, info, warn};
use tileprep_core::{RecordParser, RowSchema, region::state_fips};

use super::accumulator::RegionAccumulator;
use super::{CancellationToken, FileOutcome, FileState, FileStats, Progress};
use crate::input::ChunkReader;
use crate::output::FeatureSink;
use crate::{FileError, InputFile};

/// Settings a worker needs for every file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FileJob<'a> {
    pub(crate) schema: &'a RowSchema,
    pub(crate) chunk_size: usize,
    pub(crate) flush_threshold: usize,
}

impl FileJob<'_> {
    /// Convert `file`, reporting each state change to `progress`.
    pub(crate) fn run<S: FeatureSink + ?Sized>(
        self,
        file: &InputFile,
        sink: &S,
        cancel: &CancellationToken,
        progress: Progress<'_>,
    ) -> FileOutcome {
        if cancel.is_cancelled() {
            debug!("skipping {} after cancellation", file.path());
            progress(file, FileState::Skipped);
            return FileOutcome::Skipped;
        }
        progress(file, FileState::InProgress);
        info!("converting {}", file.path());

        let mut stats = FileStats::default();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.convert(file, sink, cancel, &mut stats)
        }))
        .unwrap_or_else(|payload| {
            Err(FileError::Panicked {
                message: panic_message(payload.as_ref()),
            })
        });

        let outcome = match result {
            Ok(()) => {
                info!(
                    "finished {}: {} rows accepted, {} rejected",
                    file.path(),
                    stats.rows_accepted,
                    stats.rows_rejected
                );
                FileOutcome::Succeeded(stats)
            }
            Err(error) => {
                warn!("failed {}: {error}", file.path());
                FileOutcome::Failed { stats, error }
            }
        };
        progress(file, outcome.state());
        outcome
    }

    fn convert<S: FeatureSink + ?Sized>(
        self,
        file: &InputFile,
        sink: &S,
        cancel: &CancellationToken,
        stats: &mut FileStats,
    ) -> Result<(), FileError> {
        let mut parser = RecordParser::new(self.schema);
        if self.schema.region_from_file_name() {
            let (state, region) = file
                .state_name()
                .and_then(|state| Some((state, state_fips(state)?)))
                .ok_or_else(|| FileError::FileRegion {
                    file_name: file.file_name().to_owned(),
                    state: file.state_name().map(str::to_owned),
                })?;
            sink.name_region(&region, state);
            parser = parser.with_file_region(region);
        }

        let reader = ChunkReader::open(file.path(), self.chunk_size)?;
        let mut accumulator = RegionAccumulator::new(sink, self.flush_threshold);
        let mut shape_checked = false;

        for chunk in reader {
            if cancel.is_cancelled() {
                stats.features = accumulator.finish()?;
                return Err(FileError::Cancelled);
            }
            let chunk = chunk?;
            for (line_number, line) in chunk.lines() {
                if !shape_checked {
                    let found = parser.field_count(line);
                    if found != self.schema.column_count() {
                        return Err(FileError::SchemaMismatch {
                            expected: self.schema.column_count(),
                            found,
                        });
                    }
                    shape_checked = true;
                }
                stats.rows_read += 1;
                match parser.parse_line(line) {
                    Ok(record) => {
                        stats.rows_accepted += 1;
                        accumulator.push(record);
                    }
                    Err(err) => {
                        stats.rows_rejected += 1;
                        debug!("{}:{line_number}: rejected row: {err}", file.path());
                    }
                }
            }
            accumulator.end_batch()?;
        }

        stats.features = accumulator.finish()?;
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
