//! Bounded worker pool that converts whole files in parallel.
//!
//! Each worker takes one file at a time and streams it through the parser
//! and a per-file [`accumulator`] into the shared [`OutputDirectory`]. A
//! failing file never aborts the run; its error is reported in the
//! [`RunSummary`].

mod accumulator;
mod cancel;
mod summary;
mod worker;

pub use cancel::CancellationToken;
pub use summary::{FileOutcome, FileState, FileStats, RunSummary, WorkerResult};

use camino::Utf8PathBuf;
use log::info;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tileprep_core::{
    RecipeTemplate, RowSchema, Schema,
    recipe::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM},
};

use crate::output::OutputDirectory;
use crate::{ConvertOptionsError, InputFile};
use worker::FileJob;

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 2;
/// Default number of lines read per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;
/// Default buffered records per region before a flush.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 50_000;

/// Observer told about every [`FileState`] a file enters.
///
/// Called from worker threads; each file reports `Pending` first and a
/// terminal state last.
pub type Progress<'a> = &'a (dyn Fn(&InputFile, FileState) + Sync);

/// Settings for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub output_dir: Utf8PathBuf,
    pub workers: usize,
    pub chunk_size: usize,
    pub flush_threshold: usize,
    pub schema: Schema,
    /// Account that owns the tileset sources named in recipes.
    pub profile: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Properties kept in tiles; defaults to the schema's attribute names.
    pub allowed_output: Option<Vec<String>>,
}

impl ConvertOptions {
    /// Options with defaults for everything except the output and profile.
    #[must_use]
    pub fn new(output_dir: impl Into<Utf8PathBuf>, profile: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            workers: DEFAULT_WORKERS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            schema: Schema::clu(),
            profile: profile.into(),
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            allowed_output: None,
        }
    }
}

/// A validated conversion with its worker pool.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use tileprep_data::{CancellationToken, ConvertOptions, Converter, discover_inputs};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let files = discover_inputs(Utf8Path::new("exports"), "clu*_*_STR.txt")?;
/// let converter = Converter::new(ConvertOptions::new("output", "acme"))?;
/// let summary = converter.run(&files, &CancellationToken::new());
/// summary.write_report(&mut std::io::stdout())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Converter {
    output_dir: Utf8PathBuf,
    chunk_size: usize,
    flush_threshold: usize,
    schema: RowSchema,
    recipe: RecipeTemplate,
    pool: ThreadPool,
}

impl Converter {
    /// Validate `options` and start a pool of exactly `options.workers` threads.
    pub fn new(options: ConvertOptions) -> Result<Self, ConvertOptionsError> {
        if options.workers == 0 {
            return Err(ConvertOptionsError::ZeroWorkers);
        }
        if options.chunk_size == 0 {
            return Err(ConvertOptionsError::ZeroChunkSize);
        }
        if options.flush_threshold == 0 {
            return Err(ConvertOptionsError::ZeroFlushThreshold);
        }
        let schema = options.schema.compile()?;
        let allowed_output = options
            .allowed_output
            .unwrap_or_else(|| schema.attribute_names().map(str::to_owned).collect());
        let recipe = RecipeTemplate::new(
            options.profile,
            options.min_zoom,
            options.max_zoom,
            allowed_output,
        )?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .thread_name(|index| format!("tileprep-worker-{index}"))
            .build()?;
        Ok(Self {
            output_dir: options.output_dir,
            chunk_size: options.chunk_size,
            flush_threshold: options.flush_threshold,
            schema,
            recipe,
            pool,
        })
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Convert `files` and close every region file written.
    ///
    /// Results keep the order of `files`. Files not started before `cancel`
    /// fires are reported as skipped.
    pub fn run(&self, files: &[InputFile], cancel: &CancellationToken) -> RunSummary {
        self.run_with_progress(files, cancel, &|_, _| {})
    }

    /// Like [`Converter::run`], reporting file state changes to `progress`.
    pub fn run_with_progress(
        &self,
        files: &[InputFile],
        cancel: &CancellationToken,
        progress: Progress<'_>,
    ) -> RunSummary {
        let output = OutputDirectory::new(
            self.output_dir.clone(),
            self.schema.region_property(),
            self.recipe.clone(),
        );
        let job = FileJob {
            schema: &self.schema,
            chunk_size: self.chunk_size,
            flush_threshold: self.flush_threshold,
        };
        for file in files {
            progress(file, FileState::Pending);
        }

        info!(
            "converting {} files with {} workers into {}",
            files.len(),
            self.worker_count(),
            self.output_dir
        );
        let results: Vec<WorkerResult> = self.pool.install(|| {
            files
                .par_iter()
                .map(|file| WorkerResult {
                    file: file.clone(),
                    outcome: job.run(file, &output, cancel, progress),
                })
                .collect()
        });

        RunSummary::new(results, output.close())
    }
}
