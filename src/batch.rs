use crate::conflict;
use crate::constants::DEFAULT_QUALITY;
use crate::error::{ProcessingError, Result};
use crate::formats::{FormatCapabilities, OutputSelection};
use crate::paths::{auto_rename, output_path_for};
use crate::processing::{process, ProcessingRequest, ProcessingResult};
use crate::utils::{calculate_reduction_pct, is_image_file};
use crate::validation::prepare_output_dir;
use glob::glob;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

/// What to do when a file's output path is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ConflictStrategy {
    /// Overwrite the existing file
    Replace,
    /// Leave the existing file alone and do not process the input
    #[default]
    Skip,
    /// Write to the first free `stem_N.ext` instead
    AutoRename,
}

impl FromStr for ConflictStrategy {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "replace" | "overwrite" => Ok(ConflictStrategy::Replace),
            "skip" => Ok(ConflictStrategy::Skip),
            "rename" | "auto-rename" | "autorename" => Ok(ConflictStrategy::AutoRename),
            _ => Err(ProcessingError::UnsupportedFormat(format!(
                "Unknown conflict strategy: {}",
                s
            ))),
        }
    }
}

/// Batch-wide strategy with optional per-input overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictPolicy {
    default: ConflictStrategy,
    overrides: HashMap<PathBuf, ConflictStrategy>,
}

impl ConflictPolicy {
    pub fn uniform(strategy: ConflictStrategy) -> Self {
        Self {
            default: strategy,
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, input: impl Into<PathBuf>, strategy: ConflictStrategy) -> Self {
        self.overrides.insert(input.into(), strategy);
        self
    }

    pub fn strategy_for(&self, input: &Path) -> ConflictStrategy {
        self.overrides.get(input).copied().unwrap_or(self.default)
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub output_dir: PathBuf,
    pub selection: OutputSelection,
    pub quality: u8,
    pub remove_metadata: bool,
    pub conflict_policy: ConflictPolicy,
    /// Worker count; 0 means one per CPU
    pub threads: usize,
}

impl BatchConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            selection: OutputSelection::KeepOriginal,
            quality: DEFAULT_QUALITY,
            remove_metadata: false,
            conflict_policy: ConflictPolicy::default(),
            threads: 0,
        }
    }

    fn worker_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

/// Cooperative cancellation shared between the caller and a running batch.
///
/// Checked before each file starts; files already being processed finish.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where a single input is headed, decided before any work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedFile {
    Process { input: PathBuf, output: PathBuf },
    Skip { input: PathBuf, existing: PathBuf },
}

impl PlannedFile {
    pub fn input(&self) -> &Path {
        match self {
            PlannedFile::Process { input, .. } | PlannedFile::Skip { input, .. } => input,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Processed(ProcessingResult),
    Skipped { existing_path: PathBuf },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    /// Position of the input in the batch
    pub index: usize,
    pub input_path: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn result(&self) -> Option<&ProcessingResult> {
        match &self.outcome {
            FileOutcome::Processed(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    /// Totals over successfully processed files only
    pub total_original_bytes: u64,
    pub total_output_bytes: u64,
    pub overall_reduction_pct: f64,
}

impl BatchReport {
    pub fn from_files(files: Vec<FileReport>) -> Self {
        let mut report = BatchReport::default();
        for file in &files {
            match &file.outcome {
                FileOutcome::Processed(result) if result.success => {
                    report.succeeded += 1;
                    report.total_original_bytes += result.original_size_bytes;
                    report.total_output_bytes += result.output_size_bytes;
                }
                FileOutcome::Processed(_) => report.failed += 1,
                FileOutcome::Skipped { .. } => report.skipped += 1,
                FileOutcome::Cancelled => report.cancelled += 1,
            }
        }
        report.overall_reduction_pct =
            calculate_reduction_pct(report.total_original_bytes, report.total_output_bytes);
        report.files = files;
        report
    }
}

pub struct BatchProcessor<'a> {
    config: BatchConfig,
    capabilities: &'a FormatCapabilities,
    cancellation: CancellationToken,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(config: BatchConfig, capabilities: &'a FormatCapabilities) -> Self {
        Self {
            config,
            capabilities,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Resolve every input to an output path or a skip.
    ///
    /// Fails only if the output directory is unusable, in which case nothing
    /// has been touched. Inputs are resolved in order, and a path claimed by
    /// an earlier input counts as taken for later ones.
    pub fn plan<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<Vec<PlannedFile>> {
        let prepared = prepare_output_dir(&self.config.output_dir)?;
        debug!(output_dir = ?prepared, files = inputs.len(), "planning batch");

        let mut claimed: HashSet<PathBuf> = HashSet::new();
        let mut plan = Vec::with_capacity(inputs.len());

        for input in inputs {
            let input = input.as_ref();
            let predicted = output_path_for(input, &self.config.output_dir, self.config.selection);
            let taken = |p: &Path| conflict::exists(p) || claimed.contains(p);

            let planned = if !taken(&predicted) {
                PlannedFile::Process {
                    input: input.to_path_buf(),
                    output: predicted,
                }
            } else {
                match self.config.conflict_policy.strategy_for(input) {
                    ConflictStrategy::Replace => PlannedFile::Process {
                        input: input.to_path_buf(),
                        output: predicted,
                    },
                    ConflictStrategy::Skip => PlannedFile::Skip {
                        input: input.to_path_buf(),
                        existing: predicted,
                    },
                    ConflictStrategy::AutoRename => PlannedFile::Process {
                        input: input.to_path_buf(),
                        output: auto_rename(&predicted, taken),
                    },
                }
            };

            if let PlannedFile::Process { output, .. } = &planned {
                claimed.insert(output.clone());
            }
            plan.push(planned);
        }

        Ok(plan)
    }

    /// Plan and process the batch. `observer` sees each file's report as
    /// soon as it is final, from whichever worker produced it; the returned
    /// report lists files in input order.
    pub fn run<P, F>(&self, inputs: &[P], observer: F) -> Result<BatchReport>
    where
        P: AsRef<Path>,
        F: Fn(&FileReport) + Sync,
    {
        let plan = self.plan(inputs)?;
        let start_time = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count().min(plan.len()).max(1))
            .build()?;
        info!(
            files = plan.len(),
            threads = pool.current_num_threads(),
            selection = %self.config.selection,
            "starting batch"
        );

        let files: Vec<FileReport> = pool.install(|| {
            plan.into_par_iter()
                .enumerate()
                .map(|(index, planned)| {
                    let report = self.execute(index, planned);
                    observer(&report);
                    report
                })
                .collect()
        });

        let report = BatchReport::from_files(files);
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            elapsed = ?start_time.elapsed(),
            "batch finished"
        );
        Ok(report)
    }

    fn execute(&self, index: usize, planned: PlannedFile) -> FileReport {
        let input_path = planned.input().to_path_buf();
        if self.cancellation.is_cancelled() {
            return FileReport {
                index,
                input_path,
                outcome: FileOutcome::Cancelled,
            };
        }

        let outcome = match planned {
            PlannedFile::Skip { existing, .. } => {
                debug!(input = ?input_path, existing = ?existing, "skipping, output exists");
                FileOutcome::Skipped {
                    existing_path: existing,
                }
            }
            PlannedFile::Process { input, output } => {
                let request = self.request_for(input, output);
                FileOutcome::Processed(process(&request, self.capabilities))
            }
        };

        FileReport {
            index,
            input_path,
            outcome,
        }
    }

    fn request_for(&self, input: PathBuf, output: PathBuf) -> ProcessingRequest {
        let quality = self.config.quality as i64;
        match self.config.selection.target() {
            Some(target) => ProcessingRequest::convert(
                input,
                output,
                target.extension(),
                quality,
                self.config.remove_metadata,
            ),
            None => {
                ProcessingRequest::compress(input, output, quality, self.config.remove_metadata)
            }
        }
    }
}

/// Expand one input argument (file, directory or glob pattern) into the
/// image files it names. Hidden directory entries are skipped.
pub fn collect_image_files(input: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut image_files = Vec::new();
    let input_path = Path::new(input);

    if input_path.is_file() {
        image_files.push(input_path.to_path_buf());
    } else if input_path.is_dir() {
        let walker = if recursive {
            WalkDir::new(input_path)
        } else {
            WalkDir::new(input_path).max_depth(1)
        };

        for entry in walker
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_image_file(path) {
                image_files.push(path.to_path_buf());
            }
        }
    } else if let Ok(pattern) = glob(input) {
        for entry in pattern.flatten() {
            if entry.is_file() && is_image_file(&entry) {
                image_files.push(entry);
            }
        }
    } else {
        return Err(ProcessingError::NoImageFilesFound(input.to_string()));
    }

    Ok(image_files)
}

/// Collect the files named by every input argument, in argument order.
pub fn collect_inputs<S: AsRef<str>>(inputs: &[S], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        files.extend(collect_image_files(input.as_ref(), recursive)?);
    }

    if files.is_empty() {
        let joined: Vec<&str> = inputs.iter().map(|s| s.as_ref()).collect();
        return Err(ProcessingError::NoImageFilesFound(joined.join(", ")));
    }
    Ok(files)
}
