use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::{AppError, ProviderError};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::Provider;
use crate::providers::openai::OpenAI;
use crate::translation::batch::{self, Batch};
use crate::translation::reconciler::{self, UnitOutcome};
use crate::translation::{TranslationOptions, TranslationService};
use crate::workbook::{Workbook, XlsxWorkbook};

// @module: Application controller for workbook translation

/// Shared stop request, set from the Ctrl-C handler
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
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

/// Tallies for one translated document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentReport {
    /// Eligible text units found across all sheets
    pub units: usize,
    /// Completion calls made (or attempted)
    pub batches: usize,
    /// Units whose translation was written
    pub written: usize,
    /// Units whose write failed
    pub write_failures: usize,
    /// Units left without a translated segment
    pub missing: usize,
    /// Batches that fell back to the original texts
    pub passthrough_batches: usize,
    /// Where the translated copy was saved
    pub output_path: Option<PathBuf>,
}

impl DocumentReport {
    fn record(&mut self, outcomes: &[UnitOutcome]) {
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Written => self.written += 1,
                UnitOutcome::WriteFailed(_) => self.write_failures += 1,
                UnitOutcome::MissingTranslation => self.missing += 1,
            }
        }
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// File names translated and saved
    pub succeeded: Vec<String>,
    /// File names that could not be translated or saved
    pub failed: Vec<String>,
    /// The input directory was missing and has been created
    pub input_dir_created: bool,
    /// The run stopped early on request
    pub cancelled: bool,
    /// Wall time of the run
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Main application controller for workbook translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Completion client shared by every batch of the run
    provider: Box<dyn Provider>,
    // @field: Stop request checked between documents and batches
    cancellation: CancellationFlag,
}

impl Controller {
    // @method: Create a controller with an OpenAI-compatible client built from the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let provider = OpenAI::new(
            config.llm.api_key.clone(),
            config.llm.endpoint.clone(),
            config.llm.model.clone(),
            config.llm.timeout_secs,
        )?;
        Ok(Self::with_provider(config, Box::new(provider)))
    }

    /// Create a controller over any provider
    pub fn with_provider(config: Config, provider: Box<dyn Provider>) -> Self {
        Self {
            config,
            provider,
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle that stops the run when cancelled
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    /// Translation service borrowing this controller's provider
    pub fn translation_service(&self) -> TranslationService<'_> {
        TranslationService::new(self.provider.as_ref(), TranslationOptions::from_config(&self.config))
    }

    /// Check that the completion endpoint answers
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        info!("Testing connection to {}", self.provider.describe());
        self.provider.test_connection().await
    }

    /// Fail with `DirectoryNotFound` when the input directory is absent
    pub fn check_input_dir(&self) -> Result<(), AppError> {
        let input_dir = &self.config.input_dir;
        if FileManager::dir_exists(input_dir) {
            Ok(())
        } else {
            Err(AppError::DirectoryNotFound(input_dir.clone()))
        }
    }

    /// Translate every workbook of the input directory
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();
        let input_dir = &self.config.input_dir;

        if let Err(missing) = self.check_input_dir() {
            warn!("{}", missing);
            FileManager::ensure_dir(input_dir)?;
            info!("📂 Created input directory: {}", input_dir.display());
            info!("Put the workbooks to translate in this directory and run again.");
            summary.input_dir_created = true;
            summary.elapsed = start_time.elapsed();
            return Ok(summary);
        }

        FileManager::ensure_dir(&self.config.output_dir)?;

        let workbooks = FileManager::find_workbooks(input_dir)?;
        if workbooks.is_empty() {
            warn!("No .xlsx or .xls files found in {}", input_dir.display());
            summary.elapsed = start_time.elapsed();
            return Ok(summary);
        }

        let source_name = language_utils::get_language_name(&self.config.source_language)?;
        let target_name = language_utils::get_language_name(&self.config.target_language)?;
        info!(
            "🚀 Translating {} workbook(s) from {} to {} with {}",
            workbooks.len(),
            source_name,
            target_name,
            self.provider.describe()
        );

        let service = self.translation_service();

        for path in &workbooks {
            let file_name = path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            if self.cancellation.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            info!("🔄 Processing file: {}", file_name);
            match self.process_document(path, &service).await {
                Ok(report) => {
                    info!(
                        "✅ Done: {} ({} of {} texts written, {} batch(es), {} fallback)",
                        report.output_path.as_deref().unwrap_or(path).display(),
                        report.written,
                        report.units,
                        report.batches,
                        report.passthrough_batches
                    );
                    summary.succeeded.push(file_name);
                }
                Err(AppError::Cancelled) => {
                    warn!("Cancelled while processing {}, file not saved", file_name);
                    summary.failed.push(file_name);
                    summary.cancelled = true;
                    break;
                }
                Err(e) => {
                    error!("❌ Error processing file {}: {}", file_name, e);
                    summary.failed.push(file_name);
                }
            }
        }

        summary.elapsed = start_time.elapsed();
        info!(
            "🏁 Completed: {} succeeded, {} failed out of {} file(s) in {}",
            summary.succeeded.len(),
            summary.failed.len(),
            summary.total(),
            Self::format_duration(summary.elapsed)
        );
        for name in &summary.failed {
            warn!("Failed: {}", name);
        }

        Ok(summary)
    }

    /// Open, translate and save one workbook
    pub async fn process_document(
        &self,
        input_path: &Path,
        service: &TranslationService<'_>,
    ) -> Result<DocumentReport, AppError> {
        let mut workbook = XlsxWorkbook::open(input_path)?;
        let mut report = self.translate_workbook(&mut workbook, service).await?;

        let output_path =
            FileManager::generate_output_path(input_path, &self.config.output_dir, &self.config.target_language);
        workbook.save(&output_path)?;
        report.output_path = Some(output_path);
        Ok(report)
    }

    /// Translate every sheet of an opened workbook in place
    pub async fn translate_workbook<W: Workbook + ?Sized>(
        &self,
        workbook: &mut W,
        service: &TranslationService<'_>,
    ) -> Result<DocumentReport, AppError> {
        let mut report = DocumentReport::default();
        let mut batches: Vec<Batch> = Vec::new();

        for sheet in workbook.sheet_names() {
            let units = batch::collect_sheet_units(&*workbook, &sheet);
            if units.is_empty() {
                debug!("Sheet '{}': nothing to translate", sheet);
                continue;
            }
            debug!("Sheet '{}': {} text unit(s)", sheet, units.len());
            report.units += units.len();
            batches.extend(batch::partition(units, self.config.translation.batch_size)?);
        }

        if batches.is_empty() {
            info!("No translatable text found");
            return Ok(report);
        }

        let progress_bar = ProgressBar::new(batches.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        for batch in &batches {
            if self.cancellation.is_cancelled() {
                progress_bar.abandon_with_message("Cancelled");
                return Err(AppError::Cancelled);
            }

            let translation = service
                .translate_batch_report(
                    &batch.texts(),
                    &self.config.source_language,
                    &self.config.target_language,
                )
                .await;
            report.batches += 1;
            if translation.passthrough {
                report.passthrough_batches += 1;
            }

            let outcomes = reconciler::apply(workbook, batch, &translation.segments);
            report.record(&outcomes);
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        Ok(report)
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
