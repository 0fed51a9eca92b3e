pub mod cli;
pub mod config;
pub mod error;
pub mod launcher;
pub mod tables;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat};
pub use config::{CliOverrides, Config, ModulesConfig, PipelineConfig, SchedulerConfig};
pub use error::{PlotrunError, Result, UserFriendlyError};

// Core functionality re-exports
pub use launcher::{BatchScript, EngineInvocation, LaunchOutcome};
pub use tables::{DuplicateReport, MergeReport};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use regex::Regex;
use std::path::{Path, PathBuf};

/// How a launch should be executed.
#[derive(Debug, Clone)]
pub enum LaunchMode {
    /// Run the batch script locally through bash.
    Local,
    /// Hand the batch script to sbatch.
    Submit,
    /// Write the batch script to a file without executing it.
    Script(PathBuf),
}

/// Main library interface for plotrun functionality
pub struct Plotrun {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl Plotrun {
    /// Create a new Plotrun instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Create a new Plotrun instance for testing (no signal handler conflicts)
    #[cfg(test)]
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);
        let shutdown = GracefulShutdown::new_for_test();

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    /// Create Plotrun instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Assemble the batch job and execute it per the requested mode.
    ///
    /// The external engine's exit status is surfaced in the outcome rather
    /// than inspected here; launch semantics stay fire-and-forget.
    pub fn launch(&self, mode: LaunchMode) -> Result<LaunchOutcome> {
        self.shutdown.check_shutdown()?;

        let batch = BatchScript::from_config(&self.config);
        let script = batch.render();

        match mode {
            LaunchMode::Script(path) => {
                std::fs::write(&path, &script)?;
                self.output_formatter
                    .success(&format!("Wrote batch script: {}", path.display()));
                Ok(LaunchOutcome::ScriptWritten { path })
            }
            LaunchMode::Submit => {
                self.output_formatter
                    .start_operation("Submitting batch job via sbatch");
                let job_id = launcher::submit(&script)?;
                match &job_id {
                    Some(id) => self
                        .output_formatter
                        .success(&format!("Submitted batch job {}", id)),
                    None => self.output_formatter.success("Submitted batch job"),
                }
                Ok(LaunchOutcome::Submitted { job_id })
            }
            LaunchMode::Local => {
                self.output_formatter.start_operation(&format!(
                    "Running pipeline: {}",
                    batch.invocation().run_command_line()
                ));
                let status = launcher::run_local(&script)?;
                Ok(LaunchOutcome::Completed { status })
            }
        }
    }

    /// The rendered batch script for the current configuration.
    pub fn batch_script(&self) -> BatchScript {
        BatchScript::from_config(&self.config)
    }

    /// Scan for plot-table databases and write their paths to a list file.
    /// Returns the number of matched files.
    pub fn list_dbs(&self, input_dir: &Path, output_list: &Path) -> Result<usize> {
        self.shutdown.check_shutdown()?;
        self.output_formatter
            .start_operation("Scanning for plot-table databases");

        let pattern =
            Regex::new(&self.config.tables.db_pattern).map_err(|_| PlotrunError::InvalidPattern {
                pattern: self.config.tables.db_pattern.clone(),
            })?;

        let paths = tables::scan_plot_dbs(input_dir, &pattern)?;
        tables::write_list_file(&paths, output_list)?;

        self.output_formatter
            .info(&format!("Input directory: {}", input_dir.display()));
        self.output_formatter
            .info(&format!("Matched files: {}", paths.len()));
        self.output_formatter
            .success(&format!("Wrote list file: {}", output_list.display()));

        Ok(paths.len())
    }

    /// Merge the listed databases into one deduplicated database.
    pub fn merge_dbs(&self, input_list: &Path, output_sqlite: &Path) -> Result<MergeReport> {
        self.shutdown.check_shutdown()?;
        self.output_formatter
            .start_operation("Merging plot-table databases");

        let inputs = tables::read_list_file(input_list)?;
        self.output_formatter
            .info(&format!("Input files: {}", inputs.len()));

        let pb = self.progress_manager.create_db_progress(inputs.len() as u64);
        let progress_callback = {
            let pb = pb.clone();
            move |_index: usize, path: &Path| {
                pb.set_message(
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                );
                pb.inc(1);
            }
        };

        let report = tables::merge_databases(&inputs, output_sqlite, Some(&progress_callback))?;
        pb.finish_and_clear();
        self.shutdown.check_shutdown()?;

        self.output_formatter.print_merge_summary(&report);
        Ok(report)
    }

    /// Extract duplicated payload rows from each listed database.
    pub fn extract_dups(&self, input_list: &Path, output_dir: &Path) -> Result<DuplicateReport> {
        self.shutdown.check_shutdown()?;
        self.output_formatter
            .start_operation("Extracting duplicate payload rows");

        let inputs = tables::read_list_file(input_list)?;
        self.output_formatter
            .info(&format!("Input files: {}", inputs.len()));
        self.output_formatter
            .info(&format!("Output directory: {}", output_dir.display()));

        let pb = self.progress_manager.create_db_progress(inputs.len() as u64);
        let progress_callback = {
            let pb = pb.clone();
            move |_index: usize, path: &Path| {
                pb.set_message(
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                );
                pb.inc(1);
            }
        };

        let report = tables::extract_all_duplicates(&inputs, output_dir, Some(&progress_callback))?;
        pb.finish_and_clear();
        self.shutdown.check_shutdown()?;

        self.output_formatter.print_duplicate_summary(&report);
        Ok(report)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config).map_err(PlotrunError::Io)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Check if shutdown has been requested
    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    /// Request graceful shutdown
    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &PlotrunError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use tempfile::TempDir;

    #[test]
    fn test_plotrun_creation() {
        let config = Config::default();
        let plotrun = Plotrun::new_for_test(config, OutputMode::Plain, 0, true);
        assert!(plotrun.is_running());
        assert_eq!(plotrun.config().scheduler.job_name, "plot_data");
    }

    #[test]
    fn test_launch_script_mode() {
        let config = Config::default();
        let plotrun = Plotrun::new_for_test(config, OutputMode::Plain, 0, true);

        let temp_dir = TempDir::new().unwrap();
        let script_path = temp_dir.path().join("plot_data.sh");

        let outcome = plotrun
            .launch(LaunchMode::Script(script_path.clone()))
            .unwrap();
        assert!(matches!(outcome, LaunchOutcome::ScriptWritten { .. }));

        let script = std::fs::read_to_string(&script_path).unwrap();
        assert!(script.contains("#SBATCH --job-name=plot_data"));
        assert!(script.contains("nextflow run main.nf -profile tartu_hpc -resume"));
    }

    #[test]
    fn test_launch_refused_after_shutdown() {
        let config = Config::default();
        let plotrun = Plotrun::new_for_test(config, OutputMode::Plain, 0, true);
        plotrun.request_shutdown();

        let result = plotrun.launch(LaunchMode::Local);
        assert!(matches!(result, Err(PlotrunError::Cancelled)));
    }

    #[test]
    fn test_list_then_merge() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("plots");
        std::fs::create_dir_all(&data_dir).unwrap();

        for name in ["QTS000001.sqlite", "QTS000002.sqlite"] {
            let conn = Connection::open(data_dir.join(name)).unwrap();
            tables::create_plot_table(&conn, "main").unwrap();
            conn.execute(
                "INSERT INTO credible_set_table (study_id, gene_id) VALUES ('QTS', 'ENSG1')",
                [],
            )
            .unwrap();
        }

        let config = Config::default();
        let plotrun = Plotrun::new_for_test(config, OutputMode::Plain, 0, true);

        let list_path = temp_dir.path().join("qts_paths.txt");
        let matched = plotrun.list_dbs(&data_dir, &list_path).unwrap();
        assert_eq!(matched, 2);

        let merged = temp_dir.path().join("merged.sqlite");
        let report = plotrun.merge_dbs(&list_path, &merged).unwrap();
        assert_eq!(report.total_input_rows(), 2);
        // Identical payloads collapse to one row.
        assert_eq!(report.merged_rows, 1);
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        Plotrun::generate_sample_config(&config_path).unwrap();
        assert!(config_path.exists());

        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[scheduler]"));
        assert!(content.contains("[pipeline]"));
    }

    #[test]
    fn test_version_info() {
        assert!(!version_info().is_empty());
    }
}
