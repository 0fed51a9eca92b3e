use crate::error::{PlotrunError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub modules: ModulesConfig,
    pub pipeline: PipelineConfig,
    pub tables: TablesConfig,
}

/// Resource requests attached to the batch submission. These are declarative
/// hints consumed by SLURM, never interpreted by the launcher itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    pub time: String,
    pub nodes: u32,
    pub ntasks_per_node: u32,
    pub mem: String,
    pub job_name: String,
}

/// Ordered list of environment modules loaded before the engine invocation.
/// Order is preserved exactly: later tools may depend on earlier ones being
/// on the search path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModulesConfig {
    pub load: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub engine: String,
    pub entrypoint: String,
    pub profile: String,
    pub resume: bool,
    pub study_file: String,
    pub outdir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TablesConfig {
    pub db_pattern: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            modules: ModulesConfig::default(),
            pipeline: PipelineConfig::default(),
            tables: TablesConfig::default(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time: "48:00:00".to_string(),
            nodes: 1,
            ntasks_per_node: 1,
            mem: "8G".to_string(),
            job_name: "plot_data".to_string(),
        }
    }
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            load: vec![
                "any/jdk/1.8.0_265".to_string(),
                "nextflow".to_string(),
                "any/singularity/3.5.3".to_string(),
                "squashfs/4.4".to_string(),
                "tabix/0.2.6".to_string(),
            ],
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            engine: "nextflow".to_string(),
            entrypoint: "main.nf".to_string(),
            profile: "tartu_hpc".to_string(),
            resume: true,
            study_file: "input/GTEx_V10_all/GTEx_V10_inputs_tx_all.tsv".to_string(),
            outdir: "/gpfs/helios/projects/eQTLCatalogue/coverage_plots/GTEx_V10_all_tx"
                .to_string(),
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            db_pattern: r"^QTS.*\.sqlite$".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PlotrunError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PlotrunError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| PlotrunError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                // Try to load from default locations
                let default_paths = ["plotrun.toml", ".plotrun.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                // If no config file found, use defaults
                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref study_file) = cli_args.study_file {
            self.pipeline.study_file = study_file.clone();
        }

        if let Some(ref outdir) = cli_args.outdir {
            self.pipeline.outdir = outdir.clone();
        }

        if let Some(ref profile) = cli_args.profile {
            self.pipeline.profile = profile.clone();
        }

        if let Some(ref entrypoint) = cli_args.entrypoint {
            self.pipeline.entrypoint = entrypoint.clone();
        }

        if let Some(resume) = cli_args.resume {
            self.pipeline.resume = resume;
        }

        if let Some(ref time) = cli_args.time {
            self.scheduler.time = time.clone();
        }

        if let Some(ref mem) = cli_args.mem {
            self.scheduler.mem = mem.clone();
        }

        if let Some(ref job_name) = cli_args.job_name {
            self.scheduler.job_name = job_name.clone();
        }

        if let Some(ref db_pattern) = cli_args.db_pattern {
            self.tables.db_pattern = db_pattern.clone();
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| PlotrunError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| PlotrunError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    /// Note: the two pipeline path parameters (study_file, outdir) are
    /// deliberately not validated here. They are opaque strings passed
    /// through verbatim; only the downstream engine can judge them.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.time.is_empty() {
            return Err(PlotrunError::Config {
                message: "Scheduler wall-clock limit must not be empty".to_string(),
            });
        }

        if self.scheduler.nodes == 0 {
            return Err(PlotrunError::Config {
                message: "Scheduler node count must be greater than 0".to_string(),
            });
        }

        if self.scheduler.ntasks_per_node == 0 {
            return Err(PlotrunError::Config {
                message: "Scheduler tasks-per-node must be greater than 0".to_string(),
            });
        }

        if self.scheduler.mem.is_empty() {
            return Err(PlotrunError::Config {
                message: "Scheduler memory request must not be empty".to_string(),
            });
        }

        if self.scheduler.job_name.is_empty() {
            return Err(PlotrunError::Config {
                message: "Scheduler job name must not be empty".to_string(),
            });
        }

        if self.pipeline.engine.is_empty() {
            return Err(PlotrunError::Config {
                message: "Workflow engine command must not be empty".to_string(),
            });
        }

        if self.pipeline.entrypoint.is_empty() {
            return Err(PlotrunError::Config {
                message: "Pipeline entrypoint must not be empty".to_string(),
            });
        }

        if regex::Regex::new(&self.tables.db_pattern).is_err() {
            return Err(PlotrunError::InvalidPattern {
                pattern: self.tables.db_pattern.clone(),
            });
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub study_file: Option<String>,
    pub outdir: Option<String>,
    pub profile: Option<String>,
    pub entrypoint: Option<String>,
    pub resume: Option<bool>,
    pub time: Option<String>,
    pub mem: Option<String>,
    pub job_name: Option<String>,
    pub db_pattern: Option<String>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_study_file(mut self, study_file: Option<String>) -> Self {
        self.study_file = study_file;
        self
    }

    pub fn with_outdir(mut self, outdir: Option<String>) -> Self {
        self.outdir = outdir;
        self
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_entrypoint(mut self, entrypoint: Option<String>) -> Self {
        self.entrypoint = entrypoint;
        self
    }

    pub fn with_resume(mut self, resume: Option<bool>) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_time(mut self, time: Option<String>) -> Self {
        self.time = time;
        self
    }

    pub fn with_mem(mut self, mem: Option<String>) -> Self {
        self.mem = mem;
        self
    }

    pub fn with_job_name(mut self, job_name: Option<String>) -> Self {
        self.job_name = job_name;
        self
    }

    pub fn with_db_pattern(mut self, db_pattern: Option<String>) -> Self {
        self.db_pattern = db_pattern;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduler.job_name, "plot_data");
        assert_eq!(config.scheduler.mem, "8G");
        assert_eq!(config.scheduler.nodes, 1);
        assert_eq!(config.pipeline.profile, "tartu_hpc");
        assert!(config.pipeline.resume);
        assert_eq!(config.modules.load.len(), 5);
        assert!(config.modules.load[0].contains("jdk"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.scheduler.nodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_paths_pass_validation() {
        // The two pipeline path parameters are opaque; empty values are
        // passed through to the engine untouched.
        let mut config = Config::default();
        config.pipeline.study_file.clear();
        config.pipeline.outdir.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_pattern_fails_validation() {
        let mut config = Config::default();
        config.tables.db_pattern = "QTS[".to_string();
        assert!(matches!(
            config.validate(),
            Err(PlotrunError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_config_file_operations() {
        let config = Config::default();
        let temp_file = NamedTempFile::new().unwrap();

        // Test saving
        config.save_to_file(temp_file.path()).unwrap();

        // Test loading
        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.scheduler.time, loaded_config.scheduler.time);
        assert_eq!(config.modules.load, loaded_config.modules.load);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_study_file(Some("input/other_study.tsv".to_string()))
            .with_resume(Some(false))
            .with_mem(Some("16G".to_string()));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.pipeline.study_file, "input/other_study.tsv");
        assert!(!config.pipeline.resume);
        assert_eq!(config.scheduler.mem, "16G");
        // Untouched fields keep their defaults
        assert_eq!(config.pipeline.profile, "tartu_hpc");
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(!sample.is_empty());
        assert!(sample.contains("[scheduler]"));
        assert!(sample.contains("[modules]"));
        assert!(sample.contains("[pipeline]"));
        assert!(sample.contains("[tables]"));
    }
}
