use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "plotrun")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Launch the coverage-plot pipeline and maintain plot-table databases")]
#[command(
    long_about = "Plotrun assembles a SLURM batch job for the coverage-plot Nextflow \
                       pipeline (resource directives, environment modules, engine invocation) \
                       and provides maintenance tools for the QTS plot-table SQLite files \
                       the pipeline produces."
)]
#[command(after_help = "EXAMPLES:\n  \
    plotrun launch --dry-run\n  \
    plotrun launch --submit --study-file input/GTEx_V10_all/GTEx_V10_inputs_tx_all.tsv\n  \
    plotrun list-dbs --input-dir /gpfs/helios/projects/eQTLCatalogue/coverage_plots --output-list qts_paths.txt\n  \
    plotrun merge-dbs --input-list qts_paths.txt --output-sqlite merged.sqlite\n  \
    plotrun extract-dups --input-list qts_paths.txt --output-dir duplicates/")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble the batch job and run, submit, or print it
    Launch(LaunchArgs),

    /// Recursively list plot-table SQLite files and write their paths to a list file
    ListDbs(ListDbsArgs),

    /// Merge listed SQLite databases into one deduplicated database
    MergeDbs(MergeDbsArgs),

    /// Extract duplicated payload rows from each listed database
    ExtractDups(ExtractDupsArgs),

    /// Generate a sample configuration file
    GenerateConfig,
}

#[derive(Args, Debug)]
pub struct LaunchArgs {
    /// Study input file passed to the pipeline (--studyFile)
    #[arg(long)]
    pub study_file: Option<String>,

    /// Output directory passed to the pipeline (--outdir)
    #[arg(long)]
    pub outdir: Option<String>,

    /// Deployment profile recognized by the engine
    #[arg(long)]
    pub profile: Option<String>,

    /// Pipeline entrypoint file
    #[arg(long)]
    pub entrypoint: Option<String>,

    /// Restart from scratch instead of resuming cached pipeline state
    #[arg(long)]
    pub no_resume: bool,

    /// Scheduler wall-clock limit (e.g. 48:00:00)
    #[arg(long)]
    pub time: Option<String>,

    /// Scheduler memory request (e.g. 8G)
    #[arg(long)]
    pub mem: Option<String>,

    /// Scheduler job name
    #[arg(long)]
    pub job_name: Option<String>,

    /// Show the launch plan without executing anything
    #[arg(long, help = "Show what would be run without executing it")]
    pub dry_run: bool,

    /// Write the batch script to a file instead of executing it
    #[arg(long, value_name = "PATH", conflicts_with = "dry_run")]
    pub script: Option<PathBuf>,

    /// Submit the batch script via sbatch instead of running it locally
    #[arg(long, conflicts_with_all = ["dry_run", "script"])]
    pub submit: bool,
}

#[derive(Args, Debug)]
pub struct ListDbsArgs {
    /// Directory to recursively scan for plot-table SQLite files
    #[arg(long)]
    pub input_dir: PathBuf,

    /// Output text file (one absolute SQLite path per line)
    #[arg(long)]
    pub output_list: PathBuf,

    /// Filename pattern to match (regular expression)
    #[arg(long)]
    pub pattern: Option<String>,
}

#[derive(Args, Debug)]
pub struct MergeDbsArgs {
    /// Text file with one absolute SQLite path per line
    #[arg(long)]
    pub input_list: PathBuf,

    /// Path to the merged output SQLite file
    #[arg(long)]
    pub output_sqlite: PathBuf,
}

#[derive(Args, Debug)]
pub struct ExtractDupsArgs {
    /// Text file with one absolute SQLite path per line
    #[arg(long)]
    pub input_list: PathBuf,

    /// Directory where per-input duplicate SQLite files are written
    #[arg(long)]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        match &self.command {
            Command::Launch(args) => CliOverrides::new()
                .with_study_file(args.study_file.clone())
                .with_outdir(args.outdir.clone())
                .with_profile(args.profile.clone())
                .with_entrypoint(args.entrypoint.clone())
                .with_resume(if args.no_resume { Some(false) } else { None })
                .with_time(args.time.clone())
                .with_mem(args.mem.clone())
                .with_job_name(args.job_name.clone()),
            Command::ListDbs(args) => CliOverrides::new().with_db_pattern(args.pattern.clone()),
            _ => CliOverrides::new(),
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
