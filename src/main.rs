use clap::Parser;
use plotrun::cli::LaunchArgs;
use plotrun::{
    Cli, Command, LaunchMode, LaunchOutcome, OutputFormatter, OutputMode, Plotrun, PlotrunError,
    UserFriendlyError,
};
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle special commands first
    if matches!(cli.command, Command::GenerateConfig) {
        return handle_generate_config(&cli);
    }

    // Create Plotrun instance
    let plotrun = match Plotrun::from_cli(&cli) {
        Ok(plotrun) => plotrun,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    let result = match &cli.command {
        Command::Launch(args) => {
            if args.dry_run {
                return handle_dry_run(&plotrun);
            }
            return handle_launch(&plotrun, args);
        }
        Command::ListDbs(args) => plotrun
            .list_dbs(&args.input_dir, &args.output_list)
            .map(|_| ()),
        Command::MergeDbs(args) => plotrun
            .merge_dbs(&args.input_list, &args.output_sqlite)
            .map(|_| ()),
        Command::ExtractDups(args) => plotrun
            .extract_dups(&args.input_list, &args.output_dir)
            .map(|_| ()),
        Command::GenerateConfig => unreachable!("handled above"),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            plotrun.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn handle_launch(plotrun: &Plotrun, args: &LaunchArgs) -> i32 {
    let mode = if args.submit {
        LaunchMode::Submit
    } else if let Some(ref path) = args.script {
        LaunchMode::Script(path.clone())
    } else {
        LaunchMode::Local
    };

    match plotrun.launch(mode) {
        Ok(LaunchOutcome::Completed { status }) => {
            if status == 0 {
                plotrun
                    .output_formatter()
                    .success("Pipeline run completed");
                0
            } else {
                // The engine's exit status becomes the launcher's own.
                plotrun
                    .handle_error(&PlotrunError::EngineFailed { status });
                status
            }
        }
        Ok(_) => 0,
        Err(e) => {
            plotrun.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn handle_dry_run(plotrun: &Plotrun) -> i32 {
    let formatter = plotrun.output_formatter();
    let batch = plotrun.batch_script();

    formatter.info("DRY RUN MODE - Nothing will be executed");
    formatter.print_separator();

    formatter.info("Scheduler directives:");
    for line in batch.directive_lines() {
        println!("  {}", line);
    }

    formatter.info("Environment modules (in activation order):");
    for line in batch.module_lines() {
        println!("  {}", line);
    }

    formatter.info("Engine invocations:");
    println!("  {}", batch.invocation().info_command_line());
    println!("  {}", batch.invocation().run_command_line());

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to execute, or with --submit to hand the job to sbatch");

    0
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "plotrun.toml".to_string());

    match Plotrun::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  plotrun launch --config {}", config_path);
            println!("\nEdit the file to customize scheduler resources, modules, and pipeline parameters.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &PlotrunError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

// Map error types to appropriate exit codes
fn exit_code_for(error: &PlotrunError) -> i32 {
    match error {
        PlotrunError::Cancelled => 130, // Interrupted (SIGINT)
        PlotrunError::Config { .. } | PlotrunError::InvalidPattern { .. } => 2,
        PlotrunError::CommandNotFound { .. } => 3,
        PlotrunError::SubmitFailed { .. } => 4,
        PlotrunError::InvalidListEntry { .. }
        | PlotrunError::EmptyList { .. }
        | PlotrunError::InvalidInputDir { .. } => 5,
        PlotrunError::Sqlite(_) => 6,
        PlotrunError::EngineFailed { status } => *status,
        _ => 1, // General error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code_for(&PlotrunError::Cancelled), 130);
        assert_eq!(
            exit_code_for(&PlotrunError::Config {
                message: "bad".to_string()
            }),
            2
        );
        assert_eq!(
            exit_code_for(&PlotrunError::CommandNotFound {
                program: "sbatch".to_string()
            }),
            3
        );
        assert_eq!(
            exit_code_for(&PlotrunError::EmptyList {
                path: "paths.txt".to_string()
            }),
            5
        );
    }

    #[test]
    fn test_engine_status_propagates_verbatim() {
        assert_eq!(exit_code_for(&PlotrunError::EngineFailed { status: 17 }), 17);
        assert_eq!(
            exit_code_for(&PlotrunError::EngineFailed { status: 137 }),
            137
        );
    }
}
