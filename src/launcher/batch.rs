use crate::config::{Config, ModulesConfig, SchedulerConfig};
use crate::launcher::invocation::EngineInvocation;
use std::fmt::Write as _;

/// Renders the batch job as a bash script: scheduler directives, module
/// activations, the engine diagnostic call, and the engine run.
///
/// Module activation is scoped to the generated script rather than mutating
/// the launcher's own environment, so the job's full effect set is visible
/// in one reviewable artifact.
#[derive(Debug, Clone)]
pub struct BatchScript {
    scheduler: SchedulerConfig,
    modules: ModulesConfig,
    invocation: EngineInvocation,
}

impl BatchScript {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scheduler: config.scheduler.clone(),
            modules: config.modules.clone(),
            invocation: EngineInvocation::from_pipeline(&config.pipeline),
        }
    }

    pub fn invocation(&self) -> &EngineInvocation {
        &self.invocation
    }

    pub fn directive_lines(&self) -> Vec<String> {
        vec![
            format!("#SBATCH --time={}", self.scheduler.time),
            format!("#SBATCH -N {}", self.scheduler.nodes),
            format!("#SBATCH --ntasks-per-node={}", self.scheduler.ntasks_per_node),
            format!("#SBATCH --mem={}", self.scheduler.mem),
            format!("#SBATCH --job-name={}", self.scheduler.job_name),
        ]
    }

    pub fn module_lines(&self) -> Vec<String> {
        self.modules
            .load
            .iter()
            .map(|module| format!("module load {}", module))
            .collect()
    }

    pub fn render(&self) -> String {
        let mut script = String::from("#!/bin/bash\n");
        for line in self.directive_lines() {
            let _ = writeln!(script, "{}", line);
        }
        script.push('\n');
        for line in self.module_lines() {
            let _ = writeln!(script, "{}", line);
        }
        script.push('\n');
        let _ = writeln!(script, "{}", self.invocation.info_command_line());
        let _ = writeln!(script, "{}", self.invocation.run_command_line());
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_render_structure() {
        let script = BatchScript::from_config(&Config::default()).render();

        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#SBATCH --time=48:00:00"));
        assert!(script.contains("#SBATCH -N 1"));
        assert!(script.contains("#SBATCH --ntasks-per-node=1"));
        assert!(script.contains("#SBATCH --mem=8G"));
        assert!(script.contains("#SBATCH --job-name=plot_data"));
        assert!(script.contains("nextflow info\n"));
        assert!(script.contains("nextflow run main.nf -profile tartu_hpc -resume"));
    }

    #[test]
    fn test_module_order_preserved() {
        let config = Config::default();
        let script = BatchScript::from_config(&config).render();

        let mut last = 0;
        for module in &config.modules.load {
            let line = format!("module load {}", module);
            let pos = script.find(&line).unwrap_or_else(|| {
                panic!("missing module line: {}", line);
            });
            assert!(pos > last, "module activations out of order at {}", line);
            last = pos;
        }
    }

    #[test]
    fn test_info_precedes_run() {
        let script = BatchScript::from_config(&Config::default()).render();
        let info_pos = script.find("nextflow info").unwrap();
        let run_pos = script.find("nextflow run").unwrap();
        assert!(info_pos < run_pos);
    }

    #[test]
    fn test_directives_precede_modules() {
        let script = BatchScript::from_config(&Config::default()).render();
        let directive_pos = script.find("#SBATCH").unwrap();
        let module_pos = script.find("module load").unwrap();
        assert!(directive_pos < module_pos);
    }

    #[test]
    fn test_run_line_keeps_paths_verbatim() {
        let mut config = Config::default();
        config.pipeline.study_file = "input/GTEx_V10_all/GTEx_V10_inputs_tx_all.tsv".to_string();
        let script = BatchScript::from_config(&config).render();
        assert!(script.contains("--studyFile input/GTEx_V10_all/GTEx_V10_inputs_tx_all.tsv"));
    }
}
