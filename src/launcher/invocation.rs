use crate::config::PipelineConfig;

/// The two workflow-engine calls of a launch: the diagnostic `info` command
/// and the `run` command with its bound parameters.
///
/// Parameter values are carried verbatim. No normalization, quoting, or
/// validation is applied; malformed paths are the engine's to detect. Empty
/// values are still emitted, matching the original fire-and-forget script.
#[derive(Debug, Clone)]
pub struct EngineInvocation {
    engine: String,
    entrypoint: String,
    profile: String,
    resume: bool,
    study_file: String,
    outdir: String,
}

impl EngineInvocation {
    pub fn from_pipeline(pipeline: &PipelineConfig) -> Self {
        Self {
            engine: pipeline.engine.clone(),
            entrypoint: pipeline.entrypoint.clone(),
            profile: pipeline.profile.clone(),
            resume: pipeline.resume,
            study_file: pipeline.study_file.clone(),
            outdir: pipeline.outdir.clone(),
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn info_args(&self) -> Vec<String> {
        vec!["info".to_string()]
    }

    pub fn run_args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string(), self.entrypoint.clone()];
        args.push("-profile".to_string());
        args.push(self.profile.clone());
        if self.resume {
            args.push("-resume".to_string());
        }
        args.push("--studyFile".to_string());
        args.push(self.study_file.clone());
        args.push("--outdir".to_string());
        args.push(self.outdir.clone());
        args
    }

    pub fn info_command_line(&self) -> String {
        format!("{} {}", self.engine, self.info_args().join(" "))
    }

    pub fn run_command_line(&self) -> String {
        format!("{} {}", self.engine, self.run_args().join(" "))
    }
}
