pub mod batch;
pub mod invocation;
pub mod runner;

pub use batch::BatchScript;
pub use invocation::EngineInvocation;
pub use runner::{run_local, submit, LaunchOutcome};
