// passage/src/executor/mod.rs

mod context;
pub mod registry;
pub mod run;

pub use registry::ProcessExecutor;
pub use run::ProcessRun;
