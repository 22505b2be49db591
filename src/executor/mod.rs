//! An executor is responsible for running one atomic test through its
//! stages and recording the results on it.

pub mod args;
mod context;
pub mod interpolate;
pub mod platform;
mod scratch;
mod shell;
mod stage;

pub use context::{Context, Deadlines};
pub use platform::Platform;
pub use scratch::ScratchDir;
pub use shell::{Script, Shell};
pub use stage::{execute, Outcome, Stage};
