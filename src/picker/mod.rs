//! Pickers locate test definitions and select the test to run.

pub mod yaml;
