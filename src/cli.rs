use std::path::PathBuf;
use structopt::StructOpt;

/// Options for the CLI.
#[derive(StructOpt, Debug, Default)]
#[structopt(
    name = "atomic-runner",
    about = "Run a single atomic test and record the results."
)]
pub struct Opts {
    /// Technique ID.
    #[structopt(short = "t", long)]
    pub technique: Option<String>,

    /// Test name.
    #[structopt(short = "n", long)]
    pub name: Option<String>,

    /// 0-based test index. Takes precedence over the name when in range.
    #[structopt(short = "i", long)]
    pub index: Option<usize>,

    /// Run a single stage: prereq, test, or cleanup.
    #[structopt(long)]
    pub stage: Option<String>,

    /// Path to the atomics folder.
    #[structopt(long = "atomicsdir", parse(from_os_str))]
    pub atomics_dir: Option<PathBuf>,

    /// Working folder for the test. A fresh temp dir is used if not set.
    /// Removed when the run ends.
    #[structopt(long = "tempdir", parse(from_os_str))]
    pub temp_dir: Option<PathBuf>,

    /// Path to a RunSpec config (JSON, or TOML with a .toml extension).
    /// Use - for JSON on stdin. Overrides the other test selection flags.
    #[structopt(long, parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Output summary format: json or yaml.
    #[structopt(long = "resultsformat", default_value = "json")]
    pub results_format: String,

    /// Directory to save run_summary.<format> in. Printed to stdout if not set.
    #[structopt(long = "resultsdir", parse(from_os_str))]
    pub results_dir: Option<PathBuf>,

    /// User to run as when started as root.
    #[structopt(short = "u", long)]
    pub username: Option<String>,

    /// Input argument override, as name=value. Repeatable.
    #[structopt(long = "input", number_of_values = 1)]
    pub inputs: Vec<String>,

    /// Extra environment variable for the test scripts, as NAME=value.
    /// Repeatable.
    #[structopt(long = "env", number_of_values = 1)]
    pub env: Vec<String>,

    /// Only report errors.
    #[structopt(short, long)]
    pub quiet: bool,

    /// Debug logging on stderr.
    #[structopt(short, long)]
    pub verbose: bool,
}
