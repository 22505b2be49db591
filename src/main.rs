use atomic_runner::{
    cli::Opts,
    config::RunSpec,
    errors::AtomicError,
    executor::{self, Context, ScratchDir},
    logging,
    picker::yaml,
    printer::Printer,
    privilege,
    report::{self, ResultsFormat},
    status::Status,
};
use structopt::StructOpt;
use tokio::runtime;

fn run(opts: Opts) -> Result<Status, AtomicError> {
    let format: ResultsFormat = opts.results_format.parse()?;
    let spec = RunSpec::from_opts(&opts)?;
    let printer = Printer::new(opts.quiet);

    printer.line(format!(
        "\nGetting Atomic Tests technique {} from {}",
        spec.technique,
        spec.atomics_dir.display()
    ));
    let technique = yaml::load_technique(&spec.atomics_dir, &spec.technique)?;
    let mut test = yaml::select_test(technique, &spec.test_name, spec.test_index, &printer)?;

    // Dropped at the end of this function, before the process exits.
    let scratch = ScratchDir::create(spec.temp_dir.as_deref())?;
    test.temp_dir = scratch.path().to_path_buf();

    if let Some(dir) = &spec.results_dir {
        std::fs::create_dir_all(dir).map_err(|err| {
            AtomicError::RunnerFailure(format!(
                "Error making results dir {}: {}",
                dir.display(),
                err
            ))
        })?;
    }

    privilege::manage(&test, &spec.username);

    let ctx = Context::new(&spec, scratch.path(), printer);
    let runtime = runtime::Builder::new_current_thread().enable_all().build()?;
    let outcome = runtime.block_on(executor::execute(test, &ctx));

    if let Some(err) = &outcome.error {
        println!("error occurred: {}", err);
    }
    if let Some(test) = &outcome.test {
        report::write(test, format, spec.results_dir.as_deref())?;
    }
    printer.line("done");
    Ok(outcome.status)
}

fn main() {
    let opts = Opts::from_args();
    if let Err(err) = logging::init(opts.verbose) {
        eprintln!("warning: {}", err);
    }

    std::process::exit(match run(opts) {
        Err(err) => {
            println!("error: {}", err);
            err.status().code()
        }
        Ok(status) => status.code(),
    })
}
