use super::{
    args, interpolate::interpolate, platform, shell::Script, Context, Shell,
};
use crate::{
    atomic::{is_supported_executor, AtomicTest, ExecutedCommand},
    errors::AtomicError,
    status::Status,
};
use std::{
    collections::BTreeMap,
    fmt,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

/// Phases of a run, executed in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prereq,
    Test,
    Cleanup,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Prereq, Stage::Test, Stage::Cleanup];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Prereq => "prereq",
            Stage::Test => "test",
            Stage::Cleanup => "cleanup",
        }
    }

    /// Stages to run: just `only` when set, otherwise all of them.
    pub fn plan(only: Option<Stage>) -> Vec<Stage> {
        match only {
            Some(stage) => vec![stage],
            None => Stage::ALL.to_vec(),
        }
    }
}

impl FromStr for Stage {
    type Err = AtomicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prereq" => Ok(Stage::Prereq),
            "test" => Ok(Stage::Test),
            "cleanup" => Ok(Stage::Cleanup),
            _ => Err(AtomicError::InvalidArguments(format!(
                "Unknown stage: {}. Must be one of prereq, test, cleanup.",
                s
            ))),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of running one test.
#[derive(Debug)]
pub struct Outcome {
    /// The test with its run state filled in. `None` when the run was
    /// rejected before the test stage could produce anything.
    pub test: Option<AtomicTest>,
    pub status: Status,
    /// Why the run failed. A failed test stage sets this alongside `test`.
    pub error: Option<AtomicError>,
}

impl Outcome {
    pub fn abort(err: AtomicError) -> Self {
        Self {
            test: None,
            status: err.status(),
            error: Some(err),
        }
    }
}

/// Run `test` through its stages.
///
/// Argument resolution, the platform gate, and executor validation happen
/// before any stage, so a rejected run never spawns a process. A failing
/// dependency aborts the run. A failing test still returns the populated
/// test. Cleanup failures are logged and don't change the status.
pub async fn execute(mut test: AtomicTest, ctx: &Context<'_>) -> Outcome {
    ctx.printer.plan(ctx.spec, &test);

    let args = match args::resolve(&test.input_arguments, &ctx.spec.inputs, &ctx.printer) {
        Ok(args) => args,
        Err(err) => return Outcome::abort(err),
    };
    test.args_used = args.clone();

    if let Err(err) = platform::check(&test, ctx.host, &ctx.printer) {
        return Outcome::abort(err);
    }

    let stages = Stage::plan(ctx.spec.stage);
    let test_shell = if stages.contains(&Stage::Test) {
        match test_shell(&test) {
            Ok(shell) => Some(shell),
            Err(err) => return Outcome::abort(err),
        }
    } else {
        None
    };

    let runner = Runner {
        ctx,
        args: &args,
        base: test.base_dir.to_string_lossy().into_owned(),
    };

    let mut status = Status::Unknown;
    let mut failure = None;
    for stage in stages {
        match stage {
            Stage::Prereq => {
                if let Err(err) = runner.prereqs(&test).await {
                    return Outcome::abort(err);
                }
            }
            Stage::Test => {
                if let Some(shell) = test_shell {
                    failure = runner.test(&mut test, shell).await;
                    status = if failure.is_some() {
                        Status::TestFail
                    } else {
                        Status::TestSuccess
                    };
                }
            }
            Stage::Cleanup => runner.cleanup(&mut test).await,
        }
    }

    test.status = status;
    Outcome {
        test: Some(test),
        status,
        error: failure,
    }
}

fn test_shell(test: &AtomicTest) -> Result<Shell, AtomicError> {
    let executor = test
        .executor
        .as_ref()
        .ok_or_else(|| AtomicError::InvalidArguments("test has no executor".to_string()))?;
    Shell::from_name(&executor.name)
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

struct Runner<'a, 'c> {
    ctx: &'a Context<'c>,
    args: &'a BTreeMap<String, String>,
    /// Atomics root substituted for the folder token.
    base: String,
}

impl Runner<'_, '_> {
    fn interpolate(&self, template: &str, stage: Stage) -> String {
        let printer = self.ctx.printer.with_quiet(stage != Stage::Test);
        interpolate(template, &self.base, self.args, &printer)
    }

    /// Shell for an executor name. Unnamed executors fall back to `sh`.
    fn shell_for(&self, name: &str, label: &str) -> Result<Shell, AtomicError> {
        if name.is_empty() {
            self.ctx
                .printer
                .line(format!("no {} executor specified. using sh", label));
            return Ok(Shell::Sh);
        }
        Shell::from_name(name)
    }

    async fn run_step(
        &self,
        stage: Stage,
        label: &str,
        shell: Shell,
        command: &str,
    ) -> Result<String, AtomicError> {
        let printer = self.ctx.printer.with_quiet(stage == Stage::Prereq);
        if command.is_empty() {
            printer.line(format!("Test does not have {} stage defined", label));
            return Ok(String::new());
        }

        let script = Script {
            shell,
            command,
            path: self.ctx.scratch_dir.join(format!(
                "atomic-{}-{}.{}",
                self.ctx.spec.technique,
                label,
                shell.program()
            )),
            deadline: self.ctx.deadlines.for_stage(stage),
            env: &self.ctx.spec.env,
        };

        printer.line(format!("\nExecuting executor={} command=[{}]", shell, command));
        match script.run().await {
            Ok(output) => {
                printer.ok(format!("{} succeeded!", label));
                Ok(output)
            }
            Err(err) => {
                printer.fail(format!("{} failed: {}", label, err));
                Err(err)
            }
        }
    }

    /// Check each dependency in order, remediating the ones that fail. Stops
    /// at the first dependency that can't be satisfied.
    async fn prereqs(&self, test: &AtomicTest) -> Result<(), AtomicError> {
        if test.dependencies.is_empty() {
            return Ok(());
        }

        // The schema check is made against the test executor's name.
        let executor_name = test.executor.as_ref().map_or("", |e| e.name.as_str());
        if !is_supported_executor(executor_name) {
            return Err(AtomicError::UnsupportedExecutor(executor_name.to_string()));
        }
        let shell = self.shell_for(&test.dependency_executor_name, "dependency")?;

        let printer = &self.ctx.printer;
        printer.line("\nChecking dependencies...");
        for (idx, dep) in test.dependencies.iter().enumerate() {
            printer.line(format!("  - {}", dep.description));

            let check = self.interpolate(&dep.prereq_command, Stage::Prereq);
            let checked = self
                .run_step(Stage::Prereq, &format!("checkPrereq{}", idx), shell, &check)
                .await;
            if checked.is_ok() {
                printer.ok("dependency check succeeded!");
                continue;
            }

            let remedy = self.interpolate(&dep.get_prereq_command, Stage::Prereq);
            if let Err(err) = self
                .run_step(Stage::Prereq, &format!("getPrereq{}", idx), shell, &remedy)
                .await
            {
                let details = err
                    .output()
                    .map(str::trim)
                    .filter(|out| !out.is_empty())
                    .unwrap_or("no details provided");
                printer.fail(format!("dependency check failed: {}", details));
                return Err(AtomicError::PreReqCheckFailed(format!(
                    "{}: {}",
                    dep.description, err
                )));
            }
            printer.ok("dependency satisfied by get_prereq_command");
        }
        Ok(())
    }

    /// Run the test command and record what happened on `test`.
    async fn test(&self, test: &mut AtomicTest, shell: Shell) -> Option<AtomicError> {
        let template = test
            .executor
            .as_ref()
            .map(|e| e.command.clone())
            .unwrap_or_default();
        let command = self.interpolate(&template, Stage::Test);

        test.start_time = now_nanos();
        let result = self.run_step(Stage::Test, "test", shell, &command).await;
        test.end_time = now_nanos();

        let (output, error) = match result {
            Ok(output) => (output, None),
            Err(err) => (err.output().unwrap_or_default().to_string(), Some(err)),
        };

        let printer = &self.ctx.printer;
        if error.is_some() {
            printer.banner("EXECUTOR FAILED");
        } else {
            printer.banner("EXECUTOR RESULTS");
        }
        if !output.is_empty() {
            printer.line(&output);
            printer.line("******************************");
        }

        for (name, arg) in test.input_arguments.iter_mut() {
            if let Some(value) = self.args.get(name) {
                arg.expected_value = value.clone();
            }
        }
        if let Some(executor) = test.executor.as_mut() {
            executor.executed_command = Some(ExecutedCommand {
                command,
                output,
                error: error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            });
        }

        error
    }

    /// Best effort: failures are reported, never raised.
    async fn cleanup(&self, test: &mut AtomicTest) {
        let (name, template) = match &test.executor {
            Some(e) if !e.cleanup_command.trim().is_empty() => {
                (e.name.clone(), e.cleanup_command.clone())
            }
            _ => {
                self.ctx.printer.line("Test does not have cleanup stage defined");
                return;
            }
        };

        let command = self.interpolate(&template, Stage::Cleanup);
        let result = match self.shell_for(&name, "cleanup") {
            Ok(shell) => self.run_step(Stage::Cleanup, "cleanup", shell, &command).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(_) => test.is_cleaned_up = true,
            Err(err) => {
                tracing::warn!(test = %test.name, %err, "cleanup command failed");
                self.ctx
                    .printer
                    .line(format!("WARNING. Cleanup command failed: {}", err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_round_trip() {
        for stage in Stage::ALL.iter() {
            assert_eq!(stage.name().parse::<Stage>().unwrap(), *stage);
        }
        assert!(matches!(
            "deploy".parse::<Stage>(),
            Err(AtomicError::InvalidArguments(_))
        ));
    }

    #[test]
    fn plan_runs_everything_in_order_unless_restricted() {
        assert_eq!(
            Stage::plan(None),
            vec![Stage::Prereq, Stage::Test, Stage::Cleanup]
        );
        assert_eq!(Stage::plan(Some(Stage::Cleanup)), vec![Stage::Cleanup]);
    }

    #[test]
    fn missing_executor_is_invalid() {
        let test = AtomicTest::default();
        assert!(matches!(
            test_shell(&test),
            Err(AtomicError::InvalidArguments(_))
        ));
    }
}
