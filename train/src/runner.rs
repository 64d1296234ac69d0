//! Invocations of the external YOLO command line program.

use crate::common::*;

/// One call of the external program, e.g. `yolo detect train key=value ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
        }
    }

    /// Append a bare argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a `key=value` argument.
    pub fn kv(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.args.push(format!("{}={}", key, value));
        self
    }

    /// Append a `key=True` or `key=False` argument.
    pub fn flag(self, key: &str, value: bool) -> Self {
        self.kv(key, if value { "True" } else { "False" })
    }

    /// Look up the value of a `key=value` argument.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| {
            let (k, v) = arg.split_once('=')?;
            (k == key).then(|| v)
        })
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes invocations of the external program.
pub trait Runner {
    fn run(&mut self, invocation: &Invocation) -> Result<()>;
}

/// Spawns the external program and waits for it.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        info!("running '{}'", invocation);
        let status = invocation
            .to_command()
            .status()
            .with_context(|| format!("failed to launch '{}'", invocation.program.display()))?;
        ensure!(
            status.success(),
            "'{}' exited with {}",
            invocation.program.display(),
            status
        );
        Ok(())
    }
}
