// sh! command execution

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use derive_builder::Builder;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Clone, Debug)]
pub enum StreamMode {
    Inherit,
    Pipe,
}

impl StreamMode {
    fn stdio(&self) -> Stdio {
        match self {
            StreamMode::Inherit => Stdio::inherit(),
            StreamMode::Pipe => Stdio::piped(),
        }
    }
}

#[derive(Clone, Debug, Builder)]
#[builder(default)]
pub struct ShOptions {
    pub stdout: StreamMode,
    pub stderr: StreamMode,
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for the child.
    #[builder(setter(each(name = "env")))]
    pub envs: Vec<(String, String)>,
    /// Treat a non-zero exit as a result rather than an error.
    pub allow_failure: bool,
}

impl Default for ShOptions {
    fn default() -> Self {
        Self {
            stdout: StreamMode::Inherit,
            stderr: StreamMode::Inherit,
            cwd: None,
            envs: Vec::new(),
            allow_failure: false,
        }
    }
}

impl ShOptions {
    /// Apply these options to `cmd` before it is spawned.
    fn apply(&self, cmd: &mut Command) {
        cmd.stdout(self.stdout.stdio());
        cmd.stderr(self.stderr.stdio());

        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        cmd.envs(self.envs.iter().map(|(k, v)| (k, v)));
    }
}

#[derive(Debug)]
pub struct ShOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ShOutput {
    /// Exit code, or -1 when the child was killed by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

#[macro_export]
macro_rules! sh {
    // Single command with explicit options
    (options($opts:expr), $cmd:expr $(,)?) => {{ $crate::sh::sh($cmd, $opts) }};

    // Single command with default options
    ($cmd:expr $(,)?) => {{ $crate::sh::sh($cmd, $crate::sh::ShOptions::default()) }};
}

pub fn sh<S>(cmd: S, opts: ShOptions) -> Result<ShOutput>
where
    S: AsRef<str>,
{
    let cmd = cmd.as_ref();
    log::debug!("[sh] {}", cmd);

    let mut command = Command::new("sh");
    command.arg("-c").arg(cmd);
    opts.apply(&mut command);

    let output = command.output()?;
    let out = ShOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !out.status.success() && !opts.allow_failure {
        return Err(format!(
            "Command failed: {}\nExit code: {}\n{}",
            cmd,
            out.code(),
            out.stderr,
        )
        .into());
    }

    Ok(out)
}
