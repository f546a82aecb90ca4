//! pip subprocess invocation

use pypip_deps::{Error, InstallEnvironment, InstallMode, InstallOutcome, InstallRequest, Installer, Result};
use std::io::{Read, Write};
use std::process::{Command, Stdio};

/// Runs `python -m pip`, or `hatch -e <env> run python -m pip` for a hatch environment
///
/// pip's output is echoed to the terminal as it arrives and also captured,
/// so a failure carries pip's error text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipInstaller;

impl PipInstaller {
    /// Create an installer
    pub fn new() -> Self {
        Self
    }

    /// `... -m pip` for the environment, without a pip subcommand
    pub fn pip_command(environment: &InstallEnvironment) -> Command {
        match &environment.hatch_env {
            Some(env) => {
                let mut cmd = Command::new("hatch");
                cmd.args(["-e", env.as_str(), "run", "python", "-m", "pip"]);
                cmd
            }
            None => {
                let mut cmd = Command::new(&environment.python);
                cmd.args(["-m", "pip"]);
                cmd
            }
        }
    }

    /// Full command for a request
    pub fn command(request: &InstallRequest) -> Command {
        let mut cmd = Self::pip_command(&request.environment);
        match request.mode {
            InstallMode::Install => {
                cmd.arg("install");
                if request.upgrade {
                    cmd.arg("--upgrade");
                }
                for spec in &request.specifiers {
                    if request.editable {
                        cmd.arg("-e");
                    }
                    cmd.arg(spec);
                }
            }
            InstallMode::Uninstall => {
                cmd.args(["uninstall", "-y"]).args(&request.specifiers);
            }
        }
        cmd
    }
}

fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Installer for PipInstaller {
    fn run(&self, request: &InstallRequest) -> Result<InstallOutcome> {
        let mut cmd = Self::command(request);
        let shown = describe(&cmd);
        tracing::info!(command = %shown, "running pip");

        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Installer(format!("{}: {}", shown, e)))?;

        let child_stderr = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || tee(child_stderr, std::io::stderr()));
        let stdout = tee(child.stdout.take(), std::io::stdout());
        let stderr = stderr_reader.join().unwrap_or_default();

        let status = child
            .wait()
            .map_err(|e| Error::Installer(format!("{}: {}", shown, e)))?;

        Ok(InstallOutcome {
            // Killed by a signal
            exit_code: status.code().unwrap_or(1),
            stdout,
            stderr,
        })
    }

    fn installed_version(&self, name: &str, environment: &InstallEnvironment) -> Result<Option<String>> {
        let mut cmd = Self::pip_command(environment);
        cmd.args(["show", name]);
        let shown = describe(&cmd);

        let output = cmd
            .output()
            .map_err(|e| Error::Installer(format!("{}: {}", shown, e)))?;
        if !output.status.success() {
            tracing::debug!(package = name, "pip show found nothing");
            return Ok(None);
        }

        Ok(parse_pip_show_version(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Copy everything from `source` to `sink` and return what was copied
fn tee<R: Read, W: Write>(source: Option<R>, mut sink: W) -> String {
    let Some(mut source) = source else {
        return String::new();
    };
    let mut captured = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                captured.extend_from_slice(&buf[..n]);
                // The terminal going away must not stop pip
                let _ = sink.write_all(&buf[..n]).and_then(|()| sink.flush());
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                tracing::debug!(error = %err, "stopped reading pip output");
                break;
            }
        }
    }
    String::from_utf8_lossy(&captured).into_owned()
}

/// Pull `Version:` out of `pip show` output
pub fn parse_pip_show_version(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Version:"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
