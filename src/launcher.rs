use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use which::which;

/// The package manager executable for the host platform.
pub fn package_manager_program() -> &'static str {
    if cfg!(windows) { "npm.cmd" } else { "npm" }
}

/// Scripts run from the directory holding their manifest, not the search root.
pub fn working_dir_for(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub script: String,
    pub working_dir: PathBuf,
}

impl LaunchRequest {
    pub fn for_manifest(manifest_path: &Path, script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            working_dir: working_dir_for(manifest_path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(Option<i32>),
}

impl Termination {
    fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Termination::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            Termination::Signaled(status.signal())
        }
        #[cfg(not(unix))]
        {
            Termination::Signaled(None)
        }
    }

    /// Exit code to hand back to our own caller, following shell conventions for signals.
    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Exited(code) => *code,
            Termination::Signaled(Some(signal)) => 128 + signal,
            Termination::Signaled(None) => 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("package manager '{program}' was not found on PATH")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },
    #[error("failed to start '{program} run {script}' in {}", working_dir.display())]
    Spawn {
        program: String,
        script: String,
        working_dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::NotFound { .. } => 127,
            LaunchError::Spawn { .. } => 126,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptLauncher {
    program: OsString,
}

impl ScriptLauncher {
    pub fn for_host() -> Self {
        Self::with_program(package_manager_program())
    }

    pub fn with_program(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
        }
    }

    /// Runs `<program> run <script>` with the terminal's stdio and blocks until it exits.
    pub fn launch(&self, request: &LaunchRequest) -> Result<Termination, LaunchError> {
        let program = self.program.to_string_lossy().into_owned();
        let resolved = which(&self.program).map_err(|source| LaunchError::NotFound {
            program: program.clone(),
            source,
        })?;

        println!("Executing \"{}\" script...", request.script);
        tracing::info!(
            program = %resolved.display(),
            script = %request.script,
            cwd = %request.working_dir.display(),
            "spawning package manager"
        );

        let status = Command::new(&resolved)
            .arg("run")
            .arg(&request.script)
            .current_dir(&request.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| LaunchError::Spawn {
                program,
                script: request.script.clone(),
                working_dir: request.working_dir.clone(),
                source,
            })?;

        let termination = Termination::from_status(status);
        match termination {
            Termination::Exited(code) => println!("Process finished with exit code: {code}"),
            Termination::Signaled(Some(signal)) => {
                println!("Process terminated by signal: {signal}");
            }
            Termination::Signaled(None) => println!("Process terminated without an exit code"),
        }
        Ok(termination)
    }
}

#[cfg(test)]
mod tests {
    use super::{LaunchError, LaunchRequest, ScriptLauncher, Termination, working_dir_for};
    use std::path::{Path, PathBuf};

    #[test]
    fn working_dir_is_manifest_parent() {
        assert_eq!(
            working_dir_for(Path::new("a/b/package.json")),
            PathBuf::from("a/b")
        );
        assert_eq!(working_dir_for(Path::new("package.json")), PathBuf::from("."));
    }

    #[test]
    fn signal_exit_codes_follow_shell_convention() {
        assert_eq!(Termination::Exited(3).exit_code(), 3);
        assert_eq!(Termination::Signaled(Some(2)).exit_code(), 130);
        assert_eq!(Termination::Signaled(None).exit_code(), 1);
    }

    #[test]
    fn missing_program_is_reported_as_not_found() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let launcher = ScriptLauncher::with_program("pkgrun-definitely-not-installed");
        let request = LaunchRequest::for_manifest(&dir.path().join("package.json"), "build");

        let err = launcher.launch(&request).expect_err("spawn should fail");
        assert!(matches!(err, LaunchError::NotFound { .. }));
        assert_eq!(err.exit_code(), 127);
    }

    #[cfg(unix)]
    #[test]
    fn missing_working_dir_is_a_spawn_failure() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let launcher = ScriptLauncher::with_program("sh");
        let request = LaunchRequest::for_manifest(&dir.path().join("gone/package.json"), "build");

        let err = launcher.launch(&request).expect_err("spawn should fail");
        assert!(matches!(err, LaunchError::Spawn { .. }));
        assert_eq!(err.exit_code(), 126);
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_manifest_directory_and_reports_exit_code() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let project = dir.path().join("a/b");
        std::fs::create_dir_all(&project).unwrap();
        // `sh run test` executes ./run with "test" as $1.
        std::fs::write(
            project.join("run"),
            "[ \"$1\" = test ] || exit 99\n[ -f package.json ] || exit 98\nexit 3\n",
        )
        .unwrap();
        std::fs::write(project.join("package.json"), "{}").unwrap();

        let launcher = ScriptLauncher::with_program("sh");
        let request = LaunchRequest::for_manifest(&project.join("package.json"), "test");
        let termination = launcher.launch(&request).expect("child should start");

        assert_eq!(termination, Termination::Exited(3));
        assert_eq!(termination.exit_code(), 3);
    }
}
