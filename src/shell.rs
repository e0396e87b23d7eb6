//! External tool execution and dry-run-aware filesystem operations.
//!
//! Every mutating step of a conversion pipeline funnels through [`Shell`] so
//! that `--dry-run` can replace it with a log-only no-op and `--verbose`
//! controls whether child process output is streamed or discarded.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::info;

use crate::error::{Error, Result};

/// Search the system `PATH` for an executable.
///
/// Returns the full path name, or `None` if not found. Names that already
/// contain a directory component are checked directly without a `PATH`
/// search.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|p| is_executable(p))
        .map(|p| fs::canonicalize(&p).unwrap_or(p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Runs external tools and performs filesystem bookkeeping for a pipeline.
#[derive(Clone, Copy, Debug)]
pub struct Shell {
    pub dry_run: bool,
    pub verbose: bool,
}

impl Shell {
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Shell { dry_run, verbose }
    }

    /// Execute `program` with an argument vector, blocking until it exits.
    ///
    /// The program is located on `PATH` first; a missing executable is a
    /// distinct error (exit code 127). A non-zero exit status aborts the
    /// run. When `cwd` is given the child runs with that working directory;
    /// the parent process working directory is never changed.
    pub fn run(&self, program: &str, args: &[String], cwd: Option<&Path>) -> Result<()> {
        info!("executing: {}", render_command(program, args));
        if self.dry_run {
            return Ok(());
        }
        let exe = self.locate(program)?;
        let mut command = Command::new(exe);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        if !self.verbose {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }
        let status = command.status()?;
        if !status.success() {
            return Err(Error::ToolFailed {
                command: render_command(program, args),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }

    /// Like [`run`](Shell::run), but the child's stdout is captured to
    /// `out_file` (replaces `tool ... > file` shell redirections).
    pub fn run_to_file(&self, program: &str, args: &[String], out_file: &Path) -> Result<()> {
        info!(
            "executing: {} > {}",
            render_command(program, args),
            out_file.display()
        );
        if self.dry_run {
            return Ok(());
        }
        let exe = self.locate(program)?;
        let out = fs::File::create(out_file)?;
        let mut command = Command::new(exe);
        command.args(args).stdout(Stdio::from(out));
        if !self.verbose {
            command.stderr(Stdio::null());
        }
        let status = command.status()?;
        if !status.success() {
            return Err(Error::ToolFailed {
                command: render_command(program, args),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }

    fn locate(&self, program: &str) -> Result<PathBuf> {
        find_executable(program).ok_or_else(|| Error::ToolNotFound(program.to_string()))
    }

    pub fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        info!("copying \"{}\" to \"{}\"", src.display(), dst.display());
        if !self.dry_run {
            fs::copy(src, dst)?;
        }
        Ok(())
    }

    pub fn makedirs(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            return Ok(());
        }
        info!("creating {}", path.display());
        if !self.dry_run {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    pub fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        info!("creating {}", path.display());
        if !self.dry_run {
            fs::write(path, contents)?;
        }
        Ok(())
    }

    pub fn rm(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        info!("deleting {}", path.display());
        if !self.dry_run {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn rmtree(&self, path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Ok(());
        }
        info!("deleting {}", path.display());
        if !self.dry_run {
            fs::remove_dir_all(path)?;
        }
        Ok(())
    }
}

fn render_command(program: &str, args: &[String]) -> String {
    let mut out = String::from(program);
    for arg in args {
        out.push(' ');
        if arg.contains(char::is_whitespace) || arg.is_empty() {
            out.push('"');
            out.push_str(arg);
            out.push('"');
        } else {
            out.push_str(arg);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_shell_on_path() {
        assert!(find_executable("sh").is_some());
    }

    #[test]
    fn missing_executable_is_none() {
        assert!(find_executable("no-such-tool-docpipe").is_none());
    }

    #[test]
    fn direct_path_skips_path_search() {
        assert!(find_executable("/bin/sh").is_some() || find_executable("/usr/bin/sh").is_some());
        assert!(find_executable("./no-such-tool-docpipe").is_none());
    }

    #[test]
    fn renders_command_with_quoting() {
        let args = vec!["--out".to_string(), "my file.html".to_string()];
        assert_eq!(render_command("tool", &args), "tool --out \"my file.html\"");
    }

    #[test]
    fn run_fails_with_tool_not_found() {
        let shell = Shell::new(false, false);
        let err = shell.run("no-such-tool-docpipe", &[], None).unwrap_err();
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn dry_run_skips_execution() {
        let shell = Shell::new(true, false);
        // `sh -c "exit 1"` would fail if executed.
        let args = vec!["-c".to_string(), "exit 1".to_string()];
        assert!(shell.run("sh", &args, None).is_ok());
    }

    #[test]
    fn dry_run_skips_executable_lookup() {
        let shell = Shell::new(true, false);
        assert!(shell.run("no-such-tool-docpipe", &[], None).is_ok());
    }

    #[test]
    fn nonzero_status_is_fatal() {
        let shell = Shell::new(false, false);
        let args = vec!["-c".to_string(), "exit 3".to_string()];
        match shell.run("sh", &args, None) {
            Err(Error::ToolFailed { status, .. }) => assert_eq!(status, 3),
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }
}
