//! Output writing and the optional external post-pass

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use log::debug;
use tempfile::NamedTempFile;

use crate::error::BundleError;

/// Contents written next to their destination but not yet visible there
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    path: PathBuf,
}

/// Write `contents` to a temporary file in the directory of `path`
///
/// Nothing appears at `path` until [`StagedFile::commit`]; dropping the
/// staged file removes the temporary file.
pub fn stage(path: &Path, contents: &str) -> Result<StagedFile, BundleError> {
    let write_error = |source| BundleError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_error)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(write_error)?;
    temp.write_all(contents.as_bytes()).map_err(write_error)?;
    temp.flush().map_err(write_error)?;

    debug!("Staged {} bytes for {}", contents.len(), path.display());
    Ok(StagedFile {
        temp,
        path: path.to_path_buf(),
    })
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the temporary file over the destination
    pub fn commit(self) -> Result<(), BundleError> {
        let Self { temp, path } = self;
        temp.persist(&path).map_err(|err| BundleError::Write {
            path: path.clone(),
            source: err.error,
        })?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Pipe `input` through an external command and return what it prints
///
/// `command[0]` is the program, the rest are its arguments. Any failure to
/// run the command, a non-zero exit or non-UTF-8 output is fatal.
pub fn run_post_pass(command: &[String], input: &str) -> Result<String, BundleError> {
    let display = command.join(" ");
    let failed = |reason: String| BundleError::ExternalTool {
        command: display.clone(),
        reason,
    };

    let (program, args) = command
        .split_first()
        .ok_or_else(|| failed("no program given".to_string()))?;

    debug!("Running post-minify command `{display}`");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| failed(format!("could not start: {err}")))?;

    // Feed stdin from a separate thread so a chatty child cannot deadlock us
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| failed("stdin unavailable".to_string()))?;
    let input = input.to_string();
    let feeder = thread::spawn(move || stdin.write_all(input.as_bytes()));

    let output = child
        .wait_with_output()
        .map_err(|err| failed(format!("waiting for exit: {err}")))?;

    match feeder.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => return Err(failed(format!("writing input: {err}"))),
        Err(_) => return Err(failed("input thread panicked".to_string())),
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(failed(format!("{} ({})", output.status, stderr.trim())));
    }

    String::from_utf8(output.stdout).map_err(|_| failed("output is not valid UTF-8".to_string()))
}
