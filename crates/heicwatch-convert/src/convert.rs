//! Converter invocation.
//!
//! The converter is run as `<program> [prefix args] <source> <output>` with
//! the working directory set to the directory holding the source file. Its
//! standard output and standard error are forwarded to ours while it runs.

use crate::tools::{get_tool_path, DEFAULT_CONVERTER};
use crate::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// How much trailing stderr output is kept for the error message.
const STDERR_TAIL_BYTES: usize = 4096;

/// Converts one file in a directory into a sibling output file.
pub trait Converter: Send + Sync {
    /// Convert `dir/source` into `dir/output`.
    fn convert(&self, dir: &Path, source: &OsStr, output: &str) -> Result<()>;
}

/// Converter backed by an external executable.
///
/// # Example
///
/// ```no_run
/// use heicwatch_convert::{ConvertCommand, Converter};
/// use std::ffi::OsStr;
/// use std::path::Path;
///
/// let convert = ConvertCommand::discover(None)?;
/// convert.convert(Path::new("/photos/2023"), OsStr::new("IMG_0001.HEIC"), "IMG_0001.jpg")?;
/// # Ok::<(), heicwatch_convert::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConvertCommand {
    program: PathBuf,
    prefix_args: Vec<OsString>,
}

impl ConvertCommand {
    /// Create a converter for the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    /// Locate the converter, preferring a configured path over `PATH` lookup.
    pub fn discover(configured: Option<&Path>) -> Result<Self> {
        get_tool_path(DEFAULT_CONVERTER, configured).map(Self::new)
    }

    /// Arguments placed before the source and output names,
    /// e.g. `convert` for ImageMagick 7's `magick convert`.
    pub fn with_prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Path of the converter executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }
}

impl Converter for ConvertCommand {
    fn convert(&self, dir: &Path, source: &OsStr, output: &str) -> Result<()> {
        let tool = self.tool_name();

        let source_path = dir.join(source);
        if !source_path.exists() {
            return Err(Error::file_not_found(source_path));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Running {} {:?} {:?} {:?} in {:?}",
            tool,
            self.prefix_args,
            source,
            output,
            dir
        );

        let mut child = Command::new(&self.program)
            .current_dir(dir)
            .args(&self.prefix_args)
            .arg(source)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::tool_failed(&tool, format!("failed to spawn: {e}")))?;

        let child_stdout = child.stdout.take();
        let child_stderr = child.stderr.take();

        // Both pipes are drained until EOF before the exit status is read, so
        // the converter never blocks on a full pipe.
        let stderr_tail = std::thread::scope(|scope| {
            let out = scope.spawn(move || {
                if let Some(mut pipe) = child_stdout {
                    forward(&mut pipe, &mut io::stdout());
                }
            });
            let err = scope.spawn(move || {
                let mut tail = TailWriter::new(io::stderr(), STDERR_TAIL_BYTES);
                if let Some(mut pipe) = child_stderr {
                    forward(&mut pipe, &mut tail);
                }
                tail.into_string()
            });

            let _ = out.join();
            err.join().unwrap_or_default()
        });

        let status = child
            .wait()
            .map_err(|e| Error::tool_failed(&tool, format!("I/O error waiting for process: {e}")))?;

        if !status.success() {
            return Err(Error::tool_failed(
                tool,
                format!("exited with status {}: {}", status, stderr_tail.trim()),
            ));
        }

        Ok(())
    }
}

fn forward(reader: &mut impl Read, writer: &mut impl Write) {
    if let Err(_e) = io::copy(reader, writer) {
        #[cfg(feature = "tracing")]
        tracing::debug!("Failed to forward converter output: {}", _e);
    }
}

/// Writer that passes everything through and remembers the last bytes.
struct TailWriter<W> {
    inner: W,
    tail: Vec<u8>,
    limit: usize,
}

impl<W: Write> TailWriter<W> {
    fn new(inner: W, limit: usize) -> Self {
        Self {
            inner,
            tail: Vec::new(),
            limit,
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.tail).to_string()
    }
}

impl<W: Write> Write for TailWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.tail.extend_from_slice(&buf[..n]);
        if self.tail.len() > self.limit {
            let excess = self.tail.len() - self.limit;
            self.tail.drain(..excess);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
