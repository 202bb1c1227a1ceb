//! Invocation of the external `castxml` dumper.
//!
//! Locates the binary, probes its version, and runs it over a header to
//! produce the XML dump the resolver consumes.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::xml::Document;

const DEFAULT_BINARY: &str = "castxml";

/// Handle to a castxml installation.
#[derive(Debug, Clone, Default)]
pub struct CastXml {
    binary: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    clang_args: Vec<String>,
}

impl CastXml {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
            ..Self::default()
        }
    }

    /// Produce the dump in `dir` instead of a fresh temp directory. Dumps
    /// produced this way are kept on disk.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Extra arguments passed through to the compiler side (e.g. `-I...`).
    pub fn with_clang_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clang_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn binary(&self) -> &Path {
        self.binary.as_deref().unwrap_or(Path::new(DEFAULT_BINARY))
    }

    /// Whether the configured binary can be located and runs.
    pub fn is_available(&self) -> bool {
        which::which(self.binary()).is_ok() && self.run(&["--version"]).is_ok()
    }

    /// castxml's own version.
    pub fn version(&self) -> Result<String> {
        self.version_section("castxml")
    }

    /// The clang version castxml was built against.
    pub fn clang_version(&self) -> Result<String> {
        self.version_section("clang")
    }

    /// Extract the version token from the `<prefix> version X.Y.Z` line of
    /// `--version` output.
    fn version_section(&self, prefix: &str) -> Result<String> {
        let output = self.run(&["--version"])?;
        let needle = format!("{prefix} version ");
        for line in output.lines() {
            if let Some((_, rest)) = line.split_once(&needle)
                && let Some(version) = rest.split_whitespace().next()
            {
                return Ok(version.to_string());
            }
        }
        bail!("can not parse the {prefix} version section; actual output:\n{output}")
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(self.binary())
            .args(args)
            .output()
            .with_context(|| format!("failed to run {}", self.binary().display()))?;
        if !output.status.success() {
            bail!(
                "{} {} failed: {}",
                self.binary().display(),
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run the dumper over `header`, producing the XML dump.
    ///
    /// The dump lands in the configured temp directory, or in a fresh
    /// temporary directory that is removed when the returned [`Dump`] is
    /// dropped. `cwd` defaults to the header's parent directory.
    pub fn dump(&self, header: &Path, cwd: Option<&Path>) -> Result<Dump> {
        if !header.is_file() {
            bail!("input file {} not found", header.display());
        }

        let stem = header.file_stem().unwrap_or_default().to_string_lossy();
        let (out_dir, guard) = match &self.temp_dir {
            Some(dir) => (dir.clone(), None),
            None => {
                let tmp = TempDir::with_prefix("castscrape-").context("creating temp directory")?;
                (tmp.path().to_path_buf(), Some(tmp))
            }
        };
        let out = out_dir.join(format!("{stem}.xml"));

        let cwd = match cwd {
            Some(dir) => dir,
            None => header.parent().unwrap_or(Path::new(".")),
        };

        debug!(
            header = %header.display(),
            out = %out.display(),
            "running castxml"
        );

        let output = Command::new(self.binary())
            .arg(header)
            .arg("--castxml-output=1")
            .arg("-o")
            .arg(&out)
            .args(&self.clang_args)
            .current_dir(cwd)
            .output()
            .with_context(|| format!("failed to run {}", self.binary().display()))?;
        if !output.status.success() {
            bail!(
                "castxml failed on {}: {}",
                header.display(),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        if !out.is_file() {
            bail!("castxml produced no output file at {}", out.display());
        }

        info!(header = %header.display(), dump = %out.display(), "castxml dump complete");

        Ok(Dump {
            path: out,
            _temp: guard,
        })
    }
}

/// A produced XML dump file.
///
/// Dumps created in an implicit temp directory are disposable: the backing
/// directory is removed on drop. Use [`Dump::save_as`] or [`Dump::save_in`]
/// to keep the file.
#[derive(Debug)]
pub struct Dump {
    path: PathBuf,
    _temp: Option<TempDir>,
}

impl Dump {
    /// Wrap an existing dump file. Not disposable.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _temp: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy the dump into `directory` (created if needed), keeping its file
    /// name. Returns a non-disposable handle to the copy.
    pub fn save_in(&self, directory: &Path) -> Result<Dump> {
        std::fs::create_dir_all(directory).with_context(|| {
            format!(
                "directory {} is not available for writing",
                directory.display()
            )
        })?;
        let file_name = self.path.file_name().unwrap_or_default();
        self.save_as(&directory.join(file_name))
    }

    /// Copy the dump to `target`. Returns a non-disposable handle.
    pub fn save_as(&self, target: &Path) -> Result<Dump> {
        std::fs::copy(&self.path, target)
            .with_context(|| format!("can not save dump to {}", target.display()))?;
        Ok(Dump::from_path(target))
    }

    /// The dump's XML text.
    pub fn contents(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))
    }

    /// Load the dump as an indexed document.
    pub fn to_document(&self) -> Result<Document> {
        Document::from_file(&self.path)
            .with_context(|| format!("loading {}", self.path.display()))
    }
}
