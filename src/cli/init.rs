//! `init` command: scaffold a new bot project.
//!
//! Writes the project template into a directory, stores the access key in
//! `.dev.vars`, and renames the template to the project name.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Package name used in the template, replaced by the project name.
pub const TEMPLATE_NAME: &str = "poe-bot-template";

/// Files whose contents mention [`TEMPLATE_NAME`].
pub const RENAMED_FILES: [&str; 3] = ["Cargo.toml", "src/main.rs", "README.md"];

/// Directory names never copied from a template directory.
const SKIPPED_DIRS: [&str; 3] = ["node_modules", "target", ".git"];

/// Manifest name inside a template, so the template is not a nested package.
const TEMPLATE_MANIFEST: &str = "Cargo.toml.tmpl";

/// Template shipped inside the binary.
const EMBEDDED_TEMPLATE: [(&str, &str); 4] = [
    ("Cargo.toml", include_str!("../../template/Cargo.toml.tmpl")),
    ("src/main.rs", include_str!("../../template/src/main.rs")),
    ("README.md", include_str!("../../template/README.md")),
    ("_.gitignore", include_str!("../../template/_.gitignore")),
];

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("Invalid project name '{0}'")]
    InvalidName(String),

    #[error("Template file '{0}' is missing")]
    MissingTemplateFile(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ScaffoldError + '_ {
    move |source| ScaffoldError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What to scaffold and where.
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub dist_path: PathBuf,
    pub name: String,
    pub access_key: String,
    /// Copy this directory instead of the embedded template
    pub template_dir: Option<PathBuf>,
}

impl InitOptions {
    pub fn new(
        dist_path: impl Into<PathBuf>,
        name: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Self {
        Self {
            dist_path: dist_path.into(),
            name: name.into(),
            access_key: access_key.into(),
            template_dir: None,
        }
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }
}

/// The project name the CLI derives from the `init` argument: the last
/// path component.
pub fn project_name(arg: &str) -> Result<String, ScaffoldError> {
    Path::new(arg)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .ok_or_else(|| ScaffoldError::InvalidName(arg.to_string()))
}

/// Scaffold a project. Existing files at the destination are overwritten.
pub fn init(options: &InitOptions) -> Result<(), ScaffoldError> {
    let dist = options.dist_path.as_path();
    fs::create_dir_all(dist).map_err(io_error(dist))?;

    match &options.template_dir {
        Some(template) => {
            copy_dir(template, dist)?;
            let manifest = dist.join(TEMPLATE_MANIFEST);
            if manifest.exists() {
                let target = dist.join("Cargo.toml");
                fs::rename(&manifest, &target).map_err(io_error(&manifest))?;
            }
        }
        None => write_embedded(dist)?,
    }

    let dev_vars = dist.join(".dev.vars");
    fs::write(&dev_vars, format!("ACCESS_KEY=\"{}\"", options.access_key))
        .map_err(io_error(&dev_vars))?;

    for file in RENAMED_FILES {
        let path = dist.join(file);
        if !path.exists() {
            return Err(ScaffoldError::MissingTemplateFile(file.to_string()));
        }
        let content = fs::read_to_string(&path).map_err(io_error(&path))?;
        fs::write(&path, content.replace(TEMPLATE_NAME, &options.name))
            .map_err(io_error(&path))?;
    }

    let ignore_src = dist.join("_.gitignore");
    let ignore_dst = dist.join(".gitignore");
    fs::rename(&ignore_src, &ignore_dst).map_err(io_error(&ignore_src))?;

    debug!(path = %dist.display(), name = %options.name, "Project scaffolded");
    Ok(())
}

fn write_embedded(dist: &Path) -> Result<(), ScaffoldError> {
    for (relative, content) in EMBEDDED_TEMPLATE {
        let path = dist.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(&path, content).map_err(io_error(&path))?;
    }
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<(), ScaffoldError> {
    fs::create_dir_all(dst).map_err(io_error(dst))?;

    for entry in fs::read_dir(src).map_err(io_error(src))? {
        let entry = entry.map_err(io_error(src))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        // Follows symlinks, so linked files are copied as regular files
        let metadata = fs::metadata(&from).map_err(io_error(&from))?;
        if metadata.is_dir() {
            let skipped = entry
                .file_name()
                .to_str()
                .is_some_and(|name| SKIPPED_DIRS.contains(&name));
            if skipped {
                debug!(path = %from.display(), "Skipping template directory");
                continue;
            }
            copy_dir(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(io_error(&from))?;
        }
    }
    Ok(())
}
