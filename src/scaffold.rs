use crate::command::{CommandError, CommandRunner, Output, SystemRunner};
use crate::template::{
    render, ProjectDescriptor, RenderError, WriteMode, ENTRY_POINT, ENTRY_POINT_TEMPLATE,
    PROJECT_SUBDIRS, TEMPLATE_MANIFEST,
};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Options for [`Scaffolder`].
///
/// **Fields**
/// - `template_repo`: git URL of the service template repository.
/// - `fetch_dependencies`: run `cargo fetch` once the project is written.
#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub template_repo: String,
    pub fetch_dependencies: bool,
}

impl ScaffoldOptions {
    pub fn new(template_repo: impl Into<String>) -> Self {
        ScaffoldOptions {
            template_repo: template_repo.into(),
            fetch_dependencies: true,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ScaffoldError {
    #[error("{tool} is not installed or not on PATH")]
    MissingTool {
        tool: &'static str,
        #[source]
        source: CommandError,
    },

    #[error("project directory {0} already exists")]
    ProjectExists(PathBuf),

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

fn io_err(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> ScaffoldError {
    let path = path.to_path_buf();
    move |source| ScaffoldError::Io { action, path, source }
}

/// Creates a new service project from the template repository.
///
/// Steps, in order:
/// 1. [`preflight`](Self::preflight): `cargo` and `git` must be available.
/// 2. [`create_project`](Self::create_project): new directory, `cargo init`,
///    module directories.
/// 3. [`init_project`](Self::init_project): clone the template into a
///    temporary directory, render its files into the project, write the
///    entry point and fetch dependencies.
pub struct Scaffolder<R = SystemRunner> {
    runner: R,
    options: ScaffoldOptions,
}

impl Scaffolder<SystemRunner> {
    pub fn system(options: ScaffoldOptions) -> Self {
        Scaffolder::new(SystemRunner, options)
    }
}

impl<R: CommandRunner> Scaffolder<R> {
    pub fn new(runner: R, options: ScaffoldOptions) -> Self {
        Scaffolder { runner, options }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn run(&self, project: &ProjectDescriptor) -> Result<(), ScaffoldError> {
        self.preflight()?;
        self.create_project(project)?;
        self.init_project(project)?;
        tracing::info!(root = %project.root.display(), "project created");
        Ok(())
    }

    pub fn preflight(&self) -> Result<(), ScaffoldError> {
        for tool in ["cargo", "git"] {
            tracing::info!(tool, "checking toolchain");
            self.runner
                .run(None, tool, &["--version"], Output::Captured)
                .map_err(|source| ScaffoldError::MissingTool { tool, source })?;
        }
        Ok(())
    }

    pub fn create_project(&self, project: &ProjectDescriptor) -> Result<(), ScaffoldError> {
        let root = &project.root;
        if fs::symlink_metadata(root).is_ok() {
            return Err(ScaffoldError::ProjectExists(root.clone()));
        }

        tracing::info!(root = %root.display(), "creating project");
        fs::create_dir_all(root).map_err(io_err("create", root))?;

        self.runner.run(
            Some(root),
            "cargo",
            &["init", "--vcs", "none", "--name", project.name.as_str()],
            Output::Captured,
        )?;

        for dir in PROJECT_SUBDIRS {
            let path = root.join(dir);
            if let Err(err) = fs::create_dir_all(&path) {
                tracing::warn!(path = %path.display(), error = %err, "failed to create module directory");
            }
        }
        Ok(())
    }

    pub fn init_project(&self, project: &ProjectDescriptor) -> Result<(), ScaffoldError> {
        let workspace = tempfile::tempdir().map_err(io_err("create", &std::env::temp_dir()))?;
        let checkout = workspace.path().join("template");
        let checkout_arg = checkout.to_string_lossy();

        tracing::info!(repo = %self.options.template_repo, "fetching template");
        self.runner.run(
            None,
            "git",
            &["clone", "--depth", "1", self.options.template_repo.as_str(), checkout_arg.as_ref()],
            Output::Captured,
        )?;

        self.materialize(&checkout, project)?;
        self.write_entry_point(project)?;

        if self.options.fetch_dependencies {
            tracing::info!("fetching dependencies");
            self.runner
                .run(Some(&project.root), "cargo", &["fetch"], Output::Inherited)?;
        }
        Ok(())
    }

    /// Render every manifest entry from `template_dir` into the project.
    pub fn materialize(&self, template_dir: &Path, project: &ProjectDescriptor) -> Result<(), ScaffoldError> {
        for file in TEMPLATE_MANIFEST {
            let src = template_dir.join(file.source);
            let dst = project.root.join(file.target);

            let text = fs::read_to_string(&src).map_err(io_err("read template", &src))?;
            let rendered = render(file.source, &text, project)?;

            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).map_err(io_err("create", parent))?;
            }
            match file.mode {
                WriteMode::Create => fs::write(&dst, rendered).map_err(io_err("write", &dst))?,
                WriteMode::Append => append(&dst, &rendered).map_err(io_err("append to", &dst))?,
            }
            tracing::debug!(source = file.source, target = file.target, "rendered template file");
        }
        Ok(())
    }

    pub fn write_entry_point(&self, project: &ProjectDescriptor) -> Result<(), ScaffoldError> {
        let dst = project.root.join(ENTRY_POINT);
        let rendered = render(ENTRY_POINT, ENTRY_POINT_TEMPLATE, project)?;
        fs::write(&dst, rendered).map_err(io_err("write", &dst))
    }
}

fn append(path: &Path, text: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    if !text.starts_with('\n') {
        file.write_all(b"\n")?;
    }
    file.write_all(text.as_bytes())
}
