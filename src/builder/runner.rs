//! Command runners.
//!
//! A runner executes compiler, linker and test commands for one target.
//! Every command runs with the project root as its working directory, and
//! all paths on its command line are relative to that root, so the same
//! command works on the host and inside a container that mounts the
//! project at [`CONTAINER_PROJECT_DIR`].

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::builder::toolchain::CommandSpec;
use crate::core::{Environment, Project, ResolvedTarget};
use crate::util::hash::short_hash;
use crate::util::process::ProcessBuilder;

/// Mount point of the project root inside containers.
pub const CONTAINER_PROJECT_DIR: &str = "/project";

/// Failure to run a command at all (as opposed to a command failing).
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to run `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("failed to build image from {}:\n{output}", .context.display())]
    ImageBuild { context: PathBuf, output: String },
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Everything the command printed, stdout first.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !text.is_empty() && !text.ends_with('\n') && !self.stderr.is_empty() {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }
}

impl From<std::process::Output> for RunOutput {
    fn from(output: std::process::Output) -> Self {
        RunOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Executes commands for one target.
pub trait Runner: Send + Sync {
    /// Short description for log messages.
    fn describe(&self) -> String;

    /// Make the environment ready (e.g. build its image). Called once
    /// before the first command.
    fn prepare(&self) -> Result<(), RunError>;

    /// Run one command to completion, capturing its output.
    fn run(&self, command: &CommandSpec) -> Result<RunOutput, RunError>;
}

/// Creates the runner for a target.
pub trait RunnerFactory {
    fn runner(&self, project: &Project, target: &ResolvedTarget) -> Box<dyn Runner>;
}

fn exec(process: ProcessBuilder) -> Result<RunOutput, RunError> {
    process
        .exec()
        .map(RunOutput::from)
        .map_err(|e| RunError::Spawn {
            command: process.display_command(),
            message: format!("{:#}", e),
        })
}

/// Runs commands directly on the host.
#[derive(Debug, Clone)]
pub struct NativeRunner {
    root: PathBuf,
}

impl NativeRunner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        NativeRunner { root: root.into() }
    }

    /// Programs given as a relative path (`build/tests/x`) resolve against
    /// the project root; bare names are looked up on PATH.
    fn program_path(&self, program: &str) -> PathBuf {
        let path = Path::new(program);
        if path.is_relative() && path.components().count() > 1 {
            self.root.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Runner for NativeRunner {
    fn describe(&self) -> String {
        "native".to_string()
    }

    fn prepare(&self) -> Result<(), RunError> {
        Ok(())
    }

    fn run(&self, command: &CommandSpec) -> Result<RunOutput, RunError> {
        exec(
            ProcessBuilder::new(self.program_path(&command.program))
                .args(&command.args)
                .cwd(&self.root),
        )
    }
}

/// Where a container image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerImage {
    /// An existing image reference.
    Reference(String),
    /// An image built from a context directory under a derived tag.
    Build { context: PathBuf, tag: String },
}

impl ContainerImage {
    fn tag(&self) -> &str {
        match self {
            ContainerImage::Reference(reference) => reference,
            ContainerImage::Build { tag, .. } => tag,
        }
    }
}

/// Runs commands in a throwaway container with the project mounted.
#[derive(Debug, Clone)]
pub struct ContainerRunner {
    program: String,
    root: PathBuf,
    image: ContainerImage,
}

impl ContainerRunner {
    pub fn new(program: impl Into<String>, root: impl Into<PathBuf>, image: ContainerImage) -> Self {
        ContainerRunner {
            program: program.into(),
            root: root.into(),
            image,
        }
    }

    /// Tag for an image built from `context`, stable per project and context.
    pub fn image_tag(project_name: &str, context: &Path) -> String {
        let context = context
            .canonicalize()
            .unwrap_or_else(|_| context.to_path_buf());
        // docker repository names only take lowercase alphanumerics and separators
        let name: String = project_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        format!(
            "cpm-{}-{}",
            name,
            short_hash(&context.to_string_lossy())
        )
    }

    /// The full host command line for `command`.
    pub fn wrap(&self, command: &CommandSpec) -> ProcessBuilder {
        let mount = format!("{}:{}", self.root.display(), CONTAINER_PROJECT_DIR);
        ProcessBuilder::new(&self.program)
            .args(["run", "--rm", "-v", mount.as_str(), "-w", CONTAINER_PROJECT_DIR])
            .arg(self.image.tag())
            .arg(&command.program)
            .args(&command.args)
    }
}

impl Runner for ContainerRunner {
    fn describe(&self) -> String {
        format!("container {}", self.image.tag())
    }

    fn prepare(&self) -> Result<(), RunError> {
        let ContainerImage::Build { context, tag } = &self.image else {
            return Ok(());
        };

        tracing::info!("building image {} from {}", tag, context.display());
        let output = exec(
            ProcessBuilder::new(&self.program)
                .args(["build", "-t", tag.as_str()])
                .arg(context),
        )?;

        if output.success() {
            Ok(())
        } else {
            Err(RunError::ImageBuild {
                context: context.clone(),
                output: output.combined(),
            })
        }
    }

    fn run(&self, command: &CommandSpec) -> Result<RunOutput, RunError> {
        exec(self.wrap(command))
    }
}

/// Picks a native or container runner from the target's environment.
#[derive(Debug, Clone)]
pub struct DefaultRunnerFactory {
    container_program: String,
}

impl DefaultRunnerFactory {
    pub fn new(container_program: impl Into<String>) -> Self {
        DefaultRunnerFactory {
            container_program: container_program.into(),
        }
    }
}

impl RunnerFactory for DefaultRunnerFactory {
    fn runner(&self, project: &Project, target: &ResolvedTarget) -> Box<dyn Runner> {
        let root = project.root().to_path_buf();
        let image = match &target.environment {
            Environment::Native => return Box::new(NativeRunner::new(root)),
            Environment::Image(reference) => ContainerImage::Reference(reference.clone()),
            Environment::DockerfileBuild(context) => {
                let context = root.join(context);
                ContainerImage::Build {
                    tag: ContainerRunner::image_tag(project.name(), &context),
                    context,
                }
            }
        };

        Box::new(ContainerRunner::new(&self.container_program, root, image))
    }
}
