//! Compiling translation units and linking executables through a runner.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use crate::builder::runner::{RunError, RunOutput, Runner};
use crate::builder::toolchain::{CompileInput, Language, LinkInput, Toolchain};
use crate::core::project::BUILD_DIR;
use crate::util::fs::{ensure_dir, relative_to};

/// Build failure.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The toolchain rejected the input; carries its diagnostics verbatim.
    #[error("{diagnostics}")]
    Failed { diagnostics: String },

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Object file for a source, relative to the project root.
pub fn object_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(".o");
    Path::new(BUILD_DIR).join("obj").join(name)
}

/// A compiled object and the language it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub path: PathBuf,
    pub language: Language,
}

/// Link driver for a set of objects: C++ as soon as any object is C++.
pub fn link_driver<'a>(objects: impl IntoIterator<Item = &'a Object>) -> Language {
    if objects.into_iter().any(|o| o.language == Language::Cxx) {
        Language::Cxx
    } else {
        Language::C
    }
}

/// Compiles and links for one project with one toolchain and runner.
pub struct Compiler<'a> {
    root: &'a Path,
    runner: &'a dyn Runner,
    toolchain: &'a Toolchain,
    include_dirs: Vec<PathBuf>,
    cflags: Vec<String>,
    jobs: Option<usize>,
}

impl<'a> Compiler<'a> {
    pub fn new(root: &'a Path, runner: &'a dyn Runner, toolchain: &'a Toolchain) -> Self {
        Compiler {
            root,
            runner,
            toolchain,
            include_dirs: Vec::new(),
            cflags: Vec::new(),
            jobs: None,
        }
    }

    /// Add include directories; absolute paths under the root are made relative.
    pub fn include_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let root = self.root;
        self.include_dirs.extend(dirs.into_iter().map(|dir| {
            let rel = relative_to(root, &dir);
            if rel.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                rel
            }
        }));
        self
    }

    pub fn cflags(mut self, flags: impl IntoIterator<Item = String>) -> Self {
        self.cflags.extend(flags);
        self
    }

    /// Bound parallel compilation (None = one job per core).
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Compile every source into an object, in parallel.
    ///
    /// All units are attempted; when any fail, the diagnostics of every
    /// failed unit are returned in source order.
    pub fn compile_all(&self, sources: &[PathBuf]) -> Result<Vec<Object>, BuildError> {
        let units: Vec<(PathBuf, Language)> = sources
            .iter()
            .filter_map(|source| {
                let language = Language::of(source)?;
                Some((relative_to(self.root, source), language))
            })
            .collect();

        if units.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!("Compiling {} files", units.len());

        let compile = || -> Vec<Result<Object, BuildError>> {
            units
                .par_iter()
                .map(|(source, language)| self.compile(source, *language))
                .collect()
        };

        let results = match self.jobs {
            Some(j) => match rayon::ThreadPoolBuilder::new().num_threads(j).build() {
                Ok(pool) => pool.install(compile),
                Err(e) => {
                    tracing::warn!("cannot start {} compile jobs: {}", j, e);
                    compile()
                }
            },
            None => compile(),
        };

        let mut objects = Vec::with_capacity(results.len());
        let mut diagnostics = Vec::new();
        for result in results {
            match result {
                Ok(object) => objects.push(object),
                Err(BuildError::Failed { diagnostics: text }) => diagnostics.push(text),
                Err(other) => return Err(other),
            }
        }

        if diagnostics.is_empty() {
            Ok(objects)
        } else {
            Err(BuildError::Failed {
                diagnostics: diagnostics.concat(),
            })
        }
    }

    fn compile(&self, source: &Path, language: Language) -> Result<Object, BuildError> {
        let output = object_path(source);
        if let Some(parent) = output.parent() {
            ensure_dir(&self.root.join(parent))?;
        }

        let input = CompileInput {
            source: source.to_path_buf(),
            output: output.clone(),
            include_dirs: self.include_dirs.clone(),
            cflags: self.cflags.clone(),
        };
        let cmd = self.toolchain.compile_command(&input, language);
        tracing::debug!("{}", cmd);

        let result = self.runner.run(&cmd)?;
        check(result, || format!("compiling {}", source.display()))?;

        Ok(Object {
            path: output,
            language,
        })
    }

    /// Link objects into the executable `output` (relative to the root).
    pub fn link(
        &self,
        objects: &[Object],
        output: &Path,
        ldflags: &[String],
        libraries: &[String],
    ) -> Result<PathBuf, BuildError> {
        if let Some(parent) = output.parent() {
            ensure_dir(&self.root.join(parent))?;
        }

        let input = LinkInput {
            objects: objects.iter().map(|o| o.path.clone()).collect(),
            output: output.to_path_buf(),
            libs: libraries.to_vec(),
            ldflags: ldflags.to_vec(),
        };
        let cmd = self
            .toolchain
            .link_exe_command(&input, link_driver(objects));
        tracing::debug!("{}", cmd);

        let result = self.runner.run(&cmd)?;
        check(result, || format!("linking {}", output.display()))?;

        Ok(output.to_path_buf())
    }
}

/// Turn a non-zero toolchain exit into [`BuildError::Failed`].
fn check(output: RunOutput, what: impl FnOnce() -> String) -> Result<(), BuildError> {
    if output.success() {
        return Ok(());
    }

    let mut diagnostics = output.combined();
    if diagnostics.trim().is_empty() {
        diagnostics = match output.code {
            Some(code) => format!("{} failed with exit code {}\n", what(), code),
            None => format!("{} was terminated by a signal\n", what()),
        };
    }
    Err(BuildError::Failed { diagnostics })
}
