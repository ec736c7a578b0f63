//! Compiler selection and command generation.
//!
//! cpm drives a GCC-compatible driver (`cc`/`c++`, gcc, clang). Commands
//! are generated as plain argument vectors and handed to a
//! [`Runner`](crate::builder::runner::Runner), which decides whether they
//! run on the host or inside a container.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::{Environment, ResolvedTarget};
use crate::util::config::ToolchainConfig;
use crate::util::fs::{to_slash, CXX_EXTENSIONS, C_EXTENSIONS};
use crate::util::process;

/// Source language of a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cxx,
}

impl Language {
    /// Language of a source file, chosen by extension.
    pub fn of(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?;
        if C_EXTENSIONS.contains(&ext) {
            Some(Language::C)
        } else if CXX_EXTENSIONS.contains(&ext) {
            Some(Language::Cxx)
        } else {
            None
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::C => f.write_str("C"),
            Language::Cxx => f.write_str("C++"),
        }
    }
}

/// A command to execute: program and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Input for a compile step. Paths are relative to the project root.
#[derive(Debug, Clone)]
pub struct CompileInput {
    pub source: PathBuf,
    pub output: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub cflags: Vec<String>,
}

/// Input for a link step. Paths are relative to the project root.
#[derive(Debug, Clone)]
pub struct LinkInput {
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
    /// Libraries to link (without `-l` prefix)
    pub libs: Vec<String>,
    pub ldflags: Vec<String>,
}

/// The C and C++ compiler drivers used for a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub cc: String,
    pub cxx: String,
}

impl Toolchain {
    /// Pick compilers for a target.
    ///
    /// Target overrides win over configuration. Native builds then fall
    /// back to `CC`/`CXX` and a PATH search; container builds use the
    /// image's `cc` and `c++`.
    pub fn resolve(target: &ResolvedTarget, config: &ToolchainConfig) -> Toolchain {
        let configured = |path: &Option<PathBuf>| path.as_deref().map(to_slash);

        let (fallback_cc, fallback_cxx) = match target.environment {
            Environment::Native => (
                process::find_c_compiler().map(|p| to_slash(&p)),
                process::find_cxx_compiler().map(|p| to_slash(&p)),
            ),
            _ => (None, None),
        };

        let cc = target
            .toolchain
            .cc
            .clone()
            .or_else(|| configured(&config.cc))
            .or(fallback_cc)
            .unwrap_or_else(|| "cc".to_string());
        let cxx = target
            .toolchain
            .cxx
            .clone()
            .or_else(|| configured(&config.cxx))
            .or(fallback_cxx)
            .unwrap_or_else(|| "c++".to_string());

        tracing::debug!("toolchain for target `{}`: cc={} cxx={}", target.name, cc, cxx);
        Toolchain { cc, cxx }
    }

    /// Driver for a language.
    pub fn compiler(&self, lang: Language) -> &str {
        match lang {
            Language::C => &self.cc,
            Language::Cxx => &self.cxx,
        }
    }

    /// Generate a compile command.
    pub fn compile_command(&self, input: &CompileInput, lang: Language) -> CommandSpec {
        let mut cmd = CommandSpec::new(self.compiler(lang))
            .arg("-c")
            .arg(to_slash(&input.source))
            .arg("-o")
            .arg(to_slash(&input.output));

        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("-I{}", to_slash(dir)));
        }

        cmd.args(input.cflags.iter().cloned())
    }

    /// Generate a link command for an executable.
    ///
    /// `driver` is C++ whenever any linked object came from C++ so that
    /// the C++ runtime is pulled in.
    pub fn link_exe_command(&self, input: &LinkInput, driver: Language) -> CommandSpec {
        let mut cmd = CommandSpec::new(self.compiler(driver));

        for obj in &input.objects {
            cmd = cmd.arg(to_slash(obj));
        }

        cmd = cmd.arg("-o").arg(to_slash(&input.output));
        cmd = cmd.args(input.ldflags.iter().cloned());

        for lib in &input.libs {
            cmd = cmd.arg(format!("-l{}", lib));
        }

        cmd
    }
}
