//! Test utilities and fakes for cpm unit tests.
//!
//! The fakes stand in for the two collaborators that leave the process:
//! the bit registry and the command runner.
//!
//! # Example
//!
//! ```rust,ignore
//! use cpm::test_support::{bit_archive, FakeRegistry, ScriptedRunner};
//!
//! let registry = FakeRegistry::new().with_bit("cest:1.0", bit_archive(&[("include/cest.h", "")]));
//! let runner = ScriptedRunner::new().fail_when("tests/test_math", "1 failed\n");
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::builder::runner::{RunError, RunOutput, Runner, RunnerFactory};
use crate::builder::toolchain::CommandSpec;
use crate::core::{BitId, Project, ResolvedTarget};
use crate::sources::{FetchError, Registry};

pub use fixtures::*;

/// Build a gzip-compressed tar archive from `(path, contents)` pairs.
pub fn bit_archive(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }

    let mut encoder = builder.into_inner().unwrap();
    encoder.flush().unwrap();
    encoder.finish().unwrap()
}

/// In-memory registry that records every fetch.
#[derive(Debug, Default)]
pub struct FakeRegistry {
    bits: HashMap<BitId, Vec<u8>>,
    failing: bool,
    fetches: Mutex<Vec<BitId>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        FakeRegistry::default()
    }

    /// Serve `archive` for the bit `id` (`name:version`).
    pub fn with_bit(mut self, id: &str, archive: Vec<u8>) -> Self {
        self.bits.insert(id.parse().unwrap(), archive);
        self
    }

    /// Make every fetch fail as a network error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn fetched(&self) -> Vec<BitId> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

impl Registry for FakeRegistry {
    fn endpoint(&self) -> &str {
        "fake://registry"
    }

    fn fetch(&self, bit: &BitId) -> Result<Vec<u8>, FetchError> {
        self.fetches.lock().unwrap().push(bit.clone());

        if self.failing {
            return Err(FetchError::Network {
                bit: bit.clone(),
                endpoint: self.endpoint().to_string(),
                message: "connection refused".to_string(),
            });
        }

        self.bits
            .get(bit)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                bit: bit.clone(),
                endpoint: self.endpoint().to_string(),
            })
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Substring of the rendered command line.
    Contains(String),
    /// Exact program name.
    Program(String),
}

impl Matcher {
    fn matches(&self, command: &CommandSpec, rendered: &str) -> bool {
        match self {
            Matcher::Contains(pattern) => rendered.contains(pattern.as_str()),
            Matcher::Program(program) => command.program == *program,
        }
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    commands: Vec<String>,
    targets: Vec<String>,
    prepared: usize,
}

/// Runner that records commands instead of executing them.
///
/// Every command succeeds with empty output unless a matching rule says
/// otherwise; the first matching rule wins. Clones share their
/// log, so a clone handed out as a [`RunnerFactory`] product can be
/// inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    rules: Vec<(Matcher, RunOutput)>,
    fail_prepare: bool,
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        ScriptedRunner::default()
    }

    /// Answer commands containing `pattern` with `output`.
    pub fn respond(mut self, pattern: &str, output: RunOutput) -> Self {
        self.rules
            .push((Matcher::Contains(pattern.to_string()), output));
        self
    }

    /// Answer runs of exactly `program` with `output`.
    pub fn respond_program(mut self, program: &str, output: RunOutput) -> Self {
        self.rules
            .push((Matcher::Program(program.to_string()), output));
        self
    }

    /// Fail commands containing `pattern` with exit code 1 and `stderr`.
    pub fn fail_when(self, pattern: &str, stderr: &str) -> Self {
        self.respond(
            pattern,
            RunOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        )
    }

    /// Make environment preparation fail.
    pub fn fail_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }

    /// Rendered commands, in execution order.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Names of targets runners were created for.
    pub fn targets(&self) -> Vec<String> {
        self.state.lock().unwrap().targets.clone()
    }

    pub fn prepare_count(&self) -> usize {
        self.state.lock().unwrap().prepared
    }
}

impl Runner for ScriptedRunner {
    fn describe(&self) -> String {
        "scripted".to_string()
    }

    fn prepare(&self) -> Result<(), RunError> {
        self.state.lock().unwrap().prepared += 1;
        if self.fail_prepare {
            return Err(RunError::ImageBuild {
                context: "environment".into(),
                output: "Step 1/1 : FROM nowhere\nerror: pull access denied\n".to_string(),
            });
        }
        Ok(())
    }

    fn run(&self, command: &CommandSpec) -> Result<RunOutput, RunError> {
        let rendered = command.to_string();
        self.state.lock().unwrap().commands.push(rendered.clone());

        let output = self
            .rules
            .iter()
            .find(|(matcher, _)| matcher.matches(command, &rendered))
            .map(|(_, output)| output.clone())
            .unwrap_or(RunOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            });
        Ok(output)
    }
}

impl RunnerFactory for ScriptedRunner {
    fn runner(&self, _project: &Project, target: &ResolvedTarget) -> Box<dyn Runner> {
        self.state.lock().unwrap().targets.push(target.name.clone());
        Box::new(self.clone())
    }
}
