//! project.yaml descriptor model.
//!
//! A [`Descriptor`] only exists for documents that parsed as YAML and passed
//! [`schema::validate`](crate::core::schema::validate); parsing and
//! validation happen together in [`Descriptor::parse`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::bit::{validate_bit_name, BitId, BitIdError};
use crate::core::schema::{self, SchemaError};
use crate::core::target::{self, RawTarget, ResolvedTarget, TargetError, TargetSpec};

/// Error turning a document into a [`Descriptor`].
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to parse project.yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("unexpected descriptor shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error(transparent)]
    Bit(#[from] BitIdError),

    #[error(transparent)]
    Target(#[from] TargetError),
}

/// The purpose a plan serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlanName {
    Build,
    Test,
}

impl PlanName {
    /// Plans in declaration-precedence order: later entries win conflicts.
    pub const ALL: [PlanName; 2] = [PlanName::Build, PlanName::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanName::Build => "build",
            PlanName::Test => "test",
        }
    }
}

impl fmt::Display for PlanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dependencies and compiler settings for one purpose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Declared bits, keyed by name.
    pub bits: BTreeMap<String, BitId>,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
    /// Libraries passed to the linker as `-l<name>`.
    pub libraries: Vec<String>,
}

impl Plan {
    /// Declared bits in name order.
    pub fn bit_ids(&self) -> impl Iterator<Item = &BitId> {
        self.bits.values()
    }

    /// Declare a bit, replacing any earlier declaration with the same name.
    ///
    /// Returns the replaced declaration when its version differed.
    pub fn declare(&mut self, bit: BitId) -> Option<BitId> {
        let previous = self.bits.insert(bit.name().to_string(), bit.clone());
        previous.filter(|prev| prev.version() != bit.version())
    }

    /// Merge `other` into this plan. Bits from `other` win name conflicts;
    /// flag lists are concatenated.
    pub fn merge(&mut self, other: &Plan) {
        for bit in other.bit_ids() {
            if let Some(replaced) = self.declare(bit.clone()) {
                tracing::warn!(
                    "bit `{}` is declared at {} and {}; using {}",
                    bit.name(),
                    replaced.version(),
                    bit.version(),
                    bit.version()
                );
            }
        }
        self.cflags.extend(other.cflags.iter().cloned());
        self.ldflags.extend(other.ldflags.iter().cloned());
        self.libraries.extend(other.libraries.iter().cloned());
    }
}

/// A validated project descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    name: String,
    version: Option<String>,
    plans: BTreeMap<PlanName, Plan>,
    targets: BTreeMap<String, TargetSpec>,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    project_name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    build: Option<RawPlan>,
    #[serde(default)]
    test: Option<RawPlan>,
    #[serde(default)]
    targets: Option<BTreeMap<String, RawTarget>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlan {
    #[serde(default)]
    bits: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    cflags: Option<Vec<String>>,
    #[serde(default)]
    ldflags: Option<Vec<String>>,
    #[serde(default)]
    libraries: Option<Vec<String>>,
}

impl RawPlan {
    fn into_plan(self) -> Result<Plan, BitIdError> {
        let mut plan = Plan {
            cflags: self.cflags.unwrap_or_default(),
            ldflags: self.ldflags.unwrap_or_default(),
            libraries: self.libraries.unwrap_or_default(),
            ..Plan::default()
        };

        for (name, version) in self.bits.unwrap_or_default() {
            // Unquoted YAML versions such as `1.0` arrive as numbers.
            let version = match version {
                Value::String(s) => s,
                other => other.to_string(),
            };
            plan.declare(BitId::new(name, version)?);
        }

        Ok(plan)
    }
}

impl Descriptor {
    /// Parse and validate a YAML document.
    pub fn parse(contents: &str) -> Result<Self, DescriptorError> {
        let document: Value = serde_yaml::from_str(contents)?;
        Self::from_value(document)
    }

    /// Validate an already-parsed document and build the model from it.
    pub fn from_value(document: Value) -> Result<Self, DescriptorError> {
        schema::validate(&document)?;

        let raw: RawDescriptor = serde_json::from_value(document)?;
        // The name becomes the artifact file under build/.
        validate_bit_name(&raw.project_name)?;

        let mut plans = BTreeMap::new();
        for (name, raw_plan) in [(PlanName::Build, raw.build), (PlanName::Test, raw.test)] {
            if let Some(raw_plan) = raw_plan {
                plans.insert(name, raw_plan.into_plan()?);
            }
        }

        let mut targets = BTreeMap::new();
        for (name, raw_target) in raw.targets.unwrap_or_default() {
            let spec = raw_target.into_spec(&name)?;
            targets.insert(name, spec);
        }

        Ok(Descriptor {
            name: raw.project_name,
            version: raw.version,
            plans,
            targets,
        })
    }

    /// The project name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The project version, if declared.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The plan for `name`; an undeclared plan is empty.
    pub fn plan(&self, name: PlanName) -> Plan {
        self.plans.get(&name).cloned().unwrap_or_default()
    }

    /// Merge several plans in the given order (later plans win conflicts).
    pub fn merged_plan(&self, names: &[PlanName]) -> Plan {
        let mut merged = Plan::default();
        for name in names {
            if let Some(plan) = self.plans.get(name) {
                merged.merge(plan);
            }
        }
        merged
    }

    /// Declared targets.
    pub fn targets(&self) -> &BTreeMap<String, TargetSpec> {
        &self.targets
    }

    /// Select a target by name, or the default target.
    pub fn select_target(&self, name: Option<&str>) -> Result<ResolvedTarget, TargetError> {
        target::select(&self.targets, name)
    }
}
