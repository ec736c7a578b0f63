//! Depth-first installation of a bit dependency graph.

use std::collections::{BTreeMap, HashSet};

use crate::core::{BitId, Plan};
use crate::resolver::errors::InstallError;
use crate::sources::{BitStore, InstalledBit, Registry};

/// Result of an installation run.
#[derive(Debug, Default)]
pub struct InstalledSet {
    /// Every bit reached, keyed by name.
    pub bits: BTreeMap<String, InstalledBit>,
    /// Bits that had to be downloaded, in fetch order.
    pub fetched: Vec<BitId>,
}

impl InstalledSet {
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

/// Installs bits and their dependencies into a [`BitStore`].
///
/// Each `name:version` is visited at most once per installer. When the
/// graph asks for the same name at two versions, the one reached last is
/// what ends up installed.
pub struct BitInstaller<'a> {
    registry: &'a dyn Registry,
    store: &'a BitStore,
    visited: HashSet<BitId>,
    installed: InstalledSet,
}

impl<'a> BitInstaller<'a> {
    pub fn new(registry: &'a dyn Registry, store: &'a BitStore) -> Self {
        BitInstaller {
            registry,
            store,
            visited: HashSet::new(),
            installed: InstalledSet::default(),
        }
    }

    /// Install every bit a plan declares, with their dependencies.
    pub fn install_plan(mut self, plan: &Plan) -> Result<InstalledSet, InstallError> {
        self.install_all(plan.bit_ids().cloned().collect())?;
        Ok(self.installed)
    }

    /// Install a single bit and its dependencies.
    pub fn install_bit(mut self, bit: BitId) -> Result<InstalledSet, InstallError> {
        self.install_all(vec![bit])?;
        Ok(self.installed)
    }

    fn install_all(&mut self, roots: Vec<BitId>) -> Result<(), InstallError> {
        let mut stack = roots;
        stack.reverse();

        while let Some(bit) = stack.pop() {
            if !self.visited.insert(bit.clone()) {
                continue;
            }

            if let Some(previous) = self.installed.bits.get(bit.name()) {
                tracing::warn!(
                    "bit `{}` is required at {} and {}; installing {}",
                    bit.name(),
                    previous.id.version(),
                    bit.version(),
                    bit.version()
                );
            }

            let installed = self.install_one(&bit)?;

            let deps = self.store.dependencies(&installed)?;
            for dep in deps.into_iter().rev() {
                if !self.visited.contains(&dep) {
                    stack.push(dep);
                }
            }

            self.installed
                .bits
                .insert(bit.name().to_string(), installed);
        }

        Ok(())
    }

    fn install_one(&mut self, bit: &BitId) -> Result<InstalledBit, InstallError> {
        if self.store.is_installed(bit) {
            if let Some(installed) = self.store.get(bit.name()) {
                tracing::debug!("bit {} already installed", bit);
                return Ok(installed);
            }
        }

        tracing::info!("fetching {} from {}", bit, self.registry.endpoint());
        let archive = self.registry.fetch(bit)?;
        let installed = self.store.install(bit, &archive)?;
        self.installed.fetched.push(bit.clone());

        Ok(installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FetchError;
    use crate::test_support::{bit_archive, FakeRegistry};
    use tempfile::TempDir;

    fn bit(s: &str) -> BitId {
        s.parse().unwrap()
    }

    fn plan(bits: &[&str]) -> Plan {
        let mut plan = Plan::default();
        for b in bits {
            plan.declare(bit(b));
        }
        plan
    }

    #[test]
    fn test_installs_declared_bits() {
        let tmp = TempDir::new().unwrap();
        let store = BitStore::new(tmp.path().join("bits"));
        let registry = FakeRegistry::new()
            .with_bit("cest:1.0", bit_archive(&[("include/cest.h", "")]))
            .with_bit("fmt:10.0", bit_archive(&[("include/fmt.h", "")]));

        let set = BitInstaller::new(&registry, &store)
            .install_plan(&plan(&["cest:1.0", "fmt:10.0"]))
            .unwrap();

        assert_eq!(set.len(), 2);
        assert!(store.is_installed(&bit("cest:1.0")));
        assert!(store.is_installed(&bit("fmt:10.0")));
        assert_eq!(registry.fetch_count(), 2);
    }

    #[test]
    fn test_second_install_fetches_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = BitStore::new(tmp.path().join("bits"));
        let registry =
            FakeRegistry::new().with_bit("cest:1.0", bit_archive(&[("include/cest.h", "")]));
        let declared = plan(&["cest:1.0"]);

        BitInstaller::new(&registry, &store)
            .install_plan(&declared)
            .unwrap();
        let second = BitInstaller::new(&registry, &store)
            .install_plan(&declared)
            .unwrap();

        assert_eq!(registry.fetch_count(), 1);
        assert!(second.fetched.is_empty());
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_installs_transitive_dependencies() {
        let tmp = TempDir::new().unwrap();
        let store = BitStore::new(tmp.path().join("bits"));
        let registry = FakeRegistry::new()
            .with_bit(
                "app-kit:1.0",
                bit_archive(&[(
                    "project.yaml",
                    "project_name: app-kit\nbuild:\n  bits:\n    log: '2.1'\n",
                )]),
            )
            .with_bit("log:2.1", bit_archive(&[("include/log.h", "")]));

        let set = BitInstaller::new(&registry, &store)
            .install_bit(bit("app-kit:1.0"))
            .unwrap();

        assert_eq!(set.fetched, vec![bit("app-kit:1.0"), bit("log:2.1")]);
        assert!(store.is_installed(&bit("log:2.1")));
    }

    #[test]
    fn test_dependency_cycle_terminates() {
        let tmp = TempDir::new().unwrap();
        let store = BitStore::new(tmp.path().join("bits"));
        let registry = FakeRegistry::new()
            .with_bit(
                "a:1",
                bit_archive(&[("project.yaml", "project_name: a\nbuild:\n  bits:\n    b: '1'\n")]),
            )
            .with_bit(
                "b:1",
                bit_archive(&[("project.yaml", "project_name: b\nbuild:\n  bits:\n    a: '1'\n")]),
            );

        let set = BitInstaller::new(&registry, &store)
            .install_bit(bit("a:1"))
            .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(registry.fetch_count(), 2);
    }

    #[test]
    fn test_missing_bit_installs_nothing_for_it() {
        let tmp = TempDir::new().unwrap();
        let store = BitStore::new(tmp.path().join("bits"));
        let registry = FakeRegistry::new();

        let err = BitInstaller::new(&registry, &store)
            .install_bit(bit("ghost:1.0"))
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(!store.bit_dir("ghost").exists());
    }

    #[test]
    fn test_network_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        let store = BitStore::new(tmp.path().join("bits"));
        let registry = FakeRegistry::new().failing();

        let err = BitInstaller::new(&registry, &store)
            .install_bit(bit("cest:1.0"))
            .unwrap_err();

        assert!(matches!(err, InstallError::Fetch(FetchError::Network { .. })));
        assert!(!store.bit_dir("cest").exists());
    }

    #[test]
    fn test_conflicting_versions_last_reached_wins() {
        let tmp = TempDir::new().unwrap();
        let store = BitStore::new(tmp.path().join("bits"));
        let registry = FakeRegistry::new()
            .with_bit("log:1.0", bit_archive(&[("v1.h", "")]))
            .with_bit("log:2.0", bit_archive(&[("v2.h", "")]))
            .with_bit(
                "net:1.0",
                bit_archive(&[("project.yaml", "project_name: net\nbuild:\n  bits:\n    log: '2.0'\n")]),
            );

        let set = BitInstaller::new(&registry, &store)
            .install_plan(&plan(&["log:1.0", "net:1.0"]))
            .unwrap();

        assert_eq!(set.bits["log"].id, bit("log:2.0"));
        assert!(store.is_installed(&bit("log:2.0")));
        assert!(store.bit_dir("log").join("v2.h").exists());
    }
}
