// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance Registry (component A): the in-memory model of groups, modules,
//! and instances, with lookup by name and iteration in configured order.
//!
//! Exposes no policy of its own — every mutation here is driven by the
//! Reconciliation Loop or an External Config Adapter callback, both of
//! which run only while holding the supervisor's config lock (invariant I5).

use indexmap::IndexMap;

use crate::config_adapter::ConfigDelta;
use crate::error::CoreError;
use crate::model::{Group, Instance};

/// Identifies one instance by its position in the Group/Module/Instance tree.
///
/// Used as the key for engine-side-tables (pid index, open socket handles)
/// that must not live inside `Instance` itself, since `Instance` stays plain
/// data with no owned OS resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstancePath {
    pub group: String,
    pub module: String,
    pub instance: String,
}

impl InstancePath {
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
            instance: instance.into(),
        }
    }
}

impl std::fmt::Display for InstancePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.group, self.module, self.instance)
    }
}

/// The full configuration/observation tree: Groups own Modules own Instances.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub groups: IndexMap<String, Group>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_group(&mut self, group: Group) -> Result<(), CoreError> {
        if self.groups.contains_key(&group.name) {
            return Err(CoreError::DuplicateGroup(group.name));
        }
        self.groups.insert(group.name.clone(), group);
        Ok(())
    }

    pub fn remove_group(&mut self, name: &str) -> Option<Group> {
        self.groups.shift_remove(name)
    }

    pub fn get_instance(&self, path: &InstancePath) -> Option<&Instance> {
        self.groups
            .get(&path.group)?
            .modules
            .get(&path.module)?
            .instances
            .get(&path.instance)
    }

    pub fn get_instance_mut(&mut self, path: &InstancePath) -> Option<&mut Instance> {
        self.groups
            .get_mut(&path.group)?
            .modules
            .get_mut(&path.module)?
            .instances
            .get_mut(&path.instance)
    }

    pub fn group_enabled(&self, group: &str) -> bool {
        self.groups.get(group).is_some_and(|g| g.enabled)
    }

    /// The executable path configured for `path`'s owning module, if any.
    pub fn executable_for(&self, path: &InstancePath) -> Option<&std::path::Path> {
        self.groups
            .get(&path.group)?
            .modules
            .get(&path.module)
            .map(|m| m.executable.as_path())
    }

    /// Visit every instance in configured order, read-only, together with its
    /// path and whether its owning group is enabled.
    pub fn for_each_instance<F>(&self, mut f: F)
    where
        F: FnMut(&InstancePath, bool, &Instance),
    {
        for group in self.groups.values() {
            for module in group.modules.values() {
                for instance in module.instances.values() {
                    let path = InstancePath::new(&group.name, &module.name, &instance.name);
                    f(&path, group.enabled, instance);
                }
            }
        }
    }

    /// Visit every instance in configured order, mutably.
    pub fn for_each_instance_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&InstancePath, bool, &mut Instance),
    {
        for group in self.groups.values_mut() {
            let group_enabled = group.enabled;
            let group_name = group.name.clone();
            for module in group.modules.values_mut() {
                let module_name = module.name.clone();
                for instance in module.instances.values_mut() {
                    let path = InstancePath::new(&group_name, &module_name, &instance.name);
                    f(&path, group_enabled, instance);
                }
            }
        }
    }

    /// Visit every instance mutably, also yielding its owning module's
    /// executable path, for callers (the Process Manager's Start) that need
    /// both in the same traversal without re-borrowing the registry.
    pub fn for_each_instance_mut_with_executable<F>(&mut self, mut f: F)
    where
        F: FnMut(&InstancePath, bool, &mut Instance, &std::path::Path),
    {
        for group in self.groups.values_mut() {
            let group_enabled = group.enabled;
            let group_name = group.name.clone();
            for module in group.modules.values_mut() {
                let module_name = module.name.clone();
                let executable = module.executable.clone();
                for instance in module.instances.values_mut() {
                    let path = InstancePath::new(&group_name, &module_name, &instance.name);
                    f(&path, group_enabled, instance, &executable);
                }
            }
        }
    }

    /// Applies one delta reported by an external config adapter's change
    /// callback. Invariant I5: callers must hold the same lock the
    /// Reconciliation Loop holds during a tick, so this never interleaves
    /// with a tick's own mutations.
    pub fn apply_delta(&mut self, delta: ConfigDelta) {
        match delta {
            ConfigDelta::UpsertGroup(group) => {
                self.groups.insert(group.name.clone(), group);
            }
            ConfigDelta::RemoveGroup(name) => {
                self.groups.shift_remove(&name);
            }
            ConfigDelta::UpsertInstance {
                group,
                module,
                instance,
            } => {
                if let Some(module) = self
                    .groups
                    .get_mut(&group)
                    .and_then(|g| g.modules.get_mut(&module))
                {
                    module.instances.insert(instance.name.clone(), instance);
                }
            }
            ConfigDelta::RemoveInstance(path) => {
                if let Some(module) = self
                    .groups
                    .get_mut(&path.group)
                    .and_then(|g| g.modules.get_mut(&path.module))
                {
                    module.instances.shift_remove(&path.instance);
                }
            }
        }
    }

    pub fn instance_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(|g| g.modules.values())
            .map(|m| m.instances.len())
            .sum()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
