// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed `ConfigAdapter` (component H): reads a single static TOML
//! document describing the group/module/instance tree at startup. Supports
//! no live change notifications — `subscribe_changes` only registers the
//! callback for interface symmetry with a real datastore adapter, it never
//! invokes it. Persists pids to a flat JSON file beside the config, for
//! adoption by the next incarnation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Deserialize;

use sv_core::config_adapter::{ChangeCallback, ConfigAdapter, ConfigError};
use sv_core::model::{Group, InputInterface, Instance, Module, OutputInterface};
use sv_core::registry::InstancePath;
use sv_core::Registry;

#[derive(Debug, Deserialize)]
struct ConfigDoc {
    #[serde(default)]
    groups: Vec<GroupDoc>,
}

#[derive(Debug, Deserialize)]
struct GroupDoc {
    name: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    modules: Vec<ModuleDoc>,
}

#[derive(Debug, Deserialize)]
struct ModuleDoc {
    name: String,
    executable: PathBuf,
    #[serde(default)]
    instances: Vec<InstanceDoc>,
}

#[derive(Debug, Deserialize)]
struct InstanceDoc {
    name: String,
    argv: Vec<String>,
    #[serde(default)]
    enabled: bool,
    #[serde(default = "default_max_restarts")]
    max_restarts_per_minute: u32,
    #[serde(default)]
    input_interfaces: Vec<InterfaceDoc>,
    #[serde(default)]
    output_interfaces: Vec<InterfaceDoc>,
}

#[derive(Debug, Deserialize)]
struct InterfaceDoc {
    id: String,
}

fn default_true() -> bool {
    true
}

fn default_max_restarts() -> u32 {
    10
}

/// Reads `config_path` once at construction; pid persistence accumulates in
/// memory and is flushed to `<config_path>.pids.json` on `commit()`.
pub struct FileConfigAdapter {
    config_path: PathBuf,
    pending_pids: Mutex<HashMap<InstancePath, i32>>,
}

impl FileConfigAdapter {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            pending_pids: Mutex::new(HashMap::new()),
        }
    }

    fn pid_file(&self) -> PathBuf {
        let mut name = self.config_path.as_os_str().to_owned();
        name.push(".pids.json");
        PathBuf::from(name)
    }
}

impl ConfigAdapter for FileConfigAdapter {
    fn load_initial(&self) -> Result<Registry, ConfigError> {
        let content = std::fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", self.config_path.display())))?;
        let doc: ConfigDoc = toml::from_str(&content).map_err(|e| ConfigError::Load(e.to_string()))?;

        let mut registry = Registry::new();
        for group_doc in doc.groups {
            let mut group = Group::new(group_doc.name, group_doc.enabled);
            for module_doc in group_doc.modules {
                let mut module = Module::new(module_doc.name.clone(), module_doc.executable);
                for instance_doc in module_doc.instances {
                    let mut instance = Instance::new(instance_doc.name.clone(), instance_doc.argv);
                    instance.enabled = instance_doc.enabled;
                    instance.max_restarts_per_minute = instance_doc.max_restarts_per_minute;
                    instance.input_interfaces = instance_doc
                        .input_interfaces
                        .into_iter()
                        .map(|i| InputInterface::new(i.id))
                        .collect();
                    instance.output_interfaces = instance_doc
                        .output_interfaces
                        .into_iter()
                        .map(|i| OutputInterface::new(i.id))
                        .collect();
                    module.instances.insert(instance_doc.name, instance);
                }
                group.modules.insert(module_doc.name, module);
            }
            registry
                .insert_group(group)
                .map_err(|e| ConfigError::Load(e.to_string()))?;
        }
        Ok(registry)
    }

    fn subscribe_changes(&self, _cb: ChangeCallback) -> Result<(), ConfigError> {
        Ok(())
    }

    fn persist_pid(&self, path: &InstancePath, pid: i32) -> Result<(), ConfigError> {
        self.pending_pids.lock().insert(path.clone(), pid);
        Ok(())
    }

    fn commit(&self) -> Result<(), ConfigError> {
        let pids = self.pending_pids.lock();
        let entries: HashMap<String, i32> =
            pids.iter().map(|(path, pid)| (path.to_string(), *pid)).collect();
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| ConfigError::Commit(e.to_string()))?;

        let tmp_path = tmp_sibling(&self.pid_file());
        std::fs::write(&tmp_path, json).map_err(|e| ConfigError::Commit(e.to_string()))?;
        std::fs::rename(&tmp_path, self.pid_file()).map_err(|e| ConfigError::Commit(e.to_string()))?;
        Ok(())
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
#[path = "file_config_tests.rs"]
mod tests;
