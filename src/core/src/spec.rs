//! Multi-stage build spec.
//!
//! The spec is decoded from YAML and otherwise passed to the build service
//! untouched, apart from environment value resolution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::env::EnvResolver;
use crate::error::Result;
use crate::grpc::pb;

/// One build stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSpec {
    pub base: String,
    pub repo: String,
    pub version: String,
    pub dir: String,
    pub submodule: bool,
    pub commands: Vec<String>,
    pub envs: HashMap<String, String>,
    pub args: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub artifacts: HashMap<String, String>,
    pub cache: HashMap<String, String>,
    pub stop_signal: String,
    pub security: bool,
}

/// Ordered stages plus the definition of each one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSpec {
    pub stages: Vec<String>,
    pub builds: HashMap<String, StageSpec>,
}

impl BuildSpec {
    /// Decode a spec from YAML bytes.
    pub fn from_yaml(data: &[u8]) -> Result<Self> {
        Ok(serde_yaml::from_slice(data)?)
    }

    /// Replace every stage's env values with their resolved form.
    pub fn resolve_envs(&mut self, resolver: &dyn EnvResolver) {
        for stage in self.builds.values_mut() {
            for value in stage.envs.values_mut() {
                *value = resolver.resolve(value);
            }
        }
    }
}

impl From<StageSpec> for pb::Build {
    fn from(stage: StageSpec) -> Self {
        pb::Build {
            base: stage.base,
            repo: stage.repo,
            version: stage.version,
            dir: stage.dir,
            submodule: stage.submodule,
            commands: stage.commands,
            envs: stage.envs,
            args: stage.args,
            labels: stage.labels,
            artifacts: stage.artifacts,
            cache: stage.cache,
            stop_signal: stage.stop_signal,
            security: stage.security,
        }
    }
}

impl From<BuildSpec> for pb::Builds {
    fn from(spec: BuildSpec) -> Self {
        pb::Builds {
            stages: spec.stages,
            builds: spec
                .builds
                .into_iter()
                .map(|(name, stage)| (name, stage.into()))
                .collect(),
        }
    }
}
