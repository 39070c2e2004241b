//! Build request assembly.
//!
//! Turns user parameters into a single [`BuildRequest`]. Nothing here
//! writes to the terminal or talks to the build service.

use std::path::Path;

use crate::archive;
use crate::env::{EnvResolver, ProcessEnv};
use crate::error::{BuildError, Result};
use crate::grpc::pb;
use crate::loader::{HttpSpecLoader, SpecLoader};
use crate::spec::BuildSpec;

/// Tag used when the caller supplies none.
pub const DEFAULT_TAG: &str = "latest";

/// How the build context is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Multi-stage spec file
    Spec,
    /// Directory packed into a tar stream
    RawArchive,
}

/// Build context carried by a request.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildPayload {
    Spec(BuildSpec),
    Archive(Vec<u8>),
}

impl BuildPayload {
    pub fn mode(&self) -> BuildMode {
        match self {
            BuildPayload::Spec(_) => BuildMode::Spec,
            BuildPayload::Archive(_) => BuildMode::RawArchive,
        }
    }
}

/// User-supplied build parameters.
#[derive(Debug, Clone, Default)]
pub struct BuildParams {
    /// Spec location (path or URL), or the directory in raw mode
    pub source: Option<String>,
    pub name: String,
    pub tags: Vec<String>,
    pub user: String,
    pub uid: i32,
    pub raw: bool,
}

/// A fully assembled build request, consumed once by submission.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    name: String,
    tags: Vec<String>,
    user: String,
    uid: i32,
    payload: BuildPayload,
}

impl BuildRequest {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn uid(&self) -> i32 {
        self.uid
    }

    pub fn mode(&self) -> BuildMode {
        self.payload.mode()
    }

    pub fn payload(&self) -> &BuildPayload {
        &self.payload
    }

    /// The spec payload, if this is a spec-mode request.
    pub fn spec(&self) -> Option<&BuildSpec> {
        match &self.payload {
            BuildPayload::Spec(spec) => Some(spec),
            BuildPayload::Archive(_) => None,
        }
    }

    /// The archive payload, if this is a raw-mode request.
    pub fn archive(&self) -> Option<&[u8]> {
        match &self.payload {
            BuildPayload::Archive(data) => Some(data),
            BuildPayload::Spec(_) => None,
        }
    }
}

impl From<BuildRequest> for pb::BuildImageOptions {
    fn from(request: BuildRequest) -> Self {
        let (builds, tar) = match request.payload {
            BuildPayload::Spec(spec) => (Some(spec.into()), Vec::new()),
            BuildPayload::Archive(data) => (None, data),
        };
        pb::BuildImageOptions {
            name: request.name,
            user: request.user,
            uid: request.uid,
            tags: request.tags,
            builds,
            tar,
        }
    }
}

/// Assembles build requests using pluggable spec loading and env resolution.
pub struct RequestBuilder {
    loader: Box<dyn SpecLoader>,
    env: Box<dyn EnvResolver + Send + Sync>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(Box::new(HttpSpecLoader::new()), Box::new(ProcessEnv))
    }
}

impl RequestBuilder {
    pub fn new(loader: Box<dyn SpecLoader>, env: Box<dyn EnvResolver + Send + Sync>) -> Self {
        Self { loader, env }
    }

    /// Validate parameters and load the build context.
    pub async fn build(&self, params: BuildParams) -> Result<BuildRequest> {
        let source = params
            .source
            .filter(|s| !s.is_empty())
            .ok_or(BuildError::MissingSpec)?;

        if params.name.is_empty() {
            return Err(BuildError::MissingName);
        }

        let payload = if params.raw {
            BuildPayload::Archive(archive::create_tar_stream(Path::new(&source))?)
        } else {
            tracing::debug!(spec = %source, "Loading build spec");
            let data = self.loader.load(&source).await?;
            let mut spec = BuildSpec::from_yaml(&data)?;
            spec.resolve_envs(self.env.as_ref());
            BuildPayload::Spec(spec)
        };

        let tags = if params.tags.is_empty() {
            vec![DEFAULT_TAG.to_string()]
        } else {
            params.tags
        };

        tracing::debug!(
            name = %params.name,
            tags = ?tags,
            mode = ?payload.mode(),
            "Assembled build request"
        );

        Ok(BuildRequest {
            name: params.name,
            tags,
            user: params.user,
            uid: params.uid,
            payload,
        })
    }
}
