//! Shader program sources and the per-renderer program set
//!
//! Programs are opaque, externally authored kernels. Each one declares the
//! uniform slots it exposes; slot order is the location order the backend
//! packs uniform values in. Building a [`ProgramSet`] checks the library
//! against a variant's capability descriptor before any program is created.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::render::backend::{GpuBackend, ProgramId, UniformLocation};
use crate::render::variant::{Capabilities, RendererKind, Stage};

/// Source and interface of one stage program
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramSource {
    /// WGSL source. Empty when `path` names a file to load instead.
    #[serde(default)]
    pub source: String,
    /// File holding the source, relative to the library file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Uniform slot names in location order
    #[serde(default)]
    pub uniforms: Vec<String>,
}

impl ProgramSource {
    pub fn new(source: impl Into<String>, uniforms: &[&str]) -> Self {
        Self {
            source: source.into(),
            path: None,
            uniforms: uniforms.iter().map(|u| u.to_string()).collect(),
        }
    }
}

/// All stage programs of all variants, keyed by variant name then stage
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShaderLibrary {
    variants: BTreeMap<String, BTreeMap<Stage, ProgramSource>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a library from JSON. `path` entries stay unresolved.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a library file, reading every `path` entry relative to it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut library = Self::from_json(&std::fs::read_to_string(path)?)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        for stages in library.variants.values_mut() {
            for program in stages.values_mut() {
                if let Some(rel) = program.path.take() {
                    program.source = std::fs::read_to_string(base.join(&rel))?;
                }
            }
        }

        log::info!("Loaded shader library {} ({} variants)", path.display(), library.variants.len());
        Ok(library)
    }

    pub fn insert(&mut self, variant: &str, stage: Stage, source: ProgramSource) {
        self.variants
            .entry(variant.to_string())
            .or_default()
            .insert(stage, source);
    }

    pub fn get(&self, variant: &str, stage: Stage) -> Option<&ProgramSource> {
        self.variants.get(variant).and_then(|stages| stages.get(&stage))
    }

    pub fn contains_variant(&self, variant: &str) -> bool {
        self.variants.contains_key(variant)
    }

    /// Library whose programs declare exactly the uniforms each variant requires
    ///
    /// Used with backends that do not compile source, such as
    /// [`CountingBackend`](crate::render::backend::CountingBackend).
    pub fn interface_only() -> Self {
        let mut library = Self::new();
        for kind in RendererKind::ALL {
            for requirement in kind.capabilities().stages {
                library.insert(
                    kind.name(),
                    requirement.stage,
                    ProgramSource::new("", requirement.uniforms),
                );
            }
        }
        library
    }
}

/// A built program and its resolved uniform slots
#[derive(Debug)]
pub struct Program {
    id: ProgramId,
    uniforms: HashMap<String, UniformLocation>,
}

impl Program {
    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn location(&self, name: &str) -> Result<UniformLocation> {
        self.uniforms
            .get(name)
            .copied()
            .ok_or_else(|| Error::config(format!("program has no uniform '{}'", name)))
    }
}

/// Programs for every stage a renderer runs
#[derive(Debug)]
pub struct ProgramSet {
    programs: HashMap<Stage, Program>,
}

impl ProgramSet {
    /// Validate `library` against the capability descriptor, then build
    ///
    /// Fails with a configuration error if a declared stage has no program or
    /// a program is missing a required uniform. Creation is all-or-nothing.
    pub fn build(
        backend: &mut dyn GpuBackend,
        library: &ShaderLibrary,
        kind: RendererKind,
        caps: &Capabilities,
    ) -> Result<Self> {
        let mut sources = Vec::with_capacity(caps.stages.len());
        for requirement in caps.stages {
            let source = library.get(kind.name(), requirement.stage).ok_or_else(|| {
                Error::config(format!(
                    "no {} program for renderer '{}'",
                    requirement.stage, kind
                ))
            })?;
            for uniform in requirement.uniforms {
                if !source.uniforms.iter().any(|u| u == uniform) {
                    return Err(Error::config(format!(
                        "{} program for renderer '{}' lacks uniform '{}'",
                        requirement.stage, kind, uniform
                    )));
                }
            }
            sources.push((requirement.stage, source));
        }

        let mut programs = HashMap::with_capacity(sources.len());
        for (stage, source) in sources {
            let label = format!("{}_{}", kind, stage);
            match backend.create_program(&label, source) {
                Ok(id) => {
                    let uniforms = source
                        .uniforms
                        .iter()
                        .enumerate()
                        .map(|(i, name)| (name.clone(), UniformLocation(i as u32)))
                        .collect();
                    programs.insert(stage, Program { id, uniforms });
                }
                Err(e) => {
                    for (_, program) in programs.drain() {
                        backend.destroy_program(program.id);
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self { programs })
    }

    pub fn get(&self, stage: Stage) -> Result<&Program> {
        self.programs
            .get(&stage)
            .ok_or_else(|| Error::config(format!("no {} program built", stage)))
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Release every program
    pub fn destroy(self, backend: &mut dyn GpuBackend) {
        for (_, program) in self.programs {
            backend.destroy_program(program.id);
        }
    }
}
