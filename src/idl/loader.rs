//! Loading IDL files together with their imports.

use super::ast::Idl;
use super::errors::SyntaxError;
use super::parser::IdlParser;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },

    #[error("import '{import}' in {from} not found")]
    Missing { import: String, from: PathBuf },

    #[error("import cycle: {}", display_chain(.chain))]
    Cycle { chain: Vec<PathBuf> },

    #[error("duplicate namespace '{namespace}' in {path}: already used in {first}")]
    DuplicateNamespace {
        namespace: String,
        path: PathBuf,
        first: PathBuf,
    },
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Loads an IDL file and every file it imports, merged into one [`Idl`].
///
/// Imports resolve relative to the importing file. Each file is parsed once
/// even when imported from several places; the importing file's definitions
/// come before those of its imports. A namespace belongs to the one file
/// that declares it.
#[derive(Debug, Default)]
pub struct IdlLoader {
    parser: IdlParser,
}

#[derive(Default)]
struct LoadState {
    stack: Vec<PathBuf>,
    loaded: HashSet<PathBuf>,
    namespace_owners: HashMap<String, PathBuf>,
    merged: Idl,
}

impl IdlLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<Idl, ImportError> {
        let path = path.as_ref();
        let canonical = fs::canonicalize(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut state = LoadState::default();
        self.load_file(canonical, &mut state)?;
        log::info!(
            "Loaded {} IDL file(s) starting at {}",
            state.loaded.len(),
            path.display()
        );
        Ok(state.merged)
    }

    /// Loads IDL text that did not come from a file; its imports resolve
    /// relative to `base_dir`.
    pub fn load_source(&self, text: &str, base_dir: impl AsRef<Path>) -> Result<Idl, ImportError> {
        let origin = base_dir.as_ref().join("<source>");
        let idl = self.parser.parse(text).map_err(|source| ImportError::Syntax {
            path: origin.clone(),
            source,
        })?;
        let mut state = LoadState::default();
        self.merge(idl, &origin, &mut state)?;
        Ok(state.merged)
    }

    fn load_file(&self, path: PathBuf, state: &mut LoadState) -> Result<(), ImportError> {
        if let Some(idx) = state.stack.iter().position(|p| *p == path) {
            let mut chain = state.stack[idx..].to_vec();
            chain.push(path);
            return Err(ImportError::Cycle { chain });
        }
        if !state.loaded.insert(path.clone()) {
            log::debug!("Skipping already loaded {}", path.display());
            return Ok(());
        }

        let text = fs::read_to_string(&path).map_err(|source| ImportError::Io {
            path: path.clone(),
            source,
        })?;
        let idl = self.parser.parse(&text).map_err(|source| ImportError::Syntax {
            path: path.clone(),
            source,
        })?;
        self.merge(idl, &path, state)
    }

    fn merge(&self, idl: Idl, origin: &Path, state: &mut LoadState) -> Result<(), ImportError> {
        let Idl {
            namespaces,
            imports,
            interfaces,
            structs,
            enums,
        } = idl;

        for ns in namespaces {
            match state.namespace_owners.get(&ns) {
                Some(first) if first != origin => {
                    return Err(ImportError::DuplicateNamespace {
                        namespace: ns,
                        path: origin.to_path_buf(),
                        first: first.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    state.namespace_owners.insert(ns.clone(), origin.to_path_buf());
                    state.merged.namespaces.push(ns);
                }
            }
        }
        state.merged.interfaces.extend(interfaces);
        state.merged.structs.extend(structs);
        state.merged.enums.extend(enums);

        let base = origin.parent().unwrap_or_else(|| Path::new("."));
        state.stack.push(origin.to_path_buf());
        for import in imports {
            let candidate = base.join(&import);
            let resolved = fs::canonicalize(&candidate).map_err(|_| ImportError::Missing {
                import: import.clone(),
                from: origin.to_path_buf(),
            })?;
            self.load_file(resolved, state)?;
        }
        state.stack.pop();
        Ok(())
    }
}
