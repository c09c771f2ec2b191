//! Function catalog of a hosted agent.

use super::ToolHost;
use crate::model::ToolSpec;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeSet;

/// The closed set of function names a session will execute.
///
/// Built from the agent's declarations and checked against the local host,
/// so a model can only reach functions that were both advertised and
/// implemented. Hosted (non-function) tools are left to the server.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    functions: BTreeSet<String>,
}

impl ToolCatalog {
    /// Fails with [`Error::UnsupportedTool`] for a declared function the
    /// host does not implement.
    pub fn new(declarations: &[Value], host: &impl ToolHost) -> Result<Self> {
        let mut functions = BTreeSet::new();
        for spec in declarations.iter().filter_map(ToolSpec::from_declaration) {
            if !host.specs().iter().any(|s| s.name == spec.name) {
                return Err(Error::UnsupportedTool(spec.name));
            }
            functions.insert(spec.name);
        }
        Ok(Self { functions })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(String::as_str)
    }
}
