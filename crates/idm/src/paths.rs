//! Output path expansion
//!
//! Build steps declare their outputs as patterns; a pattern holding a cluster
//! placeholder stands for one path per matching cluster.

use indexmap::IndexSet;

use crate::ast::Idl;

/// Every cluster the document declares
pub const DEFINED_CLUSTER_NAME: &str = "{{defined_cluster_name}}";

/// Every cluster some endpoint instantiates as a server
pub const SERVER_CLUSTER_NAME: &str = "{{server_cluster_name}}";

/// Declared cluster names, in declaration order, each once
pub fn defined_cluster_names(idl: &Idl) -> IndexSet<&str> {
    idl.clusters.iter().map(|c| c.name.as_str()).collect()
}

/// Server cluster names across all endpoints, in first-use order, each once
pub fn server_cluster_names(idl: &Idl) -> IndexSet<&str> {
    idl.endpoints
        .iter()
        .flat_map(|e| e.server_clusters.iter())
        .map(|c| c.name.as_str())
        .collect()
}

/// Iterator over the concrete paths of one pattern
#[derive(Debug, Clone)]
pub struct Expand<'a> {
    pattern: &'a str,
    placeholder: Option<&'static str>,
    names: IndexSet<&'a str>,
    position: usize,
}

impl<'a> Iterator for Expand<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let item = match self.placeholder {
            None if self.position == 0 => Some(self.pattern.to_string()),
            None => None,
            Some(placeholder) => self
                .names
                .get_index(self.position)
                .map(|name| self.pattern.replace(placeholder, name)),
        };
        if item.is_some() {
            self.position += 1;
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = match self.placeholder {
            None => 1,
            Some(_) => self.names.len(),
        };
        let left = total.saturating_sub(self.position);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Expand<'_> {}

/// Expand `pattern` against `idl`
///
/// A pattern without placeholder yields itself once. Each call starts a
/// fresh iteration.
pub fn expand<'a>(idl: &'a Idl, pattern: &'a str) -> Expand<'a> {
    let (placeholder, names) = if pattern.contains(DEFINED_CLUSTER_NAME) {
        (Some(DEFINED_CLUSTER_NAME), defined_cluster_names(idl))
    } else if pattern.contains(SERVER_CLUSTER_NAME) {
        (Some(SERVER_CLUSTER_NAME), server_cluster_names(idl))
    } else {
        (None, IndexSet::new())
    };

    Expand {
        pattern,
        placeholder,
        names,
        position: 0,
    }
}
