//! Namespace inheritance through `<group>.reference` entries.
//!
//! # Data Flow
//! ```text
//! resolve_references(prefix, wildcard, depth)
//!     → snapshot `<group>.reference = <target>` edges under prefix
//!     → for each edge:
//!         resolve_references(target, no wildcard, depth + 1)
//!         inherit_properties("<target>.", "<group>.")
//!     → rescan entries appended by inheritance (inherited references)
//! ```
//!
//! # Design Decisions
//! - Edges are collected before any mutation; the map is never walked
//!   while it grows
//! - Explicit keys always win: inheritance only appends missing keys
//! - Depth past the recursion limit fails that branch only; sibling edges
//!   still resolve and the first error is returned at the end
//! - Rescan rounds are bounded by the same limit so self-extending
//!   reference chains terminate

use crate::error::{PropertyError, Result};
use crate::map::{PropertyMap, Value};
use crate::observability::metrics;

/// Suffix marking a reference entry.
pub const REFERENCE_SUFFIX: &str = ".reference";

/// A `<group>.reference = <target>` entry, captured before mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReferenceEdge {
    target: String,
    from: String,
    to: String,
}

impl PropertyMap {
    /// Resolve every reference under `prefix`.
    ///
    /// With `wildcard`, references nested below the prefix
    /// (`<prefix>a.b.reference`) are followed as well; otherwise only
    /// `<prefix>.reference` is.
    pub fn resolve_references(&mut self, prefix: &str, wildcard: bool, depth: usize) -> Result<()> {
        let limit = self.limits().recursion_limit;
        if depth > limit {
            tracing::error!(limit, prefix, "Recursion limit for references reached");
            metrics::record_reference("recursion_limit");
            return Err(PropertyError::RecursionLimit {
                limit,
                prefix: prefix.to_string(),
            });
        }

        tracing::debug!(prefix, wildcard, depth, "Checking for references");

        let mut first_error = None;
        let mut start = 0;
        let mut rounds = 0;
        while start < self.len() {
            let end = self.len();
            let edges = self.reference_edges(prefix, wildcard, start, end);
            start = end;
            if edges.is_empty() {
                continue;
            }

            if rounds == limit {
                tracing::error!(
                    limit,
                    prefix,
                    "Inherited references kept extending the map, giving up"
                );
                first_error.get_or_insert(PropertyError::RecursionLimit {
                    limit,
                    prefix: prefix.to_string(),
                });
                break;
            }
            rounds += 1;

            for edge in edges {
                if let Err(e) = self.follow_edge(&edge, depth) {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn reference_edges(
        &self,
        prefix: &str,
        wildcard: bool,
        start: usize,
        end: usize,
    ) -> Vec<ReferenceEdge> {
        self.iter()
            .skip(start)
            .take(end - start)
            .filter_map(|(name, value)| {
                let target = self.text(value)?;
                if target.is_empty() || !name.starts_with(prefix) {
                    return None;
                }
                let remain = name.len() - prefix.len();
                let nested = wildcard && remain > REFERENCE_SUFFIX.len();
                if remain != REFERENCE_SUFFIX.len() && !nested {
                    return None;
                }
                let group = name.strip_suffix(REFERENCE_SUFFIX)?;
                Some(ReferenceEdge {
                    target: target.to_string(),
                    from: format!("{}.", target),
                    to: format!("{}.", group),
                })
            })
            .collect()
    }

    fn follow_edge(&mut self, edge: &ReferenceEdge, depth: usize) -> Result<()> {
        self.resolve_references(&edge.target, false, depth + 1)?;
        tracing::debug!(from = %edge.from, to = %edge.to, "Copying values");
        self.inherit_properties(&edge.from, &edge.to)
    }

    /// Copy every `from*` entry to the matching `to*` key, unless that key
    /// already exists.
    ///
    /// Fails when nothing starts with `from`.
    pub fn inherit_properties(&mut self, from: &str, to: &str) -> Result<()> {
        let inherited: Vec<(String, Value)> = self
            .iter()
            .filter(|(name, _)| name.starts_with(from))
            .map(|(name, value)| (format!("{}{}", to, &name[from.len()..]), value.clone()))
            .collect();

        if inherited.is_empty() {
            tracing::error!(reference = from, "Reference not found");
            metrics::record_reference("not_found");
            return Err(PropertyError::ReferenceNotFound(from.to_string()));
        }

        for (key, value) in inherited {
            if self.get_id(&key).is_some() {
                continue;
            }
            if let Err(e) = self.add(&key, value) {
                tracing::error!(key = %key, error = %e, "Error when adding attribute");
                return Err(e);
            }
        }

        metrics::record_reference("inherited");
        Ok(())
    }
}
