//! Dependency-layered load batching
//!
//! Kahn-style layering over the module dependency graph: every round takes
//! the modules whose in-set dependencies are already placed, in input order,
//! capped at the batch width. Dependencies outside the requested set count as
//! satisfied.

use crate::domain::entities::ModuleLoadInfo;
use crate::domain::errors::OptimizerError;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Registered load metadata keyed by module name.
pub type ModuleRegistry = HashMap<String, ModuleLoadInfo>;

/// What to do when no remaining module has its dependencies placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleHandling {
    /// Place the first remaining module alone and carry on
    ForceFirst,
    /// Fail with [`OptimizerError::CycleDetected`]
    Reject,
}

fn dependencies_of<'a>(registry: &'a ModuleRegistry, module: &str) -> &'a [String] {
    registry
        .get(module)
        .map(|info| info.dependencies.as_slice())
        .unwrap_or_default()
}

fn dedup_in_order(modules: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    modules
        .iter()
        .filter(|m| seen.insert(m.as_str()))
        .cloned()
        .collect()
}

/// Stable sort by descending priority. Unregistered modules have priority 0.
pub fn optimize_load_order(modules: &[String], registry: &ModuleRegistry) -> Vec<String> {
    let mut ordered = dedup_in_order(modules);
    ordered.sort_by_key(|m| std::cmp::Reverse(registry.get(m).map_or(0, |info| info.priority)));
    ordered
}

/// Split `modules` into batches that can each load concurrently.
///
/// Every module appears in exactly one batch and no batch is wider than
/// `max_batch` (at least 1).
pub fn create_load_batches(
    modules: &[String],
    registry: &ModuleRegistry,
    max_batch: usize,
    cycles: CycleHandling,
) -> Result<Vec<Vec<String>>, OptimizerError> {
    let max_batch = max_batch.max(1);
    let mut remaining = dedup_in_order(modules);
    let requested: HashSet<String> = remaining.iter().cloned().collect();
    let mut placed: HashSet<String> = HashSet::with_capacity(remaining.len());
    let mut batches = Vec::new();

    while !remaining.is_empty() {
        let mut batch: Vec<String> = remaining
            .iter()
            .filter(|m| {
                dependencies_of(registry, m)
                    .iter()
                    .all(|dep| !requested.contains(dep) || placed.contains(dep))
            })
            .take(max_batch)
            .cloned()
            .collect();

        if batch.is_empty() {
            match cycles {
                CycleHandling::Reject => {
                    return Err(OptimizerError::CycleDetected {
                        modules: remaining,
                    });
                }
                CycleHandling::ForceFirst => {
                    warn!(
                        module = %remaining[0],
                        remaining = remaining.len(),
                        "Dependency cycle, forcing load"
                    );
                    batch.push(remaining[0].clone());
                }
            }
        }

        placed.extend(batch.iter().cloned());
        remaining.retain(|m| !placed.contains(m));
        batches.push(batch);
    }

    Ok(batches)
}

/// Check that every dependency is registered or requested, and that the
/// requested set has no cycle.
pub fn validate_dependencies(
    modules: &[String],
    registry: &ModuleRegistry,
) -> Result<(), OptimizerError> {
    let requested: HashSet<&str> = modules.iter().map(String::as_str).collect();
    for module in modules {
        for dep in dependencies_of(registry, module) {
            if !requested.contains(dep.as_str()) && !registry.contains_key(dep) {
                return Err(OptimizerError::MissingDependency {
                    module: module.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    create_load_batches(modules, registry, usize::MAX, CycleHandling::Reject).map(|_| ())
}

/// Transitive dependencies of `module`, dependencies first, ending with
/// `module` itself. Each module appears once even across cycles.
pub fn resolve_dependencies(module: &str, registry: &ModuleRegistry) -> Vec<String> {
    fn visit(
        module: &str,
        registry: &ModuleRegistry,
        visited: &mut HashSet<String>,
        resolved: &mut Vec<String>,
    ) {
        if !visited.insert(module.to_string()) {
            return;
        }
        for dep in dependencies_of(registry, module) {
            visit(dep, registry, visited, resolved);
        }
        resolved.push(module.to_string());
    }

    let mut visited = HashSet::new();
    let mut resolved = Vec::new();
    visit(module, registry, &mut visited, &mut resolved);
    resolved
}
