//! Cascade delete planning.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use attachhub_core::result::AppResult;
use attachhub_core::types::NodeId;
use attachhub_database::AttachmentRepository;
use attachhub_entity::attachment::NodeKind;

use super::dedup_ids;
use super::path::{PathResolver, join_segments};

/// A physical path to remove from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhysicalTarget {
    /// The requested node the path belongs to.
    pub id: NodeId,
    /// Root-relative path.
    pub path: String,
    /// Directory or file removal.
    pub kind: NodeKind,
}

/// What a cascade delete removes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletePlan {
    /// Every record to purge: the requested nodes and all their descendants.
    pub removal_set: Vec<NodeId>,
    /// The minimal set of paths whose removal clears every removed node.
    pub physical_targets: Vec<PhysicalTarget>,
}

impl DeletePlan {
    /// Whether nothing would be removed.
    pub fn is_empty(&self) -> bool {
        self.removal_set.is_empty()
    }
}

/// Computes the records and physical paths a cascade delete removes.
#[derive(Debug, Clone)]
pub struct CascadeDeletePlanner {
    repo: Arc<dyn AttachmentRepository>,
    resolver: PathResolver,
}

impl CascadeDeletePlanner {
    /// Creates a new delete planner.
    pub fn new(repo: Arc<dyn AttachmentRepository>) -> Self {
        let resolver = PathResolver::new(repo.clone());
        Self { repo, resolver }
    }

    /// Plan the removal of `ids` and everything below them.
    ///
    /// Missing ids contribute nothing. A requested id below another
    /// requested id gets no physical target of its own.
    pub async fn plan(&self, ids: &[NodeId]) -> AppResult<DeletePlan> {
        let requested = dedup_ids(ids);
        let requested_set: HashSet<&NodeId> = requested.iter().collect();

        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut plan = DeletePlan::default();
        for id in &requested {
            let Some(chain) = self.resolver.ancestry(id).await? else {
                debug!(id = %id, "Skipping missing attachment in delete request");
                continue;
            };
            let Some((target, ancestors)) = chain.split_last() else {
                continue;
            };

            if seen.insert(target.id.clone()) {
                plan.removal_set.push(target.id.clone());
            }
            for node in self.repo.find_children_and_descendants(id).await? {
                if seen.insert(node.id.clone()) {
                    plan.removal_set.push(node.id);
                }
            }

            if ancestors.iter().any(|a| requested_set.contains(&a.id)) {
                continue;
            }
            plan.physical_targets.push(PhysicalTarget {
                id: target.id.clone(),
                path: join_segments(&chain),
                kind: target.kind.clone(),
            });
        }
        Ok(plan)
    }
}
