//! Archive planning: least common ancestor, entry paths, and archive name.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::debug;

use attachhub_core::error::AppError;
use attachhub_core::result::AppResult;
use attachhub_core::types::NodeId;
use attachhub_database::AttachmentRepository;
use attachhub_entity::attachment::{ArchiveEntry, ArchivePlan, AttachmentNode, NodeKind};

use super::dedup_ids;
use super::path::{PathResolver, join_segments};
use super::tree::group_by_parent;

/// Computes which nodes go into an archive and under which names.
#[derive(Debug, Clone)]
pub struct ArchivePlanner {
    repo: Arc<dyn AttachmentRepository>,
    resolver: PathResolver,
}

impl ArchivePlanner {
    /// Creates a new archive planner.
    pub fn new(repo: Arc<dyn AttachmentRepository>) -> Self {
        let resolver = PathResolver::new(repo.clone());
        Self { repo, resolver }
    }

    /// Plan an archive of the requested nodes and everything below them.
    ///
    /// Ids that do not exist are ignored; if none exist the plan is empty.
    /// A requested id below another requested id is written once, as part
    /// of its ancestor's walk.
    pub async fn plan(&self, ids: &[NodeId]) -> AppResult<ArchivePlan> {
        let mut chains = Vec::new();
        for id in dedup_ids(ids) {
            match self.resolver.ancestry(&id).await? {
                Some(chain) => chains.push(chain),
                None => debug!(id = %id, "Skipping missing attachment in archive request"),
            }
        }
        if chains.is_empty() {
            return Ok(ArchivePlan::empty());
        }

        let origin = least_common_ancestor(&chains);
        let requested: HashSet<NodeId> = chains.iter().filter_map(|c| terminus(c)).cloned().collect();

        let mut entries = Vec::new();
        for chain in &chains {
            let Some((target, ancestors)) = chain.split_last() else {
                continue;
            };
            if ancestors.iter().any(|a| requested.contains(&a.id)) {
                continue;
            }

            let zip_root = match &origin {
                Some(origin_id) => {
                    let start = chain
                        .iter()
                        .position(|n| &n.id == origin_id)
                        .ok_or_else(|| {
                            AppError::internal(format!(
                                "Common ancestor {origin_id} is not on the chain of {}",
                                target.id
                            ))
                        })?;
                    chain[start..]
                        .iter()
                        .map(|n| n.name.as_str())
                        .collect::<Vec<_>>()
                        .join("/")
                }
                None => target.name.clone(),
            };
            let physical_root = join_segments(chain);

            entries.push(entry(target, &origin, physical_root.clone(), zip_root.clone()));
            self.push_descendants(target, &origin, physical_root, zip_root, &mut entries)
                .await?;
        }

        entries.sort_by(|a, b| a.zip_path.cmp(&b.zip_path));
        let archive_name = archive_name(&entries);
        debug!(
            requested = ids.len(),
            entries = entries.len(),
            origin = ?origin,
            "Planned archive"
        );
        Ok(ArchivePlan {
            entries,
            archive_name,
        })
    }

    /// Append an entry for every node below `top`, walking level by level.
    async fn push_descendants(
        &self,
        top: &AttachmentNode,
        origin: &Option<NodeId>,
        physical_root: String,
        zip_root: String,
        entries: &mut Vec<ArchiveEntry>,
    ) -> AppResult<()> {
        let mut by_parent = group_by_parent(self.repo.find_children_and_descendants(&top.id).await?);
        let mut queue = VecDeque::from([(top.id.clone(), physical_root, zip_root)]);
        while let Some((parent, physical, zip)) = queue.pop_front() {
            for child in by_parent.remove(&parent).unwrap_or_default() {
                let child_physical = format!("{physical}/{}", child.path_segment);
                let child_zip = format!("{zip}/{}", child.name);
                entries.push(entry(&child, origin, child_physical.clone(), child_zip.clone()));
                queue.push_back((child.id, child_physical, child_zip));
            }
        }
        Ok(())
    }
}

fn terminus(chain: &[AttachmentNode]) -> Option<&NodeId> {
    chain.last().map(|n| &n.id)
}

fn entry(
    node: &AttachmentNode,
    origin: &Option<NodeId>,
    physical_path: String,
    zip_path: String,
) -> ArchiveEntry {
    ArchiveEntry {
        terminus_id: node.id.clone(),
        origin_id: origin.clone(),
        physical_path,
        zip_path,
        kind: node.kind.clone(),
    }
}

/// The deepest node shared by every chain that is not passed through.
///
/// Descends from a virtual root above all trees. A node stops the descent
/// when it is itself requested or when the chains below it use anything
/// but exactly one child. The virtual root stopping means there is no
/// common ancestor.
pub(crate) fn least_common_ancestor(chains: &[Vec<AttachmentNode>]) -> Option<NodeId> {
    let mut branches: HashMap<Option<&NodeId>, HashSet<&NodeId>> = HashMap::new();
    let mut requested: HashSet<&NodeId> = HashSet::new();
    for chain in chains {
        let mut parent: Option<&NodeId> = None;
        for node in chain {
            branches.entry(parent).or_default().insert(&node.id);
            parent = Some(&node.id);
        }
        requested.extend(parent);
    }

    let mut cursor: Option<&NodeId> = None;
    loop {
        if cursor.is_some_and(|id| requested.contains(id)) {
            return cursor.cloned();
        }
        let Some(children) = branches.get(&cursor) else {
            return cursor.cloned();
        };
        if children.len() != 1 {
            return cursor.cloned();
        }
        cursor = children.iter().next().copied();
    }
}

/// The default file name for an archive of `entries`.
pub(crate) fn archive_name(entries: &[ArchiveEntry]) -> Option<String> {
    let first = entries.first()?;
    if first.origin_id.is_none() {
        return Some("root.zip".to_string());
    }
    let top = first.top_segment();
    Some(match (&first.kind, entries.len()) {
        (NodeKind::File(ext), 1) => format!("{top}.{ext}.zip"),
        _ => format!("{top}.zip"),
    })
}
