//! In-memory graph store with JSON snapshots.
//!
//! All access goes through one mutex, so upserts are atomic
//! read-increment-write operations even with many writers.

use crate::error::{Result, StoreError};
use crate::model::{
    NodeHandle, NodeKey, NodeKind, NodeRecord, RelKind, Relationship, RelationshipRecord,
};
use crate::session::GraphSession;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// On-disk form of the graph. Deleted relationships are not written.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    nodes: &'a [Option<NodeRecord>],
    relationships: Vec<&'a RelationshipRecord>,
}

#[derive(Deserialize)]
struct Snapshot {
    nodes: Vec<Option<NodeRecord>>,
    relationships: Vec<RelationshipRecord>,
}

#[derive(Debug, Default)]
struct GraphState {
    /// Indexed by handle. Deleted nodes leave a `None` so handles stay stable.
    nodes: Vec<Option<NodeRecord>>,
    /// Relationship slots. Deleted relationships leave a `None` until the
    /// next compaction.
    relationships: Vec<Option<RelationshipRecord>>,
    index: HashMap<NodeKey, NodeHandle>,
    /// Live relationship slots by source node, in creation order.
    outgoing: HashMap<NodeHandle, Vec<usize>>,
    /// Live relationship slots by target node, in creation order.
    incoming: HashMap<NodeHandle, Vec<usize>>,
}

impl GraphState {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut state = Self {
            nodes: snapshot.nodes,
            ..Self::default()
        };
        state.rebuild_index();
        for record in snapshot.relationships {
            state.push_relationship(record);
        }
        state
    }

    fn snapshot(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            nodes: &self.nodes,
            relationships: self.live_relationships().collect(),
        }
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (n.key(), NodeHandle(i as u64))))
            .collect();
    }

    fn get(&self, handle: NodeHandle) -> Option<&NodeRecord> {
        self.nodes.get(handle.0 as usize).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(handle.0 as usize).and_then(Option::as_mut)
    }

    fn insert(&mut self, record: NodeRecord) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len() as u64);
        self.index.insert(record.key(), handle);
        self.nodes.push(Some(record));
        handle
    }

    fn require(&self, handle: NodeHandle) -> Result<()> {
        self.get(handle)
            .map(|_| ())
            .ok_or(StoreError::NodeNotFound(handle))
    }

    fn live_relationships(&self) -> impl Iterator<Item = &RelationshipRecord> {
        self.relationships.iter().flatten()
    }

    fn push_relationship(&mut self, record: RelationshipRecord) {
        let slot = self.relationships.len();
        self.outgoing.entry(record.source).or_default().push(slot);
        self.incoming.entry(record.target).or_default().push(slot);
        self.relationships.push(Some(record));
    }

    /// Relationships of `kind` among the given slots.
    fn adjacent(&self, slots: Option<&Vec<usize>>, kind: RelKind) -> Vec<RelationshipRecord> {
        slots
            .into_iter()
            .flatten()
            .filter_map(|&slot| self.relationships[slot].as_ref())
            .filter(|r| r.kind() == kind)
            .cloned()
            .collect()
    }

    fn remove_relationship(&mut self, slot: usize) {
        let Some(record) = self.relationships.get_mut(slot).and_then(Option::take) else {
            return;
        };
        for (adjacency, node) in [
            (&mut self.outgoing, record.source),
            (&mut self.incoming, record.target),
        ] {
            if let Some(slots) = adjacency.get_mut(&node) {
                slots.retain(|&s| s != slot);
                if slots.is_empty() {
                    adjacency.remove(&node);
                }
            }
        }
    }

    /// Drop deleted relationship slots and rebuild adjacency.
    fn compact(&mut self) {
        let live: Vec<RelationshipRecord> =
            std::mem::take(&mut self.relationships).into_iter().flatten().collect();
        self.outgoing.clear();
        self.incoming.clear();
        for record in live {
            self.push_relationship(record);
        }
    }
}

/// Process-local graph store.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    state: Mutex<GraphState>,
    path: Option<PathBuf>,
}

impl MemoryGraph {
    /// Create an empty store with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a snapshot, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => Self::load(file, path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No snapshot at {}, starting with an empty graph", path.display());
                Ok(Self {
                    state: Mutex::new(GraphState::default()),
                    path: Some(path.to_path_buf()),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open a snapshot that must already exist.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::load(file, path)
    }

    fn load(file: File, path: &Path) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StoreError::CorruptSnapshot(format!("{}: {}", path.display(), e)))?;
        let state = GraphState::from_snapshot(snapshot);

        log::info!(
            "Loaded snapshot {} ({} nodes, {} relationships)",
            path.display(),
            state.index.len(),
            state.relationships.len()
        );

        Ok(Self {
            state: Mutex::new(state),
            path: Some(path.to_path_buf()),
        })
    }

    /// Write the snapshot to the backing file. No-op for purely in-memory stores.
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Ok(()),
        }
    }

    /// Write the snapshot to `path`, replacing it atomically.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("tmp");
        {
            let state = self.lock()?;
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &state.snapshot())
                .map_err(|e| StoreError::IoError(e.into()))?;
            writer.flush()?;
        }
        std::fs::rename(&tmp, path)?;

        log::debug!("Saved snapshot to {}", path.display());
        Ok(())
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> Result<usize> {
        Ok(self.lock()?.index.len())
    }

    /// Number of live relationships.
    pub fn relationship_count(&self) -> Result<usize> {
        Ok(self.lock()?.live_relationships().count())
    }

    fn lock(&self) -> Result<MutexGuard<'_, GraphState>> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl GraphSession for MemoryGraph {
    fn create_node(&self, record: NodeRecord) -> Result<NodeHandle> {
        let mut state = self.lock()?;
        let key = record.key();
        if state.index.contains_key(&key) {
            return Err(StoreError::NodeExists(key));
        }
        Ok(state.insert(record))
    }

    fn upsert_node(&self, mut record: NodeRecord) -> Result<NodeHandle> {
        let mut state = self.lock()?;
        let key = record.key();

        let existing = state.index.get(&key).copied();
        if let Some(handle) = existing {
            if let Some(counter) = state.get_mut(handle).and_then(NodeRecord::counter_mut) {
                *counter += 1;
            }
            return Ok(handle);
        }

        if let Some(counter) = record.counter_mut() {
            *counter = 1;
        }
        log::debug!("Created {}", key);
        Ok(state.insert(record))
    }

    fn find_node(&self, key: &NodeKey) -> Result<Option<NodeHandle>> {
        Ok(self.lock()?.index.get(key).copied())
    }

    fn node(&self, handle: NodeHandle) -> Result<Option<NodeRecord>> {
        Ok(self.lock()?.get(handle).cloned())
    }

    fn nodes(&self, kind: NodeKind) -> Result<Vec<(NodeHandle, NodeRecord)>> {
        let state = self.lock()?;
        Ok(state
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeHandle(i as u64), n)))
            .filter(|(_, n)| n.kind() == kind)
            .map(|(h, n)| (h, n.clone()))
            .collect())
    }

    fn create_relationship(
        &self,
        source: NodeHandle,
        target: NodeHandle,
        relationship: Relationship,
    ) -> Result<()> {
        let mut state = self.lock()?;
        state.require(source)?;
        state.require(target)?;
        state.push_relationship(RelationshipRecord {
            source,
            target,
            relationship,
        });
        Ok(())
    }

    fn relationships(&self, kind: RelKind) -> Result<Vec<RelationshipRecord>> {
        let state = self.lock()?;
        Ok(state
            .live_relationships()
            .filter(|r| r.kind() == kind)
            .cloned()
            .collect())
    }

    fn outgoing(&self, source: NodeHandle, kind: RelKind) -> Result<Vec<RelationshipRecord>> {
        let state = self.lock()?;
        Ok(state.adjacent(state.outgoing.get(&source), kind))
    }

    fn incoming(&self, target: NodeHandle, kind: RelKind) -> Result<Vec<RelationshipRecord>> {
        let state = self.lock()?;
        Ok(state.adjacent(state.incoming.get(&target), kind))
    }

    fn adjust_counter(&self, handle: NodeHandle, delta: i64) -> Result<u64> {
        let mut state = self.lock()?;
        let record = state
            .get_mut(handle)
            .ok_or(StoreError::NodeNotFound(handle))?;

        match record.counter_mut() {
            Some(counter) => {
                *counter = if delta >= 0 {
                    counter.saturating_add(delta.unsigned_abs())
                } else {
                    counter.saturating_sub(delta.unsigned_abs())
                };
                Ok(*counter)
            }
            None => Ok(0),
        }
    }

    fn delete_node(&self, handle: NodeHandle) -> Result<()> {
        let mut state = self.lock()?;
        let record = state
            .nodes
            .get_mut(handle.0 as usize)
            .and_then(Option::take)
            .ok_or(StoreError::NodeNotFound(handle))?;
        state.index.remove(&record.key());

        let mut slots: Vec<usize> = state
            .outgoing
            .get(&handle)
            .into_iter()
            .chain(state.incoming.get(&handle))
            .flatten()
            .copied()
            .collect();
        slots.sort_unstable();
        slots.dedup();
        for slot in slots {
            state.remove_relationship(slot);
        }
        Ok(())
    }

    fn delete_relationships(&self, kind: RelKind) -> Result<usize> {
        let mut state = self.lock()?;
        let mut removed = 0;
        for slot in state.relationships.iter_mut() {
            if slot.as_ref().is_some_and(|r| r.kind() == kind) {
                *slot = None;
                removed += 1;
            }
        }
        state.compact();
        Ok(removed)
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.lock()?;
        *state = GraphState::default();
        log::info!("Graph cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PresentationNode, TopicNode};
    use deck_core::EntityKind;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn presentation(filename: &str) -> NodeRecord {
        NodeRecord::Presentation(PresentationNode {
            filename: filename.to_string(),
            title: "Title".to_string(),
            filepath: format!("/decks/{}", filename),
            total_slides: 0,
            metadata: BTreeMap::new(),
        })
    }

    #[test]
    fn test_upsert_same_key_returns_same_handle() {
        let graph = MemoryGraph::new();

        let first = graph.upsert_node(NodeRecord::topic("Kubernetes")).unwrap();
        let second = graph.upsert_node(NodeRecord::topic("Kubernetes")).unwrap();
        let third = graph.upsert_node(NodeRecord::topic("Kubernetes")).unwrap();

        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(graph.nodes(NodeKind::Topic).unwrap().len(), 1);
        assert_eq!(graph.node(first).unwrap().unwrap().counter(), Some(3));
    }

    #[test]
    fn test_upsert_ignores_initial_counter() {
        let graph = MemoryGraph::new();
        let handle = graph
            .upsert_node(NodeRecord::Topic(TopicNode {
                name: "Docker".into(),
                total_mentions: 40,
            }))
            .unwrap();
        assert_eq!(graph.node(handle).unwrap().unwrap().counter(), Some(1));
    }

    #[test]
    fn test_entity_key_includes_kind() {
        let graph = MemoryGraph::new();
        let a = graph.upsert_node(NodeRecord::entity("Nimbus", EntityKind::Product)).unwrap();
        let b = graph.upsert_node(NodeRecord::entity("Nimbus", EntityKind::Tech)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_create_node_rejects_duplicates() {
        let graph = MemoryGraph::new();
        graph.create_node(presentation("a.pdf")).unwrap();

        let err = graph.create_node(presentation("a.pdf")).unwrap_err();
        assert!(matches!(err, StoreError::NodeExists(NodeKey::Presentation(_))));
    }

    #[test]
    fn test_relationship_requires_live_endpoints() {
        let graph = MemoryGraph::new();
        let p = graph.create_node(presentation("a.pdf")).unwrap();

        let err = graph
            .create_relationship(p, NodeHandle(99), Relationship::Contains)
            .unwrap_err();
        assert!(matches!(err, StoreError::NodeNotFound(NodeHandle(99))));
    }

    #[test]
    fn test_delete_node_detaches() {
        let graph = MemoryGraph::new();
        let p = graph.create_node(presentation("a.pdf")).unwrap();
        let t = graph.upsert_node(NodeRecord::topic("Rust")).unwrap();
        graph
            .create_relationship(p, t, Relationship::Covers { total_mentions: 1 })
            .unwrap();

        graph.delete_node(p).unwrap();

        assert!(graph.node(p).unwrap().is_none());
        assert!(graph.find_node(&NodeKey::Presentation("a.pdf".into())).unwrap().is_none());
        assert!(graph.relationships(RelKind::Covers).unwrap().is_empty());
        // Handles are not reused.
        let q = graph.create_node(presentation("b.pdf")).unwrap();
        assert_ne!(p, q);
    }

    #[test]
    fn test_adjust_counter_saturates() {
        let graph = MemoryGraph::new();
        let k = graph.upsert_node(NodeRecord::keyword("mesh")).unwrap();

        assert_eq!(graph.adjust_counter(k, 4).unwrap(), 5);
        assert_eq!(graph.adjust_counter(k, -10).unwrap(), 0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("graph.json");

        let graph = MemoryGraph::open(&path).unwrap();
        let p = graph.create_node(presentation("a.pdf")).unwrap();
        let t = graph.upsert_node(NodeRecord::topic("Rust")).unwrap();
        graph.upsert_node(NodeRecord::topic("Rust")).unwrap();
        graph
            .create_relationship(p, t, Relationship::Covers { total_mentions: 2 })
            .unwrap();
        graph.save().unwrap();

        let reopened = MemoryGraph::open_existing(&path).unwrap();
        let (handle, record) = reopened
            .find_record(&NodeKey::Topic("Rust".into()))
            .unwrap()
            .unwrap();
        assert_eq!(handle, t);
        assert_eq!(record.counter(), Some(2));
        assert_eq!(reopened.relationship_count().unwrap(), 1);

        // The index is rebuilt, so upserts keep hitting the same node.
        assert_eq!(reopened.upsert_node(NodeRecord::topic("Rust")).unwrap(), t);
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("graph.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            MemoryGraph::open(&path).unwrap_err(),
            StoreError::CorruptSnapshot(_)
        ));
        assert!(MemoryGraph::open_existing(tmp.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_clear() {
        let graph = MemoryGraph::new();
        graph.upsert_node(NodeRecord::keyword("mesh")).unwrap();
        graph.clear().unwrap();
        assert_eq!(graph.node_count().unwrap(), 0);
    }

    #[test]
    fn test_adjacency_follows_deletes_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("graph.json");
        let graph = MemoryGraph::open(&path).unwrap();

        let a = graph.create_node(presentation("a.pdf")).unwrap();
        let b = graph.create_node(presentation("b.pdf")).unwrap();
        let rust = graph.upsert_node(NodeRecord::topic("Rust")).unwrap();
        let go = graph.upsert_node(NodeRecord::topic("Go")).unwrap();
        for (p, t) in [(a, rust), (a, go), (b, rust)] {
            graph
                .create_relationship(p, t, Relationship::Covers { total_mentions: 1 })
                .unwrap();
        }
        graph
            .create_relationship(go, rust, Relationship::RelatedTo { strength: 2 })
            .unwrap();

        let targets = |g: &MemoryGraph, p| -> Vec<NodeHandle> {
            g.outgoing(p, RelKind::Covers).unwrap().iter().map(|r| r.target).collect()
        };
        assert_eq!(targets(&graph, a), vec![rust, go]);
        assert_eq!(graph.incoming(rust, RelKind::Covers).unwrap().len(), 2);
        assert_eq!(graph.incoming(rust, RelKind::RelatedTo).unwrap().len(), 1);

        graph.delete_node(a).unwrap();
        assert!(graph.outgoing(a, RelKind::Covers).unwrap().is_empty());
        let sources: Vec<NodeHandle> = graph
            .incoming(rust, RelKind::Covers)
            .unwrap()
            .iter()
            .map(|r| r.source)
            .collect();
        assert_eq!(sources, vec![b]);

        assert_eq!(graph.delete_relationships(RelKind::RelatedTo).unwrap(), 1);
        assert!(graph.outgoing(go, RelKind::RelatedTo).unwrap().is_empty());
        assert_eq!(targets(&graph, b), vec![rust]);
        assert_eq!(graph.relationship_count().unwrap(), 1);

        graph.save().unwrap();
        let reopened = MemoryGraph::open_existing(&path).unwrap();
        assert_eq!(targets(&reopened, b), vec![rust]);
        assert_eq!(reopened.relationship_count().unwrap(), 1);
    }
}
