//! The graph store boundary.

use crate::error::Result;
use crate::model::{
    NodeHandle, NodeKey, NodeKind, NodeRecord, RelKind, Relationship, RelationshipRecord,
};

/// A live session against a graph store.
///
/// Pipeline components receive a session at construction. Implementations
/// must make [`GraphSession::upsert_node`] atomic per natural key so that
/// concurrent callers never lose an increment.
pub trait GraphSession: Send + Sync {
    /// Create a node. Fails with `NodeExists` if the natural key is taken.
    fn create_node(&self, record: NodeRecord) -> Result<NodeHandle>;

    /// Create-or-increment by natural key.
    ///
    /// A new node starts with its counter at 1; an existing node keeps its
    /// attributes and has its counter incremented by 1. Nodes without a
    /// counter are returned unchanged when they already exist.
    fn upsert_node(&self, record: NodeRecord) -> Result<NodeHandle>;

    /// Look up a node by natural key.
    fn find_node(&self, key: &NodeKey) -> Result<Option<NodeHandle>>;

    /// Fetch a node by handle.
    fn node(&self, handle: NodeHandle) -> Result<Option<NodeRecord>>;

    /// All nodes with the given label, in creation order.
    fn nodes(&self, kind: NodeKind) -> Result<Vec<(NodeHandle, NodeRecord)>>;

    /// Add a relationship between two existing nodes.
    fn create_relationship(
        &self,
        source: NodeHandle,
        target: NodeHandle,
        relationship: Relationship,
    ) -> Result<()>;

    /// All relationships of a type, in creation order.
    fn relationships(&self, kind: RelKind) -> Result<Vec<RelationshipRecord>>;

    /// Relationships of a type leaving `source`.
    fn outgoing(&self, source: NodeHandle, kind: RelKind) -> Result<Vec<RelationshipRecord>>;

    /// Relationships of a type arriving at `target`.
    fn incoming(&self, target: NodeHandle, kind: RelKind) -> Result<Vec<RelationshipRecord>>;

    /// Add `delta` to a node's counter, saturating at zero. Returns the new value.
    fn adjust_counter(&self, handle: NodeHandle, delta: i64) -> Result<u64>;

    /// Delete a node and every relationship touching it.
    fn delete_node(&self, handle: NodeHandle) -> Result<()>;

    /// Delete every relationship of a type. Returns how many were removed.
    fn delete_relationships(&self, kind: RelKind) -> Result<usize>;

    /// Remove all nodes and relationships.
    fn clear(&self) -> Result<()>;

    /// Convenience: fetch the node behind a natural key.
    fn find_record(&self, key: &NodeKey) -> Result<Option<(NodeHandle, NodeRecord)>> {
        match self.find_node(key)? {
            Some(handle) => Ok(self.node(handle)?.map(|record| (handle, record))),
            None => Ok(None),
        }
    }
}
