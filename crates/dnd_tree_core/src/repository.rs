use thiserror::Error;

use crate::{Forest, NodeId, NodeRecord, NodeStatus, ReparentIntent};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("unknown node `{0}`")]
    UnknownNode(NodeId),
    #[error("unknown parent `{0}`")]
    UnknownParent(NodeId),
    #[error("node `{0}` cannot be its own parent")]
    SelfParent(NodeId),
    #[error("moving `{moved}` under `{parent}` would create a cycle")]
    Cycle { moved: NodeId, parent: NodeId },
    #[error("node `{0}` already exists")]
    DuplicateId(NodeId),
}

/// Which records [`InMemorySpaces::forest`] delivers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    OpenOnly,
    All,
}

/// An in-process stand-in for the remote data and mutation services.
///
/// Records are kept in delivery order; a reparented record moves to the end so it becomes the
/// last child of its new parent.
#[derive(Clone, Debug, Default)]
pub struct InMemorySpaces {
    records: Vec<NodeRecord>,
}

impl InMemorySpaces {
    pub fn new(records: impl IntoIterator<Item = NodeRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn records(&self) -> &[NodeRecord] {
        &self.records
    }

    /// The authoritative forest as the data collaborator would deliver it.
    ///
    /// With [`StatusFilter::OpenOnly`], archived records are withheld and so are their
    /// descendants, which become unreachable.
    pub fn forest(&self, filter: StatusFilter) -> Forest {
        let records = self.records.iter().filter(|record| match filter {
            StatusFilter::All => true,
            StatusFilter::OpenOnly => record.meta.status == NodeStatus::Open,
        });
        Forest::from_records(records.cloned())
    }

    fn position(&self, id: &NodeId) -> Result<usize, RepositoryError> {
        self.records
            .iter()
            .position(|record| record.id == *id)
            .ok_or_else(|| RepositoryError::UnknownNode(id.clone()))
    }

    fn record_mut(&mut self, id: &NodeId) -> Result<&mut NodeRecord, RepositoryError> {
        let ix = self.position(id)?;
        Ok(&mut self.records[ix])
    }

    pub fn insert(&mut self, record: NodeRecord) -> Result<(), RepositoryError> {
        if self.records.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::DuplicateId(record.id));
        }
        if let Some(parent_id) = record.parent_id.as_ref()
            && self.position(parent_id).is_err()
        {
            return Err(RepositoryError::UnknownParent(parent_id.clone()));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn rename(&mut self, id: &NodeId, label: impl Into<String>) -> Result<(), RepositoryError> {
        self.record_mut(id)?.label = label.into();
        Ok(())
    }

    pub fn set_status(&mut self, id: &NodeId, status: NodeStatus) -> Result<(), RepositoryError> {
        self.record_mut(id)?.meta.status = status;
        Ok(())
    }

    pub fn set_professional(
        &mut self,
        id: &NodeId,
        professional: bool,
    ) -> Result<(), RepositoryError> {
        self.record_mut(id)?.meta.professional = professional;
        Ok(())
    }

    /// Removes `id` and everything below it. Returns the removed records.
    pub fn remove(&mut self, id: &NodeId) -> Result<Vec<NodeRecord>, RepositoryError> {
        self.position(id)?;
        let doomed = Forest::from_records(self.records.iter().cloned()).subtree_ids(id);
        let (removed, kept): (Vec<NodeRecord>, Vec<NodeRecord>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|record| record.id == *id || doomed.contains(&record.id));
        self.records = kept;
        Ok(removed)
    }

    /// Applies a reparent intent, rejecting moves that would break the tree shape.
    pub fn reparent(&mut self, intent: &ReparentIntent) -> Result<(), RepositoryError> {
        let ix = self.position(&intent.moved_id)?;

        if let Some(parent_id) = intent.new_parent_id.as_ref() {
            if *parent_id == intent.moved_id {
                return Err(RepositoryError::SelfParent(parent_id.clone()));
            }
            self.position(parent_id)
                .map_err(|_| RepositoryError::UnknownParent(parent_id.clone()))?;
            let forest = Forest::from_records(self.records.iter().cloned());
            if forest.is_descendant_of(parent_id, &intent.moved_id) {
                return Err(RepositoryError::Cycle {
                    moved: intent.moved_id.clone(),
                    parent: parent_id.clone(),
                });
            }
        }

        let mut record = self.records.remove(ix);
        record.parent_id = intent.new_parent_id.clone();
        self.records.push(record);
        tracing::debug!(
            moved = %intent.moved_id,
            parent = ?intent.new_parent_id,
            "reparented"
        );
        Ok(())
    }
}
