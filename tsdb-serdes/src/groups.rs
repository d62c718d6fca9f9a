//! Insertion-ordered groups of shard iterators.
//!
//! The query layer buckets shards into groups. Groups are not part of the
//! v2 wire format, but their insertion order (and the insertion order of
//! shards inside each group) fixes the order of the serialized array.

use std::collections::HashMap;

use crate::id::GroupId;
use crate::shard::TimeSeriesIterator;

/// An ordered list of shard iterators sharing a group id.
#[derive(Debug)]
pub struct IteratorGroup {
    id: GroupId,
    iterators: Vec<Box<dyn TimeSeriesIterator>>,
}

impl IteratorGroup {
    /// Creates an empty group.
    pub fn new(id: GroupId) -> Self {
        Self {
            id,
            iterators: Vec::new(),
        }
    }

    /// Returns the group id.
    pub fn id(&self) -> &GroupId {
        &self.id
    }

    /// Appends an iterator to the group.
    pub fn add_iterator(&mut self, iterator: impl TimeSeriesIterator + 'static) {
        self.iterators.push(Box::new(iterator));
    }

    /// Returns the iterators in insertion order.
    pub fn iterators(&self) -> impl Iterator<Item = &(dyn TimeSeriesIterator + 'static)> {
        self.iterators.iter().map(|it| &**it)
    }

    /// Number of iterators in the group.
    pub fn len(&self) -> usize {
        self.iterators.len()
    }

    /// Returns `true` if the group has no iterators.
    pub fn is_empty(&self) -> bool {
        self.iterators.is_empty()
    }
}

/// Mapping from group id to iterators, preserving insertion order.
#[derive(Debug, Default)]
pub struct IteratorGroups {
    groups: Vec<IteratorGroup>,
    index: HashMap<GroupId, usize>,
}

impl IteratorGroups {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an iterator under `group`.
    ///
    /// The iterator is appended to the group if it already exists, otherwise
    /// a new group is created after all existing ones.
    pub fn add_iterator(
        &mut self,
        group: &GroupId,
        iterator: impl TimeSeriesIterator + 'static,
    ) {
        let slot = match self.index.get(group) {
            Some(&slot) => slot,
            None => {
                self.groups.push(IteratorGroup::new(group.clone()));
                let slot = self.groups.len() - 1;
                self.index.insert(group.clone(), slot);
                slot
            }
        };
        self.groups[slot].add_iterator(iterator);
    }

    /// Looks up a group by id.
    pub fn group(&self, id: &GroupId) -> Option<&IteratorGroup> {
        self.index.get(id).map(|&slot| &self.groups[slot])
    }

    /// Returns the groups in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = &IteratorGroup> {
        self.groups.iter()
    }

    /// Returns every iterator, group by group, in insertion order.
    pub fn flattened_iterators(
        &self,
    ) -> impl Iterator<Item = &(dyn TimeSeriesIterator + 'static)> {
        self.groups.iter().flat_map(|group| group.iterators())
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of iterators across all groups.
    pub fn iterator_count(&self) -> usize {
        self.groups.iter().map(IteratorGroup::len).sum()
    }
}
