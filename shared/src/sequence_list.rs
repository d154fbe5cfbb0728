use thiserror::Error;

use crate::{sequence_less_than, EventId};

/// Errors that can occur during SequenceList operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Attempted to insert an id that is already present
    #[error("Duplicate sequence id {id} not allowed in SequenceList")]
    DuplicateId { id: EventId },
}

/// A list of items ordered by their wrapping [`EventId`].
///
/// Items are almost always appended with an id newer than everything already
/// present, so lookups and inserts scan from the back.
pub struct SequenceList<T> {
    list: Vec<(EventId, T)>,
}

impl<T> SequenceList<T> {
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn front(&self) -> Option<&(EventId, T)> {
        self.list.first()
    }

    pub fn back(&self) -> Option<&(EventId, T)> {
        self.list.last()
    }

    pub fn pop_front(&mut self) -> Option<(EventId, T)> {
        if self.list.is_empty() {
            return None;
        }
        Some(self.list.remove(0))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &(EventId, T)> {
        self.list.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut (EventId, T)> {
        self.list.iter_mut()
    }

    fn position_scan_from_back(&self, id: EventId) -> Result<usize, usize> {
        for index in (0..self.list.len()).rev() {
            let old_id = self.list[index].0;
            if old_id == id {
                return Ok(index);
            }
            if sequence_less_than(old_id.to_u16(), id.to_u16()) {
                return Err(index + 1);
            }
        }
        Err(0)
    }

    pub fn contains_scan_from_back(&self, id: EventId) -> bool {
        self.position_scan_from_back(id).is_ok()
    }

    pub fn get_mut_scan_from_back(&mut self, id: EventId) -> Option<&mut T> {
        let index = self.position_scan_from_back(id).ok()?;
        self.list.get_mut(index).map(|(_, item)| item)
    }

    pub fn try_insert_scan_from_back(&mut self, id: EventId, item: T) -> Result<(), SequenceError> {
        match self.position_scan_from_back(id) {
            Ok(_) => Err(SequenceError::DuplicateId { id }),
            Err(index) => {
                self.list.insert(index, (id, item));
                Ok(())
            }
        }
    }

    /// # Panics
    ///
    /// Panics if `id` is already present.
    pub fn insert_scan_from_back(&mut self, id: EventId, item: T) {
        if let Err(err) = self.try_insert_scan_from_back(id, item) {
            panic!("{}", err);
        }
    }

    pub fn remove_scan_from_front(&mut self, id: EventId) -> Option<T> {
        let index = self.list.iter().position(|(old_id, _)| *old_id == id)?;
        Some(self.list.remove(index).1)
    }

    /// Removes every item whose id is at or before `up_to`.
    pub fn remove_through(&mut self, up_to: EventId) -> usize {
        let before = self.list.len();
        self.list.retain(|(id, _)| id.is_more_recent_than(up_to));
        before - self.list.len()
    }
}

impl<T> Default for SequenceList<T> {
    fn default() -> Self {
        Self::new()
    }
}
