//! Slot storage for tree nodes.
//!
//! Nodes live in a vector of slots and are addressed by [`Handle`]s. Vacated
//! slots go on a free list and are reused; every reuse bumps the slot's
//! generation, so a handle to a removed node can never reach its successor.
//! A slot whose generation is exhausted is retired instead of reused.

use std::ops::{Index, IndexMut};

use crate::error::{Error, Result};

/// Stable identity of a node inside one tree.
///
/// A handle stays valid until its node is removed. After that every lookup
/// through it yields `None`, even if the slot has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

#[derive(Clone)]
struct Slot<T> {
    generation: u32,
    entry: Option<T>,
}

#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> Slot<T> {
    // Bumps the generation of an emptied slot. Returns false once the
    // generation is exhausted; the slot must then never be handed out again.
    fn vacate(&mut self) -> bool {
        match self.generation.checked_add(1) {
            Some(generation) => {
                self.generation = generation;
                true
            }
            None => false,
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Vacates every slot. Slots are kept so that outstanding handles stay dead.
    pub(crate) fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let reusable = match slot.entry.take() {
                Some(_) => slot.vacate(),
                None => slot.generation != u32::MAX,
            };
            // Every index fits in u32, `try_insert` never pushes past it
            if let (true, Ok(index)) = (reusable, u32::try_from(index)) {
                self.free_list.push(index);
            }
        }
        self.len = 0;
    }

    /// Makes room for `additional` more entries without reallocating.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<()> {
        let needed = additional.saturating_sub(self.free_list.len());
        if needed > 0 {
            self.slots.try_reserve(needed)?;
            // The last new slot must still get a u32 index
            let last_index = self.slots.len().saturating_add(needed - 1);
            u32::try_from(last_index).map_err(|_| Error::CapacityExceeded)?;
            // Removals push onto the free list, keep that infallible too
            self.free_list
                .try_reserve((self.slots.len() + needed).saturating_sub(self.free_list.len()))?;
        }
        Ok(())
    }

    pub(crate) fn try_insert(&mut self, value: T) -> Result<Handle> {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.entry.is_none());
            slot.entry = Some(value);
            self.len += 1;
            return Ok(Handle {
                index,
                generation: slot.generation,
            });
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| Error::CapacityExceeded)?;
        self.slots.try_reserve(1)?;
        self.free_list.try_reserve(self.slots.len() + 1 - self.free_list.len())?;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(value),
        });
        self.len += 1;
        Ok(Handle {
            index,
            generation: 0,
        })
    }

    pub(crate) fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.entry.take()?;
        if slot.vacate() {
            self.free_list.push(handle.index);
        }
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }
}

// Indexing is for links the tree maintains itself. A dead handle there means
// the tree structure is corrupt, which is not recoverable.
impl<T> Index<Handle> for Arena<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("dangling tree link {handle:?}"),
        }
    }
}

impl<T> IndexMut<Handle> for Arena<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("dangling tree link {handle:?}"),
        }
    }
}
