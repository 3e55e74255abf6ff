//! Instance table with generational keys
//!
//! Playback handles live here, owned by whoever inserted them. The audio
//! engine keeps only [`InstanceKey`]s, so its collections can be cleared
//! without touching handle lifetimes and a handle can be removed without
//! the engine holding a dangling reference.
//!
//! Slots are reused through a free list. Every reuse bumps the slot
//! generation, which makes keys to the previous occupant resolve to `None`.

// ============================================================================
// Instance Key
// ============================================================================

/// Key of an entry in an [`InstanceTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    index: u32,
    generation: u32,
}

impl InstanceKey {
    /// Get the slot index
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Get the generation of the slot this key was issued for
    #[must_use]
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

// ============================================================================
// Slot
// ============================================================================

#[derive(Debug)]
enum Entry<T> {
    Occupied(T),
    /// Points to the next free slot, or `NONE` at the end of the list
    Vacant(u32),
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    entry: Entry<T>,
}

// ============================================================================
// Instance Table
// ============================================================================

/// Arena of playback handles addressed by [`InstanceKey`].
///
/// | Operation | Time Complexity |
/// |-----------|-----------------|
/// | `insert`  | O(1) amortized  |
/// | `remove`  | O(1)            |
/// | `get`     | O(1)            |
/// | `iter`    | O(n)            |
#[derive(Debug)]
pub struct InstanceTable<T> {
    slots: Vec<Slot<T>>,
    free_head: u32,
    len: usize,
}

impl<T> InstanceTable<T> {
    const NONE: u32 = u32::MAX;

    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: Self::NONE,
            len: 0,
        }
    }

    /// Create a table with room for `capacity` entries before reallocating
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: Self::NONE,
            len: 0,
        }
    }

    /// Insert a value, reusing a free slot if one exists
    pub fn insert(&mut self, value: T) -> InstanceKey {
        self.len += 1;

        if self.free_head != Self::NONE {
            let index = self.free_head;
            let slot = &mut self.slots[index as usize];

            if let Entry::Vacant(next) = slot.entry {
                self.free_head = next;
            }
            slot.entry = Entry::Occupied(value);

            InstanceKey {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len())
                .ok()
                .filter(|&index| index != Self::NONE)
                .expect("instance table is full");
            self.slots.push(Slot {
                generation: 0,
                entry: Entry::Occupied(value),
            });

            InstanceKey {
                index,
                generation: 0,
            }
        }
    }

    /// Remove and return the value behind a key.
    ///
    /// Returns `None` if the key is stale or was never issued.
    pub fn remove(&mut self, key: InstanceKey) -> Option<T> {
        let slot = self.slots.get_mut(key.index())?;
        if slot.generation != key.generation || matches!(slot.entry, Entry::Vacant(_)) {
            return None;
        }

        let old = std::mem::replace(&mut slot.entry, Entry::Vacant(self.free_head));
        slot.generation = slot.generation.wrapping_add(1);
        self.free_head = key.index;
        self.len -= 1;

        match old {
            Entry::Occupied(value) => Some(value),
            Entry::Vacant(_) => None,
        }
    }

    /// Get a reference to the value behind a key
    #[must_use]
    #[inline]
    pub fn get(&self, key: InstanceKey) -> Option<&T> {
        match self.slots.get(key.index()) {
            Some(Slot {
                generation,
                entry: Entry::Occupied(value),
            }) if *generation == key.generation => Some(value),
            _ => None,
        }
    }

    /// Get a mutable reference to the value behind a key
    #[inline]
    pub fn get_mut(&mut self, key: InstanceKey) -> Option<&mut T> {
        match self.slots.get_mut(key.index()) {
            Some(Slot {
                generation,
                entry: Entry::Occupied(value),
            }) if *generation == key.generation => Some(value),
            _ => None,
        }
    }

    /// Check if a key still refers to a live entry
    #[must_use]
    #[inline]
    pub fn contains(&self, key: InstanceKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of live entries
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if the table has no live entries
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over live entries with their keys
    pub fn iter(&self) -> impl Iterator<Item = (InstanceKey, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match &slot.entry {
                Entry::Occupied(value) => Some((
                    InstanceKey {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )),
                Entry::Vacant(_) => None,
            })
    }

    /// Iterate mutably over live entries
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|slot| match &mut slot.entry {
            Entry::Occupied(value) => Some(value),
            Entry::Vacant(_) => None,
        })
    }

    /// Remove every entry, invalidating all outstanding keys.
    ///
    /// Slot storage is kept for reuse.
    pub fn clear(&mut self) {
        self.free_head = Self::NONE;
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if matches!(slot.entry, Entry::Occupied(_)) {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.entry = Entry::Vacant(self.free_head);
            self.free_head = index as u32;
        }
        self.len = 0;
    }
}

impl<T> Default for InstanceTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
