use crate::errors::Error;

/// Fixed capacity ring of events addressed by logical stream position.
///
/// The valid window is `[left_index, right_index)`. Both cursors only move
/// forward and `right_index - left_index <= capacity`. Logical index `i` lives
/// at physical slot `i % capacity`.
pub(crate) struct WindowedQueue<E> {
    buffer: Vec<E>,
    capacity: usize,
    left_index: u64,
    right_index: u64,
}

impl<E: Copy> WindowedQueue<E> {
    pub fn allocate(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidConfiguration(String::from(
                "The event queue needs room for at least one event",
            )));
        }
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| Error::Allocation(format!("an event queue of {} entries", capacity)))?;

        Ok(Self {
            buffer,
            capacity,
            left_index: 0,
            right_index: 0,
        })
    }

    #[inline(always)]
    fn physical(&self, index: u64) -> usize {
        (index % self.capacity as u64) as usize
    }

    /// Appends `event` at `right_index`. A full queue first evicts and returns
    /// its oldest event.
    #[inline(always)]
    pub fn push(&mut self, event: E) -> Option<E> {
        let evicted = if self.is_full() {
            self.pop_front()
        } else {
            None
        };

        let slot = self.physical(self.right_index);
        if self.buffer.len() < self.capacity {
            // slots are first touched in order, so the next unused one is `slot`
            self.buffer.push(event);
        } else {
            self.buffer[slot] = event;
        }
        self.right_index += 1;
        evicted
    }

    /// Evicts the oldest event in the window.
    #[inline(always)]
    pub fn pop_front(&mut self) -> Option<E> {
        if self.is_empty() {
            return None;
        }
        let event = self.buffer[self.physical(self.left_index)];
        self.left_index += 1;
        Some(event)
    }

    /// Event at logical position `index`.
    ///
    /// `index` must lie in `[left_index, right_index)`. Debug builds panic
    /// otherwise; release builds return whatever occupies the slot.
    #[inline(always)]
    pub fn get(&self, index: u64) -> &E {
        debug_assert!(
            self.contains(index),
            "index {} outside window [{}, {})",
            index,
            self.left_index,
            self.right_index
        );
        &self.buffer[self.physical(index)]
    }

    pub fn try_get(&self, index: u64) -> Option<&E> {
        if self.contains(index) {
            Some(&self.buffer[self.physical(index)])
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn contains(&self, index: u64) -> bool {
        self.left_index <= index && index < self.right_index
    }

    pub fn front(&self) -> Option<&E> {
        self.try_get(self.left_index)
    }

    pub fn back(&self) -> Option<&E> {
        self.right_index.checked_sub(1).and_then(|index| self.try_get(index))
    }

    #[inline(always)]
    pub fn left_index(&self) -> u64 {
        self.left_index
    }

    #[inline(always)]
    pub fn right_index(&self) -> u64 {
        self.right_index
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        (self.right_index - self.left_index) as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.left_index == self.right_index
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
