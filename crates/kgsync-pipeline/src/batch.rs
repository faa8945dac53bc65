//! Fixed-capacity record buffer

/// Buffers records until `capacity` is reached
///
/// [`push`](Self::push) hands back a full batch as soon as one is ready;
/// [`take_remaining`](Self::take_remaining) drains the tail at the end of a
/// session. Batches never exceed the capacity and preserve push order.
#[derive(Debug, Clone)]
pub struct BatchBuffer<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> BatchBuffer<T> {
    /// A zero capacity is treated as one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a record; returns the batch when it just became full
    pub fn push(&mut self, item: T) -> Option<Vec<T>> {
        self.items.push(item);
        if self.items.len() >= self.capacity {
            Some(std::mem::replace(
                &mut self.items,
                Vec::with_capacity(self.capacity),
            ))
        } else {
            None
        }
    }

    /// Drain whatever is buffered
    pub fn take_remaining(&mut self) -> Option<Vec<T>> {
        if self.items.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.items))
        }
    }
}
