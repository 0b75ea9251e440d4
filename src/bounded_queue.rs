/// A fixed-capacity FIFO ring buffer.
///
/// One slot more than `capacity` is allocated so that `head == tail` always
/// means empty and `head + 1 == tail` (mod slots) always means full.
/// Enqueueing into a full queue or reading from an empty one is a protocol
/// bug in the caller and panics.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    /// Ring storage, `capacity + 1` slots
    slots: Box<[Option<T>]>,
    /// Next slot to write
    head: usize,
    /// Next slot to read
    tail: usize,
}

impl<T> BoundedQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity + 1).map(|_| None).collect::<Vec<_>>().into_boxed_slice();
        BoundedQueue { slots, head: 0, tail: 0 }
    }

    /// Maximum number of elements the queue can hold
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn len(&self) -> usize {
        (self.head + self.slots.len() - self.tail) % self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        (self.head + 1) % self.slots.len() == self.tail
    }

    pub fn enqueue(&mut self, value: T) {
        assert!(
            !self.is_full(),
            "queue overflow: enqueue into full queue of capacity {}",
            self.capacity()
        );
        self.slots[self.head] = Some(value);
        self.head = (self.head + 1) % self.slots.len();
    }

    pub fn dequeue(&mut self) -> T {
        let value = self.slots[self.tail]
            .take()
            .unwrap_or_else(|| panic!("queue underflow: dequeue from empty queue"));
        self.tail = (self.tail + 1) % self.slots.len();
        value
    }

    pub fn front(&self) -> &T {
        self.slots[self.tail]
            .as_ref()
            .unwrap_or_else(|| panic!("queue underflow: front of empty queue"))
    }
}
