use rand::Rng;

/// Bounded ring of recently sent packets; once full, the oldest slot is overwritten.
#[derive(Debug, Clone)]
pub struct PacketRing {
    slots: Vec<Vec<u8>>,
    capacity: usize,
    cursor: usize,
}

impl PacketRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    pub fn push(&mut self, packet: Vec<u8>) {
        if self.slots.len() < self.capacity {
            self.slots.push(packet);
        } else {
            self.slots[self.cursor] = packet;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slot `index`, in storage order.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.slots.get(index).map(Vec::as_slice)
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&[u8]> {
        if self.slots.is_empty() {
            return None;
        }
        self.get(rng.gen_range(0..self.slots.len()))
    }
}
