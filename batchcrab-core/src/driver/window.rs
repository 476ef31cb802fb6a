/// Records accumulated between two window flushes.
///
/// Append-only while a window is open; [`take`](Self::take) hands the whole
/// window out and leaves an empty buffer behind.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBuffer<K, V> {
    records: Vec<(K, V)>,
}

impl<K, V> WindowBuffer<K, V> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, key: K, value: V) {
        self.records.push((key, value));
    }

    /// Close the current window and return its records in arrival order.
    pub fn take(&mut self) -> Vec<(K, V)> {
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<K, V> Default for WindowBuffer<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
