/// Fixed-capacity buffer keeping the most recent items
///
/// Once full, each push overwrites the oldest item.
#[derive(Clone, Debug)]
pub(crate) struct Ring<T> {
    items: Vec<T>,
    capacity: usize,
    /// Index of the oldest item once full
    start: usize,
}

impl<T> Ring<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            start: 0,
        }
    }

    pub(crate) fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() < self.capacity {
            self.items.push(item);
        } else {
            self.items[self.start] = item;
            self.start = (self.start + 1) % self.capacity;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Items from oldest to newest
    pub(crate) fn into_ordered(self) -> Vec<T> {
        let mut items = self.items;
        items.rotate_left(self.start);
        items
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keeps_most_recent() {
        let mut ring = Ring::new(3);
        for i in 1..=7 {
            ring.push(i);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.into_ordered(), [5, 6, 7]);
    }

    #[test]
    fn partially_filled() {
        let mut ring = Ring::new(3);
        ring.push('a');
        ring.push('b');
        assert_eq!(ring.into_ordered(), ['a', 'b']);
    }

    #[test]
    fn zero_capacity() {
        let mut ring = Ring::new(0);
        ring.push(1);
        assert_eq!(ring.len(), 0);
        assert!(ring.into_ordered().is_empty());
    }
}
