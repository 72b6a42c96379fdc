//! Priority-ordered views over insertion-ordered storage.
//!
//! [`PriorityVec`] never reorders its backing storage. The sorted view and
//! the cursor walk a permutation computed on demand, so insertion order stays
//! observable through [`PriorityVec::iter`] while [`PriorityVec::sorted`]
//! yields elements by descending priority.

/// Contract for collections that order their elements by a numeric priority.
///
/// Higher priorities sort first. Equal priorities keep insertion order.
/// Priorities are compared with [`f64::total_cmp`], so every value (including
/// infinities) has a defined position.
///
/// The cursor methods traverse the *sorted* view: [`next`](Self::next) walks
/// from the highest priority downward, [`previous`](Self::previous) steps
/// back, and [`consume`](Self::consume) removes the element the cursor is on.
pub trait PriorityCollection<T> {
    /// Adds an element with the default priority of `0.0`.
    fn add(&mut self, item: T) {
        self.add_with(item, 0.0);
    }

    /// Adds an element with the given priority.
    fn add_with(&mut self, item: T, priority: f64);

    /// Returns the number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if the collection holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the highest-priority element without touching the cursor.
    fn peek(&self) -> Option<&T>;

    /// Advances the cursor and returns the element it lands on.
    ///
    /// The first call returns the highest-priority element. Returns `None`
    /// once the sorted view is exhausted, leaving the cursor on the last
    /// element.
    #[allow(clippy::should_implement_trait)]
    fn next(&mut self) -> Option<&T>;

    /// Steps the cursor back and returns the element it lands on.
    ///
    /// Returns `None` if the cursor is on the first element or has not been
    /// advanced yet.
    fn previous(&mut self) -> Option<&T>;

    /// Removes and returns the element under the cursor.
    ///
    /// The cursor moves to the preceding element of the sorted view, so a
    /// following [`next`](Self::next) yields the element that came after the
    /// consumed one. Returns `None` if the cursor has not been advanced.
    fn consume(&mut self) -> Option<T>;

    /// Moves the cursor back before the first element of the sorted view.
    fn reset_cursor(&mut self);

    /// Collects references to all elements in descending priority order.
    fn sorted_collect(&self) -> Vec<&T>;
}

struct Slot<T> {
    item: T,
    priority: f64,
    seq: u64,
}

/// Vec-backed [`PriorityCollection`].
///
/// Storage is insertion-ordered; the sorted view is a permutation computed
/// per call, which keeps mutation simple at the cost of `O(n log n)` sorted
/// access. Intended for the small, short-lived collections this crate
/// targets, not for large priority queues.
///
/// Adding or removing elements outside of [`consume`](PriorityCollection::consume)
/// resets the cursor.
///
/// # Example
///
/// ```
/// use karma_collections::{PriorityCollection, PriorityVec};
///
/// let mut queue: PriorityVec<&str> = PriorityVec::new();
/// queue.add_with("low", -1.0);
/// queue.add_with("high", 10.0);
/// queue.add("baseline"); // priority 0.0
///
/// let order: Vec<_> = queue.sorted().copied().collect();
/// assert_eq!(order, ["high", "baseline", "low"]);
///
/// assert_eq!(queue.next(), Some(&"high"));
/// assert_eq!(queue.consume(), Some("high"));
/// assert_eq!(queue.next(), Some(&"baseline"));
/// ```
pub struct PriorityVec<T> {
    slots: Vec<Slot<T>>,
    next_seq: u64,
    /// Sorted-view position of the element last yielded by the cursor.
    cursor: Option<usize>,
}

impl<T> PriorityVec<T> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_seq: 0,
            cursor: None,
        }
    }

    /// Creates an empty collection with pre-allocated storage.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            next_seq: 0,
            cursor: None,
        }
    }

    /// Returns an iterator over the elements in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> {
        self.slots.iter().map(|s| &s.item)
    }

    /// Returns an iterator over the elements in descending priority order.
    pub fn sorted(&self) -> Sorted<'_, T> {
        let mut refs: Vec<&Slot<T>> = self.slots.iter().collect();
        refs.sort_by(|a, b| {
            b.priority
                .total_cmp(&a.priority)
                .then(a.seq.cmp(&b.seq))
        });
        Sorted {
            inner: refs.into_iter(),
        }
    }

    /// Returns the priority of the first element equal to `item`.
    pub fn priority_of(&self, item: &T) -> Option<f64>
    where
        T: PartialEq,
    {
        self.slots.iter().find(|s| &s.item == item).map(|s| s.priority)
    }

    /// Removes the first element equal to `item`.
    ///
    /// Resets the cursor.
    pub fn remove(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.slots.iter().position(|s| &s.item == item) {
            Some(pos) => {
                self.slots.remove(pos);
                self.cursor = None;
                true
            }
            None => false,
        }
    }

    /// Removes all elements and resets the cursor.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = None;
    }

    /// Indices of `slots` in descending priority order.
    fn sorted_indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.slots.len()).collect();
        order.sort_by(|&a, &b| {
            let (sa, sb) = (&self.slots[a], &self.slots[b]);
            sb.priority
                .total_cmp(&sa.priority)
                .then(sa.seq.cmp(&sb.seq))
        });
        order
    }
}

impl<T> Default for PriorityVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityCollection<T> for PriorityVec<T> {
    fn add_with(&mut self, item: T, priority: f64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.push(Slot {
            item,
            priority,
            seq,
        });
        self.cursor = None;
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn peek(&self) -> Option<&T> {
        self.slots
            .iter()
            .min_by(|a, b| {
                b.priority
                    .total_cmp(&a.priority)
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|s| &s.item)
    }

    fn next(&mut self) -> Option<&T> {
        let pos = match self.cursor {
            None => 0,
            Some(c) => c + 1,
        };
        let order = self.sorted_indices();
        let idx = *order.get(pos)?;
        self.cursor = Some(pos);
        Some(&self.slots[idx].item)
    }

    fn previous(&mut self) -> Option<&T> {
        let pos = match self.cursor {
            Some(c) if c > 0 => c - 1,
            _ => return None,
        };
        let order = self.sorted_indices();
        let idx = order[pos];
        self.cursor = Some(pos);
        Some(&self.slots[idx].item)
    }

    fn consume(&mut self) -> Option<T> {
        let pos = self.cursor?;
        let order = self.sorted_indices();
        let idx = order[pos];
        let slot = self.slots.remove(idx);
        self.cursor = if pos == 0 { None } else { Some(pos - 1) };
        Some(slot.item)
    }

    fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    fn sorted_collect(&self) -> Vec<&T> {
        self.sorted().collect()
    }
}

/// Iterator over a [`PriorityVec`] in descending priority order.
pub struct Sorted<'a, T> {
    inner: std::vec::IntoIter<&'a Slot<T>>,
}

impl<'a, T> Iterator for Sorted<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().map(|s| &s.item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Sorted<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_is_non_increasing() {
        let mut q: PriorityVec<u32> = PriorityVec::new();

        // Deterministic scramble.
        for i in 0..100u32 {
            q.add_with(i, ((i * 7 + 13) % 100) as f64);
        }

        let mut last = f64::INFINITY;
        for item in q.sorted() {
            let p = q.priority_of(item).unwrap();
            assert!(p <= last, "priority order violated");
            last = p;
        }
    }

    #[test]
    fn default_priority_is_zero() {
        let mut q: PriorityVec<&str> = PriorityVec::new();
        q.add("plain");
        q.add_with("boosted", 1.0);
        q.add_with("sunk", -1.0);

        assert_eq!(q.priority_of(&"plain"), Some(0.0));
        let order: Vec<_> = q.sorted().copied().collect();
        assert_eq!(order, ["boosted", "plain", "sunk"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut q: PriorityVec<&str> = PriorityVec::new();
        q.add_with("first", 5.0);
        q.add_with("second", 5.0);
        q.add_with("third", 5.0);

        let order: Vec<_> = q.sorted().copied().collect();
        assert_eq!(order, ["first", "second", "third"]);
    }

    #[test]
    fn storage_stays_insertion_ordered() {
        let mut q: PriorityVec<u32> = PriorityVec::new();
        q.add_with(1, 1.0);
        q.add_with(2, 9.0);
        q.add_with(3, 5.0);

        let storage: Vec<_> = q.iter().copied().collect();
        assert_eq!(storage, [1, 2, 3]);

        let view: Vec<_> = q.sorted().copied().collect();
        assert_eq!(view, [2, 3, 1]);
    }

    #[test]
    fn cursor_walks_sorted_view() {
        let mut q: PriorityVec<&str> = PriorityVec::new();
        q.add_with("c", 1.0);
        q.add_with("a", 3.0);
        q.add_with("b", 2.0);

        assert_eq!(q.next(), Some(&"a"));
        assert_eq!(q.next(), Some(&"b"));
        assert_eq!(q.previous(), Some(&"a"));
        assert_eq!(q.next(), Some(&"b"));
        assert_eq!(q.next(), Some(&"c"));
        assert_eq!(q.next(), None);

        q.reset_cursor();
        assert_eq!(q.next(), Some(&"a"));
    }

    #[test]
    fn previous_before_first_is_none() {
        let mut q: PriorityVec<u32> = PriorityVec::new();
        q.add_with(1, 1.0);

        assert_eq!(q.previous(), None);
        assert_eq!(q.next(), Some(&1));
        assert_eq!(q.previous(), None);
    }

    #[test]
    fn consume_removes_under_cursor() {
        let mut q: PriorityVec<&str> = PriorityVec::new();
        q.add_with("a", 3.0);
        q.add_with("b", 2.0);
        q.add_with("c", 1.0);

        assert_eq!(q.next(), Some(&"a"));
        assert_eq!(q.next(), Some(&"b"));
        assert_eq!(q.consume(), Some("b"));
        assert_eq!(q.len(), 2);

        // Cursor stepped back to "a"; next resumes after the removed slot.
        assert_eq!(q.next(), Some(&"c"));
    }

    #[test]
    fn consume_without_cursor_is_none() {
        let mut q: PriorityVec<u32> = PriorityVec::new();
        q.add(1);
        assert_eq!(q.consume(), None);
    }

    #[test]
    fn drain_by_consume() {
        let mut q: PriorityVec<u32> = PriorityVec::new();
        for i in 0..10u32 {
            q.add_with(i, ((i * 3 + 1) % 10) as f64);
        }

        let mut drained = Vec::new();
        while q.next().is_some() {
            drained.push(q.consume().unwrap());
        }

        assert!(q.is_empty());
        assert_eq!(drained.len(), 10);

        // Drain order is descending priority.
        let mut last = f64::INFINITY;
        for item in &drained {
            let p = ((item * 3 + 1) % 10) as f64;
            assert!(p <= last);
            last = p;
        }
    }

    #[test]
    fn peek_matches_sorted_head() {
        let mut q: PriorityVec<u32> = PriorityVec::new();
        q.add_with(7, -2.5);
        q.add_with(8, 4.5);
        q.add_with(9, 4.5);

        assert_eq!(q.peek(), Some(&8));
        assert_eq!(q.sorted().next(), Some(&8));
    }

    #[test]
    fn mutation_resets_cursor() {
        let mut q: PriorityVec<u32> = PriorityVec::new();
        q.add_with(1, 2.0);
        q.add_with(2, 1.0);

        assert_eq!(q.next(), Some(&1));
        q.add_with(3, 3.0);

        // New highest-priority element is visible from the start.
        assert_eq!(q.next(), Some(&3));
    }
}
