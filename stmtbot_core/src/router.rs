use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin selection over a fixed operator pool.
///
/// The cursor is kept reduced modulo the pool length, so it never overflows.
#[derive(Debug)]
pub struct OperatorRouter {
    operators: Vec<String>,
    cursor: AtomicUsize,
}

impl OperatorRouter {
    #[must_use]
    pub const fn new(operators: Vec<String>) -> Self {
        Self {
            operators,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Return the operator whose turn it is and advance the cursor.
    pub fn next_operator(&self) -> Option<&str> {
        let len = self.operators.len();
        if len == 0 {
            return None;
        }

        let previous = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);

        self.operators.get(previous % len).map(String::as_str)
    }

    /// Index of the operator that the next hand-off will target.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(ids: &[&str]) -> OperatorRouter {
        OperatorRouter::new(ids.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_cycles_in_order_and_wraps() {
        let router = pool(&["a", "b", "c"]);
        let visited: Vec<_> = (0..7)
            .filter_map(|_| router.next_operator().map(str::to_string))
            .collect();
        assert_eq!(visited, vec!["a", "b", "c", "a", "b", "c", "a"]);
        assert_eq!(router.position(), 1);
    }

    #[test]
    fn test_continues_from_current_position() {
        let router = pool(&["a", "b", "c"]);
        router.next_operator();
        router.next_operator();
        assert_eq!(router.position(), 2);
        assert_eq!(router.next_operator(), Some("c"));
        assert_eq!(router.next_operator(), Some("a"));
    }

    #[test]
    fn test_single_operator_always_selected() {
        let router = pool(&["only"]);
        for _ in 0..5 {
            assert_eq!(router.next_operator(), Some("only"));
        }
        assert_eq!(router.position(), 0);
    }

    #[test]
    fn test_empty_pool_yields_none() {
        let router = pool(&[]);
        assert!(router.is_empty());
        assert_eq!(router.next_operator(), None);
    }

    #[test]
    fn test_duplicate_entries_are_visited_separately() {
        let router = pool(&["x", "x", "y"]);
        assert_eq!(router.len(), 3);
        assert_eq!(router.next_operator(), Some("x"));
        assert_eq!(router.next_operator(), Some("x"));
        assert_eq!(router.next_operator(), Some("y"));
    }
}
