use indexmap::IndexSet;

/// Ids of messages already picked up by this process. Never shrinks.
#[derive(Debug, Default)]
pub struct SeenMessages {
    ids: IndexSet<String>,
}

impl SeenMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id had not been seen before.
    pub fn mark_seen(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_seen_once() {
        let mut seen = SeenMessages::new();
        assert!(seen.is_empty());
        assert!(!seen.is_seen("18c1"));

        assert!(seen.mark_seen("18c1"));
        assert!(!seen.mark_seen("18c1"));
        assert!(seen.mark_seen("18c2"));

        assert!(seen.is_seen("18c1"));
        assert!(seen.is_seen("18c2"));
        assert_eq!(seen.len(), 2);
    }
}
