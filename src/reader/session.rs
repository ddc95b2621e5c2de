use std::collections::HashMap;

/// Running per-tag read counts for one reader connection.
#[derive(Debug, Default)]
pub struct SessionCounter {
    counts: HashMap<String, u64>,
}

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more read of `tag_id` and return the new total (first read is 1).
    pub fn record(&mut self, tag_id: &str) -> u64 {
        let count = self.counts.entry(tag_id.to_string()).or_default();
        *count += 1;
        *count
    }

    pub fn count(&self, tag_id: &str) -> u64 {
        self.counts.get(tag_id).copied().unwrap_or(0)
    }

    pub fn distinct_tags(&self) -> usize {
        self.counts.len()
    }

    pub fn total_reads(&self) -> u64 {
        self.counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_start_at_one_and_increase() {
        let mut c = SessionCounter::new();
        assert_eq!(c.count("A1"), 0);
        assert_eq!(c.record("A1"), 1);
        assert_eq!(c.record("A1"), 2);
        assert_eq!(c.record("B2"), 1);
        assert_eq!(c.record("A1"), 3);
        assert_eq!(c.distinct_tags(), 2);
        assert_eq!(c.total_reads(), 4);
    }
}
