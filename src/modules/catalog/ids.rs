/// Hands out record ids seeded from wall-clock milliseconds.
///
/// Ids strictly increase within a process and skip any value the caller
/// reports as taken, so two records created in the same millisecond, or a
/// clock that steps backwards, never produce a duplicate.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Once the upward search would overflow `i64`, the lowest free
    /// non-negative id is handed out instead.
    pub fn next_id(&mut self, now_millis: i64, taken: impl Fn(i64) -> bool) -> i64 {
        let start = match self.last.checked_add(1) {
            Some(next) => now_millis.max(next),
            None => return self.lowest_free(&taken),
        };

        let mut candidate = start;
        while taken(candidate) {
            match candidate.checked_add(1) {
                Some(next) => candidate = next,
                None => return self.lowest_free(&taken),
            }
        }
        self.last = candidate;
        candidate
    }

    fn lowest_free(&mut self, taken: &impl Fn(i64) -> bool) -> i64 {
        let id = (0..i64::MAX).find(|id| !taken(*id)).unwrap_or(i64::MAX);
        tracing::warn!(id, "id space exhausted above the clock; reusing lowest free id");
        id
    }
}
