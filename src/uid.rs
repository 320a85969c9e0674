use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// `"1"`, `"2"`, ... or `"p-1"`, `"p-2"`, ...; one counter per prefix.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counters: Mutex<HashMap<Option<String>, u64>>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, prefix: Option<&str>) -> String {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let count = counters.entry(prefix.map(str::to_string)).or_insert(0);
        *count += 1;
        match prefix {
            Some(prefix) => format!("{prefix}-{count}"),
            None => count.to_string(),
        }
    }
}
