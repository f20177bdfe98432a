use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Returns a process-unique connection id.
///
/// Seeded from the wall clock so ids from a restarted process are unlikely to repeat ids a
/// client saw before the restart.
pub fn next_conn_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(now_millis()));
    counter.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn when_many_ids_are_drawn_then_none_repeat() {
        let ids: HashSet<u64> = (0..1000).map(|_| next_conn_id()).collect();

        assert_eq!(ids.len(), 1000);
    }
}
