//! Lamport clock shared by the relay and the client.

use std::sync::Mutex;

/// Logical clock providing a total order consistent with causality.
///
/// The counter is only ever read or written under the internal lock, so
/// concurrent `advance`/`observe` calls never lose an update. The lock is
/// held for the duration of a single increment and never across I/O.
#[derive(Debug, Default)]
pub struct LamportClock {
    counter: Mutex<u64>,
}

impl LamportClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter by one and return the new value.
    ///
    /// Called exactly once per unit of causal work: once per outbound
    /// broadcast copy handed to the send path, once per locally generated
    /// event.
    pub fn advance(&self) -> u64 {
        let mut counter = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        *counter += 1;
        *counter
    }

    /// Fold a timestamp received from a peer into the local clock.
    ///
    /// Sets the counter to `max(local, received) + 1` and returns the new
    /// value, so local time always exceeds any externally observed time.
    pub fn observe(&self, received: u64) -> u64 {
        let mut counter = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        *counter = (*counter).max(received) + 1;
        *counter
    }

    /// Current counter value, without advancing.
    pub fn current(&self) -> u64 {
        *self.counter.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_strictly_increasing() {
        // given:
        let clock = LamportClock::new();

        // when / then:
        let mut previous = clock.current();
        for _ in 0..100 {
            let value = clock.advance();
            assert!(value > previous);
            previous = value;
        }
    }

    #[test]
    fn test_observe_jumps_past_received_time() {
        // given:
        let clock = LamportClock::new();
        clock.advance();

        // when: a peer reports a time far ahead of ours
        let value = clock.observe(40);

        // then:
        assert_eq!(value, 41);
        assert_eq!(clock.current(), 41);
    }

    #[test]
    fn test_observe_of_stale_time_still_increments() {
        // given:
        let clock = LamportClock::new();
        for _ in 0..10 {
            clock.advance();
        }

        // when: the received time is behind the local counter
        let value = clock.observe(3);

        // then: local time still moves forward
        assert_eq!(value, 11);
    }

    #[test]
    fn test_mixed_sequence_is_strictly_increasing() {
        // given:
        let clock = LamportClock::new();

        // when:
        let values = [
            clock.advance(),
            clock.observe(7),
            clock.advance(),
            clock.observe(2),
            clock.advance(),
        ];

        // then:
        for pair in values.windows(2) {
            assert!(pair[1] > pair[0], "expected {} > {}", pair[1], pair[0]);
        }
    }

    #[test]
    fn test_concurrent_advances_never_lose_an_update() {
        // given:
        let clock = std::sync::Arc::new(LamportClock::new());

        // when: 8 threads advance 1000 times each
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let clock = clock.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        clock.advance();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // then:
        assert_eq!(clock.current(), 8000);
    }
}
