#[cfg(test)]
mod tests {
    use crate::clock::LogicalClock;
    use crate::types::Timestamp;

    #[test]
    fn tick_advances_by_one() {
        let mut clock = LogicalClock::new();
        assert_eq!(clock.tick(), Timestamp(1));
        assert_eq!(clock.tick(), Timestamp(2));
        assert_eq!(clock.now(), Timestamp(2));
    }

    #[test]
    fn observe_takes_max_plus_one() {
        let mut clock = LogicalClock::new();
        clock.observe(Timestamp(10));
        assert_eq!(clock.now(), Timestamp(11));

        // Older remote timestamps still advance the clock
        clock.observe(Timestamp(3));
        assert_eq!(clock.now(), Timestamp(12));
    }

    #[test]
    fn local_requests_never_share_a_timestamp() {
        let mut clock = LogicalClock::new();
        let mut seen = Vec::new();
        for remote in [0, 7, 2, 7, 30] {
            seen.push(clock.tick());
            clock.observe(Timestamp(remote));
        }
        let mut deduped = seen.clone();
        deduped.dedup();
        assert_eq!(seen, deduped);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn starting_at_presets_the_counter() {
        let mut clock = LogicalClock::starting_at(Timestamp(4));
        assert_eq!(clock.tick(), Timestamp(5));
    }

    #[test]
    fn observe_saturates_at_the_maximum() {
        let mut clock = LogicalClock::new();
        clock.observe(Timestamp(u64::MAX));
        assert_eq!(clock.now(), Timestamp(u64::MAX));

        assert_eq!(clock.tick(), Timestamp(u64::MAX));
        clock.observe(Timestamp(u64::MAX - 1));
        assert_eq!(clock.now(), Timestamp(u64::MAX));
    }
}
