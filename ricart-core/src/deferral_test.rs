#[cfg(test)]
mod tests {
    use crate::deferral::{DeferralQueue, DeferredReply};
    use crate::types::{ClientId, ResourceName};

    #[test]
    fn flush_yields_in_insertion_order_and_empties_queue() {
        let mut queue = DeferralQueue::new();
        queue.defer(ClientId(3), ResourceName::from("f"));
        queue.defer(ClientId(2), ResourceName::from("f"));
        assert_eq!(queue.len(), 2);

        let flushed: Vec<DeferredReply> = queue.flush().collect();
        assert!(queue.is_empty());
        assert_eq!(
            flushed.iter().map(|d| d.from).collect::<Vec<_>>(),
            vec![ClientId(3), ClientId(2)]
        );
    }

    #[test]
    fn flush_is_one_shot() {
        let mut queue = DeferralQueue::new();
        queue.defer(ClientId(1), ResourceName::from("f"));

        let mut flush = queue.flush();
        assert_eq!(flush.len(), 1);
        assert!(flush.next().is_some());
        assert!(flush.next().is_none());

        // A second flush sees nothing left
        assert_eq!(queue.flush().count(), 0);
    }

    #[test]
    fn entries_deferred_after_flush_go_to_the_next_flush() {
        let mut queue = DeferralQueue::new();
        queue.defer(ClientId(1), ResourceName::from("f"));
        let first = queue.flush();
        queue.defer(ClientId(2), ResourceName::from("f"));

        assert_eq!(first.map(|d| d.from).collect::<Vec<_>>(), vec![ClientId(1)]);
        assert_eq!(queue.flush().map(|d| d.from).collect::<Vec<_>>(), vec![ClientId(2)]);
    }
}
