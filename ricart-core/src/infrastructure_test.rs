#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::infrastructure::{AccessLog, ResourceStore, Transport};
    use crate::infrastructure_fs::{DirectoryResourceStore, FileAccessLog};
    use crate::infrastructure_in_memory::{ChannelNetwork, InMemoryResourceStore, MemoryAccessLog};
    use crate::types::{Access, ClientId, Message, ResourceName, Timestamp};

    #[test]
    fn in_memory_store_open_missing_is_not_found() {
        let store = InMemoryResourceStore::new();
        let name = ResourceName::from("file1.txt");
        assert_eq!(store.open(&name), Err(StoreError::NotFound(name.clone())));
    }

    #[test]
    fn in_memory_store_tracks_write_history() {
        let store = InMemoryResourceStore::with_resource("file1.txt", "seed");
        let name = ResourceName::from("file1.txt");

        store.write(&name, "a").unwrap();
        store.write(&name, "b").unwrap();

        assert_eq!(store.read(&name).unwrap(), "b");
        assert_eq!(store.history(&name), vec!["a".to_string(), "b".to_string()]);
        // Clones share contents
        assert_eq!(store.clone().read(&name).unwrap(), "b");
    }

    #[test]
    fn directory_store_round_trips_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file1.txt"), "initial").unwrap();
        let store = DirectoryResourceStore::new(dir.path());
        let name = ResourceName::from("file1.txt");

        assert_eq!(store.open(&name).unwrap(), "initial");
        store.write(&name, "Content written by Client 2").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("file1.txt")).unwrap(),
            "Content written by Client 2"
        );
    }

    #[test]
    fn directory_store_rejects_missing_and_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryResourceStore::new(dir.path());

        for name in ["absent.txt", "../outside.txt", "nested/file.txt", ""] {
            let name = ResourceName::from(name);
            assert_eq!(store.open(&name), Err(StoreError::NotFound(name.clone())));
        }
    }

    #[test]
    fn directory_store_write_failure_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryResourceStore::new(dir.path().join("does-not-exist"));
        let name = ResourceName::from("file1.txt");

        assert!(matches!(store.write(&name, "x"), Err(StoreError::Io { .. })));
    }

    #[test]
    fn file_access_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_access.log");
        let log = FileAccessLog::new(&path);
        let name = ResourceName::from("file1.txt");

        log.record(ClientId(1), Access::Write, &name, Timestamp(3));
        log.record(ClientId(2), Access::Read, &name, Timestamp(7));

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Client 1 Write file file1.txt at timestamp 3\n\
             Client 2 Read file file1.txt at timestamp 7\n"
        );
    }

    #[test]
    fn file_access_log_failures_are_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        let log = FileAccessLog::new(dir.path());
        log.record(ClientId(1), Access::Read, &ResourceName::from("f"), Timestamp(1));
    }

    #[test]
    fn memory_access_log_keeps_order() {
        let log = MemoryAccessLog::new();
        log.record(ClientId(2), Access::Write, &ResourceName::from("f"), Timestamp(1));
        log.record(ClientId(1), Access::Read, &ResourceName::from("f"), Timestamp(2));

        let clients: Vec<ClientId> = log.records().iter().map(|r| r.client).collect();
        assert_eq!(clients, vec![ClientId(2), ClientId(1)]);
    }

    #[test]
    fn channel_network_is_fifo_per_sender() {
        let mut network = ChannelNetwork::new([ClientId(1), ClientId(2)]);
        assert_eq!(network.ids(), vec![ClientId(1), ClientId(2)]);

        let (from_1, _inbox_1) = network.connect(ClientId(1)).unwrap();
        let (_from_2, mut inbox_2) = network.connect(ClientId(2)).unwrap();
        assert!(network.connect(ClientId(2)).is_none());

        let f = ResourceName::from("f");
        from_1.send(
            ClientId(2),
            Message::Request {
                from: ClientId(1),
                resource: f.clone(),
                timestamp: Timestamp(1),
            },
        );
        from_1.send(ClientId(2), Message::acknowledge(ClientId(1), f.clone()));
        // Unknown destinations are dropped
        from_1.send(ClientId(9), Message::acknowledge(ClientId(1), f.clone()));

        assert!(matches!(inbox_2.try_recv(), Some(Message::Request { .. })));
        assert!(matches!(inbox_2.try_recv(), Some(Message::Acknowledge { .. })));
        assert!(inbox_2.try_recv().is_none());
    }

    #[test]
    fn messages_serialize_with_kind_tag() {
        let message = Message::acknowledge(ClientId(4), ResourceName::from("file1.txt"));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["kind"], "acknowledge");
        assert_eq!(json["from"], 4);
        assert_eq!(json["resource"], "file1.txt");
    }

    #[cfg(feature = "sqlite")]
    mod sqlite {
        use crate::error::StoreError;
        use crate::infrastructure::ResourceStore;
        use crate::infrastructure_sqlite::SqliteResourceStore;
        use crate::types::ResourceName;

        #[test]
        fn sqlite_store_persists_content_and_history() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("resources.db");
            let path = path.to_str().unwrap();
            let name = ResourceName::from("file1.txt");

            {
                let store = SqliteResourceStore::open(path).unwrap();
                assert_eq!(store.open(&name), Err(StoreError::NotFound(name.clone())));
                store.insert(&name, "seed").unwrap();
                store.write(&name, "a").unwrap();
                store.write(&name, "b").unwrap();
            }

            let reopened = SqliteResourceStore::open(path).unwrap();
            assert_eq!(reopened.read(&name).unwrap(), "b");
            assert_eq!(
                reopened.history(&name).unwrap(),
                vec!["a".to_string(), "b".to_string()]
            );
        }
    }
}
