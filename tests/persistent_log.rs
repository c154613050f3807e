use bootguard::{DeviceClock, EventLog, EventRecord, FileLogStore};

struct FakeClock {
    now_ms: u64,
}

impl DeviceClock for FakeClock {
    fn now_ms(&mut self) -> u64 {
        self.now_ms += 500;
        self.now_ms
    }
}

#[test]
fn records_survive_a_simulated_reset() {
    let dir = tempfile::tempdir().expect("tempdir created");
    let path = dir.path().join("event_log.json");

    {
        let mut log = EventLog::new(FileLogStore::new(&path), FakeClock { now_ms: 0 });
        log.init().expect("init succeeds");
        log.append("BOOT_LOOP_DETECTED", Some("count=3"))
            .expect("append succeeds");
        log.append("ROLLBACK_TRIGGERED", Some("from=app0,to=app1"))
            .expect("append succeeds");
    }

    // A fresh instance on the same path models the post-rollback reboot.
    let mut reopened = EventLog::new(FileLogStore::new(&path), FakeClock { now_ms: 0 });
    reopened.init().expect("init succeeds");
    assert_eq!(reopened.count(), 2);

    let records: Vec<EventRecord> =
        serde_json::from_str(&reopened.read_all().expect("read succeeds"))
            .expect("container parses");
    assert_eq!(records[0].msg, "BOOT_LOOP_DETECTED");
    assert_eq!(records[1].msg, "ROLLBACK_TRIGGERED");
    assert_eq!(records[1].ctx.as_deref(), Some("from=app0,to=app1"));
}

#[test]
fn init_is_idempotent_on_an_existing_container() {
    let dir = tempfile::tempdir().expect("tempdir created");
    let path = dir.path().join("event_log.json");

    let mut log = EventLog::new(FileLogStore::new(&path), FakeClock { now_ms: 0 });
    log.init().expect("init succeeds");
    log.append("API_INIT_FAIL", None).expect("append succeeds");
    log.init().expect("second init succeeds");

    assert_eq!(log.count(), 1);
}
