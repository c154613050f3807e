use bootguard::{
    BootRecord, CounterStore, FileCounterStore, MemoryCounterStore, StoreError,
};

#[test]
fn memory_store_round_trips_the_record() {
    let mut store = MemoryCounterStore::new();
    assert!(store.load().expect("load succeeds").is_none());

    let record = BootRecord {
        boot_count: 2,
        validation_stage: 1,
        validation_start_ms: 1_234,
    };
    store.save(&record).expect("save succeeds");
    assert_eq!(store.load().expect("load succeeds"), Some(record));
}

#[test]
fn default_record_has_the_sequencer_disabled() {
    let record = BootRecord::default();
    assert_eq!(record.boot_count, 0);
    assert_eq!(record.validation_stage, -1);
    assert!(!record.validation_active());
}

#[test]
fn checksum_detects_a_tampered_field() {
    let mut store = MemoryCounterStore::new();
    store
        .save(&BootRecord {
            boot_count: 5,
            ..BootRecord::default()
        })
        .expect("save succeeds");

    let sealed = String::from_utf8(store.raw().expect("bytes present").to_vec())
        .expect("envelope is utf-8");
    let tampered = sealed.replace("\"boot_count\":5", "\"boot_count\":9");
    assert_ne!(sealed, tampered);

    let mut tampered_store = MemoryCounterStore::with_raw(tampered.into_bytes());
    match tampered_store.load() {
        Err(StoreError::Corrupt(reason)) => assert!(reason.contains("checksum")),
        other => panic!("expected corruption, got {other:?}"),
    }
}

#[test]
fn unknown_envelope_version_is_rejected() {
    let raw = r#"{"version":99,"checksum":"00","record":{"boot_count":0,"val_stage":-1,"val_start":0}}"#;
    let mut store = MemoryCounterStore::with_raw(raw.as_bytes().to_vec());
    match store.load() {
        Err(StoreError::Corrupt(reason)) => assert!(reason.contains("version")),
        other => panic!("expected corruption, got {other:?}"),
    }
}

#[test]
fn torn_write_is_detected_not_misread() {
    let mut store = MemoryCounterStore::new();
    store
        .save(&BootRecord {
            boot_count: 2,
            ..BootRecord::default()
        })
        .expect("save succeeds");

    let mut truncated = store.raw().expect("bytes present").to_vec();
    truncated.truncate(truncated.len() / 2);
    let mut torn_store = MemoryCounterStore::with_raw(truncated);
    assert!(matches!(torn_store.load(), Err(StoreError::Corrupt(_))));
}

#[test]
fn file_store_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir created");
    let mut store = FileCounterStore::new(dir.path().join("boot_record.json"));
    assert!(store.load().expect("load succeeds").is_none());

    let record = BootRecord {
        boot_count: 3,
        validation_stage: 2,
        validation_start_ms: 99,
    };
    store.save(&record).expect("save succeeds");
    assert_eq!(store.load().expect("load succeeds"), Some(record));
}

#[test]
fn unwritable_path_surfaces_as_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir created");
    // The path is a directory, so the write must fail.
    let mut store = FileCounterStore::new(dir.path());
    let err = store
        .save(&BootRecord::default())
        .expect_err("save fails on a directory");
    assert!(matches!(err, StoreError::Unavailable(_)));
}
