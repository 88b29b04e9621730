use tempfile::NamedTempFile;

use tinybase::errors::{Error, InternalError};
use tinybase::record::{Record, EMAIL_MAX_LEN, USERNAME_MAX_LEN};
use tinybase::table::{InsertResult, Table};

fn record(id: u32) -> Record {
    Record::new(id, format!("user{id}"), format!("user{id}@example.com")).unwrap()
}

#[test]
fn basic_insert_and_select() {
    let tmp = NamedTempFile::new().unwrap();
    let mut table = Table::db_open(tmp.path()).unwrap();

    assert_eq!(
        table
            .execute_insert(Record::new(1, "user1", "person1@example.com").unwrap())
            .unwrap(),
        InsertResult::Success
    );

    let rows = table.execute_select().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 1);
    assert_eq!(rows[0].username, "user1");
    assert_eq!(rows[0].email, "person1@example.com");
}

#[test]
fn reinserting_same_key_is_rejected_and_state_is_unchanged() {
    let tmp = NamedTempFile::new().unwrap();
    let mut table = Table::db_open(tmp.path()).unwrap();

    table.execute_insert(record(1)).unwrap();
    let conflicting = Record::new(1, "someoneelse", "someone@example.com").unwrap();
    assert_eq!(
        table.execute_insert(conflicting).unwrap(),
        InsertResult::DuplicateKey
    );

    let rows = table.execute_select().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].username, "user1");
}

#[test]
fn out_of_order_inserts_are_scanned_in_ascending_key_order() {
    let tmp = NamedTempFile::new().unwrap();
    let mut table = Table::db_open(tmp.path()).unwrap();

    for id in [3, 1, 2] {
        assert_eq!(table.execute_insert(record(id)).unwrap(), InsertResult::Success);
    }

    let keys: Vec<u32> = table.execute_select().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(keys, vec![1, 2, 3]);
}

#[test]
fn fourteenth_insert_triggers_a_split() {
    let tmp = NamedTempFile::new().unwrap();
    let mut table = Table::db_open(tmp.path()).unwrap();

    for id in 1..=13u32 {
        assert_eq!(table.execute_insert(record(id)).unwrap(), InsertResult::Success);
    }
    let before = table.print_leaf(0).unwrap();
    assert!(before.contains("size 13"));

    assert_eq!(table.execute_insert(record(14)).unwrap(), InsertResult::Success);
    // The root page is now internal; print_leaf recurses into its children.
    let after = table.print_leaf(0).unwrap();
    assert!(after.contains("internal (size 1)"));
    assert!(after.contains("leaf"));

    // select still walks both leaf children and returns every row in order.
    let keys: Vec<u32> = table.execute_select().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(keys, (1..=14).collect::<Vec<u32>>());
}

#[test]
fn close_then_reopen_preserves_the_scan() {
    let tmp = NamedTempFile::new().unwrap();
    {
        let mut table = Table::db_open(tmp.path()).unwrap();
        for id in [5, 2, 8, 1] {
            table.execute_insert(record(id)).unwrap();
        }
        table.db_close().unwrap();
    }

    let mut table = Table::db_open(tmp.path()).unwrap();
    let keys: Vec<u32> = table.execute_select().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(keys, vec![1, 2, 5, 8]);
}

#[test]
fn file_length_is_an_exact_multiple_of_the_page_size_after_close() {
    let tmp = NamedTempFile::new().unwrap();
    {
        let mut table = Table::db_open(tmp.path()).unwrap();
        for id in 1..=20u32 {
            table.execute_insert(record(id)).unwrap();
        }
        table.db_close().unwrap();
    }
    let len = std::fs::metadata(tmp.path()).unwrap().len();
    assert_eq!(len % 4096, 0);
    assert!(len > 0);
}

#[test]
fn username_and_email_accept_exactly_the_maximum_length() {
    let username = "a".repeat(USERNAME_MAX_LEN);
    let email = "b".repeat(EMAIL_MAX_LEN);
    assert!(Record::new(1, username, email).is_ok());
}

#[test]
fn overlong_username_is_rejected_with_no_state_change() {
    let tmp = NamedTempFile::new().unwrap();
    let mut table = Table::db_open(tmp.path()).unwrap();

    let too_long = "a".repeat(USERNAME_MAX_LEN + 1);
    let err = Record::new(1, too_long, "person1@example.com").unwrap_err();
    assert!(matches!(err, Error::StringTooLong { column: "username", .. }));

    assert!(table.execute_select().unwrap().is_empty());
}

#[test]
fn reopening_a_truncated_file_reports_corruption() {
    let tmp = NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), vec![0u8; 4000]).unwrap();
    let err = Table::db_open(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::Internal(InternalError::CorruptFile { .. })));
}
