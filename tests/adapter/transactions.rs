//! Transactional factory: commit, rollback, configuration gating

use crate::common::*;

#[test]
fn run_transaction_before_configure_fails() {
    let factory = AdapterFactory::new(MemoryStore::new(), AdapterConfig::default());
    let result: Result<(), Error> = factory.run_transaction(|_| Ok(()));
    assert_eq!(result, Err(Error::NotConfigured));
}

#[test]
fn commit_publishes_every_write() {
    let db = TestDb::new();
    let result: Result<(), Error> = db.factory.run_transaction(|tx| {
        tx.create("user", user_row("u1", "a@b.com", "A"), None)?;
        tx.create("account", account_row("acc1", "u1", "github"), None)?;
        tx.create("session", session_row("s1", "u1"), None)?;
        Ok(())
    });
    assert!(result.is_ok());

    assert_eq!(db.rows(EntityName::User), 1);
    assert_eq!(db.rows(EntityName::Account), 1);
    assert_eq!(db.rows(EntityName::Session), 1);
}

#[test]
fn rollback_leaves_counts_unchanged() {
    let db = TestDb::new();
    db.seed_user();
    db.seed_sessions("u1", 2);

    let result: Result<(), Error> = db.factory.run_transaction(|tx| {
        tx.create("user", user_row("u2", "c@d.com", "C"), None)?;
        tx.delete_many("session", &[])?;
        tx.delete("user", &[FilterClause::eq("id", "u1")])?;
        Err(Error::invalid_input("signup rejected"))
    });
    assert!(result.is_err());

    assert_eq!(db.rows(EntityName::User), 1);
    assert_eq!(db.rows(EntityName::Session), 2);
    let marked = db
        .adapter()
        .count("session", &[FilterClause::new("markedInvalidAt", "ne", Value::Null)])
        .unwrap();
    assert_eq!(marked, 0);
}

#[test]
fn failing_operation_inside_callback_rolls_back() {
    let db = TestDb::new();
    db.seed_user();

    let result: Result<Row, Error> = db.factory.run_transaction(|tx| {
        tx.create("prompts", Row::new().with("text", "first"), None)?;
        // duplicate email aborts the whole unit of work
        tx.create("user", user_row("u2", "a@b.com", "B"), None)
    });
    assert!(matches!(result, Err(Error::ConstraintViolation { .. })));
    assert_eq!(db.rows(EntityName::Prompt), 0);
}

#[test]
fn callback_reads_its_own_writes() {
    let db = TestDb::new();
    let found: Result<Option<Row>, Error> = db.factory.run_transaction(|tx| {
        tx.create("user", user_row("u1", "a@b.com", "A"), None)?;
        tx.find_one("user", &[FilterClause::eq("email", "a@b.com")], None, None)
    });
    assert_eq!(found.unwrap().unwrap().get_str("id"), Some("u1"));
}

#[test]
fn uncommitted_writes_are_invisible_outside() {
    let db = TestDb::new();
    let result: Result<(), Error> = db.factory.run_transaction(|tx| {
        tx.create("user", user_row("u1", "a@b.com", "A"), None)?;
        assert_eq!(db.adapter().count("user", &[]).unwrap(), 0);
        Ok(())
    });
    assert!(result.is_ok());
    assert_eq!(db.adapter().count("user", &[]).unwrap(), 1);
}

#[test]
fn concurrent_commit_on_same_table_conflicts() {
    let db = TestDb::new();
    let result: Result<(), Error> = db.factory.run_transaction(|tx| {
        tx.create("user", user_row("u1", "a@b.com", "A"), None)?;
        // another writer commits to users first
        db.adapter()
            .create("user", user_row("u2", "c@d.com", "C"), None)?;
        Ok(())
    });
    assert!(matches!(result, Err(Error::TransactionConflict { .. })));
    assert_eq!(db.rows(EntityName::User), 1);
    assert_eq!(db.factory.executor().metrics().total_aborted, 1);
}

#[test]
fn disjoint_tables_commit_cleanly() {
    let db = TestDb::new();
    let result: Result<(), Error> = db.factory.run_transaction(|tx| {
        tx.create("user", user_row("u1", "a@b.com", "A"), None)?;
        db.adapter()
            .create("prompts", Row::new().with("text", "hello"), None)?;
        Ok(())
    });
    assert!(result.is_ok());
    assert_eq!(db.rows(EntityName::User), 1);
    assert_eq!(db.rows(EntityName::Prompt), 1);
}

#[test]
fn config_file_can_disable_transactions() {
    let (db, _dir) = TestDb::from_toml("transactions = false\n");
    assert!(!db.factory.config().transactions);

    let result: Result<(), Error> = db.factory.run_transaction(|tx| {
        tx.create("user", user_row("u1", "a@b.com", "A"), None)?;
        Err(Error::invalid_input("abort"))
    });
    assert!(result.is_err());
    // autocommit: nothing to roll back
    assert_eq!(db.rows(EntityName::User), 1);
}

#[test]
fn metrics_track_outcomes() {
    let db = TestDb::new();
    let _: Result<(), Error> = db.factory.run_transaction(|_| Ok(()));
    let _: Result<(), Error> = db.factory.run_transaction(|_| Err(Error::invalid_input("no")));

    let metrics = db.factory.executor().metrics();
    assert_eq!(metrics.total_started, 2);
    assert_eq!(metrics.total_committed, 1);
    assert_eq!(metrics.total_aborted, 1);
}
