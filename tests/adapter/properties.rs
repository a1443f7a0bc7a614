//! Property tests over random seedings

use crate::common::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn count_without_filter_matches_row_count(active in 0usize..12, inactive in 0usize..12) {
        let db = TestDb::new();
        db.seed_prompts(active, inactive);

        let adapter = db.adapter();
        prop_assert_eq!(adapter.count("prompts", &[]).unwrap(), (active + inactive) as u64);
        prop_assert_eq!(
            adapter.count("prompts", &[FilterClause::eq("isActive", true)]).unwrap(),
            active as u64
        );
    }

    #[test]
    fn session_delete_many_never_shrinks_table(n in 0usize..10, other in 0usize..5) {
        let db = TestDb::new();
        db.seed_sessions("u1", n);
        db.seed_sessions("u2", other);

        let affected = db
            .adapter()
            .delete_many("sessions", &[FilterClause::eq("userId", "u1")])
            .unwrap();
        prop_assert_eq!(affected, n as u64);
        prop_assert_eq!(db.rows(EntityName::Session), n + other);
    }

    #[test]
    fn delete_many_removes_exactly_matched_rows(active in 0usize..10, inactive in 0usize..10) {
        let db = TestDb::new();
        db.seed_prompts(active, inactive);

        let removed = db
            .adapter()
            .delete_many("prompt", &[FilterClause::eq("isActive", true)])
            .unwrap();
        prop_assert_eq!(removed, active as u64);
        prop_assert_eq!(db.rows(EntityName::Prompt), inactive);
    }

    #[test]
    fn lateral_join_bounded_by_limit(n in 0usize..12, limit in 1usize..6) {
        let db = TestDb::new();
        db.seed_user();
        db.seed_sessions("u1", n);

        let join = JoinMap::new().with("sessions", JoinDescriptor::new("id", "userId").limit(limit));
        let row = db
            .adapter()
            .find_one("user", &[FilterClause::eq("id", "u1")], None, Some(&join))
            .unwrap()
            .unwrap();
        let len = row.get("sessions").and_then(Value::as_array).map_or(0, <[Value]>::len);
        prop_assert_eq!(len, n.min(limit));
    }

    #[test]
    fn one_to_one_join_is_never_an_array(n in 0usize..6) {
        let db = TestDb::new();
        db.seed_user();
        db.seed_sessions("u1", n);

        let join = JoinMap::new().with(
            "sessions",
            JoinDescriptor::new("id", "userId").relation(Cardinality::OneToOne),
        );
        let row = db
            .adapter()
            .find_one("user", &[FilterClause::eq("id", "u1")], None, Some(&join))
            .unwrap()
            .unwrap();
        let related = row.get("sessions").unwrap();
        prop_assert_eq!(related.is_null(), n == 0);
        prop_assert!(related.as_array().is_none());
    }

    #[test]
    fn rollback_restores_every_count(users in 0usize..5, writes in 1usize..5) {
        let db = TestDb::new();
        for i in 0..users {
            db.adapter()
                .create("user", user_row(&format!("u{i}"), &format!("{i}@x.com"), "U"), None)
                .unwrap();
        }
        db.seed_prompts(2, 1);

        let result: Result<(), Error> = db.factory.run_transaction(|tx| {
            for i in 0..writes {
                tx.create("user", user_row(&format!("t{i}"), &format!("t{i}@x.com"), "T"), None)?;
            }
            tx.delete_many("prompts", &[])?;
            Err(Error::invalid_input("rollback"))
        });
        prop_assert!(result.is_err());
        prop_assert_eq!(db.rows(EntityName::User), users);
        prop_assert_eq!(db.rows(EntityName::Prompt), 3);
    }
}
