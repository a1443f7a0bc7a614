//! The eight CRUD operations end to end

use crate::common::*;

mod find {
    use super::*;

    #[test]
    fn find_one_by_email_returns_seeded_row() {
        let db = TestDb::new();
        db.seed_user();

        let row = db
            .adapter()
            .find_one("user", &[FilterClause::eq("email", "a@b.com")], None, None)
            .unwrap()
            .expect("row");
        assert_eq!(row.get_str("id"), Some("u1"));
        assert_eq!(row.get_str("email"), Some("a@b.com"));
        assert_eq!(row.get_str("name"), Some("A"));
    }

    #[test]
    fn find_one_without_match_is_none() {
        let db = TestDb::new();
        db.seed_user();

        let row = db
            .adapter()
            .find_one("user", &[FilterClause::eq("email", "x@y.com")], None, None)
            .unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn find_one_projects_select_list() {
        let db = TestDb::new();
        db.seed_user();

        let select = vec!["id".to_string(), "email".to_string()];
        let row = db
            .adapter()
            .find_one("users", &[FilterClause::eq("id", "u1")], Some(select.as_slice()), None)
            .unwrap()
            .unwrap();
        assert_eq!(row.names().collect::<Vec<_>>(), vec!["email", "id"]);
    }

    #[test]
    fn unlisted_operator_token_compiles_as_equality() {
        let db = TestDb::new();
        db.seed_user();

        let row = db
            .adapter()
            .find_one(
                "user",
                &[FilterClause::new("email", "equals", "a@b.com")],
                None,
                None,
            )
            .unwrap();
        assert!(row.is_some());
    }

    #[test]
    fn text_operators_ignore_case() {
        let db = TestDb::new();
        db.seed_user();

        let adapter = db.adapter();
        for (op, needle) in [
            ("contains", "@B."),
            ("starts_with", "A@"),
            ("ends_with", ".COM"),
        ] {
            let n = adapter
                .count("user", &[FilterClause::new("email", op, needle)])
                .unwrap();
            assert_eq!(n, 1, "{op} {needle}");
        }
    }

    #[test]
    fn or_clause_applies_against_unfiltered_query() {
        let db = TestDb::new();
        db.seed_user();
        db.adapter()
            .create("user", user_row("u2", "c@d.com", "C"), None)
            .unwrap();

        // name = A AND ... then OR email = c@d.com: the AND clause is dropped
        let rows = db
            .adapter()
            .find_many(
                "user",
                &[
                    FilterClause::eq("name", "A"),
                    FilterClause::eq("email", "c@d.com").or(),
                ],
                None,
                None,
                None,
                None,
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("id"), Some("u2"));
    }

    #[test]
    fn find_many_sorts_and_paginates_root_rows() {
        let db = TestDb::new();
        db.seed_prompts(5, 0);

        let sort = SortSpec::new("promptId", "DESC");
        let rows = db
            .adapter()
            .find_many("prompts", &[], Some(&sort), Some(2), Some(1), None)
            .unwrap();
        let ids: Vec<i64> = rows.iter().filter_map(|r| r.get_i64("promptId")).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[test]
    fn sort_direction_token_is_case_insensitive() {
        let db = TestDb::new();
        db.seed_prompts(3, 0);

        let sort = SortSpec::new("promptId", "Asc");
        let rows = db
            .adapter()
            .find_many("prompts", &[], Some(&sort), None, None, None)
            .unwrap();
        let ids: Vec<i64> = rows.iter().filter_map(|r| r.get_i64("promptId")).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn in_and_not_in_operators() {
        let db = TestDb::new();
        db.seed_prompts(4, 0);
        let set = Value::Array(vec![Value::Int(1), Value::Int(3)]);

        let adapter = db.adapter();
        let hit = adapter
            .count("prompts", &[FilterClause::new("promptId", "in", set.clone())])
            .unwrap();
        let miss = adapter
            .count("prompts", &[FilterClause::new("promptId", "not_in", set)])
            .unwrap();
        assert_eq!((hit, miss), (2, 2));
    }
}

mod validation {
    use super::*;

    #[test]
    fn unknown_model_is_rejected() {
        let db = TestDb::new();
        let err = db.adapter().count("organizations", &[]).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownModel {
                model: "organizations".to_string()
            }
        );
    }

    #[test]
    fn model_names_are_case_sensitive() {
        let db = TestDb::new();
        assert!(matches!(
            db.adapter().count("Users", &[]),
            Err(Error::UnknownModel { .. })
        ));
    }

    #[test]
    fn unknown_select_column_lists_every_offender() {
        let db = TestDb::new();
        let select = vec!["email".to_string(), "role".to_string(), "tenant".to_string()];
        let err = db
            .adapter()
            .create("user", user_row("u1", "a@b.com", "A"), Some(select.as_slice()))
            .unwrap_err();
        match err {
            Error::UnknownColumn { entity, columns } => {
                assert_eq!(entity, EntityName::User);
                assert_eq!(columns, vec!["role".to_string(), "tenant".to_string()]);
            }
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
        assert_eq!(db.rows(EntityName::User), 0);
    }

    #[test]
    fn unknown_update_column_is_rejected() {
        let db = TestDb::new();
        db.seed_user();
        let err = db
            .adapter()
            .update(
                "user",
                &[FilterClause::eq("id", "u1")],
                Row::new().with("isAdmin", true),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { .. }));
    }

    #[test]
    fn unknown_filter_column_is_rejected_by_engine() {
        let db = TestDb::new();
        let err = db
            .adapter()
            .count("user", &[FilterClause::eq("passwordHash", "x")])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { .. }));
    }

    #[test]
    fn session_without_expiry_is_constraint_violation() {
        let db = TestDb::new();
        let err = db
            .adapter()
            .create("session", Row::new().with("token", "t"), None)
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { .. }));
        assert_eq!(db.rows(EntityName::Session), 0);
    }

    #[test]
    fn duplicate_email_is_constraint_violation() {
        let db = TestDb::new();
        db.seed_user();
        let err = db
            .adapter()
            .create("user", user_row("u2", "a@b.com", "B"), None)
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { .. }));
        assert_eq!(db.rows(EntityName::User), 1);
    }
}

mod write {
    use super::*;

    #[test]
    fn create_fills_engine_defaults() {
        let db = TestDb::new();
        let row = db
            .adapter()
            .create("user", Row::new().with("email", "a@b.com").with("name", "A"), None)
            .unwrap();
        assert!(row.get_str("id").is_some());
        assert_eq!(row.get("emailVerified"), Some(&Value::Bool(false)));
        assert!(row.get_i64("createdAt").is_some());
    }

    #[test]
    fn create_verification_with_composite_key() {
        let db = TestDb::new();
        let adapter = db.adapter();
        let v = |value: &str| {
            Row::new()
                .with("identifier", "email-verification:a@b.com")
                .with("value", value)
                .with("expiresAt", 1_000i64)
        };
        adapter.create("verification", v("123456"), None).unwrap();
        adapter.create("verification", v("654321"), None).unwrap();
        assert!(adapter.create("verification", v("123456"), None).is_err());
    }

    #[test]
    fn update_touches_at_most_one_row() {
        let db = TestDb::new();
        db.seed_prompts(3, 0);

        let row = db
            .adapter()
            .update(
                "prompts",
                &[FilterClause::eq("isActive", true)],
                Row::new().with("category", "gratitude"),
            )
            .unwrap()
            .expect("updated row");
        assert_eq!(row.get_str("category"), Some("gratitude"));
        // all columns come back
        assert!(row.contains("text"));

        let tagged = db
            .adapter()
            .count("prompts", &[FilterClause::eq("category", "gratitude")])
            .unwrap();
        assert_eq!(tagged, 1);
    }

    #[test]
    fn update_without_match_is_none() {
        let db = TestDb::new();
        let row = db
            .adapter()
            .update(
                "user",
                &[FilterClause::eq("id", "nobody")],
                Row::new().with("name", "X"),
            )
            .unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn update_many_returns_every_updated_row() {
        let db = TestDb::new();
        db.seed_prompts(3, 2);

        let rows = db
            .adapter()
            .update_many(
                "prompts",
                &[FilterClause::eq("isActive", true)],
                Row::new().with("isActive", false),
            )
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.get("isActive") == Some(&Value::Bool(false))));
    }

    #[test]
    fn delete_is_physical_for_every_entity() {
        let db = TestDb::new();
        db.seed_user();
        db.seed_sessions("u1", 2);

        let adapter = db.adapter();
        adapter
            .delete("session", &[FilterClause::eq("id", "u1-s0")])
            .unwrap();
        adapter.delete("user", &[FilterClause::eq("id", "u1")]).unwrap();

        assert_eq!(db.rows(EntityName::Session), 1);
        assert_eq!(db.rows(EntityName::User), 0);
    }

    #[test]
    fn session_delete_many_marks_rows_invalid() {
        let db = TestDb::new();
        db.seed_user();
        db.seed_sessions("u1", 3);
        db.seed_sessions("u2", 1);

        let affected = db
            .adapter()
            .delete_many("sessions", &[FilterClause::eq("userId", "u1")])
            .unwrap();
        assert_eq!(affected, 3);
        assert_eq!(db.rows(EntityName::Session), 4);

        let adapter = db.adapter();
        let marked = adapter
            .count("session", &[FilterClause::new("markedInvalidAt", "ne", Value::Null)])
            .unwrap();
        assert_eq!(marked, 3);
        let untouched = adapter
            .find_one("session", &[FilterClause::eq("userId", "u2")], None, None)
            .unwrap()
            .unwrap();
        assert_eq!(untouched.get("markedInvalidAt"), Some(&Value::Null));
    }

    #[test]
    fn delete_many_on_other_entities_is_physical() {
        let db = TestDb::new();
        db.seed_prompts(3, 2);

        let removed = db
            .adapter()
            .delete_many("prompts", &[FilterClause::eq("isActive", false)])
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(db.rows(EntityName::Prompt), 3);
    }
}

mod count {
    use super::*;

    #[test]
    fn count_active_prompts() {
        let db = TestDb::new();
        db.seed_prompts(3, 2);

        let n = db
            .adapter()
            .count("prompts", &[FilterClause::eq("isActive", true)])
            .unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn count_without_filter_is_total() {
        let db = TestDb::new();
        db.seed_prompts(3, 2);
        assert_eq!(db.adapter().count("prompt", &[]).unwrap(), 5);
    }
}
