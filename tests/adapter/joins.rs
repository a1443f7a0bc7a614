//! Relation joins through findOne / findMany

use crate::common::*;

fn sessions_of_user(relation: Cardinality) -> JoinMap {
    JoinMap::new().with("sessions", JoinDescriptor::new("id", "userId").relation(relation))
}

fn by_id(id: &str) -> Vec<FilterClause> {
    vec![FilterClause::eq("id", id)]
}

#[test]
fn one_to_one_attaches_single_object() {
    let db = TestDb::new();
    db.seed_user();
    db.seed_sessions("u1", 3);

    let join = sessions_of_user(Cardinality::OneToOne);
    let row = db
        .adapter()
        .find_one("user", &by_id("u1"), None, Some(&join))
        .unwrap()
        .unwrap();

    let related = row.get("sessions").expect("relation attached");
    let session = related.as_object().expect("one-to-one is an object");
    assert_eq!(session.get("userId"), Some(&Value::from("u1")));
}

#[test]
fn one_to_one_without_match_is_null() {
    let db = TestDb::new();
    db.seed_user();

    let join = sessions_of_user(Cardinality::OneToOne);
    let row = db
        .adapter()
        .find_one("user", &by_id("u1"), None, Some(&join))
        .unwrap()
        .unwrap();
    assert_eq!(row.get("sessions"), Some(&Value::Null));
}

#[test]
fn one_to_many_respects_limit() {
    let db = TestDb::new();
    db.seed_user();
    db.seed_sessions("u1", 5);

    let join = JoinMap::new().with("sessions", JoinDescriptor::new("id", "userId").limit(2));
    let row = db
        .adapter()
        .find_one("user", &by_id("u1"), None, Some(&join))
        .unwrap()
        .unwrap();

    let sessions = row.get("sessions").and_then(Value::as_array).expect("array");
    assert_eq!(sessions.len(), 2);
}

#[test]
fn one_to_many_without_limit_caps_at_default() {
    let db = TestDb::new();
    db.seed_user();
    db.seed_sessions("u1", authbridge::DEFAULT_JOIN_LIMIT + 5);

    let join = sessions_of_user(Cardinality::OneToMany);
    let row = db
        .adapter()
        .find_one("user", &by_id("u1"), None, Some(&join))
        .unwrap()
        .unwrap();

    let sessions = row.get("sessions").and_then(Value::as_array).unwrap();
    assert_eq!(sessions.len(), authbridge::DEFAULT_JOIN_LIMIT);
}

#[test]
fn zero_limit_means_default() {
    let db = TestDb::new();
    db.seed_user();
    db.seed_sessions("u1", 3);

    let join = JoinMap::new().with("sessions", JoinDescriptor::new("id", "userId").limit(0));
    let row = db
        .adapter()
        .find_one("user", &by_id("u1"), None, Some(&join))
        .unwrap()
        .unwrap();
    assert_eq!(row.get("sessions").and_then(Value::as_array).unwrap().len(), 3);
}

#[test]
fn many_to_one_from_session_to_user() {
    let db = TestDb::new();
    db.seed_user();
    db.seed_sessions("u1", 1);

    let join = JoinMap::new().with(
        "user",
        JoinDescriptor::new("userId", "id").relation(Cardinality::OneToOne),
    );
    let row = db
        .adapter()
        .find_one("session", &by_id("u1-s0"), None, Some(&join))
        .unwrap()
        .unwrap();
    let user = row.get("user").and_then(Value::as_object).unwrap();
    assert_eq!(user.get("email"), Some(&Value::from("a@b.com")));
}

#[test]
fn unknown_target_model_is_skipped() {
    let db = TestDb::new();
    db.seed_user();

    let join = JoinMap::new().with("organizations", JoinDescriptor::new("id", "ownerId"));
    let row = db
        .adapter()
        .find_one("user", &by_id("u1"), None, Some(&join))
        .unwrap()
        .unwrap();
    assert!(!row.contains("organizations"));
    assert_eq!(row.get_str("email"), Some("a@b.com"));
}

#[test]
fn unknown_join_column_is_rejected() {
    let db = TestDb::new();
    db.seed_user();

    let join = JoinMap::new().with("sessions", JoinDescriptor::new("id", "ownerId"));
    let err = db
        .adapter()
        .find_one("user", &by_id("u1"), None, Some(&join))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { entity: EntityName::Session, .. }));
}

#[test]
fn select_keeps_projection_and_adds_relation() {
    let db = TestDb::new();
    db.seed_user();
    db.seed_sessions("u1", 2);

    let select = vec!["email".to_string()];
    let join = sessions_of_user(Cardinality::OneToMany);
    let row = db
        .adapter()
        .find_one("user", &by_id("u1"), Some(select.as_slice()), Some(&join))
        .unwrap()
        .unwrap();
    assert_eq!(row.names().collect::<Vec<_>>(), vec!["email", "sessions"]);
}

#[test]
fn find_many_paginates_roots_not_relations() {
    let db = TestDb::new();
    for (i, id) in ["u1", "u2", "u3"].iter().enumerate() {
        db.adapter()
            .create("user", user_row(id, &format!("{id}@x.com"), &format!("U{i}")), None)
            .unwrap();
        db.seed_sessions(id, 2);
    }

    let join = sessions_of_user(Cardinality::OneToMany);
    let sort = SortSpec::new("email", "asc");
    let rows = db
        .adapter()
        .find_many("user", &[], Some(&sort), Some(2), None, Some(&join))
        .unwrap();

    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.get("sessions").and_then(Value::as_array).unwrap().len(), 2);
    }
}

#[test]
fn joins_ignored_when_experimental_joins_off() {
    let db = TestDb::new();
    db.factory.configure(AuthOptions {
        experimental_joins: false,
        ..AuthOptions::default()
    });
    db.seed_user();
    db.seed_sessions("u1", 1);

    let join = sessions_of_user(Cardinality::OneToOne);
    let row = db
        .adapter()
        .find_one("user", &by_id("u1"), None, Some(&join))
        .unwrap()
        .unwrap();
    assert!(!row.contains("sessions"));
}
