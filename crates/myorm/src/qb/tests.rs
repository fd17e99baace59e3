//! Rendering tests for the qb module.

use crate::qb::{
    Arg, BetweenPredicate, Direction, PredicateRequest, StatementKind, raw, table,
};
use crate::value::Value;

fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

#[test]
fn test_select_basic() {
    assert_eq!(table("users").to_sql(), "select * from users");
}

#[test]
fn test_select_terms_are_verbatim() {
    let q = table("users").select(["a", "b as c"]);
    assert_eq!(q.to_sql(), "select a, b as c from users");
}

#[test]
fn test_select_replaces_add_select_appends() {
    let q = table("t").select(["a"]).select(["b"]).add_select(["c"]);
    assert_eq!(q.to_sql(), "select b, c from t");

    let q = table("t").select(["a"]).select_raw("count(*) as n");
    assert_eq!(q.to_sql(), "select a, count(*) as n from t");

    let q = table("t").add_select([raw("max(id)")]);
    assert_eq!(q.to_sql(), "select max(id) from t");
}

#[test]
fn test_distinct() {
    let q = table("t").distinct().select(["city"]);
    assert_eq!(q.to_sql(), "select distinct city from t");
}

#[test]
fn test_where_map_expands_in_order() {
    let q = table("users").where_map([("id", Value::from(1)), ("name", Value::from("x"))]);
    let stmt = q.render(StatementKind::Select);
    assert_eq!(stmt.sql, "select * from users where id = ? and name = ?");
    assert_eq!(stmt.bindings, vec![Value::Int(1), Value::from("x")]);
}

#[test]
fn test_where_in() {
    let stmt = table("users")
        .where_in("id", [1, 2, 3])
        .render(StatementKind::Select);
    assert_eq!(stmt.sql, "select * from users where id in (?,?,?)");
    assert_eq!(stmt.bindings, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_where_conjunctions() {
    let stmt = table("users")
        .or_where_eq("a", 1)
        .where_op("b", ">", 2)
        .or_where_op("c", "like", "%x%")
        .render(StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "select * from users where a = ? and b > ? or c like ?"
    );
    assert_eq!(stmt.bindings.len(), 3);
}

#[test]
fn test_where_null_variants() {
    let stmt = table("users")
        .where_null("deleted_at")
        .where_not_null("email")
        .where_eq("parent_id", Value::Null)
        .or_where_null("archived_at")
        .render(StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "select * from users where deleted_at is null and email is not null and parent_id is null or archived_at is null"
    );
    assert!(stmt.bindings.is_empty());
}

#[test]
fn test_raw_where_binds_nothing() {
    let stmt = table("users")
        .where_eq("a", 1)
        .where_raw("created_at > now() - interval 1 day")
        .where_eq("b", 2)
        .render(StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "select * from users where a = ? and created_at > now() - interval 1 day and b = ?"
    );
    assert_eq!(stmt.bindings, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_where_args_dispatch() {
    let q = table("users")
        .where_args(vec!["id".into(), 1.into()])
        .unwrap()
        .where_args(vec!["age".into(), ">".into(), 30.into()])
        .unwrap()
        .or_where_args(vec![Arg::raw("vip = 1")])
        .unwrap();
    assert_eq!(
        q.to_sql(),
        "select * from users where id = ? and age > ? or vip = 1"
    );

    let err = table("users")
        .where_args(vec!["a".into(), "=".into(), 1.into(), 2.into()])
        .unwrap_err();
    assert!(matches!(
        err,
        crate::error::OrmError::InvalidArgumentCount { got: 4, .. }
    ));
}

#[test]
fn test_null_with_comparison_operator_binds_placeholder() {
    let stmt = table("t")
        .where_op("age", ">", None::<i32>)
        .render(StatementKind::Select);
    assert_eq!(stmt.sql, "select * from t where age > ?");
    assert_eq!(stmt.bindings, vec![Value::Null]);

    let stmt = table("t")
        .where_args(vec!["name".into(), "like".into(), Value::Null.into()])
        .unwrap()
        .render(StatementKind::Select);
    assert_eq!(stmt.sql, "select * from t where name like ?");
    assert_eq!(stmt.bindings, vec![Value::Null]);

    let stmt = table("users u")
        .join_with("orders o", |j| j.on("o.user_id", "u.id").where_op("o.total", ">=", Value::Null))
        .render(StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "select * from users u inner join orders o on o.user_id = u.id and o.total >= ?"
    );
    assert_eq!(stmt.bindings, vec![Value::Null]);
}

#[test]
fn test_filter_with_request() {
    let q = table("t")
        .filter(PredicateRequest::cmp("n", "<", Value::from(5)))
        .or_filter(PredicateRequest::raw("flag"));
    assert_eq!(q.to_sql(), "select * from t where n < ? or flag");
}

#[test]
fn test_between_after_where() {
    let stmt = table("people")
        .where_eq("country", "NZ")
        .between("age", 18, 30)
        .not_between("score", 0, 10)
        .render(StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "select * from people where country = ? and age between ? and ? and score not between ? and ?"
    );
    assert_eq!(
        stmt.bindings,
        vec![
            Value::from("NZ"),
            Value::Int(18),
            Value::Int(30),
            Value::Int(0),
            Value::Int(10)
        ]
    );
}

#[test]
fn test_between_only() {
    let stmt = table("people")
        .between("age", 18, 30)
        .render(StatementKind::Select);
    assert_eq!(stmt.sql, "select * from people where age between ? and ?");
    assert_eq!(stmt.bindings, vec![Value::Int(18), Value::Int(30)]);
}

#[test]
fn test_between_with_raw_bound() {
    let q = table("events").between_predicate(BetweenPredicate::new(
        "starts_at",
        raw("now()"),
        Value::from("2030-01-01"),
    ));
    let stmt = q.render(StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "select * from events where starts_at between now() and ?"
    );
    assert_eq!(stmt.bindings.len(), 1);
}

#[test]
fn test_group_having_order_limit() {
    let stmt = table("orders")
        .select(["user_id", "count(*) as n"])
        .where_eq("status", "paid")
        .group_by("user_id")
        .having_op("n", ">", 2)
        .between_having("n", 3, 9)
        .order_by_desc("n")
        .order_by_asc("user_id")
        .limit_offset(10, 20)
        .render(StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "select user_id, count(*) as n from orders where status = ? group by user_id having n > ? and n between ? and ? order by n desc, user_id asc limit 20, 10"
    );
    assert_eq!(
        stmt.bindings,
        vec![
            Value::from("paid"),
            Value::Int(2),
            Value::Int(3),
            Value::Int(9)
        ]
    );
}

#[test]
fn test_limit_rules() {
    assert_eq!(
        table("t").limit(10).offset(20).to_sql(),
        "select * from t limit 20, 10"
    );
    assert_eq!(table("t").limit(10).to_sql(), "select * from t limit 10");
    assert_eq!(table("t").limit(0).offset(5).to_sql(), "select * from t");
    assert_eq!(table("t").limit(-1).to_sql(), "select * from t");
    // zero offset leaves the previous one in place
    assert_eq!(
        table("t").offset(5).limit_offset(3, 0).to_sql(),
        "select * from t limit 5, 3"
    );
}

#[test]
fn test_order_random_and_raw() {
    let q = table("t")
        .order_random()
        .order_by("x", Direction::Random)
        .order_raw("field(id, 3, 1, 2)");
    assert_eq!(
        q.to_sql(),
        "select * from t order by rand(), rand(), field(id, 3, 1, 2)"
    );
}

#[test]
fn test_group_raw() {
    let q = table("t").group_by("a").group_raw("year(created_at)");
    assert_eq!(q.to_sql(), "select * from t group by a, year(created_at)");
}

#[test]
fn test_joins() {
    let q = table("users u")
        .join("orders o", "o.user_id", "u.id")
        .left_join_op("profiles p", "p.user_id", "=", "u.id")
        .right_join_with("tags t", |j| j.on("t.user_id", "u.id").where_eq("t.kind", "x"))
        .join_raw("cross join settings s");
    let stmt = q.render(StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "select * from users u inner join orders o on o.user_id = u.id left join profiles p on p.user_id = u.id right join tags t on t.user_id = u.id and t.kind = ? cross join settings s"
    );
    assert_eq!(stmt.bindings, vec![Value::from("x")]);
}

#[test]
fn test_join_values_precede_where_values() {
    let stmt = table("users u")
        .join_with("orders o", |j| j.on("o.user_id", "u.id").where_in("o.status", ["a", "b"]))
        .where_eq("u.id", 7)
        .render(StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "select * from users u inner join orders o on o.user_id = u.id and o.status in (?,?) where u.id = ?"
    );
    assert_eq!(
        stmt.bindings,
        vec![Value::from("a"), Value::from("b"), Value::Int(7)]
    );
}

#[test]
fn test_insert_render() {
    let stmt = table("users")
        .set("name", "alice")
        .set("age", 30)
        .set_raw("created_at", "now()")
        .where_eq("ignored", 1)
        .render(StatementKind::Insert);
    assert_eq!(
        stmt.sql,
        "insert into users set name = ?, age = ?, created_at = now()"
    );
    assert_eq!(stmt.bindings, vec![Value::from("alice"), Value::Int(30)]);
}

#[test]
fn test_update_render_binds_set_before_where() {
    let stmt = table("users")
        .where_eq("id", 9)
        .set("name", "bob")
        .set_fragment("hits = hits + 1")
        .between("age", 1, 2)
        .render(StatementKind::Update);
    assert_eq!(
        stmt.sql,
        "update users set name = ?, hits = hits + 1 where id = ? and age between ? and ?"
    );
    assert_eq!(
        stmt.bindings,
        vec![Value::from("bob"), Value::Int(9), Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn test_update_and_delete_without_where() {
    assert_eq!(
        table("users").set("a", 1).render(StatementKind::Update).sql,
        "update users set a = ?"
    );
    assert_eq!(
        table("users").render(StatementKind::Delete).sql,
        "delete from users"
    );
}

#[test]
fn test_delete_render() {
    let stmt = table("sessions")
        .where_op("expires_at", "<", "2024-01-01")
        .order_by_asc("id")
        .limit_offset(100, 50)
        .render(StatementKind::Delete);
    assert_eq!(
        stmt.sql,
        "delete from sessions where expires_at < ? order by id asc limit 100"
    );
}

#[test]
fn test_select_ignores_set() {
    let q = table("t").set("a", 1);
    let stmt = q.render(StatementKind::Select);
    assert_eq!(stmt.sql, "select * from t");
    assert!(stmt.bindings.is_empty());
}

#[test]
fn test_render_is_repeatable() {
    let q = table("t").where_eq("a", 1).between("b", 2, 3);
    let first = q.render(StatementKind::Select);
    let second = q.render(StatementKind::Select);
    assert_eq!(first, second);
    assert_eq!(first.bindings.len(), 3);
}

#[test]
fn test_clones_do_not_alias() {
    let base = table("users").where_eq("active", true);
    let admins = base.clone().where_eq("role", "admin");
    let guests = base.clone().where_eq("role", "guest");
    assert_eq!(base.to_sql(), "select * from users where active = ?");
    assert_eq!(
        admins.to_sql(),
        "select * from users where active = ? and role = ?"
    );
    assert_eq!(admins.to_sql(), guests.to_sql());
    assert_ne!(
        admins.render(StatementKind::Select).bindings,
        guests.render(StatementKind::Select).bindings
    );
}

#[test]
fn test_placeholder_count_matches_bindings() {
    let q = table("a")
        .join_with("b", |j| j.on("a.id", "b.a_id").where_op("b.n", ">", 1))
        .set("x", 1)
        .where_in("id", [1, 2])
        .where_raw("z is not null")
        .or_where_eq("y", "q")
        .between("d", 1, 2)
        .group_by("g")
        .having_eq("h", 5)
        .between_having("h", 1, 9);
    for kind in [
        StatementKind::Select,
        StatementKind::Insert,
        StatementKind::Update,
        StatementKind::Delete,
    ] {
        let stmt = q.render(kind);
        assert_eq!(placeholders(&stmt.sql), stmt.bindings.len(), "{kind:?}");
    }
}

#[test]
fn test_display_is_select() {
    let q = table("users").where_eq("id", 1);
    assert_eq!(q.to_string(), "select * from users where id = ?");
}

#[test]
fn test_empty_in_list_never_matches() {
    let stmt = table("users")
        .where_in("id", Vec::<i64>::new())
        .render(StatementKind::Select);
    assert_eq!(stmt.sql, "select * from users where 1=0");
    assert!(stmt.bindings.is_empty());
}
