//! Render statements without a database.
//!
//! Run with: cargo run --example sql_builder

use myorm::qb::{self, Arg};
use myorm::{Direction, StatementKind};

fn show(label: &str, kind: StatementKind, query: &myorm::Query) {
    let stmt = query.render(kind);
    println!("{label}:\n  {}\n  bindings: {:?}\n", stmt.sql, stmt.bindings);
}

fn main() -> anyhow::Result<()> {
    let active_users = qb::table("users u")
        .select(["u.id", "u.name as display_name"])
        .left_join_with("profiles p", |j| j.on("p.user_id", "u.id").where_null("p.deleted_at"))
        .where_eq("u.status", "active")
        .where_in("u.role", ["admin", "editor"])
        .or_where_raw("u.id = 1")
        .order_by("u.created_at", Direction::Desc)
        .limit_offset(20, 40);
    show("select", StatementKind::Select, &active_users);

    // Dynamic arguments, as a request handler might receive them.
    let dynamic = qb::table("orders").where_args(vec![
        Arg::from("total"),
        Arg::from(">="),
        Arg::from(100),
    ])?;
    show("dynamic where", StatementKind::Select, &dynamic);

    let report = qb::table("orders")
        .select(["user_id"])
        .select_raw("sum(total) as spent")
        .between("created_at", "2024-01-01", "2024-12-31")
        .group_by("user_id")
        .having_op("sum(total)", ">", 1000)
        .order_random();
    show("report", StatementKind::Select, &report);

    let insert = qb::table("users")
        .set("name", "alice")
        .set("email", "alice@example.com")
        .set_raw("created_at", "now()");
    show("insert", StatementKind::Insert, &insert);

    let update = qb::table("users")
        .set("status", "inactive")
        .set_fragment("login_count = 0")
        .where_op("last_login", "<", "2023-01-01");
    show("update", StatementKind::Update, &update);

    let delete = qb::table("sessions").where_op("expires_at", "<", "2024-06-01").limit(500);
    show("delete", StatementKind::Delete, &delete);

    Ok(())
}
