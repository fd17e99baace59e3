use myorm::{
    ConnectionOptions, ExecResult, GenericClient, OrmError, OrmResult, Row, Value, qb,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Returns canned result pages in order and records every statement.
#[derive(Default)]
struct RecordingClient {
    pages: Mutex<VecDeque<Vec<Row>>>,
    fail_with: Option<String>,
    options: ConnectionOptions,
    queries: Mutex<Vec<(String, Vec<Value>)>>,
    executes: Mutex<Vec<(String, Vec<Value>)>>,
}

impl RecordingClient {
    fn with_pages(pages: Vec<Vec<Row>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Default::default()
        }
    }

    fn queries(&self) -> Vec<(String, Vec<Value>)> {
        self.queries.lock().unwrap().clone()
    }

    fn executes(&self) -> Vec<(String, Vec<Value>)> {
        self.executes.lock().unwrap().clone()
    }
}

impl GenericClient for RecordingClient {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.queries
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if let Some(message) = &self.fail_with {
            return Err(OrmError::driver(sql, message.clone()));
        }
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        self.executes
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if let Some(message) = &self.fail_with {
            return Err(OrmError::driver(sql, message.clone()));
        }
        Ok(ExecResult::new(1).with_last_insert_id(10))
    }

    fn options(&self) -> ConnectionOptions {
        self.options
    }
}

fn user(id: i64) -> Row {
    Row::from_iter([("id", Value::Int(id)), ("name", Value::from(format!("user{id}")))])
}

#[tokio::test]
async fn chunk_pages_until_short_page() {
    let conn = RecordingClient::with_pages(vec![
        vec![user(1), user(2)],
        vec![user(3), user(4)],
        vec![user(5)],
    ]);

    let mut sizes = Vec::new();
    qb::table("users")
        .order_by_asc("id")
        .chunk(&conn, 2, |rows| {
            sizes.push(rows.len());
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(sizes, vec![2, 2, 1]);
    let sql: Vec<String> = conn.queries().into_iter().map(|(sql, _)| sql).collect();
    assert_eq!(
        sql,
        vec![
            "select * from users order by id asc limit 2",
            "select * from users order by id asc limit 2, 2",
            "select * from users order by id asc limit 4, 2",
        ]
    );
}

#[tokio::test]
async fn chunk_stops_on_empty_page_without_callback() {
    let conn = RecordingClient::with_pages(vec![vec![user(1), user(2)], vec![]]);

    let mut calls = 0;
    qb::table("users")
        .chunk(&conn, 2, |_| {
            calls += 1;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(calls, 1);
    assert_eq!(conn.queries().len(), 2);
}

#[tokio::test]
async fn chunk_callback_error_stops_the_walk() {
    let conn = RecordingClient::with_pages(vec![vec![user(1), user(2)], vec![user(3), user(4)]]);

    let err = qb::table("users")
        .chunk(&conn, 2, |_| Err(OrmError::Other("stop".into())))
        .await
        .unwrap_err();

    assert!(matches!(err, OrmError::Other(msg) if msg == "stop"));
    assert_eq!(conn.queries().len(), 1);
}

#[tokio::test]
async fn chunk_rejects_non_positive_size() {
    let conn = RecordingClient::default();
    let err = qb::table("users").chunk(&conn, 0, |_| Ok(())).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    assert!(conn.queries().is_empty());
}

#[tokio::test]
async fn unsafe_update_and_delete_are_rejected() {
    let conn = RecordingClient::default();

    let err = qb::table("users").set("active", false).update(&conn).await.unwrap_err();
    assert!(err.is_unsafe_mutation());
    assert!(matches!(
        err,
        OrmError::UnsafeMutation { statement: "update", ref table } if table == "users"
    ));

    let err = qb::table("users").delete(&conn).await.unwrap_err();
    assert!(err.is_unsafe_mutation());

    assert!(conn.executes().is_empty());
}

#[tokio::test]
async fn between_counts_as_a_filter() {
    let conn = RecordingClient::default();
    qb::table("logs")
        .between("created_at", "2020-01-01", "2021-01-01")
        .delete(&conn)
        .await
        .unwrap();
    assert_eq!(
        conn.executes()[0].0,
        "delete from logs where created_at between ? and ?"
    );
}

#[tokio::test]
async fn unguarded_connection_allows_full_table_mutation() {
    let conn = RecordingClient {
        options: ConnectionOptions::new().with_require_where_on_mutation(false),
        ..Default::default()
    };

    let result = qb::table("users").set("active", false).update(&conn).await.unwrap();
    assert_eq!(result.rows_affected, 1);
    qb::table("sessions").delete(&conn).await.unwrap();

    assert_eq!(
        conn.executes(),
        vec![
            ("update users set active = ?".to_string(), vec![Value::Bool(false)]),
            ("delete from sessions".to_string(), vec![]),
        ]
    );
}

#[tokio::test]
async fn update_without_assignments_is_invalid() {
    let conn = RecordingClient::default();
    let err = qb::table("users").where_eq("id", 1).update(&conn).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    assert!(conn.executes().is_empty());
}

#[tokio::test]
async fn empty_insert_does_nothing() {
    let conn = RecordingClient::default();
    let result = qb::table("users").insert(&conn).await.unwrap();
    assert!(result.is_none());
    assert!(conn.executes().is_empty());
}

#[tokio::test]
async fn insert_reports_generated_id() {
    let conn = RecordingClient::default();
    let result = qb::table("users")
        .set("name", "alice")
        .set_raw("created_at", "now()")
        .insert(&conn)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.last_insert_id, Some(10));
    assert_eq!(
        conn.executes(),
        vec![(
            "insert into users set name = ?, created_at = now()".to_string(),
            vec![Value::from("alice")]
        )]
    );
}

#[tokio::test]
async fn first_adds_limit_one_without_touching_the_query() {
    let conn = RecordingClient::with_pages(vec![vec![user(1)]]);
    let query = qb::table("users").where_eq("active", true);

    let row = query.first(&conn).await.unwrap().unwrap();
    assert_eq!(row.try_get::<i64>("id").unwrap(), 1);
    assert_eq!(
        conn.queries(),
        vec![(
            "select * from users where active = ? limit 1".to_string(),
            vec![Value::Bool(true)]
        )]
    );
    assert_eq!(query.to_sql(), "select * from users where active = ?");
}

#[tokio::test]
async fn first_or_fail_on_empty_result() {
    let conn = RecordingClient::default();
    let err = qb::table("users").where_eq("id", 404).first_or_fail(&conn).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn count_reads_the_aggregate_column() {
    let conn = RecordingClient::with_pages(vec![vec![Row::from_iter([("aggregate", 12)])]]);
    let n = qb::table("users")
        .where_eq("active", true)
        .order_by_desc("id")
        .limit(5)
        .count(&conn)
        .await
        .unwrap();

    assert_eq!(n, 12);
    assert_eq!(
        conn.queries()[0].0,
        "select count(*) as aggregate from users where active = ?"
    );
}

#[tokio::test]
async fn count_of_grouped_query_uses_derived_table() {
    let conn = RecordingClient::with_pages(vec![vec![Row::from_iter([("aggregate", 3)])]]);
    let n = qb::table("orders")
        .select(["user_id"])
        .group_by("user_id")
        .count(&conn)
        .await
        .unwrap();

    assert_eq!(n, 3);
    assert_eq!(
        conn.queries()[0].0,
        "select count(*) as aggregate from (select user_id from orders group by user_id) as t"
    );
}

#[tokio::test]
async fn value_and_values_project_one_column() {
    let conn = RecordingClient::with_pages(vec![
        vec![Row::from_iter([("name", "ann")])],
        vec![
            Row::from_iter([("name", "ann")]),
            Row::from_iter([("name", "bob")]),
        ],
    ]);
    let query = qb::table("users").where_op("id", "<", 10);

    let name = query.value(&conn, "name").await.unwrap();
    assert_eq!(name, Some(Value::from("ann")));

    let names = query.values(&conn, "name").await.unwrap();
    assert_eq!(names, vec![Value::from("ann"), Value::from("bob")]);

    let sql: Vec<String> = conn.queries().into_iter().map(|(sql, _)| sql).collect();
    assert_eq!(
        sql,
        vec![
            "select name from users where id < ? limit 1",
            "select name from users where id < ?",
        ]
    );
}

#[tokio::test]
async fn exists_is_true_when_a_row_comes_back() {
    let conn = RecordingClient::with_pages(vec![vec![user(1)], vec![]]);
    let query = qb::table("users").where_eq("id", 1);
    assert!(query.exists(&conn).await.unwrap());
    assert!(!query.exists(&conn).await.unwrap());
}

#[tokio::test]
async fn driver_errors_propagate_verbatim() {
    let conn = RecordingClient {
        fail_with: Some("Table 'shop.nope' doesn't exist".into()),
        ..Default::default()
    };

    let err = qb::table("nope").get(&conn).await.unwrap_err();
    match err {
        OrmError::Driver { sql, message } => {
            assert_eq!(sql, "select * from nope");
            assert_eq!(message, "Table 'shop.nope' doesn't exist");
        }
        other => panic!("expected driver error, got {other:?}"),
    }

    let err = qb::table("nope").where_eq("id", 1).delete(&conn).await.unwrap_err();
    assert!(err.is_driver());
}

#[tokio::test]
async fn get_as_maps_rows() {
    #[derive(Debug, PartialEq)]
    struct User {
        id: i64,
        name: String,
    }

    impl myorm::FromRow for User {
        fn from_row(row: &Row) -> OrmResult<Self> {
            Ok(Self {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })
        }
    }

    let conn = RecordingClient::with_pages(vec![vec![user(1), user(2)]]);
    let users: Vec<User> = qb::table("users").get_as(&conn).await.unwrap();
    assert_eq!(
        users,
        vec![
            User { id: 1, name: "user1".into() },
            User { id: 2, name: "user2".into() },
        ]
    );
}

#[tokio::test]
async fn logging_queries_does_not_change_results() {
    let conn = RecordingClient {
        options: ConnectionOptions::new().with_log_queries(true),
        pages: Mutex::new(vec![vec![user(1)]].into()),
        ..Default::default()
    };
    let rows = qb::table("users").get(&conn).await.unwrap();
    assert_eq!(rows.len(), 1);
}
