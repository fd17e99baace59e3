use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use myorm::{Query, StatementKind, qb};

/// select col0, col1, ... from t where col0 = ? and col1 = ? ...
fn build_select(n: usize) -> Query {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    (0..n).fold(qb::table("t").select(columns), |q, i| {
        q.where_eq(&format!("col{i}"), i as i64)
    })
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/render");

    for n in [1, 5, 10, 50, 100] {
        let query = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &query, |b, query| {
            b.iter(|| black_box(query.render(StatementKind::Select)));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(n).render(StatementKind::Select)));
        });
    }

    group.finish();
}

fn bench_where_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/where_in");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let query = qb::table("t").where_in("id", values.iter().copied());
                black_box(query.to_sql());
            });
        });
    }

    group.finish();
}

fn bench_full_statement(c: &mut Criterion) {
    let query = qb::table("orders o")
        .select(["o.id", "o.total", "u.name as customer"])
        .left_join_with("users u", |j| {
            j.on("u.id", "o.user_id").where_eq("u.active", true)
        })
        .where_eq("o.status", "paid")
        .or_where_in("o.status", ["refunded", "disputed"])
        .between("o.created_at", "2024-01-01", "2024-12-31")
        .group_by("o.user_id")
        .having_op("sum(o.total)", ">", 100)
        .order_by_desc("o.total")
        .limit_offset(50, 100);

    c.bench_function("sql_builder/full_select", |b| {
        b.iter(|| black_box(query.render(StatementKind::Select)));
    });

    let update = qb::table("users")
        .set("name", "alice")
        .set_raw("updated_at", "now()")
        .where_eq("id", 1)
        .limit(1);
    c.bench_function("sql_builder/update", |b| {
        b.iter(|| black_box(update.render(StatementKind::Update)));
    });
}

criterion_group!(
    benches,
    bench_render,
    bench_build_and_render,
    bench_where_in,
    bench_full_statement
);
criterion_main!(benches);
