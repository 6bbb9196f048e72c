use criterion::{Criterion, black_box, criterion_group, criterion_main};
use emberdb::Database;
use emberdb::catalog::schema::{ColumnDef, IndexSchema, TableSchema};
use emberdb::catalog::types::{ColumnType, IndexKey, Row, Value};
use emberdb::storage::key_range::KeyRange;

const TABLE_NAME: &str = "users";
const SEEDED_ROWS: i64 = 10_000;
const BATCH_INSERT_ROWS: i64 = 64;

fn users_schema() -> TableSchema {
    TableSchema::new(
        TABLE_NAME,
        vec![
            ColumnDef {
                name: "id".into(),
                col_type: ColumnType::Integer,
                nullable: false,
            },
            ColumnDef {
                name: "name".into(),
                col_type: ColumnType::Text,
                nullable: false,
            },
            ColumnDef {
                name: "age".into(),
                col_type: ColumnType::Integer,
                nullable: false,
            },
        ],
        vec!["id".into()],
        vec![IndexSchema::new(
            TABLE_NAME,
            "by_age",
            vec!["age".into()],
            false,
        )],
    )
}

fn user(id: i64) -> Row {
    Row::new(
        id as u64,
        vec![
            Value::Integer(id),
            Value::Text(format!("user-{id}").into()),
            Value::Integer(id % 90),
        ],
    )
}

fn seeded_db() -> Database {
    let mut db = Database::new();
    db.register_table(users_schema()).expect("register");
    let mut tx = db.begin(&[TABLE_NAME]).expect("begin");
    let rows: Vec<Row> = (1..=SEEDED_ROWS).map(user).collect();
    tx.journal_mut().insert(TABLE_NAME, rows).expect("seed");
    tx.commit().expect("commit");
    db
}

fn bench_insert_batch(c: &mut Criterion) {
    let db = seeded_db();
    let mut next_id = SEEDED_ROWS + 1;
    c.bench_function("journal_insert_batch", |b| {
        b.iter(|| {
            let rows: Vec<Row> = (next_id..next_id + BATCH_INSERT_ROWS).map(user).collect();
            next_id += BATCH_INSERT_ROWS;
            let mut tx = db.begin(&[TABLE_NAME]).expect("begin");
            tx.journal_mut()
                .insert(TABLE_NAME, black_box(rows))
                .expect("insert");
            tx.commit().expect("commit");
        })
    });
}

fn bench_index_range_scan(c: &mut Criterion) {
    let db = seeded_db();
    let by_age = IndexSchema::new(TABLE_NAME, "by_age", vec!["age".into()], false);
    c.bench_function("journal_index_range_scan", |b| {
        b.iter(|| {
            let tx = db.begin(&[TABLE_NAME]).expect("begin");
            let hits = tx
                .journal()
                .get_index_range(
                    &by_age,
                    &[KeyRange::between(
                        std::ops::Bound::Included(IndexKey::Integer(20)),
                        std::ops::Bound::Excluded(IndexKey::Integer(40)),
                    )],
                )
                .expect("scan");
            black_box(hits);
        })
    });
}

fn bench_rollback(c: &mut Criterion) {
    let db = seeded_db();
    c.bench_function("journal_rollback", |b| {
        b.iter(|| {
            let mut tx = db.begin(&[TABLE_NAME]).expect("begin");
            let rows: Vec<Row> = (1..=BATCH_INSERT_ROWS).map(|i| user(SEEDED_ROWS + 100_000 + i)).collect();
            tx.journal_mut().insert(TABLE_NAME, rows).expect("insert");
            tx.rollback().expect("rollback");
        })
    });
}

criterion_group!(
    benches,
    bench_insert_batch,
    bench_index_range_scan,
    bench_rollback
);
criterion_main!(benches);
