#![cfg(feature = "test-utils-postgres")]

use pgwrap::args;
use pgwrap::prelude::*;
use pgwrap::test_utils::postgres::{setup_postgres_embedded, stop_postgres_embedded};

fn run_live_suite(params: ConnectionParams) -> Result<(), PgWrapError> {
    let mut db = PgDatabase::connect_postgres(params.clone())?;

    db.begin()?;
    db.query(
        "CREATE TABLE IF NOT EXISTS pets (id integer PRIMARY KEY, name text, owner text)",
        &[],
    )?;
    db.query("TRUNCATE pets", &[])?;
    let inserted = db.query(
        "INSERT INTO pets (id, name, owner) VALUES (?d, ?w, ?w), (?d, ?w, ?w), (?d, ?w, ?w)",
        &args![1, "Rex", "ann", 2, "O'Malley", "ann", 3, "Tom", None::<&str>],
    )?;
    assert_eq!(inserted, 3);
    db.commit()?;

    // Escaped literals round-trip through the server.
    let name = db.select_field("SELECT name FROM pets WHERE id = ?d", &args![2])?;
    assert_eq!(name, Some(RowValues::Text("O'Malley".into())));
    assert_eq!(
        db.select_field("SELECT ?w AS str", &args!["STR'ING"])?,
        Some(RowValues::Text("STR'ING".into()))
    );

    // NULL positions survive in lists.
    let ids = db.select_column(
        "SELECT x FROM unnest(array[?d]::int[]) AS x",
        &args![vec![Some(1), None, Some(2)]],
    )?;
    assert_eq!(
        ids,
        vec![
            RowValues::Text("1".into()),
            RowValues::Null,
            RowValues::Text("2".into())
        ]
    );

    let by_owner = db.select_indexed_column_arrays(
        "SELECT coalesce(owner, '') AS owner, name FROM pets ORDER BY id",
        &[],
    )?;
    assert_eq!(by_owner["ann"].len(), 2);
    assert_eq!(by_owner[""], vec![RowValues::Text("Tom".into())]);

    assert_eq!(db.select_field("SELECT name FROM pets WHERE id = -1", &[])?, None);

    // A failing statement rolls back and leaves the connection usable.
    db.begin()?;
    db.query("DELETE FROM pets", &[])?;
    let err = db.query("INSERT INTO no_such_table VALUES (1)", &[]).unwrap_err();
    assert_eq!(err.rollback_outcome(), Some(&RollbackOutcome::RolledBack));
    assert_eq!(db.tx_state(), TxState::Idle);
    db.begin()?;
    db.rollback()?;
    let count = db.select_field("SELECT count(*) FROM pets", &[])?;
    assert_eq!(count.and_then(|v| v.as_int()), Some(3));

    // Auto transaction commits on success.
    assert_eq!(
        db.query_auto("UPDATE pets SET owner = ?w WHERE owner IS NULL", &args!["bo"])?,
        1
    );
    assert_eq!(db.affected_rows_quantity(), 1);

    // JSON markers reach the server with the right casts.
    let kind = db.select_field(
        "SELECT jsonb_typeof(?jb) AS kind",
        &args![serde_json::json!({"a": [1, 2]})],
    )?;
    assert_eq!(kind, Some(RowValues::Text("object".into())));

    // jsonb key-exists operator written with an escaped question mark.
    let has_key = db.select_field(r#"SELECT ?jb \? 'a' AS has"#, &args![serde_json::json!({"a": 1})])?;
    assert_eq!(has_key.and_then(|v| v.as_bool()), Some(true));

    // Float lists keep NULL positions and sum on the server.
    let floats = db
        .select_record(
            "SELECT (?f IS NULL)::integer AS is_null,
                    (?f IS NOT NULL)::integer AS is_not_null,
                    (SELECT sum(COALESCE(x, 0)) FROM unnest(array[?f]::numeric[]) AS x) AS sum_coalesce",
            &args![None::<f64>, 1.1, vec![Some(1.1), None, Some(2.2)]],
        )?
        .expect("one row");
    assert_eq!(floats.get("is_null").and_then(RowValues::as_int), Some(1));
    assert_eq!(floats.get("is_not_null").and_then(RowValues::as_int), Some(1));
    let sum = floats
        .get("sum_coalesce")
        .and_then(RowValues::as_float)
        .expect("numeric sum");
    assert!((sum - 3.3).abs() < 0.005, "sum was {sum}");

    // NULL json and hstore markers, and NULL values inside an hstore.
    db.query_auto("CREATE EXTENSION IF NOT EXISTS hstore", &[])?;
    let tags = ArgValue::map([("i_am_null", None), ("i_am_not_null", Some(1))]);
    let nulls = db
        .select_record(
            "SELECT (?j IS NULL)::integer AS is_j_null,
                    (?jb IS NULL)::integer AS is_jb_null,
                    (?h IS NULL)::integer AS is_h_null,
                    ((?h->'i_am_null') IS NULL)::integer AS is_null_inside_hstore,
                    ((?h->'i_am_not_null') IS NOT NULL)::integer AS is_not_null_inside_hstore",
            &args![
                None::<&str>,
                None::<&str>,
                None::<&str>,
                tags.clone(),
                tags
            ],
        )?
        .expect("one row");
    for column in [
        "is_j_null",
        "is_jb_null",
        "is_h_null",
        "is_null_inside_hstore",
        "is_not_null_inside_hstore",
    ] {
        assert_eq!(nulls.get(column).and_then(RowValues::as_int), Some(1), "{column}");
    }

    // An escaped literal hashes the same on both sides.
    let hashed = db
        .select_record(
            "SELECT ?w || t::varchar AS field, md5(?w || t::varchar) AS md5
                FROM generate_series(1, 10) AS t
                ORDER BY t DESC
                LIMIT 1",
            &args!["STR'ING", "STR'ING"],
        )?
        .expect("one row");
    assert_eq!(hashed.get("field"), Some(&RowValues::Text("STR'ING10".into())));
    assert_eq!(
        hashed.get("md5"),
        Some(&RowValues::Text("ca4cbd023c27ab24d1f30606bb9e3d35".into()))
    );

    // Quotes, backslashes and control characters survive an hstore round trip.
    let long_value = "1".repeat(100);
    let fields = ArgValue::map([
        ("field", r#""FIELD""#),
        (r#""foo""#, r#"\"bar\""#),
        ("baz", "\n\t"),
        ("normal", long_value.as_str()),
    ]);
    let column = db.select_column(
        r#"WITH hs AS (
                SELECT ?h || ('count => ' || t)::hstore AS h
                    FROM generate_series(0, 10) AS t
            )
            SELECT (h->'field')::varchar || (h->'"foo"')::varchar || (h->'baz')::varchar || (h->'count')::varchar
                FROM hs
                ORDER BY (h->'count')::integer"#,
        &args![fields],
    )?;
    assert_eq!(column.len(), 11);
    assert_eq!(
        column[3],
        RowValues::Text(format!("{}{}{}", r#""FIELD""#, r#"\"bar\""#, "\n\t3"))
    );

    // Timestamps arrive as text and parse on demand.
    let ts = db.select_field("SELECT '2024-05-06 07:08:09'::timestamp AS ts", &[])?;
    assert_eq!(
        ts.and_then(|v| v.as_timestamp())
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        Some("2024-05-06 07:08:09".to_string())
    );

    assert!(db.close());
    assert!(!db.close());

    // Persistent facades share one server session.
    let shared = params.with_persistence(Persistence::Persistent);
    let mut first = PgDatabase::connect_postgres(shared.clone())?;
    let mut second = PgDatabase::connect_postgres(shared)?;
    let pid_a = first.select_field("SELECT pg_backend_pid()", &[])?;
    let pid_b = second.select_field("SELECT pg_backend_pid()", &[])?;
    assert_eq!(pid_a, pid_b);

    // Work abandoned by closing one facade never reaches the session's next user.
    first.begin()?;
    first.query("INSERT INTO pets (id, name) VALUES (?d, ?w)", &args![99, "Ghost"])?;
    assert!(first.close());
    second.begin()?;
    second.commit()?;
    let ghost = second.select_field("SELECT count(*) FROM pets WHERE id = ?d", &args![99])?;
    assert_eq!(ghost.and_then(|v| v.as_int()), Some(0));
    Ok(())
}

#[test]
fn live_server_suite() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let embedded = setup_postgres_embedded("pgwrap_test").expect("embedded postgres");
    let params = embedded.params.clone();
    let outcome = std::thread::spawn(move || run_live_suite(params))
        .join()
        .expect("suite thread");
    stop_postgres_embedded(embedded);
    outcome.expect("live suite");
}
