use pgwrap::args;
use pgwrap::prelude::*;
use pgwrap::test_utils::{Reply, ScriptedTransport, dummy_params, text_result_set};

fn text(s: &str) -> RowValues {
    RowValues::Text(s.to_string())
}

fn db_returning(set: ResultSet) -> Database<ScriptedTransport> {
    let transport = ScriptedTransport::new().reply("SELECT", Reply::Rows(set));
    Database::new(dummy_params(), DriverOptions::default(), transport).expect("valid params")
}

fn people() -> ResultSet {
    text_result_set(
        &["team", "role", "name", "age"],
        &[
            &[Some("red"), Some("lead"), Some("ann"), Some("41")],
            &[Some("red"), Some("dev"), Some("bob"), None],
            &[Some("blue"), Some("dev"), Some("cid"), Some("29")],
            &[Some("red"), Some("dev"), Some("dee"), Some("35")],
        ],
    )
}

#[test]
fn indexed_column_keeps_last_duplicate() -> Result<(), PgWrapError> {
    let set = text_result_set(
        &["k", "v"],
        &[&[Some("1"), Some("a")], &[Some("1"), Some("b")], &[Some("2"), Some("c")]],
    );
    let mut db = db_returning(set);
    let map = db.select_indexed_column("SELECT k, v FROM t", &[])?;
    assert_eq!(map.len(), 2);
    assert_eq!(map["1"], text("b"));
    assert_eq!(map["2"], text("c"));
    assert_eq!(db.rows_quantity(), 3);
    Ok(())
}

#[test]
fn field_of_empty_result_is_none() -> Result<(), PgWrapError> {
    let mut db = db_returning(text_result_set(&["id"], &[]));
    assert_eq!(db.select_field("SELECT id FROM t WHERE id = ?d", &args![404])?, None);
    assert!(db.select_record("SELECT id FROM t", &[])?.is_none());
    assert!(db.select_table("SELECT id FROM t", &[])?.is_empty());
    assert!(db.select_indexed_table("SELECT id FROM t", &[])?.is_empty());
    assert_eq!(db.rows_quantity(), 0);
    Ok(())
}

#[test]
fn table_record_field_and_column() -> Result<(), PgWrapError> {
    let mut db = db_returning(people());

    let table = db.select_table("SELECT * FROM people", &[])?;
    assert_eq!(table.len(), 4);
    assert_eq!(table[1].get("name"), Some(&text("bob")));
    assert_eq!(table[1].get("age"), Some(&RowValues::Null));

    let record = db.select_record("SELECT * FROM people", &[])?.expect("first row");
    assert_eq!(record.get("name"), Some(&text("ann")));

    assert_eq!(db.select_field("SELECT * FROM people", &[])?, Some(text("red")));
    assert_eq!(
        db.select_column("SELECT * FROM people", &[])?,
        vec![text("red"), text("red"), text("blue"), text("red")]
    );
    Ok(())
}

#[test]
fn grouped_projections() -> Result<(), PgWrapError> {
    let mut db = db_returning(people());

    let arrays = db.select_indexed_column_arrays("SELECT team, name FROM people", &[])?;
    assert_eq!(arrays["red"], vec![text("lead"), text("dev"), text("dev")]);
    assert_eq!(arrays["blue"], vec![text("dev")]);
    assert_eq!(arrays.keys().collect::<Vec<_>>(), vec!["red", "blue"]);

    let by_team = db.select_indexed_table("SELECT * FROM people", &[])?;
    assert_eq!(by_team["red"].get("name"), Some(&text("dee")));

    let two = db.select_2_indexed_column("SELECT * FROM people", &[])?;
    assert_eq!(two["red"]["lead"], text("ann"));
    assert_eq!(two["red"]["dev"], text("dee"));

    let two_table = db.select_2_indexed_table("SELECT * FROM people", &[])?;
    assert_eq!(two_table["blue"]["dev"].get("age"), Some(&text("29")));

    let three = db.select_3_indexed_column("SELECT * FROM people", &[])?;
    assert_eq!(three["red"]["dev"]["bob"], RowValues::Null);
    assert_eq!(three["red"]["dev"]["dee"], text("35"));

    let three_table = db.select_3_indexed_table("SELECT * FROM people", &[])?;
    assert_eq!(three_table["red"]["lead"]["ann"].get("age"), Some(&text("41")));
    Ok(())
}

#[test]
fn select_as_dispatches_on_shape() -> Result<(), PgWrapError> {
    let mut db = db_returning(people());
    for shape in ProjectionShape::ALL {
        let projected = db.select_as(shape, "SELECT * FROM people", &[])?;
        assert_eq!(projected.shape(), shape);
        assert!(!projected.is_empty());
    }
    match db.select_as(ProjectionShape::IndexedColumn, "SELECT * FROM people", &[])? {
        Projection::IndexedColumn(map) => assert_eq!(map["blue"], text("dev")),
        other => panic!("unexpected projection {other:?}"),
    }
    Ok(())
}

#[test]
fn too_few_columns_is_a_projection_error() {
    let set = text_result_set(&["only"], &[&[Some("x")]]);
    let mut db = db_returning(set);
    for shape in [
        ProjectionShape::IndexedColumn,
        ProjectionShape::IndexedColumnArrays,
        ProjectionShape::TwoLevelIndexedColumn,
        ProjectionShape::TwoLevelIndexedTable,
        ProjectionShape::ThreeLevelIndexedColumn,
        ProjectionShape::ThreeLevelIndexedTable,
    ] {
        let err = db.select_as(shape, "SELECT only FROM t", &[]).unwrap_err();
        match err {
            PgWrapError::ProjectionError {
                shape: reported,
                required,
                available,
            } => {
                assert_eq!(reported, shape);
                assert_eq!(required, shape.required_columns());
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error {other}"),
        }
    }
}

#[test]
fn projection_errors_leave_transaction_open() -> Result<(), PgWrapError> {
    let set = text_result_set(&["only"], &[&[Some("x")]]);
    let mut db = db_returning(set);
    db.begin()?;
    assert!(db.select_indexed_column("SELECT only FROM t", &[]).is_err());
    assert!(db.in_transaction());
    db.commit()?;
    Ok(())
}
