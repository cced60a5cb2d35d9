//! Property tests for the grid's conversion to and from backend row objects.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use serde_json::Value;
use wrangler::grid::{Cell, Grid, Record};

fn cell_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

/// Rows that all carry the same 1-5 keys.
fn uniform_records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::btree_set("[a-z]{1,6}", 1..=5).prop_flat_map(|keys| {
        let keys: Vec<String> = keys.into_iter().collect();
        let width = keys.len();
        prop::collection::vec(prop::collection::vec(cell_value(), width), 0..10).prop_map(
            move |rows| {
                rows.into_iter()
                    .map(|values| keys.iter().cloned().zip(values).collect::<Record>())
                    .collect()
            },
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn records_survive_grid_conversion(records in uniform_records()) {
        let grid = Grid::from_records(&records);
        prop_assert_eq!(grid.row_count(), records.len());
        prop_assert!(grid.rows().iter().all(|row| row.len() == grid.column_count()));
        prop_assert_eq!(grid.to_records(), records);
    }

    #[test]
    fn editing_an_integer_keeps_it_numeric(previous in any::<i64>(), next in any::<i64>()) {
        let cell = Cell::from_input(&next.to_string(), &Value::from(previous));
        prop_assert_eq!(cell.value, Value::from(next));
    }

    #[test]
    fn editing_text_keeps_it_verbatim(text in "[ -~]{0,20}") {
        let cell = Cell::from_input(&text, &Value::from("old"));
        prop_assert_eq!(cell.display_text(), text);
    }
}

#[test]
fn test_missing_keys_become_null() {
    let records: Vec<Record> = serde_json::from_value(serde_json::json!([
        {"a": 1},
        {"b": 2}
    ]))
    .unwrap();

    let grid = Grid::from_records(&records);

    assert_eq!(grid.columns(), ["a", "b"]);
    assert_eq!(grid.cell(0, 1), Some(&Cell::new(Value::Null)));
    assert_eq!(grid.cell(1, 0), Some(&Cell::new(Value::Null)));
}
