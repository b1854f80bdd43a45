//! Query Scenario Tests
//!
//! End-to-end selection, grouping and aggregation over the reference row
//! set with fields A, B, C:
//! - Container type of `fetch()` follows the selection's outer shape
//! - Groupings aggregate per group in key insertion order
//! - Field constraints narrow rows before shaping
//! - Construction errors surface before any row is read

use std::sync::Arc;

use rowshape::query::QueryErrorCode;
use rowshape::{Data, MemorySource, Predicate, Query, RowSource, Selection, Value, Where};

// =============================================================================
// Helper Functions
// =============================================================================

fn reference_rows() -> MemorySource {
    let rows = [
        ("x", "foo", 20),
        ("x", "foo", 30),
        ("y", "foo", 10),
        ("y", "bar", 20),
        ("z", "bar", 10),
        ("z", "bar", 10),
    ];
    MemorySource::new(
        ["A", "B", "C"],
        rows.iter()
            .map(|(a, b, c)| vec![Value::text(*a), Value::text(*b), Value::Int(*c)])
            .collect(),
    )
    .unwrap()
}

fn key(a: &str, b: &str) -> Value {
    Value::tuple([a, b])
}

// =============================================================================
// Reference Scenario
// =============================================================================

#[test]
fn test_single_field_selection() {
    let data = reference_rows().select("A").unwrap().fetch().unwrap();
    assert_eq!(data, Data::list(["x", "x", "y", "y", "z", "z"]));
}

#[test]
fn test_grouped_sum() {
    let data = reference_rows()
        .select(Selection::group("A", "C"))
        .unwrap()
        .sum()
        .fetch()
        .unwrap();
    assert_eq!(
        data,
        Data::map([
            ("x", Data::value(50)),
            ("y", Data::value(30)),
            ("z", Data::value(20)),
        ])
    );
}

#[test]
fn test_grouped_sum_by_tuple_key() {
    let data = reference_rows()
        .select(Selection::group(Selection::tuple(["A", "B"]), "C"))
        .unwrap()
        .sum()
        .fetch()
        .unwrap();
    assert_eq!(
        data,
        Data::map([
            (key("x", "foo"), Data::value(50)),
            (key("y", "foo"), Data::value(10)),
            (key("y", "bar"), Data::value(20)),
            (key("z", "bar"), Data::value(20)),
        ])
    );

    // Keys keep first-seen order
    match data {
        Data::Map(groups) => {
            let keys: Vec<_> = groups.keys().cloned().collect();
            assert_eq!(
                keys,
                vec![key("x", "foo"), key("y", "foo"), key("y", "bar"), key("z", "bar")]
            );
        }
        other => panic!("expected a grouping, got {}", other),
    }
}

#[test]
fn test_tuple_selection_with_where() {
    let data = reference_rows()
        .select_where(Selection::tuple(["A", "B"]), Where::new().and("B", "foo"))
        .unwrap()
        .fetch()
        .unwrap();
    assert_eq!(
        data,
        Data::list([key("x", "foo"), key("x", "foo"), key("y", "foo")])
    );
}

#[test]
fn test_grouped_unwrap_is_size_sensitive() {
    let data = reference_rows()
        .select(Selection::group(Selection::tuple(["A", "B"]), "C"))
        .unwrap()
        .unwrap()
        .fetch()
        .unwrap();
    assert_eq!(data.get(&key("y", "bar")), Some(&Data::value(20)));
    assert_eq!(data.get(&key("x", "foo")), Some(&Data::list([20, 30])));
    assert_eq!(data.get(&key("z", "bar")), Some(&Data::list([10, 10])));
}

#[test]
fn test_grouped_unwrap_then_reduce() {
    let data = reference_rows()
        .select(Selection::group(Selection::tuple(["A", "B"]), "C"))
        .unwrap()
        .unwrap()
        .reduce(|a, b| Value::Int(a.as_i64().unwrap_or(0) + b.as_i64().unwrap_or(0)))
        .fetch()
        .unwrap();
    assert_eq!(
        data,
        Data::map([
            (key("x", "foo"), Data::value(50)),
            (key("y", "foo"), Data::value(10)),
            (key("y", "bar"), Data::value(20)),
            (key("z", "bar"), Data::value(20)),
        ])
    );
}

// =============================================================================
// Outer Shape Tests
// =============================================================================

#[test]
fn test_outer_set_dedupes() {
    let data = reference_rows()
        .select(Selection::set(["A"]))
        .unwrap()
        .fetch()
        .unwrap();
    assert_eq!(data, Data::set(["x", "y", "z"]));
}

#[test]
fn test_group_values_as_sets() {
    let data = reference_rows()
        .select(Selection::group("A", Selection::set(["C"])))
        .unwrap()
        .fetch()
        .unwrap();
    assert_eq!(data.get(&Value::text("z")), Some(&Data::set([10])));
    assert_eq!(data.get(&Value::text("x")), Some(&Data::set([20, 30])));
}

#[test]
fn test_inner_list_elements() {
    let data = reference_rows()
        .select(Selection::list(["A", "C"]))
        .unwrap()
        .fetch()
        .unwrap();
    match data {
        Data::List(items) => {
            assert_eq!(items.len(), 6);
            assert_eq!(
                items[0],
                Value::List(vec![Value::text("x"), Value::Int(20)])
            );
        }
        other => panic!("expected a list, got {}", other),
    }
}

#[test]
fn test_distinct_then_count() {
    let data = reference_rows()
        .select("B")
        .unwrap()
        .distinct()
        .count()
        .fetch()
        .unwrap();
    assert_eq!(data, Data::value(2));
}

// =============================================================================
// Predicate Constraint Tests
// =============================================================================

#[test]
fn test_where_alternatives_and_inversion() {
    let source = reference_rows();
    let either = source
        .select_where("C", Where::new().and("A", Predicate::one_of(["x", "z"])))
        .unwrap()
        .fetch()
        .unwrap();
    assert_eq!(either, Data::list([20, 30, 10, 10]));

    let not_foo = source
        .select_where("A", Where::new().and("B", Predicate::not("foo")))
        .unwrap()
        .fetch()
        .unwrap();
    assert_eq!(not_foo, Data::list(["y", "z", "z"]));
}

#[test]
fn test_multiple_constraints_are_anded() {
    let data = reference_rows()
        .select_where("C", Where::new().and("A", "y").and("B", "bar"))
        .unwrap()
        .fetch()
        .unwrap();
    assert_eq!(data, Data::list([20]));
}

#[test]
fn test_filter_and_map_chain() {
    let data = reference_rows()
        .select("C")
        .unwrap()
        .filter(Predicate::test(|v| v.as_i64().map_or(false, |n| n > 10)))
        .map(|v| Value::Int(v.as_i64().unwrap_or(0) * 2))
        .fetch()
        .unwrap();
    assert_eq!(data, Data::list([40, 60, 40]));
}

// =============================================================================
// Construction Failure Tests
// =============================================================================

#[test]
fn test_unknown_field_fails_at_construction() {
    let err = reference_rows().select("D").unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::FieldLookup);
    assert!(err.is_construction_error());

    let err = reference_rows()
        .select_where("A", Where::new().and("D", "x"))
        .unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::FieldLookup);
}

#[test]
fn test_malformed_selection_fails_at_construction() {
    let bad = [
        Selection::List(Vec::new()),
        Selection::Map(vec![
            (Selection::field("A"), Selection::field("B")),
            (Selection::field("B"), Selection::field("C")),
        ]),
        Selection::group("A", Selection::group("B", "C")),
    ];
    for selection in bad {
        let err = Query::new(selection).unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::TemplateSyntax);
    }
}

#[test]
fn test_evaluation_error_names_operation_and_value() {
    let source = MemorySource::new(
        ["A"],
        vec![vec![Value::Int(1)], vec![Value::text("abc")]],
    )
    .unwrap();
    let query = source.select("A").unwrap().sum();
    let err = query.fetch().unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::EvaluationType);
    assert!(!err.is_construction_error());
    assert!(err.to_string().contains("sum"));
    assert!(err.to_string().contains("abc"));
}

// =============================================================================
// Source-less Query Tests
// =============================================================================

#[test]
fn test_query_bound_later() {
    let query = Query::new(Selection::group("A", "C")).unwrap().max();
    assert!(query.execute().is_err());

    let source: Arc<dyn RowSource> = Arc::new(reference_rows());
    let data = query.execute_with(Arc::clone(&source)).unwrap().fetch().unwrap();
    assert_eq!(data.get(&Value::text("x")), Some(&Data::value(30)));

    // Unknown fields surface on bind
    let err = Query::new("D").unwrap().execute_with(source).unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::FieldLookup);
}

#[test]
fn test_queries_are_immutable_and_reusable() {
    let base = reference_rows().select("C").unwrap();
    let total = base.sum();
    assert_eq!(base.fetch().unwrap(), Data::list([20, 30, 10, 20, 10, 10]));
    assert_eq!(total.fetch().unwrap(), Data::value(100));
    assert_eq!(total.fetch().unwrap(), Data::value(100));
}

#[test]
fn test_query_display() {
    let query = reference_rows()
        .select_where("A", Where::new().and("B", "foo"))
        .unwrap()
        .distinct()
        .count();
    assert_eq!(
        query.to_string(),
        "Query(<MemorySource 6 rows>, \"A\", B=\"foo\").distinct().count()"
    );
    assert_eq!(Query::new("A").unwrap().to_string(), "Query(\"A\")");
}

#[test]
fn test_explain_reads_no_rows() {
    let plan = reference_rows()
        .select(Selection::group("A", "C"))
        .unwrap()
        .sum()
        .explain();
    let text = plan.to_string();
    assert!(text.starts_with("=== EXPLAIN PLAN ==="));
    assert!(text.contains("Source: <MemorySource 6 rows>"));
    assert!(text.contains("  1. sum()"));
    assert!(text.contains("Result Type: map"));
}
