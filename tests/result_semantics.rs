//! Lazy Result Tests
//!
//! Properties of evaluated results:
//! - Preview never loses elements and renders empty results explicitly
//! - Results are single-pass
//! - Grouping then flattening yields one row per matching input row
//! - unwrap looks at container size, never container type
//! - Rows from several origins are aligned on the union of fieldnames

use rowshape::query::QueryErrorCode;
use rowshape::{Data, EvalType, MemorySource, Query, Selection, Value, Where};

// =============================================================================
// Helper Functions
// =============================================================================

fn source(fieldnames: &[&str], rows: Vec<Vec<Value>>) -> MemorySource {
    MemorySource::new(fieldnames.iter().copied(), rows).unwrap()
}

fn numbered(count: i64) -> MemorySource {
    source(
        &["N", "PARITY"],
        (0..count)
            .map(|n| {
                let parity = if n % 2 == 0 { "even" } else { "odd" };
                vec![Value::Int(n), Value::text(parity)]
            })
            .collect(),
    )
}

// =============================================================================
// Preview Tests
// =============================================================================

#[test]
fn test_preview_then_fetch_returns_everything() {
    for total in [0, 1, 5, 40] {
        let query = numbered(total).select("N").unwrap();
        for lines in [1, 2, 8] {
            let mut result = query.execute().unwrap();
            result.preview(lines, 10).unwrap();
            let data = result.fetch().unwrap();
            assert_eq!(data.len(), Some(total as usize), "total {} lines {}", total, lines);
        }
    }
}

#[test]
fn test_preview_of_empty_result_is_explicit() {
    let query = numbered(4)
        .select_where("N", Where::new().and("PARITY", "none"))
        .unwrap();
    let mut result = query.execute().unwrap();
    let preview = result.preview(8, 72).unwrap();
    assert_eq!(preview.lines, vec!["[]"]);
    assert!(!preview.truncated);

    let text = query.preview().unwrap();
    assert!(text.ends_with("---- preview ----\n[]"));
}

#[test]
fn test_query_preview_shows_chain_and_data() {
    let text = numbered(3).select("N").unwrap().distinct().preview().unwrap();
    assert_eq!(
        text,
        "Query(<MemorySource 3 rows>, \"N\").distinct()\n---- preview ----\n[0, 1, 2]"
    );
}

#[test]
fn test_long_preview_is_truncated() {
    let text = numbered(200).select("N").unwrap().preview_with(4, 20).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2 + 4);
    assert_eq!(lines.last().copied(), Some(" ..."));
}

// =============================================================================
// Single-pass Tests
// =============================================================================

#[test]
fn test_iteration_is_single_pass() {
    let mut result = numbered(5).select("N").unwrap().execute().unwrap();
    assert_eq!(result.by_ref().count(), 5);
    assert_eq!(result.by_ref().count(), 0);
    assert!(result.is_exhausted());
}

#[test]
fn test_second_fetch_is_empty() {
    let mut result = numbered(3)
        .select(Selection::set(["PARITY"]))
        .unwrap()
        .execute()
        .unwrap();
    assert_eq!(result.fetch().unwrap(), Data::set(["even", "odd"]));
    assert_eq!(result.fetch().unwrap(), Data::set(Vec::<Value>::new()));
}

#[test]
fn test_partial_results_survive_an_error() {
    let rows = source(
        &["V"],
        vec![vec![Value::Int(1)], vec![Value::text("oops")], vec![Value::Int(3)]],
    );
    let mut result = rows
        .select("V")
        .unwrap()
        .try_map(|v| match v.as_i64() {
            Some(n) => Ok(Value::Int(n * 10)),
            None => Err(format!("not an int: {}", v).into()),
        })
        .execute()
        .unwrap();

    let first = result.next().unwrap().unwrap();
    assert_eq!(first, rowshape::Entry::Item(Value::Int(10)));
    let err = result.next().unwrap().unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::EvaluationType);
    assert!(err.to_string().contains("not an int"));
    assert!(result.next().is_none());
}

// =============================================================================
// Grouping and Flatten Tests
// =============================================================================

#[test]
fn test_group_then_flatten_recovers_rows() {
    let rows = numbered(9);
    let flat = rows
        .select(Selection::group("PARITY", "N"))
        .unwrap()
        .flatten()
        .fetch()
        .unwrap();

    let mut pairs = match flat {
        Data::List(items) => items,
        other => panic!("expected a list, got {}", other),
    };
    let mut manual = match rows.select(Selection::tuple(["PARITY", "N"])).unwrap().fetch().unwrap() {
        Data::List(items) => items,
        other => panic!("expected a list, got {}", other),
    };
    pairs.sort();
    manual.sort();
    assert_eq!(pairs, manual);
    assert_eq!(pairs.len(), 9);
}

#[test]
fn test_flatten_respects_where() {
    let flat = numbered(10)
        .select_where(
            Selection::group("PARITY", "N"),
            Where::new().and("N", Value::Int(4)),
        )
        .unwrap()
        .flatten()
        .fetch()
        .unwrap();
    assert_eq!(
        flat,
        Data::list([Value::tuple([Value::text("even"), Value::Int(4)])])
    );
}

#[test]
fn test_flatten_without_grouping_is_noop() {
    let query = numbered(3).select("N").unwrap();
    assert_eq!(query.flatten().fetch().unwrap(), query.fetch().unwrap());
}

// =============================================================================
// Unwrap Tests
// =============================================================================

#[test]
fn test_unwrap_single_element_list_and_set() {
    let rows = numbered(1);
    assert_eq!(
        rows.select("N").unwrap().unwrap().fetch().unwrap(),
        Data::value(0)
    );
    assert_eq!(
        rows.select(Selection::set(["N"])).unwrap().unwrap().fetch().unwrap(),
        Data::value(0)
    );
}

#[test]
fn test_unwrap_leaves_larger_containers() {
    let rows = numbered(2);
    assert_eq!(
        rows.select("N").unwrap().unwrap().fetch().unwrap(),
        Data::list([0, 1])
    );
    assert_eq!(
        rows.select(Selection::set(["N"])).unwrap().unwrap().fetch().unwrap(),
        Data::set([0, 1])
    );
}

#[test]
fn test_unwrap_result_type_decided_at_evaluation() {
    let query = numbered(1).select("N").unwrap().unwrap();
    let result = query.execute().unwrap();
    assert_eq!(result.eval_type(), None);
    assert_eq!(result.force().unwrap().eval_type(), Some(EvalType::Value));
    assert_eq!(query.explain().result_type, None);
}

// =============================================================================
// Apply and Reduce Tests
// =============================================================================

#[test]
fn test_apply_receives_whole_collection() {
    let data = numbered(4)
        .select("N")
        .unwrap()
        .apply(|data| Data::value(data.len().unwrap_or(0) as i64))
        .fetch()
        .unwrap();
    assert_eq!(data, Data::value(4));
}

#[test]
fn test_apply_per_group() {
    let data = numbered(5)
        .select(Selection::group("PARITY", "N"))
        .unwrap()
        .apply(|data| Data::value(data.len().unwrap_or(0) as i64))
        .fetch()
        .unwrap();
    assert_eq!(
        data,
        Data::map([("even", Data::value(3)), ("odd", Data::value(2))])
    );
}

#[test]
fn test_reduce_with_seed() {
    let concat = |a: &Value, b: &Value| Value::text(format!("{}{}", a.render_plain(), b.render_plain()));
    let data = numbered(3)
        .select("N")
        .unwrap()
        .reduce_with(concat, || Value::text(">"))
        .fetch()
        .unwrap();
    assert_eq!(data, Data::value(">012"));
}

#[test]
fn test_reduce_empty_without_seed_fails() {
    let err = numbered(0)
        .select("N")
        .unwrap()
        .reduce(|a, _| a.clone())
        .fetch()
        .unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::EvaluationType);
}

#[test]
fn test_reduce_after_unwrap_keeps_single_value() {
    let data = numbered(1)
        .select("N")
        .unwrap()
        .unwrap()
        .reduce(|a, b| Value::Int(a.as_i64().unwrap_or(0) + b.as_i64().unwrap_or(0)))
        .fetch()
        .unwrap();
    assert_eq!(data, Data::value(0));
}

#[test]
fn test_distinct_keeps_large_ints_apart_from_nearby_floats() {
    let data = Query::from_data(Data::list([
        Value::Int(9_007_199_254_740_993),
        Value::Float(9_007_199_254_740_992.0),
        Value::Int(3),
        Value::Float(3.0),
    ]))
    .distinct()
    .fetch()
    .unwrap();
    assert_eq!(
        data,
        Data::list([
            Value::Int(9_007_199_254_740_993),
            Value::Float(9_007_199_254_740_992.0),
            Value::Int(3),
        ])
    );
}

#[test]
fn test_starmap_spreads_tuples() {
    let data = numbered(3)
        .select(Selection::tuple(["N", "PARITY"]))
        .unwrap()
        .starmap(|args| Value::text(format!("{}:{}", args[0], args[1].render_plain())))
        .fetch()
        .unwrap();
    assert_eq!(data, Data::list(["0:even", "1:odd", "2:even"]));
}

// =============================================================================
// Multi-origin Alignment Tests
// =============================================================================

#[test]
fn test_missing_fields_are_padded_with_empty_text() {
    let mut rows = source(&["A", "B"], vec![vec![Value::text("a1"), Value::Int(1)]]);
    rows.extend(&source(
        &["A", "C"],
        vec![vec![Value::text("a2"), Value::Int(7)]],
    ));

    assert_eq!(rows.len(), 2);
    let data = rows
        .select(Selection::tuple(["A", "B", "C"]))
        .unwrap()
        .fetch()
        .unwrap();
    assert_eq!(
        data,
        Data::list([
            Value::tuple([Value::text("a1"), Value::Int(1), Value::text("")]),
            Value::tuple([Value::text("a2"), Value::text(""), Value::Int(7)]),
        ])
    );

    // Padding counts as missing for numeric aggregates
    let total = rows.select("B").unwrap().sum().fetch().unwrap();
    assert_eq!(total, Data::value(1));
}
