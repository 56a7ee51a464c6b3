//! Tests for the filter parser and compiler working together.

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::*;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
}

fn parse(input: &str) -> Vec<FilterNode> {
    FilterParser::parse_at(input, "UTC", fixed_now()).unwrap()
}

fn single(input: &str) -> (&'static str, Comparator, FilterValue) {
    let nodes = parse(input);
    assert_eq!(nodes.len(), 1, "{input}");
    match nodes.into_iter().next() {
        Some(FilterNode::Field {
            field,
            comparator,
            value,
            ..
        }) => (field.name, comparator, value),
        other => panic!("expected a clause for {input}, got {other:?}"),
    }
}

fn group_len(node: &FilterNode) -> usize {
    node.children().map(<[FilterNode]>::len).unwrap_or(0)
}

// ==================== Comparator Coverage ====================

#[test]
fn test_comparator_equals() {
    assert_eq!(
        single("done = true"),
        ("done", Comparator::Equals, FilterValue::Single(Scalar::Bool(true)))
    );
}

#[test]
fn test_comparator_not_equals() {
    assert_eq!(
        single("priority != 3"),
        ("priority", Comparator::NotEquals, FilterValue::Single(Scalar::Int(3)))
    );
}

#[test]
fn test_comparator_greater() {
    assert_eq!(
        single("percent_done > 0.25"),
        (
            "percent_done",
            Comparator::Greater,
            FilterValue::Single(Scalar::Float(0.25))
        )
    );
}

#[test]
fn test_comparator_greater_equals() {
    assert_eq!(
        single("priority >= 2"),
        ("priority", Comparator::GreaterEquals, FilterValue::Single(Scalar::Int(2)))
    );
}

#[test]
fn test_comparator_less() {
    let expected = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
    assert_eq!(
        single("due_date < 2024-04-01"),
        ("due_date", Comparator::Less, FilterValue::Single(Scalar::Time(expected)))
    );
}

#[test]
fn test_comparator_less_equals() {
    assert_eq!(
        single("repeat_after <= 3600"),
        (
            "repeat_after",
            Comparator::LessEquals,
            FilterValue::Single(Scalar::Int(3600))
        )
    );
}

#[test]
fn test_comparator_like() {
    assert_eq!(
        single("title like milk"),
        (
            "title",
            Comparator::Like,
            FilterValue::Single(Scalar::Text("milk".to_string()))
        )
    );
}

#[test]
fn test_comparator_in() {
    assert_eq!(
        single("project_id in 1,2,3"),
        (
            "project_id",
            Comparator::In,
            FilterValue::List(vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)])
        )
    );
}

#[test]
fn test_comparator_not_in() {
    assert_eq!(
        single("bucket not in 4, 5"),
        (
            "bucket_id",
            Comparator::NotIn,
            FilterValue::List(vec![Scalar::Int(4), Scalar::Int(5)])
        )
    );
}

#[test]
fn test_comparators_without_spaces() {
    let (_, cmp, value) = single("priority>=2");
    assert_eq!(cmp, Comparator::GreaterEquals);
    assert_eq!(value, FilterValue::Single(Scalar::Int(2)));
}

#[test]
fn test_keyword_comparators_case_insensitive() {
    assert_eq!(single("title LIKE milk").1, Comparator::Like);
    assert_eq!(single("labels NOT IN 1").1, Comparator::NotIn);
}

// ==================== Grouping ====================

#[test]
fn test_grouping_two_groups_joined_by_or() {
    let nodes =
        parse("(priority >= 4 && due_date < now+7d) || (done = false && assignees in 'John,Jane')");
    assert_eq!(nodes.len(), 2);
    assert_eq!(group_len(&nodes[0]), 2);
    assert_eq!(group_len(&nodes[1]), 2);
    assert_eq!(nodes[1].concatenator(), Concatenator::Or);

    let inner = nodes[1].children().unwrap();
    match &inner[1] {
        FilterNode::Field { field, value, .. } => {
            assert_eq!(field.name, "assignees");
            assert_eq!(
                value,
                &FilterValue::List(vec![
                    Scalar::Text("John".to_string()),
                    Scalar::Text("Jane".to_string()),
                ])
            );
        }
        other => panic!("expected clause, got {other:?}"),
    }
}

#[test]
fn test_grouping_depth_two() {
    let nodes = parse("done = false && (priority = 5 || (labels in 1,2 && title like x))");
    assert_eq!(nodes.len(), 2);
    let level_one = nodes[1].children().unwrap();
    assert_eq!(level_one.len(), 2);
    let level_two = level_one[1].children().unwrap();
    assert_eq!(level_two.len(), 2);
    assert_eq!(level_two[1].concatenator(), Concatenator::And);

    let sql = compile(&nodes, false)
        .unwrap()
        .unwrap()
        .to_sql(Dialect::Sqlite)
        .sql;
    assert_eq!(
        sql,
        "done = ? AND (priority = ? OR (id IN (SELECT task_id FROM label_tasks \
         WHERE label_id IN (?, ?)) AND title LIKE ? ESCAPE '!'))"
    );
}

#[test]
fn test_grouping_depth_three() {
    let nodes = parse("((((done = true))))");
    assert_eq!(nodes.len(), 1);
    let mut node = &nodes[0];
    for _ in 0..4 {
        node = &node.children().unwrap()[0];
    }
    assert_eq!(node.field_name(), Some("done"));
}

#[test]
fn test_empty_group_rejected() {
    assert!(matches!(
        FilterParser::parse_at("done = true && ()", "UTC", fixed_now()).unwrap_err(),
        FilterError::UnexpectedToken { .. }
    ));
}

// ==================== Relative Dates ====================

#[test]
fn test_relative_date_round_trip_at_call_time() {
    let before = Utc::now();
    let nodes = FilterParser::parse("due_date < now+30d", "").unwrap();
    let after = Utc::now();

    let FilterNode::Field {
        value: FilterValue::Single(Scalar::Time(t)),
        ..
    } = &nodes[0]
    else {
        panic!("expected a time value, got {:?}", nodes[0]);
    };
    let lower = before + Duration::days(30) - Duration::seconds(1);
    let upper = after + Duration::days(30) + Duration::seconds(1);
    assert!(*t >= lower && *t <= upper, "{t} not within [{lower}, {upper}]");
}

#[test]
fn test_relative_date_rounding() {
    let (_, _, value) = single("due_date > now/d");
    assert_eq!(
        value,
        FilterValue::Single(Scalar::Time(
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        ))
    );
}

#[test]
fn test_date_uses_timezone() {
    let nodes = FilterParser::parse_at("due_date = 2024-03-15", "Europe/Berlin", fixed_now())
        .unwrap();
    let FilterNode::Field { value, .. } = &nodes[0] else {
        panic!("expected clause");
    };
    assert_eq!(
        value,
        &FilterValue::Single(Scalar::Time(
            Utc.with_ymd_and_hms(2024, 3, 14, 23, 0, 0).unwrap()
        ))
    );
}

// ==================== Idempotence ====================

#[test]
fn test_parse_is_deterministic() {
    let input = "(priority >= 4 && due_date < now+7d) || title like 'big  box'";
    assert_eq!(parse(input), parse(input));
}

#[test]
fn test_display_reparses_to_same_nodes() {
    let inputs = [
        "priority != 3",
        "done = false && (project_id in 1,2,3 || percent_done > 0.5)",
        "title = foo  bar || due_date >= now-1w",
        "labels not in 4,5 && assignees = alice",
    ];
    for input in inputs {
        let nodes = parse(input);
        let rendered = display_nodes(&nodes);
        assert_eq!(parse(&rendered), nodes, "{input} -> {rendered}");
    }
}

// ==================== Errors ====================

#[test]
fn test_unknown_field_suggests() {
    let err = FilterParser::parse_at("dueDat < now", "UTC", fixed_now()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown filter field 'dueDat' (did you mean 'dueDate'?)"
    );
}

#[test]
fn test_invalid_date() {
    assert_eq!(
        FilterParser::parse_at("due_date < 2024-02-30", "UTC", fixed_now()).unwrap_err(),
        FilterError::InvalidDate {
            value: "2024-02-30".to_string()
        }
    );
}

// ==================== In-Memory Evaluation ====================

struct Row {
    priority: Option<i64>,
    title: &'static str,
    labels: Vec<i64>,
}

impl Filterable for Row {
    fn task_value(&self, column: &str) -> Option<Scalar> {
        match column {
            "priority" => self.priority.map(Scalar::Int),
            "title" => Some(Scalar::Text(self.title.to_string())),
            _ => None,
        }
    }

    fn related_values(&self, table: &str) -> Vec<Scalar> {
        match table {
            "label_tasks" => self.labels.iter().copied().map(Scalar::Int).collect(),
            _ => Vec::new(),
        }
    }
}

fn condition(input: &str, include_nulls: bool) -> Condition {
    compile(&parse(input), include_nulls).unwrap().unwrap()
}

#[test]
fn test_matches_left_fold() {
    let row = Row {
        priority: Some(1),
        title: "Water plants",
        labels: vec![],
    };
    // (priority = 5 || title like water) && labels = 2
    assert!(!condition("priority = 5 || title like water && labels = 2", false).matches(&row));
    assert!(condition("priority = 5 || (title like water && labels != 2)", false).matches(&row));
}

#[test]
fn test_matches_include_nulls() {
    let unset = Row {
        priority: None,
        title: "x",
        labels: vec![],
    };
    let zero = Row {
        priority: Some(0),
        title: "x",
        labels: vec![],
    };
    let strict = condition("priority = 3", false);
    let lenient = condition("priority = 3", true);
    assert!(!strict.matches(&unset));
    assert!(lenient.matches(&unset));
    assert!(lenient.matches(&zero));

    let labels = condition("labels in 7", true);
    assert!(labels.matches(&unset));
}
