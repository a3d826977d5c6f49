//! End-to-end scenarios exercised against `Engine` directly, plus the
//! dependency-graph and parse-error scenarios that need a whole engine to
//! observe (not just a parser or interpreter in isolation).

use xlengine_common::Address;
use xlengine_eval::Engine;
use xlengine_parse::Value;

fn engine_with_context() -> Engine {
    let engine = Engine::new();
    engine.set_cell_value(None, Address::new(0, 0), Value::Number(10.0)); // A1
    engine.set_cell_value(None, Address::new(0, 1), Value::Number(20.0)); // A2
    engine.set_cell_value(None, Address::new(0, 2), Value::Number(30.0)); // A3
    engine
}

#[test]
fn scenario_1_arithmetic_precedence() {
    let engine = engine_with_context();
    assert_eq!(engine.evaluate_string("=1+2*3").unwrap(), Value::Number(7.0));
}

#[test]
fn scenario_2_parenthesized_precedence() {
    let engine = engine_with_context();
    assert_eq!(engine.evaluate_string("=(1+2)*3").unwrap(), Value::Number(9.0));
}

#[test]
fn scenario_3_sum_over_a_range() {
    let engine = engine_with_context();
    assert_eq!(
        engine.evaluate_string("=SUM(A1:A3)").unwrap(),
        Value::Number(60.0)
    );
}

#[test]
fn scenario_4_if_over_a_comparison() {
    let engine = engine_with_context();
    assert_eq!(
        engine.evaluate_string("=IF(A1>5,\"big\",\"small\")").unwrap(),
        Value::Text("big".to_string())
    );
}

#[test]
fn scenario_5_iferror_recovers_from_div0() {
    let engine = engine_with_context();
    assert_eq!(
        engine.evaluate_string("=IFERROR(1/0,\"oops\")").unwrap(),
        Value::Text("oops".to_string())
    );
}

#[test]
fn scenario_6_lambda_application() {
    let engine = engine_with_context();
    assert_eq!(
        engine.evaluate_string("=LAMBDA(x, x*2)(21)").unwrap(),
        Value::Number(42.0)
    );
}

#[test]
fn dependency_graph_scenario() {
    let engine = Engine::new();
    engine.set_cell_value(None, Address::new(0, 0), Value::Number(1.0)); // A1
    engine.set_cell_formula(None, Address::new(1, 0), "=A1").unwrap(); // B1
    engine.set_cell_formula(None, Address::new(2, 0), "=B1").unwrap(); // C1

    // A1 itself holds a plain value, so recalculating it only touches its
    // transitive dependents, not A1 itself.
    let order = engine.recalculate(None, Address::new(0, 0));
    assert_eq!(order, vec![Address::new(1, 0), Address::new(2, 0)]);
    assert!(!engine.has_circular_reference(None, Address::new(0, 0)));

    // Adding A1 -> {C1} closes the loop A1 -> B1 -> C1 -> A1.
    engine.set_cell_formula(None, Address::new(0, 0), "=C1").unwrap();
    assert!(engine.has_circular_reference(None, Address::new(0, 0)));
    assert!(engine.has_circular_reference(None, Address::new(1, 0)));
    assert!(engine.has_circular_reference(None, Address::new(2, 0)));
}

#[test]
fn parse_error_scenario_extra_closing_paren() {
    let engine = Engine::new();
    let err = engine.evaluate_string("=1+2)").unwrap_err();
    assert_eq!(err.position, 4);
    assert!(err.message.contains("Unexpected"));
}

#[test]
fn parse_error_scenario_missing_closing_paren() {
    let engine = Engine::new();
    let err = engine.evaluate_string("=SUM(").unwrap_err();
    assert!(err.message.to_lowercase().contains("end of formula"));
}

#[test]
fn range_aggregation_skips_non_numeric_cells() {
    let engine = Engine::new();
    engine.set_cell_value(None, Address::new(0, 0), Value::Number(1.0));
    engine.set_cell_value(None, Address::new(0, 1), Value::text("skip"));
    engine.set_cell_value(None, Address::new(0, 2), Value::Number(2.0));
    engine
        .set_cell_formula(None, Address::new(1, 0), "=SUM(A1:A3)")
        .unwrap();
    engine.recalculate(None, Address::new(1, 0));
    assert_eq!(
        engine.get_cell_value(None, Address::new(1, 0)),
        Value::Number(3.0)
    );
}

#[test]
fn cycle_tolerance_emits_each_member_once_and_reports_circular() {
    let engine = Engine::new();
    engine.set_cell_formula(None, Address::new(0, 0), "=B1").unwrap(); // A1 = B1
    engine.set_cell_formula(None, Address::new(1, 0), "=A1").unwrap(); // B1 = A1

    assert!(engine.has_circular_reference(None, Address::new(0, 0)));
    assert!(engine.has_circular_reference(None, Address::new(1, 0)));

    // Recalculation tolerates the cycle: it terminates and recomputes
    // each member exactly once instead of aborting.
    let order = engine.recalculate(None, Address::new(0, 0));
    assert_eq!(order.len(), 2);
    assert!(order.contains(&Address::new(0, 0)));
    assert!(order.contains(&Address::new(1, 0)));
}
