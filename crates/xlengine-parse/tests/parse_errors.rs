use xlengine_parse::parse;

#[test]
fn unexpected_closing_parenthesis_reports_exact_position() {
    let err = parse("=1+2)").unwrap_err();
    assert_eq!(err.position, 4);
    assert!(err.message.contains("Unexpected"));
    let rendered = err.to_string();
    assert!(rendered.contains("1+2)"));
}

#[test]
fn missing_closing_paren_reports_end_of_formula() {
    let err = parse("=SUM(").unwrap_err();
    assert!(err.message.contains("end of formula"));
}

#[test]
fn dangling_operator_reports_end_of_formula() {
    let err = parse("=1+").unwrap_err();
    assert!(err.message.contains("end of formula"));
}
