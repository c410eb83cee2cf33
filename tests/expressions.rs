use ember::run_capturing;

#[test]
fn ternary_and_precedence() {
    assert_eq!(run_capturing("print 1 + 2 * 3;").unwrap(), "7.0\n");
    assert_eq!(run_capturing("print (1 + 2) * 3;").unwrap(), "9.0\n");
    assert_eq!(run_capturing("print 2 ^ 3 ^ 2;").unwrap(), "512.0\n");
}

#[test]
fn string_number_concatenation_drops_trailing_zero() {
    assert_eq!(run_capturing("print \"count: \" + 42;").unwrap(), "count: 42\n");
    assert_eq!(run_capturing("print \"count: \" + 42.5;").unwrap(), "count: 42.5\n");
}

#[test]
fn bitwise_operators_truncate_to_integer() {
    assert_eq!(run_capturing("print 6 & 3;").unwrap(), "2.0\n");
    assert_eq!(run_capturing("print 6 | 1;").unwrap(), "7.0\n");
}

#[test]
fn comparisons_work_on_numbers_and_strings() {
    assert_eq!(run_capturing("print 1 < 2;").unwrap(), "true\n");
    assert_eq!(run_capturing("print \"a\" < \"b\";").unwrap(), "true\n");
}
