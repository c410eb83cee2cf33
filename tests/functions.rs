use ember::run_capturing;

#[test]
fn recursive_function_computes_factorial() {
    let src = r#"
        fun fact(n) {
            if (n <= 1) return 1;
            return n * fact(n - 1);
        }
        print fact(5);
    "#;
    assert_eq!(run_capturing(src).unwrap(), "120.0\n");
}

#[test]
fn closures_keep_independent_state_per_instance() {
    let src = r#"
        fun make_counter() {
            var n = 0;
            fun inc() {
                n = n + 1;
                return n;
            }
            return inc;
        }
        var a = make_counter();
        var b = make_counter();
        print a();
        print a();
        print b();
    "#;
    assert_eq!(run_capturing(src).unwrap(), "1.0\n2.0\n1.0\n");
}

#[test]
fn calling_with_wrong_arity_is_an_error() {
    let src = r#"
        fun needs_one(x) { return x; }
        needs_one(1, 2);
    "#;
    let err = run_capturing(src).unwrap_err();
    assert!(format!("{err}").contains("Expected 1 arguments but got 2"));
}
