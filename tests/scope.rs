use ember::run_capturing;

#[test]
fn blocks_shadow_without_leaking_into_the_enclosing_scope() {
    let src = r#"
        var x = "outer";
        {
            var x = "inner";
            print x;
        }
        print x;
    "#;
    assert_eq!(run_capturing(src).unwrap(), "inner\nouter\n");
}

#[test]
fn closures_see_later_mutations_to_captured_variables() {
    let src = r#"
        var counter = 0;
        fun inc() {
            counter = counter + 1;
            print counter;
        }
        inc();
        inc();
        inc();
    "#;
    assert_eq!(run_capturing(src).unwrap(), "1.0\n2.0\n3.0\n");
}
