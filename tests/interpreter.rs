mod common;

#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;

    use rox::session::RunStatus;

    use crate::common::{output_of, run};

    #[test]
    fn test_interpreter_01_block_shadowing() {
        assert_eq!(
            output_of("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
    }

    #[test]
    fn test_interpreter_02_closure_counter() {
        let source = "fun make(){ var i=0; fun inc(){ i=i+1; return i;} return inc;} \
                      var c=make(); print c(); print c();";

        assert_eq!(output_of(source), "1\n2\n");
    }

    #[test]
    fn test_interpreter_03_super_call() {
        let source = r#"class A { greet(){ return "A";} }
                        class B < A { greet(){ return super.greet()+"B";} }
                        print B().greet();"#;

        assert_eq!(output_of(source), "AB\n");
    }

    #[test]
    fn test_interpreter_04_continue_runs_increment() {
        assert_eq!(
            output_of("for (var i=0;i<3;i=i+1){ if (i==1) continue; print i;}"),
            "0\n2\n"
        );
    }

    #[test]
    fn test_interpreter_05_break_leaves_innermost_loop() {
        let source = r#"
            for (var i = 0; i < 3; i = i + 1) {
                var j = 0;
                while (true) {
                    if (j == 2) break;
                    j = j + 1;
                }
                print i + j;
            }
        "#;

        assert_eq!(output_of(source), "2\n3\n4\n");
    }

    #[test]
    fn test_interpreter_06_arity_mismatch_runs_nothing() {
        let source = r#"
            fun f(a, b) { print "body ran"; }
            f(1);
        "#;

        let (status, out, err) = run(source);

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(out, "");
        assert_eq!(err, "Expected 2 arguments but got 1.\n[line 3]\n");
    }

    #[test]
    fn test_interpreter_07_number_printing() {
        assert_eq!(
            output_of("print 1.0; print 2.50; print 10 / 4; print -3; print 1 / 0; print 0.1 + 0.2;"),
            "1\n2.5\n2.5\n-3\nInfinity\n0.30000000000000004\n"
        );
    }

    #[test]
    fn test_interpreter_08_strings_and_concatenation() {
        assert_eq!(
            output_of(r#"print "a" + "b"; print "n" + 1; print 2 + "x"; print "" == "";"#),
            "ab\nn1\n2x\ntrue\n"
        );
    }

    #[test]
    fn test_interpreter_09_truthiness_and_logic() {
        let source = r#"
            print !nil; print !0; print !"";
            print nil or "default";
            print false and undefined_is_never_read;
            print 1 == 1.0; print nil == false; print "1" == 1;
        "#;

        assert_eq!(
            output_of(source),
            "true\nfalse\nfalse\ndefault\nfalse\ntrue\nfalse\nfalse\n"
        );
    }

    #[test]
    fn test_interpreter_10_runtime_type_errors() {
        let cases = [
            ("print -\"a\";", "Operand must be a number.\n[line 1]\n"),
            ("print 1 < \"a\";", "Operands must be numbers.\n[line 1]\n"),
            (
                "print nil + nil;",
                "Operands must be two numbers or two concatenable types (a string and a number, etc.).\n[line 1]\n",
            ),
            ("print undefined;", "Undefined variable 'undefined'.\n[line 1]\n"),
            ("\"not fn\"();", "Can only call functions and classes.\n[line 1]\n"),
            ("var x = 1; print x.y;", "Only instances have properties.\n[line 1]\n"),
            ("var x = 1; x.y = 2;", "Only instances have fields.\n[line 1]\n"),
            ("class A {} print A().nope;", "Undefined property 'nope'.\n[line 1]\n"),
            ("var NotClass = 1; class B < NotClass {}", "Superclass must be a class.\n[line 1]\n"),
        ];

        for (source, expected) in cases {
            let (status, _, err) = run(source);

            assert_eq!(status, RunStatus::RuntimeError, "{}", source);
            assert_eq!(err, expected, "{}", source);
        }
    }

    #[test]
    fn test_interpreter_11_runtime_error_stops_the_run() {
        let (status, out, _) = run("print 1; print nil + 1; print 2;");

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_interpreter_12_fields_and_bound_methods() {
        let source = r#"
            class Counter {
                init(start) { this.count = start; }
                bump() { this.count = this.count + 1; return this; }
            }
            var c = Counter(5);
            var bump = c.bump;
            bump();
            bump();
            print c.count;
            print c;
            print Counter;
            print bump;
            print clock;
        "#;

        assert_eq!(
            output_of(source),
            "7\nCounter instance\nCounter\n<fn bump>\n<native fn>\n"
        );
    }

    #[test]
    fn test_interpreter_13_initializer_returns_instance() {
        let source = r#"
            class P {
                init(x) {
                    this.x = x;
                    if (x > 0) return;
                    this.x = -1;
                }
            }
            var p = P(3);
            print p.x;
            print p.init(0) == p;
            print p.x;
        "#;

        assert_eq!(output_of(source), "3\ntrue\n-1\n");
    }

    #[test]
    fn test_interpreter_14_static_methods() {
        let source = r#"
            class Math {
                static square(n) { return n * n; }
            }
            class More < Math {}
            print Math.square(3);
            print More.square(4);
        "#;

        assert_eq!(output_of(source), "9\n16\n");

        let (status, _, err) = run("class M { static f() {} } print M().f;");

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(err, "Undefined property 'f'.\n[line 1]\n");
    }

    #[test]
    fn test_interpreter_15_inherited_initializer_and_override() {
        let source = r#"
            class Shape {
                init(name) { this.name = name; }
                describe() { return this.name + " with " + this.sides() + " sides"; }
                sides() { return 0; }
            }
            class Square < Shape {
                sides() { return 4; }
            }
            print Square("square").describe();
        "#;

        assert_eq!(output_of(source), "square with 4 sides\n");
    }

    #[test]
    fn test_interpreter_16_recursion_and_early_return() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            fun first_even(limit) {
                for (var i = 1; i < limit; i = i + 1) {
                    if (i / 2 == 0 or i == 4) return i;
                }
                return nil;
            }
            print fib(15);
            print first_even(10);
            print first_even(2);
        "#;

        assert_eq!(output_of(source), "610\n4\nnil\n");
    }

    #[test]
    fn test_interpreter_17_functions_are_values() {
        let source = r#"
            fun twice(f, x) { return f(f(x)); }
            fun add3(n) { return n + 3; }
            print twice(add3, 1);
            print twice == twice;
            print add3 == twice;
        "#;

        assert_eq!(output_of(source), "7\ntrue\nfalse\n");
    }

    #[test]
    fn test_interpreter_18_while_with_continue() {
        let source = r#"
            var i = 0;
            var total = 0;
            while (i < 5) {
                i = i + 1;
                if (i == 3) continue;
                total = total + i;
            }
            print total;
        "#;

        assert_eq!(output_of(source), "12\n");
    }

    #[test]
    fn test_interpreter_19_clock_is_a_number() {
        assert_eq!(output_of("print clock() > 0;"), "true\n");
    }

    #[test]
    fn test_interpreter_20_deep_recursion() {
        let source = r#"
            fun depth(n) {
                if (n == 0) return 0;
                return 1 + depth(n - 1);
            }
            print depth(10000);
        "#;

        assert_eq!(output_of(source), "10000\n");
    }

    #[test]
    fn test_interpreter_21_runaway_recursion_is_a_runtime_error() {
        let source = r#"
            fun forever(n) { return forever(n + 1); }
            forever(0);
        "#;

        let (status, _, err) = run(source);

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(err, "Stack overflow.\n[line 2]\n");
    }

    #[test]
    fn test_interpreter_22_deeply_nested_expression() {
        let source = format!("print {}1{};", "(".repeat(2000), ")".repeat(2000));

        assert_eq!(output_of(&source), "1\n");
    }

    #[test]
    fn test_interpreter_23_number_equality_is_bitwise() {
        let source = r#"
            var n = 0 / 0;
            print n == n;
            print n != n;
            print 0 == -0;
            print 1 == 1.0;
        "#;

        assert_eq!(output_of(source), "true\nfalse\nfalse\ntrue\n");
    }

    #[test]
    fn test_interpreter_24_scientific_number_printing() {
        let source = r#"
            print 10000000;
            print 9999999;
            print 0.0001;
            print 0.001;
            print 123456789;
            print 0.00000015;
            print -0;
            print 0 / 0;
        "#;

        assert_eq!(
            output_of(source),
            "1.0E7\n9999999\n1.0E-4\n0.001\n1.23456789E8\n1.5E-7\n-0\nNaN\n"
        );
    }
}
