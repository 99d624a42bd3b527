mod common;

#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::session::RunStatus;

    use crate::common::run;

    /// Every one of these must fail before anything is printed.
    fn assert_static_error(source: &str, expected: &str) {
        let (status, out, err) = run(&format!("print \"started\";\n{}", source));

        assert_eq!(status, RunStatus::StaticError);
        assert_eq!(out, "", "nothing may run after a static error");
        assert_eq!(err, format!("{}\n", expected));
    }

    #[test]
    fn test_resolver_01_global_self_initializer() {
        assert_static_error(
            "var x = x;",
            "[line 2] Error at 'x': Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_resolver_02_local_self_initializer() {
        assert_static_error(
            "var a = 1; { var a = a; }",
            "[line 2] Error at 'a': Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_resolver_03_duplicate_local() {
        assert_static_error(
            "fun f() { var a = 1; var a = 2; }",
            "[line 2] Error at 'a': Already a variable with this name in this scope.",
        );
    }

    #[test]
    fn test_resolver_04_global_redeclaration_is_allowed() {
        let (status, out, _) = run("var a = 1; var a = 2; print a;");

        assert_eq!(status, RunStatus::Ok);
        assert_eq!(out, "2\n");
    }

    #[test]
    fn test_resolver_05_top_level_return() {
        assert_static_error(
            "return 1;",
            "[line 2] Error at 'return': Can't return from top-level code.",
        );
    }

    #[test]
    fn test_resolver_06_this_outside_class() {
        assert_static_error(
            "fun f() { print this; }",
            "[line 2] Error at 'this': Can't use 'this' outside of a class.",
        );
    }

    #[test]
    fn test_resolver_07_super_misuse() {
        assert_static_error(
            "class A { f() { super.f(); } }",
            "[line 2] Error at 'super': Can't use 'super' in a class with no superclass.",
        );
        assert_static_error(
            "super.f();",
            "[line 2] Error at 'super': Can't use 'super' outside of a class.",
        );
    }

    #[test]
    fn test_resolver_08_self_inheritance() {
        assert_static_error(
            "class A < A {}",
            "[line 2] Error at 'A': A class can't inherit from itself.",
        );
    }

    #[test]
    fn test_resolver_09_loop_control_outside_loop() {
        assert_static_error(
            "break;",
            "[line 2] Error at 'break': Can't use 'break' outside of a loop.",
        );
        assert_static_error(
            "while (true) { fun f() { continue; } }",
            "[line 2] Error at 'continue': Can't use 'continue' outside of a loop.",
        );
    }

    #[test]
    fn test_resolver_10_this_in_static_method() {
        assert_static_error(
            "class A { static make() { return this; } }",
            "[line 2] Error at 'this': Can't use 'this' in a static method.",
        );
    }

    #[test]
    fn test_resolver_11_collects_every_error() {
        let (status, _, err) = run("return 1;\nbreak;");

        assert_eq!(status, RunStatus::StaticError);
        assert_eq!(
            err,
            "[line 1] Error at 'return': Can't return from top-level code.\n\
             [line 2] Error at 'break': Can't use 'break' outside of a loop.\n"
        );
    }

    #[test]
    fn test_resolver_12_closure_binds_lexically() {
        let source = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;

        let (status, out, _) = run(source);

        assert_eq!(status, RunStatus::Ok);
        assert_eq!(out, "global\nglobal\n");
    }

    #[test]
    fn test_resolver_13_init_resolves_like_any_method() {
        let source = r#"
            class Box {
                init(v) {
                    this.v = v;
                    if (v > 1) return this;
                    return;
                }
                get() { return this.v; }
            }
            print Box(2).get();
            print Box(1).init(5).get();
        "#;

        let (status, out, err) = run(source);

        assert_eq!(err, "");
        assert_eq!(status, RunStatus::Ok);
        assert_eq!(out, "2\n5\n");
    }
}
