mod common;

#[cfg(test)]
mod session_tests {
    use pretty_assertions::assert_eq;

    use rox::session::RunStatus;

    use crate::common::session;

    #[test]
    fn test_session_01_bare_expression_is_printed() {
        let (mut lox, out, err) = session();

        assert_eq!(lox.run_line("1 + 2"), RunStatus::Ok);
        assert_eq!(lox.run_line("\"a\" + \"b\""), RunStatus::Ok);

        assert_eq!(out.contents(), "3\nab\n");
        assert_eq!(err.contents(), "");
    }

    #[test]
    fn test_session_02_statements_take_the_batch_path() {
        let (mut lox, out, _) = session();

        assert_eq!(lox.run_line("var a = 10;"), RunStatus::Ok);
        assert_eq!(out.contents(), "");

        assert_eq!(lox.run_line("print a * 2;"), RunStatus::Ok);
        assert_eq!(lox.run_line("a"), RunStatus::Ok);

        assert_eq!(out.contents(), "20\n10\n");
    }

    #[test]
    fn test_session_03_runtime_error_has_no_line_suffix() {
        let (mut lox, _, err) = session();

        assert_eq!(lox.run_line("-\"x\""), RunStatus::RuntimeError);
        assert_eq!(err.contents(), "Operand must be a number.\n");
    }

    #[test]
    fn test_session_04_continues_after_runtime_error() {
        let (mut lox, out, err) = session();

        lox.run_line("var total = 1;");
        assert_eq!(
            lox.run_line("{ var inner = 2; total = total + nope; }"),
            RunStatus::RuntimeError
        );
        assert_eq!(err.contents(), "Undefined variable 'nope'.\n[line 1]\n");

        // The failed block must not leave its frame behind.
        assert_eq!(lox.run_line("var inner = 5;"), RunStatus::Ok);
        assert_eq!(lox.run_line("total + inner"), RunStatus::Ok);
        assert_eq!(out.contents(), "6\n");
    }

    #[test]
    fn test_session_05_functions_survive_across_lines() {
        let (mut lox, out, _) = session();

        lox.run_line("fun adder(n) { fun add(x) { return x + n; } return add; }");
        lox.run_line("var add5 = adder(5);");
        lox.run_line("add5(10)");

        assert_eq!(out.contents(), "15\n");
    }

    #[test]
    fn test_session_06_syntax_errors_come_from_the_full_parse() {
        let (mut lox, out, err) = session();

        assert_eq!(lox.run_line("print 1 +;"), RunStatus::StaticError);
        assert_eq!(out.contents(), "");
        assert_eq!(err.contents(), "[line 1] Error at ';': Expect expression.\n");

        err.clear();
        assert_eq!(lox.run_line("@"), RunStatus::StaticError);
        assert_eq!(err.contents(), "[line 1] Error: Unexpected characters.\n");
    }

    #[test]
    fn test_session_07_static_error_in_bare_expression() {
        let (mut lox, out, err) = session();

        assert_eq!(lox.run_line("this"), RunStatus::StaticError);
        assert_eq!(out.contents(), "");
        assert_eq!(
            err.contents(),
            "[line 1] Error at 'this': Can't use 'this' outside of a class.\n"
        );
    }

    #[test]
    fn test_session_08_exit_codes() {
        assert_eq!(RunStatus::Ok.exit_code(), 0);
        assert_eq!(RunStatus::StaticError.exit_code(), 65);
        assert_eq!(RunStatus::RuntimeError.exit_code(), 70);
    }

    #[test]
    fn test_session_09_batch_run_does_not_echo_values() {
        let (mut lox, out, _) = session();

        // Batch mode never echoes expression values.
        assert_eq!(lox.run("1 + 2;"), RunStatus::Ok);
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn test_session_10_recovers_from_runaway_recursion() {
        let (mut lox, out, err) = session();

        lox.run_line("fun down(n) { return down(n + 1); }");
        assert_eq!(lox.run_line("down(0)"), RunStatus::RuntimeError);
        assert_eq!(err.contents(), "Stack overflow.\n");

        assert_eq!(lox.run_line("print \"still here\";"), RunStatus::Ok);
        assert_eq!(out.contents(), "still here\n");
    }

    #[test]
    fn test_session_11_resolutions_do_not_pile_up() {
        let (mut lox, out, _) = session();

        lox.run_line("fun sum(n) { var total = 0; for (var i = 1; i <= n; i = i + 1) total = total + i; return total; }");
        let retained: usize = lox.interpreter().resolved_count();
        assert!(retained > 0, "function bodies keep their resolutions");

        for _ in 0..50 {
            lox.run_line("{ var a = 1; { var b = a + 1; print b; } }");
            lox.run_line("(1 + 2) * 3");
            lox.run_line("var broken = ;");
        }
        assert_eq!(lox.interpreter().resolved_count(), retained);

        out.clear();
        assert_eq!(lox.run_line("sum(4)"), RunStatus::Ok);
        assert_eq!(out.contents(), "10\n");
    }

    #[test]
    fn test_session_12_failed_resolution_leaves_nothing_behind() {
        let (mut lox, _, _) = session();

        assert_eq!(
            lox.run_line("fun f() { var a = 1; var a = 2; return a; }"),
            RunStatus::StaticError
        );
        assert_eq!(lox.interpreter().resolved_count(), 0);
    }
}
