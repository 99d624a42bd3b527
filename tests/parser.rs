#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{Expr, LiteralValue, LoopControl, Stmt};
    use rox::parser::Parser;
    use rox::scanner::tokenize;

    fn parse(source: &str) -> Result<Vec<Stmt>, Vec<String>> {
        let (tokens, errors) = tokenize(source);
        assert!(errors.is_empty(), "lexical errors: {:?}", errors);

        Parser::new(&tokens)
            .parse()
            .map_err(|errors| errors.iter().map(|e| e.to_string()).collect())
    }

    #[test]
    fn test_parser_01_statement_kinds() {
        let statements = parse("var a = 1; print a; a = 2; { a; }").expect("parses");

        assert_eq!(statements.len(), 4);
        assert!(matches!(statements[0], Stmt::Var { .. }));
        assert!(matches!(statements[1], Stmt::Print(_)));
        assert!(matches!(
            statements[2],
            Stmt::Expression(Expr::Assign { .. })
        ));
        assert!(matches!(&statements[3], Stmt::Block(inner) if inner.len() == 1));
    }

    #[test]
    fn test_parser_02_precedence_and_associativity() {
        let statements = parse("1 - 2 - 3 * 4;").expect("parses");

        // ((1 - 2) - (3 * 4))
        let Stmt::Expression(Expr::Binary { left, right, .. }) = &statements[0] else {
            panic!("expected a binary expression, got {:?}", statements[0]);
        };
        assert!(matches!(**left, Expr::Binary { .. }));
        assert!(matches!(**right, Expr::Binary { .. }));
    }

    #[test]
    fn test_parser_03_for_desugars_to_while() {
        let statements = parse("for (var i = 0; i < 3; i = i + 1) print i;").expect("parses");

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected a block, got {:?}", statements[0]);
        };
        assert_eq!(outer.len(), 2);
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected a while loop, got {:?}", outer[1]);
        };
        assert!(matches!(
            **body,
            Stmt::LoopBody {
                increment: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_parser_04_empty_for_clauses() {
        let statements = parse("for (;;) break;").expect("parses");

        let Stmt::While { condition, body } = &statements[0] else {
            panic!("expected a bare while loop, got {:?}", statements[0]);
        };
        assert!(matches!(condition, Expr::Literal(LiteralValue::True)));

        let Stmt::LoopBody { body, increment } = &**body else {
            panic!("expected a loop body, got {:?}", body);
        };
        assert!(increment.is_none());
        assert!(matches!(
            **body,
            Stmt::LoopControl {
                control: LoopControl::Break,
                ..
            }
        ));
    }

    #[test]
    fn test_parser_05_class_with_superclass_and_static() {
        let statements =
            parse("class B < A { init(x) { this.x = x; } static make() { return B(1); } }")
                .expect("parses");

        let Stmt::Class {
            name,
            superclass,
            methods,
            static_methods,
        } = &statements[0]
        else {
            panic!("expected a class, got {:?}", statements[0]);
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].params.len(), 1);
        assert_eq!(static_methods.len(), 1);
        assert_eq!(static_methods[0].name.lexeme, "make");
    }

    #[test]
    fn test_parser_06_reports_several_errors() {
        let errors = parse("var = 1;\nprint 2\nvar ok = 3;\nfun (a) {}").unwrap_err();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at 'var': Expect ';' after value.",
                "[line 4] Error at '(': Expect function name.",
            ]
        );
    }

    #[test]
    fn test_parser_07_error_at_end() {
        let errors = parse("print (1 + 2").unwrap_err();

        assert_eq!(errors, vec!["[line 1] Error at end: Expect ')' after expression."]);
    }

    #[test]
    fn test_parser_08_invalid_assignment_target() {
        let errors = parse("1 + 2 = 3;").unwrap_err();

        assert_eq!(errors, vec!["[line 1] Error at '=': Invalid assignment target."]);
    }

    #[test]
    fn test_parser_09_bare_expression() {
        let (tokens, _) = tokenize("1 + 2");
        assert!(matches!(
            Parser::new(&tokens).parse_expression(),
            Some(Expr::Binary { .. })
        ));

        for source in ["1 + 2;", "print 1;", "var a = 1;", "1 +", "a = "] {
            let (tokens, _) = tokenize(source);
            assert!(
                Parser::new(&tokens).parse_expression().is_none(),
                "{:?} should not parse as a bare expression",
                source
            );
        }
    }

    #[test]
    fn test_parser_10_too_many_arguments() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let errors = parse(&source).unwrap_err();

        assert_eq!(errors, vec!["[line 1] Error at '255': Can't have more than 255 arguments."]);
    }
}
