//! Parser tests - verify parsing and AST structure
//!
//! These tests verify that source text converts into the expected AST
//! structures and that malformed input surfaces the expected diagnostics.
//! They do NOT evaluate anything - the evaluator lives outside this crate.

use crate::ast::{BinaryOp, Expr, IncDecOp, MethodName, PathSegment, Stmt, Value};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::{self, parse, parse_config};

/* ===================== Assignment Tests ===================== */

#[test]
fn test_parse_simple_assignment() {
    let ast = parse("docker.enabled = true").expect("Should parse");

    match ast {
        Stmt::Assign { path, value, .. } => {
            let names: Vec<&str> = path
                .iter()
                .map(|seg| match seg {
                    PathSegment::Prop { name, .. } => name.as_str(),
                    other => panic!("Expected property segment, got {:?}", other),
                })
                .collect();
            assert_eq!(names, vec!["docker", "enabled"]);
            match value {
                Expr::Constant {
                    value: Value::Bool(true),
                    ..
                } => {}
                other => panic!("Expected Constant true, got {:?}", other),
            }
        }
        _ => panic!("Expected Assign, got {:?}", ast),
    }
}

#[test]
fn test_parse_indexed_assignment() {
    let ast = parse("m[k] = 1").expect("Should parse");

    match ast {
        Stmt::Assign { path, .. } => {
            assert_eq!(path.len(), 2);
            match &path[0] {
                PathSegment::Prop { name, .. } => assert_eq!(name, "m"),
                other => panic!("Expected property segment, got {:?}", other),
            }
            match &path[1] {
                PathSegment::Index {
                    expr: Expr::Variable { name, .. },
                    ..
                } => assert_eq!(name, "k"),
                other => panic!("Expected index segment, got {:?}", other),
            }
        }
        _ => panic!("Expected Assign, got {:?}", ast),
    }
}

#[test]
fn test_parse_tuple_assignment() {
    let ast = parse("a, b = f()").expect("Should parse");

    match ast {
        Stmt::TupleAssign { targets, .. } => {
            let names: Vec<&str> = targets.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["a", "b"]);
        }
        _ => panic!("Expected TupleAssign, got {:?}", ast),
    }
}

#[test]
fn test_parse_parenthesized_tuple_assignment() {
    let ast = parse("(a, b) = f()").expect("Should parse");

    match ast {
        Stmt::TupleAssign { targets, .. } => assert_eq!(targets.len(), 2),
        _ => panic!("Expected TupleAssign, got {:?}", ast),
    }
}

#[test]
fn test_parse_single_parenthesized_target_is_tuple() {
    let ast = parse("(a) = 1").expect("Should parse");

    match ast {
        Stmt::TupleAssign { targets, .. } => {
            assert_eq!(targets.len(), 1);
            assert_eq!(targets[0].0, "a");
        }
        _ => panic!("Expected TupleAssign, got {:?}", ast),
    }
}

#[test]
fn test_nested_paren_tuple_target_is_semantic_error() {
    let failure = parse("((a, b)) = 1").expect_err("Should fail");
    let diag = &failure.diagnostics[0];
    assert_eq!(diag.kind, DiagnosticKind::Semantic);
    assert!(diag.message.contains("nested parenthesis"), "{}", diag.message);
}

#[test]
fn test_nested_paren_single_target_is_semantic_error() {
    let failure = parse("((a)) = 1").expect_err("Should fail");
    assert_eq!(failure.diagnostics[0].kind, DiagnosticKind::Semantic);
}

#[test]
fn test_constant_assignment_target_is_syntax_error() {
    let failure = parse("1 = x").expect_err("Should fail");
    let diag = &failure.diagnostics[0];
    assert_eq!(diag.kind, DiagnosticKind::Syntax);
    assert!(
        diag.message.contains("invalid assignment target"),
        "{}",
        diag.message
    );
}

#[test]
fn test_safe_navigation_assignment_target_is_syntax_error() {
    let failure = parse("a?.b = 1").expect_err("Should fail");
    assert_eq!(failure.diagnostics[0].kind, DiagnosticKind::Syntax);
}

/* ===================== Block and Selector Tests ===================== */

#[test]
fn test_parse_nested_blocks() {
    let ast = parse("profiles { standard { cpus = 1 } }").expect("Should parse");

    match ast {
        Stmt::Block { name, body, .. } => {
            assert_eq!(name, "profiles");
            assert_eq!(body.len(), 1);
            match &body[0] {
                Stmt::Block { name, body, .. } => {
                    assert_eq!(name, "standard");
                    match &body[0] {
                        Stmt::Assign { path, value, .. } => {
                            match &path[0] {
                                PathSegment::Prop { name, .. } => assert_eq!(name, "cpus"),
                                other => panic!("Expected property segment, got {:?}", other),
                            }
                            match value {
                                Expr::Constant {
                                    value: Value::Int(1),
                                    ..
                                } => {}
                                other => panic!("Expected Constant 1, got {:?}", other),
                            }
                        }
                        other => panic!("Expected Assign, got {:?}", other),
                    }
                }
                other => panic!("Expected inner Block, got {:?}", other),
            }
        }
        _ => panic!("Expected Block, got {:?}", ast),
    }
}

#[test]
fn test_parse_colon_selector() {
    let ast = parse("withLabel: 'big' { memory = '8 GB' }").expect("Should parse");

    match ast {
        Stmt::Selector {
            kind, target, body, ..
        } => {
            assert_eq!(kind, "withLabel");
            match target {
                Expr::Constant {
                    value: Value::Str(s),
                    ..
                } => assert_eq!(s, "big"),
                other => panic!("Expected Constant 'big', got {:?}", other),
            }
            assert_eq!(body.len(), 1);
            match &body[0] {
                Stmt::Assign { value, .. } => match value {
                    Expr::Constant {
                        value: Value::Str(s),
                        ..
                    } => assert_eq!(s, "8 GB"),
                    other => panic!("Expected Constant '8 GB', got {:?}", other),
                },
                other => panic!("Expected Assign, got {:?}", other),
            }
        }
        _ => panic!("Expected Selector, got {:?}", ast),
    }
}

#[test]
fn test_parse_paren_selector() {
    let ast = parse("withName('hisat2') { cpus = 4 }").expect("Should parse");

    match ast {
        Stmt::Selector { kind, body, .. } => {
            assert_eq!(kind, "withName");
            assert_eq!(body.len(), 1);
        }
        _ => panic!("Expected Selector, got {:?}", ast),
    }
}

#[test]
fn test_parse_slashy_selector_target() {
    let ast = parse("withName: /hisat.*/ { cpus = 4 }").expect("Should parse");

    match ast {
        Stmt::Selector { target, .. } => match target {
            Expr::Constant {
                value: Value::Str(s),
                ..
            } => assert_eq!(s, "hisat.*"),
            other => panic!("Expected Constant regex text, got {:?}", other),
        },
        _ => panic!("Expected Selector, got {:?}", ast),
    }
}

#[test]
fn test_block_body_preserves_statement_order() {
    let def = parse_config("tower { enabled = true\n endpoint = 'x'\n enabled = false }")
        .expect("Should parse");

    match &def.statements[0] {
        Stmt::Block { body, .. } => {
            assert_eq!(body.len(), 3);
            match (&body[0], &body[2]) {
                (
                    Stmt::Assign {
                        value:
                            Expr::Constant {
                                value: Value::Bool(true),
                                ..
                            },
                        ..
                    },
                    Stmt::Assign {
                        value:
                            Expr::Constant {
                                value: Value::Bool(false),
                                ..
                            },
                        ..
                    },
                ) => {}
                other => panic!("Expected ordered assigns, got {:?}", other),
            }
        }
        other => panic!("Expected Block, got {:?}", other),
    }
}

/* ===================== Statement Form Tests ===================== */

#[test]
fn test_parse_include() {
    let ast = parse("include 'base.config'").expect("Should parse");

    match ast {
        Stmt::Include {
            source:
                Expr::Constant {
                    value: Value::Str(s),
                    ..
                },
            ..
        } => assert_eq!(s, "base.config"),
        _ => panic!("Expected Include, got {:?}", ast),
    }
}

#[test]
fn test_parse_assert_with_message() {
    let ast = parse("assert x > 0 : 'must be positive'").expect("Should parse");

    match ast {
        Stmt::Assert {
            condition: Expr::Binary {
                op: BinaryOp::Gt, ..
            },
            message: Some(Expr::Constant {
                value: Value::Str(s),
                ..
            }),
            ..
        } => assert_eq!(s, "must be positive"),
        _ => panic!("Expected Assert with message, got {:?}", ast),
    }
}

#[test]
fn test_parse_var_decl() {
    let ast = parse("def x = 1").expect("Should parse");

    match ast {
        Stmt::VarDecl { targets, .. } => {
            assert_eq!(targets.len(), 1);
            assert_eq!(targets[0].name, "x");
            assert!(targets[0].ty.is_none());
        }
        _ => panic!("Expected VarDecl, got {:?}", ast),
    }
}

#[test]
fn test_parse_typed_multi_var_decl() {
    let ast = parse("def (int a, b) = f()").expect("Should parse");

    match ast {
        Stmt::VarDecl { targets, .. } => {
            assert_eq!(targets.len(), 2);
            assert_eq!(targets[0].ty.as_deref(), Some("int"));
            assert_eq!(targets[0].name, "a");
            assert!(targets[1].ty.is_none());
        }
        _ => panic!("Expected VarDecl, got {:?}", ast),
    }
}

#[test]
fn test_parse_semicolon_is_empty_statement() {
    let ast = parse(";").expect("Should parse");
    assert!(matches!(ast, Stmt::Empty { .. }));
}

#[test]
fn test_empty_module_normalizes_to_return_null() {
    let def = parse_config("   \n  ").expect("Should parse");

    assert_eq!(def.statements.len(), 1);
    match &def.statements[0] {
        Stmt::Return {
            value:
                Some(Expr::Constant {
                    value: Value::Null, ..
                }),
            ..
        } => {}
        other => panic!("Expected Return null, got {:?}", other),
    }
}

/* ===================== Call and Trailing Closure Tests ===================== */

#[test]
fn test_trailing_closure_folds_into_call() {
    let ast = parse("x = foo(1, 2) { x }").expect("Should parse");

    let value = match ast {
        Stmt::Assign { value, .. } => value,
        _ => panic!("Expected Assign, got {:?}", ast),
    };
    match value {
        Expr::MethodCall {
            name: MethodName::Static { name },
            args,
            implicit_this,
            ..
        } => {
            assert_eq!(name, "foo");
            assert!(implicit_this);
            assert_eq!(args.len(), 3);
            assert!(matches!(args[2], Expr::Closure { .. }));
        }
        other => panic!("Expected MethodCall, got {:?}", other),
    }
}

#[test]
fn test_chained_trailing_closures_append_to_same_call() {
    let ast = parse("x = foo(1) { } { }").expect("Should parse");

    match ast {
        Stmt::Assign {
            value: Expr::MethodCall { args, .. },
            ..
        } => {
            assert_eq!(args.len(), 3);
            assert!(matches!(args[1], Expr::Closure { .. }));
            assert!(matches!(args[2], Expr::Closure { .. }));
        }
        _ => panic!("Expected Assign of MethodCall, got {:?}", ast),
    }
}

#[test]
fn test_statement_level_trailing_closure_is_one_call() {
    // the comma keeps this out of the selector form, so it stays one call
    let ast = parse("foo(1, 2) { x }").expect("Should parse");

    match ast {
        Stmt::Expr {
            expr: Expr::MethodCall { args, .. },
            ..
        } => {
            assert_eq!(args.len(), 3);
            assert!(matches!(args[2], Expr::Closure { .. }));
        }
        _ => panic!("Expected one MethodCall, got {:?}", ast),
    }
}

#[test]
fn test_statement_level_call_with_parens_and_block_is_selector() {
    // at statement level the selector form wins over a trailing closure
    let ast = parse("foo(1) { }").expect("Should parse");
    assert!(matches!(ast, Stmt::Selector { .. }));
}

#[test]
fn test_property_receiver_call() {
    let ast = parse("x = a.b.frobnicate(1)").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::MethodCall {
                    receiver,
                    name: MethodName::Static { name },
                    implicit_this,
                    ..
                },
            ..
        } => {
            assert_eq!(name, "frobnicate");
            assert!(!implicit_this);
            assert!(matches!(*receiver, Expr::Property { .. }));
        }
        _ => panic!("Expected explicit-receiver MethodCall, got {:?}", ast),
    }
}

#[test]
fn test_spread_safe_receiver_flips_to_spread_safe_call() {
    let ast = parse("x = items*.resolve()").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::MethodCall {
                    safe, spread_safe, ..
                },
            ..
        } => {
            assert!(!safe);
            assert!(spread_safe);
        }
        _ => panic!("Expected MethodCall, got {:?}", ast),
    }
}

#[test]
fn test_interpolated_string_receiver_is_dynamic_call() {
    let ast = parse("x = \"get${name}\"(1)").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::MethodCall {
                    name: MethodName::Dynamic { .. },
                    implicit_this,
                    ..
                },
            ..
        } => assert!(implicit_this),
        _ => panic!("Expected dynamic MethodCall, got {:?}", ast),
    }
}

#[test]
fn test_parenthesized_receiver_is_generic_call() {
    let ast = parse("x = (f)(1)").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::MethodCall {
                    receiver,
                    name: MethodName::Static { name },
                    implicit_this,
                    ..
                },
            ..
        } => {
            assert_eq!(name, "call");
            assert!(!implicit_this);
            assert!(matches!(*receiver, Expr::Variable { .. }));
        }
        _ => panic!("Expected generic call, got {:?}", ast),
    }
}

#[test]
fn test_named_and_spread_arguments() {
    let ast = parse("x = run(name: 'a', *rest)").expect("Should parse");

    match ast {
        Stmt::Assign {
            value: Expr::MethodCall { args, .. },
            ..
        } => {
            assert_eq!(args.len(), 2);
            match &args[0] {
                Expr::NamedArg { key, .. } => assert_eq!(key, "name"),
                other => panic!("Expected NamedArg, got {:?}", other),
            }
            assert!(matches!(args[1], Expr::Spread { .. }));
        }
        _ => panic!("Expected MethodCall, got {:?}", ast),
    }
}

#[test]
fn test_parse_construct_expression() {
    let ast = parse("x = new java.time.Duration(5)").expect("Should parse");

    match ast {
        Stmt::Assign {
            value: Expr::Construct { ty, args, .. },
            ..
        } => {
            assert_eq!(ty, "java.time.Duration");
            assert_eq!(args.len(), 1);
        }
        _ => panic!("Expected Construct, got {:?}", ast),
    }
}

/* ===================== Expression Tests ===================== */

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let ast = parse("x = 1 + 2 * 3").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::Binary {
                    op: BinaryOp::Add,
                    right,
                    ..
                },
            ..
        } => {
            assert!(matches!(
                *right,
                Expr::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            ));
        }
        _ => panic!("Expected Add over Mul, got {:?}", ast),
    }
}

#[test]
fn test_power_is_right_associative() {
    let ast = parse("x = 2 ** 3 ** 2").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::Binary {
                    op: BinaryOp::Pow,
                    left,
                    right,
                    ..
                },
            ..
        } => {
            assert!(matches!(
                *left,
                Expr::Constant {
                    value: Value::Int(2),
                    ..
                }
            ));
            assert!(matches!(
                *right,
                Expr::Binary {
                    op: BinaryOp::Pow,
                    ..
                }
            ));
        }
        _ => panic!("Expected right-nested Pow, got {:?}", ast),
    }
}

#[test]
fn test_elvis_is_not_a_ternary() {
    let ast = parse("x = a ?: b").expect("Should parse");

    match ast {
        Stmt::Assign { value, .. } => assert!(matches!(value, Expr::Elvis { .. })),
        _ => panic!("Expected Assign, got {:?}", ast),
    }
}

#[test]
fn test_parse_ternary() {
    let ast = parse("x = a ? b : c").expect("Should parse");

    match ast {
        Stmt::Assign { value, .. } => assert!(matches!(value, Expr::Ternary { .. })),
        _ => panic!("Expected Assign, got {:?}", ast),
    }
}

#[test]
fn test_parse_cast_and_type_check() {
    let ast = parse("x = y as int").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::Cast { ty, .. },
            ..
        } => assert_eq!(ty, "int"),
        _ => panic!("Expected Cast, got {:?}", ast),
    }

    let ast = parse("x = y instanceof String").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::TypeCheck { ty, .. },
            ..
        } => assert_eq!(ty, "String"),
        _ => panic!("Expected TypeCheck, got {:?}", ast),
    }
}

#[test]
fn test_range_operator_synonyms() {
    let op_of = |source: &str| match parse(source).expect("Should parse") {
        Stmt::Assign {
            value: Expr::Binary { op, .. },
            ..
        } => op,
        other => panic!("Expected Binary, got {:?}", other),
    };

    assert_eq!(op_of("x = 1..5"), BinaryOp::Range);
    assert_eq!(op_of("x = 1..<5"), BinaryOp::RangeExclusive);
    assert_eq!(op_of("x = 1...5"), BinaryOp::RangeExclusive);
}

#[test]
fn test_membership_operators() {
    let ast = parse("x = a in b").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::Binary { op, .. },
            ..
        } => assert_eq!(op, BinaryOp::In),
        _ => panic!("Expected Binary, got {:?}", ast),
    }

    let ast = parse("x = a !in b").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::Binary { op, .. },
            ..
        } => assert_eq!(op, BinaryOp::NotIn),
        _ => panic!("Expected Binary, got {:?}", ast),
    }
}

#[test]
fn test_negative_literal_folds_into_constant() {
    let ast = parse("x = -3.5").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::Constant {
                    value: Value::Float(f),
                    ..
                },
            ..
        } => assert_eq!(f, -3.5),
        _ => panic!("Expected folded Constant, got {:?}", ast),
    }
}

#[test]
fn test_prefix_and_postfix_increment() {
    let ast = parse("x = ++a").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::Prefix { op, .. },
            ..
        } => assert_eq!(op, IncDecOp::Inc),
        _ => panic!("Expected Prefix, got {:?}", ast),
    }

    let ast = parse("x = a--").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::Postfix { op, .. },
            ..
        } => assert_eq!(op, IncDecOp::Dec),
        _ => panic!("Expected Postfix, got {:?}", ast),
    }
}

#[test]
fn test_safe_navigation_property() {
    let ast = parse("x = a?.b").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::Property {
                    safe, spread_safe, ..
                },
            ..
        } => {
            assert!(safe);
            assert!(!spread_safe);
        }
        _ => panic!("Expected Property, got {:?}", ast),
    }
}

#[test]
fn test_string_literal_property_name() {
    let ast = parse("x = a.'b c'").expect("Should parse");

    match ast {
        Stmt::Assign {
            value: Expr::Property { name, .. },
            ..
        } => assert_eq!(name, "b c"),
        _ => panic!("Expected Property, got {:?}", ast),
    }
}

#[test]
fn test_multi_element_index_wraps_into_list() {
    let ast = parse("x = m[1, 2]").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::Index { index, .. },
            ..
        } => match *index {
            Expr::ListLit { ref elements, .. } => assert_eq!(elements.len(), 2),
            ref other => panic!("Expected ListLit index, got {:?}", other),
        },
        _ => panic!("Expected Index, got {:?}", ast),
    }

    let ast = parse("x = m[k]").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::Index { index, .. },
            ..
        } => assert!(matches!(*index, Expr::Variable { .. })),
        _ => panic!("Expected Index, got {:?}", ast),
    }
}

#[test]
fn test_single_spread_index_wraps_into_list() {
    let ast = parse("x = m[*keys]").expect("Should parse");

    match ast {
        Stmt::Assign {
            value: Expr::Index { index, .. },
            ..
        } => match *index {
            Expr::ListLit { ref elements, .. } => {
                assert_eq!(elements.len(), 1);
                assert!(matches!(elements[0], Expr::Spread { .. }));
            }
            ref other => panic!("Expected ListLit index, got {:?}", other),
        },
        _ => panic!("Expected Index, got {:?}", ast),
    }
}

/* ===================== Collection Literal Tests ===================== */

#[test]
fn test_parse_list_and_map_literals() {
    let ast = parse("x = [1, 2, 3]").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::ListLit { elements, .. },
            ..
        } => assert_eq!(elements.len(), 3),
        _ => panic!("Expected ListLit, got {:?}", ast),
    }

    let ast = parse("x = [a: 1, 'b c': 2]").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::MapLit { entries, .. },
            ..
        } => {
            assert_eq!(entries.len(), 2);
            match &entries[0].0 {
                Expr::Constant {
                    value: Value::Str(s),
                    ..
                } => assert_eq!(s, "a"),
                other => panic!("Expected string key, got {:?}", other),
            }
            match &entries[1].0 {
                Expr::Constant {
                    value: Value::Str(s),
                    ..
                } => assert_eq!(s, "b c"),
                other => panic!("Expected string key, got {:?}", other),
            }
        }
        _ => panic!("Expected MapLit, got {:?}", ast),
    }
}

#[test]
fn test_parse_empty_collections() {
    let ast = parse("x = []").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::ListLit { elements, .. },
            ..
        } => assert!(elements.is_empty()),
        _ => panic!("Expected ListLit, got {:?}", ast),
    }

    let ast = parse("x = [:]").expect("Should parse");
    match ast {
        Stmt::Assign {
            value: Expr::MapLit { entries, .. },
            ..
        } => assert!(entries.is_empty()),
        _ => panic!("Expected MapLit, got {:?}", ast),
    }
}

#[test]
fn test_stray_comma_literal_is_syntax_error() {
    let failure = parse("x = [,]").expect_err("Should fail");
    let diag = &failure.diagnostics[0];
    assert_eq!(diag.kind, DiagnosticKind::Syntax);
    assert!(diag.message.contains("stray comma"), "{}", diag.message);
}

/* ===================== Literal Tests ===================== */

#[test]
fn test_parse_numeric_literals() {
    let int_of = |source: &str| match parse(source).expect("Should parse") {
        Stmt::Assign {
            value:
                Expr::Constant {
                    value: Value::Int(n),
                    ..
                },
            ..
        } => n,
        other => panic!("Expected int Constant, got {:?}", other),
    };

    assert_eq!(int_of("x = 42"), 42);
    assert_eq!(int_of("x = 1_000_000"), 1_000_000);
    assert_eq!(int_of("x = 0xFF"), 255);

    match parse("x = 1.5e3").expect("Should parse") {
        Stmt::Assign {
            value:
                Expr::Constant {
                    value: Value::Float(f),
                    ..
                },
            ..
        } => assert_eq!(f, 1500.0),
        other => panic!("Expected float Constant, got {:?}", other),
    }
}

#[test]
fn test_malformed_numeric_literal_is_deferred() {
    let source = "a = 99999999999999999999999\nb = 2";
    let failure = parse_config(source).expect_err("Should fail");

    // the rest of the module assembled; only the deferred diagnostic remains
    assert_eq!(failure.diagnostics.len(), 1);
    let diag = &failure.diagnostics[0];
    assert_eq!(diag.kind, DiagnosticKind::Semantic);
    assert!(
        diag.message.contains("99999999999999999999999"),
        "{}",
        diag.message
    );
    // positioned at the literal itself, not the statement
    assert_eq!(diag.span.start, 4);
    assert_eq!(diag.span.start_line, 0);
}

#[test]
fn test_first_malformed_numeric_literal_wins() {
    let source = "a = 0xFFFFFFFFFFFFFFFFFF\nb = 99999999999999999999999";
    let failure = parse_config(source).expect_err("Should fail");

    assert_eq!(failure.diagnostics.len(), 1);
    assert!(
        failure.diagnostics[0].message.contains("0xFFFFFFFFFFFFFFFFFF"),
        "{}",
        failure.diagnostics[0].message
    );
}

#[test]
fn test_parse_string_escapes() {
    let str_of = |source: &str| match parse(source).expect("Should parse") {
        Stmt::Assign {
            value:
                Expr::Constant {
                    value: Value::Str(s),
                    ..
                },
            ..
        } => s,
        other => panic!("Expected string Constant, got {:?}", other),
    };

    assert_eq!(str_of(r"x = 'a\nb'"), "a\nb");
    assert_eq!(str_of(r"x = 'a\tb'"), "a\tb");
    assert_eq!(str_of(r"x = 'don\'t'"), "don't");
    assert_eq!(str_of(r"x = 'A'"), "A");
    // unknown escapes keep the escaped character
    assert_eq!(str_of(r"x = 'a\qb'"), "aqb");
    // slashy strings only collapse the escaped delimiter
    assert_eq!(str_of(r"x = /a\/b/"), "a/b");
    assert_eq!(str_of(r"x = /a\d+/"), r"a\d+");
}

#[test]
fn test_parse_triple_quoted_string_strips_carriage_returns() {
    let ast = parse("x = '''line1\r\nline2'''").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::Constant {
                    value: Value::Str(s),
                    ..
                },
            ..
        } => assert_eq!(s, "line1\nline2"),
        _ => panic!("Expected string Constant, got {:?}", ast),
    }
}

/* ===================== Interpolation Tests ===================== */

#[test]
fn test_parse_interpolated_string() {
    let ast = parse("x = \"a${b}c\"").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::Interp {
                    raw,
                    fragments,
                    values,
                    ..
                },
            ..
        } => {
            assert_eq!(raw, "\"a${b}c\"");
            assert_eq!(fragments, vec!["a".to_string(), "c".to_string()]);
            assert_eq!(values.len(), 1);
            assert!(matches!(values[0], Expr::Variable { .. }));
        }
        _ => panic!("Expected Interp, got {:?}", ast),
    }
}

#[test]
fn test_parse_path_interpolation() {
    let ast = parse("x = \"dir: $params.outdir\"").expect("Should parse");

    match ast {
        Stmt::Assign {
            value: Expr::Interp { values, .. },
            ..
        } => {
            assert_eq!(values.len(), 1);
            match &values[0] {
                Expr::Property { receiver, name, .. } => {
                    assert_eq!(name, "outdir");
                    assert!(matches!(**receiver, Expr::Variable { .. }));
                }
                other => panic!("Expected Property path, got {:?}", other),
            }
        }
        _ => panic!("Expected Interp, got {:?}", ast),
    }
}

#[test]
fn test_double_quoted_without_interpolation_is_constant() {
    let ast = parse("x = \"plain\"").expect("Should parse");

    match ast {
        Stmt::Assign {
            value:
                Expr::Constant {
                    value: Value::Str(s),
                    ..
                },
            ..
        } => assert_eq!(s, "plain"),
        _ => panic!("Expected string Constant, got {:?}", ast),
    }
}

/* ===================== Two-Phase and Diagnostic Tests ===================== */

#[test]
fn test_unterminated_string_is_lexer_error() {
    let failure = parse_config("x = 'abc").expect_err("Should fail");

    assert_eq!(failure.diagnostics.len(), 1);
    assert_eq!(failure.diagnostics[0].kind, DiagnosticKind::Lexer);
}

#[test]
fn test_syntax_error_reports_position() {
    let failure = parse_config("a = = 1").expect_err("Should fail");

    assert!(!failure.diagnostics.is_empty());
    let diag = &failure.diagnostics[0];
    assert_eq!(diag.kind, DiagnosticKind::Syntax);
    assert_eq!(diag.span.start_line, 0);
}

#[test]
fn test_unbalanced_brace_is_reported() {
    let failure = parse_config("foo {").expect_err("Should fail");

    assert!(failure
        .diagnostics
        .iter()
        .any(|d| d.message.contains("unbalanced")));
}

#[test]
fn test_missing_value_reports_syntax_error() {
    let failure = parse_config("docker.enabled = ").expect_err("Should fail");

    assert!(!failure.diagnostics.is_empty());
    assert_eq!(failure.diagnostics[0].kind, DiagnosticKind::Syntax);
}

#[test]
fn test_sibling_statements_all_report() {
    // both bad statements surface from one attempt
    let failure = parse_config("x = [,]\ny = [,]").expect_err("Should fail");
    assert_eq!(failure.diagnostics.len(), 2);
}

#[test]
fn test_precise_phase_matches_fast_phase_on_valid_input() {
    let source = "docker.enabled = true\nprofiles { standard { cpus = 1 } }";

    let fast = parse_config(source).expect("Should parse");
    let mut diags = Diagnostics::new();
    let precise = parser::precise_parse(source, &mut diags).expect("Should parse leniently");

    assert!(diags.finish().is_empty());
    assert_eq!(
        serde_json::to_string(&fast).unwrap(),
        serde_json::to_string(&precise).unwrap()
    );
}

#[test]
fn test_parsing_is_deterministic() {
    let source = "withLabel: 'big' { memory = '8 GB' }\nx = foo(1, 2) { y }\nz = [a: 1]";

    let first = parse_config(source).expect("Should parse");
    let second = parse_config(source).expect("Should parse");

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_ast_serializes_round_trip() {
    let def = parse_config("docker.enabled = true").expect("Should parse");

    let json = serde_json::to_string(&def).unwrap();
    let back: crate::ast::ConfigDef = serde_json::from_str(&json).unwrap();
    assert_eq!(json, serde_json::to_string(&back).unwrap());
}

#[test]
fn test_diagnostic_display_is_one_indexed() {
    let failure = parse_config("x = [,]").expect_err("Should fail");
    let rendered = failure.diagnostics[0].to_string();
    assert!(rendered.contains("line 1"), "{}", rendered);
}
