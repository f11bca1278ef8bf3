use dust::ast::Item;
use dust::ir::{DefinitionRegistry, LoweringContext, LoweringOptions, Module};
use dust::jit::{BufferHost, ExecError, ExecutionEngine, RtValue, DEFAULT_MAX_DEPTH};
use dust::parser::Parser;
use dust::source::TokenBuffer;
use dust::types::Type;

fn lower_unit(src: &str, options: LoweringOptions) -> Module {
    let items = Parser::new(TokenBuffer::from_source(src).unwrap()).parse_program().unwrap();
    let mut module = Module::new("test");
    let mut registry = DefinitionRegistry::new();
    let mut ctx = LoweringContext::new(&mut module, &mut registry, options);
    for item in &items {
        match item {
            Item::Function(function) => {
                ctx.lower_function(function).unwrap();
            }
            Item::Extern(proto) => {
                ctx.lower_prototype(proto).unwrap();
            }
            Item::Stmt(stmt) => panic!("unexpected statement {stmt}"),
        }
    }
    module
}

fn engine_with(src: &str) -> ExecutionEngine<BufferHost> {
    let mut engine = ExecutionEngine::with_host(BufferHost::new());
    engine.add_module(lower_unit(src, LoweringOptions::default())).unwrap();
    engine
}

#[test]
fn loads_calls_and_removes_modules() {
    let mut engine = ExecutionEngine::with_host(BufferHost::new());
    let module = lower_unit("fn add(a: num, b: num) { return a + b; }", LoweringOptions::default());
    let tracker = engine.add_module(module).unwrap();

    let symbol = engine.lookup("add").unwrap();
    assert_eq!(symbol.params, vec![Type::Num, Type::Num]);
    assert_eq!(symbol.ret, Type::Num);
    assert_eq!(symbol.tracker, tracker);
    let args = [RtValue::Num(2.0), RtValue::Num(3.0)];
    assert_eq!(engine.call("add", &args), Ok(RtValue::Num(5.0)));

    engine.remove(tracker).unwrap();
    assert!(engine.lookup("add").is_none());
    assert_eq!(engine.call("add", &args), Err(ExecError::UnresolvedSymbol("add".into())));
    assert_eq!(engine.remove(tracker), Err(ExecError::UnknownTracker(tracker.id())));
}

#[test]
fn duplicate_symbols_are_rejected_without_loading() {
    let mut engine = engine_with("fn f() { return 1; }");
    let second = lower_unit("fn f() { return 2; } fn g() { return 3; }", LoweringOptions::default());
    assert_eq!(engine.add_module(second), Err(ExecError::DuplicateSymbol("f".into())));
    assert_eq!(engine.module_count(), 1);
    assert!(engine.lookup("g").is_none());
    assert_eq!(engine.call("f", &[]), Ok(RtValue::Num(1.0)));
}

#[test]
fn declarations_resolve_across_modules() {
    let mut engine = engine_with("extern base(x: num); fn twice(x: num) { return base(x) * 2; }");
    assert_eq!(engine.call("twice", &[RtValue::Num(1.0)]), Err(ExecError::UnresolvedSymbol("base".into())));
    engine.add_module(lower_unit("fn base(x: num) { return x + 10; }", LoweringOptions::default())).unwrap();
    assert_eq!(engine.call("twice", &[RtValue::Num(1.0)]), Ok(RtValue::Num(22.0)));
}

#[test]
fn loops_agree_with_and_without_optimization() {
    let src = "
        fn sum(n: num) {
            var total = 0; {
                for i = 0; i < n; 1 { total = total + i; }
                return total;
            }
        }
    ";
    for optimize in [false, true] {
        let mut engine = ExecutionEngine::with_host(BufferHost::new());
        let options = LoweringOptions { optimize, verify_passes: true };
        engine.add_module(lower_unit(src, options)).unwrap();
        assert_eq!(engine.call("sum", &[RtValue::Num(10.0)]), Ok(RtValue::Num(45.0)), "optimize = {optimize}");
    }
}

#[test]
fn deep_recursion_overflows_cleanly() {
    let mut engine = ExecutionEngine::with_host(BufferHost::new()).with_max_depth(64);
    engine.add_module(lower_unit("fn spin(x: num) { return spin(x); }", LoweringOptions::default())).unwrap();
    assert_eq!(engine.call("spin", &[RtValue::Num(0.0)]), Err(ExecError::StackOverflow(64)));
}

#[test]
fn default_depth_limit_is_reachable() {
    let mut engine = engine_with("fn down(n: num) { if n < 1 { return 0; } return down(n - 1) + 1; }");
    let depth = (DEFAULT_MAX_DEPTH - 1) as f64;
    assert_eq!(engine.call("down", &[RtValue::Num(depth - 1.0)]), Ok(RtValue::Num(depth - 1.0)));
    assert_eq!(
        engine.call("down", &[RtValue::Num(depth + 1.0)]),
        Err(ExecError::StackOverflow(DEFAULT_MAX_DEPTH))
    );
}

#[test]
fn division_follows_ieee() {
    let mut engine = engine_with("fn div(a: num, b: num) { return a / b; }");
    let result = engine.call("div", &[RtValue::Num(1.0), RtValue::Num(0.0)]).unwrap();
    assert_eq!(result.as_num(), Some(f64::INFINITY));
}

#[test]
fn bad_arguments_are_rejected() {
    let mut engine = engine_with("fn id(x: num) { return x; }");
    assert_eq!(
        engine.call("id", &[RtValue::from("s")]),
        Err(ExecError::BadArguments { function: "id".into() })
    );
    assert_eq!(engine.call("id", &[]), Err(ExecError::BadArguments { function: "id".into() }));
}

#[test]
fn intrinsics_are_callable_directly() {
    let mut engine = ExecutionEngine::with_host(BufferHost::new());
    assert_eq!(engine.call("printd", &[RtValue::Num(1.5)]), Ok(RtValue::Num(0.0)));
    assert_eq!(engine.call("putchard", &[RtValue::Num(10.0)]), Ok(RtValue::Num(0.0)));
    assert_eq!(engine.host().output, "1.500000\n\n");
}

#[test]
fn strings_flow_through_calls() {
    let mut engine = engine_with(
        "fn choose(flag: num, a: str, b: str): str { if flag { return a; } return b; }
         fn show(s: str): void { prints(s); }",
    );
    let picked = engine.call("choose", &[RtValue::Num(0.0), RtValue::from("a"), RtValue::from("b")]).unwrap();
    assert_eq!(picked, RtValue::from("b"));
    assert_eq!(engine.call("show", &[picked]), Ok(RtValue::Void));
    assert_eq!(engine.host().output, "b\n");
}

#[test]
fn shadowed_parameter_survives_the_loop() {
    let mut engine = engine_with("fn f(i: num) { for i = 0; i < 3 { } return i; }");
    assert_eq!(engine.call("f", &[RtValue::Num(7.0)]), Ok(RtValue::Num(7.0)));
}
