use dust::driver::{Session, SessionError, SessionOptions, SessionReport};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use dust::jit::{BufferHost, Host, RtValue};
use dust::source::{LineRead, LineSource, TokenBuffer};

type TestSession = Session<TokenBuffer, BufferHost, Vec<u8>>;

fn session_with(src: &str, host: BufferHost) -> TestSession {
    let source = TokenBuffer::from_source(src).expect("lexing failed");
    Session::with_parts(source, host, Vec::new(), SessionOptions::default())
}

fn run(src: &str) -> (SessionReport, TestSession) {
    let mut session = session_with(src, BufferHost::new());
    let report = session.run().expect("session aborted");
    (report, session)
}

fn echo(session: &TestSession) -> String {
    String::from_utf8_lossy(session.output()).into_owned()
}

fn printed(session: &TestSession) -> &str {
    &session.engine().host().output
}

#[test]
fn precedence_evaluates_multiplication_first() {
    let (report, _) = run("2 + 3 * 4;");
    assert_eq!(report.values, vec![RtValue::Num(14.0)]);
}

#[test]
fn subtraction_folds_left_to_right() {
    let (report, _) = run("8 - 3 - 2;");
    assert_eq!(report.values, vec![RtValue::Num(3.0)]);
}

#[test]
fn shadowing_round_trip() {
    let src = "
        fn shadow() {
            var x = 1; {
                var x = x + 1; { printd(x); }
                printd(x);
            }
            return 0;
        }
        shadow();
    ";
    let (report, session) = run(src);
    assert_eq!(report.errors, 0, "{}", echo(&session));
    assert_eq!(printed(&session), "2.000000\n1.000000\n");
}

#[test]
fn for_loop_runs_body_five_times_in_order() {
    let (report, session) = run("for i = 0; i < 5; 1 { printd(i); }");
    assert_eq!(report.errors, 0, "{}", echo(&session));
    assert_eq!(printed(&session), "0.000000\n1.000000\n2.000000\n3.000000\n4.000000\n");
    // A loop statement has no value to print.
    assert!(report.values.is_empty());
    assert_eq!(report.expressions, 1);
}

#[test]
fn extern_forward_reference_resolves_to_later_definition() {
    let src = "
        extern later(x: num);
        fn caller(x: num) { return later(x) + 1; }
        caller(1);
        fn later(x: num) { return x * 2; }
        caller(5);
    ";
    let (report, session) = run(src);
    // The first call runs before `later` exists and fails at run time.
    assert_eq!(report.errors, 1, "{}", echo(&session));
    assert_eq!(report.values, vec![RtValue::Num(11.0)]);
    assert_eq!(report.externs, 1);
    assert_eq!(report.functions, 2);
}

#[test]
fn duplicate_definition_keeps_first_callable() {
    let src = "
        fn f(x: num) { return x + 1; }
        fn f(x: num) { return x + 2; }
        f(1);
    ";
    let (report, session) = run(src);
    assert_eq!(report.errors, 1);
    assert_eq!(report.functions, 1);
    assert_eq!(report.values, vec![RtValue::Num(2.0)]);
    assert!(echo(&session).contains("cannot be redefined"));
}

#[test]
fn arity_mismatch_is_reported_and_session_continues() {
    let src = "
        fn f(x: num) { return x; }
        f(1, 2);
        f(3);
    ";
    let (report, session) = run(src);
    assert_eq!(report.errors, 1);
    assert_eq!(report.values, vec![RtValue::Num(3.0)]);
    assert!(echo(&session).contains("incorrect number of arguments"));
}

#[test]
fn anonymous_expression_is_unloaded_after_running() {
    let (_, session) = run("fn one() { return 1; } one() + 1;");
    assert!(session.engine().lookup("__anon_expr").is_none());
    assert!(session.engine().lookup("one").is_some());
    assert_eq!(session.engine().module_count(), 1);
}

#[test]
fn missing_expression_skips_one_token() {
    let (report, _) = run(") 2 + 2;");
    assert_eq!(report.errors, 1);
    assert_eq!(report.values, vec![RtValue::Num(4.0)]);
}

#[test]
fn lowering_errors_do_not_stop_the_session() {
    let (report, _) = run("y + 1; nope(2); 1 = 2; 7;");
    assert_eq!(report.errors, 3);
    assert_eq!(report.values, vec![RtValue::Num(7.0)]);
}

#[test]
fn grammar_violation_ends_the_session() {
    let mut session = session_with("1; fn f(x num) { }", BufferHost::new());
    let err = session.run().unwrap_err();
    assert!(matches!(err, SessionError::Fatal(_)));
    assert!(err.to_string().starts_with("fatal: "));
    // Constructs before the violation already ran.
    assert_eq!(session.report().values, vec![RtValue::Num(1.0)]);
}

#[test]
fn echoes_ir_and_results() {
    let (_, session) = run("fn f(x: num) { return x * 2; } extern g(): str; f(7);");
    let out = echo(&session);
    assert!(out.contains("Read function definition:\ndefine num @f(num %x) {"));
    assert!(out.contains("Read extern:\ndeclare str @g()"));
    assert!(out.contains("Read top-level expression:\ndefine num @__anon_expr() {"));
    assert!(out.contains("Evaluated to 14.000000"));
}

#[test]
fn echo_can_be_disabled() {
    let source = TokenBuffer::from_source("fn f() { return 1; } f();").unwrap();
    let options = SessionOptions { echo_ir: false, ..SessionOptions::default() };
    let mut session = Session::with_parts(source, BufferHost::new(), Vec::new(), options);
    session.run().unwrap();
    assert_eq!(String::from_utf8_lossy(session.output()), "Evaluated to 1.000000\n");
}

#[test]
fn strings_and_input_intrinsics() {
    let mut session = session_with("prints(\"hello\"); scand() * 2;", BufferHost::with_input([4.0]));
    let report = session.run().unwrap();
    assert_eq!(printed(&session), "hello\n");
    assert_eq!(report.values, vec![RtValue::Num(0.0), RtValue::Num(8.0)]);
}

#[test]
fn recursion_and_string_results() {
    let src = "
        fn fib(n: num) {
            if n < 2 { return n; }
            return fib(n - 1) + fib(n - 2);
        }
        fib(10);
        fn name(): str { return \"dust\"; }
        name();
        fn pick(n: num): str { return if n == 5 { \"yes\" } else { \"no\" }; }
        pick(fib(5));
    ";
    let (report, session) = run(src);
    assert_eq!(report.errors, 0, "{}", echo(&session));
    assert_eq!(report.values, vec![RtValue::Num(55.0), RtValue::from("dust"), RtValue::from("yes")]);
    assert!(echo(&session).contains("Evaluated to dust"));
}

#[test]
fn void_functions_print_no_result() {
    let (report, session) = run("fn hi(): void { prints(\"hi\"); } hi();");
    assert_eq!(report.errors, 0, "{}", echo(&session));
    assert!(report.values.is_empty());
    assert!(!echo(&session).contains("Evaluated to"));
    assert_eq!(printed(&session), "hi\n");
}

#[test]
fn interactive_source_reads_line_by_line() {
    let input: &[u8] = b"fn sq(x: num) { return x * x; }\nsq(\n 3);\n";
    let mut prompts = Vec::new();
    let source = LineSource::new(input, &mut prompts);
    let mut session = Session::with_parts(source, BufferHost::new(), Vec::new(), SessionOptions::default());
    let report = session.run().unwrap();
    assert_eq!(report.values, vec![RtValue::Num(9.0)]);
    drop(session);
    assert!(String::from_utf8_lossy(&prompts).contains("ready> "));
}

#[test]
fn runaway_recursion_is_reported_and_the_session_continues() {
    let (report, session) = run("fn up(x: num) { return up(x + 1); } up(0); 1;");
    assert_eq!(report.errors, 1, "{}", echo(&session));
    assert!(echo(&session).contains("stack overflow"), "{}", echo(&session));
    assert_eq!(report.values, vec![RtValue::Num(1.0)]);
}

/// One line queue shared by the session's source and the running program,
/// the way stdin is shared in interactive mode.
#[derive(Clone, Default)]
struct Terminal {
    lines: Rc<RefCell<VecDeque<String>>>,
    output: Rc<RefCell<String>>,
}

impl Terminal {
    fn new(lines: &[&str]) -> Self {
        let terminal = Terminal::default();
        terminal.lines.borrow_mut().extend(lines.iter().map(|l| format!("{l}\n")));
        terminal
    }
}

impl LineRead for Terminal {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        let line = self.lines.borrow_mut().pop_front().unwrap_or_default();
        buf.push_str(&line);
        Ok(line.len())
    }
}

impl Host for Terminal {
    fn write(&mut self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }

    fn read_number(&mut self) -> Option<f64> {
        self.lines.borrow_mut().pop_front()?.trim().parse().ok()
    }
}

#[test]
fn scand_reads_the_line_after_the_statement() {
    let terminal = Terminal::new(&["scand() + 1;", "41", "printd(2);"]);
    let source = LineSource::new(terminal.clone(), io::sink());
    let mut session = Session::with_parts(source, terminal.clone(), Vec::new(), SessionOptions::default());
    let report = session.run().unwrap();
    assert_eq!(report.errors, 0, "{}", String::from_utf8_lossy(session.output()));
    assert_eq!(report.values, vec![RtValue::Num(42.0), RtValue::Num(0.0)]);
    assert_eq!(*terminal.output.borrow(), "2.000000\n");
}

#[test]
fn interactive_if_without_else_runs_once_the_next_line_arrives() {
    let input: &[u8] = b"if 1 { printd(1); }\nprintd(2);\n";
    let source = LineSource::new(input, io::sink());
    let mut session = Session::with_parts(source, BufferHost::new(), Vec::new(), SessionOptions::default());
    let report = session.run().unwrap();
    assert_eq!(report.errors, 0, "{}", String::from_utf8_lossy(session.output()));
    assert_eq!(report.expressions, 2);
    assert_eq!(session.engine().host().output, "1.000000\n2.000000\n");
}
