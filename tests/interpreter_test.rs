use color_eyre::eyre::Result;
use pardal::{
    environment::Environment,
    interpreter::{BufferedContext, Interpreter, ProgramState, TreeWalkInterpreter},
    parser::Parser,
    value::{
        error::{RuntimeError, RuntimeErrorKind},
        formatter::{BasicFormatter, ValueFormatter},
        Value,
    },
};

fn execute(source: &str, context: &mut BufferedContext) -> Result<Value, RuntimeError> {
    let program = Parser::new(source)
        .parse()
        .unwrap_or_else(|error| panic!("Failed to parse {source:?}: {error}"));
    TreeWalkInterpreter::new(program).run(context)
}

fn check(source: &str, expected: &str) {
    let mut context = BufferedContext::new();
    if let Err(error) = execute(source, &mut context) {
        panic!(
            "Failed to run {source:?}: {}",
            BasicFormatter::new(source).format_error(&error)
        );
    }
    assert_eq!(context.into_data(), expected, "Failed on {source:?}");
}

fn check_error(source: &str, expected_code: &str) -> RuntimeError {
    let mut context = BufferedContext::new();
    match execute(source, &mut context) {
        Ok(value) => panic!("Expected {expected_code} from {source:?} but got {value}"),
        Err(error) => {
            assert_eq!(error.code(), expected_code, "Failed on {source:?}: {error}");
            error
        }
    }
}

#[test]
fn test_arithmetic_and_concatenation() {
    check(
        "console.escreva(1 + 2, 7 - 10, 2 * 3.5, 7 % 4, 1 / 4)",
        "3 -3 7 3 0.25\n",
    );
    check("console.escreva(\"a\" + 1, 2 + \"b\", \"x\" + \"y\")", "a1 2b xy\n");
    check("console.escreva(1 / 0, -1 / 0)", "Infinity -Infinity\n");
    check("console.escreva((1 + 2) * 3, 1 + 2 * 3)", "9 7\n");
}

#[test]
fn test_negation() {
    check("console.escreva(-5, negar verdadeiro, negar -2)", "-5 falso 2\n");
    check_error("negar \"a\"", "RT014");
}

#[test]
fn test_equality_and_ordering() {
    check(
        "console.escreva(nulo == nulo, 1 == \"1\", [1] == [1], 2 != 3)",
        "verdadeiro falso falso verdadeiro\n",
    );
    check(
        "declarar l = []\nconsole.escreva(l == l, \"abc\" < \"abd\", falso < verdadeiro, 3 >= 3)",
        "verdadeiro verdadeiro verdadeiro verdadeiro\n",
    );
    check_error("console.escreva(\"a\" < 1)", "RT004");
}

#[test]
fn test_logical_operators() {
    check(
        "console.escreva(verdadeiro e falso, verdadeiro ou falso, 1 < 2 e 2 < 3)",
        "falso verdadeiro verdadeiro\n",
    );
    // Both sides are always evaluated and must be Booleans.
    check_error("falso e 1", "RT005");
}

#[test]
fn test_shadowing_is_undone_on_block_exit() {
    check(
        "declarar x = 1\nbloco\n  declarar x = 2\n  console.escreva(x)\nfim\nconsole.escreva(x)",
        "2\n1\n",
    );
}

#[test]
fn test_assignment_reaches_outer_scope() {
    check(
        "declarar x = 1\nbloco\n  x = 5\nfim\nconsole.escreva(x)",
        "5\n",
    );
}

#[test]
fn test_break_only_stops_inner_loop() {
    let source = r#"
para i de 0 ate 3 opere i = i + 1 faca
  para j de 0 ate 3 opere j = j + 1 faca
    se j == 1 faca
      parar
    fim
    console.escreva(i, j)
  fim
fim
"#;
    check(source, "0 0\n1 0\n2 0\n");
}

#[test]
fn test_continue_in_while() {
    let source = r#"
declarar i = 0
enquanto i < 5 faca
  i = i + 1
  se i % 2 == 0 faca
    continuar
  fim
  console.escreva(i)
fim
"#;
    check(source, "1\n3\n5\n");
}

#[test]
fn test_numeric_for_with_step() {
    check(
        "para i de 0 ate 5 opere i = i + 1 faca console.escreva(i) fim",
        "0\n1\n2\n3\n4\n",
    );
}

#[test]
fn test_numeric_for_without_step_never_advances() {
    let source = r#"
declarar n = 0
para i de 0 ate 5 faca
  console.escreva(i)
  n = n + 1
  se n == 3 faca
    parar
  fim
fim
"#;
    check(source, "0\n0\n0\n");
}

#[test]
fn test_numeric_for_boolean_limit() {
    check(
        "para i de 0 ate i == 3 opere i = i + 1 faca console.escreva(i) fim",
        "0\n1\n2\n",
    );
    // Any other limit type stops the loop immediately.
    check("para i ate nulo faca console.escreva(i) fim", "");
}

#[test]
fn test_numeric_for_reuses_existing_variable() {
    check(
        "declarar i = 10\npara i ate 12 opere i = i + 1 faca fim\nconsole.escreva(i)",
        "12\n",
    );
}

#[test]
fn test_iterative_for_over_array() {
    check(
        "para cada i, v em [\"a\", \"b\"] faca console.escreva(i, v) fim",
        "0 a\n1 b\n",
    );
}

#[test]
fn test_dictionary_iterates_in_insertion_order() {
    let source = r#"
declarar d = { a = 1, b = 2, c = 3 }
d.b = nulo
d.d = 4
para cada k, v em d faca
  console.escreva(k, v)
fim
"#;
    check(source, "a 1\nc 3\nd 4\n");
}

#[test]
fn test_dictionary_reassignment_keeps_position() {
    check(
        "declarar d = { a = 1, b = 2 }\nd.a = 5\nconsole.escreva(d)",
        "{[\"a\"] = 5, [\"b\"] = 2}\n",
    );
}

#[test]
fn test_iterating_a_number_fails() {
    check_error("para cada k, v em 1 faca fim", "RT010");
}

#[test]
fn test_return_yields_first_value() {
    check(
        "funcao f()\n  retorna 1, 2\nfim\nconsole.escreva(f())",
        "1\n",
    );
    check(
        "funcao g()\n  declarar x = 1\nfim\nconsole.escreva(g())",
        "nulo\n",
    );
    check(
        "funcao h()\n  se verdadeiro faca\n    retorna\n  fim\n  console.escreva(\"nunca\")\nfim\nconsole.escreva(h())",
        "nulo\n",
    );
}

#[test]
fn test_return_from_inside_loop() {
    let source = r#"
funcao primeiro(lista)
  para cada i, v em lista faca
    se v > 2 faca
      retorna v
    fim
  fim
  retorna -1
fim
console.escreva(primeiro([1, 5, 3]), primeiro([1]))
"#;
    check(source, "5 -1\n");
}

#[test]
fn test_recursion() {
    let source = r#"
funcao fib(n)
  se n < 2 faca
    retorna n
  fim
  retorna fib(n - 1) + fib(n - 2)
fim
console.escreva(fib(10))
"#;
    check(source, "55\n");
}

#[test]
fn test_closures_share_their_context() {
    let source = r#"
funcao contador()
  declarar n = 0
  retorna funcao()
    n = n + 1
    retorna n
  fim
fim
declarar c = contador()
c()
c()
console.escreva(c())
"#;
    check(source, "3\n");
}

#[test]
fn test_arguments() {
    check(
        "funcao f(a)\n  retorna a\nfim\nconsole.escreva(f(1, 2))",
        "1\n",
    );
    // Missing arguments leave their parameters unbound.
    check_error("funcao f(a, b)\n  retorna b\nfim\nf(1)", "RT001");
}

#[test]
fn test_if_chains() {
    let source = r#"
funcao classifica(n)
  se n < 0 faca
    retorna "negativo"
  fim caso n == 0 faca
    retorna "zero"
  fim senao faca
    retorna "positivo"
  fim
fim
console.escreva(classifica(-3), classifica(0), classifica(8))
"#;
    check(source, "negativo zero positivo\n");
}

#[test]
fn test_array_methods() {
    let source = r#"
declarar l = [1, 2, 3]
l.adiciona(4)
l[0] = nulo
console.escreva(l, l.tamanho(), l[0], l.pega(1))
l.seta(5, "x")
console.escreva(l, l.remove(0))
"#;
    // Arguments are evaluated left to right but `l` is shown after `remove` ran.
    check(source, "[2, 3, 4] 3 2 3\n[3, 4, nulo, nulo, x] 2\n");
}

#[test]
fn test_dictionary_methods() {
    check(
        "declarar d = {}\nd.seta(\"k\", 1)\nconsole.escreva(d.pega(\"k\"), d[\"k\"], d.tamanho(), d.falta)",
        "1 1 1 nulo\n",
    );
}

#[test]
fn test_function_display() {
    check(
        "funcao f() fim\nconsole.escreva(f, console.escreva)",
        "<função f> <função nativa escreva>\n",
    );
}

#[test]
fn test_math_library() {
    check(
        "console.escreva(math.raiz(16), math.potencia(2, 10), math.absoluto(-3), math.teto(1.2), math.chao(1.8))",
        "4 1024 3 2 1\n",
    );
    check(
        "declarar r = math.aleatorio(5, 6)\nconsole.escreva(r >= 5 e r < 6)",
        "verdadeiro\n",
    );
    check("console.escreva(math.PI > 3.14 e math.PI < 3.15)", "verdadeiro\n");
    check_error("math.raiz(\"x\")", "RT012");
    check_error("math.aleatorio(3, 1)", "RT012");
}

#[test]
fn test_console_input() {
    let mut context = BufferedContext::with_input(["pardal"]);
    let source = "declarar nome = console.leia(\"nome?\")\nconsole.escreva(\"ola \" + nome)\nconsole.escreva(console.leia())";
    execute(source, &mut context).expect("Program is valid");
    assert_eq!(context.into_data(), "ola pardal\nnulo\n");
}

#[test]
fn test_console_clear() {
    check(
        "console.escreva(1)\nconsole.limpa()\nconsole.escreva(2)",
        "2\n",
    );
}

#[test]
fn test_math_rejects_invalid_arguments() {
    for name in ["absoluto", "seno", "cosseno", "tangente", "raiz", "teto", "chao"] {
        check_error(&format!("math.{name}(\"1\")"), "RT012");
        check_error(&format!("math.{name}()"), "RT012");
    }
    check_error("math.potencia(2)", "RT012");
    check_error("math.potencia(nulo, 2)", "RT012");
    check_error("math.aleatorio(\"a\")", "RT012");
    check_error("math.aleatorio(1, 1)", "RT012");
    check_error("math.aleatorio(0, 1 / 0)", "RT012");
}

#[test]
fn test_sleep() {
    check("sleep.aguarde(0)\nconsole.escreva(\"ok\")", "ok\n");
    check_error("sleep.aguarde(-1)", "RT012");
}

#[test]
fn test_sleep_rejects_unrepresentable_durations() {
    check_error("sleep.aguarde(100000000000000000000000000000)", "RT012");
    check_error("sleep.aguarde(1 / 0)", "RT012");
    check_error("sleep.aguarde(0 / 0)", "RT012");
    check_error("sleep.aguarde(\"1\")", "RT012");
    check_error("sleep.aguarde()", "RT012");
}

#[test]
fn test_array_bounds() {
    check_error("declarar a = [1]\na[100000000000000000000] = 2", "RT015");
    check_error("declarar a = [1]\na.seta(100000000000000000000, 2)", "RT015");
    check_error("declarar a = [1]\na[-1] = 2", "RT012");
    check_error("declarar a = [1]\na[1.5] = 2", "RT012");
    check_error("declarar a = [1]\na.seta(\"x\", 2)", "RT012");
    check_error("declarar a = [1]\na.pega(-1)", "RT012");
    check_error("declarar a = [1]\na.remove(nulo)", "RT012");
    check(
        "declarar a = [1]\nconsole.escreva(a[100000000000000000000], a.remove(100000000000000000000), a)",
        "nulo nulo [1]\n",
    );
}

#[test]
fn test_runtime_errors() {
    check_error("console.escreva(x)", "RT001");
    check_error("declarar x = 1\ndeclarar x = 2", "RT002");
    check_error("y = 1", "RT003");
    check_error("1 + verdadeiro", "RT004");
    check_error("se 1 faca fim", "RT005");
    check_error("parar", "RT006");
    check_error("retorna 1", "RT007");
    check_error("declarar x = 1\nx()", "RT008");
    check_error("declarar x = 1\nx.y", "RT009");
}

#[test]
fn test_error_reports_line() {
    let source = "declarar x = 1\n\nx = x + falso";
    let error = check_error(source, "RT004");
    assert_eq!(
        error.kind,
        RuntimeErrorKind::UnsupportedOperator {
            operator: "+",
            lhs: "Number",
            rhs: "Boolean",
        }
    );
    assert_eq!(
        BasicFormatter::new(source).format_error(&error),
        "(3) Unsupported operator + between Number and Boolean"
    );
}

#[test]
fn test_program_value_is_last_statement() -> Result<()> {
    let mut context = BufferedContext::new();
    let value = execute("declarar x = 2\nx * 3", &mut context)?;
    assert_eq!(value.as_number(), Some(6.0));
    Ok(())
}

#[test]
fn test_step_by_statement() -> Result<()> {
    let program = Parser::new("declarar x = 1\nx = x + 1\nconsole.escreva(x)").parse()?;
    let mut interpreter = TreeWalkInterpreter::new(program);
    let mut context = BufferedContext::new();
    let mut values = Vec::new();
    loop {
        match interpreter.step(&mut context)? {
            ProgramState::Run(value) => values.push(value.to_string()),
            ProgramState::Terminate => break,
        }
    }
    assert_eq!(values, vec!["1", "2", "nulo"]);
    assert_eq!(context.into_data(), "2\n");
    Ok(())
}

#[test]
fn test_evaluate_against_custom_environment() -> Result<()> {
    let mut environment = Environment::new();
    environment.define("lado", Value::Number(3.0))?;
    let program = Parser::new("declarar area = lado * lado").parse()?;
    let mut interpreter = TreeWalkInterpreter::new(program).with_environment(environment);
    let mut context = BufferedContext::new();
    interpreter.run(&mut context)?;

    let expression = Parser::new("area + 1").parse_expression_only()?;
    let value = interpreter.evaluate(&expression, &mut context)?;
    assert_eq!(value.as_number(), Some(10.0));
    assert_eq!(
        interpreter
            .get_environment()
            .lookup("area")
            .ok()
            .and_then(|value| value.as_number()),
        Some(9.0)
    );
    // Built-ins are only installed by the default environment.
    assert!(interpreter.get_environment().lookup("math").is_err());
    Ok(())
}
