use color_eyre::eyre::Result;
use pardal::{
    debugger::{DebugDriver, DebugError, DebugSession, StepTrace},
    interpreter::{BufferedContext, TreeWalkInterpreter},
    parser::Parser,
    value::Value,
};
use std::io::{BufRead, Cursor};

fn session(source: &str) -> DebugSession<BufferedContext> {
    let program = Parser::new(source)
        .parse()
        .unwrap_or_else(|error| panic!("Failed to parse {source:?}: {error}"));
    DebugSession::new(program, BufferedContext::new())
}

/// Steps until the program ends, returning every trace line and the final value.
fn step_to_end(session: &mut DebugSession<BufferedContext>) -> Result<(Vec<String>, Value)> {
    let mut traces = Vec::new();
    loop {
        let trace = session.step_forward()?;
        traces.push(trace.to_string());
        if let StepTrace::Finished(value) = trace {
            return Ok((traces, value));
        }
    }
}

#[test]
fn test_trace_display() {
    let paused = StepTrace::Paused {
        node: "(1 + 2)".into(),
        value: None,
    };
    assert_eq!(paused.to_string(), "(1 + 2) -> ...");
    let evaluated = StepTrace::Paused {
        node: "(1 + 2)".into(),
        value: Some(Value::Number(3.0)),
    };
    assert_eq!(evaluated.to_string(), "(1 + 2) -> 3");
    assert_eq!(
        StepTrace::Finished(Value::Null).to_string(),
        "fim do programa -> nulo"
    );
}

#[test]
fn test_stepping_matches_plain_run() -> Result<()> {
    let source = "declarar x = 2\nfuncao dobro(n)\n  retorna n * 2\nfim\ndobro(x) + 1";

    let mut context = BufferedContext::new();
    let expected = TreeWalkInterpreter::new(Parser::new(source).parse()?).run(&mut context)?;

    let mut session = session(source);
    let (traces, value) = step_to_end(&mut session)?;
    assert_eq!(value.as_number(), expected.as_number());
    assert_eq!(value.as_number(), Some(5.0));
    assert_eq!(
        session.last_evaluation().and_then(|value| value.as_number()),
        Some(5.0)
    );
    assert!(session.is_finished());
    assert!(traces.contains(&"declarar x = 2 -> 2".to_string()));
    assert_eq!(traces.last().map(String::as_str), Some("fim do programa -> 5"));
    Ok(())
}

#[test]
fn test_nodes_pause_before_and_after() -> Result<()> {
    let mut session = session("1 + 2");
    let (traces, _) = step_to_end(&mut session)?;
    let pending = traces.iter().filter(|trace| trace.ends_with("-> ...")).count();
    let evaluated = traces.len() - pending - 1;
    assert!(pending > 0);
    assert_eq!(pending, evaluated, "Unbalanced traces: {traces:?}");
    assert!(traces.contains(&"(1 + 2) -> 3".to_string()));
    Ok(())
}

#[test]
fn test_locals_follow_the_program() -> Result<()> {
    let mut session = session("declarar x = 2\ndeclarar y = x + 1\ny");
    assert!(session.locals().is_empty());

    let mut saw_x_alone = false;
    loop {
        match session.step_forward()? {
            StepTrace::Finished(_) => break,
            StepTrace::Paused { .. } => {
                let names: Vec<String> = session
                    .locals()
                    .into_iter()
                    .map(|(name, _)| name.to_string())
                    .collect();
                saw_x_alone |= names == ["x"];
            }
        }
    }
    assert!(saw_x_alone);

    let locals: Vec<(String, String)> = session
        .locals()
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    assert_eq!(
        locals,
        vec![
            ("x".to_string(), "2".to_string()),
            ("y".to_string(), "3".to_string())
        ]
    );
    Ok(())
}

#[test]
fn test_step_backward_is_unsupported() -> Result<()> {
    let mut session = session("1");
    session.step_forward()?;
    let error = session
        .step_backward()
        .expect_err("Only forward stepping is possible");
    assert_eq!(error, DebugError::StepBackwardUnsupported);
    assert_eq!(error.code(), "DB003");
    // The program can still carry on.
    let (_, value) = step_to_end(&mut session)?;
    assert_eq!(value.as_number(), Some(1.0));
    Ok(())
}

#[test]
fn test_stepping_after_finish() -> Result<()> {
    let mut session = session("nulo");
    step_to_end(&mut session)?;
    let error = session.step_forward().expect_err("Nothing left to run");
    assert_eq!(error, DebugError::ProgramFinished);
    Ok(())
}

#[test]
fn test_quit_stops_the_program() -> Result<()> {
    let mut session = session("console.escreva(1)\nconsole.escreva(2)");
    // The first `escreva` call is the first node to produce `nulo`.
    while !session.last_evaluation().is_some_and(|value| value.is_null()) {
        session.step_forward()?;
    }
    assert_eq!(session.quit(), Err(DebugError::ProgramExit));
    assert_eq!(session.quit(), Err(DebugError::ProgramExit));
    assert!(session.is_finished());
    assert_eq!(
        session.step_forward().expect_err("Program was stopped").code(),
        "DB001"
    );

    let context = session.into_context().expect("Evaluator thread returns");
    assert_eq!(context.into_data(), "1\n");
    Ok(())
}

#[test]
fn test_quit_before_start() {
    let mut session = session("console.escreva(1)");
    assert_eq!(session.quit(), Err(DebugError::ProgramExit));
    let context = session.into_context().expect("Evaluator thread returns");
    assert_eq!(context.into_data(), "");
}

#[test]
fn test_runtime_error_surfaces() {
    let mut session = session("declarar x = 1\nx + verdadeiro");
    let error = loop {
        match session.step_forward() {
            Ok(StepTrace::Paused { .. }) => continue,
            Ok(StepTrace::Finished(value)) => panic!("Expected an error but got {value}"),
            Err(error) => break error,
        }
    };
    assert!(matches!(error, DebugError::Runtime(_)));
    assert_eq!(error.code(), "RT004");
    assert!(session.is_finished());
}

#[test]
fn test_driver_session() {
    let mut session = session("declarar x = 4");
    let input = Cursor::new("ajuda\ns\ns\nb\nq\n");
    let mut driver = DebugDriver::new(input, Vec::new());
    let result = driver.run(&mut session);
    assert!(matches!(result, Err(DebugError::ProgramExit)));

    let output = String::from_utf8(driver.into_output()).expect("Output is UTF-8");
    let help_lines = output
        .lines()
        .filter(|line| line.contains("commands: s/step"))
        .count();
    assert_eq!(help_lines, 2);
    assert!(output.contains("programa -> ...\n"));
    assert!(output.contains("declarar x = 4 -> ..."));
    assert!(output.contains("[DB003] Stepping backwards is not supported"));
}

#[test]
fn test_driver_runs_to_completion() {
    let mut session = session("declarar x = 4\nx");
    let commands = "s\n".repeat(64) + "l\n";
    let mut driver = DebugDriver::new(Cursor::new(commands), Vec::new());
    let value = driver.run(&mut session).expect("Program finishes");
    assert_eq!(value.as_number(), Some(4.0));

    let output = String::from_utf8(driver.into_output()).expect("Output is UTF-8");
    assert!(output.contains("fim do programa -> 4"));
}

#[test]
fn test_driver_end_of_input_quits() {
    let mut session = session("declarar x = 4");
    let mut driver = DebugDriver::new(Cursor::new("s\nl\n"), Vec::new());
    assert!(matches!(
        driver.run(&mut session),
        Err(DebugError::ProgramExit)
    ));
    assert!(session.is_finished());
}

#[test]
fn test_driver_reports_empty_locals() {
    let mut session = session("declarar x = 4");
    let mut driver = DebugDriver::new(Cursor::new("l\nq\n"), Vec::new());
    assert!(matches!(
        driver.run(&mut session),
        Err(DebugError::ProgramExit)
    ));
    let output = String::from_utf8(driver.into_output()).expect("Output is UTF-8");
    assert!(output.contains("No locals defined.\n"));
}

#[test]
fn test_driver_reads_one_line_per_command() {
    let mut session = session("declarar x = 4");
    let mut input = Cursor::new("q\nleft for the program\n");
    let mut driver = DebugDriver::new(&mut input, Vec::new());
    assert!(matches!(
        driver.run(&mut session),
        Err(DebugError::ProgramExit)
    ));
    drop(driver);

    let mut rest = String::new();
    input.read_line(&mut rest).expect("Input is in memory");
    assert_eq!(rest, "left for the program\n");
}
