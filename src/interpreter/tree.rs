use super::observer::{Observed, StepObserver, Unobserved};
use super::{Interpreter, ProgramState, SystemContext};
use crate::environment::Environment;
use crate::lexer::Span;
use crate::parser::expression::{
    AdditiveOperator, Atom, ComparisonOperator, DictionaryEntry, DictionaryKey, Expression,
    ExpressionKind, LogicalOperator, MultiplicativeOperator,
};
use crate::parser::statement::{
    Assignment, AssignmentTarget, ConditionalBranch, FunctionDecl, Statement,
};
use crate::parser::Program;
use crate::string::Ident;
use crate::value::error::{RuntimeError, RuntimeErrorKind};
use crate::value::{as_key, DictionaryObject, Object, UserFunction, Value, ValueIterator};
use compact_str::ToCompactString;
use std::sync::Arc;

fn at(span: Span) -> impl Fn(RuntimeErrorKind) -> RuntimeError {
    move |kind| RuntimeError::new(kind, span)
}

/// Runs a parsed program top to bottom against one root environment.
pub struct TreeWalkInterpreter<O: StepObserver = Unobserved> {
    program: Arc<Program>,
    environment: Environment,
    cursor: usize,
    interpreter: TreeWalkStatementInterpreter<O>,
}

impl TreeWalkInterpreter {
    pub fn new(program: impl Into<Arc<Program>>) -> Self {
        Self::with_observer(program, Unobserved)
    }
}

impl<O: StepObserver> TreeWalkInterpreter<O> {
    pub fn with_observer(program: impl Into<Arc<Program>>, observer: O) -> Self {
        Self {
            program: program.into(),
            environment: Environment::with_builtins(),
            cursor: 0,
            interpreter: TreeWalkStatementInterpreter::create(observer),
        }
    }

    /// Replaces the root environment, e.g. to run against pre-defined names.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn get_environment(&self) -> &Environment {
        &self.environment
    }

    /// Runs every remaining statement. The result is the value of the last one.
    pub fn run<C: SystemContext>(&mut self, context: &mut C) -> Result<Value, RuntimeError> {
        let program = self.program.clone();
        let remaining = program.statements.get(self.cursor..).unwrap_or_default();
        self.cursor = program.statements.len();
        tracing::debug!(statements = remaining.len(), "run program");
        self.interpreter.capture(
            &*program,
            &mut self.environment,
            context,
            |interpreter, environment, context| {
                let mut value = Value::Null;
                for statement in remaining {
                    value = interpreter.execute(statement, environment, context)?;
                }
                Ok(value)
            },
        )
    }

    /// Evaluates a standalone expression in the root environment.
    pub fn evaluate<C: SystemContext>(
        &mut self,
        expression: &Expression,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        self.interpreter
            .evaluate(expression, &mut self.environment, context)
    }
}

impl<C: SystemContext, O: StepObserver> Interpreter<C> for TreeWalkInterpreter<O> {
    fn step(&mut self, context: &mut C) -> Result<ProgramState, RuntimeError> {
        let program = self.program.clone();
        let Some(statement) = program.get_statement(self.cursor) else {
            return Ok(ProgramState::Terminate);
        };
        self.cursor += 1;
        let value = self
            .interpreter
            .execute(statement, &mut self.environment, context)?;
        Ok(ProgramState::Run(value))
    }
}

/// The recursive walker. Stateless apart from its observer: all program state lives in the
/// environment chain it is handed.
pub struct TreeWalkStatementInterpreter<O: StepObserver> {
    observer: O,
}

impl<O: StepObserver> TreeWalkStatementInterpreter<O> {
    fn create(observer: O) -> Self {
        Self { observer }
    }

    /// Reports `node` to the observer around `evaluate`.
    fn capture<N, C, F>(
        &mut self,
        node: &N,
        environment: &mut Environment,
        context: &mut C,
        evaluate: F,
    ) -> Result<Value, RuntimeError>
    where
        N: Observed,
        C: SystemContext,
        F: FnOnce(&mut Self, &mut Environment, &mut C) -> Result<Value, RuntimeError>,
    {
        let span = node.span();
        let entered = self
            .observer
            .enter(node, environment)
            .map_err(at(span))?;
        let value = evaluate(self, environment, context)?;
        if entered {
            self.observer
                .leave(&value, environment)
                .map_err(at(span))?;
        }
        Ok(value)
    }

    pub fn execute<C: SystemContext>(
        &mut self,
        statement: &Statement,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        self.capture(statement, environment, context, |this, environment, context| {
            this.execute_statement(statement, environment, context)
        })
    }

    pub fn evaluate<C: SystemContext>(
        &mut self,
        expression: &Expression,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        self.capture(expression, environment, context, |this, environment, context| {
            this.evaluate_logical(expression, environment, context)
        })
    }
}

// Statement interpreter
impl<O: StepObserver> TreeWalkStatementInterpreter<O> {
    fn execute_statement<C: SystemContext>(
        &mut self,
        statement: &Statement,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        match statement {
            Statement::Declaration { name, value, .. } => {
                self.execute_declaration(name, value, environment, context)
            }
            Statement::Assignment(assignment) => {
                self.execute_assignment(assignment, environment, context)
            }
            Statement::Expression(expression) => self.evaluate(expression, environment, context),
            Statement::Block { body, .. } => {
                self.execute_block(body, environment, context)?;
                Ok(Value::Null)
            }
            Statement::While {
                condition, body, ..
            } => self.execute_while(condition, body, environment, context),
            Statement::NumericFor {
                variable,
                from,
                until,
                step,
                body,
                ..
            } => self.execute_numeric_for(
                variable,
                from.as_ref(),
                until.as_ref(),
                step.as_ref(),
                body,
                environment,
                context,
            ),
            Statement::IterativeFor {
                key,
                value,
                iterable,
                body,
                ..
            } => self.execute_iterative_for(key, value, iterable, body, environment, context),
            Statement::Function(declaration) => {
                self.execute_function_declaration(declaration, environment)
            }
            Statement::If {
                branches,
                otherwise,
                ..
            } => self.execute_if(branches, otherwise.as_deref(), environment, context),
            Statement::Break(span) => {
                environment.mark_break().map_err(at(*span))?;
                Ok(Value::Null)
            }
            Statement::Continue(span) => {
                environment.mark_continue().map_err(at(*span))?;
                Ok(Value::Null)
            }
            Statement::Return { values, span } => {
                self.execute_return(values, *span, environment, context)
            }
        }
    }

    /// Whether a pending signal should stop the statements of the current body.
    fn interrupted(environment: &Environment) -> bool {
        environment.has_returned()
            || environment
                .peek_loop()
                .is_ok_and(|frame| frame.broken || frame.continued)
    }

    /// Runs statements in the current scope, stopping early on `retorna`, `parar` or `continuar`.
    fn execute_body<C: SystemContext>(
        &mut self,
        body: &[Statement],
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<(), RuntimeError> {
        for statement in body {
            self.execute(statement, environment, context)?;
            if Self::interrupted(environment) {
                break;
            }
        }
        Ok(())
    }

    fn execute_block<C: SystemContext>(
        &mut self,
        body: &[Statement],
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<(), RuntimeError> {
        environment.enter_scope();
        let outcome = self.execute_body(body, environment, context);
        environment.leave_scope();
        outcome
    }

    /// One loop iteration: a fresh scope and loop frame around the body.
    /// Returns whether the loop should go on.
    fn execute_iteration<C: SystemContext>(
        &mut self,
        body: &[Statement],
        step: Option<&Assignment>,
        span: Span,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<bool, RuntimeError> {
        environment.enter_scope();
        environment.push_loop();
        let mut outcome = self.execute_body(body, environment, context);
        if let Some(step) = step {
            if outcome.is_ok() && !environment.has_returned() {
                outcome = self
                    .execute_assignment(step, environment, context)
                    .map(|_| ());
            }
        }
        let frame = environment.pop_loop();
        environment.leave_scope();
        outcome?;
        let frame = frame.map_err(at(span))?;
        Ok(!frame.broken && !environment.has_returned())
    }

    fn execute_declaration<C: SystemContext>(
        &mut self,
        name: &Ident,
        value: &Expression,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        let value = self.evaluate(value, environment, context)?;
        environment
            .define(&name.name, value.clone())
            .map_err(at(name.span))?;
        Ok(value)
    }

    fn execute_assignment<C: SystemContext>(
        &mut self,
        assignment: &Assignment,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        match &assignment.target {
            AssignmentTarget::Identifier(name) => {
                let value = self.evaluate(&assignment.value, environment, context)?;
                environment
                    .assign(&name.name, value.clone())
                    .map_err(at(name.span))?;
                Ok(value)
            }
            AssignmentTarget::Property { object, key } => {
                let target = self.evaluate(object, environment, context)?;
                let key = self.evaluate(key, environment, context)?;
                let value = self.evaluate(&assignment.value, environment, context)?;
                target
                    .set(&key, value.clone())
                    .map_err(at(assignment.span))?;
                Ok(value)
            }
        }
    }

    fn execute_while<C: SystemContext>(
        &mut self,
        condition: &Expression,
        body: &[Statement],
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        loop {
            let proceed = self
                .evaluate(condition, environment, context)?
                .as_boolean()
                .map_err(at(condition.span))?;
            if !proceed
                || !self.execute_iteration(body, None, condition.span, environment, context)?
            {
                break;
            }
        }
        Ok(Value::Null)
    }

    /// Whether the loop variable is still short of `until`.
    fn below_limit(current: &Value, limit: &Value) -> Result<bool, RuntimeErrorKind> {
        match limit {
            Value::Number(_) => current.less_than(limit),
            Value::Boolean(done) => Ok(!done),
            _ => Ok(false),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_numeric_for<C: SystemContext>(
        &mut self,
        variable: &Ident,
        from: Option<&Expression>,
        until: Option<&Expression>,
        step: Option<&Assignment>,
        body: &[Statement],
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        environment.enter_scope();
        let outcome =
            self.run_numeric_for(variable, from, until, step, body, environment, context);
        environment.leave_scope();
        outcome?;
        Ok(Value::Null)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_numeric_for<C: SystemContext>(
        &mut self,
        variable: &Ident,
        from: Option<&Expression>,
        until: Option<&Expression>,
        step: Option<&Assignment>,
        body: &[Statement],
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<(), RuntimeError> {
        let name = &variable.name;
        if environment.get(name).is_none() {
            environment
                .define(name, Value::Number(0.0))
                .map_err(at(variable.span))?;
        }
        if let Some(from) = from {
            let start = self.evaluate(from, environment, context)?;
            environment.assign(name, start).map_err(at(variable.span))?;
        }

        loop {
            if let Some(until) = until {
                let limit = self.evaluate(until, environment, context)?;
                let current = environment.lookup(name).map_err(at(variable.span))?;
                if !Self::below_limit(&current, &limit).map_err(at(until.span))? {
                    break;
                }
            }
            if !self.execute_iteration(body, step, variable.span, environment, context)? {
                break;
            }
        }
        Ok(())
    }

    fn execute_iterative_for<C: SystemContext>(
        &mut self,
        key: &Ident,
        value: &Ident,
        iterable: &Expression,
        body: &[Statement],
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        let collection = self.evaluate(iterable, environment, context)?;
        let mut iterator = collection
            .start_iteration()
            .map_err(at(iterable.span))?;

        environment.enter_scope();
        let outcome = self.run_iterative_for(
            key,
            value,
            &mut iterator,
            body,
            iterable.span,
            environment,
            context,
        );
        environment.leave_scope();
        outcome?;
        Ok(Value::Null)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_iterative_for<C: SystemContext>(
        &mut self,
        key: &Ident,
        value: &Ident,
        iterator: &mut ValueIterator,
        body: &[Statement],
        span: Span,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<(), RuntimeError> {
        environment
            .define(&key.name, Value::Null)
            .map_err(at(key.span))?;
        environment
            .define(&value.name, Value::Null)
            .map_err(at(value.span))?;
        loop {
            let entry = iterator.next_entry();
            if entry.done {
                break;
            }
            environment
                .assign(&key.name, entry.index.unwrap_or_default())
                .map_err(at(key.span))?;
            environment
                .assign(&value.name, entry.value.unwrap_or_default())
                .map_err(at(value.span))?;
            if !self.execute_iteration(body, None, span, environment, context)? {
                break;
            }
        }
        Ok(())
    }

    fn execute_function_declaration(
        &mut self,
        declaration: &Arc<FunctionDecl>,
        environment: &mut Environment,
    ) -> Result<Value, RuntimeError> {
        let function = Value::function(declaration.clone(), environment.clone());
        if let Some(name) = &declaration.name {
            environment
                .define(&name.name, function.clone())
                .map_err(at(name.span))?;
        }
        Ok(function)
    }

    fn execute_if<C: SystemContext>(
        &mut self,
        branches: &[ConditionalBranch],
        otherwise: Option<&[Statement]>,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        for branch in branches {
            let taken = self
                .evaluate(&branch.condition, environment, context)?
                .as_boolean()
                .map_err(at(branch.condition.span))?;
            if taken {
                self.execute_block(&branch.body, environment, context)?;
                return Ok(Value::Null);
            }
        }
        if let Some(body) = otherwise {
            self.execute_block(body, environment, context)?;
        }
        Ok(Value::Null)
    }

    fn execute_return<C: SystemContext>(
        &mut self,
        values: &[Expression],
        span: Span,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        let mut returns = Vec::with_capacity(values.len().max(1));
        for value in values {
            returns.push(self.evaluate(value, environment, context)?);
        }
        // A bare `retorna` still has to stop the function.
        if returns.is_empty() {
            returns.push(Value::Null);
        }
        environment.push_returns(returns).map_err(at(span))?;
        Ok(Value::Null)
    }
}

// Expression evaluator
impl<O: StepObserver> TreeWalkStatementInterpreter<O> {
    fn evaluate_logical<C: SystemContext>(
        &mut self,
        expression: &Expression,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        self.capture(expression, environment, context, |this, environment, context| {
            let ExpressionKind::Logical { operator, lhs, rhs } = &expression.kind else {
                return this.evaluate_comparison(expression, environment, context);
            };
            let lhs = this
                .evaluate(lhs, environment, context)?
                .as_boolean()
                .map_err(at(lhs.span))?;
            let rhs = this
                .evaluate(rhs, environment, context)?
                .as_boolean()
                .map_err(at(rhs.span))?;
            let result = match operator {
                LogicalOperator::And => lhs && rhs,
                LogicalOperator::Or => lhs || rhs,
            };
            Ok(Value::Boolean(result))
        })
    }

    fn evaluate_comparison<C: SystemContext>(
        &mut self,
        expression: &Expression,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        self.capture(expression, environment, context, |this, environment, context| {
            let ExpressionKind::Comparison { operator, lhs, rhs } = &expression.kind else {
                return this.evaluate_additive(expression, environment, context);
            };
            let lhs = this.evaluate(lhs, environment, context)?;
            let rhs = this.evaluate(rhs, environment, context)?;
            let result = match operator {
                ComparisonOperator::Equal => Ok(lhs.is_equal(&rhs)),
                ComparisonOperator::NotEqual => Ok(lhs.is_not_equal(&rhs)),
                ComparisonOperator::GreaterThan => lhs.greater_than(&rhs),
                ComparisonOperator::GreaterThanEqual => lhs.greater_than_or_equal(&rhs),
                ComparisonOperator::LessThan => lhs.less_than(&rhs),
                ComparisonOperator::LessThanEqual => lhs.less_than_or_equal(&rhs),
            }
            .map_err(at(expression.span))?;
            Ok(Value::Boolean(result))
        })
    }

    fn evaluate_additive<C: SystemContext>(
        &mut self,
        expression: &Expression,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        self.capture(expression, environment, context, |this, environment, context| {
            let ExpressionKind::Additive { operator, lhs, rhs } = &expression.kind else {
                return this.evaluate_multiplicative(expression, environment, context);
            };
            let lhs = this.evaluate(lhs, environment, context)?;
            let rhs = this.evaluate(rhs, environment, context)?;
            match operator {
                AdditiveOperator::Add => lhs.add(&rhs),
                AdditiveOperator::Subtract => lhs.subtract(&rhs),
            }
            .map_err(at(expression.span))
        })
    }

    fn evaluate_multiplicative<C: SystemContext>(
        &mut self,
        expression: &Expression,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        self.capture(expression, environment, context, |this, environment, context| {
            let ExpressionKind::Multiplicative { operator, lhs, rhs } = &expression.kind else {
                return this.evaluate_factor(expression, environment, context);
            };
            let lhs = this.evaluate(lhs, environment, context)?;
            let rhs = this.evaluate(rhs, environment, context)?;
            match operator {
                MultiplicativeOperator::Multiply => lhs.multiply(&rhs),
                MultiplicativeOperator::Divide => lhs.divide(&rhs),
                MultiplicativeOperator::Modulo => lhs.modulo(&rhs),
            }
            .map_err(at(expression.span))
        })
    }

    fn evaluate_factor<C: SystemContext>(
        &mut self,
        expression: &Expression,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        self.capture(expression, environment, context, |this, environment, context| {
            let span = expression.span;
            match &expression.kind {
                ExpressionKind::Atom(atom) => Self::evaluate_atom(atom, span, environment),
                ExpressionKind::Not(operand) => this
                    .evaluate(operand, environment, context)?
                    .not()
                    .map_err(at(span)),
                ExpressionKind::Array(items) => {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        values.push(this.evaluate(item, environment, context)?);
                    }
                    Ok(Value::array(values))
                }
                ExpressionKind::Dictionary(entries) => {
                    this.evaluate_dictionary(entries, environment, context)
                }
                ExpressionKind::Function(declaration) => {
                    Ok(Value::function(declaration.clone(), environment.clone()))
                }
                ExpressionKind::Call { callee, arguments } => {
                    this.evaluate_call(callee, arguments, span, environment, context)
                }
                ExpressionKind::Property { object, key } => {
                    let object = this.evaluate(object, environment, context)?;
                    let key = this.evaluate(key, environment, context)?;
                    object.get(&key).map_err(at(span))
                }
                ExpressionKind::Logical { .. }
                | ExpressionKind::Comparison { .. }
                | ExpressionKind::Additive { .. }
                | ExpressionKind::Multiplicative { .. } => Err(RuntimeError::new(
                    RuntimeErrorKind::UnreachableNode(expression.to_compact_string()),
                    span,
                )),
            }
        })
    }

    fn evaluate_atom(
        atom: &Atom,
        span: Span,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        let value = match atom {
            Atom::Null => Value::Null,
            Atom::Number(v) => Value::Number(*v),
            Atom::Bool(v) => Value::Boolean(*v),
            Atom::String(v) => Value::string(v.clone()),
            Atom::Identifier(name) => environment.lookup(&name.name).map_err(at(span))?,
        };
        Ok(value)
    }

    fn evaluate_dictionary<C: SystemContext>(
        &mut self,
        entries: &[DictionaryEntry],
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        let dictionary = DictionaryObject::new();
        for entry in entries {
            let key = match &entry.key {
                DictionaryKey::Name(name) => name.name.clone(),
                DictionaryKey::Expression(key) => as_key(&self.evaluate(key, environment, context)?),
            };
            let value = self.evaluate(&entry.value, environment, context)?;
            dictionary.set_entry(key, value);
        }
        Ok(Value::Object(Object::Dictionary(Arc::new(dictionary))))
    }

    fn evaluate_call<C: SystemContext>(
        &mut self,
        callee: &Expression,
        arguments: &[Expression],
        span: Span,
        environment: &mut Environment,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(callee, environment, context)?;
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.evaluate(argument, environment, context)?);
        }

        match callee {
            Value::Object(Object::Function(function)) => {
                self.call_function(&function, values, span, context)
            }
            Value::Object(Object::NativeFunction(function)) => {
                tracing::trace!(name = function.get_name(), "native call");
                function.call(&values, context).map_err(at(span))
            }
            other => Err(RuntimeError::new(
                RuntimeErrorKind::NotCallable(other.type_name()),
                span,
            )),
        }
    }

    /// Runs a closure in a fresh child of its defining environment.
    fn call_function<C: SystemContext>(
        &mut self,
        function: &UserFunction,
        arguments: Vec<Value>,
        span: Span,
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        tracing::trace!(name = function.get_name(), "call");
        let declaration = &function.declaration;
        let mut local = function.closure.child();
        local.push_function();

        // Missing arguments leave their parameters unbound; extra ones are dropped.
        let mut outcome = Ok(());
        for (parameter, argument) in declaration.parameters.iter().zip(arguments) {
            if let Err(kind) = local.define(&parameter.name, argument) {
                outcome = Err(RuntimeError::new(kind, parameter.span));
                break;
            }
        }
        if outcome.is_ok() {
            outcome = self.execute_body(&declaration.body, &mut local, context);
        }

        let frame = local.pop_function();
        outcome?;
        let frame = frame.map_err(at(span))?;
        Ok(frame.returns.into_iter().next().unwrap_or_default())
    }
}
