//! Single-step execution. The evaluator runs on its own thread and parks before and after every
//! node; the session resumes it one pause at a time over rendezvous channels.
mod driver;
mod error;

pub use driver::{CommandSource, DebugCommand, DebugDriver, SharedStdin};
pub use error::DebugError;

use crate::environment::Environment;
use crate::interpreter::{NodeKey, Observed, StepObserver, SystemContext, TreeWalkInterpreter};
use crate::parser::Program;
use crate::string::IdentName;
use crate::value::error::{RuntimeError, RuntimeErrorKind};
use crate::value::Value;
use std::fmt::Display;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

const LOCK_MSG: &str = "Debug state lock should not be poisoned.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Step,
    Quit,
}

#[derive(Debug)]
enum DebugEvent {
    Paused,
    Finished(Result<Value, RuntimeError>),
}

/// What the driver can inspect while the evaluator is parked.
#[derive(Debug, Default)]
pub struct DebugState {
    /// Nodes currently being evaluated, innermost last.
    stack: Vec<(NodeKey, String)>,
    last_evaluation: Option<Value>,
    environment: Option<Environment>,
}

/// Parks the evaluator thread around every node it is shown.
pub struct SteppingObserver {
    state: Arc<Mutex<DebugState>>,
    events: SyncSender<DebugEvent>,
    resume: Receiver<Resume>,
}

impl SteppingObserver {
    fn pause(&mut self) -> Result<(), RuntimeErrorKind> {
        self.events
            .send(DebugEvent::Paused)
            .map_err(|_| RuntimeErrorKind::Halted)?;
        match self.resume.recv() {
            Ok(Resume::Step) => Ok(()),
            Ok(Resume::Quit) | Err(_) => Err(RuntimeErrorKind::Halted),
        }
    }
}

impl StepObserver for SteppingObserver {
    fn enter(
        &mut self,
        node: &dyn Observed,
        environment: &Environment,
    ) -> Result<bool, RuntimeErrorKind> {
        let key = node.node_key();
        {
            let mut state = self.state.lock().expect(LOCK_MSG);
            if state.stack.last().is_some_and(|(top, _)| *top == key) {
                return Ok(false);
            }
            state.stack.push((key, node.to_string()));
            state.last_evaluation = None;
            state.environment = Some(environment.clone());
        }
        tracing::trace!(node = %node, "pause before");
        self.pause()?;
        Ok(true)
    }

    fn leave(&mut self, value: &Value, environment: &Environment) -> Result<(), RuntimeErrorKind> {
        {
            let mut state = self.state.lock().expect(LOCK_MSG);
            state.last_evaluation = Some(value.clone());
            state.environment = Some(environment.clone());
        }
        tracing::trace!(value = %value, "pause after");
        self.pause()?;
        self.state.lock().expect(LOCK_MSG).stack.pop();
        Ok(())
    }
}

/// One step of the program as seen by the driver.
#[derive(Debug, Clone)]
pub enum StepTrace {
    Paused {
        node: String,
        /// `None` while the node is still being evaluated.
        value: Option<Value>,
    },
    Finished(Value),
}

impl Display for StepTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepTrace::Paused {
                node,
                value: Some(value),
            } => write!(f, "{node} -> {value}"),
            StepTrace::Paused { node, value: None } => write!(f, "{node} -> ..."),
            StepTrace::Finished(value) => write!(f, "fim do programa -> {value}"),
        }
    }
}

/// A program running under the debugger.
pub struct DebugSession<C: SystemContext + Send + 'static> {
    state: Arc<Mutex<DebugState>>,
    resume: SyncSender<Resume>,
    events: Receiver<DebugEvent>,
    handle: Option<JoinHandle<C>>,
    finished: bool,
}

impl<C: SystemContext + Send + 'static> DebugSession<C> {
    /// Starts the evaluator thread parked before the first node.
    pub fn new(program: impl Into<Arc<Program>>, context: C) -> Self {
        let program = program.into();
        let state = Arc::new(Mutex::new(DebugState::default()));
        let (resume_sender, resume_receiver) = sync_channel(0);
        let (event_sender, event_receiver) = sync_channel(0);

        let observer = SteppingObserver {
            state: state.clone(),
            events: event_sender.clone(),
            resume: resume_receiver,
        };
        let handle = std::thread::spawn(move || {
            let mut context = context;
            let start = observer.resume.recv();
            let result = match start {
                Ok(Resume::Step) => {
                    let mut interpreter = TreeWalkInterpreter::with_observer(program, observer);
                    interpreter.run(&mut context)
                }
                Ok(Resume::Quit) | Err(_) => Err(RuntimeError::new(
                    RuntimeErrorKind::Halted,
                    program.span,
                )),
            };
            tracing::debug!(ok = result.is_ok(), "debugged program finished");
            let _ = event_sender.send(DebugEvent::Finished(result));
            context
        });

        Self {
            state,
            resume: resume_sender,
            events: event_receiver,
            handle: Some(handle),
            finished: false,
        }
    }

    fn resume(&mut self, command: Resume) -> Result<DebugEvent, DebugError> {
        if self.finished {
            return Err(DebugError::ProgramFinished);
        }
        let event = self
            .resume
            .send(command)
            .ok()
            .and_then(|_| self.events.recv().ok());
        match event {
            Some(DebugEvent::Paused) => Ok(DebugEvent::Paused),
            Some(finished) => {
                self.finished = true;
                Ok(finished)
            }
            None => {
                self.finished = true;
                Err(DebugError::ProgramFinished)
            }
        }
    }

    /// Resumes the program until its next pause.
    pub fn step_forward(&mut self) -> Result<StepTrace, DebugError> {
        match self.resume(Resume::Step)? {
            DebugEvent::Paused => {
                let state = self.state.lock().expect(LOCK_MSG);
                let node = state
                    .stack
                    .last()
                    .map(|(_, node)| node.clone())
                    .unwrap_or_default();
                Ok(StepTrace::Paused {
                    node,
                    value: state.last_evaluation.clone(),
                })
            }
            DebugEvent::Finished(result) => Ok(StepTrace::Finished(result?)),
        }
    }

    pub fn step_backward(&mut self) -> Result<StepTrace, DebugError> {
        Err(DebugError::StepBackwardUnsupported)
    }

    /// Bindings at the current scope level of the environment the program is paused in.
    pub fn locals(&self) -> Vec<(IdentName, Value)> {
        let environment = self.state.lock().expect(LOCK_MSG).environment.clone();
        environment
            .map(|environment| environment.locals_at_current_level())
            .unwrap_or_default()
    }

    pub fn last_evaluation(&self) -> Option<Value> {
        self.state.lock().expect(LOCK_MSG).last_evaluation.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Unwinds the program. Always ends with `ProgramExit`.
    pub fn quit(&mut self) -> Result<(), DebugError> {
        if !self.finished {
            // The program answers with its halted result.
            let _ = self.resume(Resume::Quit);
            self.finished = true;
        }
        Err(DebugError::ProgramExit)
    }

    /// Stops the program if needed and hands back its system context.
    pub fn into_context(mut self) -> Option<C> {
        let _ = self.quit();
        self.handle.take()?.join().ok()
    }
}

impl<C: SystemContext + Send + 'static> Drop for DebugSession<C> {
    fn drop(&mut self) {
        let _ = self.quit();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
