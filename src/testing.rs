//! Testing utilities and mock implementations.
//!
//! These types are provided for use in tests, both this crate's and those of
//! suites built on it.

#![allow(clippy::needless_pass_by_ref_mut)] // &mut self for ergonomics with RefCell

use crate::error::{InvocationError, Result};
use crate::invocation::ExecutionContext;
use crate::traits::{Clock, CommandOutput, CommandRunner, RootCommand};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A mock command runner for testing.
///
/// Records expected commands and their outputs, then verifies they were called.
#[derive(Debug, Default)]
pub struct MockCommandRunner {
    expectations: RefCell<Vec<(String, Vec<String>, CommandOutput)>>,
    call_index: RefCell<usize>,
}

impl MockCommandRunner {
    /// Create a new mock command runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expected command and its output.
    pub fn expect(&mut self, program: &str, args: &[&str], output: CommandOutput) {
        self.expectations.borrow_mut().push((
            program.to_string(),
            args.iter().map(|s| (*s).to_string()).collect(),
            output,
        ));
    }

    /// Verify all expected commands were called.
    ///
    /// # Panics
    ///
    /// Panics if not all expected commands were called.
    pub fn verify(&self) {
        let index = *self.call_index.borrow();
        let expected = self.expectations.borrow().len();
        assert_eq!(
            index, expected,
            "Expected {expected} command calls, but only {index} were made"
        );
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        let mut index = self.call_index.borrow_mut();
        let expectations = self.expectations.borrow();

        assert!(
            *index < expectations.len(),
            "Unexpected command call: {program} {args:?} (no more expectations)"
        );

        let (exp_program, exp_args, output) = &expectations[*index];
        let args_vec: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();

        assert!(
            !(program != exp_program || &args_vec != exp_args),
            "Command mismatch at index {}:\n  Expected: {} {:?}\n  Got: {} {:?}",
            *index,
            exp_program,
            exp_args,
            program,
            args
        );

        *index += 1;
        Ok(output.clone())
    }
}

/// A command runner that always fails, for testing error paths.
#[derive(Debug, Default)]
pub struct FailingCommandRunner {
    error_message: String,
}

impl FailingCommandRunner {
    /// Create a new failing command runner with the specified error message.
    #[must_use]
    pub fn new(error_message: impl Into<String>) -> Self {
        Self { error_message: error_message.into() }
    }
}

impl CommandRunner for FailingCommandRunner {
    fn run(
        &self,
        _program: &str,
        _args: &[&str],
        _timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        Err(std::io::Error::other(self.error_message.clone()).into())
    }
}

/// A clock that only moves when slept on or advanced.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self { start: Instant::now(), offset: Cell::new(Duration::ZERO), sleeps: RefCell::default() }
    }
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Total time that has passed on this clock.
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    /// Every sleep requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.offset.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}

/// What a scripted invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the text and succeed.
    Succeed(String),
    /// Print nothing and fail with the message.
    Fail(String),
}

type Responder = Box<dyn Fn(&ExecutionContext, &str) -> Outcome>;

#[derive(Default)]
struct Script {
    queued: VecDeque<Outcome>,
    responder: Option<Responder>,
    calls: Vec<ExecutionContext>,
    stdin_seen: Vec<String>,
    instances: usize,
}

/// A stand-in CLI whose invocations follow a script.
///
/// Each invocation consumes the next queued [`Outcome`]; once the queue is
/// empty the responder (if any) decides, otherwise the call succeeds silently.
/// Every instance built by [`Self::factory`] shares the same script, so the
/// test can inspect the calls afterwards.
#[derive(Clone, Default)]
pub struct ScriptedCli {
    script: Rc<RefCell<Script>>,
}

impl std::fmt::Debug for ScriptedCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let script = self.script.borrow();
        f.debug_struct("ScriptedCli")
            .field("queued", &script.queued)
            .field("calls", &script.calls.len())
            .field("instances", &script.instances)
            .finish_non_exhaustive()
    }
}

impl ScriptedCli {
    /// Create a CLI with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next unscripted invocation.
    pub fn push(&self, outcome: Outcome) {
        self.script.borrow_mut().queued.push_back(outcome);
    }

    /// Decide outcomes from the command line and stdin once the queue runs out.
    pub fn respond_with(&self, responder: impl Fn(&ExecutionContext, &str) -> Outcome + 'static) {
        self.script.borrow_mut().responder = Some(Box::new(responder));
    }

    /// A constructor producing fresh root commands bound to this script.
    pub fn factory(&self) -> impl Fn() -> Box<dyn RootCommand> + 'static {
        let script = Rc::clone(&self.script);
        move || -> Box<dyn RootCommand> {
            script.borrow_mut().instances += 1;
            Box::new(ScriptedCommand { script: Rc::clone(&script), output: None, input: None })
        }
    }

    /// Contexts of every invocation, oldest first.
    pub fn calls(&self) -> Vec<ExecutionContext> {
        self.script.borrow().calls.clone()
    }

    /// Stdin read by each invocation.
    pub fn stdin_seen(&self) -> Vec<String> {
        self.script.borrow().stdin_seen.clone()
    }

    /// How many root commands the factory has built.
    pub fn instances(&self) -> usize {
        self.script.borrow().instances
    }
}

struct ScriptedCommand {
    script: Rc<RefCell<Script>>,
    output: Option<Box<dyn Write>>,
    input: Option<Box<dyn Read>>,
}

impl RootCommand for ScriptedCommand {
    fn set_output(&mut self, output: Box<dyn Write>) {
        self.output = Some(output);
    }

    fn set_input(&mut self, input: Box<dyn Read>) {
        self.input = Some(input);
    }

    fn execute(&mut self, ctx: &ExecutionContext) -> std::result::Result<(), InvocationError> {
        let mut stdin = String::new();
        if let Some(input) = self.input.as_mut() {
            input.read_to_string(&mut stdin).map_err(|e| InvocationError::new(e.to_string()))?;
        }

        let outcome = {
            let mut script = self.script.borrow_mut();
            script.calls.push(ctx.clone());
            script.stdin_seen.push(stdin.clone());
            match script.queued.pop_front() {
                Some(outcome) => outcome,
                None => script
                    .responder
                    .as_ref()
                    .map_or_else(|| Outcome::Succeed(String::new()), |r| r(ctx, &stdin)),
            }
        };

        match outcome {
            Outcome::Succeed(text) => {
                if let Some(output) = self.output.as_mut() {
                    output
                        .write_all(text.as_bytes())
                        .map_err(|e| InvocationError::new(e.to_string()))?;
                }
                Ok(())
            }
            Outcome::Fail(message) => Err(InvocationError::new(message)),
        }
    }
}
