// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table-driven fakes for the adapter seams.
//!
//! [`FakeRunner`] matches scripted rules against `(program, args)` and
//! records every call, so engine tests can assert on exactly which external
//! commands would have run.

use crate::notify::{Notifier, NotifyError};
use crate::probe::PortProbe;
use crate::runner::{CmdOutput, CmdSpec, CommandRunner, RunnerError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// One recorded invocation of the fake runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub stdin: Option<String>,
}

impl RecordedCall {
    /// `"program arg1 arg2"` rendering for compact assertions.
    pub fn line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Scripted response for a matched command.
#[derive(Debug, Clone)]
pub enum ScriptedResult {
    Ok(CmdOutput),
    Timeout,
    SpawnFailure(String),
}

struct Rule {
    program: String,
    /// Tokens that must appear in the args, in order (subsequence match)
    tokens: Vec<String>,
    result: ScriptedResult,
    /// Consume the rule after one match
    once: bool,
}

struct FakeRunnerState {
    rules: Vec<Rule>,
    calls: Vec<RecordedCall>,
    default: ScriptedResult,
}

/// Recording fake for [`CommandRunner`].
///
/// Rules are matched newest-first; unmatched commands get the default
/// response (success, empty output), so tests only script what they
/// assert on.
#[derive(Clone)]
pub struct FakeRunner {
    inner: Arc<Mutex<FakeRunnerState>>,
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeRunnerState {
                rules: Vec::new(),
                calls: Vec::new(),
                default: ScriptedResult::Ok(CmdOutput::ok("")),
            })),
        }
    }
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for commands of `program` whose args contain the
    /// given tokens in order.
    pub fn on(&self, program: &str, tokens: &[&str], result: ScriptedResult) -> &Self {
        self.inner.lock().rules.push(Rule {
            program: program.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            result,
            once: false,
        });
        self
    }

    /// Like [`Self::on`], but the rule is consumed by its first match.
    pub fn on_once(&self, program: &str, tokens: &[&str], result: ScriptedResult) -> &Self {
        self.inner.lock().rules.push(Rule {
            program: program.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            result,
            once: true,
        });
        self
    }

    /// Replace the default response for unmatched commands.
    pub fn set_default(&self, result: ScriptedResult) {
        self.inner.lock().default = result;
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().calls.clone()
    }

    /// Calls for a single program.
    pub fn calls_for(&self, program: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    /// Whether any recorded call line contains the given fragment.
    pub fn saw(&self, fragment: &str) -> bool {
        self.inner
            .lock()
            .calls
            .iter()
            .any(|c| c.line().contains(fragment))
    }

    fn matches(rule: &Rule, spec: &CmdSpec) -> bool {
        if rule.program != spec.program {
            return false;
        }
        let mut remaining = spec.args.iter();
        rule.tokens
            .iter()
            .all(|token| remaining.any(|arg| arg == token))
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: CmdSpec) -> Result<CmdOutput, RunnerError> {
        let result = {
            let mut state = self.inner.lock();
            state.calls.push(RecordedCall {
                program: spec.program.clone(),
                args: spec.args.clone(),
                cwd: spec.cwd.clone(),
                stdin: spec.stdin.clone(),
            });

            let matched = state
                .rules
                .iter()
                .rposition(|rule| Self::matches(rule, &spec));
            match matched {
                Some(idx) => {
                    let result = state.rules[idx].result.clone();
                    if state.rules[idx].once {
                        state.rules.remove(idx);
                    }
                    result
                }
                None => state.default.clone(),
            }
        };

        match result {
            ScriptedResult::Ok(output) => Ok(output),
            ScriptedResult::Timeout => Err(RunnerError::Timeout {
                command: spec.display(),
                timeout: Duration::from_secs(0),
            }),
            ScriptedResult::SpawnFailure(message) => Err(RunnerError::Spawn {
                command: spec.display(),
                source: std::io::Error::other(message),
            }),
        }
    }
}

struct FakeProbeState {
    busy: HashSet<u16>,
    serving: HashSet<u16>,
}

/// Fake for [`PortProbe`] with explicit busy/serving sets.
#[derive(Clone)]
pub struct FakePortProbe {
    inner: Arc<Mutex<FakeProbeState>>,
}

impl Default for FakePortProbe {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeProbeState {
                busy: HashSet::new(),
                serving: HashSet::new(),
            })),
        }
    }
}

impl FakePortProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_busy(&self, port: u16, busy: bool) {
        let mut state = self.inner.lock();
        if busy {
            state.busy.insert(port);
        } else {
            state.busy.remove(&port);
        }
    }

    pub fn set_serving(&self, port: u16, serving: bool) {
        let mut state = self.inner.lock();
        if serving {
            state.serving.insert(port);
        } else {
            state.serving.remove(&port);
        }
    }
}

#[async_trait]
impl PortProbe for FakePortProbe {
    async fn is_free(&self, port: u16) -> bool {
        let state = self.inner.lock();
        !state.busy.contains(&port) && !state.serving.contains(&port)
    }

    async fn is_serving(&self, port: u16) -> bool {
        self.inner.lock().serving.contains(&port)
    }
}

/// Recording fake for [`Notifier`].
#[derive(Clone, Default)]
pub struct FakeNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().push((title.to_string(), body.to_string()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
