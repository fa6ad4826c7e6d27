// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator: single writer over the authoritative board state.
//!
//! All mutation happens inside one message loop. Commands arrive with an
//! optional reply channel; long-running workflows are forked and re-enter
//! the loop as [`WorkerResult`] messages so state updates stay serialized.
//! Monitors reach the loop through the supervisor's bridged event channel.
//! Consumers read immutable versioned snapshots from a watch channel and
//! never hold a lock.

use crate::detector::Detector;
use crate::devserver::DevServerManager;
use crate::error::OrchestratorError;
use crate::lifecycle::{AttachCheck, SessionLifecycle};
use crate::merge::{MergeOutcome, MergeProtocol};
use crate::monitor::{
    run_server_monitor, run_session_monitor, MonitorKey, MonitorsSupervisor, ServerMonitorConfig,
    SessionMonitorConfig,
};
use az_adapters::{BeadsClient, CommandRunner, Notifier, PortProbe, TmuxClient};
use az_core::{
    BoardSnapshot, Clock, Command, CommandId, CommandOutcome, Config, DevServer, Event, ServerKey,
    ServerView, Session, SessionState, SessionView, Task, TaskId, TaskStatus, Toast,
};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Messages entering the coordinator's single-writer loop.
pub enum CoordinatorMsg {
    Command {
        id: CommandId,
        command: Command,
        reply: Option<oneshot::Sender<CommandOutcome>>,
    },
    Event(Event),
    Worker(WorkerResult),
}

/// Results of forked workflows, re-entering the loop as messages.
pub enum WorkerResult {
    SessionStarted {
        task_id: TaskId,
        outcome: Box<Result<Session, OrchestratorError>>,
    },
    /// A session was completed or deleted; the record goes away either way.
    SessionRemoved {
        task_id: TaskId,
        failures: Vec<String>,
        completed: bool,
        pr_url: Option<String>,
    },
    MergeFinished {
        task_id: TaskId,
        outcome: Result<MergeOutcome, OrchestratorError>,
    },
    ServerChanged {
        key: ServerKey,
        outcome: Result<Option<DevServer>, OrchestratorError>,
    },
    TasksFetched {
        outcome: Result<Vec<Task>, OrchestratorError>,
    },
}

/// Everything the coordinator drives.
pub struct CoordinatorDeps<R, P, N, C>
where
    R: CommandRunner,
    P: PortProbe,
    N: Notifier,
    C: Clock,
{
    pub lifecycle: Arc<SessionLifecycle<R, C>>,
    pub merge: Arc<MergeProtocol<R>>,
    pub devservers: Arc<DevServerManager<R, P, C>>,
    pub beads: BeadsClient<R>,
    pub tmux: TmuxClient<R>,
    pub probe: P,
    pub notifier: N,
    pub detector: Detector,
    pub supervisor: Arc<MonitorsSupervisor<C>>,
    pub config: Config,
    pub project_root: PathBuf,
    pub clock: C,
}

struct CoordState {
    version: u64,
    tasks: Vec<Task>,
    sessions: IndexMap<TaskId, SessionView>,
    servers: IndexMap<ServerKey, ServerView>,
    /// Tasks whose activation workflow is still in flight; concurrent
    /// starts for the same task are rejected against this set
    pending_starts: std::collections::HashSet<TaskId>,
    toasts: Vec<Toast>,
}

pub struct Coordinator<R, P, N, C>
where
    R: CommandRunner,
    P: PortProbe,
    N: Notifier,
    C: Clock,
{
    deps: CoordinatorDeps<R, P, N, C>,
    inbox: mpsc::Receiver<CoordinatorMsg>,
    self_tx: mpsc::Sender<CoordinatorMsg>,
    snapshots: watch::Sender<BoardSnapshot>,
    cancel: CancellationToken,
    state: CoordState,
}

impl<R, P, N, C> Coordinator<R, P, N, C>
where
    R: CommandRunner,
    P: PortProbe,
    N: Notifier,
    C: Clock,
{
    pub fn new(
        deps: CoordinatorDeps<R, P, N, C>,
        inbox: mpsc::Receiver<CoordinatorMsg>,
        self_tx: mpsc::Sender<CoordinatorMsg>,
        snapshots: watch::Sender<BoardSnapshot>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            deps,
            inbox,
            self_tx,
            snapshots,
            cancel,
            state: CoordState {
                version: 0,
                tasks: Vec::new(),
                sessions: IndexMap::new(),
                servers: IndexMap::new(),
                pending_starts: std::collections::HashSet::new(),
                toasts: Vec::new(),
            },
        }
    }

    /// Run until cancelled: recovery scan first, then the message loop.
    pub async fn run(mut self) {
        self.recover().await;
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                msg = self.inbox.recv() => match msg {
                    Some(CoordinatorMsg::Command { id, command, reply }) => {
                        self.handle_command(id, command, reply).await;
                    }
                    Some(CoordinatorMsg::Event(event)) => self.handle_event(event).await,
                    Some(CoordinatorMsg::Worker(result)) => self.handle_worker(result).await,
                    None => break,
                },
            }
        }
        tracing::debug!("coordinator loop exited");
    }

    // ---- snapshot publication -------------------------------------------

    fn publish(&mut self) {
        self.state.version += 1;
        let snapshot = BoardSnapshot {
            version: self.state.version,
            project: Some(self.deps.project_root.clone()),
            tasks: self.state.tasks.clone(),
            sessions: self.state.sessions.clone(),
            servers: self.state.servers.clone(),
            toasts: std::mem::take(&mut self.state.toasts),
        };
        let _ = self.snapshots.send_replace(snapshot);
    }

    fn toast(&mut self, toast: Toast) {
        tracing::debug!(message = %toast.message, "toast");
        self.state.toasts.push(toast);
    }

    // ---- recovery --------------------------------------------------------

    /// Reconcile with the external world after a (re)start: rebuild session
    /// records from live tmux sessions matching known task branches, then
    /// dev servers from their windows. Idempotent over unchanged state.
    async fn recover(&mut self) {
        match self.deps.beads.list_all().await {
            Ok(tasks) => self.state.tasks = tasks,
            Err(e) => {
                tracing::warn!(error = %e, "issue refresh failed during recovery");
                self.toast(Toast::warning(format!("issue list unavailable: {}", e)));
            }
        }

        let live = match self.deps.tmux.list_sessions().await {
            Ok(live) => live,
            Err(e) => {
                tracing::warn!(error = %e, "session scan failed during recovery");
                Vec::new()
            }
        };

        let mut recovered = Vec::new();
        for task in &self.state.tasks {
            let branch = self.deps.config.branch_name(task.id.as_str());
            if !live.iter().any(|s| s == &branch) {
                continue;
            }
            let session = Session {
                task_id: task.id.clone(),
                worktree: self
                    .deps
                    .config
                    .worktree_path(&self.deps.project_root, task.id.as_str()),
                branch: branch.clone(),
                tmux_session: branch,
                state: SessionState::Unknown,
                started_at_ms: self.deps.clock.epoch_ms(),
                last_output: None,
                last_error: None,
            };
            tracing::info!(task_id = %task.id, "recovered live session");
            recovered.push(session);
        }

        for session in &recovered {
            self.insert_session(session.clone());
            self.start_session_monitor(session);
        }

        let servers = self.deps.devservers.recover_from_scan(&recovered).await;
        for server in servers {
            self.upsert_server(server.clone());
            self.start_server_monitor(&server);
        }

        self.publish();
    }

    // ---- monitors --------------------------------------------------------

    fn start_session_monitor(&self, session: &Session) {
        let config = SessionMonitorConfig::new(
            session.task_id.clone(),
            session.tmux_session.clone(),
        )
        .poll_interval(Duration::from_millis(
            self.deps.config.polling.session_monitor,
        ));
        let tmux = self.deps.tmux.clone();
        let detector = self.deps.detector.clone();
        let events = self.deps.supervisor.events();

        let started = self.deps.supervisor.start(
            MonitorKey::Session(session.task_id.clone()),
            Box::new(move |cancel| {
                tokio::spawn(run_session_monitor(
                    config.clone(),
                    tmux.clone(),
                    detector.clone(),
                    events.clone(),
                    cancel,
                ))
            }),
        );
        if let Err(e) = started {
            tracing::warn!(task_id = %session.task_id, error = %e, "session monitor not started");
        }
    }

    fn start_server_monitor(&self, server: &DevServer) {
        let key = ServerKey::new(server.task_id.clone(), &server.name);
        let tmux_session = self
            .state
            .sessions
            .get(&server.task_id)
            .map(|v| v.session.tmux_session.clone())
            .unwrap_or_else(|| self.deps.config.branch_name(server.task_id.as_str()));

        let config = ServerMonitorConfig::new(key.clone(), tmux_session, server.port);
        let tmux = self.deps.tmux.clone();
        let probe = self.deps.probe.clone();
        let events = self.deps.supervisor.events();

        let started = self.deps.supervisor.start(
            MonitorKey::Server(key.clone()),
            Box::new(move |cancel| {
                tokio::spawn(run_server_monitor(
                    config.clone(),
                    tmux.clone(),
                    probe.clone(),
                    events.clone(),
                    cancel,
                ))
            }),
        );
        if let Err(e) = started {
            tracing::warn!(%key, error = %e, "server monitor not started");
        }
    }

    // ---- state helpers ---------------------------------------------------

    fn insert_session(&mut self, session: Session) {
        let generation = self
            .state
            .sessions
            .get(&session.task_id)
            .map(|v| v.generation + 1)
            .unwrap_or(1);
        self.state
            .sessions
            .insert(session.task_id.clone(), SessionView { session, generation });
    }

    fn mutate_session(&mut self, task_id: &TaskId, f: impl FnOnce(&mut Session)) -> bool {
        match self.state.sessions.get_mut(task_id) {
            Some(view) => {
                f(&mut view.session);
                view.generation += 1;
                true
            }
            None => {
                tracing::debug!(%task_id, "event for unknown session dropped");
                false
            }
        }
    }

    fn upsert_server(&mut self, server: DevServer) {
        let key = ServerKey::new(server.task_id.clone(), &server.name);
        let generation = self
            .state
            .servers
            .get(&key)
            .map(|v| v.generation + 1)
            .unwrap_or(1);
        self.state
            .servers
            .insert(key, ServerView { server, generation });
    }

    fn session_of(&self, task_id: &TaskId) -> Option<Session> {
        self.state
            .sessions
            .get(task_id)
            .map(|v| v.session.clone())
    }

    // ---- command handling ------------------------------------------------

    async fn handle_command(
        &mut self,
        id: CommandId,
        command: Command,
        reply: Option<oneshot::Sender<CommandOutcome>>,
    ) {
        tracing::debug!(command_id = %id, ?command, "command received");
        match command {
            Command::StartSession {
                task_id,
                initial_prompt,
            } => {
                if self.state.sessions.contains_key(&task_id)
                    || !self.state.pending_starts.insert(task_id.clone())
                {
                    respond(
                        reply,
                        CommandOutcome::Failed {
                            message: format!("session for {} already exists", task_id),
                        },
                    );
                    return;
                }
                let lifecycle = self.deps.lifecycle.clone();
                let tx = self.self_tx.clone();
                let cancel = self.cancel.child_token();
                tokio::spawn(async move {
                    let outcome = lifecycle
                        .create_and_start(&task_id, initial_prompt.as_deref(), &cancel)
                        .await;
                    let _ = tx
                        .send(CoordinatorMsg::Worker(WorkerResult::SessionStarted {
                            task_id,
                            outcome: Box::new(outcome),
                        }))
                        .await;
                });
                respond(reply, CommandOutcome::Started);
            }

            Command::Pause { task_id } => {
                let Some(session) = self.session_of(&task_id) else {
                    respond(reply, not_found(&task_id));
                    return;
                };
                match self.deps.lifecycle.pause(&session).await {
                    Ok(()) => {
                        // Optimistic: monitor evidence corrects this later
                        self.mutate_session(&task_id, |s| s.state = SessionState::Paused);
                        self.publish();
                        respond(reply, CommandOutcome::Ok);
                    }
                    Err(e) => {
                        self.fail_session(&task_id, &e);
                        self.publish();
                        respond(reply, failed(e));
                    }
                }
            }

            Command::Complete { task_id, mode } => {
                let Some(session) = self.session_of(&task_id) else {
                    respond(reply, not_found(&task_id));
                    return;
                };
                let lifecycle = self.deps.lifecycle.clone();
                let devservers = self.deps.devservers.clone();
                let tx = self.self_tx.clone();
                tokio::spawn(async move {
                    let mut failures = devservers.stop_all(&session).await;
                    let (completed, pr_url) = match lifecycle.complete(&session, mode).await {
                        Ok(outcome) => (true, outcome.pr_url),
                        Err(e) => {
                            // Issue close may still have happened; the error
                            // text carries the detail either way
                            failures.push(e.to_string());
                            (false, None)
                        }
                    };
                    let _ = tx
                        .send(CoordinatorMsg::Worker(WorkerResult::SessionRemoved {
                            task_id,
                            failures,
                            completed,
                            pr_url,
                        }))
                        .await;
                });
                respond(reply, CommandOutcome::Started);
            }

            Command::Delete { task_id } => {
                let Some(session) = self.session_of(&task_id) else {
                    respond(reply, not_found(&task_id));
                    return;
                };
                let lifecycle = self.deps.lifecycle.clone();
                let devservers = self.deps.devservers.clone();
                let tx = self.self_tx.clone();
                tokio::spawn(async move {
                    let mut failures = devservers.stop_all(&session).await;
                    failures.extend(lifecycle.teardown(&session).await);
                    let _ = tx
                        .send(CoordinatorMsg::Worker(WorkerResult::SessionRemoved {
                            task_id,
                            failures,
                            completed: false,
                            pr_url: None,
                        }))
                        .await;
                });
                respond(reply, CommandOutcome::Started);
            }

            Command::UpdateFromBase { task_id } => {
                let Some(session) = self.session_of(&task_id) else {
                    respond(reply, not_found(&task_id));
                    return;
                };
                let merge = self.deps.merge.clone();
                let tx = self.self_tx.clone();
                tokio::spawn(async move {
                    let outcome = merge.update_from_base(&session).await;
                    respond(
                        reply,
                        match &outcome {
                            Ok(MergeOutcome::AlreadyUpToDate) => CommandOutcome::AlreadyUpToDate,
                            Ok(MergeOutcome::CleanMerge) => CommandOutcome::CleanMerge,
                            Ok(MergeOutcome::ConflictsDetected { files }) => {
                                CommandOutcome::ConflictsDetected {
                                    files: files.clone(),
                                }
                            }
                            Err(e) => CommandOutcome::Failed {
                                message: e.to_string(),
                            },
                        },
                    );
                    let _ = tx
                        .send(CoordinatorMsg::Worker(WorkerResult::MergeFinished {
                            task_id,
                            outcome,
                        }))
                        .await;
                });
            }

            Command::Attach { task_id } => {
                let Some(session) = self.session_of(&task_id) else {
                    respond(reply, not_found(&task_id));
                    return;
                };
                let lifecycle = self.deps.lifecycle.clone();
                tokio::spawn(async move {
                    let outcome = match lifecycle.attach_check(&session).await {
                        Ok(AttachCheck::Ready { .. }) => CommandOutcome::Ok,
                        Ok(AttachCheck::BranchBehind { behind }) => {
                            CommandOutcome::BranchBehind { behind }
                        }
                        Err(e) => CommandOutcome::Failed {
                            message: e.to_string(),
                        },
                    };
                    respond(reply, outcome);
                });
            }

            Command::StartDevServer { task_id, name } => {
                self.handle_server_command("start", task_id, name, reply);
            }
            Command::StopDevServer { task_id, name } => {
                self.handle_server_command("stop", task_id, name, reply);
            }
            Command::RestartDevServer { task_id, name } => {
                self.handle_server_command("restart", task_id, name, reply);
            }
            Command::ToggleDevServer { task_id, name } => {
                self.handle_server_command("toggle", task_id, name, reply);
            }

            Command::RefreshIssues => {
                let beads = self.deps.beads.clone();
                let tx = self.self_tx.clone();
                tokio::spawn(async move {
                    let outcome = beads.list_all().await.map_err(Into::into);
                    let _ = tx
                        .send(CoordinatorMsg::Worker(WorkerResult::TasksFetched { outcome }))
                        .await;
                });
                respond(reply, CommandOutcome::Started);
            }

            Command::SwitchProject { path } => {
                // Project switching rebuilds the whole app context; from the
                // loop's perspective it is only an acknowledgement.
                tracing::info!(path = %path.display(), "project switch requested");
                respond(reply, CommandOutcome::Ok);
            }
        }
    }

    fn handle_server_command(
        &mut self,
        kind: &str,
        task_id: TaskId,
        name: String,
        reply: Option<oneshot::Sender<CommandOutcome>>,
    ) {
        let Some(session) = self.session_of(&task_id) else {
            respond(reply, not_found(&task_id));
            return;
        };
        let devservers = self.deps.devservers.clone();
        let tx = self.self_tx.clone();
        let kind = kind.to_string();
        tokio::spawn(async move {
            let key = ServerKey::new(session.task_id.clone(), &name);
            let outcome = match kind.as_str() {
                "start" => devservers.start(&session, &name).await.map(Some),
                "stop" => devservers.stop(&session, &name).await,
                "restart" => devservers.restart(&session, &name).await.map(Some),
                _ => devservers.toggle(&session, &name).await.map(Some),
            };
            respond(
                reply,
                match &outcome {
                    Ok(_) => CommandOutcome::Ok,
                    Err(e) => CommandOutcome::Failed {
                        message: e.to_string(),
                    },
                },
            );
            let _ = tx
                .send(CoordinatorMsg::Worker(WorkerResult::ServerChanged {
                    key,
                    outcome,
                }))
                .await;
        });
    }

    // ---- event handling --------------------------------------------------

    async fn handle_event(&mut self, event: Event) {
        match event {
            Event::SessionStateChanged {
                task_id,
                state,
                output_snippet,
            } => {
                let previous = self.session_of(&task_id).map(|s| s.state);
                let updated = self.mutate_session(&task_id, |s| {
                    s.state = state;
                    if output_snippet.is_some() {
                        s.last_output = output_snippet;
                    }
                });
                if updated {
                    if previous != Some(state) {
                        self.notify_attention(&task_id, state).await;
                    }
                    self.publish();
                }
            }

            Event::SessionMarkedUnknown { task_id, reason } => {
                let updated = self.mutate_session(&task_id, |s| {
                    s.state = SessionState::Unknown;
                    s.last_error = Some(reason.clone());
                });
                if updated {
                    self.publish();
                }
            }

            Event::ServerStatusChanged { key, status, error } => {
                match self.deps.devservers.apply_status(&key, status, error) {
                    Some(record) => {
                        self.upsert_server(record);
                        self.publish();
                    }
                    None => {
                        tracing::debug!(%key, "status for unknown dev server dropped");
                    }
                }
            }

            Event::ServerMarkedUnknown { key, reason } => {
                let applied = self.deps.devservers.apply_status(
                    &key,
                    az_core::DevServerStatus::Unknown,
                    Some(reason),
                );
                if let Some(record) = applied {
                    self.upsert_server(record);
                    self.publish();
                }
            }

            Event::HookSignal { task_id, event } => {
                tracing::info!(%task_id, %event, "hook signal");
                self.toast(Toast::info(format!("{}: {}", task_id, event)));
                self.publish();
            }

            Event::TasksRefreshed { tasks } => {
                self.state.tasks = tasks;
                self.publish();
            }

            Event::ToastRaised { toast } => {
                self.toast(toast);
                self.publish();
            }
        }
    }

    /// Desktop notification when a session starts needing a human.
    async fn notify_attention(&self, task_id: &TaskId, state: SessionState) {
        let (title, body) = match state {
            SessionState::Waiting => (
                format!("{} is waiting", task_id),
                "The assistant needs input".to_string(),
            ),
            SessionState::Error => (
                format!("{} hit an error", task_id),
                "Check the session output".to_string(),
            ),
            _ => return,
        };
        if let Err(e) = self.deps.notifier.notify(&title, &body).await {
            tracing::debug!(error = %e, "notification failed");
        }
    }

    // ---- worker results --------------------------------------------------

    async fn handle_worker(&mut self, result: WorkerResult) {
        match result {
            WorkerResult::SessionStarted { task_id, outcome } => {
                self.state.pending_starts.remove(&task_id);
                match *outcome {
                    Ok(session) => {
                        self.insert_session(session.clone());
                        self.start_session_monitor(&session);
                        self.toast(Toast::info(format!("session {} started", task_id)));
                        self.mark_in_progress(&task_id);
                        self.publish();
                    }
                    Err(e) => {
                        tracing::warn!(%task_id, error = %e, "session start failed");
                        self.toast(Toast::error(format!("start {} failed: {}", task_id, e)));
                        if let OrchestratorError::Compensation { compensation, .. } = &e {
                            self.toast(Toast::warning(format!(
                                "cleanup incomplete: {}",
                                compensation.join("; ")
                            )));
                        }
                        self.publish();
                    }
                }
            }

            WorkerResult::SessionRemoved {
                task_id,
                failures,
                completed,
                pr_url,
            } => {
                self.deps
                    .supervisor
                    .stop(&MonitorKey::Session(task_id.clone()))
                    .await;
                let server_keys: Vec<ServerKey> = self
                    .state
                    .servers
                    .keys()
                    .filter(|k| k.task_id == task_id)
                    .cloned()
                    .collect();
                for key in server_keys {
                    self.deps
                        .supervisor
                        .stop(&MonitorKey::Server(key.clone()))
                        .await;
                    self.state.servers.shift_remove(&key);
                }
                self.state.sessions.shift_remove(&task_id);

                if completed {
                    let message = match pr_url {
                        Some(url) => format!("{} completed, PR: {}", task_id, url),
                        None => format!("{} completed", task_id),
                    };
                    self.toast(Toast::info(message));
                } else if failures.is_empty() {
                    self.toast(Toast::info(format!("session {} deleted", task_id)));
                }
                if !failures.is_empty() {
                    self.toast(Toast::warning(format!(
                        "teardown of {} incomplete: {}",
                        task_id,
                        failures.join("; ")
                    )));
                }
                self.publish();
            }

            WorkerResult::MergeFinished { task_id, outcome } => {
                match outcome {
                    Ok(MergeOutcome::AlreadyUpToDate) => {
                        self.toast(Toast::info(format!("{} already up to date", task_id)));
                    }
                    Ok(MergeOutcome::CleanMerge) => {
                        self.toast(Toast::info(format!("{} merged base cleanly", task_id)));
                    }
                    Ok(MergeOutcome::ConflictsDetected { files }) => {
                        self.toast(Toast::warning(format!(
                            "{}: resolving conflicts in {}",
                            task_id,
                            files.join(", ")
                        )));
                    }
                    Err(e) => {
                        self.fail_session(&task_id, &e);
                        self.toast(Toast::error(format!("update {} failed: {}", task_id, e)));
                    }
                }
                self.publish();
            }

            WorkerResult::ServerChanged { key, outcome } => {
                match outcome {
                    Ok(Some(record)) => {
                        // Replace the monitor to track the new window/port
                        self.deps
                            .supervisor
                            .stop(&MonitorKey::Server(key.clone()))
                            .await;
                        if record.status.is_running() {
                            self.start_server_monitor(&record);
                        }
                        self.upsert_server(record);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        self.toast(Toast::error(format!("dev server {}: {}", key, e)));
                    }
                }
                self.publish();
            }

            WorkerResult::TasksFetched { outcome } => {
                match outcome {
                    Ok(tasks) => self.state.tasks = tasks,
                    Err(e) => {
                        tracing::warn!(error = %e, "issue refresh failed");
                        self.toast(Toast::warning(format!("issue refresh failed: {}", e)));
                    }
                }
                self.publish();
            }
        }
    }

    /// Record a command failure on the session it targeted.
    fn fail_session(&mut self, task_id: &TaskId, error: &OrchestratorError) {
        let message = error.to_string();
        self.mutate_session(task_id, |s| s.last_error = Some(message));
    }

    /// Move the issue to in-progress after activation (fire and forget).
    fn mark_in_progress(&self, task_id: &TaskId) {
        if !self.deps.config.beads.sync_enabled {
            return;
        }
        let beads = self.deps.beads.clone();
        let task_id = task_id.clone();
        tokio::spawn(async move {
            if let Err(e) = beads.update_status(&task_id, TaskStatus::InProgress).await {
                tracing::warn!(%task_id, error = %e, "status update failed");
            }
        });
    }
}

fn respond(reply: Option<oneshot::Sender<CommandOutcome>>, outcome: CommandOutcome) {
    if let Some(tx) = reply {
        let _ = tx.send(outcome);
    }
}

fn not_found(task_id: &TaskId) -> CommandOutcome {
    CommandOutcome::Failed {
        message: format!("no session for {}", task_id),
    }
}

fn failed(error: OrchestratorError) -> CommandOutcome {
    CommandOutcome::Failed {
        message: error.to_string(),
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
