//! Tokio driver for [`SearchController`].
//!
//! A single actor task owns the controller and applies inputs one at a time.
//! Debounce timers and source fan-outs run as separate tasks and report back
//! through the actor's internal inbox, so the controller only ever sees
//! serialized inputs.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::SearchConfig;
use crate::controller::Effect;
use crate::controller::InputOrigin;
use crate::controller::SearchController;
use crate::controller::SearchInput;
use crate::controller::SearchSnapshot;
use crate::cursor::NavKey;
use crate::error::ConfigError;
use crate::event::SearchEventSender;
use crate::session::QuerySession;
use crate::session::Viewer;
use crate::source::QueryContext;
use crate::source::SuggestionSource;
use crate::source::applicable;
use crate::source::fan_out;

pub struct SearchEngine {
    controller: SearchController,
    sources: Vec<Arc<dyn SuggestionSource>>,
    events: SearchEventSender,
    commands: mpsc::UnboundedReceiver<SearchInput>,
    internal_tx: mpsc::UnboundedSender<SearchInput>,
    internal_rx: mpsc::UnboundedReceiver<SearchInput>,
    snapshot_tx: watch::Sender<SearchSnapshot>,
    debounce: Option<JoinHandle<()>>,
}

impl SearchEngine {
    /// Validates `config` and starts the engine on the current tokio runtime.
    pub fn spawn(
        config: SearchConfig,
        viewer: Option<Viewer>,
        sources: Vec<Arc<dyn SuggestionSource>>,
        events: SearchEventSender,
    ) -> Result<SearchHandle, ConfigError> {
        config.validate()?;

        let controller = SearchController::new(config, viewer);
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        info!(
            sources = sources.len(),
            debounce_ms = controller.config().debounce_ms,
            "starting search engine"
        );

        let engine = Self {
            controller,
            sources,
            events,
            commands,
            internal_tx,
            internal_rx,
            snapshot_tx,
            debounce: None,
        };
        tokio::spawn(engine.run());

        Ok(SearchHandle {
            tx: command_tx,
            snapshot: snapshot_rx,
        })
    }

    async fn run(mut self) {
        loop {
            let input = tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(input) => input,
                    None => break,
                },
                Some(input) = self.internal_rx.recv() => input,
            };
            self.step(input);
        }

        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
        info!("search engine stopped");
    }

    fn step(&mut self, input: SearchInput) {
        for effect in self.controller.handle(input) {
            self.apply(effect);
        }
        let next = self.controller.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ScheduleDebounce { ticket, delay } => {
                if let Some(timer) = self.debounce.take() {
                    timer.abort();
                }
                let tx = self.internal_tx.clone();
                self.debounce = Some(tokio::spawn(async move {
                    sleep(delay).await;
                    let _ = tx.send(SearchInput::DebounceElapsed { ticket });
                }));
            }
            Effect::CancelDebounce => {
                if let Some(timer) = self.debounce.take() {
                    timer.abort();
                }
            }
            Effect::Dispatch(session) => self.dispatch(session),
            Effect::Emit(event) => self.events.send(event),
        }
    }

    fn dispatch(&self, session: QuerySession) {
        let config = self.controller.config();
        let sources = applicable(&self.sources, session.mode);
        let ctx = QueryContext {
            mode: session.mode,
            viewer: session.viewer,
            region: config.region.clone(),
            limit: config.page_size,
        };
        let sequence = session.sequence;
        let term = session.term;
        let tx = self.internal_tx.clone();
        debug!(sequence, sources = sources.len(), "fanning out");

        tokio::spawn(async move {
            let results = fan_out(&sources, sequence, &term, &ctx).await;
            if tx
                .send(SearchInput::SourcesSettled { sequence, results })
                .is_err()
            {
                debug!(sequence, "engine gone before sources settled");
            }
        });
    }
}

/// Cloneable front end of a running [`SearchEngine`].
#[derive(Clone, Debug)]
pub struct SearchHandle {
    tx: mpsc::UnboundedSender<SearchInput>,
    snapshot: watch::Receiver<SearchSnapshot>,
}

impl SearchHandle {
    pub fn send(&self, input: SearchInput) {
        if let Err(e) = self.tx.send(input) {
            warn!("search engine is not running: {e}");
        }
    }

    /// Keystroke-driven text change.
    pub fn type_text(&self, text: impl Into<String>) {
        self.send(SearchInput::InputChanged {
            text: text.into(),
            origin: InputOrigin::User,
        });
    }

    /// Text written by another component; never queries.
    pub fn set_text(&self, text: impl Into<String>) {
        self.send(SearchInput::InputChanged {
            text: text.into(),
            origin: InputOrigin::System,
        });
    }

    pub fn key(&self, key: NavKey) {
        self.send(SearchInput::Key(key));
    }

    pub fn click(&self, index: usize) {
        self.send(SearchInput::Click(index));
    }

    pub fn focus(&self) {
        self.send(SearchInput::Focus);
    }

    pub fn pointer_down_outside(&self) {
        self.send(SearchInput::PointerDownOutside);
    }

    pub fn set_viewer(&self, viewer: Option<Viewer>) {
        self.send(SearchInput::ViewerChanged(viewer));
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.snapshot.clone()
    }

    /// Resolves with the first snapshot matching `pred`, or `None` once the
    /// engine has stopped.
    pub async fn wait_for(
        &self,
        pred: impl FnMut(&SearchSnapshot) -> bool,
    ) -> Option<SearchSnapshot> {
        let mut rx = self.snapshot.clone();
        let result = rx.wait_for(pred).await.map(|s| (*s).clone()).ok();
        result
    }
}
