//! Synchronous search-box state machine.
//!
//! The controller owns the input text, the sequence counter, the suggestion
//! list, and the cursor. It never performs I/O: every [`SearchInput`] returns
//! the [`Effect`]s the caller must carry out (arm a timer, run a fan-out,
//! deliver an event). [`crate::engine::SearchEngine`] is the tokio driver; tests
//! drive the controller directly.

use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::AggregateStats;
use crate::aggregate::merge;
use crate::config::SearchConfig;
use crate::cursor::NavKey;
use crate::cursor::SelectionCursor;
use crate::event::SearchEvent;
use crate::mode::ModeDecision;
use crate::mode::QueryMode;
use crate::mode::detect_mode;
use crate::router::route;
use crate::session::QuerySession;
use crate::session::SequenceGuard;
use crate::session::Viewer;
use crate::source::SourceResult;
use crate::suggestion::Suggestion;

/// Who changed the search-box text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrigin {
    /// Keystrokes; may trigger a query.
    User,
    /// Written by another component (e.g. a reverse-geocoded map click);
    /// never triggers a query.
    System,
}

#[derive(Debug, Clone)]
pub enum SearchInput {
    InputChanged { text: String, origin: InputOrigin },
    DebounceElapsed { ticket: u64 },
    SourcesSettled { sequence: u64, results: Vec<SourceResult> },
    Key(NavKey),
    Click(usize),
    Focus,
    PointerDownOutside,
    ViewerChanged(Option<Viewer>),
}

#[derive(Debug, Clone)]
pub enum Effect {
    /// Arm the debounce timer, replacing any armed one. When it fires, feed
    /// back [`SearchInput::DebounceElapsed`] with the same ticket.
    ScheduleDebounce { ticket: u64, delay: Duration },
    CancelDebounce,
    /// Query the applicable sources and feed back
    /// [`SearchInput::SourcesSettled`].
    Dispatch(QuerySession),
    Emit(SearchEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverabilityHint {
    /// The viewer is hidden from directory search themselves.
    MakeProfileDiscoverable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelState {
    #[default]
    Idle,
    Suggestions,
    /// Directory search settled with nothing to show.
    NoMatch { hint: Option<DiscoverabilityHint> },
    /// Directory search needs a signed-in viewer.
    SignInRequired,
}

/// Everything a renderer needs, copied out after each transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSnapshot {
    pub input: String,
    pub mode: QueryMode,
    pub suggestions: Vec<Suggestion>,
    pub cursor: Option<usize>,
    pub dropdown_visible: bool,
    pub panel: PanelState,
    /// A dispatched query has not settled yet.
    pub pending: bool,
    pub last_sequence: u64,
    pub stats: AggregateStats,
}

pub struct SearchController {
    config: SearchConfig,
    guard: SequenceGuard,
    viewer: Option<Viewer>,
    input: String,
    mode: QueryMode,
    suggestions: Vec<Suggestion>,
    cursor: SelectionCursor,
    panel: PanelState,
    stats: AggregateStats,
    pending: bool,
    dismissed: bool,
    debounce_ticket: u64,
    debounce_armed: bool,
    sign_in_prompted: bool,
    /// The current text came from keystrokes, not selection or a system write.
    user_authored: bool,
}

impl SearchController {
    pub fn new(config: SearchConfig, viewer: Option<Viewer>) -> Self {
        Self {
            config,
            guard: SequenceGuard::new(),
            viewer,
            input: String::new(),
            mode: QueryMode::FreeText,
            suggestions: Vec::new(),
            cursor: SelectionCursor::default(),
            panel: PanelState::Idle,
            stats: AggregateStats::default(),
            pending: false,
            dismissed: false,
            debounce_ticket: 0,
            debounce_armed: false,
            sign_in_prompted: false,
            user_authored: false,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn cursor(&self) -> SelectionCursor {
        self.cursor
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn last_sequence(&self) -> u64 {
        self.guard.last()
    }

    pub fn dropdown_visible(&self) -> bool {
        if self.dismissed {
            return false;
        }
        match self.panel {
            PanelState::Suggestions => !self.suggestions.is_empty(),
            PanelState::NoMatch { .. } => true,
            PanelState::Idle | PanelState::SignInRequired => false,
        }
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            input: self.input.clone(),
            mode: self.mode,
            suggestions: self.suggestions.clone(),
            cursor: self.cursor.index(),
            dropdown_visible: self.dropdown_visible(),
            panel: self.panel,
            pending: self.pending,
            last_sequence: self.guard.last(),
            stats: self.stats.clone(),
        }
    }

    pub fn handle(&mut self, input: SearchInput) -> Vec<Effect> {
        let mut effects = Vec::new();
        match input {
            SearchInput::InputChanged {
                text,
                origin: InputOrigin::User,
            } => self.on_user_input(text, &mut effects),
            SearchInput::InputChanged {
                text,
                origin: InputOrigin::System,
            } => self.on_system_input(text, &mut effects),
            SearchInput::DebounceElapsed { ticket } => self.on_debounce(ticket, &mut effects),
            SearchInput::SourcesSettled { sequence, results } => {
                self.on_settled(sequence, results);
            }
            SearchInput::Key(key) => self.on_key(key, &mut effects),
            SearchInput::Click(index) => {
                if self.dropdown_visible() && index < self.suggestions.len() {
                    self.select(index, &mut effects);
                }
            }
            SearchInput::Focus => self.dismissed = false,
            SearchInput::PointerDownOutside => self.dismissed = true,
            SearchInput::ViewerChanged(viewer) => self.on_viewer_changed(viewer, &mut effects),
        }
        effects
    }

    fn on_user_input(&mut self, text: String, effects: &mut Vec<Effect>) {
        let decision = detect_mode(&text, self.config.directory_sigil);
        self.input = text;
        self.user_authored = true;
        self.dismissed = false;
        if decision.mode != self.mode {
            // Results for the other mode must not linger under the new one.
            self.guard.supersede();
            self.clear_results();
        }
        self.mode = decision.mode;

        match decision.mode {
            QueryMode::Directory => {
                self.cancel_debounce(effects);
                self.directory_query(decision, effects);
            }
            QueryMode::FreeText => {
                self.sign_in_prompted = false;
                if decision.term_len() < self.config.min_query_chars {
                    self.cancel_debounce(effects);
                    self.guard.supersede();
                    self.clear_results();
                    return;
                }
                self.debounce_ticket += 1;
                self.debounce_armed = true;
                effects.push(Effect::ScheduleDebounce {
                    ticket: self.debounce_ticket,
                    delay: self.config.debounce(),
                });
            }
        }
    }

    fn directory_query(&mut self, decision: ModeDecision, effects: &mut Vec<Effect>) {
        if self.viewer.is_none() {
            self.guard.supersede();
            self.clear_results();
            self.panel = PanelState::SignInRequired;
            if !self.sign_in_prompted {
                self.sign_in_prompted = true;
                effects.push(Effect::Emit(SearchEvent::SignInRequested));
            }
            return;
        }
        self.sign_in_prompted = false;
        effects.push(Effect::Dispatch(self.start_session(decision)));
    }

    fn on_system_input(&mut self, text: String, effects: &mut Vec<Effect>) {
        self.cancel_debounce(effects);
        self.guard.supersede();
        self.clear_results();
        self.mode = detect_mode(&text, self.config.directory_sigil).mode;
        self.input = text;
        self.user_authored = false;
        self.sign_in_prompted = false;
    }

    fn on_debounce(&mut self, ticket: u64, effects: &mut Vec<Effect>) {
        if !self.debounce_armed || ticket != self.debounce_ticket {
            debug!(ticket, current = self.debounce_ticket, "ignoring superseded debounce");
            return;
        }
        self.debounce_armed = false;
        let decision = detect_mode(&self.input, self.config.directory_sigil);
        if decision.mode != QueryMode::FreeText
            || decision.term_len() < self.config.min_query_chars
        {
            return;
        }
        effects.push(Effect::Dispatch(self.start_session(decision)));
    }

    fn on_settled(&mut self, sequence: u64, results: Vec<SourceResult>) {
        if self.guard.is_stale(sequence) || !self.pending {
            debug!(sequence, latest = self.guard.last(), "discarding stale results");
            return;
        }
        let aggregation = merge(sequence, results);
        if let (Some(viewer), Some(discoverable)) =
            (self.viewer.as_mut(), aggregation.viewer_discoverable)
        {
            viewer.discoverable = discoverable;
        }
        self.pending = false;
        self.suggestions = aggregation.suggestions;
        self.stats = aggregation.stats;
        self.cursor.reset();
        self.panel = if !self.suggestions.is_empty() {
            PanelState::Suggestions
        } else if self.mode == QueryMode::Directory {
            PanelState::NoMatch {
                hint: self
                    .viewer
                    .as_ref()
                    .filter(|viewer| !viewer.discoverable)
                    .map(|_| DiscoverabilityHint::MakeProfileDiscoverable),
            }
        } else {
            PanelState::Idle
        };
    }

    fn on_key(&mut self, key: NavKey, effects: &mut Vec<Effect>) {
        if key == NavKey::Escape {
            self.dismissed = true;
            return;
        }
        if !self.dropdown_visible() {
            return;
        }
        let len = self.suggestions.len();
        match key {
            NavKey::Down => self.cursor.down(len),
            NavKey::Up => self.cursor.up(),
            NavKey::Enter => {
                if let Some(index) = self.cursor.enter_target(len) {
                    self.select(index, effects);
                }
            }
            NavKey::Escape => {}
        }
    }

    /// Re-runs a typed directory query under the new identity. Text written
    /// by selection or by another component stays idle.
    fn on_viewer_changed(&mut self, viewer: Option<Viewer>, effects: &mut Vec<Effect>) {
        self.viewer = viewer;
        if !self.user_authored || self.mode != QueryMode::Directory {
            return;
        }
        let showing_directory = self.pending
            || matches!(
                self.panel,
                PanelState::SignInRequired | PanelState::Suggestions | PanelState::NoMatch { .. }
            );
        if !showing_directory {
            return;
        }
        let decision = detect_mode(&self.input, self.config.directory_sigil);
        if decision.mode == QueryMode::Directory {
            self.directory_query(decision, effects);
        }
    }

    fn select(&mut self, index: usize, effects: &mut Vec<Effect>) {
        let Some(suggestion) = self.suggestions.get(index).cloned() else {
            return;
        };
        debug!(kind = %suggestion.kind(), id = suggestion.id(), "suggestion selected");
        effects.extend(route(&suggestion, &self.config).into_iter().map(Effect::Emit));
        self.cancel_debounce(effects);
        self.guard.supersede();
        self.clear_results();
        self.input = suggestion.label();
        self.user_authored = false;
        self.mode = detect_mode(&self.input, self.config.directory_sigil).mode;
    }

    fn start_session(&mut self, decision: ModeDecision) -> QuerySession {
        let sequence = self.guard.next();
        self.pending = true;
        debug!(sequence, mode = ?decision.mode, term = %decision.term, "dispatching query");
        QuerySession {
            sequence,
            raw_input: self.input.clone(),
            term: decision.term,
            mode: decision.mode,
            issued_at: Instant::now(),
            viewer: self.viewer.clone(),
        }
    }

    fn cancel_debounce(&mut self, effects: &mut Vec<Effect>) {
        if self.debounce_armed {
            self.debounce_armed = false;
            self.debounce_ticket += 1;
            effects.push(Effect::CancelDebounce);
        }
    }

    fn clear_results(&mut self) {
        self.suggestions = Vec::new();
        self.cursor.reset();
        self.panel = PanelState::Idle;
        self.pending = false;
    }
}
