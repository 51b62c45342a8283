use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use pinmap_search_core::AddressSuggestion;
use pinmap_search_core::ContentSuggestion;
use pinmap_search_core::Coordinates;
use pinmap_search_core::DirectoryEntrySuggestion;
use pinmap_search_core::NavKey;
use pinmap_search_core::PanelState;
use pinmap_search_core::QueryContext;
use pinmap_search_core::SearchConfig;
use pinmap_search_core::SearchEngine;
use pinmap_search_core::SearchEvent;
use pinmap_search_core::SearchEventSender;
use pinmap_search_core::SearchHandle;
use pinmap_search_core::SearchSnapshot;
use pinmap_search_core::SourceError;
use pinmap_search_core::SourceKind;
use pinmap_search_core::Suggestion;
use pinmap_search_core::SuggestionSource;
use pinmap_search_core::Viewer;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;
use tokio::time::sleep;
use tokio::time::timeout;

type Responder = dyn Fn(&str) -> (Duration, Result<Vec<Suggestion>, SourceError>) + Send + Sync;

/// Source whose latency and answer are decided per term by the test.
struct ScriptedSource {
    kind: SourceKind,
    calls: Mutex<Vec<String>>,
    respond: Box<Responder>,
}

impl ScriptedSource {
    fn new(
        kind: SourceKind,
        respond: impl Fn(&str) -> (Duration, Result<Vec<Suggestion>, SourceError>)
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            kind,
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    fn empty(kind: SourceKind) -> Arc<Self> {
        Self::new(kind, |_| (Duration::ZERO, Ok(Vec::new())))
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuggestionSource for ScriptedSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn search(
        &self,
        term: &str,
        _ctx: &QueryContext,
    ) -> Result<Vec<Suggestion>, SourceError> {
        self.calls.lock().unwrap().push(term.to_string());
        let (delay, answer) = (self.respond)(term);
        sleep(delay).await;
        answer
    }
}

fn viewer() -> Viewer {
    Viewer {
        user_id: "u1".to_string(),
        access_token: "token".to_string(),
        discoverable: true,
    }
}

fn address(label: &str) -> Suggestion {
    Suggestion::Address(AddressSuggestion {
        id: format!("address.{label}"),
        label: label.to_string(),
        subtitle: "Minneapolis, Minnesota 55401".to_string(),
        coordinates: Coordinates::new(44.9836, -93.2694),
        raw_metadata: serde_json::json!({ "place_name": label }),
    })
}

fn content(title: &str) -> Suggestion {
    Suggestion::Content(ContentSuggestion {
        id: format!("news-{title}"),
        title: title.to_string(),
        excerpt: None,
        source_name: None,
        published_at: None,
    })
}

fn entry(handle: &str) -> Suggestion {
    Suggestion::Directory(DirectoryEntrySuggestion {
        id: handle.to_string(),
        handle: handle.to_string(),
        display_name: None,
        avatar_ref: None,
        tier: None,
    })
}

fn start(
    viewer: Option<Viewer>,
    sources: Vec<Arc<ScriptedSource>>,
) -> (SearchHandle, UnboundedReceiver<SearchEvent>) {
    let (events, rx) = SearchEventSender::channel();
    let sources = sources
        .into_iter()
        .map(|source| source as Arc<dyn SuggestionSource>)
        .collect();
    let handle = SearchEngine::spawn(SearchConfig::default(), viewer, sources, events).unwrap();
    (handle, rx)
}

fn is_settled(s: &SearchSnapshot) -> bool {
    s.last_sequence > 0 && !s.pending && s.stats.sequence == s.last_sequence
}

async fn settled(handle: &SearchHandle) -> SearchSnapshot {
    timeout(Duration::from_secs(10), handle.wait_for(is_settled))
        .await
        .expect("search never settled")
        .expect("engine stopped")
}

fn drain(rx: &mut UnboundedReceiver<SearchEvent>) -> Vec<SearchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn rapid_typing_dispatches_once_for_last_term() {
    let addresses = ScriptedSource::empty(SourceKind::Address);
    let (search, _rx) = start(None, vec![addresses.clone()]);

    for text in ["m", "mi", "min"] {
        search.type_text(text);
        sleep(Duration::from_millis(100)).await;
    }
    settled(&search).await;
    sleep(Duration::from_secs(1)).await;

    assert_eq!(addresses.calls(), vec!["min".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn short_free_text_never_queries() {
    let addresses = ScriptedSource::empty(SourceKind::Address);
    let (search, _rx) = start(None, vec![addresses.clone()]);

    search.type_text("m");
    sleep(Duration::from_secs(2)).await;

    assert!(addresses.calls().is_empty());
    let snapshot = search.snapshot();
    assert!(snapshot.suggestions.is_empty());
    assert!(!snapshot.dropdown_visible);
}

#[tokio::test(start_paused = true)]
async fn free_text_waits_for_quiet_period() {
    let addresses = ScriptedSource::empty(SourceKind::Address);
    let (search, _rx) = start(None, vec![addresses.clone()]);

    search.type_text("main");
    sleep(Duration::from_millis(250)).await;
    assert!(addresses.calls().is_empty());
    sleep(Duration::from_millis(100)).await;
    assert_eq!(addresses.calls(), vec!["main".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn directory_queries_skip_debounce() {
    let directory = ScriptedSource::empty(SourceKind::Directory);
    let addresses = ScriptedSource::empty(SourceKind::Address);
    let (search, _rx) = start(Some(viewer()), vec![addresses.clone(), directory.clone()]);

    let started = Instant::now();
    search.type_text("@");
    settled(&search).await;

    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(directory.calls(), vec![String::new()]);
    assert!(addresses.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_superseded_response_never_displayed() {
    let directory = ScriptedSource::new(SourceKind::Directory, |term| match term {
        "a" => (Duration::from_millis(800), Ok(vec![entry("al")])),
        _ => (Duration::from_millis(20), Ok(vec![entry("abby")])),
    });
    let (search, _rx) = start(Some(viewer()), vec![directory.clone()]);

    search.type_text("@a");
    sleep(Duration::from_millis(50)).await;
    search.type_text("@ab");

    let snapshot = settled(&search).await;
    assert_eq!(snapshot.suggestions, vec![entry("abby")]);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(search.snapshot().suggestions, vec![entry("abby")]);
    assert_eq!(directory.calls(), vec!["a".to_string(), "ab".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn merge_order_ignores_latency() {
    let addresses = ScriptedSource::new(SourceKind::Address, |_| {
        (Duration::from_millis(900), Ok(vec![address("1 Lake St")]))
    });
    let news = ScriptedSource::new(SourceKind::Content, |_| {
        (Duration::from_millis(5), Ok(vec![content("Lake levels rise")]))
    });
    let (search, _rx) = start(None, vec![news, addresses]);

    search.type_text("lake");
    let snapshot = settled(&search).await;

    assert_eq!(
        snapshot.suggestions,
        vec![address("1 Lake St"), content("Lake levels rise")]
    );
}

#[tokio::test(start_paused = true)]
async fn failing_source_does_not_block_others() {
    let addresses = ScriptedSource::new(SourceKind::Address, |_| {
        (
            Duration::ZERO,
            Err(SourceError::MissingCredential("geocoding access token")),
        )
    });
    let news = ScriptedSource::new(SourceKind::Content, |_| {
        (Duration::ZERO, Ok(vec![content("Main Street reopens")]))
    });
    let (search, _rx) = start(None, vec![addresses, news]);

    search.type_text("main");
    let snapshot = settled(&search).await;

    assert_eq!(snapshot.suggestions, vec![content("Main Street reopens")]);
    assert_eq!(
        snapshot.stats.failed_sources().collect::<Vec<_>>(),
        vec![SourceKind::Address]
    );
}

#[tokio::test(start_paused = true)]
async fn single_address_enter_flies_camera() {
    let addresses = ScriptedSource::new(SourceKind::Address, |term| {
        let hits = if term == "mai" {
            vec![address("123 Main St")]
        } else {
            Vec::new()
        };
        (Duration::from_millis(30), Ok(hits))
    });
    let (search, mut rx) = start(
        None,
        vec![
            addresses,
            ScriptedSource::empty(SourceKind::Entity),
            ScriptedSource::empty(SourceKind::Person),
            ScriptedSource::empty(SourceKind::Content),
        ],
    );

    search.type_text("mai");
    let snapshot = settled(&search).await;
    assert_eq!(snapshot.suggestions, vec![address("123 Main St")]);
    assert!(snapshot.dropdown_visible);

    search.key(NavKey::Enter);
    let after = search
        .wait_for(|s| s.input == "123 Main St")
        .await
        .unwrap();
    assert!(after.suggestions.is_empty());
    assert!(!after.dropdown_visible);

    let events = drain(&mut rx);
    assert_matches!(
        events.as_slice(),
        [SearchEvent::FlyTo(camera), SearchEvent::LocationSelected { .. }]
            if camera.center == Coordinates::new(44.9836, -93.2694)
                && camera.zoom == 16.0
    );
}

#[tokio::test(start_paused = true)]
async fn bare_sigil_with_no_visible_accounts_shows_no_match() {
    let directory = ScriptedSource::empty(SourceKind::Directory);
    let (search, _rx) = start(Some(viewer()), vec![directory]);

    search.type_text("@");
    let snapshot = settled(&search).await;

    assert!(snapshot.dropdown_visible);
    assert!(snapshot.suggestions.is_empty());
    assert_eq!(snapshot.panel, PanelState::NoMatch { hint: None });
}

#[tokio::test(start_paused = true)]
async fn bare_sigil_signed_out_requests_sign_in() {
    let directory = ScriptedSource::empty(SourceKind::Directory);
    let (search, mut rx) = start(None, vec![directory.clone()]);

    search.type_text("@");
    let snapshot = search
        .wait_for(|s| s.panel == PanelState::SignInRequired)
        .await
        .unwrap();
    sleep(Duration::from_secs(1)).await;

    assert!(!snapshot.dropdown_visible);
    assert!(directory.calls().is_empty());
    assert_eq!(drain(&mut rx), vec![SearchEvent::SignInRequested]);
}

#[tokio::test(start_paused = true)]
async fn programmatic_text_never_queries() {
    let addresses = ScriptedSource::empty(SourceKind::Address);
    let (search, _rx) = start(None, vec![addresses.clone()]);

    search.set_text("401 Hennepin Ave, Minneapolis");
    sleep(Duration::from_secs(2)).await;

    assert!(addresses.calls().is_empty());
    assert_eq!(search.snapshot().input, "401 Hennepin Ave, Minneapolis");
}

#[tokio::test(start_paused = true)]
async fn programmatic_text_cancels_pending_keystrokes() {
    let addresses = ScriptedSource::empty(SourceKind::Address);
    let (search, _rx) = start(None, vec![addresses.clone()]);

    search.type_text("hen");
    sleep(Duration::from_millis(100)).await;
    search.set_text("401 Hennepin Ave, Minneapolis");
    sleep(Duration::from_secs(2)).await;

    assert!(addresses.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn selection_routes_directory_entry_to_profile() {
    let directory = ScriptedSource::new(SourceKind::Directory, |_| {
        (Duration::ZERO, Ok(vec![entry("lakeloon"), entry("lakeside")]))
    });
    let (search, mut rx) = start(Some(viewer()), vec![directory]);

    search.type_text("@lake");
    settled(&search).await;
    search.key(NavKey::Down);
    search.key(NavKey::Down);
    search.key(NavKey::Enter);
    let after = search.wait_for(|s| s.input == "@lakeside").await.unwrap();

    assert!(!after.dropdown_visible);
    assert_eq!(
        drain(&mut rx),
        vec![SearchEvent::Navigate {
            path: "/profile/lakeside".to_string()
        }]
    );
}
