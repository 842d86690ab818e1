//! Cache views walking paginated listings.

mod support;

use std::sync::Arc;

use chrono::NaiveDate;
use rednit_core::testing::ScriptedTransport;
use rednit_core::{MatchCacheView, MatchPages, MessageCacheView, MessagePages};
use rednit_domain::{Cacheable, RednitError};

use support::{page_body, requester, BASE_URL};

fn ids<T: Cacheable>(items: &[T]) -> Vec<String> {
    items.iter().map(|item| item.cache_id().to_string()).collect()
}

fn match_view(transport: &Arc<ScriptedTransport>) -> MatchCacheView {
    MatchCacheView::new(requester(Arc::clone(transport)), MatchPages, 10)
}

fn message_view(transport: &Arc<ScriptedTransport>) -> MessageCacheView {
    MessageCacheView::new(requester(Arc::clone(transport)), MessagePages::new("m1"), 10)
}

#[test]
fn loads_three_pages_of_matches_in_order() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, page_body("matches", "m", 0, 10, Some("t1")))
            .respond(200, page_body("matches", "m", 10, 10, Some("t2")))
            .respond(200, page_body("matches", "m", 20, 10, None)),
    );
    let view = match_view(&transport);

    let matches = view.load_all().unwrap();

    assert_eq!(matches.len(), 30);
    assert_eq!(ids(&matches), (0..30).map(|n| format!("m{n}")).collect::<Vec<_>>());
    assert_eq!(
        transport.paths(BASE_URL),
        [
            "/v2/matches?count=10",
            "/v2/matches?count=10&page_token=t1",
            "/v2/matches?count=10&page_token=t2",
        ]
    );
    assert!(view.is_exhausted());
}

#[test]
fn newest_first_messages_end_up_chronological() {
    // m29 is the newest message; the provider starts with it.
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, descending_page(29, Some("t1")))
            .respond(200, descending_page(19, Some("t2")))
            .respond(200, descending_page(9, None)),
    );
    let view = message_view(&transport);

    let messages = view.load_all().unwrap();

    assert_eq!(ids(&messages), (0..30).map(|n| format!("x{n}")).collect::<Vec<_>>());
    assert_eq!(transport.paths(BASE_URL)[2], "/v2/matches/m1/messages?count=10&page_token=t2");
}

fn descending_page(newest: usize, token: Option<&str>) -> String {
    let items: Vec<_> = (newest - 9..=newest)
        .rev()
        .map(|n| serde_json::json!({ "_id": format!("x{n}"), "message": format!("text {n}") }))
        .collect();
    let mut data = serde_json::json!({ "messages": items });
    if let Some(token) = token {
        data["next_page_token"] = token.into();
    }
    serde_json::json!({ "data": data }).to_string()
}

#[test]
fn exhausted_listing_is_served_from_memory() {
    let transport = Arc::new(ScriptedTransport::new().respond(200, page_body("matches", "m", 0, 3, None)));
    let view = match_view(&transport);

    view.load_all().unwrap();
    let again = view.load_all().unwrap();

    assert_eq!(again.len(), 3);
    assert_eq!(transport.call_count(), 1);
}

#[test]
fn reload_starts_over() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, page_body("matches", "m", 0, 3, None))
            .respond(200, page_body("matches", "n", 0, 2, None)),
    );
    let view = match_view(&transport);

    view.load_all().unwrap();
    let reloaded = view.reload().unwrap();

    assert_eq!(ids(&reloaded), ["n0", "n1"]);
    assert_eq!(transport.call_count(), 2);
}

#[test]
fn lookup_hits_the_cache_before_the_network() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, page_body("matches", "m", 0, 3, None))
            .respond(200, r#"{"data":{"_id":"other","person":{"_id":"u9","name":"Bo"}}}"#),
    );
    let view = match_view(&transport);
    view.load_all().unwrap();

    let cached = view.get("m1").unwrap();
    assert!(cached.is_completed());
    assert_eq!(cached.complete().unwrap().id, "m1");
    assert_eq!(transport.call_count(), 1);

    let fetched = view.get("other").unwrap();
    assert!(!fetched.is_completed());
    assert_eq!(fetched.complete().unwrap().name(), Some("Bo"));
    assert_eq!(transport.call_count(), 2);
    assert_eq!(transport.paths(BASE_URL)[1], "/v2/matches/other");
}

#[test]
fn message_lookup_uses_single_message_route() {
    let transport = Arc::new(
        ScriptedTransport::new().respond(200, r#"{"_id":"x5","match_id":"m1","message":"hello"}"#),
    );
    let view = message_view(&transport);

    let message = view.get("x5").unwrap().complete().unwrap();

    assert_eq!(message.content, "hello");
    assert_eq!(transport.paths(BASE_URL), ["/message/x5"]);
}

#[test]
fn first_page_is_fetched_once() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, descending_page(19, Some("t1")))
            .respond(200, descending_page(9, None)),
    );
    let view = message_view(&transport);

    let first = view.first_page().unwrap();
    assert!(!first.is_completed());
    assert_eq!(first.complete().unwrap().len(), 10);

    let again = view.first_page().unwrap();
    assert!(again.is_completed());
    assert_eq!(transport.call_count(), 1);

    let all = view.load_all().unwrap();
    assert_eq!(all.len(), 20);
    assert_eq!(all[0].id, "x0");
    assert_eq!(transport.paths(BASE_URL)[1], "/v2/matches/m1/messages?count=10&page_token=t1");
}

#[test]
fn late_first_page_does_not_rewind_exhausted_listing() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, page_body("matches", "m", 0, 10, Some("t1")))
            .respond(200, page_body("matches", "m", 10, 10, None))
            .respond(200, page_body("matches", "m", 0, 10, Some("t1"))),
    );
    let view = match_view(&transport);

    let first = view.first_page().unwrap();
    assert_eq!(view.load_all().unwrap().len(), 20);
    assert!(view.is_exhausted());

    assert_eq!(first.complete().unwrap().len(), 20);
    assert!(view.is_exhausted());
    assert_eq!(view.cache().next_page_token(), None);

    assert_eq!(view.load_all().unwrap().len(), 20);
    assert_eq!(transport.call_count(), 3);
}

#[test]
fn failed_page_keeps_progress_and_resumes() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, page_body("matches", "m", 0, 10, Some("t1")))
            .respond(500, "server error")
            .respond(200, page_body("matches", "m", 10, 10, None)),
    );
    let view = match_view(&transport);

    let error = view.load_all().unwrap_err();
    assert_eq!(error.status(), Some(500));
    assert_eq!(view.items().len(), 10);

    let all = view.load_all().unwrap();
    assert_eq!(all.len(), 20);
    assert_eq!(transport.paths(BASE_URL)[2], "/v2/matches?count=10&page_token=t1");
}

#[test]
fn repeated_cursor_is_rejected() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, page_body("matches", "m", 0, 2, Some("same")))
            .respond(200, page_body("matches", "m", 2, 2, Some("same"))),
    );
    let view = match_view(&transport);

    assert!(matches!(view.load_all(), Err(RednitError::Parsing(_))));
    assert_eq!(transport.call_count(), 2);
}

#[test]
fn concurrent_bulk_load_is_rejected() {
    let transport = Arc::new(ScriptedTransport::new().always(200, page_body("matches", "m", 0, 1, None)));
    let view = match_view(&transport);

    let guard = view.cache().begin_load().unwrap();
    assert_eq!(view.load_all(), Err(RednitError::LoadInProgress));
    assert_eq!(view.reload(), Err(RednitError::LoadInProgress));
    drop(guard);

    assert_eq!(view.load_all().unwrap().len(), 1);
    assert_eq!(transport.call_count(), 1);
}

#[test]
fn matches_filter_by_name_and_age() {
    let body = r#"{"data":{"matches":[
        {"_id":"a","person":{"_id":"u1","name":"Ada","birth_date":"1995-06-15T00:00:00Z"}},
        {"_id":"b","person":{"_id":"u2","name":"Bo","birth_date":"2000-01-01T00:00:00Z"}},
        {"_id":"c","person":{"_id":"u3","name":"Ada","birth_date":"2000-03-01T00:00:00Z"}}
    ]}}"#;
    let transport = Arc::new(ScriptedTransport::new().respond(200, body));
    let view = match_view(&transport);
    view.load_all().unwrap();

    assert_eq!(ids(&view.by_name("Ada")), ["a", "c"]);
    let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    assert_eq!(ids(&view.by_age_on(24, today)), ["b"]);
    assert_eq!(ids(&view.by_age_on(28, today)), ["a"]);
}

