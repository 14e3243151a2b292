mod common;

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use common::{FakeSite, Reply, ok, profile_page, test_config};
use rtanks_stats::{RtanksClient, StatsError};

fn client(site: &Arc<FakeSite>) -> Arc<RtanksClient<FakeSite>> {
    Arc::new(RtanksClient::with_transport(Arc::clone(site), &test_config()))
}

#[tokio::test(start_paused = true)]
async fn alice_record_is_normalized() {
    let site = Arc::new(FakeSite::new());
    site.route("/user/alice", vec![ok(profile_page("Alice", 150, 50))]);
    let client = client(&site);

    let alice = client.get_player_data("Alice").await.unwrap().unwrap();
    assert_eq!(alice.username, "Alice");
    assert_eq!(alice.clan.as_deref(), Some("Wolves"));
    assert!(alice.is_online);
    assert_eq!(alice.kills, 150);
    assert_eq!(alice.deaths, 50);
    assert_eq!(alice.kd_ratio, 3.0);
    assert_eq!(alice.rank, "Major");
    assert_eq!(alice.experience, 400_000);
    assert_eq!(alice.max_experience, Some(455_000));
    assert_eq!(alice.group, "No Group");
    assert_eq!(alice.equipment.turrets.len(), 2);
    assert_eq!(alice.equipment.equipped_turrets[0].as_str(), "smoky_m0");
    assert_eq!(alice.equipment.equipped_hulls[0].as_str(), "hunter_m2");
}

#[tokio::test(start_paused = true)]
async fn unknown_player_is_cached_as_not_found() {
    let site = Arc::new(FakeSite::new());
    site.route("/user/ghost_user", vec![Reply::Page(404, String::new())]);
    let client = client(&site);

    assert!(client.get_player_data("ghost_user").await.unwrap().is_none());
    assert!(client.get_player_data("ghost_user").await.unwrap().is_none());
    assert_eq!(site.calls("/user/ghost_user"), 1);

    let stats = client.stats().await;
    assert_eq!(stats.not_found, 1);
    assert_eq!(stats.negative_hits, 1);

    // not-found entries expire sooner than players
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(client.get_player_data("ghost_user").await.unwrap().is_none());
    assert_eq!(site.calls("/user/ghost_user"), 2);
}

#[tokio::test(start_paused = true)]
async fn error_page_without_profile_is_not_found() {
    let site = Arc::new(FakeSite::new());
    site.route(
        "/user/ghost_user",
        vec![ok("<html><body><h2>Игрок не найден</h2></body></html>")],
    );
    let client = client(&site);

    assert!(client.get_player_data("ghost_user").await.unwrap().is_none());
    assert!(client.get_player_data("ghost_user").await.unwrap().is_none());
    assert_eq!(site.calls("/user/ghost_user"), 1);
    assert_eq!(client.stats().await.parse_anomalies, 0);
}

#[tokio::test(start_paused = true)]
async fn profile_mentioning_not_found_text_is_still_found() {
    let site = Arc::new(FakeSite::new());
    let page = profile_page("Alice", 150, 50)
        .replace("</body>", "<div hidden>User not found</div></body>");
    site.route("/user/alice", vec![ok(page)]);
    let client = client(&site);

    let alice = client.get_player_data("Alice").await.unwrap().unwrap();
    assert_eq!(alice.username, "Alice");
    assert_eq!(alice.kd_ratio, 3.0);
    assert_eq!(client.stats().await.not_found, 0);
}

#[tokio::test(start_paused = true)]
async fn repeated_timeouts_surface_unavailable_and_are_not_cached() {
    let site = Arc::new(FakeSite::new());
    site.route("/user/bob", vec![Reply::Timeout]);
    let client = client(&site);

    let err = client.get_player_data("Bob").await.unwrap_err();
    assert!(matches!(err, StatsError::Unavailable { .. }));
    assert_eq!(site.calls("/user/bob"), 3);

    let stats = client.stats().await;
    assert_eq!(stats.cached_entries, 0);
    assert_eq!(stats.failures, 1);

    // a later call goes upstream again
    site.route("/user/bob", vec![ok(profile_page("Bob", 10, 0))]);
    let bob = client.get_player_data("bob").await.unwrap().unwrap();
    assert_eq!(bob.kd_ratio, 10.0);
    assert_eq!(site.calls("/user/bob"), 4);
}

#[tokio::test(start_paused = true)]
async fn concurrent_lookups_share_one_fetch() {
    let site = Arc::new(FakeSite::with_latency(Duration::from_millis(200)));
    site.route("/user/alice", vec![ok(profile_page("Alice", 150, 50))]);
    let client = client(&site);

    let lookups = (0..10).map(|i| {
        let client = Arc::clone(&client);
        let name = if i % 2 == 0 { "alice" } else { " ALICE " };
        tokio::spawn(async move { client.get_player_data(name).await })
    });
    let records: Vec<_> = join_all(lookups)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().unwrap())
        .collect();

    assert_eq!(site.calls("/user/alice"), 1);
    for record in &records[1..] {
        assert!(Arc::ptr_eq(&records[0], record));
    }

    let stats = client.stats().await;
    assert_eq!(stats.upstream_lookups, 1);
    assert_eq!(stats.collapsed_waiters, 9);
}

#[tokio::test(start_paused = true)]
async fn stale_entry_triggers_exactly_one_refresh() {
    let site = Arc::new(FakeSite::with_latency(Duration::from_millis(100)));
    site.route(
        "/user/alice",
        vec![
            ok(profile_page("Alice", 150, 50)),
            ok(profile_page("Alice", 300, 50)),
        ],
    );
    let client = client(&site);

    let first = client.get_player_data("alice").await.unwrap().unwrap();
    assert_eq!(first.kills, 150);

    tokio::time::sleep(Duration::from_secs(5 * 60 + 1)).await;

    let refreshed = join_all((0..5).map(|_| client.get_player_data("alice"))).await;
    assert_eq!(site.calls("/user/alice"), 2);
    for record in refreshed {
        assert_eq!(record.unwrap().unwrap().kills, 300);
    }
}

#[tokio::test(start_paused = true)]
async fn dropped_caller_does_not_cancel_the_fetch() {
    let site = Arc::new(FakeSite::with_latency(Duration::from_secs(1)));
    site.route("/user/alice", vec![ok(profile_page("Alice", 150, 50))]);
    let client = client(&site);

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), client.get_player_data("alice")).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(client.stats().await.cached_entries, 1);

    assert!(client.get_player_data("alice").await.unwrap().is_some());
    assert_eq!(site.calls("/user/alice"), 1);
}

#[tokio::test(start_paused = true)]
async fn markup_change_is_unavailable_and_retried_next_time() {
    let site = Arc::new(FakeSite::new());
    site.route(
        "/user/alice",
        vec![
            ok("<html><body><h1>Site redesign in progress</h1></body></html>"),
            ok(profile_page("Alice", 150, 50)),
        ],
    );
    let client = client(&site);

    let err = client.get_player_data("alice").await.unwrap_err();
    assert!(err.is_markup_change());
    assert_eq!(client.stats().await.parse_anomalies, 1);

    assert!(client.get_player_data("alice").await.unwrap().is_some());
    assert_eq!(site.calls("/user/alice"), 2);
}

#[tokio::test(start_paused = true)]
async fn compare_fetches_both_players() {
    let site = Arc::new(FakeSite::new());
    site.route("/user/alice", vec![ok(profile_page("Alice", 150, 50))]);
    site.route("/user/bob", vec![ok(profile_page("Bob", 20, 40))]);
    let client = client(&site);

    let (alice, bob) = client.compare_players("Alice", "Bob").await.unwrap();
    assert_eq!(alice.unwrap().kd_ratio, 3.0);
    assert_eq!(bob.unwrap().kd_ratio, 0.5);

    let (_, ghost) = client.compare_players("alice", "ghost").await.unwrap();
    assert!(ghost.is_none());

    let err = client.compare_players("Alice", " alice").await.unwrap_err();
    assert!(matches!(err, StatsError::InvalidRequest { .. }));
}

#[tokio::test]
async fn profile_url_is_encoded() {
    let site = Arc::new(FakeSite::new());
    let client = client(&site);
    assert_eq!(
        client.profile_url("Dark Knight").unwrap(),
        "https://ratings.ranked-rtanks.online/user/dark%20knight"
    );
}
