//! Sequencer pacing, failure and cancellation behaviour on a paused clock

mod helpers;

use std::time::Duration;

use helpers::{device, seconds_between, FixedDurations, RecordingDispatcher};
use mina_api::{ApiError, LoopMode, PlaybackCommand};
use mina_sdk::{ActiveDevice, Playlist, SdkError, Sequencer};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const TOLERANCE: f64 = 0.05;

fn kitchen() -> RecordingDispatcher {
    RecordingDispatcher::new(vec![device("dev-1", "Kitchen", false)])
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "expected ~{}s, got {}s",
        expected,
        actual
    );
}

#[tokio::test(start_paused = true)]
async fn test_two_tracks_are_paced_then_stopped() {
    let dispatcher = kitchen();
    let durations = FixedDurations::new([("a.mp3", 3.0), ("b.mp3", 5.0)]);
    let playlist = Playlist::from_urls(["a.mp3", "b.mp3"]);
    let start = Instant::now();

    let report = Sequencer::new(&dispatcher, &durations)
        .play_playlist("Kitchen", &playlist, false)
        .await
        .unwrap();

    let sent = dispatcher.sent();
    let commands: Vec<PlaybackCommand> = sent.iter().map(|s| s.command.clone()).collect();
    assert_eq!(
        commands,
        vec![
            PlaybackCommand::SetLoop(LoopMode::List),
            PlaybackCommand::play_url("a.mp3"),
            PlaybackCommand::play_url("b.mp3"),
            PlaybackCommand::stop(),
        ]
    );
    assert_close(seconds_between(start, sent[1].at), 0.0);
    assert_close(seconds_between(sent[1].at, sent[2].at), 3.0);
    assert_close(seconds_between(sent[2].at, sent[3].at), 5.0);
    assert!(sent.iter().all(|s| s.device == "dev-1"));

    assert_eq!(report.tracks[0].duration, Some(3.0));
    assert_eq!(report.tracks[1].duration, Some(5.0));
    assert_close(report.paced_seconds(), 8.0);
    assert_eq!(report.skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_total_pacing_is_sum_of_durations() {
    let dispatcher = kitchen();
    let entries = [("1.mp3", 1.5), ("2.mp3", 0.25), ("3.mp3", 2.0), ("4.mp3", 4.0)];
    let durations = FixedDurations::new(entries);
    let playlist = Playlist::from_urls(entries.iter().map(|(url, _)| *url));
    let start = Instant::now();

    Sequencer::new(&dispatcher, &durations)
        .play_playlist("dev-1", &playlist, false)
        .await
        .unwrap();

    let sent = dispatcher.sent();
    let stops: Vec<_> = sent
        .iter()
        .filter(|s| s.command == PlaybackCommand::stop())
        .collect();
    assert_eq!(stops.len(), 1);
    assert_close(seconds_between(start, stops[0].at), 7.75);
    assert_eq!(durations.probed(), vec!["1.mp3", "2.mp3", "3.mp3", "4.mp3"]);
}

#[tokio::test(start_paused = true)]
async fn test_probe_failure_advances_without_waiting() {
    let dispatcher = kitchen();
    let durations = FixedDurations::new([("b.mp3", 2.0)]);
    let playlist = Playlist::from_urls(["unknown.mp3", "b.mp3"]);
    let start = Instant::now();

    let report = Sequencer::new(&dispatcher, &durations)
        .play_playlist("Kitchen", &playlist, false)
        .await
        .unwrap();

    let sent = dispatcher.sent();
    assert_eq!(sent[2].command, PlaybackCommand::play_url("b.mp3"));
    assert_close(seconds_between(start, sent[2].at), 0.0);
    assert_eq!(sent[3].command, PlaybackCommand::stop());
    assert_close(seconds_between(start, sent[3].at), 2.0);

    assert_eq!(report.tracks[0].duration, None);
    assert_eq!(report.tracks.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_track_is_skipped() {
    let dispatcher = kitchen();
    dispatcher.reject("dev-1", PlaybackCommand::play_url("a.mp3"));
    let durations = FixedDurations::new([("a.mp3", 3.0), ("b.mp3", 1.0)]);
    let playlist = Playlist::from_urls(["a.mp3", "b.mp3"]);
    let start = Instant::now();

    let report = Sequencer::new(&dispatcher, &durations)
        .play_playlist("Kitchen", &playlist, false)
        .await
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.tracks.len(), 1);
    assert_eq!(durations.probed(), vec!["b.mp3"]);
    let sent = dispatcher.sent();
    assert_close(seconds_between(start, sent.last().unwrap().at), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_loop_mode_failure_does_not_stop_playback() {
    let dispatcher = kitchen();
    dispatcher.reject("dev-1", PlaybackCommand::SetLoop(LoopMode::List));
    let durations = FixedDurations::new([("a.mp3", 1.0)]);

    let report = Sequencer::new(&dispatcher, &durations)
        .play_playlist("Kitchen", &Playlist::from_urls(["a.mp3"]), false)
        .await
        .unwrap();

    assert_eq!(report.tracks.len(), 1);
    assert_eq!(dispatcher.commands().last(), Some(&PlaybackCommand::stop()));
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_aborts_playlist() {
    let dispatcher = kitchen();
    dispatcher.fail_when(|_, command| {
        (*command == PlaybackCommand::play_url("b.mp3"))
            .then(|| ApiError::Transport("connection reset".to_string()))
    });
    let durations = FixedDurations::new([("a.mp3", 1.0), ("b.mp3", 1.0), ("c.mp3", 1.0)]);
    let playlist = Playlist::from_urls(["a.mp3", "b.mp3", "c.mp3"]);

    let result = Sequencer::new(&dispatcher, &durations)
        .play_playlist("Kitchen", &playlist, false)
        .await;

    assert!(matches!(result, Err(SdkError::Api(ApiError::Transport(_)))));
    assert_eq!(
        dispatcher.commands(),
        vec![
            PlaybackCommand::SetLoop(LoopMode::List),
            PlaybackCommand::play_url("a.mp3"),
            PlaybackCommand::play_url("b.mp3"),
            PlaybackCommand::stop(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_auth_error_on_loop_still_stops_device() {
    let dispatcher = kitchen();
    dispatcher.fail_when(|_, command| {
        matches!(command, PlaybackCommand::PlayUrl { .. })
            .then(|| ApiError::AuthFailure("token expired".to_string()))
    });
    let durations = FixedDurations::default();
    let active = ActiveDevice::new();

    let result = Sequencer::new(&dispatcher, &durations)
        .with_active_device(active.clone())
        .play_loop("Kitchen", "a.mp3")
        .await;

    assert!(matches!(result, Err(SdkError::Api(ApiError::AuthFailure(_)))));
    assert_eq!(dispatcher.commands().last(), Some(&PlaybackCommand::stop()));
    assert!(active.get().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_active_device_once() {
    let dispatcher = kitchen();
    let durations = FixedDurations::new([("a.mp3", 3.0), ("b.mp3", 5.0)]);
    let playlist = Playlist::from_urls(["a.mp3", "b.mp3"]);
    let cancel = CancellationToken::new();
    let active = ActiveDevice::new();
    let start = Instant::now();

    let sequencer = Sequencer::new(&dispatcher, &durations)
        .with_cancellation(cancel.clone())
        .with_active_device(active.clone());

    let (result, _) = tokio::join!(sequencer.play_playlist("Kitchen", &playlist, false), async {
        tokio::time::sleep(Duration::from_secs(4)).await;
        cancel.cancel();
    });

    assert!(matches!(result, Err(SdkError::Cancelled)));

    let sent = dispatcher.sent();
    let last = sent.last().unwrap();
    assert_eq!(last.command, PlaybackCommand::stop());
    assert_close(seconds_between(start, last.at), 4.0);
    assert_eq!(
        sent.iter().filter(|s| s.command == PlaybackCommand::stop()).count(),
        1
    );

    // the interrupt already consumed the active device
    assert!(active.get().is_none());
    assert!(!active.interrupt(&dispatcher).await);
    assert_eq!(dispatcher.sent().len(), sent.len());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_start_sends_nothing() {
    let dispatcher = kitchen();
    let durations = FixedDurations::new([("a.mp3", 3.0)]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = Sequencer::new(&dispatcher, &durations)
        .with_cancellation(cancel)
        .play_playlist("Kitchen", &Playlist::from_urls(["a.mp3"]), false)
        .await;

    assert!(matches!(result, Err(SdkError::Cancelled)));
    assert!(dispatcher.sent().is_empty());
}

#[tokio::test]
async fn test_empty_playlist_is_rejected() {
    let dispatcher = kitchen();
    let durations = FixedDurations::default();

    let result = Sequencer::new(&dispatcher, &durations)
        .play_playlist("Kitchen", &Playlist::default(), false)
        .await;

    assert!(matches!(result, Err(SdkError::EmptyPlaylist)));
    assert!(dispatcher.sent().is_empty());
}

#[tokio::test]
async fn test_unknown_device_is_reported() {
    let dispatcher = kitchen();
    let durations = FixedDurations::default();

    let result = Sequencer::new(&dispatcher, &durations)
        .play_playlist("Garage", &Playlist::from_urls(["a.mp3"]), false)
        .await;

    match result {
        Err(SdkError::Api(ApiError::DeviceNotFound(id))) => assert_eq!(id, "Garage"),
        other => panic!("Expected DeviceNotFound, got {:?}", other),
    }
    assert!(dispatcher.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shuffled_run_plays_every_track_once() {
    let dispatcher = kitchen();
    let urls: Vec<String> = (0..12).map(|i| format!("{}.mp3", i)).collect();
    let durations = FixedDurations::new(urls.iter().map(|url| (url.as_str(), 1.0)));
    let playlist = Playlist::from_urls(urls.clone());

    Sequencer::new(&dispatcher, &durations)
        .play_playlist("Kitchen", &playlist, true)
        .await
        .unwrap();

    let mut played: Vec<String> = dispatcher
        .commands()
        .into_iter()
        .filter_map(|command| match command {
            PlaybackCommand::PlayUrl { url, .. } => Some(url),
            _ => None,
        })
        .collect();
    played.sort();
    let mut expected = urls;
    expected.sort();
    assert_eq!(played, expected);
    assert_eq!(playlist.urls().next(), Some("0.mp3"));
}

#[tokio::test]
async fn test_loop_command_uses_single_repeat() {
    let dispatcher = kitchen();
    let durations = FixedDurations::default();

    let device = Sequencer::new(&dispatcher, &durations)
        .play_loop("Kitchen", "song.mp3")
        .await
        .unwrap();

    assert_eq!(device.as_str(), "dev-1");
    assert_eq!(
        dispatcher.commands(),
        vec![
            PlaybackCommand::SetLoop(LoopMode::Single),
            PlaybackCommand::play_url("song.mp3"),
        ]
    );
    assert!(durations.probed().is_empty());
}
