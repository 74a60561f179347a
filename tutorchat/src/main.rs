//! `TutorChat` — chat synchronization engine demo.
//!
//! Drives the engine against the in-memory backend: loads the room
//! directory, opens a room, sends a message and reconciles its echo, then
//! demonstrates the rollback path for a failed send.
//!
//! ```bash
//! cargo run --bin tutorchat
//! cargo run --bin tutorchat -- --viewer learner@example.com --log-level debug
//! ```

use std::path::Path;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use tutorchat::backend::in_memory::InMemoryBackend;
use tutorchat::config::{CliArgs, SyncConfig};
use tutorchat::widget::ChatWidget;
use tutorchat_types::{Email, Message, Profile, Timestamp};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();

    let config = match SyncConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            SyncConfig::default()
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::info!("tutorchat demo starting");

    let viewer = Email::new(&cli.viewer);
    let (backend, mut push_rx) = InMemoryBackend::new(config.push_buffer);
    seed(&backend, &viewer);

    let (widget, mut events) = ChatWidget::new(
        viewer.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        config,
    );

    widget.refresh().await?;
    println!("Signed in as {viewer}\n");
    print_summaries(&widget).await;

    let Some(room_id) = widget.directory().await.first().map(|room| room.id) else {
        println!("No rooms for this viewer.");
        return Ok(());
    };

    widget.open_room(room_id).await?;
    println!("\nOpened room {room_id}:");
    print_conversation(&widget, room_id).await;

    widget.set_compose(room_id, "Thanks, that session helped a lot!").await;
    widget.send_message(room_id).await?;
    widget.drain_push(&mut push_rx).await;
    println!("\nAfter sending and reconciling the echo:");
    print_conversation(&widget, room_id).await;

    // Failed send: the placeholder is rolled back and the draft restored.
    backend.set_fail_sends(true);
    widget.set_compose(room_id, "This one will not make it").await;
    if widget.send_message(room_id).await.is_err() {
        let draft = widget.compose_text(room_id).await;
        println!("\nSend failed; draft restored to: {draft:?}");
        print_conversation(&widget, room_id).await;
    }

    while let Ok(event) = events.try_recv() {
        tracing::debug!(?event, "widget event");
    }

    tracing::info!("tutorchat demo exiting");
    Ok(())
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure
/// all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("tutorchat.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

fn seed(backend: &InMemoryBackend, viewer: &Email) {
    let tutor_math = Email::new("maria.garcia@example.com");
    let tutor_piano = Email::new("li_wei@example.com");
    backend.add_profile(
        tutor_math.clone(),
        Profile {
            display_name: "Maria Garcia".into(),
            avatar_url: Some("https://cdn.example.com/avatars/maria.png".into()),
        },
    );

    let hour = 60 * 60 * 1000;
    let now = Timestamp::now().as_millis();

    let math = backend.add_room(viewer.clone(), tutor_math.clone());
    backend.seed_message(
        math,
        viewer,
        "Could we review derivatives tomorrow?",
        Timestamp::from_millis(now.saturating_sub(2 * hour)),
        true,
    );
    backend.seed_message(
        math,
        &tutor_math,
        "Of course! Bring the problem set.",
        Timestamp::from_millis(now.saturating_sub(hour)),
        false,
    );

    let piano = backend.add_room(viewer.clone(), tutor_piano.clone());
    backend.seed_message(
        piano,
        &tutor_piano,
        "Nice progress on the etude this week.",
        Timestamp::from_millis(now.saturating_sub(3 * hour)),
        false,
    );
}

async fn print_summaries<R, P, C>(widget: &ChatWidget<R, P, C>)
where
    R: tutorchat::backend::RoomService,
    P: tutorchat::backend::ProfileService,
    C: tutorchat::backend::PushChannel,
{
    println!("Rooms:");
    for (room, summary) in widget
        .directory()
        .await
        .iter()
        .zip(widget.room_summaries().await)
    {
        let name = match room.counterpart_of(widget.viewer()) {
            Some(other) => widget.profile(other).await.display_name,
            None => "?".to_string(),
        };
        let badge = if summary.unread { " *" } else { "" };
        let preview = summary
            .last_message
            .map_or_else(|| "(no messages)".to_string(), |m| preview_line(&m));
        println!("  [{}] {name}{badge}: {preview}", room.id);
    }
}

async fn print_conversation<R, P, C>(
    widget: &ChatWidget<R, P, C>,
    room_id: tutorchat_types::RoomId,
) where
    R: tutorchat::backend::RoomService,
    P: tutorchat::backend::ProfileService,
    C: tutorchat::backend::PushChannel,
{
    for message in widget.conversation(room_id).await {
        let when = format_timestamp_ms(message.sent_at.as_millis());
        let who = if message.sender == *widget.viewer() {
            "You".to_string()
        } else {
            widget.profile(&message.sender).await.display_name
        };
        let pending = if message.id.is_local() { " (sending)" } else { "" };
        println!("  {when} {who}: {}{pending}", message.text);
    }
}

fn preview_line(message: &Message) -> String {
    let when = format_timestamp_ms(message.sent_at.as_millis());
    format!("{} ({when})", message.text)
}

/// Format an epoch-millisecond timestamp as "HH:MM".
fn format_timestamp_ms(ms: u64) -> String {
    use chrono::{Local, TimeZone};
    let secs = (ms / 1000).cast_signed();
    let nsecs = u32::try_from((ms % 1000) * 1_000_000).unwrap_or(0);
    match Local.timestamp_opt(secs, nsecs) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M").to_string(),
        _ => "??:??".to_string(),
    }
}
