use std::path::{Path, PathBuf};

use async_channel::{Receiver, Sender, bounded};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::watch;
use toast_store::clock::{Clock, TokioClock};
use toast_store::config::{Config, ToastDefaults};
use toast_store::error::{CommandError, ConfigError, Error as ToastError};
use toast_store::telemetry::init_tracing;
use toast_store::toast::ToastData;
use toast_store::{Result, Snapshot, ToastStore};
use tracing::{debug, info, warn};

use super::cli::Cli;
use super::command::Command;

const DEFAULT_CONFIG: &str = "toasts.toml";

type Line = std::result::Result<Command, CommandError>;

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.log_filter.as_deref(), cli.json_logs)?;

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(timeout) = cli.timeout {
        if timeout.is_zero() {
            return Err(ToastError::from(ConfigError::InvalidField {
                field: "cli.timeout",
                message: "value must be greater than zero".to_string(),
            }));
        }
        config.toast.timeout = timeout;
    }
    let drain = config.app.drain_on_eof && !cli.no_drain;

    let store = ToastStore::on_current_runtime()?;
    let printer = tokio::spawn(print_snapshots(store.subscribe()));

    let (tx, rx) = bounded(config.app.channel_bound);
    let reader = tokio::spawn(read_commands(tx));

    tokio::select! {
        biased;
        _ = signal::ctrl_c() => {
            info!("shutdown signal received, stopping");
        }
        () = drive(&store, &config.toast, &rx, drain) => {}
    }

    reader.abort();
    match reader.await {
        Ok(Err(err)) => warn!(error = %err, "input reader failed"),
        Err(err) if err.is_panic() => warn!(error = %err, "input reader panicked"),
        _ => {}
    }

    drop(store);
    if let Err(err) = printer.await {
        warn!(error = %err, "snapshot printer terminated unexpectedly");
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Config::from_env_and_file(PathBuf::from(DEFAULT_CONFIG));
    };
    // An explicitly requested file has to exist; the default one is optional.
    std::fs::metadata(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_env_and_file(path)
}

/// Applies commands until input ends, then optionally waits for the store to empty.
async fn drive(store: &ToastStore, defaults: &ToastDefaults, rx: &Receiver<Line>, drain: bool) {
    while let Ok(line) = rx.recv().await {
        match line {
            Ok(command) => apply(store, defaults, command),
            Err(err) => warn!(error = %err, "ignoring input line"),
        }
    }

    if drain && !store.is_empty() {
        info!(remaining = store.len(), "end of input, waiting for toasts to expire");
        drain_store(store).await;
    }
}

fn apply(store: &ToastStore, defaults: &ToastDefaults, command: Command) {
    debug!(?command, "applying command");
    match command {
        Command::Add(add) => store.add_toast(defaults.input(
            add.id,
            add.kind,
            add.position,
            add.timeout,
            ToastData::message(add.message),
        )),
        Command::Pause(id) => store.pause_toast(id),
        Command::Resume(id) => store.resume_toast(id),
        Command::Remove(id) => store.remove_toast(id),
        Command::List => println!("{}", listing(&store.snapshot(), &TokioClock)),
    }
}

/// Nobody can move the pointer off a toast once input is gone, so paused
/// toasts are resumed before waiting.
async fn drain_store(store: &ToastStore) {
    let mut updates = store.subscribe();
    for toast in store.snapshot().toasts().iter().filter(|t| t.is_paused()) {
        store.resume_toast(toast.id);
    }
    if updates.wait_for(Snapshot::is_empty).await.is_err() {
        warn!("store closed while draining");
    }
}

async fn read_commands(tx: Sender<Line>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if tx.send(line.parse::<Command>()).await.is_err() {
            break;
        }
    }
    debug!("end of input");
    tx.close();
    Ok(())
}

async fn print_snapshots(mut updates: watch::Receiver<Snapshot>) {
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        match serde_json::to_string(&snapshot) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "failed to encode snapshot"),
        }
    }
}

fn listing(snapshot: &Snapshot, clock: &dyn Clock) -> serde_json::Value {
    let now = clock.now();
    let toasts: Vec<_> = snapshot
        .toasts()
        .iter()
        .map(|toast| {
            let remaining_ms =
                u64::try_from(toast.remaining_at(now).as_millis()).unwrap_or(u64::MAX);
            json!({
                "id": toast.id,
                "type": toast.kind,
                "paused": toast.is_paused(),
                "remaining_ms": remaining_ms,
                "message": toast.data.message,
            })
        })
        .collect();
    json!({ "show": snapshot.show(), "toasts": toasts })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::{Line, apply, drive, listing};
    use crate::command::Command;
    use async_channel::bounded;
    use std::sync::Arc;
    use std::time::Duration;
    use toast_store::clock::ManualClock;
    use toast_store::config::Config;
    use toast_store::scheduler::ManualScheduler;
    use toast_store::{ToastId, ToastStore};

    fn manual_store() -> (ToastStore, Arc<ManualScheduler>, ManualClock) {
        let clock = ManualClock::new();
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));
        let store = ToastStore::new(Arc::new(clock.clone()), scheduler.clone());
        (store, scheduler, clock)
    }

    #[test]
    fn add_uses_configured_defaults() {
        let (store, scheduler, _) = manual_store();
        let defaults = Config::default().toast;
        apply(&store, &defaults, "add 1 hello there".parse().unwrap());

        let toast = store.get(ToastId(1)).expect("toast present");
        assert_eq!(toast.timeout, defaults.timeout);
        assert_eq!(toast.data.message, "hello there");

        scheduler.advance(defaults.timeout);
        assert!(store.is_empty());
    }

    #[test]
    fn listing_reports_live_remaining_time() {
        let (store, scheduler, clock) = manual_store();
        let defaults = Config::default().toast;
        apply(&store, &defaults, "add 1 4s first".parse().unwrap());
        apply(&store, &defaults, "add 2 4s second".parse().unwrap());
        scheduler.advance(Duration::from_secs(1));
        apply(&store, &defaults, Command::Pause(ToastId(2)));
        scheduler.advance(Duration::from_secs(1));

        let view = listing(&store.snapshot(), &clock);
        assert_eq!(view["show"], true);
        assert_eq!(view["toasts"][0]["remaining_ms"], 2_000);
        assert_eq!(view["toasts"][1]["remaining_ms"], 3_000);
        assert_eq!(view["toasts"][1]["paused"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn drive_drains_paused_toasts_after_input_ends() {
        let store = ToastStore::on_current_runtime().unwrap();
        let defaults = Config::default().toast;
        let (tx, rx) = bounded::<Line>(4);
        tx.send("add 1 2s hello".parse()).await.unwrap();
        tx.send("pause 1".parse()).await.unwrap();
        tx.send("bogus".parse()).await.unwrap();
        tx.close();

        drive(&store, &defaults, &rx, true).await;
        assert!(store.is_empty());
    }
}
