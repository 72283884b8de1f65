//! Herald - Telegram notification gateway for examination results

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herald::{
    config::{Args, WatchMode},
    db::MongoClient,
    dispatch::Dispatcher,
    handler::RegistrationHandler,
    notifier::Notifier,
    roster::Roster,
    store::{
        spawn_result_feed, MongoResultStore, MongoStudentDirectory, ResultStore,
        SnapshotDirectory, SnapshotStore, StudentDirectory,
    },
    transport::{InboundMessage, TelegramTransport, TelegramTransportConfig, Transport},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("herald={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Herald - Exam Result Notifier");
    info!("======================================");
    info!("Watch mode: {:?}", args.watch_mode);
    info!("Poll interval: {}s", args.poll_interval_secs);
    match &args.snapshot_file {
        Some(path) => info!("Result store: snapshot file {}", path),
        None => info!("Result store: MongoDB {} (db: {})", args.mongodb_uri, args.mongodb_db),
    }
    match &args.directory_snapshot_file {
        Some(path) => info!("Student directory: snapshot file {}", path),
        None => info!("Student directory: MongoDB"),
    }
    info!("======================================");

    // MongoDB is needed unless both datasets come from snapshot files
    let needs_mongo = args.snapshot_file.is_none() || args.directory_snapshot_file.is_none();
    let mongo = if needs_mongo {
        match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(client) => Some(client),
            Err(e) => {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    // Result store: snapshot file or the `results` collection
    let mut mongo_store: Option<MongoResultStore> = None;
    let store: Arc<dyn ResultStore> = match &args.snapshot_file {
        Some(path) => Arc::new(SnapshotStore::new(path)),
        None => {
            let client = mongo
                .as_ref()
                .expect("MongoDB is connected when results come from MongoDB");
            match MongoResultStore::new(client).await {
                Ok(s) => {
                    mongo_store = Some(s.clone());
                    Arc::new(s)
                }
                Err(e) => {
                    error!("Failed to initialize result store: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    // Student directory: snapshot file or the `students` collection
    let directory: Arc<dyn StudentDirectory> = match &args.directory_snapshot_file {
        Some(path) => Arc::new(SnapshotDirectory::new(path)),
        None => {
            let client = mongo
                .as_ref()
                .expect("MongoDB is connected when the directory comes from MongoDB");
            match MongoStudentDirectory::new(client).await {
                Ok(d) => Arc::new(d),
                Err(e) => {
                    error!("Failed to initialize student directory: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    // Transport, roster, and the shared dispatcher
    let transport = Arc::new(TelegramTransport::new(TelegramTransportConfig {
        bot_token: args.bot_token().to_string(),
        api_url: args.telegram_api_url.clone(),
        updates_timeout_secs: args.updates_timeout_secs,
    }));
    let roster = Arc::new(Roster::new());
    let notifier = Notifier::new(transport.clone() as Arc<dyn Transport>);
    let dispatcher = Dispatcher::new(Arc::clone(&roster), notifier);
    let handler = RegistrationHandler::new(directory, Arc::clone(&store), dispatcher.clone());

    // Shutdown signal shared by every background loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        });
    }

    // Start the change watcher for the configured strategy
    let watcher_handle = match args.watch_mode {
        WatchMode::Poll => herald::watcher::spawn_poll_watcher(
            Arc::clone(&store),
            dispatcher.clone(),
            Duration::from_secs(args.poll_interval_secs),
            shutdown_rx.clone(),
        ),
        WatchMode::Feed => {
            let mongo_store = mongo_store
                .clone()
                .expect("validate() guarantees MongoDB results in feed mode");
            let (changes_tx, changes_rx) = mpsc::channel(args.feed_channel_capacity);
            let _feed_handle = spawn_result_feed(mongo_store, changes_tx, shutdown_rx.clone());
            herald::watcher::spawn_feed_watcher(changes_rx, dispatcher.clone(), shutdown_rx.clone())
        }
    };

    // Inbound update loop: Telegram long poll feeding the handler
    let (inbound_tx, mut inbound_rx) = mpsc::channel::<InboundMessage>(256);
    let updates_handle = {
        let transport = Arc::clone(&transport);
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            transport.run_updates(inbound_tx, shutdown_rx).await;
        })
    };

    info!("Herald is running");

    let mut shutdown_rx = shutdown_rx;
    loop {
        let inbound = tokio::select! {
            msg = inbound_rx.recv() => msg,
            _ = shutdown_rx.changed() => break,
        };

        let Some(inbound) = inbound else {
            warn!("Inbound channel closed");
            break;
        };

        let outcome = match handler.handle(inbound.chat, &inbound.text).await {
            Ok(o) => o,
            Err(e) => {
                warn!(chat = inbound.chat, "Failed to handle message: {}", e);
                continue;
            }
        };

        if let Some(reply) = outcome.reply_text() {
            if let Err(e) = transport.send_text(inbound.chat, &reply).await {
                warn!(chat = inbound.chat, "Failed to send reply: {}", e);
            }
        }
    }

    info!(
        "Shutting down ({} subscribers, {} delivered)",
        roster.subscriber_count().await,
        roster.delivered_count().await
    );

    let _ = shutdown_tx.send(true);
    let _ = watcher_handle.await;
    let _ = updates_handle.await;

    Ok(())
}
