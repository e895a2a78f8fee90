use rollify::config::{AppConfig, HubKind};
use rollify::dice::{CreateDiceRollRequest, DiceService, RandomRoller};
use rollify::event::{
    BrokerHub, BrokerHubConfig, HistogramMetricsRecorder, LocalBroker, MeasuredNotifier,
    MeasuredSubscriber, MemoryHub, MetricsRecorder, Notifier, Subscriber,
};
use rollify::feed::FeedSession;
use rollify::model::DieType;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_ROOM: &str = "lobby";
const DEMO_USER: &str = "demo-user";

/// Notifier and Subscriber of one application replica
struct Replica {
    notifier: Arc<dyn Notifier>,
    subscriber: Arc<dyn Subscriber>,
}

impl Replica {
    fn measured(
        hub_kind: HubKind,
        recorder: &Arc<dyn MetricsRecorder>,
        notifier: Arc<dyn Notifier>,
        subscriber: Arc<dyn Subscriber>,
    ) -> Self {
        Self {
            notifier: Arc::new(MeasuredNotifier::new(
                hub_kind.as_ref(),
                recorder.clone(),
                notifier,
            )),
            subscriber: Arc::new(MeasuredSubscriber::new(
                hub_kind.as_ref(),
                recorder.clone(),
                subscriber,
            )),
        }
    }
}

/// Rolls dice in the demo room every `period` and logs the room feed until
/// `stop` resolves. Returns the number of feed rows seen.
async fn run_demo<F: Future>(
    stop: F,
    period: Duration,
    dice_service: &DiceService,
    feed: &mut FeedSession,
) -> usize {
    let mut ticker = tokio::time::interval(period);
    let mut rows = 0;
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => {
                info!("Shutdown requested");
                return rows;
            }
            _ = ticker.tick() => {
                let request = CreateDiceRollRequest {
                    room_id: DEMO_ROOM.to_string(),
                    user_id: DEMO_USER.to_string(),
                    dice: vec![DieType::D6, DieType::D6, DieType::D20],
                };
                if let Err(e) = dice_service.create_dice_roll(request).await {
                    error!(error = %e, "Could not create dice roll");
                }
            }
            Some(row) = feed.rows.recv() => {
                rows += 1;
                info!(room_id = DEMO_ROOM, row = %row, "New dice roll in room");
            }
            Some(dice_roll_id) = feed.notifications.recv() => {
                info!(room_id = DEMO_ROOM, dice_roll_id = %dice_roll_id, "New dice roll notification");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollify=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    info!(hub_kind = config.hub_kind.as_ref(), "Starting Rollify");

    let shutdown = CancellationToken::new();
    let recorder: Arc<dyn MetricsRecorder> = Arc::new(HistogramMetricsRecorder);
    let mut broker_hubs = Vec::new();
    let mut replicas = Vec::new();

    match config.hub_kind {
        HubKind::Memory => {
            let hub = Arc::new(MemoryHub::new());
            replicas.push(Replica::measured(
                config.hub_kind,
                &recorder,
                hub.clone(),
                hub,
            ));
        }
        HubKind::Broker => {
            // Every replica shares the same broker, like separate processes
            // would share an external one.
            let broker = Arc::new(LocalBroker::new());
            for _ in 0..config.replicas {
                let hub = Arc::new(
                    BrokerHub::new(
                        BrokerHubConfig::new(broker.clone(), shutdown.clone())
                            .with_topic(config.topic.clone())
                            .with_delivery_capacity(config.delivery_capacity),
                    )
                    .await?,
                );
                replicas.push(Replica::measured(
                    config.hub_kind,
                    &recorder,
                    hub.clone(),
                    hub.clone(),
                ));
                broker_hubs.push(hub);
            }
        }
    }

    // Rolls are created on the first replica and watched from the last one.
    let (Some(publisher), Some(viewer)) = (replicas.first(), replicas.last()) else {
        return Err("at least one replica is required".into());
    };
    info!(replicas = replicas.len(), "Event hubs ready");

    let dice_service = DiceService::new(
        Arc::new(RandomRoller),
        publisher.notifier.clone(),
        publisher.subscriber.clone(),
    );
    let mut feed = FeedSession::open(viewer.subscriber.clone(), DEMO_ROOM).await?;

    run_demo(
        tokio::signal::ctrl_c(),
        Duration::from_secs(1),
        &dice_service,
        &mut feed,
    )
    .await;

    feed.close().await?;
    shutdown.cancel();
    for hub in &broker_hubs {
        hub.shutdown().await;
    }

    info!("Rollify stopped");
    Ok(())
}
