use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use ais_consumer::{
    counters::IngestCounters,
    error::{Result, error::FailedRequestSnafu},
    feed::{AisSource, FeedStream},
    settings::Settings,
    startup::App,
};
use async_trait::async_trait;
use cablewatch_core::{
    AisPosition, AisVessel, DashboardOutbound, Environment, LogLevel, Mmsi, StorageSettings,
};
use chrono::{DateTime, Utc};
use futures::{Future, TryStreamExt};
use memory::MemoryAdapter;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// One scripted session, handed out in order by [`ScriptedSource::connect`].
pub enum Script {
    Fail,
    Lines(Vec<String>),
    Live(mpsc::Receiver<std::io::Result<String>>),
}

pub struct ScriptedSource {
    scripts: Mutex<VecDeque<Script>>,
    connects: AtomicUsize,
}

pub struct Feed {
    out: mpsc::Sender<std::io::Result<String>>,
}

pub struct TestHelper {
    pub feed: Feed,
    pub adapter: MemoryAdapter,
    pub source: Arc<ScriptedSource>,
    pub counters: Arc<IngestCounters>,
    cancellation: CancellationToken,
    app: JoinHandle<Result<()>>,
}

pub fn test_settings() -> Settings {
    Settings {
        log_level: LogLevel::Debug,
        environment: Environment::Test,
        storage: StorageSettings::Memory,
        feed: None,
        commit_interval: Duration::from_millis(5),
        channel_buffer_size: 4,
        num_ingest_workers: 2,
        reconnect_delay: Duration::from_millis(10),
        max_reconnect_attempts: 3,
        max_line_length: 4096,
    }
}

pub async fn test<T, Fut>(test_closure: T)
where
    T: FnOnce(TestHelper) -> Fut,
    Fut: Future<Output = ()>,
{
    test_with_settings(test_settings(), test_closure).await
}

/// Runs the app over a single live session, the feed stays open until the closure
/// shuts the app down or drops the helper.
pub async fn test_with_settings<T, Fut>(settings: Settings, test_closure: T)
where
    T: FnOnce(TestHelper) -> Fut,
    Fut: Future<Output = ()>,
{
    let (sender, receiver) = mpsc::channel(100);
    let mut helper = TestHelper::spawn(&settings, vec![Script::Live(receiver)]);
    helper.feed = Feed { out: sender };

    test_closure(helper).await;
}

impl TestHelper {
    pub fn spawn(settings: &Settings, scripts: Vec<Script>) -> TestHelper {
        let adapter = MemoryAdapter::new();
        let source = Arc::new(ScriptedSource::new(scripts));

        let app = App::with_source(settings, Arc::new(adapter.clone()), source.clone());
        let counters = app.counters();

        let cancellation = CancellationToken::new();
        let app = tokio::spawn(app.run(cancellation.clone()));

        let (out, _) = mpsc::channel(1);

        TestHelper {
            feed: Feed { out },
            adapter,
            source,
            counters,
            cancellation,
            app,
        }
    }

    /// Cancels the app and waits for it to drain, storage stays readable afterwards.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.cancellation.cancel();
        self.finished().await
    }

    /// Waits for the app to stop on its own.
    pub async fn finished(&mut self) -> Result<()> {
        tokio::time::timeout(WAIT_TIMEOUT, &mut self.app)
            .await
            .expect("app did not stop in time")
            .unwrap()
    }

    /// Waits until the consumer has normalized `num` lines.
    pub async fn wait_for_received(&self, num: u64) {
        let counters = self.counters.clone();
        wait_until(move || counters.snapshot().received >= num).await;
    }

    pub async fn wait_for_connects(&self, num: usize) {
        let source = self.source.clone();
        wait_until(move || source.connects() >= num).await;
    }

    pub async fn wait_for_vessels(&self, num: usize) {
        tokio::time::timeout(WAIT_TIMEOUT, async {
            while self.vessels().await.len() < num {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("vessels were not stored in time");
    }

    pub async fn vessels(&self) -> Vec<AisVessel> {
        self.adapter.vessels().await.unwrap()
    }

    pub async fn vessel(&self, mmsi: Mmsi) -> AisVessel {
        self.adapter.vessel(mmsi).await.unwrap().unwrap()
    }

    pub async fn positions(&self, mmsi: Mmsi) -> Vec<AisPosition> {
        let vessel = self.vessel(mmsi).await;
        self.adapter.positions(vessel.vessel_id).await.unwrap()
    }
}

async fn wait_until(predicate: impl Fn() -> bool) {
    tokio::time::timeout(WAIT_TIMEOUT, async {
        while !predicate() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition was not reached in time");
}

impl ScriptedSource {
    pub fn new(scripts: Vec<Script>) -> ScriptedSource {
        ScriptedSource {
            scripts: Mutex::new(scripts.into()),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AisSource for ScriptedSource {
    async fn connect(&self) -> Result<FeedStream> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let script = self.scripts.lock().unwrap().pop_front();

        match script.unwrap_or(Script::Fail) {
            Script::Fail => FailedRequestSnafu {
                url: "http://feed.test/v1/stream",
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "unavailable",
            }
            .fail(),
            Script::Lines(lines) => {
                let mut body = lines.join("\n");
                if !body.is_empty() {
                    body.push('\n');
                }
                Ok(Box::new(std::io::Cursor::new(body.into_bytes())))
            }
            Script::Live(receiver) => {
                let stream = ReceiverStream::new(receiver).into_async_read();
                let compat = tokio_util::compat::FuturesAsyncReadCompatExt::compat(stream);
                Ok(Box::new(compat))
            }
        }
    }
}

impl Feed {
    pub async fn send(&self, message: &Value) {
        self.send_string(message.to_string()).await
    }

    pub async fn send_string(&self, mut val: String) {
        val.push('\n');
        self.out.send(Ok(val)).await.unwrap();
    }
}

pub fn position_message(mmsi: Mmsi, latitude: f64, longitude: f64, at: DateTime<Utc>) -> Value {
    json!({
        "MessageType": "PositionReport",
        "Message": {
            "PositionReport": {
                "Latitude": latitude,
                "Longitude": longitude,
                "Sog": 9.5,
                "Cog": 87.0,
                "TrueHeading": 86,
                "NavigationalStatus": 0,
                "UserID": mmsi.into_inner()
            }
        },
        "MetaData": {
            "MMSI": mmsi.into_inner(),
            "time_utc": at.to_rfc3339()
        }
    })
}

pub fn static_message(mmsi: Mmsi, name: Option<&str>, callsign: Option<&str>) -> Value {
    json!({
        "MessageType": "ShipStaticData",
        "Message": {
            "ShipStaticData": {
                "Name": name,
                "CallSign": callsign,
                "Type": 70,
                "Dimension": { "A": 120, "B": 30, "C": 10, "D": 12 },
                "UserID": mmsi.into_inner()
            }
        },
        "MetaData": {
            "MMSI": mmsi.into_inner()
        }
    })
}
