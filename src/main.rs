use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use credscan::barcode::{BarcodeSource, BarcodeSourceFactory, ReplayDetector, RqrrDecoder};
use credscan::camera::{load_frame, remember_camera, MediaSource, StillCamera};
use credscan::credential::{
    CredentialDecoder, DisabledHcertCodec, HcertCodec, RemoteHcertCodec, RemoteJwsVerifier,
};
use credscan::fetch::HttpFetcher;
use credscan::nats::{NatsClient, NatsNavigator, VerdictMessage};
use credscan::navigation::{LogNavigator, Navigator};
use credscan::pipeline::{DetectorFactory, MediaFactory};
use credscan::store::{JsonFileStore, SettingsStore};
use credscan::{create_router, AppState, Config, Pipeline, Verdict, Verifier};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "credscan", version, about = "QR credential scanner")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/credscan")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Run one scan session and print its verdict
    Scan {
        /// Payload script, one scanned text per line
        #[arg(long)]
        replay: Option<PathBuf>,
        /// Image of a QR code to decode in place of a camera
        #[arg(long, conflicts_with = "replay")]
        image: Option<PathBuf>,
        /// Page the verdict is delivered to
        #[arg(long)]
        result_page: Option<String>,
        /// Caller-type tag passed to the result page (default from config)
        #[arg(long)]
        caller_type: Option<String>,
    },
    /// Save or re-verify the user's own certificate
    Mine {
        /// HC1 text to verify and save
        #[arg(long)]
        save: Option<String>,
    },
    /// Remember the camera to open for future scans
    SelectCamera { device_id: String },
    /// Print verdicts published on NATS
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("credscan v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let store: Arc<dyn SettingsStore> =
        Arc::new(JsonFileStore::open(cfg.store.expanded_path()).await?);

    match cli.command {
        Command::Serve => serve(&cfg, store).await,
        Command::Scan {
            replay,
            image,
            result_page,
            caller_type,
        } => {
            let (replay, image) = match (replay, image) {
                (None, None) => (cfg.scan.replay_path.clone(), cfg.scan.image_path.clone()),
                given => given,
            };
            let pipeline = build_pipeline(&cfg, store, replay, image).await?;
            let page = result_page.unwrap_or_else(|| pipeline.default_result_page().to_string());
            let caller_type =
                caller_type.unwrap_or_else(|| pipeline.default_caller_type().to_string());

            let handle = pipeline.start_scan(&page, &caller_type).await?;
            let outcome = handle
                .wait_until(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Interrupted");
                })
                .await?;

            match outcome {
                Some(verdict) => print_verdict(&verdict),
                None => {
                    info!("Scan cancelled without a verdict");
                    Ok(())
                }
            }
        }
        Command::Mine { save } => {
            let verifier = build_verifier(&cfg, store)?;
            let verdict = match save {
                Some(text) => verifier.accept_own_certificate(text.trim()).await,
                None => verifier.verify_stored_certificate().await,
            };
            print_verdict(&verdict)
        }
        Command::SelectCamera { device_id } => remember_camera(store.as_ref(), &device_id).await,
        Command::Watch => watch(&cfg).await,
    }
}

async fn serve(cfg: &Config, store: Arc<dyn SettingsStore>) -> Result<()> {
    let pipeline = build_pipeline(
        cfg,
        store,
        cfg.scan.replay_path.clone(),
        cfg.scan.image_path.clone(),
    )
    .await?;
    let app = create_router(
        AppState::new(pipeline).with_retention(cfg.service.http.session_retention()),
    );

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")
}

async fn watch(cfg: &Config) -> Result<()> {
    let url = cfg
        .nats
        .url
        .as_deref()
        .context("nats.url must be set to watch verdicts")?;

    let client = NatsClient::connect(url).await?;
    let mut verdicts = client.subscribe_verdicts().await?;

    while let Some(message) = verdicts.next().await {
        match serde_json::from_slice::<VerdictMessage>(&message.payload) {
            Ok(verdict) => println!("{}", serde_json::to_string(&verdict)?),
            Err(e) => warn!("Ignoring malformed verdict on {}: {}", message.subject, e),
        }
    }

    Ok(())
}

fn build_verifier(cfg: &Config, store: Arc<dyn SettingsStore>) -> Result<Verifier> {
    let timeout = cfg.scan.fetch_timeout();

    let hcert: Arc<dyn HcertCodec> = match &cfg.verifier.hcert_endpoint {
        Some(endpoint) => Arc::new(RemoteHcertCodec::new(endpoint, timeout)?),
        None => {
            warn!("No HC1 decoder configured, health certificates will be rejected");
            Arc::new(DisabledHcertCodec)
        }
    };

    let mut decoder = CredentialDecoder::new(hcert);
    if let Some(endpoint) = &cfg.verifier.jws_endpoint {
        decoder = decoder.with_jws_verifier(Arc::new(RemoteJwsVerifier::new(endpoint, timeout)?));
    }

    Ok(Verifier::new(
        decoder,
        Arc::new(cfg.rules.standard_rules()),
        Arc::new(HttpFetcher::new(timeout)?),
        store,
    )
    .with_rewrite_rule(cfg.issuer.clone())
    .with_max_fetch_hops(cfg.scan.max_fetch_hops))
}

async fn build_pipeline(
    cfg: &Config,
    store: Arc<dyn SettingsStore>,
    replay: Option<PathBuf>,
    image: Option<PathBuf>,
) -> Result<Pipeline> {
    let verifier = Arc::new(build_verifier(cfg, store)?);

    let navigator: Arc<dyn Navigator> = match &cfg.nats.url {
        Some(url) => Arc::new(NatsNavigator::new(NatsClient::connect(url).await?)),
        None => Arc::new(LogNavigator),
    };

    let media: MediaFactory = match image {
        Some(path) => {
            let frame = load_frame(&path)?;
            Arc::new(move || {
                let camera = StillCamera::with_frame(frame.clone(), StillCamera::FRAME_INTERVAL);
                Ok(Box::new(camera) as Box<dyn MediaSource>)
            })
        }
        None => {
            if replay.is_none() {
                warn!("No image or replay script configured, scans will not find any code");
            }
            Arc::new(|| Ok(Box::new(StillCamera::default()) as Box<dyn MediaSource>))
        }
    };

    let detector: DetectorFactory = match replay {
        Some(path) => Arc::new(move || {
            Ok(Box::new(ReplayDetector::from_file(&path)?) as Box<dyn BarcodeSource>)
        }),
        None => Arc::new(|| Ok(BarcodeSourceFactory::create(None, Arc::new(RqrrDecoder)))),
    };

    Ok(Pipeline::new(verifier, navigator, media, detector)
        .with_detection_interval(cfg.scan.detection_interval())
        .with_default_result_page(cfg.scan.result_page.clone())
        .with_default_caller_type(cfg.scan.caller_type.clone()))
}

fn print_verdict(verdict: &Verdict) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(verdict)?);
    Ok(())
}
