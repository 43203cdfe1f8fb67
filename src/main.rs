use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use topoview::channel::ChannelState;
use topoview::config::{ConfigError, ViewConfig};
use topoview::console::Command;
use topoview::headless::{HeadlessGlyphs, HeadlessKeys, HeadlessMaps, HeadlessPanels, HeadlessSurface};
use topoview::reconnect::Backoff;
use topoview::services::ViewContext;
use topoview::topo::ElementKind;
use topoview::transport::WsConnector;
use topoview::view::TopoView;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("stdin read failed: {0}")]
    Stdin(#[from] std::io::Error),
    #[error("event channel closed and reconnect is disabled")]
    ChannelClosed,
}

#[derive(Parser, Debug)]
#[command(name = "topoview", about = "Headless topology view driven by a live topology event stream")]
struct Cli {
    /// Topology event websocket endpoint.
    #[arg(long, env = "TOPO_SERVER_URL")]
    url: Option<String>,

    /// Background map id.
    #[arg(long, env = "TOPO_MAP")]
    map: Option<String>,

    #[arg(long)]
    zoom_min: Option<f64>,

    #[arg(long)]
    zoom_max: Option<f64>,

    /// Exit on the first transport failure instead of reconnecting.
    #[arg(long)]
    no_reconnect: bool,
}

impl Cli {
    fn view_config(&self) -> Result<ViewConfig, ConfigError> {
        let mut config = ViewConfig::from_env()?;
        if let Some(url) = &self.url {
            config.server_url.clone_from(url);
        }
        if let Some(map) = &self.map {
            config.map.clone_from(map);
        }
        if let Some(min) = self.zoom_min {
            config.zoom_min = min;
        }
        if let Some(max) = self.zoom_max {
            config.zoom_max = max;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to load .env"),
    }

    let cli = Cli::parse();
    let config = cli.view_config()?;
    info!(url = %config.server_url, map = %config.map, "starting topology view");

    let keys = Rc::new(RefCell::new(HeadlessKeys::default()));
    let ctx = ViewContext {
        surface: Rc::new(RefCell::new(HeadlessSurface::default())),
        keys: keys.clone(),
        glyphs: Rc::new(RefCell::new(HeadlessGlyphs::default())),
        maps: Rc::new(RefCell::new(HeadlessMaps::default())),
        panels: Rc::new(RefCell::new(HeadlessPanels::default())),
        connector: WsConnector::new(config.server_url.clone()),
    };
    let mut view = TopoView::activate(ctx, &config);

    let result = run(&mut view, &keys, &config, cli.no_reconnect).await;
    view.teardown();
    result
}

async fn run(
    view: &mut TopoView<WsConnector>,
    keys: &RefCell<HeadlessKeys>,
    config: &ViewConfig,
    no_reconnect: bool,
) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut backoff = Backoff::new(config.reconnect);
    let mut retry_at: Option<Instant> = None;
    let mut last_state = view.channel_state();

    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal?;
                info!("interrupted; shutting down");
                return Ok(());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed; shutting down");
                    return Ok(());
                };
                run_command(view, keys, &line);
            }
            state = view.channel_mut().next_event() => {
                if state == last_state {
                    continue;
                }
                match state {
                    ChannelState::Open => backoff.reset(),
                    ChannelState::Closed if no_reconnect => return Err(CliError::ChannelClosed),
                    ChannelState::Closed => {
                        let delay = backoff.next_delay();
                        warn!(
                            attempt = backoff.attempts(),
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "topo event channel down; scheduling reconnect"
                        );
                        retry_at = Some(Instant::now() + delay);
                    }
                    ChannelState::Connecting => {}
                }
                last_state = state;
            }
            () = sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                retry_at = None;
                view.recover();
                last_state = view.channel_state();
            }
        }
    }
}

fn run_command(view: &TopoView<WsConnector>, keys: &RefCell<HeadlessKeys>, line: &str) {
    match Command::parse(line) {
        Ok(None) => {}
        Ok(Some(Command::Key(key))) => {
            if !keys.borrow_mut().press(&key) {
                warn!(%key, "no binding for key");
            }
        }
        Ok(Some(Command::Gesture(gesture))) => {
            if !view.on_gesture(&gesture) {
                info!("gesture ignored; hold alt or meta");
            }
        }
        Ok(Some(Command::Status)) => log_status(view),
        Ok(Some(Command::Help)) => {
            for (key, description) in keys.borrow().describe() {
                info!(%key, %description, "key binding");
            }
        }
        Err(e) => warn!(error = %e, "bad command"),
    }
}

fn log_status(view: &TopoView<WsConnector>) {
    let t = view.transform();
    let model = view.model().borrow();
    let dispatch = view.dispatch();
    info!(
        state = ?view.channel_state(),
        last_error = ?view.channel().last_error().map(ToString::to_string),
        translate_x = t.translate_x,
        translate_y = t.translate_y,
        scale = t.scale,
        devices = model.count(ElementKind::Device),
        links = model.count(ElementKind::Link),
        hosts = model.count(ElementKind::Host),
        instances = model.count(ElementKind::Instance),
        revision = model.revision(),
        dispatched = dispatch.dispatched(),
        dropped = dispatch.dropped(),
        "status"
    );
}
