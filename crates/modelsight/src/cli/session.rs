use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use modelsight_fetch::{AssetCache, FetchOptions, HttpClient, ReqwestClient};
use modelsight_scene::{IntervalScheduler, SceneController, SceneObserver};
use modelsight_session::{
    HookRegistry, JsonFileStore, KeyValueStore, Phase, SessionController, SessionObserver,
    SessionOptions, SubmitOutcome,
};

use super::http_client;
use crate::config::Config;
use crate::headless::HeadlessRender;
use crate::scanner::TextScanner;
use crate::ui::console::ConsoleObserver;

#[derive(Args, Clone, Debug)]
pub struct SessionArg {
    /// Decoded code texts, scanned in order. Read line by line from stdin when omitted.
    texts: Vec<String>,

    /// Ignore input arriving within this many milliseconds of the last accepted scan
    #[arg(long, default_value_t = 0)]
    debounce_ms: u64,

    /// How long each rendered scene stays mounted, in milliseconds
    #[arg(long, default_value_t = 1000)]
    hold_ms: u64,

    /// Do not draw progress bars
    #[arg(long)]
    quiet: bool,
}

pub async fn session(arg: SessionArg, config: &Config) -> Result<()> {
    let texts = if arg.texts.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("failed to read payloads from stdin")?
    } else {
        arg.texts
    };

    let observer = Arc::new(if arg.quiet {
        ConsoleObserver::quiet()
    } else {
        ConsoleObserver::default()
    });
    let hooks: Arc<HookRegistry<dyn SceneObserver>> = Arc::new(HookRegistry::new());
    let hold = Duration::from_millis(arg.hold_ms);

    let mut scanner = TextScanner::new(Duration::from_millis(arg.debounce_ms));
    let mut session = open(config, &observer)?;
    for text in &texts {
        let Some(payload) = scanner.scan(text).await? else {
            tracing::debug!(%text, "input skipped");
            continue;
        };
        if session.state().phase == Phase::Error {
            session.rescan()?;
        }
        let outcome = session.submit(payload).await;
        if let SubmitOutcome::Ready(_) = outcome {
            render(&session, &hooks, config, hold).await?;
        } else if !matches!(outcome, SubmitOutcome::Rejected(_) | SubmitOutcome::Failed(_)) {
            tracing::warn!(?outcome, "payload not processed");
        }

        let state = session.state();
        println!("state\t{}\t{}", state.phase, state.error_count);

        // leaving the AR view ends the session; the next scan starts a new one
        if state.phase == Phase::Rendering {
            session.exit();
            session = open(config, &observer)?;
            scanner.reset();
        }
    }

    session.exit();
    Ok(())
}

fn open(
    config: &Config,
    observer: &Arc<ConsoleObserver>,
) -> Result<SessionController<ReqwestClient, JsonFileStore>> {
    let cache = AssetCache::new(http_client(config)?, &config.cache_dir);
    let options = SessionOptions::default()
        .validator(config.validator())
        .max_errors(config.max_errors)
        .fetch(FetchOptions::default().resume(config.resume));
    Ok(SessionController::new(
        cache,
        JsonFileStore::new(&config.store_path),
        options,
        Arc::clone(observer) as Arc<dyn SessionObserver>,
    ))
}

/// Mount the resolved model in a headless scene for `hold`.
async fn render<C, S>(
    session: &SessionController<C, S>,
    hooks: &Arc<HookRegistry<dyn SceneObserver>>,
    config: &Config,
    hold: Duration,
) -> Result<()>
where
    C: HttpClient + 'static,
    S: KeyValueStore + 'static,
{
    let source = session.begin_rendering()?;
    session.install_scene_hook(Arc::clone(hooks));
    let observer = hooks.get().unwrap_or_else(|| session.scene_observer());

    let stored_marker = session.persistence().marker_image()?;
    let (render, mut events) = HeadlessRender::new();
    let scene = SceneController::new(
        render,
        config.scene_config_with_marker(stored_marker),
        Arc::new(IntervalScheduler::default()),
        observer,
    );
    if let Err(e) = scene.mount(source) {
        tracing::warn!(error = %e, "mount failed");
    }

    let deadline = tokio::time::sleep(hold);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            Some(event) = events.recv() => scene.handle_event(event),
            () = &mut deadline => break,
        }
    }

    let state = scene.state();
    scene.teardown();
    let log = scene.render().log();
    println!(
        "render\tloaded={}\tmaterials={}\tanimations={}\tyaw={:.1}\tmarker={}",
        state.geometry_loaded,
        log.materials.len(),
        log.animations.len(),
        state.rotation.y,
        log.target.as_deref().unwrap_or("-"),
    );
    Ok(())
}
