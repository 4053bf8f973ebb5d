mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use modelsight_scene::{
    CapabilityEvent, GeometrySource, ManualScheduler, NoopSceneObserver, SceneConfig,
    SceneController,
};
use proptest::prelude::*;
use support::{Log, RecordingRender};

#[derive(Debug, Clone)]
enum Step {
    Start,
    End,
    Error,
    Wait(u64),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Start),
        Just(Step::End),
        Just(Step::Error),
        (0u64..1200).prop_map(Step::Wait),
    ]
}

fn run(steps: &[Step], settle_ms: u64) -> Vec<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(async {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let scene = SceneController::new(
            RecordingRender::with_log(Arc::clone(&log)),
            SceneConfig::default().settle_delay(Duration::from_millis(settle_ms)),
            Arc::new(ManualScheduler::new()),
            Arc::new(NoopSceneObserver),
        );
        scene.mount(GeometrySource::Bundled).unwrap();

        for step in steps {
            let (entry, event) = match step {
                Step::Start => ("start", CapabilityEvent::LoadStart),
                Step::End => ("end", CapabilityEvent::LoadEnd),
                Step::Error => ("error", CapabilityEvent::LoadError {
                    message: "boom".into(),
                }),
                Step::Wait(ms) => {
                    tokio::time::sleep(Duration::from_millis(*ms)).await;
                    continue;
                }
            };
            log.lock().unwrap().push(entry.into());
            scene.handle_event(event);
        }
        tokio::time::sleep(Duration::from_secs(60)).await;
        let entries = log.lock().unwrap().clone();
        entries
    })
}

proptest! {
    #[test]
    fn materials_only_follow_a_completed_load(
        steps in prop::collection::vec(step(), 0..24),
        settle_ms in prop::sample::select(vec![0u64, 1, 500, 1000]),
    ) {
        let log = run(&steps, settle_ms);

        let mut loaded = false;
        let mut registered_this_load = false;
        for entry in &log {
            match entry.as_str() {
                "load:bundled" | "start" => {
                    loaded = false;
                    registered_this_load = false;
                }
                "error" => loaded = false,
                "end" => loaded = true,
                "materials" => {
                    prop_assert!(loaded, "materials before completion: {:?}", log);
                    prop_assert!(!registered_this_load, "registered twice: {:?}", log);
                    registered_this_load = true;
                }
                _ => {}
            }
        }
    }

    #[test]
    fn completed_load_is_eventually_registered(
        steps in prop::collection::vec(step(), 0..24),
    ) {
        let mut steps = steps;
        steps.push(Step::Start);
        steps.push(Step::End);
        let log = run(&steps, 500);
        prop_assert_eq!(log.last().map(String::as_str), Some("animations"));
    }
}
