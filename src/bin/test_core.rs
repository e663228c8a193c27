use anyhow::{anyhow, Result};
use gesture_core::config::MIN_RECORDINGS_PER_GESTURE;
use gesture_core::engine::Engine;
use gesture_core::GestureCore;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
enum Motion {
    Still,
    Shake,
}

impl Motion {
    // Synthetic accelerometer reading at `t` ms
    fn sample(self, t: f64) -> Vec<f64> {
        match self {
            Motion::Still => vec![0.02, -0.01, 1.0],
            Motion::Shake => vec![2.0 * (t * 0.05).sin(), 1.5 * (t * 0.07).cos(), 1.0],
        }
    }
}

fn millis_since(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Push `motion` samples every 10 ms for `duration`
fn spawn_feeder(
    core: &GestureCore,
    motion: Motion,
    start: Instant,
    duration: Duration,
) -> tokio::task::JoinHandle<()> {
    let live = core.live_data().clone();
    tokio::spawn(async move {
        let until = Instant::now() + duration;
        let mut interval = tokio::time::interval(Duration::from_millis(10));
        while Instant::now() < until {
            interval.tick().await;
            let now = millis_since(start);
            if let Err(e) = live.put(motion.sample(now as f64), now) {
                println!("Failed to push sample: {}", e);
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("Initializing gesture core...");

    let core = GestureCore::new();

    // Shorter recordings keep the demo quick
    let mut params = HashMap::new();
    params.insert("recording_duration_ms".to_string(), 400.0);
    params.insert("required_confidence".to_string(), 0.6);
    core.configure(&params)?;

    let start = Instant::now();
    let still = core.create_gesture("still")?;
    let shake = core.create_gesture("shake")?;
    println!("Created gestures: {:?}", core.gestures().ids());
    println!("Using filters: {:?}", core.filters().types());

    let mut recording_id = 0;
    for (gesture, motion) in [(still, Motion::Still), (shake, Motion::Shake)] {
        for _ in 0..MIN_RECORDINGS_PER_GESTURE {
            recording_id += 1;
            let feeder = spawn_feeder(&core, motion, start, Duration::from_millis(450));
            let recording = core
                .record(gesture, recording_id)
                .await?
                .ok_or_else(|| anyhow!("recorder was busy"))?;
            feeder.await?;
            println!(
                "Recorded {:?}: {} samples, warnings {:?}",
                motion,
                recording.len(),
                recording.warnings()
            );
        }
    }

    core.train().await?;
    println!("Model trained: {:?}", core.model().status());

    spawn_feeder(&core, Motion::Shake, start, Duration::from_millis(600)).await?;

    let engine = core.engine().clone();
    println!("Engine running: {}", engine.is_running());
    match engine.tick(millis_since(start))? {
        Some(confidences) => println!("Computed confidences: {:?}", confidences),
        None => println!("Not enough data to predict"),
    }

    match core.best_prediction() {
        Some(prediction) => {
            let gesture = core.gestures().get(prediction.gesture_id)?;
            println!(
                "Predicted gesture: {} (confidence {:.2})",
                gesture.name(),
                prediction.confidence.confidence
            );
        }
        None => println!("No gesture is confident"),
    }

    engine.stop();
    println!("Engine stopped");
    Ok(())
}
