use gravclog::engine::SceneConfig;
use tracing::info;

use crate::orbit_demo::OrbitDemo;

pub mod orbit_demo;

const DEFAULT_FRAMES: u32 = 600;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // orbit_demo [scene.json] [frames]
    let mut args = std::env::args().skip(1);
    let scene = args.next().map(SceneConfig::from_json_file).transpose()?;
    let frames = match args.next() {
        Some(frames) => frames.parse()?,
        None => DEFAULT_FRAMES,
    };

    let mut demo = OrbitDemo::new();
    demo.init(scene)?;

    let dt = 1.0 / 60.0;
    for _ in 0..frames {
        demo.update(dt);
    }

    info!(frames, "demo finished");
    demo.report();
    Ok(())
}
