//! Headless preview of a motion path.
//!
//! ```text
//! cargo run --example preview
//! RUST_LOG=motion_path=trace cargo run --example preview
//! ```
//!
//! Builds a small path, redistributes its timestamps by arc length, then
//! plays it back and prints positions and node callbacks.

use motion_path::animation::{AnimationPath, AnimatorSettings, PathAnimator};
use motion_path::geometry::WrapMode;
use motion_path::math::Point3;
use motion_path::operations::query::{CurvedLength, LinearLength};
use motion_path::tessellation::{SamplePath, SamplingParams};
use motion_path::Result;

fn main() -> Result<()> {
    // Default: WARN for everything, DEBUG for motion_path.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("motion_path=debug".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut path = AnimationPath::default();
    path.initialize();
    path.subscribe(|event| println!("event: {event:?}"));

    path.create_node(0.25, Point3::new(0.5, 1.0, 0.0))?;
    path.create_node(0.5, Point3::new(2.0, 1.5, 0.5))?;
    path.move_node_to_position(3, Point3::new(4.0, 0.0, 0.0))?;
    path.smooth_all_node_tangents()?;

    let params = SamplingParams::new(20.0)?;
    println!(
        "linear length {:.3}, curved length {:.3}",
        LinearLength::new().execute(path.path())?,
        CurvedLength::new(params).execute(path.path())?,
    );

    let distribution = path.distribute_timestamps(params)?;
    println!(
        "retimed {} nodes: {:?}",
        distribution.updated,
        path.node_timestamps()
    );

    let gizmo = SamplePath::new(params).execute(path.path())?;
    println!("gizmo polyline has {} points", gizmo.points.len());

    for node in 0..path.nodes_no() {
        path.register_node_event(node, |ctx| {
            println!("  reached node {} at t={:.3} {:?}", ctx.node, ctx.time, ctx.position);
        })?;
    }

    path.set_wrap_mode(WrapMode::PingPong);
    let mut animator = PathAnimator::new(AnimatorSettings::new(2.0)?);
    for _ in 0..12 {
        let position = animator.advance(0.4, &mut path)?;
        println!(
            "t={:.2} position=({:.3}, {:.3}, {:.3})",
            animator.path_time(&path),
            position.x,
            position.y,
            position.z
        );
    }

    path.dispose();
    Ok(())
}
