//! IK 演示 - 三节手臂逼近目标点
//!
//! 运行: RUST_LOG=info cargo run --features demo --bin ik_demo

use glam::Vec3;

use kinematic_engine::{
    BoneLink, BoneSet, KinematicMode, KinematicSystem, SolverConfig, SystemConfig,
};

const MAX_TICKS: usize = 20_000;
const LOG_INTERVAL: usize = 1_000;

fn build_arm() -> kinematic_engine::Result<BoneSet> {
    let mut bones = BoneSet::new();
    let shoulder = bones.add_bone(BoneLink::new("shoulder"));
    let elbow = bones.add_bone(
        BoneLink::new("elbow")
            .with_parent(shoulder)
            .with_position(Vec3::new(0.0, 1.0, 0.0)),
    );
    bones.add_bone(
        BoneLink::new("wrist")
            .with_parent(elbow)
            .with_position(Vec3::new(0.0, 2.0, 0.0))
            .with_end_effector(Vec3::new(0.0, 0.5, 0.0)),
    );
    bones.build()?;
    Ok(bones)
}

fn main() -> kinematic_engine::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut bones = build_arm()?;
    let root = bones.find_by_name("shoulder").unwrap_or(0);
    let tip = bones.find_by_name("wrist").unwrap_or(bones.len() - 1);
    let target = Vec3::new(1.5, 1.0, 0.5);

    kinematic_engine::set_config(SolverConfig {
        learning_rate: 20.0,
        seed: Some(2024),
        ..SolverConfig::default()
    });
    let config = SystemConfig::from_global(root, tip, KinematicMode::Inverse);
    let mut system = KinematicSystem::new(config)?;
    system.activate(&bones)?;

    for tick in 0..MAX_TICKS {
        let report = system.tick(&mut bones, target)?;
        if tick % LOG_INTERVAL == 0 {
            log::info!(
                "[Demo] 第 {} 帧: 末端 {:?}, 距离 {:.5}",
                tick,
                report.tip_position,
                report.distance
            );
        }
        if report.distance <= system.solver_config().threshold_distance {
            log::info!("[Demo] 第 {} 帧收敛, 距离 {:.5}", tick, report.distance);
            break;
        }
    }

    for bone in bones.bones() {
        log::info!("[Demo] {}: 旋转 {:?}", bone.name, bone.rotation);
    }
    Ok(())
}
