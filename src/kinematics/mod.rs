//! 运动学求值与求解
//!
//! - ForwardKinematics: 正向运动学，作为求解器的目标函数
//! - GradientDescentSolver: 有限差分梯度下降 IK 求解器
//! - SolverConfig: 求解器参数

mod config;
mod forward;
mod solver;

pub use config::{get_config, reset_config, set_config, SolverConfig};
pub use forward::{ForwardKinematics, INVALID_POSITION};
pub use solver::{
    estimate_gradient, FixedSign, GradientDescentSolver, RandomSign, SignSource, SweepReport,
};
