//! 运动学链运行时
//!
//! - skeleton: 骨骼节点、骨骼层次与运动学链
//! - kinematics: 正向运动学求值与梯度下降 IK 求解
//! - system: 每帧驱动循环

pub mod kinematics;
pub mod skeleton;
pub mod system;

pub use kinematics::{
    get_config, reset_config, set_config, FixedSign, ForwardKinematics, GradientDescentSolver,
    RandomSign, SignSource, SolverConfig, SweepReport, INVALID_POSITION,
};
pub use skeleton::{BoneHierarchy, BoneId, BoneLink, BoneSet, KinematicChain};
pub use system::{KinematicMode, KinematicSystem, SystemConfig, TickReport};

/// 运动学错误
#[derive(Debug, thiserror::Error)]
pub enum KinematicError {
    #[error("Angle sequence length mismatch: bones = {bones}, angles = {angles}")]
    LengthMismatch { bones: usize, angles: usize },

    #[error("Tip bone {tip} is not reachable from root bone {root}")]
    UnreachableTip { root: BoneId, tip: BoneId },

    #[error("Chain branches at bone {bone}; only a single root-to-tip path is supported")]
    BranchingChain { bone: BoneId },

    #[error("Invalid bone index: {0}")]
    InvalidBone(BoneId),

    #[error("Invalid solver parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, KinematicError>;
