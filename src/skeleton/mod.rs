//! 骨骼系统 - 参考 nphysics Multibody 设计
//!
//! 核心设计思想：
//! - BoneLink: 类似 nphysics MultibodyLink，表示单个骨骼节点
//! - BoneSet: 类似 nphysics Multibody，管理骨骼层次结构
//! - KinematicChain: 从根骨骼到末端骨骼的有序骨骼序列

mod bone_link;
mod bone_set;
mod chain;

pub use bone_link::BoneLink;
pub use bone_set::BoneSet;
pub use chain::KinematicChain;

use glam::{EulerRot, Quat, Vec3};

// ============================================================================
// 公共类型定义
// ============================================================================

/// 骨骼标识（骨骼在层次结构中的索引，相等即为同一骨骼）
pub type BoneId = usize;

/// 欧拉角（度）转四元数
///
/// 旋转顺序：先绕 Z，再绕 X，最后绕 Y（R = Ry * Rx * Rz）
#[inline]
pub fn euler_degrees_to_quat(angles: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        angles.y.to_radians(),
        angles.x.to_radians(),
        angles.z.to_radians(),
    )
}

// ============================================================================
// 骨骼层次接口
// ============================================================================

/// 骨骼层次接口
///
/// 求解器每帧通过该接口读取和写入骨骼旋转。骨骼层次由外部持有，
/// 求解器只遍历和修改旋转，不修改拓扑。
///
/// 层次结构应当是无环的树；构建骨骼链时遇到已访问的骨骼会停止向下遍历。
pub trait BoneHierarchy {
    /// 骨骼数量
    fn bone_count(&self) -> usize;

    /// 父骨骼
    fn parent(&self, bone: BoneId) -> Option<BoneId>;

    /// 子骨骼（有序）
    fn children(&self, bone: BoneId) -> &[BoneId];

    /// 相对父骨骼的旋转（欧拉角，度）
    fn relative_rotation(&self, bone: BoneId) -> Vec3;

    /// 设置相对父骨骼的旋转，并重新计算该骨骼及其子孙的世界变换
    fn set_rotation(&mut self, bone: BoneId, angles: Vec3);

    /// 末端点世界位置
    fn end_effector_position(&self, bone: BoneId) -> Vec3;

    /// 骨骼索引是否有效
    #[inline]
    fn contains(&self, bone: BoneId) -> bool {
        bone < self.bone_count()
    }
}
