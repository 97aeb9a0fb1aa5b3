//! 骨骼节点 - 参考 nphysics MultibodyLink 设计
//!
//! BoneLink 是骨骼系统的核心单元，类似于 nphysics 的 MultibodyLink。
//! 每个 BoneLink 代表骨骼层次中的一个关节。

use glam::{Mat4, Vec3};

use super::{euler_degrees_to_quat, BoneId};

// ============================================================================
// 骨骼节点
// ============================================================================

/// 骨骼节点 - 类似 nphysics MultibodyLink
///
/// 设计原则（参考 nphysics）：
/// - 静态数据：骨骼的固有属性（名称、父子关系、末端点等）
/// - 动态数据：每帧更新的旋转与变换状态
/// - 变换计算：local_to_world = parent.local_to_world * local_to_parent
#[derive(Clone, Debug)]
pub struct BoneLink {
    // ========================================
    // 静态数据（初始化后不变）
    // ========================================

    /// 骨骼名称
    pub name: String,

    /// 骨骼内部索引
    pub(crate) internal_id: BoneId,

    /// 父骨骼索引 (None 表示根骨骼)
    pub parent: Option<BoneId>,

    /// 初始位置（世界空间）
    pub initial_position: Vec3,

    /// 相对于父骨骼的偏移（在 build 时计算）
    /// 类似 nphysics 的 body_shift
    pub body_shift: Vec3,

    /// 末端点（本地空间偏移）
    pub end_effector: Vec3,

    // ========================================
    // 动态数据（每帧更新）
    // ========================================

    /// 相对父骨骼的旋转（欧拉角，度）
    pub rotation: Vec3,

    /// 本地变换矩阵 (local_to_parent)
    pub local_to_parent: Mat4,

    /// 全局变换矩阵 (local_to_world)
    pub local_to_world: Mat4,
}

impl BoneLink {
    /// 创建新骨骼
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            internal_id: 0,
            parent: None,
            initial_position: Vec3::ZERO,
            body_shift: Vec3::ZERO,
            end_effector: Vec3::ZERO,
            rotation: Vec3::ZERO,
            local_to_parent: Mat4::IDENTITY,
            local_to_world: Mat4::IDENTITY,
        }
    }

    /// 指定父骨骼
    pub fn with_parent(mut self, parent: BoneId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// 指定初始位置（世界空间）
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.initial_position = position;
        self
    }

    /// 指定末端点偏移
    pub fn with_end_effector(mut self, offset: Vec3) -> Self {
        self.end_effector = offset;
        self
    }

    /// 指定初始旋转（欧拉角，度）
    pub fn with_rotation(mut self, angles: Vec3) -> Self {
        self.rotation = angles;
        self
    }

    // ========================================
    // 访问器
    // ========================================

    /// 骨骼索引
    #[inline]
    pub fn link_id(&self) -> BoneId {
        self.internal_id
    }

    /// 获取世界位置
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.local_to_world.col(3).truncate()
    }

    /// 末端点世界位置
    #[inline]
    pub fn end_effector_position(&self) -> Vec3 {
        self.local_to_world.transform_point3(self.end_effector)
    }

    // ========================================
    // 变换计算
    // ========================================

    /// 计算本地变换 (local_to_parent)
    ///
    /// 平移 = body_shift，旋转 = 欧拉角 rotation
    pub fn compute_local_transform(&mut self) {
        let rotation = euler_degrees_to_quat(self.rotation);
        self.local_to_parent = Mat4::from_rotation_translation(rotation, self.body_shift);
    }

    /// 由父骨骼的全局变换计算全局变换
    #[inline]
    pub fn compute_global_transform(&mut self, parent_to_world: Mat4) {
        self.local_to_world = parent_to_world * self.local_to_parent;
    }
}

impl Default for BoneLink {
    fn default() -> Self {
        Self::new(String::new())
    }
}
