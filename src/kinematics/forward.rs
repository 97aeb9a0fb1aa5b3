//! 正向运动学
//!
//! 按根到末端的顺序把角度写入骨骼，返回末端点的世界位置。
//! 求值会修改骨骼的实时旋转。

use glam::Vec3;

use crate::skeleton::{BoneHierarchy, KinematicChain};
use crate::{KinematicError, Result};

/// 长度不匹配时返回的哨兵位置（原点），调用方不能把它当作真实结果
pub const INVALID_POSITION: Vec3 = Vec3::ZERO;

/// 正向运动学求值器
pub struct ForwardKinematics;

impl ForwardKinematics {
    /// 求值，长度不匹配时返回错误且不修改任何骨骼
    pub fn try_evaluate<H: BoneHierarchy + ?Sized>(
        hierarchy: &mut H,
        chain: &KinematicChain,
        angles: &[Vec3],
    ) -> Result<Vec3> {
        if angles.len() != chain.len() {
            return Err(KinematicError::LengthMismatch {
                bones: chain.len(),
                angles: angles.len(),
            });
        }

        // 父骨骼先于子骨骼更新
        for (&bone, &angle) in chain.bones().iter().zip(angles) {
            hierarchy.set_rotation(bone, angle);
        }

        Ok(hierarchy.end_effector_position(chain.tip()))
    }

    /// 求值，长度不匹配时记录日志并返回 [`INVALID_POSITION`]
    pub fn evaluate<H: BoneHierarchy + ?Sized>(
        hierarchy: &mut H,
        chain: &KinematicChain,
        angles: &[Vec3],
    ) -> Vec3 {
        match Self::try_evaluate(hierarchy, chain, angles) {
            Ok(position) => position,
            Err(e) => {
                log::warn!("[FK] {}", e);
                INVALID_POSITION
            }
        }
    }

    /// 末端点到目标的距离
    pub fn distance_from_target<H: BoneHierarchy + ?Sized>(
        hierarchy: &mut H,
        chain: &KinematicChain,
        angles: &[Vec3],
        target: Vec3,
    ) -> Result<f32> {
        let tip = Self::try_evaluate(hierarchy, chain, angles)?;
        Ok(tip.distance(target))
    }
}
