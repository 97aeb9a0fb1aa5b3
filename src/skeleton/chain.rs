//! 运动学链 - 从根骨骼到末端骨骼的有序骨骼序列
//!
//! 构建时从根骨骼做一次深度优先遍历，只做一次。

use glam::Vec3;

use super::{BoneHierarchy, BoneId};
use crate::{KinematicError, Result};

/// 运动学链
#[derive(Clone, Debug)]
pub struct KinematicChain {
    /// 根骨骼
    root: BoneId,
    /// 末端骨骼
    tip: BoneId,
    /// 按遍历顺序排列的骨骼（根到末端）
    bones: Vec<BoneId>,
    /// 每个骨骼的父骨骼在链中的位置
    parents: Vec<Option<usize>>,
    /// 遍历时记录的旋转快照（相对父骨骼，不是世界旋转）
    initial_angles: Vec<Vec3>,
}

impl KinematicChain {
    /// 深度优先遍历构建链
    ///
    /// 遇到末端骨骼时停止向下；其余骨骼会遍历全部子骨骼，
    /// 分叉结构下得到的序列不是单一路径，需要用 [`KinematicChain::validate`] 检查。
    pub fn build<H: BoneHierarchy + ?Sized>(hierarchy: &H, root: BoneId, tip: BoneId) -> Result<Self> {
        if !hierarchy.contains(root) {
            return Err(KinematicError::InvalidBone(root));
        }
        if !hierarchy.contains(tip) {
            return Err(KinematicError::InvalidBone(tip));
        }

        let mut chain = Self {
            root,
            tip,
            bones: Vec::new(),
            parents: Vec::new(),
            initial_angles: Vec::new(),
        };
        chain.visit(hierarchy, root);

        log::info!(
            "[Chain] 骨骼链构建完成: 根={}, 末端={}, 骨骼数={}",
            root,
            tip,
            chain.bones.len()
        );
        Ok(chain)
    }

    fn visit<H: BoneHierarchy + ?Sized>(&mut self, hierarchy: &H, current: BoneId) {
        // 层次中存在环时不重复访问
        if self.bones.contains(&current) || self.bones.len() >= hierarchy.bone_count() {
            log::warn!("[Chain] 骨骼 {} 已访问，层次结构中存在环", current);
            return;
        }

        let parent_slot = hierarchy
            .parent(current)
            .and_then(|p| self.bones.iter().position(|&b| b == p));
        self.bones.push(current);
        self.parents.push(parent_slot);
        self.initial_angles.push(hierarchy.relative_rotation(current));

        let children = hierarchy.children(current);
        if !children.is_empty() && current != self.tip {
            for &child in children {
                self.visit(hierarchy, child);
            }
        }
    }

    /// 校验链是否为根到末端的单一路径
    pub fn validate(&self) -> Result<()> {
        if !self.bones.contains(&self.tip) {
            return Err(KinematicError::UnreachableTip {
                root: self.root,
                tip: self.tip,
            });
        }

        // 单一路径上每个骨骼的父骨骼都是前一个骨骼
        for (slot, parent) in self.parents.iter().enumerate().skip(1) {
            if *parent != Some(slot - 1) {
                let bone = match parent {
                    Some(p) => self.bones[*p],
                    None => self.bones[slot],
                };
                return Err(KinematicError::BranchingChain { bone });
            }
        }

        Ok(())
    }

    /// 读取每个骨骼当前相对父骨骼的旋转
    pub fn read_angles<H: BoneHierarchy + ?Sized>(&self, hierarchy: &H) -> Vec<Vec3> {
        self.bones
            .iter()
            .map(|&bone| hierarchy.relative_rotation(bone))
            .collect()
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn root(&self) -> BoneId {
        self.root
    }

    #[inline]
    pub fn tip(&self) -> BoneId {
        self.tip
    }

    #[inline]
    pub fn bones(&self) -> &[BoneId] {
        &self.bones
    }

    #[inline]
    pub fn parents(&self) -> &[Option<usize>] {
        &self.parents
    }

    /// 构建时的旋转快照
    ///
    /// 记录的是相对父骨骼的旋转，与 [`KinematicChain::read_angles`] 同一坐标系。
    /// 求解器不读取该快照，每帧使用 `read_angles` 的当前值。
    #[inline]
    pub fn initial_angles(&self) -> &[Vec3] {
        &self.initial_angles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}
