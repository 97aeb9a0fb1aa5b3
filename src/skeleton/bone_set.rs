//! 骨骼集合 - 参考 nphysics Multibody 设计
//!
//! BoneSet 以数组方式持有所有 BoneLink，并缓存父子关系。
//! 骨骼索引即骨骼标识。

use glam::{Mat4, Vec3};

use super::{BoneHierarchy, BoneId, BoneLink};
use crate::{KinematicError, Result};

/// 骨骼集合
#[derive(Clone, Debug, Default)]
pub struct BoneSet {
    /// 所有骨骼
    bones: Vec<BoneLink>,
    /// 子骨骼缓存（按添加顺序）
    children_cache: Vec<Vec<BoneId>>,
    /// 根骨骼列表
    roots: Vec<BoneId>,
}

impl BoneSet {
    /// 创建空骨骼集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加骨骼，返回其索引
    ///
    /// 添加后需要调用 [`BoneSet::build`] 才能计算偏移与变换。
    pub fn add_bone(&mut self, mut bone: BoneLink) -> BoneId {
        let id = self.bones.len();
        bone.internal_id = id;
        self.bones.push(bone);
        id
    }

    /// 构建层次结构
    ///
    /// 1. 校验父骨骼索引并检测环
    /// 2. 计算子骨骼缓存
    /// 3. body_shift = 自身初始位置 - 父骨骼初始位置
    /// 4. 从根骨骼开始计算全局变换
    pub fn build(&mut self) -> Result<()> {
        let count = self.bones.len();

        for (idx, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= count || parent == idx {
                    return Err(KinematicError::InvalidBone(parent));
                }
            }
        }

        // 环检测：沿父链向上最多走 count 步
        for idx in 0..count {
            let mut steps = 0;
            let mut current = self.bones[idx].parent;
            while let Some(p) = current {
                steps += 1;
                if steps > count {
                    return Err(KinematicError::InvalidBone(idx));
                }
                current = self.bones[p].parent;
            }
        }

        self.children_cache = vec![Vec::new(); count];
        self.roots.clear();
        for idx in 0..count {
            match self.bones[idx].parent {
                Some(parent) => self.children_cache[parent].push(idx),
                None => self.roots.push(idx),
            }
        }

        for idx in 0..count {
            let parent_position = self.bones[idx]
                .parent
                .map(|p| self.bones[p].initial_position)
                .unwrap_or(Vec3::ZERO);
            let bone = &mut self.bones[idx];
            bone.body_shift = bone.initial_position - parent_position;
            bone.compute_local_transform();
        }

        self.update_transforms();
        Ok(())
    }

    /// 从所有根骨骼开始更新全局变换
    pub fn update_transforms(&mut self) {
        for i in 0..self.roots.len() {
            let root = self.roots[i];
            self.update_global_transform_recursive(root);
        }
    }

    /// 递归更新全局变换
    pub(crate) fn update_global_transform_recursive(&mut self, idx: BoneId) {
        if idx >= self.bones.len() {
            return;
        }

        let parent_global = match self.bones[idx].parent {
            Some(p) if p < self.bones.len() => self.bones[p].local_to_world,
            _ => Mat4::IDENTITY,
        };
        self.bones[idx].compute_global_transform(parent_global);

        // 递归更新子骨骼
        if idx < self.children_cache.len() {
            for i in 0..self.children_cache[idx].len() {
                let child = self.children_cache[idx][i];
                self.update_global_transform_recursive(child);
            }
        }
    }

    // ========================================
    // 访问器
    // ========================================

    /// 骨骼数量
    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// 获取骨骼
    #[inline]
    pub fn get(&self, idx: BoneId) -> Option<&BoneLink> {
        self.bones.get(idx)
    }

    /// 根骨骼列表
    #[inline]
    pub fn roots(&self) -> &[BoneId] {
        &self.roots
    }

    /// 按名称查找骨骼
    pub fn find_by_name(&self, name: &str) -> Option<BoneId> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// 所有骨骼
    #[inline]
    pub fn bones(&self) -> &[BoneLink] {
        &self.bones
    }
}

impl BoneHierarchy for BoneSet {
    #[inline]
    fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    fn parent(&self, bone: BoneId) -> Option<BoneId> {
        self.bones.get(bone).and_then(|b| b.parent)
    }

    #[inline]
    fn children(&self, bone: BoneId) -> &[BoneId] {
        self.children_cache.get(bone).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    fn relative_rotation(&self, bone: BoneId) -> Vec3 {
        self.bones.get(bone).map(|b| b.rotation).unwrap_or(Vec3::ZERO)
    }

    fn set_rotation(&mut self, bone: BoneId, angles: Vec3) {
        let Some(link) = self.bones.get_mut(bone) else {
            return;
        };
        link.rotation = angles;
        link.compute_local_transform();
        self.update_global_transform_recursive(bone);
    }

    #[inline]
    fn end_effector_position(&self, bone: BoneId) -> Vec3 {
        self.bones
            .get(bone)
            .map(BoneLink::end_effector_position)
            .unwrap_or(Vec3::ZERO)
    }
}
