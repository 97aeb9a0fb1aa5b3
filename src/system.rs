//! 运动学系统 - 每帧驱动
//!
//! 每帧读取骨骼当前旋转，按模式执行正向运动学回放或一轮 IK 扫描。
//! 帧之间不保存求解状态，结果全部体现在骨骼旋转上。

use glam::Vec3;

use crate::kinematics::{
    ForwardKinematics, GradientDescentSolver, RandomSign, SignSource, SolverConfig, SweepReport,
};
use crate::skeleton::{BoneHierarchy, BoneId, KinematicChain};
use crate::Result;

/// 运动学模式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KinematicMode {
    /// 正向运动学：回放骨骼当前旋转
    #[default]
    Forward,
    /// 逆向运动学：梯度下降逼近目标
    Inverse,
}

/// 系统配置
#[derive(Clone, Debug)]
pub struct SystemConfig {
    /// 根骨骼
    pub root: BoneId,
    /// 末端骨骼
    pub tip: BoneId,
    /// 模式
    pub mode: KinematicMode,
    /// 求解器参数
    pub solver: SolverConfig,
}

impl SystemConfig {
    pub fn new(root: BoneId, tip: BoneId, mode: KinematicMode) -> Self {
        Self {
            root,
            tip,
            mode,
            solver: SolverConfig::default(),
        }
    }

    /// 使用全局求解器配置
    pub fn from_global(root: BoneId, tip: BoneId, mode: KinematicMode) -> Self {
        Self {
            solver: crate::kinematics::get_config(),
            ..Self::new(root, tip, mode)
        }
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }
}

/// 单帧结果
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    /// 本帧使用的模式
    pub mode: KinematicMode,
    /// 本帧结束时末端点世界位置
    pub tip_position: Vec3,
    /// 本帧结束时末端点到目标的距离
    pub distance: f32,
    /// IK 扫描统计（仅逆向模式）
    pub sweep: Option<SweepReport>,
}

/// 运动学系统
pub struct KinematicSystem {
    root: BoneId,
    tip: BoneId,
    mode: KinematicMode,
    solver: GradientDescentSolver,
    signs: Box<dyn SignSource>,
    /// 首帧构建，之后不再重建
    chain: Option<KinematicChain>,
}

impl KinematicSystem {
    /// 创建系统，求解器参数无效时返回错误
    pub fn new(config: SystemConfig) -> Result<Self> {
        let signs = RandomSign::from_config(&config.solver);
        let solver = GradientDescentSolver::new(config.solver)?;
        Ok(Self {
            root: config.root,
            tip: config.tip,
            mode: config.mode,
            solver,
            signs: Box::new(signs),
            chain: None,
        })
    }

    /// 替换随机符号来源
    pub fn with_sign_source(mut self, signs: impl SignSource + 'static) -> Self {
        self.signs = Box::new(signs);
        self
    }

    /// 立即构建并校验骨骼链
    ///
    /// 不调用时在第一次 [`KinematicSystem::tick`] 中完成。已构建时不做任何事。
    pub fn activate<H: BoneHierarchy + ?Sized>(&mut self, hierarchy: &H) -> Result<()> {
        if self.chain.is_none() {
            self.chain = Some(Self::build_chain(hierarchy, self.root, self.tip)?);
        }
        Ok(())
    }

    fn build_chain<H: BoneHierarchy + ?Sized>(
        hierarchy: &H,
        root: BoneId,
        tip: BoneId,
    ) -> Result<KinematicChain> {
        let chain = KinematicChain::build(hierarchy, root, tip)?;
        if let Err(e) = chain.validate() {
            log::error!("[Chain] 骨骼链无效: {}", e);
            return Err(e);
        }
        Ok(chain)
    }

    /// 执行一帧
    ///
    /// 出错时本帧不更新，调用方可以在下一帧重试。
    pub fn tick<H: BoneHierarchy + ?Sized>(&mut self, hierarchy: &mut H, target: Vec3) -> Result<TickReport> {
        let chain: &KinematicChain = match self.chain {
            Some(ref chain) => chain,
            None => self
                .chain
                .insert(Self::build_chain(&*hierarchy, self.root, self.tip)?),
        };

        let mut angles = chain.read_angles(&*hierarchy);

        match self.mode {
            KinematicMode::Forward => {
                let tip_position = ForwardKinematics::try_evaluate(hierarchy, chain, &angles)?;
                Ok(TickReport {
                    mode: KinematicMode::Forward,
                    tip_position,
                    distance: tip_position.distance(target),
                    sweep: None,
                })
            }
            KinematicMode::Inverse => {
                let sweep = self
                    .solver
                    .solve(hierarchy, chain, target, &mut angles, &mut *self.signs)?;
                let tip_position = hierarchy.end_effector_position(chain.tip());
                Ok(TickReport {
                    mode: KinematicMode::Inverse,
                    tip_position,
                    distance: sweep.final_distance,
                    sweep: Some(sweep),
                })
            }
        }
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn mode(&self) -> KinematicMode {
        self.mode
    }

    #[inline]
    pub fn set_mode(&mut self, mode: KinematicMode) {
        self.mode = mode;
    }

    /// 是否已构建骨骼链
    #[inline]
    pub fn is_activated(&self) -> bool {
        self.chain.is_some()
    }

    #[inline]
    pub fn chain(&self) -> Option<&KinematicChain> {
        self.chain.as_ref()
    }

    #[inline]
    pub fn solver_config(&self) -> &SolverConfig {
        self.solver.config()
    }

    /// 运行时修改求解器参数
    pub fn set_solver_config(&mut self, config: SolverConfig) -> Result<()> {
        self.solver.set_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::FixedSign;
    use crate::skeleton::{BoneLink, BoneSet};
    use crate::KinematicError;

    /// A 位于原点，B 为末端，相对 A 偏移 (0, 1, 0)
    fn two_joints() -> BoneSet {
        let mut set = BoneSet::new();
        let a = set.add_bone(BoneLink::new("A"));
        set.add_bone(BoneLink::new("B").with_parent(a).with_position(Vec3::Y));
        set.build().unwrap();
        set
    }

    fn inverse_config(seed: u64) -> SystemConfig {
        SystemConfig::new(0, 1, KinematicMode::Inverse).with_solver(SolverConfig {
            sampling_distance: 0.01,
            learning_rate: 0.1,
            threshold_distance: 0.01,
            seed: Some(seed),
            debug_log: false,
        })
    }

    #[test]
    fn test_two_joint_scenario_converges() {
        let mut set = two_joints();
        let mut system = KinematicSystem::new(inverse_config(7)).unwrap();
        let target = Vec3::X;

        let first = system.tick(&mut set, target).unwrap().distance;
        let mut last = first;
        for _ in 0..150_000 {
            last = system.tick(&mut set, target).unwrap().distance;
            if last < 0.01 {
                break;
            }
        }

        assert!(last < first);
        assert!(last <= 0.01 + 1e-4, "distance after ticks: {}", last);
        assert!((set.end_effector_position(1) - target).length() <= 0.01 + 1e-4);
    }

    #[test]
    fn test_lazy_activation_on_first_tick() {
        let mut set = two_joints();
        let mut system = KinematicSystem::new(inverse_config(1)).unwrap();
        assert!(!system.is_activated());

        system.tick(&mut set, Vec3::X).unwrap();
        assert!(system.is_activated());
        assert_eq!(system.chain().unwrap().bones(), &[0, 1]);
    }

    #[test]
    fn test_eager_activation() {
        let set = two_joints();
        let mut system = KinematicSystem::new(inverse_config(1)).unwrap();
        system.activate(&set).unwrap();
        assert!(system.is_activated());
    }

    #[test]
    fn test_forward_mode_replays_rotations() {
        let mut set = two_joints();
        set.set_rotation(0, Vec3::new(0.0, 0.0, -90.0));
        let mut system = KinematicSystem::new(SystemConfig::new(0, 1, KinematicMode::Forward)).unwrap();

        let report = system.tick(&mut set, Vec3::X).unwrap();

        assert_eq!(report.mode, KinematicMode::Forward);
        assert!(report.sweep.is_none());
        assert!((report.tip_position - Vec3::X).length() < 1e-5);
        assert!(report.distance < 1e-5);
        assert_eq!(set.relative_rotation(0), Vec3::new(0.0, 0.0, -90.0));
    }

    #[test]
    fn test_mode_switch() {
        let mut set = two_joints();
        let mut system = KinematicSystem::new(SystemConfig::new(0, 1, KinematicMode::Forward)).unwrap();
        let before = system.tick(&mut set, Vec3::X).unwrap();
        assert_eq!(set.relative_rotation(0), Vec3::ZERO);

        system.set_mode(KinematicMode::Inverse);
        let after = system.tick(&mut set, Vec3::X).unwrap();
        assert!(after.sweep.is_some());
        assert!(after.distance < before.distance);
    }

    #[test]
    fn test_injected_sign_source_is_deterministic() {
        let mut set_a = two_joints();
        let mut set_b = two_joints();
        let mut a = KinematicSystem::new(inverse_config(0)).unwrap().with_sign_source(FixedSign::NEGATIVE);
        let mut b = KinematicSystem::new(inverse_config(0)).unwrap().with_sign_source(FixedSign::NEGATIVE);

        for _ in 0..20 {
            let ra = a.tick(&mut set_a, Vec3::X).unwrap();
            let rb = b.tick(&mut set_b, Vec3::X).unwrap();
            assert_eq!(ra, rb);
        }
        assert_eq!(set_a.relative_rotation(0), set_b.relative_rotation(0));
    }

    #[test]
    fn test_branching_chain_rejected() {
        let mut set = BoneSet::new();
        let root = set.add_bone(BoneLink::new("root"));
        let tip = set.add_bone(BoneLink::new("tip").with_parent(root).with_position(Vec3::Y));
        set.add_bone(BoneLink::new("other").with_parent(root).with_position(Vec3::X));
        set.build().unwrap();

        let mut system = KinematicSystem::new(SystemConfig::new(root, tip, KinematicMode::Inverse)).unwrap();
        let result = system.tick(&mut set, Vec3::X);

        assert!(matches!(result, Err(KinematicError::BranchingChain { bone: 0 })));
        assert!(!system.is_activated());
        assert_eq!(set.relative_rotation(root), Vec3::ZERO);
    }

    #[test]
    fn test_unreachable_tip_rejected() {
        let mut set = two_joints();
        let lone = set.add_bone(BoneLink::new("lone"));
        set.build().unwrap();

        let mut system = KinematicSystem::new(SystemConfig::new(0, lone, KinematicMode::Forward)).unwrap();
        assert!(matches!(
            system.activate(&set),
            Err(KinematicError::UnreachableTip { .. })
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let config = SystemConfig::new(0, 1, KinematicMode::Inverse).with_solver(SolverConfig {
            sampling_distance: 0.0,
            ..SolverConfig::default()
        });
        assert!(matches!(
            KinematicSystem::new(config),
            Err(KinematicError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_set_solver_config() {
        let mut system = KinematicSystem::new(inverse_config(1)).unwrap();
        let bad = SolverConfig {
            threshold_distance: -0.5,
            ..SolverConfig::default()
        };
        assert!(system.set_solver_config(bad).is_err());
        assert_eq!(system.solver_config().learning_rate, 0.1);
    }
}
