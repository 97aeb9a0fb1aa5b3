//! 梯度下降 IK 求解器
//!
//! 设计原则：
//! - 不使用解析雅可比，每个轴用有限差分估计梯度
//! - 每次调用只对整条链做一轮扫描，收敛依靠每帧重复调用
//! - 逐轴更新：Y 轴的基准已包含 X 轴的更新，Z 轴同理（坐标下降，不是严格梯度）

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use super::config::SolverConfig;
use super::forward::ForwardKinematics;
use crate::skeleton::{BoneHierarchy, KinematicChain};
use crate::{KinematicError, Result};

// ============================================================================
// 随机符号
// ============================================================================

/// 随机符号来源
///
/// 每个骨骼每轮扫描取一次符号，三个轴共用。
pub trait SignSource {
    /// 返回 +1.0 或 -1.0
    fn next_sign(&mut self) -> f32;
}

/// 基于随机数生成器的符号来源
///
/// 在 [1, 10) 内取整数指数 n，返回 (-1)^n。
#[derive(Clone, Debug)]
pub struct RandomSign<R> {
    rng: R,
}

impl<R: Rng> RandomSign<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomSign<Pcg64Mcg> {
    /// 固定种子
    pub fn seeded(seed: u64) -> Self {
        Self::new(Pcg64Mcg::seed_from_u64(seed))
    }

    /// 从系统熵初始化
    pub fn from_entropy() -> Self {
        Self::new(Pcg64Mcg::from_entropy())
    }

    /// 按配置中的种子初始化
    pub fn from_config(config: &SolverConfig) -> Self {
        match config.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng> SignSource for RandomSign<R> {
    fn next_sign(&mut self) -> f32 {
        let exp: i32 = self.rng.gen_range(1..10);
        (-1.0f32).powi(exp)
    }
}

/// 固定符号（测试用）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedSign(pub f32);

impl FixedSign {
    pub const POSITIVE: Self = Self(1.0);
    pub const NEGATIVE: Self = Self(-1.0);
}

impl SignSource for FixedSign {
    #[inline]
    fn next_sign(&mut self) -> f32 {
        self.0
    }
}

// ============================================================================
// 扫描结果
// ============================================================================

/// 单轮扫描统计
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepReport {
    /// 扫描开始时末端与目标的距离
    pub initial_distance: f32,
    /// 扫描结束后末端与目标的距离
    pub final_distance: f32,
    /// 因距离不大于阈值而跳过的骨骼数
    pub skipped_joints: usize,
    /// 正向运动学求值次数
    pub evaluations: usize,
}

/// 有限差分梯度估计
///
/// 除数包含符号，所以正向和反向探测得到的都是同一斜率的单侧估计。
#[inline]
pub fn estimate_gradient(f_x: f32, f_x_plus_d: f32, sampling_distance: f32, sign: f32) -> f32 {
    (f_x_plus_d - f_x) / (sampling_distance * sign)
}

// ============================================================================
// 求解器
// ============================================================================

/// 梯度下降 IK 求解器
#[derive(Clone, Debug)]
pub struct GradientDescentSolver {
    /// 求解器配置
    config: SolverConfig,
    /// 探测用的角度副本（复用内存）
    scratch: Vec<Vec3>,
}

impl GradientDescentSolver {
    /// 创建求解器，参数无效时返回错误
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scratch: Vec::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// 替换配置
    pub fn set_config(&mut self, config: SolverConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// 对整条链做一轮扫描
    ///
    /// `angles` 会被原地更新；返回时骨骼的实时旋转与 `angles` 一致。
    pub fn solve<H: BoneHierarchy + ?Sized>(
        &mut self,
        hierarchy: &mut H,
        chain: &KinematicChain,
        target: Vec3,
        angles: &mut [Vec3],
        signs: &mut dyn SignSource,
    ) -> Result<SweepReport> {
        if angles.len() != chain.len() {
            return Err(KinematicError::LengthMismatch {
                bones: chain.len(),
                angles: angles.len(),
            });
        }

        let learning_rate = self.config.learning_rate;
        let mut report = SweepReport::default();

        for i in 0..angles.len() {
            let sign = signs.next_sign();

            let f_x = Self::measure(hierarchy, chain, angles, target, &mut report)?;
            if i == 0 {
                report.initial_distance = f_x;
            }
            if f_x <= self.config.threshold_distance {
                report.skipped_joints += 1;
                continue;
            }

            // X、Y、Z 依次更新，后一轴以前一轴更新后的角度为基准
            for axis in 0..3 {
                let baseline = if axis == 0 {
                    f_x
                } else {
                    Self::measure(hierarchy, chain, angles, target, &mut report)?
                };
                let gradient = self.sample_axis(
                    hierarchy, chain, angles, target, i, axis, sign, baseline, &mut report,
                )?;
                angles[i][axis] -= learning_rate * gradient;
            }
        }

        // 写回最终角度
        let tip = ForwardKinematics::try_evaluate(hierarchy, chain, angles)?;
        report.evaluations += 1;
        report.final_distance = tip.distance(target);

        if self.config.debug_log {
            log::debug!(
                "[IK] 扫描完成: 距离 {:.6} -> {:.6}, 跳过骨骼 {}, 求值 {} 次",
                report.initial_distance,
                report.final_distance,
                report.skipped_joints,
                report.evaluations
            );
        }

        Ok(report)
    }

    /// 在角度副本上扰动单个轴并估计梯度，`angles` 本身不被修改
    #[allow(clippy::too_many_arguments)]
    fn sample_axis<H: BoneHierarchy + ?Sized>(
        &mut self,
        hierarchy: &mut H,
        chain: &KinematicChain,
        angles: &[Vec3],
        target: Vec3,
        joint: usize,
        axis: usize,
        sign: f32,
        baseline: f32,
        report: &mut SweepReport,
    ) -> Result<f32> {
        let sampling = self.config.sampling_distance;

        self.scratch.clear();
        self.scratch.extend_from_slice(angles);
        self.scratch[joint][axis] += sampling * sign;

        let f_plus_d = Self::measure(hierarchy, chain, &self.scratch, target, report)?;
        Ok(estimate_gradient(baseline, f_plus_d, sampling, sign))
    }

    /// 求值并计算到目标的距离
    #[inline]
    fn measure<H: BoneHierarchy + ?Sized>(
        hierarchy: &mut H,
        chain: &KinematicChain,
        angles: &[Vec3],
        target: Vec3,
        report: &mut SweepReport,
    ) -> Result<f32> {
        report.evaluations += 1;
        ForwardKinematics::distance_from_target(hierarchy, chain, angles, target)
    }
}
