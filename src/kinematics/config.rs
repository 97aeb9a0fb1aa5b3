//! IK 求解器配置
//!
//! 所有参数扁平化。全局实例作为新建系统时的默认值，运行时可修改。

use once_cell::sync::Lazy;
use std::sync::RwLock;

use crate::{KinematicError, Result};

/// 求解器配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    // ========== 梯度下降 ==========
    /// 有限差分步长（度），不能为 0，默认 0.01
    pub sampling_distance: f32,
    /// 学习率（梯度乘数），默认 0.1
    pub learning_rate: f32,
    /// 停止距离，末端与目标距离不大于该值时跳过骨骼，默认 0.01
    pub threshold_distance: f32,

    // ========== 随机数 ==========
    /// 随机符号种子，None 时从系统熵初始化
    pub seed: Option<u64>,

    // ========== 调试 ==========
    /// 是否输出每轮扫描的调试日志，默认 false
    pub debug_log: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            sampling_distance: 0.01,
            learning_rate: 0.1,
            threshold_distance: 0.01,
            seed: None,
            debug_log: false,
        }
    }
}

impl SolverConfig {
    /// 校验参数
    ///
    /// sampling_distance 为 0 会在梯度估计中除零。
    pub fn validate(&self) -> Result<()> {
        if !self.sampling_distance.is_finite() || self.sampling_distance == 0.0 {
            return Err(KinematicError::InvalidParameter(format!(
                "sampling_distance must be finite and non-zero, got {}",
                self.sampling_distance
            )));
        }
        if !self.learning_rate.is_finite() {
            return Err(KinematicError::InvalidParameter(format!(
                "learning_rate must be finite, got {}",
                self.learning_rate
            )));
        }
        if !self.threshold_distance.is_finite() || self.threshold_distance < 0.0 {
            return Err(KinematicError::InvalidParameter(format!(
                "threshold_distance must be finite and >= 0, got {}",
                self.threshold_distance
            )));
        }
        Ok(())
    }
}

/// 全局配置实例
static SOLVER_CONFIG: Lazy<RwLock<SolverConfig>> = Lazy::new(|| {
    RwLock::new(SolverConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> SolverConfig {
    SOLVER_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: SolverConfig) {
    *SOLVER_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *SOLVER_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = SolverConfig::default();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_sampling_distance_rejected() {
        let config = SolverConfig {
            sampling_distance: 0.0,
            ..SolverConfig::default()
        };
        assert!(matches!(config.validate(), Err(KinematicError::InvalidParameter(_))));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = SolverConfig {
            threshold_distance: -1.0,
            ..SolverConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_learning_rate_rejected() {
        let config = SolverConfig {
            learning_rate: f32::NAN,
            ..SolverConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_global_config_roundtrip() {
        // 只在本测试中修改全局配置
        let custom = SolverConfig {
            learning_rate: 0.5,
            ..SolverConfig::default()
        };
        set_config(custom.clone());
        assert_eq!(get_config(), custom);
        reset_config();
        assert_eq!(get_config(), SolverConfig::default());
    }
}
