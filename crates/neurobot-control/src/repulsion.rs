//! 势场避障控制器
//!
//! 把标量接近距离转换为平滑的三维制动偏移，或者直接给出急停判定。
//!
//! # 区域划分
//!
//! ```text
//!  0 ──── stop_distance ──── working_distance ──── safety_margin ──── ∞
//!  │   急停（无平滑）  │                      │                     │
//!  │                   │   工作区（指数）     │   接近区（二次）    │  自由运动
//! ```
//!
//! 急停判定优先于一切；工作区允许两个线圈在近距离协同工作而不触发急停。
//! 唯一跨周期保留的状态是 EMA 平滑后的偏移。

use crate::update::{ConfigKey, ConfigUpdate, RejectReason, RejectedKey, UpdateReport};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// 避障参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepulsionConfig {
    /// 力增益
    pub strength: f64,
    /// 开始制动的距离（mm）
    pub safety_margin: f64,
    /// 急停距离（mm）
    pub stop_distance: f64,
    /// EMA 平滑系数，范围 [0, 1]，越大越平滑
    pub ema: f64,
    /// 接近区与工作区的分界（mm）
    pub working_distance: f64,
}

impl Default for RepulsionConfig {
    fn default() -> Self {
        Self {
            strength: 240.0,
            safety_margin: 65.0,
            stop_distance: 20.0,
            ema: 0.3,
            working_distance: 15.0,
        }
    }
}

/// 本周期所处的区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    /// 距离未知或不小于安全边界
    Free,
    /// 二次软制动
    Approach,
    /// 指数强制动
    Working,
    /// 急停
    Stop,
}

/// 单次计算结果（同时作为遥测输出）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepulsionOutput {
    /// 制动偏移（mm）
    pub offset: Vector3<f64>,
    /// 是否立即停止
    pub stop_now: bool,
    pub zone: Zone,
}

impl RepulsionOutput {
    /// 把偏移叠加到目标位姿的平移部分
    pub fn apply_to(&self, target: &neurobot_protocol::Pose6) -> neurobot_protocol::Pose6 {
        target.translated([self.offset.x, self.offset.y, self.offset.z])
    }
}

/// 接近区幅值：`strength · ((margin − d) / (margin − wd))²`
///
/// 调用方需保证 `safety_margin > working_distance`。
pub fn approach_magnitude(
    strength: f64,
    safety_margin: f64,
    working_distance: f64,
    distance: f64,
) -> f64 {
    let ratio = (safety_margin - distance) / (safety_margin - working_distance);
    strength * ratio * ratio
}

/// 工作区幅值：`strength · exp(2 · (1 − d / wd))`
///
/// 调用方需保证 `working_distance > 0`。
pub fn working_magnitude(strength: f64, working_distance: f64, distance: f64) -> f64 {
    strength * (2.0 * (1.0 - distance / working_distance)).exp()
}

/// 势场避障控制器
///
/// 每个实例持有独立的配置副本，多个控制器（例如每台机器人一个）互不影响。
#[derive(Debug, Clone)]
pub struct RepulsionController {
    cfg: RepulsionConfig,
    /// 实际用于区域判断的安全边界，可以临时覆盖而不改变 `cfg.safety_margin`
    safety_margin: f64,
    brake_direction: Vector3<f64>,
    smoothed_offset: Vector3<f64>,
    last_output: RepulsionOutput,
}

impl Default for RepulsionController {
    fn default() -> Self {
        Self::new(RepulsionConfig::default())
    }
}

impl RepulsionController {
    pub fn new(cfg: RepulsionConfig) -> Self {
        Self {
            cfg,
            safety_margin: cfg.safety_margin,
            brake_direction: Vector3::zeros(),
            smoothed_offset: Vector3::zeros(),
            last_output: RepulsionOutput {
                offset: Vector3::zeros(),
                stop_now: false,
                zone: Zone::Free,
            },
        }
    }

    pub fn config(&self) -> &RepulsionConfig {
        &self.cfg
    }

    /// 当前生效的安全边界
    pub fn live_safety_margin(&self) -> f64 {
        self.safety_margin
    }

    /// 临时覆盖安全边界（不修改配置）
    pub fn override_safety_margin(&mut self, margin: f64) {
        debug!("Safety margin overridden: {} -> {}", self.safety_margin, margin);
        self.safety_margin = margin;
    }

    pub fn brake_direction(&self) -> Vector3<f64> {
        self.brake_direction
    }

    pub fn smoothed_offset(&self) -> Vector3<f64> {
        self.smoothed_offset
    }

    /// 最近一次 `compute_offset` 的结果
    pub fn last_output(&self) -> RepulsionOutput {
        self.last_output
    }

    /// 设置制动方向
    ///
    /// 期望输入已归一化；几何退化时调用方传入零向量。含 NaN/Inf 的输入被忽略，
    /// 保留上一次的方向。
    pub fn update_opposite_coil_vector(&mut self, direction: Vector3<f64>) {
        if direction.iter().all(|v| v.is_finite()) {
            self.brake_direction = direction;
        } else {
            warn!(
                "Ignoring non-finite brake direction {:?}, keeping {:?}",
                direction, self.brake_direction
            );
        }
    }

    /// 清除平滑状态
    pub fn reset(&mut self) {
        self.smoothed_offset = Vector3::zeros();
    }

    /// 计算制动偏移
    ///
    /// # 参数
    /// - `distance`: 到障碍物的距离（mm），`None` 表示未知
    /// - `dt`: 距上次调用的时间（s）
    ///
    /// 距离未知时既不急停也不制动，已有偏移按 EMA 衰减。
    pub fn compute_offset(&mut self, distance: Option<f64>, dt: f64) -> RepulsionOutput {
        let distance = distance.filter(|d| !d.is_nan());

        if let Some(d) = distance.filter(|d| *d < self.cfg.stop_distance) {
            debug!(
                "Distance {:.2}mm below stop distance {:.2}mm",
                d, self.cfg.stop_distance
            );
            self.last_output = RepulsionOutput {
                offset: self.brake_direction,
                stop_now: true,
                zone: Zone::Stop,
            };
            return self.last_output;
        }

        let (zone, raw_offset) = match distance {
            Some(d) if d < self.safety_margin => {
                let (zone, magnitude) = self.magnitude(d);
                (zone, self.brake_direction * (magnitude * dt))
            },
            _ => (Zone::Free, Vector3::zeros()),
        };

        // NaN 一旦进入平滑状态就会永久保留
        let raw_offset = if raw_offset.iter().all(|v| v.is_finite()) {
            raw_offset
        } else {
            warn!(
                "Ignoring non-finite raw offset {:?} (distance {:?}, dt {})",
                raw_offset, distance, dt
            );
            Vector3::zeros()
        };

        let ema = self.cfg.ema;
        self.smoothed_offset = self.smoothed_offset * ema + raw_offset * (1.0 - ema);

        self.last_output = RepulsionOutput {
            offset: self.smoothed_offset,
            stop_now: false,
            zone,
        };
        self.last_output
    }

    fn magnitude(&self, distance: f64) -> (Zone, f64) {
        let strength = self.cfg.strength;
        let working_distance = self.cfg.working_distance;

        // 安全边界不大于工作距离时没有接近区
        if distance > working_distance && self.safety_margin > working_distance {
            (
                Zone::Approach,
                approach_magnitude(strength, self.safety_margin, working_distance, distance),
            )
        } else if working_distance > 0.0 {
            (
                Zone::Working,
                working_magnitude(strength, working_distance, distance),
            )
        } else {
            (Zone::Working, strength)
        }
    }

    /// 应用配置更新
    ///
    /// 只接受已知键；未知键、非数值、非有限值逐个拒绝，不影响其它键。
    /// `safety_margin` 同时刷新生效的安全边界。
    pub fn update_config(&mut self, update: &ConfigUpdate) -> UpdateReport {
        let mut report = UpdateReport::default();

        for (name, value) in update.entries() {
            let Some(key) = name.parse::<ConfigKey>().ok() else {
                warn!("Rejected unknown repulsion config key {:?}", name);
                report.rejected.push(RejectedKey {
                    key: name.clone(),
                    reason: RejectReason::UnknownKey,
                });
                continue;
            };

            let value = match value.as_number() {
                Ok(v) => v,
                Err(reason) => {
                    warn!("Rejected repulsion config {}: {:?}", key, reason);
                    report.rejected.push(RejectedKey {
                        key: name.clone(),
                        reason,
                    });
                    continue;
                },
            };

            let previous = key.read(&self.cfg);
            key.write(&mut self.cfg, value);
            if key == ConfigKey::SafetyMargin {
                self.safety_margin = value;
            }
            info!("Repulsion config {} updated: {} -> {}", key, previous, value);
            report.applied.push((key, value));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn controller_with_direction() -> RepulsionController {
        let mut c = RepulsionController::new(RepulsionConfig::default());
        c.update_opposite_coil_vector(Vector3::new(1.0, 0.0, 0.0));
        c
    }

    #[test]
    fn test_approach_zone_reference_values() {
        let mut c = controller_with_direction();
        let out = c.compute_offset(Some(50.0), 0.01);

        assert!(!out.stop_now);
        assert_eq!(out.zone, Zone::Approach);
        // 240 · (15/50)² = 21.6，raw = 0.216，平滑后 0.7 · 0.216
        assert_relative_eq!(out.offset.x, 0.1512, epsilon = 1e-12);
        assert_relative_eq!(out.offset.y, 0.0);
        assert_relative_eq!(out.offset.z, 0.0);
    }

    #[test]
    fn test_stop_bypasses_smoothing() {
        let mut c = controller_with_direction();
        c.compute_offset(Some(50.0), 0.01);
        let before = c.smoothed_offset();

        let out = c.compute_offset(Some(10.0), 123.0);
        assert!(out.stop_now);
        assert_eq!(out.zone, Zone::Stop);
        assert_eq!(out.offset, Vector3::new(1.0, 0.0, 0.0));
        // 急停不修改平滑状态
        assert_eq!(c.smoothed_offset(), before);
    }

    #[test]
    fn test_unknown_distance_decays() {
        let mut c = controller_with_direction();
        let first = c.compute_offset(Some(50.0), 0.01).offset.x;

        let out = c.compute_offset(None, 0.01);
        assert!(!out.stop_now);
        assert_eq!(out.zone, Zone::Free);
        assert_relative_eq!(out.offset.x, first * 0.3, epsilon = 1e-12);

        let out = c.compute_offset(Some(f64::NAN), 0.01);
        assert!(!out.stop_now);
        assert_relative_eq!(out.offset.x, first * 0.09, epsilon = 1e-12);
    }

    #[test]
    fn test_working_zone_below_working_distance() {
        let mut c = RepulsionController::new(RepulsionConfig {
            stop_distance: 5.0,
            ema: 0.0,
            ..RepulsionConfig::default()
        });
        c.update_opposite_coil_vector(Vector3::new(0.0, 1.0, 0.0));

        let out = c.compute_offset(Some(7.5), 1.0);
        assert_eq!(out.zone, Zone::Working);
        // 240 · exp(2 · (1 − 0.5)) = 240e
        assert_relative_eq!(out.offset.y, 240.0 * std::f64::consts::E, epsilon = 1e-9);
    }

    #[test]
    fn test_margin_equal_working_distance_has_no_division_by_zero() {
        let mut c = RepulsionController::new(RepulsionConfig {
            safety_margin: 15.0,
            working_distance: 15.0,
            stop_distance: 1.0,
            ema: 0.0,
            ..RepulsionConfig::default()
        });
        c.update_opposite_coil_vector(Vector3::new(0.0, 0.0, 1.0));

        let out = c.compute_offset(Some(14.0), 1.0);
        assert_eq!(out.zone, Zone::Working);
        assert!(out.offset.z.is_finite());
        assert!(out.offset.z > 240.0);
    }

    #[test]
    fn test_zero_direction_gives_zero_offset() {
        let mut c = RepulsionController::default();
        let out = c.compute_offset(Some(30.0), 0.01);
        assert_eq!(out.offset, Vector3::zeros());
        assert!(!out.stop_now);
    }

    #[test]
    fn test_non_finite_direction_keeps_previous() {
        let mut c = controller_with_direction();
        c.update_opposite_coil_vector(Vector3::new(f64::NAN, 0.0, 0.0));
        assert_eq!(c.brake_direction(), Vector3::new(1.0, 0.0, 0.0));

        c.update_opposite_coil_vector(Vector3::zeros());
        assert_eq!(c.brake_direction(), Vector3::zeros());
    }

    #[test]
    fn test_override_safety_margin_keeps_config() {
        let mut c = controller_with_direction();
        c.override_safety_margin(40.0);
        assert_eq!(c.live_safety_margin(), 40.0);
        assert_eq!(c.config().safety_margin, 65.0);

        // 50mm 现在在安全边界之外
        let out = c.compute_offset(Some(50.0), 0.01);
        assert_eq!(out.zone, Zone::Free);
        assert_eq!(out.offset, Vector3::zeros());
    }

    #[test]
    fn test_non_finite_dt_does_not_poison_smoothing() {
        let mut c = controller_with_direction();
        let first = c.compute_offset(Some(50.0), 0.01).offset.x;

        let out = c.compute_offset(Some(50.0), f64::NAN);
        assert!(out.offset.x.is_finite());
        assert_relative_eq!(out.offset.x, first * 0.3, epsilon = 1e-12);

        let out = c.compute_offset(Some(50.0), f64::INFINITY);
        assert!(out.offset.x.is_finite());

        // 之后正常的周期不受影响
        let out = c.compute_offset(Some(50.0), 0.01);
        assert!(out.offset.x.is_finite());
        assert!(out.offset.x > 0.0);
    }

    #[test]
    fn test_working_zone_overflow_treated_as_zero() {
        let mut c = RepulsionController::new(RepulsionConfig {
            stop_distance: -1.0e6,
            ema: 0.0,
            ..RepulsionConfig::default()
        });
        c.update_opposite_coil_vector(Vector3::new(1.0, 0.0, 0.0));

        // exp(2 · (1 + 1e5/15)) 溢出为无穷大，乘以方向的零分量得到 NaN
        let out = c.compute_offset(Some(-1.0e5), 0.01);
        assert_eq!(out.zone, Zone::Working);
        assert_eq!(out.offset, Vector3::zeros());
        assert_eq!(c.smoothed_offset(), Vector3::zeros());
    }

    #[test]
    fn test_reset_clears_smoothing() {
        let mut c = controller_with_direction();
        c.compute_offset(Some(50.0), 0.01);
        c.reset();
        assert_eq!(c.smoothed_offset(), Vector3::zeros());
    }

    #[test]
    fn test_apply_to_target_pose() {
        use neurobot_protocol::Pose6;

        let out = RepulsionOutput {
            offset: Vector3::new(1.0, -2.0, 0.5),
            stop_now: false,
            zone: Zone::Approach,
        };
        let target = Pose6::new(100.0, 100.0, 100.0, 10.0, 20.0, 30.0);
        assert_eq!(
            out.apply_to(&target),
            Pose6::new(101.0, 98.0, 100.5, 10.0, 20.0, 30.0)
        );
    }
}
