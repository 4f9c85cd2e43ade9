//! 跟踪空间 → 机器人空间的位姿变换
//!
//! 标定由三部分组成：线性变换 `Y`、参考变换的逆 `X⁻¹`、仿射修正 `affine`。
//! 对跟踪位姿 `M`：
//!
//! - 姿态取自 `Y · M · X⁻¹`
//! - 平移取自 `affine · M`
//!
//! 两者来自不同的矩阵乘积再拼接，仿射修正只作用于位置。
//! 欧拉角统一使用固定轴 `sxyz` 约定（先绕 x，再绕 y，最后绕 z），单位为度。

use crate::error::ControlError;
use nalgebra::{Matrix4, Rotation3};
use neurobot_protocol::Pose6;
use tracing::{debug, warn};

/// 判定万向锁的阈值（与 `cy` 比较）
const GIMBAL_EPSILON: f64 = f64::EPSILON * 4.0;

/// 跟踪器到机器人的标定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub y: Matrix4<f64>,
    pub x_inverse: Matrix4<f64>,
    pub affine: Matrix4<f64>,
}

impl Calibration {
    pub fn new(y: Matrix4<f64>, x_inverse: Matrix4<f64>, affine: Matrix4<f64>) -> Self {
        Self {
            y,
            x_inverse,
            affine,
        }
    }

    /// 从参考变换 `X`（未求逆）构造
    ///
    /// # 错误
    /// - `ControlError::SingularCalibration`: `X` 不可逆
    pub fn from_reference(
        y: Matrix4<f64>,
        x: Matrix4<f64>,
        affine: Matrix4<f64>,
    ) -> Result<Self, ControlError> {
        let x_inverse = x.try_inverse().ok_or(ControlError::SingularCalibration)?;
        Ok(Self::new(y, x_inverse, affine))
    }

    /// 从导航软件下发的 16 元素行优先数组构造（`X` 未求逆）
    pub fn from_row_major(y: &[f64], x: &[f64], affine: &[f64]) -> Result<Self, ControlError> {
        Self::from_reference(row_major(y)?, row_major(x)?, row_major(affine)?)
    }

    pub fn identity() -> Self {
        Self::new(
            Matrix4::identity(),
            Matrix4::identity(),
            Matrix4::identity(),
        )
    }
}

fn row_major(values: &[f64]) -> Result<Matrix4<f64>, ControlError> {
    if values.len() != 16 {
        return Err(ControlError::InvalidMatrixLength(values.len()));
    }
    Ok(Matrix4::from_row_slice(values))
}

/// 变换结果
///
/// 没有标定时返回原位姿，调用方必须把它当作"变换不可用"，而不是成功的变换。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformOutcome {
    Transformed(Pose6),
    Untransformed(Pose6),
}

impl TransformOutcome {
    /// 结果位姿（无论是否变换）
    pub fn pose(&self) -> Pose6 {
        match self {
            TransformOutcome::Transformed(pose) | TransformOutcome::Untransformed(pose) => *pose,
        }
    }

    pub fn is_transformed(&self) -> bool {
        matches!(self, TransformOutcome::Transformed(_))
    }

    /// 仅在真正变换时返回位姿
    pub fn into_transformed(self) -> Option<Pose6> {
        match self {
            TransformOutcome::Transformed(pose) => Some(pose),
            TransformOutcome::Untransformed(_) => None,
        }
    }
}

/// 位姿变换器
#[derive(Debug, Clone, Default)]
pub struct PoseTransformer {
    calibration: Option<Calibration>,
}

impl PoseTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calibration(calibration: Calibration) -> Self {
        Self {
            calibration: Some(calibration),
        }
    }

    /// 替换标定（三个矩阵必须一起提供）
    pub fn set_calibration(
        &mut self,
        y: Matrix4<f64>,
        x_inverse: Matrix4<f64>,
        affine: Matrix4<f64>,
    ) {
        self.replace_calibration(Calibration::new(y, x_inverse, affine));
    }

    pub fn replace_calibration(&mut self, calibration: Calibration) {
        debug!("Tracker to robot calibration replaced");
        self.calibration = Some(calibration);
    }

    pub fn clear_calibration(&mut self) {
        self.calibration = None;
    }

    pub fn has_calibration(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// 把跟踪系统的旋转轴约定（rzyx）转换为固定轴约定（sxyz）
    ///
    /// 交换 rx 与 rz。每个跟踪位姿在变换或显示之前都必须先经过这一步。
    pub fn normalize_tracked_pose(pose: &mut Pose6) {
        pose.swap_rx_rz();
    }

    /// 把机器人坐标系下的齐次矩阵变换到机器人空间
    ///
    /// 没有标定时返回 `None`。
    pub fn matrix_to_robot_space(&self, m: &Matrix4<f64>) -> Option<Pose6> {
        let calibration = self.calibration.as_ref()?;

        let in_robot_space = calibration.y * m * calibration.x_inverse;
        let affine_in_robot_space = calibration.affine * m;

        let angles = matrix_to_pose(&in_robot_space).rotation();
        let translation = matrix_to_pose(&affine_in_robot_space).translation();
        Some(Pose6::from_parts(translation, angles))
    }

    /// 把跟踪位姿（已规范化）变换到机器人空间
    pub fn pose_to_robot_space(&self, pose: &Pose6) -> TransformOutcome {
        let Some(transformed) = self.matrix_to_robot_space(&pose_to_matrix(pose)) else {
            return TransformOutcome::Untransformed(*pose);
        };

        if !transformed.is_finite() {
            warn!(
                "Non-finite pose after calibration ({}), using input pose",
                transformed
            );
            return TransformOutcome::Untransformed(*pose);
        }
        TransformOutcome::Transformed(transformed)
    }
}

/// 6-DOF 位姿 → 齐次变换矩阵（sxyz，角度为度）
pub fn pose_to_matrix(pose: &Pose6) -> Matrix4<f64> {
    let [x, y, z] = pose.translation();
    let [rx, ry, rz] = pose.rotation();

    let mut m =
        Rotation3::from_euler_angles(rx.to_radians(), ry.to_radians(), rz.to_radians())
            .to_homogeneous();
    m[(0, 3)] = x;
    m[(1, 3)] = y;
    m[(2, 3)] = z;
    m
}

/// 齐次变换矩阵 → 6-DOF 位姿（sxyz，角度为度）
///
/// 直接读取左上 3×3 块，不做正交化。万向锁（`|ry| = 90°`）时 rz 固定为 0。
pub fn matrix_to_pose(m: &Matrix4<f64>) -> Pose6 {
    let cy = (m[(0, 0)] * m[(0, 0)] + m[(1, 0)] * m[(1, 0)]).sqrt();

    let (ax, ay, az) = if cy > GIMBAL_EPSILON {
        (
            m[(2, 1)].atan2(m[(2, 2)]),
            (-m[(2, 0)]).atan2(cy),
            m[(1, 0)].atan2(m[(0, 0)]),
        )
    } else {
        ((-m[(1, 2)]).atan2(m[(1, 1)]), (-m[(2, 0)]).atan2(cy), 0.0)
    };

    Pose6::new(
        m[(0, 3)],
        m[(1, 3)],
        m[(2, 3)],
        ax.to_degrees(),
        ay.to_degrees(),
        az.to_degrees(),
    )
}
