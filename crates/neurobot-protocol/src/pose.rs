//! 位姿与力传感器数据类型
//!
//! `Pose6` 是整个控制链路的公共语言：跟踪系统、坐标变换、避障控制器与
//! 控制器协议都以 `(x, y, z, rx, ry, rz)` 交换数据。
//!
//! - 平移单位：毫米
//! - 旋转单位：度，机器人空间使用固定轴（"sxyz"）约定

use crate::ProtocolError;
use std::fmt;
use std::ops::{Index, IndexMut};

/// rx 分量下标
pub const RX_INDEX: usize = 3;
/// rz 分量下标
pub const RZ_INDEX: usize = 5;

/// 6 自由度位姿 `(x, y, z, rx, ry, rz)`
///
/// 长度在类型层面固定为 6，缺失的轴通过 [`Pose6::from_partial`] 补 0。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose6(pub [f64; 6]);

impl Pose6 {
    /// 零位姿
    pub const ZERO: Self = Pose6([0.0; 6]);

    pub const fn new(x: f64, y: f64, z: f64, rx: f64, ry: f64, rz: f64) -> Self {
        Pose6([x, y, z, rx, ry, rz])
    }

    /// 由平移（mm）和欧拉角（度）拼接
    pub const fn from_parts(translation: [f64; 3], rotation: [f64; 3]) -> Self {
        Pose6([
            translation[0],
            translation[1],
            translation[2],
            rotation[0],
            rotation[1],
            rotation[2],
        ])
    }

    /// 从不足 6 个元素的序列构建，缺失轴补 0，多余元素忽略
    pub fn from_partial(values: &[f64]) -> Self {
        let mut pose = [0.0; 6];
        for (slot, value) in pose.iter_mut().zip(values) {
            *slot = *value;
        }
        Pose6(pose)
    }

    pub fn translation(&self) -> [f64; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    pub fn rotation(&self) -> [f64; 3] {
        [self.0[3], self.0[4], self.0[5]]
    }

    pub fn as_array(&self) -> &[f64; 6] {
        &self.0
    }

    pub fn to_array(self) -> [f64; 6] {
        self.0
    }

    /// 原地交换 rx 与 rz
    ///
    /// 上游跟踪系统使用旋转坐标系（"rzyx"）欧拉角，其实现等价于把 x/z 旋转互换，
    /// 因此交换两个分量即可得到这里使用的固定轴（"sxyz"）约定。该操作是对合的：
    /// 执行两次得到原位姿。
    pub fn swap_rx_rz(&mut self) {
        self.0.swap(RX_INDEX, RZ_INDEX);
    }

    /// 返回交换 rx/rz 后的副本
    pub fn with_rx_rz_swapped(mut self) -> Self {
        self.swap_rx_rz();
        self
    }

    /// 平移叠加偏移量，姿态保持不变
    pub fn translated(mut self, offset: [f64; 3]) -> Self {
        for (axis, delta) in offset.iter().enumerate() {
            self.0[axis] += delta;
        }
        self
    }

    /// 所有分量都是有限值
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl From<[f64; 6]> for Pose6 {
    fn from(values: [f64; 6]) -> Self {
        Pose6(values)
    }
}

impl From<Pose6> for [f64; 6] {
    fn from(pose: Pose6) -> Self {
        pose.0
    }
}

impl TryFrom<&[f64]> for Pose6 {
    type Error = ProtocolError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        let array: [f64; 6] = values.try_into().map_err(|_| ProtocolError::InvalidLength {
            expected: 6,
            actual: values.len(),
        })?;
        Ok(Pose6(array))
    }
}

impl Index<usize> for Pose6 {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Pose6 {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.0[index]
    }
}

impl fmt::Display for Pose6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z, rx, ry, rz] = self.0;
        write!(
            f,
            "({:.3}, {:.3}, {:.3} | {:.3}°, {:.3}°, {:.3}°)",
            x, y, z, rx, ry, rz
        )
    }
}

/// 六维力/力矩传感器读数
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForceTorque {
    /// Fx, Fy, Fz（N）
    pub force: [f64; 3],
    /// Mx, My, Mz（Nm）
    pub torque: [f64; 3],
}

impl ForceTorque {
    pub const ZERO: Self = ForceTorque {
        force: [0.0; 3],
        torque: [0.0; 3],
    };

    /// 从 `[Fx, Fy, Fz, Mx, My, Mz]` 构建
    pub fn from_array(values: [f64; 6]) -> Self {
        Self {
            force: [values[0], values[1], values[2]],
            torque: [values[3], values[4], values[5]],
        }
    }

    pub fn to_array(self) -> [f64; 6] {
        [
            self.force[0],
            self.force[1],
            self.force[2],
            self.torque[0],
            self.torque[1],
            self.torque[2],
        ]
    }
}
