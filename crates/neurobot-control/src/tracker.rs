//! 跟踪数据
//!
//! - [`TrackerFrame`]: 一次原子采集的三个位姿槽（探针、头部、线圈）及其可见性
//! - [`LatestValue`]: 最新值覆盖存储（写端不阻塞，读端整体拷贝）
//! - [`coil_geometry`]: 双线圈几何（距离与制动方向）

use arc_swap::ArcSwap;
use nalgebra::Vector3;
use neurobot_protocol::Pose6;
use std::sync::Arc;
use tracing::debug;

/// 零长度判定阈值（mm）
const DEGENERATE_LENGTH: f64 = 1e-9;

/// 跟踪位姿槽
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerSlot {
    Probe = 0,
    Head = 1,
    Coil = 2,
}

/// 跟踪帧
///
/// 存储的位姿总是固定轴（sxyz）约定：[`TrackerFrame::from_raw`] 在入口处完成 rx/rz 交换。
/// 位姿只有在对应可见性为 `true` 时才有意义。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackerFrame {
    poses: [Pose6; 3],
    visible: [bool; 3],
}

impl TrackerFrame {
    /// 从跟踪系统的原始数据构造（rzyx 约定）
    pub fn from_raw(poses: [Pose6; 3], visibilities: [bool; 3]) -> Self {
        Self {
            poses: poses.map(Pose6::with_rx_rz_swapped),
            visible: visibilities,
        }
    }

    /// 不经过约定转换直接构造（位姿已是 sxyz）
    pub fn from_normalized(poses: [Pose6; 3], visibilities: [bool; 3]) -> Self {
        Self {
            poses,
            visible: visibilities,
        }
    }

    pub fn is_visible(&self, slot: TrackerSlot) -> bool {
        self.visible[slot as usize]
    }

    /// 可见时返回位姿
    pub fn pose(&self, slot: TrackerSlot) -> Option<Pose6> {
        self.is_visible(slot).then_some(self.poses[slot as usize])
    }

    /// 忽略可见性返回存储的位姿
    pub fn raw_pose(&self, slot: TrackerSlot) -> Pose6 {
        self.poses[slot as usize]
    }

    pub fn probe(&self) -> Option<Pose6> {
        self.pose(TrackerSlot::Probe)
    }

    pub fn head(&self) -> Option<Pose6> {
        self.pose(TrackerSlot::Head)
    }

    pub fn coil(&self) -> Option<Pose6> {
        self.pose(TrackerSlot::Coil)
    }
}

/// 最新值存储
///
/// 写入覆盖旧值，读取得到完整的一致快照；读写都不加锁。
#[derive(Debug)]
pub struct LatestValue<T> {
    inner: ArcSwap<T>,
}

impl<T: Clone> LatestValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: ArcSwap::from_pointee(value),
        }
    }

    pub fn store(&self, value: T) {
        self.inner.store(Arc::new(value));
    }

    /// 读取快照副本
    pub fn load(&self) -> T {
        self.inner.load().as_ref().clone()
    }

    pub fn load_full(&self) -> Arc<T> {
        self.inner.load_full()
    }
}

impl<T: Clone + Default> Default for LatestValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// 跟踪帧存储
pub type TrackerStore = LatestValue<TrackerFrame>;

/// 机器人当前位姿存储（尚未读到时为 `None`）
pub type RobotPoseStore = LatestValue<Option<Pose6>>;

/// 双线圈几何
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoilGeometry {
    /// 线圈中心距离（mm）
    pub distance: f64,
    /// 单位制动方向（从对方指向本线圈），退化时为零向量
    pub brake_direction: Vector3<f64>,
}

impl CoilGeometry {
    /// 任一线圈不可见时距离未知
    pub fn between(own: Option<&Pose6>, other: Option<&Pose6>) -> Option<Self> {
        match (own, other) {
            (Some(own), Some(other)) => Some(coil_geometry(own, other)),
            _ => None,
        }
    }
}

/// 计算本线圈相对于另一个线圈的距离与制动方向
pub fn coil_geometry(own: &Pose6, other: &Pose6) -> CoilGeometry {
    let own = Vector3::from(own.translation());
    let other = Vector3::from(other.translation());
    let separation = own - other;
    let distance = separation.norm();

    let brake_direction = if distance < DEGENERATE_LENGTH {
        debug!("Coil centres coincide, using zero brake direction");
        Vector3::zeros()
    } else {
        separation / distance
    };

    CoilGeometry {
        distance,
        brake_direction,
    }
}
