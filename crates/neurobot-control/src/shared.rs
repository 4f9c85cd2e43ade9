//! 跨线程共享的避障控制器
//!
//! 控制循环线程调用 `compute_offset`，消息线程调用 `update_config`。
//! 两者都持有同一把锁，配置更新不会与一次计算交错。

use crate::repulsion::{RepulsionConfig, RepulsionController, RepulsionOutput};
use crate::update::{ConfigUpdate, UpdateReport};
use nalgebra::Vector3;
use parking_lot::Mutex;
use std::sync::Arc;

/// 共享控制器句柄（克隆共享同一个控制器实例）
#[derive(Debug, Clone, Default)]
pub struct SharedRepulsion {
    inner: Arc<Mutex<RepulsionController>>,
}

impl SharedRepulsion {
    pub fn new(cfg: RepulsionConfig) -> Self {
        Self::from_controller(RepulsionController::new(cfg))
    }

    pub fn from_controller(controller: RepulsionController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub fn compute_offset(&self, distance: Option<f64>, dt: f64) -> RepulsionOutput {
        self.inner.lock().compute_offset(distance, dt)
    }

    pub fn update_config(&self, update: &ConfigUpdate) -> UpdateReport {
        self.inner.lock().update_config(update)
    }

    pub fn update_opposite_coil_vector(&self, direction: Vector3<f64>) {
        self.inner.lock().update_opposite_coil_vector(direction);
    }

    pub fn override_safety_margin(&self, margin: f64) {
        self.inner.lock().override_safety_margin(margin);
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// 当前配置的快照
    pub fn config(&self) -> RepulsionConfig {
        *self.inner.lock().config()
    }

    pub fn last_output(&self) -> RepulsionOutput {
        self.inner.lock().last_output()
    }

    /// 在锁内执行任意操作
    pub fn with<R>(&self, f: impl FnOnce(&mut RepulsionController) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
