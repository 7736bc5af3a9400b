//! # Camera 模块
//!
//! 两台虚拟相机（玩家跟随 / 地图俯瞰），优先级最高者为当前相机。
//! 宿主层每帧读取 [`CameraRig::active`] 决定渲染视角。

use serde::{Deserialize, Serialize};

/// 虚拟相机
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualCamera {
    /// 相机名称
    pub name: String,
    /// 优先级（越大越优先）
    pub priority: i32,
}

impl VirtualCamera {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }
}

/// 相机组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraRig {
    /// 地图俯瞰相机
    pub overview: VirtualCamera,
    /// 玩家跟随相机
    pub follow: VirtualCamera,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            overview: VirtualCamera::new("MapOverview", 0),
            follow: VirtualCamera::new("PlayerFollow", 1),
        }
    }
}

impl CameraRig {
    /// 切换到俯瞰相机
    ///
    /// 两个优先级在同一次调用里写入，宿主层不会观察到两者相等的中间状态。
    pub fn switch_to_overview(&mut self) {
        self.overview.priority = 1;
        self.follow.priority = 0;
    }

    /// 切换回跟随相机
    pub fn switch_to_follow(&mut self) {
        self.follow.priority = 1;
        self.overview.priority = 0;
    }

    /// 当前生效的相机（优先级相同时跟随相机优先）
    pub fn active(&self) -> &VirtualCamera {
        if self.overview.priority > self.follow.priority {
            &self.overview
        } else {
            &self.follow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_follow() {
        let rig = CameraRig::default();
        assert_eq!(rig.active().name, "PlayerFollow");
    }

    #[test]
    fn test_switch_to_overview() {
        let mut rig = CameraRig::default();
        rig.switch_to_overview();
        assert_eq!(rig.active().name, "MapOverview");
        assert!(rig.overview.priority > rig.follow.priority);

        rig.switch_to_follow();
        assert_eq!(rig.active().name, "PlayerFollow");
    }
}
