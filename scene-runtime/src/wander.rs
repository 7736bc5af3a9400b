//! # Wander 模块
//!
//! NPC 漫游行为：在多边形区域内随机选点，走过去，随机停一会儿，再选下一个点。
//!
//! ```text
//!        到达目标点且 random < stop_probability
//! Moving ────────────────────────────────────► Waiting
//!   ▲  │ 到达目标点（不停下）：直接选新目标          │
//!   │  └──────────────┘                              │
//!   └──────────────── 等待 wait_time 秒 ◄────────────┘
//! ```
//!
//! 物理积分由宿主层负责：本模块只根据当前位置给出速度和动画参数。

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};
use tracing::warn;

use crate::config::WanderConfig;

/// 二维向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// 单位向量，零向量保持为零
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len > f32::EPSILON {
            Vec2::new(self.x / len, self.y / len)
        } else {
            Vec2::ZERO
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

/// 可移动区域（简单多边形）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Vec2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self { vertices }
    }

    /// 矩形区域
    pub fn rect(min: Vec2, max: Vec2) -> Self {
        Self::new(vec![
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ])
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// 至少三个顶点才构成区域
    pub fn is_valid(&self) -> bool {
        self.vertices.len() >= 3
    }

    /// 包围盒，无顶点时返回 `None`
    pub fn bounds(&self) -> Option<Bounds> {
        let first = *self.vertices.first()?;
        let (min, max) = self.vertices.iter().fold((first, first), |(min, max), v| {
            (
                Vec2::new(min.x.min(v.x), min.y.min(v.y)),
                Vec2::new(max.x.max(v.x), max.y.max(v.y)),
            )
        });
        Some(Bounds { min, max })
    }

    /// 点是否在多边形内（奇偶规则射线法）
    pub fn contains(&self, point: Vec2) -> bool {
        if !self.is_valid() {
            return false;
        }

        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > point.y) != (b.y > point.y)
                && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// 漫游状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WanderState {
    /// 向目标点移动
    Moving { target: Vec2 },
    /// 原地等待
    Waiting { remaining: f32 },
}

/// 每次更新的输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WanderOutput {
    /// 期望速度
    pub velocity: Vec2,
    /// 动画朝向（静止时保持上一次的移动方向）
    pub facing: Vec2,
    /// 动画速度参数（速度的平方长度）
    pub speed: f32,
}

/// 视为"在移动"的最小平方长度
const MOVING_THRESHOLD: f32 = 0.1;

/// 漫游行为
#[derive(Debug, Clone)]
pub struct WanderBehavior {
    config: WanderConfig,
    area: Polygon,
    state: WanderState,
    last_direction: Vec2,
}

impl WanderBehavior {
    /// 创建漫游行为，并从 `position` 选出第一个目标点
    pub fn new<R: Rng>(config: WanderConfig, area: Polygon, position: Vec2, rng: &mut R) -> Self {
        let mut behavior = Self {
            config,
            area,
            state: WanderState::Waiting { remaining: 0.0 },
            last_direction: Vec2::ZERO,
        };
        behavior.retarget(position, rng);
        behavior
    }

    /// 推进 `dt` 秒
    pub fn update<R: Rng>(&mut self, position: Vec2, dt: f32, rng: &mut R) -> WanderOutput {
        match self.state {
            WanderState::Waiting { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.retarget(position, rng);
                } else {
                    self.state = WanderState::Waiting { remaining };
                }
                self.idle()
            }
            WanderState::Moving { target } => {
                if position.distance(target) <= self.config.arrive_distance {
                    if rng.random::<f32>() < self.config.stop_probability {
                        self.state = WanderState::Waiting {
                            remaining: self.config.wait_time,
                        };
                        return self.idle();
                    }
                    self.retarget(position, rng);
                }
                self.step_towards(position)
            }
        }
    }

    /// 从 `from` 出发沿水平或竖直方向选一个区域内的点
    ///
    /// 拒绝采样，超过最大尝试次数时返回 `None`。
    pub fn pick_target<R: Rng>(&self, from: Vec2, rng: &mut R) -> Option<Vec2> {
        if !self.area.is_valid() {
            return None;
        }
        let bounds = self.area.bounds()?;

        for _ in 0..self.config.max_sample_attempts {
            let candidate = if rng.random_bool(0.5) {
                Vec2::new(rng.random_range(bounds.min.x..=bounds.max.x), from.y)
            } else {
                Vec2::new(from.x, rng.random_range(bounds.min.y..=bounds.max.y))
            };
            if self.area.contains(candidate) {
                return Some(candidate);
            }
        }
        None
    }

    pub fn state(&self) -> WanderState {
        self.state
    }

    pub fn area(&self) -> &Polygon {
        &self.area
    }

    // === 内部方法 ===

    fn retarget<R: Rng>(&mut self, position: Vec2, rng: &mut R) {
        self.state = match self.pick_target(position, rng) {
            Some(target) => WanderState::Moving { target },
            None => {
                warn!(x = position.x, y = position.y, "找不到区域内的目标点，原地等待");
                WanderState::Waiting {
                    remaining: self.config.wait_time,
                }
            }
        };
    }

    fn step_towards(&mut self, position: Vec2) -> WanderOutput {
        let WanderState::Moving { target } = self.state else {
            return self.idle();
        };

        let direction = (target - position).normalized();
        let velocity = direction * self.config.move_speed;
        if velocity.length_squared() > MOVING_THRESHOLD {
            self.last_direction = direction;
        }

        let facing = if direction.length_squared() > MOVING_THRESHOLD {
            direction
        } else {
            self.last_direction
        };

        WanderOutput {
            velocity,
            facing,
            speed: velocity.length_squared(),
        }
    }

    fn idle(&self) -> WanderOutput {
        WanderOutput {
            velocity: Vec2::ZERO,
            facing: self.last_direction,
            speed: 0.0,
        }
    }
}
