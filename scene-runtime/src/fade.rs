//! # Fade 模块
//!
//! 定时插值器：在 `duration` 秒内把一个标量从 `from` 线性过渡到 `to`。
//!
//! 核心设计：插值器只关注 f32 值的时间轴变化，由外部每帧传入 `dt` 推进，
//! 不假设被驱动对象的类型。画面遮罩的透明度、音频通道的音量都用它来驱动。
//!
//! ```text
//! begin(target)          advance(dt) × N                 完成
//!   │ visible = true       │ t = clamp(elapsed / duration)   │ value == to
//!   │ alpha = from         │ value = lerp(from, to, t)       │
//! ```

/// 可淡入淡出的对象
///
/// 拥有一个 0.0 - 1.0 的透明度通道和一个可见性开关。
pub trait FadeTarget {
    /// 当前透明度
    fn alpha(&self) -> f32;

    /// 设置透明度
    fn set_alpha(&mut self, alpha: f32);

    /// 设置可见性
    fn set_visible(&mut self, visible: bool);
}

/// 线性插值
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// 插值器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeState {
    /// 尚未采样
    #[default]
    Pending,
    /// 正在进行
    Playing,
    /// 已完成（值已精确落在 `to` 上）
    Completed,
}

/// 单次淡变
///
/// 一次性消耗：完成后不能重新开始，需要新的过渡时创建新的 `Fade`。
#[derive(Debug, Clone, PartialEq)]
pub struct Fade {
    /// 起始值
    from: f32,
    /// 目标值
    to: f32,
    /// 时长（秒）
    duration: f32,
    /// 已经过的时间
    elapsed: f32,
    /// 最近一次采样的值
    value: f32,
    /// 当前状态
    state: FadeState,
}

impl Fade {
    /// 创建新的淡变
    ///
    /// `duration <= 0` 的淡变在第一次采样时直接给出 `to`。
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: 0.0,
            value: from,
            state: FadeState::Pending,
        }
    }

    /// 开始淡变：先让目标可见，再把透明度设为起始值
    ///
    /// 即使起始透明度为 0 也会设为可见，保证淡入在第一次采样前就已显示。
    pub fn begin<T: FadeTarget + ?Sized>(&self, target: &mut T) {
        target.set_alpha(self.from);
        target.set_visible(true);
    }

    /// 推进 `dt` 秒并返回新的值
    pub fn advance(&mut self, dt: f32) -> f32 {
        match self.state {
            FadeState::Completed => return self.to,
            FadeState::Pending => self.state = FadeState::Playing,
            FadeState::Playing => {}
        }

        if self.duration <= 0.0 {
            return self.finish();
        }

        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.duration {
            return self.finish();
        }

        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.value = lerp(self.from, self.to, t);
        self.value
    }

    /// 推进并把值写入目标
    ///
    /// # 返回
    /// - `true`: 淡变仍在进行中
    /// - `false`: 淡变已结束
    pub fn apply<T: FadeTarget + ?Sized>(&mut self, dt: f32, target: &mut T) -> bool {
        let value = self.advance(dt);
        target.set_alpha(value);
        !self.is_finished()
    }

    /// 以固定步长展开为有限的采样序列
    ///
    /// 最后一个元素总是 `to`。步长不为正时只产出 `to`。
    pub fn samples(self, dt: f32) -> FadeSamples {
        FadeSamples { fade: self, dt }
    }

    fn finish(&mut self) -> f32 {
        self.elapsed = self.duration.max(0.0);
        self.value = self.to;
        self.state = FadeState::Completed;
        self.to
    }

    /// 当前值
    pub fn value(&self) -> f32 {
        self.value
    }

    /// 起始值
    pub fn from(&self) -> f32 {
        self.from
    }

    /// 目标值
    pub fn to(&self) -> f32 {
        self.to
    }

    /// 时长
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// 当前状态
    pub fn state(&self) -> FadeState {
        self.state
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state == FadeState::Completed
    }
}

/// [`Fade::samples`] 返回的采样迭代器
#[derive(Debug, Clone)]
pub struct FadeSamples {
    fade: Fade,
    dt: f32,
}

impl Iterator for FadeSamples {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.fade.is_finished() {
            return None;
        }
        if self.dt <= 0.0 {
            return Some(self.fade.finish());
        }
        Some(self.fade.advance(self.dt))
    }
}
