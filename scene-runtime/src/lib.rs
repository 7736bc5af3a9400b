//! # Scene Runtime
//!
//! 推理冒险游戏的场景逻辑核心：结局演出、音效管理、NPC 漫游。
//!
//! ## 架构概述
//!
//! `scene-runtime` 不依赖任何渲染引擎或音频设备。所有状态由宿主层每帧
//! 传入的 `dt` 推进，对外部世界的操作都通过 [`host`] 中的 trait 完成：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── update(flag, dt, ctx) ──────►│ EndingSequence
//!   │──── update(dt) ─────────────────►│ SoundManager
//!   │◄─── ChannelCommand ──────────────│ (AudioOutput)
//!   │──── update(pos, dt, rng) ───────►│ WanderBehavior
//!   │◄─── WanderOutput ────────────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`EndingSequence`]：结局演出状态机
//! - [`SoundManager`]：三通道音效管理（实现 [`SoundService`]）
//! - [`WanderBehavior`]：多边形区域内的漫游行为
//! - [`Fade`]：线性插值的淡入淡出
//! - [`GameConfig`]：可序列化的配置
//!
//! ## 模块结构
//!
//! - [`audio`]：音效通道、缓存与管理器
//! - [`camera`]：虚拟相机优先级
//! - [`config`]：配置加载与校验
//! - [`ending`]：结局演出
//! - [`error`]：错误类型定义
//! - [`fade`]：淡入淡出
//! - [`host`]：宿主层接口
//! - [`stage`]：演出画面元素
//! - [`wander`]：NPC 漫游

pub mod audio;
pub mod camera;
pub mod config;
pub mod ending;
pub mod error;
pub mod fade;
pub mod host;
pub mod stage;
pub mod wander;

// 重导出核心类型
pub use audio::{
    AudioOutput, CacheStats, ChannelCommand, ChannelKind, ClipCache, PlayState, PlaybackChannel,
    SoundManager, SoundService, VolumeGroup,
};
pub use camera::{CameraRig, VirtualCamera};
pub use config::{EndingConfig, GameConfig, SoundConfig, WanderConfig};
pub use ending::{EndingContext, EndingPhase, EndingSequence, SequenceState};
pub use error::{ConfigError, ResourceError, SetupError};
pub use fade::{Fade, FadeState, FadeTarget};
pub use host::{
    AssetStore, AudioClip, DialogueEvent, DialogueRunner, HudControls, ImageHandle, PlayerControl,
    ScreenLoader,
};
pub use stage::{DescriptionAtlas, DescriptionPanel, EndingStage, Overlay};
pub use wander::{Polygon, Vec2, WanderBehavior, WanderOutput, WanderState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常使用
        let _config = GameConfig::default();

        let _sequence = EndingSequence::new(EndingConfig::default());

        let _stage = EndingStage::new(DescriptionAtlas::default());

        let _area = Polygon::rect(Vec2::ZERO, Vec2::new(1.0, 1.0));

        let _fade = Fade::new(0.0, 1.0, 1.0);
    }
}
