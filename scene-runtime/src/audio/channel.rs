//! # Channel 模块
//!
//! 播放通道模型与音频输出接口。
//!
//! `SoundManager` 只在 [`PlaybackChannel`] 上维护状态，并把每一次变化以
//! [`ChannelCommand`] 的形式交给宿主层的 [`AudioOutput`] 执行。

use crate::host::AudioClip;

/// 播放通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// 音效（一次性播放，可叠加）
    Effect,
    /// 脚步声（循环）
    Footstep,
    /// BGM（循环，可暂停恢复）
    Music,
}

impl ChannelKind {
    /// 全部通道，顺序即宿主层音频源的顺序
    pub const ALL: [ChannelKind; 3] = [Self::Effect, Self::Footstep, Self::Music];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Effect => 0,
            Self::Footstep => 1,
            Self::Music => 2,
        }
    }
}

/// 通道播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// 发送给宿主层的通道指令
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelCommand {
    /// 一次性播放，与通道上正在播放的声音叠加
    PlayOneShot { clip: AudioClip },
    /// 替换通道的音频并从头播放
    Play { clip: AudioClip, looping: bool },
    /// 停止（播放位置归零）
    Stop,
    /// 暂停（保留播放位置）
    Pause,
    /// 从暂停处恢复
    Resume,
    /// 立即设置音量
    SetVolume(f32),
}

/// 宿主层音频输出
pub trait AudioOutput {
    /// 宿主层提供的音频源数量，必须与 [`ChannelKind::ALL`] 一致
    fn channel_count(&self) -> usize;

    /// 执行通道指令
    fn submit(&mut self, channel: ChannelKind, command: ChannelCommand);
}

/// 单个播放通道的状态
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackChannel {
    kind: ChannelKind,
    /// 当前分配的音频（一次性播放不占用）
    clip: Option<AudioClip>,
    /// 当前音频对应的逻辑名（BGM 恢复检测用）
    track: Option<String>,
    volume: f32,
    looping: bool,
    state: PlayState,
}

impl PlaybackChannel {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            clip: None,
            track: None,
            volume: 1.0,
            looping: false,
            state: PlayState::Stopped,
        }
    }

    /// 按指令更新状态
    pub fn apply(&mut self, command: &ChannelCommand) {
        match command {
            ChannelCommand::PlayOneShot { .. } => {}
            ChannelCommand::Play { clip, looping } => {
                self.clip = Some(clip.clone());
                self.looping = *looping;
                self.state = PlayState::Playing;
            }
            ChannelCommand::Stop => self.state = PlayState::Stopped,
            ChannelCommand::Pause => {
                if self.state == PlayState::Playing {
                    self.state = PlayState::Paused;
                }
            }
            ChannelCommand::Resume => {
                // 已停止的通道恢复时从头播放
                if self.clip.is_some() && self.state != PlayState::Playing {
                    self.state = PlayState::Playing;
                }
            }
            ChannelCommand::SetVolume(volume) => self.volume = *volume,
        }
    }

    pub(crate) fn set_track(&mut self, track: impl Into<String>) {
        self.track = Some(track.into());
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    /// 当前加载的曲目名
    pub fn track(&self) -> Option<&str> {
        self.track.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    /// 是否正在播放（暂停不算）
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }
}
