//! # Audio 模块
//!
//! 音效与 BGM 播放：音频缓存 + 三个播放通道 + 淡入淡出。
//!
//! ## 功能特性
//!
//! - 音效：一次性播放，同一通道上叠加
//! - 脚步声：循环播放，停止时 0.2 秒淡出
//! - BGM：循环、淡入淡出、暂停恢复
//! - 音量控制：音效/BGM 两组基础音量，淡出结束后恢复
//!
//! 淡变由宿主层每帧调用 [`SoundManager::update`] 推进。每个通道同时只有一个淡变，
//! 新的淡变直接覆盖旧的，被覆盖的淡变的后续动作（停止/暂停）不再执行。

mod cache;
mod channel;

pub use cache::{CacheStats, ClipCache};
pub use channel::{AudioOutput, ChannelCommand, ChannelKind, PlayState, PlaybackChannel};

use tracing::{debug, error, info};

use crate::config::SoundConfig;
use crate::error::SetupError;
use crate::fade::Fade;
use crate::host::{AssetStore, DialogueEvent};

/// 脚步声停止时的淡出时长（秒）
pub const FOOTSTEP_FADE_OUT: f32 = 0.2;

/// 音效子目录
const SE_DIR: &str = "SE";

/// BGM 子目录
const BGM_DIR: &str = "BGM";

/// 音量分组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeGroup {
    /// 音效 + 脚步声
    Effects,
    /// BGM
    Music,
}

/// 对外的声音服务
///
/// 结局演出和其它调用方只通过这组操作使用音频，不直接接触通道和缓存。
pub trait SoundService {
    /// 播放音效
    fn play_effect(&mut self, name: &str);

    /// 开始循环播放脚步声
    fn play_footstep(&mut self);

    /// 淡出并停止脚步声
    fn stop_footstep(&mut self);

    /// 播放 BGM
    ///
    /// `resume` 为 true 且 `name` 就是当前加载的曲目时，从暂停处恢复。
    fn play_music(&mut self, name: &str, fade_in: f32, resume: bool);

    /// 淡出 BGM，结束后暂停（`pause`）或停止
    fn stop_music(&mut self, fade_out: f32, pause: bool);

    /// 立即设置分组音量，并作为该组的基础音量
    fn set_volume(&mut self, group: VolumeGroup, volume: f32);
}

/// 淡变结束后的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeEnd {
    /// 保持播放，音量落到基础音量
    Hold,
    /// 停止并恢复基础音量
    Stop,
    /// 暂停并恢复基础音量
    Pause,
}

#[derive(Debug, Clone)]
struct ChannelFade {
    fade: Fade,
    end: FadeEnd,
}

/// 声音管理器
///
/// 持有音频缓存和三个播放通道，是这些状态唯一的所有者。
pub struct SoundManager<S, O> {
    /// 资源仓库
    store: S,
    /// 宿主层音频输出
    output: O,
    /// 音频配置（基础音量会随 `set_volume` 更新）
    config: SoundConfig,
    /// 音效缓存（音效与脚步声共用）
    effect_cache: ClipCache,
    /// BGM 缓存
    music_cache: ClipCache,
    /// 通道状态，顺序同 [`ChannelKind::ALL`]
    channels: [PlaybackChannel; 3],
    /// 各通道进行中的淡变
    fades: [Option<ChannelFade>; 3],
    /// 装配错误（存在时所有操作都不生效）
    setup_error: Option<SetupError>,
}

impl<S, O> std::fmt::Debug for SoundManager<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundManager")
            .field("channels", &self.channels)
            .field("effect_cache", &self.effect_cache.len())
            .field("music_cache", &self.music_cache.len())
            .field("setup_error", &self.setup_error)
            .finish()
    }
}

impl<S: AssetStore, O: AudioOutput> SoundManager<S, O> {
    /// 创建声音管理器，并把配置中的基础音量应用到各通道
    ///
    /// 宿主层提供的音频源数量不正确时记录错误，管理器保持不可用状态而不是 panic。
    pub fn new(store: S, output: O, config: SoundConfig) -> Self {
        let expected = ChannelKind::ALL.len();
        let actual = output.channel_count();
        let setup_error = (actual != expected).then_some(SetupError::ChannelCount { expected, actual });
        if let Some(e) = &setup_error {
            error!(error = %e, "音频系统初始化失败");
        }

        let se_volume = config.se_volume;
        let bgm_volume = config.bgm_volume;

        let mut manager = Self {
            store,
            output,
            config,
            effect_cache: ClipCache::new(),
            music_cache: ClipCache::new(),
            channels: ChannelKind::ALL.map(PlaybackChannel::new),
            fades: [None, None, None],
            setup_error,
        };

        manager.set_volume(VolumeGroup::Effects, se_volume);
        manager.set_volume(VolumeGroup::Music, bgm_volume);
        manager
    }

    /// 推进所有通道的淡变（每帧调用）
    ///
    /// # 参数
    ///
    /// - `dt`: 帧间隔时间（秒）
    pub fn update(&mut self, dt: f32) {
        for kind in ChannelKind::ALL {
            let Some(active) = self.fades[kind.index()].as_mut() else {
                continue;
            };
            let value = active.fade.advance(dt);
            let finished = active.fade.is_finished();
            let end = active.end;

            self.send(kind, ChannelCommand::SetVolume(value));
            if finished {
                self.fades[kind.index()] = None;
                self.finish_fade(kind, end);
            }
        }
    }

    /// 对话开始时的回调：有对话的场景播放决定音
    pub fn on_dialogue_started(&mut self) {
        if self.config.has_dialogue {
            let name = self.config.decision_sound.clone();
            self.play_effect(&name);
        }
    }

    /// 处理对话系统事件
    pub fn handle_dialogue_event(&mut self, event: &DialogueEvent) {
        match event {
            DialogueEvent::Started { node } => {
                debug!(node = %node, "对话开始");
                self.on_dialogue_started();
            }
        }
    }

    /// 播放决定音
    pub fn play_decision(&mut self) {
        let name = self.config.decision_sound.clone();
        self.play_effect(&name);
    }

    /// 播放取消音
    pub fn play_cancel(&mut self) {
        let name = self.config.cancel_sound.clone();
        self.play_effect(&name);
    }

    /// 播放对话翻页音
    pub fn play_dialogue_forward(&mut self) {
        let name = self.config.dialogue_forward_sound.clone();
        self.play_effect(&name);
    }

    /// 播放主题 BGM
    pub fn play_main_theme(&mut self, fade_in: f32) {
        let name = self.config.main_theme.clone();
        self.play_music(&name, fade_in, false);
    }

    /// 是否可用（装配成功）
    pub fn is_ready(&self) -> bool {
        self.setup_error.is_none()
    }

    /// 装配错误
    pub fn setup_error(&self) -> Option<&SetupError> {
        self.setup_error.as_ref()
    }

    /// 通道状态
    pub fn channel(&self, kind: ChannelKind) -> &PlaybackChannel {
        &self.channels[kind.index()]
    }

    /// 通道是否有进行中的淡变
    pub fn is_fading(&self, kind: ChannelKind) -> bool {
        self.fades[kind.index()].is_some()
    }

    /// 分组的基础音量
    pub fn base_volume(&self, group: VolumeGroup) -> f32 {
        match group {
            VolumeGroup::Effects => self.config.se_volume,
            VolumeGroup::Music => self.config.bgm_volume,
        }
    }

    pub fn effect_cache(&self) -> &ClipCache {
        &self.effect_cache
    }

    pub fn music_cache(&self) -> &ClipCache {
        &self.music_cache
    }

    pub fn config(&self) -> &SoundConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    // === 内部方法 ===

    fn effect_path(&self, name: &str) -> String {
        format!("{}/{}/{}", self.config.sound_root, SE_DIR, name)
    }

    fn music_path(&self, name: &str) -> String {
        format!("{}/{}/{}", self.config.sound_root, BGM_DIR, name)
    }

    /// 更新通道状态并转发给宿主层
    fn send(&mut self, kind: ChannelKind, command: ChannelCommand) {
        self.channels[kind.index()].apply(&command);
        self.output.submit(kind, command);
    }

    /// 开始淡变，覆盖通道上已有的淡变
    fn start_fade(&mut self, kind: ChannelKind, fade: Fade, end: FadeEnd) {
        if fade.duration() <= 0.0 {
            self.fades[kind.index()] = None;
            self.send(kind, ChannelCommand::SetVolume(fade.to()));
            self.finish_fade(kind, end);
            return;
        }
        self.fades[kind.index()] = Some(ChannelFade { fade, end });
    }

    fn finish_fade(&mut self, kind: ChannelKind, end: FadeEnd) {
        match end {
            FadeEnd::Hold => {}
            FadeEnd::Stop => self.send(kind, ChannelCommand::Stop),
            FadeEnd::Pause => self.send(kind, ChannelCommand::Pause),
        }
        let base = self.base_volume(group_of(kind));
        self.send(kind, ChannelCommand::SetVolume(base));
    }

    /// BGM 从 0 淡入到基础音量
    fn fade_in_music(&mut self, duration: f32) {
        let target = self.config.bgm_volume;
        self.send(ChannelKind::Music, ChannelCommand::SetVolume(0.0));
        self.start_fade(
            ChannelKind::Music,
            Fade::new(0.0, target, duration),
            FadeEnd::Hold,
        );
    }
}

impl<S: AssetStore, O: AudioOutput> SoundService for SoundManager<S, O> {
    fn play_effect(&mut self, name: &str) {
        if !self.is_ready() {
            return;
        }

        let path = self.effect_path(name);
        let clip = match self.effect_cache.get_or_load(name, &path, &self.store) {
            Ok(clip) => clip,
            Err(e) => {
                error!(sound = %name, error = %e, "音效未找到");
                return;
            }
        };

        debug!(sound = %name, "播放音效");
        self.send(ChannelKind::Effect, ChannelCommand::PlayOneShot { clip });
    }

    fn play_footstep(&mut self) {
        if !self.is_ready() || self.channel(ChannelKind::Footstep).is_playing() {
            return;
        }

        let name = self.config.footstep_sound.clone();
        let path = self.effect_path(&name);
        let clip = match self.effect_cache.get_or_load(&name, &path, &self.store) {
            Ok(clip) => clip,
            Err(e) => {
                error!(sound = %name, error = %e, "脚步声未找到");
                return;
            }
        };

        self.send(
            ChannelKind::Footstep,
            ChannelCommand::Play {
                clip,
                looping: true,
            },
        );
    }

    fn stop_footstep(&mut self) {
        if !self.is_ready() || !self.channel(ChannelKind::Footstep).is_playing() {
            return;
        }

        let current = self.channel(ChannelKind::Footstep).volume();
        self.start_fade(
            ChannelKind::Footstep,
            Fade::new(current, 0.0, FOOTSTEP_FADE_OUT),
            FadeEnd::Stop,
        );
    }

    fn play_music(&mut self, name: &str, fade_in: f32, resume: bool) {
        if !self.is_ready() {
            return;
        }

        if resume && self.channel(ChannelKind::Music).track() == Some(name) {
            info!(music = %name, fade_in = fade_in, "恢复 BGM");
            self.send(ChannelKind::Music, ChannelCommand::Resume);
            self.fade_in_music(fade_in);
            return;
        }

        let path = self.music_path(name);
        let clip = match self.music_cache.get_or_load(name, &path, &self.store) {
            Ok(clip) => clip,
            Err(e) => {
                error!(music = %name, error = %e, "BGM 未找到");
                return;
            }
        };

        info!(music = %name, fade_in = fade_in, "开始播放 BGM");
        self.channels[ChannelKind::Music.index()].set_track(name);
        self.send(
            ChannelKind::Music,
            ChannelCommand::Play {
                clip,
                looping: true,
            },
        );
        self.fade_in_music(fade_in);
    }

    fn stop_music(&mut self, fade_out: f32, pause: bool) {
        if !self.is_ready() {
            return;
        }

        info!(fade_out = fade_out, pause = pause, "BGM 淡出");
        let current = self.channel(ChannelKind::Music).volume();
        let end = if pause { FadeEnd::Pause } else { FadeEnd::Stop };
        self.start_fade(ChannelKind::Music, Fade::new(current, 0.0, fade_out), end);
    }

    fn set_volume(&mut self, group: VolumeGroup, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        match group {
            VolumeGroup::Effects => self.config.se_volume = volume,
            VolumeGroup::Music => self.config.bgm_volume = volume,
        }

        if !self.is_ready() {
            return;
        }
        for kind in ChannelKind::ALL {
            if group_of(kind) != group {
                continue;
            }
            // 进行中的淡入直接结束在新音量上；淡出仍会执行停止/暂停，结束后恢复新音量
            if self.fades[kind.index()]
                .as_ref()
                .is_some_and(|active| active.end == FadeEnd::Hold)
            {
                self.fades[kind.index()] = None;
            }
            self.send(kind, ChannelCommand::SetVolume(volume));
        }
    }
}

fn group_of(kind: ChannelKind) -> VolumeGroup {
    match kind {
        ChannelKind::Effect | ChannelKind::Footstep => VolumeGroup::Effects,
        ChannelKind::Music => VolumeGroup::Music,
    }
}
