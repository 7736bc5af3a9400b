//! # Config 模块
//!
//! 场景配置，集中管理结局演出、音频与 NPC 漫游的可调参数。
//!
//! ## 配置优先级
//!
//! 1. 配置文件 (config.json)
//! 2. 默认值
//!
//! 配置文件中缺失的字段使用默认值，整个文件缺失或无法解析时使用默认配置。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::ConfigError;

/// 场景配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// 结局演出配置
    #[serde(default)]
    pub ending: EndingConfig,

    /// 音频配置
    #[serde(default)]
    pub sound: SoundConfig,

    /// NPC 漫游配置
    #[serde(default)]
    pub wander: WanderConfig,
}

/// 结局演出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndingConfig {
    /// 黑屏淡入淡出时长（秒）
    #[serde(default = "default_fade_time")]
    pub fade_time: f32,

    /// 结局 BGM 名称
    #[serde(default = "default_ending_music")]
    pub ending_music: String,

    /// 解说图片所在目录
    #[serde(default = "default_description_dir")]
    pub description_dir: String,

    /// 解说进度变量名
    #[serde(default = "default_progress_variable")]
    pub progress_variable: String,

    /// 结局开始时当前 BGM 的淡出时长（秒）
    #[serde(default = "default_trigger_fade_out")]
    pub trigger_music_fade_out: f32,
}

/// 音频配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundConfig {
    /// 场景中是否有对话（有对话时对话开始会播放决定音）
    #[serde(default)]
    pub has_dialogue: bool,

    /// 音频根目录（其下为 `SE/` 与 `BGM/`）
    #[serde(default = "default_sound_root")]
    pub sound_root: String,

    /// 对话翻页音效
    #[serde(default = "default_dialogue_forward_sound")]
    pub dialogue_forward_sound: String,

    /// 决定音效
    #[serde(default = "default_decision_sound")]
    pub decision_sound: String,

    /// 取消音效
    #[serde(default = "default_cancel_sound")]
    pub cancel_sound: String,

    /// 脚步声
    #[serde(default = "default_footstep_sound")]
    pub footstep_sound: String,

    /// 主题 BGM
    #[serde(default = "default_main_theme")]
    pub main_theme: String,

    /// BGM 音量 (0.0 - 1.0)
    #[serde(default = "default_bgm_volume")]
    pub bgm_volume: f32,

    /// 音效音量 (0.0 - 1.0)
    #[serde(default = "default_se_volume")]
    pub se_volume: f32,
}

/// NPC 漫游配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanderConfig {
    /// 移动速度（单位/秒）
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,

    /// 停下后的等待时长（秒）
    #[serde(default = "default_wait_time")]
    pub wait_time: f32,

    /// 到达目标点后停下的概率 (0.0 - 1.0)
    #[serde(default = "default_stop_probability")]
    pub stop_probability: f32,

    /// 视为到达目标点的距离
    #[serde(default = "default_arrive_distance")]
    pub arrive_distance: f32,

    /// 选取目标点时的最大尝试次数
    #[serde(default = "default_max_sample_attempts")]
    pub max_sample_attempts: u32,
}

fn default_fade_time() -> f32 {
    1.0
}

fn default_ending_music() -> String {
    "Ending".to_string()
}

fn default_description_dir() -> String {
    "Images".to_string()
}

fn default_progress_variable() -> String {
    "$DescriptionProgress".to_string()
}

fn default_trigger_fade_out() -> f32 {
    1.0
}

fn default_sound_root() -> String {
    "Sounds".to_string()
}

fn default_dialogue_forward_sound() -> String {
    "DialogueForward".to_string()
}

fn default_decision_sound() -> String {
    "Decision".to_string()
}

fn default_cancel_sound() -> String {
    "Cancel".to_string()
}

fn default_footstep_sound() -> String {
    "FootStep".to_string()
}

fn default_main_theme() -> String {
    "MainTheme".to_string()
}

fn default_bgm_volume() -> f32 {
    0.05
}

fn default_se_volume() -> f32 {
    0.2
}

fn default_move_speed() -> f32 {
    1.0
}

fn default_wait_time() -> f32 {
    2.0
}

fn default_stop_probability() -> f32 {
    0.5
}

fn default_arrive_distance() -> f32 {
    0.1
}

fn default_max_sample_attempts() -> u32 {
    1000
}

impl Default for EndingConfig {
    fn default() -> Self {
        Self {
            fade_time: default_fade_time(),
            ending_music: default_ending_music(),
            description_dir: default_description_dir(),
            progress_variable: default_progress_variable(),
            trigger_music_fade_out: default_trigger_fade_out(),
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            has_dialogue: false,
            sound_root: default_sound_root(),
            dialogue_forward_sound: default_dialogue_forward_sound(),
            decision_sound: default_decision_sound(),
            cancel_sound: default_cancel_sound(),
            footstep_sound: default_footstep_sound(),
            main_theme: default_main_theme(),
            bgm_volume: default_bgm_volume(),
            se_volume: default_se_volume(),
        }
    }
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            move_speed: default_move_speed(),
            wait_time: default_wait_time(),
            stop_probability: default_stop_probability(),
            arrive_distance: default_arrive_distance(),
            max_sample_attempts: default_max_sample_attempts(),
        }
    }
}

impl GameConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = ?path, "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = ?path, error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ending.fade_time < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "fade_time 不能为负数".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.sound.bgm_volume) {
            return Err(ConfigError::ValidationFailed(
                "BGM 音量必须在 0.0 - 1.0 之间".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.sound.se_volume) {
            return Err(ConfigError::ValidationFailed(
                "SE 音量必须在 0.0 - 1.0 之间".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.wander.stop_probability) {
            return Err(ConfigError::ValidationFailed(
                "stop_probability 必须在 0.0 - 1.0 之间".to_string(),
            ));
        }

        if self.wander.move_speed <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "move_speed 必须大于 0".to_string(),
            ));
        }

        if self.wander.max_sample_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_sample_attempts 必须大于 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.ending.fade_time, 1.0);
        assert_eq!(config.sound.bgm_volume, 0.05);
        assert_eq!(config.sound.se_volume, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "ending": { "fade_time": 2.5 }, "sound": { "has_dialogue": true } }"#;
        let config: GameConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.ending.fade_time, 2.5);
        assert_eq!(config.ending.ending_music, "Ending");
        assert!(config.sound.has_dialogue);
        assert_eq!(config.sound.footstep_sound, "FootStep");
        assert_eq!(config.wander, WanderConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GameConfig::default();

        config.sound.bgm_volume = 1.5;
        assert!(config.validate().is_err());
        config.sound.bgm_volume = 0.5;

        config.wander.stop_probability = -0.1;
        assert!(config.validate().is_err());
        config.wander.stop_probability = 0.3;

        config.wander.move_speed = 0.0;
        assert!(config.validate().is_err());
        config.wander.move_speed = 2.0;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = GameConfig::load(dir.path().join("missing.json"));
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = GameConfig::default();
        config.ending.ending_music = "Finale".to_string();
        config.wander.wait_time = 4.0;
        config.save(&path).unwrap();

        let loaded = GameConfig::load(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_json_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(GameConfig::load(&path), GameConfig::default());
    }
}
