//! 无音频设备的输出：把每条通道命令写进日志。

use scene_runtime::{AudioOutput, ChannelCommand, ChannelKind};
use tracing::{debug, info};

/// 日志音频输出
#[derive(Debug, Default)]
pub struct LoggingAudioOutput {
    /// 已提交的命令数
    submitted: usize,
}

impl LoggingAudioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

impl AudioOutput for LoggingAudioOutput {
    fn channel_count(&self) -> usize {
        ChannelKind::ALL.len()
    }

    fn submit(&mut self, channel: ChannelKind, command: ChannelCommand) {
        self.submitted += 1;
        match command {
            ChannelCommand::PlayOneShot { clip } => {
                info!(channel = ?channel, clip = %clip.name(), "♪ 播放音效");
            }
            ChannelCommand::Play { clip, looping } => {
                info!(channel = ?channel, clip = %clip.name(), looping = looping, "♪ 播放");
            }
            ChannelCommand::Stop => info!(channel = ?channel, "■ 停止"),
            ChannelCommand::Pause => info!(channel = ?channel, "‖ 暂停"),
            ChannelCommand::Resume => info!(channel = ?channel, "▶ 恢复"),
            ChannelCommand::SetVolume(volume) => {
                debug!(channel = ?channel, volume = volume, "音量");
            }
        }
    }
}
