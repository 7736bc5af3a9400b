//! # Phase 模块
//!
//! 结局演出的状态与阶段定义。阶段顺序固定，不可跳过。

/// 结局演出阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndingPhase {
    /// 禁止玩家移动，停用对话系统
    LockInput,
    /// 画面暗转（黑幕 0 → 1）
    FadeOut,
    /// 切换到俯瞰相机
    CameraSwitch,
    /// 播放结局 BGM 并等待
    PlayMusic,
    /// 画面亮起（黑幕 1 → 0）
    FadeIn,
    /// 重新启用对话系统，开始 `Ending` 节点
    StartEndingDialogue,
    /// 等待 `Ending` 节点结束
    WaitForEndingNode,
    /// 开始 `Description` 节点
    StartDescriptionDialogue,
    /// 解说面板淡入
    DescriptionFadeIn,
    /// 等待 `Description` 节点结束，期间跟随进度切换解说图片
    WaitForDescriptionNode,
    /// 停用对话系统，解说面板淡出
    DescriptionFadeOut,
    /// 再次暗转
    FinalFadeOut,
    /// END 文字淡入
    ShowEndLabel,
    /// BGM 淡出（不等待），END 文字停留
    HoldEndLabel,
    /// END 文字淡出
    HideEndLabel,
    /// 切换场景前的停顿
    FinalWait,
    /// 切换到剧本选择场景
    LoadNextScreen,
}

impl EndingPhase {
    /// 全部阶段，按执行顺序
    pub const ORDER: [EndingPhase; 17] = [
        Self::LockInput,
        Self::FadeOut,
        Self::CameraSwitch,
        Self::PlayMusic,
        Self::FadeIn,
        Self::StartEndingDialogue,
        Self::WaitForEndingNode,
        Self::StartDescriptionDialogue,
        Self::DescriptionFadeIn,
        Self::WaitForDescriptionNode,
        Self::DescriptionFadeOut,
        Self::FinalFadeOut,
        Self::ShowEndLabel,
        Self::HoldEndLabel,
        Self::HideEndLabel,
        Self::FinalWait,
        Self::LoadNextScreen,
    ];

    /// 下一个阶段，最后一个阶段返回 `None`
    pub fn next(self) -> Option<EndingPhase> {
        let index = Self::ORDER.iter().position(|p| *p == self)?;
        Self::ORDER.get(index + 1).copied()
    }
}

/// 结局演出状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceState {
    /// 尚未触发
    #[default]
    Idle,
    /// 正在执行某个阶段
    Running(EndingPhase),
    /// 已切换场景
    Completed,
}

impl SequenceState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// 当前阶段
    pub fn phase(&self) -> Option<EndingPhase> {
        match self {
            Self::Running(phase) => Some(*phase),
            _ => None,
        }
    }
}
