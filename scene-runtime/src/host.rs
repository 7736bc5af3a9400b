//! # Host 接口模块
//!
//! scene-runtime 是纯逻辑核心，渲染、对话脚本、场景加载、资源读取都由宿主层提供。
//! 本模块定义宿主层需要实现的窄接口，以及在接口之间传递的资源句柄。
//!
//! ## 路径约定
//!
//! 资源路径都是**逻辑路径**：相对于资源根目录、使用 `/` 分隔、不带扩展名
//! （如 `Sounds/SE/decide`），由具体的 [`AssetStore`] 决定如何解析。

use std::sync::Arc;

use crate::error::ResourceError;

/// 已加载的音频数据句柄
///
/// 克隆只增加引用计数，不复制数据。
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// 逻辑名称（不含目录和扩展名）
    name: String,
    /// 逻辑路径
    path: String,
    /// 编码后的音频数据
    data: Arc<[u8]>,
}

impl AudioClip {
    /// 创建音频句柄
    pub fn new(name: impl Into<String>, path: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            data: data.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// 已加载的图片句柄
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    /// 逻辑名称（不含目录和扩展名）
    name: String,
    /// 编码后的图片数据
    data: Arc<[u8]>,
}

impl ImageHandle {
    /// 创建图片句柄
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// 资源仓库
///
/// 找不到资源时返回 [`ResourceError::NotFound`]，调用方负责降级处理。
pub trait AssetStore {
    /// 加载音频
    fn load_audio(&self, path: &str) -> Result<AudioClip, ResourceError>;

    /// 加载图片
    fn load_image(&self, path: &str) -> Result<ImageHandle, ResourceError>;

    /// 列出目录下所有图片的逻辑路径
    fn list_images(&self, dir: &str) -> Vec<String>;
}

/// 对话系统发出的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueEvent {
    /// 节点开始播放
    Started {
        /// 节点名
        node: String,
    },
}

/// 对话系统
pub trait DialogueRunner {
    /// 激活/停用对话系统
    fn set_active(&mut self, active: bool);

    /// 中断正在进行的对话
    fn stop(&mut self);

    /// 从指定节点开始对话
    fn start_dialogue(&mut self, node: &str);

    /// 节点是否已经访问过
    fn has_visited_node(&self, node: &str) -> bool;

    /// 读取数值变量，变量不存在时返回 `None`
    fn number_variable(&self, name: &str) -> Option<f32>;

    /// 取走上次调用以来产生的事件
    ///
    /// 宿主层每帧调用一次，把事件转发给关心它们的系统（如 [`SoundManager`]）。
    ///
    /// [`SoundManager`]: crate::audio::SoundManager
    fn take_events(&mut self) -> Vec<DialogueEvent>;
}

/// 场景切换
pub trait ScreenLoader {
    /// 切换到指定场景（结束当前场景）
    fn load_screen(&mut self, name: &str);
}

/// 玩家控制
pub trait PlayerControl {
    /// 是否接受移动输入
    fn set_can_move(&mut self, can_move: bool);
}

/// 游戏内 HUD 开关
pub trait HudControls {
    /// 对话记录界面
    fn set_log_view_available(&mut self, available: bool);

    /// 线索界面
    fn set_clue_view_available(&mut self, available: bool);

    /// "开始对话" 按钮
    fn set_start_dialogue_button_available(&mut self, available: bool);
}
