//! # Stage 模块
//!
//! 结局演出用到的画面元素：全屏黑幕、解说图片面板、END 文字。
//!
//! 这些元素由宿主层渲染，演出控制器只修改它们的透明度、可见性和显示的图片。

use tracing::{debug, warn};

use crate::fade::FadeTarget;
use crate::host::{AssetStore, ImageHandle};

/// 带透明度的画面元素
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Overlay {
    alpha: f32,
    visible: bool,
}

impl Overlay {
    /// 隐藏、完全透明的元素
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl FadeTarget for Overlay {
    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// 解说图片集
///
/// 启动时一次性加载目录下的全部图片，按名称查找。
#[derive(Debug, Clone, Default)]
pub struct DescriptionAtlas {
    images: Vec<ImageHandle>,
}

impl DescriptionAtlas {
    pub fn new(images: Vec<ImageHandle>) -> Self {
        Self { images }
    }

    /// 从资源仓库加载目录下的全部图片
    ///
    /// 单张图片加载失败只记录警告并跳过。
    pub fn load<S: AssetStore + ?Sized>(store: &S, dir: &str) -> Self {
        let mut paths = store.list_images(dir);
        paths.sort();

        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            match store.load_image(&path) {
                Ok(image) => images.push(image),
                Err(e) => warn!(path = %path, error = %e, "解说图片加载失败"),
            }
        }
        debug!(dir = %dir, count = images.len(), "解说图片加载完成");
        Self { images }
    }

    /// 按名称查找
    pub fn find(&self, name: &str) -> Option<&ImageHandle> {
        self.images.iter().find(|image| image.name() == name)
    }

    /// 第一张图片（初始显示）
    pub fn first(&self) -> Option<&ImageHandle> {
        self.images.first()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// 解说进度对应的图片名
///
/// 进度从 0 开始，图片编号从 1 开始，两位补零：进度 2 → `Description03`。
/// 负数和 NaN 没有对应图片，返回 `None`。
pub fn description_image_key(progress: f32) -> Option<String> {
    if progress.is_nan() || progress < 0.0 {
        return None;
    }
    Some(format!(
        "Description{:02}",
        (progress as i32).saturating_add(1)
    ))
}

/// 解说面板：一个可淡入淡出的图片
#[derive(Debug, Clone, Default)]
pub struct DescriptionPanel {
    /// 面板透明度与可见性
    pub overlay: Overlay,
    /// 当前显示的图片
    image: Option<ImageHandle>,
}

impl DescriptionPanel {
    pub fn image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    /// 根据进度切换图片
    ///
    /// 找不到对应图片时保留当前图片。返回是否切换成功。
    pub fn show_progress(&mut self, atlas: &DescriptionAtlas, progress: f32) -> bool {
        let Some(key) = description_image_key(progress) else {
            return false;
        };
        if self.image.as_ref().is_some_and(|image| image.name() == key) {
            return true;
        }
        match atlas.find(&key) {
            Some(image) => {
                debug!(image = %key, "切换解说图片");
                self.image = Some(image.clone());
                true
            }
            None => false,
        }
    }
}

/// 结局演出的画面元素
#[derive(Debug, Clone, Default)]
pub struct EndingStage {
    /// 全屏黑幕
    pub screen: Overlay,
    /// 解说面板
    pub description: DescriptionPanel,
    /// END 文字
    pub end_label: Overlay,
    /// 解说图片集
    pub atlas: DescriptionAtlas,
}

impl EndingStage {
    /// 创建画面元素：解说面板隐藏，预先放上第一张图片
    pub fn new(atlas: DescriptionAtlas) -> Self {
        let description = DescriptionPanel {
            overlay: Overlay::hidden(),
            image: atlas.first().cloned(),
        };
        Self {
            screen: Overlay::hidden(),
            description,
            end_label: Overlay::hidden(),
            atlas,
        }
    }
}
