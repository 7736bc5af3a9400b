//! # Assets 模块
//!
//! 文件系统资源仓库。
//!
//! ## 路径约定
//!
//! - 调用方使用**逻辑路径**（相对于资源根目录，`/` 分隔，可省略扩展名）
//! - 省略扩展名时按固定顺序探测已知扩展名
//! - 资源名取逻辑路径的文件名（不含扩展名）

use scene_runtime::{AssetStore, AudioClip, ImageHandle, ResourceError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 探测顺序：音频
const AUDIO_EXTENSIONS: &[&str] = &["ogg", "wav", "mp3"];

/// 探测顺序：图片
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// 规范化逻辑路径
///
/// 统一 `/` 分隔符，去掉 `.` 与空组件，`..` 回退一级（不会越过根目录）。
pub fn normalize_logical_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut components = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }
    components.join("/")
}

/// 资源名：逻辑路径的文件名去掉扩展名
fn asset_name(logical: &str) -> String {
    Path::new(logical)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| logical.to_string())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// 文件系统资源仓库
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    /// 资源根目录
    base_path: PathBuf,
}

impl FsAssetStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 把逻辑路径解析为实际文件
    ///
    /// 逻辑路径本身存在时直接使用，否则依次尝试 `extensions`。
    fn resolve(&self, logical: &str, extensions: &[&str]) -> Result<PathBuf, ResourceError> {
        let normalized = normalize_logical_path(logical);
        let direct = self.base_path.join(&normalized);
        if direct.is_file() {
            return Ok(direct);
        }

        extensions
            .iter()
            .map(|ext| self.base_path.join(format!("{normalized}.{ext}")))
            .find(|candidate| candidate.is_file())
            .ok_or(ResourceError::NotFound { path: normalized })
    }

    fn read(&self, logical: &str, extensions: &[&str], kind: &str) -> Result<Vec<u8>, ResourceError> {
        let full_path = self.resolve(logical, extensions)?;
        debug!(path = %full_path.display(), kind = kind, "读取资源");
        std::fs::read(&full_path).map_err(|e| ResourceError::LoadFailed {
            path: full_path.to_string_lossy().to_string(),
            kind: kind.to_string(),
            message: e.to_string(),
        })
    }
}

impl AssetStore for FsAssetStore {
    fn load_audio(&self, path: &str) -> Result<AudioClip, ResourceError> {
        let data = self.read(path, AUDIO_EXTENSIONS, "audio")?;
        Ok(AudioClip::new(asset_name(path), path, data))
    }

    fn load_image(&self, path: &str) -> Result<ImageHandle, ResourceError> {
        let data = self.read(path, IMAGE_EXTENSIONS, "image")?;
        Ok(ImageHandle::new(asset_name(path), data))
    }

    fn list_images(&self, dir: &str) -> Vec<String> {
        let logical_dir = normalize_logical_path(dir);
        let Ok(entries) = std::fs::read_dir(self.base_path.join(&logical_dir)) else {
            return Vec::new();
        };

        let mut images: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_extension(path, IMAGE_EXTENSIONS))
            .filter_map(|path| {
                let file_name = path.file_name()?.to_string_lossy().into_owned();
                Some(if logical_dir.is_empty() {
                    file_name
                } else {
                    format!("{logical_dir}/{file_name}")
                })
            })
            .collect();
        images.sort();
        images
    }
}
