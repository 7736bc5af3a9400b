//! # Clip Cache 模块
//!
//! 音频缓存：按逻辑名首次使用时加载，之后一直保留。
//!
//! 音频目录是有限的小集合，所以没有驱逐策略，也不会重新加载已缓存的键。

use std::collections::HashMap;

use crate::error::ResourceError;
use crate::host::{AssetStore, AudioClip};

/// 音频缓存
#[derive(Debug, Default)]
pub struct ClipCache {
    /// 缓存条目（逻辑名 -> 音频）
    entries: HashMap<String, AudioClip>,
    /// 统计：命中次数
    hits: u64,
    /// 统计：未命中次数
    misses: u64,
}

impl ClipCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取音频，未缓存时从 `path` 加载
    ///
    /// 加载失败不会写入缓存，下次请求会再次尝试。
    pub fn get_or_load<S: AssetStore + ?Sized>(
        &mut self,
        name: &str,
        path: &str,
        store: &S,
    ) -> Result<AudioClip, ResourceError> {
        if let Some(clip) = self.entries.get(name) {
            self.hits += 1;
            return Ok(clip.clone());
        }

        self.misses += 1;
        let clip = store.load_audio(path)?;
        self.entries.insert(name.to_string(), clip.clone());
        Ok(clip)
    }

    /// 只读获取（不加载、不计数）
    pub fn get(&self, name: &str) -> Option<&AudioClip> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 获取统计信息
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if self.hits + self.misses > 0 {
                self.hits as f64 / (self.hits + self.misses) as f64
            } else {
                0.0
            },
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// 缓存条目数量
    pub entries: usize,
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 命中率
    pub hit_rate: f64,
}

impl CacheStats {
    /// 格式化为可读字符串
    pub fn format(&self) -> String {
        format!(
            "Clips: {} entries, hit rate: {:.1}% ({} hits / {} misses)",
            self.entries,
            self.hit_rate * 100.0,
            self.hits,
            self.misses,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ImageHandle;
    use std::cell::Cell;

    struct CountingStore {
        loads: Cell<usize>,
    }

    impl AssetStore for CountingStore {
        fn load_audio(&self, path: &str) -> Result<AudioClip, ResourceError> {
            self.loads.set(self.loads.get() + 1);
            if path.ends_with("Missing") {
                return Err(ResourceError::NotFound {
                    path: path.to_string(),
                });
            }
            Ok(AudioClip::new(path.rsplit('/').next().unwrap_or(path), path, vec![1u8]))
        }

        fn load_image(&self, path: &str) -> Result<ImageHandle, ResourceError> {
            Err(ResourceError::NotFound {
                path: path.to_string(),
            })
        }

        fn list_images(&self, _dir: &str) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn test_load_once() {
        let store = CountingStore { loads: Cell::new(0) };
        let mut cache = ClipCache::new();

        let a = cache.get_or_load("Ding", "Sounds/SE/Ding", &store).unwrap();
        let b = cache.get_or_load("Ding", "Sounds/SE/Ding", &store).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.loads.get(), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!(stats.format().contains("50.0%"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let store = CountingStore { loads: Cell::new(0) };
        let mut cache = ClipCache::new();

        cache.get_or_load("ding", "Sounds/SE/ding", &store).unwrap();
        cache.get_or_load("Ding", "Sounds/SE/Ding", &store).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(store.loads.get(), 2);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let store = CountingStore { loads: Cell::new(0) };
        let mut cache = ClipCache::new();

        assert!(cache.get_or_load("Missing", "Sounds/SE/Missing", &store).is_err());
        assert!(cache.is_empty());
        assert!(!cache.contains("Missing"));
    }
}
