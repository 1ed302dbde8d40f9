use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tokio::time::sleep;

/// 缓存项
#[derive(Debug, Clone)]
struct CacheItem<T> {
    value: T,
    expires_at: Instant,
}

/// 简单的内存缓存实现, 用于首页帖子列表片段
///
/// 窗口期内返回缓存的渲染结果, 即使底层数据已经变化;
/// 过期或显式清空后重新计算。
#[derive(Debug, Clone)]
pub struct Cache<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<String, CacheItem<T>>>>,
    default_ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> Cache<T> {
    /// 创建新的缓存实例并启动后台清理任务
    pub fn new(default_ttl: Duration) -> Self {
        let cache = Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        };

        let data_ref = cache.data.clone();
        tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(60)).await;
                Self::cleanup_expired(&data_ref);
            }
        });

        cache
    }

    pub fn set(&self, key: String, value: T) {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    pub fn set_with_ttl(&self, key: String, value: T, ttl: Duration) {
        let item = CacheItem {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.insert(key, item);
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        match data.get(key) {
            // 过期项留给清理任务删除, 读锁下只跳过
            Some(item) if item.expires_at > Instant::now() => Some(item.value.clone()),
            _ => None,
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.remove(key).is_some()
    }

    /// 清空所有缓存, 强制下一次请求重新渲染
    pub fn clear(&self) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.clear();
    }

    pub fn len(&self) -> usize {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cleanup_expired(data: &Arc<RwLock<HashMap<String, CacheItem<T>>>>) {
        let mut data = data.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        data.retain(|_, item| item.expires_at > now);
    }
}

/// 首页片段的缓存键, 按页码区分, 与用户无关
pub fn index_page_key(page: i64) -> String {
    format!("index:page:{}", page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let cache = Cache::new(Duration::from_secs(1));

        cache.set("key1".to_string(), "value1".to_string());
        assert_eq!(cache.get("key1"), Some("value1".to_string()));

        assert_eq!(cache.get("nonexistent"), None);

        assert!(cache.remove("key1"));
        assert_eq!(cache.get("key1"), None);
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = Cache::new(Duration::from_millis(50));

        cache.set("temp_key".to_string(), "temp_value".to_string());
        assert_eq!(cache.get("temp_key"), Some("temp_value".to_string()));

        sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("temp_key"), None);
    }

    #[tokio::test]
    async fn test_cached_value_is_stable_until_cleared() {
        let cache = Cache::new(Duration::from_secs(60));
        let key = index_page_key(1);

        cache.set(key.clone(), "<ul><li>post</li></ul>".to_string());

        // 数据源变化不影响窗口期内的缓存内容
        let first = cache.get(&key);
        let second = cache.get(&key);
        assert_eq!(first, second);
        assert_eq!(first, Some("<ul><li>post</li></ul>".to_string()));

        cache.clear();
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn test_index_page_key() {
        assert_eq!(index_page_key(1), "index:page:1");
        assert_eq!(index_page_key(7), "index:page:7");
    }
}
