/// 兜底分类：被删除分类下的任务会归入这里
pub const FALLBACK_CATEGORY: &str = "Uncategorized";

/// 新建存储时的默认分类
pub const DEFAULT_CATEGORIES: [&str; 3] = [FALLBACK_CATEGORY, "Work", "Personal"];

/// 分类注册表：有序、名称唯一
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    names: Vec<String>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self {
            names: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CategoryRegistry {
    /// 从持久化列表构建，去重并保证非空
    pub fn from_names(names: Vec<String>) -> Self {
        let mut registry = Self { names: Vec::new() };
        for name in names {
            if !registry.contains(&name) {
                registry.names.push(name);
            }
        }
        registry.ensure_fallback_if_empty();
        registry
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// 返回 false 表示已存在
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// 返回 false 表示不存在
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    pub fn ensure_fallback(&mut self) {
        self.insert(FALLBACK_CATEGORY);
    }

    pub fn ensure_fallback_if_empty(&mut self) {
        if self.names.is_empty() {
            self.ensure_fallback();
        }
    }
}
