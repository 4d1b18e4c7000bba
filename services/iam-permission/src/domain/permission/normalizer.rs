//! 名称规范化

/// 查找用名称规范化器
///
/// 创建、更新、按名查找和权限判定都经由同一个规范化器比较名称。
pub trait LookupNormalizer: Send + Sync {
    fn normalize(&self, name: &str) -> String;
}

/// 默认规范化：去除首尾空白后转为大写
#[derive(Debug, Clone, Copy, Default)]
pub struct UpperInvariantNormalizer;

impl LookupNormalizer for UpperInvariantNormalizer {
    fn normalize(&self, name: &str) -> String {
        name.trim().to_uppercase()
    }
}
