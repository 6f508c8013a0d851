//! 文件系统操作工具
//!
//! 提供跨平台的日志目录定位、输出目录创建等功能

use std::path::{Path, PathBuf};

/// 获取默认日志目录路径（跨平台）
///
/// - macOS: ~/Library/Logs/comment-analyzer
/// - Windows: %APPDATA%/comment-analyzer/logs
/// - Linux: ~/.local/share/comment-analyzer/logs
pub fn default_log_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join("Library/Logs/comment-analyzer")
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("comment-analyzer").join("logs")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share/comment-analyzer/logs")
    }
}

/// 确保文件的父目录存在
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// 判断两个路径是否指向同一个文件
///
/// 两者都存在时比较规范化后的路径，否则退化为字面比较
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
