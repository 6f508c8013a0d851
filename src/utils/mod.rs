//! 工具函数模块
//!
//! 提供文件系统相关的通用工具函数：
//! - 日志目录定位
//! - 输出路径准备与同文件判断

pub mod file_system;

// 重新导出常用函数
pub use file_system::*;
