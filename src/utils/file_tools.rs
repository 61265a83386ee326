//! 文件工具模块
//!
//! 提供打开文件输出所需的实用工具函数，包括目录创建、
//! 追加模式打开与权限验证。

use crate::error::{QuantumSinkError, Result};
use std::fs::{self, File, OpenOptions};
use std::path::Path;

/// 文件工具结构体
///
/// 提供各种文件操作的静态方法
pub struct FileTools;

impl FileTools {
    /// 确保目录存在，如果不存在则创建
    ///
    /// # 参数
    ///
    /// * `path` - 目录路径
    ///
    /// # 返回值
    ///
    /// 成功时返回 `Ok(())`，失败时返回错误
    pub fn ensure_directory_exists<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() {
            return Ok(());
        }

        if !path.exists() {
            fs::create_dir_all(path)?;
        } else if !path.is_dir() {
            return Err(QuantumSinkError::invalid_path(format!(
                "路径存在但不是目录: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// 安全地打开文件进行追加写入
    ///
    /// # 参数
    ///
    /// * `file_path` - 文件路径
    /// * `create_parents` - 是否创建缺失的父目录
    ///
    /// # 返回值
    ///
    /// 成功时返回文件句柄，失败时返回错误
    pub fn open_file_append<P: AsRef<Path>>(file_path: P, create_parents: bool) -> Result<File> {
        let file_path = file_path.as_ref();

        if file_path.is_dir() {
            return Err(QuantumSinkError::invalid_path(format!(
                "路径是目录而不是文件: {}",
                file_path.display()
            )));
        }

        if create_parents {
            if let Some(parent) = file_path.parent() {
                Self::ensure_directory_exists(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        Ok(file)
    }

    /// 检查目录是否可写
    ///
    /// 如果目录可写返回 `true`，否则返回 `false`
    pub fn is_directory_writable<P: AsRef<Path>>(dir_path: P) -> bool {
        let dir_path = dir_path.as_ref();

        if !dir_path.exists() || !dir_path.is_dir() {
            return false;
        }

        // 尝试在目录中创建临时文件
        let temp_file = dir_path.join(".quantum_sink_write_test");
        let result = File::create(&temp_file).is_ok();

        // 清理临时文件
        if temp_file.exists() {
            let _ = fs::remove_file(&temp_file);
        }

        result
    }
}
