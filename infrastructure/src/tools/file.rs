//! `file` tool — local file and folder operations.
//!
//! Relative paths are resolved against [`FileToolConfig::base_dir`], the same
//! directory the security policy resolves them against, so both agree on what
//! a name like `notes.txt` refers to.
//!
//! `search_files` takes a bare file-name pattern, never a path, and leaves
//! out anything under [`FileToolConfig::restricted_paths`].
//!
//! # Intents
//!
//! | Intent | Entities |
//! |--------|----------|
//! | `create_file` / `create_folder` | `path` |
//! | `delete_file` / `delete_folder` | `path` |
//! | `copy_file` / `move_file` | `source`, `destination` |
//! | `rename_file` | `source`, `new_name` |
//! | `list_files` | `path` (optional, defaults to the base directory) |
//! | `read_file` | `path` |
//! | `search_files` | `pattern`, `path` (optional) |
//! | `get_file_info` | `path` |

use addy_domain::security::path::{is_within, normalize_lexically, resolve};
use addy_domain::{Entities, ExecutionResult, Intent, Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use glob::{Pattern, glob};
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Canonical tool name.
pub const FILE: &str = "file";

/// Number of names shown per category in spoken listings.
const LISTING_PREVIEW: usize = 5;

/// Maximum number of search hits returned.
const MAX_SEARCH_RESULTS: usize = 200;

/// Constructor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FileToolConfig {
    pub base_dir: PathBuf,
    /// Reads stop after this many bytes.
    pub max_read_bytes: u64,
    /// Absolute prefixes search results never reveal.
    pub restricted_paths: Vec<PathBuf>,
}

impl Default for FileToolConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            max_read_bytes: 64 * 1024,
            restricted_paths: Vec::new(),
        }
    }
}

pub struct FileTool {
    descriptor: ToolDescriptor,
    config: FileToolConfig,
}

impl FileTool {
    pub fn new(config: FileToolConfig) -> Self {
        Self {
            descriptor: ToolDescriptor::new(FILE, "文件操作: 创建、删除、复制、移动、重命名、列出、读取、搜索")
                .with_intents([
                    Intent::CreateFile,
                    Intent::CreateFolder,
                    Intent::DeleteFile,
                    Intent::DeleteFolder,
                    Intent::CopyFile,
                    Intent::MoveFile,
                    Intent::RenameFile,
                    Intent::ListFiles,
                    Intent::ReadFile,
                    Intent::SearchFiles,
                    Intent::GetFileInfo,
                ]),
            config,
        }
    }

    pub fn config(&self) -> &FileToolConfig {
        &self.config
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_lexically(path)
        } else {
            normalize_lexically(&self.config.base_dir.join(path))
        }
    }

    fn required_path(&self, entities: &Entities, name: &str) -> Option<PathBuf> {
        entities
            .path(name)
            .map(Path::to_path_buf)
            .or_else(|| entities.text(name).map(PathBuf::from))
            .map(|p| self.resolve(&p))
    }

    async fn create_file(&self, path: PathBuf) -> Result<ExecutionResult, ToolError> {
        if fs::try_exists(&path).await? {
            return Ok(ExecutionResult::rejected(format!("文件已存在: {}", path.display())));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, b"").await?;
        Ok(ExecutionResult::success(format!("文件已创建: {}", path.display()))
            .with_data(json!({ "path": path.display().to_string() })))
    }

    async fn create_folder(&self, path: PathBuf) -> Result<ExecutionResult, ToolError> {
        if fs::try_exists(&path).await? {
            return Ok(ExecutionResult::rejected(format!("文件夹已存在: {}", path.display())));
        }
        fs::create_dir_all(&path).await?;
        Ok(ExecutionResult::success(format!("文件夹已创建: {}", path.display()))
            .with_data(json!({ "path": path.display().to_string() })))
    }

    async fn delete_file(&self, path: PathBuf) -> Result<ExecutionResult, ToolError> {
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(ExecutionResult::rejected(format!("不是文件: {}", path.display()))),
            Err(_) => return Ok(ExecutionResult::rejected(format!("文件不存在: {}", path.display()))),
        }
        fs::remove_file(&path).await?;
        Ok(ExecutionResult::success(format!("文件已删除: {}", path.display())))
    }

    async fn delete_folder(&self, path: PathBuf) -> Result<ExecutionResult, ToolError> {
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Ok(ExecutionResult::rejected(format!("不是文件夹: {}", path.display())));
            }
            Err(_) => {
                return Ok(ExecutionResult::rejected(format!("文件夹不存在: {}", path.display())));
            }
        }
        fs::remove_dir_all(&path).await?;
        Ok(ExecutionResult::success(format!("文件夹已删除: {}", path.display())))
    }

    /// Destination path for copy/move: an existing directory receives the
    /// source under its own name.
    async fn target_for(source: &Path, destination: PathBuf) -> PathBuf {
        let is_dir = fs::metadata(&destination)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        match (is_dir, source.file_name()) {
            (true, Some(name)) => destination.join(name),
            _ => destination,
        }
    }

    async fn copy_file(&self, source: PathBuf, destination: PathBuf) -> Result<ExecutionResult, ToolError> {
        if !fs::try_exists(&source).await? {
            return Ok(ExecutionResult::rejected(format!("源文件不存在: {}", source.display())));
        }
        let target = Self::target_for(&source, destination).await;
        fs::copy(&source, &target).await?;
        Ok(ExecutionResult::success(format!(
            "文件已复制: {} -> {}",
            source.display(),
            target.display()
        )))
    }

    async fn move_file(&self, source: PathBuf, destination: PathBuf) -> Result<ExecutionResult, ToolError> {
        if !fs::try_exists(&source).await? {
            return Ok(ExecutionResult::rejected(format!("源文件不存在: {}", source.display())));
        }
        let target = Self::target_for(&source, destination).await;
        fs::rename(&source, &target).await?;
        Ok(ExecutionResult::success(format!(
            "文件已移动: {} -> {}",
            source.display(),
            target.display()
        )))
    }

    async fn rename_file(&self, source: PathBuf, new_name: &str) -> Result<ExecutionResult, ToolError> {
        if new_name.contains(['/', '\\']) || new_name == ".." || new_name == "." {
            return Ok(ExecutionResult::rejected(format!("无效的新名称: {}", new_name)));
        }
        if !fs::try_exists(&source).await? {
            return Ok(ExecutionResult::rejected(format!("文件不存在: {}", source.display())));
        }
        let target = source
            .parent()
            .map(|p| p.join(new_name))
            .unwrap_or_else(|| PathBuf::from(new_name));
        if fs::try_exists(&target).await? {
            return Ok(ExecutionResult::rejected(format!("目标已存在: {}", target.display())));
        }
        fs::rename(&source, &target).await?;
        Ok(ExecutionResult::success(format!(
            "文件已重命名: {} -> {}",
            source.display(),
            target.display()
        )))
    }

    async fn list_files(&self, dir: PathBuf) -> Result<ExecutionResult, ToolError> {
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Ok(ExecutionResult::rejected(format!("目录不存在: {}", dir.display()))),
        }

        let mut folders = Vec::new();
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await?.is_dir() {
                folders.push(name);
            } else {
                files.push(name);
            }
        }
        folders.sort();
        files.sort();

        let mut message = format!("目录 {} 包含:", dir.display());
        if !folders.is_empty() {
            message.push_str(&format!("\n文件夹 ({}): {}", folders.len(), preview(&folders)));
        }
        if !files.is_empty() {
            message.push_str(&format!("\n文件 ({}): {}", files.len(), preview(&files)));
        }
        if folders.is_empty() && files.is_empty() {
            message = format!("目录 {} 是空的", dir.display());
        }

        Ok(ExecutionResult::success(message).with_data(json!({
            "path": dir.display().to_string(),
            "folders": folders,
            "files": files,
        })))
    }

    async fn read_file(&self, path: PathBuf) -> Result<ExecutionResult, ToolError> {
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(ExecutionResult::rejected(format!("不是文件: {}", path.display()))),
            Err(_) => return Ok(ExecutionResult::rejected(format!("文件不存在: {}", path.display()))),
        }

        let file = fs::File::open(&path).await?;
        let mut buf = Vec::new();
        file.take(self.config.max_read_bytes + 1)
            .read_to_end(&mut buf)
            .await?;
        let truncated = buf.len() as u64 > self.config.max_read_bytes;
        if truncated {
            buf.truncate(self.config.max_read_bytes as usize);
        }
        let content = String::from_utf8_lossy(&buf).into_owned();

        let mut message = format!("文件内容:\n{}", content);
        if truncated {
            message.push_str(&format!("\n... (仅显示前 {} 字节)", self.config.max_read_bytes));
        }
        Ok(ExecutionResult::success(message).with_data(json!({
            "path": path.display().to_string(),
            "content": content,
            "truncated": truncated,
        })))
    }

    fn is_restricted(&self, path: &Path) -> bool {
        if self.config.restricted_paths.is_empty() {
            return false;
        }
        let resolved = resolve(path, &self.config.base_dir);
        self.config
            .restricted_paths
            .iter()
            .any(|prefix| is_within(&resolved, prefix))
    }

    async fn search_files(&self, pattern: &str, dir: PathBuf) -> Result<ExecutionResult, ToolError> {
        if pattern.contains(['/', '\\']) || pattern.contains("..") {
            return Ok(ExecutionResult::rejected(format!(
                "无效的搜索模式: {} (只能是文件名)",
                pattern
            )));
        }
        let file_pattern = if pattern.contains(['*', '?', '[']) {
            pattern.to_string()
        } else {
            format!("*{}*", pattern)
        };
        let root = Pattern::escape(&dir.to_string_lossy());
        let full_pattern = Path::new(&root).join("**").join(&file_pattern);
        let full_pattern = full_pattern.to_string_lossy().into_owned();

        let entries = match glob(&full_pattern) {
            Ok(entries) => entries,
            Err(e) => return Ok(ExecutionResult::rejected(format!("无效的搜索模式: {}", e))),
        };
        let matches: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|p| p.is_file() && !self.is_restricted(p))
            .take(MAX_SEARCH_RESULTS)
            .map(|p| p.display().to_string())
            .collect();

        if matches.is_empty() {
            return Ok(ExecutionResult::success(format!(
                "未找到匹配模式 '{}' 的文件",
                pattern
            ))
            .with_data(json!({ "matches": matches })));
        }

        let mut message = format!("找到 {} 个匹配的文件:", matches.len());
        for m in matches.iter().take(10) {
            message.push_str(&format!("\n{}", m));
        }
        if matches.len() > 10 {
            message.push_str(&format!("\n... 还有 {} 个文件", matches.len() - 10));
        }
        Ok(ExecutionResult::success(message).with_data(json!({ "matches": matches })))
    }

    async fn file_info(&self, path: PathBuf) -> Result<ExecutionResult, ToolError> {
        let Ok(meta) = fs::metadata(&path).await else {
            return Ok(ExecutionResult::rejected(format!("文件不存在: {}", path.display())));
        };
        let kind = if meta.is_dir() { "文件夹" } else { "文件" };
        let modified = meta
            .modified()
            .ok()
            .map(|t| chrono::DateTime::<chrono::Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut message = format!(
            "文件信息:\n名称: {}\n大小: {} 字节\n类型: {}",
            name,
            meta.len(),
            kind
        );
        if let Some(modified) = &modified {
            message.push_str(&format!("\n修改时间: {}", modified));
        }
        Ok(ExecutionResult::success(message).with_data(json!({
            "path": path.display().to_string(),
            "size": meta.len(),
            "is_dir": meta.is_dir(),
            "modified": modified,
        })))
    }
}

fn preview(names: &[String]) -> String {
    let shown = names
        .iter()
        .take(LISTING_PREVIEW)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > LISTING_PREVIEW {
        format!("{} ... 还有 {} 个", shown, names.len() - LISTING_PREVIEW)
    } else {
        shown
    }
}

#[async_trait]
impl Tool for FileTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        intent: Intent,
        entities: &Entities,
        _raw_text: &str,
    ) -> Result<ExecutionResult, ToolError> {
        let required: &[&str] = match intent {
            Intent::CopyFile | Intent::MoveFile => &["source", "destination"],
            Intent::RenameFile => &["source", "new_name"],
            Intent::SearchFiles => &["pattern"],
            Intent::ListFiles => &[],
            _ => &["path"],
        };
        let missing = entities.missing(required);
        if !missing.is_empty() {
            return Ok(ExecutionResult::missing_parameters(&missing));
        }

        let path = |name: &str| self.required_path(entities, name).unwrap_or_default();

        match intent {
            Intent::CreateFile => self.create_file(path("path")).await,
            Intent::CreateFolder => self.create_folder(path("path")).await,
            Intent::DeleteFile => self.delete_file(path("path")).await,
            Intent::DeleteFolder => self.delete_folder(path("path")).await,
            Intent::CopyFile => self.copy_file(path("source"), path("destination")).await,
            Intent::MoveFile => self.move_file(path("source"), path("destination")).await,
            Intent::RenameFile => {
                let new_name = entities.text("new_name").unwrap_or_default();
                self.rename_file(path("source"), new_name.trim()).await
            }
            Intent::ListFiles => {
                let dir = self
                    .required_path(entities, "path")
                    .unwrap_or_else(|| self.resolve(Path::new(".")));
                self.list_files(dir).await
            }
            Intent::ReadFile => self.read_file(path("path")).await,
            Intent::SearchFiles => {
                let pattern = entities.text("pattern").unwrap_or_default();
                let dir = self
                    .required_path(entities, "path")
                    .unwrap_or_else(|| self.resolve(Path::new(".")));
                self.search_files(&pattern, dir).await
            }
            Intent::GetFileInfo => self.file_info(path("path")).await,
            other => Ok(ExecutionResult::rejected(format!("不支持的文件操作: {}", other))),
        }
    }
}
