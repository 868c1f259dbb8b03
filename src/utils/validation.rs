use crate::utils::error::{Result, StoryError};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl Into<String>, reason: impl Into<String>) -> StoryError {
    StoryError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.into(),
        reason: reason.into(),
    }
}

/// API 端點必須是有 host 的 http(s) URL
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    let url = Url::parse(url_str).map_err(|e| invalid(field_name, url_str, e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field_name,
            url_str,
            format!("expected http or https, got {}", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid(field_name, url_str, "URL has no host"));
    }
    Ok(())
}

/// 背景圖、字型、session 檔這類要讀寫的檔案路徑
pub fn validate_file_path(field_name: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(invalid(field_name, "", "file path cannot be empty"));
    }
    if path.file_name().is_none() {
        return Err(invalid(
            field_name,
            path.display().to_string(),
            "path does not name a file",
        ));
    }
    if path.is_dir() {
        return Err(invalid(
            field_name,
            path.display().to_string(),
            "path is a directory",
        ));
    }
    Ok(())
}

/// 輸出目錄可以還不存在，但不能是一個既有的檔案
pub fn validate_dir_path(field_name: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(invalid(field_name, "", "directory path cannot be empty"));
    }
    if path.exists() && !path.is_dir() {
        return Err(invalid(
            field_name,
            path.display().to_string(),
            "path exists and is not a directory",
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "value cannot be blank"));
    }
    Ok(())
}

pub fn validate_required_field<'a>(field_name: &str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(StoryError::MissingConfigError {
            field: field_name.to_string(),
        }),
    }
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value.to_string(),
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}
