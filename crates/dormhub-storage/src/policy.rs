//! Upload categories and acceptance rules.

use std::fmt;
use std::str::FromStr;

use dormhub_core::config::StorageConfig;
use dormhub_core::error::AppError;
use dormhub_core::result::AppResult;

/// Where an upload belongs. Each category is its own subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadCategory {
    /// Photos and documents attached to service forms.
    Forms,
    /// Payment receipts attached to bills.
    Receipts,
    /// Images attached to news posts.
    News,
}

impl UploadCategory {
    /// Directory name for the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forms => "forms",
            Self::Receipts => "receipts",
            Self::News => "news",
        }
    }
}

impl fmt::Display for UploadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forms" => Ok(Self::Forms),
            "receipts" => Ok(Self::Receipts),
            "news" => Ok(Self::News),
            other => Err(AppError::not_found(format!("Unknown upload category: {other}"))),
        }
    }
}

/// Size and extension limits applied before anything touches disk.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_size_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    /// Build the policy from storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            max_size_bytes: config.max_upload_size_bytes,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Maximum accepted size in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Check an upload's name and size. Returns the lowercase extension.
    pub fn check(&self, original_name: &str, size_bytes: u64) -> AppResult<String> {
        if size_bytes == 0 {
            return Err(AppError::validation("Uploaded file is empty"));
        }
        if size_bytes > self.max_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds the {} byte upload limit",
                self.max_size_bytes
            )));
        }
        let ext = extension(original_name)
            .ok_or_else(|| AppError::validation("Uploaded file has no extension"))?;
        if !self.allowed_extensions.iter().any(|allowed| *allowed == ext) {
            return Err(AppError::validation(format!(
                "File type .{ext} is not allowed"
            )));
        }
        Ok(ext)
    }
}

/// Lowercase extension of a file name.
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Reject names that could escape their directory.
pub fn ensure_plain_name(name: &str) -> AppResult<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.contains('\0');
    if bad {
        return Err(AppError::validation(format!("Invalid file name: {name}")));
    }
    Ok(())
}

/// Turn a client-supplied name into a safe stored-name suffix.
pub fn sanitize(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.replace("..", "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UploadPolicy {
        UploadPolicy::from_config(&StorageConfig::default())
    }

    #[test]
    fn test_policy_accepts_image() {
        assert_eq!(policy().check("leak.JPG", 1024).unwrap(), "jpg");
    }

    #[test]
    fn test_policy_rejects_oversize_and_type() {
        let p = policy();
        assert!(p.check("big.png", p.max_size_bytes() + 1).is_err());
        assert!(p.check("script.exe", 10).is_err());
        assert!(p.check("noext", 10).is_err());
        assert!(p.check("empty.png", 0).is_err());
    }

    #[test]
    fn test_plain_name_rejects_traversal() {
        assert!(ensure_plain_name("abc_leak.jpg").is_ok());
        assert!(ensure_plain_name("../etc/passwd").is_err());
        assert!(ensure_plain_name("a/b.jpg").is_err());
        assert!(ensure_plain_name("..\\x.jpg").is_err());
        assert!(ensure_plain_name(".env").is_err());
    }

    #[test]
    fn test_sanitize_strips_paths_and_odd_chars() {
        assert_eq!(sanitize("C:\\Users\\me\\my receipt.pdf"), "my_receipt.pdf");
        assert_eq!(sanitize("../../x.png"), "x.png");
        assert_eq!(sanitize("..."), "upload");
    }

    #[test]
    fn test_category_round_trip() {
        assert_eq!("receipts".parse::<UploadCategory>().unwrap(), UploadCategory::Receipts);
        assert!("avatars".parse::<UploadCategory>().is_err());
    }
}
