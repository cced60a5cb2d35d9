//! Local checks on a file before it is uploaded.

use crate::api::Upload;
use crate::error::{Result, ResultExt as _, WranglerError};
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// File extensions the backend can import, with the content type each part is
/// sent as. The server picks its parser from the content type.
pub const SUPPORTED_TYPES: &[(&str, &str)] = &[
    ("csv", "text/csv"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.ms-excel"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("parquet", "application/parquet"),
];

const MAX_NAME_LEN: usize = 255;

/// Import tool name the backend lists for files with extension `ext`.
/// Excel workbooks share one processor; the other types are named after
/// their extension.
fn import_tool_for(ext: &str) -> &str {
    match ext {
        "xls" | "xlsx" => "excel",
        other => other,
    }
}

/// True when `tool` names one of [`SUPPORTED_TYPES`], by extension, tool
/// name or content type.
fn is_known_tool(tool: &str) -> bool {
    SUPPORTED_TYPES.iter().any(|(ext, mime)| {
        tool.eq_ignore_ascii_case(ext)
            || tool.eq_ignore_ascii_case(import_tool_for(ext))
            || tool.eq_ignore_ascii_case(mime)
    })
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Trims `name` and rejects values the backend cannot route to.
pub fn validate_dataset_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WranglerError::Validation("dataset name is empty".to_owned()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(WranglerError::Validation(format!(
            "dataset name is longer than {MAX_NAME_LEN} characters"
        )));
    }
    if name.contains('/') || name.chars().any(char::is_control) {
        return Err(WranglerError::Validation(format!(
            "dataset name '{name}' contains '/' or control characters"
        )));
    }
    Ok(name.to_owned())
}

/// A validated file, ready to be read and uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    path: PathBuf,
    file_name: String,
    mime_type: &'static str,
    dataset_name: String,
    size: u64,
}

impl ImportRequest {
    /// Checks that `path` is a non-empty file of a supported type. The dataset
    /// name defaults to the file stem when `dataset_name` is blank.
    pub fn new(path: impl Into<PathBuf>, dataset_name: Option<&str>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path).map_err(|e| {
            WranglerError::Validation(format!("cannot read '{}': {e}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(WranglerError::Validation(format!(
                "'{}' is not a file",
                path.display()
            )));
        }
        if metadata.len() == 0 {
            return Err(WranglerError::Validation(format!(
                "'{}' is empty",
                path.display()
            )));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| WranglerError::Validation("file name is not valid UTF-8".to_owned()))?
            .to_owned();

        let mime_type = mime_for_path(&path).ok_or_else(|| {
            let supported: Vec<&str> = SUPPORTED_TYPES.iter().map(|(e, _)| *e).collect();
            WranglerError::Validation(format!(
                "unsupported file type '{file_name}', expected one of: {}",
                supported.join(", ")
            ))
        })?;

        let requested = dataset_name.map(str::trim).filter(|n| !n.is_empty());
        let name = match requested {
            Some(name) => name.to_owned(),
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_owned(),
        };
        let dataset_name = validate_dataset_name(&name)?;

        Ok(Self {
            path,
            file_name,
            mime_type,
            dataset_name,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Rejects the file when the backend advertises import tools and none of
    /// them matches its extension, tool name (`Excel` for `.xls`/`.xlsx`) or
    /// content type. An empty list, or one naming no type this client knows,
    /// allows everything.
    pub fn check_allowed(&self, import_tools: &[String]) -> Result<()> {
        if !import_tools.iter().any(|t| is_known_tool(t)) {
            return Ok(());
        }
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let tool = import_tool_for(&ext);
        let allowed = import_tools.iter().any(|t| {
            t.eq_ignore_ascii_case(&ext)
                || t.eq_ignore_ascii_case(tool)
                || t.eq_ignore_ascii_case(self.mime_type)
        });
        if allowed {
            Ok(())
        } else {
            Err(WranglerError::Validation(format!(
                "the server does not import '{ext}' files (available: {})",
                import_tools.join(", ")
            )))
        }
    }

    pub async fn into_upload(self) -> Result<Upload> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(Upload {
            file_name: self.file_name,
            mime_type: self.mime_type,
            dataset_name: self.dataset_name,
            bytes: Bytes::from(bytes),
        })
    }
}

/// `1536` -> `"1.5 KB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_owned();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_name_defaults_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "Q3 Sales.csv", b"a,b\n1,2\n");

        let request = ImportRequest::new(&path, Some("   ")).unwrap();
        assert_eq!(request.dataset_name(), "Q3 Sales");
        assert_eq!(request.mime_type(), "text/csv");
        assert_eq!(request.file_name(), "Q3 Sales.csv");
        assert_eq!(request.size(), 8);

        let request = ImportRequest::new(&path, Some("  quarterly  ")).unwrap();
        assert_eq!(request.dataset_name(), "quarterly");
    }

    #[test]
    fn test_rejects_unsupported_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let exe = write_file(dir.path(), "tool.exe", b"MZ");
        assert!(ImportRequest::new(&exe, None).unwrap_err().is_validation());

        let empty = write_file(dir.path(), "empty.csv", b"");
        assert!(ImportRequest::new(&empty, None).unwrap_err().is_validation());

        let missing = dir.path().join("missing.csv");
        assert!(ImportRequest::new(&missing, None).unwrap_err().is_validation());
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "book.XLSX", b"PK");
        let request = ImportRequest::new(&path, None).unwrap();
        assert_eq!(request.mime_type(), "application/vnd.ms-excel");
    }

    #[test]
    fn test_dataset_name_validation() {
        assert_eq!(validate_dataset_name("  sales ").unwrap(), "sales");
        assert!(validate_dataset_name("").is_err());
        assert!(validate_dataset_name("a/b").is_err());
        assert!(validate_dataset_name("tab\there").is_err());
        assert!(validate_dataset_name(&"x".repeat(300)).is_err());
    }

    #[test]
    fn test_check_allowed_against_import_tools() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.json", b"[]");
        let request = ImportRequest::new(&path, None).unwrap();

        assert!(request.check_allowed(&[]).is_ok());
        assert!(request.check_allowed(&["csv".to_owned(), "json".to_owned()]).is_ok());
        assert!(request.check_allowed(&["application/json".to_owned()]).is_ok());
        assert!(request.check_allowed(&["csv".to_owned()]).unwrap_err().is_validation());
    }

    #[test]
    fn test_check_allowed_with_processor_names() {
        let dir = tempfile::tempdir().unwrap();
        let tools: Vec<String> = ["CSV", "Excel", "JSON", "XML", "Parquet"]
            .iter()
            .map(|t| (*t).to_owned())
            .collect();

        for name in ["book.xlsx", "legacy.XLS", "sales.csv", "feed.xml", "rows.parquet"] {
            let path = write_file(dir.path(), name, b"x");
            let request = ImportRequest::new(&path, None).unwrap();
            assert!(request.check_allowed(&tools).is_ok(), "{name}");
        }

        let path = write_file(dir.path(), "book.xlsx", b"PK");
        let request = ImportRequest::new(&path, None).unwrap();
        assert!(
            request
                .check_allowed(&["CSV".to_owned(), "JSON".to_owned()])
                .unwrap_err()
                .is_validation()
        );
    }

    #[test]
    fn test_unrecognised_tool_names_do_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "book.xlsx", b"PK");
        let request = ImportRequest::new(&path, None).unwrap();
        assert!(request.check_allowed(&["SpreadsheetProcessorV2".to_owned()]).is_ok());
    }

    #[tokio::test]
    async fn test_into_upload_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "sales.csv", b"q1,q2\n10,20\n");
        let upload = ImportRequest::new(&path, None).unwrap().into_upload().await.unwrap();
        assert_eq!(upload.dataset_name, "sales");
        assert_eq!(upload.bytes.as_ref(), b"q1,q2\n10,20\n");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }
}
