//! Extension corrections for ZIP-based container formats.

use std::path::Path;

use mime::Mime;

use super::{Detector, extension_of};

/// Static extension table consulted when nothing else answered or when the
/// content was only recognised as a generic ZIP archive.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionTable;

impl ExtensionTable {
    /// Returns the corrected media type for a lowercase extension.
    pub fn lookup(extension: &str) -> Option<&'static str> {
        let mime = match extension {
            "7z" => "application/x-7z-compressed",
            "xlsx" | "xltx" | "xlsm" | "xltm" | "xlam" | "xlsb" => "application/msexcel",
            "docx" | "dotx" | "docm" | "dotm" => "application/msword",
            "pptx" | "potx" | "ppsx" | "ppam" | "pptm" | "potm" | "ppsm" => {
                "application/mspowerpoint"
            }
            "vsd" | "vsdx" => "application/x-visio",
            _ => return None,
        };

        Some(mime)
    }
}

impl Detector for ExtensionTable {
    fn name(&self) -> &'static str {
        "extension"
    }

    fn detect(&self, path: &Path) -> Option<Mime> {
        let extension = extension_of(path)?;
        Self::lookup(&extension)?.parse().ok()
    }

    fn overrides(&self, current: &Mime) -> bool {
        current.essence_str() == "application/zip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_covers_office_families() {
        assert_eq!(ExtensionTable::lookup("7z"), Some("application/x-7z-compressed"));
        assert_eq!(ExtensionTable::lookup("xlsb"), Some("application/msexcel"));
        assert_eq!(ExtensionTable::lookup("dotm"), Some("application/msword"));
        assert_eq!(ExtensionTable::lookup("ppsm"), Some("application/mspowerpoint"));
        assert_eq!(ExtensionTable::lookup("vsd"), Some("application/x-visio"));
        assert_eq!(ExtensionTable::lookup("zip"), None);
    }

    #[test]
    fn only_overrides_generic_zip() {
        let table = ExtensionTable;
        assert!(table.overrides(&"application/zip".parse().unwrap()));
        assert!(!table.overrides(&mime::IMAGE_PNG));
    }

    #[test]
    fn detect_is_case_insensitive() {
        let mime = ExtensionTable.detect(Path::new("/data/Budget.XLSX")).unwrap();
        assert_eq!(mime.essence_str(), "application/msexcel");
        assert!(ExtensionTable.detect(Path::new("/data/no_extension")).is_none());
    }
}
