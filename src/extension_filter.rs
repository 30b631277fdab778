/// Extension filter parsing and matching.
///
/// An extension filter is built once per run from a colon-delimited string such
/// as `".txt:pdf: .docx "` and is immutable afterwards. Every stored extension is
/// lower-cased and starts with a dot, so matching against a file's extension is
/// case-insensitive.
///
/// # Examples
///
/// ```
/// use dirflat::extension_filter::ExtensionFilter;
///
/// let filter = ExtensionFilter::parse(".txt:PDF");
/// assert!(filter.contains(".txt"));
/// assert!(filter.contains(".pdf"));
/// assert_eq!(filter.match_path(std::path::Path::new("NOTES.TXT")), Some(".txt"));
/// ```
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Separator between extensions in a filter string.
pub const EXTENSION_DELIMITER: char = ':';

/// Extension used when the filter string yields nothing.
pub const DEFAULT_EXTENSION: &str = ".txt";

/// A non-empty set of normalized file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
}

impl ExtensionFilter {
    /// Parses a colon-delimited extension string.
    ///
    /// Tokens are trimmed and empty tokens dropped. A missing leading dot is
    /// added and the result lower-cased. If nothing survives, the filter
    /// falls back to [`DEFAULT_EXTENSION`].
    pub fn parse(spec: &str) -> Self {
        let mut extensions: BTreeSet<String> = spec
            .split(EXTENSION_DELIMITER)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(normalize_token)
            .collect();

        if extensions.is_empty() {
            extensions.insert(DEFAULT_EXTENSION.to_string());
        }

        Self { extensions }
    }

    /// Returns true if `extension` (with leading dot) is in the filter.
    /// The comparison ignores case.
    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(&extension.to_lowercase())
    }

    /// Returns the normalized extension a file matches, if any.
    ///
    /// The returned string is the filter's own spelling, which is what the
    /// destination file name uses regardless of the source file's casing.
    pub fn match_path(&self, path: &Path) -> Option<&str> {
        let extension = file_extension(path)?;
        self.extensions.get(&extension).map(String::as_str)
    }

    /// Iterates the normalized extensions in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Never true: an empty spec parses to the default extension.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::parse("")
    }
}

impl fmt::Display for ExtensionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(&EXTENSION_DELIMITER.to_string()))
    }
}

fn normalize_token(token: &str) -> String {
    let lowered = token.to_lowercase();
    if lowered.starts_with('.') {
        lowered
    } else {
        format!(".{}", lowered)
    }
}

/// Lower-cased extension of `path` including the leading dot.
///
/// Dot-files such as `.bashrc` have no extension.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(filter: &ExtensionFilter) -> Vec<&str> {
        filter.iter().collect()
    }

    #[test]
    fn test_parse_normalizes_dots_whitespace_and_case() {
        let filter = ExtensionFilter::parse(".txt:pdf: .docx ");
        assert_eq!(set(&filter), vec![".docx", ".pdf", ".txt"]);

        let filter = ExtensionFilter::parse("TXT:.Md");
        assert_eq!(set(&filter), vec![".md", ".txt"]);
    }

    #[test]
    fn test_empty_spec_falls_back_to_txt() {
        assert_eq!(set(&ExtensionFilter::parse("")), vec![".txt"]);
        assert_eq!(set(&ExtensionFilter::parse(":::")), vec![".txt"]);
        assert_eq!(set(&ExtensionFilter::parse("  :  ")), vec![".txt"]);
        assert_eq!(ExtensionFilter::default(), ExtensionFilter::parse(".txt"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let filter = ExtensionFilter::parse(".txt:txt:TXT");
        assert_eq!(filter.len(), 1);
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_match_path_is_case_insensitive() {
        let filter = ExtensionFilter::parse(".txt");
        assert_eq!(filter.match_path(Path::new("NOTES.TXT")), Some(".txt"));
        assert_eq!(filter.match_path(Path::new("dir/notes.Txt")), Some(".txt"));
        assert_eq!(filter.match_path(Path::new("notes.pdf")), None);
    }

    #[test]
    fn test_match_path_without_extension() {
        let filter = ExtensionFilter::parse(".txt");
        assert_eq!(filter.match_path(Path::new("README")), None);
        assert_eq!(filter.match_path(Path::new(".txt")), None);
    }

    #[test]
    fn test_only_last_extension_is_considered() {
        let filter = ExtensionFilter::parse(".gz");
        assert_eq!(filter.match_path(Path::new("backup.tar.gz")), Some(".gz"));

        let filter = ExtensionFilter::parse(".tar.gz");
        assert_eq!(filter.match_path(Path::new("backup.tar.gz")), None);
    }

    #[test]
    fn test_contains_ignores_case() {
        let filter = ExtensionFilter::parse("pdf");
        assert!(filter.contains(".PDF"));
        assert!(!filter.contains("pdf"));
    }

    #[test]
    fn test_display_joins_with_delimiter() {
        let filter = ExtensionFilter::parse("pdf:.txt");
        assert_eq!(filter.to_string(), ".pdf:.txt");
    }
}
