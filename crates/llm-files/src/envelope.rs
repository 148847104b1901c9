//! Textual envelope used to carry files inside a model response.
//!
//! A file is announced by a header line followed by a fenced code block:
//!
//! ````text
//! filepath: `mocks/store.go`
//! ```go
//! package mocks
//! ```
//! ````
//!
//! The streaming parser reads this convention; [`render_envelope`] writes it.

use crate::types::VirtualFile;

/// Header marker that starts a new file record.
pub const FILEPATH_MARKER: &str = "filepath";

/// Full header prefix, stripped before the path is read.
pub const FILEPATH_PREFIX: &str = "filepath: ";

/// Code fence delimiter.
pub const FENCE: &str = "```";

/// Language tag expected on opening fences when none is configured.
pub const DEFAULT_LANGUAGE: &str = "go";

/// Renders a file as a header line plus a fenced code block.
///
/// A trailing newline is added to the content only when it is non-empty and
/// does not already end with one, so the closing fence stays on its own
/// line. Parsing the output yields an equal record only when the content is
/// empty or newline-terminated, which holds for every record the parser
/// produces. Content such as `"x"` comes back as `"x\n"`.
///
/// # Examples
///
/// ```
/// use llm_tools_files::{VirtualFile, render_envelope};
///
/// let file = VirtualFile::new("mocks/a.go", "package mocks\n");
/// assert_eq!(
///     render_envelope(&file, "go"),
///     "filepath: `mocks/a.go`\n```go\npackage mocks\n```\n"
/// );
/// ```
#[must_use]
pub fn render_envelope(file: &VirtualFile, language: &str) -> String {
    let mut out = String::with_capacity(file.path.len() + file.content.len() + 32);
    out.push_str(FILEPATH_PREFIX);
    out.push('`');
    out.push_str(&file.path);
    out.push_str("`\n");
    out.push_str(FENCE);
    out.push_str(language);
    out.push('\n');
    out.push_str(&file.content);
    if !file.content.is_empty() && !file.content.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(FENCE);
    out.push('\n');
    out
}
