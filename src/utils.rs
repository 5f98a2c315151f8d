use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use path_clean::PathClean;

use crate::common::OUTPUT_DIR_SUFFIX;

pub trait PathExt {
    fn ext_lower(&self) -> String;
}

impl PathExt for Path {
    fn ext_lower(&self) -> String {
        self.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// Sibling directory of `root` named `<root_name>__out`.
///
/// The root is made absolute and lexically cleaned first, so `.` or a trailing
/// separator still yields the real directory name.
pub fn output_root(root: &Path) -> Result<PathBuf> {
    let root = std::path::absolute(root)
        .with_context(|| format!("failed to resolve absolute path of {:?}", root))?
        .clean();
    let name = root
        .file_name()
        .ok_or_else(|| anyhow!("cannot derive an output directory name from {:?}", root))?;

    let mut out_name = name.to_os_string();
    out_name.push(OUTPUT_DIR_SUFFIX);
    Ok(root.with_file_name(out_name))
}
