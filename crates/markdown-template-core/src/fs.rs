use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::Builder;

use crate::error::{TemplateError, TemplateResult};

/// Write `contents` to `path` through a sibling temporary file and a rename,
/// creating parent directories as needed. Readers never observe a partial file.
pub fn write_atomic(path: &Path, contents: &str) -> TemplateResult<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| TemplateError::io(parent, err))?;

    let mut tmp = Builder::new()
        .prefix(".markdown-template")
        .tempfile_in(parent)
        .map_err(|err| TemplateError::io(parent, err))?;
    let written = {
        let file = tmp.as_file_mut();
        file.write_all(contents.as_bytes())
            .and_then(|()| file.sync_all())
    };
    written.map_err(|err| TemplateError::io(tmp.path(), err))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let perm = metadata.permissions().mode();
            let _ = fs::set_permissions(tmp.path(), fs::Permissions::from_mode(perm));
        }
    }

    tmp.persist(path)
        .map(|_| ())
        .map_err(|err| TemplateError::io(path, err.error))
}
