//! Output placement and overwrite policy.
//!
//! Single mode writes next to the current directory unless `--output` names a
//! file or directory; batch mode requires a directory. Existing files are
//! never clobbered unless `--force` is set.

use camino::{Utf8Path, Utf8PathBuf};

use crate::github::error::FetchError;
use crate::github::locator::{ResourceKind, ResourceRef};

/// Builds the default file name for a resource:
/// `{owner}-{repo}-{issue|pr|discussion}-{number}.md`.
#[must_use]
pub fn default_file_name(reference: &ResourceRef) -> String {
    let resource_part = match reference.kind {
        ResourceKind::Issue => "issue",
        ResourceKind::PullRequest => "pr",
        ResourceKind::Discussion => "discussion",
    };
    format!(
        "{}-{}-{resource_part}-{}.md",
        reference.owner, reference.repo, reference.number
    )
}

/// Resolves the target path for one rendered document.
///
/// # Errors
///
/// Returns [`FetchError::Configuration`] when batch mode has no output
/// directory, or [`FetchError::Io`] when the output path cannot be examined.
pub fn resolve_output_path(
    output: Option<&Utf8Path>,
    batch: bool,
    reference: &ResourceRef,
) -> Result<Utf8PathBuf, FetchError> {
    let file_name = default_file_name(reference);

    if batch {
        let Some(directory) = output else {
            return Err(FetchError::Configuration {
                message: "batch mode requires --output <directory>".to_owned(),
            });
        };
        return Ok(directory.join(file_name));
    }

    let Some(target) = output else {
        return Ok(Utf8PathBuf::from(file_name));
    };

    match std::fs::metadata(target.as_std_path()) {
        Ok(metadata) if metadata.is_dir() => Ok(target.join(file_name)),
        Ok(_) => Ok(target.to_owned()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            if target
                .extension()
                .is_some_and(|extension| extension.eq_ignore_ascii_case("md"))
            {
                Ok(target.to_owned())
            } else {
                Ok(target.join(file_name))
            }
        }
        Err(error) => Err(FetchError::Io {
            message: format!("stat output path {target:?}: {error}"),
        }),
    }
}

/// Refuses to overwrite an existing file unless forced.
///
/// # Errors
///
/// Returns [`FetchError::OutputConflict`] when the file exists and `force`
/// is false, or [`FetchError::Io`] when the path cannot be examined.
pub fn ensure_writable(path: &Utf8Path, force: bool) -> Result<(), FetchError> {
    match std::fs::metadata(path.as_std_path()) {
        Ok(_) if force => Ok(()),
        Ok(_) => Err(FetchError::OutputConflict {
            path: path.to_string(),
        }),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(FetchError::Io {
            message: format!("stat output file {path:?}: {error}"),
        }),
    }
}

/// Writes the rendered markdown, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`FetchError::Io`] when directory creation or the write fails.
pub fn write_markdown_file(path: &Utf8Path, markdown: &[u8]) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            std::fs::create_dir_all(parent.as_std_path()).map_err(|error| FetchError::Io {
                message: format!("create output directory {parent:?}: {error}"),
            })?;
        }
    }

    std::fs::write(path.as_std_path(), markdown).map_err(|error| FetchError::Io {
        message: format!("write output file {path:?}: {error}"),
    })
}
