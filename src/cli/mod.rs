//! Command-line runner: single and batch modes, status reporting, and exit
//! codes.
//!
//! The runner consumes the fetch layer purely through the
//! [`ResourceFetcher`] trait and decides exit codes purely through the
//! [`classify`] predicates. Transport details never leak this far up.

pub mod output;
pub mod report;

use std::io::Write;

use tracing::debug;

use crate::config::{MagpieConfig, RunMode};
use crate::export::{RenderOptions, write_document};
use crate::github::classify;
use crate::github::error::FetchError;
use crate::github::fetcher::{GithubFetcher, ResourceFetcher};
use crate::github::locator::ResourceRef;
use crate::github::models::FetchOptions;
use report::{ItemResult, ItemStatus, build_summary, format_summary};

/// All items completed successfully.
pub const EXIT_OK: u8 = 0;
/// Generic runtime failure.
pub const EXIT_RUNTIME: u8 = 1;
/// Invalid arguments or an unusable input URL.
pub const EXIT_USAGE: u8 = 2;
/// Authentication or authorization failure.
pub const EXIT_AUTH: u8 = 3;
/// At least one item failed in batch mode.
pub const EXIT_PARTIAL: u8 = 4;
/// Output file conflict without `--force`.
pub const EXIT_CONFLICT: u8 = 5;
/// The resource does not exist.
pub const EXIT_NOT_FOUND: u8 = 6;
/// The API rate limit was exhausted.
pub const EXIT_RATE_LIMITED: u8 = 7;

/// Maps one failure to its exit code through the classifier predicates.
#[must_use]
pub fn resolve_exit_code(error: &FetchError) -> u8 {
    match error.root() {
        FetchError::InvalidUrl { .. }
        | FetchError::UnsupportedResource { .. }
        | FetchError::Configuration { .. } => return EXIT_USAGE,
        FetchError::OutputConflict { .. } => return EXIT_CONFLICT,
        _ => {}
    }

    if classify::is_rate_limit(error) {
        EXIT_RATE_LIMITED
    } else if classify::is_auth(error) {
        EXIT_AUTH
    } else if classify::is_not_found(error) {
        EXIT_NOT_FOUND
    } else {
        EXIT_RUNTIME
    }
}

/// Builds the real fetcher and executes the run against stdio.
pub async fn run(config: &MagpieConfig) -> u8 {
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr().lock();

    match GithubFetcher::new(config.fetch_config()) {
        Ok(fetcher) => run_with(config, &fetcher, &mut stdout, &mut stderr).await,
        Err(error) => {
            write_error_line(&mut stderr, &error);
            resolve_exit_code(&error)
        }
    }
}

/// Executes the run with an injected fetcher and output sinks.
pub async fn run_with<F>(
    config: &MagpieConfig,
    fetcher: &F,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> u8
where
    F: ResourceFetcher,
{
    let mode = match config.run_mode() {
        Ok(mode) => mode,
        Err(error) => {
            write_error_line(stderr, &error);
            return resolve_exit_code(&error);
        }
    };

    match mode {
        RunMode::Single(url) => run_single(config, fetcher, &url, stdout, stderr).await,
        RunMode::Batch(input) => run_batch(config, fetcher, &input, stdout, stderr).await,
    }
}

async fn run_single<F>(
    config: &MagpieConfig,
    fetcher: &F,
    url: &str,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> u8
where
    F: ResourceFetcher,
{
    let (item, error) = process_one(config, fetcher, false, url, stdout).await;

    // With --stdout the markdown owns stdout; status lines move to stderr.
    let status_sink: &mut dyn Write = if config.stdout { stderr } else { stdout };
    write_line(status_sink, &item.status_line());

    match error {
        None => EXIT_OK,
        Some(error) => resolve_exit_code(&error),
    }
}

async fn run_batch<F>(
    config: &MagpieConfig,
    fetcher: &F,
    input: &camino::Utf8Path,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> u8
where
    F: ResourceFetcher,
{
    let content = match std::fs::read_to_string(input.as_std_path()) {
        Ok(content) => content,
        Err(error) => {
            let wrapped = FetchError::Io {
                message: format!("read input file {input:?}: {error}"),
            };
            write_error_line(stderr, &wrapped);
            return resolve_exit_code(&wrapped);
        }
    };

    let mut items = Vec::new();
    for line in content.lines() {
        let url = line.trim();
        if url.is_empty() {
            continue;
        }

        let (item, _error) = process_one(config, fetcher, true, url, stdout).await;
        write_line(stdout, &item.status_line());
        items.push(item);
    }

    let summary = build_summary(items);
    write_line(stdout, &format_summary(&summary));
    if summary.failed > 0 {
        EXIT_PARTIAL
    } else {
        EXIT_OK
    }
}

/// Processes one URL end to end: parse, fetch, render, place output.
async fn process_one<F>(
    config: &MagpieConfig,
    fetcher: &F,
    batch: bool,
    url: &str,
    markdown_sink: &mut dyn Write,
) -> (ItemResult, Option<FetchError>)
where
    F: ResourceFetcher,
{
    let mut item = ItemResult::started(url);

    let reference = match ResourceRef::parse(url) {
        Ok(reference) => reference,
        Err(error) => {
            item.reason = error.to_string();
            return (item, Some(error));
        }
    };
    item.kind = Some(reference.kind);

    let options = FetchOptions {
        include_comments: config.include_comments,
    };
    let data = match fetcher.fetch(&reference, options).await {
        Ok(data) => data,
        Err(error) => {
            item.reason = error.to_string();
            return (item, Some(error));
        }
    };

    let mut markdown = Vec::new();
    let render_options = RenderOptions {
        include_comments: config.include_comments,
    };
    if let Err(error) = write_document(&mut markdown, &data, render_options) {
        item.reason = error.to_string();
        return (item, Some(error));
    }

    if config.stdout && !batch {
        if let Err(error) = markdown_sink.write_all(&markdown) {
            let wrapped = FetchError::Io {
                message: format!("write markdown to stdout: {error}"),
            };
            item.reason = wrapped.to_string();
            return (item, Some(wrapped));
        }
        item.output_path = "stdout".to_owned();
    } else {
        let placed = place_output(config, batch, &reference, &markdown);
        match placed {
            Ok(path) => item.output_path = path,
            Err(error) => {
                item.reason = error.to_string();
                return (item, Some(error));
            }
        }
    }

    debug!(url = %item.url, output = %item.output_path, "processed resource");
    item.status = ItemStatus::Ok;
    (item, None)
}

fn place_output(
    config: &MagpieConfig,
    batch: bool,
    reference: &ResourceRef,
    markdown: &[u8],
) -> Result<String, FetchError> {
    let path = output::resolve_output_path(config.output.as_deref(), batch, reference)?;
    output::ensure_writable(&path, config.force)?;
    output::write_markdown_file(&path, markdown)?;
    Ok(path.to_string())
}

fn write_line(writer: &mut dyn Write, line: &str) {
    let _ignored = writeln!(writer, "{line}");
}

fn write_error_line(writer: &mut dyn Write, error: &FetchError) {
    let _ignored = writeln!(writer, "error: {error}");
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::super::config::MagpieConfig;
    use super::{
        EXIT_AUTH, EXIT_CONFLICT, EXIT_NOT_FOUND, EXIT_OK, EXIT_PARTIAL, EXIT_RATE_LIMITED,
        EXIT_RUNTIME, EXIT_USAGE, resolve_exit_code, run_with,
    };
    use crate::github::error::FetchError;
    use crate::github::fetcher::MockResourceFetcher;
    use crate::github::models::test_support::sample_issue;

    fn config_from(args: &[&str]) -> MagpieConfig {
        MagpieConfig::try_parse_from(args).expect("arguments should parse")
    }

    fn status_failure(status: u16, message: &str) -> FetchError {
        FetchError::RetryExhausted {
            attempts: 1,
            cause: Box::new(FetchError::Status {
                status,
                message: message.to_owned(),
            }),
        }
    }

    #[test]
    fn exit_codes_follow_the_classifier() {
        assert_eq!(resolve_exit_code(&status_failure(401, "bad credentials")), EXIT_AUTH);
        assert_eq!(resolve_exit_code(&status_failure(403, "forbidden")), EXIT_AUTH);
        assert_eq!(
            resolve_exit_code(&status_failure(429, "slow down")),
            EXIT_RATE_LIMITED
        );
        assert_eq!(
            resolve_exit_code(&status_failure(403, "rate limit exceeded")),
            EXIT_RATE_LIMITED
        );
        assert_eq!(resolve_exit_code(&FetchError::NotFound), EXIT_NOT_FOUND);
        assert_eq!(resolve_exit_code(&status_failure(500, "boom")), EXIT_RUNTIME);
        assert_eq!(
            resolve_exit_code(&FetchError::InvalidUrl {
                message: "nope".to_owned(),
            }),
            EXIT_USAGE
        );
        assert_eq!(
            resolve_exit_code(&FetchError::OutputConflict {
                path: "out.md".to_owned(),
            }),
            EXIT_CONFLICT
        );
    }

    #[tokio::test]
    async fn stdout_mode_writes_markdown_to_stdout_and_status_to_stderr() {
        let config = config_from(&[
            "magpie",
            "--stdout",
            "https://github.com/octocat/hello/issues/42",
        ]);
        let mut fetcher = MockResourceFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_, _| Ok(sample_issue()));

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run_with(&config, &fetcher, &mut stdout, &mut stderr).await;

        assert_eq!(code, EXIT_OK);
        let markdown = String::from_utf8(stdout).expect("stdout should be UTF-8");
        assert!(markdown.starts_with("---\ntype: 'issue'\n"));
        assert!(!markdown.contains("OK url="));

        let status = String::from_utf8(stderr).expect("stderr should be UTF-8");
        assert!(status.contains("OK url=https://github.com/octocat/hello/issues/42 type=issue"));
    }

    #[tokio::test]
    async fn unparsable_url_exits_with_usage_and_never_fetches() {
        let config = config_from(&["magpie", "https://gitlab.com/o/r/issues/1"]);
        let fetcher = MockResourceFetcher::new();

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run_with(&config, &fetcher, &mut stdout, &mut stderr).await;

        assert_eq!(code, EXIT_USAGE);
        let status = String::from_utf8(stdout).expect("stdout should be UTF-8");
        assert!(status.contains("FAILED url=https://gitlab.com/o/r/issues/1"));
    }

    #[tokio::test]
    async fn classified_fetch_failures_drive_exit_codes() {
        for (error, expected) in [
            (status_failure(401, "bad credentials"), EXIT_AUTH),
            (status_failure(429, "slow down"), EXIT_RATE_LIMITED),
            (FetchError::NotFound, EXIT_NOT_FOUND),
            (status_failure(500, "boom"), EXIT_RUNTIME),
        ] {
            let config = config_from(&[
                "magpie",
                "--stdout",
                "https://github.com/octocat/hello/issues/42",
            ]);
            let mut fetcher = MockResourceFetcher::new();
            let returned = error.clone();
            fetcher
                .expect_fetch()
                .returning(move |_, _| Err(returned.clone()));

            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let code = run_with(&config, &fetcher, &mut stdout, &mut stderr).await;
            assert_eq!(code, expected, "error {error:?}");
        }
    }

    #[tokio::test]
    async fn existing_output_file_conflicts_without_force() {
        let dir = tempfile::tempdir().expect("temp dir should create");
        let target = dir.path().join("octocat-hello-issue-42.md");
        std::fs::write(&target, "already here").expect("file should write");
        let output_arg = dir.path().to_str().expect("temp path should be UTF-8");

        let config = config_from(&[
            "magpie",
            "--output",
            output_arg,
            "https://github.com/octocat/hello/issues/42",
        ]);
        let mut fetcher = MockResourceFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_, _| Ok(sample_issue()));

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run_with(&config, &fetcher, &mut stdout, &mut stderr).await;

        assert_eq!(code, EXIT_CONFLICT);
        let contents = std::fs::read_to_string(&target).expect("file should read");
        assert_eq!(contents, "already here", "existing file must be untouched");
    }

    #[tokio::test]
    async fn batch_mode_reports_partial_failure() {
        let dir = tempfile::tempdir().expect("temp dir should create");
        let input = dir.path().join("urls.txt");
        std::fs::write(
            &input,
            "https://github.com/octocat/hello/issues/42\n\nhttps://github.com/octocat/hello/issues/43\n",
        )
        .expect("input file should write");
        let out_dir = dir.path().join("out");

        let config = config_from(&[
            "magpie",
            "--input-file",
            input.to_str().expect("input path should be UTF-8"),
            "--output",
            out_dir.to_str().expect("output path should be UTF-8"),
        ]);

        let mut fetcher = MockResourceFetcher::new();
        fetcher.expect_fetch().returning(|reference, _| {
            if reference.number == 42 {
                Ok(sample_issue())
            } else {
                Err(FetchError::NotFound)
            }
        });

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run_with(&config, &fetcher, &mut stdout, &mut stderr).await;

        assert_eq!(code, EXIT_PARTIAL);
        let report = String::from_utf8(stdout).expect("stdout should be UTF-8");
        assert!(report.contains("OK total=2 succeeded=1 failed=1"));
        assert!(report.contains("github resource not found"));
        assert!(out_dir.join("octocat-hello-issue-42.md").exists());
    }
}
