//! Subcommand implementations.
//!
//! Every command writes its report to `out`; diagnostics go through tracing.

use std::io::Write;

use anyhow::{Result, bail};

use crate::args::OutputFormat;
use crate::output::{ListRow, format_bytes, render};
use prefixer_client::{AutotestStep, FaviconPrefixer};
use prefixer_core::{Settings, StaticAuthorizer};

pub async fn cache_clear(app: &FaviconPrefixer, out: &mut dyn Write) -> Result<()> {
    tracing::debug!("starting cache clear");
    // A shell operator has the same authority as the site administrator.
    app.clear_cache(&StaticAuthorizer::granted()).await?;
    tracing::debug!("cache clear completed");

    writeln!(out, "Success: Favicon cache cleared")?;
    Ok(())
}

pub async fn cache_status(app: &FaviconPrefixer, out: &mut dyn Write) -> Result<()> {
    let status = app.cache_status().await?;
    writeln!(out, "Cached favicons: {}", status.count)?;
    writeln!(out, "Cache size: {}", format_bytes(status.size_bytes))?;
    Ok(())
}

pub async fn cache_list(app: &FaviconPrefixer, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let items = app.cache_list().await?;
    if items.is_empty() {
        writeln!(out, "No cached favicons found.")?;
        return Ok(());
    }

    let rows: Vec<ListRow> = items.iter().map(ListRow::from).collect();
    writeln!(out, "{}", render(format, &rows)?)?;
    Ok(())
}

const STEPS: [(AutotestStep, &str); 3] = [
    (AutotestStep::UrlValidation, "1. Testing URL validation..."),
    (AutotestStep::FaviconRetrieval, "2. Testing favicon retrieval..."),
    (AutotestStep::ContentProcessing, "3. Testing content processing..."),
];

pub async fn autotest(app: &FaviconPrefixer, url: &str, debug: bool, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Starting automated test for URL: {url}")?;

    let report = match app.autotest(url).await {
        Ok(report) => report,
        Err(failure) => {
            for (step, heading) in STEPS {
                writeln!(out, "\n{heading}")?;
                if step == failure.step {
                    break;
                }
                writeln!(out, "Success: {step} successful")?;
            }
            bail!("{failure}");
        }
    };

    writeln!(out, "\n{}", STEPS[0].1)?;
    writeln!(out, "Success: URL validation successful")?;

    writeln!(out, "\n{}", STEPS[1].1)?;
    writeln!(out, "Success: Favicon retrieved in {:.2}s", report.retrieval_time.as_secs_f64())?;
    if debug {
        writeln!(out, "Favicon saved at: {}", report.favicon_path.display())?;
    }

    writeln!(out, "\n{}", STEPS[2].1)?;
    writeln!(out, "Success: Content processing successful")?;
    if debug {
        writeln!(out, "\nOriginal content:\n{}", report.original)?;
        writeln!(out, "\nProcessed content:\n{}", report.processed)?;
    }

    writeln!(out, "\nSuccess: Automated test completed successfully!")?;
    Ok(())
}

pub async fn process(app: &FaviconPrefixer, input: &str, post_type: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let output = match post_type {
        Some(post_type) => app.filter_content(input, post_type).await,
        None => app.process_content(input).await,
    };
    out.write_all(output.as_bytes())?;
    Ok(())
}

pub async fn settings(
    app: &FaviconPrefixer, post_types: Option<Vec<String>>, ignore_internal: Option<bool>, debug_mode: Option<bool>,
    out: &mut dyn Write,
) -> Result<()> {
    let mut settings = app.settings().await?;
    let changed = post_types.is_some() || ignore_internal.is_some() || debug_mode.is_some();

    if let Some(post_types) = post_types {
        settings.post_types = post_types;
    }
    if let Some(ignore_internal) = ignore_internal {
        settings.ignore_internal = ignore_internal;
    }
    if let Some(debug_mode) = debug_mode {
        settings.debug_mode = debug_mode;
    }

    if changed {
        app.save_settings(&settings).await?;
        settings = app.settings().await?;
        writeln!(out, "Success: Settings saved")?;
    }

    print_settings(&settings, out)
}

fn print_settings(settings: &Settings, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "post_types: {}", settings.post_types.join(", "))?;
    writeln!(out, "ignore_internal: {}", settings.ignore_internal)?;
    writeln!(out, "debug_mode: {}", settings.debug_mode)?;
    Ok(())
}

pub async fn uninstall(app: &FaviconPrefixer, out: &mut dyn Write) -> Result<()> {
    app.uninstall().await?;
    writeln!(out, "Success: Favicon prefixer data removed")?;
    Ok(())
}

/// Refuse a `process` run with nothing to read.
pub fn ensure_input(input: &str) -> Result<()> {
    if input.is_empty() {
        bail!("no content to process");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefixer_client::testing::StubHttpClient;
    use prefixer_core::{AppConfig, CacheDb, MemoryObjectCache};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn test_app(http: StubHttpClient) -> (TempDir, FaviconPrefixer) {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            upload_dir: dir.path().to_path_buf(),
            upload_url: "https://blog.test/uploads".into(),
            home_url: "https://blog.test".into(),
            ..Default::default()
        };
        let db = CacheDb::open_in_memory().await.unwrap();
        let app = FaviconPrefixer::with_parts(config, db, Arc::new(http), Arc::new(MemoryObjectCache::new())).unwrap();
        app.activate().await.unwrap();
        (dir, app)
    }

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn status_and_list_on_empty_cache() {
        let (_dir, app) = test_app(StubHttpClient::ok(b"png")).await;

        let mut buf = Vec::new();
        cache_status(&app, &mut buf).await.unwrap();
        assert_eq!(text(buf), "Cached favicons: 0\nCache size: 0 B\n");

        let mut buf = Vec::new();
        cache_list(&app, OutputFormat::Table, &mut buf).await.unwrap();
        assert_eq!(text(buf), "No cached favicons found.\n");
    }

    #[tokio::test]
    async fn clear_reports_success() {
        let (_dir, app) = test_app(StubHttpClient::ok(b"png")).await;
        app.process_content(r#"<a href="https://example.com">x</a>"#).await;

        let mut buf = Vec::new();
        cache_clear(&app, &mut buf).await.unwrap();
        assert_eq!(text(buf), "Success: Favicon cache cleared\n");
        assert_eq!(app.cache_status().await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn list_as_csv() {
        let (_dir, app) = test_app(StubHttpClient::ok(b"png")).await;
        app.process_content(r#"<a href="https://example.com">x</a>"#).await;

        let mut buf = Vec::new();
        cache_list(&app, OutputFormat::Csv, &mut buf).await.unwrap();
        let out = text(buf);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "domain,file,size,modified");
        assert!(lines[1].starts_with("example.com,example.com.png,3 B,"));
    }

    #[tokio::test]
    async fn autotest_success_output() {
        let (_dir, app) = test_app(StubHttpClient::ok(b"png")).await;

        let mut buf = Vec::new();
        autotest(&app, "https://example.com", true, &mut buf).await.unwrap();
        let out = text(buf);
        assert!(out.contains("Success: URL validation successful"));
        assert!(out.contains("Favicon saved at: "));
        assert!(out.contains("Processed content:"));
        assert!(out.ends_with("Success: Automated test completed successfully!\n"));
    }

    #[tokio::test]
    async fn autotest_internal_url_fails() {
        let (_dir, app) = test_app(StubHttpClient::ok(b"png")).await;

        let mut buf = Vec::new();
        let err = autotest(&app, "https://blog.test/about", false, &mut buf).await.unwrap_err();
        assert!(err.to_string().contains("URL must be external for testing"));

        let out = text(buf);
        assert!(out.contains("1. Testing URL validation..."));
        assert!(!out.contains("2. Testing favicon retrieval..."));
    }

    #[tokio::test]
    async fn autotest_fetch_failure_stops_at_step_two() {
        let (_dir, app) = test_app(StubHttpClient::failing()).await;

        let mut buf = Vec::new();
        assert!(autotest(&app, "https://example.com", false, &mut buf).await.is_err());
        let out = text(buf);
        assert!(out.contains("Success: URL validation successful"));
        assert!(out.contains("2. Testing favicon retrieval..."));
        assert!(!out.contains("3. Testing content processing..."));
    }

    #[tokio::test]
    async fn process_applies_post_type_gate() {
        let (_dir, app) = test_app(StubHttpClient::ok(b"png")).await;
        let input = r#"<p><a href="https://example.com">x</a></p>"#;

        let mut buf = Vec::new();
        process(&app, input, Some("page"), &mut buf).await.unwrap();
        assert_eq!(text(buf), input);

        let mut buf = Vec::new();
        process(&app, input, None, &mut buf).await.unwrap();
        assert!(text(buf).contains("favicon-prefix"));
    }

    #[tokio::test]
    async fn settings_update_and_print() {
        let (_dir, app) = test_app(StubHttpClient::ok(b"png")).await;

        let mut buf = Vec::new();
        settings(&app, Some(vec!["post".into(), " page ".into()]), Some(false), None, &mut buf)
            .await
            .unwrap();

        assert_eq!(text(buf), "Success: Settings saved\npost_types: post, page\nignore_internal: false\ndebug_mode: false\n");
        assert!(!app.settings().await.unwrap().ignore_internal);
    }

    #[tokio::test]
    async fn settings_without_changes_only_prints() {
        let (_dir, app) = test_app(StubHttpClient::ok(b"png")).await;

        let mut buf = Vec::new();
        settings(&app, None, None, None, &mut buf).await.unwrap();
        assert_eq!(text(buf), "post_types: post\nignore_internal: true\ndebug_mode: false\n");
    }

    #[tokio::test]
    async fn uninstall_reports_success() {
        let (dir, app) = test_app(StubHttpClient::ok(b"png")).await;

        let mut buf = Vec::new();
        uninstall(&app, &mut buf).await.unwrap();
        assert_eq!(text(buf), "Success: Favicon prefixer data removed\n");
        assert!(!dir.path().join("favicons").exists());
    }

    #[test]
    fn empty_input_rejected() {
        assert!(ensure_input("").is_err());
        assert!(ensure_input("<p>x</p>").is_ok());
    }
}
