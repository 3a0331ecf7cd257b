// Notification dispatch over validated URLs

use crate::error::{EngineError, EngineResult};
use crate::validation::DUMMY_URL;

pub const TEST_TITLE: &str = "Test notification";
pub const TEST_BODY: &str = "If you can read this, the notification URL works.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Delivers one notification to one service URL
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, url: &str, notification: &Notification) -> EngineResult<()>;
}

/// Dispatcher that records deliveries in the log instead of contacting a service
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDispatcher;

impl Dispatcher for TracingDispatcher {
    fn dispatch(&self, url: &str, notification: &Notification) -> EngineResult<()> {
        if url.trim().is_empty() {
            return Err(EngineError::Dispatch {
                url: url.to_string(),
                reason: "empty URL".to_string(),
            });
        }
        tracing::info!(
            %url,
            title = %notification.title,
            body_len = notification.body.len(),
            "Notification dispatched"
        );
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Send `title`/`body` to every URL. The dummy URL is skipped and a failing URL does
/// not stop delivery to the rest.
pub fn send_message<S: AsRef<str>>(
    dispatcher: &dyn Dispatcher,
    urls: &[S],
    title: &str,
    body: &str,
) -> DispatchReport {
    let notification = Notification::new(title, body);
    let mut report = DispatchReport::default();

    for url in urls.iter().map(AsRef::as_ref) {
        if url == DUMMY_URL {
            tracing::debug!("Skipping dummy URL");
            report.skipped += 1;
            continue;
        }

        match dispatcher.dispatch(url, &notification) {
            Ok(()) => report.sent += 1,
            Err(e) => {
                tracing::warn!(%url, error = %e, "Notification failed");
                report.failed.push((url.to_string(), e.to_string()));
            }
        }
    }

    report
}

pub fn send_test_message<S: AsRef<str>>(dispatcher: &dyn Dispatcher, urls: &[S]) -> DispatchReport {
    send_message(dispatcher, urls, TEST_TITLE, TEST_BODY)
}

pub const DATASET_DOWNLOAD_TITLE: &str = "Someone downloaded your dataset!";
pub const FILE_DOWNLOAD_TITLE: &str = "Someone downloaded your file!";
pub const DEFAULT_FILE_FORMAT: &str = "UVL";

/// The user behind a download; anonymous downloads have none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloader {
    pub user_id: i64,
    pub name: String,
    pub surname: String,
}

/// What was downloaded from an uploader's dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Download<'a> {
    Dataset {
        dataset: &'a str,
    },
    File {
        file: &'a str,
        dataset: &'a str,
        format: &'a str,
    },
}

impl Download<'_> {
    pub fn title(&self) -> &'static str {
        match self {
            Download::Dataset { .. } => DATASET_DOWNLOAD_TITLE,
            Download::File { .. } => FILE_DOWNLOAD_TITLE,
        }
    }

    pub fn body(&self, downloader: Option<&Downloader>) -> String {
        let mut body = match self {
            Download::Dataset { dataset } => {
                format!("Your dataset '{}' has been downloaded", dataset)
            }
            Download::File {
                file,
                dataset,
                format,
            } => format!(
                "Your file '{}' from the dataset {} has been downloaded in {} format",
                file, dataset, format
            ),
        };
        match downloader {
            Some(user) => body.push_str(&format!(" by {} {}", user.name, user.surname)),
            None => body.push_str(" by an anonymous user"),
        }
        body
    }
}

/// Tell an uploader's bots about a download.
///
/// Nothing is sent when the uploader downloaded their own data; `None` is returned then.
pub fn notify_download<S: AsRef<str>>(
    dispatcher: &dyn Dispatcher,
    urls: &[S],
    uploader_id: i64,
    download: Download<'_>,
    downloader: Option<&Downloader>,
) -> Option<DispatchReport> {
    if downloader.map(|user| user.user_id) == Some(uploader_id) {
        tracing::debug!(uploader_id, "Skipping notification for own download");
        return None;
    }

    Some(send_message(
        dispatcher,
        urls,
        download.title(),
        &download.body(downloader),
    ))
}

pub fn on_download_dataset<S: AsRef<str>>(
    dispatcher: &dyn Dispatcher,
    urls: &[S],
    uploader_id: i64,
    dataset: &str,
    downloader: Option<&Downloader>,
) -> Option<DispatchReport> {
    notify_download(
        dispatcher,
        urls,
        uploader_id,
        Download::Dataset { dataset },
        downloader,
    )
}

pub fn on_download_file<S: AsRef<str>>(
    dispatcher: &dyn Dispatcher,
    urls: &[S],
    uploader_id: i64,
    file: &str,
    dataset: &str,
    format: Option<&str>,
    downloader: Option<&Downloader>,
) -> Option<DispatchReport> {
    let format = format.unwrap_or(DEFAULT_FILE_FORMAT);
    notify_download(
        dispatcher,
        urls,
        uploader_id,
        Download::File {
            file,
            dataset,
            format,
        },
        downloader,
    )
}
