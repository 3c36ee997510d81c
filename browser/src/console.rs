use crate::Result;
use crate::page::Page;
use chromiumoxide::cdp::js_protocol::runtime;
use chromiumoxide::cdp::js_protocol::runtime::ConsoleApiCalledType;
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::cdp::js_protocol::runtime::EventExceptionThrown;
use chromiumoxide::cdp::js_protocol::runtime::RemoteObject;
use futures::StreamExt;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Debug,
    Warn,
    Error,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Debug => "debug",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// One console message emitted by the page, tagged with its severity.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleEntry {
    pub level: ConsoleLevel,
    pub text: String,
}

/// An uncaught page-level error (exception or unhandled rejection).
#[derive(Debug, Clone, Serialize)]
pub struct PageError {
    pub text: String,
    pub url: Option<String>,
    pub line: Option<i64>,
}

/// Passive console and uncaught-error recorder. Must be attached before any
/// interaction so errors thrown asynchronously after a click are not missed.
pub struct ConsoleRecorder {
    entries: Arc<Mutex<Vec<ConsoleEntry>>>,
    errors: Arc<Mutex<Vec<PageError>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl ConsoleRecorder {
    pub async fn attach(page: &Page) -> Result<Self> {
        let cdp = page.cdp();
        cdp.execute(runtime::EnableParams::default()).await?;

        let entries = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let mut console_events = cdp.event_listener::<EventConsoleApiCalled>().await?;
        let entries_sink = Arc::clone(&entries);
        let console_task = tokio::spawn(async move {
            while let Some(event) = console_events.next().await {
                let entry = ConsoleEntry {
                    level: level_of(event.r#type.clone()),
                    text: join_args(&event.args),
                };
                entries_sink.lock().await.push(entry);
            }
        });

        let mut exception_events = cdp.event_listener::<EventExceptionThrown>().await?;
        let errors_sink = Arc::clone(&errors);
        let exception_task = tokio::spawn(async move {
            while let Some(event) = exception_events.next().await {
                let details = &event.exception_details;
                let text = details
                    .exception
                    .as_ref()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                let error = PageError {
                    text,
                    url: details.url.clone(),
                    line: Some(details.line_number),
                };
                errors_sink.lock().await.push(error);
            }
        });

        Ok(Self {
            entries,
            errors,
            tasks: vec![console_task, exception_task],
        })
    }

    /// Stop recording and drain everything captured so far.
    pub async fn finish(self) -> (Vec<ConsoleEntry>, Vec<PageError>) {
        for task in &self.tasks {
            task.abort();
        }
        let entries = std::mem::take(&mut *self.entries.lock().await);
        let errors = std::mem::take(&mut *self.errors.lock().await);
        (entries, errors)
    }
}

fn level_of(call_type: ConsoleApiCalledType) -> ConsoleLevel {
    match call_type {
        ConsoleApiCalledType::Error | ConsoleApiCalledType::Assert => ConsoleLevel::Error,
        ConsoleApiCalledType::Warning => ConsoleLevel::Warn,
        ConsoleApiCalledType::Debug => ConsoleLevel::Debug,
        _ => ConsoleLevel::Log,
    }
}

fn join_args(args: &[RemoteObject]) -> String {
    args.iter()
        .map(remote_object_text)
        .collect::<Vec<_>>()
        .join(" ")
}

fn remote_object_text(obj: &RemoteObject) -> String {
    match (&obj.value, &obj.description) {
        (Some(serde_json::Value::String(s)), _) => s.clone(),
        (Some(value), _) => value.to_string(),
        (None, Some(description)) => description.clone(),
        (None, None) => "<object>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn severity_mapping_collapses_to_four_levels() {
        assert_eq!(level_of(ConsoleApiCalledType::Error), ConsoleLevel::Error);
        assert_eq!(level_of(ConsoleApiCalledType::Assert), ConsoleLevel::Error);
        assert_eq!(level_of(ConsoleApiCalledType::Warning), ConsoleLevel::Warn);
        assert_eq!(level_of(ConsoleApiCalledType::Debug), ConsoleLevel::Debug);
        assert_eq!(level_of(ConsoleApiCalledType::Info), ConsoleLevel::Log);
        assert_eq!(level_of(ConsoleApiCalledType::Trace), ConsoleLevel::Log);
    }
}
