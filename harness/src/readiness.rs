use pagecheck_browser::Page;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Locates an element by accessible role and accessible name rather than by
/// a structural selector: the target application's markup is not under the
/// harness's control, so role/name is the stable contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub role: String,
    pub name: String,
}

impl ElementDescriptor {
    pub fn new(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.role, self.name)
    }
}

/// A resolved, visible element, addressed by its viewport-center
/// coordinates.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    pub x: f64,
    pub y: f64,
    pub descriptor: ElementDescriptor,
}

/// The element never became visible within the bound. A reportable
/// verification outcome, not a process failure: the page may legitimately be
/// stuck behind a credential gate the storage seed failed to dismiss.
#[derive(Debug, Clone)]
pub struct ReadinessTimeout {
    pub waited: Duration,
    pub descriptor: ElementDescriptor,
}

impl fmt::Display for ReadinessTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no visible {} within {}ms",
            self.descriptor,
            self.waited.as_millis()
        )
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Wait for a visible element matching `descriptor`, polling until
/// `timeout` elapses.
pub async fn await_interactive_element(
    page: &Page,
    descriptor: &ElementDescriptor,
    timeout: Duration,
) -> Result<ElementHandle, ReadinessTimeout> {
    poll_until(timeout, POLL_INTERVAL, || resolve_once(page, descriptor))
        .await
        .map_err(|waited| ReadinessTimeout {
            waited,
            descriptor: descriptor.clone(),
        })
}

/// One probe pass. Evaluation faults are treated as "not found yet": the
/// execution context is routinely torn down while the page is loading or
/// mid-reload.
pub async fn resolve_once(page: &Page, descriptor: &ElementDescriptor) -> Option<ElementHandle> {
    let value = match page.evaluate(&probe_js(descriptor)).await {
        Ok(value) => value,
        Err(e) => {
            debug!("readiness probe failed transiently: {e}");
            return None;
        }
    };
    if value.get("found").and_then(serde_json::Value::as_bool) != Some(true) {
        return None;
    }
    let x = value.get("x").and_then(serde_json::Value::as_f64)?;
    let y = value.get("y").and_then(serde_json::Value::as_f64)?;
    Some(ElementHandle {
        x,
        y,
        descriptor: descriptor.clone(),
    })
}

/// Poll `probe` every `interval` until it yields a value or `timeout`
/// elapses; returns how long was waited on timeout. The final poll lands on
/// the deadline itself, so a probe that starts succeeding just before the
/// bound is still seen.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<T, Duration>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let started = Instant::now();
    let deadline = started + timeout;
    loop {
        if let Some(found) = probe().await {
            return Ok(found);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(now - started);
        }
        tokio::time::sleep_until(deadline.min(now + interval)).await;
    }
}

/// JS expression locating a visible element by role and accessible name and
/// returning its viewport-center coordinates. Role matching is
/// case-insensitive; name matching is exact after trimming.
fn probe_js(descriptor: &ElementDescriptor) -> String {
    // JSON string encoding doubles as JS string escaping.
    let role = serde_json::Value::String(descriptor.role.to_ascii_lowercase());
    let name = serde_json::Value::String(descriptor.name.trim().to_string());
    format!(
        r#"(() => {{
  const wantRole = {role};
  const wantName = {name};
  const implicitRole = (el) => {{
    const tag = el.tagName.toLowerCase();
    if (tag === 'button') return 'button';
    if (tag === 'a' && el.hasAttribute('href')) return 'link';
    if (tag === 'select') return 'combobox';
    if (tag === 'textarea') return 'textbox';
    if (tag === 'input') {{
      const type = (el.getAttribute('type') || 'text').toLowerCase();
      if (type === 'button' || type === 'submit' || type === 'reset') return 'button';
      if (type === 'checkbox' || type === 'radio') return type;
      return 'textbox';
    }}
    return tag;
  }};
  const accessibleName = (el) => {{
    const aria = el.getAttribute('aria-label');
    if (aria && aria.trim()) return aria.trim();
    const text = (el.textContent || '').trim();
    if (text) return text;
    return (el.getAttribute('value') || '').trim();
  }};
  for (const el of document.querySelectorAll('button, a, input, select, textarea, [role]')) {{
    const role = (el.getAttribute('role') || implicitRole(el)).toLowerCase();
    if (role !== wantRole) continue;
    if (accessibleName(el) !== wantName) continue;
    const rect = el.getBoundingClientRect();
    if (rect.width <= 0 || rect.height <= 0) continue;
    return {{ found: true, x: rect.x + rect.width / 2, y: rect.y + rect.height / 2 }};
  }}
  return {{ found: false }};
}})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_embeds_descriptor_as_json_strings() {
        let js = probe_js(&ElementDescriptor::new("button", "START"));
        assert!(js.contains(r#"const wantRole = "button";"#));
        assert!(js.contains(r#"const wantName = "START";"#));
    }

    #[test]
    fn probe_escapes_quotes_in_names() {
        let js = probe_js(&ElementDescriptor::new("button", r#"Say "hi""#));
        assert!(js.contains(r#"const wantName = "Say \"hi\"";"#));
    }

    #[test]
    fn probe_normalizes_role_case_and_name_whitespace() {
        let js = probe_js(&ElementDescriptor::new("Button", "  START  "));
        assert!(js.contains(r#"const wantRole = "button";"#));
        assert!(js.contains(r#"const wantName = "START";"#));
    }
}
