use pagecheck_browser::BrowserError;
use pagecheck_browser::Page;
use serde::Deserialize;
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_IDLE_QUIET: Duration = Duration::from_millis(500);
pub const DEFAULT_IDLE_LIMIT: Duration = Duration::from_secs(10);

/// Policy for deciding when the page has reached a state worth capturing
/// after the interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum SettleStrategy {
    /// Sleep a fixed duration. Used when the target exposes no network or
    /// load signal for its internal loop (e.g. a game loop ticking on
    /// timers).
    FixedDelay { duration: Duration },
    /// Suspend until no network activity for `quiet`, bounded by `limit`.
    NetworkIdle { quiet: Duration, limit: Duration },
}

impl Default for SettleStrategy {
    fn default() -> Self {
        SettleStrategy::FixedDelay {
            duration: Duration::from_secs(3),
        }
    }
}

impl FromStr for SettleStrategy {
    type Err = String;

    /// Accepts `fixed:3s`, a bare duration like `3s` or `750ms`, and
    /// `network-idle` with an optional quiet-window override
    /// (`network-idle:750ms`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix("network-idle") {
            let quiet = match rest.strip_prefix(':') {
                Some(window) => parse_duration(window)
                    .ok_or_else(|| format!("invalid quiet window `{window}`"))?,
                None if rest.is_empty() => DEFAULT_IDLE_QUIET,
                None => return Err(format!("unknown settle strategy `{s}`")),
            };
            return Ok(SettleStrategy::NetworkIdle {
                quiet,
                limit: DEFAULT_IDLE_LIMIT,
            });
        }
        let delay = s.strip_prefix("fixed:").unwrap_or(s);
        let duration = parse_duration(delay).ok_or_else(|| {
            format!("unknown settle strategy `{s}` (expected `fixed:<duration>` or `network-idle`)")
        })?;
        Ok(SettleStrategy::FixedDelay { duration })
    }
}

/// Parse `3s`, `1.5s` or `750ms`. A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        return ms.trim().parse::<u64>().ok().map(Duration::from_millis);
    }
    let secs = s.strip_suffix('s').unwrap_or(s);
    let secs: f64 = secs.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

pub async fn apply(page: &Page, strategy: &SettleStrategy) -> Result<(), BrowserError> {
    match strategy {
        SettleStrategy::FixedDelay { duration } => {
            info!("settling for {}ms", duration.as_millis());
            tokio::time::sleep(*duration).await;
            Ok(())
        }
        SettleStrategy::NetworkIdle { quiet, limit } => {
            info!(
                "waiting for network idle (quiet {}ms, limit {}ms)",
                quiet.as_millis(),
                limit.as_millis()
            );
            page.wait_for_network_idle(*quiet, *limit).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_fixed_delays() {
        assert_eq!(
            "fixed:3s".parse::<SettleStrategy>().unwrap(),
            SettleStrategy::FixedDelay {
                duration: Duration::from_secs(3)
            }
        );
        assert_eq!(
            "750ms".parse::<SettleStrategy>().unwrap(),
            SettleStrategy::FixedDelay {
                duration: Duration::from_millis(750)
            }
        );
        assert_eq!(
            "1.5s".parse::<SettleStrategy>().unwrap(),
            SettleStrategy::FixedDelay {
                duration: Duration::from_millis(1500)
            }
        );
        assert_eq!(
            "15".parse::<SettleStrategy>().unwrap(),
            SettleStrategy::FixedDelay {
                duration: Duration::from_secs(15)
            }
        );
    }

    #[test]
    fn parses_network_idle_with_optional_quiet_window() {
        assert_eq!(
            "network-idle".parse::<SettleStrategy>().unwrap(),
            SettleStrategy::NetworkIdle {
                quiet: DEFAULT_IDLE_QUIET,
                limit: DEFAULT_IDLE_LIMIT,
            }
        );
        assert_eq!(
            "network-idle:750ms".parse::<SettleStrategy>().unwrap(),
            SettleStrategy::NetworkIdle {
                quiet: Duration::from_millis(750),
                limit: DEFAULT_IDLE_LIMIT,
            }
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!("network-idle-ish".parse::<SettleStrategy>().is_err());
        assert!("fixed:".parse::<SettleStrategy>().is_err());
        assert!("soon".parse::<SettleStrategy>().is_err());
        assert!("-3s".parse::<SettleStrategy>().is_err());
    }

    #[test]
    fn default_matches_the_classic_three_second_sleep() {
        assert_eq!(
            SettleStrategy::default(),
            SettleStrategy::FixedDelay {
                duration: Duration::from_secs(3)
            }
        );
    }
}
