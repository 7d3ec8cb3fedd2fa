//! Per-transfer resource budget.
//!
//! A [`ResourceBudget`] holds the memory limit, the processing deadline and the
//! compression toggle for exactly one transfer. It starts from configuration,
//! is adapted to the size of the file being served and travels back to the
//! caller with the transfer outcome so the adjustments can be logged.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, TRACING_TARGET_BUDGET};

/// Hard ceiling a raised memory limit may never exceed (1 GiB).
pub const MEMORY_CEILING: u64 = 1024 * 1024 * 1024;

/// File size above which in-process transfers are chunked (1 MiB).
pub const CHUNK_THRESHOLD: u64 = 1024 * 1024;

/// Minimum guaranteed client throughput in bytes per second.
const MIN_THROUGHPUT: u64 = 51_200;

/// Fixed allowance added to every non-empty transfer.
const TIME_OVERHEAD_SECS: u64 = 60;

/// Upper bound of the processing deadline (120 minutes).
const MAX_TIME_SECS: u64 = 7_200;

/// Memory limit as configured for the serving process.
///
/// Parsed from the human-readable notation `"256M"`, `"512k"`, `"1G"`, a plain
/// byte count, or `"-1"` for no limit. The `k`, `m` and `g` suffixes are
/// case-insensitive powers of 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MemoryLimit {
    /// No limit is enforced.
    Unlimited,
    /// Limit in bytes.
    Bytes(u64),
}

impl MemoryLimit {
    /// Returns the limit in bytes, or `None` when unlimited.
    #[must_use]
    pub const fn bytes(self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::Bytes(bytes) => Some(bytes),
        }
    }

    /// Returns whether serving `size` bytes does not fit into this limit.
    #[must_use]
    pub const fn is_exceeded_by(self, size: u64) -> bool {
        match self {
            Self::Unlimited => false,
            Self::Bytes(limit) => size.saturating_add(1) > limit,
        }
    }
}

impl FromStr for MemoryLimit {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed == "-1" {
            return Ok(Self::Unlimited);
        }

        let Some(last) = trimmed.chars().last() else {
            return Err(Error::invalid_memory_limit(value));
        };

        let (digits, multiplier) = match last.to_ascii_lowercase() {
            'g' => (&trimmed[..trimmed.len() - 1], 1024 * 1024 * 1024),
            'm' => (&trimmed[..trimmed.len() - 1], 1024 * 1024),
            'k' => (&trimmed[..trimmed.len() - 1], 1024),
            _ => (trimmed, 1),
        };

        digits
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|number| number.checked_mul(multiplier))
            .map(Self::Bytes)
            .ok_or_else(|| Error::invalid_memory_limit(value))
    }
}

impl TryFrom<String> for MemoryLimit {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MemoryLimit> for String {
    fn from(limit: MemoryLimit) -> Self {
        limit.to_string()
    }
}

impl fmt::Display for MemoryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("-1"),
            Self::Bytes(bytes) => write!(f, "{bytes}"),
        }
    }
}

impl Default for MemoryLimit {
    fn default() -> Self {
        Self::Bytes(128 * 1024 * 1024)
    }
}

/// What to do when a file would need more than [`MEMORY_CEILING`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OversizePolicy {
    /// Keep the current limit and serve the file anyway.
    #[default]
    Proceed,
    /// Refuse the transfer before any header is produced.
    Reject,
}

/// Result of adapting the memory limit to a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryAdjustment {
    /// The current limit already covers the file.
    Unchanged,
    /// The limit was raised to one and a half times the file size.
    Raised {
        /// Limit before the adjustment.
        from: MemoryLimit,
        /// Limit after the adjustment, in bytes.
        to: u64,
    },
    /// The projected limit would exceed [`MEMORY_CEILING`]; nothing changed.
    OverCeiling {
        /// Limit the file would have required, in bytes.
        projected: u64,
    },
}

/// Resource budget for a single transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "budget does nothing unless you use it"]
pub struct ResourceBudget {
    memory_limit: MemoryLimit,
    time_limit: Option<Duration>,
    compression: bool,
}

impl ResourceBudget {
    /// Creates a budget with the given memory limit, no deadline and
    /// compression allowed.
    pub const fn new(memory_limit: MemoryLimit) -> Self {
        Self {
            memory_limit,
            time_limit: None,
            compression: true,
        }
    }

    /// Returns the current memory limit.
    #[must_use]
    pub const fn memory_limit(&self) -> MemoryLimit {
        self.memory_limit
    }

    /// Returns the processing deadline, if one was set.
    #[must_use]
    pub const fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Returns whether response compression is still allowed.
    #[must_use]
    pub const fn compression(&self) -> bool {
        self.compression
    }

    /// Raises the memory limit to `size * 1.5` when the file does not fit
    /// into the current limit and the raised value stays within
    /// [`MEMORY_CEILING`].
    pub fn adapt_memory(&mut self, size: u64) -> MemoryAdjustment {
        if !self.memory_limit.is_exceeded_by(size) {
            return MemoryAdjustment::Unchanged;
        }

        let projected = u128::from(size) * 3 / 2;
        if projected > u128::from(MEMORY_CEILING) {
            let projected = u64::try_from(projected).unwrap_or(u64::MAX);
            tracing::warn!(
                target: TRACING_TARGET_BUDGET,
                size,
                projected,
                ceiling = MEMORY_CEILING,
                limit = %self.memory_limit,
                "file needs more memory than the ceiling allows, keeping current limit"
            );
            return MemoryAdjustment::OverCeiling { projected };
        }

        // Bounded by MEMORY_CEILING above.
        let to = projected as u64;
        let from = self.memory_limit;
        self.memory_limit = MemoryLimit::Bytes(to);

        tracing::debug!(
            target: TRACING_TARGET_BUDGET,
            size,
            from = %from,
            to,
            "raised memory limit"
        );

        MemoryAdjustment::Raised { from, to }
    }

    /// Sets the processing deadline for a transfer of `size` bytes and
    /// returns it.
    pub fn extend_time(&mut self, size: u64) -> Duration {
        let limit = time_budget(size);
        self.time_limit = Some(limit);
        limit
    }

    /// Turns off response compression for the rest of the transfer.
    pub fn disable_compression(&mut self) {
        self.compression = false;
    }

    /// Applies every in-process adjustment for a file of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::FileTooLarge`] when the memory projection exceeds
    /// the ceiling and `policy` is [`OversizePolicy::Reject`].
    ///
    /// [`ErrorKind::FileTooLarge`]: crate::ErrorKind::FileTooLarge
    pub fn prepare(&mut self, size: u64, policy: OversizePolicy) -> Result<MemoryAdjustment> {
        let adjustment = self.adapt_memory(size);
        if let MemoryAdjustment::OverCeiling { .. } = adjustment
            && policy == OversizePolicy::Reject
        {
            return Err(Error::file_too_large(size, MEMORY_CEILING));
        }

        self.disable_compression();
        self.extend_time(size);
        Ok(adjustment)
    }
}

impl Default for ResourceBudget {
    fn default() -> Self {
        Self::new(MemoryLimit::default())
    }
}

/// Returns the processing deadline for a transfer of `size` bytes.
///
/// Models a client receiving at least 50 KiB/s plus one minute of overhead,
/// capped at two hours. An empty file gets one second.
#[must_use]
pub fn time_budget(size: u64) -> Duration {
    let secs = if size > 0 {
        (size / MIN_THROUGHPUT).saturating_add(TIME_OVERHEAD_SECS)
    } else {
        1
    };

    Duration::from_secs(secs.min(MAX_TIME_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn parse_memory_limits() {
        assert_eq!("256M".parse::<MemoryLimit>().unwrap(), MemoryLimit::Bytes(268_435_456));
        assert_eq!("512k".parse::<MemoryLimit>().unwrap(), MemoryLimit::Bytes(524_288));
        assert_eq!("1G".parse::<MemoryLimit>().unwrap(), MemoryLimit::Bytes(1_073_741_824));
        assert_eq!(" 2g ".parse::<MemoryLimit>().unwrap(), MemoryLimit::Bytes(2_147_483_648));
        assert_eq!("1048576".parse::<MemoryLimit>().unwrap(), MemoryLimit::Bytes(1_048_576));
        assert_eq!("-1".parse::<MemoryLimit>().unwrap(), MemoryLimit::Unlimited);
    }

    #[test]
    fn reject_invalid_memory_limits() {
        for value in ["", "M", "abc", "12x", "-5", "99999999999999999999G"] {
            let err = value.parse::<MemoryLimit>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidMemoryLimit, "{value:?}");
        }
    }

    #[test]
    fn memory_limit_serde_uses_string_notation() {
        let limit: MemoryLimit = serde_json::from_str("\"64M\"").unwrap();
        assert_eq!(limit, MemoryLimit::Bytes(67_108_864));
        assert_eq!(serde_json::to_string(&MemoryLimit::Unlimited).unwrap(), "\"-1\"");
    }

    #[test]
    fn raises_limit_for_files_that_do_not_fit() {
        let mut budget = ResourceBudget::new("1M".parse().unwrap());
        let adjustment = budget.adapt_memory(2 * 1024 * 1024);

        assert_eq!(
            adjustment,
            MemoryAdjustment::Raised {
                from: MemoryLimit::Bytes(1024 * 1024),
                to: 3 * 1024 * 1024,
            }
        );
        assert_eq!(budget.memory_limit(), MemoryLimit::Bytes(3 * 1024 * 1024));
    }

    #[test]
    fn keeps_limit_when_file_fits() {
        let mut budget = ResourceBudget::new("256M".parse().unwrap());
        assert_eq!(budget.adapt_memory(1024), MemoryAdjustment::Unchanged);

        let mut unlimited = ResourceBudget::new(MemoryLimit::Unlimited);
        assert_eq!(unlimited.adapt_memory(u64::MAX), MemoryAdjustment::Unchanged);
    }

    #[test]
    fn file_equal_to_limit_does_not_fit() {
        let mut budget = ResourceBudget::new(MemoryLimit::Bytes(1000));
        assert_eq!(
            budget.adapt_memory(1000),
            MemoryAdjustment::Raised {
                from: MemoryLimit::Bytes(1000),
                to: 1500,
            }
        );
    }

    #[test]
    fn never_raises_above_ceiling() {
        for size in [MEMORY_CEILING, MEMORY_CEILING / 3 * 2 + 2, u64::MAX] {
            let mut budget = ResourceBudget::new(MemoryLimit::Bytes(1024));
            let adjustment = budget.adapt_memory(size);

            assert!(matches!(adjustment, MemoryAdjustment::OverCeiling { .. }));
            assert_eq!(budget.memory_limit(), MemoryLimit::Bytes(1024));
        }

        let mut budget = ResourceBudget::new(MemoryLimit::Bytes(1024));
        budget.adapt_memory(MEMORY_CEILING / 3 * 2);
        assert!(budget.memory_limit().bytes().unwrap() <= MEMORY_CEILING);
    }

    #[test]
    fn prepare_honours_oversize_policy() {
        let mut budget = ResourceBudget::new(MemoryLimit::Bytes(1024));
        let err = budget
            .prepare(MEMORY_CEILING, OversizePolicy::Reject)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileTooLarge);
        assert!(budget.compression());

        let mut budget = ResourceBudget::new(MemoryLimit::Bytes(1024));
        let adjustment = budget
            .prepare(MEMORY_CEILING, OversizePolicy::Proceed)
            .unwrap();
        assert!(matches!(adjustment, MemoryAdjustment::OverCeiling { .. }));
        assert!(!budget.compression());
        assert_eq!(budget.time_limit(), Some(time_budget(MEMORY_CEILING)));
    }

    #[test]
    fn time_budget_bounds() {
        assert_eq!(time_budget(0), Duration::from_secs(1));
        assert_eq!(time_budget(1), Duration::from_secs(60));
        assert_eq!(time_budget(51_200), Duration::from_secs(61));
        assert_eq!(time_budget(10 * 1024 * 1024), Duration::from_secs(264));
        assert_eq!(time_budget(u64::MAX), Duration::from_secs(7_200));
    }

    #[test]
    fn oversize_policy_from_str() {
        assert_eq!("reject".parse::<OversizePolicy>().unwrap(), OversizePolicy::Reject);
        assert_eq!(OversizePolicy::Proceed.to_string(), "proceed");
    }
}
