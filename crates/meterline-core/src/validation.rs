//! # Validation Module
//!
//! Input checks run before any period arithmetic.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API / persistence layer (outside this repo)                  │
//! │  ├── Request shape, required fields                                    │
//! │  └── String → enum parsing (BillingPeriod::from_str)                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Period unit > 0                                                   │
//! │  ├── Period bounds ordered                                             │
//! │  └── Event not before subscription start                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine invariants (period.rs, resolver.rs)                   │
//! │  └── Bounded search, boundary consistency                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, TimeZone};

use crate::error::{stamp, ValidationError};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a period unit multiplier ("every N periods").
///
/// ## Rules
/// - Must be positive (> 0)
///
/// ## Example
/// ```rust
/// use meterline_core::validation::validate_period_unit;
///
/// assert!(validate_period_unit(3).is_ok());
/// assert!(validate_period_unit(0).is_err());
/// assert!(validate_period_unit(-1).is_err());
/// ```
pub fn validate_period_unit(unit: i32) -> ValidationResult<()> {
    if unit <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "period unit".to_string(),
            value: i64::from(unit),
        });
    }

    Ok(())
}

/// Validates a count used for durations (expiry lengths, grant counts).
pub fn validate_positive_count(field: &str, count: i32) -> ValidationResult<()> {
    if count <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
            value: i64::from(count),
        });
    }

    Ok(())
}

// =============================================================================
// Timestamp Validators
// =============================================================================

/// Validates that `start` is strictly before `end`.
pub fn validate_period_bounds<Tz: TimeZone>(
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> ValidationResult<()> {
    if start >= end {
        return Err(ValidationError::InvalidPeriodBounds {
            start: stamp(start),
            end: stamp(end),
        });
    }

    Ok(())
}

/// Validates that a usage event does not precede its subscription.
///
/// ## User Workflow
/// ```text
/// Usage event arrives (late, from a backfill)
///      │
///      ▼
/// validate_event_not_before_start ← THIS FUNCTION
///      │
///      ├── event < subscription start? → EventBeforeSubscription
///      │
///      └── OK → resolve which period it belongs to
/// ```
pub fn validate_event_not_before_start<Tz: TimeZone>(
    event: &DateTime<Tz>,
    subscription_start: &DateTime<Tz>,
) -> ValidationResult<()> {
    if event < subscription_start {
        return Err(ValidationError::EventBeforeSubscription {
            event: stamp(event),
            subscription_start: stamp(subscription_start),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_validate_period_unit() {
        assert!(validate_period_unit(1).is_ok());
        assert!(validate_period_unit(12).is_ok());

        assert!(validate_period_unit(0).is_err());
        assert!(validate_period_unit(-5).is_err());
    }

    #[test]
    fn test_validate_positive_count_names_field() {
        let err = validate_positive_count("expiry duration", 0).unwrap_err();
        assert_eq!(err.to_string(), "expiry duration must be positive, got 0");
    }

    #[test]
    fn test_validate_period_bounds() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(validate_period_bounds(&a, &b).is_ok());
        assert!(validate_period_bounds(&b, &a).is_err());
        assert!(validate_period_bounds(&a, &a).is_err());
    }

    #[test]
    fn test_validate_event_not_before_start() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert!(validate_event_not_before_start(&start, &start).is_ok());
        assert!(matches!(
            validate_event_not_before_start(&before, &start),
            Err(ValidationError::EventBeforeSubscription { .. })
        ));
    }
}
