//! Best-effort results.
//!
//! A field that could not be read still gets a value (empty string, zero
//! price); the [`Outcome`] says whether it is real. Degraded outcomes are
//! logged at the point they happen and collected in a [`VisitReport`].

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Degraded { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<T> {
    pub value: T,
    pub outcome: Outcome,
}

impl<T> Extracted<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            outcome: Outcome::Ok,
        }
    }

    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            outcome: Outcome::Degraded {
                reason: reason.into(),
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, Outcome::Degraded { .. })
    }
}

/// A field that fell back to its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    /// Combination the field belongs to; `None` for product-level fields.
    pub combination: Option<String>,
    pub reason: String,
}

/// What went imperfectly during one product visit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitReport {
    pub issues: Vec<FieldIssue>,
    /// Combinations skipped because their option vanished or could not be clicked.
    pub skipped: Vec<String>,
    /// Combinations emitted although their selection was never confirmed.
    pub unsettled: Vec<String>,
    /// Variant discovery passes, including the initial one.
    pub discovery_calls: usize,
}

impl VisitReport {
    /// Unwraps `extracted`, recording it when degraded.
    pub fn take<T>(
        &mut self,
        field: &'static str,
        combination: Option<&str>,
        extracted: Extracted<T>,
    ) -> T {
        if let Outcome::Degraded { reason } = extracted.outcome {
            tracing::warn!(field, combination, reason = %reason, "field degraded to default");
            self.issues.push(FieldIssue {
                field,
                combination: combination.map(str::to_owned),
                reason,
            });
        }
        extracted.value
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.skipped.is_empty() && self.unsettled.is_empty()
    }

    /// Issues recorded for `field`.
    pub fn issues_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldIssue> {
        self.issues.iter().filter(move |issue| issue.field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_records_degraded_values_only() {
        let mut report = VisitReport::default();
        let title = report.take("title", None, Extracted::ok("Trail Runner".to_owned()));
        let price = report.take(
            "price",
            Some("Black / 7"),
            Extracted::degraded(0u32, "no price element"),
        );
        assert_eq!(title, "Trail Runner");
        assert_eq!(price, 0);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].combination.as_deref(), Some("Black / 7"));
        assert_eq!(report.issues_for("price").count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn extracted_reports_degradation() {
        assert!(Extracted::degraded(String::new(), "missing").is_degraded());
        assert!(!Extracted::ok(1).is_degraded());
    }
}
