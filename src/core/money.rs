//! Currency helpers. All amounts are `f64` in one implicit currency (euros).

/// Rounds an amount to whole cents.
#[must_use]
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Formats an amount for display, e.g. `3.10 €`.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    format!("{amount:.2} €")
}
