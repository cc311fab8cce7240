//! Client-facing export for the date-picker control.
//!
//! Pure presentation data: the widths of the date sub-inputs and the month
//! select choices, serialized as JSON for the client-side control template.
//! Not part of the setting protocol itself.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::Serialize;

/// One entry of the month `<select>`: `{ text: "03-Mar", value: "03" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthChoice {
    pub text: String,
    pub value: String,
}

/// Sub-input widths keyed by input type. `month` is `null` because it
/// renders as a select, not a sized text input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateInputs {
    pub month: Option<u8>,
    pub date: u8,
    pub year: u8,
    pub hour: u8,
    pub min: u8,
}

impl Default for DateInputs {
    fn default() -> Self {
        Self {
            month: None,
            date: 2,
            year: 4,
            hour: 2,
            min: 2,
        }
    }
}

/// The full payload exported to the client for a post-date control.
#[derive(Debug, Clone, Serialize)]
pub struct PostDateControl {
    #[serde(rename = "type")]
    pub control_type: &'static str,
    pub date_inputs: DateInputs,
    pub month_choices: Vec<MonthChoice>,
}

impl Default for PostDateControl {
    fn default() -> Self {
        Self {
            control_type: "post_date",
            date_inputs: DateInputs::default(),
            month_choices: month_choices().to_vec(),
        }
    }
}

impl PostDateControl {
    pub fn new() -> Self {
        Self::default()
    }
}

static MONTH_CHOICES: Lazy<Vec<MonthChoice>> = Lazy::new(|| {
    (1..=12)
        .map(|month| {
            let abbrev = NaiveDate::from_ymd_opt(2000, month, 1)
                .expect("month in 1..=12")
                .format("%b");
            MonthChoice {
                text: format!("{month:02}-{abbrev}"),
                value: format!("{month:02}"),
            }
        })
        .collect()
});

/// The twelve month choices, zero-padded value plus `NN-Abb` label.
pub fn month_choices() -> &'static [MonthChoice] {
    &MONTH_CHOICES
}
