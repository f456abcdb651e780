// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Locale-aware display formatting.
//!
//! The locale is an explicit [`FormatContext`] passed to every formatter; no
//! formatting function reads ambient state.

use serde::{Deserialize, Serialize};

use crate::models::{AchievementType, Frequency, MemberStatus};

/// Supported UI languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    /// Parse a language tag (`es`, `es-MX`, `en_US`, ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "es" => Some(Locale::Es),
            _ => None,
        }
    }

    /// First supported language in an `Accept-Language` header.
    ///
    /// Quality weights are honored; ties keep header order.
    pub fn from_accept_language(header: &str) -> Option<Self> {
        let mut candidates: Vec<(f32, Locale)> = header
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.split(';');
                let locale = Locale::from_tag(pieces.next()?)?;
                let quality = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                Some((quality, locale))
            })
            .collect();
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.first().map(|(_, locale)| *locale)
    }

    /// Currency used when none is configured.
    pub fn default_currency(self) -> Currency {
        match self {
            Locale::En => Currency::Usd,
            Locale::Es => Currency::Eur,
        }
    }

    fn separators(self) -> (char, char) {
        // (thousands, decimal)
        match self {
            Locale::En => (',', '.'),
            Locale::Es => ('.', ','),
        }
    }
}

/// Display currencies. Amounts are never converted between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Mxn,
}

impl Currency {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "MXN" => Some(Currency::Mxn),
            _ => None,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Mxn => "MX$",
        }
    }
}

/// Everything a formatter needs to know about the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatContext {
    pub locale: Locale,
    pub currency: Currency,
}

impl FormatContext {
    pub fn new(locale: Locale, currency: Currency) -> Self {
        Self { locale, currency }
    }

    /// Context for a locale using its default currency.
    pub fn for_locale(locale: Locale) -> Self {
        Self::new(locale, locale.default_currency())
    }
}

impl Default for FormatContext {
    fn default() -> Self {
        Self::for_locale(Locale::default())
    }
}

/// Format an amount with two decimals, grouping and currency symbol.
pub fn format_currency(amount: f64, ctx: &FormatContext) -> String {
    let number = format_number(amount.abs(), ctx.locale);
    let sign = if amount < 0.0 && amount.abs() >= 0.005 {
        "-"
    } else {
        ""
    };

    match (ctx.locale, ctx.currency) {
        // Spanish places the euro after the amount
        (Locale::Es, Currency::Eur) => format!("{}{} {}", sign, number, ctx.currency.symbol()),
        _ => format!("{}{}{}", sign, ctx.currency.symbol(), number),
    }
}

fn format_number(amount: f64, locale: Locale) -> String {
    let (thousands, decimal) = locale.separators();
    let cents = (amount * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(thousands);
        }
        grouped.push(digit);
    }

    format!("{}{}{:02}", grouped, decimal, fraction)
}

/// Progress percentage for display, clamped to 0–100.
pub fn format_percent(progress_percent: i64) -> String {
    format!("{}%", progress_percent.clamp(0, 100))
}

pub fn status_label(status: MemberStatus, locale: Locale) -> &'static str {
    match (status, locale) {
        (MemberStatus::OnTrack, Locale::En) => "On track",
        (MemberStatus::AtRisk, Locale::En) => "At risk",
        (MemberStatus::Behind, Locale::En) => "Behind",
        (MemberStatus::OnTrack, Locale::Es) => "Al día",
        (MemberStatus::AtRisk, Locale::Es) => "En riesgo",
        (MemberStatus::Behind, Locale::Es) => "Atrasado",
    }
}

/// Cadence label, e.g. "Every 10 days".
pub fn frequency_label(frequency: Frequency, custom_days: Option<i64>, locale: Locale) -> String {
    let days = frequency.period_days(custom_days);
    match (frequency, locale) {
        (Frequency::Daily, Locale::En) => "Daily".to_string(),
        (Frequency::Weekly, Locale::En) => "Weekly".to_string(),
        (Frequency::Biweekly, Locale::En) => "Every two weeks".to_string(),
        (Frequency::Monthly, Locale::En) => "Monthly".to_string(),
        (Frequency::Custom, Locale::En) => format!("Every {} days", days),
        (Frequency::Daily, Locale::Es) => "Diario".to_string(),
        (Frequency::Weekly, Locale::Es) => "Semanal".to_string(),
        (Frequency::Biweekly, Locale::Es) => "Quincenal".to_string(),
        (Frequency::Monthly, Locale::Es) => "Mensual".to_string(),
        (Frequency::Custom, Locale::Es) => format!("Cada {} días", days),
    }
}

pub fn achievement_title(achievement: AchievementType, locale: Locale) -> &'static str {
    use AchievementType::*;
    match (achievement, locale) {
        (FirstContribution, Locale::En) => "First step",
        (Streak3, Locale::En) => "3-period streak",
        (Streak7, Locale::En) => "7-period streak",
        (Streak30, Locale::En) => "30-period streak",
        (First50Percent, Locale::En) => "Halfway there",
        (GoalCompleted, Locale::En) => "Goal reached",
        (MostConsistent, Locale::En) => "Most consistent",
        (EarlyBird, Locale::En) => "Early bird",
        (BigSaver, Locale::En) => "Big saver",
        (FirstContribution, Locale::Es) => "Primer paso",
        (Streak3, Locale::Es) => "Racha de 3",
        (Streak7, Locale::Es) => "Racha de 7",
        (Streak30, Locale::Es) => "Racha de 30",
        (First50Percent, Locale::Es) => "A mitad de camino",
        (GoalCompleted, Locale::Es) => "Meta cumplida",
        (MostConsistent, Locale::Es) => "El más constante",
        (EarlyBird, Locale::Es) => "Madrugador",
        (BigSaver, Locale::Es) => "Gran ahorrador",
    }
}
