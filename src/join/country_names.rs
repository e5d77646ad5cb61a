// src/join/country_names.rs

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// World Bank spelling → UN table spelling.
static RENAMES: &[(&str, &str)] = &[
    ("Vietnam", "Viet Nam"),
    ("Yemen, Rep.", "Yemen"),
    ("Bolivia", "Bolivia (Plurinational State of)"),
    ("Cabo Verde", "Cape Verde"),
    ("Congo, Rep.", "Congo"),
    ("Congo, Dem. Rep.", "Democratic Republic of the Congo"),
    ("Cote d'Ivoire", "Côte d'Ivoire"),
    ("Egypt, Arab Rep.", "Egypt"),
    ("Gambia, The", "Gambia"),
    ("Iran, Islamic Rep.", "Iran (Islamic Republic of)"),
    ("Kyrgyz Republic", "Kyrgyzstan"),
    ("Lao PDR", "Lao People's Democratic Republic"),
    ("Libya", "Libyan Arab Jamahiriya"),
    ("Korea, Rep.", "Republic of Korea"),
    ("Moldova", "Republic of Moldova"),
    ("St. Lucia", "Saint Lucia"),
    ("St. Vincent and the Grenadines", "Saint Vincent and the Grenadines"),
    ("Slovak Republic", "Slovakia"),
    ("Macedonia, FYR", "TFYR of Macedonia"),
    (
        "United Kingdom",
        "United Kingdom of Great Britain and Northern Ireland",
    ),
    ("Tanzania", "United Republic of Tanzania"),
    ("United States", "United States of America"),
    ("Venezuela, RB", "Venezuela (Bolivarian Republic of)"),
    ("Macao SAR, China", "China, Macao SAR"),
    ("Hong Kong SAR, China", "China, Hong Kong SAR"),
];

static LOOKUP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| RENAMES.iter().copied().collect());

/// The scraped-table spelling for a GDP-file country name.
pub fn resolve(name: &str) -> &str {
    LOOKUP.get(name).copied().unwrap_or(name)
}

pub fn entries() -> impl Iterator<Item = (&'static str, &'static str)> {
    RENAMES.iter().copied()
}
