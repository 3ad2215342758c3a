//! Canonical condition taxonomy and the translation tables from each
//! provider's vocabulary.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::provider::ProviderId;

/// Weather state every provider vocabulary is reduced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CanonicalCondition {
    #[default]
    Clear,
    MostlyClear,
    PartlyCloudy,
    Cloudy,
    Fog,
    LightRain,
    ModerateRain,
    HeavyRain,
    SnowLight,
    SnowModerate,
    SnowHeavy,
    Showers,
    Thunderstorm,
}

impl CanonicalCondition {
    pub const fn all() -> &'static [CanonicalCondition] {
        &[
            Self::Clear,
            Self::MostlyClear,
            Self::PartlyCloudy,
            Self::Cloudy,
            Self::Fog,
            Self::LightRain,
            Self::ModerateRain,
            Self::HeavyRain,
            Self::SnowLight,
            Self::SnowModerate,
            Self::SnowHeavy,
            Self::Showers,
            Self::Thunderstorm,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::MostlyClear => "mostly-clear",
            Self::PartlyCloudy => "partly-cloudy",
            Self::Cloudy => "cloudy",
            Self::Fog => "fog",
            Self::LightRain => "light-rain",
            Self::ModerateRain => "moderate-rain",
            Self::HeavyRain => "heavy-rain",
            Self::SnowLight => "snow-light",
            Self::SnowModerate => "snow-moderate",
            Self::SnowHeavy => "snow-heavy",
            Self::Showers => "showers",
            Self::Thunderstorm => "thunderstorm",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::MostlyClear => "Mostly Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::LightRain => "Light Rain",
            Self::ModerateRain => "Moderate Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::SnowLight => "Light Snow",
            Self::SnowModerate => "Moderate Snow",
            Self::SnowHeavy => "Heavy Snow",
            Self::Showers => "Showers",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

impl fmt::Display for CanonicalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalCondition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| anyhow::anyhow!("Unknown condition '{s}'"))
    }
}

/// A provider-native condition value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProviderCode<'a> {
    Code(i64),
    Text(&'a str),
}

/// Ordered keyword rule for free-text descriptions.
struct KeywordRule {
    keywords: &'static [&'static str],
    resolve: fn(&str) -> CanonicalCondition,
}

/// Translation tables between provider vocabularies and [`CanonicalCondition`].
///
/// Built once and shared; every lookup is total and falls back to
/// [`CanonicalCondition::Clear`].
pub struct ConditionCodeMapper {
    wmo: HashMap<i64, CanonicalCondition>,
    phrases: HashMap<String, CanonicalCondition>,
    keywords: Vec<KeywordRule>,
    icons: HashMap<CanonicalCondition, (&'static str, &'static str)>,
}

impl fmt::Debug for ConditionCodeMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionCodeMapper")
            .field("wmo_codes", &self.wmo.len())
            .field("phrases", &self.phrases.len())
            .field("keyword_rules", &self.keywords.len())
            .finish()
    }
}

impl Default for ConditionCodeMapper {
    fn default() -> Self {
        Self::standard()
    }
}

impl ConditionCodeMapper {
    /// The built-in tables.
    pub fn standard() -> Self {
        use CanonicalCondition::*;

        // WMO weather interpretation codes, as used by Open-Meteo.
        let wmo: HashMap<i64, CanonicalCondition> = [
            (0, Clear),
            (1, MostlyClear),
            (2, PartlyCloudy),
            (3, Cloudy),
            (45, Fog),
            (48, Fog),
            (51, LightRain),
            (53, ModerateRain),
            (55, HeavyRain),
            (56, LightRain),
            (57, ModerateRain),
            (61, LightRain),
            (63, ModerateRain),
            (65, HeavyRain),
            (66, ModerateRain),
            (67, HeavyRain),
            (71, SnowLight),
            (73, SnowModerate),
            (75, SnowHeavy),
            (77, SnowLight),
            (80, Showers),
            (81, Showers),
            (82, Showers),
            (85, SnowModerate),
            (86, SnowHeavy),
            (95, Thunderstorm),
            (96, Thunderstorm),
            (99, Thunderstorm),
        ]
        .into_iter()
        .collect();

        let phrases = [
            ("clear", Clear),
            ("sunny", Clear),
            ("mostly clear", MostlyClear),
            ("mostly sunny", MostlyClear),
            ("partly cloudy", PartlyCloudy),
            ("partly sunny", PartlyCloudy),
            ("cloudy", Cloudy),
            ("mostly cloudy", Cloudy),
            ("overcast", Cloudy),
            ("fog", Fog),
            ("mist", Fog),
            ("haze", Fog),
            ("light rain", LightRain),
            ("light drizzle", LightRain),
            ("drizzle", LightRain),
            ("moderate rain", ModerateRain),
            ("moderate drizzle", ModerateRain),
            ("rain", ModerateRain),
            ("light to moderate rain", ModerateRain),
            ("heavy rain", HeavyRain),
            ("heavy drizzle", HeavyRain),
            ("moderate to heavy rain", HeavyRain),
            ("light snow", SnowLight),
            ("snow", SnowModerate),
            ("moderate snow", SnowModerate),
            ("heavy snow", SnowHeavy),
            ("snowstorm", SnowHeavy),
            ("showers", Showers),
            ("rain showers", Showers),
            ("scattered showers", Showers),
            ("chance of showers", Showers),
            ("thunderstorm", Thunderstorm),
            ("light thunderstorm", Thunderstorm),
            ("moderate thunderstorm", Thunderstorm),
            ("heavy thunderstorm", Thunderstorm),
            ("scattered thunderstorms", Thunderstorm),
            ("thundershower", Thunderstorm),
        ]
        .into_iter()
        .map(|(phrase, condition)| (phrase.to_string(), condition))
        .collect();

        // Evaluated top to bottom; first rule with a matching keyword wins.
        let keywords = vec![
            KeywordRule {
                keywords: &["thunder", "lightning", "tormenta"],
                resolve: |_| Thunderstorm,
            },
            KeywordRule { keywords: &["snow", "sleet", "flurr", "nieve"], resolve: snow_intensity },
            KeywordRule {
                keywords: &["rain", "drizzle", "shower", "lluvia", "llovizna"],
                resolve: rain_intensity,
            },
            KeywordRule { keywords: &["fog", "mist", "haze", "niebla"], resolve: |_| Fog },
            KeywordRule {
                keywords: &["cloud", "overcast", "nub"],
                resolve: |text| {
                    if text.contains("partly") || text.contains("parcial") {
                        PartlyCloudy
                    } else {
                        Cloudy
                    }
                },
            },
        ];

        let icons = [
            (Clear, ("☀️", "🌙")),
            (MostlyClear, ("🌤️", "🌙")),
            (PartlyCloudy, ("⛅", "☁️")),
            (Cloudy, ("☁️", "☁️")),
            (Fog, ("🌫️", "🌫️")),
            (LightRain, ("🌦️", "🌧️")),
            (ModerateRain, ("🌧️", "🌧️")),
            (HeavyRain, ("🌧️", "🌧️")),
            (SnowLight, ("🌨️", "🌨️")),
            (SnowModerate, ("❄️", "❄️")),
            (SnowHeavy, ("❄️", "❄️")),
            (Showers, ("🌦️", "🌧️")),
            (Thunderstorm, ("⛈️", "⛈️")),
        ]
        .into_iter()
        .collect();

        Self { wmo, phrases, keywords, icons }
    }

    /// Map a provider-native condition to the canonical taxonomy.
    ///
    /// Unrecognised input yields [`CanonicalCondition::Clear`].
    pub fn to_canonical(&self, code: ProviderCode<'_>, provider: ProviderId) -> CanonicalCondition {
        match (code, provider) {
            (ProviderCode::Code(code), ProviderId::OpenMeteo) => self.from_wmo(code),
            // The grid provider has no numeric vocabulary.
            (ProviderCode::Code(_), ProviderId::Google) => CanonicalCondition::Clear,
            (ProviderCode::Text(text), _) => self.from_text(text),
        }
    }

    pub fn from_wmo(&self, code: i64) -> CanonicalCondition {
        self.wmo.get(&code).copied().unwrap_or_default()
    }

    /// Exact phrase lookup first, then ordered keyword containment.
    pub fn from_text(&self, text: &str) -> CanonicalCondition {
        let normalized = text.trim().to_lowercase().replace(['_', '-'], " ");
        if let Some(condition) = self.phrases.get(&normalized) {
            return *condition;
        }

        self.keywords
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| normalized.contains(k)))
            .map(|rule| (rule.resolve)(&normalized))
            .unwrap_or_default()
    }

    /// Glyph used by presentation for a condition.
    pub fn to_icon(&self, condition: CanonicalCondition, is_day: bool) -> &'static str {
        match self.icons.get(&condition) {
            Some(&(day, _)) if is_day => day,
            Some(&(_, night)) => night,
            None => "☀️",
        }
    }
}

fn snow_intensity(text: &str) -> CanonicalCondition {
    if text.contains("heavy") || text.contains("storm") || text.contains("fuerte") {
        CanonicalCondition::SnowHeavy
    } else if text.contains("light") || text.contains("flurr") || text.contains("ligera") {
        CanonicalCondition::SnowLight
    } else {
        CanonicalCondition::SnowModerate
    }
}

fn rain_intensity(text: &str) -> CanonicalCondition {
    if text.contains("shower") || text.contains("chubasco") {
        CanonicalCondition::Showers
    } else if text.contains("heavy") || text.contains("fuerte") {
        CanonicalCondition::HeavyRain
    } else if text.contains("moderate") || text.contains("moderada") {
        CanonicalCondition::ModerateRain
    } else if text.contains("light") || text.contains("drizzle") || text.contains("ligera") || text.contains("llovizna") {
        CanonicalCondition::LightRain
    } else {
        CanonicalCondition::ModerateRain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> ConditionCodeMapper {
        ConditionCodeMapper::standard()
    }

    #[test]
    fn wmo_codes_cover_the_published_table() {
        let m = mapper();
        assert_eq!(m.to_canonical(ProviderCode::Code(0), ProviderId::OpenMeteo), CanonicalCondition::Clear);
        assert_eq!(m.to_canonical(ProviderCode::Code(1), ProviderId::OpenMeteo), CanonicalCondition::MostlyClear);
        assert_eq!(m.to_canonical(ProviderCode::Code(2), ProviderId::OpenMeteo), CanonicalCondition::PartlyCloudy);
        assert_eq!(m.to_canonical(ProviderCode::Code(3), ProviderId::OpenMeteo), CanonicalCondition::Cloudy);
        assert_eq!(m.to_canonical(ProviderCode::Code(48), ProviderId::OpenMeteo), CanonicalCondition::Fog);
        assert_eq!(m.to_canonical(ProviderCode::Code(61), ProviderId::OpenMeteo), CanonicalCondition::LightRain);
        assert_eq!(m.to_canonical(ProviderCode::Code(65), ProviderId::OpenMeteo), CanonicalCondition::HeavyRain);
        assert_eq!(m.to_canonical(ProviderCode::Code(75), ProviderId::OpenMeteo), CanonicalCondition::SnowHeavy);
        assert_eq!(m.to_canonical(ProviderCode::Code(81), ProviderId::OpenMeteo), CanonicalCondition::Showers);
        assert_eq!(m.to_canonical(ProviderCode::Code(99), ProviderId::OpenMeteo), CanonicalCondition::Thunderstorm);
    }

    #[test]
    fn unknown_inputs_default_to_clear() {
        let m = mapper();
        for code in [-1, 4, 100, 999, i64::MAX] {
            assert_eq!(m.to_canonical(ProviderCode::Code(code), ProviderId::OpenMeteo), CanonicalCondition::Clear);
            assert_eq!(m.to_canonical(ProviderCode::Code(code), ProviderId::Google), CanonicalCondition::Clear);
        }
        for text in ["", "   ", "Desconocido", "windy", "🌈"] {
            assert_eq!(m.to_canonical(ProviderCode::Text(text), ProviderId::Google), CanonicalCondition::Clear);
        }
    }

    #[test]
    fn heavy_thunderstorm_is_thunderstorm_for_every_provider() {
        let m = mapper();
        for provider in ProviderId::all() {
            assert_eq!(
                m.to_canonical(ProviderCode::Text("Heavy Thunderstorm"), *provider),
                CanonicalCondition::Thunderstorm
            );
        }
    }

    #[test]
    fn exact_phrases_are_case_insensitive() {
        let m = mapper();
        assert_eq!(m.from_text("PARTLY CLOUDY"), CanonicalCondition::PartlyCloudy);
        assert_eq!(m.from_text("mostly_cloudy"), CanonicalCondition::Cloudy);
        assert_eq!(m.from_text("Light Drizzle"), CanonicalCondition::LightRain);
        assert_eq!(m.from_text(" Sunny "), CanonicalCondition::Clear);
    }

    #[test]
    fn keyword_order_prefers_thunder_over_snow_over_rain() {
        let m = mapper();
        assert_eq!(m.from_text("snow with thunder"), CanonicalCondition::Thunderstorm);
        assert_eq!(m.from_text("rain and snow mix"), CanonicalCondition::SnowModerate);
        assert_eq!(m.from_text("rain in the fog"), CanonicalCondition::ModerateRain);
        assert_eq!(m.from_text("fog under clouds"), CanonicalCondition::Fog);
        assert_eq!(m.from_text("some clouds later"), CanonicalCondition::Cloudy);
    }

    #[test]
    fn keyword_intensity_is_read_from_the_text() {
        let m = mapper();
        assert_eq!(m.from_text("Heavy snow showers"), CanonicalCondition::SnowHeavy);
        assert_eq!(m.from_text("Light snow showers"), CanonicalCondition::SnowLight);
        assert_eq!(m.from_text("Light rain showers"), CanonicalCondition::Showers);
        assert_eq!(m.from_text("Rain periodically heavy"), CanonicalCondition::HeavyRain);
        assert_eq!(m.from_text("Patchy drizzle"), CanonicalCondition::LightRain);
        assert_eq!(m.from_text("Lluvia ligera"), CanonicalCondition::LightRain);
        assert_eq!(m.from_text("Partly cloudy skies"), CanonicalCondition::PartlyCloudy);
    }

    #[test]
    fn every_condition_has_day_and_night_icons() {
        let m = mapper();
        for condition in CanonicalCondition::all() {
            assert!(!m.to_icon(*condition, true).is_empty());
            assert!(!m.to_icon(*condition, false).is_empty());
        }
        assert_eq!(m.to_icon(CanonicalCondition::Clear, true), "☀️");
        assert_eq!(m.to_icon(CanonicalCondition::Clear, false), "🌙");
    }

    #[test]
    fn condition_names_parse_back() {
        for condition in CanonicalCondition::all() {
            let parsed: CanonicalCondition = condition.as_str().parse().expect("known name");
            assert_eq!(*condition, parsed);
        }
        assert!("drizzly".parse::<CanonicalCondition>().is_err());
    }
}
