//! Ghana phone numbers and mobile network detection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mobile network operators that data bundles are sold for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobileNetwork {
    Mtn,
    Telecel,
    AirtelTigo,
}

const MTN_PREFIXES: &[&str] = &["024", "025", "053", "054", "055", "059"];
const TELECEL_PREFIXES: &[&str] = &["020", "050"];
const AIRTELTIGO_PREFIXES: &[&str] = &["026", "027", "056", "057"];

impl MobileNetwork {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mtn => "mtn",
            Self::Telecel => "telecel",
            Self::AirtelTigo => "airteltigo",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mtn" => Some(Self::Mtn),
            // Telecel took over the Vodafone Ghana prefixes
            "telecel" | "vodafone" => Some(Self::Telecel),
            "airteltigo" | "at" => Some(Self::AirtelTigo),
            _ => None,
        }
    }

    pub const fn prefixes(&self) -> &'static [&'static str] {
        match self {
            Self::Mtn => MTN_PREFIXES,
            Self::Telecel => TELECEL_PREFIXES,
            Self::AirtelTigo => AIRTELTIGO_PREFIXES,
        }
    }

    /// Detect the network from any accepted phone format.
    pub fn detect(phone: &str) -> Option<Self> {
        let local = normalize_phone(phone)?;
        let prefix = &local[..3];
        [Self::Mtn, Self::Telecel, Self::AirtelTigo]
            .into_iter()
            .find(|network| network.prefixes().contains(&prefix))
    }
}

impl fmt::Display for MobileNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mtn => write!(f, "MTN"),
            Self::Telecel => write!(f, "Telecel"),
            Self::AirtelTigo => write!(f, "AirtelTigo"),
        }
    }
}

/// Normalise a Ghana mobile number to its ten-digit local form (`0XXXXXXXXX`).
///
/// Accepts `0241234567`, `233241234567` and `+233241234567`; spaces, dashes
/// and parentheses are ignored. A `+` is only allowed as the first
/// character. Returns `None` for anything else.
pub fn normalize_phone(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let (has_plus, body) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let digits: String = body
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let subscriber = if let Some(rest) = digits.strip_prefix("233") {
        if rest.len() == 9 {
            rest
        } else {
            return None;
        }
    } else if has_plus {
        return None;
    } else if let Some(rest) = digits.strip_prefix('0') {
        if rest.len() == 9 {
            rest
        } else {
            return None;
        }
    } else {
        return None;
    };

    if subscriber.starts_with('0') {
        return None;
    }

    Some(format!("0{subscriber}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_formats() {
        assert_eq!(normalize_phone("0241234567").as_deref(), Some("0241234567"));
        assert_eq!(normalize_phone("233241234567").as_deref(), Some("0241234567"));
        assert_eq!(normalize_phone("+233 24 123 4567").as_deref(), Some("0241234567"));
        assert_eq!(normalize_phone("024-123-4567").as_deref(), Some("0241234567"));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("024123456"), None);
        assert_eq!(normalize_phone("02412345678"), None);
        assert_eq!(normalize_phone("+44 7700 900123"), None);
        assert_eq!(normalize_phone("0024123456"), None);
        assert_eq!(normalize_phone("02412a4567"), None);
    }

    #[test]
    fn test_normalize_plus_only_leading() {
        assert_eq!(normalize_phone("  +233241234567").as_deref(), Some("0241234567"));
        assert_eq!(normalize_phone("0+241234567"), None);
        assert_eq!(normalize_phone("233+241234567"), None);
        assert_eq!(normalize_phone("++233241234567"), None);
        assert_eq!(normalize_phone("+0241234567"), None);
    }

    #[test]
    fn test_detect_networks() {
        assert_eq!(MobileNetwork::detect("0241234567"), Some(MobileNetwork::Mtn));
        assert_eq!(MobileNetwork::detect("+233591234567"), Some(MobileNetwork::Mtn));
        assert_eq!(MobileNetwork::detect("0201234567"), Some(MobileNetwork::Telecel));
        assert_eq!(MobileNetwork::detect("0501234567"), Some(MobileNetwork::Telecel));
        assert_eq!(MobileNetwork::detect("0271234567"), Some(MobileNetwork::AirtelTigo));
        assert_eq!(MobileNetwork::detect("0571234567"), Some(MobileNetwork::AirtelTigo));
        assert_eq!(MobileNetwork::detect("0301234567"), None);
    }

    #[test]
    fn test_parse_legacy_names() {
        assert_eq!(MobileNetwork::parse_str("Vodafone"), Some(MobileNetwork::Telecel));
        assert_eq!(MobileNetwork::parse_str("mtn"), Some(MobileNetwork::Mtn));
        assert_eq!(MobileNetwork::parse_str("glo"), None);
    }
}
