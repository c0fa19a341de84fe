//! Prop firm identifiers.

use serde::{Deserialize, Serialize};

/// Provider whose funded-account program an account belongs to.
///
/// Chosen when the account is opened and never changed afterwards. Anything we
/// don't recognise is tracked as `Other` rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropfirmId {
    Topstep,
    TakeProfitTrader,
    Apex,
    Bulenox,
    Phidias,
    #[serde(other)]
    Other,
}

impl PropfirmId {
    /// Every known provider, `Other` last.
    pub const ALL: [PropfirmId; 6] = [
        PropfirmId::Topstep,
        PropfirmId::TakeProfitTrader,
        PropfirmId::Apex,
        PropfirmId::Bulenox,
        PropfirmId::Phidias,
        PropfirmId::Other,
    ];

    /// Parse a provider tag. Case, spaces, dashes and underscores are ignored;
    /// unknown tags map to `Other`.
    pub fn from_str(s: &str) -> Self {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_uppercase();

        match normalized.as_str() {
            "TOPSTEP" => Self::Topstep,
            "TAKEPROFITTRADER" | "TPT" => Self::TakeProfitTrader,
            "APEX" | "APEXTRADERFUNDING" => Self::Apex,
            "BULENOX" => Self::Bulenox,
            "PHIDIAS" => Self::Phidias,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topstep => "TOPSTEP",
            Self::TakeProfitTrader => "TAKEPROFITTRADER",
            Self::Apex => "APEX",
            Self::Bulenox => "BULENOX",
            Self::Phidias => "PHIDIAS",
            Self::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for PropfirmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!(PropfirmId::from_str("TOPSTEP"), PropfirmId::Topstep);
        assert_eq!(PropfirmId::from_str("take-profit-trader"), PropfirmId::TakeProfitTrader);
        assert_eq!(PropfirmId::from_str("Apex"), PropfirmId::Apex);
        assert_eq!(PropfirmId::from_str("bulenox"), PropfirmId::Bulenox);
    }

    #[test]
    fn test_unknown_tag_is_other() {
        assert_eq!(PropfirmId::from_str("FTMO"), PropfirmId::Other);
        assert_eq!(PropfirmId::from_str(""), PropfirmId::Other);
    }

    #[test]
    fn test_serde_tags() {
        assert_eq!(
            serde_json::to_string(&PropfirmId::TakeProfitTrader).unwrap(),
            "\"TAKEPROFITTRADER\""
        );
        let parsed: PropfirmId = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(parsed, PropfirmId::Other);
    }

    #[test]
    fn test_as_str_round_trips_through_parser() {
        for id in PropfirmId::ALL {
            assert_eq!(PropfirmId::from_str(id.as_str()), id);
        }
    }
}
