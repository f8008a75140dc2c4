// Platform model
// A partition of player data upstream

use serde::{Deserialize, Serialize};

/// Gaming platform a handle is looked up on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Pc,
    Xbox,
    Ps4,
}

impl Platform {
    /// Default fallback order when the user did not pin a platform
    pub const ALL: [Platform; 3] = [Platform::Pc, Platform::Xbox, Platform::Ps4];

    /// Platform specifier used by the tracker API and profile URLs
    pub fn api_name(&self) -> &'static str {
        match self {
            Platform::Pc => "pc",
            Platform::Xbox => "xbl",
            Platform::Ps4 => "psn",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Pc => "PC",
            Platform::Xbox => "Xbox",
            Platform::Ps4 => "PS4",
        }
    }

    /// Command token that names this platform (`pc`, `xbox`, `ps4`)
    pub fn command_name(&self) -> &'static str {
        match self {
            Platform::Pc => "pc",
            Platform::Xbox => "xbox",
            Platform::Ps4 => "ps4",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pc" => Ok(Platform::Pc),
            "xbox" | "xbl" => Ok(Platform::Xbox),
            "ps4" | "psn" => Ok(Platform::Ps4),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_and_api_names() {
        assert_eq!("xbox".parse::<Platform>(), Ok(Platform::Xbox));
        assert_eq!("PSN".parse::<Platform>(), Ok(Platform::Ps4));
        assert!("switch".parse::<Platform>().is_err());
    }

    #[test]
    fn test_fallback_order() {
        assert_eq!(Platform::ALL, [Platform::Pc, Platform::Xbox, Platform::Ps4]);
        assert_eq!(Platform::Xbox.api_name(), "xbl");
    }
}
