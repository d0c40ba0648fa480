use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Icon identities that location highlights, visitor info blocks and tour
/// highlights may name.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Icon {
    Mountain,
    Trees,
    Waves,
    Bird,
    Camera,
    Sun,
    Leaf,
    Tent,
    Compass,
    MapPin,
    Clock,
    Ticket,
    Utensils,
    Car,
    Info,
    #[default]
    Star,
}

/// Name → icon. Aliases cover the spellings stored by older records.
const LOOKUP: &[(&str, Icon)] = &[
    ("mountain", Icon::Mountain),
    ("mountains", Icon::Mountain),
    ("trees", Icon::Trees),
    ("tree", Icon::Trees),
    ("treepine", Icon::Trees),
    ("waves", Icon::Waves),
    ("water", Icon::Waves),
    ("bird", Icon::Bird),
    ("camera", Icon::Camera),
    ("sun", Icon::Sun),
    ("leaf", Icon::Leaf),
    ("tent", Icon::Tent),
    ("compass", Icon::Compass),
    ("mappin", Icon::MapPin),
    ("map-pin", Icon::MapPin),
    ("clock", Icon::Clock),
    ("ticket", Icon::Ticket),
    ("utensils", Icon::Utensils),
    ("car", Icon::Car),
    ("info", Icon::Info),
    ("star", Icon::Star),
];

impl Icon {
    pub const ALL: [Icon; 16] = [
        Icon::Mountain,
        Icon::Trees,
        Icon::Waves,
        Icon::Bird,
        Icon::Camera,
        Icon::Sun,
        Icon::Leaf,
        Icon::Tent,
        Icon::Compass,
        Icon::MapPin,
        Icon::Clock,
        Icon::Ticket,
        Icon::Utensils,
        Icon::Car,
        Icon::Info,
        Icon::Star,
    ];

    pub fn lookup(name: &str) -> Option<Icon> {
        let needle = name.trim().to_ascii_lowercase();
        LOOKUP
            .iter()
            .find(|(key, _)| *key == needle)
            .map(|(_, icon)| *icon)
    }

    /// Unknown names render as the default icon rather than failing.
    pub fn resolve(name: &str) -> Icon {
        Self::lookup(name).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mountain => "Mountain",
            Self::Trees => "Trees",
            Self::Waves => "Waves",
            Self::Bird => "Bird",
            Self::Camera => "Camera",
            Self::Sun => "Sun",
            Self::Leaf => "Leaf",
            Self::Tent => "Tent",
            Self::Compass => "Compass",
            Self::MapPin => "MapPin",
            Self::Clock => "Clock",
            Self::Ticket => "Ticket",
            Self::Utensils => "Utensils",
            Self::Car => "Car",
            Self::Info => "Info",
            Self::Star => "Star",
        }
    }

    /// Inline SVG path data (24×24 viewBox, stroked).
    pub fn svg_path(&self) -> &'static str {
        match self {
            Self::Mountain => "m8 3 4 8 5-5 5 15H2L8 3z",
            Self::Trees => "M10 10v.2A3 3 0 0 1 8.9 16H5a3 3 0 0 1-1-5.8V10a3 3 0 0 1 6 0ZM7 16v6M13 19v3M12 19h8.3a1 1 0 0 0 .7-1.7L18 14h.3a1 1 0 0 0 .7-1.7L16 9h.2a1 1 0 0 0 .8-1.7L13 3l-1.4 1.5",
            Self::Waves => "M2 6c.6.5 1.2 1 2.5 1C7 7 7 5 9.5 5c2.6 0 2.4 2 5 2 2.5 0 2.5-2 5-2 1.3 0 1.9.5 2.5 1M2 12c.6.5 1.2 1 2.5 1 2.5 0 2.5-2 5-2 2.6 0 2.4 2 5 2 2.5 0 2.5-2 5-2 1.3 0 1.9.5 2.5 1M2 18c.6.5 1.2 1 2.5 1 2.5 0 2.5-2 5-2 2.6 0 2.4 2 5 2 2.5 0 2.5-2 5-2 1.3 0 1.9.5 2.5 1",
            Self::Bird => "M16 7h.01M3.4 18H12a8 8 0 0 0 8-8V7a4 4 0 0 0-7.28-2.3L2 20M20 7l2 .5-2 .5M10 18v3M14 17.75V21M7 18a6 6 0 0 0 3.84-10.61",
            Self::Camera => "M14.5 4h-5L7 7H4a2 2 0 0 0-2 2v9a2 2 0 0 0 2 2h16a2 2 0 0 0 2-2V9a2 2 0 0 0-2-2h-3l-2.5-3zM12 16a3 3 0 1 0 0-6 3 3 0 0 0 0 6z",
            Self::Sun => "M12 16a4 4 0 1 0 0-8 4 4 0 0 0 0 8zM12 2v2M12 20v2M4.93 4.93l1.41 1.41M17.66 17.66l1.41 1.41M2 12h2M20 12h2M6.34 17.66l-1.41 1.41M19.07 4.93l-1.41 1.41",
            Self::Leaf => "M11 20A7 7 0 0 1 9.8 6.1C15.5 5 17 4.48 19 2c1 2 2 4.18 2 8 0 5.5-4.78 10-10 10ZM2 21c0-3 1.85-5.36 5.08-6",
            Self::Tent => "M3.5 21 14 3M20.5 21 10 3M15.5 21 12 15l-3.5 6M2 21h20",
            Self::Compass => "M12 22a10 10 0 1 0 0-20 10 10 0 0 0 0 20zM16.24 7.76l-2.12 6.36-6.36 2.12 2.12-6.36 6.36-2.12z",
            Self::MapPin => "M20 10c0 6-8 12-8 12s-8-6-8-12a8 8 0 0 1 16 0ZM12 13a3 3 0 1 0 0-6 3 3 0 0 0 0 6z",
            Self::Clock => "M12 22a10 10 0 1 0 0-20 10 10 0 0 0 0 20zM12 6v6l4 2",
            Self::Ticket => "M2 9a3 3 0 0 1 0 6v2a2 2 0 0 0 2 2h16a2 2 0 0 0 2-2v-2a3 3 0 0 1 0-6V7a2 2 0 0 0-2-2H4a2 2 0 0 0-2 2ZM13 5v2M13 17v2M13 11v2",
            Self::Utensils => "M3 2v7c0 1.1.9 2 2 2h4a2 2 0 0 0 2-2V2M7 2v20M21 15V2a5 5 0 0 0-5 5v6c0 1.1.9 2 2 2h3Zm0 0v7",
            Self::Car => "M19 17h2c.6 0 1-.4 1-1v-3c0-.9-.7-1.7-1.5-1.9C18.7 10.6 16 10 16 10s-1.3-1.4-2.2-2.3c-.5-.4-1.1-.7-1.8-.7H5c-.6 0-1.1.4-1.4.9l-1.4 2.9A3.7 3.7 0 0 0 2 12v4c0 .6.4 1 1 1h2M7 19a2 2 0 1 0 0-4 2 2 0 0 0 0 4zM9 17h6M17 19a2 2 0 1 0 0-4 2 2 0 0 0 0 4z",
            Self::Info => "M12 22a10 10 0 1 0 0-20 10 10 0 0 0 0 20zM12 16v-4M12 8h.01",
            Self::Star => "m12 2 3.09 6.26L22 9.27l-5 4.87 1.18 6.88L12 17.77l-6.18 3.25L7 14.14 2 9.27l6.91-1.01L12 2z",
        }
    }

    pub fn svg(&self) -> String {
        format!(
            r#"<svg class="icon" viewBox="0 0 24 24" width="24" height="24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" aria-label="{}"><path d="{}"/></svg>"#,
            self.as_str(),
            self.svg_path()
        )
    }
}

impl std::fmt::Display for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Icon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| format!("unknown icon: {}", s))
    }
}

impl Serialize for Icon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Icon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name.as_deref().map(Icon::resolve).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_accepts_aliases() {
        assert_eq!(Icon::lookup("Mountain"), Some(Icon::Mountain));
        assert_eq!(Icon::lookup("TreePine"), Some(Icon::Trees));
        assert_eq!(Icon::lookup(" map-pin "), Some(Icon::MapPin));
        assert_eq!(Icon::lookup("dragon"), None);
    }

    #[test]
    fn unknown_names_resolve_to_default() {
        assert_eq!(Icon::resolve("dragon"), Icon::Star);
        let icon: Icon = serde_json::from_str("\"nope\"").unwrap();
        assert_eq!(icon, Icon::Star);
    }

    #[test]
    fn every_icon_round_trips_through_its_name() {
        for icon in Icon::ALL {
            assert_eq!(Icon::lookup(icon.as_str()), Some(icon));
        }
    }
}
