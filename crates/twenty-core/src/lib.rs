#![deny(warnings)]
pub mod belief;
pub mod game;
pub mod model;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "twentyq"
    }

    pub const fn tagline() -> &'static str {
        "Think of an animal, and I will try to guess it."
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "twentyq");
        assert!(AppInfo::tagline().starts_with("Think of an animal"));
        assert!(!AppInfo::version().is_empty());
    }
}
