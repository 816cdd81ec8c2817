use crate::error::{Error, Result};

/// The site's main locale is the first one configured.
pub fn main_locale(site_locales: &[String]) -> Option<&str> {
    site_locales.first().map(String::as_str)
}

pub fn validate_locales(source: &str, target: &str, site_locales: &[String]) -> Result<()> {
    if source == target {
        return Err(Error::InvalidRequest(format!(
            "source and target locale are both '{source}'"
        )));
    }
    for locale in [source, target] {
        if !site_locales.iter().any(|l| l == locale) {
            return Err(Error::InvalidRequest(format!(
                "'{locale}' is not one of the site locales ({})",
                site_locales.join(", ")
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Vec<String> {
        vec!["en".to_string(), "fr".to_string(), "en-US".to_string()]
    }

    #[test]
    fn test_valid_pair() {
        assert!(validate_locales("en", "en-US", &site()).is_ok());
    }

    #[test]
    fn test_same_locale_rejected() {
        assert!(matches!(
            validate_locales("fr", "fr", &site()),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_unknown_locale_rejected() {
        let err = validate_locales("en", "de", &site()).unwrap_err();
        assert!(err.to_string().contains("'de'"));
    }

    #[test]
    fn test_main_locale() {
        assert_eq!(main_locale(&site()), Some("en"));
        assert_eq!(main_locale(&[]), None);
    }
}
