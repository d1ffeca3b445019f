use thiserror::Error;

/// Placeholder the opaque token replaces in the link template.
pub const TOKEN_PLACEHOLDER: &str = "%s";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("link template must contain exactly one '%s', found {found}")]
    Placeholder { found: usize },
}

/// Builds confirmation URLs from the process-wide template
/// (`ADDRESS_CONFIRMATION_URL_TEMPLATE`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    prefix: String,
    suffix: String,
}

impl LinkBuilder {
    pub fn new(template: &str) -> Result<Self, LinkError> {
        let found = template.matches(TOKEN_PLACEHOLDER).count();
        match template.split_once(TOKEN_PLACEHOLDER) {
            Some((prefix, suffix)) if found == 1 => Ok(Self {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            }),
            _ => Err(LinkError::Placeholder { found }),
        }
    }

    /// Insert the (already URL-safe) opaque token verbatim.
    pub fn build(&self, opaque_token: &str) -> String {
        let mut url =
            String::with_capacity(self.prefix.len() + opaque_token.len() + self.suffix.len());
        url.push_str(&self.prefix);
        url.push_str(opaque_token);
        url.push_str(&self.suffix);
        url
    }

    pub fn template(&self) -> String {
        format!("{}{TOKEN_PLACEHOLDER}{}", self.prefix, self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEMPLATE: &str = "https://eventing.example.com/#/confirmAddress/%s";

    #[test]
    fn substitutes_token_into_template() {
        let links = LinkBuilder::new(TEMPLATE).unwrap();
        assert_eq!(
            links.build("abc-_123"),
            "https://eventing.example.com/#/confirmAddress/abc-_123"
        );
        assert_eq!(links.template(), TEMPLATE);
    }

    #[test]
    fn placeholder_may_sit_mid_template() {
        let links = LinkBuilder::new("https://x.example/confirm?t=%s&lang=en").unwrap();
        assert_eq!(links.build("TOKEN"), "https://x.example/confirm?t=TOKEN&lang=en");
    }

    #[test]
    fn template_needs_exactly_one_placeholder() {
        assert_eq!(
            LinkBuilder::new("https://x.example/confirm").unwrap_err(),
            LinkError::Placeholder { found: 0 }
        );
        assert_eq!(
            LinkBuilder::new("https://x.example/%s/%s").unwrap_err(),
            LinkError::Placeholder { found: 2 }
        );
    }

    proptest! {
        /// Property: the built link always contains the token.
        #[test]
        fn link_contains_token(token in "[A-Za-z0-9_-]{0,400}") {
            let links = LinkBuilder::new(TEMPLATE).unwrap();
            prop_assert!(links.build(&token).contains(&token));
        }

        /// Property: a token that itself contains `%s` is not expanded again.
        #[test]
        fn token_is_inserted_verbatim(token in "[a-z%]{0,20}") {
            let links = LinkBuilder::new("<%s>").unwrap();
            prop_assert_eq!(links.build(&token), format!("<{token}>"));
        }
    }
}
