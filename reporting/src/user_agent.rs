//! Browser name and major version from a User-Agent string.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Browser {
    pub name: String,
    pub major_version: i32,
}

pub trait BrowserDetector: Send + Sync {
    fn detect(&self, user_agent: &str) -> Option<Browser>;
}

/// Product tokens checked in order. Chromium derivatives also carry `Chrome/`
/// and `Safari/`, so they must come first.
const KNOWN_PRODUCTS: &[(&str, &str)] = &[
    ("Edg", "Edge"),
    ("EdgA", "Edge"),
    ("EdgiOS", "Edge"),
    ("Edge", "Edge"),
    ("OPR", "Opera"),
    ("SamsungBrowser", "Samsung Internet"),
    ("Firefox", "Firefox"),
    ("FxiOS", "Firefox"),
    ("CriOS", "Chrome"),
    ("Chrome", "Chrome"),
];

/// Detects browsers from `Product/Version` tokens.
///
/// Known products are matched first, then Safari (whose version lives in the
/// `Version/` token), and finally the first product token other than
/// `Mozilla`, so that non-browser senders still get a name.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductTokenDetector;

impl BrowserDetector for ProductTokenDetector {
    fn detect(&self, user_agent: &str) -> Option<Browser> {
        let tokens: Vec<(&str, &str)> = user_agent
            .split(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ';' | ','))
            .filter_map(|token| token.split_once('/'))
            .filter(|(name, _)| !name.is_empty())
            .collect();

        let version_of = |product: &str| {
            tokens
                .iter()
                .find(|(name, _)| *name == product)
                .and_then(|(_, version)| major_version(version))
        };

        for (product, name) in KNOWN_PRODUCTS {
            if let Some(major_version) = version_of(product) {
                return Some(Browser {
                    name: (*name).to_string(),
                    major_version,
                });
            }
        }

        if version_of("Safari").is_some()
            && let Some(major_version) = version_of("Version")
        {
            return Some(Browser {
                name: "Safari".to_string(),
                major_version,
            });
        }

        tokens
            .iter()
            .filter(|(name, _)| *name != "Mozilla")
            .find_map(|(name, version)| {
                major_version(version).map(|major_version| Browser {
                    name: (*name).to_string(),
                    major_version,
                })
            })
    }
}

fn major_version(version: &str) -> Option<i32> {
    let major = version.split('.').next()?;
    major.parse::<i32>().ok().filter(|v| *v > 0)
}
