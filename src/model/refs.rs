use crate::browser::Anchor;

/// A state entry on the root directory page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRef {
    pub url: String,
    pub name: String,
}

impl From<Anchor> for StateRef {
    fn from(anchor: Anchor) -> Self {
        Self {
            url: anchor.href,
            name: anchor.text,
        }
    }
}

/// A city entry on a state directory page
///
/// The walker builds these with [`CityRef::from_anchor`], so during a walk
/// `state` names a state fetched earlier in the same run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityRef {
    pub url: String,
    pub name: String,
    pub state: String,
}

impl CityRef {
    /// Tags a city link with the state it was listed under
    pub fn from_anchor(anchor: Anchor, state: &StateRef) -> Self {
        Self {
            url: anchor.href,
            name: anchor.text,
            state: state.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(href: &str, text: &str) -> Anchor {
        Anchor {
            href: href.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_state_from_anchor() {
        let state = StateRef::from(anchor("https://example.com/oh", "Ohio"));
        assert_eq!(state.url, "https://example.com/oh");
        assert_eq!(state.name, "Ohio");
    }

    #[test]
    fn test_city_inherits_state_name() {
        let state = StateRef::from(anchor("https://example.com/oh", "Ohio"));
        let cities: Vec<CityRef> = vec![
            anchor("https://example.com/oh/columbus", "Columbus"),
            anchor("https://example.com/oh/dayton", "Dayton"),
        ]
        .into_iter()
        .map(|a| CityRef::from_anchor(a, &state))
        .collect();

        assert!(cities.iter().all(|c| c.state == state.name));
        assert_eq!(cities[1].name, "Dayton");
    }
}
