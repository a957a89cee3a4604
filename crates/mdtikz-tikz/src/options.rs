//! Mapping of `tikz` fence attributes to backend options.

use std::collections::{BTreeMap, HashMap};

/// Options of one `tikz` block.
///
/// Fence attributes `library` and `option` map to the backend options
/// `tikzlibrary` and `tikzoption`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TikzOptions {
    /// Argument of `\usetikzlibrary`.
    pub library: String,
    /// Options of the `tikzpicture` environment.
    pub option: String,
}

impl TikzOptions {
    #[must_use]
    pub fn new(library: impl Into<String>, option: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            option: option.into(),
        }
    }

    /// Options from fence attributes, falling back to `defaults`.
    ///
    /// Returns warnings for attributes that are not recognized.
    #[must_use]
    pub fn from_attrs(attrs: &HashMap<String, String>, defaults: &Self) -> (Self, Vec<String>) {
        let mut options = defaults.clone();
        let mut unknown: Vec<&str> = Vec::new();

        for (key, value) in attrs {
            match key.as_str() {
                "library" => options.library.clone_from(value),
                "option" => options.option.clone_from(value),
                other => unknown.push(other),
            }
        }

        unknown.sort_unstable();
        let warnings = unknown
            .into_iter()
            .map(|key| format!("unknown tikz attribute '{key}' ignored"))
            .collect();

        (options, warnings)
    }

    /// Options in the form the backend expects.
    #[must_use]
    pub fn as_options(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("tikzlibrary".to_owned(), self.library.clone()),
            ("tikzoption".to_owned(), self.option.clone()),
        ])
    }

    /// LaTeX source shown next to the figure.
    #[must_use]
    pub fn source(&self, code: &str) -> String {
        format!(
            "\\usetikzlibrary{{{}}}\n\\begin{{tikzpicture}}[{}]\n{code}\n\\end{{tikzpicture}}\n",
            self.library, self.option
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_from_attrs() {
        let (options, warnings) = TikzOptions::from_attrs(
            &attrs(&[("library", "arrows.meta"), ("option", "scale=2")]),
            &TikzOptions::default(),
        );
        assert_eq!(options, TikzOptions::new("arrows.meta", "scale=2"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_from_attrs_defaults() {
        let defaults = TikzOptions::new("calc", "thick");
        let (options, _) = TikzOptions::from_attrs(&attrs(&[("option", "")]), &defaults);
        assert_eq!(options, TikzOptions::new("calc", ""));
    }

    #[test]
    fn test_from_attrs_unknown_warns() {
        let (options, warnings) = TikzOptions::from_attrs(
            &attrs(&[("width", "3cm"), ("caption", "x")]),
            &TikzOptions::default(),
        );
        assert_eq!(options, TikzOptions::default());
        assert_eq!(
            warnings,
            [
                "unknown tikz attribute 'caption' ignored",
                "unknown tikz attribute 'width' ignored"
            ]
        );
    }

    #[test]
    fn test_as_options() {
        let options = TikzOptions::new("calc", "").as_options();
        assert_eq!(options.get("tikzlibrary").map(String::as_str), Some("calc"));
        assert_eq!(options.get("tikzoption").map(String::as_str), Some(""));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_source() {
        let source = TikzOptions::new("arrows", "scale=2").source("\\draw (0,0) -- (1,1);");
        assert_eq!(
            source,
            "\\usetikzlibrary{arrows}\n\\begin{tikzpicture}[scale=2]\n\\draw (0,0) -- (1,1);\n\\end{tikzpicture}\n"
        );
    }
}
