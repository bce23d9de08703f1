//! # Error Suggestions
//!
//! Helpers building user-facing errors that say what went wrong and how to
//! fix it.
//!
//! ```rust,ignore
//! use config_sync::suggestions;
//!
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

use crate::defaults::CONFIG_ENV_VAR;
use crate::extension::ExtensionType;

/// Error for a manifest that does not exist.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Site manifest not found: {path}\n\n\
         hint: Create a config-sync.yaml listing the active directory and installed extensions\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set {CONFIG_ENV_VAR} environment variable",
        path = path.display()
    )
}

/// Error for an extension that is not listed in the manifest.
///
/// Suggests the closest installed name when there is one.
pub fn unknown_extension(
    extension_type: ExtensionType,
    name: &str,
    installed: &[String],
) -> anyhow::Error {
    let did_you_mean = find_similar(name, installed)
        .map(|candidate| format!("\nhint: Did you mean '{extension_type}:{candidate}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "{extension_type} '{name}' is not installed{did_you_mean}\n\n\
         hint: Installed extensions are listed under 'modules' and 'themes' in the manifest\n\
         hint: Reference themes as theme:<name>"
    )
}

/// Error for a command that needs a snapshot when none was taken yet.
pub fn no_snapshot() -> anyhow::Error {
    anyhow::anyhow!(
        "No configuration snapshot found\n\n\
         hint: Run 'config-sync snapshot' to record the current state first"
    )
}

/// Error for a configuration item no extension provides.
pub fn item_not_provided(name: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "'{name}' is not provided by any installed extension\n\n\
         hint: Configuration names look like node.type.article (without .yml)"
    )
}

/// Error for an invalid glob pattern.
pub fn invalid_glob(pattern: &str, error: &glob::PatternError) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid glob pattern: {pattern}\n\
         error: {error}\n\n\
         hint: Use * to match any part of a name, e.g. 'node.type.*'\n\
         hint: Use [abc] for character classes, [!abc] to negate"
    )
}

/// Find a similar name using edit distance (at most 2).
fn find_similar<'a>(input: &str, candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let distance = edit_distance(input, candidate);
            (distance <= 2 && distance < input.len()).then_some((candidate.as_str(), distance))
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, a_char) in a.chars().enumerate() {
        let mut current = vec![i + 1; b_chars.len() + 1];
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != *b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }

    previous[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_includes_hints() {
        let message = config_not_found(Path::new("/site/config-sync.yaml")).to_string();
        assert!(message.contains("Site manifest not found"));
        assert!(message.contains("/site/config-sync.yaml"));
        assert!(message.contains("-c/--config"));
        assert!(message.contains("CONFIG_SYNC_CONFIG"));
    }

    #[test]
    fn test_unknown_extension_suggests_similar() {
        let installed = vec!["node".to_string(), "views".to_string()];
        let message = unknown_extension(ExtensionType::Module, "veiws", &installed).to_string();
        assert!(message.contains("module 'veiws' is not installed"));
        assert!(message.contains("Did you mean 'module:views'?"));

        let message = unknown_extension(ExtensionType::Theme, "claro", &installed).to_string();
        assert!(!message.contains("Did you mean"));
    }

    #[test]
    fn test_other_suggestions_have_hints() {
        assert!(no_snapshot().to_string().contains("config-sync snapshot"));
        assert!(item_not_provided("node.type.x").to_string().contains("hint:"));
        let error = glob::Pattern::new("[").unwrap_err();
        assert!(invalid_glob("[", &error).to_string().contains("Invalid glob pattern"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("views", "views"), 0);
        assert_eq!(edit_distance("veiws", "views"), 2);
        assert_eq!(edit_distance("node", "nodes"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("olivero", "claro"), 4);
    }
}
