//! Installed label fonts via fontconfig

use anyhow::{Context, Result, anyhow};
use fontconfig::{Fontconfig, Pattern};
use std::collections::BTreeSet;
use std::ffi::CString;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Sorted, deduplicated list of installed font families
pub fn list_families() -> Result<Vec<String>> {
    let fc = Fontconfig::new().context("Failed to initialize fontconfig")?;
    let pattern = Pattern::new(&fc);
    let font_set = fontconfig::list_fonts(&pattern, None);

    let families: BTreeSet<String> = font_set
        .iter()
        .filter_map(|p| p.get_string(fontconfig::FC_FAMILY).map(str::to_string))
        .collect();

    info!(count = families.len(), "Discovered font families via fontconfig");
    Ok(families.into_iter().collect())
}

/// How strictly a match must honour the requested family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitution {
    /// Only the requested family; fontconfig's nearest match is an error
    Refuse,
    /// Whatever fontconfig offers, e.g. for generic names like "Sans"
    Accept,
}

/// Resolve `family` (optionally in `style`, e.g. "Bold") to a font file
pub fn find_font_path(family: &str, style: Option<&str>, substitution: Substitution) -> Result<PathBuf> {
    let fc = Fontconfig::new().context("Failed to initialize fontconfig")?;

    let mut pattern = Pattern::new(&fc);
    let family_cstr =
        CString::new(family).with_context(|| format!("Invalid family name: {family}"))?;
    pattern.add_string(fontconfig::FC_FAMILY, &family_cstr);
    if let Some(style) = style {
        let style_cstr = CString::new(style).with_context(|| format!("Invalid style name: {style}"))?;
        pattern.add_string(fontconfig::FC_STYLE, &style_cstr);
    }

    let matched = pattern.font_match();
    let matched_family = matched.get_string(fontconfig::FC_FAMILY).unwrap_or_default();
    if substitution == Substitution::Refuse && !matched_family.eq_ignore_ascii_case(family) {
        debug!(requested = family, matched_family, "Fontconfig substituted a different family");
        return Err(anyhow!("Font '{family}' not installed (fontconfig offered '{matched_family}')"));
    }

    let path = matched
        .filename()
        .map(PathBuf::from)
        .with_context(|| format!("No font file found for '{family}'"))?;
    if !path.exists() {
        warn!(family, path = %path.display(), "Font file path from fontconfig does not exist");
        return Err(anyhow!("Font file '{}' does not exist", path.display()));
    }

    debug!(family, style = ?style, matched_family, path = %path.display(), "Resolved font path");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_family_is_refused() {
        // Only meaningful where fontconfig itself works
        if Fontconfig::new().is_none() {
            return;
        }
        assert!(find_font_path("No Such Family 7f3a", None, Substitution::Refuse).is_err());
    }

    #[test]
    fn test_generic_family_accepts_substitute() {
        if let Ok(path) = find_font_path("Sans", None, Substitution::Accept) {
            assert!(path.is_absolute(), "Font path should be absolute");
        }
    }
}
