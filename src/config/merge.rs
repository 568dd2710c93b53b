use std::path::Path;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use toml::Value;
use toml::map::{Entry, Map};

/// Deep-merge `overlay` into `base`.
///
/// Tables merge recursively, scalars replace, `key+ = [..]` appends to an
/// existing array, and the string `"null"` removes a key set earlier.
pub fn merge_tables(
    base: &mut Map<String, Value>,
    overlay: Map<String, Value>,
    source: Option<&Path>,
) -> Result<()> {
    for (raw_key, value) in overlay {
        if let Some(key) = raw_key.strip_suffix('+') {
            append_array(base, key, value, source)?;
            continue;
        }

        match (base.entry(raw_key), value) {
            (Entry::Occupied(mut occ), Value::Table(table)) => {
                if let Value::Table(existing) = occ.get_mut() {
                    merge_tables(existing, table, source)?;
                } else {
                    occ.insert(Value::Table(table));
                }
            }
            (Entry::Occupied(occ), value) if is_null_marker(&value) => {
                occ.remove();
            }
            (Entry::Occupied(mut occ), value) => {
                occ.insert(value);
            }
            (Entry::Vacant(_), value) if is_null_marker(&value) => {}
            (Entry::Vacant(vac), value) => {
                vac.insert(value);
            }
        }
    }

    Ok(())
}

fn append_array(
    base: &mut Map<String, Value>,
    key: &str,
    value: Value,
    source: Option<&Path>,
) -> Result<()> {
    let Value::Array(items) = value else {
        return Err(eyre!("value for '{key}+' must be an array").wrap_err(origin(source)));
    };
    match base.entry(key.to_string()) {
        Entry::Occupied(mut occ) => match occ.get_mut() {
            Value::Array(existing) => existing.extend(items),
            _ => {
                return Err(eyre!("cannot append to non-array key '{key}'").wrap_err(origin(source)));
            }
        },
        Entry::Vacant(vac) => {
            vac.insert(Value::Array(items));
        }
    }
    Ok(())
}

fn origin(source: Option<&Path>) -> String {
    match source {
        Some(path) => format!("while merging {}", path.display()),
        None => "while merging configuration".to_string(),
    }
}

fn is_null_marker(value: &Value) -> bool {
    matches!(value, Value::String(text) if text.eq_ignore_ascii_case("null"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> Map<String, Value> {
        match toml::from_str::<Value>(text).unwrap() {
            Value::Table(table) => table,
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn nested_tables_merge_and_scalars_replace() -> Result<()> {
        let mut base = table("temp_dir = \"/a\"\n[search]\nlimit = 8\n[resume]\nbin = \"claude\"\n");
        merge_tables(&mut base, table("[search]\nlimit = 4\n"), None)?;
        assert_eq!(base["search"]["limit"].as_integer(), Some(4));
        assert_eq!(base["resume"]["bin"].as_str(), Some("claude"));
        assert_eq!(base["temp_dir"].as_str(), Some("/a"));
        Ok(())
    }

    #[test]
    fn plus_suffix_appends_to_arrays() -> Result<()> {
        let mut base = table("[resume]\nterminal = [\"gnome-terminal\"]\n");
        merge_tables(&mut base, table("[resume]\n\"terminal+\" = [\"--\"]\n"), None)?;
        let terminal = base["resume"]["terminal"].as_array().unwrap();
        assert_eq!(terminal.len(), 2);
        assert_eq!(terminal[1].as_str(), Some("--"));
        Ok(())
    }

    #[test]
    fn null_marker_removes_key() -> Result<()> {
        let mut base = table("temp_dir = \"/a\"\n");
        merge_tables(&mut base, table("temp_dir = \"null\"\nprojects_dir = \"null\"\n"), None)?;
        assert!(!base.contains_key("temp_dir"));
        assert!(!base.contains_key("projects_dir"));
        Ok(())
    }

    #[test]
    fn appending_to_scalar_fails() {
        let mut base = table("temp_dir = \"/a\"\n");
        let err = merge_tables(&mut base, table("\"temp_dir+\" = [\"/b\"]\n"), None).unwrap_err();
        assert!(
            err.chain()
                .any(|cause| cause.to_string() == "cannot append to non-array key 'temp_dir'")
        );
    }
}
