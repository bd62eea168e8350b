//! Node id synthesis from a `{field}` / `{field:format}` template (§6).
//!
//! Only the zero-padded integer format (`{field:02d}`) is supported; any
//! other format spec is applied as a `{:0width}` style width pad, which
//! covers the one case the metadata documents actually use.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{BuildError, BuildResult};
use crate::tabular::Row;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)(?::([^}]+))?\}").unwrap());

pub fn render(template: &str, row: &impl Row) -> BuildResult<String> {
    let mut missing: Option<String> = None;
    let rendered = PLACEHOLDER.replace_all(template, |caps: &regex::Captures| {
        let field = &caps[1];
        let format = caps.get(2).map(|m| m.as_str());
        match row.get(field) {
            Some(value) => format_value(value, format),
            None => {
                missing = Some(field.to_string());
                String::new()
            }
        }
    });
    if let Some(field) = missing {
        return Err(BuildError::MissingTemplateField(field));
    }
    Ok(rendered.into_owned())
}

fn format_value(value: &str, format: Option<&str>) -> String {
    let Some(format) = format else {
        return value.to_string();
    };
    if let Some(width) = format.strip_suffix('d').and_then(|rest| rest.strip_prefix('0')) {
        if let (Ok(width), Ok(n)) = (width.parse::<usize>(), value.parse::<i64>()) {
            return format!("{n:0width$}");
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapRow(HashMap<&'static str, &'static str>);
    impl Row for MapRow {
        fn get(&self, column: &str) -> Option<&str> {
            self.0.get(column).copied()
        }
    }

    #[test]
    fn renders_plain_field_reference() {
        let row = MapRow(HashMap::from([("fid", "17")]));
        assert_eq!(render("fac-{fid}", &row).unwrap(), "fac-17");
    }

    #[test]
    fn renders_zero_padded_integer() {
        let row = MapRow(HashMap::from([("facility_id", "7"), ("year", "2024"), ("month", "3")]));
        assert_eq!(
            render("INT_{facility_id}_{year}{month:02d}", &row).unwrap(),
            "INT_7_202403"
        );
    }

    #[test]
    fn missing_field_is_reported() {
        let row = MapRow(HashMap::new());
        assert!(matches!(render("{missing}", &row), Err(BuildError::MissingTemplateField(f)) if f == "missing"));
    }
}
