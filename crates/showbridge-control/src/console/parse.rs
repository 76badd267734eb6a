//! Parsing of the console's embedded web pages

use scraper::{ElementRef, Html, Selector};
use showbridge_core::{
    mapping::is_name_row, to_logical, Executor, ExecutorNumber, ExecutorType,
};
use std::collections::BTreeMap;
use tracing::debug;

use crate::{error::ControlError, Result};

/// Label of the status table row carrying the show path
const SHOW_LABEL: &str = "Show";

/// Dot color value meaning "no color"
const NO_COLOR: &str = "x";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ControlError::ScrapeError(format!("Invalid selector {}: {:?}", css, e)))
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Find the show name on the console's status page.
///
/// The page lists `Show | <path>` in a table. The part of the path after the
/// last occurrence of the first marker found is returned; without a marker
/// the whole cell text is returned. `None` when there is no `Show` row or it
/// is empty.
pub fn parse_show_name(html: &str, markers: &[String]) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let rows = selector("table tr")?;
    let cells = selector("td")?;

    for row in document.select(&rows) {
        let row_cells: Vec<ElementRef<'_>> = row.select(&cells).collect();
        for pair in row_cells.windows(2) {
            if cell_text(&pair[0]) != SHOW_LABEL {
                continue;
            }
            let path = cell_text(&pair[1]);
            if path.is_empty() {
                return Ok(None);
            }
            return Ok(Some(strip_show_path(&path, markers)));
        }
    }

    Ok(None)
}

fn strip_show_path(path: &str, markers: &[String]) -> String {
    markers
        .iter()
        .filter(|marker| !marker.is_empty())
        .find_map(|marker| {
            let start = path.rfind(marker.as_str())? + marker.len();
            let name = &path[start..];
            (!name.is_empty()).then(|| name.to_string())
        })
        .unwrap_or_else(|| path.to_string())
}

/// Build the executor table from the console's execute page.
///
/// Every `input` is one physical slot: its `name` is the slot index and its
/// `value` is the executor name on the first row of a page, or the
/// `color,typeCode,dotColor` triple on the second row. Both slots fold into
/// the same logical executor.
pub fn parse_executors(html: &str) -> Result<BTreeMap<ExecutorNumber, Executor>> {
    let document = Html::parse_document(html);
    let inputs = selector("input")?;
    let mut executors = BTreeMap::new();

    for input in document.select(&inputs) {
        let element = input.value();
        let Some(field) = element.attr("name") else {
            debug!("Skipping input without name");
            continue;
        };
        let physical: u32 = match field.trim().parse() {
            Ok(physical) => physical,
            Err(_) => {
                debug!("Skipping input with invalid executor index {:?}", field);
                continue;
            }
        };
        let value = element.attr("value").unwrap_or("");

        let number = to_logical(physical);
        let executor = executors
            .entry(number)
            .or_insert_with(|| Executor::new(number));

        if is_name_row(physical) {
            let name = value.trim();
            executor.name = (!name.is_empty()).then(|| name.to_string());
        } else {
            apply_config(executor, value);
        }
    }

    Ok(executors)
}

fn apply_config(executor: &mut Executor, value: &str) {
    let mut parts = value.split(',').map(str::trim);
    let color = parts.next().unwrap_or("");
    let type_code = parts.next().unwrap_or("");
    let dot_color = parts.next().unwrap_or("");

    executor.color = (!color.is_empty()).then(|| color.to_string());
    executor.kind = ExecutorType::from_code(type_code);
    executor.dot_color = (!dot_color.is_empty() && !dot_color.eq_ignore_ascii_case(NO_COLOR))
        .then(|| dot_color.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["MagicQ/show/".to_string(), "/home/show/".to_string()]
    }

    #[test]
    fn test_parse_show_name() {
        let html = r#"<html><body><table>
            <tr><td>Version</td><td>1.9.4.2</td></tr>
            <tr><td>Show</td><td> /Users/op/MagicQ/show/club/friday.shw </td></tr>
        </table></body></html>"#;
        assert_eq!(
            parse_show_name(html, &markers()).unwrap().as_deref(),
            Some("club/friday.shw")
        );
    }

    #[test]
    fn test_show_name_second_marker() {
        let html = "<table><tr><td>Show</td><td>/home/show/tour.shw</td></tr></table>";
        assert_eq!(
            parse_show_name(html, &markers()).unwrap().as_deref(),
            Some("tour.shw")
        );
    }

    #[test]
    fn test_default_markers_strip_home_directory() {
        let markers = showbridge_core::ConsoleConfig::default().show_path_markers;
        let html = "<table><tr><td>Show</td><td>/home/op/tour.shw</td></tr></table>";
        assert_eq!(
            parse_show_name(html, &markers).unwrap().as_deref(),
            Some("op/tour.shw")
        );

        let html = "<table><tr><td>Show</td><td>/home/op/MagicQ/show/club.shw</td></tr></table>";
        assert_eq!(
            parse_show_name(html, &markers).unwrap().as_deref(),
            Some("club.shw")
        );
    }

    #[test]
    fn test_show_name_without_marker() {
        let html = "<table><tr><td>Show</td><td>demo.shw</td></tr></table>";
        assert_eq!(
            parse_show_name(html, &markers()).unwrap().as_deref(),
            Some("demo.shw")
        );
    }

    #[test]
    fn test_show_name_missing() {
        let html = "<table><tr><td>Shows</td><td>demo.shw</td></tr></table>";
        assert_eq!(parse_show_name(html, &markers()).unwrap(), None);

        let html = "<table><tr><td>Show</td></tr></table>";
        assert_eq!(parse_show_name(html, &markers()).unwrap(), None);

        let html = "<table><tr><td>Show</td><td>  </td></tr></table>";
        assert_eq!(parse_show_name(html, &markers()).unwrap(), None);
    }

    #[test]
    fn test_parse_executor_pair() {
        let html = r#"<form>
            <input name="1" value="Washers RED">
            <input name="11" value="FF0000,T,x">
        </form>"#;
        let executors = parse_executors(html).unwrap();
        assert_eq!(executors.len(), 1);

        let washers = &executors[&1];
        assert_eq!(washers.number, 1);
        assert_eq!(washers.name.as_deref(), Some("Washers RED"));
        assert_eq!(washers.color.as_deref(), Some("FF0000"));
        assert_eq!(washers.kind, ExecutorType::Toggle);
        assert_eq!(washers.dot_color, None);
    }

    #[test]
    fn test_parse_type_codes_and_dot_color() {
        let html = r#"
            <input name="12" value="00FF00,f,00FF00">
            <input name="13" value="0000FF,V,X">
            <input name="14" value="FFFFFF,Q">
            <input name="15" value="">
        "#;
        let executors = parse_executors(html).unwrap();

        assert_eq!(executors[&2].kind, ExecutorType::Flash);
        assert_eq!(executors[&2].dot_color.as_deref(), Some("00FF00"));
        assert_eq!(executors[&3].kind, ExecutorType::Fader);
        assert_eq!(executors[&3].dot_color, None);
        assert_eq!(executors[&4].kind, ExecutorType::Other);
        assert_eq!(executors[&4].dot_color, None);
        assert_eq!(executors[&5].color, None);
        assert_eq!(executors[&5].kind, ExecutorType::Other);
    }

    #[test]
    fn test_parse_skips_invalid_index() {
        let html = r#"
            <input name="submit" value="Go">
            <input value="orphan">
            <input name="21" value="Spots">
        "#;
        let executors = parse_executors(html).unwrap();
        assert_eq!(executors.len(), 1);
        assert_eq!(executors[&11].name.as_deref(), Some("Spots"));
        // Name only, no config row
        assert_eq!(executors[&11].kind, ExecutorType::Other);
    }
}
