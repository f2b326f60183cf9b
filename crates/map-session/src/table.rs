//! Payloads for the hover popup and the detail table

use sample_records::TableRow;
use serde::Serialize;

/// Shown in place of the table while nothing is selected
pub const EMPTY_TABLE_NOTICE: &str = "Click on a country on the map to view sample details";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Popup {
    pub country: String,
    pub count: usize,
    pub text: String,
}

impl Popup {
    pub fn new(country: &str, count: usize) -> Self {
        Self {
            country: country.to_string(),
            count,
            text: format!("{}: {} sequences", country, count),
        }
    }
}

/// One page of the selected country's rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage {
    pub country: Option<String>,
    pub heading: Option<String>,
    pub notice: Option<String>,
    pub rows: Vec<TableRow>,
    pub total_rows: usize,
    pub page: usize,
    pub total_pages: usize,
    pub page_window: Vec<usize>,
    pub has_previous: bool,
    pub has_next: bool,
}

impl TablePage {
    /// Page controls are only drawn when there is more than one page
    pub fn show_pagination(&self) -> bool {
        self.total_pages > 1
    }
}

impl Default for TablePage {
    fn default() -> Self {
        Self {
            country: None,
            heading: None,
            notice: None,
            rows: Vec::new(),
            total_rows: 0,
            page: 1,
            total_pages: 0,
            page_window: Vec::new(),
            has_previous: false,
            has_next: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_text() {
        assert_eq!(Popup::new("Chile", 7).text, "Chile: 7 sequences");
    }

    #[test]
    fn test_page_json_shape() {
        let page = TablePage {
            total_pages: 3,
            ..TablePage::default()
        };
        assert!(page.show_pagination());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["hasPrevious"], false);
        assert!(json["pageWindow"].as_array().unwrap().is_empty());
    }
}
