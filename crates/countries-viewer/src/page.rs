//! Server-rendered HTML for the two-pane country page

use crate::view_model::{DetailPanel, Page, SortDirection, SortSpec, ViewState};
use countries_common::CountryRow;
use std::fmt::Write;

/// Escape text for HTML element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Query string that reproduces `state`
pub fn query_string(state: &ViewState) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(sort) = &state.sort {
        query.append_pair("sort", sort.column);
        query.append_pair("dir", sort.direction.as_str());
    }
    if !state.filter.is_empty() {
        query.append_pair("filter", &state.filter);
    }
    if state.page > 1 {
        query.append_pair("page", &state.page.to_string());
    }
    if let Some(selected) = state.selected {
        query.append_pair("selected", &selected.to_string());
    }
    query.finish()
}

fn href(state: &ViewState) -> String {
    let query = query_string(state);
    if query.is_empty() {
        "/".to_string()
    } else {
        escape(&format!("/?{query}"))
    }
}

const STYLE: &str = "\
body{font-family:sans-serif;margin:1.5rem}\
.panes{display:flex}\
.table-pane{flex:2;margin-right:20px;min-width:0;overflow-x:auto}\
.flag-pane{flex:1;text-align:center}\
table{border-collapse:collapse}\
th,td{text-align:left;min-width:100px;max-width:200px;white-space:nowrap;overflow:hidden;\
text-overflow:ellipsis;padding:4px 8px;border-bottom:1px solid #ddd}\
td.flag_desc{max-width:250px;white-space:normal}\
td.flag_png{max-width:100px;white-space:normal}\
tr.selected{background:#e8f0fe}\
.pager{margin-top:8px}";

/// Render the full page
pub fn render(state: &ViewState, page: &Page<'_>, panel: &DetailPanel) -> String {
    let mut html = String::with_capacity(16 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Countries</title>\n");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head>\n<body>\n<h2>Countries</h2>\n<div class=\"panes\">\n");

    html.push_str("<div class=\"table-pane\">\n");
    render_filter(&mut html, state);
    render_table(&mut html, state, page);
    render_pager(&mut html, state, page);
    html.push_str("</div>\n");

    html.push_str("<div class=\"flag-pane\" id=\"flag-container\">\n");
    render_panel(&mut html, panel);
    html.push_str("</div>\n</div>\n</body>\n</html>\n");

    html
}

fn render_filter(html: &mut String, state: &ViewState) {
    html.push_str("<form method=\"get\" action=\"/\">\n");
    if let Some(sort) = &state.sort {
        let _ = writeln!(
            html,
            "<input type=\"hidden\" name=\"sort\" value=\"{}\">\
             <input type=\"hidden\" name=\"dir\" value=\"{}\">",
            sort.column,
            sort.direction.as_str()
        );
    }
    let _ = writeln!(
        html,
        "<input type=\"search\" name=\"filter\" value=\"{}\" placeholder=\"Filter\"> \
         <button type=\"submit\">Apply</button>",
        escape(&state.filter)
    );
    html.push_str("</form>\n");
}

fn render_table(html: &mut String, state: &ViewState, page: &Page<'_>) {
    html.push_str("<table id=\"data-table\">\n<thead><tr><th></th>");

    for column in CountryRow::COLUMNS {
        let (direction, marker) = match &state.sort {
            Some(sort) if sort.column == column => (
                sort.direction.toggled(),
                match sort.direction {
                    SortDirection::Asc => " \u{25b2}",
                    SortDirection::Desc => " \u{25bc}",
                },
            ),
            _ => (SortDirection::Asc, ""),
        };

        // Re-sorting changes what each index points at, so drop the selection.
        let target = ViewState {
            sort: Some(SortSpec { column, direction }),
            filter: state.filter.clone(),
            page: 1,
            selected: None,
        };
        let _ = write!(html, "<th><a href=\"{}\">{column}{marker}</a></th>", href(&target));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for entry in &page.rows {
        let selected = state.selected == Some(entry.index);
        let target = ViewState {
            selected: Some(entry.index),
            page: page.meta.page,
            ..state.clone()
        };

        let _ = write!(
            html,
            "<tr{}><td><a href=\"{}\">{}</a></td>",
            if selected { " class=\"selected\"" } else { "" },
            href(&target),
            if selected { "&#9679;" } else { "&#9675;" }
        );
        for column in CountryRow::COLUMNS {
            let text = entry.row.column_text(column).unwrap_or_default();
            let _ = write!(html, "<td class=\"{column}\" title=\"{0}\">{0}</td>", escape(&text));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n");
}

fn render_pager(html: &mut String, state: &ViewState, page: &Page<'_>) {
    let meta = &page.meta;
    html.push_str("<div class=\"pager\">");

    if meta.has_prev {
        let target = ViewState {
            page: meta.page - 1,
            ..state.clone()
        };
        let _ = write!(html, "<a href=\"{}\">&laquo; Previous</a> ", href(&target));
    }

    let _ = write!(html, "Page {} of {} ({} rows)", meta.page, meta.pages, meta.total);

    if meta.has_next {
        let target = ViewState {
            page: meta.page + 1,
            ..state.clone()
        };
        let _ = write!(html, " <a href=\"{}\">Next &raquo;</a>", href(&target));
    }

    html.push_str("</div>\n");
}

fn render_panel(html: &mut String, panel: &DetailPanel) {
    match panel {
        DetailPanel::Placeholder { message } | DetailPanel::NoFlag { message } => {
            let _ = writeln!(html, "<div>{}</div>", escape(message));
        },
        DetailPanel::Flag {
            country_name,
            flag_png,
        } => {
            let heading = panel.heading().unwrap_or_default();
            let _ = writeln!(
                html,
                "<div><h4>{}</h4><img src=\"{}\" alt=\"Flag of {}\" style=\"height: 100px\"></div>",
                escape(&heading),
                escape(flag_png),
                escape(country_name)
            );
        },
    }
}
