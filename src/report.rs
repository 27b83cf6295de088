use crate::models::FeatureRow;
use std::fmt::Write as _;

/// Rows shown in the detail table at the bottom of the report.
const TABLE_TAIL_ROWS: usize = 200;

const CHART_WIDTH: f64 = 960.0;
const CHART_HEIGHT: f64 = 240.0;
const CHART_PAD: f64 = 10.0;

/// Renders the self-contained dashboard page: a close-price chart, the model's
/// upside probability series, and the most recent rows as a table. No external
/// assets, so the file opens straight from disk.
///
/// `probs` is positionally aligned with `rows`.
pub fn render_dashboard(symbol: &str, interval: &str, rows: &[FeatureRow], probs: &[f64]) -> String {
    debug_assert_eq!(rows.len(), probs.len());

    let mut html = String::with_capacity(64 * 1024);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = write!(html, "<title>{symbol} upside dashboard</title>\n");
    html.push_str(
        "<style>\n\
         body { font-family: -apple-system, sans-serif; margin: 24px; color: #1a1a2e; }\n\
         h1 { font-size: 22px; }\n\
         .cards { display: flex; gap: 16px; margin-bottom: 24px; }\n\
         .card { background: #f4f4f8; border-radius: 8px; padding: 12px 20px; }\n\
         .card .label { font-size: 12px; color: #666; text-transform: uppercase; }\n\
         .card .value { font-size: 20px; font-weight: 600; }\n\
         svg { background: #fafafc; border: 1px solid #e0e0e8; border-radius: 8px; }\n\
         table { border-collapse: collapse; font-size: 13px; margin-top: 24px; }\n\
         th, td { padding: 4px 10px; border-bottom: 1px solid #e8e8ee; text-align: right; }\n\
         th { background: #f4f4f8; }\n\
         td.time { text-align: left; font-family: monospace; }\n\
         </style>\n</head>\n<body>\n",
    );

    let _ = write!(html, "<h1>{symbol} · {interval} · upside probability</h1>\n");

    html.push_str("<div class=\"cards\">\n");
    write_card(&mut html, "Rows", &rows.len().to_string());
    if let Some(last) = rows.last() {
        write_card(&mut html, "Last close", &format!("{:.4}", last.close));
        write_card(
            &mut html,
            "Last bar",
            &last.open_time.format("%Y-%m-%d %H:%M UTC").to_string(),
        );
    }
    if let Some(p) = probs.last() {
        write_card(&mut html, "Prob up", &format!("{:.1}%", p * 100.0));
    }
    html.push_str("</div>\n");

    let closes: Vec<f64> = rows.iter().map(|row| row.close).collect();
    html.push_str("<h2>Close</h2>\n");
    write_line_chart(&mut html, &closes, None, "#16537e");
    html.push_str("<h2>Model probability of upside</h2>\n");
    write_line_chart(&mut html, probs, Some((0.0, 1.0)), "#b5651d");

    write_tail_table(&mut html, rows, probs);

    html.push_str("</body>\n</html>\n");
    html
}

fn write_card(html: &mut String, label: &str, value: &str) {
    let _ = write!(
        html,
        "<div class=\"card\"><div class=\"label\">{label}</div><div class=\"value\">{value}</div></div>\n"
    );
}

/// Single polyline scaled into a fixed viewport. `range` pins the y axis;
/// when omitted the series' own min/max is used.
fn write_line_chart(html: &mut String, series: &[f64], range: Option<(f64, f64)>, color: &str) {
    let _ = write!(
        html,
        "<svg width=\"{CHART_WIDTH}\" height=\"{CHART_HEIGHT}\" viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\">\n"
    );

    if series.len() > 1 {
        let (min, max) = range.unwrap_or_else(|| {
            let min = series.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = series.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            (min, max)
        });
        let span = if max > min { max - min } else { 1.0 };

        let inner_w = CHART_WIDTH - 2.0 * CHART_PAD;
        let inner_h = CHART_HEIGHT - 2.0 * CHART_PAD;
        let step = inner_w / (series.len() - 1) as f64;

        html.push_str("<polyline fill=\"none\" stroke-width=\"1.5\" points=\"");
        for (idx, value) in series.iter().enumerate() {
            let x = CHART_PAD + idx as f64 * step;
            let y = CHART_PAD + inner_h * (1.0 - (value - min) / span);
            let _ = write!(html, "{x:.1},{y:.1} ");
        }
        let _ = write!(html, "\" stroke=\"{color}\"/>\n");
    }

    html.push_str("</svg>\n");
}

fn write_tail_table(html: &mut String, rows: &[FeatureRow], probs: &[f64]) {
    let start = rows.len().saturating_sub(TABLE_TAIL_ROWS);
    let _ = write!(
        html,
        "<h2>Last {} rows</h2>\n",
        rows.len() - start
    );
    html.push_str(
        "<table>\n<tr><th>open_time</th><th>close</th><th>zscore</th>\
         <th>rsi</th><th>vol</th><th>prob_up</th></tr>\n",
    );
    for (row, prob) in rows[start..].iter().zip(&probs[start..]) {
        let _ = write!(
            html,
            "<tr><td class=\"time\">{}</td><td>{:.4}</td><td>{:.3}</td>\
             <td>{:.1}</td><td>{:.4}</td><td>{:.3}</td></tr>\n",
            row.open_time.format("%Y-%m-%d %H:%M"),
            row.close,
            row.zscore,
            row.rsi,
            row.vol,
            prob,
        );
    }
    html.push_str("</table>\n");
}
