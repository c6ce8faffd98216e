use std::collections::HashMap;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::model::point::{ChartPoint, SeriesRole};

/// Minute chart: current price and average lines with buy/sell overlays.
pub struct MinuteChart<'a> {
    points: &'a [ChartPoint],
    title: &'a str,
    markers: Option<Vec<&'a ChartPoint>>,
}

impl<'a> MinuteChart<'a> {
    pub fn new(points: &'a [ChartPoint], title: &'a str) -> Self {
        Self {
            points,
            title,
            markers: None,
        }
    }

    /// Draw these overlays instead of the markers found in `points`.
    pub fn markers<I>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = &'a ChartPoint>,
    {
        self.markers = Some(markers.into_iter().collect());
        self
    }
}

struct Scale {
    min: f64,
    range: f64,
    rows: usize,
}

impl Scale {
    fn row(&self, value: f64) -> usize {
        let normalized = ((value - self.min) / self.range).clamp(0.0, 1.0);
        let from_bottom = (normalized * (self.rows - 1) as f64).round() as usize;
        self.rows - 1 - from_bottom.min(self.rows - 1)
    }
}

impl Widget for MinuteChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 || inner.width < 8 {
            return;
        }

        let current: Vec<&ChartPoint> = self
            .points
            .iter()
            .filter(|p| p.series_role == SeriesRole::CurrentPrice)
            .collect();
        if current.is_empty() {
            let msg = "No data";
            let x = inner.x + inner.width.saturating_sub(msg.len() as u16) / 2;
            let y = inner.y + inner.height / 2;
            buf.set_string(x, y, msg, Style::default().fg(Color::DarkGray));
            return;
        }

        let plot_rows = inner.height.saturating_sub(1) as usize; // last row is the time axis
        let width = inner.width as usize;
        let visible = &current[current.len().saturating_sub(width)..];

        let columns: HashMap<&str, usize> = visible
            .iter()
            .enumerate()
            .map(|(i, p)| (p.time_label.as_str(), i))
            .collect();
        let average: Vec<(usize, f64)> = self
            .points
            .iter()
            .filter(|p| p.series_role == SeriesRole::AveragePrice)
            .filter_map(|p| columns.get(p.time_label.as_str()).map(|&col| (col, p.value)))
            .collect();

        let markers: Vec<&ChartPoint> = match self.markers {
            Some(m) => m,
            None => self.points.iter().filter(|p| p.series_role.is_marker()).collect(),
        };
        // A marker sits on the last visible minute at or before its execution time.
        let first_ms = visible[0].instant_ms;
        let placed: Vec<(usize, &ChartPoint)> = markers
            .into_iter()
            .filter(|m| m.instant_ms >= first_ms)
            .map(|m| {
                let col = visible.partition_point(|p| p.instant_ms <= m.instant_ms);
                (col.saturating_sub(1), m)
            })
            .collect();

        let values = visible
            .iter()
            .map(|p| p.value)
            .chain(average.iter().map(|(_, v)| *v))
            .chain(placed.iter().map(|(_, m)| m.value));
        let (min_price, max_price) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let range = max_price - min_price;
        let scale = Scale {
            min: min_price,
            range: if range < 0.01 { 1.0 } else { range },
            rows: plot_rows,
        };

        let plot = |buf: &mut Buffer, col: usize, value: f64, glyph: &str, style: Style| {
            let x = inner.x + col as u16;
            let y = inner.y + scale.row(value) as u16;
            if x < inner.x + inner.width && y < inner.y + plot_rows as u16 {
                buf.set_string(x, y, glyph, style);
            }
        };

        for &(col, value) in &average {
            plot(buf, col, value, "·", Style::default().fg(Color::Yellow));
        }
        for (col, p) in visible.iter().enumerate() {
            plot(buf, col, p.value, "●", Style::default().fg(Color::Cyan));
        }
        for (col, m) in &placed {
            let (glyph, color) = match m.series_role {
                SeriesRole::BuyMarker => ("B", Color::Green),
                _ => ("S", Color::Red),
            };
            plot(
                buf,
                *col,
                m.value,
                glyph,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            );
        }

        let axis = Style::default().fg(Color::DarkGray);
        buf.set_string(inner.x, inner.y, format!("{:.2}", max_price), axis);
        buf.set_string(
            inner.x,
            inner.y + plot_rows.saturating_sub(1) as u16,
            format!("{:.2}", min_price),
            axis,
        );
        let axis_y = inner.y + inner.height - 1;
        let first_label = &visible[0].time_label;
        buf.set_string(inner.x, axis_y, first_label, axis);
        if let Some(last) = visible.last() {
            let len = last.time_label.chars().count() as u16;
            if visible.len() > 1 && inner.width > len + first_label.chars().count() as u16 {
                buf.set_string(inner.x + inner.width - len, axis_y, &last.time_label, axis);
            }
        }
    }
}
