use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::model::point::{ChartPoint, SeriesRole};

/// Buy/sell overlays currently on the chart, newest last.
pub struct MarkerPanel<'a> {
    markers: Vec<&'a ChartPoint>,
}

impl<'a> MarkerPanel<'a> {
    pub fn new<I>(markers: I) -> Self
    where
        I: IntoIterator<Item = &'a ChartPoint>,
    {
        Self {
            markers: markers.into_iter().collect(),
        }
    }
}

impl Widget for MarkerPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let visible_rows = area.height.saturating_sub(2) as usize;
        let start = self.markers.len().saturating_sub(visible_rows);
        let lines: Vec<Line> = if self.markers.is_empty() {
            vec![Line::from(Span::styled(
                "No trades",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.markers[start..]
                .iter()
                .map(|m| {
                    let (side, color) = match m.series_role {
                        SeriesRole::BuyMarker => ("BUY ", Color::Green),
                        _ => ("SELL", Color::Red),
                    };
                    let qty = m
                        .detail
                        .as_ref()
                        .and_then(|d| d.filled_quantity.or(d.quantity))
                        .map(|q| format!(" x{}", q))
                        .unwrap_or_default();
                    Line::from(vec![
                        Span::styled(side, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                        Span::styled(
                            format!(" {} ", m.time_label),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::styled(format!("{:.2}", m.value), Style::default().fg(Color::White)),
                        Span::styled(qty, Style::default().fg(Color::White)),
                        Span::styled(
                            format!("  #{}", m.identity.as_ref().map(|i| i.as_str()).unwrap_or("-")),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ])
                })
                .collect()
        };

        let block = Block::default()
            .title(" Trades ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

pub struct LogPanel<'a> {
    messages: &'a [String],
}

impl<'a> LogPanel<'a> {
    pub fn new(messages: &'a [String]) -> Self {
        Self { messages }
    }
}

impl Widget for LogPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let visible = area.height.saturating_sub(2) as usize;
        let start = self.messages.len().saturating_sub(visible);
        let lines: Vec<Line> = self.messages[start..]
            .iter()
            .map(|m| Line::from(Span::styled(m.as_str(), Style::default().fg(Color::Gray))))
            .collect();

        let block = Block::default()
            .title(" Log ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

pub struct StatusBar<'a> {
    pub stock_code: &'a str,
    pub loading: bool,
    pub point_count: usize,
    pub skipped: usize,
    pub last_error: Option<&'a str>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let fetch_status = if self.loading {
            Span::styled(" LOADING ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        } else {
            Span::styled(" IDLE ", Style::default().fg(Color::Green))
        };

        let mut spans = vec![
            Span::styled(
                " autotrade-chart ",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("| ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.stock_code, Style::default().fg(Color::Cyan)),
            Span::styled(" | ", Style::default().fg(Color::DarkGray)),
            fetch_status,
            Span::styled(" | ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("points: {}", self.point_count),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if self.skipped > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(
                format!("skipped: {}", self.skipped),
                Style::default().fg(Color::Yellow),
            ));
        }
        if let Some(err) = self.last_error {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(
                format!("error: {}", err),
                Style::default().fg(Color::Red),
            ));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

pub struct KeybindBar;

impl Widget for KeybindBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(vec![
            Span::styled(" [Q]", Style::default().fg(Color::Yellow)),
            Span::styled("uit  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[R]", Style::default().fg(Color::Yellow)),
            Span::styled("efresh  ", Style::default().fg(Color::DarkGray)),
        ]);

        buf.set_line(area.x, area.y, &line, area.width);
    }
}
