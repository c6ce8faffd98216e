pub mod chart;
pub mod dashboard;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use crate::chart::Reconciler;
use crate::event::AppEvent;
use crate::session::{ApplyOutcome, ChartSession};

use chart::MinuteChart;
use dashboard::{KeybindBar, LogPanel, MarkerPanel, StatusBar};

const MAX_LOG_MESSAGES: usize = 200;

pub struct AppState {
    pub stock_code: String,
    pub session: ChartSession,
    pub log_messages: Vec<String>,
}

impl AppState {
    pub fn new(stock_code: &str, reconciler: Reconciler) -> Self {
        Self {
            stock_code: stock_code.to_string(),
            session: ChartSession::new(reconciler),
            log_messages: Vec::new(),
        }
    }

    pub fn push_log(&mut self, msg: String) {
        self.log_messages.push(msg);
        if self.log_messages.len() > MAX_LOG_MESSAGES {
            self.log_messages.remove(0);
        }
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::MinuteData { seq, payload } => match self.session.apply_payload(seq, &payload) {
                Ok(ApplyOutcome::Applied {
                    points,
                    skipped,
                    overlays,
                }) => {
                    let mut msg = format!(
                        "#{} loaded {} points, {} trades (+{} ~{} -{})",
                        seq,
                        points,
                        self.session.overlays().len(),
                        overlays.added.len(),
                        overlays.replaced.len(),
                        overlays.stale.len()
                    );
                    if skipped > 0 {
                        msg.push_str(&format!(", skipped {} bad records", skipped));
                    }
                    self.push_log(msg);
                }
                Ok(ApplyOutcome::Stale { seq, latest }) => {
                    self.push_log(format!("#{} ignored (superseded by #{})", seq, latest));
                }
                Err(e) => self.push_log(format!("#{} rejected: {}", seq, e)),
            },
            AppEvent::FetchFailed { seq, error } => {
                if self.session.fail_fetch(seq, &error) {
                    self.push_log(format!("#{} fetch failed: {}", seq, error));
                }
            }
            AppEvent::LogMessage(msg) => self.push_log(msg),
        }
    }
}

pub fn render(frame: &mut Frame, state: &AppState) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(8),    // chart + trades
            Constraint::Length(5), // log
            Constraint::Length(1), // keybinds
        ])
        .split(frame.area());

    let current = state.session.current();
    frame.render_widget(
        StatusBar {
            stock_code: &state.stock_code,
            loading: state.session.loading(),
            point_count: current.points.len(),
            skipped: state.session.skipped_records(),
            last_error: state.session.last_error(),
        },
        outer[0],
    );

    let main_area = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(44)])
        .split(outer[1]);

    frame.render_widget(
        MinuteChart::new(&current.points, &state.stock_code).markers(state.session.overlays().iter()),
        main_area[0],
    );
    frame.render_widget(MarkerPanel::new(state.session.overlays().iter()), main_area[1]);
    frame.render_widget(LogPanel::new(&state.log_messages), outer[2]);
    frame.render_widget(KeybindBar, outer[3]);
}
