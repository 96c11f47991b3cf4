use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::{
    app::App,
    clock::Clock,
    puzzle::PuzzleVariant,
    solve::format_time,
    stats::{self, AVERAGE_WINDOWS},
    timer::TimerState,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const LEGEND: &str = "(space) start/stop / (1-4, tab) puzzle / (↑↓) select / (d)elete / (esc)ape";

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let timer = self.controller.timer();
        let session = self.controller.session();

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let yellow_bold_style = Style::default().patch(bold_style).fg(Color::Yellow);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let magenta_style = Style::default().fg(Color::Magenta);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(1),
                    Constraint::Length(3),
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Min(1),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(area);

        // puzzle tabs and who is timing
        let mut header = PuzzleVariant::ALL
            .iter()
            .enumerate()
            .flat_map(|(idx, variant)| {
                let style = if *variant == timer.variant() {
                    Style::default()
                        .patch(bold_style)
                        .add_modifier(Modifier::UNDERLINED)
                } else {
                    dim_style
                };
                [
                    Span::styled(format!("{} {}", idx + 1, variant), style),
                    Span::raw("  "),
                ]
            })
            .collect::<Vec<Span>>();
        header.push(Span::styled(
            session.identity().display_label().to_string(),
            magenta_style,
        ));
        Paragraph::new(Line::from(header)).render(chunks[0], buf);

        Paragraph::new(Span::styled(timer.scramble().to_string(), bold_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);

        let (clock_text, clock_style, hint) = match timer.state() {
            TimerState::Idle => (
                self.last_solve
                    .as_ref()
                    .map(|r| r.display_time.clone())
                    .unwrap_or_else(|| format_time(0)),
                bold_style,
                "press space to inspect",
            ),
            TimerState::Inspecting { remaining_secs } => (
                remaining_secs.to_string(),
                yellow_bold_style,
                "inspecting, press space to start",
            ),
            TimerState::Timing { .. } => (
                format_time(timer.elapsed_display().unwrap_or(0)),
                green_bold_style,
                "press space to stop",
            ),
        };
        Paragraph::new(vec![
            Line::from(Span::styled(clock_text, clock_style)),
            Line::from(Span::styled(hint, italic_style)),
        ])
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        let history = session.history();
        let summary = session.summary();
        let mut stats_line = vec![Span::styled(
            format!(
                "best {}",
                summary.best.map(format_time).unwrap_or_else(|| String::from("-"))
            ),
            bold_style,
        )];
        for n in AVERAGE_WINDOWS {
            let value = stats::display_average(history, n).unwrap_or_else(|| String::from("-"));
            stats_line.push(Span::raw("   "));
            stats_line.push(Span::styled(format!("ao{} {}", n, value), bold_style));
        }
        if let Some(mean) = summary.mean {
            stats_line.push(Span::styled(
                format!("   mean {}", format_time(mean.round() as u64)),
                dim_style,
            ));
        }
        stats_line.push(Span::styled(
            format!("   {} solves", summary.count),
            dim_style,
        ));
        Paragraph::new(Line::from(stats_line))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let rows = history
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let style = if self.selected == Some(idx) {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{:>2}. ", history.len() - idx), dim_style),
                    Span::styled(format!("{:>9}", record.display_time), style),
                    Span::raw("  "),
                    Span::styled(record.scramble.clone(), dim_style),
                ])
            })
            .collect::<Vec<Line>>();
        Paragraph::new(rows).render(chunks[4], buf);

        Paragraph::new(Span::styled(LEGEND, italic_style)).render(chunks[5], buf);
    }
}
