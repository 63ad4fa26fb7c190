pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};
use steer::runtime::Scheduler;
use steer::session::RunState;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

impl<S: Scheduler> Widget for &App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let game = &self.game;
        let config = game.config();
        let controls = game.controls();
        let settings = game.settings();

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let target_style = Style::default().fg(Color::Magenta);
        let output_style = Style::default().fg(Color::Cyan);
        let enabled = |on: bool| if on { bold_style } else { dim_style };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // status
                Constraint::Min(5),    // chart
                Constraint::Length(1), // button + slider
                Constraint::Length(1), // result
                Constraint::Length(1), // legend
            ])
            .split(area);

        let target_label = if config.mode.uses_target_function() {
            format!("{} ({})", config.target_function, config.target_function.id())
        } else {
            "slider".to_string()
        };
        let status = Line::from(vec![
            Span::styled(format!("mode {}", config.mode), enabled(controls.mode_selectable)),
            Span::raw("   "),
            Span::styled(
                format!("target {target_label}"),
                enabled(controls.target_function_selectable),
            ),
            Span::raw("   "),
            Span::styled(format!("plant {}", settings.plant), dim_style),
            Span::raw("   "),
            Span::styled(
                format!("t {:>5.2}/{:.0}s", game.elapsed(), settings.timeout_seconds()),
                bold_style,
            ),
            Span::raw("   "),
            Span::styled(
                format!("score {}", game.score()),
                Style::default().patch(bold_style).fg(Color::Green),
            ),
        ]);
        Paragraph::new(status)
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let snapshot = game.snapshot();
        let target_points = snapshot.target_points();
        let output_points = snapshot.output_points();
        let [y_min, y_max] = charting::compute_y_bounds(&snapshot);
        let x_min = -settings.display_seconds;

        let datasets = vec![
            Dataset::default()
                .name("target")
                .marker(ratatui::symbols::Marker::Braille)
                .style(target_style)
                .graph_type(GraphType::Line)
                .data(&target_points),
            Dataset::default()
                .name("output")
                .marker(ratatui::symbols::Marker::Braille)
                .style(output_style)
                .graph_type(GraphType::Line)
                .data(&output_points),
        ];

        let chart = Chart::new(datasets)
            .block(Block::default().borders(Borders::ALL))
            .x_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([x_min, 0.0])
                    .labels(vec![
                        Span::styled(charting::format_label(x_min), bold_style),
                        Span::styled(charting::format_label(x_min / 2.0), bold_style),
                        Span::styled("0", bold_style),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .bounds([y_min, y_max])
                    .labels(vec![
                        Span::styled(charting::format_label(y_min), bold_style),
                        Span::styled("0", bold_style),
                        Span::styled(charting::format_label(y_max), bold_style),
                    ]),
            );
        chart.render(chunks[1], buf);

        let button_style = match game.run_state() {
            _ if !controls.start_enabled => dim_style,
            RunState::Running => Style::default().patch(bold_style).fg(Color::Red),
            RunState::CountingDown(_) => Style::default().patch(bold_style).fg(Color::Yellow),
            _ => Style::default().patch(bold_style).fg(Color::Green),
        };
        let controls_line = Line::from(vec![
            Span::styled(format!("[ {} ]", controls.button_label), button_style),
            Span::raw("   "),
            Span::styled(
                format!("input {:+4}", game.user_input()),
                enabled(controls.user_input_enabled),
            ),
        ]);
        Paragraph::new(controls_line)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        if let Some(summary) = game.summary() {
            let result = Paragraph::new(Span::styled(
                format!(
                    "finished: {} hits in {} scored ticks ({:.1}%), (r)eset to play again",
                    summary.score,
                    summary.scored_ticks,
                    summary.hit_rate()
                ),
                Style::default().patch(bold_style).fg(Color::Yellow),
            ))
            .alignment(Alignment::Center);
            result.render(chunks[3], buf);
        }

        let legend = Paragraph::new(Span::styled(
            "(space) start/stop / (r)eset / (m)ode / (f)unction / ←→↑↓ input / (0) zero / (esc)ape",
            italic_style,
        ))
        .alignment(Alignment::Center);
        legend.render(chunks[4], buf);
    }
}
