//! Distribution chart widget: histogram bars with the KDE curve on top.

use crate::theme::Theme;
use candlekit_core::plot::{DistributionPlot, PLOT_TITLE, X_LABEL, Y_LABEL};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

/// Vertical strokes drawn per histogram bin so bars read as filled.
const STROKES_PER_BIN: usize = 6;

pub struct DistributionView<'a> {
    plot: &'a DistributionPlot,
    theme: &'a Theme,
}

impl<'a> DistributionView<'a> {
    pub fn new(plot: &'a DistributionPlot, theme: &'a Theme) -> Self {
        Self { plot, theme }
    }

    fn bar_points(&self) -> Vec<(f64, f64)> {
        self.plot
            .bins()
            .iter()
            .flat_map(|bin| {
                let step = bin.width() / STROKES_PER_BIN as f64;
                (0..STROKES_PER_BIN)
                    .map(move |i| (bin.lower + step * (i as f64 + 0.5), bin.density))
            })
            .collect()
    }
}

fn fmt_value(v: f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{v:.0}")
    } else if v.abs() >= 1.0 {
        format!("{v:.2}")
    } else {
        format!("{v:.4}")
    }
}

impl Widget for DistributionView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [chart_area, footer_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

        let block = Block::default()
            .title(format!(" {PLOT_TITLE} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .style(Style::default().bg(self.theme.background));

        let bars = self.bar_points();
        let mut datasets = vec![Dataset::default()
            .name("Histogram")
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Bar)
            .style(Style::default().fg(self.theme.bars))
            .data(&bars)];
        if self.plot.has_density_curve() {
            datasets.push(
                Dataset::default()
                    .name("KDE")
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(
                        Style::default()
                            .fg(self.theme.curve)
                            .add_modifier(Modifier::BOLD),
                    )
                    .data(self.plot.density()),
            );
        }

        let (x_lo, x_hi) = self.plot.x_range();
        let y_hi = self.plot.y_max() * 1.1;
        let axis_style = Style::default().fg(self.theme.muted);

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title(X_LABEL)
                    .style(axis_style)
                    .bounds([x_lo, x_hi])
                    .labels(vec![
                        Span::raw(fmt_value(x_lo)),
                        Span::raw(fmt_value((x_lo + x_hi) / 2.0)),
                        Span::raw(fmt_value(x_hi)),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title(Y_LABEL)
                    .style(axis_style)
                    .bounds([0.0, y_hi])
                    .labels(vec![
                        Span::raw("0"),
                        Span::raw(fmt_value(y_hi / 2.0)),
                        Span::raw(fmt_value(y_hi)),
                    ]),
            );
        chart.render(chart_area, buf);

        let mut footer = vec![
            Span::styled(
                format!(
                    " n={}  mean={}  std={}  bins={} ",
                    self.plot.samples(),
                    fmt_value(self.plot.mean()),
                    fmt_value(self.plot.std_dev()),
                    self.plot.bins().len()
                ),
                Style::default().fg(self.theme.text),
            ),
            Span::styled(" q/Esc: close", Style::default().fg(self.theme.muted)),
        ];
        if !self.plot.has_density_curve() {
            footer.insert(
                1,
                Span::styled(" (no KDE: no spread) ", Style::default().fg(self.theme.muted)),
            );
        }
        Paragraph::new(Line::from(footer)).render(footer_area, buf);
    }
}
