use crate::api::schema::{AdminOverview, Table};
use crate::error::{AppError, Result};
use crate::models::analytics::{Analysis, AnalyticsResult, DailyPoint, MonthlyPoint, TypeAmount};
use crate::models::transaction::Category;
use chrono::{Duration, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};
use ratatui::widgets::canvas::{Canvas, Points};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::io;

const INCOME_COLOR: Color = Color::Green;
const EXPENSE_COLOR: Color = Color::Red;

/// Open the full-screen dashboard until `q` or `Esc` is pressed.
pub fn run_report(title: &str, result: &AnalyticsResult) -> Result<()> {
    let report = build_report(result);
    render_report(title, result, &report)
}

struct ReportData {
    buckets: Vec<BarBucket>,
    bucket_days: i64,
    months: Vec<MonthBar>,
    trend: TrendLines,
    type_colors: HashMap<(Category, String), Color>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DayBar {
    date: NaiveDate,
    income: Decimal,
    expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BarBucket {
    start: NaiveDate,
    end: NaiveDate,
    income: Decimal,
    expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MonthBar {
    month: String,
    income: Decimal,
    expense: Decimal,
}

/// Trend points as `(days since first, amount)`, one line per category.
#[derive(Debug, Clone, PartialEq, Default)]
struct TrendLines {
    first: Option<NaiveDate>,
    span_days: f64,
    max_amount: f64,
    lines: BTreeMap<Category, Vec<(f64, f64)>>,
}

fn build_report(result: &AnalyticsResult) -> ReportData {
    let days = zero_fill(&result.daily_series);
    let bucket_days = bucket_width_days(days.len() as i64);
    let buckets = bucket_bars(&days, bucket_days);

    let mut type_colors = HashMap::new();
    for category in Category::ALL {
        let kinds: Vec<String> = result
            .types_for(category)
            .iter()
            .map(|row| row.kind.clone())
            .collect();
        for (kind, color) in assign_colors(&kinds) {
            type_colors.insert((category, kind), color);
        }
    }

    ReportData {
        buckets,
        bucket_days,
        months: month_bars(&result.monthly_series),
        trend: trend_lines(&result.trend_series),
        type_colors,
    }
}

/// Contiguous day axis for the bar chart. Missing days become zero bars;
/// expense values come back as magnitudes.
fn zero_fill(points: &[DailyPoint]) -> Vec<DayBar> {
    let mut by_day: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for point in points {
        let entry = by_day.entry(point.date).or_insert((Decimal::ZERO, Decimal::ZERO));
        match point.category {
            Category::Income => entry.0 = entry.0.saturating_add(point.amount),
            Category::Expense => entry.1 = entry.1.saturating_add(point.amount.abs()),
        }
    }

    let (Some(first), Some(last)) = (by_day.keys().next().copied(), by_day.keys().next_back().copied()) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|date| *date <= last)
        .map(|date| {
            let (income, expense) = by_day
                .get(&date)
                .copied()
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            DayBar {
                date,
                income,
                expense,
            }
        })
        .collect()
}

fn bucket_width_days(total_days: i64) -> i64 {
    if total_days <= 31 {
        1
    } else if total_days <= 90 {
        7
    } else if total_days <= 365 {
        14
    } else {
        (total_days + 19) / 20
    }
}

fn bucket_bars(days: &[DayBar], bucket_days: i64) -> Vec<BarBucket> {
    days.chunks(bucket_days.max(1) as usize)
        .filter_map(|chunk| {
            let first = chunk.first()?;
            let last = chunk.last()?;
            Some(BarBucket {
                start: first.date,
                end: last.date,
                income: saturating_sum(chunk.iter().map(|d| d.income)),
                expense: saturating_sum(chunk.iter().map(|d| d.expense)),
            })
        })
        .collect()
}

fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// One bar pair per month, expense as a magnitude.
fn month_bars(points: &[MonthlyPoint]) -> Vec<MonthBar> {
    let mut by_month: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for point in points {
        let entry = by_month
            .entry(point.month.as_str())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match point.category {
            Category::Income => entry.0 = entry.0.saturating_add(point.amount),
            Category::Expense => entry.1 = entry.1.saturating_add(point.amount.abs()),
        }
    }

    by_month
        .into_iter()
        .map(|(month, (income, expense))| MonthBar {
            month: month.to_string(),
            income,
            expense,
        })
        .collect()
}

fn trend_lines(points: &[DailyPoint]) -> TrendLines {
    let Some((first, last)) = crate::operations::aggregate::date_span(points) else {
        return TrendLines::default();
    };

    let mut lines: BTreeMap<Category, Vec<(f64, f64)>> = BTreeMap::new();
    let mut max_amount = 0.0_f64;
    for point in points {
        let x = (point.date - first).num_days() as f64;
        let y = point.amount.abs().to_f64().unwrap_or(0.0);
        max_amount = max_amount.max(y);
        lines.entry(point.category).or_default().push((x, y));
    }

    TrendLines {
        first: Some(first),
        span_days: (last - first).num_days() as f64,
        max_amount,
        lines,
    }
}

fn assign_colors(kinds: &[String]) -> Vec<(String, Color)> {
    let palette = [
        Color::Cyan,
        Color::Magenta,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Red,
        Color::LightCyan,
        Color::LightMagenta,
        Color::LightYellow,
        Color::LightGreen,
        Color::LightBlue,
    ];

    kinds
        .iter()
        .enumerate()
        .map(|(idx, kind)| (kind.clone(), palette[idx % palette.len()]))
        .collect()
}

fn render_report(title: &str, result: &AnalyticsResult, data: &ReportData) -> Result<()> {
    let terminal_err = |what: &str, e: io::Error| AppError::Terminal(format!("{}: {}", what, e));

    enable_raw_mode().map_err(|e| terminal_err("Failed to enable raw mode", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| terminal_err("Failed to enter alternate screen", e))?;

    let outcome: Result<()> = (|| {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)
            .map_err(|e| terminal_err("Failed to initialize terminal", e))?;

        loop {
            terminal
                .draw(|frame| {
                    let size = frame.area();
                    let layout = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([
                            Constraint::Length(3),
                            Constraint::Percentage(35),
                            Constraint::Percentage(25),
                            Constraint::Min(6),
                        ])
                        .split(size);

                    render_metrics(frame, layout[0], title, result);

                    let bars = Layout::default()
                        .direction(Direction::Horizontal)
                        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                        .split(layout[1]);
                    render_daily_bars(frame, bars[0], data);
                    render_monthly_bars(frame, bars[1], data);
                    render_trend_chart(frame, layout[2], &data.trend);

                    let bottom = Layout::default()
                        .direction(Direction::Horizontal)
                        .constraints([
                            Constraint::Percentage(30),
                            Constraint::Percentage(30),
                            Constraint::Percentage(40),
                        ])
                        .split(layout[3]);

                    render_pie_chart(frame, bottom[0], Category::Income, result.types_for(Category::Income), data);
                    render_pie_chart(frame, bottom[1], Category::Expense, result.types_for(Category::Expense), data);
                    render_breakdown_table(frame, bottom[2], result, data);
                })
                .map_err(|e| terminal_err("Failed to draw terminal UI", e))?;

            if event::poll(std::time::Duration::from_millis(250))
                .map_err(|e| terminal_err("Failed to poll input", e))?
            {
                match event::read().map_err(|e| terminal_err("Failed to read input", e))? {
                    Event::Key(key) if key.code == KeyCode::Char('q') => break,
                    Event::Key(key) if key.code == KeyCode::Esc => break,
                    Event::Resize(_, _) => continue,
                    _ => {}
                }
            }
        }

        Ok(())
    })();

    disable_raw_mode().map_err(|e| terminal_err("Failed to disable raw mode", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen)
        .map_err(|e| terminal_err("Failed to leave alternate screen", e))?;

    outcome
}

fn render_metrics(frame: &mut ratatui::Frame, area: Rect, title: &str, result: &AnalyticsResult) {
    let block = Block::default()
        .title(format!("{}  (press q to exit)", title))
        .borders(Borders::ALL);
    let totals = &result.totals;
    let line = Line::from(vec![
        Span::styled(format!("Gross Income ${:.2}", totals.income), Style::default().fg(INCOME_COLOR)),
        Span::raw("   "),
        Span::styled(format!("Total Expense ${:.2}", totals.expense), Style::default().fg(EXPENSE_COLOR)),
        Span::raw("   "),
        Span::styled(
            format!("Net Savings ${:.2}", totals.net),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::raw(format!("Total Transactions {}", totals.count)),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_daily_bars(frame: &mut ratatui::Frame, area: Rect, data: &ReportData) {
    let title = format!("Daily Income and Expense ({}-day buckets)", data.bucket_days);
    let values: Vec<(Decimal, Decimal)> = data.buckets.iter().map(|b| (b.income, b.expense)).collect();
    render_diverging_bars(frame, area, &title, &values, |width| {
        build_bucket_labels(&data.buckets, width)
    });
}

fn render_monthly_bars(frame: &mut ratatui::Frame, area: Rect, data: &ReportData) {
    let values: Vec<(Decimal, Decimal)> = data.months.iter().map(|m| (m.income, m.expense)).collect();
    render_diverging_bars(frame, area, "Monthly Income and Expense", &values, |width| {
        build_month_labels(&data.months, width)
    });
}

/// Income grows up from a baseline row, expense grows down. `labels` gets
/// the per-bar column width.
fn render_diverging_bars(
    frame: &mut ratatui::Frame,
    area: Rect,
    title: &str,
    values: &[(Decimal, Decimal)],
    labels: impl Fn(usize) -> Line<'static>,
) {
    let inner = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let chart_area = block.inner(inner[0]);
    frame.render_widget(block, inner[0]);

    if values.is_empty() {
        let empty = Paragraph::new("No transactions to chart").alignment(Alignment::Center);
        frame.render_widget(empty, chart_area);
        return;
    }

    let height = chart_area.height as usize;
    if height < 3 {
        return;
    }
    let upper = (height - 1) / 2;
    let lower = height - 1 - upper;

    let bar_width = std::cmp::max(1, chart_area.width as usize / values.len());
    let max_value = values
        .iter()
        .flat_map(|(income, expense)| [*income, *expense])
        .max()
        .and_then(|m| m.to_f64())
        .unwrap_or(0.0)
        .max(1.0);

    let scaled = |value: Decimal, rows: usize| -> usize {
        let value = value.to_f64().unwrap_or(0.0);
        if value <= 0.0 {
            0
        } else {
            (value / max_value * rows as f64).ceil() as usize
        }
    };

    let mut lines: Vec<Line> = Vec::with_capacity(height);
    for row in 0..height {
        let mut spans: Vec<Span> = Vec::new();
        for (income, expense) in values {
            let cell = if row < upper {
                let level = upper - row;
                (level <= scaled(*income, upper)).then_some(INCOME_COLOR)
            } else if row == upper {
                spans.push(Span::styled("─".repeat(bar_width), Style::default().fg(Color::DarkGray)));
                continue;
            } else {
                let level = row - upper;
                (level <= scaled(*expense, lower)).then_some(EXPENSE_COLOR)
            };
            match cell {
                Some(color) => spans.push(Span::styled("█".repeat(bar_width), Style::default().fg(color))),
                None => spans.push(Span::raw(" ".repeat(bar_width))),
            }
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), chart_area);
    frame.render_widget(Paragraph::new(labels(bar_width)).alignment(Alignment::Left), inner[1]);
}

fn build_month_labels(months: &[MonthBar], bar_width: usize) -> Line<'static> {
    if months.is_empty() || bar_width < 5 {
        return Line::from("");
    }

    let spans: Vec<Span> = months
        .iter()
        .map(|bar| {
            // "2024-03" shortens to "24-03"
            let label = if bar_width >= 8 { bar.month.clone() } else { bar.month.chars().skip(2).collect() };
            Span::raw(format!("{:width$}", label, width = bar_width))
        })
        .collect();
    Line::from(spans)
}

fn render_trend_chart(frame: &mut ratatui::Frame, area: Rect, trend: &TrendLines) {
    let block = Block::default()
        .title("Income vs Expense Trend Over Time")
        .borders(Borders::ALL);

    let Some(first) = trend.first else {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let empty = Paragraph::new("No transactions to chart").alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    };

    let datasets: Vec<Dataset> = trend
        .lines
        .iter()
        .map(|(category, points)| {
            let color = match category {
                Category::Income => INCOME_COLOR,
                Category::Expense => EXPENSE_COLOR,
            };
            Dataset::default()
                .name(category.as_str())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color))
                .data(points)
        })
        .collect();

    let last = first + Duration::days(trend.span_days as i64);
    let x_axis = Axis::default()
        .style(Style::default().fg(Color::DarkGray))
        .bounds([0.0, trend.span_days.max(1.0)])
        .labels([first.format("%d.%m").to_string(), last.format("%d.%m").to_string()]);
    let y_max = trend.max_amount.max(1.0);
    let y_axis = Axis::default()
        .style(Style::default().fg(Color::DarkGray))
        .bounds([0.0, y_max])
        .labels(["0".to_string(), format!("{:.0}", y_max)]);

    frame.render_widget(Chart::new(datasets).block(block).x_axis(x_axis).y_axis(y_axis), area);
}

fn build_bucket_labels(buckets: &[BarBucket], bucket_width: usize) -> Line<'static> {
    if buckets.is_empty() || bucket_width < 6 {
        return Line::from("");
    }

    let spans: Vec<Span> = buckets
        .iter()
        .map(|bucket| {
            let mut label = if bucket.start != bucket.end && bucket_width >= 13 {
                format!("{}..{}", bucket.start.format("%m-%d"), bucket.end.format("%m-%d"))
            } else {
                bucket.start.format("%m-%d").to_string()
            };
            label.truncate(bucket_width);
            Span::raw(format!("{:width$}", label, width = bucket_width))
        })
        .collect();
    Line::from(spans)
}

fn render_pie_chart(
    frame: &mut ratatui::Frame,
    area: Rect,
    category: Category,
    rows: &[TypeAmount],
    data: &ReportData,
) {
    let title = match category {
        Category::Income => "Types of Income Distribution",
        Category::Expense => "Types of Expense Distribution",
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let total: Decimal = rows.iter().map(|r| r.amount).sum();
    if total <= Decimal::ZERO {
        let empty = Paragraph::new(format!("No {} recorded", category)).alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let total = total.to_f64().unwrap_or(1.0);
    let mut slices = Vec::new();
    let mut start_angle = 0.0_f64;
    for row in rows {
        let sweep = row.amount.to_f64().unwrap_or(0.0) / total * std::f64::consts::TAU;
        let color = data
            .type_colors
            .get(&(category, row.kind.clone()))
            .copied()
            .unwrap_or(Color::White);
        slices.push((start_angle, start_angle + sweep, color));
        start_angle += sweep;
    }

    let canvas = Canvas::default()
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for (start, end, color) in &slices {
                let mut points = Vec::new();
                let mut r = 0.0;
                while r <= 1.0 {
                    let mut angle = *start;
                    while angle <= *end {
                        points.push((r * angle.cos(), r * angle.sin()));
                        angle += 0.05;
                    }
                    r += 0.04;
                }
                if !points.is_empty() {
                    ctx.draw(&Points { coords: &points, color: *color });
                }
            }
        });

    frame.render_widget(canvas, inner);
}

fn render_breakdown_table(frame: &mut ratatui::Frame, area: Rect, result: &AnalyticsResult, data: &ReportData) {
    let block = Block::default().title("Type Breakdown").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if result.category_type_breakdown.is_empty() {
        let empty = Paragraph::new("No transactions recorded").alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let bold = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:9}", "Category"), bold),
        Span::raw(" "),
        Span::styled(format!("{:13}", "Type"), bold),
        Span::raw(" "),
        Span::styled(format!("{:>12}", "Amount"), bold),
    ])];

    for row in &result.category_type_breakdown {
        let color = data
            .type_colors
            .get(&(row.category, row.kind.clone()))
            .copied()
            .unwrap_or(Color::White);
        lines.push(Line::from(vec![
            Span::raw(format!("{:9}", row.category.as_str())),
            Span::raw(" "),
            Span::styled(format!("{:13}", row.kind), Style::default().fg(color)),
            Span::raw(" "),
            Span::styled(format!("{:>12.2}", row.amount), Style::default().fg(color)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), inner);
}

/// Plain-text rendering for non-interactive output.
pub fn render_summary(analysis: &Analysis) -> String {
    let result = &analysis.result;
    let totals = &result.totals;
    let mut out = String::new();

    let _ = writeln!(out, "Gross Income:       ${:.2}", totals.income);
    let _ = writeln!(out, "Total Expense:      ${:.2}", totals.expense);
    let _ = writeln!(out, "Net Savings:        ${:.2}", totals.net);
    let _ = writeln!(out, "Total Transactions: {}", totals.count);

    for category in Category::ALL {
        let rows = result.types_for(category);
        let _ = writeln!(out, "\n{} by type:", category);
        if rows.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for row in rows {
            let _ = writeln!(out, "  {:15} {:>12.2}", row.kind, row.amount);
        }
    }

    if !result.monthly_series.is_empty() {
        let _ = writeln!(out, "\nMonthly:");
        for point in &result.monthly_series {
            let _ = writeln!(out, "  {} {:8} {:>12.2}", point.month, point.category.as_str(), point.amount);
        }
    }

    if !analysis.rejected.is_empty() {
        let _ = writeln!(out, "\nSkipped {} record(s):", analysis.rejected.len());
        for rejection in &analysis.rejected {
            match rejection.id {
                Some(id) => {
                    let _ = writeln!(out, "  id {}: {}", id, rejection.reason);
                }
                None => {
                    let _ = writeln!(out, "  record {}: {}", rejection.index, rejection.reason);
                }
            }
        }
    }

    out
}

/// Both admin tables as aligned plain text.
pub fn render_overview(overview: &AdminOverview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Transactions:");
    render_table(&mut out, &overview.transactions);
    let _ = writeln!(out, "\nUsers:");
    render_table(&mut out, &overview.users);
    out
}

fn render_table(out: &mut String, table: &Table) {
    if table.rows.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }

    let cell = |value: &serde_json::Value| match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    };
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(cell).collect())
        .collect();

    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.columns.len()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|idx| {
            rows.iter()
                .filter_map(|row| row.get(idx))
                .chain(table.columns.get(idx))
                .map(|text| text.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: &[String]| {
        widths
            .iter()
            .enumerate()
            .map(|(idx, width)| {
                let text = cells.get(idx).map(String::as_str).unwrap_or("");
                format!("{:width$}", text, width = width)
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let _ = writeln!(out, "  {}", format_row(&table.columns));
    for row in &rows {
        let _ = writeln!(out, "  {}", format_row(row));
    }
}

/// Date range label for the dashboard title.
pub fn report_title(result: &AnalyticsResult) -> String {
    match crate::operations::aggregate::date_span(&result.daily_series) {
        Some((first, last)) if first == last => format!("Dashboard {}", first.format("%d.%m.%Y")),
        Some((first, last)) => format!(
            "Dashboard {} - {} ({} days)",
            first.format("%d.%m.%Y"),
            last.format("%d.%m.%Y"),
            (last - first + Duration::days(1)).num_days()
        ),
        None => "Dashboard (no transactions)".to_string(),
    }
}
