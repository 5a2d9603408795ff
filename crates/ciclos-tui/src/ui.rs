use std::collections::VecDeque;

use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Terminal;

use crate::countdown::format_clock;
use crate::form::FormField;
use crate::AppModel;

pub fn draw_ui(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    model: &AppModel,
) -> anyhow::Result<()> {
    terminal.draw(|frame| {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(4),
                Constraint::Min(1),
            ])
            .split(frame.area());

        let controls = if model.terminal_caps.unicode {
            "ciclos - [Tab] campo  [Enter] começar  [i] interromper  [Esc] sair  [↑/↓] histórico  [PgUp/PgDn] registro"
        } else {
            "ciclos - [Tab] campo [Enter] comecar [i] interromper [Esc] sair [Up/Down] historico [PgUp/PgDn] registro"
        };
        let control_block = Paragraph::new(controls)
            .block(Block::default().borders(Borders::ALL).title("Controles"));
        frame.render_widget(control_block, rows[0]);

        draw_form(frame, model, rows[1]);
        draw_countdown(frame, model, rows[2]);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[3]);

        let history_rows: Vec<String> = model
            .store
            .cycles()
            .iter()
            .rev()
            .map(|cycle| {
                format!(
                    "{}  {}min  {}",
                    cycle.task,
                    cycle.minutes_amount,
                    cycle.status_label()
                )
            })
            .collect();
        let visible_history = list_window(
            &history_rows,
            model.history_scroll,
            cols[0].height.saturating_sub(2) as usize,
        );
        let history_items: Vec<ListItem> = visible_history
            .into_iter()
            .map(|row| {
                let style = if !model.terminal_caps.color {
                    Style::default()
                } else if row.ends_with("concluído") {
                    Style::default().fg(Color::Green)
                } else if row.ends_with("interrompido") {
                    Style::default().fg(Color::Yellow)
                } else if row.ends_with("em andamento") {
                    Style::default().fg(Color::Blue)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(row).style(style)
            })
            .collect();
        let history =
            List::new(history_items).block(Block::default().borders(Borders::ALL).title("Histórico"));
        frame.render_widget(history, cols[0]);

        let visible_logs = tail_window(
            &model.logs,
            model.log_scroll,
            cols[1].height.saturating_sub(2) as usize,
        );
        let log_items: Vec<ListItem> = visible_logs.into_iter().map(ListItem::new).collect();
        let logs = List::new(log_items).block(Block::default().borders(Borders::ALL).title("Registro"));
        frame.render_widget(logs, cols[1]);
    })?;
    Ok(())
}

fn draw_form(frame: &mut ratatui::Frame<'_>, model: &AppModel, area: ratatui::layout::Rect) {
    let fields = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let editable = model.store.active_cycle().is_none();
    let focus_style = |field: FormField| {
        if model.terminal_caps.color && editable && model.form.focus == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };
    let field_text = |value: &str, field: FormField| {
        if editable && model.form.focus == field {
            format!("{value}_")
        } else {
            value.to_string()
        }
    };

    let task = Paragraph::new(field_text(&model.form.task, FormField::Task)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Tarefa")
            .border_style(focus_style(FormField::Task)),
    );
    frame.render_widget(task, fields[0]);

    let minutes = Paragraph::new(field_text(&model.form.minutes, FormField::Minutes)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Minutos (1-60)")
            .border_style(focus_style(FormField::Minutes)),
    );
    frame.render_widget(minutes, fields[1]);
}

fn draw_countdown(frame: &mut ratatui::Frame<'_>, model: &AppModel, area: ratatui::layout::Rect) {
    let (clock_line, hint_line) = match model.store.active_cycle() {
        Some(active) => {
            let clock = format_clock(model.remaining_display);
            let text = format!("{clock}  {}  ({})", active.task, active.status_label());
            let style = if model.terminal_caps.color {
                Style::default().fg(Color::Blue)
            } else {
                Style::default()
            };
            (
                Line::styled(text, style),
                Line::from("[i] interromper o ciclo"),
            )
        }
        None => {
            let preview = model
                .form
                .minutes_preview()
                .map(|minutes| i64::from(minutes) * 60)
                .unwrap_or(0);
            let clock_line = Line::from(format_clock(preview));
            let hint_line = match model.form.error.as_ref() {
                Some(error) => {
                    let style = if model.terminal_caps.color {
                        Style::default().fg(Color::Red)
                    } else {
                        Style::default()
                    };
                    Line::styled(error.to_string(), style)
                }
                None => Line::from("[Enter] começa um novo ciclo"),
            };
            (clock_line, hint_line)
        }
    };

    let countdown = Paragraph::new(vec![clock_line, hint_line])
        .block(Block::default().borders(Borders::ALL).title("Ciclo"));
    frame.render_widget(countdown, area);
}

pub fn list_window(items: &[String], scroll: usize, height: usize) -> Vec<String> {
    if items.is_empty() {
        return vec!["(vazio)".to_string()];
    }
    let safe_height = height.max(1);
    let max_start = items.len().saturating_sub(safe_height);
    let start = scroll.min(max_start);
    items.iter().skip(start).take(safe_height).cloned().collect()
}

pub fn tail_window(items: &VecDeque<String>, scroll: usize, height: usize) -> Vec<String> {
    if items.is_empty() {
        return vec!["(vazio)".to_string()];
    }
    let total = items.len();
    let end = total.saturating_sub(scroll.min(total));
    let safe_height = height.max(1);
    let start = end.saturating_sub(safe_height);
    items
        .iter()
        .skip(start)
        .take(end.saturating_sub(start))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|label| label.to_string()).collect()
    }

    #[test]
    fn list_window_clamps_scroll_to_the_tail() {
        let items = rows(&["a", "b", "c", "d"]);
        assert_eq!(list_window(&items, 0, 2), rows(&["a", "b"]));
        assert_eq!(list_window(&items, 2, 2), rows(&["c", "d"]));
        assert_eq!(list_window(&items, 99, 2), rows(&["c", "d"]));
    }

    #[test]
    fn list_window_handles_empty_input() {
        assert_eq!(list_window(&[], 0, 3), rows(&["(vazio)"]));
    }

    #[test]
    fn tail_window_shows_newest_lines_first_scrolled_back_by_offset() {
        let items: VecDeque<String> = rows(&["a", "b", "c", "d"]).into();
        assert_eq!(tail_window(&items, 0, 2), rows(&["c", "d"]));
        assert_eq!(tail_window(&items, 1, 2), rows(&["b", "c"]));
        assert_eq!(tail_window(&items, 99, 2), Vec::<String>::new());
    }
}
